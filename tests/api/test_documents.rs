//! Document store: upload validation, replacement, download and deletion.

use actix_web::test;
use serde_json::json;

use super::test_helpers::*;

struct Setup {
    recruiter: String,
    applicant: String,
    application_id: String,
}

async fn setup<S>(app: &S, company: &str) -> Setup
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let (recruiter, _) = recruiter_with_company(app, company).await;
    let (applicant, _) = register(app, "APPLICANT", None).await;
    let offer = create_offer(app, &recruiter, json!({})).await;
    let application_id = apply(app, &applicant, offer["id"].as_str().unwrap()).await;
    Setup {
        recruiter,
        applicant,
        application_id,
    }
}

#[actix_rt::test]
async fn test_oversized_upload_rejected_and_nothing_stored() {
    let ctx = create_test_context().await;
    let app = create_test_app(&ctx).await;
    let s = setup(&app, "Trop Gros").await;

    let (status, body) = upload(
        &app,
        &s.applicant,
        &s.application_id,
        "CV",
        "cv.pdf",
        "application/pdf",
        &fake_pdf(TEST_MAX_DOCUMENT_SIZE + 1),
    )
    .await;
    assert_eq!(status, 413, "{}", body);
    assert_eq!(body["error"], "PAYLOAD_TOO_LARGE");
    assert_eq!(stored_file_count(&ctx), 0);

    let (_, docs) = send(
        &app,
        authed(
            test::TestRequest::get()
                .uri(&format!("/api/v1/applications/{}/documents", s.application_id)),
            &s.applicant,
        ),
    )
    .await;
    assert!(docs["documents"].as_array().unwrap().is_empty());
}

#[actix_rt::test]
async fn test_wrong_type_upload_rejected_and_nothing_stored() {
    let ctx = create_test_context().await;
    let app = create_test_app(&ctx).await;
    let s = setup(&app, "Mauvais Type").await;

    let (status, body) = upload(
        &app,
        &s.applicant,
        &s.application_id,
        "CV",
        "cv.exe",
        "application/octet-stream",
        b"MZ\x90\x00",
    )
    .await;
    assert_eq!(status, 415, "{}", body);
    assert_eq!(body["error"], "UNSUPPORTED_MEDIA_TYPE");

    // Allowed extension, disallowed declared type
    let (status, _) = upload(
        &app,
        &s.applicant,
        &s.application_id,
        "CV",
        "cv.pdf",
        "image/png",
        b"\x89PNG",
    )
    .await;
    assert_eq!(status, 415);

    let (status, _) = upload(
        &app,
        &s.applicant,
        &s.application_id,
        "CV",
        "vide.pdf",
        "application/pdf",
        b"",
    )
    .await;
    assert_eq!(status, 400);

    assert_eq!(stored_file_count(&ctx), 0);
}

#[actix_rt::test]
async fn test_only_applicant_uploads_to_own_application() {
    let ctx = create_test_context().await;
    let app = create_test_app(&ctx).await;
    let s = setup(&app, "Propriété").await;
    let (intruder, _) = register(&app, "APPLICANT", None).await;

    for token in [&intruder, &s.recruiter] {
        let (status, _) = upload(
            &app,
            token,
            &s.application_id,
            "CV",
            "cv.pdf",
            "application/pdf",
            &fake_pdf(64),
        )
        .await;
        assert_eq!(status, 403);
    }

    let (status, _) = upload(
        &app,
        &s.applicant,
        &uuid::Uuid::new_v4().to_string(),
        "CV",
        "cv.pdf",
        "application/pdf",
        &fake_pdf(64),
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(stored_file_count(&ctx), 0);
}

#[actix_rt::test]
async fn test_second_cv_replaces_first() {
    let ctx = create_test_context().await;
    let app = create_test_app(&ctx).await;
    let s = setup(&app, "Remplacement").await;

    let (status, first) = upload(
        &app,
        &s.applicant,
        &s.application_id,
        "CV",
        "ancien.pdf",
        "application/pdf",
        &fake_pdf(100),
    )
    .await;
    assert_eq!(status, 201);
    let (status, second) = upload(
        &app,
        &s.applicant,
        &s.application_id,
        "CV",
        "nouveau.docx",
        "",
        b"PK\x03\x04 nouveau cv",
    )
    .await;
    assert_eq!(status, 201, "{}", second);
    assert_eq!(
        second["contentType"],
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    );

    let (_, docs) = send(
        &app,
        authed(
            test::TestRequest::get()
                .uri(&format!("/api/v1/applications/{}/documents", s.application_id)),
            &s.applicant,
        ),
    )
    .await;
    let docs = docs["documents"].as_array().unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0]["fileName"], "nouveau.docx");
    assert_eq!(stored_file_count(&ctx), 1);

    let (status, _) = send(
        &app,
        authed(
            test::TestRequest::get()
                .uri(&format!("/api/v1/documents/{}", first["id"].as_str().unwrap())),
            &s.applicant,
        ),
    )
    .await;
    assert_eq!(status, 404);
}

#[actix_rt::test]
async fn test_recruiter_download_marks_viewed() {
    let ctx = create_test_context().await;
    let app = create_test_app(&ctx).await;
    let s = setup(&app, "Lecture").await;
    let (other_recruiter, _) = recruiter_with_company(&app, "Curieux").await;

    let cv = fake_pdf(4096);
    let (_, document) = upload(
        &app,
        &s.applicant,
        &s.application_id,
        "CV",
        "Curriculum Vitae.pdf",
        "application/pdf",
        &cv,
    )
    .await;
    let document_uri = format!("/api/v1/documents/{}", document["id"].as_str().unwrap());
    let application_uri = format!("/api/v1/applications/{}", s.application_id);

    // The applicant reading their own CV changes nothing
    let resp = test::call_service(
        &app,
        authed(test::TestRequest::get().uri(&document_uri), &s.applicant).to_request(),
    )
    .await;
    assert_eq!(resp.status().as_u16(), 200);
    let (_, current) = send(
        &app,
        authed(test::TestRequest::get().uri(&application_uri), &s.applicant),
    )
    .await;
    assert_eq!(current["status"], "NOT_VIEWED");

    let (status, _) = send(
        &app,
        authed(test::TestRequest::get().uri(&document_uri), &other_recruiter),
    )
    .await;
    assert_eq!(status, 403);

    let resp = test::call_service(
        &app,
        authed(test::TestRequest::get().uri(&document_uri), &s.recruiter).to_request(),
    )
    .await;
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "application/pdf"
    );
    let disposition = resp
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment;"));
    assert!(disposition.contains("filename*=UTF-8''Curriculum%20Vitae.pdf"));
    let body = test::read_body(resp).await;
    assert_eq!(body.as_ref(), cv.as_slice());

    let (_, current) = send(
        &app,
        authed(test::TestRequest::get().uri(&application_uri), &s.applicant),
    )
    .await;
    assert_eq!(current["status"], "VIEWED");
    assert!(current["viewedAt"].is_string());
}

#[actix_rt::test]
async fn test_only_applicant_deletes_document() {
    let ctx = create_test_context().await;
    let app = create_test_app(&ctx).await;
    let s = setup(&app, "Suppression").await;

    let (_, document) = upload(
        &app,
        &s.applicant,
        &s.application_id,
        "COVER_LETTER",
        "lettre.doc",
        "application/msword",
        b"\xD0\xCF\x11\xE0 lettre",
    )
    .await;
    let uri = format!("/api/v1/documents/{}", document["id"].as_str().unwrap());

    let (status, _) = send(&app, authed(test::TestRequest::delete().uri(&uri), &s.recruiter)).await;
    assert_eq!(status, 403);
    assert_eq!(stored_file_count(&ctx), 1);

    let (status, _) = send(&app, authed(test::TestRequest::delete().uri(&uri), &s.applicant)).await;
    assert_eq!(status, 204);
    assert_eq!(stored_file_count(&ctx), 0);

    let (status, _) = send(&app, authed(test::TestRequest::delete().uri(&uri), &s.applicant)).await;
    assert_eq!(status, 404);
}

#[actix_rt::test]
async fn test_upload_missing_fields_is_bad_request() {
    let ctx = create_test_context().await;
    let app = create_test_app(&ctx).await;
    let s = setup(&app, "Champs").await;

    let (status, body) = upload(
        &app,
        &s.applicant,
        &s.application_id,
        "PORTFOLIO",
        "cv.pdf",
        "application/pdf",
        &fake_pdf(64),
    )
    .await;
    assert_eq!(status, 400, "{}", body);
}
