//! Application workflow: apply, finalize, status and recruiter listings.

use actix_web::test;
use serde_json::json;

use super::test_helpers::*;

#[actix_rt::test]
async fn test_apply_upload_cv_and_finalize() {
    let ctx = create_test_context().await;
    let app = create_test_app(&ctx).await;
    let (recruiter, _) = recruiter_with_company(&app, "Parcours Emploi").await;
    let (applicant, applicant_id) = register(&app, "APPLICANT", None).await;

    let offer = create_offer(&app, &recruiter, json!({})).await;
    let application_id = apply(&app, &applicant, offer["id"].as_str().unwrap()).await;

    let cv = fake_pdf(2 * 1024 * 1024);
    let (status, document) = upload(
        &app,
        &applicant,
        &application_id,
        "CV",
        "mon-cv.pdf",
        "application/pdf",
        &cv,
    )
    .await;
    assert_eq!(status, 201, "{}", document);
    assert_eq!(document["documentType"], "CV");
    assert_eq!(document["fileSize"], cv.len());

    let app_uri = format!("/api/v1/applications/{}", application_id);
    let (_, before) = send(&app, authed(test::TestRequest::get().uri(&app_uri), &applicant)).await;

    let (status, readiness) = send(
        &app,
        authed(
            test::TestRequest::post().uri(&format!("{}/finalize", app_uri)),
            &applicant,
        ),
    )
    .await;
    assert_eq!(status, 200, "{}", readiness);
    assert_eq!(readiness["ready"], true);
    assert_eq!(readiness["cvUploaded"], true);
    assert_eq!(readiness["coverLetterUploaded"], false);

    // Finalizing changes nothing
    let (_, after) = send(&app, authed(test::TestRequest::get().uri(&app_uri), &applicant)).await;
    assert_eq!(before, after);
    assert_eq!(after["status"], "NOT_VIEWED");
    assert_eq!(after["userId"], applicant_id.as_str());
    assert_eq!(after["offerTitle"], offer["title"]);
    assert_eq!(after["companyName"], "Parcours Emploi");
    assert_eq!(after["cvUploaded"], true);
    assert!(after.get("applicant").is_none());
}

#[actix_rt::test]
async fn test_finalize_requires_cv_even_with_cover_letter() {
    let ctx = create_test_context().await;
    let app = create_test_app(&ctx).await;
    let (recruiter, _) = recruiter_with_company(&app, "Lettre Seule").await;
    let (applicant, _) = register(&app, "APPLICANT", None).await;
    let (intruder, _) = register(&app, "APPLICANT", None).await;

    let offer = create_offer(&app, &recruiter, json!({})).await;
    let application_id = apply(&app, &applicant, offer["id"].as_str().unwrap()).await;
    let finalize_uri = format!("/api/v1/applications/{}/finalize", application_id);

    let (status, _) = send(
        &app,
        authed(test::TestRequest::post().uri(&finalize_uri), &applicant),
    )
    .await;
    assert_eq!(status, 400);

    let (status, _) = upload(
        &app,
        &applicant,
        &application_id,
        "COVER_LETTER",
        "lettre.docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        b"PK\x03\x04 lettre de motivation",
    )
    .await;
    assert_eq!(status, 201);

    let (status, body) = send(
        &app,
        authed(test::TestRequest::post().uri(&finalize_uri), &applicant),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "INVALID_INPUT");

    // Someone else's application
    let (status, _) = send(
        &app,
        authed(test::TestRequest::post().uri(&finalize_uri), &intruder),
    )
    .await;
    assert_eq!(status, 403);
}

#[actix_rt::test]
async fn test_duplicate_application_conflicts() {
    let ctx = create_test_context().await;
    let app = create_test_app(&ctx).await;
    let (recruiter, _) = recruiter_with_company(&app, "Doublons").await;
    let (applicant, _) = register(&app, "APPLICANT", None).await;

    let offer = create_offer(&app, &recruiter, json!({})).await;
    apply(&app, &applicant, offer["id"].as_str().unwrap()).await;

    let (status, body) = send(
        &app,
        authed(test::TestRequest::post().uri("/api/v1/applications"), &applicant)
            .set_json(json!({ "offerId": offer["id"] })),
    )
    .await;
    assert_eq!(status, 409);
    assert_eq!(body["error"], "CONFLICT");

    // Recruiters cannot apply at all
    let (status, _) = send(
        &app,
        authed(test::TestRequest::post().uri("/api/v1/applications"), &recruiter)
            .set_json(json!({ "offerId": offer["id"] })),
    )
    .await;
    assert_eq!(status, 403);
}

#[actix_rt::test]
async fn test_status_moves_forward_only() {
    let ctx = create_test_context().await;
    let app = create_test_app(&ctx).await;
    let (recruiter, _) = recruiter_with_company(&app, "Sens Unique").await;
    let (applicant, _) = register(&app, "APPLICANT", None).await;

    let offer = create_offer(&app, &recruiter, json!({})).await;
    let application_id = apply(&app, &applicant, offer["id"].as_str().unwrap()).await;
    let status_uri = format!("/api/v1/applications/{}/status", application_id);

    // The applicant cannot change the status
    let (status, _) = send(
        &app,
        authed(test::TestRequest::put().uri(&status_uri), &applicant)
            .set_json(json!({ "status": "VIEWED" })),
    )
    .await;
    assert_eq!(status, 403);

    let (status, body) = send(
        &app,
        authed(test::TestRequest::put().uri(&status_uri), &recruiter)
            .set_json(json!({ "status": "VIEWED" })),
    )
    .await;
    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["status"], "VIEWED");
    assert!(body["viewedAt"].is_string());
    let viewed_at = body["viewedAt"].clone();

    // Repeating is a no-op that keeps the first timestamp
    let (status, body) = send(
        &app,
        authed(test::TestRequest::put().uri(&status_uri), &recruiter)
            .set_json(json!({ "status": "VIEWED" })),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["viewedAt"], viewed_at);

    let (status, body) = send(
        &app,
        authed(test::TestRequest::put().uri(&status_uri), &recruiter)
            .set_json(json!({ "status": "NOT_VIEWED" })),
    )
    .await;
    assert_eq!(status, 409);
    assert_eq!(body["error"], "CONFLICT");

    let (_, current) = send(
        &app,
        authed(
            test::TestRequest::get().uri(&format!("/api/v1/applications/{}", application_id)),
            &applicant,
        ),
    )
    .await;
    assert_eq!(current["status"], "VIEWED");
}

#[actix_rt::test]
async fn test_offer_listing_is_scoped_and_owner_only() {
    let ctx = create_test_context().await;
    let app = create_test_app(&ctx).await;
    let (owner, _) = recruiter_with_company(&app, "Portée").await;
    let (other, _) = recruiter_with_company(&app, "Concurrent").await;
    let (first, _) = register(&app, "APPLICANT", None).await;
    let (second, _) = register(&app, "APPLICANT", None).await;

    let offer_a = create_offer(&app, &owner, json!({ "title": "Poste A" })).await;
    let offer_b = create_offer(&app, &owner, json!({ "title": "Poste B" })).await;
    let offer_a_id = offer_a["id"].as_str().unwrap();

    let on_a = apply(&app, &first, offer_a_id).await;
    apply(&app, &second, offer_b["id"].as_str().unwrap()).await;

    let uri = format!("/api/v1/applications/offer/{}", offer_a_id);
    let (status, body) = send(&app, authed(test::TestRequest::get().uri(&uri), &owner)).await;
    assert_eq!(status, 200);
    let applications = body["applications"].as_array().unwrap();
    assert_eq!(applications.len(), 1);
    assert_eq!(applications[0]["id"], on_a.as_str());
    assert_eq!(applications[0]["applicant"]["firstName"], "Camille");

    let (status, _) = send(&app, authed(test::TestRequest::get().uri(&uri), &other)).await;
    assert_eq!(status, 403);

    // Every offer of the recruiter
    let (status, body) = send(
        &app,
        authed(test::TestRequest::get().uri("/api/v1/applications/recruiter"), &owner),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["applications"].as_array().unwrap().len(), 2);

    let (_, body) = send(
        &app,
        authed(test::TestRequest::get().uri("/api/v1/applications/recruiter"), &other),
    )
    .await;
    assert!(body["applications"].as_array().unwrap().is_empty());

    // Another recruiter cannot read a single application either
    let (status, _) = send(
        &app,
        authed(
            test::TestRequest::get().uri(&format!("/api/v1/applications/{}", on_a)),
            &other,
        ),
    )
    .await;
    assert_eq!(status, 403);
}

#[actix_rt::test]
async fn test_bulk_mark_viewed_counts_outcomes() {
    let ctx = create_test_context().await;
    let app = create_test_app(&ctx).await;
    let (recruiter, _) = recruiter_with_company(&app, "En Masse").await;
    let (other, _) = recruiter_with_company(&app, "Voisin").await;

    let offer = create_offer(&app, &recruiter, json!({})).await;
    let offer_id = offer["id"].as_str().unwrap();

    let mut application_ids = Vec::new();
    for _ in 0..3 {
        let (applicant, _) = register(&app, "APPLICANT", None).await;
        application_ids.push(apply(&app, &applicant, offer_id).await);
    }

    // One already viewed
    let (status, _) = send(
        &app,
        authed(
            test::TestRequest::put()
                .uri(&format!("/api/v1/applications/{}/status", application_ids[0])),
            &recruiter,
        )
        .set_json(json!({ "status": "VIEWED" })),
    )
    .await;
    assert_eq!(status, 200);

    let uri = format!("/api/v1/applications/offer/{}/viewed", offer_id);
    let (status, _) = send(&app, authed(test::TestRequest::post().uri(&uri), &other)).await;
    assert_eq!(status, 403);

    let (status, body) = send(&app, authed(test::TestRequest::post().uri(&uri), &recruiter)).await;
    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["offerId"], offer_id);
    assert_eq!(body["updated"], 2);
    assert_eq!(body["alreadyViewed"], 1);
    assert_eq!(body["failed"], 0);

    let (_, body) = send(
        &app,
        authed(
            test::TestRequest::get().uri(&format!("/api/v1/applications/offer/{}", offer_id)),
            &recruiter,
        ),
    )
    .await;
    assert!(
        body["applications"]
            .as_array()
            .unwrap()
            .iter()
            .all(|a| a["status"] == "VIEWED")
    );
}

#[actix_rt::test]
async fn test_malformed_application_id_is_not_found() {
    let ctx = create_test_context().await;
    let app = create_test_app(&ctx).await;
    let (applicant, _) = register(&app, "APPLICANT", None).await;

    let (status, _) = send(
        &app,
        authed(
            test::TestRequest::get().uri("/api/v1/applications/not-a-uuid"),
            &applicant,
        ),
    )
    .await;
    assert_eq!(status, 404);
}
