//! Offer catalog: publishing, search, visibility and deletion.

use actix_web::test;
use serde_json::json;

use super::test_helpers::*;

#[actix_rt::test]
async fn test_recruiter_without_company_cannot_publish() {
    let ctx = create_test_context().await;
    let app = create_test_app(&ctx).await;
    let (token, _) = register(&app, "RECRUITER", None).await;

    let (status, body) = send(
        &app,
        authed(test::TestRequest::post().uri("/api/v1/offers"), &token).set_json(json!({
            "title": "Comptable",
            "description": "Tenue des comptes",
            "location": "Paris",
            "contract": ["CDD"],
            "experience": "SENIOR",
            "remote": "NO_REMOTE",
        })),
    )
    .await;
    assert_eq!(status, 400, "{}", body);
}

#[actix_rt::test]
async fn test_created_offer_carries_company_and_defaults_active() {
    let ctx = create_test_context().await;
    let app = create_test_app(&ctx).await;
    let (token, company_id) = recruiter_with_company(&app, "Inclusio").await;

    let offer = create_offer(&app, &token, json!({ "contract": ["CDI", "CDI", "STAGE"] })).await;
    assert_eq!(offer["status"], "ACTIVE");
    assert_eq!(offer["companyId"], company_id.as_str());
    assert_eq!(offer["companyName"], "Inclusio");
    assert_eq!(offer["contract"], json!(["CDI", "STAGE"]));
    assert_eq!(offer["applicationCount"], 0);
}

#[actix_rt::test]
async fn test_search_filters_and_pagination() {
    let ctx = create_test_context().await;
    let app = create_test_app(&ctx).await;
    let (token, company_id) = recruiter_with_company(&app, "Filtres SA").await;

    create_offer(
        &app,
        &token,
        json!({ "title": "Data analyst", "location": "Paris", "contract": ["CDD"], "remote": "FULL_REMOTE", "disabilityCompatible": ["VISUEL"] }),
    )
    .await;
    create_offer(
        &app,
        &token,
        json!({ "title": "Technicien support", "location": "Lyon", "contract": ["CDI", "ALTERNANCE"], "experience": "SENIOR" }),
    )
    .await;
    create_offer(&app, &token, json!({ "title": "Offre en pause", "status": "PAUSED" })).await;

    let list = |query: &str| {
        test::TestRequest::get().uri(&format!("/api/v1/offers{}", query))
    };

    // Paused offers never appear in the public catalog
    let (status, body) = send(&app, list("")).await;
    assert_eq!(status, 200);
    assert_eq!(body["pagination"]["total"], 2);
    // Newest first
    assert_eq!(body["offers"][0]["title"], "Technicien support");

    let (_, body) = send(&app, list("?contract=CDD,STAGE")).await;
    assert_eq!(body["offers"].as_array().unwrap().len(), 1);
    assert_eq!(body["offers"][0]["title"], "Data analyst");

    let (_, body) = send(&app, list("?search=SUPPORT&experience=SENIOR")).await;
    assert_eq!(body["offers"].as_array().unwrap().len(), 1);

    let (_, body) = send(&app, list("?disability=visuel&remote=FULL_REMOTE")).await;
    assert_eq!(body["offers"][0]["title"], "Data analyst");

    let (_, body) = send(&app, list(&format!("?companyId={}&limit=1&page=2", company_id))).await;
    assert_eq!(body["offers"].as_array().unwrap().len(), 1);
    assert_eq!(body["offers"][0]["title"], "Data analyst");
    assert_eq!(body["pagination"]["totalPages"], 2);

    let (status, body) = send(&app, list("?contract=FREELANCE")).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "INVALID_INPUT");
}

#[actix_rt::test]
async fn test_text_search_matches_title_description_and_location() {
    let ctx = create_test_context().await;
    let app = create_test_app(&ctx).await;
    let (token, _) = recruiter_with_company(&app, "Recherche SAS").await;

    create_offer(
        &app,
        &token,
        json!({ "title": "Gestionnaire de paie", "description": "Logiciel SILAE", "location": "Nantes" }),
    )
    .await;
    create_offer(
        &app,
        &token,
        json!({ "title": "Assistant RH", "description": "Accueil", "location": "Saint-Nazaire" }),
    )
    .await;
    create_offer(
        &app,
        &token,
        json!({ "title": "Chargé de mission 100% terrain", "location": "Rennes" }),
    )
    .await;

    let list = |query: &str| {
        test::TestRequest::get().uri(&format!("/api/v1/offers{}", query))
    };

    let (_, body) = send(&app, list("?search=silae")).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["offers"][0]["title"], "Gestionnaire de paie");

    // Search also looks at the location
    let (_, body) = send(&app, list("?search=NAZAIRE")).await;
    assert_eq!(body["offers"][0]["title"], "Assistant RH");

    let (_, body) = send(&app, list("?location=nant")).await;
    assert_eq!(body["pagination"]["total"], 1);

    // LIKE wildcards in the needle are literal
    let (_, body) = send(&app, list("?search=100%25")).await;
    assert_eq!(body["pagination"]["total"], 1);
    let (_, body) = send(&app, list("?search=%25")).await;
    assert_eq!(body["pagination"]["total"], 1);
    let (_, body) = send(&app, list("?search=_")).await;
    assert_eq!(body["pagination"]["total"], 0);

    // Text and set filters combine
    let (_, body) = send(&app, list("?search=assistant&contract=CDI")).await;
    assert_eq!(body["pagination"]["total"], 1);
    let (_, body) = send(&app, list("?search=assistant&contract=STAGE")).await;
    assert_eq!(body["pagination"]["total"], 0);

    let (_, body) = send(&app, list("?limit=2&page=2")).await;
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["offers"].as_array().unwrap().len(), 1);
    assert_eq!(body["offers"][0]["title"], "Gestionnaire de paie");
}

#[actix_rt::test]
async fn test_paused_offer_visible_only_to_owner() {
    let ctx = create_test_context().await;
    let app = create_test_app(&ctx).await;
    let (owner, _) = recruiter_with_company(&app, "Pause Corp").await;
    let (other, _) = recruiter_with_company(&app, "Autre Corp").await;
    let (applicant, _) = register(&app, "APPLICANT", None).await;

    let offer = create_offer(&app, &owner, json!({ "status": "PAUSED" })).await;
    let uri = format!("/api/v1/offers/{}", offer["id"].as_str().unwrap());

    let (status, _) = send(&app, test::TestRequest::get().uri(&uri)).await;
    assert_eq!(status, 404);
    let (status, _) = send(&app, authed(test::TestRequest::get().uri(&uri), &other)).await;
    assert_eq!(status, 404);
    let (status, body) = send(&app, authed(test::TestRequest::get().uri(&uri), &owner)).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "PAUSED");

    // Paused offers do not accept applications
    let (status, _) = send(
        &app,
        authed(test::TestRequest::post().uri("/api/v1/applications"), &applicant)
            .set_json(json!({ "offerId": offer["id"] })),
    )
    .await;
    assert_eq!(status, 404);
}

#[actix_rt::test]
async fn test_only_owner_updates_offer() {
    let ctx = create_test_context().await;
    let app = create_test_app(&ctx).await;
    let (owner, _) = recruiter_with_company(&app, "Maj SARL").await;
    let (other, _) = recruiter_with_company(&app, "Intrus SARL").await;

    let offer = create_offer(&app, &owner, json!({})).await;
    let uri = format!("/api/v1/offers/{}", offer["id"].as_str().unwrap());

    let (status, _) = send(
        &app,
        authed(test::TestRequest::put().uri(&uri), &other).set_json(json!({ "title": "Piraté" })),
    )
    .await;
    assert_eq!(status, 403);

    let (status, body) = send(
        &app,
        authed(test::TestRequest::put().uri(&uri), &owner)
            .set_json(json!({ "location": "Nantes", "status": "PAUSED" })),
    )
    .await;
    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["location"], "Nantes");
    assert_eq!(body["status"], "PAUSED");
    assert_eq!(body["title"], offer["title"]);

    let (status, _) = send(
        &app,
        authed(test::TestRequest::put().uri(&uri), &owner).set_json(json!({ "contract": [] })),
    )
    .await;
    assert_eq!(status, 400);
}

#[actix_rt::test]
async fn test_my_offers_lists_all_statuses_with_counts() {
    let ctx = create_test_context().await;
    let app = create_test_app(&ctx).await;
    let (recruiter, _) = recruiter_with_company(&app, "Compteurs").await;
    let (applicant, _) = register(&app, "APPLICANT", None).await;

    let active = create_offer(&app, &recruiter, json!({})).await;
    create_offer(&app, &recruiter, json!({ "status": "PAUSED" })).await;
    apply(&app, &applicant, active["id"].as_str().unwrap()).await;

    let (status, body) = send(
        &app,
        authed(test::TestRequest::get().uri("/api/v1/offers/mine"), &recruiter),
    )
    .await;
    assert_eq!(status, 200);
    let offers = body["offers"].as_array().unwrap();
    assert_eq!(offers.len(), 2);
    let counted = offers.iter().find(|o| o["id"] == active["id"]).unwrap();
    assert_eq!(counted["applicationCount"], 1);
}

#[actix_rt::test]
async fn test_offer_deletion_cascades() {
    let ctx = create_test_context().await;
    let app = create_test_app(&ctx).await;
    let (recruiter, _) = recruiter_with_company(&app, "Cascade").await;
    let (applicant, _) = register(&app, "APPLICANT", None).await;

    let offer = create_offer(&app, &recruiter, json!({})).await;
    let offer_id = offer["id"].as_str().unwrap();
    let application_id = apply(&app, &applicant, offer_id).await;
    let (status, document) = upload(
        &app,
        &applicant,
        &application_id,
        "CV",
        "cv.pdf",
        "application/pdf",
        &fake_pdf(1024),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(stored_file_count(&ctx), 1);

    let uri = format!("/api/v1/offers/{}", offer_id);
    let (status, _) = send(&app, authed(test::TestRequest::delete().uri(&uri), &applicant)).await;
    assert_eq!(status, 403);

    let (status, _) = send(&app, authed(test::TestRequest::delete().uri(&uri), &recruiter)).await;
    assert_eq!(status, 204);

    let (status, _) = send(&app, authed(test::TestRequest::get().uri(&uri), &recruiter)).await;
    assert_eq!(status, 404);
    let (status, _) = send(
        &app,
        authed(
            test::TestRequest::get().uri(&format!("/api/v1/applications/{}", application_id)),
            &applicant,
        ),
    )
    .await;
    assert_eq!(status, 404);
    let (status, _) = send(
        &app,
        authed(
            test::TestRequest::get()
                .uri(&format!("/api/v1/documents/{}", document["id"].as_str().unwrap())),
            &applicant,
        ),
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(stored_file_count(&ctx), 0);

    let (_, mine) = send(
        &app,
        authed(test::TestRequest::get().uri("/api/v1/applications/me"), &applicant),
    )
    .await;
    assert!(mine["applications"].as_array().unwrap().is_empty());
}
