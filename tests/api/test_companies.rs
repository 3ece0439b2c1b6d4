//! Company directory.

use actix_web::test;
use handi_lib::entity::user;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;
use uuid::Uuid;

use super::test_helpers::*;

#[actix_rt::test]
async fn test_recruiter_creating_company_is_attached_to_it() {
    let ctx = create_test_context().await;
    let app = create_test_app(&ctx).await;

    let (token, company_id) = recruiter_with_company(&app, "Atelier Inclusif").await;

    let (status, me) = send(
        &app,
        authed(test::TestRequest::get().uri("/api/v1/auth/me"), &token),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(me["companyId"], company_id.as_str());

    // A second company leaves the existing employer unchanged
    let (status, _) = send(
        &app,
        authed(test::TestRequest::post().uri("/api/v1/companies"), &token)
            .set_json(json!({ "name": "Seconde Boîte" })),
    )
    .await;
    assert_eq!(status, 201);
    let (_, me) = send(
        &app,
        authed(test::TestRequest::get().uri("/api/v1/auth/me"), &token),
    )
    .await;
    assert_eq!(me["companyId"], company_id.as_str());
}

#[actix_rt::test]
async fn test_company_names_are_unique_case_insensitively() {
    let ctx = create_test_context().await;
    let app = create_test_app(&ctx).await;
    let admin = admin_token(&ctx).await;

    let (first, _) = send(
        &app,
        authed(test::TestRequest::post().uri("/api/v1/companies"), &admin)
            .set_json(json!({ "name": "Handicap Solutions" })),
    )
    .await;
    let (second, body) = send(
        &app,
        authed(test::TestRequest::post().uri("/api/v1/companies"), &admin)
            .set_json(json!({ "name": "  handicap solutions " })),
    )
    .await;

    assert_eq!(first, 201);
    assert_eq!(second, 409, "{}", body);
}

#[actix_rt::test]
async fn test_directory_counts_active_offers_sorted_by_name() {
    let ctx = create_test_context().await;
    let app = create_test_app(&ctx).await;

    let (zeta, zeta_id) = recruiter_with_company(&app, "Zeta Conseil").await;
    let (_, alpha_id) = recruiter_with_company(&app, "alpha Industrie").await;

    create_offer(&app, &zeta, json!({})).await;
    create_offer(&app, &zeta, json!({ "status": "PAUSED" })).await;

    let (status, body) = send(&app, test::TestRequest::get().uri("/api/v1/companies")).await;
    assert_eq!(status, 200);
    let companies = body["companies"].as_array().unwrap();
    assert_eq!(companies.len(), 2);
    assert_eq!(companies[0]["id"], alpha_id.as_str());
    assert_eq!(companies[0]["offerCount"], 0);
    assert_eq!(companies[1]["id"], zeta_id.as_str());
    assert_eq!(companies[1]["offerCount"], 1);

    let (status, body) = send(
        &app,
        test::TestRequest::get().uri(&format!("/api/v1/companies/{}", zeta_id)),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["name"], "Zeta Conseil");
    assert_eq!(body["offerCount"], 1);
}

#[actix_rt::test]
async fn test_unknown_company_is_not_found() {
    let ctx = create_test_context().await;
    let app = create_test_app(&ctx).await;

    let (status, _) = send(
        &app,
        test::TestRequest::get().uri(&format!("/api/v1/companies/{}", uuid::Uuid::new_v4())),
    )
    .await;
    assert_eq!(status, 404);

    // Registering against a missing company fails too
    let (status, _) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(json!({
                "email": unique_email("orphan"),
                "password": "password-123",
                "firstName": "A",
                "lastName": "B",
                "role": "RECRUITER",
                "companyId": uuid::Uuid::new_v4(),
            })),
    )
    .await;
    assert_eq!(status, 404);
}

#[actix_rt::test]
async fn test_backfill_attaches_recruiters_to_latest_offer_company() {
    let ctx = create_test_context().await;
    let app = create_test_app(&ctx).await;

    let (token, _) = recruiter_with_company(&app, "Ancienne Maison").await;
    let (_, newer_company) = recruiter_with_company(&app, "Nouvelle Maison").await;
    let newer_company = Uuid::parse_str(&newer_company).unwrap();
    let (_, me) = send(
        &app,
        authed(test::TestRequest::get().uri("/api/v1/auth/me"), &token),
    )
    .await;
    let recruiter_id = Uuid::parse_str(me["id"].as_str().unwrap()).unwrap();

    create_offer(&app, &token, json!({ "title": "Premier poste" })).await;
    ctx.pool
        .set_user_company(recruiter_id, newer_company)
        .await
        .unwrap();
    create_offer(&app, &token, json!({ "title": "Second poste" })).await;

    // Recruiter loses the company link, as accounts created before it existed
    user::Entity::update_many()
        .col_expr(user::Column::CompanyId, Expr::value(Option::<Uuid>::None))
        .filter(user::Column::Id.eq(recruiter_id))
        .exec(ctx.pool.connection())
        .await
        .unwrap();
    let (_, idle_id) = register(&app, "RECRUITER", None).await;
    let idle_id = Uuid::parse_str(&idle_id).unwrap();

    assert_eq!(ctx.pool.backfill_recruiter_companies().await.unwrap(), 1);

    let recruiter = ctx.pool.get_user(recruiter_id).await.unwrap().unwrap();
    assert_eq!(recruiter.company_id, Some(newer_company));
    let idle = ctx.pool.get_user(idle_id).await.unwrap().unwrap();
    assert_eq!(idle.company_id, None);

    // Nothing left to do on a second run
    assert_eq!(ctx.pool.backfill_recruiter_companies().await.unwrap(), 0);
}
