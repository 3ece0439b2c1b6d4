//! Registration, login and role gating.

use actix_web::test;
use serde_json::json;

use super::test_helpers::*;

#[actix_rt::test]
async fn test_register_then_login() {
    let ctx = create_test_context().await;
    let app = create_test_app(&ctx).await;

    let email = unique_email("Login");
    let (status, body) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(json!({
                "email": email,
                "password": "long-enough-password",
                "firstName": "Léa",
                "lastName": "Durand",
                "role": "APPLICANT",
            })),
    )
    .await;
    assert_eq!(status, 201, "{}", body);
    assert_eq!(body["user"]["email"], email.to_lowercase());
    assert!(body["user"].get("passwordHash").is_none());

    // Email matching is case-insensitive
    let (status, body) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({ "email": email.to_uppercase(), "password": "long-enough-password" })),
    )
    .await;
    assert_eq!(status, 200, "{}", body);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, me) = send(
        &app,
        authed(test::TestRequest::get().uri("/api/v1/auth/me"), &token),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(me["role"], "APPLICANT");
    assert_eq!(me["firstName"], "Léa");
}

#[actix_rt::test]
async fn test_login_failures_are_indistinguishable() {
    let ctx = create_test_context().await;
    let app = create_test_app(&ctx).await;

    let email = unique_email("wrongpass");
    let (status, _) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(json!({
                "email": email,
                "password": "the-right-password",
                "firstName": "A",
                "lastName": "B",
                "role": "RECRUITER",
            })),
    )
    .await;
    assert_eq!(status, 201);

    let (wrong_status, wrong_body) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({ "email": email, "password": "not-the-password" })),
    )
    .await;
    let (unknown_status, unknown_body) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({ "email": unique_email("nobody"), "password": "whatever-123" })),
    )
    .await;

    assert_eq!(wrong_status, 401);
    assert_eq!(unknown_status, 401);
    assert_eq!(wrong_body["message"], unknown_body["message"]);
}

#[actix_rt::test]
async fn test_duplicate_email_conflicts() {
    let ctx = create_test_context().await;
    let app = create_test_app(&ctx).await;

    let body = json!({
        "email": "dup@handi.test",
        "password": "password-123",
        "firstName": "A",
        "lastName": "B",
        "role": "APPLICANT",
    });
    let (first, _) = send(
        &app,
        test::TestRequest::post().uri("/api/v1/auth/register").set_json(&body),
    )
    .await;
    let (second, err) = send(
        &app,
        test::TestRequest::post().uri("/api/v1/auth/register").set_json(&body),
    )
    .await;

    assert_eq!(first, 201);
    assert_eq!(second, 409);
    assert_eq!(err["error"], "CONFLICT");
}

#[actix_rt::test]
async fn test_register_rejects_admin_and_short_password() {
    let ctx = create_test_context().await;
    let app = create_test_app(&ctx).await;

    let (status, _) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(json!({
                "email": unique_email("admin"),
                "password": "password-123",
                "firstName": "A",
                "lastName": "B",
                "role": "ADMIN",
            })),
    )
    .await;
    assert_eq!(status, 400);

    let (status, body) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(json!({
                "email": unique_email("short"),
                "password": "short",
                "firstName": "A",
                "lastName": "B",
                "role": "APPLICANT",
            })),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "INVALID_INPUT");
}

#[actix_rt::test]
async fn test_missing_or_bad_token_is_unauthorized() {
    let ctx = create_test_context().await;
    let app = create_test_app(&ctx).await;

    let (status, body) = send(&app, test::TestRequest::get().uri("/api/v1/auth/me")).await;
    assert_eq!(status, 401);
    assert_eq!(body["error"], "UNAUTHORIZED");

    let (status, _) = send(
        &app,
        authed(test::TestRequest::get().uri("/api/v1/applications/me"), "not-a-jwt"),
    )
    .await;
    assert_eq!(status, 401);
}

#[actix_rt::test]
async fn test_role_gating_forbids_wrong_role() {
    let ctx = create_test_context().await;
    let app = create_test_app(&ctx).await;

    let (applicant, _) = register(&app, "APPLICANT", None).await;
    let (recruiter, _) = register(&app, "RECRUITER", None).await;

    // Applicants cannot publish offers or create companies
    let (status, _) = send(
        &app,
        authed(test::TestRequest::get().uri("/api/v1/offers/mine"), &applicant),
    )
    .await;
    assert_eq!(status, 403);
    let (status, _) = send(
        &app,
        authed(test::TestRequest::post().uri("/api/v1/companies"), &applicant)
            .set_json(json!({ "name": "Nope" })),
    )
    .await;
    assert_eq!(status, 403);

    // Recruiters cannot list applicant applications
    let (status, body) = send(
        &app,
        authed(test::TestRequest::get().uri("/api/v1/applications/me"), &recruiter),
    )
    .await;
    assert_eq!(status, 403);
    assert_eq!(body["error"], "FORBIDDEN");
}

#[actix_rt::test]
async fn test_health_is_public() {
    let ctx = create_test_context().await;
    let app = create_test_app(&ctx).await;

    let (status, body) = send(&app, test::TestRequest::get().uri("/api/v1/health")).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, test::TestRequest::get().uri("/api/v1/ready")).await;
    assert_eq!(status, 200);
    assert_eq!(body["database"], "connected");
}
