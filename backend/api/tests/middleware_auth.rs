//! Middleware behavior tests that run without a database.

use actix_web::{http::StatusCode, test, web, App, HttpResponse};
use uuid::Uuid;

use vibesync_api::middleware::{AuthUser, JwtAuthMiddleware, MaybeAuthUser, RequireRole};
use vibesync_api::security::jwt;
use vibesync_api::AppError;

const TEST_SECRET: &str = "integration-test-secret-0123456789";

fn init_keys() {
    jwt::initialize_secret(TEST_SECRET, 7).unwrap();
}

async fn whoami(auth: AuthUser) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "id": auth.id,
        "role": auth.role,
    }))
}

async fn maybe_whoami(maybe: MaybeAuthUser) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "authenticated": maybe.0.is_some(),
    }))
}

async fn ping() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "pong": true }))
}

// Issues a token the way the login handlers do.
async fn issue_token() -> Result<HttpResponse, AppError> {
    let token = jwt::generate_token(Uuid::new_v4(), "user@example.com", "user", "free")?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "token": token })))
}

#[actix_web::test]
async fn issued_tokens_pass_the_guard() {
    init_keys();

    let app = test::init_service(
        App::new()
            .route("/token", web::post().to(issue_token))
            .service(
                web::scope("/guarded")
                    .wrap(JwtAuthMiddleware)
                    .route("/whoami", web::get().to(whoami)),
            ),
    )
    .await;

    let req = test::TestRequest::post().uri("/token").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let token = body["token"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/guarded/whoami")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn guarded_route_rejects_missing_token() {
    init_keys();

    let app = test::init_service(
        App::new().service(
            web::scope("/guarded")
                .wrap(JwtAuthMiddleware)
                .route("/whoami", web::get().to(whoami)),
        ),
    )
    .await;

    let req = test::TestRequest::get().uri("/guarded/whoami").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn guarded_route_rejects_garbage_token() {
    init_keys();

    let app = test::init_service(
        App::new().service(
            web::scope("/guarded")
                .wrap(JwtAuthMiddleware)
                .route("/whoami", web::get().to(whoami)),
        ),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/guarded/whoami")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn guarded_route_accepts_valid_token() {
    init_keys();

    let user_id = Uuid::new_v4();
    let token = jwt::generate_token(user_id, "user@example.com", "user", "free").unwrap();

    let app = test::init_service(
        App::new().service(
            web::scope("/guarded")
                .wrap(JwtAuthMiddleware)
                .route("/whoami", web::get().to(whoami)),
        ),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/guarded/whoami")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["id"], user_id.to_string());
    assert_eq!(body["role"], "user");
}

#[actix_web::test]
async fn extractor_falls_back_to_header_outside_wrapped_scope() {
    init_keys();

    let token = jwt::generate_token(Uuid::new_v4(), "user@example.com", "user", "free").unwrap();

    // No middleware wrap: the extractor validates the header itself.
    let app = test::init_service(
        App::new().route("/whoami", web::get().to(whoami)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/whoami")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/whoami").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn maybe_auth_user_never_fails() {
    init_keys();

    let app = test::init_service(
        App::new().route("/public", web::get().to(maybe_whoami)),
    )
    .await;

    let req = test::TestRequest::get().uri("/public").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["authenticated"], false);

    let token = jwt::generate_token(Uuid::new_v4(), "user@example.com", "user", "free").unwrap();
    let req = test::TestRequest::get()
        .uri("/public")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["authenticated"], true);
}

#[actix_web::test]
async fn admin_scope_enforces_role() {
    init_keys();

    let app = test::init_service(
        App::new().service(
            web::scope("/admin-only")
                .wrap(RequireRole::admin())
                .wrap(JwtAuthMiddleware)
                .route("/ping", web::get().to(ping)),
        ),
    )
    .await;

    // Regular user: authenticated but forbidden.
    let user_token =
        jwt::generate_token(Uuid::new_v4(), "user@example.com", "user", "free").unwrap();
    let req = test::TestRequest::get()
        .uri("/admin-only/ping")
        .insert_header(("Authorization", format!("Bearer {}", user_token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Admin passes.
    let admin_token =
        jwt::generate_token(Uuid::new_v4(), "admin@example.com", "admin", "free").unwrap();
    let req = test::TestRequest::get()
        .uri("/admin-only/ping")
        .insert_header(("Authorization", format!("Bearer {}", admin_token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // No token at all: the role guard never runs, JWT middleware answers 401.
    let req = test::TestRequest::get().uri("/admin-only/ping").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn artist_scope_rejects_regular_user() {
    init_keys();

    let app = test::init_service(
        App::new().service(
            web::scope("/artist-only")
                .wrap(RequireRole::artist())
                .wrap(JwtAuthMiddleware)
                .route("/ping", web::get().to(ping)),
        ),
    )
    .await;

    let user_token =
        jwt::generate_token(Uuid::new_v4(), "user@example.com", "user", "free").unwrap();
    let req = test::TestRequest::get()
        .uri("/artist-only/ping")
        .insert_header(("Authorization", format!("Bearer {}", user_token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let artist_token =
        jwt::generate_token(Uuid::new_v4(), "artist@example.com", "artist", "pro").unwrap();
    let req = test::TestRequest::get()
        .uri("/artist-only/ping")
        .insert_header(("Authorization", format!("Bearer {}", artist_token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
