use axum::http::StatusCode;
use serde_json::Value;
use tower::ServiceExt;

use vendex_core::api_types::ApiResponse;
use vendex_core::auth::{AuthenticatedUser, LoginResponse, RegistrationOutcome};
use vendex_core::users::{Gender, LoginRequest, RegisterRequest, roles};

mod common;
use common::{
    bearer_request, build_test_app, confirmation_token_from, empty_request,
    json_request, parse_json_response,
};

fn register_request(username: &str, email: &str) -> RegisterRequest {
    RegisterRequest {
        full_name: "Alice Smith".to_string(),
        email: email.to_string(),
        username: username.to_string(),
        password: "Str0ng@pass".to_string(),
        gender: Gender::Female,
    }
}

fn login_request(username: &str, password: &str) -> LoginRequest {
    LoginRequest {
        username: username.to_string(),
        password: password.to_string(),
    }
}

/// Walk the full account lifecycle end to end:
/// 1. Register a new user (account starts disabled, mail goes out)
/// 2. Confirm the account via the mailed token
/// 3. Login and receive a session token
/// 4. Use the token to fetch the current user
#[tokio::test]
async fn test_complete_account_flow() {
    let app = build_test_app().await;

    // Step 1: Register
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/register",
            &register_request("alice99", "alice@example.com"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: ApiResponse<RegistrationOutcome> =
        parse_json_response(response).await;
    assert_eq!(body.status, "success");
    let outcome = body.data.unwrap();
    assert_eq!(outcome.email, "alice@example.com");
    assert_eq!(app.mailer.sent_count(), 1);

    // Step 2: Login before confirmation is refused
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/login",
            &login_request("alice99", "Str0ng@pass"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Step 3: Confirm via the mailed token
    let token = confirmation_token_from(&app.mailer);
    let response = app
        .router
        .clone()
        .oneshot(empty_request(
            "GET",
            &format!("/api/v1/auth/confirm?token={token}"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Step 4: Login now succeeds with a session token
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/login",
            &login_request("alice99", "Str0ng@pass"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: ApiResponse<LoginResponse> = parse_json_response(response).await;
    let login = body.data.unwrap();
    assert_eq!(login.id, outcome.user_id);
    assert_eq!(login.username, "alice99");
    assert!(!login.token.is_empty());
    assert_eq!(login.roles, vec![roles::USER.to_string()]);
    assert_eq!(login.message, "Login Success");

    // Step 5: The token resolves the current user
    let response = app
        .router
        .clone()
        .oneshot(bearer_request("GET", "/api/v1/auth/me", &login.token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: ApiResponse<AuthenticatedUser> =
        parse_json_response(response).await;
    let me = body.data.unwrap();
    assert_eq!(me.id, outcome.user_id);
    assert_eq!(me.username, "alice99");
    assert_eq!(me.email, "alice@example.com");
    assert_eq!(me.roles, vec![roles::USER.to_string()]);
}

#[tokio::test]
async fn test_login_requires_confirmation() {
    let app = build_test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/register",
            &register_request("bob42", "bob@example.com"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/login",
            &login_request("bob42", "Str0ng@pass"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body: Value = parse_json_response(response).await;
    assert_eq!(
        body["error"]["message"],
        "User account is not enabled, please check your email to enable it"
    );
}

#[tokio::test]
async fn test_login_rejects_invalid_credentials() {
    let app = build_test_app().await;

    // Unknown username
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/login",
            &login_request("nosuchuser1", "Str0ng@pass"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body: Value = parse_json_response(response).await;
    assert_eq!(body["error"]["message"], "Invalid credentials");

    // Known username, wrong password: indistinguishable from the above
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/register",
            &register_request("carol7", "carol@example.com"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let token = confirmation_token_from(&app.mailer);
    let response = app
        .router
        .clone()
        .oneshot(empty_request(
            "GET",
            &format!("/api/v1/auth/confirm?token={token}"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/login",
            &login_request("carol7", "Wr0ng@pass"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body: Value = parse_json_response(response).await;
    assert_eq!(body["error"]["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_registration_validation() {
    let app = build_test_app().await;

    let mut request = register_request("dave3", "dave@example.com");
    request.password = "weakpass".to_string();

    let response = app
        .router
        .clone()
        .oneshot(json_request("POST", "/api/v1/auth/register", &request))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = parse_json_response(response).await;
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.starts_with("Validation error"), "got: {message}");

    // Nothing was persisted or mailed
    assert_eq!(app.store.user_count(), 0);
    assert_eq!(app.mailer.sent_count(), 0);
}

#[tokio::test]
async fn test_registration_rejects_unroutable_email_domain() {
    let app = build_test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/register",
            &register_request("erin5", "erin@domain.c"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = parse_json_response(response).await;
    assert_eq!(body["error"]["message"], "Invalid email domain");
    assert_eq!(app.store.user_count(), 0);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = build_test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/register",
            &register_request("frank8", "frank@example.com"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Same email, different username
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/register",
            &register_request("frank9", "frank@example.com"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body: Value = parse_json_response(response).await;
    assert_eq!(
        body["error"]["message"],
        "Email already exists. Login to your account!"
    );

    // Same username, different email
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/register",
            &register_request("frank8", "other@example.com"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body: Value = parse_json_response(response).await;
    assert_eq!(
        body["error"]["message"],
        "Username already exists. Choose another username!"
    );

    assert_eq!(app.store.user_count(), 1);
}

#[tokio::test]
async fn test_confirmation_token_is_single_use() {
    let app = build_test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/register",
            &register_request("grace2", "grace@example.com"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let token = confirmation_token_from(&app.mailer);
    let confirm_uri = format!("/api/v1/auth/confirm?token={token}");

    let response = app
        .router
        .clone()
        .oneshot(empty_request("GET", &confirm_uri))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .router
        .clone()
        .oneshot(empty_request("GET", &confirm_uri))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = parse_json_response(response).await;
    assert_eq!(
        body["error"]["message"],
        "Invalid or expired confirmation token"
    );
}

#[tokio::test]
async fn test_relogin_rotates_the_session_token() {
    let app = build_test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/register",
            &register_request("heidi6", "heidi@example.com"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: ApiResponse<RegistrationOutcome> =
        parse_json_response(response).await;
    let user_id = body.data.unwrap().user_id;

    let token = confirmation_token_from(&app.mailer);
    let response = app
        .router
        .clone()
        .oneshot(empty_request(
            "GET",
            &format!("/api/v1/auth/confirm?token={token}"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut tokens = Vec::new();
    for _ in 0..2 {
        let response = app
            .router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/auth/login",
                &login_request("heidi6", "Str0ng@pass"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: ApiResponse<LoginResponse> =
            parse_json_response(response).await;
        tokens.push(body.data.unwrap().token);
    }

    // Only the latest session survives
    assert_eq!(app.store.active_tokens_for(user_id), 1);

    let response = app
        .router
        .clone()
        .oneshot(bearer_request("GET", "/api/v1/auth/me", &tokens[0]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .router
        .clone()
        .oneshot(bearer_request("GET", "/api/v1/auth/me", &tokens[1]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_me_requires_bearer_token() {
    let app = build_test_app().await;

    // No Authorization header
    let response = app
        .router
        .clone()
        .oneshot(empty_request("GET", "/api/v1/auth/me"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body: Value = parse_json_response(response).await;
    assert_eq!(body["error"]["message"], "Missing authorization header");

    // Wrong scheme
    let response = app
        .router
        .clone()
        .oneshot(
            axum::http::Request::builder()
                .method("GET")
                .uri("/api/v1/auth/me")
                .header("authorization", "Basic dXNlcjpwYXNz")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body: Value = parse_json_response(response).await;
    assert_eq!(body["error"]["message"], "Invalid authorization header");

    // Bearer with an unparseable token
    let response = app
        .router
        .clone()
        .oneshot(bearer_request("GET", "/api/v1/auth/me", "not-a-jwt"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health() {
    let app = build_test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(empty_request("GET", "/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = parse_json_response(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "vendex-server");
}
