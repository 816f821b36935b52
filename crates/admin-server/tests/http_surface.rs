//! HTTP-level tests for the auth routes.

use admin_config::AdminConfig;
use admin_server::{router, AppState};
use auth_core::{Provider, Session, SessionUser};
use axum::body::Body;
use axum::http::header::{COOKIE, LOCATION, SET_COOKIE};
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use github_client::GithubClient;
use login_flow::LoginFlow;
use relay_client::RelayClient;
use serde_json::{json, Value};
use session_cookies::SessionStore;
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn local_config() -> AdminConfig {
    AdminConfig {
        github_client_id: Some("local-id".to_string()),
        github_client_secret: Some("local-secret".to_string()),
        repo_owner: "acme".to_string(),
        repo_slug: "site".to_string(),
        public_url: "https://site.example.com".to_string(),
        ..Default::default()
    }
}

fn sample_session() -> Session {
    Session {
        user: SessionUser {
            name: "Ada Lovelace".to_string(),
            login: "ada".to_string(),
            email: "ada@example.com".to_string(),
            avatar_url: None,
        },
        provider: Provider::MagicLink,
        access_token: "access-abc".to_string(),
        refresh_token: "refresh-def".to_string(),
        expires_at: Utc::now() + Duration::hours(1),
        refresh_token_expires_at: None,
    }
}

/// Render a Cookie request header for a session written by `store`.
fn cookie_header(store: &SessionStore, session: &Session) -> String {
    let jar = store
        .write(axum_extra::extract::CookieJar::new(), session)
        .unwrap();
    jar.iter()
        .map(|cookie| format!("{}={}", cookie.name(), cookie.value()))
        .collect::<Vec<_>>()
        .join("; ")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn user_without_a_session_is_unauthorized() {
    let app = router(AppState::new(local_config()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/outstatic/user")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_returns_the_session_without_the_refresh_token() {
    let config = local_config();
    let state = AppState::new(config);
    let cookies = cookie_header(&state.store, &sample_session());
    let app = router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/outstatic/user")
                .header(COOKIE, cookies)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["session"]["user"]["login"], "ada");
    assert_eq!(body["session"]["access_token"], "access-abc");
    assert!(body["session"].get("refresh_token").is_none());
}

#[tokio::test]
async fn login_without_configuration_is_a_structured_error() {
    let app = router(AppState::new(AdminConfig::default()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/outstatic/login?provider=github")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "auth-not-configured");
}

#[tokio::test]
async fn local_login_returns_the_authorize_url() {
    let app = router(AppState::new(local_config()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/outstatic/login")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let url = body["url"].as_str().unwrap();
    assert!(url.starts_with("https://github.com/login/oauth/authorize"));
    assert!(url.contains("client_id=local-id"));
}

#[tokio::test]
async fn google_login_redirects_the_error_to_the_return_url() {
    // No relay key configured: google login cannot start.
    let app = router(AppState::new(local_config()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/outstatic/login/google?return_url=/outstatic")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers()[LOCATION],
        "/outstatic?error=auth-not-configured"
    );
}

// End-to-end: local credentials, `?code=abc`, collaborator=true - 307 to
// the dashboard with both cookies set and a github session persisted.
#[tokio::test]
async fn code_callback_sets_cookies_and_redirects_to_the_dashboard() {
    let github = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login/oauth/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "gho_access",
            "refresh_token": "ghr_refresh",
            "expires_in": 28800,
        })))
        .mount(&github)
        .await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "login": "ada",
            "name": "Ada Lovelace",
            "email": "ada@example.com",
        })))
        .mount(&github)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/site/collaborators/ada"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&github)
        .await;

    let config = local_config();
    let flow = LoginFlow::with_clients(
        &config,
        Some(GithubClient::new("local-id", "local-secret").with_endpoints(github.uri(), github.uri())),
        None,
    );
    let state = AppState::with_flow(config, flow);
    let store = state.store.clone();
    let app = router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/outstatic/callback?code=abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[LOCATION], "/outstatic");

    let set_cookies: Vec<String> = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert!(set_cookies.iter().any(|c| c.starts_with("ost_session=")));
    assert!(set_cookies
        .iter()
        .any(|c| c.starts_with("ost_refresh_token=ghr_refresh")));

    // The sealed session round-trips through the store with the github
    // provider recorded.
    let sealed = set_cookies
        .iter()
        .find(|c| c.starts_with("ost_session="))
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .trim_start_matches("ost_session=")
        .to_string();
    let jar = axum_extra::extract::CookieJar::new().add(
        axum_extra::extract::cookie::Cookie::new("ost_session", sealed),
    );
    let stored = store.read(&jar).unwrap();
    assert_eq!(stored.provider, Provider::Github);
    assert_eq!(stored.user.login, "ada");
}

#[tokio::test]
async fn error_callback_passes_the_code_to_the_dashboard() {
    let app = router(AppState::new(local_config()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/outstatic/callback?error=not-collaborator")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers()[LOCATION],
        "/outstatic?error=not-collaborator"
    );
}

// End-to-end: a magic-link callback whose return URL points at a foreign
// origin redirects to the dashboard with `callback_error` and never to the
// malicious host.
#[tokio::test]
async fn magic_link_callback_rejects_a_foreign_return_url() {
    let relay = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/exchange-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {"email": "ada@example.com", "login": "ada"},
            "session": {
                "access_token": "relay-at",
                "refresh_token": "relay-rt",
                "expires_at": "2026-08-07T12:00:00Z",
            },
            "return_url": "https://evil.example.com/outstatic",
        })))
        .mount(&relay)
        .await;

    let config = AdminConfig {
        relay_api_key: Some("relay-key".to_string()),
        public_url: "https://site.example.com".to_string(),
        ..Default::default()
    };
    let flow = LoginFlow::with_clients(
        &config,
        None,
        Some(RelayClient::new(relay.uri(), "relay-key")),
    );
    let app = router(AppState::with_flow(config, flow));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/outstatic/magic-link-callback?exchange_token=xyz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers()[LOCATION],
        "/outstatic?error=callback_error"
    );
    // No session cookie accompanies the rejection.
    assert!(response.headers().get_all(SET_COOKIE).iter().next().is_none());
}

#[tokio::test]
async fn refresh_without_cookies_is_unauthorized() {
    let app = router(AppState::new(local_config()));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/outstatic/refresh")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn refresh_redeems_against_the_relay_and_rewrites_cookies() {
    let relay = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .and(body_string_contains("refresh-def"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session": {
                "access_token": "at-new",
                "refresh_token": "rt-new",
                "expires_at": "2026-08-07T13:00:00Z",
            },
        })))
        .mount(&relay)
        .await;

    let config = AdminConfig {
        relay_api_key: Some("relay-key".to_string()),
        ..Default::default()
    };
    let state = AppState::new(config)
        .with_refresh_clients(None, Some(RelayClient::new(relay.uri(), "relay-key")));
    let cookies = cookie_header(&state.store, &sample_session());
    let app = router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/outstatic/refresh")
                .header(COOKIE, cookies)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let set_cookies: Vec<String> = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert!(set_cookies
        .iter()
        .any(|c| c.starts_with("ost_refresh_token=rt-new")));
}

#[tokio::test]
async fn failed_refresh_clears_the_session() {
    let relay = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("revoked"))
        .mount(&relay)
        .await;

    let config = AdminConfig {
        relay_api_key: Some("relay-key".to_string()),
        ..Default::default()
    };
    let state = AppState::new(config)
        .with_refresh_clients(None, Some(RelayClient::new(relay.uri(), "relay-key")));
    let cookies = cookie_header(&state.store, &sample_session());
    let app = router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/outstatic/refresh")
                .header(COOKIE, cookies)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn signout_clears_cookies_and_redirects() {
    let state = AppState::new(local_config());
    let cookies = cookie_header(&state.store, &sample_session());
    let app = router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/outstatic/signout")
                .header(COOKIE, cookies)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[LOCATION], "/outstatic");

    let set_cookies: Vec<String> = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert!(set_cookies.iter().any(|c| c.starts_with("ost_session=;")));
    assert!(set_cookies
        .iter()
        .any(|c| c.starts_with("ost_refresh_token=;")));
}
