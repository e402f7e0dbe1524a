//! Client tests against a scripted portal.

use serde_json::json;
use stromer_core::{Credentials, LightMode};
use stromer_fetch::{ApiError, AuthState, AuthStep, ErrorKind, StromerClient};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "tok-1";

struct Paths {
    login: &'static str,
    authorize: &'static str,
    token: &'static str,
    prefix: &'static str,
}

const CURRENT: Paths = Paths {
    login: "/mobile/v4/login/",
    authorize: "/mobile/v4/o/authorize/",
    token: "/mobile/v4/o/token/",
    prefix: "/rapi/mobile/v4.1/",
};

const LEGACY: Paths = Paths {
    login: "/users/login/",
    authorize: "/o/authorize/",
    token: "/o/token/",
    prefix: "/rapi/mobile/v2/",
};

fn current_credentials() -> Credentials {
    Credentials::new("rider@example.com", "hunter2", "client-v4", None)
}

fn legacy_credentials() -> Credentials {
    Credentials::new("rider@example.com", "hunter2", "client-v3", Some("s3cret".to_string()))
}

async fn mount_login(server: &MockServer, paths: &Paths) {
    Mock::given(method("GET"))
        .and(path(paths.login))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "csrftoken=csrf123; Path=/"),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(paths.login))
        .and(body_string_contains("csrfmiddlewaretoken=csrf123"))
        .and(body_string_contains("username=rider%40example.com"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{}?client_id=x", paths.authorize).as_str()),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(paths.authorize))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", "stromerauth://auth?code=CODE42"),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(paths.token))
        .and(body_string_contains("code=CODE42"))
        .and(body_string_contains("grant_type=authorization_code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": TOKEN,
            "token_type": "Bearer",
        })))
        .mount(server)
        .await;
}

async fn mount_resources(server: &MockServer, paths: &Paths) {
    let auth = format!("Bearer {TOKEN}");

    Mock::given(method("GET"))
        .and(path(format!("{}bike/", paths.prefix)))
        .and(header("authorization", auth.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"bikeid": 4711, "nickname": "Commuter", "bikemodel": "ST3"},
                {"bikeid": "4712", "nickname": "Spare", "bikemodel": "ST1"}
            ]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{}bike/4711/state/", paths.prefix)))
        .and(query_param("cached", "false"))
        .and(header("authorization", auth.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"battery_SOC": 81, "lock_flag": false, "light_on": 0, "rcvts": 1_700_000_000}]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{}bike/4711/position/", paths.prefix)))
        .and(header("authorization", auth.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"latitude": 47.37, "longitude": 8.54, "rcvts": 1_700_000_100}]
        })))
        .mount(server)
        .await;
}

async fn connected_client(server: &MockServer, credentials: Credentials) -> StromerClient {
    let mut client = StromerClient::with_base_url(credentials, &server.uri()).unwrap();
    assert!(client.connect().await.unwrap());
    client
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_current_dialect_login_detect_and_poll() {
    let server = MockServer::start().await;
    mount_login(&server, &CURRENT).await;
    mount_resources(&server, &CURRENT).await;

    let client = connected_client(&server, current_credentials()).await;
    assert_eq!(client.auth_state(), AuthState::Authenticated);

    let bikes = client.detect_bikes().await.unwrap();
    assert_eq!(bikes.len(), 2);
    assert_eq!(bikes[0].id, "4711");
    assert_eq!(bikes[0].model, "ST3");
    assert_eq!(bikes[1].nickname, "Spare");

    let snapshot = client.poll("4711").await.unwrap();
    assert_eq!(snapshot.bike_id, "4711");
    assert_eq!(snapshot.name, "Commuter");
    assert_eq!(snapshot.model, bikes[0].model);
    assert_eq!(snapshot.battery_soc(), Some(81.0));
    assert_eq!(snapshot.is_locked(), Some(false));
    assert_eq!(snapshot.latitude(), Some(47.37));
    assert!(snapshot.get("rcvts_pos").is_some());
}

#[tokio::test]
async fn test_legacy_dialect_uses_only_legacy_paths() {
    let server = MockServer::start().await;
    mount_login(&server, &LEGACY).await;
    mount_resources(&server, &LEGACY).await;

    Mock::given(method("POST"))
        .and(path(format!("{}bike/4711/settings/", LEGACY.prefix)))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{}bike/4711/light/", LEGACY.prefix)))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{}bike/id/4711/trip_data/", LEGACY.prefix)))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = connected_client(&server, legacy_credentials()).await;
    client.poll("4711").await.unwrap();
    client.set_lock("4711", true).await.unwrap();
    client.set_light("4711", LightMode::On).await.unwrap();
    client.reset_trip_data("4711").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let current_paths = ["/mobile/v4/", "/rapi/mobile/v4.1/"];
    for request in &requests {
        let p = request.url.path();
        assert!(
            !current_paths.iter().any(|c| p.starts_with(c)),
            "unexpected current-dialect path {p}"
        );
    }

    let token_request = requests
        .iter()
        .find(|r| r.url.path() == LEGACY.token)
        .unwrap();
    let body = String::from_utf8_lossy(&token_request.body);
    assert!(body.contains("client_secret=s3cret"));
    assert!(body.contains("redirect_uri=stromerauth%3A%2F%2Fauth"));
}

#[tokio::test]
async fn test_current_dialect_sends_no_client_secret() {
    let server = MockServer::start().await;
    mount_login(&server, &CURRENT).await;

    connected_client(&server, current_credentials()).await;

    let requests = server.received_requests().await.unwrap();
    let token_request = requests.iter().find(|r| r.url.path() == CURRENT.token).unwrap();
    let body = String::from_utf8_lossy(&token_request.body);
    assert!(!body.contains("client_secret"));
    assert!(body.contains("redirect_uri=stromer%3A%2F%2Fauth"));

    let form = requests
        .iter()
        .find(|r| r.url.path() == CURRENT.login && r.method.as_str() == "POST")
        .unwrap();
    assert!(form.headers.contains_key("referer"));
}

#[tokio::test]
async fn test_missing_csrf_cookie_fails_login() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CURRENT.login))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut client = StromerClient::with_base_url(current_credentials(), &server.uri()).unwrap();
    let err = client.connect().await.unwrap_err();

    assert!(matches!(
        err,
        ApiError::Authentication {
            step: AuthStep::LoginPage,
            ..
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert_eq!(client.auth_state(), AuthState::AuthFailed);
    assert!(!client.is_connected());
}

#[tokio::test]
async fn test_rejected_credentials_fail_without_leaking_password() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CURRENT.login))
        .respond_with(
            ResponseTemplate::new(200).insert_header("Set-Cookie", "csrftoken=csrf123; Path=/"),
        )
        .mount(&server)
        .await;
    // Wrong password: the form is re-rendered instead of redirecting.
    Mock::given(method("POST"))
        .and(path(CURRENT.login))
        .respond_with(ResponseTemplate::new(200).set_body_string("<form>...</form>"))
        .mount(&server)
        .await;

    let mut client = StromerClient::with_base_url(current_credentials(), &server.uri()).unwrap();
    let err = client.connect().await.unwrap_err();

    assert!(matches!(
        err,
        ApiError::Authentication {
            step: AuthStep::SubmitCredentials,
            ..
        }
    ));
    let message = err.to_string();
    assert!(!message.contains("hunter2"));
    assert!(!message.contains("csrf123"));
}

#[tokio::test]
async fn test_missing_access_token_fails_login() {
    let server = MockServer::start().await;
    mount_login(&server, &CURRENT).await;
    Mock::given(method("POST"))
        .and(path(CURRENT.token))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "invalid_grant"})))
        .with_priority(1)
        .mount(&server)
        .await;

    let mut client = StromerClient::with_base_url(current_credentials(), &server.uri()).unwrap();
    let err = client.connect().await.unwrap_err();
    assert!(matches!(
        err,
        ApiError::Authentication {
            step: AuthStep::TokenExchange,
            ..
        }
    ));
}

#[tokio::test]
async fn test_reconnect_replaces_session() {
    let server = MockServer::start().await;
    mount_login(&server, &CURRENT).await;

    let mut client = connected_client(&server, current_credentials()).await;
    client.disconnect().await;
    assert!(!client.is_connected());
    assert_eq!(client.auth_state(), AuthState::Unauthenticated);

    assert!(client.connect().await.unwrap());
    assert!(client.is_connected());

    let requests = server.received_requests().await.unwrap();
    let logins = requests
        .iter()
        .filter(|r| r.url.path() == CURRENT.token)
        .count();
    assert_eq!(logins, 2);
}

// ============================================================================
// Polling failures
// ============================================================================

#[tokio::test]
async fn test_server_error_is_transient() {
    let server = MockServer::start().await;
    mount_login(&server, &CURRENT).await;
    Mock::given(method("GET"))
        .and(path(format!("{}bike/", CURRENT.prefix)))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = connected_client(&server, current_credentials()).await;
    let err = client.detect_bikes().await.unwrap_err();

    assert!(matches!(err, ApiError::Status { status: 500, .. }));
    assert_eq!(err.kind(), ErrorKind::Transient);
    assert!(!err.to_string().contains(TOKEN));
}

#[tokio::test]
async fn test_malformed_json_is_transient() {
    let server = MockServer::start().await;
    mount_login(&server, &CURRENT).await;
    Mock::given(method("GET"))
        .and(path(format!("{}bike/", CURRENT.prefix)))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let client = connected_client(&server, current_credentials()).await;
    let err = client.detect_bikes().await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidResponse { .. }));
    assert_eq!(err.kind(), ErrorKind::Transient);
}

#[tokio::test]
async fn test_failed_position_fails_whole_poll() {
    let server = MockServer::start().await;
    mount_login(&server, &CURRENT).await;
    Mock::given(method("GET"))
        .and(path(format!("{}bike/4711/position/", CURRENT.prefix)))
        .respond_with(ResponseTemplate::new(502))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_resources(&server, &CURRENT).await;

    let client = connected_client(&server, current_credentials()).await;
    let err = client.poll("4711").await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 502, .. }));
}

#[tokio::test]
async fn test_poll_unknown_bike_fails() {
    let server = MockServer::start().await;
    mount_login(&server, &CURRENT).await;
    mount_resources(&server, &CURRENT).await;

    let client = connected_client(&server, current_credentials()).await;
    let err = client.poll("9999").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidResponse { .. }));
}

#[tokio::test]
async fn test_empty_status_data_is_invalid() {
    let server = MockServer::start().await;
    mount_login(&server, &CURRENT).await;
    Mock::given(method("GET"))
        .and(path(format!("{}bike/4711/state/", CURRENT.prefix)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_resources(&server, &CURRENT).await;

    let client = connected_client(&server, current_credentials()).await;
    let err = client.poll("4711").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidResponse { .. }));
}

#[tokio::test]
async fn test_odd_value_types_do_not_fail_poll() {
    let server = MockServer::start().await;
    mount_login(&server, &CURRENT).await;
    Mock::given(method("GET"))
        .and(path(format!("{}bike/4711/state/", CURRENT.prefix)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"battery_SOC": "n/a", "light_on": 2, "rcvts": "1700000000"}]
        })))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_resources(&server, &CURRENT).await;

    let client = connected_client(&server, current_credentials()).await;
    let snapshot = client.poll("4711").await.unwrap();
    assert_eq!(snapshot.battery_soc(), None);
    assert_eq!(snapshot.is_light_on(), Some(true));
    assert_eq!(snapshot.received_at().map(|t| t.timestamp()), Some(1_700_000_000));
}

#[tokio::test]
async fn test_unusable_payload_names_its_endpoint() {
    let server = MockServer::start().await;
    mount_login(&server, &CURRENT).await;
    Mock::given(method("GET"))
        .and(path(format!("{}bike/4711/position/", CURRENT.prefix)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": ["nowhere"]})))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_resources(&server, &CURRENT).await;

    let client = connected_client(&server, current_credentials()).await;
    let err = client.poll("4711").await.unwrap_err();
    match err {
        ApiError::InvalidResponse { endpoint, .. } => assert_eq!(endpoint, "bike/4711/position/"),
        other => panic!("unexpected error: {other}"),
    }
}

// ============================================================================
// Actions
// ============================================================================

#[tokio::test]
async fn test_actions_send_expected_bodies() {
    let server = MockServer::start().await;
    mount_login(&server, &CURRENT).await;
    Mock::given(method("POST"))
        .and(path(format!("{}bike/4711/settings/", CURRENT.prefix)))
        .and(body_string_contains("\"lock\":true"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{}bike/4711/light/", CURRENT.prefix)))
        .and(body_string_contains("\"mode\":\"off\""))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let client = connected_client(&server, current_credentials()).await;
    client.set_lock("4711", true).await.unwrap();
    client.set_light("4711", LightMode::Off).await.unwrap();
}

#[tokio::test]
async fn test_rejected_action_is_action_error() {
    let server = MockServer::start().await;
    mount_login(&server, &CURRENT).await;
    Mock::given(method("POST"))
        .and(path(format!("{}bike/4711/settings/", CURRENT.prefix)))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let client = connected_client(&server, current_credentials()).await;
    let err = client.set_lock("4711", false).await.unwrap_err();
    assert!(matches!(
        err,
        ApiError::Action {
            action: "lock",
            status: 400
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Action);
}

#[tokio::test]
async fn test_trip_reset_requires_no_content() {
    let server = MockServer::start().await;
    mount_login(&server, &CURRENT).await;
    Mock::given(method("DELETE"))
        .and(path(format!("{}bike/id/4711/trip_data/", CURRENT.prefix)))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = connected_client(&server, current_credentials()).await;
    let err = client.reset_trip_data("4711").await.unwrap_err();
    assert!(matches!(err, ApiError::Action { status: 200, .. }));
}
