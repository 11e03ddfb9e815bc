use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use bosun::auth::password::hash_password;
use bosun::config::Config;
use bosun::models::{Role, SharedState};
use bosun::routes::build_router;
use bosun::store::UserStore;

/// Router backed by a fresh store and an upstream nobody listens on, so
/// every API call fails fast and the pages have to degrade.
fn test_app(dir: &TempDir) -> (Router, SharedState) {
    let config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        api_base_url: "http://127.0.0.1:9".to_string(),
        api_token: "test-token".to_string(),
        public_base_url: String::new(),
        users_file: dir.path().join("users.json"),
        customer_id: None,
        upstream_timeout: Duration::from_millis(200),
    };
    let store = UserStore::open(&config.users_file).unwrap();
    let state = SharedState::new(&config, store);
    let app = build_router(state.clone(), String::new());
    (app, state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
}

fn get_request(path: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(path: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn location(headers: &HeaderMap) -> &str {
    headers
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// Log in and return the `session_id=...` pair for subsequent requests.
async fn login_as(app: &Router, username: &str, password: &str) -> String {
    let body = format!("username={username}&password={password}");
    let (status, headers, _) = send(app, post_form("/login", &body, None)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    let set_cookie = headers
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn test_login_page_renders_for_anonymous_visitors() {
    let dir = TempDir::new().unwrap();
    let (app, _) = test_app(&dir);
    let (status, _, body) = send(&app, get_request("/login", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Sign in"));
}

#[tokio::test]
async fn test_protected_pages_redirect_anonymous_visitors_to_login() {
    let dir = TempDir::new().unwrap();
    let (app, _) = test_app(&dir);
    for path in ["/instances", "/create/start", "/users", "/ssh-keys"] {
        let (status, headers, _) = send(&app, get_request(path, None)).await;
        assert_eq!(status, StatusCode::SEE_OTHER, "path {path}");
        assert_eq!(location(&headers), "/login", "path {path}");
    }
}

#[tokio::test]
async fn test_root_redirects_by_session_state() {
    let dir = TempDir::new().unwrap();
    let (app, _) = test_app(&dir);

    let (status, headers, _) = send(&app, get_request("/", None)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/login");

    let cookie = login_as(&app, "owner", "owner123").await;
    let (status, headers, _) = send(&app, get_request("/", Some(&cookie))).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/instances");
}

#[tokio::test]
async fn test_rejected_login_re_renders_with_an_error() {
    let dir = TempDir::new().unwrap();
    let (app, _) = test_app(&dir);
    let (status, headers, body) = send(
        &app,
        post_form("/login", "username=owner&password=wrong", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers.get(header::SET_COOKIE).is_none());
    assert!(body.contains("Invalid username or password."));
}

#[tokio::test]
async fn test_successful_login_sets_a_session_cookie() {
    let dir = TempDir::new().unwrap();
    let (app, _) = test_app(&dir);
    let cookie = login_as(&app, "owner", "owner123").await;
    assert!(cookie.starts_with("session_id="));
}

#[tokio::test]
async fn test_instances_page_degrades_when_the_api_is_unreachable() {
    let dir = TempDir::new().unwrap();
    let (app, _) = test_app(&dir);
    let cookie = login_as(&app, "owner", "owner123").await;
    let (status, _, body) = send(&app, get_request("/instances", Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No instances to show."));
}

#[tokio::test]
async fn test_logout_invalidates_the_session() {
    let dir = TempDir::new().unwrap();
    let (app, _) = test_app(&dir);
    let cookie = login_as(&app, "owner", "owner123").await;

    let (status, headers, _) = send(&app, post_form("/logout", "", Some(&cookie))).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/login");

    // The server-side session is gone even if the browser re-sends it.
    let (status, headers, _) = send(&app, get_request("/instances", Some(&cookie))).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/login");
}

#[tokio::test]
async fn test_later_wizard_steps_bounce_back_without_earlier_answers() {
    let dir = TempDir::new().unwrap();
    let (app, _) = test_app(&dir);
    let cookie = login_as(&app, "owner", "owner123").await;
    for path in ["/create/plan", "/create/os", "/create/ssh-keys", "/create/review"] {
        let (status, headers, _) = send(&app, get_request(path, Some(&cookie))).await;
        assert_eq!(status, StatusCode::SEE_OTHER, "path {path}");
        assert!(
            location(&headers).starts_with("/create/start"),
            "path {path} went to {}",
            location(&headers)
        );
    }
}

#[tokio::test]
async fn test_wizard_and_user_admin_are_owner_only() {
    let dir = TempDir::new().unwrap();
    let (app, state) = test_app(&dir);
    state
        .store
        .create("admin", hash_password("pw", 1_000), Role::Admin)
        .unwrap();
    let cookie = login_as(&app, "admin", "pw").await;
    for path in ["/create/start", "/users", "/ssh-keys"] {
        let (status, headers, _) = send(&app, get_request(path, Some(&cookie))).await;
        assert_eq!(status, StatusCode::SEE_OTHER, "path {path}");
        assert_eq!(location(&headers), "/instances", "path {path}");
    }
}

#[tokio::test]
async fn test_stylesheet_is_served_with_the_css_content_type() {
    let dir = TempDir::new().unwrap();
    let (app, _) = test_app(&dir);
    let (status, headers, _) = send(&app, get_request("/static/styles.css", None)).await;
    assert_eq!(status, StatusCode::OK);
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert!(content_type.starts_with("text/css"));
}

#[tokio::test]
async fn test_deleted_account_session_resolves_to_nobody() {
    let dir = TempDir::new().unwrap();
    let (app, state) = test_app(&dir);
    state
        .store
        .create("temp", hash_password("pw", 1_000), Role::Admin)
        .unwrap();
    let cookie = login_as(&app, "temp", "pw").await;
    state.store.delete("owner", "temp").unwrap();

    let (status, headers, _) = send(&app, get_request("/instances", Some(&cookie))).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/login");
}
