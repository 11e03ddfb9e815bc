//! Full wizard journeys driven through the router against a mock
//! provisioning API, so redirects, URL-carried state, and the final
//! creation payload are all exercised together.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use bosun::config::Config;
use bosun::models::SharedState;
use bosun::routes::build_router;
use bosun::store::UserStore;

type Captured = Arc<Mutex<Vec<Value>>>;

#[derive(Clone)]
struct MockApi {
    captured: Captured,
    create_response: Arc<Value>,
}

fn okay(data: Value) -> Value {
    json!({"code": "OKAY", "data": data})
}

async fn mock_regions() -> Json<Value> {
    Json(okay(json!([
        {
            "id": "ams1", "name": "Amsterdam", "country": "NL", "city": "Amsterdam",
            "isActive": true, "isHidden": false,
            "config": {"ramThresholdInGB": 2, "diskThresholdInGB": 20}
        },
        {
            "id": "sgp1", "name": "Singapore", "country": "SG", "city": "Singapore",
            "isActive": true, "isHidden": true
        }
    ])))
}

async fn mock_products() -> Json<Value> {
    Json(okay(json!([
        {
            "id": "vps-1", "name": "VPS 1", "regionId": "ams1",
            "plan": {"specification": {"cpu": 1, "ram": 2, "storage": 40, "bandwidth": 2}},
            "priceItems": [{"hourlyPrice": 0.006, "monthlyPrice": 4}]
        },
        {
            "id": "vps-2", "name": "VPS 2", "regionId": "ams1",
            "plan": {"specification": {"cpu": 2, "ram": 4, "storage": 80, "bandwidth": 4}},
            "priceItems": [{"hourlyPrice": 0.012, "monthlyPrice": 8}],
            "tags": "high frequency"
        }
    ])))
}

async fn mock_os() -> Json<Value> {
    Json(okay(json!({"os": [
        {"id": "u22", "name": "Ubuntu 22.04", "family": "ubuntu", "isDefault": true, "isActive": true},
        {"id": "d12", "name": "Debian 12", "family": "debian", "isActive": true}
    ]})))
}

async fn mock_ssh_keys() -> Json<Value> {
    Json(okay(json!([
        {"id": 7, "name": "laptop", "fingerprint": "SHA256:abc123"}
    ])))
}

async fn mock_instance_list() -> Json<Value> {
    Json(okay(json!([])))
}

async fn mock_create(State(mock): State<MockApi>, Json(body): Json<Value>) -> Json<Value> {
    mock.captured.lock().unwrap().push(body);
    Json((*mock.create_response).clone())
}

/// Serve the mock API on an ephemeral port and return its base URL plus
/// the creation payloads it receives.
async fn spawn_mock_api(create_response: Value) -> (String, Captured) {
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let mock = MockApi {
        captured: captured.clone(),
        create_response: Arc::new(create_response),
    };
    let app = Router::new()
        .route("/v1/regions", get(mock_regions))
        .route("/v1/products", get(mock_products))
        .route("/v1/os", get(mock_os))
        .route("/v1/ssh-keys", get(mock_ssh_keys))
        .route("/v1/instances", get(mock_instance_list).post(mock_create))
        .with_state(mock);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), captured)
}

fn console_app(dir: &TempDir, api_base_url: &str) -> Router {
    let config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        api_base_url: api_base_url.to_string(),
        api_token: "test-token".to_string(),
        public_base_url: String::new(),
        users_file: dir.path().join("users.json"),
        customer_id: None,
        upstream_timeout: Duration::from_secs(2),
    };
    let store = UserStore::open(&config.users_file).unwrap();
    let state = SharedState::new(&config, store);
    build_router(state, String::new())
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
}

fn get_request(path: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

fn post_form(path: &str, body: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::COOKIE, cookie)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn location(headers: &HeaderMap) -> &str {
    headers
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

async fn login(app: &Router) -> String {
    let request = Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("username=owner&password=owner123"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

const START_FORM: &str =
    "hostnames=web-1&region=ams1&plan_type=fixed&assign_ipv4=1&assign_ipv6=0&floating_ip_count=0";

#[tokio::test]
async fn test_fixed_plan_journey_end_to_end() {
    let (api, captured) = spawn_mock_api(okay(json!({"ids": ["i-900"]}))).await;
    let dir = TempDir::new().unwrap();
    let app = console_app(&dir, &api);
    let cookie = login(&app).await;

    // Step 1: only selectable regions are offered.
    let (status, _, body) = send(&app, get_request("/create/start", &cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Amsterdam"));
    assert!(!body.contains("Singapore"));

    let (status, headers, _) = send(&app, post_form("/create/start", START_FORM, &cookie)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    let plan_url = location(&headers).to_string();
    assert!(plan_url.starts_with("/create/plan?"), "{plan_url}");
    assert!(plan_url.contains("hostnames=web-1"));
    assert!(plan_url.contains("region=ams1"));

    // Step 2: cards come from the region's catalog, priced.
    let (status, _, body) = send(&app, get_request(&plan_url, &cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("VPS 2"));
    assert!(body.contains("$8/mo"));
    assert!(body.contains("High frequency"));

    let plan_form = format!("{START_FORM}&product_id=vps-2&extra_disk_gb=0&extra_bandwidth_tb=0");
    let (status, headers, _) = send(&app, post_form("/create/plan", &plan_form, &cookie)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    let os_url = location(&headers).to_string();
    assert!(os_url.starts_with("/create/os?"), "{os_url}");
    assert!(os_url.contains("product_id=vps-2"));

    // Step 3: both images render; the provider default is offered.
    let (status, _, body) = send(&app, get_request(&os_url, &cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Ubuntu 22.04"));
    assert!(body.contains("Debian 12"));

    let os_form = format!("{plan_form}&os_id=u22");
    let (status, headers, _) = send(&app, post_form("/create/os", &os_form, &cookie)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    let keys_url = location(&headers).to_string();
    assert!(keys_url.starts_with("/create/ssh-keys?"), "{keys_url}");
    assert!(keys_url.contains("os_id=u22"));

    // Step 4: the key catalog renders.
    let (status, _, body) = send(&app, get_request(&keys_url, &cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("laptop"));

    let keys_form = format!("{os_form}&ssh_key_ids=7");
    let (status, headers, _) = send(&app, post_form("/create/ssh-keys", &keys_form, &cookie)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    let review_url = location(&headers).to_string();
    assert!(review_url.starts_with("/create/review?"), "{review_url}");
    assert!(review_url.contains("ssh_key_ids=7"));

    // Step 5: every choice shows by display name, not raw id.
    let (status, _, body) = send(&app, get_request(&review_url, &cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("web-1"));
    assert!(body.contains("Amsterdam, NL"));
    assert!(body.contains("VPS 2"));
    assert!(body.contains("Ubuntu 22.04"));
    assert!(body.contains("laptop"));

    let (status, headers, _) = send(&app, post_form("/create/review", &keys_form, &cookie)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/instances");

    // Exactly one creation call, carrying the operator's choices.
    {
        let payloads = captured.lock().unwrap();
        assert_eq!(payloads.len(), 1);
        let payload = &payloads[0];
        assert_eq!(payload["hostnames"], json!(["web-1"]));
        assert_eq!(payload["region"], "ams1");
        assert_eq!(payload["productId"], "vps-2");
        assert_eq!(payload["osId"], "u22");
        assert_eq!(payload["sshKeyIds"], json!([7]));
        assert_eq!(payload["assignIpv4"], json!(true));
        assert_eq!(payload["assignIpv6"], json!(false));
        assert!(payload.get("floatingIPCount").is_none());
        assert!(payload.get("extraResource").is_none());
    }

    // The success flash lands on the instance list.
    let (status, _, body) = send(&app, get_request("/instances", &cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Provisioning requested for 1 instance(s)."));
}

#[tokio::test]
async fn test_stale_product_id_bounces_back_to_the_plan_step() {
    let (api, captured) = spawn_mock_api(okay(json!({"ids": []}))).await;
    let dir = TempDir::new().unwrap();
    let app = console_app(&dir, &api);
    let cookie = login(&app).await;

    let (_, headers, _) = send(&app, post_form("/create/start", START_FORM, &cookie)).await;
    assert!(location(&headers).starts_with("/create/plan?"));

    // vps-9 was never in this region's catalog.
    let plan_form = format!("{START_FORM}&product_id=vps-9");
    let (status, headers, _) = send(&app, post_form("/create/plan", &plan_form, &cookie)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    let bounced = location(&headers).to_string();
    assert!(bounced.starts_with("/create/plan?"), "{bounced}");
    assert!(bounced.contains("product_id=vps-9"));
    assert!(bounced.contains("region=ams1"));

    let (status, _, body) = send(&app, get_request(&bounced, &cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("The selected plan is not offered in this region."));
    assert!(captured.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_custom_plan_enforces_the_region_ram_floor() {
    let (api, captured) = spawn_mock_api(okay(json!({"ids": ["i-901", "i-902"]}))).await;
    let dir = TempDir::new().unwrap();
    let app = console_app(&dir, &api);
    let cookie = login(&app).await;

    let start_form = "hostnames=db-1,db-2&region=ams1&plan_type=custom&assign_ipv4=1&assign_ipv6=1&floating_ip_count=2";
    let (_, headers, _) = send(&app, post_form("/create/start", start_form, &cookie)).await;
    assert!(location(&headers).starts_with("/create/plan?"));

    // 1 GB is under the region's 2 GB threshold.
    let thin = format!("{start_form}&cpu=2&ram_gb=1&disk_gb=20");
    let (status, headers, _) = send(&app, post_form("/create/plan", &thin, &cookie)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    let bounced = location(&headers).to_string();
    assert!(bounced.starts_with("/create/plan?"), "{bounced}");

    let (_, _, body) = send(&app, get_request(&bounced, &cookie)).await;
    assert!(body.contains("RAM must be at least 2 GB in Amsterdam."));

    // Sized to the floor it goes through.
    let sized = format!("{start_form}&cpu=2&ram_gb=2&disk_gb=20&bandwidth_tb=3");
    let (status, headers, _) = send(&app, post_form("/create/plan", &sized, &cookie)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    let os_url = location(&headers).to_string();
    assert!(os_url.starts_with("/create/os?"), "{os_url}");
    assert!(os_url.contains("ram_gb=2"));

    let os_form = format!("{sized}&os_id=d12");
    let (_, headers, _) = send(&app, post_form("/create/os", &os_form, &cookie)).await;
    let keys_url = location(&headers).to_string();
    assert!(keys_url.starts_with("/create/ssh-keys?"), "{keys_url}");

    // No keys selected: allowed, review shows none.
    let (_, headers, _) = send(&app, post_form("/create/ssh-keys", &os_form, &cookie)).await;
    let review_url = location(&headers).to_string();
    assert!(review_url.starts_with("/create/review?"), "{review_url}");

    let (status, _, body) = send(&app, get_request(&review_url, &cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("db-1"));
    assert!(body.contains("db-2"));
    assert!(body.contains("Custom resources"));
    assert!(body.contains("Debian 12"));
    assert!(body.contains("floating IPs: 2"));

    let (status, headers, _) = send(&app, post_form("/create/review", &os_form, &cookie)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/instances");

    let payloads = captured.lock().unwrap();
    assert_eq!(payloads.len(), 1);
    let payload = &payloads[0];
    assert_eq!(payload["hostnames"], json!(["db-1", "db-2"]));
    assert!(payload.get("productId").is_none());
    assert_eq!(
        payload["extraResource"],
        json!({"cpu": 2, "ramInGB": 2, "diskInGB": 20, "bandwidthInTB": 3})
    );
    assert_eq!(payload["floatingIPCount"], json!(2));
    assert_eq!(payload["assignIpv6"], json!(true));
    assert!(payload.get("sshKeyIds").is_none());
}

#[tokio::test]
async fn test_provider_rejection_returns_to_review_with_the_detail() {
    let (api, captured) = spawn_mock_api(json!({
        "code": "NOT_ENOUGH_RESOURCES",
        "detail": "Region is out of capacity"
    }))
    .await;
    let dir = TempDir::new().unwrap();
    let app = console_app(&dir, &api);
    let cookie = login(&app).await;

    let full_form = format!("{START_FORM}&product_id=vps-2&os_id=u22&ssh_key_ids=7");
    let (status, headers, _) = send(&app, post_form("/create/review", &full_form, &cookie)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    let review_url = location(&headers).to_string();
    // Back on review with the state intact, not dumped to the start.
    assert!(review_url.starts_with("/create/review?"), "{review_url}");
    assert!(review_url.contains("product_id=vps-2"));
    assert_eq!(captured.lock().unwrap().len(), 1);

    let (status, _, body) = send(&app, get_request(&review_url, &cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Region is out of capacity"));
}
