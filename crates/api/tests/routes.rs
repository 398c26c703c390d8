//! Route tests through the full router.

use std::net::SocketAddr;
use std::sync::Arc;

use analyst_core::{async_trait, Analyst};
use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use cache_store::InMemoryCacheStore;
use database::{Database, KeyValue, NewAccount};
use jsonwebtoken::{encode, EncodingKey, Header};
use mock_analyst::{CannedAnalyst, FailingAnalyst};
use pipeline::{FetchError, FetchedResponse, Fetcher, ManualClock, OutboundRequest};
use probe_api::{AppState, Claims, TokenVerifier};
use serde_json::{json, Value};
use tower::ServiceExt;

const SECRET: &str = "test-secret";
const NOW: i64 = 1_700_000_000_000;
// 2100-01-01T00:00:00Z
const FAR_FUTURE: u64 = 4_102_444_800;

struct StubFetcher;

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, request: &OutboundRequest) -> Result<FetchedResponse, FetchError> {
        if request.endpoint.contains("unreachable") {
            return Err(FetchError::NoResponse("connection refused".to_string()));
        }
        Ok(FetchedResponse {
            status: 404,
            headers: vec![KeyValue::new("content-type", "application/json")],
            body: json!({"message": "User not found"}),
        })
    }
}

struct TestApp {
    router: Router,
    state: AppState,
}

impl TestApp {
    async fn with_analyst(analyst: Arc<dyn Analyst>) -> Self {
        let db = Database::in_memory().await.unwrap();
        db.migrate().await.unwrap();
        let state = AppState::new(
            db,
            Arc::new(InMemoryCacheStore::new()),
            Arc::new(ManualClock::new(NOW)),
            Arc::new(StubFetcher),
            analyst,
            TokenVerifier::new(SECRET),
        );
        state
            .pipeline
            .ledger()
            .open_account(&NewAccount::new("u1", "Ada Lovelace", "ada@example.com"))
            .await
            .unwrap();
        Self {
            router: probe_api::app(state.clone()),
            state,
        }
    }

    async fn new() -> Self {
        Self::with_analyst(Arc::new(CannedAnalyst::new("Resource does not exist"))).await
    }

    /// Rebuild the router with `X-Forwarded-For` trusted.
    fn behind_proxy(mut self) -> Self {
        self.state = self.state.with_trust_forwarded_for(true);
        self.router = probe_api::app(self.state.clone());
        self
    }

    async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        self.send_with(Request::builder().method(method).uri(uri), token, body)
            .await
    }

    /// `GET /api/auth/me` from socket peer `peer`.
    async fn session_from(&self, peer: &str, token: &str) -> StatusCode {
        let peer: SocketAddr = peer.parse().unwrap();
        let builder = Request::builder()
            .method(Method::GET)
            .uri("/api/auth/me")
            .extension(ConnectInfo(peer));
        self.send_with(builder, Some(token), None).await.0
    }

    async fn send_with(
        &self,
        mut builder: axum::http::request::Builder,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }
}

fn token_for(user_id: &str) -> String {
    let claims = Claims {
        user_id: user_id.to_string(),
        fullname: "Ada Lovelace".to_string(),
        exp: FAR_FUTURE,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

fn analysis_body() -> Value {
    json!({
        "endpoint": "https://api.example.com/users/1",
        "method": "get",
        "headers": [{"key": "accept", "value": "application/json"}],
        "queryParams": [],
    })
}

fn save_body() -> Value {
    json!({
        "endpoint": "https://api.example.com/users/1",
        "method": "GET",
        "responseStatus": 404,
        "responseBody": "{\"message\":\"User not found\"}",
        "aiAnalysis": "Resource does not exist",
        "cost": 1,
    })
}

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new().await;
    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn missing_or_bad_token_is_401() {
    let app = TestApp::new().await;

    let (status, body) = app.send(Method::GET, "/api/profile/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "AUTHENTICATION_ERROR");
    assert_eq!(body["error"]["statusCode"], 401);

    let (status, _) = app
        .send(Method::GET, "/api/profile/me", Some("garbage"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn analyze_charges_and_returns_outcome() {
    let app = TestApp::new().await;
    let token = token_for("u1");

    let (status, body) = app
        .send(Method::POST, "/api/analysis", Some(&token), Some(analysis_body()))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Endpoint successfully analyzed");
    assert_eq!(body["data"]["aiAnalysis"], "Resource does not exist");
    assert_eq!(body["data"]["cost"], 1);
    assert_eq!(body["data"]["credits"], 49);
    assert_eq!(body["data"]["request"]["method"], "GET");
    assert_eq!(body["data"]["response"]["status"], 404);
    assert!(body["data"].get("info").is_none());

    let (_, profile) = app.send(Method::GET, "/api/profile/me", Some(&token), None).await;
    assert_eq!(profile["data"]["credits"], 49);
}

#[tokio::test]
async fn analyze_with_ai_disabled_is_free() {
    let app = TestApp::new().await;
    let token = token_for("u1");

    let (status, body) = app.send(Method::PATCH, "/api/analysis/ai", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "AI analysis has been successfully disabled");

    let (status, body) = app
        .send(Method::POST, "/api/analysis", Some(&token), Some(analysis_body()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["info"], "ai_disabled");
    assert_eq!(body["data"]["cost"], 0);
    assert_eq!(body["data"]["credits"], 50);
}

#[tokio::test]
async fn analyst_failure_is_500_with_partial_outcome() {
    let app = TestApp::with_analyst(Arc::new(FailingAnalyst::new())).await;
    let token = token_for("u1");

    let (status, body) = app
        .send(Method::POST, "/api/analysis", Some(&token), Some(analysis_body()))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "INTERNAL_SERVER_ERROR");
    assert_eq!(body["data"]["info"], "analysis_error");
    assert_eq!(body["data"]["cost"], 0);
    assert_eq!(app.state.pipeline.ledger().load("u1").await.unwrap().credits, 50);
}

#[tokio::test]
async fn unreachable_endpoint_is_502() {
    let app = TestApp::new().await;
    let mut body = analysis_body();
    body["endpoint"] = json!("https://unreachable.example.com");

    let (status, body) = app
        .send(Method::POST, "/api/analysis", Some(&token_for("u1")), Some(body))
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "NO_RESPONSE");
}

#[tokio::test]
async fn invalid_payloads_are_400() {
    let app = TestApp::new().await;
    let token = token_for("u1");

    let mut bad_method = analysis_body();
    bad_method["method"] = json!("TRACE");
    let (status, body) = app
        .send(Method::POST, "/api/analysis", Some(&token), Some(bad_method))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, _) = app
        .send(Method::POST, "/api/analysis", Some(&token), Some(json!({"nope": true})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(Method::GET, "/api/analysis/not-a-uuid", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_account_is_404() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(Method::GET, "/api/profile/me", Some(&token_for("ghost")), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert_eq!(body["message"], "Account was not found");
}

#[tokio::test]
async fn saved_analysis_lifecycle() {
    let app = TestApp::new().await;
    let token = token_for("u1");

    let (status, saved) = app
        .send(Method::POST, "/api/analysis/save", Some(&token), Some(save_body()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = saved["data"]["id"].as_str().unwrap().to_string();

    let (status, page) = app
        .send(Method::GET, "/api/analysis?page=1&method=get", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["data"]["totalItems"], 1);
    assert_eq!(page["data"]["limit"], 9);
    assert_eq!(page["data"]["items"][0]["id"], id.as_str());

    let uri = format!("/api/analysis/{}", id);
    let (status, one) = app.send(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(one["data"]["responseStatus"], 404);

    let (status, _) = app.send(Method::GET, &uri, Some(&token_for("other")), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, page) = app.send(Method::GET, "/api/analysis", Some(&token), None).await;
    assert_eq!(page["data"]["totalItems"], 0);
}

#[tokio::test]
async fn profile_edit_and_session() {
    let app = TestApp::new().await;
    let token = token_for("u1");

    let (status, body) = app
        .send(
            Method::PATCH,
            "/api/profile/me",
            Some(&token),
            Some(json!({"firstname": "grace"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["fullname"], "Grace Lovelace");

    let (_, me) = app.send(Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(me["data"], json!({"userId": "u1", "fullname": "Grace Lovelace"}));

    let (status, _) = app.send(Method::POST, "/api/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(Method::POST, "/api/auth/logout", Some(&token_for("ghost")), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn user_actions_are_rate_limited() {
    let app = TestApp::new().await;
    let token = token_for("u1");

    for _ in 0..30 {
        let (status, _) = app.send(Method::PATCH, "/api/analysis/ai", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = app.send(Method::PATCH, "/api/analysis/ai", Some(&token), None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], "RATE_LIMIT_EXCEEDED");
    assert_eq!(body["error"]["statusCode"], 429);

    // Reads without a policy are unaffected.
    let (status, _) = app.send(Method::GET, "/api/profile/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn session_routes_are_gated_per_ip() {
    let app = TestApp::new().await;
    let token = token_for("u1");

    // The mapped and plain forms of one address share a counter.
    for i in 0..20 {
        let peer = if i % 2 == 0 { "[::ffff:1.2.3.4]:5000" } else { "1.2.3.4:6000" };
        assert_eq!(app.session_from(peer, &token).await, StatusCode::OK);
    }
    assert_eq!(
        app.session_from("[::ffff:1.2.3.4]:5001", &token).await,
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(app.session_from("1.2.3.4:6001", &token).await, StatusCode::TOO_MANY_REQUESTS);

    assert_eq!(app.session_from("5.6.7.8:5000", &token).await, StatusCode::OK);

    // Other route groups carry no IP policy.
    let (status, _) = app.send(Method::GET, "/api/profile/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn ip_gate_runs_before_authentication() {
    let app = TestApp::new().await;

    for _ in 0..20 {
        assert_eq!(app.session_from("9.9.9.9:1", "garbage").await, StatusCode::UNAUTHORIZED);
    }
    assert_eq!(
        app.session_from("9.9.9.9:1", &token_for("u1")).await,
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test]
async fn forwarded_for_is_honored_only_behind_proxy() {
    let app = TestApp::new().await;
    let token = token_for("u1");

    // Untrusted: rotating the header does not escape the peer's counter.
    for i in 0..20 {
        let builder = Request::builder()
            .uri("/api/auth/me")
            .header("x-forwarded-for", format!("10.0.0.{i}"))
            .extension(ConnectInfo("192.0.2.1:80".parse::<SocketAddr>().unwrap()));
        assert_eq!(app.send_with(builder, Some(&token), None).await.0, StatusCode::OK);
    }
    assert_eq!(app.session_from("192.0.2.1:80", &token).await, StatusCode::TOO_MANY_REQUESTS);

    let app = TestApp::new().await.behind_proxy();
    for _ in 0..20 {
        let builder = Request::builder()
            .uri("/api/auth/me")
            .header("x-forwarded-for", "::ffff:203.0.113.7, 192.0.2.1")
            .extension(ConnectInfo("192.0.2.1:80".parse::<SocketAddr>().unwrap()));
        assert_eq!(app.send_with(builder, Some(&token), None).await.0, StatusCode::OK);
    }
    let builder = Request::builder()
        .uri("/api/auth/me")
        .header("x-forwarded-for", "203.0.113.7")
        .extension(ConnectInfo("192.0.2.1:80".parse::<SocketAddr>().unwrap()));
    assert_eq!(
        app.send_with(builder, Some(&token), None).await.0,
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(app.session_from("192.0.2.1:80", &token).await, StatusCode::OK);
}
