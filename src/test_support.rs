use crate::config::HeatmapConfig;
use axum::extract::{Query, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

/// Canned reply for the fake InfluxDB `/query` endpoint.
#[derive(Debug, Clone)]
pub struct FakeInflux {
    status: StatusCode,
    body: String,
}

impl FakeInflux {
    pub fn ok(body: JsonValue) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.to_string(),
        }
    }

    pub fn raw(status: StatusCode, body: String) -> Self {
        Self { status, body }
    }
}

#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub db: Option<String>,
    pub q: Option<String>,
    pub authorization: Option<String>,
}

pub struct FakeInfluxHandle {
    pub addr: SocketAddr,
    pub base_url: String,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl FakeInfluxHandle {
    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[derive(Clone)]
struct FakeState {
    reply: FakeInflux,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

async fn fake_query(
    State(state): State<FakeState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    state.seen.lock().unwrap().push(SeenRequest {
        db: params.get("db").cloned(),
        q: params.get("q").cloned(),
        authorization: headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
    });
    (
        state.reply.status,
        [(CONTENT_TYPE, "application/json")],
        state.reply.body.clone(),
    )
        .into_response()
}

pub async fn spawn_fake_influx(reply: FakeInflux) -> FakeInfluxHandle {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/query", get(fake_query))
        .with_state(FakeState {
            reply,
            seen: seen.clone(),
        });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake influx");
    let addr = listener.local_addr().expect("fake influx addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    FakeInfluxHandle {
        addr,
        base_url: format!("http://{addr}"),
        seen,
    }
}

pub fn test_config(influx: SocketAddr, extra: &[(&str, &str)]) -> HeatmapConfig {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("INFLUX_HOST".to_string(), influx.ip().to_string()),
        ("INFLUX_HOST_PORT".to_string(), influx.port().to_string()),
    ]);
    for (key, value) in extra {
        vars.insert(key.to_string(), value.to_string());
    }
    HeatmapConfig::from_lookup(|key| vars.get(key).cloned())
}
