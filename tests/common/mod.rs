#![allow(dead_code)]

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Router,
};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use deepl_local::translate::{ClientSettings, DeepLClient};

/// A request captured by the mock service
#[derive(Debug, Clone)]
pub struct Captured {
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    body: String,
    delay: Option<Duration>,
    captured: Arc<Mutex<Vec<Captured>>>,
}

/// In-process stand-in for the remote translation endpoint
pub struct MockService {
    pub addr: SocketAddr,
    captured: Arc<Mutex<Vec<Captured>>>,
}

impl MockService {
    pub async fn start(status: u16, body: &str) -> Self {
        Self::start_with_delay(status, body, None).await
    }

    pub async fn start_with_delay(status: u16, body: &str, delay: Option<Duration>) -> Self {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            status: StatusCode::from_u16(status).unwrap(),
            body: body.to_string(),
            delay,
            captured: captured.clone(),
        };
        let app = Router::new()
            .route("/v2/translate", post(handle))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, captured }
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}/v2/translate", self.addr)
    }

    pub fn settings(&self) -> ClientSettings {
        ClientSettings {
            endpoint: self.endpoint(),
            use_system_proxy: false,
            ..ClientSettings::default()
        }
    }

    pub fn client(&self, credential: &str) -> DeepLClient {
        DeepLClient::with_settings(credential, self.settings()).unwrap()
    }

    pub fn requests(&self) -> Vec<Captured> {
        self.captured.lock().unwrap().clone()
    }
}

async fn handle(
    State(state): State<MockState>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let body_json = serde_json::from_str(&body).unwrap_or(serde_json::Value::Null);
    state.captured.lock().unwrap().push(Captured { headers, body: body_json });
    if let Some(delay) = state.delay {
        tokio::time::sleep(delay).await;
    }
    (
        state.status,
        [("content-type", "application/json")],
        state.body.clone(),
    )
}
