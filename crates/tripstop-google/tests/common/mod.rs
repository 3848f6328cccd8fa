//! In-process stand-in for the Google endpoints.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub query: String,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Canned responses keyed by request path. Unknown paths answer 404.
#[derive(Clone, Default)]
pub struct StubProvider {
    responses: Arc<Mutex<HashMap<String, (u16, Value)>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubProvider {
    pub fn respond(&self, path: &str, status: u16, body: Value) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body));
        self
    }

    /// Serve on an ephemeral port and return the base URL.
    pub async fn start(&self) -> String {
        let app = Router::new().fallback(handle).with_state(self.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.path == path)
            .cloned()
            .collect()
    }
}

async fn handle(
    State(stub): State<StubProvider>,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, Json<Value>) {
    let path = uri.path().to_string();
    stub.requests.lock().unwrap().push(RecordedRequest {
        path: path.clone(),
        query: uri.query().unwrap_or_default().to_string(),
        headers,
        body: serde_json::from_str(&body).unwrap_or(Value::Null),
    });

    match stub.responses.lock().unwrap().get(&path) {
        Some((status, body)) => (
            StatusCode::from_u16(*status).unwrap(),
            Json(body.clone()),
        ),
        None => (StatusCode::NOT_FOUND, Json(json!({"error": "no stub"}))),
    }
}
