//! In-process stand-in for the inference service.

#![allow(dead_code)]

use axum::{
    Router,
    extract::{Multipart, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

/// Canned answer for one endpoint.
#[derive(Clone, Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
    pub delay: Option<Duration>,
}

impl Reply {
    pub fn json(status: StatusCode, body: serde_json::Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: None,
        }
    }

    pub fn raw(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: None,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// A multipart field as the service received it.
#[derive(Clone, Debug)]
pub struct Upload {
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub len: usize,
}

#[derive(Clone, Debug)]
pub struct Routes {
    pub predict: Reply,
    pub health: Reply,
    pub models_status: Reply,
}

impl Default for Routes {
    fn default() -> Self {
        Self {
            predict: Reply::json(
                StatusCode::OK,
                serde_json::json!({
                    "success": true,
                    "prediction": "vintage",
                    "confidence": 0.87,
                    "message": "Predicted class: vintage with 87.00% confidence"
                }),
            ),
            health: Reply::json(
                StatusCode::OK,
                serde_json::json!({ "status": "healthy", "message": "ML Backend is running" }),
            ),
            models_status: Reply::json(
                StatusCode::OK,
                serde_json::json!({
                    "available_models": ["random_forest.pkl"],
                    "missing_models": ["svm.pkl"],
                    "total_models": 2,
                    "available_count": 1
                }),
            ),
        }
    }
}

struct ServiceState {
    routes: Routes,
    uploads: Mutex<Vec<Upload>>,
}

pub struct MockService {
    pub base_url: String,
    state: Arc<ServiceState>,
}

impl MockService {
    pub async fn spawn(routes: Routes) -> Self {
        let state = Arc::new(ServiceState {
            routes,
            uploads: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/predict", post(predict))
            .route("/health", get(health))
            .route("/models/status", get(models_status))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}/"),
            state,
        }
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.state.uploads.lock().unwrap().clone()
    }
}

async fn predict(State(state): State<Arc<ServiceState>>, mut multipart: Multipart) -> Response {
    while let Ok(Some(field)) = multipart.next_field().await {
        let field_name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.unwrap_or_default();

        state.uploads.lock().unwrap().push(Upload {
            field: field_name,
            file_name,
            content_type,
            len: bytes.len(),
        });
    }
    reply(&state.routes.predict).await
}

async fn health(State(state): State<Arc<ServiceState>>) -> Response {
    reply(&state.routes.health).await
}

async fn models_status(State(state): State<Arc<ServiceState>>) -> Response {
    reply(&state.routes.models_status).await
}

async fn reply(reply: &Reply) -> Response {
    if let Some(delay) = reply.delay {
        tokio::time::sleep(delay).await;
    }
    (
        reply.status,
        [(header::CONTENT_TYPE, "application/json")],
        reply.body.clone(),
    )
        .into_response()
}

/// Base url on which nothing is listening.
pub fn dead_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/")
}

/// Writes a small fake image named `name` into `dir`.
pub fn write_image(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"\x89PNG\r\n\x1a\nnot-really-an-image").unwrap();
    path
}

pub fn file_uri(path: &Path) -> String {
    url::Url::from_file_path(path).unwrap().to_string()
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
