use argh::FromArgs;
use axum::{
    Json, Router,
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use lens_predict::wire::{HealthResponse, ModelsStatus, PredictResponse};
use serde_json::json;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

// defaults for the server
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];
const LABELS: [&str; 3] = ["vintage", "modern", "rustic"];

#[derive(FromArgs)]
/// Stand-in for the inference service, answering with canned predictions.
struct MockServiceArgs {
    /// the host to run the server on
    #[argh(option, short = 'h', default = "DEFAULT_HOST.to_string()")]
    host: String,

    /// the port to run the server on
    #[argh(option, short = 'p', default = "DEFAULT_PORT")]
    port: u16,

    /// report the service as degraded on /health
    #[argh(switch)]
    degraded: bool,
}

struct ServiceState {
    degraded: bool,
    served: AtomicU64,
}

fn error(status: StatusCode, message: &str) -> (StatusCode, Json<serde_json::Value>) {
    (status, Json(json!({ "error": message })))
}

async fn post_predict(
    State(state): State<Arc<ServiceState>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let field = match multipart.next_field().await {
        Ok(Some(field)) if field.name() == Some("image") => field,
        Ok(_) => return error(StatusCode::BAD_REQUEST, "No image file provided"),
        Err(e) => return error(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    let file_name = field.file_name().unwrap_or_default().to_string();
    let allowed = file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
    if !allowed {
        return error(
            StatusCode::BAD_REQUEST,
            "Invalid file type. Allowed: png, jpg, jpeg, gif",
        );
    }

    let bytes = match field.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => return error(StatusCode::BAD_REQUEST, &e.to_string()),
    };
    if bytes.is_empty() {
        return error(StatusCode::BAD_REQUEST, "No file selected");
    }

    // deterministic "inference": the upload size picks the label
    let served = state.served.fetch_add(1, Ordering::Relaxed);
    let label = LABELS[bytes.len() % LABELS.len()];
    let confidence = 0.5 + (bytes.len() % 50) as f64 / 100.0;

    log::info!("Prediction #{served} for {file_name}: {label} ({confidence:.2})");

    let response = PredictResponse {
        prediction: label.to_string(),
        confidence,
        success: Some(true),
        details: None,
        message: Some(format!(
            "Predicted class: {label} with {:.2}% confidence",
            confidence * 100.0
        )),
    };
    (StatusCode::OK, Json(json!(response)))
}

async fn get_health(State(state): State<Arc<ServiceState>>) -> impl IntoResponse {
    let status = if state.degraded { "degraded" } else { "healthy" };
    Json(HealthResponse {
        status: status.to_string(),
        message: Some("Mock backend is running".to_string()),
    })
}

async fn get_models_status() -> impl IntoResponse {
    Json(ModelsStatus {
        available_models: LABELS.iter().map(|l| format!("{l}.pkl")).collect(),
        missing_models: Vec::new(),
        total_models: Some(LABELS.len() as u64),
        available_count: Some(LABELS.len() as u64),
        extra: Default::default(),
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: MockServiceArgs = argh::from_env();

    // format the host and port
    let addr = format!("{}:{}", args.host, args.port);

    let state = Arc::new(ServiceState {
        degraded: args.degraded,
        served: AtomicU64::new(0),
    });

    let app = Router::new()
        .route("/predict", post(post_predict))
        .route("/health", get(get_health))
        .route("/models/status", get(get_models_status))
        .with_state(state);

    log::info!("Starting the mock inference service");
    log::info!("Listening on: {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
