mod common;

use axum::http::StatusCode;
use common::{MockService, Reply, Routes};
use lens_predict::{
    ClientConfig, ErrorKind, HealthMonitor, HealthStatus, ImageAsset, ImageSource,
    InferenceClient, PredictionResult, PredictionWorkflow, WorkflowEvent, WorkflowState,
};
use serde_json::json;
use std::sync::Arc;

fn client_for(base_url: &str) -> Arc<InferenceClient> {
    Arc::new(InferenceClient::new(ClientConfig::new(base_url).unwrap()).unwrap())
}

#[tokio::test]
async fn vintage_prediction_reaches_succeeded() {
    common::init_logging();
    let service = MockService::spawn(Routes {
        predict: Reply::json(
            StatusCode::OK,
            json!({ "prediction": "vintage", "confidence": 0.87 }),
        ),
        ..Routes::default()
    })
    .await;
    let dir = tempfile::tempdir().unwrap();
    let asset = ImageAsset::new(
        common::file_uri(&common::write_image(dir.path(), "chair.jpg")),
        ImageSource::Camera,
    );
    let workflow = PredictionWorkflow::new(client_for(&service.base_url));
    let events = workflow.subscribe();

    workflow.image_acquired(asset.clone());
    workflow.submit().await.unwrap();

    let expected = WorkflowState::Succeeded(asset.clone(), PredictionResult::new("vintage", 0.87));
    assert_eq!(workflow.state(), expected);
    assert_eq!(
        events.try_iter().collect::<Vec<_>>(),
        vec![
            WorkflowEvent::StateChanged(WorkflowState::ImageSelected(asset.clone())),
            WorkflowEvent::StateChanged(WorkflowState::Submitting(asset)),
            WorkflowEvent::StateChanged(expected),
        ]
    );
}

#[tokio::test]
async fn server_failure_reaches_failed() {
    let service = MockService::spawn(Routes {
        predict: Reply::json(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "model unavailable" }),
        ),
        ..Routes::default()
    })
    .await;
    let dir = tempfile::tempdir().unwrap();
    let asset = ImageAsset::new(
        common::file_uri(&common::write_image(dir.path(), "chair.jpg")),
        ImageSource::Gallery,
    );
    let workflow = PredictionWorkflow::new(client_for(&service.base_url));

    workflow.image_acquired(asset.clone());
    workflow.submit().await.unwrap();

    match workflow.state() {
        WorkflowState::Failed(failed, error) => {
            assert_eq!(failed, asset);
            assert_eq!(error.kind, ErrorKind::ServerRejected);
            assert_eq!(error.message, "model unavailable");
        }
        other => panic!("expected Failed, got {other:?}"),
    }

    // picking another image recovers from the failure
    workflow.image_acquired(ImageAsset::new("b.jpg", ImageSource::Gallery));
    assert_eq!(workflow.state().as_str(), "image_selected");
}

#[tokio::test]
async fn monitor_and_workflow_share_one_client() {
    let service = MockService::spawn(Routes::default()).await;
    let client = client_for(&service.base_url);
    let dir = tempfile::tempdir().unwrap();
    let asset = ImageAsset::new(
        common::file_uri(&common::write_image(dir.path(), "lamp.png")),
        ImageSource::Gallery,
    );

    let monitor = HealthMonitor::new(client.clone());
    let workflow = PredictionWorkflow::new(client);
    workflow.image_acquired(asset);

    let (health, submitted) = tokio::join!(monitor.check(), workflow.submit());

    assert_eq!(health, HealthStatus::Connected);
    assert!(submitted.is_ok());
    assert_eq!(workflow.state().as_str(), "succeeded");
    assert_eq!(monitor.status(), HealthStatus::Connected);
}

#[tokio::test]
async fn monitor_reports_dead_service_as_unreachable() {
    let monitor = HealthMonitor::start(client_for(&common::dead_base_url())).await;
    assert_eq!(monitor.status(), HealthStatus::Unreachable);
}
