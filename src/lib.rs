//! Client and workflow for classifying images with a remote inference service.
//!
//! The [`PredictionWorkflow`] owns the selected image and drives it through
//! submission to a result, while the [`HealthMonitor`] tracks service liveness
//! in its own slot. Both talk to the service through an [`InferenceBackend`],
//! normally the HTTP [`InferenceClient`].

use std::future::Future;

pub mod acquisition;
pub mod client;
pub mod error;
mod events;
pub mod health;
pub mod wire;
pub mod workflow;

pub use acquisition::{ImageAsset, ImageSource, InputAcquisitionPort};
pub use client::{
    ClientConfig, DEFAULT_BASE_URL, InferenceClient, PredictionResult, UploadDescriptor,
};
pub use error::{ConfigError, ErrorInfo, ErrorKind};
pub use health::{HealthMonitor, HealthStatus};
pub use wire::ModelsStatus;
pub use workflow::{
    PendingSubmission, PredictionWorkflow, SubmitOutcome, WorkflowEvent, WorkflowState,
};

/// Service the workflow and health monitor depend on.
///
/// Implemented by [`InferenceClient`]; other implementations can stand in for
/// the remote service.
pub trait InferenceBackend: Send + Sync + 'static {
    /// Classifies the image behind `image_uri`.
    fn predict(
        &self,
        image_uri: &str,
    ) -> impl Future<Output = Result<PredictionResult, ErrorInfo>> + Send;

    /// Probes liveness. Implementations must map every failure to
    /// [`HealthStatus::Unreachable`] rather than erroring.
    fn check_health(&self) -> impl Future<Output = HealthStatus> + Send;
}
