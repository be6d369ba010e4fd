use std::sync::{Arc, Mutex, MutexGuard, PoisonError, mpsc};

use crate::{
    InferenceBackend,
    acquisition::{ImageAsset, ImageSource, InputAcquisitionPort},
    client::PredictionResult,
    error::ErrorInfo,
    events::Notifier,
};

/// State of a prediction session. Transitions are the only way it changes.
#[derive(Clone, Debug, PartialEq)]
pub enum WorkflowState {
    Idle,
    ImageSelected(ImageAsset),
    Submitting(ImageAsset),
    Succeeded(ImageAsset, PredictionResult),
    Failed(ImageAsset, ErrorInfo),
}

impl WorkflowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::ImageSelected(_) => "image_selected",
            WorkflowState::Submitting(_) => "submitting",
            WorkflowState::Succeeded(..) => "succeeded",
            WorkflowState::Failed(..) => "failed",
        }
    }

    /// The asset the state is bound to, if any.
    pub fn asset(&self) -> Option<&ImageAsset> {
        match self {
            WorkflowState::Idle => None,
            WorkflowState::ImageSelected(asset)
            | WorkflowState::Submitting(asset)
            | WorkflowState::Succeeded(asset, _)
            | WorkflowState::Failed(asset, _) => Some(asset),
        }
    }
}

/// Notification delivered to workflow subscribers.
#[derive(Clone, Debug, PartialEq)]
pub enum WorkflowEvent {
    StateChanged(WorkflowState),
    /// A response arrived for an asset that had already been replaced.
    ResponseDiscarded(ImageAsset),
}

/// What became of a submitted request once its response arrived.
#[derive(Clone, Debug, PartialEq)]
pub enum SubmitOutcome {
    /// The response was applied; holds the resulting `Succeeded` or `Failed` state.
    Applied(WorkflowState),
    /// The asset was replaced while the request was in flight.
    Superseded(ImageAsset),
}

/// Ticket for a request in flight, redeemed with [`PredictionWorkflow::complete`].
#[derive(Debug)]
pub struct PendingSubmission {
    generation: u64,
    asset: ImageAsset,
}

impl PendingSubmission {
    pub fn asset(&self) -> &ImageAsset {
        &self.asset
    }
}

struct Slot {
    state: WorkflowState,
    // bumped whenever the bound asset is replaced
    generation: u64,
}

/// State machine driving image selection, submission and result handling.
///
/// At most one request is `Submitting` at a time. Replacing the image while a
/// request is in flight does not cancel it; its response is discarded when it
/// arrives.
pub struct PredictionWorkflow<B: InferenceBackend> {
    backend: Arc<B>,
    slot: Arc<Mutex<Slot>>,
    notifier: Notifier<WorkflowEvent>,
}

impl<B: InferenceBackend> Clone for PredictionWorkflow<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            slot: self.slot.clone(),
            notifier: self.notifier.clone(),
        }
    }
}

impl<B: InferenceBackend> PredictionWorkflow<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            slot: Arc::new(Mutex::new(Slot {
                state: WorkflowState::Idle,
                generation: 0,
            })),
            notifier: Notifier::new(),
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.lock().state.clone()
    }

    pub fn subscribe(&self) -> mpsc::Receiver<WorkflowEvent> {
        self.notifier.subscribe()
    }

    /// Binds a freshly picked image, dropping any previous result or error.
    pub fn image_acquired(&self, asset: ImageAsset) {
        log::debug!("Image acquired from {}: {}", asset.source().as_str(), asset.uri());
        self.rebind(WorkflowState::ImageSelected(asset));
    }

    /// Returns to `Idle`, superseding whatever was selected or in flight.
    pub fn reset(&self) {
        self.rebind(WorkflowState::Idle);
    }

    /// Asks `port` for an image and binds it. A cancelled pick changes nothing.
    pub async fn acquire<P: InputAcquisitionPort>(
        &self,
        port: &P,
        source: ImageSource,
    ) -> Option<ImageAsset> {
        match port.acquire(source).await {
            Some(asset) => {
                self.image_acquired(asset.clone());
                Some(asset)
            }
            None => {
                log::debug!("Image acquisition from {} cancelled", source.as_str());
                None
            }
        }
    }

    /// Moves `ImageSelected` to `Submitting` and hands out the ticket for the
    /// request. Fails with `InvalidState` from any other state.
    pub fn begin_submit(&self) -> Result<PendingSubmission, ErrorInfo> {
        let mut slot = self.lock();
        let asset = match &slot.state {
            WorkflowState::ImageSelected(asset) => asset.clone(),
            other => {
                return Err(ErrorInfo::invalid_state(format!(
                    "Cannot submit while {}",
                    other.as_str()
                )));
            }
        };

        slot.state = WorkflowState::Submitting(asset.clone());
        self.notifier
            .emit(WorkflowEvent::StateChanged(slot.state.clone()));

        Ok(PendingSubmission {
            generation: slot.generation,
            asset,
        })
    }

    /// Applies the response for `pending`, unless its asset has been replaced
    /// in the meantime.
    pub fn complete(
        &self,
        pending: PendingSubmission,
        result: Result<PredictionResult, ErrorInfo>,
    ) -> SubmitOutcome {
        let mut slot = self.lock();
        let current = slot.generation == pending.generation
            && matches!(&slot.state, WorkflowState::Submitting(asset) if *asset == pending.asset);

        if !current {
            log::warn!(
                "Discarding late response for superseded image {}",
                pending.asset.uri()
            );
            self.notifier
                .emit(WorkflowEvent::ResponseDiscarded(pending.asset.clone()));
            return SubmitOutcome::Superseded(pending.asset);
        }

        slot.state = match result {
            Ok(prediction) => WorkflowState::Succeeded(pending.asset, prediction),
            Err(error) => {
                log::debug!("Prediction failed ({}): {}", error.kind.as_str(), error);
                WorkflowState::Failed(pending.asset, error)
            }
        };
        self.notifier
            .emit(WorkflowEvent::StateChanged(slot.state.clone()));

        SubmitOutcome::Applied(slot.state.clone())
    }

    /// Submits the selected image and waits for the service to answer.
    ///
    /// Errors only when the workflow is not in `ImageSelected`; inference
    /// failures land in the `Failed` state instead.
    pub async fn submit(&self) -> Result<SubmitOutcome, ErrorInfo> {
        let pending = self.begin_submit()?;
        log::debug!("Submitting {} for prediction", pending.asset.uri());

        let result = self.backend.predict(pending.asset.uri()).await;

        Ok(self.complete(pending, result))
    }

    fn rebind(&self, state: WorkflowState) {
        let mut slot = self.lock();
        if let WorkflowState::Submitting(asset) = &slot.state {
            log::debug!("Superseding in-flight request for {}", asset.uri());
        }
        slot.generation += 1;
        slot.state = state;
        self.notifier
            .emit(WorkflowEvent::StateChanged(slot.state.clone()));
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
