use std::sync::{Arc, Mutex, MutexGuard, PoisonError, mpsc};

use crate::{InferenceBackend, events::Notifier};

/// Liveness of the inference service as last observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HealthStatus {
    /// No check has run yet.
    Unknown,
    Checking,
    Connected,
    Unreachable,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Unknown => "unknown",
            HealthStatus::Checking => "checking",
            HealthStatus::Connected => "connected",
            HealthStatus::Unreachable => "unreachable",
        }
    }
}

/// Holds the process-wide health slot and refreshes it on demand.
///
/// Checks carry no per-request state, so overlapping calls are harmless: the
/// slot simply ends up with whichever answer arrived last.
pub struct HealthMonitor<B: InferenceBackend> {
    backend: Arc<B>,
    status: Arc<Mutex<HealthStatus>>,
    notifier: Notifier<HealthStatus>,
}

impl<B: InferenceBackend> Clone for HealthMonitor<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            status: self.status.clone(),
            notifier: self.notifier.clone(),
        }
    }
}

impl<B: InferenceBackend> HealthMonitor<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            status: Arc::new(Mutex::new(HealthStatus::Unknown)),
            notifier: Notifier::new(),
        }
    }

    /// Creates the monitor and runs the initial check.
    pub async fn start(backend: Arc<B>) -> Self {
        let monitor = Self::new(backend);
        monitor.check().await;
        monitor
    }

    pub fn status(&self) -> HealthStatus {
        *self.lock()
    }

    /// Receives every status the slot takes from now on.
    pub fn subscribe(&self) -> mpsc::Receiver<HealthStatus> {
        self.notifier.subscribe()
    }

    pub async fn check(&self) -> HealthStatus {
        self.set(HealthStatus::Checking);
        let status = self.backend.check_health().await;
        log::debug!("Backend health: {}", status.as_str());
        self.set(status);
        status
    }

    fn set(&self, status: HealthStatus) {
        *self.lock() = status;
        self.notifier.emit(status);
    }

    fn lock(&self) -> MutexGuard<'_, HealthStatus> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
