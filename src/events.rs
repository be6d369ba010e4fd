use std::sync::{Arc, Mutex, MutexGuard, PoisonError, mpsc};

/// Fans events out to every live subscriber.
///
/// Receivers are plain `mpsc` receivers, so observers can either block on
/// `recv` from their own thread or poll with `try_recv`.
pub(crate) struct Notifier<E: Clone> {
    subscribers: Arc<Mutex<Vec<mpsc::Sender<E>>>>,
}

impl<E: Clone> Clone for Notifier<E> {
    fn clone(&self) -> Self {
        Self {
            subscribers: self.subscribers.clone(),
        }
    }
}

impl<E: Clone> Notifier<E> {
    pub(crate) fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn subscribe(&self) -> mpsc::Receiver<E> {
        let (tx, rx) = mpsc::channel();
        self.lock().push(tx);
        rx
    }

    pub(crate) fn emit(&self, event: E) {
        // dropped receivers unsubscribe themselves
        self.lock().retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn lock(&self) -> MutexGuard<'_, Vec<mpsc::Sender<E>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
