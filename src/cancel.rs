//! Cancellation signal shared between a caller and a running operation.

use tokio::sync::watch;

/// Sending half. Dropping it without calling [`CancelHandle::cancel`] never
/// cancels anything.
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    /// Signals every linked [`Cancellation`].
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

/// Receiving half, passed into the orchestrators.
#[derive(Debug, Clone)]
pub struct Cancellation {
    signal: watch::Receiver<bool>,
}

impl Cancellation {
    /// Creates a linked handle and signal.
    pub fn new() -> (CancelHandle, Cancellation) {
        let (sender, signal) = watch::channel(false);
        (CancelHandle { sender }, Cancellation { signal })
    }

    /// A signal that never fires.
    pub fn never() -> Cancellation {
        Cancellation::new().1
    }

    pub fn is_cancelled(&self) -> bool {
        *self.signal.borrow()
    }

    /// Resolves once cancellation is requested. Pends forever if the handle
    /// was dropped first.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.signal.borrow_and_update() {
                return;
            }
            if self.signal.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}
