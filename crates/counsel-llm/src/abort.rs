use tokio::sync::watch;

/// Create a linked abort handle/signal pair.
///
/// The handle side lives with whoever owns the run (the client's stop
/// button, the request guard); the signal side is threaded through the
/// workflow into the model stream.
pub fn abort_pair() -> (AbortHandle, AbortSignal) {
    let (tx, rx) = watch::channel(false);
    (AbortHandle { tx }, AbortSignal { rx })
}

#[derive(Debug)]
pub struct AbortHandle {
    tx: watch::Sender<bool>,
}

impl AbortHandle {
    pub fn abort(&self) {
        let _ = self.tx.send(true);
    }
}

#[derive(Debug, Clone)]
pub struct AbortSignal {
    rx: watch::Receiver<bool>,
}

impl AbortSignal {
    pub fn is_aborted(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once aborted. Never resolves if the handle is dropped
    /// without aborting.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // Handle gone; this run can no longer be aborted.
                futures::future::pending::<()>().await;
            }
        }
    }
}
