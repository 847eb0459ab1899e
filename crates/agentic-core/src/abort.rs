use tokio::sync::watch;

/// Creates a connected handle/signal pair.
pub fn abort_pair() -> (AbortHandle, AbortSignal) {
    let (tx, rx) = watch::channel(false);
    (AbortHandle { tx }, AbortSignal { rx: Some(rx) })
}

/// Handle used to request cancellation of a run.
#[derive(Clone, Debug)]
pub struct AbortHandle {
    tx: watch::Sender<bool>,
}

impl AbortHandle {
    /// Requests cancellation. Idempotent.
    pub fn abort(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_aborted(&self) -> bool {
        *self.tx.borrow()
    }

    /// A new signal observing this handle.
    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            rx: Some(self.tx.subscribe()),
        }
    }

    /// Aborts when the returned guard is dropped.
    pub fn guard(&self) -> AbortGuard {
        AbortGuard {
            handle: self.clone(),
        }
    }
}

/// Observer side of an [`AbortHandle`].
#[derive(Clone, Debug)]
pub struct AbortSignal {
    rx: Option<watch::Receiver<bool>>,
}

impl AbortSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        Self { rx: None }
    }

    pub fn is_aborted(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once cancellation is requested.
    ///
    /// Never resolves if every handle was dropped without aborting.
    pub async fn aborted(&mut self) {
        let Some(rx) = self.rx.as_mut() else {
            return std::future::pending().await;
        };
        let closed = rx.wait_for(|aborted| *aborted).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }
}

/// Fires its handle on drop.
#[derive(Debug)]
pub struct AbortGuard {
    handle: AbortHandle,
}

impl Drop for AbortGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn abort_wakes_every_signal() {
        let (handle, mut first) = abort_pair();
        let mut second = handle.signal();
        assert!(!first.is_aborted());
        let waiter = tokio::spawn(async move { second.aborted().await });
        handle.abort();
        handle.abort();
        first.aborted().await;
        assert!(first.is_aborted());
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("woken")
            .expect("join");
    }

    #[tokio::test]
    async fn dropped_handle_never_fires() {
        let (handle, mut signal) = abort_pair();
        drop(handle);
        let waited = tokio::time::timeout(Duration::from_millis(20), signal.aborted()).await;
        assert!(waited.is_err());
        assert!(!signal.is_aborted());
        assert!(!AbortSignal::never().is_aborted());
    }

    #[test]
    fn guard_aborts_on_drop() {
        let (handle, signal) = abort_pair();
        let guard = handle.guard();
        assert!(!signal.is_aborted());
        drop(guard);
        assert!(signal.is_aborted());
        assert!(handle.is_aborted());
    }
}
