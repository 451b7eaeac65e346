//! Deadline and cancellation for outbound requests.
//!
//! # Responsibilities
//! - Arm a timer only when a positive timeout is configured
//! - Let callers cancel a request through an `AbortSignal`
//! - Settle exactly once: whichever of result, timer or signal comes first
//!
//! # Design Decisions
//! - Uses Tokio's timer and `watch` channel
//! - Cancellation drops the in-flight future, which tears down its connection

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;

use crate::client::FetchError;

/// Owner side of a cancellation pair.
#[derive(Debug)]
pub struct AbortController {
    tx: watch::Sender<bool>,
}

impl AbortController {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// A signal observing this controller. Signals are cheap to clone.
    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Abort every request holding a signal of this controller. Idempotent.
    pub fn abort(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_aborted(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for AbortController {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer side of a cancellation pair.
#[derive(Debug, Clone)]
pub struct AbortSignal {
    rx: watch::Receiver<bool>,
}

impl AbortSignal {
    pub fn is_aborted(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the controller aborts. Never resolves if the controller
    /// is dropped without aborting.
    pub async fn aborted(&self) {
        let mut rx = self.rx.clone();
        let closed = rx.wait_for(|aborted| *aborted).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }
}

/// Run `fut` under a deadline of `timeout_ms` (0 = none) and an optional
/// abort signal.
pub async fn with_deadline<F, T>(
    timeout_ms: u64,
    signal: Option<&AbortSignal>,
    fut: F,
) -> Result<T, FetchError>
where
    F: Future<Output = Result<T, FetchError>>,
{
    let timer = async {
        if timeout_ms > 0 {
            tokio::time::sleep(Duration::from_millis(timeout_ms)).await;
        } else {
            std::future::pending::<()>().await;
        }
    };
    let abort = async {
        match signal {
            Some(signal) => signal.aborted().await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        biased;
        _ = abort => {
            tracing::debug!("Request aborted by signal");
            Err(FetchError::Aborted)
        }
        _ = timer => {
            tracing::debug!(timeout_ms, "Request deadline elapsed");
            Err(FetchError::Aborted)
        }
        result = fut => result,
    }
}
