// File: crates/digitizer-core/src/cancel.rs
// Summary: Cooperative cancellation and a background job wrapper for long-running scans.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::error::{DigitizeError, Result};

/// Shared flag polled between pixel-scan steps.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// `Err(Cancelled)` once [`CancelToken::cancel`] has been called.
    #[inline]
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(DigitizeError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// A computation running on its own thread. The result is only observed through
/// [`BackgroundJob::join`], so a cancelled job never publishes partial output.
#[derive(Debug)]
pub struct BackgroundJob<T> {
    token: CancelToken,
    handle: JoinHandle<Result<T>>,
}

impl<T: Send + 'static> BackgroundJob<T> {
    pub fn spawn<F>(work: F) -> Self
    where
        F: FnOnce(&CancelToken) -> Result<T> + Send + 'static,
    {
        let token = CancelToken::new();
        let worker_token = token.clone();
        let handle = std::thread::spawn(move || work(&worker_token));
        Self { token, handle }
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the job. A panicking worker is reported as cancelled.
    pub fn join(self) -> Result<T> {
        match self.handle.join() {
            Ok(result) => {
                if let Err(DigitizeError::Cancelled) = &result {
                    tracing::warn!("background job cancelled");
                }
                result
            }
            Err(_) => {
                tracing::warn!("background job panicked");
                Err(DigitizeError::Cancelled)
            }
        }
    }
}
