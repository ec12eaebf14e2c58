//! Timeout helper.

use std::future::Future;
use std::time::Duration;

use crate::error::MuseError;

/// Wrap a future with a timeout.
pub async fn with_timeout<T>(
    duration: Duration,
    future: impl Future<Output = Result<T, MuseError>>,
) -> Result<T, MuseError> {
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(MuseError::Timeout(duration.as_millis() as u64)),
    }
}

/// Apply `duration` when present, otherwise await the future unbounded.
pub async fn maybe_timeout<T>(
    duration: Option<Duration>,
    future: impl Future<Output = Result<T, MuseError>>,
) -> Result<T, MuseError> {
    match duration {
        Some(duration) => with_timeout(duration, future).await,
        None => future.await,
    }
}
