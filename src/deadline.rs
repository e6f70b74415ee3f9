use std::future::Future;

use tokio::time::{timeout_at, Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("deadline exceeded")]
pub struct DeadlineExceeded;

/// Absolute point in time after which an operation gives up.
///
/// Passed down from the caller so that every provider call, cache round trip
/// and store transaction in one request shares the same budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(Instant);

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self(Instant::now() + budget)
    }

    pub fn remaining(&self) -> Duration {
        self.0.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.0
    }

    /// Run `fut` until it completes or the deadline passes. On expiry the
    /// future is dropped, which rolls back any open sqlx transaction it owns.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, DeadlineExceeded> {
        timeout_at(self.0, fut).await.map_err(|_| DeadlineExceeded)
    }
}
