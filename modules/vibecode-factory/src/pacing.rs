//! Rate-limit pacing: batch partitioning and the waits between calls.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

/// Performs a deliberate wait. Production code sleeps; tests record.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Records requested pauses without waiting.
#[derive(Debug, Default)]
pub struct RecordingPacer {
    pauses: Mutex<Vec<Duration>>,
}

impl RecordingPacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self, duration: Duration) {
        self.pauses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
    }
}

/// Batch size and the two delays that keep a run under the provider's quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingPolicy {
    pub batch_size: usize,
    /// Between successive rows inside a batch.
    pub call_delay: Duration,
    /// Between the last row of one batch and the first of the next.
    pub batch_delay: Duration,
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            batch_size: 3,
            call_delay: Duration::from_secs(1),
            batch_delay: Duration::from_secs(5),
        }
    }
}

impl PacingPolicy {
    pub fn batches<'a, T>(&self, items: &'a [T]) -> std::slice::Chunks<'a, T> {
        items.chunks(self.batch_size.max(1))
    }

    pub fn batch_count(&self, items: usize) -> usize {
        items.div_ceil(self.batch_size.max(1))
    }

    /// Wait owed before row `position` of batch `batch` (both 0-based).
    pub fn delay_before(&self, batch: usize, position: usize) -> Option<Duration> {
        match (batch, position) {
            (0, 0) => None,
            (_, 0) => Some(self.batch_delay),
            _ => Some(self.call_delay),
        }
    }
}
