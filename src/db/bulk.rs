use async_trait::async_trait;

use crate::deadline::Deadline;

/// Sink that can persist one batch of `T` atomically.
#[async_trait]
pub trait BatchInsert<T: Sync>: Send + Sync {
    /// Insert every item or none of them. Returns rows written.
    async fn insert_batch(&self, batch: &[T]) -> anyhow::Result<u64>;
}

#[derive(Debug, thiserror::Error)]
pub enum BatchFailure {
    #[error(transparent)]
    Store(anyhow::Error),

    #[error("deadline exceeded")]
    DeadlineExceeded,
}

#[derive(Debug)]
pub struct FailedBatch {
    pub index: usize,
    pub size: usize,
    pub cause: BatchFailure,
}

#[derive(Debug, Default)]
pub struct BulkInsertReport {
    /// Sizes of the batches that committed, in order.
    pub committed: Vec<usize>,
    /// First batch that failed; nothing after it was attempted.
    pub failed: Option<FailedBatch>,
}

impl BulkInsertReport {
    pub fn committed_rows(&self) -> usize {
        self.committed.iter().sum()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_none()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("batch size must be greater than zero")]
pub struct InvalidBatchSize;

/// Insert `items` in order, `batch_size` at a time, one sink transaction per
/// batch. Stops at the first failing batch; earlier batches stay committed.
pub async fn insert_in_batches<T, S>(
    sink: &S,
    items: &[T],
    batch_size: usize,
    deadline: Deadline,
) -> Result<BulkInsertReport, InvalidBatchSize>
where
    T: Sync,
    S: BatchInsert<T> + ?Sized,
{
    if batch_size == 0 {
        return Err(InvalidBatchSize);
    }

    let mut report = BulkInsertReport::default();
    for (index, chunk) in items.chunks(batch_size).enumerate() {
        let cause = match deadline.run(sink.insert_batch(chunk)).await {
            Ok(Ok(_)) => {
                report.committed.push(chunk.len());
                continue;
            }
            Ok(Err(e)) => BatchFailure::Store(e),
            Err(_) => BatchFailure::DeadlineExceeded,
        };

        tracing::warn!(
            batch = index,
            size = chunk.len(),
            committed = report.committed_rows(),
            error = %cause,
            "Bulk insert stopped"
        );
        report.failed = Some(FailedBatch {
            index,
            size: chunk.len(),
            cause,
        });
        break;
    }

    Ok(report)
}
