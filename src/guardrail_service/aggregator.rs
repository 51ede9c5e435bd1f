//! Batch Aggregator: an unbounded FIFO of `(text, completion-slot)` pairs
//! drained by a periodic worker, one `predict_batch` call per tick, results
//! resolved back in input order.
//!
//! A single tokio task owns the queue outright; a `tokio::sync::mpsc`
//! channel handles enqueue, so no lock is ever shared across requests.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use super::model::GuardrailModel;

#[derive(Debug, Clone, thiserror::Error)]
pub enum AggregatorError {
    #[error("guardrail model batch invocation failed: {0}")]
    ModelFailed(String),
    #[error("aggregator shut down before this request was resolved")]
    ShuttingDown,
}

struct Job {
    text: String,
    reply: oneshot::Sender<Result<String, AggregatorError>>,
}

/// Handle used by HTTP handlers to enqueue a classification request.
/// Cloning is cheap; every clone shares the same worker and queue.
#[derive(Clone)]
pub struct BatchAggregator {
    enqueue: mpsc::UnboundedSender<Job>,
}

impl BatchAggregator {
    /// Spawns the batch worker and returns a handle to it. The worker task
    /// runs until the returned handle (and all its clones) are dropped,
    /// closing the channel.
    pub fn spawn(model: Arc<dyn GuardrailModel>, batch_interval: std::time::Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(batch_worker(model, rx, batch_interval));
        Self { enqueue: tx }
    }

    /// Enqueue `text` for classification and await its result. Non-blocking
    /// to enqueue; the returned future resolves once the worker's next tick
    /// processes the batch containing this job.
    pub async fn classify(&self, text: String) -> Result<String, AggregatorError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.enqueue
            .send(Job { text, reply: reply_tx })
            .map_err(|_| AggregatorError::ShuttingDown)?;
        reply_rx.await.unwrap_or(Err(AggregatorError::ShuttingDown))
    }
}

async fn batch_worker(
    model: Arc<dyn GuardrailModel>,
    mut rx: mpsc::UnboundedReceiver<Job>,
    batch_interval: std::time::Duration,
) {
    let mut pending: Vec<Job> = Vec::new();
    loop {
        tokio::select! {
            job = rx.recv() => {
                match job {
                    Some(job) => pending.push(job),
                    // All senders dropped: fail any still-queued jobs and exit.
                    None => {
                        fail_all(pending, AggregatorError::ShuttingDown);
                        return;
                    }
                }
            }
            _ = tokio::time::sleep(batch_interval) => {
                if pending.is_empty() {
                    continue;
                }
                let batch = std::mem::take(&mut pending);
                run_batch(&model, batch).await;
            }
        }
    }
}

async fn run_batch(model: &Arc<dyn GuardrailModel>, batch: Vec<Job>) {
    let texts: Vec<String> = batch.iter().map(|j| j.text.clone()).collect();
    let model = Arc::clone(model);
    // Model invocation is CPU-bound and must not block the I/O scheduler,
    // so it runs on tokio's blocking pool.
    let outcome = tokio::task::spawn_blocking(move || model.predict_batch(&texts)).await;

    match outcome {
        Ok(results) if results.len() == batch.len() => {
            for (job, result) in batch.into_iter().zip(results) {
                let _ = job.reply.send(Ok(result));
            }
        }
        Ok(_) => {
            tracing::error!("guardrail model returned a result count mismatch for this batch");
            fail_all(
                batch,
                AggregatorError::ModelFailed("result count mismatch".to_string()),
            );
        }
        Err(join_err) => {
            tracing::error!(error = %join_err, "guardrail model batch invocation panicked");
            fail_all(batch, AggregatorError::ModelFailed(join_err.to_string()));
        }
    }
}

fn fail_all(batch: Vec<Job>, err: AggregatorError) {
    for job in batch {
        let _ = job.reply.send(Err(err.clone()));
    }
}
