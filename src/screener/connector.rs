//! Bounded-parallelism dispatcher that keeps results in input order
//!
//! Work items are spawned onto a [`JoinSet`], each gated by a semaphore permit. Every
//! task knows its position in the input, and its output is written into that slot
//! regardless of completion order. The first failure that survives retrying aborts the
//! rest of the batch.

use crate::config::{FetcherConfig, RetryConfig};
use crate::screener::retry::{RetryPolicy, Retryable};
use crate::ScreenerError;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::Instrument;

/// Failure of a dispatched batch
#[derive(Debug, Error)]
pub enum DispatchError<E>
where
    E: std::error::Error + 'static,
{
    #[error("item {position} ({item}) failed after {attempts} attempt(s): {source}")]
    Failed {
        position: usize,
        item: String,
        attempts: usize,
        source: E,
    },

    #[error("worker task aborted: {message}")]
    Aborted { message: String },
}

impl From<DispatchError<ScreenerError>> for ScreenerError {
    fn from(error: DispatchError<ScreenerError>) -> Self {
        match error {
            DispatchError::Failed {
                item,
                attempts,
                source,
                ..
            } => ScreenerError::PageFailed {
                descriptor: item,
                attempts,
                source: Box::new(source),
            },
            DispatchError::Aborted { message } => ScreenerError::WorkerAborted { message },
        }
    }
}

/// Runs a worker over a list of items with bounded concurrency
#[derive(Debug, Clone)]
pub struct Connector {
    max_concurrency: usize,
    retry: RetryPolicy,
}

impl Connector {
    pub fn new(max_concurrency: usize, retry: RetryPolicy) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
            retry,
        }
    }

    pub fn from_config(fetcher: &FetcherConfig, retry: &RetryConfig) -> Self {
        Self::new(
            fetcher.max_concurrent_requests,
            RetryPolicy::from_config(retry),
        )
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Applies `worker` to every item and returns the outputs in item order
    ///
    /// Each invocation is retried on its own according to the retry policy. When an
    /// item still fails, the remaining tasks are aborted and no partial output is
    /// returned.
    ///
    /// # Arguments
    ///
    /// * `items` - Work items; `output[i]` corresponds to `items[i]`
    /// * `worker` - Async function handling one item
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<R>)` - One output per item, in input order
    /// * `Err(DispatchError)` - The first item that failed for good, or a task that died
    pub async fn run<I, R, E, F, Fut>(
        &self,
        items: Vec<I>,
        worker: F,
    ) -> Result<Vec<R>, DispatchError<E>>
    where
        I: Clone + Display + Send + Sync + 'static,
        R: Send + 'static,
        E: Retryable + std::error::Error + Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let total = items.len();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let worker = Arc::new(worker);
        let labels: Vec<String> = items.iter().map(ToString::to_string).collect();

        tracing::debug!(
            "Dispatching {} item(s) with concurrency {}",
            total,
            self.max_concurrency
        );

        let mut tasks = JoinSet::new();
        for (position, item) in items.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let worker = Arc::clone(&worker);
            let retry = self.retry.clone();
            let span = tracing::debug_span!("dispatch", position, item = %labels[position]);

            tasks.spawn(
                async move {
                    // The semaphore is never closed
                    let _permit = semaphore.acquire_owned().await.ok();
                    let outcome = retry.run(|| (*worker)(item.clone())).await;
                    (position, outcome)
                }
                .instrument(span),
            );
        }

        let mut slots: Vec<Option<R>> = (0..total).map(|_| None).collect();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((position, Ok(output))) => {
                    slots[position] = Some(output);
                }
                Ok((position, Err(failure))) => {
                    tasks.abort_all();
                    tracing::warn!(
                        "{} failed after {} attempt(s): {}",
                        labels[position],
                        failure.attempts,
                        failure.error
                    );
                    return Err(DispatchError::Failed {
                        position,
                        item: labels[position].clone(),
                        attempts: failure.attempts,
                        source: failure.error,
                    });
                }
                Err(join_error) => {
                    tasks.abort_all();
                    return Err(DispatchError::Aborted {
                        message: join_error.to_string(),
                    });
                }
            }
        }

        slots
            .into_iter()
            .collect::<Option<Vec<R>>>()
            .ok_or_else(|| DispatchError::Aborted {
                message: "a task finished without reporting its output".to_string(),
            })
    }
}
