//! Async runtime utilities for tessera.
//!
//! Provides runtime management for the reference scheduler.

use std::future::Future;

use common_error::{TesseraError, TesseraResult};
use tokio::runtime::Runtime;

/// Create a Tokio runtime for blocking entry points.
pub fn get_runtime() -> TesseraResult<Runtime> {
    Runtime::new().map_err(|e| TesseraError::internal(format!("Failed to create runtime: {e}")))
}

/// Block on a future using a fresh runtime.
pub fn block_on<F: Future>(future: F) -> TesseraResult<F::Output> {
    let runtime = get_runtime()?;
    Ok(runtime.block_on(future))
}

/// A handle to a set of spawned tasks.
pub struct JoinSet<T> {
    inner: tokio::task::JoinSet<T>,
}

impl<T: Send + 'static> JoinSet<T> {
    /// Create a new join set.
    pub fn new() -> Self {
        Self {
            inner: tokio::task::JoinSet::new(),
        }
    }

    /// Spawn a task into the set.
    pub fn spawn<F>(&mut self, future: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        self.inner.spawn(future);
    }

    /// Wait for the next task to complete.
    ///
    /// A panicked or aborted task is reported as an `ExecutionError`.
    pub async fn join_next(&mut self) -> Option<TesseraResult<T>> {
        let joined = self.inner.join_next().await?;
        Some(joined.map_err(|e| TesseraError::execution(format!("task failed to join: {e}"))))
    }

    /// Abort every task still running.
    pub fn abort_all(&mut self) {
        self.inner.abort_all();
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Get the number of tasks in the set.
    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<T: Send + 'static> Default for JoinSet<T> {
    fn default() -> Self {
        Self::new()
    }
}
