//! Tasks whose lifetime is decoupled from the code that started them.
//!
//! A [`DetachedTask`] runs on a tokio runtime. Dropping the value does **not**
//! cancel the task: it keeps running until it completes on its own. Callers
//! that do care (tests, a graceful shutdown path) can [`wait`](DetachedTask::wait) for it.

use std::future::Future;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

#[derive(Debug)]
pub struct DetachedTask {
    handle: Option<JoinHandle<()>>,
}

impl DetachedTask {
    /// Spawns `fut` on `runtime`.
    pub fn spawn<F>(runtime: &Handle, fut: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            handle: Some(runtime.spawn(fut)),
        }
    }

    /// A task that had nothing to do.
    pub fn completed() -> Self {
        Self { handle: None }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Waits until the task ran to completion. A panic inside the task is logged, not propagated.
    pub async fn wait(self) {
        if let Some(handle) = self.handle {
            if let Err(e) = handle.await {
                log::warn!("detached task did not complete: {}", e);
            }
        }
    }
}
