//! Fire-and-forget execution of background work.
//!
//! A webhook handler must not wait for a broadcast to finish, but the
//! broadcast must still run when no async runtime is driving the caller.
//! [`Scheduler::detect`] picks the right strategy for the calling context:
//!
//! - inside a Tokio runtime the task is spawned onto it and outlives the
//!   caller,
//! - outside of one the task runs to completion on a private
//!   current-thread runtime before `schedule` returns.

use std::future::Future;
use std::pin::Pin;

use tokio::runtime::{Builder, Handle};
use tracing::error;

/// A unit of background work.
pub type Task = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Capability to run a [`Task`] without the caller awaiting it.
pub trait Schedule: Send + Sync {
    fn schedule(&self, task: Task);
}

/// Spawns onto an existing Tokio runtime.
#[derive(Debug, Clone)]
pub struct RuntimeScheduler {
    handle: Handle,
}

impl RuntimeScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }
}

impl Schedule for RuntimeScheduler {
    fn schedule(&self, task: Task) {
        // Detached: the JoinHandle is dropped on purpose.
        drop(self.handle.spawn(task));
    }
}

/// Runs the task to completion on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineScheduler;

impl Schedule for InlineScheduler {
    fn schedule(&self, task: Task) {
        match Builder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime.block_on(task),
            Err(e) => error!(error = %e, "Failed to build inline runtime, task dropped"),
        }
    }
}

/// Scheduler chosen for the current execution context.
#[derive(Debug, Clone)]
pub enum Scheduler {
    Runtime(RuntimeScheduler),
    Inline(InlineScheduler),
}

impl Scheduler {
    /// Use the ambient Tokio runtime if there is one, else run inline.
    pub fn detect() -> Self {
        match Handle::try_current() {
            Ok(handle) => Scheduler::Runtime(RuntimeScheduler::new(handle)),
            Err(_) => Scheduler::Inline(InlineScheduler),
        }
    }
}

impl Schedule for Scheduler {
    fn schedule(&self, task: Task) {
        match self {
            Scheduler::Runtime(s) => s.schedule(task),
            Scheduler::Inline(s) => s.schedule(task),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::oneshot;

    #[test]
    fn test_detect_without_runtime_runs_inline() {
        assert!(matches!(Scheduler::detect(), Scheduler::Inline(_)));

        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        Scheduler::detect().schedule(Box::pin(async move {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            flag.store(true, Ordering::SeqCst);
        }));
        assert!(ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_detect_inside_runtime_spawns() {
        let scheduler = Scheduler::detect();
        assert!(matches!(scheduler, Scheduler::Runtime(_)));

        let (tx, rx) = oneshot::channel();
        scheduler.schedule(Box::pin(async move {
            let _ = tx.send(7);
        }));
        assert_eq!(rx.await.unwrap(), 7);
    }
}
