//! Task scheduler wrapping the tokio runtime.
//!
//! The scheduler tracks every task it spawns so that [`Scheduler::join`]
//! can await them all, and carries the shared stopped flag that cooperative
//! loops observe between iterations. Cancellation is strictly cooperative:
//! no task is forcibly interrupted.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::error::Result;

/// A handle for spawning cooperative tasks and stopping them as a group.
#[derive(Debug, Default)]
pub struct Scheduler {
    tasks: Mutex<Vec<JoinHandle<()>>>,
    stopped: AtomicBool,
    cancel: Notify,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn track(&self, handle: JoinHandle<()>) {
        self.tasks.lock().unwrap().push(handle);
    }

    /// Spawn a task.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.track(tokio::spawn(task));
    }

    /// Spawn a task and invoke `handler` with its output on completion.
    pub fn spawn_with_handler<T, F, H>(&self, task: F, handler: H)
    where
        T: Send + 'static,
        F: Future<Output = T> + Send + 'static,
        H: FnOnce(T) + Send + 'static,
    {
        self.track(tokio::spawn(async move { handler(task.await) }));
    }

    /// Spawn a fallible task driving a cooperative loop. On completion the
    /// loop's stop is invoked and the scheduler shuts down; on error the
    /// error is logged and `exit_code` is set to 1.
    pub fn spawn_result<F, S>(scheduler: &Arc<Self>, task: F, stop: S, exit_code: Arc<AtomicI32>)
    where
        F: Future<Output = Result<()>> + Send + 'static,
        S: FnOnce() + Send + 'static,
    {
        let handler_scheduler = Arc::clone(scheduler);
        scheduler.spawn_with_handler(task, move |result| {
            stop();
            if let Err(error) = result {
                tracing::error!("{error}");
                exit_code.store(1, Ordering::SeqCst);
            }
            handler_scheduler.stop();
        });
    }

    /// Stop the scheduler. In-flight tasks observe the flag through
    /// [`Scheduler::is_stopped`] and exit cooperatively.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.cancel.notify_waiters();
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Completes once the scheduler has been stopped. Tasks waiting on
    /// timers select on this so a stop interrupts the wait.
    pub async fn cancelled(&self) {
        let notified = self.cancel.notified();
        if self.is_stopped() {
            return;
        }
        notified.await;
    }

    /// Await all spawned tasks. A panicked task is logged and stops the
    /// scheduler.
    pub async fn join(&self) {
        loop {
            let handle = self.tasks.lock().unwrap().pop();
            match handle {
                Some(handle) => {
                    if let Err(error) = handle.await {
                        if error.is_panic() {
                            tracing::error!("panic in spawned task: {error}");
                            self.stop();
                        }
                    }
                }
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::time::Duration;

    #[tokio::test]
    async fn join_awaits_spawned_tasks() {
        let scheduler = Arc::new(Scheduler::new());
        let value = Arc::new(AtomicI32::new(0));

        let task_value = Arc::clone(&value);
        scheduler.spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            task_value.store(42, Ordering::SeqCst);
        });

        scheduler.join().await;
        assert_eq!(value.load(Ordering::SeqCst), 42);
    }

    #[tokio::test]
    async fn handler_receives_task_output() {
        let scheduler = Arc::new(Scheduler::new());
        let value = Arc::new(AtomicI32::new(0));

        let handler_value = Arc::clone(&value);
        scheduler.spawn_with_handler(async { 7 }, move |out| {
            handler_value.store(out, Ordering::SeqCst);
        });

        scheduler.join().await;
        assert_eq!(value.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn spawn_result_stops_scheduler_and_sets_exit_code_on_error() {
        let scheduler = Arc::new(Scheduler::new());
        let exit_code = Arc::new(AtomicI32::new(0));
        let stop_observed = Arc::new(AtomicBool::new(false));

        let stop_flag = Arc::clone(&stop_observed);
        Scheduler::spawn_result(
            &scheduler,
            async { Err(Error::EventHandler("backend failed".into())) },
            move || stop_flag.store(true, Ordering::SeqCst),
            Arc::clone(&exit_code),
        );

        scheduler.join().await;
        assert!(scheduler.is_stopped());
        assert!(stop_observed.load(Ordering::SeqCst));
        assert_eq!(exit_code.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn spawn_result_leaves_exit_code_untouched_on_success() {
        let scheduler = Arc::new(Scheduler::new());
        let exit_code = Arc::new(AtomicI32::new(0));

        Scheduler::spawn_result(&scheduler, async { Ok(()) }, || {}, Arc::clone(&exit_code));

        scheduler.join().await;
        assert!(scheduler.is_stopped());
        assert_eq!(exit_code.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancelled_resolves_after_stop() {
        let scheduler = Arc::new(Scheduler::new());

        let waiter = Arc::clone(&scheduler);
        let handle = tokio::spawn(async move {
            waiter.cancelled().await;
            true
        });

        tokio::time::sleep(Duration::from_millis(5)).await;
        scheduler.stop();
        assert!(handle.await.unwrap());
    }

    #[tokio::test]
    async fn cancelled_resolves_immediately_when_already_stopped() {
        let scheduler = Scheduler::new();
        scheduler.stop();
        scheduler.cancelled().await;
        assert!(scheduler.is_stopped());
    }
}
