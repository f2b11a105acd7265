//! Fixed-interval background task with an explicit stop signal.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};

/// Handle to a task that calls a cycle function every `interval`.
///
/// The first cycle runs immediately. The task ends when [`stop`](Self::stop)
/// is called, when the handle is dropped, or when the cycle returns
/// `ControlFlow::Break`.
pub struct PeriodicTask {
    name: &'static str,
    stop_tx: watch::Sender<bool>,
    ticks: Arc<AtomicU64>,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// Spawn onto the current tokio runtime.
    pub fn spawn<F>(name: &'static str, interval: Duration, mut cycle: F) -> Self
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let ticks = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&ticks);

        let handle = tokio::spawn(async move {
            let mut tick = tokio::time::interval(interval);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    // Err means the handle was dropped; stop either way.
                    _ = stop_rx.changed() => break,

                    _ = tick.tick() => {
                        let flow = cycle();
                        counter.fetch_add(1, Ordering::Relaxed);
                        if flow.is_break() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!(task = name, "periodic task exited");
        });

        Self {
            name,
            stop_tx,
            ticks,
            handle,
        }
    }

    /// Completed cycles so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Signal the task and wait for it to exit. A cycle already running is
    /// allowed to finish.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.handle.await {
            tracing::warn!(task = self.name, error = %e, "periodic task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn runs_every_interval_until_stopped() {
        let task = PeriodicTask::spawn("test", Duration::from_secs(1), || ControlFlow::Continue(()));

        // Cycles at t=0, 1, 2, 3.
        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(task.ticks(), 4);

        let ticks = Arc::clone(&task.ticks);
        task.stop().await;
        let after_stop = ticks.load(Ordering::Relaxed);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(ticks.load(Ordering::Relaxed), after_stop);
    }

    #[tokio::test(start_paused = true)]
    async fn break_ends_the_task() {
        let mut left = 3;
        let task = PeriodicTask::spawn("test", Duration::from_millis(100), move || {
            left -= 1;
            if left == 0 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(task.ticks(), 3);
        assert!(task.is_finished());
        task.stop().await;
    }
}
