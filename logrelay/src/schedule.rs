//! Repeating timers for periodic flushing.
//!
//! A [`Scheduler`] runs a task every `period` until its [`TimerHandle`] is cancelled.
//! [`ThreadScheduler`] needs no runtime and is what hubs use unless told otherwise; with the `tokio` feature,
//! [`TokioScheduler`] runs the timers as tasks on a tokio runtime instead.

use std::fmt::{self, Debug};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

/// The body of a repeating timer.
pub type Task = Box<dyn FnMut() + Send + 'static>;

/// Starts repeating timers.
pub trait Scheduler: Debug + Send + Sync {
    /// Runs `task` every `period`, the first time one `period` from now.
    fn schedule_repeating(&self, period: Duration, task: Task) -> TimerHandle;
}

/// Cancels a repeating timer.
///
/// Dropping the handle does not cancel the timer.
#[must_use = "a timer can only be cancelled through its handle"]
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TimerHandle {
    /// Creates a handle that runs `cancel` the first time [`TimerHandle::cancel`] is called.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stops the timer. Cancelling an already cancelled timer does nothing.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Whether [`TimerHandle::cancel`] has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_none()
    }
}

impl Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Runs every timer on its own thread.
///
/// Cancelling wakes the thread immediately, a tick that is already running completes first.
#[derive(Debug, Default, Copy, Clone)]
pub struct ThreadScheduler;

impl Scheduler for ThreadScheduler {
    fn schedule_repeating(&self, period: Duration, mut task: Task) -> TimerHandle {
        let (cancel, cancelled) = mpsc::channel::<()>();

        let spawned = std::thread::Builder::new()
            .name("logrelay-timer".into())
            .spawn(move || {
                loop {
                    match cancelled.recv_timeout(period) {
                        Ok(()) => break,
                        Err(RecvTimeoutError::Timeout) => task(),
                        // The handle was dropped without cancelling, keep ticking.
                        Err(RecvTimeoutError::Disconnected) => {
                            std::thread::sleep(period);
                            task();
                        }
                    }
                }
            });

        if let Err(error) = spawned {
            tracing::warn!(%error, "failed to spawn timer thread, periodic task will not run");
        }

        TimerHandle::new(move || {
            // The thread may already be gone if spawning failed.
            let _ = cancel.send(());
        })
    }
}

/// Runs every timer as a task on a tokio runtime.
#[cfg(feature = "tokio")]
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: tokio::runtime::Handle,
}

#[cfg(feature = "tokio")]
impl TokioScheduler {
    /// Schedules on the runtime behind `handle`.
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Schedules on the runtime of the calling context.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a tokio runtime.
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }
}

#[cfg(feature = "tokio")]
impl Scheduler for TokioScheduler {
    fn schedule_repeating(&self, period: Duration, mut task: Task) -> TimerHandle {
        let join = self.handle.spawn(async move {
            let mut interval =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                interval.tick().await;
                task();
            }
        });

        TimerHandle::new(move || join.abort())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::{Scheduler, ThreadScheduler, TimerHandle};

    #[test]
    fn cancel_is_idempotent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut handle = TimerHandle::new({
            let calls = calls.clone();
            move || {
                calls.fetch_add(1, Ordering::Relaxed);
            }
        });

        handle.cancel();
        handle.cancel();

        assert!(handle.is_cancelled());
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn thread_timer_ticks_until_cancelled() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let mut handle = ThreadScheduler.schedule_repeating(Duration::from_millis(5), {
            let ticks = ticks.clone();
            Box::new(move || {
                ticks.fetch_add(1, Ordering::SeqCst);
            })
        });

        while ticks.load(Ordering::SeqCst) < 2 {
            std::thread::sleep(Duration::from_millis(1));
        }
        handle.cancel();

        // Give a tick that raced with the cancellation time to land.
        std::thread::sleep(Duration::from_millis(20));
        let after_cancel = ticks.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(30));

        assert_eq!(ticks.load(Ordering::SeqCst), after_cancel);
    }

    #[cfg(feature = "tokio")]
    #[tokio::test(start_paused = true)]
    async fn tokio_timer_ticks_until_cancelled() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let mut handle = super::TokioScheduler::current().schedule_repeating(
            Duration::from_secs(10),
            {
                let ticks = ticks.clone();
                Box::new(move || {
                    ticks.fetch_add(1, Ordering::SeqCst);
                })
            },
        );

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);

        handle.cancel();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
    }
}
