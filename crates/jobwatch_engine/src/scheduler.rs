use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::future::BoxFuture;
use jobwatch_logging::{watch_debug, watch_error};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Shortest accepted poll period; a zero interval would spin.
const MIN_INTERVAL: Duration = Duration::from_millis(10);

/// Owns at most one repeating poll timer.
///
/// Each tick's future is spawned as its own task, so a slow tick never delays
/// the next one. Ordering of their results is the caller's concern.
#[derive(Debug, Default)]
pub struct PollScheduler {
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl PollScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the timer. The first tick fires one full `interval` after arming.
    ///
    /// Returns `false` without touching the running timer if already armed, or
    /// if called outside a Tokio runtime.
    pub fn begin<F>(&self, interval: Duration, on_tick: F) -> bool
    where
        F: Fn() -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        let mut timer = self.timer();
        if timer.as_ref().is_some_and(|handle| !handle.is_finished()) {
            watch_debug!("poll scheduler already armed");
            return false;
        }
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(err) => {
                watch_error!("cannot arm poll scheduler: {}", err);
                return false;
            }
        };

        let period = interval.max(MIN_INTERVAL);
        let handle = runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                tokio::spawn(on_tick());
            }
        });
        *timer = Some(handle);
        watch_debug!("poll scheduler armed every {:?}", period);
        true
    }

    /// Disarms the timer. Returns `false` if it was not armed.
    ///
    /// Ticks already spawned run to completion.
    pub fn cancel(&self) -> bool {
        match self.timer().take() {
            Some(handle) => {
                handle.abort();
                watch_debug!("poll scheduler cancelled");
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.timer()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn timer(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
