use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Interval, MissedTickBehavior};

/// Tick source for the sampling loop.
pub trait Scheduler {
    /// Resolves at the next tick with `true`, or with `false` once the
    /// schedule has been cancelled.
    fn next_tick(&mut self) -> impl Future<Output = bool>;
}

/// Cancels the [`IntervalScheduler`] it was created with.
#[derive(Clone, Debug)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.0.send(true);
    }
}

/// Fixed-period ticks; the first tick fires immediately.
pub struct IntervalScheduler {
    interval: Interval,
    cancel: watch::Receiver<bool>,
    cancel_open: bool,
}

impl IntervalScheduler {
    pub fn new(period: Duration) -> (Self, CancelHandle) {
        let mut interval = tokio::time::interval(period.max(Duration::from_millis(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let (tx, rx) = watch::channel(false);
        let scheduler = IntervalScheduler {
            interval,
            cancel: rx,
            cancel_open: true,
        };
        (scheduler, CancelHandle(tx))
    }
}

impl Scheduler for IntervalScheduler {
    async fn next_tick(&mut self) -> bool {
        loop {
            if *self.cancel.borrow_and_update() {
                return false;
            }
            tokio::select! {
                _ = self.interval.tick() => return true,
                changed = self.cancel.changed(), if self.cancel_open => {
                    // A dropped handle can never cancel; keep ticking
                    if changed.is_err() {
                        self.cancel_open = false;
                    }
                }
            }
        }
    }
}

/// Fires a fixed number of ticks back to back, then stops.
#[derive(Clone, Copy, Debug)]
pub struct CountedScheduler {
    remaining: usize,
}

impl CountedScheduler {
    pub fn new(ticks: usize) -> Self {
        CountedScheduler { remaining: ticks }
    }
}

impl Scheduler for CountedScheduler {
    async fn next_tick(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}
