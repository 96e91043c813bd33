// Cosmetic progress ticker.
//
// While a run or submit is in flight the console shows "n / total" cases. The
// judge reports nothing until it is done, so n is faked: it climbs one step
// per tick and stalls one short of the total. It is never read back as a
// completion signal.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Shared progress value read by snapshots.
#[derive(Debug, Clone, Default)]
pub struct ProgressValue(Arc<AtomicU32>);

impl ProgressValue {
    pub fn get(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(0, Ordering::SeqCst);
    }

    /// Step toward `ceiling` without reaching past it.
    fn step(&self, ceiling: u32) {
        let _ = self
            .0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| (v < ceiling).then_some(v + 1));
    }
}

/// Running ticker. Dropping it stops the ticks and zeroes the value.
#[derive(Debug)]
pub struct ProgressTicker {
    value: ProgressValue,
    task: JoinHandle<()>,
}

impl ProgressTicker {
    /// Reset `value` and start ticking toward `expected_total - 1`.
    pub fn start(value: ProgressValue, expected_total: u32, tick: Duration) -> Self {
        value.reset();
        let ceiling = expected_total.saturating_sub(1);
        let ticking = value.clone();

        let task = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + tick, tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                ticking.step(ceiling);
            }
        });

        Self { value, task }
    }

    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.task.abort();
        self.value.reset();
    }
}
