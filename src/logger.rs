//! The sampling loop: sample, format, append, echo, wait.

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;

use chrono::{Local, NaiveDateTime};
use thiserror::Error;
use tracing::{error, info};

use crate::csv::{self, MemoryUsage};
use crate::daily_log::{DailyLog, LogError};
use crate::format::{format_bytes, format_percent};
use crate::scheduler::Scheduler;
use crate::system::provider::{CapabilityProvider, SampleError};
use crate::system::reading::Reading;
use crate::system::sampler::Sampler;

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("sampling failed: {0}")]
    Sample(#[from] SampleError),
    #[error(transparent)]
    Log(#[from] LogError),
    #[error("cycle panicked: {0}")]
    Panicked(String),
}

pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

impl<F> Clock for F
where
    F: Fn() -> NaiveDateTime,
{
    fn now(&self) -> NaiveDateTime {
        self()
    }
}

/// What one successful cycle did.
#[derive(Clone, Debug)]
pub struct CycleReport {
    pub path: PathBuf,
    pub wrote_header: bool,
    pub usage: MemoryUsage,
    pub non_paged_pool: Reading,
    pub status: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: usize,
    pub failures: usize,
}

pub struct Logger<P, C = LocalClock> {
    provider: P,
    sampler: Sampler,
    daily_log: DailyLog,
    clock: C,
}

impl<P: CapabilityProvider> Logger<P, LocalClock> {
    pub fn new(provider: P, daily_log: DailyLog) -> Self {
        Self::with_clock(provider, daily_log, LocalClock)
    }
}

impl<P: CapabilityProvider, C: Clock> Logger<P, C> {
    /// Captures total memory from `provider` once; it is read-only afterwards.
    pub fn with_clock(mut provider: P, daily_log: DailyLog, clock: C) -> Self {
        let sampler = Sampler::new(&mut provider);
        Logger {
            provider,
            sampler,
            daily_log,
            clock,
        }
    }

    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    /// One cycle. The same instant names the file and stamps the row, so a
    /// cycle straddling midnight stays consistent.
    pub fn tick(&mut self) -> Result<CycleReport, CycleError> {
        let now = self.clock.now();
        let snapshot = self.sampler.sample(&mut self.provider, now)?;
        let row = csv::format_row(&snapshot);
        let appended = self.daily_log.append(now.date(), &row)?;

        let usage = MemoryUsage::from_snapshot(&snapshot);
        let status = status_line(&usage, snapshot.non_paged_pool);
        Ok(CycleReport {
            path: appended.path,
            wrote_header: appended.wrote_header,
            usage,
            non_paged_pool: snapshot.non_paged_pool,
            status,
        })
    }

    /// [`Logger::tick`] with panics turned into a [`CycleError`].
    pub fn guarded_tick(&mut self) -> Result<CycleReport, CycleError> {
        panic::catch_unwind(AssertUnwindSafe(|| self.tick())).unwrap_or_else(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(CycleError::Panicked(message))
        })
    }

    /// Runs until `scheduler` is cancelled. A failed cycle is logged and the
    /// next tick is its retry; nothing a cycle does ends the loop.
    pub async fn run<S: Scheduler>(&mut self, scheduler: &mut S) -> RunSummary {
        let mut summary = RunSummary::default();
        while scheduler.next_tick().await {
            summary.cycles += 1;
            match self.guarded_tick() {
                Ok(report) => {
                    if report.wrote_header {
                        info!(path = %report.path.display(), "started new daily log");
                    }
                    info!("{}", report.status);
                }
                Err(e) => {
                    summary.failures += 1;
                    error!("cycle failed: {e}");
                }
            }
        }
        summary
    }
}

pub fn status_line(usage: &MemoryUsage, non_paged_pool: Reading) -> String {
    let pool = match non_paged_pool {
        Reading::Available(bytes) => format_bytes(bytes),
        Reading::Unavailable => "n/a".to_string(),
    };
    format!(
        "used {} ({}) | non-paged pool {}",
        format_bytes(usage.used_bytes),
        format_percent(usage.usage_percent),
        pool
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line_summarises_usage() {
        let usage = MemoryUsage {
            total_bytes: 1000 * 1024 * 1024,
            available_bytes: 400 * 1024 * 1024,
            used_bytes: 600 * 1024 * 1024,
            usage_percent: Some(60.0),
        };
        assert_eq!(
            status_line(&usage, Reading::Available(12 * 1024 * 1024)),
            "used 600.0 MB (60.00%) | non-paged pool 12.0 MB"
        );
    }

    #[test]
    fn status_line_marks_unknowns() {
        let usage = MemoryUsage {
            total_bytes: 0,
            available_bytes: 0,
            used_bytes: 0,
            usage_percent: None,
        };
        assert_eq!(
            status_line(&usage, Reading::Unavailable),
            "used 0 B (n/a) | non-paged pool n/a"
        );
    }
}
