use chrono::NaiveDateTime;
use tracing::debug;

use super::provider::{CapabilityProvider, ProcessEntry, SampleError};
use super::reading::Reading;
use super::snapshot::{RankedProcess, ResourceSnapshot};

pub const TOP_WORKING_SET: usize = 10;
pub const TOP_HANDLE_COUNT: usize = 5;

/// Produces one [`ResourceSnapshot`] per call. The only state it carries is
/// the installed-memory total, captured once when it is built.
#[derive(Clone, Copy, Debug)]
pub struct Sampler {
    total_memory: Reading,
}

impl Sampler {
    pub fn new<P: CapabilityProvider + ?Sized>(provider: &mut P) -> Self {
        Self::with_total_memory(provider.total_memory())
    }

    pub fn with_total_memory(total_memory: Reading) -> Self {
        Sampler { total_memory }
    }

    pub fn total_memory(&self) -> Reading {
        self.total_memory
    }

    /// Missing counters degrade to [`Reading::Unavailable`]; only a failed
    /// process-table enumeration fails the sample.
    pub fn sample<P: CapabilityProvider + ?Sized>(
        &self,
        provider: &mut P,
        taken_at: NaiveDateTime,
    ) -> Result<ResourceSnapshot, SampleError> {
        let counters = provider.memory_counters();
        let processes = provider.processes()?;
        debug!(processes = processes.len(), "enumerated process table");

        Ok(ResourceSnapshot {
            timestamp: taken_at,
            total_memory: self.total_memory,
            available_memory: counters.available,
            non_paged_pool: counters.non_paged_pool,
            paged_pool: counters.paged_pool,
            top_by_working_set: rank_by_working_set(&processes),
            top_by_handle_count: rank_by_handle_count(&processes),
        })
    }
}

pub fn rank_by_working_set(processes: &[ProcessEntry]) -> Vec<RankedProcess> {
    rank_by(processes, |p| p.working_set, TOP_WORKING_SET)
}

pub fn rank_by_handle_count(processes: &[ProcessEntry]) -> Vec<RankedProcess> {
    rank_by(processes, |p| p.handle_count, TOP_HANDLE_COUNT)
}

/// Descending by `key`, ties kept in enumeration order, truncated to `limit`.
/// Processes whose key could not be read are left out of this ranking only.
fn rank_by<F>(processes: &[ProcessEntry], key: F, limit: usize) -> Vec<RankedProcess>
where
    F: Fn(&ProcessEntry) -> Reading,
{
    let mut candidates: Vec<(&ProcessEntry, u64)> = processes
        .iter()
        .filter_map(|p| key(p).value().map(|value| (p, value)))
        .collect();

    // slice::sort_by is stable
    candidates.sort_by(|a, b| b.1.cmp(&a.1));

    candidates
        .into_iter()
        .take(limit)
        .map(|(p, value)| RankedProcess {
            name: p.name.clone(),
            value,
        })
        .collect()
}
