//! The host capability seam: everything the sampler needs from the OS.

use thiserror::Error;

use super::reading::Reading;

#[derive(Debug, Error)]
pub enum SampleError {
    #[error("process table enumeration is not supported on this host")]
    ProcessTableUnavailable,
    #[error("process table enumeration failed: {0}")]
    Enumeration(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryCounters {
    pub available: Reading,
    pub non_paged_pool: Reading,
    pub paged_pool: Reading,
}

/// One row of the live process table. Per-process fields are independently
/// optional: a process that exits mid-enumeration or denies access keeps its
/// slot with the unreadable fields marked unavailable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
    pub working_set: Reading,
    pub handle_count: Reading,
}

pub trait CapabilityProvider {
    /// Installed physical memory. Queried once, at startup.
    fn total_memory(&mut self) -> Reading;

    fn memory_counters(&mut self) -> MemoryCounters;

    /// A single enumeration of the live process table, in host order.
    fn processes(&mut self) -> Result<Vec<ProcessEntry>, SampleError>;
}
