use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::debug;

use super::platform;
use super::provider::{CapabilityProvider, MemoryCounters, ProcessEntry, SampleError};
use super::reading::Reading;

/// Host capability provider backed by `sysinfo`, with kernel pools and
/// handle counts filled in by the per-OS platform extensions.
pub struct SysinfoProvider {
    sys: System,
}

impl Default for SysinfoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoProvider {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        SysinfoProvider { sys }
    }
}

impl CapabilityProvider for SysinfoProvider {
    fn total_memory(&mut self) -> Reading {
        self.sys.refresh_memory();
        match self.sys.total_memory() {
            0 => Reading::Unavailable,
            total => Reading::Available(total),
        }
    }

    fn memory_counters(&mut self) -> MemoryCounters {
        self.sys.refresh_memory();

        // sysinfo reports zeros across the board when it cannot read meminfo
        let available = match (self.sys.total_memory(), self.sys.available_memory()) {
            (0, 0) => Reading::Unavailable,
            (_, available) => Reading::Available(available),
        };

        let pools = platform::kernel_pools();
        if pools.is_none() {
            debug!("kernel pool counters unavailable on this host");
        }

        MemoryCounters {
            available,
            non_paged_pool: pools.map(|p| p.non_paged_bytes).into(),
            paged_pool: pools.map(|p| p.paged_bytes).into(),
        }
    }

    fn processes(&mut self) -> Result<Vec<ProcessEntry>, SampleError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(SampleError::ProcessTableUnavailable);
        }

        self.sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );

        let mut entries: Vec<ProcessEntry> = self
            .sys
            .processes()
            .iter()
            .filter(|(_, process)| process.thread_kind().is_none())
            .map(|(pid, process)| {
                let pid = pid.as_u32();
                ProcessEntry {
                    pid,
                    name: process.name().to_string_lossy().to_string(),
                    working_set: Reading::Available(process.memory()),
                    handle_count: platform::process_handle_count(pid).into(),
                }
            })
            .collect();

        // sysinfo hands processes back in hash order; pid order gives the
        // table a stable enumeration order for tie-breaking.
        entries.sort_by_key(|entry| entry.pid);
        Ok(entries)
    }
}
