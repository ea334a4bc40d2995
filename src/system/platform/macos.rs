use libproc::libproc::bsd_info::BSDInfo;
use libproc::libproc::file_info::ListFDs;
use libproc::libproc::proc_pid::{listpidinfo, pidinfo};

use super::{KernelPools, PlatformExtensions};

pub struct Platform;

impl PlatformExtensions for Platform {
    fn kernel_pools() -> Option<KernelPools> {
        // XNU does not expose pool counters through a public API
        None
    }

    fn process_handle_count(pid: u32) -> Option<u64> {
        let info = pidinfo::<BSDInfo>(pid as i32, 0).ok()?;
        let fds = listpidinfo::<ListFDs>(pid as i32, info.pbi_nfiles as usize).ok()?;
        Some(fds.len() as u64)
    }
}
