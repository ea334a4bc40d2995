use super::{KernelPools, PlatformExtensions};

pub struct Platform;

impl PlatformExtensions for Platform {
    fn kernel_pools() -> Option<KernelPools> {
        // Linux has no paged/non-paged pool split
        None
    }

    fn process_handle_count(pid: u32) -> Option<u64> {
        // Each entry of /proc/{pid}/fd is one open descriptor.
        // Reading another user's fd table fails with EACCES.
        let entries = std::fs::read_dir(format!("/proc/{pid}/fd")).ok()?;
        Some(entries.filter_map(Result::ok).count() as u64)
    }
}
