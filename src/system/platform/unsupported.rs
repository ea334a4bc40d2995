use super::{KernelPools, PlatformExtensions};

pub struct Platform;

impl PlatformExtensions for Platform {
    fn kernel_pools() -> Option<KernelPools> {
        None
    }

    fn process_handle_count(_pid: u32) -> Option<u64> {
        None
    }
}
