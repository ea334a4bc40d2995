/// Kernel memory pool usage, in bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KernelPools {
    pub non_paged_bytes: u64,
    pub paged_bytes: u64,
}

pub trait PlatformExtensions {
    fn kernel_pools() -> Option<KernelPools>;
    fn process_handle_count(pid: u32) -> Option<u64>;
}

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "windows")]
mod windows;
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
mod unsupported;

#[cfg(target_os = "linux")]
use linux as platform_impl;
#[cfg(target_os = "macos")]
use macos as platform_impl;
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
use unsupported as platform_impl;
#[cfg(target_os = "windows")]
use windows as platform_impl;

pub fn kernel_pools() -> Option<KernelPools> {
    platform_impl::Platform::kernel_pools()
}

pub fn process_handle_count(pid: u32) -> Option<u64> {
    platform_impl::Platform::process_handle_count(pid)
}
