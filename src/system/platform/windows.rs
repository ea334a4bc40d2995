use windows_sys::Win32::{
    Foundation::CloseHandle,
    System::ProcessStatus::{GetPerformanceInfo, PERFORMANCE_INFORMATION},
    System::Threading::{GetProcessHandleCount, OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION},
};

use super::{KernelPools, PlatformExtensions};

pub struct Platform;

impl PlatformExtensions for Platform {
    fn kernel_pools() -> Option<KernelPools> {
        unsafe {
            let mut info = std::mem::zeroed::<PERFORMANCE_INFORMATION>();
            let cb = std::mem::size_of::<PERFORMANCE_INFORMATION>() as u32;
            if GetPerformanceInfo(&mut info, cb) == 0 {
                return None;
            }
            // Pool sizes are reported in pages
            let page_size = info.PageSize as u64;
            Some(KernelPools {
                non_paged_bytes: info.KernelNonpaged as u64 * page_size,
                paged_bytes: info.KernelPaged as u64 * page_size,
            })
        }
    }

    fn process_handle_count(pid: u32) -> Option<u64> {
        unsafe {
            let handle = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, 0, pid);
            if handle.is_null() {
                return None;
            }
            let mut count: u32 = 0;
            let ok = GetProcessHandleCount(handle, &mut count);
            CloseHandle(handle);
            if ok == 0 { None } else { Some(count as u64) }
        }
    }
}
