//! `VirtualAlloc`/`VirtualProtect`/`VirtualFree`-backed executable regions,
//! via `windows-sys`. Mirrors the original C++ implementation's allocator
//! exactly (it targeted this API directly, unconditionally).

use windows_sys::Win32::Foundation::GetLastError;
use windows_sys::Win32::System::Memory::{
    VirtualAlloc, VirtualFree, VirtualProtect, MEM_COMMIT, MEM_RELEASE, MEM_RESERVE,
    PAGE_EXECUTE_READ, PAGE_READWRITE,
};

use super::error::{MemoryAllocationError, MemoryProtectionError};
use super::AllocatorError;

pub fn allocate_executable(code: &[u8]) -> Result<(*mut u8, usize), AllocatorError> {
    let len = code.len().max(1);

    let ptr = unsafe {
        VirtualAlloc(
            std::ptr::null(),
            len,
            MEM_RESERVE | MEM_COMMIT,
            PAGE_READWRITE,
        )
    };
    if ptr.is_null() {
        return Err(MemoryAllocationError {
            os_code: unsafe { GetLastError() } as i32,
        }
        .into());
    }
    let ptr = ptr as *mut u8;

    unsafe {
        std::ptr::copy_nonoverlapping(code.as_ptr(), ptr, code.len());
    }

    let mut old_protect = 0u32;
    let ok = unsafe {
        VirtualProtect(
            ptr as *const _,
            len,
            PAGE_EXECUTE_READ,
            &mut old_protect,
        )
    };
    if ok == 0 {
        let os_code = unsafe { GetLastError() } as i32;
        unsafe { VirtualFree(ptr as *mut _, 0, MEM_RELEASE) };
        return Err(MemoryProtectionError { os_code }.into());
    }

    Ok((ptr, len))
}

/// # Safety
/// `ptr`/`len` must be exactly the pair returned by a prior
/// [`allocate_executable`] call that has not already been freed.
pub unsafe fn free_executable(ptr: *mut u8, _len: usize) {
    if ptr.is_null() {
        return;
    }
    VirtualFree(ptr as *mut _, 0, MEM_RELEASE);
}
