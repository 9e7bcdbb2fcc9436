//! `mmap`/`mprotect`/`munmap`-backed executable regions, via `libc`.

use super::error::{MemoryAllocationError, MemoryProtectionError};
use super::AllocatorError;

/// Reserves and commits a page-aligned, zero-filled, read-write region of
/// at least `code.len()` bytes, copies `code` into it, then flips it to
/// read-execute. Returns the region's base pointer and its rounded-up
/// length (needed later by [`free_executable`] to size the `munmap` call).
pub fn allocate_executable(code: &[u8]) -> Result<(*mut u8, usize), AllocatorError> {
    let len = page_align(code.len().max(1));

    let ptr = unsafe {
        libc::mmap(
            std::ptr::null_mut(),
            len,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
            -1,
            0,
        )
    };
    if ptr == libc::MAP_FAILED {
        return Err(MemoryAllocationError {
            os_code: last_os_error(),
        }
        .into());
    }
    let ptr = ptr as *mut u8;

    unsafe {
        std::ptr::copy_nonoverlapping(code.as_ptr(), ptr, code.len());
    }

    let rc = unsafe { libc::mprotect(ptr as *mut libc::c_void, len, libc::PROT_READ | libc::PROT_EXEC) };
    if rc != 0 {
        let os_code = last_os_error();
        unsafe { libc::munmap(ptr as *mut libc::c_void, len) };
        return Err(MemoryProtectionError { os_code }.into());
    }

    Ok((ptr, len))
}

/// # Safety
/// `ptr`/`len` must be exactly the pair returned by a prior
/// [`allocate_executable`] call that has not already been freed.
pub unsafe fn free_executable(ptr: *mut u8, len: usize) {
    if ptr.is_null() {
        return;
    }
    libc::munmap(ptr as *mut libc::c_void, len);
}

fn page_align(len: usize) -> usize {
    let page = 4096;
    (len + page - 1) / page * page
}

fn last_os_error() -> i32 {
    std::io::Error::last_os_error().raw_os_error().unwrap_or(-1)
}
