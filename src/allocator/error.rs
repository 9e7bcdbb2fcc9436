use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryAllocationError {
    pub os_code: i32,
}

impl fmt::Display for MemoryAllocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to allocate executable memory (os code {})", self.os_code)
    }
}

impl std::error::Error for MemoryAllocationError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryProtectionError {
    pub os_code: i32,
}

impl fmt::Display for MemoryProtectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to mark memory executable (os code {})",
            self.os_code
        )
    }
}

impl std::error::Error for MemoryProtectionError {}
