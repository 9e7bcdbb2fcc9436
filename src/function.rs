//! The typed, owning, move-only callable object a compiled expression is
//! wrapped in.

use crate::allocator::ExecutableRegion;

/// How many integer- and float-kind arguments the compiled function's
/// native signature declares, in calling-convention order. Needed
/// alongside the function pointer type `F` because Rust has no variadic
/// generics to recover this from `F` itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgSignature {
    pub integer_args: u8,
    pub float_args: u8,
}

/// An expression compiled to native code and callable as `F`.
///
/// `F` is expected to be an `extern "win64" fn(...) -> R` matching
/// `integer_args`/`float_args` in count, kind and position, and matching
/// the declared return type. Constructing one is `unsafe` precisely
/// because that correspondence can't be checked here.
pub struct CompiledFunction<F: Copy> {
    region: ExecutableRegion,
    entry: F,
}

impl<F: Copy> CompiledFunction<F> {
    /// # Safety
    /// `region`'s bytes must be a valid native function matching `F`'s
    /// calling convention, argument types and return type exactly.
    pub unsafe fn new(region: ExecutableRegion, entry: F) -> Self {
        CompiledFunction { region, entry }
    }

    pub fn get(&self) -> F {
        self.entry
    }
}

impl<F: Copy> std::ops::Deref for CompiledFunction<F> {
    type Target = F;

    fn deref(&self) -> &F {
        &self.entry
    }
}

// Safety: the compiled code reads no global or thread-local state and is
// reentrant (it only touches its own registers and the calling thread's
// stack), so a `CompiledFunction` may be called from, or handed to, any
// thread.
unsafe impl<F: Copy> Send for CompiledFunction<F> {}
unsafe impl<F: Copy> Sync for CompiledFunction<F> {}

impl<F: Copy> std::fmt::Debug for CompiledFunction<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledFunction")
            .field("entry_point", &(self.region.as_ptr() as usize))
            .field("size", &self.region.len())
            .finish()
    }
}
