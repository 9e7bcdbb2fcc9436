//! Compiles small arithmetic expressions over scalar arguments directly to
//! native x86-64 machine code, callable from the host process with no
//! interpretive overhead.
//!
//! The pipeline: [`parser`] lexes and parses source text into an
//! [`arena::Arena`] of [`arena::ExpressionNode`]s; [`ir`] walks the arena into
//! a flat stack-machine instruction list and peephole-optimizes it;
//! [`encoder`] encodes that list to x86-64 machine code using the Microsoft
//! x64 calling convention; [`allocator`] places the bytes in an executable
//! memory region; [`function`] wraps the region as a typed, callable
//! function object. [`interp`] provides three reference interpreters used to
//! cross-validate the compiled output in tests.

pub mod allocator;
pub mod arena;
pub mod compiler;
pub mod data_type;
pub mod encoder;
pub mod function;
pub mod interp;
pub mod ir;
pub mod parser;

pub use compiler::{compile, CompileError};
pub use data_type::DataType;
pub use function::{ArgSignature, CompiledFunction};
