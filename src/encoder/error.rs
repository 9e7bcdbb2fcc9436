use std::fmt;

/// Failure modes of lowering IR to machine code. The Microsoft x64 calling
/// convention passes at most four arguments per register class; an
/// expression declaring more can't be encoded by this fixed register map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodegenError {
    TooManyIntegerArguments(u8),
    TooManyFloatArguments(u8),
}

impl fmt::Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodegenError::TooManyIntegerArguments(n) => {
                write!(f, "{} integer arguments declared, at most 4 are supported", n)
            }
            CodegenError::TooManyFloatArguments(n) => {
                write!(f, "{} float arguments declared, at most 4 are supported", n)
            }
        }
    }
}

impl std::error::Error for CodegenError {}
