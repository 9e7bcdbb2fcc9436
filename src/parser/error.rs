//! Parser failure modes, hand-rolled in the teacher's style (manual
//! `Display`, no `thiserror`).

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// An alphabetic run that is neither a bound single-character argument
    /// nor a recognized function name (`abs`, `sin`, `cos`, `int`, `flt`,
    /// `floor`).
    UnknownArgumentOrFunction(String),
    /// A character that starts neither a literal, an argument/function name,
    /// a delimiter, nor a known operator.
    UnexpectedCharacter(char),
    /// A function-name token used in unary-operator position whose mapped
    /// character has no entry in the unary operator table.
    UnknownUnaryOperator(char),
    /// The expression ended on the wrong delimiter, or trailing input
    /// remained after the outermost expression closed.
    UnexpectedChar,
    /// Input ended where a primary expression (literal, argument, function
    /// call, or parenthesized group) was expected.
    UnexpectedEof,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnknownArgumentOrFunction(name) => {
                write!(f, "unknown argument or function name: `{}`", name)
            }
            ParseError::UnexpectedCharacter(ch) => write!(f, "unexpected character: `{}`", ch),
            ParseError::UnknownUnaryOperator(ch) => {
                write!(f, "unknown unary operator: `{}`", ch)
            }
            ParseError::UnexpectedChar => write!(f, "unexpected char"),
            ParseError::UnexpectedEof => write!(f, "unexpected end of input"),
        }
    }
}

impl std::error::Error for ParseError {}
