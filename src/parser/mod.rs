//! Recursive-descent, precedence-climbing expression parser.
//!
//! Grammar (informally): a primary expression is a literal, a bound
//! argument, a parenthesized/bracketed/braced sub-expression, or a reserved
//! function name applied as a unary prefix operator (precedence 100, binding
//! tighter than every binary operator). Binary operators climb precedence
//! left-to-right, equal-precedence operators associating left.

pub mod error;
pub mod lexer;

use std::collections::HashMap;

use self::error::ParseError;
use self::lexer::{matching_close, LexResult, Lexer, Token};
use crate::arena::{Arena, Binop, ExprIndex, ExpressionNode, Unop};
use crate::data_type::DataType;

fn binop_of(ch: char) -> Option<Binop> {
    match ch {
        '+' => Some(Binop::Add),
        '-' => Some(Binop::Subtract),
        '*' => Some(Binop::Multiply),
        '/' => Some(Binop::Divide),
        '%' => Some(Binop::Modulo),
        _ => None,
    }
}

fn unop_of(ch: char) -> Option<Unop> {
    match ch {
        'd' => Some(Unop::IToF),
        'i' => Some(Unop::FToI),
        '-' => Some(Unop::Negate),
        'a' => Some(Unop::Abs),
        's' => Some(Unop::Sin),
        'c' => Some(Unop::Cos),
        'f' => Some(Unop::Floor),
        _ => None,
    }
}

/// Outcome of a `parse_binary` run: why it stopped consuming operators.
#[derive(Debug, Clone, Copy, PartialEq)]
enum BinaryStop {
    Eof,
    Close(char),
    /// A token was peeked that isn't an operator; the lexer has already
    /// been rewound to before it.
    NotOperator,
    /// The next operator's precedence is below the climbing floor; the
    /// lexer has already been rewound to before it. Only meaningful to the
    /// caller that introduced the floor — never surfaces past the
    /// outermost `parse_expression` call, since that call always climbs
    /// from floor 0 and no operator has negative precedence.
    PrecedenceFloor,
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    arena: Arena,
}

impl<'a> Parser<'a> {
    fn parse_primary(&mut self) -> Result<ExprIndex, ParseError> {
        match self.lexer.lex()? {
            LexResult::Token(Token::Literal(bits, ty)) => {
                Ok(self.arena.push(ExpressionNode::Literal { bits, ty }))
            }
            LexResult::Token(Token::Argument(index, ty)) => {
                Ok(self.arena.push(ExpressionNode::Argument { index, ty }))
            }
            LexResult::Token(Token::Delimiter(open)) => {
                let close = matching_close(open).expect("lexer only emits known delimiters");
                self.parse_expression(Some(close))
            }
            LexResult::Token(Token::Operator(ch, _prec)) => self.parse_unary(ch),
            LexResult::Eof => Err(ParseError::UnexpectedEof),
            LexResult::Close(ch) => Err(ParseError::UnexpectedCharacter(ch)),
        }
    }

    fn parse_unary(&mut self, ch: char) -> Result<ExprIndex, ParseError> {
        let op = unop_of(ch).ok_or(ParseError::UnknownUnaryOperator(ch))?;
        let operand = self.parse_primary()?;
        Ok(self.arena.push(ExpressionNode::Unop { op, operand }))
    }

    fn parse_binary(
        &mut self,
        mut lhs: ExprIndex,
        min_prec: u8,
    ) -> Result<(ExprIndex, BinaryStop), ParseError> {
        loop {
            let checkpoint = self.lexer.position();
            let peeked = self.lexer.lex()?;
            let (op_ch, op_prec) = match peeked {
                LexResult::Token(Token::Operator(ch, prec)) => (ch, prec),
                LexResult::Eof => return Ok((lhs, BinaryStop::Eof)),
                LexResult::Close(ch) => return Ok((lhs, BinaryStop::Close(ch))),
                LexResult::Token(_) => {
                    self.lexer.set_position(checkpoint);
                    return Ok((lhs, BinaryStop::NotOperator));
                }
            };
            if op_prec < min_prec {
                self.lexer.set_position(checkpoint);
                return Ok((lhs, BinaryStop::PrecedenceFloor));
            }

            let mut rhs = self.parse_primary()?;

            let lookahead_pos = self.lexer.position();
            let lookahead = self.lexer.lex()?;
            self.lexer.set_position(lookahead_pos);
            if let LexResult::Token(Token::Operator(_, next_prec)) = lookahead {
                if next_prec > op_prec {
                    let (climbed, _) = self.parse_binary(rhs, op_prec + 1)?;
                    rhs = climbed;
                }
            }

            let op = binop_of(op_ch).ok_or(ParseError::UnexpectedCharacter(op_ch))?;
            lhs = self.arena.push(ExpressionNode::Binop { op, lhs, rhs });
        }
    }

    fn parse_expression(&mut self, end: Option<char>) -> Result<ExprIndex, ParseError> {
        let lhs = self.parse_primary()?;
        let (result, stop) = self.parse_binary(lhs, 0)?;
        match (end, stop) {
            (Some(e), BinaryStop::Close(c)) if c == e => Ok(result),
            (None, BinaryStop::Eof) => Ok(result),
            (None, BinaryStop::NotOperator) => Ok(result),
            _ => Err(ParseError::UnexpectedChar),
        }
    }
}

/// Parses `source` into an arena, binding each character key of `argsmap` to
/// its (parameter index, type) pair. Returns the arena and the root node.
pub fn parse(
    source: &str,
    argsmap: &HashMap<char, (u8, DataType)>,
) -> Result<(Arena, ExprIndex), ParseError> {
    let mut parser = Parser {
        lexer: Lexer::new(source, argsmap),
        arena: Arena::new(),
    };
    let root = parser.parse_expression(None)?;
    Ok((parser.arena, root))
}

#[cfg(test)]
mod test;
