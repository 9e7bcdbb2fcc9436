use std::collections::HashMap;

use super::*;
use crate::arena::{Binop, ExpressionNode, Unop};
use crate::data_type::DataType;

fn argsmap(pairs: &[(char, u8, DataType)]) -> HashMap<char, (u8, DataType)> {
    pairs.iter().map(|&(c, i, t)| (c, (i, t))).collect()
}

#[test]
fn single_literal() {
    let (arena, root) = parse("42", &argsmap(&[])).unwrap();
    match arena.get(root) {
        ExpressionNode::Literal { bits, ty } => {
            assert_eq!(*bits as i64, 42);
            assert_eq!(*ty, DataType::Integer);
        }
        other => panic!("expected literal, got {:?}", other),
    }
}

#[test]
fn float_literal() {
    let (arena, root) = parse("3.5", &argsmap(&[])).unwrap();
    match arena.get(root) {
        ExpressionNode::Literal { bits, ty } => {
            assert_eq!(f64::from_bits(*bits), 3.5);
            assert_eq!(*ty, DataType::Float);
        }
        other => panic!("expected literal, got {:?}", other),
    }
}

#[test]
fn large_integer_literal_survives_exactly() {
    // 2^53 + 1: the smallest integer an f64 intermediate cannot represent
    // exactly.
    let (arena, root) = parse("9007199254740993", &argsmap(&[])).unwrap();
    match arena.get(root) {
        ExpressionNode::Literal { bits, ty } => {
            assert_eq!(*bits as i64, 9_007_199_254_740_993);
            assert_eq!(*ty, DataType::Integer);
        }
        other => panic!("expected literal, got {:?}", other),
    }
}

#[test]
fn left_associative_equal_precedence() {
    // "1 - 2 - 3" must parse as (1 - 2) - 3, not 1 - (2 - 3).
    let (arena, root) = parse("1-2-3", &argsmap(&[])).unwrap();
    match arena.get(root) {
        ExpressionNode::Binop {
            op: Binop::Subtract,
            lhs,
            rhs,
        } => {
            match arena.get(*rhs) {
                ExpressionNode::Literal { bits, .. } => assert_eq!(*bits as i64, 3),
                other => panic!("expected literal rhs, got {:?}", other),
            }
            match arena.get(*lhs) {
                ExpressionNode::Binop {
                    op: Binop::Subtract,
                    lhs: inner_lhs,
                    rhs: inner_rhs,
                } => {
                    assert_eq!(
                        match arena.get(*inner_lhs) {
                            ExpressionNode::Literal { bits, .. } => *bits as i64,
                            _ => panic!(),
                        },
                        1
                    );
                    assert_eq!(
                        match arena.get(*inner_rhs) {
                            ExpressionNode::Literal { bits, .. } => *bits as i64,
                            _ => panic!(),
                        },
                        2
                    );
                }
                other => panic!("expected nested subtract, got {:?}", other),
            }
        }
        other => panic!("expected subtract, got {:?}", other),
    }
}

#[test]
fn precedence_climbing() {
    // "1 + 2 * 3" must parse as 1 + (2 * 3).
    let (arena, root) = parse("1+2*3", &argsmap(&[])).unwrap();
    match arena.get(root) {
        ExpressionNode::Binop {
            op: Binop::Add,
            rhs,
            ..
        } => match arena.get(*rhs) {
            ExpressionNode::Binop {
                op: Binop::Multiply,
                ..
            } => {}
            other => panic!("expected multiply on the right, got {:?}", other),
        },
        other => panic!("expected add, got {:?}", other),
    }
}

#[test]
fn parenthesized_group_overrides_precedence() {
    // "(1 + 2) * 3" must parse as (1 + 2) * 3, not 1 + (2 * 3).
    let (arena, root) = parse("(1+2)*3", &argsmap(&[])).unwrap();
    match arena.get(root) {
        ExpressionNode::Binop {
            op: Binop::Multiply,
            lhs,
            ..
        } => match arena.get(*lhs) {
            ExpressionNode::Binop { op: Binop::Add, .. } => {}
            other => panic!("expected add on the left, got {:?}", other),
        },
        other => panic!("expected multiply, got {:?}", other),
    }
}

#[test]
fn bound_argument_consumes_single_char() {
    let map = argsmap(&[('x', 0, DataType::Float)]);
    let (arena, root) = parse("x", &map).unwrap();
    match arena.get(root) {
        ExpressionNode::Argument { index, ty } => {
            assert_eq!(*index, 0);
            assert_eq!(*ty, DataType::Float);
        }
        other => panic!("expected argument, got {:?}", other),
    }
}

#[test]
fn function_name_is_prefix_unary_operator() {
    let (arena, root) = parse("sin(1)", &argsmap(&[])).unwrap();
    match arena.get(root) {
        ExpressionNode::Unop { op: Unop::Sin, .. } => {}
        other => panic!("expected sin unop, got {:?}", other),
    }
}

#[test]
fn function_applies_tighter_than_binary_operators() {
    // "sin 1 + 2" must parse as sin(1) + 2, since the function-as-operator
    // precedence (100) binds tighter than every binary operator.
    let (arena, root) = parse("sin1+2", &argsmap(&[])).unwrap();
    match arena.get(root) {
        ExpressionNode::Binop {
            op: Binop::Add,
            lhs,
            ..
        } => match arena.get(*lhs) {
            ExpressionNode::Unop { op: Unop::Sin, .. } => {}
            other => panic!("expected sin on the left, got {:?}", other),
        },
        other => panic!("expected add, got {:?}", other),
    }
}

#[test]
fn unknown_function_name_errors() {
    let err = parse("foo(1)", &argsmap(&[])).unwrap_err();
    assert_eq!(err, ParseError::UnknownArgumentOrFunction("foo".to_string()));
}

#[test]
fn unmatched_delimiter_errors() {
    let err = parse("(1+2", &argsmap(&[])).unwrap_err();
    assert_eq!(err, ParseError::UnexpectedChar);
}

#[test]
fn mismatched_delimiter_errors() {
    let err = parse("(1+2]", &argsmap(&[])).unwrap_err();
    assert_eq!(err, ParseError::UnexpectedChar);
}

#[test]
fn unexpected_character_errors() {
    let err = parse("1@2", &argsmap(&[])).unwrap_err();
    assert_eq!(err, ParseError::UnexpectedCharacter('@'));
}
