//! Native-recursion tree walker: the simplest possible ground truth,
//! evaluating through Rust's own call stack with no intermediate punning.

use super::{apply_binop, apply_unop, coerce, Value};
use crate::arena::{Arena, ExprIndex, ExpressionNode};
use crate::data_type::DataType;

pub fn eval(arena: &Arena, node: ExprIndex, args: &[Value]) -> Value {
    match *arena.get(node) {
        ExpressionNode::Literal { bits, ty } => match ty {
            DataType::Integer => Value::Int(bits as i64),
            DataType::Float => Value::Float(f64::from_bits(bits)),
        },
        ExpressionNode::Argument { index, .. } => args[index as usize],
        ExpressionNode::Unop { op, operand } => apply_unop(op, eval(arena, operand, args)),
        ExpressionNode::Binop { op, lhs, rhs } => {
            apply_binop(op, eval(arena, lhs, args), eval(arena, rhs, args))
        }
    }
}

pub fn eval_typed(arena: &Arena, root: ExprIndex, args: &[Value], return_type: DataType) -> Value {
    coerce(eval(arena, root, args), return_type)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::parse;
    use std::collections::HashMap;

    #[test]
    fn evaluates_arithmetic() {
        let (arena, root) = parse("2*(3+4)", &HashMap::new()).unwrap();
        let v = eval_typed(&arena, root, &[], DataType::Integer);
        assert_eq!(v, Value::Int(14));
    }

    #[test]
    fn evaluates_bound_argument() {
        let mut map = HashMap::new();
        map.insert('x', (0u8, DataType::Float));
        let (arena, root) = parse("x*2", &map).unwrap();
        let v = eval_typed(&arena, root, &[Value::Float(1.5)], DataType::Float);
        assert_eq!(v, Value::Float(3.0));
    }

    #[test]
    fn coerces_to_declared_return_type() {
        let (arena, root) = parse("7/2", &HashMap::new()).unwrap();
        let v = eval_typed(&arena, root, &[], DataType::Float);
        assert_eq!(v, Value::Float(3.0));
    }
}
