//! Tree walker whose every intermediate value passes through an explicit
//! 64-bit cell stack, bit-punning floats the same way the generated IR's
//! virtual stack does. Operands are evaluated left then right, so the
//! right-hand value is on top and is popped first — the opposite push
//! order from the IR generator, which evaluates right then left so the
//! left operand ends up in the lower-numbered scratch register. Both
//! orders are valid for this language's pure, non-short-circuiting
//! operators; they are not required to match.

use super::{apply_binop, apply_unop, coerce, Value};
use crate::arena::{Arena, ExprIndex, ExpressionNode};
use crate::data_type::DataType;
use crate::ir::generator::result_type;

pub struct CellStack {
    cells: Vec<u64>,
}

impl CellStack {
    pub fn new() -> Self {
        CellStack { cells: Vec::new() }
    }

    pub fn push_int(&mut self, v: i64) {
        self.cells.push(v as u64);
    }

    pub fn push_float(&mut self, v: f64) {
        self.cells.push(v.to_bits());
    }

    pub fn pop_int(&mut self) -> i64 {
        self.cells.pop().expect("cell stack underflow") as i64
    }

    pub fn pop_float(&mut self) -> f64 {
        f64::from_bits(self.cells.pop().expect("cell stack underflow"))
    }
}

impl Default for CellStack {
    fn default() -> Self {
        CellStack::new()
    }
}

fn push_value(stack: &mut CellStack, v: Value) {
    match v {
        Value::Int(i) => stack.push_int(i),
        Value::Float(f) => stack.push_float(f),
    }
}

fn pop_typed(stack: &mut CellStack, ty: DataType) -> Value {
    match ty {
        DataType::Integer => Value::Int(stack.pop_int()),
        DataType::Float => Value::Float(stack.pop_float()),
    }
}

fn walk(arena: &Arena, node: ExprIndex, args: &[Value], stack: &mut CellStack) {
    match *arena.get(node) {
        ExpressionNode::Literal { bits, ty } => {
            push_value(
                stack,
                match ty {
                    DataType::Integer => Value::Int(bits as i64),
                    DataType::Float => Value::Float(f64::from_bits(bits)),
                },
            );
        }
        ExpressionNode::Argument { index, .. } => push_value(stack, args[index as usize]),
        ExpressionNode::Unop { op, operand } => {
            let operand_ty = result_type(arena, operand);
            walk(arena, operand, args, stack);
            let v = pop_typed(stack, operand_ty);
            push_value(stack, apply_unop(op, v));
        }
        ExpressionNode::Binop { op, lhs, rhs } => {
            let lhs_ty = result_type(arena, lhs);
            let rhs_ty = result_type(arena, rhs);
            walk(arena, lhs, args, stack);
            walk(arena, rhs, args, stack);
            let r = pop_typed(stack, rhs_ty);
            let l = pop_typed(stack, lhs_ty);
            push_value(stack, apply_binop(op, l, r));
        }
    }
}

pub fn eval(arena: &Arena, root: ExprIndex, args: &[Value]) -> Value {
    let mut stack = CellStack::new();
    let root_ty = result_type(arena, root);
    walk(arena, root, args, &mut stack);
    pop_typed(&mut stack, root_ty)
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
    fn agrees_with_recursive_interpreter() {
        let (arena, root) = parse("sin(2*x)+flt(3)", &{
            let mut m = HashMap::new();
            m.insert('x', (0u8, DataType::Float));
            m
        })
        .unwrap();
        let args = [Value::Float(0.7)];
        let a = eval_typed(&arena, root, &args, DataType::Float);
        let b = crate::interp::recursive::eval_typed(&arena, root, &args, DataType::Float);
        assert_eq!(a, b);
    }
}
