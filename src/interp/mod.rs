//! Three reference interpreters, independent of the x86-64 encoder, used to
//! cross-validate compiled output: a native-recursion tree walker, a tree
//! walker that threads every intermediate value through an explicit
//! bit-punned cell stack, and a linear walker over the generated IR itself.
//!
//! All three share the scalar arithmetic in this module; they differ only
//! in how they get a node's operand values.

pub mod ir_walker;
pub mod recursive;
pub mod stack;

use crate::arena::{Binop, Unop};
use crate::data_type::DataType;

/// A runtime scalar value, tagged the same way [`DataType`] tags a static
/// expression type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
}

impl Value {
    pub fn data_type(self) -> DataType {
        match self {
            Value::Int(_) => DataType::Integer,
            Value::Float(_) => DataType::Float,
        }
    }

    pub fn to_f64(self) -> f64 {
        match self {
            Value::Int(i) => i as f64,
            Value::Float(f) => f,
        }
    }

    pub fn to_i64(self) -> i64 {
        match self {
            Value::Int(i) => i,
            Value::Float(f) => f as i64,
        }
    }
}

pub fn coerce(v: Value, ty: DataType) -> Value {
    match ty {
        DataType::Integer => Value::Int(v.to_i64()),
        DataType::Float => Value::Float(v.to_f64()),
    }
}

pub fn apply_binop(op: Binop, lhs: Value, rhs: Value) -> Value {
    let ty = lhs.data_type().combine(rhs.data_type());
    let lhs = coerce(lhs, ty);
    let rhs = coerce(rhs, ty);
    match (op, ty) {
        (Binop::Add, DataType::Integer) => Value::Int(lhs.to_i64().wrapping_add(rhs.to_i64())),
        (Binop::Add, DataType::Float) => Value::Float(lhs.to_f64() + rhs.to_f64()),
        (Binop::Subtract, DataType::Integer) => {
            Value::Int(lhs.to_i64().wrapping_sub(rhs.to_i64()))
        }
        (Binop::Subtract, DataType::Float) => Value::Float(lhs.to_f64() - rhs.to_f64()),
        (Binop::Multiply, DataType::Integer) => {
            Value::Int(lhs.to_i64().wrapping_mul(rhs.to_i64()))
        }
        (Binop::Multiply, DataType::Float) => Value::Float(lhs.to_f64() * rhs.to_f64()),
        (Binop::Divide, DataType::Integer) => Value::Int(lhs.to_i64() / rhs.to_i64()),
        (Binop::Divide, DataType::Float) => Value::Float(lhs.to_f64() / rhs.to_f64()),
        (Binop::Modulo, DataType::Integer) => Value::Int(lhs.to_i64() % rhs.to_i64()),
        (Binop::Modulo, DataType::Float) => Value::Float(lhs.to_f64() % rhs.to_f64()),
    }
}

pub fn apply_unop(op: Unop, operand: Value) -> Value {
    match op {
        Unop::IToF => Value::Float(operand.to_f64()),
        Unop::FToI => Value::Int(operand.to_i64()),
        Unop::Negate => match operand {
            Value::Int(i) => Value::Int(-i),
            Value::Float(f) => Value::Float(-f),
        },
        Unop::Abs => match operand {
            Value::Int(i) => Value::Int(i.abs()),
            Value::Float(f) => Value::Float(f.abs()),
        },
        Unop::Sin => Value::Float(operand.to_f64().sin()),
        Unop::Cos => Value::Float(operand.to_f64().cos()),
        Unop::Floor => Value::Float(operand.to_f64().floor()),
    }
}
