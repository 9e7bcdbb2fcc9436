//! Linear walker over the generated (and optimized) IR itself, using the
//! same bit-punned cell stack as [`super::stack`] plus a flat virtual
//! register file. This is the most direct cross-check that the IR the
//! encoder will consume computes what the source expression says: unlike
//! the tree walkers, it never looks at the arena at all.
//!
//! Covers the full live opcode set (the original reference interpreter this
//! is grounded on handled only the subset its demo programs happened to
//! emit; this one also handles `IMod`/`FMod`/`INeg`/`FNeg`/`IMov`/`FMov`).

use super::Value;
use crate::data_type::DataType;
use crate::interp::stack::CellStack;
use crate::ir::{Code, Instruction, VirtualRegister};

struct Registers {
    cells: [u64; 14],
}

impl Registers {
    fn new() -> Self {
        Registers { cells: [0; 14] }
    }

    fn get_int(&self, r: VirtualRegister) -> i64 {
        self.cells[r.index()] as i64
    }

    fn get_float(&self, r: VirtualRegister) -> f64 {
        f64::from_bits(self.cells[r.index()])
    }

    fn set_int(&mut self, r: VirtualRegister, v: i64) {
        self.cells[r.index()] = v as u64;
    }

    fn set_float(&mut self, r: VirtualRegister, v: f64) {
        self.cells[r.index()] = v.to_bits();
    }
}

fn binop_int(regs: &mut Registers, instr: &Instruction, f: impl Fn(i64, i64) -> i64) {
    let dst = instr.reg(0);
    let src = instr.reg(1);
    let result = f(regs.get_int(dst), regs.get_int(src));
    regs.set_int(dst, result);
}

fn binop_float(regs: &mut Registers, instr: &Instruction, f: impl Fn(f64, f64) -> f64) {
    let dst = instr.reg(0);
    let src = instr.reg(1);
    let result = f(regs.get_float(dst), regs.get_float(src));
    regs.set_float(dst, result);
}

/// Runs `instructions` (as produced by [`crate::ir::generate`], optionally
/// passed through [`crate::ir::optimize`]) to completion and returns the
/// value left in `IR`/`FR` per `return_type`.
pub fn run(instructions: &[Instruction], args: &[Value], return_type: DataType) -> Value {
    let mut stack = CellStack::new();
    let mut regs = Registers::new();

    for instr in instructions {
        match instr.code {
            Code::Ret => break,
            Code::ILoad => stack.push_int(instr.immediate(0) as i64),
            Code::FLoad => stack.push_float(f64::from_bits(instr.immediate(0))),
            Code::IArg => stack.push_int(args[instr.immediate(0) as usize].to_i64()),
            Code::FArg => stack.push_float(args[instr.immediate(0) as usize].to_f64()),
            Code::IPush => stack.push_int(regs.get_int(instr.reg(0))),
            Code::FPush => stack.push_float(regs.get_float(instr.reg(0))),
            Code::IPop => {
                let v = stack.pop_int();
                regs.set_int(instr.reg(0), v);
            }
            Code::FPop => {
                let v = stack.pop_float();
                regs.set_float(instr.reg(0), v);
            }
            Code::IMov => {
                let v = regs.get_int(instr.reg(1));
                regs.set_int(instr.reg(0), v);
            }
            Code::FMov => {
                let v = regs.get_float(instr.reg(1));
                regs.set_float(instr.reg(0), v);
            }
            Code::IAdd => binop_int(&mut regs, instr, |a, b| a.wrapping_add(b)),
            Code::ISub => binop_int(&mut regs, instr, |a, b| a.wrapping_sub(b)),
            Code::IMul => binop_int(&mut regs, instr, |a, b| a.wrapping_mul(b)),
            Code::IDiv => binop_int(&mut regs, instr, |a, b| a / b),
            Code::IMod => binop_int(&mut regs, instr, |a, b| a % b),
            Code::INeg => {
                let r = instr.reg(0);
                let v = regs.get_int(r);
                regs.set_int(r, -v);
            }
            Code::IAbs => {
                let r = instr.reg(0);
                let v = regs.get_int(r);
                regs.set_int(r, v.abs());
            }
            Code::FAdd => binop_float(&mut regs, instr, |a, b| a + b),
            Code::FSub => binop_float(&mut regs, instr, |a, b| a - b),
            Code::FMul => binop_float(&mut regs, instr, |a, b| a * b),
            Code::FDiv => binop_float(&mut regs, instr, |a, b| a / b),
            Code::FMod => binop_float(&mut regs, instr, |a, b| a % b),
            Code::FNeg => {
                let r = instr.reg(0);
                let v = regs.get_float(r);
                regs.set_float(r, -v);
            }
            Code::FAbs => {
                let r = instr.reg(0);
                let v = regs.get_float(r);
                regs.set_float(r, v.abs());
            }
            Code::FSin => {
                let r = instr.reg(0);
                let v = regs.get_float(r);
                regs.set_float(r, v.sin());
            }
            Code::FCos => {
                let r = instr.reg(0);
                let v = regs.get_float(r);
                regs.set_float(r, v.cos());
            }
            Code::FFloor => {
                let r = instr.reg(0);
                let v = regs.get_float(r);
                regs.set_float(r, v.floor());
            }
            Code::IToF => {
                let v = regs.get_int(instr.reg(1));
                regs.set_float(instr.reg(0), v as f64);
            }
            Code::FToI => {
                let v = regs.get_float(instr.reg(1));
                regs.set_int(instr.reg(0), v as i64);
            }
        }
    }

    match return_type {
        DataType::Integer => Value::Int(regs.get_int(VirtualRegister::IR)),
        DataType::Float => Value::Float(regs.get_float(VirtualRegister::FR)),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ir::{generate, optimize};
    use crate::parser::parse;
    use std::collections::HashMap;

    #[test]
    fn matches_recursive_interpreter() {
        let mut argsmap = HashMap::new();
        argsmap.insert('x', (0u8, DataType::Float));
        let (arena, root) = parse("(x+1)*2-flt(3)", &argsmap).unwrap();
        let mut ir = generate(&arena, root, DataType::Float);
        optimize(&mut ir);

        let args = [Value::Float(4.0)];
        let via_ir = run(&ir, &args, DataType::Float);
        let via_tree = crate::interp::recursive::eval_typed(&arena, root, &args, DataType::Float);
        assert_eq!(via_ir, via_tree);
    }
}
