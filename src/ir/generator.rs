//! Lowers an expression arena into a flat list of stack-machine
//! instructions by a post-order traversal: every node leaves exactly one
//! value of its result type pushed on the evaluation stack.

use super::{Code, Instruction, Operand, VirtualRegister};
use crate::arena::{Arena, Binop, ExprIndex, ExpressionNode, Unop};
use crate::data_type::DataType;

/// The type a subexpression evaluates to, computed structurally rather than
/// cached on the arena node: literals and arguments carry it explicitly,
/// binary operators promote to float if either side is float, and `IToF`/
/// `FToI`/`Sin`/`Cos`/`Floor` fix their result type regardless of operand
/// type (matching the reference encoder, which always computes these in
/// the float domain).
pub fn result_type(arena: &Arena, idx: ExprIndex) -> DataType {
    match arena.get(idx) {
        ExpressionNode::Literal { ty, .. } => *ty,
        ExpressionNode::Argument { ty, .. } => *ty,
        ExpressionNode::Unop { op, operand } => match op {
            Unop::IToF => DataType::Float,
            Unop::FToI => DataType::Integer,
            Unop::Sin | Unop::Cos | Unop::Floor => DataType::Float,
            Unop::Negate | Unop::Abs => result_type(arena, *operand),
        },
        ExpressionNode::Binop { lhs, rhs, .. } => {
            result_type(arena, *lhs).combine(result_type(arena, *rhs))
        }
    }
}

fn push_code(ty: DataType) -> Code {
    match ty {
        DataType::Integer => Code::IPush,
        DataType::Float => Code::FPush,
    }
}

fn pop_code(ty: DataType) -> Code {
    match ty {
        DataType::Integer => Code::IPop,
        DataType::Float => Code::FPop,
    }
}

fn slot_reg(ty: DataType, slot: usize) -> VirtualRegister {
    match (ty, slot) {
        (DataType::Integer, 0) => VirtualRegister::I0,
        (DataType::Integer, _) => VirtualRegister::I1,
        (DataType::Float, 0) => VirtualRegister::F0,
        (DataType::Float, _) => VirtualRegister::F1,
    }
}

struct Generator<'a> {
    arena: &'a Arena,
    instructions: Vec<Instruction>,
}

impl<'a> Generator<'a> {
    fn emit0(&mut self, code: Code) {
        self.instructions.push(Instruction::nullary(code));
    }

    fn emit1(&mut self, code: Code, reg: VirtualRegister) {
        self.instructions
            .push(Instruction::unary(code, Operand::Register(reg)));
    }

    fn emit_imm(&mut self, code: Code, value: u64) {
        self.instructions
            .push(Instruction::unary(code, Operand::Immediate(value)));
    }

    fn emit2(&mut self, code: Code, dst: VirtualRegister, src: VirtualRegister) {
        self.instructions.push(Instruction::binary(
            code,
            Operand::Register(dst),
            Operand::Register(src),
        ));
    }

    /// Pops a value of `ty` from slot `slot` (0 or 1), coercing it into
    /// `result_ty`'s corresponding register if the types differ. Returns
    /// the register the (possibly coerced) value ends up in.
    fn popa(&mut self, ty: DataType, result_ty: DataType, slot: usize) -> VirtualRegister {
        let src = slot_reg(ty, slot);
        self.emit1(pop_code(ty), src);
        if ty == result_ty {
            return src;
        }
        let dst = slot_reg(result_ty, slot);
        let coerce = match ty {
            DataType::Integer => Code::IToF,
            DataType::Float => Code::FToI,
        };
        self.emit2(coerce, dst, src);
        dst
    }

    fn gen(&mut self, idx: ExprIndex) {
        match *self.arena.get(idx) {
            ExpressionNode::Literal { bits, ty } => {
                let code = match ty {
                    DataType::Integer => Code::ILoad,
                    DataType::Float => Code::FLoad,
                };
                self.emit_imm(code, bits);
            }
            ExpressionNode::Argument { index, ty } => {
                let code = match ty {
                    DataType::Integer => Code::IArg,
                    DataType::Float => Code::FArg,
                };
                self.emit_imm(code, index as u64);
            }
            ExpressionNode::Unop { op, operand } => self.gen_unop(op, operand),
            ExpressionNode::Binop { op, lhs, rhs } => self.gen_binop(op, lhs, rhs),
        }
    }

    fn gen_unop(&mut self, op: Unop, operand: ExprIndex) {
        let operand_ty = result_type(self.arena, operand);
        self.gen(operand);
        match op {
            Unop::IToF => {
                if operand_ty == DataType::Integer {
                    self.emit1(Code::IPop, VirtualRegister::I0);
                    self.emit2(Code::IToF, VirtualRegister::F0, VirtualRegister::I0);
                    self.emit1(Code::FPush, VirtualRegister::F0);
                }
                // else: the value is already float on the stack, no-op.
            }
            Unop::FToI => {
                if operand_ty == DataType::Float {
                    self.emit1(Code::FPop, VirtualRegister::F0);
                    self.emit2(Code::FToI, VirtualRegister::I0, VirtualRegister::F0);
                    self.emit1(Code::IPush, VirtualRegister::I0);
                }
            }
            Unop::Negate | Unop::Abs => {
                let reg = slot_reg(operand_ty, 0);
                self.emit1(pop_code(operand_ty), reg);
                let code = match (op, operand_ty) {
                    (Unop::Negate, DataType::Integer) => Code::INeg,
                    (Unop::Negate, DataType::Float) => Code::FNeg,
                    (Unop::Abs, DataType::Integer) => Code::IAbs,
                    (Unop::Abs, DataType::Float) => Code::FAbs,
                    _ => unreachable!(),
                };
                self.emit1(code, reg);
                self.emit1(push_code(operand_ty), reg);
            }
            Unop::Sin | Unop::Cos | Unop::Floor => {
                if operand_ty == DataType::Integer {
                    self.emit1(Code::IPop, VirtualRegister::I0);
                    self.emit2(Code::IToF, VirtualRegister::F0, VirtualRegister::I0);
                } else {
                    self.emit1(Code::FPop, VirtualRegister::F0);
                }
                let code = match op {
                    Unop::Sin => Code::FSin,
                    Unop::Cos => Code::FCos,
                    Unop::Floor => Code::FFloor,
                    _ => unreachable!(),
                };
                self.emit1(code, VirtualRegister::F0);
                self.emit1(Code::FPush, VirtualRegister::F0);
            }
        }
    }

    fn gen_binop(&mut self, op: Binop, lhs: ExprIndex, rhs: ExprIndex) {
        // Evaluated right-to-left so the left operand ends up on top of the
        // stack and is popped first below.
        self.gen(rhs);
        self.gen(lhs);

        let lhs_ty = result_type(self.arena, lhs);
        let rhs_ty = result_type(self.arena, rhs);
        let result_ty = lhs_ty.combine(rhs_ty);

        let lhs_reg = self.popa(lhs_ty, result_ty, 0);
        let rhs_reg = self.popa(rhs_ty, result_ty, 1);

        let code = match (op, result_ty) {
            (Binop::Add, DataType::Integer) => Code::IAdd,
            (Binop::Add, DataType::Float) => Code::FAdd,
            (Binop::Subtract, DataType::Integer) => Code::ISub,
            (Binop::Subtract, DataType::Float) => Code::FSub,
            (Binop::Multiply, DataType::Integer) => Code::IMul,
            (Binop::Multiply, DataType::Float) => Code::FMul,
            (Binop::Divide, DataType::Integer) => Code::IDiv,
            (Binop::Divide, DataType::Float) => Code::FDiv,
            (Binop::Modulo, DataType::Integer) => Code::IMod,
            (Binop::Modulo, DataType::Float) => Code::FMod,
        };
        self.emit2(code, lhs_reg, rhs_reg);
        self.emit1(push_code(result_ty), lhs_reg);
    }
}

/// Generates the full instruction list for `root`, coercing the final
/// result to `return_type` and appending `Ret`.
pub fn generate(arena: &Arena, root: ExprIndex, return_type: DataType) -> Vec<Instruction> {
    let mut gen = Generator {
        arena,
        instructions: Vec::new(),
    };
    gen.gen(root);

    let root_ty = result_type(arena, root);
    match (root_ty, return_type) {
        (DataType::Integer, DataType::Integer) => gen.emit1(Code::IPop, VirtualRegister::IR),
        (DataType::Float, DataType::Float) => gen.emit1(Code::FPop, VirtualRegister::FR),
        (DataType::Float, DataType::Integer) => {
            gen.emit1(Code::FPop, VirtualRegister::F0);
            gen.emit2(Code::FToI, VirtualRegister::IR, VirtualRegister::F0);
        }
        (DataType::Integer, DataType::Float) => {
            gen.emit1(Code::IPop, VirtualRegister::I0);
            gen.emit2(Code::IToF, VirtualRegister::FR, VirtualRegister::I0);
        }
    }
    gen.emit0(Code::Ret);
    gen.instructions
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::parse;
    use std::collections::HashMap;

    #[test]
    fn literal_returns_immediately() {
        let (arena, root) = parse("1+2", &HashMap::new()).unwrap();
        let ir = generate(&arena, root, DataType::Integer);
        assert_eq!(ir.last().unwrap().code, Code::Ret);
        assert!(ir
            .iter()
            .any(|i| i.code == Code::IPop && i.reg(0) == VirtualRegister::IR));
    }

    #[test]
    fn mixed_type_binop_promotes_to_float() {
        let mut argsmap = HashMap::new();
        argsmap.insert('x', (0u8, DataType::Float));
        let (arena, root) = parse("1+x", &argsmap).unwrap();
        let ir = generate(&arena, root, DataType::Float);
        assert!(ir.iter().any(|i| i.code == Code::FAdd));
        // the integer literal must be coerced before the add.
        assert!(ir.iter().any(|i| i.code == Code::IToF));
    }

    #[test]
    fn return_type_coercion_appends_conversion() {
        let (arena, root) = parse("1", &HashMap::new()).unwrap();
        let ir = generate(&arena, root, DataType::Float);
        assert_eq!(ir.last().unwrap().code, Code::Ret);
        let coercion = &ir[ir.len() - 2];
        assert_eq!(coercion.code, Code::IToF);
        assert_eq!(coercion.reg(0), VirtualRegister::FR);
    }
}
