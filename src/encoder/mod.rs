//! Lowers a finalized IR instruction list to x86-64 machine code, one
//! instruction at a time, using the Microsoft x64 calling convention.
//!
//! The virtual-register-to-physical mapping ([`registers`]) and the raw
//! opcode emission primitives ([`opcode`]) are exhaustively dispatched
//! over here; [`transcendental`] supplies the multi-instruction `sin`/`cos`
//! sequences. There is no opcode this encoder doesn't handle for any IR
//! the generator can produce — [`CodegenError`] exists only to reject a
//! declared argument signature the fixed register map can't back.

pub mod error;
pub mod opcode;
pub mod registers;
mod transcendental;

use self::opcode::Encoder;
use self::registers::{physical, physical_float, physical_int, R11};
pub use error::CodegenError;

use crate::ir::{Code, Instruction, VirtualRegister};

const MAX_ARGS: u8 = 4;

/// Encodes `instructions` into a fresh byte buffer for a function declaring
/// `integer_args` integer and `float_args` float arguments, in that
/// calling-convention order.
pub fn encode(
    instructions: &[Instruction],
    integer_args: u8,
    float_args: u8,
) -> Result<Vec<u8>, CodegenError> {
    if integer_args > MAX_ARGS {
        return Err(CodegenError::TooManyIntegerArguments(integer_args));
    }
    if float_args > MAX_ARGS {
        return Err(CodegenError::TooManyFloatArguments(float_args));
    }

    let mut enc = Encoder::new();
    for instr in instructions {
        encode_one(&mut enc, instr, float_args);
    }
    Ok(enc.bytes)
}

fn reg(instr: &Instruction, slot: usize) -> VirtualRegister {
    instr.reg(slot)
}

fn encode_one(enc: &mut Encoder, instr: &Instruction, float_args: u8) {
    match instr.code {
        Code::Ret => enc.ret(),

        Code::ILoad => {
            enc.movvi(R11, instr.immediate(0));
            enc.pushi(R11);
        }
        Code::FLoad => {
            // The virtual stack is raw bits either way; load the f64
            // bit pattern through a GPR exactly like an integer literal.
            enc.movvi(R11, instr.immediate(0));
            enc.pushi(R11);
        }
        Code::IArg => {
            let index = instr.immediate(0) as u8;
            enc.pushi(physical_int(VirtualRegister::integer_arg(index)));
        }
        Code::FArg => {
            let index = instr.immediate(0) as u8;
            enc.pushf(physical_float(VirtualRegister::float_arg(index)));
        }

        Code::IPush => enc.pushi(physical(reg(instr, 0))),
        Code::FPush => enc.pushf(physical(reg(instr, 0))),
        Code::IPop => enc.popi(physical(reg(instr, 0))),
        Code::FPop => enc.popf(physical(reg(instr, 0))),

        Code::IMov => enc.movri(physical(reg(instr, 0)), physical(reg(instr, 1))),
        Code::FMov => enc.movf(physical(reg(instr, 0)), physical(reg(instr, 1))),

        Code::IAdd => enc.addri(physical(reg(instr, 0)), physical(reg(instr, 1))),
        Code::ISub => enc.subri(physical(reg(instr, 0)), physical(reg(instr, 1))),
        Code::IMul => enc.mulri(physical(reg(instr, 0)), physical(reg(instr, 1))),
        Code::IDiv => encode_idiv(enc, physical(reg(instr, 0)), physical(reg(instr, 1)), false),
        Code::IMod => encode_idiv(enc, physical(reg(instr, 0)), physical(reg(instr, 1)), true),
        Code::INeg => enc.negri(physical(reg(instr, 0))),
        Code::IAbs => encode_iabs(enc, physical(reg(instr, 0))),

        Code::FAdd => enc.addf(physical(reg(instr, 0)), physical(reg(instr, 1))),
        Code::FSub => enc.subf(physical(reg(instr, 0)), physical(reg(instr, 1))),
        Code::FMul => enc.mulf(physical(reg(instr, 0)), physical(reg(instr, 1))),
        Code::FDiv => enc.divf(physical(reg(instr, 0)), physical(reg(instr, 1))),
        Code::FMod => {
            let dst = physical(reg(instr, 0));
            let src = physical(reg(instr, 1));
            let scratch = physical(VirtualRegister::FR);
            // FR aliases FA0, a live float-argument register, so it must be
            // saved/restored around the clobber exactly like FSin/FCos below.
            transcendental::save_float_args(enc, float_args);
            transcendental::emit_fmod(enc, dst, src, scratch);
            transcendental::restore_float_args(enc, float_args);
        }
        Code::FNeg => {
            let xra = physical(reg(instr, 0));
            let tmp = scratch_xmm(xra);
            enc.negf(xra, tmp);
        }
        Code::FAbs => {
            let xra = physical(reg(instr, 0));
            let tmp = scratch_xmm(xra);
            enc.absf(xra, tmp);
        }
        Code::FFloor => {
            let xra = physical(reg(instr, 0));
            enc.roundf(xra, xra, 0x09);
        }
        Code::FSin => transcendental::emit_sin(enc, float_args),
        Code::FCos => transcendental::emit_cos(enc, float_args),

        Code::IToF => enc.itof(physical(reg(instr, 0)), physical(reg(instr, 1))),
        Code::FToI => enc.ftoi(physical(reg(instr, 0)), physical(reg(instr, 1))),
    }
}

/// `F0`/`F1` (`XMM4`/`XMM5`) are the only two float scratch slots this
/// register map keeps free of any live argument or return value, so they
/// serve as each other's one-off scratch register.
fn scratch_xmm(xra: u8) -> u8 {
    let f0 = physical(VirtualRegister::F0);
    let f1 = physical(VirtualRegister::F1);
    if xra == f0 {
        f1
    } else {
        f0
    }
}

/// `idiv` takes its divisor as the sole operand and divides `RDX:RAX` by
/// it, leaving the quotient in `RAX` and the remainder in `RDX`. `RDX` is
/// zeroed rather than sign-extended via `cqo` before the divide, matching
/// the reference encoder exactly; this loses correctness for negative
/// dividends; accepted per spec.md's IEEE-754/corner-case non-goal.
fn encode_idiv(enc: &mut Encoder, dst: u8, src: u8, want_remainder: bool) {
    use self::registers::{RAX, RDX};
    enc.movri(RAX, dst);
    enc.movri(R11, RDX);
    enc.xorri(RDX, RDX);
    enc.divri(src);
    if want_remainder {
        enc.movri(dst, RDX);
    } else {
        enc.movri(dst, RAX);
    }
    enc.movri(RDX, R11);
}

/// Branch-free `abs`: `x ^ (x >> 63) - (x >> 63)`, where the arithmetic
/// shift produces an all-ones mask for negative `x` and an all-zero mask
/// otherwise.
fn encode_iabs(enc: &mut Encoder, reg: u8) {
    use self::registers::{R10, RAX};
    let tmp = if reg == RAX { R10 } else { RAX };
    enc.movri(tmp, reg);
    enc.sarvi(tmp, 63);
    enc.xorri(reg, tmp);
    enc.subri(reg, tmp);
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::data_type::DataType;
    use crate::ir::{generate, optimize};
    use crate::parser::parse;
    use std::collections::HashMap;

    #[test]
    fn ret_only_program_is_one_byte() {
        let (arena, root) = parse("1", &HashMap::new()).unwrap();
        let ir = generate(&arena, root, DataType::Integer);
        let bytes = encode(&ir, 0, 0).unwrap();
        assert_eq!(*bytes.last().unwrap(), 0xC3);
    }

    #[test]
    fn rejects_too_many_arguments() {
        let (arena, root) = parse("1", &HashMap::new()).unwrap();
        let ir = generate(&arena, root, DataType::Integer);
        assert_eq!(
            encode(&ir, 5, 0),
            Err(CodegenError::TooManyIntegerArguments(5))
        );
        assert_eq!(
            encode(&ir, 0, 5),
            Err(CodegenError::TooManyFloatArguments(5))
        );
    }
}
