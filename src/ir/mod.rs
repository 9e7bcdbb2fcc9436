//! The flat, stack-machine intermediate representation the parser's arena
//! is lowered to, and that the encoder consumes.

pub mod generator;
pub mod optimizer;

pub use generator::generate;
pub use optimizer::optimize;

/// The fixed set of virtual registers instructions operate on. `I0`/`I1` and
/// `F0`/`F1` are scratch pairs used while combining two operand values;
/// `IR`/`FR` hold the function's final result; `IA0..IA3`/`FA0..FA3` alias
/// the incoming integer/float argument registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VirtualRegister {
    I0,
    I1,
    IR,
    F0,
    F1,
    FR,
    IA0,
    IA1,
    IA2,
    IA3,
    FA0,
    FA1,
    FA2,
    FA3,
}

impl VirtualRegister {
    /// Index into a 14-slot flat register file, in declaration order.
    pub fn index(self) -> usize {
        match self {
            VirtualRegister::I0 => 0,
            VirtualRegister::I1 => 1,
            VirtualRegister::IR => 2,
            VirtualRegister::F0 => 3,
            VirtualRegister::F1 => 4,
            VirtualRegister::FR => 5,
            VirtualRegister::IA0 => 6,
            VirtualRegister::IA1 => 7,
            VirtualRegister::IA2 => 8,
            VirtualRegister::IA3 => 9,
            VirtualRegister::FA0 => 10,
            VirtualRegister::FA1 => 11,
            VirtualRegister::FA2 => 12,
            VirtualRegister::FA3 => 13,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(
            self,
            VirtualRegister::F0
                | VirtualRegister::F1
                | VirtualRegister::FR
                | VirtualRegister::FA0
                | VirtualRegister::FA1
                | VirtualRegister::FA2
                | VirtualRegister::FA3
        )
    }

    /// The integer argument register aliasing parameter slot `index`
    /// (0-based), per the Microsoft x64 calling convention.
    pub fn integer_arg(index: u8) -> VirtualRegister {
        match index {
            0 => VirtualRegister::IA0,
            1 => VirtualRegister::IA1,
            2 => VirtualRegister::IA2,
            3 => VirtualRegister::IA3,
            _ => panic!("at most 4 integer arguments are supported"),
        }
    }

    /// The float argument register aliasing parameter slot `index`.
    pub fn float_arg(index: u8) -> VirtualRegister {
        match index {
            0 => VirtualRegister::FA0,
            1 => VirtualRegister::FA1,
            2 => VirtualRegister::FA2,
            3 => VirtualRegister::FA3,
            _ => panic!("at most 4 float arguments are supported"),
        }
    }
}

/// One instruction operand: either an immediate value or a virtual
/// register reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    /// Raw bits: either a sign-extended integer or an `f64`'s bit pattern,
    /// depending on the instruction's opcode.
    Immediate(u64),
    Register(VirtualRegister),
}

/// The live IR opcode set. `ILoadR` and `FTan` from the reference
/// implementation are not carried over: neither is ever emitted by the
/// generator nor required by any operation in this specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code {
    Ret,
    ILoad,
    FLoad,
    IArg,
    FArg,
    IPush,
    FPush,
    IPop,
    FPop,
    IMov,
    FMov,
    IAdd,
    ISub,
    IMul,
    IDiv,
    IMod,
    INeg,
    IAbs,
    FAdd,
    FSub,
    FMul,
    FDiv,
    FMod,
    FNeg,
    FAbs,
    FSin,
    FCos,
    FFloor,
    IToF,
    FToI,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instruction {
    pub code: Code,
    pub operands: [Option<Operand>; 2],
}

impl Instruction {
    pub fn nullary(code: Code) -> Instruction {
        Instruction {
            code,
            operands: [None, None],
        }
    }

    pub fn unary(code: Code, a: Operand) -> Instruction {
        Instruction {
            code,
            operands: [Some(a), None],
        }
    }

    pub fn binary(code: Code, a: Operand, b: Operand) -> Instruction {
        Instruction {
            code,
            operands: [Some(a), Some(b)],
        }
    }

    pub fn reg(&self, slot: usize) -> VirtualRegister {
        match self.operands[slot] {
            Some(Operand::Register(r)) => r,
            other => panic!("operand {} is not a register: {:?}", slot, other),
        }
    }

    pub fn immediate(&self, slot: usize) -> u64 {
        match self.operands[slot] {
            Some(Operand::Immediate(v)) => v,
            other => panic!("operand {} is not an immediate: {:?}", slot, other),
        }
    }
}
