//! Physical x86-64 register numbers and the virtual-to-physical mapping.
//!
//! GPR and XMM register numbers share the same 4-bit encoding shape (3 bits
//! in a ModR/M or opcode byte, one extension bit carried in REX), so both
//! live in the same `u8` space here; which instruction set (integer ALU vs.
//! SSE2 scalar-double) applies is determined by the opcode, not the number.

pub const RAX: u8 = 0;
pub const RCX: u8 = 1;
pub const RDX: u8 = 2;
#[allow(dead_code)]
pub const RBX: u8 = 3;
#[allow(dead_code)]
pub const RSP: u8 = 4;
#[allow(dead_code)]
pub const RBP: u8 = 5;
#[allow(dead_code)]
pub const RSI: u8 = 6;
#[allow(dead_code)]
pub const RDI: u8 = 7;
pub const R8: u8 = 8;
pub const R9: u8 = 9;
pub const R10: u8 = 10;
pub const R11: u8 = 11;

pub const XMM0: u8 = 0;
pub const XMM1: u8 = 1;
pub const XMM2: u8 = 2;
pub const XMM3: u8 = 3;
pub const XMM4: u8 = 4;
pub const XMM5: u8 = 5;

use crate::ir::VirtualRegister;

/// Physical GPR backing an integer-kind virtual register. Never returns
/// `R11`: that register is reserved as the encoder's own scratch and is
/// never the target of a virtual-register mapping.
pub fn physical_int(vr: VirtualRegister) -> u8 {
    match vr {
        VirtualRegister::I0 | VirtualRegister::IR => RAX,
        VirtualRegister::I1 => R10,
        VirtualRegister::IA0 => RCX,
        VirtualRegister::IA1 => RDX,
        VirtualRegister::IA2 => R8,
        VirtualRegister::IA3 => R9,
        _ => panic!("{:?} is not an integer-kind virtual register", vr),
    }
}

/// Physical XMM backing a float-kind virtual register.
pub fn physical_float(vr: VirtualRegister) -> u8 {
    match vr {
        VirtualRegister::F0 => XMM4,
        VirtualRegister::F1 => XMM5,
        VirtualRegister::FR | VirtualRegister::FA0 => XMM0,
        VirtualRegister::FA1 => XMM1,
        VirtualRegister::FA2 => XMM2,
        VirtualRegister::FA3 => XMM3,
        _ => panic!("{:?} is not a float-kind virtual register", vr),
    }
}

/// Physical register backing `vr`, dispatching on its kind.
pub fn physical(vr: VirtualRegister) -> u8 {
    if vr.is_float() {
        physical_float(vr)
    } else {
        physical_int(vr)
    }
}
