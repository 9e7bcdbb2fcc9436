//! Low-level x86-64 byte emission: REX prefix computation, ModR/M encoding,
//! and one function per concrete machine instruction the encoder needs.
//!
//! Every integer-GPR instruction forces `REX.W` unconditionally, trading a
//! redundant prefix byte on a few instructions that don't strictly need it
//! for not having to replicate the reference encoder's more intricate
//! REX-omission analysis; emitting a redundant REX is always valid per the
//! ISA. SSE2 scalar-double instructions never set `REX.W` (irrelevant to
//! them) and only carry REX at all when addressing `XMM8..15`, which this
//! encoder's fixed register map never does.

use super::registers::R11;

pub struct Encoder {
    pub bytes: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Encoder { bytes: Vec::new() }
    }

    fn push_byte(&mut self, b: u8) {
        self.bytes.push(b);
    }

    fn push_bytes(&mut self, bs: &[u8]) {
        self.bytes.extend_from_slice(bs);
    }

    /// Emits REX if `force_w` or either register needs its extension bit.
    /// `reg` feeds the REX.R bit (the ModR/M `reg` field, or unused for
    /// `+r`-form opcodes where the embedded register goes through `rm`
    /// instead); `rm` feeds REX.B.
    fn rex(&mut self, reg: u8, rm: u8, force_w: bool) {
        let r = if reg & 0x8 != 0 { 0x04 } else { 0 };
        let b = if rm & 0x8 != 0 { 0x01 } else { 0 };
        let w = if force_w { 0x08 } else { 0 };
        if force_w || r != 0 || b != 0 {
            self.push_byte(0x40 | w | r | b);
        }
    }

    fn modrm_reg(&mut self, reg: u8, rm: u8) {
        self.push_byte(0b1100_0000 | ((reg & 7) << 3) | (rm & 7));
    }

    fn modrm_digit(&mut self, digit: u8, rm: u8) {
        self.push_byte(0b1100_0000 | ((digit & 7) << 3) | (rm & 7));
    }

    pub fn ret(&mut self) {
        self.push_byte(0xC3);
    }

    /// `mov reg, imm64` — `B8+rd io`.
    pub fn movvi(&mut self, dst: u8, imm: u64) {
        self.rex(0, dst, true);
        self.push_byte(0xB8 + (dst & 7));
        self.push_bytes(&imm.to_le_bytes());
    }

    /// `push reg` — `50+rd`.
    pub fn pushi(&mut self, reg: u8) {
        self.rex(0, reg, false);
        self.push_byte(0x50 + (reg & 7));
    }

    /// `pop reg` — `58+rd`.
    pub fn popi(&mut self, reg: u8) {
        self.rex(0, reg, false);
        self.push_byte(0x58 + (reg & 7));
    }

    /// `mov r64, r/m64` — `8B /r`.
    pub fn movri(&mut self, dst: u8, src: u8) {
        self.rex(dst, src, true);
        self.push_byte(0x8B);
        self.modrm_reg(dst, src);
    }

    /// `add r64, r/m64` — `03 /r`.
    pub fn addri(&mut self, dst: u8, src: u8) {
        self.rex(dst, src, true);
        self.push_byte(0x03);
        self.modrm_reg(dst, src);
    }

    /// `sub r64, r/m64` — `2B /r`.
    pub fn subri(&mut self, dst: u8, src: u8) {
        self.rex(dst, src, true);
        self.push_byte(0x2B);
        self.modrm_reg(dst, src);
    }

    /// `imul r64, r/m64` — `0F AF /r`.
    pub fn mulri(&mut self, dst: u8, src: u8) {
        self.rex(dst, src, true);
        self.push_bytes(&[0x0F, 0xAF]);
        self.modrm_reg(dst, src);
    }

    /// `xor r64, r/m64` — `33 /r`.
    pub fn xorri(&mut self, dst: u8, src: u8) {
        self.rex(dst, src, true);
        self.push_byte(0x33);
        self.modrm_reg(dst, src);
    }

    /// `neg r/m64` — `F7 /3`.
    pub fn negri(&mut self, reg: u8) {
        self.rex(0, reg, true);
        self.push_byte(0xF7);
        self.modrm_digit(3, reg);
    }

    /// `idiv r/m64` — `F7 /7`.
    pub fn divri(&mut self, divisor: u8) {
        self.rex(0, divisor, true);
        self.push_byte(0xF7);
        self.modrm_digit(7, divisor);
    }

    /// `sar r/m64, imm8` — `C1 /7 ib`.
    pub fn sarvi(&mut self, reg: u8, imm8: u8) {
        self.rex(0, reg, true);
        self.push_byte(0xC1);
        self.modrm_digit(7, reg);
        self.push_byte(imm8);
    }

    /// `movq xmm, r/m64` — `66 REX.W 0F 6E /r`.
    pub fn loadf(&mut self, xmm: u8, gpr: u8) {
        self.push_byte(0x66);
        self.rex(xmm, gpr, true);
        self.push_bytes(&[0x0F, 0x6E]);
        self.modrm_reg(xmm, gpr);
    }

    /// `movq r/m64, xmm` — `66 REX.W 0F 7E /r`.
    pub fn storef(&mut self, gpr: u8, xmm: u8) {
        self.push_byte(0x66);
        self.rex(xmm, gpr, true);
        self.push_bytes(&[0x0F, 0x7E]);
        self.modrm_reg(xmm, gpr);
    }

    /// `movsd xmm, xmm/m64` — `F2 0F 10 /r`.
    pub fn movf(&mut self, dst: u8, src: u8) {
        self.push_byte(0xF2);
        self.rex(dst, src, false);
        self.push_bytes(&[0x0F, 0x10]);
        self.modrm_reg(dst, src);
    }

    /// `addsd xmm, xmm/m64` — `F2 0F 58 /r`.
    pub fn addf(&mut self, dst: u8, src: u8) {
        self.push_byte(0xF2);
        self.rex(dst, src, false);
        self.push_bytes(&[0x0F, 0x58]);
        self.modrm_reg(dst, src);
    }

    /// `subsd xmm, xmm/m64` — `F2 0F 5C /r`.
    pub fn subf(&mut self, dst: u8, src: u8) {
        self.push_byte(0xF2);
        self.rex(dst, src, false);
        self.push_bytes(&[0x0F, 0x5C]);
        self.modrm_reg(dst, src);
    }

    /// `mulsd xmm, xmm/m64` — `F2 0F 59 /r`.
    pub fn mulf(&mut self, dst: u8, src: u8) {
        self.push_byte(0xF2);
        self.rex(dst, src, false);
        self.push_bytes(&[0x0F, 0x59]);
        self.modrm_reg(dst, src);
    }

    /// `divsd xmm, xmm/m64` — `F2 0F 5E /r`.
    pub fn divf(&mut self, dst: u8, src: u8) {
        self.push_byte(0xF2);
        self.rex(dst, src, false);
        self.push_bytes(&[0x0F, 0x5E]);
        self.modrm_reg(dst, src);
    }

    /// `xorpd xmm, xmm/m64` — `66 0F 57 /r`.
    pub fn xorf(&mut self, dst: u8, src: u8) {
        self.push_byte(0x66);
        self.rex(dst, src, false);
        self.push_bytes(&[0x0F, 0x57]);
        self.modrm_reg(dst, src);
    }

    /// `andpd xmm, xmm/m64` — `66 0F 54 /r`.
    pub fn andf(&mut self, dst: u8, src: u8) {
        self.push_byte(0x66);
        self.rex(dst, src, false);
        self.push_bytes(&[0x0F, 0x54]);
        self.modrm_reg(dst, src);
    }

    /// `roundsd xmm, xmm/m64, imm8` — `66 0F 3A 0B /r ib`. `mode` is an
    /// immediate rounding-control byte: `0x09` floors (round down,
    /// suppress precision exception), `0x0B` truncates toward zero.
    pub fn roundf(&mut self, dst: u8, src: u8, mode: u8) {
        self.push_byte(0x66);
        self.rex(dst, src, false);
        self.push_bytes(&[0x0F, 0x3A, 0x0B]);
        self.modrm_reg(dst, src);
        self.push_byte(mode);
    }

    /// `pcmpeqw xmm, xmm/m64` — `66 0F 75 /r`.
    pub fn pcmpeqw(&mut self, dst: u8, src: u8) {
        self.push_byte(0x66);
        self.rex(dst, src, false);
        self.push_bytes(&[0x0F, 0x75]);
        self.modrm_reg(dst, src);
    }

    /// `psllq xmm, imm8` — `66 0F 73 /6 ib`.
    pub fn psllq(&mut self, reg: u8, imm8: u8) {
        self.push_byte(0x66);
        self.rex(0, reg, false);
        self.push_bytes(&[0x0F, 0x73]);
        self.modrm_digit(6, reg);
        self.push_byte(imm8);
    }

    /// `psrlq xmm, imm8` — `66 0F 73 /2 ib`.
    pub fn psrlq(&mut self, reg: u8, imm8: u8) {
        self.push_byte(0x66);
        self.rex(0, reg, false);
        self.push_bytes(&[0x0F, 0x73]);
        self.modrm_digit(2, reg);
        self.push_byte(imm8);
    }

    /// `cvttsd2si r64, xmm/m64` — `F2 REX.W 0F 2D /r`.
    pub fn ftoi(&mut self, gpr_dst: u8, xmm_src: u8) {
        self.push_byte(0xF2);
        self.rex(gpr_dst, xmm_src, true);
        self.push_bytes(&[0x0F, 0x2D]);
        self.modrm_reg(gpr_dst, xmm_src);
    }

    /// `cvtsi2sd xmm, r/m64` — `F2 REX.W 0F 2A /r`.
    pub fn itof(&mut self, xmm_dst: u8, gpr_src: u8) {
        self.push_byte(0xF2);
        self.rex(xmm_dst, gpr_src, true);
        self.push_bytes(&[0x0F, 0x2A]);
        self.modrm_reg(xmm_dst, gpr_src);
    }

    /// Moves an XMM register to the real stack through the `R11` scratch
    /// GPR (there is no direct SSE push).
    pub fn pushf(&mut self, xmm: u8) {
        self.storef(R11, xmm);
        self.pushi(R11);
    }

    pub fn popf(&mut self, xmm: u8) {
        self.popi(R11);
        self.loadf(xmm, R11);
    }

    /// Loads an arbitrary `f64` bit pattern into `xmm` through `R11`.
    pub fn loadfv(&mut self, xmm: u8, bits: u64) {
        self.movvi(R11, bits);
        self.loadf(xmm, R11);
    }

    /// Flips the sign bit of `xmm` using `tmp` as scratch.
    pub fn negf(&mut self, xmm: u8, tmp: u8) {
        self.loadfv(tmp, 0x8000_0000_0000_0000);
        self.xorf(xmm, tmp);
    }

    /// Clears the sign bit of `xmm` using `tmp` as scratch.
    pub fn absf(&mut self, xmm: u8, tmp: u8) {
        self.loadfv(tmp, 0x7FFF_FFFF_FFFF_FFFF);
        self.andf(xmm, tmp);
    }

    /// Materializes the `f64` value `1.0` in `xmm` without a data load:
    /// set every bit, shift so only the top 10 bits survive, then shift
    /// those down into place — the bit pattern of `1.0` is `0x3FF0...0`.
    pub fn genf1(&mut self, xmm: u8) {
        self.pcmpeqw(xmm, xmm);
        self.psllq(xmm, 54);
        self.psrlq(xmm, 2);
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Encoder::new()
    }
}
