//! Inline `sin`/`cos` via range reduction to `[0, 2*PI)`, parity reduction
//! to `[0, PI)`, and a fixed 10-term Taylor series — avoiding any call to an
//! external libm and the ABI complications that would bring.

use std::f64::consts::PI;

use super::opcode::Encoder;
use super::registers::{XMM0, XMM1, XMM2, XMM3, XMM4, XMM5};

const TWO_PI: f64 = 2.0 * PI;

const SIN_FACTORIALS: [f64; 9] = [
    6.0,
    120.0,
    5040.0,
    362_880.0,
    39_916_800.0,
    6_227_020_800.0,
    1_307_674_368_000.0,
    355_687_428_096_000.0,
    121_645_100_408_832_000.0,
];

const COS_FACTORIALS: [f64; 9] = [
    2.0,
    24.0,
    720.0,
    40_320.0,
    3_628_800.0,
    479_001_600.0,
    87_178_291_200.0,
    20_922_789_888_000.0,
    6_402_373_705_728_000.0,
];

/// Saves the XMM registers aliasing currently-live float arguments (at most
/// `XMM0..XMM3`) before clobbering them as scratch space.
pub(super) fn save_float_args(enc: &mut Encoder, float_args: u8) {
    let n = float_args.min(4);
    for i in 0..n {
        enc.pushf([XMM0, XMM1, XMM2, XMM3][i as usize]);
    }
}

pub(super) fn restore_float_args(enc: &mut Encoder, float_args: u8) {
    let n = float_args.min(4);
    for i in (0..n).rev() {
        enc.popf([XMM0, XMM1, XMM2, XMM3][i as usize]);
    }
}

/// Reduces `xra` (`XMM4`) into `[0, 2*PI)` using `xrt` (`XMM5`) and `XMM2`
/// as scratch.
fn range_reduce(enc: &mut Encoder) {
    enc.movf(XMM5, XMM4);
    enc.loadfv(XMM2, TWO_PI.to_bits());
    enc.divf(XMM5, XMM2);
    enc.roundf(XMM5, XMM5, 0x09); // floor
    enc.mulf(XMM5, XMM2);
    enc.subf(XMM4, XMM5);
}

/// Reduces the range-reduced `xra` into `[0, PI)`, leaving the integer
/// parity factor `2*q + 1` (`1.0` or `-1.0`) in `XMM0` for the caller to
/// apply after the Taylor series runs.
fn parity_reduce(enc: &mut Encoder) {
    enc.movf(XMM0, XMM4);
    enc.loadfv(XMM5, PI.to_bits());
    enc.divf(XMM0, XMM5);
    enc.roundf(XMM0, XMM0, 0x09); // floor -> q (negated below)
    enc.negf(XMM0, XMM1);
    enc.movf(XMM1, XMM0);
    enc.mulf(XMM1, XMM5);
    enc.addf(XMM4, XMM1); // xra now in [0, PI)
}

fn finalize_parity(enc: &mut Encoder) {
    enc.addf(XMM0, XMM0); // 2*q
    enc.genf1(XMM1);
    enc.addf(XMM0, XMM1); // 2*q + 1
    enc.mulf(XMM4, XMM0);
}

fn taylor(enc: &mut Encoder, leading_is_x: bool, factorials: &[f64]) {
    // xrt = x; X2 = x^2 (fixed multiplier); xrt advances to the next odd
    // or even power each iteration.
    enc.movf(XMM5, XMM4);
    enc.mulf(XMM5, XMM5);
    enc.movf(XMM2, XMM5);
    if leading_is_x {
        enc.mulf(XMM5, XMM4); // xrt = x^3, xra stays x (already the first term)
    } else {
        enc.genf1(XMM4); // xra = 1.0, the cos series' leading term
    }
    for (i, &fact) in factorials.iter().enumerate() {
        enc.movf(XMM1, XMM5);
        enc.loadfv(XMM3, fact.to_bits());
        enc.divf(XMM1, XMM3);
        if i % 2 == 0 {
            enc.subf(XMM4, XMM1);
        } else {
            enc.addf(XMM4, XMM1);
        }
        if i + 1 < factorials.len() {
            enc.mulf(XMM5, XMM2);
        }
    }
}

/// Emits `FSin` acting on `XMM4`, leaving the result in `XMM4`.
pub fn emit_sin(enc: &mut Encoder, float_args: u8) {
    save_float_args(enc, float_args);
    range_reduce(enc);
    parity_reduce(enc);
    taylor(enc, true, &SIN_FACTORIALS);
    finalize_parity(enc);
    restore_float_args(enc, float_args);
}

/// Emits `FCos` acting on `XMM4`, leaving the result in `XMM4`.
pub fn emit_cos(enc: &mut Encoder, float_args: u8) {
    save_float_args(enc, float_args);
    range_reduce(enc);
    parity_reduce(enc);
    taylor(enc, false, &COS_FACTORIALS);
    finalize_parity(enc);
    restore_float_args(enc, float_args);
}

/// `a mod b` for floats with no native instruction: `a - trunc(a/b)*b`,
/// using `scratch` (`FR`/`XMM0`, dead at any point a binary operator
/// combines its operands) to hold the quotient.
pub fn emit_fmod(enc: &mut Encoder, dst: u8, src: u8, scratch: u8) {
    enc.movf(scratch, dst);
    enc.divf(scratch, src);
    enc.roundf(scratch, scratch, 0x0B); // truncate toward zero
    enc.mulf(scratch, src);
    enc.subf(dst, scratch);
}
