//! Encoding of real constants.
//!
//! Immediates are split into a mantissa and a biased exponent field:
//! `value = mant * 2^(exp - 0x1000)`, with bit 0x4000 of the exponent field
//! holding the sign. An exponent field of 0x3fff marks infinity (mantissa
//! 0) or NaN (mantissa 1).

/// Exponent bias.
const BIAS: i32 = 0x1000;
/// Sign bit of the exponent field.
const SIGN: u32 = 0x4000;
/// Exponent field of non-finite values.
const SPECIAL: u32 = 0x3fff;

/// Mantissa bits carried by the first immediate.
const HEAD_BITS: i32 = 31;
/// Mantissa bits carried by the residual immediate.
const TAIL_BITS: i32 = 22;

/// Split a finite non-zero value into a fraction in [0.5, 1) and a power
/// of two.
fn frexp(value: f64) -> (f64, i32) {
    let bits = value.to_bits();
    let raw_exp = ((bits >> 52) & 0x7ff) as i32;
    if raw_exp == 0 {
        // Subnormal: scale into the normal range first.
        let (fract, exp) = frexp(value * 2f64.powi(64));
        return (fract, exp - 64);
    }
    let exp = raw_exp - 1022;
    let fract = f64::from_bits((bits & !(0x7ff << 52)) | (1022 << 52));
    (fract, exp)
}

fn field(exp: i32, sign: u32) -> u32 {
    (exp + BIAS).clamp(0, 0x1fff) as u32 | sign
}

/// The immediate operand pairs whose sum is `value`.
///
/// Most values need one pair; values with more than 31 significant
/// mantissa bits need a second one for the residual.
pub fn immediate_parts(value: f64) -> Vec<(u64, u32)> {
    let sign = if value.is_sign_negative() { SIGN } else { 0 };
    if value.is_nan() {
        return vec![(1, SPECIAL)];
    }
    if value.is_infinite() {
        return vec![(0, SPECIAL | sign)];
    }
    if value == 0.0 {
        return vec![(0, sign)];
    }

    let (fract, exp) = frexp(value.abs());
    let head = fract * 2f64.powi(HEAD_BITS);
    let mant = head.floor();
    let mut parts = vec![(mant as u64, field(exp - HEAD_BITS, sign))];

    let tail = ((head - mant) * 2f64.powi(TAIL_BITS)).floor();
    if tail != 0.0 {
        parts.push((tail as u64, field(exp - HEAD_BITS - TAIL_BITS, sign)));
    }
    parts
}

/// The structural constant literal `Cr<m<hex>g<hex>>`.
pub fn cr_literal(value: f64) -> String {
    if value.is_nan() {
        return format!("Cr<m1g{SPECIAL:x}>");
    }
    let sign = if value.is_sign_negative() { SIGN } else { 0 };
    if value.is_infinite() {
        return format!("Cr<m0g{:x}>", SPECIAL | sign);
    }
    if value == 0.0 {
        return format!("Cr<m0g{sign:x}>");
    }
    let (fract, exp) = frexp(value.abs());
    let mant = (fract * 2f64.powi(63)) as u64;
    format!("Cr<m{mant:x}g{:x}>", field(exp - 63, sign))
}

/// Value of one immediate pair.
pub fn decode(mant: u64, exp_field: u32) -> f64 {
    let sign = if exp_field & SIGN != 0 { -1.0 } else { 1.0 };
    let exp = exp_field & !SIGN;
    if exp == SPECIAL {
        return if mant == 0 { sign * f64::INFINITY } else { f64::NAN };
    }
    if mant == 0 {
        return sign * 0.0;
    }
    sign * (mant as f64) * 2f64.powi(exp as i32 - BIAS)
}
