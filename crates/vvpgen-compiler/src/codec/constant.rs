//! Structural constant literals.
//!
//! A constant driver is written `C4<bits>` when it drives with strong
//! strength in both directions, and `C8<...>` with one strength triple per
//! bit otherwise. Bits are written most significant first.

use vvpgen_core::{Bits4, Drive, Logic4};

/// `C4<...>` literal of the bits.
pub fn c4_literal(bits: &Bits4) -> String {
    format!("C4<{}>", bits.to_msb_string())
}

/// `C4<...>` literal of `width` copies of one bit.
pub fn c4_repeat(bit: Logic4, width: u32) -> String {
    c4_literal(&Bits4::filled(bit, width.max(1)))
}

/// `C8<...>` literal: each bit as `<drive0-digit><drive1-digit><value>`.
///
/// A 0 is driven at the 0 strength and a 1 at the 1 strength; x spans both
/// and z drives nothing.
pub fn c8_literal(bits: &Bits4, drive0: Drive, drive1: Drive) -> String {
    let d0 = drive0.digit();
    let d1 = drive1.digit();
    let mut out = String::with_capacity(4 + 3 * bits.width() as usize);
    out.push_str("C8<");
    for bit in bits.bits().iter().rev() {
        let triple = match bit {
            Logic4::Zero => format!("{d0}{d0}0"),
            Logic4::One => format!("{d1}{d1}1"),
            Logic4::X => format!("{d0}{d1}x"),
            Logic4::Z => "00z".to_string(),
        };
        out.push_str(&triple);
    }
    out.push('>');
    out
}

/// The literal for a constant driver with the given strengths.
pub fn const_literal(bits: &Bits4, drive0: Drive, drive1: Drive) -> String {
    if drive0 == Drive::Strong && drive1 == Drive::Strong {
        c4_literal(bits)
    } else {
        c8_literal(bits, drive0, drive1)
    }
}

/// A 64-bit value as a `C4<...>` literal, as used by delay inputs.
pub fn c4_u64(value: u64) -> String {
    c4_literal(&Bits4::from_u64(value, 64))
}
