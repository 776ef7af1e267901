//! Vector literals.

use vvpgen_core::{Bits4, Logic4};

use crate::bytecode::Opcode;
use crate::emit::{CodeEmitter, ops};

/// Bits carried by one immediate.
const CHUNK: u32 = 32;

/// Split a 64-bit value into the low and high words of an immediate.
#[inline]
pub(crate) fn imm(value: i64) -> (u32, u32) {
    let raw = value as u64;
    (raw as u32, (raw >> 32) as u32)
}

/// Push a literal with as few immediates as its value allows.
///
/// The first `%pushi/vec4` covers everything from the highest chunk that
/// has a set or unknown bit up to the full width; each lower chunk is then
/// shifted in with `%concati/vec4`.
pub(crate) fn push_bits(em: &mut CodeEmitter, bits: &Bits4) {
    let width = bits.width().max(1);
    let chunks = width.div_ceil(CHUNK);
    let top = (0..chunks)
        .rev()
        .find(|&i| bits.planes(i * CHUNK, CHUNK) != (0, 0))
        .unwrap_or(0);

    let head_lsb = top * CHUNK;
    let (val, xval) = bits.planes(head_lsb, CHUNK);
    em.emit(Opcode::PushiVec4, ops![val, xval, width - head_lsb]);
    for i in (0..top).rev() {
        let (val, xval) = bits.planes(i * CHUNK, CHUNK);
        em.emit(Opcode::ConcatiVec4, ops![val, xval, CHUNK]);
    }
}

/// A string literal as a vector: one byte per character, first character
/// most significant. The empty string is a single zero byte.
pub(crate) fn string_bits(text: &str) -> Bits4 {
    if text.is_empty() {
        return Bits4::filled(Logic4::Zero, 8);
    }
    let mut bits = Vec::with_capacity(text.len() * 8);
    for byte in text.bytes().rev() {
        for i in 0..8 {
            bits.push(if (byte >> i) & 1 == 1 {
                Logic4::One
            } else {
                Logic4::Zero
            });
        }
    }
    Bits4::from_bits(bits)
}
