//! Four-state bit vectors.
//!
//! [`Bits4`] is the literal value type for numbers in expressions,
//! structural constants and parameters. Bits are stored LSB first.

use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// One bit of a 4-state value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Logic4 {
    #[default]
    Zero = 0,
    One = 1,
    X = 2,
    Z = 3,
}

impl Logic4 {
    /// The character used for this bit in constant operands.
    pub const fn as_char(self) -> char {
        match self {
            Logic4::Zero => '0',
            Logic4::One => '1',
            Logic4::X => 'x',
            Logic4::Z => 'z',
        }
    }

    /// Parse a bit character (`0 1 x X z Z ?`).
    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            '0' => Some(Logic4::Zero),
            '1' => Some(Logic4::One),
            'x' | 'X' => Some(Logic4::X),
            'z' | 'Z' | '?' => Some(Logic4::Z),
            _ => None,
        }
    }

    /// Whether the bit is 0 or 1.
    #[inline]
    pub const fn is_defined(self) -> bool {
        matches!(self, Logic4::Zero | Logic4::One)
    }

    /// The (val, xval) plane encoding used by immediate instructions.
    ///
    /// `0 -> (0,0)`, `1 -> (1,0)`, `z -> (0,1)`, `x -> (1,1)`.
    #[inline]
    pub const fn planes(self) -> (bool, bool) {
        match self {
            Logic4::Zero => (false, false),
            Logic4::One => (true, false),
            Logic4::Z => (false, true),
            Logic4::X => (true, true),
        }
    }
}

/// A 4-state vector value, LSB first.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Bits4 {
    bits: Vec<Logic4>,
}

impl Bits4 {
    /// Create a vector of `width` copies of `bit`.
    pub fn filled(bit: Logic4, width: u32) -> Self {
        Self {
            bits: vec![bit; width as usize],
        }
    }

    /// Create a fully defined vector from the low `width` bits of `value`.
    pub fn from_u64(value: u64, width: u32) -> Self {
        let bits = (0..width)
            .map(|i| {
                if i < 64 && (value >> i) & 1 == 1 {
                    Logic4::One
                } else {
                    Logic4::Zero
                }
            })
            .collect();
        Self { bits }
    }

    /// Create a vector from bits given LSB first.
    pub fn from_bits(bits: Vec<Logic4>) -> Self {
        Self { bits }
    }

    /// Parse an MSB-first string of bit characters, ignoring `_`.
    ///
    /// Returns `None` if any other character is present.
    pub fn parse_msb(text: &str) -> Option<Self> {
        let mut bits = Vec::with_capacity(text.len());
        for ch in text.chars().rev() {
            if ch == '_' {
                continue;
            }
            bits.push(Logic4::from_char(ch)?);
        }
        Some(Self { bits })
    }

    /// Number of bits.
    #[inline]
    pub fn width(&self) -> u32 {
        self.bits.len() as u32
    }

    /// Bit at `index`, or `Zero` past the end.
    #[inline]
    pub fn bit(&self, index: u32) -> Logic4 {
        self.bits.get(index as usize).copied().unwrap_or(Logic4::Zero)
    }

    /// All bits, LSB first.
    pub fn bits(&self) -> &[Logic4] {
        &self.bits
    }

    /// Whether every bit is 0 or 1.
    pub fn is_defined(&self) -> bool {
        self.bits.iter().all(|b| b.is_defined())
    }

    /// Whether every bit equals `bit`.
    pub fn is_all(&self, bit: Logic4) -> bool {
        self.bits.iter().all(|b| *b == bit)
    }

    /// Value as an unsigned integer if fully defined and nothing above bit 63
    /// is set.
    pub fn to_u64(&self) -> Option<u64> {
        let mut value = 0u64;
        for (i, bit) in self.bits.iter().enumerate() {
            match bit {
                Logic4::Zero => {}
                Logic4::One if i < 64 => value |= 1 << i,
                _ => return None,
            }
        }
        Some(value)
    }

    /// Value as a signed integer, sign-extending from the top bit when
    /// `signed` is set.
    pub fn to_i64(&self, signed: bool) -> Option<i64> {
        if self.width() > 64 {
            // Wide values fit only if the high bits are pure sign extension.
            let top = self.bit(63);
            let extension_ok = if signed {
                (64..self.width()).all(|i| self.bit(i) == top)
            } else {
                (63..self.width()).all(|i| self.bit(i) == Logic4::Zero)
            };
            if !extension_ok || !top.is_defined() {
                return None;
            }
            return self.slice(0, 64).to_i64(true);
        }
        let raw = self.to_u64()?;
        let width = self.width();
        if signed && width > 0 && width < 64 && self.bit(width - 1) == Logic4::One {
            Some((raw | (!0u64 << width)) as i64)
        } else {
            Some(raw as i64)
        }
    }

    /// A `width`-bit slice starting at bit `lsb`, padding with `Zero`.
    pub fn slice(&self, lsb: u32, width: u32) -> Self {
        Self {
            bits: (lsb..lsb + width).map(|i| self.bit(i)).collect(),
        }
    }

    /// Resize to `width`, sign-extending when `signed` is set.
    pub fn resized(&self, width: u32, signed: bool) -> Self {
        let fill = if signed && !self.bits.is_empty() {
            self.bit(self.width() - 1)
        } else {
            Logic4::Zero
        };
        let bits = (0..width)
            .map(|i| {
                if i < self.width() {
                    self.bit(i)
                } else {
                    fill
                }
            })
            .collect();
        Self { bits }
    }

    /// The (val, xval) words for a chunk of at most 32 bits at `lsb`.
    pub fn planes(&self, lsb: u32, width: u32) -> (u32, u32) {
        let mut val = 0u32;
        let mut xval = 0u32;
        for i in 0..width.min(32) {
            let (v, x) = self.bit(lsb + i).planes();
            if v {
                val |= 1 << i;
            }
            if x {
                xval |= 1 << i;
            }
        }
        (val, xval)
    }

    /// MSB-first text form, as used inside `C4<...>` operands.
    pub fn to_msb_string(&self) -> String {
        self.bits.iter().rev().map(|b| b.as_char()).collect()
    }
}

impl fmt::Debug for Bits4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}'b{}", self.width(), self.to_msb_string())
    }
}

impl fmt::Display for Bits4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_msb_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_u64_is_lsb_first() {
        let b = Bits4::from_u64(0b101, 4);
        assert_eq!(b.to_msb_string(), "0101");
        assert_eq!(b.bit(0), Logic4::One);
        assert_eq!(b.bit(1), Logic4::Zero);
    }

    #[test]
    fn parse_msb_with_unknowns() {
        let b = Bits4::parse_msb("1x_z0").unwrap();
        assert_eq!(b.width(), 4);
        assert_eq!(b.to_msb_string(), "1xz0");
        assert!(!b.is_defined());
        assert_eq!(b.to_u64(), None);
        assert!(Bits4::parse_msb("12").is_none());
    }

    #[test]
    fn signed_conversion_extends_top_bit() {
        let b = Bits4::from_u64(0b1110, 4);
        assert_eq!(b.to_i64(true), Some(-2));
        assert_eq!(b.to_i64(false), Some(14));
    }

    #[test]
    fn planes_encode_four_states() {
        let b = Bits4::parse_msb("xz10").unwrap();
        assert_eq!(b.planes(0, 4), (0b1010, 0b1100));
    }

    #[test]
    fn resize_sign_extends() {
        let b = Bits4::parse_msb("10").unwrap();
        assert_eq!(b.resized(4, true).to_msb_string(), "1110");
        assert_eq!(b.resized(4, false).to_msb_string(), "0010");
        assert_eq!(b.resized(1, true).to_msb_string(), "0");
    }

    #[test]
    fn wide_value_to_i64() {
        let b = Bits4::from_u64(5, 40);
        assert_eq!(b.to_i64(false), Some(5));
        let neg = Bits4::filled(Logic4::One, 70);
        assert_eq!(neg.to_i64(true), Some(-1));
        assert_eq!(neg.to_i64(false), None);
    }
}
