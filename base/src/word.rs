//! The Elliott 803 uses 39-bit two's-complement words.  We store each
//! word in a 64-bit container, with the sign bit (bit 39, counting
//! from 1) replicated into bit 40.  The duplicated sign bit is how
//! the machine detects overflow: after an arithmetic operation,
//! overflow has occurred iff the raw bit 40 disagrees with a copy of
//! the sign bit.
//!
//! The arithmetic primitives in [`crate::ops`] maintain the
//! sign-replication invariant; raw values in between (for example the
//! separated-mantissa format used during floating-point operations,
//! or the 40-bit remainders inside divide) deliberately break it, so
//! `Word` itself does not mask its contents.
use std::fmt::{self, Debug, Display, Formatter, Octal};

use serde::{Deserialize, Serialize};

/// The value bits below the sign.
pub const BITS_38: u64 = 0x3F_FFFF_FFFF;
/// A full 39-bit word, sign included.
pub const BITS_39: u64 = 0x7F_FFFF_FFFF;
/// A 39-bit word plus the duplicated sign bit.
pub const BITS_40: u64 = 0xFF_FFFF_FFFF;
/// The sign bit of the accumulator.
pub const SIGN_BIT: u64 = 0x40_0000_0000;
/// The duplicated sign bit.
pub const SIGN_COPY_BIT: u64 = 0x80_0000_0000;
/// The bit in the AR which carries into the ACC during double-length
/// operations.
pub const CARRY_BIT: u64 = SIGN_BIT;
/// The bit tested in the ACC to detect carry; it should match the
/// carry bit when no overflow occurred.
pub const OVERFLOW_BIT: u64 = SIGN_COPY_BIT;

/// One 39-bit machine word (sign bit replicated into bit 40).
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct Word {
    bits: u64,
}

impl Word {
    pub const ZERO: Word = Word { bits: 0 };
    pub const ONE: Word = Word { bits: 1 };

    /// The most significant magnitude bit of the AR; fn53 adds this
    /// as the rounding bit.
    pub const AR_MSB: Word = Word { bits: 1 << 37 };

    /// Wrap a raw bit pattern.  The caller is responsible for any
    /// masking; primitives that need exact 803 semantics do their own.
    pub const fn from_raw(bits: u64) -> Word {
        Word { bits }
    }

    pub const fn bits(&self) -> u64 {
        self.bits
    }

    pub fn set_bits(&mut self, bits: u64) {
        self.bits = bits;
    }

    /// Construct a properly sign-replicated word from a signed value.
    /// Values outside the 39-bit range are truncated.
    pub fn from_signed(value: i64) -> Word {
        let masked = (value as u64) & BITS_39;
        let sign_copy = (masked << 1) & SIGN_COPY_BIT;
        Word {
            bits: masked | sign_copy,
        }
    }

    /// The signed value of the low 39 bits.
    pub fn signed_value(&self) -> i64 {
        let v = self.bits & BITS_39;
        if v & SIGN_BIT != 0 {
            (v | !BITS_39) as i64
        } else {
            v as i64
        }
    }

    /// True when the low 39 bits are all zero (the machine's Z
    /// condition).
    pub fn is_zero(&self) -> bool {
        self.bits & BITS_39 == 0
    }

    /// True when the sign bit is set (the machine's NEGA condition).
    pub fn is_negative(&self) -> bool {
        self.bits & SIGN_BIT != 0
    }

    /// True when bit 40 is a faithful copy of bit 39.
    pub fn sign_is_replicated(&self) -> bool {
        let sign = self.bits & SIGN_BIT != 0;
        let copy = self.bits & SIGN_COPY_BIT != 0;
        sign == copy
    }
}

impl From<u64> for Word {
    fn from(bits: u64) -> Word {
        Word::from_raw(bits)
    }
}

impl From<Word> for u64 {
    fn from(w: Word) -> u64 {
        w.bits
    }
}

impl Display for Word {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        // Always display as octal, 40 bits wide.
        write!(f, "{:>014o}", self.bits & BITS_40)
    }
}

impl Octal for Word {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        Octal::fmt(&(self.bits & BITS_40), f)
    }
}

impl Debug for Word {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        // A 40-character bit string, as on the engineer's panel.
        let mut bit = 1_u64 << 39;
        while bit != 0 {
            f.write_str(if self.bits & bit != 0 { "1" } else { "0" })?;
            bit >>= 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_signed_positive() {
        let w = Word::from_signed(1);
        assert_eq!(w.bits(), 1);
        assert!(!w.is_negative());
        assert!(w.sign_is_replicated());
    }

    #[test]
    fn test_from_signed_negative() {
        let w = Word::from_signed(-1);
        assert_eq!(w.bits(), BITS_40);
        assert!(w.is_negative());
        assert!(w.sign_is_replicated());
        assert_eq!(w.signed_value(), -1);
    }

    #[test]
    fn test_signed_round_trip_extremes() {
        let max = (1_i64 << 38) - 1;
        let min = -(1_i64 << 38);
        assert_eq!(Word::from_signed(max).signed_value(), max);
        assert_eq!(Word::from_signed(min).signed_value(), min);
    }

    #[test]
    fn test_zero_conditions() {
        assert!(Word::ZERO.is_zero());
        assert!(!Word::ONE.is_zero());
        // A word with only the duplicated sign bit set still reads as
        // zero in the low 39 bits.
        assert!(Word::from_raw(SIGN_COPY_BIT).is_zero());
    }

    #[test]
    fn test_display_octal() {
        assert_eq!(format!("{}", Word::from_signed(-1)), "17777777777777");
        assert_eq!(format!("{}", Word::ONE), "00000000000001");
    }
}
