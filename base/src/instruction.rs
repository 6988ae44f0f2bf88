//! The 803 packs two instructions into each 39-bit word:
//!
//! ```text
//! | F1 (6) | N1 (13) | B (1) | F2 (6) | N2 (13) |
//! ```
//!
//! F is a 6-bit function code (written as two octal digits) and N a
//! 13-bit store address (written in decimal).  The B digit between
//! the two instructions selects B-modification: when set, the word
//! addressed by N1 is added to the second instruction before it is
//! obeyed.  The conventional written form puts `:` for B clear and
//! `/` for B set, e.g. `22 4/16 3`.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::word::Word;

/// One 19-bit instruction: function code and address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instruction {
    bits: u32,
}

impl Instruction {
    /// Pack a function code (two octal digits, 0..=0o77) and a store
    /// address (0..=8191).  Out-of-range bits are discarded.
    pub const fn new(function: u32, address: u32) -> Instruction {
        Instruction {
            bits: ((function & 0o77) << 13) | (address & 8191),
        }
    }

    pub const fn from_bits(bits: u32) -> Instruction {
        Instruction { bits: bits & 0x7_FFFF }
    }

    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// The 6-bit function code.
    pub const fn function(&self) -> u32 {
        (self.bits >> 13) & 0o77
    }

    /// The 13-bit store address.
    pub const fn address(&self) -> u32 {
        self.bits & 8191
    }

    /// The instruction group, i.e. the first octal digit of the
    /// function code.
    pub const fn group(&self) -> u32 {
        (self.bits >> 16) & 7
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{:02o} {:4}", self.function(), self.address())
    }
}

/// A store word viewed as an instruction pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoredPair {
    pub first: Instruction,
    pub b_mod: bool,
    pub second: Instruction,
}

impl StoredPair {
    pub const fn new(first: Instruction, b_mod: bool, second: Instruction) -> StoredPair {
        StoredPair {
            first,
            b_mod,
            second,
        }
    }
}

impl From<Word> for StoredPair {
    fn from(w: Word) -> StoredPair {
        let bits = w.bits();
        StoredPair {
            first: Instruction::from_bits((bits >> 20) as u32),
            b_mod: bits & (1 << 19) != 0,
            second: Instruction::from_bits(bits as u32),
        }
    }
}

impl From<StoredPair> for Word {
    fn from(pair: StoredPair) -> Word {
        let bits = ((pair.first.bits() as u64) << 20)
            | ((pair.b_mod as u64) << 19)
            | pair.second.bits() as u64;
        Word::from_raw(bits)
    }
}

impl Display for StoredPair {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(
            f,
            "{}{}{}",
            self.first,
            if self.b_mod { '/' } else { ':' },
            self.second
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstructionParseError {
    /// No `:` or `/` between the two instructions.
    MissingSeparator,
    /// A function code was not two octal digits.
    BadFunction(String),
    /// An address was not a decimal number below 8192.
    BadAddress(String),
}

impl Display for InstructionParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            InstructionParseError::MissingSeparator => {
                f.write_str("instruction pair has no ':' or '/' separator")
            }
            InstructionParseError::BadFunction(s) => {
                write!(f, "'{s}' is not a two-octal-digit function code")
            }
            InstructionParseError::BadAddress(s) => {
                write!(f, "'{s}' is not a store address in 0..8191")
            }
        }
    }
}

impl std::error::Error for InstructionParseError {}

fn parse_half(s: &str) -> Result<Instruction, InstructionParseError> {
    let s: String = s.chars().filter(|ch| !ch.is_whitespace()).collect();
    if s.len() < 2 {
        return Err(InstructionParseError::BadFunction(s));
    }
    let (fun, addr) = s.split_at(2);
    let function = u32::from_str_radix(fun, 8)
        .map_err(|_| InstructionParseError::BadFunction(fun.to_string()))?;
    let address = if addr.is_empty() {
        0
    } else {
        addr.parse::<u32>()
            .map_err(|_| InstructionParseError::BadAddress(addr.to_string()))?
    };
    if address > 8191 {
        return Err(InstructionParseError::BadAddress(addr.to_string()));
    }
    Ok(Instruction::new(function, address))
}

impl FromStr for StoredPair {
    type Err = InstructionParseError;

    /// Parse the conventional written form, e.g. `26 4:06 0` or the
    /// compact `264:060`.
    fn from_str(s: &str) -> Result<StoredPair, InstructionParseError> {
        let sep = s
            .find([':', '/'])
            .ok_or(InstructionParseError::MissingSeparator)?;
        let b_mod = s.as_bytes()[sep] == b'/';
        Ok(StoredPair {
            first: parse_half(&s[..sep])?,
            b_mod,
            second: parse_half(&s[sep + 1..])?,
        })
    }
}

/// The four hard-wired initial orders, copied into store locations
/// 0..=3 whenever a fresh store is created.  Together they implement
/// the bootstrap loop which reads a tape via function 71 and plants
/// the assembled words in successive locations.
pub fn initial_orders() -> [Word; 4] {
    [
        StoredPair::new(Instruction::new(0o26, 4), false, Instruction::new(0o06, 0)),
        StoredPair::new(Instruction::new(0o22, 4), true, Instruction::new(0o16, 3)),
        StoredPair::new(Instruction::new(0o55, 5), false, Instruction::new(0o71, 0)),
        StoredPair::new(Instruction::new(0o43, 1), false, Instruction::new(0o40, 2)),
    ]
    .map(Word::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_and_unpack() {
        let pair = StoredPair::new(Instruction::new(0o22, 4), true, Instruction::new(0o16, 3));
        let w = Word::from(pair);
        assert_eq!(StoredPair::from(w), pair);
        assert_eq!(pair.first.function(), 0o22);
        assert_eq!(pair.first.address(), 4);
        assert_eq!(pair.first.group(), 2);
        assert!(pair.b_mod);
    }

    #[test]
    fn parse_compact_form() {
        let pair: StoredPair = "264:060".parse().expect("should parse");
        assert_eq!(
            pair,
            StoredPair::new(Instruction::new(0o26, 4), false, Instruction::new(0o06, 0))
        );
    }

    #[test]
    fn parse_written_form() {
        let pair: StoredPair = "22 4/16 3".parse().expect("should parse");
        assert_eq!(
            pair,
            StoredPair::new(Instruction::new(0o22, 4), true, Instruction::new(0o16, 3))
        );
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert_eq!(
            "264060".parse::<StoredPair>(),
            Err(InstructionParseError::MissingSeparator)
        );
        assert!(matches!(
            "99 4:06 0".parse::<StoredPair>(),
            Err(InstructionParseError::BadFunction(_))
        ));
        assert!(matches!(
            "26 9999:06 0".parse::<StoredPair>(),
            Err(InstructionParseError::BadAddress(_))
        ));
    }

    #[test]
    fn display_round_trip() {
        let pair = StoredPair::new(Instruction::new(0o55, 5), false, Instruction::new(0o71, 0));
        assert_eq!(format!("{pair}"), "55    5:71    0");
        assert_eq!(format!("{pair}").parse::<StoredPair>(), Ok(pair));
    }

    #[test]
    fn initial_orders_match_written_form() {
        let expected = ["264:060", "224/163", "555:710", "431:402"]
            .map(|s| Word::from(s.parse::<StoredPair>().expect("should parse")));
        assert_eq!(initial_orders(), expected);
    }
}
