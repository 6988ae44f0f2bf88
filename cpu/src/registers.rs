//! The 803 register file and control flags.
//!
//! Everything here is per-machine state; two `Registers` values are
//! two independent machines.  The field names follow the engineering
//! documentation: ACC and AR for the double-length accumulator pair,
//! MREG for the multiplier, SCR for the sequence control register
//! (which counts half words, so its bottom bit selects the first or
//! second instruction of a word), IR for the instruction register.
//!
//! IR is wider than an instruction: B-modification adds a full store
//! word's bottom half to it, and the overflowed function-code bits
//! are part of the machine's observable behaviour.

use serde::{Deserialize, Serialize};

use base::prelude::*;

/// What the machine is doing, as far as an observer of the control
/// flags can tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineStatus {
    /// The S flip-flop is up; no instructions are being fetched.
    Stopped,
    /// The busy flip-flop is up; the current instruction is stalled
    /// waiting for a peripheral to report ready.
    AwaitingPeripheral,
    /// A long function (shift, multiply, divide, floating point) is
    /// part way through its word times.
    LongFunction,
    Running,
}

/// The register file plus the control flip-flops.
#[derive(Debug, Default)]
pub struct Registers {
    /// The accumulator.
    pub acc: Word,
    /// Auxiliary register, the lower half in double-length working.
    pub ar: Word,
    /// The multiplier register.
    pub mreg: Word,
    /// Data on its way from and back to the store.
    pub store_chain: Word,
    /// Q register pair used by double-length multiply and divide.
    pub qacc: Word,
    pub qar: Word,
    /// Separated mantissa during floating-point sequences.
    pub mant_reg: Word,
    /// Exponent during floating-point sequences.
    pub exp_reg: i32,
    /// Beats remaining in a multi-word-time function.
    pub t: i32,

    /// The instruction register, raw.
    pub ir: u32,
    /// IR as it stood at the end of the last fetch beat.
    pub ir_saved: u32,
    /// Function code latched at fetch and used through the execute
    /// beats.
    pub function: u32,
    /// Saved bottom half of the fetched word, for B-modification.
    pub breg: u32,
    /// Sequence control register, counting half words.
    pub scr: u16,
    /// Top and bottom 20-bit halves of the last fetched word.
    pub store_ms: u32,
    pub store_ls: u32,

    /// Stop flip-flop.
    pub s: bool,
    /// Operate-bar single-shot: armed by pressing operate while
    /// stopped, consumed at the next fetch beat.
    pub ss25: bool,
    /// Single-shot which releases a manual-data wait (function 70).
    pub ss3: bool,
    /// Waiting for manual input.
    pub wi: bool,
    /// Beat selector: up for fetch, down for execute.
    pub r: bool,
    /// Floating-point overflow.
    pub fpo: bool,
    /// Integer overflow.
    pub oflow: bool,
    pub parity: bool,
    /// Long function in progress; suppresses the beat toggle.
    pub l: bool,
    /// Last word time of some long functions.
    pub lw: bool,
    /// Busy; the instruction repeats until a peripheral is ready.
    pub b: bool,
    /// B-modification pending for the next second-instruction fetch.
    pub m: bool,
    /// Read button consumed; load IR from the word generator.
    pub n: bool,
    /// Accumulator sign condition, sampled at the end of execute.
    pub nega: bool,
    /// Accumulator zero condition.
    pub z: bool,
}

impl Registers {
    #[must_use]
    pub fn new() -> Registers {
        Registers {
            r: true,
            ..Registers::default()
        }
    }

    pub fn status(&self) -> MachineStatus {
        if self.s {
            MachineStatus::Stopped
        } else if self.b {
            MachineStatus::AwaitingPeripheral
        } else if self.l {
            MachineStatus::LongFunction
        } else {
            MachineStatus::Running
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_precedence() {
        let mut regs = Registers::new();
        regs.s = true;
        regs.b = true;
        assert_eq!(regs.status(), MachineStatus::Stopped);
        regs.s = false;
        assert_eq!(regs.status(), MachineStatus::AwaitingPeripheral);
        regs.b = false;
        regs.l = true;
        assert_eq!(regs.status(), MachineStatus::LongFunction);
        regs.l = false;
        assert_eq!(regs.status(), MachineStatus::Running);
    }
}
