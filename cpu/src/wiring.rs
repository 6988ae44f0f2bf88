//! The console and peripheral surfaces of the machine.
//!
//! The operator's console is the word generator: four rows of
//! buttons making up a 39-bit word, plus the control buttons (read /
//! normal / obey selection, reset, clear store, selected stop, manual
//! data) and the operate bar.  Console changes arrive as
//! [`ConsoleEvent`]s on a queue which the driver drains once per
//! emulation period, so a UI thread can post them without touching
//! machine state.
//!
//! Peripheral transfers (group 7 orders) go through the
//! [`PeripheralBus`] trait.  On the hardware these are a conversation
//! over several named wires (the function strobe, the channel-select
//! lines, READY, ACT and the reader lines); here each strobe is one
//! call which returns either not-ready, leaving the processor busy,
//! or ready along with the reader line levels at ACT time.

use serde::{Deserialize, Serialize};

use crate::context::Context;
use base::prelude::*;

/// Control button lines, one bit per button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlButtons(u32);

impl ControlButtons {
    pub const OPERATE: ControlButtons = ControlButtons(1 << 0);
    pub const READ: ControlButtons = ControlButtons(1 << 1);
    pub const NORMAL: ControlButtons = ControlButtons(1 << 2);
    pub const OBEY: ControlButtons = ControlButtons(1 << 3);
    pub const SELECTED_STOP: ControlButtons = ControlButtons(1 << 4);
    pub const RESET: ControlButtons = ControlButtons(1 << 5);
    pub const MANUAL_DATA: ControlButtons = ControlButtons(1 << 6);
    pub const CLEAR_STORE: ControlButtons = ControlButtons(1 << 7);

    pub const fn empty() -> ControlButtons {
        ControlButtons(0)
    }

    pub fn contains_any(self, other: ControlButtons) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: ControlButtons) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: ControlButtons) {
        self.0 &= !other.0;
    }

    pub fn set(&mut self, other: ControlButtons, level: bool) {
        if level {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }
}

impl std::ops::BitOr for ControlButtons {
    type Output = ControlButtons;
    fn bitor(self, rhs: ControlButtons) -> ControlButtons {
        ControlButtons(self.0 | rhs.0)
    }
}

/// Which of the three mutually exclusive mode buttons is latched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModeButton {
    Read,
    Normal,
    Obey,
}

/// The word generator and control buttons, latched between console
/// events.
#[derive(Debug, Default)]
pub struct WordGenerator {
    word: Word,
    pub buttons: ControlButtons,
    /// Edge-triggered: set when the operate bar goes down, consumed
    /// once per emulation period.
    pub operate_pressed: bool,
}

impl WordGenerator {
    #[must_use]
    pub fn new() -> WordGenerator {
        WordGenerator::default()
    }

    pub fn word(&self) -> Word {
        self.word
    }

    // The row setters replace their own field of the word and leave
    // the rest alone.  The N1 row includes the B digit.

    pub fn set_f1_row(&mut self, value: u32) {
        let bits = u64::from(value);
        let mut w = self.word.bits();
        w &= 0o0077777777777;
        w |= 0o7700000000000 & (bits << 33);
        self.word.set_bits(w);
    }

    pub fn set_n1_row(&mut self, value: u32) {
        let bits = u64::from(value);
        let mut w = self.word.bits();
        w &= 0o7700001777777;
        w |= 0o0077776000000 & (bits << 19);
        self.word.set_bits(w);
    }

    pub fn set_f2_row(&mut self, value: u32) {
        let bits = u64::from(value);
        let mut w = self.word.bits();
        w &= 0o7777776017777;
        w |= 0o0000001760000 & (bits << 13);
        self.word.set_bits(w);
    }

    pub fn set_n2_row(&mut self, value: u32) {
        let bits = u64::from(value);
        let mut w = self.word.bits();
        w &= 0o7777777760000;
        w |= 0o0000000017777 & bits;
        self.word.set_bits(w);
    }

    /// Latch one of read/normal/obey, releasing the other two.
    pub fn select_mode(&mut self, mode: ModeButton) {
        self.buttons
            .remove(ControlButtons::READ | ControlButtons::NORMAL | ControlButtons::OBEY);
        self.buttons.insert(match mode {
            ModeButton::Read => ControlButtons::READ,
            ModeButton::Normal => ControlButtons::NORMAL,
            ModeButton::Obey => ControlButtons::OBEY,
        });
    }
}

/// A state change at the operator's console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsoleEvent {
    PowerOn,
    PowerOff,
    SetF1Row(u32),
    SetN1Row(u32),
    SetF2Row(u32),
    SetN2Row(u32),
    SelectMode(ModeButton),
    SetManualData(bool),
    SetReset(bool),
    SetClearStore(bool),
    SetSelectedStop(bool),
    Operate,
    SetVolume(u16),
}

/// One console lamp, reported at the end of an update period.  Lamp
/// ids 1 to 6 are PARITY, L, BUSY, FPO, STOP and OFLOW; lamp 7
/// reports the period length, for brightness normalisation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LampsEvent {
    pub lamp_id: u32,
    pub on: bool,
    pub brightness: f32,
}

/// Outbound events from the core to whatever is displaying it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OutputEvent {
    Lamps(LampsEvent),
    /// The machine was powered on or off; redraw everything.
    UpdateDisplays,
}

/// A peripheral's answer to a group 7 strobe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusResponse {
    /// Keep the busy flip-flop up; the order repeats next word time.
    NotReady,
    /// Complete the transfer.  `tr_lines` carries the reader line
    /// levels; output strobes leave it zero.
    Ready { tr_lines: u8 },
}

/// The group 7 transfer conversation.  `c_lines` carries the address
/// field of the order, which selects the channel (and, for output
/// orders, carries the data in its bottom five bits).
pub trait PeripheralBus {
    /// Function 71: read one character from the selected reader.
    fn reader_strobe(&mut self, ctx: &Context, c_lines: u32) -> BusResponse;

    /// Function 72: transfer to channel 2 (plotter and the like).
    /// Nothing is connected there by default, so the order stalls,
    /// exactly as on a machine with no device on the channel.
    fn output_strobe(&mut self, _ctx: &Context, _c_lines: u32) -> BusResponse {
        BusResponse::NotReady
    }

    /// Function 74: transfer to the punch or teleprinter channel.
    fn punch_strobe(&mut self, ctx: &Context, c_lines: u32) -> BusResponse;
}

/// A bus with nothing plugged in; every transfer order stalls.
#[derive(Debug, Default)]
pub struct UnconnectedBus;

impl PeripheralBus for UnconnectedBus {
    fn reader_strobe(&mut self, _ctx: &Context, _c_lines: u32) -> BusResponse {
        BusResponse::NotReady
    }

    fn punch_strobe(&mut self, _ctx: &Context, _c_lines: u32) -> BusResponse {
        BusResponse::NotReady
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_assemble_a_word() {
        let mut wg = WordGenerator::new();
        wg.set_f1_row(0o26);
        wg.set_n1_row(4 << 1); // N1 row value includes the B digit below it.
        wg.set_f2_row(0o06);
        wg.set_n2_row(0);
        let expected: Word = "26 4:06 0".parse::<StoredPair>().expect("parses").into();
        assert_eq!(wg.word(), expected);
    }

    #[test]
    fn n1_row_carries_the_b_digit() {
        let mut wg = WordGenerator::new();
        wg.set_n1_row((4 << 1) | 1);
        assert_eq!(wg.word().bits() & (1 << 19), 1 << 19);
        assert_eq!((wg.word().bits() >> 20) & 0o17777, 4);
    }

    #[test]
    fn row_setters_do_not_disturb_other_rows() {
        let mut wg = WordGenerator::new();
        wg.set_n2_row(0o17777);
        wg.set_f1_row(0o77);
        wg.set_f1_row(0o11);
        assert_eq!(wg.word().bits() & 0o17777, 0o17777);
        assert_eq!((wg.word().bits() >> 33) & 0o77, 0o11);
    }

    #[test]
    fn mode_buttons_are_exclusive() {
        let mut wg = WordGenerator::new();
        wg.select_mode(ModeButton::Read);
        wg.select_mode(ModeButton::Normal);
        assert!(!wg.buttons.contains_any(ControlButtons::READ));
        assert!(wg.buttons.contains_any(ControlButtons::NORMAL));
    }
}
