//! Group 7: word generator, peripheral transfers and the SCR link.
//!
//! The transfer orders put the address field on the C lines and wait
//! for ACT from the addressed channel.  While the channel is not
//! ready the B flip-flop holds the execute beat open, so the strobe
//! repeats every word time until the peripheral answers (or the
//! operator resets).

use base::ops;

use crate::context::Context;
use crate::wiring::{BusResponse, ControlButtons, PeripheralBus, WordGenerator};

use super::Processor;

impl Processor {
    /// 70: copy the word generator keys to the accumulator.
    ///
    /// With MANUAL DATA down the order instead lights the wait
    /// indicator and busies until the operate bar is pressed, so the
    /// operator can key a fresh word for each pass of a loop.
    pub(super) fn word_generator_to_acc(&mut self, wg: &WordGenerator) {
        let regs = &mut self.regs;
        let manual = wg.buttons.contains_any(ControlButtons::MANUAL_DATA);
        regs.wi = manual;
        regs.b = manual;
        if (regs.b && regs.ss3) || !regs.b {
            regs.b = false;
            regs.wi = false;
            regs.ss3 = false;
            regs.acc = wg.word();
        }
    }

    /// 71: read one tape row into the bottom of the accumulator.
    pub(super) fn read_character(&mut self, ctx: &Context, bus: &mut dyn PeripheralBus) {
        let c_lines = self.regs.ir & 8191;
        match bus.reader_strobe(ctx, c_lines) {
            BusResponse::Ready { tr_lines } => {
                let bits = self.regs.acc.bits() | u64::from(tr_lines & 0x1F);
                self.regs.acc.set_bits(bits);
                self.regs.b = false;
            }
            BusResponse::NotReady => self.regs.b = true,
        }
    }

    /// 72: transfer on the second output channel.
    pub(super) fn channel_two_transfer(&mut self, ctx: &Context, bus: &mut dyn PeripheralBus) {
        let c_lines = self.regs.ir & 8191;
        match bus.output_strobe(ctx, c_lines) {
            BusResponse::Ready { .. } => self.regs.b = false,
            BusResponse::NotReady => self.regs.b = true,
        }
    }

    /// 73: plant the SCR link word for a subroutine return.
    pub(super) fn store_link(&mut self) {
        self.regs.store_chain = ops::scr_to_word(self.regs.scr);
    }

    /// 74: punch the bottom five bits of the address field.
    pub(super) fn punch_character(&mut self, ctx: &Context, bus: &mut dyn PeripheralBus) {
        let c_lines = self.regs.ir & 8191;
        match bus.punch_strobe(ctx, c_lines) {
            BusResponse::Ready { .. } => self.regs.b = false,
            BusResponse::NotReady => self.regs.b = true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base::prelude::*;

    #[test]
    fn word_generator_copy_is_immediate_without_manual_data() {
        let mut p = Processor::new();
        let mut wg = WordGenerator::new();
        wg.set_n2_row(0o1234);
        p.word_generator_to_acc(&wg);
        assert_eq!(p.regs.acc, wg.word());
        assert!(!p.regs.b);
    }

    #[test]
    fn manual_data_holds_the_order_until_operate() {
        let mut p = Processor::new();
        let mut wg = WordGenerator::new();
        wg.set_n2_row(0o7);
        wg.buttons.insert(ControlButtons::MANUAL_DATA);

        p.word_generator_to_acc(&wg);
        assert!(p.regs.b);
        assert!(p.regs.wi);
        assert_eq!(p.regs.acc, Word::ZERO);

        // The operate bar raises SS3 while the wait indicator is up.
        p.regs.ss3 = true;
        p.word_generator_to_acc(&wg);
        assert!(!p.regs.b);
        assert!(!p.regs.wi);
        assert!(!p.regs.ss3);
        assert_eq!(p.regs.acc, wg.word());
    }
}
