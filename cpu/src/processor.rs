//! The instruction cycle.
//!
//! The 803 alternates fetch and execute beats, one word time each.
//! The R flip-flop selects the beat.  A fetch beat reads the word
//! addressed by IR, picks the first or second instruction according
//! to the bottom bit of the SCR, applies any pending B-modification
//! and decodes the function code.  Jumps (group 4) complete entirely
//! within the fetch beat; every other function toggles R so the next
//! word time executes it.  An execute beat reads the operand word
//! into the store chain, runs the function, writes the chain back,
//! and advances the SCR unless a long function (L) or a busy
//! peripheral wait (B) holds the beat.
//!
//! Store locations 0 to 3 are the wired initial instructions: the
//! fetch path sees them, the execute path reads them as zero and
//! never writes them back.
//!
//! Each word time also yields one stereo sample pair for the console
//! loudspeaker, keyed to bit 5 of the function code: fetch beats
//! sound on one channel, execute beats on both.

mod op_arith;
mod op_float;
mod op_io;
mod op_shift;

use base::prelude::*;

use crate::context::Context;
use crate::registers::Registers;
use crate::store::{CoreStore, FIRST_CORE_ADDRESS};
use crate::wiring::{ControlButtons, PeripheralBus, WordGenerator};

/// Workspace which persists across the beats of a multi-word-time
/// function but is not part of the register file proper.
#[derive(Debug, Default)]
struct Scratch {
    /// Divisor sign word latched at the start of fn56.
    m_sign: Word,
    /// Dividend/result mantissa during floating-point sequences.
    acc_mant: Word,
    /// Accumulated rounding evidence (count of one-bits shifted out).
    round: u32,
    /// Quotient bit being planted this beat of fn64, and its
    /// successor.
    t_bit: Word,
    t_shift_bit: Word,
    first_bit: bool,
    exact: bool,
}

pub struct Processor {
    pub regs: Registers,
    scratch: Scratch,
    volume: i16,
}

impl Default for Processor {
    fn default() -> Processor {
        Processor::new()
    }
}

impl Processor {
    #[must_use]
    pub fn new() -> Processor {
        Processor {
            regs: Registers::new(),
            scratch: Scratch::default(),
            volume: 0x100,
        }
    }

    pub fn set_volume(&mut self, level: u16) {
        self.volume = level as i16;
    }

    /// Emulate one word time.  Returns the loudspeaker sample pair
    /// for this word time.
    pub fn word_time(
        &mut self,
        ctx: &Context,
        store: &mut CoreStore,
        wg: &WordGenerator,
        bus: &mut dyn PeripheralBus,
    ) -> (i16, i16) {
        if self.regs.r {
            self.fetch_beat(store, wg)
        } else {
            self.execute_beat(ctx, store, wg, bus)
        }
    }

    fn fetch_beat(&mut self, store: &mut CoreStore, wg: &WordGenerator) -> (i16, i16) {
        let buttons = wg.buttons;
        let regs = &mut self.regs;

        if buttons.contains_any(ControlButtons::RESET) {
            regs.oflow = false;
        }

        if !regs.s {
            if buttons.contains_any(ControlButtons::CLEAR_STORE) {
                regs.store_chain = Word::ZERO;
                regs.store_ls = 0;
                regs.store_ms = 0;
                regs.m = false;
                let address = regs.ir & 8191;
                if address >= FIRST_CORE_ADDRESS {
                    store.write(address, regs.store_chain);
                }
            } else {
                let word = store.fetch(regs.ir);
                regs.store_chain = word;
                regs.store_ls = (word.bits() & 0xF_FFFF) as u32;
                regs.store_ms = ((word.bits() >> 20) & 0xF_FFFF) as u32;

                if regs.scr & 1 != 0 {
                    // Second instruction of the word.
                    if !regs.m {
                        regs.ir = regs.store_ls;
                        regs.breg = 0;
                    } else {
                        regs.ir = regs.store_ls + regs.breg;
                        regs.breg = 0;
                        regs.m = false;
                    }
                } else {
                    regs.ir = regs.store_ms;
                    regs.breg = regs.store_ls; // Saved for B-modification.
                    regs.m = regs.store_ls & 0x80000 != 0;
                }
            }
        }

        regs.ir_saved = regs.ir;

        if buttons.contains_any(
            ControlButtons::READ | ControlButtons::OBEY | ControlButtons::RESET,
        ) {
            regs.s = true;
        }

        if buttons.contains_any(ControlButtons::SELECTED_STOP)
            && wg.word().bits() & 0o17777 == u64::from((regs.scr >> 1) & 0o17777)
        {
            regs.s = true;
        }

        // A single instruction if the operate bar has been pressed.
        if regs.ss25
            && buttons.contains_any(ControlButtons::NORMAL | ControlButtons::OBEY)
        {
            regs.ss25 = false;
            regs.s = false;
        }

        if regs.ss25 && buttons.contains_any(ControlButtons::READ) {
            regs.n = true;
            regs.m = false;
            regs.ss25 = false;
        }

        if !regs.s {
            let function = (regs.ir >> 13) & 0o77;
            regs.function = function;

            if function & 0o70 == 0o40 {
                // Jumps have no execute beat.
                let taken = match function & 3 {
                    0 => true,
                    1 => regs.nega,
                    2 => regs.z,
                    _ => regs.oflow,
                };
                if taken {
                    regs.scr =
                        (((regs.ir & 8191) << 1) + ((function >> 2) & 1)) as u16;
                    regs.m = false;
                    if function & 3 == 3 {
                        regs.oflow = false;
                    }
                } else {
                    regs.scr = (regs.scr + 1) & 16383;
                }
                regs.ir = u32::from(regs.scr >> 1);
            } else {
                regs.r = !regs.r;
            }

            if function & 0o40 != 0 {
                (0, self.volume)
            } else {
                (0, 0)
            }
        } else {
            // Stopped.
            if regs.n {
                regs.ir = ((wg.word().bits() >> 20) & 0x7_FFFF) as u32;
                regs.n = false;
            }
            (0, 0)
        }
    }

    fn execute_beat(
        &mut self,
        ctx: &Context,
        store: &mut CoreStore,
        wg: &WordGenerator,
        bus: &mut dyn PeripheralBus,
    ) -> (i16, i16) {
        let sample = if self.regs.function & 0o40 != 0 {
            (self.volume, self.volume)
        } else {
            (0, 0)
        };

        let address = self.regs.ir & 8191;
        self.regs.store_chain = if address >= FIRST_CORE_ADDRESS {
            store.fetch(address)
        } else {
            Word::ZERO
        };

        self.dispatch(ctx, wg, bus);

        if address >= FIRST_CORE_ADDRESS {
            store.write(address, self.regs.store_chain);
        }

        let regs = &mut self.regs;
        regs.z = regs.acc.is_zero();
        regs.nega = regs.acc.is_negative();

        if wg
            .buttons
            .contains_any(ControlButtons::RESET | ControlButtons::CLEAR_STORE)
        {
            regs.oflow = false;
            regs.b = false;
            regs.l = false;
        }

        if !(regs.l || regs.b) {
            regs.r = !regs.r;
            regs.scr = (regs.scr + 1) & 16383;
            // When M is up, IR keeps the saved address for the
            // B-modified fetch instead of following the SCR.
            if !regs.m {
                regs.ir = u32::from(regs.scr >> 1);
            }
        }

        sample
    }

    fn dispatch(&mut self, ctx: &Context, wg: &WordGenerator, bus: &mut dyn PeripheralBus) {
        match self.regs.function {
            0o00..=0o37 => self.alu_op(),
            0o40..=0o47 => {} // Jumps complete in the fetch beat.
            0o50 => self.double_shift_right(),
            0o51 => self.single_shift_right(),
            0o52 => self.double_multiply(),
            0o53 => self.single_multiply(),
            0o54 => self.double_shift_left(),
            0o55 => self.single_shift_left(),
            0o56 => self.integer_divide(),
            0o57 => self.ar_to_acc(),
            0o60..=0o62 => self.fp_add_sub(self.regs.function),
            0o63 => self.fp_multiply(),
            0o64 => self.fp_divide(),
            0o65 => self.rotate_or_standardise(),
            0o66 | 0o67 => {} // Process-control options, not fitted.
            0o70 => self.word_generator_to_acc(wg),
            0o71 => self.read_character(ctx, bus),
            0o72 => self.channel_two_transfer(ctx, bus),
            0o73 => self.store_link(),
            0o74 => self.punch_character(ctx, bus),
            0o75 | 0o76 => self.regs.b = true, // Nothing on these channels.
            _ => self.regs.l = true,           // 77: block transfer, never ends.
        }
    }
}
