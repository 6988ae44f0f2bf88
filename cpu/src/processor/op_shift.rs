//! Group 5: shifts, integer multiply and divide, and AR transfer.
//!
//! These are the long functions whose word-time count depends on the
//! address field (shifts) or is fixed by the algorithm (multiply and
//! divide).  Each method here runs ONE beat; the L flag holds the
//! execute phase open between beats and the T counter tracks how many
//! remain.  A shift of n places therefore takes the same number of
//! word times as the real machine.

use base::ops;
use base::prelude::*;

use super::Processor;

impl Processor {
    /// 50: double-length arithmetic shift right.
    pub(super) fn double_shift_right(&mut self) {
        let regs = &mut self.regs;
        if !regs.l {
            regs.l = true;
            regs.t = (regs.ir & 127) as i32 - 1;
        }

        let t = regs.t;
        regs.t -= 1;
        if t < 0 {
            regs.l = false;
        } else {
            ops::signed_shift_right(&mut regs.acc, &mut regs.ar);
        }
    }

    /// 51: single-length shift right; the AR is cleared at the end.
    pub(super) fn single_shift_right(&mut self) {
        let regs = &mut self.regs;
        if !regs.l {
            regs.l = true;
            regs.t = (regs.ir & 127) as i32 - 1;
        }

        let t = regs.t;
        regs.t -= 1;
        if t < 0 {
            regs.l = false;
            regs.ar = Word::ZERO;
        } else {
            ops::unsigned_shift_right(&mut regs.acc);
        }
    }

    /// 52: double-length multiply.
    pub(super) fn double_multiply(&mut self) {
        let regs = &mut self.regs;
        if !regs.l {
            regs.l = true;
            regs.mreg = regs.store_chain;
            // One place left so the bottom two multiplier bits give
            // the add/subtract action for each beat.
            ops::double_multiplier(&mut regs.mreg);
            let (qacc, qar) = ops::acc_to_q(regs.acc);
            regs.qacc = qacc;
            regs.qar = qar;
            regs.acc = Word::ZERO;
            regs.ar = Word::ZERO;
            return;
        }

        match regs.mreg.bits() & 3 {
            1 => regs.oflow |= ops::dadd(regs.qacc, regs.qar, &mut regs.acc, &mut regs.ar),
            2 => regs.oflow |= ops::dsub(regs.qacc, regs.qar, &mut regs.acc, &mut regs.ar),
            _ => {}
        }

        ops::shift_left(&mut regs.qacc, &mut regs.qar);
        if ops::shift_multiplier_right(&mut regs.mreg).finished() {
            regs.l = false;
        }
    }

    /// 53: single-length multiply, with an extra beat which rounds
    /// the upper half and clears the AR.
    pub(super) fn single_multiply(&mut self) {
        let regs = &mut self.regs;
        if !regs.l {
            regs.l = true;
            regs.mreg = regs.store_chain;
            ops::double_multiplier(&mut regs.mreg);
            let (qacc, qar) = ops::acc_to_q(regs.acc);
            regs.qacc = qacc;
            regs.qar = qar;
            regs.acc = Word::ZERO;
            regs.ar = Word::ZERO;
            return;
        }

        if regs.lw {
            regs.l = false;
            regs.lw = false;
            regs.oflow |= ops::dadd(Word::ZERO, Word::AR_MSB, &mut regs.acc, &mut regs.ar);
            regs.ar = Word::ZERO;
        } else {
            match regs.mreg.bits() & 3 {
                1 => {
                    regs.oflow |=
                        ops::dadd(regs.qacc, regs.qar, &mut regs.acc, &mut regs.ar);
                }
                2 => {
                    regs.oflow |=
                        ops::dsub(regs.qacc, regs.qar, &mut regs.acc, &mut regs.ar);
                }
                _ => {}
            }

            ops::shift_left(&mut regs.qacc, &mut regs.qar);
            if ops::shift_multiplier_right(&mut regs.mreg).finished() {
                regs.lw = true;
            }
        }
    }

    /// 54: double-length arithmetic shift left.
    pub(super) fn double_shift_left(&mut self) {
        let regs = &mut self.regs;
        if !regs.l {
            regs.l = true;
            regs.t = (regs.ir & 127) as i32 - 1;
        }

        // A zero-place shift makes the first and last beats the same
        // word time.
        let t = regs.t;
        regs.t -= 1;
        if t < 0 {
            regs.l = false;
        } else {
            regs.oflow |= ops::shift_left(&mut regs.acc, &mut regs.ar);
        }
    }

    /// 55: single-length shift left.
    pub(super) fn single_shift_left(&mut self) {
        let regs = &mut self.regs;
        if !regs.l {
            regs.l = true;
            regs.t = (regs.ir & 127) as i32 - 1;
            // The hardware clears the AR during the last word time;
            // clearing it up front instead lets the plain
            // double-length shift do the work.
            regs.ar = Word::ZERO;
        }

        let t = regs.t;
        regs.t -= 1;
        if t < 0 {
            regs.l = false;
            regs.ar = Word::ZERO;
        } else {
            regs.oflow |= ops::shift_left(&mut regs.acc, &mut regs.ar);
        }
    }

    /// 56: double-length divide, single-length quotient.
    ///
    /// The remainder needs a guard bit beyond the 39-bit word, so the
    /// divisor and the running remainder carry two duplicated sign
    /// bits and the 40-bit add and subtract are used throughout.
    pub(super) fn integer_divide(&mut self) {
        let regs = &mut self.regs;
        if !regs.l {
            regs.l = true;
            regs.mreg = regs.store_chain;

            let extend = |w: &mut Word| {
                let sign = w.bits() & SIGN_BIT;
                let magnitude = w.bits() & BITS_39;
                w.set_bits(magnitude | (sign * 6));
            };
            extend(&mut regs.mreg);
            extend(&mut regs.acc);

            self.scratch.m_sign = regs.mreg;
            regs.t = 40;
            regs.qar = Word::ZERO;
            regs.qacc = Word::ZERO;
            return;
        }

        let mut acc_sign = Word::ZERO;
        let entry_t = regs.t;
        regs.t -= 1;

        if entry_t != 0 {
            let t = regs.t;
            if t == 39 {
                acc_sign = regs.acc;
            }

            ops::shift_left(&mut regs.qacc, &mut regs.qar);
            if (regs.acc.bits() ^ self.scratch.m_sign.bits()) & SIGN_COPY_BIT != 0 {
                ops::add56(regs.mreg, &mut regs.acc);
            } else {
                ops::sub56(regs.mreg, &mut regs.acc);
                if t != 39 {
                    regs.qacc.set_bits(regs.qacc.bits() | 1);
                }
            }

            if t == 39 && (regs.acc.bits() ^ acc_sign.bits()) & SIGN_COPY_BIT == 0 {
                regs.oflow = true;
            }
            ops::shift_left56(&mut regs.acc, &mut regs.ar);
        } else {
            regs.acc = regs.qacc;
            regs.ar = Word::ZERO;
            regs.l = false;
        }
    }

    /// 57: ACC = AR.  Not a long function, so the AR is kept.
    pub(super) fn ar_to_acc(&mut self) {
        ops::ar_to_acc(&mut self.regs.acc, self.regs.ar);
    }
}
