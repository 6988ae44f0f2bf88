//! Group 6: floating point.
//!
//! A packed floating-point word is a signed 30-bit mantissa over a
//! 9-bit excess-256 exponent.  The sequences below work on the
//! separated form (sign duplicated once, two extra low mantissa bits
//! kept for rounding evidence) and repack at the end.
//!
//! On the real machine the standardising shift of a group 6 function
//! runs on into the next instruction's beats; here everything
//! completes before L is dropped, so the word-time counts are the
//! nominal ones.
//!
//! Exponent overflow stops the machine and raises FPO; underflow
//! quietly produces zero.

use base::ops;
use base::prelude::*;

use super::Processor;

impl Processor {
    /// 60, 61, 62: add, subtract and reverse subtract.  Two beats:
    /// the arithmetic happens in the first, the second clears the AR.
    pub(super) fn fp_add_sub(&mut self, function: u32) {
        let regs = &mut self.regs;
        if regs.l {
            // Second word time.
            regs.l = false;
            regs.ar = Word::ZERO;
            return;
        }
        regs.l = true;

        let mut round = 0;
        // Reverse subtract just swaps the inputs.
        let (augend, addend) = if function != 0o62 {
            (regs.acc, regs.store_chain)
        } else {
            (regs.store_chain, regs.acc)
        };
        let (mut acc_mant, mut acc_exp) = ops::fp_split(augend);
        let (mut store_mant, store_exp) = ops::fp_split(addend);

        // Align the smaller operand to the larger exponent.  A
        // difference of 32 or more shifts everything out; the 5-bit
        // shift counter plus the NED16 signals reproduce the
        // hardware's clamping.
        let diff = acc_exp - store_exp;
        let negdiff = store_exp - acc_exp;
        let ned = diff < 0;
        let mut ned16 = false;
        let mut nedbar16 = false;
        let mut right_shift = 0;
        if diff & 0x1E0 != 0 {
            ned16 = true;
            right_shift = 32 - (diff & 0x1F);
        }
        if negdiff & 0x1E0 != 0 {
            nedbar16 = true;
            right_shift = 32 - (negdiff & 0x1F);
        }
        if ned16 && nedbar16 {
            right_shift = 32;
        }

        let mut vd_in = if ned {
            acc_exp = store_exp;
            acc_mant
        } else {
            store_mant
        };
        // Add keeps one extra significant bit, so the bottom seven
        // count as rounding evidence.
        if right_shift != 0 {
            round |= ops::mantissa_shift_right(&mut vd_in, right_shift as u32, 7);
        }
        if ned {
            acc_mant = vd_in;
        } else {
            store_mant = vd_in;
        }

        let overflowed = if function == 0o60 {
            ops::mantissa_add(store_mant, &mut acc_mant)
        } else {
            ops::mantissa_sub(store_mant, &mut acc_mant)
        };

        let mut left_shift = 0;
        if overflowed {
            // One place too big; shift down and bump the exponent.
            round |= ops::mantissa_shift_right(&mut acc_mant, 1, 7);
            acc_exp += 1;
        } else {
            let mut probe = acc_mant;
            if ops::mantissa_shift_right(&mut probe, 31, 7) == 0 {
                acc_exp = 0;
                acc_mant = Word::ZERO;
            } else {
                // Standardise: double until the top bit overflows,
                // then step back one.
                let mut kept;
                loop {
                    kept = acc_mant;
                    let o = ops::mantissa_add(kept, &mut acc_mant);
                    left_shift += 1;
                    if o {
                        break;
                    }
                }
                left_shift -= 1;
                acc_mant = kept;
            }
        }

        acc_exp -= left_shift;
        if acc_exp < 0 {
            acc_exp = 0;
            acc_mant = Word::ZERO;
        }
        if acc_exp > 511 {
            regs.s = true;
            regs.fpo = true;
        }

        if acc_mant.bits() & 0x80 != 0 {
            round = 1;
        }
        if round != 0 {
            acc_mant.set_bits(acc_mant.bits() | 0x100);
        }

        regs.acc = ops::fp_join(acc_mant, acc_exp);
    }

    /// 63: multiply.  Sixteen beats, consuming the multiplier
    /// mantissa two bits per beat through a three-bit action window.
    pub(super) fn fp_multiply(&mut self) {
        let regs = &mut self.regs;
        let scratch = &mut self.scratch;

        if !regs.l {
            regs.l = true;
            regs.t = 16;
            scratch.round = 0;

            let (mant, acc_exp) = ops::fp_split(regs.acc);
            scratch.acc_mant = mant;
            let (multiplier, store_exp) = ops::fp_split(regs.store_chain);
            regs.mreg = multiplier;
            regs.exp_reg = acc_exp + store_exp;
            regs.mant_reg = Word::ZERO;
        }

        let action = (regs.mreg.bits() >> 7) & 0x7;

        // The running product keeps two extra bits below the
        // separated-mantissa format.
        scratch.round += ops::mantissa_shift_right(&mut regs.mant_reg, 2, 6);
        match action {
            1 | 2 => {
                ops::mantissa_add(scratch.acc_mant, &mut regs.mant_reg);
            }
            3 => {
                ops::mantissa_add(scratch.acc_mant, &mut regs.mant_reg);
                ops::mantissa_add(scratch.acc_mant, &mut regs.mant_reg);
            }
            4 => {
                ops::mantissa_sub(scratch.acc_mant, &mut regs.mant_reg);
                ops::mantissa_sub(scratch.acc_mant, &mut regs.mant_reg);
            }
            5 | 6 => {
                ops::mantissa_sub(scratch.acc_mant, &mut regs.mant_reg);
            }
            _ => {}
        }
        ops::mantissa_shift_right(&mut regs.mreg, 2, 1);

        regs.t -= 1;
        if regs.t == 1 {
            // The beat where "end" is set.
            regs.mreg = Word::ZERO;
        }
        if regs.t == 0 {
            // Standardise, round and repack in the final beat.
            regs.l = false;
            let mut probe = regs.mant_reg;
            if ops::mantissa_shift_right(&mut probe, 31, 7) == 0 {
                // A zero product must clear the result registers too,
                // or multiply by zero does not give zero.
                scratch.acc_mant = Word::ZERO;
                regs.exp_reg = 0;
                regs.mant_reg = Word::ZERO;
            } else {
                let mut left_shift = 0;
                let mut kept;
                loop {
                    kept = regs.mant_reg;
                    let o = ops::mantissa_add(kept, &mut regs.mant_reg);
                    left_shift += 1;
                    if o {
                        break;
                    }
                }
                left_shift -= 1;
                regs.mant_reg = kept;
                regs.exp_reg -= 255 + left_shift;

                if regs.exp_reg < 0 {
                    regs.exp_reg = 0;
                    regs.mant_reg = Word::ZERO;
                    scratch.round = 0;
                }
                if regs.exp_reg > 511 {
                    regs.s = true;
                    regs.fpo = true;
                }

                let mut probe = regs.mant_reg;
                scratch.round |= ops::mantissa_shift_right(&mut probe, 2, 6);
                if scratch.round != 0 {
                    let bits = regs.mant_reg.bits();
                    regs.mant_reg.set_bits(bits | 0x100);
                }
            }

            regs.acc = ops::fp_join(regs.mant_reg, regs.exp_reg);
            regs.ar = Word::ZERO;
        }
    }

    /// 64: divide.  Non-restoring, one quotient bit per beat, up to
    /// 32 beats; an exact division ends early.
    pub(super) fn fp_divide(&mut self) {
        let regs = &mut self.regs;
        let scratch = &mut self.scratch;

        if !regs.l {
            regs.l = true;
            regs.t = 0;
            scratch.t_bit = Word::ZERO; // Skip the first answer bit.
            scratch.t_shift_bit = Word::from_raw(0x10_0000_0000);
            scratch.first_bit = true;
            scratch.exact = false;

            let (divisor, store_exp) = ops::fp_split(regs.store_chain);
            regs.mreg = divisor;
            let (dividend, acc_exp) = ops::fp_split(regs.acc);
            scratch.acc_mant = dividend;

            regs.exp_reg = acc_exp - store_exp;
            regs.mant_reg = Word::ZERO; // The quotient forms here.
            regs.qacc = Word::ZERO;

            ops::mantissa_shift_right(&mut scratch.acc_mant, 1, 1);

            if regs.store_chain.bits() & BITS_40 == 0 {
                regs.s = true;
                regs.fpo = true;
            }
            return;
        }

        let same_sign =
            (scratch.acc_mant.bits() ^ regs.mreg.bits()) & SIGN_COPY_BIT == 0;
        let mut remainder_zero = scratch.acc_mant.bits() & BITS_40 == 0;
        if remainder_zero {
            scratch.exact = true;
        }

        if remainder_zero || same_sign {
            ops::mantissa_sub(regs.mreg, &mut scratch.acc_mant);
            ops::mantissa_add(scratch.t_bit, &mut regs.mant_reg);
        } else {
            ops::mantissa_add(regs.mreg, &mut scratch.acc_mant);
        }
        let doubled = scratch.acc_mant;
        ops::mantissa_add(doubled, &mut scratch.acc_mant);

        if scratch.first_bit {
            scratch.t_bit = Word::from_raw(0xE0_0000_0000);
            scratch.first_bit = false;
        } else {
            scratch.t_bit = scratch.t_shift_bit;
            ops::mantissa_shift_right(&mut scratch.t_shift_bit, 1, 1);
        }

        regs.t += 1;
        if regs.t == 32 || remainder_zero {
            regs.l = false;

            remainder_zero = regs.mant_reg.bits() & BITS_40 == 0;
            if remainder_zero {
                regs.exp_reg = 0;
                scratch.exact = true;
            } else {
                let mut left_shift = 0;
                let mut kept;
                loop {
                    kept = regs.mant_reg;
                    let o = ops::mantissa_add(kept, &mut regs.mant_reg);
                    if o {
                        break;
                    }
                    left_shift += 1;
                }
                regs.mant_reg = kept;
                regs.exp_reg += 257 - left_shift;
            }

            if !scratch.exact {
                let bits = regs.mant_reg.bits();
                regs.mant_reg.set_bits(bits | 0x100);
            }
            if regs.exp_reg < 0 {
                regs.exp_reg = 0;
                regs.mant_reg = Word::ZERO;
            }
            if regs.exp_reg > 511 {
                regs.s = true;
                regs.fpo = true;
            }
            regs.acc = ops::fp_join(regs.mant_reg, regs.exp_reg);
            regs.ar = Word::ZERO;
        }
    }

    /// 65: fast rotate left for addresses below 4096, floating-point
    /// standardise at and above.
    pub(super) fn rotate_or_standardise(&mut self) {
        let regs = &mut self.regs;

        if (regs.ir & 8191) < 4096 {
            let count = regs.ir & 63;
            if count == 0 {
                return;
            }
            if count <= 39 {
                ops::rotate_left(&mut regs.acc, count);
            } else {
                ops::shift_left_by(&mut regs.acc, count - 39);
            }
        } else {
            regs.ar = Word::ZERO;

            if regs.acc.bits() & BITS_40 == 0 {
                return;
            }

            let mut exp = 256 + 38;
            let mut kept;
            loop {
                kept = regs.acc;
                if ops::shift_left(&mut regs.acc, &mut regs.ar) {
                    break;
                }
                exp -= 1;
            }
            regs.acc = kept;

            let mut bits = regs.acc.bits();
            if bits & 511 != 0 {
                bits |= 512;
            }
            bits &= !511;
            bits |= (exp as u64) & 511;
            regs.acc.set_bits(bits);
        }
    }
}
