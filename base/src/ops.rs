//! Arithmetic and logical primitives on 803 words.
//!
//! Each primitive mutates its destination operand in place and, where
//! overflow is possible, returns an overflow indication.  Overflow is
//! detected by comparing bit 40 of the raw result against a fresh
//! copy of the sign bit: the two differ exactly when the 39-bit
//! result has wrapped.
//!
//! The "56-style" 40-bit variants are used only inside the divide
//! algorithm, whose remainder needs a guard bit beyond the normal
//! 39-bit representation; they perform straight masked arithmetic
//! with no sign replication.
//!
//! The separated-mantissa operations work on the intermediate format
//! used during floating-point sequences, in which the sign is
//! duplicated once (bits 39 and 38) and two extra low-order mantissa
//! bits are kept for rounding.  Overflow for these is therefore
//! tested on a different bit.

use crate::word::{
    Word, BITS_38, BITS_39, BITS_40, CARRY_BIT, OVERFLOW_BIT, SIGN_BIT, SIGN_COPY_BIT,
};

/// Mask of the separated-mantissa bits.
const MANTISSA_BITS: u64 = 0xFF_FFFF_FF00;

/// `b = a + b`.
pub fn add(a: Word, b: &mut Word) -> bool {
    let res = a.bits().wrapping_add(b.bits());
    let sign_copy = (res << 1) & SIGN_COPY_BIT;
    let overflow = (res ^ sign_copy) & OVERFLOW_BIT != 0;
    b.set_bits((res & BITS_39) | sign_copy);
    overflow
}

/// `b = b - a`.
pub fn sub(a: Word, b: &mut Word) -> bool {
    let res = b.bits().wrapping_sub(a.bits());
    let sign_copy = (res << 1) & SIGN_COPY_BIT;
    let overflow = (res ^ sign_copy) & OVERFLOW_BIT != 0;
    b.set_bits((res & BITS_39) | sign_copy);
    overflow
}

/// `b = -a`.
pub fn neg(a: Word, b: &mut Word) -> bool {
    let res = a.bits().wrapping_neg();
    let sign_copy = (res << 1) & SIGN_COPY_BIT;
    let overflow = (res ^ sign_copy) & OVERFLOW_BIT != 0;
    b.set_bits((res & BITS_39) | sign_copy);
    overflow
}

/// `b = a - b`.
pub fn neg_add(a: Word, b: &mut Word) -> bool {
    let res = a.bits().wrapping_sub(b.bits());
    let sign_copy = (res << 1) & SIGN_COPY_BIT;
    let overflow = (res ^ sign_copy) & OVERFLOW_BIT != 0;
    b.set_bits((res & BITS_39) | sign_copy);
    overflow
}

/// `b = a & b`.  Collation cannot overflow.
pub fn and(a: Word, b: &mut Word) {
    let res = b.bits() & a.bits();
    let sign_copy = (res << 1) & SIGN_COPY_BIT;
    b.set_bits((res & BITS_39) | sign_copy);
}

/// 40-bit `b = a + b`, no sign replication.
pub fn add56(a: Word, b: &mut Word) {
    let res = a.bits().wrapping_add(b.bits());
    b.set_bits(res & BITS_40);
}

/// 40-bit `b = b - a`, no sign replication.
pub fn sub56(a: Word, b: &mut Word) {
    let res = b.bits().wrapping_sub(a.bits());
    b.set_bits(res & BITS_40);
}

/// Shift the double-length pair (ACC, AR) one place right,
/// propagating the accumulator sign and passing ACC's low bit into
/// the top of the AR.
pub fn signed_shift_right(acc: &mut Word, ar: &mut Word) {
    let mut res = acc.bits();
    if res & 1 != 0 {
        ar.set_bits(ar.bits() | CARRY_BIT);
    }

    if res & SIGN_BIT != 0 {
        res >>= 1;
        res &= BITS_38;
        res |= SIGN_BIT + SIGN_COPY_BIT;
    } else {
        res >>= 1;
        res &= BITS_38;
    }
    acc.set_bits(res);

    let res = (ar.bits() >> 1) & BITS_38;
    ar.set_bits(res);
}

/// Single-length right shift; the sign bit and its copy are cleared.
pub fn unsigned_shift_right(a: &mut Word) {
    a.set_bits((a.bits() >> 1) & BITS_38);
}

/// Shift the multiplier one place left so that its bottom two bits
/// give the add/subtract action code for the next multiply beat.
pub fn double_multiplier(a: &mut Word) {
    a.set_bits((a.bits() << 1) & 0xFF_FFFF_FFFE);
}

/// Transfer the accumulator into the Q register pair for a multiply:
/// QAR takes the magnitude bits, QACC the stretched sign.
pub fn acc_to_q(acc: Word) -> (Word, Word) {
    let qar = Word::from_raw(acc.bits() & BITS_38);
    let qacc = if acc.bits() & SIGN_BIT != 0 {
        Word::from_raw(BITS_40)
    } else {
        Word::ZERO
    };
    (qacc, qar)
}

/// Double-length add: (ACC, AR) += (QACC, QAR), with carry from the
/// AR into the ACC.
pub fn dadd(qacc: Word, qar: Word, acc: &mut Word, ar: &mut Word) -> bool {
    let res = ar.bits().wrapping_add(qar.bits());
    let carry = (res & CARRY_BIT) >> 38;
    ar.set_bits(res & BITS_38);

    let res = acc.bits().wrapping_add(qacc.bits()).wrapping_add(carry);
    let sign_copy = (res << 1) & SIGN_COPY_BIT;
    let overflow = (res ^ sign_copy) & OVERFLOW_BIT != 0;
    acc.set_bits((res & BITS_39) | sign_copy);
    overflow
}

/// Double-length subtract: (ACC, AR) -= (QACC, QAR), with borrow from
/// the AR into the ACC.
pub fn dsub(qacc: Word, qar: Word, acc: &mut Word, ar: &mut Word) -> bool {
    let res = ar.bits().wrapping_sub(qar.bits());
    let borrow = (res & CARRY_BIT) >> 38;
    ar.set_bits(res & BITS_38);

    let res = acc.bits().wrapping_sub(qacc.bits()).wrapping_sub(borrow);
    let sign_copy = (res << 1) & SIGN_COPY_BIT;
    let overflow = (res ^ sign_copy) & OVERFLOW_BIT != 0;
    acc.set_bits((res & BITS_39) | sign_copy);
    overflow
}

/// Shift the double-length pair (ACC, AR) one place left, carrying
/// the AR's top bit into the ACC.
pub fn shift_left(acc: &mut Word, ar: &mut Word) -> bool {
    let res = ar.bits() << 1;
    let carry = (res & CARRY_BIT) >> 38;
    ar.set_bits(res & BITS_38);

    let res = (acc.bits() << 1) | carry;
    let sign_copy = (res << 1) & SIGN_COPY_BIT;
    let overflow = (res ^ sign_copy) & OVERFLOW_BIT != 0;
    acc.set_bits((res & BITS_39) | sign_copy);
    overflow
}

/// 40-bit double-length left shift, no sign replication.
pub fn shift_left56(acc: &mut Word, ar: &mut Word) {
    let res = ar.bits() << 1;
    let carry = (res & CARRY_BIT) >> 38;
    ar.set_bits(res & BITS_38);
    acc.set_bits(((acc.bits() << 1) | carry) & BITS_40);
}

/// The state of the multiplier register after a one-place right
/// shift, used to decide when a multiply sequence has consumed all
/// multiplier bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiplierStep {
    /// Some multiplier bits remain (the shifted value is non-zero).
    pub bits_remain: bool,
    /// The shifted value is all ones (i.e. minus one).
    pub is_minus_one: bool,
}

impl MultiplierStep {
    /// A multiply ends on the beat where the shifted multiplier has
    /// collapsed to zero or minus one.
    pub fn finished(&self) -> bool {
        self.is_minus_one || !self.bits_remain
    }
}

/// Shift the multiplier one place right (sign-replicated) and report
/// its post-shift state.
pub fn shift_multiplier_right(m: &mut Word) -> MultiplierStep {
    let res = m.bits() >> 1;
    let sign_copy = (res << 1) & SIGN_COPY_BIT;
    m.set_bits((res & BITS_39) | sign_copy);

    let res = res & BITS_39;
    MultiplierStep {
        bits_remain: res != 0,
        is_minus_one: res == BITS_39,
    }
}

/// `ACC = AR` (magnitude bits only).
pub fn ar_to_acc(acc: &mut Word, ar: Word) {
    acc.set_bits(ar.bits() & BITS_38);
}

/// Two sequential sign-replicated right shifts of a separated
/// mantissa, returning the number of one-bits shifted out (the input
/// to rounding decisions).  The second shift group continues to
/// update the mantissa exactly as the hardware did.
pub fn mantissa_shift_right(mant: &mut Word, shift_a: u32, shift_b: u32) -> u32 {
    let mut ones = 0;
    let mut res = mant.bits();

    for _ in 0..shift_a {
        ones += (res & 1) as u32;
        res >>= 1;
        let sign_copy = (res << 1) & SIGN_COPY_BIT;
        res = (res & BITS_39) | sign_copy;
    }
    mant.set_bits(res);

    for _ in 0..shift_b {
        ones += (res & 1) as u32;
        res >>= 1;
        let sign_copy = (res << 1) & SIGN_COPY_BIT;
        res = (res & BITS_39) | sign_copy;
    }
    ones
}

/// Separate a packed floating-point word into its 9-bit exponent and
/// its mantissa in the calculation format.
pub fn fp_split(acc: Word) -> (Word, i32) {
    let res = acc.bits();
    let sign_copy = res & SIGN_COPY_BIT;
    let res = ((res >> 1) | sign_copy) & MANTISSA_BITS;
    (Word::from_raw(res), (acc.bits() & 511) as i32)
}

/// Repack a separated mantissa and exponent into a floating-point
/// word.  The inverse of [`fp_split`] for well-formed inputs.
pub fn fp_join(mant: Word, exp: i32) -> Word {
    let mut res = (mant.bits() << 1) & (MANTISSA_BITS - 0x100);
    res |= (exp as i64 as u64) & 0x1FF;
    Word::from_raw(res)
}

/// Separated-mantissa `b = a + b`.  Overflow is tested on the single
/// duplicated sign bit of the mantissa format.
pub fn mantissa_add(a: Word, b: &mut Word) -> bool {
    let res = a.bits().wrapping_add(b.bits());
    let sign_copy = (res << 1) & SIGN_BIT;
    let overflow = (res ^ sign_copy) & SIGN_BIT != 0;
    b.set_bits(res);
    overflow
}

/// Separated-mantissa `b = b - a`.
pub fn mantissa_sub(a: Word, b: &mut Word) -> bool {
    let res = b.bits().wrapping_sub(a.bits());
    let sign_copy = (res << 1) & SIGN_BIT;
    let overflow = (res ^ sign_copy) & SIGN_BIT != 0;
    b.set_bits(res);
    overflow
}

/// Rotate the accumulator left by `count` places (the top bit
/// re-enters at the bottom).
pub fn rotate_left(acc: &mut Word, count: u32) {
    let mut res = acc.bits();
    for _ in 0..count {
        let c = (res & SIGN_BIT) >> 38;
        res <<= 1;
        res = res.wrapping_add(c);
    }
    let sign_copy = (res << 1) & SIGN_COPY_BIT;
    acc.set_bits((res & BITS_39) | sign_copy);
}

/// Direct left shift of the accumulator by `count` places.
pub fn shift_left_by(acc: &mut Word, count: u32) {
    let res = acc.bits() << count;
    let sign_copy = (res << 1) & SIGN_COPY_BIT;
    acc.set_bits((res & BITS_39) | sign_copy);
}

/// Form the link word written to store by function 73.  The half bit
/// is present only in the upper copy of the SCR, as on the real
/// machine.
pub fn scr_to_word(scr: u16) -> Word {
    let scr = scr as u64;
    let mut res = (scr >> 1) & 8191;
    res |= (scr & 16383) << 23;
    Word::from_raw(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_strategy::proptest;

    const MIN_39: i64 = -(1_i64 << 38);
    const MAX_39: i64 = (1_i64 << 38) - 1;

    #[proptest]
    fn add_replicates_sign(
        #[strategy(MIN_39..=MAX_39)] a: i64,
        #[strategy(MIN_39..=MAX_39)] b: i64,
    ) {
        let mut dest = Word::from_signed(b);
        add(Word::from_signed(a), &mut dest);
        prop_assert!(dest.sign_is_replicated());
    }

    #[proptest]
    fn sub_replicates_sign(
        #[strategy(MIN_39..=MAX_39)] a: i64,
        #[strategy(MIN_39..=MAX_39)] b: i64,
    ) {
        let mut dest = Word::from_signed(b);
        sub(Word::from_signed(a), &mut dest);
        prop_assert!(dest.sign_is_replicated());
    }

    #[proptest]
    fn neg_replicates_sign(#[strategy(MIN_39..=MAX_39)] a: i64) {
        let mut dest = Word::ZERO;
        neg(Word::from_signed(a), &mut dest);
        prop_assert!(dest.sign_is_replicated());
    }

    #[proptest]
    fn neg_add_replicates_sign(
        #[strategy(MIN_39..=MAX_39)] a: i64,
        #[strategy(MIN_39..=MAX_39)] b: i64,
    ) {
        let mut dest = Word::from_signed(b);
        neg_add(Word::from_signed(a), &mut dest);
        prop_assert!(dest.sign_is_replicated());
    }

    #[proptest]
    fn add_overflow_matches_true_sum(
        #[strategy(MIN_39..=MAX_39)] a: i64,
        #[strategy(MIN_39..=MAX_39)] b: i64,
    ) {
        let mut dest = Word::from_signed(b);
        let overflow = add(Word::from_signed(a), &mut dest);
        let true_sum = a + b;
        prop_assert_eq!(overflow, !(MIN_39..=MAX_39).contains(&true_sum));
        if !overflow {
            prop_assert_eq!(dest.signed_value(), true_sum);
        }
    }

    #[proptest]
    fn sub_overflow_matches_true_difference(
        #[strategy(MIN_39..=MAX_39)] a: i64,
        #[strategy(MIN_39..=MAX_39)] b: i64,
    ) {
        let mut dest = Word::from_signed(b);
        let overflow = sub(Word::from_signed(a), &mut dest);
        let true_diff = b - a;
        prop_assert_eq!(overflow, !(MIN_39..=MAX_39).contains(&true_diff));
        if !overflow {
            prop_assert_eq!(dest.signed_value(), true_diff);
        }
    }

    #[test]
    fn add_overflow_table() {
        // Known overflow cases at the edges of the representable range.
        let cases: &[(i64, i64, bool)] = &[
            (MAX_39, 1, true),
            (MAX_39, MAX_39, true),
            (MIN_39, -1, true),
            (MIN_39, MIN_39, true),
            (MAX_39, 0, false),
            (MIN_39, 0, false),
            (MAX_39, MIN_39, false),
            (1, -1, false),
        ];
        for &(a, b, expected) in cases {
            let mut dest = Word::from_signed(b);
            let overflow = add(Word::from_signed(a), &mut dest);
            assert_eq!(overflow, expected, "add({a}, {b})");
        }
    }

    #[test]
    fn negating_most_negative_value_overflows() {
        let mut dest = Word::ZERO;
        assert!(neg(Word::from_signed(MIN_39), &mut dest));
    }

    #[test]
    fn and_collates() {
        let mut dest = Word::from_signed(0b1100);
        and(Word::from_signed(0b1010), &mut dest);
        assert_eq!(dest.signed_value(), 0b1000);
        assert!(dest.sign_is_replicated());
    }

    #[proptest]
    fn double_length_shift_round_trip(#[strategy(0_u64..(1 << 37))] ar_bits: u64) {
        // A non-negative double-length value whose upper half is
        // empty survives 39 places left and 39 places back right
        // bit-for-bit, provided its top bit stays below the sign
        // position on the way up (the right shift sign-fills, so a
        // value reaching the sign bit is not restorable).
        let mut acc = Word::ZERO;
        let mut ar = Word::from_raw(ar_bits);
        for _ in 0..39 {
            shift_left(&mut acc, &mut ar);
        }
        for _ in 0..39 {
            signed_shift_right(&mut acc, &mut ar);
        }
        prop_assert_eq!(acc, Word::ZERO);
        prop_assert_eq!(ar.bits(), ar_bits);
    }

    #[proptest]
    fn fp_split_join_round_trip(
        #[strategy(MIN_39..=MAX_39)] value: i64,
        #[strategy(0_i64..512)] exponent: i64,
    ) {
        // Any sign-replicated word with a well-formed exponent field
        // survives separation and rejoining exactly.
        let packed = Word::from_raw(
            (Word::from_signed(value).bits() & !511) | (exponent as u64),
        );
        let (mantissa, exp) = fp_split(packed);
        prop_assert_eq!(exp, exponent as i32);
        prop_assert_eq!(fp_join(mantissa, exp), packed);
    }

    #[test]
    fn mantissa_shift_right_counts_dropped_ones() {
        let mut mant = Word::from_raw(0b1011);
        let ones = mantissa_shift_right(&mut mant, 2, 2);
        assert_eq!(ones, 3);
        assert_eq!(mant.bits(), 0b10);
    }

    #[test]
    fn multiplier_step_termination() {
        let mut m = Word::from_raw(1);
        let step = shift_multiplier_right(&mut m);
        assert!(step.finished());
        assert!(!step.bits_remain);

        let mut m = Word::from_signed(-1);
        let step = shift_multiplier_right(&mut m);
        assert!(step.finished());
        assert!(step.is_minus_one);

        let mut m = Word::from_raw(0b100);
        let step = shift_multiplier_right(&mut m);
        assert!(!step.finished());
    }

    #[test]
    fn rotate_left_wraps_top_bit() {
        let mut acc = Word::from_signed(MIN_39); // only the sign bit set
        rotate_left(&mut acc, 1);
        assert_eq!(acc.bits(), 1);
    }

    #[test]
    fn scr_link_word_layout() {
        // SCR counts half-words; the stored address drops the half
        // bit but the upper copy keeps it.
        let w = scr_to_word(7);
        assert_eq!(w.bits() & 8191, 3);
        assert_eq!((w.bits() >> 23) & 16383, 7);
    }

    #[test]
    fn acc_to_q_stretches_sign() {
        let (qacc, qar) = acc_to_q(Word::from_signed(-2));
        assert_eq!(qacc.bits(), BITS_40);
        assert_eq!(qar.bits(), Word::from_signed(-2).bits() & BITS_38);

        let (qacc, qar) = acc_to_q(Word::from_signed(2));
        assert_eq!(qacc, Word::ZERO);
        assert_eq!(qar.bits(), 2);
    }

    #[test]
    fn dadd_carries_between_halves() {
        // AR full of ones plus one carries into the ACC.
        let mut acc = Word::ZERO;
        let mut ar = Word::from_raw(BITS_38);
        let overflow = dadd(Word::ZERO, Word::from_raw(1), &mut acc, &mut ar);
        assert!(!overflow);
        assert_eq!(acc.bits(), 1);
        assert_eq!(ar, Word::ZERO);
    }
}
