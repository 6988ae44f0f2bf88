//! Groups 0 to 3: the 32 arithmetic and store-transfer permutations.
//!
//! The second octal digit selects the operation and the first selects
//! where the results go: group 0 leaves the store word alone, group 1
//! writes the old accumulator back to store, group 2 leaves the
//! accumulator alone and operates on the store word, group 3 loads
//! the accumulator from store and operates on the store word.
//!
//! Each arm is written out separately because the hardware's quirks
//! live in the details: 15 discards its overflow, and 31 negates the
//! store word it has just copied rather than the old accumulator.

use base::ops;
use base::prelude::*;

use super::Processor;

impl Processor {
    pub(super) fn alu_op(&mut self) {
        let regs = &mut self.regs;
        match regs.function {
            // a' = a, n' = n
            0o00 => {}
            0o01 => {
                let a = regs.acc;
                regs.oflow |= ops::neg(a, &mut regs.acc);
            }
            0o02 => {
                regs.acc = regs.store_chain;
                regs.oflow |= ops::add(Word::ONE, &mut regs.acc);
            }
            0o03 => ops::and(regs.store_chain, &mut regs.acc),
            0o04 => regs.oflow |= ops::add(regs.store_chain, &mut regs.acc),
            0o05 => regs.oflow |= ops::sub(regs.store_chain, &mut regs.acc),
            0o06 => regs.acc = Word::ZERO,
            0o07 => regs.oflow |= ops::neg_add(regs.store_chain, &mut regs.acc),

            // n' = a
            0o10 => std::mem::swap(&mut regs.acc, &mut regs.store_chain),
            0o11 => {
                let a = regs.acc;
                regs.oflow |= ops::neg(regs.store_chain, &mut regs.acc);
                regs.store_chain = a;
            }
            0o12 => {
                std::mem::swap(&mut regs.acc, &mut regs.store_chain);
                regs.oflow |= ops::add(Word::ONE, &mut regs.acc);
            }
            0o13 => {
                std::mem::swap(&mut regs.acc, &mut regs.store_chain);
                ops::and(regs.store_chain, &mut regs.acc);
            }
            0o14 => {
                std::mem::swap(&mut regs.acc, &mut regs.store_chain);
                regs.oflow |= ops::add(regs.store_chain, &mut regs.acc);
            }
            0o15 => {
                // Overflow is not recorded for 15.
                let n = regs.store_chain;
                regs.store_chain = regs.acc;
                ops::sub(n, &mut regs.acc);
            }
            0o16 => {
                regs.store_chain = regs.acc;
                regs.acc = Word::ZERO;
            }
            0o17 => {
                let n = regs.store_chain;
                regs.store_chain = regs.acc;
                regs.oflow |= ops::neg_add(n, &mut regs.acc);
            }

            // a' = a
            0o20 => regs.store_chain = regs.acc,
            0o21 => regs.oflow |= ops::neg(regs.acc, &mut regs.store_chain),
            0o22 => regs.oflow |= ops::add(Word::ONE, &mut regs.store_chain),
            0o23 => ops::and(regs.acc, &mut regs.store_chain),
            0o24 => regs.oflow |= ops::add(regs.acc, &mut regs.store_chain),
            0o25 => regs.oflow |= ops::neg_add(regs.acc, &mut regs.store_chain),
            0o26 => regs.store_chain = Word::ZERO,
            0o27 => regs.oflow |= ops::sub(regs.acc, &mut regs.store_chain),

            // a' = n
            0o30 => regs.acc = regs.store_chain,
            0o31 => {
                regs.acc = regs.store_chain;
                let n = regs.store_chain;
                regs.oflow |= ops::neg(n, &mut regs.store_chain);
            }
            0o32 => {
                regs.acc = regs.store_chain;
                regs.oflow |= ops::add(Word::ONE, &mut regs.store_chain);
            }
            0o33 => {
                let n = regs.store_chain;
                ops::and(regs.acc, &mut regs.store_chain);
                regs.acc = n;
            }
            0o34 => {
                let n = regs.store_chain;
                regs.oflow |= ops::add(regs.acc, &mut regs.store_chain);
                regs.acc = n;
            }
            0o35 => {
                let n = regs.store_chain;
                regs.oflow |= ops::neg_add(regs.acc, &mut regs.store_chain);
                regs.acc = n;
            }
            0o36 => {
                regs.acc = regs.store_chain;
                regs.store_chain = Word::ZERO;
            }
            _ => {
                let n = regs.store_chain;
                regs.oflow |= ops::sub(regs.acc, &mut regs.store_chain);
                regs.acc = n;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_op(function: u32, acc: i64, n: i64) -> (Processor, Word) {
        let mut p = Processor::new();
        p.regs.function = function;
        p.regs.acc = Word::from_signed(acc);
        p.regs.store_chain = Word::from_signed(n);
        p.alu_op();
        let chain = p.regs.store_chain;
        (p, chain)
    }

    #[test]
    fn group_0_leaves_the_store_word_alone() {
        for (function, expected_acc) in [
            (0o00, 3),
            (0o01, -3),
            (0o02, 8),
            (0o03, 3),
            (0o04, 10),
            (0o05, -4),
            (0o06, 0),
            (0o07, 4),
        ] {
            let (p, chain) = run_op(function, 3, 7);
            assert_eq!(p.regs.acc.signed_value(), expected_acc, "{function:o}");
            assert_eq!(chain.signed_value(), 7, "{function:o}");
        }
    }

    #[test]
    fn group_1_writes_the_old_accumulator() {
        for (function, expected_acc) in [
            (0o10, 7),
            (0o11, -7),
            (0o12, 8),
            (0o13, 3),
            (0o14, 10),
            (0o15, -4),
            (0o16, 0),
            (0o17, 4),
        ] {
            let (p, chain) = run_op(function, 3, 7);
            assert_eq!(p.regs.acc.signed_value(), expected_acc, "{function:o}");
            assert_eq!(chain.signed_value(), 3, "{function:o}");
        }
    }

    #[test]
    fn group_2_operates_on_the_store_word() {
        for (function, expected_n) in [
            (0o20, 3),
            (0o21, -3),
            (0o22, 8),
            (0o23, 3),
            (0o24, 10),
            (0o25, -4),
            (0o26, 0),
            (0o27, 4),
        ] {
            let (p, chain) = run_op(function, 3, 7);
            assert_eq!(p.regs.acc.signed_value(), 3, "{function:o}");
            assert_eq!(chain.signed_value(), expected_n, "{function:o}");
        }
    }

    #[test]
    fn group_3_loads_and_operates() {
        for (function, expected_n) in [
            (0o30, 7),
            (0o31, -7),
            (0o32, 8),
            (0o33, 3),
            (0o34, 10),
            (0o35, -4),
            (0o36, 0),
            (0o37, 4),
        ] {
            let (p, chain) = run_op(function, 3, 7);
            assert_eq!(p.regs.acc.signed_value(), 7, "{function:o}");
            assert_eq!(chain.signed_value(), expected_n, "{function:o}");
        }
    }

    #[test]
    fn function_15_does_not_record_overflow() {
        let min = -(1_i64 << 38);
        let (p, chain) = run_op(0o15, min, 1);
        assert!(!p.regs.oflow);
        // a' = a - n wrapped; n' = a.
        assert_eq!(chain.signed_value(), min);
    }

    #[test]
    fn function_04_records_overflow() {
        let max = (1_i64 << 38) - 1;
        let (p, _) = run_op(0o04, max, 1);
        assert!(p.regs.oflow);
    }
}
