//! A cut-down paper tape station.
//!
//! The reader side serves function 71 from a mounted tape image: one
//! byte per row, delivered immediately (the real reader's 500 ch/s is
//! far faster than a tight 71 loop needs).  Rows are masked to six
//! bits when read, and to five at ACT time by the processor, matching
//! the station's line wiring.
//!
//! The punch side serves function 74 and models the 100 ch/s punch
//! and 10 ch/s teleprinter family with a single pacing rule: after
//! accepting a character the channel reports not-ready until 347 word
//! times have passed, which works out at ten characters per second.
//! Punched characters are the bottom five bits of the order's address
//! field; they accumulate in an output buffer for the caller to
//! drain.

use tracing::{event, Level};

use crate::context::Context;
use crate::wiring::{BusResponse, PeripheralBus};

/// Word times between accepted output characters.
const PUNCH_INTERVAL: u64 = 347;

#[derive(Debug, Default)]
pub struct PaperTapeStation {
    tape: Vec<u8>,
    tape_position: usize,
    punch_busy_until: u64,
    output: Vec<u8>,
}

impl PaperTapeStation {
    #[must_use]
    pub fn new() -> PaperTapeStation {
        PaperTapeStation::default()
    }

    /// Mount a tape in the reader, rewinding to its start.
    pub fn mount_tape(&mut self, data: Vec<u8>) {
        event!(Level::INFO, "mounted a tape of {} rows", data.len());
        self.tape = data;
        self.tape_position = 0;
    }

    /// True when the reader has run off the end of the tape.
    pub fn tape_exhausted(&self) -> bool {
        self.tape_position >= self.tape.len()
    }

    /// Take the characters punched since the last call.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }
}

impl PeripheralBus for PaperTapeStation {
    fn reader_strobe(&mut self, _ctx: &Context, _c_lines: u32) -> BusResponse {
        if self.tape_position < self.tape.len() {
            let row = self.tape[self.tape_position] & 0x3F;
            self.tape_position += 1;
            BusResponse::Ready { tr_lines: row }
        } else {
            // Off the end of the tape: no sprocket holes, no READY,
            // and the 71 order waits until another tape is mounted.
            BusResponse::NotReady
        }
    }

    fn punch_strobe(&mut self, ctx: &Context, c_lines: u32) -> BusResponse {
        if ctx.word_time_count >= self.punch_busy_until {
            self.punch_busy_until = ctx.word_time_count + PUNCH_INTERVAL;
            self.output.push((c_lines & 0x1F) as u8);
            BusResponse::Ready { tr_lines: 0 }
        } else {
            BusResponse::NotReady
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_delivers_tape_rows_then_stalls() {
        let mut pts = PaperTapeStation::new();
        let ctx = Context::new();
        pts.mount_tape(vec![0x1F, 0xFF]);
        assert_eq!(
            pts.reader_strobe(&ctx, 0),
            BusResponse::Ready { tr_lines: 0x1F }
        );
        // Rows are masked to six bits by the station.
        assert_eq!(
            pts.reader_strobe(&ctx, 0),
            BusResponse::Ready { tr_lines: 0x3F }
        );
        assert_eq!(pts.reader_strobe(&ctx, 0), BusResponse::NotReady);
        assert!(pts.tape_exhausted());
    }

    #[test]
    fn punch_paces_output() {
        let mut pts = PaperTapeStation::new();
        let mut ctx = Context::new();

        assert_eq!(
            pts.punch_strobe(&ctx, 0x1FE5),
            BusResponse::Ready { tr_lines: 0 }
        );
        // Still inside the pacing interval.
        ctx.word_time_count = PUNCH_INTERVAL - 1;
        assert_eq!(pts.punch_strobe(&ctx, 0x05), BusResponse::NotReady);
        ctx.word_time_count = PUNCH_INTERVAL;
        assert_eq!(
            pts.punch_strobe(&ctx, 0x05),
            BusResponse::Ready { tr_lines: 0 }
        );
        assert_eq!(pts.take_output(), vec![0x05, 0x05]);
        assert_eq!(pts.take_output(), vec![]);
    }
}
