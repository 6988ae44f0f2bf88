//! Rendering of punched output on the terminal.
//!
//! Characters come off the punch channel as five-bit telecode with
//! two shift cases.  Codes 1 to 26 are the letters A to Z in letter
//! case and the digits and signs in figure case; 27 and 31 change
//! case, 28 is space, 29 and 30 are carriage return and line feed,
//! and 0 is blank tape (a run-out), which prints nothing.

use std::io::Write;

use termcolor::{ColorChoice, ColorSpec, StandardStream, WriteColor};
use tracing::{event, Level};

/// Figure-case characters for codes 1 to 26.
const FIGURES: [char; 26] = [
    '1', '2', '*', '4', '$', '=', '7', '8', '\'', ',', '+', ':', '-', '.', '%', '0', '(', ')',
    '3', '?', '5', '6', '/', '@', '9', '£',
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShiftCase {
    Letters,
    Figures,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decoded {
    Print(char),
    Shift(ShiftCase),
    Nothing,
}

fn decode(case: ShiftCase, code: u8) -> Decoded {
    match code & 0x1F {
        0 => Decoded::Nothing,
        27 => Decoded::Shift(ShiftCase::Figures),
        31 => Decoded::Shift(ShiftCase::Letters),
        28 => Decoded::Print(' '),
        // The line feed moves to the next line; the carriage return
        // that conventionally precedes it prints nothing here.
        29 => Decoded::Nothing,
        30 => Decoded::Print('\n'),
        code => Decoded::Print(match case {
            ShiftCase::Letters => (b'A' + code - 1) as char,
            ShiftCase::Figures => FIGURES[usize::from(code) - 1],
        }),
    }
}

fn colour_choice() -> ColorChoice {
    if atty::is(atty::Stream::Stdout) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

pub struct Teleprinter {
    case: ShiftCase,
    stream: StandardStream,
}

impl Teleprinter {
    pub fn new() -> Teleprinter {
        Teleprinter {
            case: ShiftCase::Letters,
            stream: StandardStream::stdout(colour_choice()),
        }
    }

    pub fn print(&mut self, code: u8) -> Result<(), std::io::Error> {
        match decode(self.case, code) {
            Decoded::Nothing => Ok(()),
            Decoded::Shift(case) => {
                self.case = case;
                // Figure case prints in cyan, so a listing shows
                // which case the program left the machine in.
                let mut colour = ColorSpec::new();
                if case == ShiftCase::Figures {
                    colour.set_fg(Some(termcolor::Color::Cyan));
                }
                self.stream.set_color(&colour)
            }
            Decoded::Print(ch) => {
                write!(self.stream, "{ch}")?;
                self.stream.flush()
            }
        }
    }

    pub fn disconnect(&mut self) {
        if let Err(e) = self.stream.reset() {
            event!(Level::ERROR, "Failed to reset terminal: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(codes: &[u8]) -> String {
        let mut case = ShiftCase::Letters;
        let mut out = String::new();
        for &code in codes {
            match decode(case, code) {
                Decoded::Print(ch) => out.push(ch),
                Decoded::Shift(c) => case = c,
                Decoded::Nothing => (),
            }
        }
        out
    }

    #[test]
    fn letters_case_prints_the_alphabet() {
        assert_eq!(decode_all(&[8, 5, 12, 12, 15]), "HELLO");
    }

    #[test]
    fn figure_shift_switches_case_until_letter_shift() {
        assert_eq!(decode_all(&[27, 1, 2, 19, 31, 3]), "123C");
    }

    #[test]
    fn blanks_and_carriage_returns_print_nothing() {
        assert_eq!(decode_all(&[0, 8, 0, 9, 29, 30, 0]), "HI\n");
    }
}
