use std::fs;
use std::path::PathBuf;

use clap::Parser;
use tracing::{event, Level};
use tracing_subscriber::prelude::*;

use base::prelude::StoredPair;
use cpu::{ConsoleEvent, Elliott803, MachineStatus, ModeButton, PaperTapeStation};

mod clock;
mod teleprinter;

use clock::Pacer;
use teleprinter::Teleprinter;

/// Word times emulated per trip round the main loop; 64 word times
/// is a little over 18 milliseconds of machine time.
const PERIOD: u32 = 64;

/// The punch frees itself within six periods, so a busy wait lasting
/// this long means the reader has run off the end of the tape.
const STALL_LIMIT: u32 = 16;

#[derive(Debug, Parser)]
#[command(name = "e803", about = "Emulate the historic Elliott 803B computer")]
struct Args {
    /// Files containing paper tape data, read in order.
    #[arg(value_name = "PTAPE")]
    tapes: Vec<PathBuf>,

    /// Core store image, loaded at power on and saved back at exit.
    #[arg(long, default_value = "CoreImage")]
    core_image: PathBuf,

    /// Store address to enter once the machine is started.
    #[arg(long, default_value_t = 0)]
    start: u32,

    /// Run this many times faster than real time ('MAX' for as fast
    /// as possible).
    #[arg(long)]
    speed_multiplier: Option<String>,

    /// Do not save the core image back at exit.
    #[arg(long)]
    discard_core: bool,
}

/// Mount the next tape file, if there is one.
fn mount_next(
    pts: &mut PaperTapeStation,
    tapes: &mut std::vec::IntoIter<PathBuf>,
) -> bool {
    for path in tapes.by_ref() {
        match fs::read(&path) {
            Ok(data) => {
                event!(Level::INFO, "mounting tape {}", path.display());
                pts.mount_tape(data);
                return true;
            }
            Err(e) => {
                event!(Level::WARN, "cannot read tape {}: {}", path.display(), e);
            }
        }
    }
    false
}

fn run_emulator(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    if args.start >= cpu::STORE_WORDS as u32 {
        return Err(format!("start address {} is outside the store", args.start).into());
    }

    let speed: Option<f64> = match args.speed_multiplier.as_deref() {
        None => Some(1.0),
        Some("MAX") => {
            event!(Level::INFO, "--speed-multiplier=MAX, running flat out");
            None
        }
        Some(s) => {
            let x: f64 = s.parse()?;
            if x <= 0.0 {
                return Err(format!("speed multiplier {x} is not positive").into());
            }
            event!(Level::INFO, "running at {x} times real time");
            Some(x)
        }
    };

    let mut machine = Elliott803::with_store(cpu::CoreStore::from_image_file(&args.core_image));
    let console = machine.console();
    let mut pts = PaperTapeStation::new();
    let mut tapes = args.tapes.into_iter();
    mount_next(&mut pts, &mut tapes);

    // Power on, key a jump to the start address on the word
    // generator, load it into IR with read/operate, then obey it with
    // normal/operate.  Each batch of console events takes effect at
    // the head of the following period.
    let post = |e: ConsoleEvent| {
        console.send(e).expect("the machine owns the receiver");
    };
    post(ConsoleEvent::PowerOn);
    machine.run_period(&mut pts, PERIOD);

    post(ConsoleEvent::SetF1Row(0o40));
    post(ConsoleEvent::SetN1Row(args.start << 1));
    post(ConsoleEvent::SetF2Row(0));
    post(ConsoleEvent::SetN2Row(0));
    post(ConsoleEvent::SelectMode(ModeButton::Read));
    post(ConsoleEvent::Operate);
    machine.run_period(&mut pts, PERIOD);

    post(ConsoleEvent::SelectMode(ModeButton::Normal));
    post(ConsoleEvent::Operate);

    let mut pacer = Pacer::new(speed);
    let mut printer = Teleprinter::new();
    let mut last_status = machine.status();
    let mut stalled_periods = 0;
    let outcome = loop {
        machine.run_period(&mut pts, PERIOD);
        for code in pts.take_output() {
            printer.print(code)?;
        }

        if pts.tape_exhausted() {
            mount_next(&mut pts, &mut tapes);
        }

        let status = machine.status();
        if status != last_status {
            event!(Level::DEBUG, "machine is now {:?}", status);
            last_status = status;
        }
        match status {
            MachineStatus::Stopped => {
                let address = u32::from(machine.registers().scr >> 1);
                event!(
                    Level::INFO,
                    "machine stopped at {}: {}",
                    address,
                    StoredPair::from(machine.store().fetch(address))
                );
                break Ok(());
            }
            MachineStatus::AwaitingPeripheral => {
                stalled_periods += 1;
                if stalled_periods > STALL_LIMIT && pts.tape_exhausted() {
                    event!(Level::WARN, "the reader ran off the end of the tape");
                    break Ok(());
                }
            }
            _ => stalled_periods = 0,
        }

        pacer.pace(cpu::WORD_TIME * PERIOD);
    };
    printer.disconnect();

    if !args.discard_core {
        machine.store().save_image_file(&args.core_image)?;
        event!(Level::INFO, "saved core image {}", args.core_image.display());
    }
    outcome
}

fn main() {
    let args = Args::parse();

    // See
    // https://docs.rs/tracing-subscriber/latest/tracing_subscriber/fmt/index.html#filtering-events-with-environment-variables
    // for instructions on how to select which trace messages get
    // printed.
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);
    let filter_layer = match tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))
    {
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
        Ok(layer) => layer,
    };
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    match run_emulator(args) {
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
        Ok(()) => {
            std::process::exit(0);
        }
    }
}
