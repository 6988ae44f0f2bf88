//! This module emulates the 803's central processor, core store,
//! console wiring and paper tape station, one word time at a time.
#![crate_name = "cpu"]

mod context;
mod e803;
mod processor;
mod pts;
mod registers;
mod store;
mod wiring;

pub use context::{Context, WORD_TIME};
pub use e803::Elliott803;
pub use processor::Processor;
pub use pts::PaperTapeStation;
pub use registers::{MachineStatus, Registers};
pub use store::{CoreStore, FIRST_CORE_ADDRESS, STORE_WORDS};
pub use wiring::{
    BusResponse, ConsoleEvent, ControlButtons, LampsEvent, ModeButton, OutputEvent,
    PeripheralBus, UnconnectedBus, WordGenerator,
};
