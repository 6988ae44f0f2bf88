//! The assembled machine.
//!
//! [`Elliott803`] owns the processor, the core store, the word
//! generator and the word-time clock, and drives them one emulation
//! period at a time.  A period is a caller-chosen number of word
//! times; the caller paces calls to [`Elliott803::run_period`] so
//! that simulated time tracks wall-clock time (288 microseconds per
//! word time), and plugs in whatever [`PeripheralBus`] it wants on
//! the transfer channels.
//!
//! Console input arrives on a channel: clone a sender with
//! [`Elliott803::console`] and post [`ConsoleEvent`]s from any
//! thread.  Events are drained at the start of each period, before
//! any word time runs.  Outbound [`OutputEvent`]s (lamp levels and
//! redraw requests) come back from `run_period`, along with the
//! loudspeaker samples for the period.

use std::sync::mpsc::{channel, Receiver, Sender};

use tracing::{event, Level};

use crate::context::Context;
use crate::processor::Processor;
use crate::registers::{MachineStatus, Registers};
use crate::store::CoreStore;
use crate::wiring::{
    ConsoleEvent, ControlButtons, LampsEvent, OutputEvent, PeripheralBus, WordGenerator,
};

/// Periods between lamp reports.  The lamps integrate over several
/// periods because a flag which flickers every few word times would
/// otherwise strobe instead of dimming.
const UPDATE_RATE: u32 = 5;

/// Lamps 1 to 6; lamp 7 carries the word-time total for the same
/// span, so a display can normalise the others against it.
const LAMP_COUNT: usize = 7;

pub struct Elliott803 {
    processor: Processor,
    store: CoreStore,
    wg: WordGenerator,
    ctx: Context,
    powered: bool,
    events_tx: Sender<ConsoleEvent>,
    events_rx: Receiver<ConsoleEvent>,
    lamp_time: [u32; LAMP_COUNT],
    periods: u32,
}

impl Default for Elliott803 {
    fn default() -> Elliott803 {
        Elliott803::new()
    }
}

impl Elliott803 {
    #[must_use]
    pub fn new() -> Elliott803 {
        Elliott803::with_store(CoreStore::new())
    }

    /// Build a machine around an existing core image.
    #[must_use]
    pub fn with_store(store: CoreStore) -> Elliott803 {
        let (events_tx, events_rx) = channel();
        Elliott803 {
            processor: Processor::new(),
            store,
            wg: WordGenerator::new(),
            ctx: Context::new(),
            powered: false,
            events_tx,
            events_rx,
            lamp_time: [0; LAMP_COUNT],
            periods: 0,
        }
    }

    /// A sender for console events; clone freely.
    #[must_use]
    pub fn console(&self) -> Sender<ConsoleEvent> {
        self.events_tx.clone()
    }

    pub fn status(&self) -> MachineStatus {
        self.processor.regs.status()
    }

    pub fn registers(&self) -> &Registers {
        &self.processor.regs
    }

    pub fn store(&self) -> &CoreStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut CoreStore {
        &mut self.store
    }

    pub fn is_powered(&self) -> bool {
        self.powered
    }

    /// Run one emulation period of `word_times` word times.
    pub fn run_period(
        &mut self,
        bus: &mut dyn PeripheralBus,
        word_times: u32,
    ) -> (Vec<OutputEvent>, Vec<(i16, i16)>) {
        let mut events = Vec::new();

        while let Ok(change) = self.events_rx.try_recv() {
            self.apply(change, &mut events);
        }

        // Operate is edge triggered: pressing it while stopped arms
        // the single-instruction single-shot, pressing it during a
        // manual-data wait releases the 70 order.
        if self.wg.operate_pressed {
            self.wg.operate_pressed = false;
            let regs = &mut self.processor.regs;
            if regs.s {
                regs.ss25 = true;
            }
            if regs.wi && !regs.r {
                regs.ss3 = true;
            }
            if regs.ss25 {
                regs.parity = false;
                regs.fpo = false;
            }
        }

        let mut samples = Vec::with_capacity(word_times as usize);
        for _ in 0..word_times {
            self.ctx.word_time_count += 1;
            if self.powered {
                let sample =
                    self.processor
                        .word_time(&self.ctx, &mut self.store, &self.wg, bus);
                samples.push(sample);

                let regs = &self.processor.regs;
                let flags = [regs.parity, regs.l, regs.b, regs.fpo, regs.s, regs.oflow];
                for (time, lit) in self.lamp_time.iter_mut().zip(flags) {
                    if lit {
                        *time += 1;
                    }
                }
                self.lamp_time[LAMP_COUNT - 1] += 1;
            } else {
                samples.push((0, 0));
            }
        }

        self.periods += 1;
        if self.periods >= UPDATE_RATE {
            self.periods = 0;
            for (n, time) in self.lamp_time.iter_mut().enumerate() {
                events.push(OutputEvent::Lamps(LampsEvent {
                    lamp_id: (n + 1) as u32,
                    on: *time > 0,
                    brightness: *time as f32,
                }));
                *time = 0;
            }
        }

        (events, samples)
    }

    fn apply(&mut self, change: ConsoleEvent, events: &mut Vec<OutputEvent>) {
        match change {
            ConsoleEvent::PowerOn => {
                event!(Level::INFO, "power on");
                self.powered = true;
                // Core is non-volatile but the logic comes up dirty:
                // stopped, with the parity lamp lit until the
                // operator clears it with the operate bar.
                self.processor.regs.s = true;
                self.processor.regs.parity = true;
                events.push(OutputEvent::UpdateDisplays);
            }
            ConsoleEvent::PowerOff => {
                event!(Level::INFO, "power off");
                self.powered = false;
                self.processor.regs.parity = false;
                events.push(OutputEvent::UpdateDisplays);
            }
            ConsoleEvent::SetF1Row(value) => self.wg.set_f1_row(value),
            ConsoleEvent::SetN1Row(value) => self.wg.set_n1_row(value),
            ConsoleEvent::SetF2Row(value) => self.wg.set_f2_row(value),
            ConsoleEvent::SetN2Row(value) => self.wg.set_n2_row(value),
            ConsoleEvent::SelectMode(mode) => self.wg.select_mode(mode),
            ConsoleEvent::SetManualData(level) => {
                self.wg.buttons.set(ControlButtons::MANUAL_DATA, level);
            }
            ConsoleEvent::SetReset(level) => {
                self.wg.buttons.set(ControlButtons::RESET, level);
            }
            ConsoleEvent::SetClearStore(level) => {
                self.wg.buttons.set(ControlButtons::CLEAR_STORE, level);
            }
            ConsoleEvent::SetSelectedStop(level) => {
                self.wg.buttons.set(ControlButtons::SELECTED_STOP, level);
            }
            ConsoleEvent::Operate => self.wg.operate_pressed = true,
            ConsoleEvent::SetVolume(level) => self.processor.set_volume(level),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wiring::{ModeButton, UnconnectedBus};

    #[test]
    fn power_on_then_jump_boot_starts_the_machine() {
        let mut machine = Elliott803::new();
        let console = machine.console();
        let mut bus = UnconnectedBus;

        console.send(ConsoleEvent::PowerOn).unwrap();
        machine.run_period(&mut bus, 8);
        assert!(machine.is_powered());
        assert_eq!(machine.status(), MachineStatus::Stopped);

        // Key "40 8" on the word generator, load it into IR with
        // read/operate, then run it with normal/operate.  Location 8
        // holds zeros, which obey as no-ops.
        console.send(ConsoleEvent::SetF1Row(0o40)).unwrap();
        console.send(ConsoleEvent::SetN1Row(8 << 1)).unwrap();
        console
            .send(ConsoleEvent::SelectMode(ModeButton::Read))
            .unwrap();
        console.send(ConsoleEvent::Operate).unwrap();
        machine.run_period(&mut bus, 8);
        assert_eq!(machine.status(), MachineStatus::Stopped);

        console
            .send(ConsoleEvent::SelectMode(ModeButton::Normal))
            .unwrap();
        console.send(ConsoleEvent::Operate).unwrap();
        machine.run_period(&mut bus, 8);
        assert_eq!(machine.status(), MachineStatus::Running);
        assert!(machine.registers().scr >= 16);
        assert!(!machine.registers().parity);
    }

    #[test]
    fn lamp_state_is_reported_every_update_period() {
        let mut machine = Elliott803::new();
        let console = machine.console();
        let mut bus = UnconnectedBus;
        console.send(ConsoleEvent::PowerOn).unwrap();

        let mut all = Vec::new();
        for _ in 0..UPDATE_RATE {
            let (events, samples) = machine.run_period(&mut bus, 4);
            assert_eq!(samples.len(), 4);
            all.extend(events);
        }

        assert!(all.contains(&OutputEvent::UpdateDisplays));
        // The machine is stopped, so the stop lamp (5) is lit at full
        // brightness and the busy lamp (3) is dark.
        let lamp = |id| {
            all.iter()
                .find_map(|e| match e {
                    OutputEvent::Lamps(l) if l.lamp_id == id => Some(*l),
                    _ => None,
                })
                .expect("lamp should be reported")
        };
        assert!(lamp(5).on);
        assert!(!lamp(3).on);
        assert_eq!(lamp(5).brightness, lamp(7).brightness);
    }

    #[test]
    fn powered_off_machine_stays_silent() {
        let mut machine = Elliott803::new();
        let mut bus = UnconnectedBus;
        let (_, samples) = machine.run_period(&mut bus, 16);
        assert!(samples.iter().all(|s| *s == (0, 0)));
        assert_eq!(machine.status(), MachineStatus::Running); // Flags all down.
        assert!(!machine.is_powered());
    }

    #[test]
    fn powered_off_time_does_not_count_towards_lamp_brightness() {
        let mut machine = Elliott803::new();
        let mut bus = UnconnectedBus;

        let mut all = Vec::new();
        for _ in 0..UPDATE_RATE {
            let (events, _) = machine.run_period(&mut bus, 4);
            all.extend(events);
        }

        // The word-time total (lamp 7) only accumulates while the
        // machine is powered, so here it reports dark.
        let total = all
            .iter()
            .find_map(|e| match e {
                OutputEvent::Lamps(l) if l.lamp_id == 7 => Some(*l),
                _ => None,
            })
            .expect("lamp should be reported");
        assert!(!total.on);
        assert_eq!(total.brightness, 0.0);
    }
}
