//! Appliance driver tying decoder, keypad and sequencer together
//!
//! The driver owns every piece of mutable bridge state and is the only
//! thing the main loop talks to:
//! - Decodes each captured display frame into the reading store
//! - Releases the held key once its time is up
//! - Steps the active sequence
//!
//! Callers that want to wait for an operation start it with
//! [`Appliance::begin`] and check back with [`Appliance::poll`] between
//! loop passes. Timeouts are measured against the loop time of the last
//! pass, never against a clock of their own.

use hpbridge_hal::KeypadColumns;
use hpbridge_protocol::DisplayFrame;

use crate::clock::has_elapsed;
use crate::config::BridgeConfig;
use crate::display::{decode_display_data, DisplayMode};
use crate::keypad::{KeyPosition, KeySlot, Keypad};
use crate::sequence::{RunId, SequenceError, SequenceKind, SequenceResult, Sequencer, TickReport};
use crate::store::ReadingStore;

/// Something a caller can start and wait for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Operation {
    /// A menu sequence
    Sequence(SequenceKind),
    /// A single raw key press, bypassing the sequencer
    PressKey {
        position: KeyPosition,
        duration_ms: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Waiting {
    Run(RunId),
    Key,
}

/// Handle on a started operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ticket {
    waiting: Waiting,
    started_at: u32,
    timeout_ms: u32,
}

impl Ticket {
    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }
}

/// The bridge's view of one appliance
pub struct Appliance<'a, C> {
    config: BridgeConfig,
    store: ReadingStore,
    keypad: Keypad<'a, C>,
    sequencer: Sequencer,
    /// Loop time of the last pass (ms)
    now: u32,
}

impl<'a, C: KeypadColumns> Appliance<'a, C> {
    pub fn new(config: BridgeConfig, columns: C, slot: &'a KeySlot) -> Self {
        Self {
            config,
            store: ReadingStore::new(),
            keypad: Keypad::new(columns, slot),
            sequencer: Sequencer::new(),
            now: 0,
        }
    }

    /// One main loop pass at loop time `now`
    ///
    /// `frame` is the display frame captured since the last pass, if any.
    /// Decoding happens first so the sequence sees the fresh screen.
    pub fn loop_pass(&mut self, now: u32, frame: Option<&DisplayFrame>) -> TickReport {
        self.now = now;
        if let Some(frame) = frame {
            decode_display_data(frame, &mut self.store);
            self.keypad.note_frame_decoded();
        }
        self.keypad.on_tick(now);
        self.sequencer
            .on_tick(&mut self.store, &mut self.keypad, &self.config, now)
    }

    /// Time a caller may wait for `kind` before giving up
    pub fn sequence_timeout_ms(&self, kind: SequenceKind) -> u32 {
        match kind {
            SequenceKind::RefreshStatus => self.config.refresh_timeout_ms,
            SequenceKind::SetPower(_) => self.config.power_timeout_ms,
            SequenceKind::SetTargetTemp(_) => self.config.target_timeout_ms,
        }
    }

    /// Start an operation without waiting for it
    pub fn begin(&mut self, operation: Operation) -> Result<Ticket, SequenceError> {
        let (waiting, timeout_ms) = match operation {
            Operation::Sequence(kind) => {
                if let SequenceKind::SetTargetTemp(celsius) = kind {
                    if !self.config.target_in_range(celsius as i32) {
                        warn!(
                            "target {} outside {}..={}",
                            celsius, self.config.target_min, self.config.target_max
                        );
                        return Err(SequenceError::OutOfRange);
                    }
                }
                let run = self.sequencer.start(kind)?;
                (Waiting::Run(run), self.sequence_timeout_ms(kind))
            }
            Operation::PressKey {
                position,
                duration_ms,
            } => {
                // Would fight the sequencer over the keypad
                if let Some(kind) = self.sequencer.active_kind() {
                    warn!("raw key refused, {:?} in progress", kind);
                    return Err(SequenceError::Busy);
                }
                self.keypad.press(position, duration_ms, self.now)?;
                (
                    Waiting::Key,
                    duration_ms.saturating_add(self.config.press_key_slack_ms),
                )
            }
        };
        Ok(Ticket {
            waiting,
            started_at: self.now,
            timeout_ms,
        })
    }

    /// Outcome of a started operation, `None` while it is still going
    ///
    /// Past its timeout the operation is cancelled and reported as timed out.
    pub fn poll(&mut self, ticket: &Ticket) -> Option<SequenceResult> {
        let timed_out = has_elapsed(self.now, ticket.started_at, ticket.timeout_ms);
        match ticket.waiting {
            Waiting::Run(run) => {
                if let Some(result) = self.sequencer.outcome(run) {
                    return Some(result);
                }
                if timed_out {
                    error!("sequence timed out after {} ms", ticket.timeout_ms);
                    self.sequencer.abort(run, SequenceError::Timeout);
                    return Some(Err(SequenceError::Timeout));
                }
                None
            }
            Waiting::Key => {
                if !self.keypad.is_key_down() {
                    return Some(Ok(()));
                }
                if timed_out {
                    error!("key press timed out after {} ms", ticket.timeout_ms);
                    self.keypad.release();
                    return Some(Err(SequenceError::Timeout));
                }
                None
            }
        }
    }

    /// Start `operation` and wait for it, calling `pump` between checks
    ///
    /// `pump` must keep the loop going, typically by feeding the next
    /// captured frame to [`Appliance::loop_pass`].
    pub fn run_blocking(
        &mut self,
        operation: Operation,
        mut pump: impl FnMut(&mut Self),
    ) -> SequenceResult {
        let ticket = self.begin(operation)?;
        loop {
            if let Some(result) = self.poll(&ticket) {
                return result;
            }
            pump(self);
        }
    }

    /// Run a menu sequence to completion, see [`Appliance::run_blocking`]
    pub fn run_sequence(&mut self, kind: SequenceKind, pump: impl FnMut(&mut Self)) -> SequenceResult {
        self.run_blocking(Operation::Sequence(kind), pump)
    }

    pub fn store(&self) -> &ReadingStore {
        &self.store
    }

    pub fn keypad(&self) -> &Keypad<'a, C> {
        &self.keypad
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn mode(&self) -> DisplayMode {
        self.store.mode()
    }

    /// Loop time of the last pass
    pub fn now(&self) -> u32 {
        self.now
    }
}
