//! Sequence orchestrator
//!
//! Holds at most one active sequence and steps it at most once per loop
//! tick, and only once the display has settled after the last key release.

use super::steps::{PowerStep, PreambleStep, Progress, RefreshStep, StepContext, TargetStep};
use super::{SequenceError, SequenceKind, SequenceResult, TickReport};
use crate::config::BridgeConfig;
use crate::keypad::KeyPress;
use crate::store::ReadingStore;

/// Identifies one started sequence, so a waiting caller can find its outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RunId(u32);

/// Active sequence, one variant per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Active {
    Refresh(Progress<RefreshStep>),
    Power { target: bool, progress: Progress<PowerStep> },
    Target { target: i8, progress: Progress<TargetStep> },
}

impl Active {
    fn new(kind: SequenceKind) -> Self {
        match kind {
            SequenceKind::RefreshStatus => Active::Refresh(Progress::Preamble(PreambleStep::Wake)),
            SequenceKind::SetPower(target) => Active::Power {
                target,
                progress: Progress::Preamble(PreambleStep::Wake),
            },
            SequenceKind::SetTargetTemp(target) => Active::Target {
                target,
                progress: Progress::Preamble(PreambleStep::Wake),
            },
        }
    }

    fn kind(&self) -> SequenceKind {
        match *self {
            Active::Refresh(_) => SequenceKind::RefreshStatus,
            Active::Power { target, .. } => SequenceKind::SetPower(target),
            Active::Target { target, .. } => SequenceKind::SetTargetTemp(target),
        }
    }

    fn step<K: KeyPress>(self, cx: &mut StepContext<'_, K>) -> Result<Option<Self>, SequenceError> {
        Ok(match self {
            Active::Refresh(progress) => progress
                .advance(RefreshStep::OpenAbove, cx, |step, cx| step.run(cx))?
                .map(Active::Refresh),
            Active::Power { target, progress } => progress
                .advance(PowerStep::Toggle, cx, |step, cx| step.run(target, cx))?
                .map(|progress| Active::Power { target, progress }),
            Active::Target { target, progress } => progress
                .advance(TargetStep::OpenEditor, cx, |step, cx| step.run(target, cx))?
                .map(|progress| Active::Target { target, progress }),
        })
    }
}

/// Runs one sequence at a time
#[derive(Debug, Default)]
pub struct Sequencer {
    active: Option<(RunId, Active)>,
    last: Option<(RunId, SequenceResult)>,
    runs: u32,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a sequence; refused while another one is active
    pub fn start(&mut self, kind: SequenceKind) -> Result<RunId, SequenceError> {
        if let Some((_, active)) = self.active {
            warn!("{:?} refused, {:?} in progress", kind, active.kind());
            return Err(SequenceError::Busy);
        }
        self.runs = self.runs.wrapping_add(1);
        let run = RunId(self.runs);
        self.active = Some((run, Active::new(kind)));
        info!("sequence {:?} started", kind);
        Ok(run)
    }

    /// Stop `run` if it is still active, recording `reason` as its outcome
    pub fn abort(&mut self, run: RunId, reason: SequenceError) {
        if matches!(self.active, Some((active, _)) if active == run) {
            self.finish(run, Err(reason));
        }
    }

    /// Stop whatever is active
    pub fn cancel(&mut self) {
        if let Some((run, _)) = self.active {
            self.finish(run, Err(SequenceError::Cancelled));
        }
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    pub fn active_kind(&self) -> Option<SequenceKind> {
        self.active.map(|(_, active)| active.kind())
    }

    /// Outcome of `run`, `None` while it is still active
    ///
    /// Runs older than the most recent finished one report `Cancelled`.
    pub fn outcome(&self, run: RunId) -> Option<SequenceResult> {
        match (self.active, self.last) {
            (Some((active, _)), _) if active == run => None,
            (_, Some((last, result))) if last == run => Some(result),
            _ => Some(Err(SequenceError::Cancelled)),
        }
    }

    fn finish(&mut self, run: RunId, result: SequenceResult) {
        if let Some((_, active)) = self.active.take() {
            match result {
                Ok(()) => info!("sequence {:?} done", active.kind()),
                Err(err) => error!("sequence {:?} ended: {:?}", active.kind(), err),
            }
        }
        self.last = Some((run, result));
    }

    /// Step the active sequence once, if the keypad and display allow it
    pub fn on_tick<K: KeyPress>(
        &mut self,
        store: &mut ReadingStore,
        keys: &mut K,
        config: &BridgeConfig,
        now: u32,
    ) -> TickReport {
        if keys.is_key_down() {
            return TickReport::Busy;
        }
        if keys.settle_reads() < config.settle_reads {
            return TickReport::Waiting;
        }
        let Some((run, active)) = self.active else {
            return TickReport::Idle;
        };

        let mut cx = StepContext {
            store,
            keys,
            config,
            now,
        };
        match active.step(&mut cx) {
            Ok(Some(next)) => {
                self.active = Some((run, next));
                TickReport::Running
            }
            Ok(None) => {
                self.finish(run, Ok(()));
                TickReport::Finished(Ok(()))
            }
            Err(err) => {
                self.finish(run, Err(err));
                TickReport::Finished(Err(err))
            }
        }
    }
}
