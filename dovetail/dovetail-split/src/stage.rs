//! Pipeline stages and progress observers.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Where a run is.
///
/// Runs move forward through the stages in declaration order; any stage may
/// end in [`Stage::Errored`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Bytes received and parsed.
    Uploaded,
    /// Centred in XY, resting on `z = 0`.
    Normalized,
    /// Closed, simple enough to cut, cutters planned.
    Validated,
    /// Split along the X line into bottom and top halves.
    CutX,
    /// Halves split along the Y line into quadrants.
    CutY,
    /// Debris removed from every quadrant.
    Sanitized,
    /// Parts encoded.
    Done,
    /// Run failed.
    Errored,
}

impl Stage {
    /// True for [`Stage::Done`] and [`Stage::Errored`].
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Errored)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uploaded => "uploaded",
            Self::Normalized => "normalized",
            Self::Validated => "validated",
            Self::CutX => "cut X",
            Self::CutY => "cut Y",
            Self::Sanitized => "sanitized",
            Self::Done => "done",
            Self::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// Receives progress from a run.
///
/// Both methods default to doing nothing.
pub trait StageObserver {
    /// The run moved from `from` to `to`.
    fn stage_changed(&mut self, from: Stage, to: Stage) {
        let _ = (from, to);
    }

    /// A boolean operation is about to run.
    fn boolean_started(&mut self, label: &str) {
        let _ = label;
    }
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl StageObserver for NoopObserver {}

/// One observed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageEvent {
    /// A stage transition.
    Changed {
        /// Previous stage.
        from: Stage,
        /// New stage.
        to: Stage,
    },
    /// A boolean operation started.
    Boolean(String),
}

/// Observer that records every event in order.
#[derive(Debug, Clone, Default)]
pub struct StageLog {
    /// Events as they arrived.
    pub events: Vec<StageEvent>,
}

impl StageLog {
    /// Stages entered, in order.
    #[must_use]
    pub fn stages(&self) -> Vec<Stage> {
        self.events
            .iter()
            .filter_map(|e| match e {
                StageEvent::Changed { to, .. } => Some(*to),
                StageEvent::Boolean(_) => None,
            })
            .collect()
    }

    /// Number of boolean operations started.
    #[must_use]
    pub fn boolean_count(&self) -> usize {
        self.events.iter().filter(|e| matches!(e, StageEvent::Boolean(_))).count()
    }
}

impl StageObserver for StageLog {
    fn stage_changed(&mut self, from: Stage, to: Stage) {
        self.events.push(StageEvent::Changed { from, to });
    }

    fn boolean_started(&mut self, label: &str) {
        self.events.push(StageEvent::Boolean(label.to_string()));
    }
}

/// Current stage of a run plus the observer to notify.
pub(crate) struct StageTracker<'a> {
    current: Stage,
    observer: &'a mut dyn StageObserver,
}

impl<'a> StageTracker<'a> {
    pub(crate) fn new(observer: &'a mut dyn StageObserver) -> Self {
        Self {
            current: Stage::Uploaded,
            observer,
        }
    }

    pub(crate) fn current(&self) -> Stage {
        self.current
    }

    pub(crate) fn advance(&mut self, to: Stage) {
        info!(from = %self.current, to = %to, "stage");
        self.observer.stage_changed(self.current, to);
        self.current = to;
    }

    pub(crate) fn boolean(&mut self, label: &str) {
        self.observer.boolean_started(label);
    }

    pub(crate) fn fail(&mut self, failed: Stage, error: &dyn fmt::Display) {
        warn!(stage = %failed, %error, "run failed");
        self.observer.stage_changed(self.current, Stage::Errored);
        self.current = Stage::Errored;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_reports_transitions() {
        let mut log = StageLog::default();
        {
            let mut tracker = StageTracker::new(&mut log);
            tracker.advance(Stage::Normalized);
            tracker.boolean("X male");
            tracker.fail(Stage::Validated, &"open mesh");
            assert_eq!(tracker.current(), Stage::Errored);
        }
        assert_eq!(log.stages(), vec![Stage::Normalized, Stage::Errored]);
        assert_eq!(log.boolean_count(), 1);
        assert_eq!(
            log.events[2],
            StageEvent::Changed {
                from: Stage::Normalized,
                to: Stage::Errored
            }
        );
    }

    #[test]
    fn terminal_stages() {
        assert!(Stage::Done.is_terminal());
        assert!(Stage::Errored.is_terminal());
        assert!(!Stage::CutY.is_terminal());
        assert_eq!(Stage::CutX.to_string(), "cut X");
    }
}
