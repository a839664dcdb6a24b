//! Terminal progress for split runs.

use std::time::Instant;

use dovetail_split::{Stage, StageObserver};
use owo_colors::OwoColorize;

/// Prints each stage as it is reached.
pub struct Progress {
    started: Instant,
    booleans: usize,
}

impl Progress {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            booleans: 0,
        }
    }
}

impl StageObserver for Progress {
    fn stage_changed(&mut self, _from: Stage, to: Stage) {
        let elapsed = self.started.elapsed().as_secs_f64();
        match to {
            Stage::Errored => println!("  {} failed after {elapsed:.1} s", "✗".red()),
            Stage::Done => println!("  {} {to} in {elapsed:.1} s", "✓".green()),
            _ => println!("  {} {to} {}", "✓".green(), format!("({elapsed:.1} s)").dimmed()),
        }
    }

    fn boolean_started(&mut self, label: &str) {
        self.booleans += 1;
        println!("    {}", format!("cutting {label} ({}/6)", self.booleans).dimmed());
    }
}
