//! Step navigator
//!
//! Walks the ordered steps of a form. Moving forward is gated on the
//! validity of the steps being left behind; moving backward never is.
//!
//! # Transitions
//!
//! ```text
//! step 0 ──next──▶ step 1 ──next──▶ ... ──next──▶ step N-1 (submit instead of next)
//!        ◀─previous─       ◀─previous─
//! jump_to(i): backward always, forward only if every step in between is valid
//! ```

use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;

use crate::engine::form::FormEngine;

/// Errors that can occur during step transitions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    /// The step being left (or skipped) has invalid visible fields
    #[error("Step {step} has invalid fields")]
    StepInvalid { step: usize },

    /// `previous` on the first step
    #[error("Already at the first step")]
    AtFirstStep,

    /// `next` on the last step; the form should be submitted instead
    #[error("Already at the last step")]
    AtLastStep,

    /// Target index does not exist
    #[error("Step {index} is out of range (form has {count} steps)")]
    OutOfRange { index: usize, count: usize },
}

/// Visual completion state of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// The step on screen
    Current,
    /// Visited and every visible field passes
    Complete,
    /// Visited but something still fails
    Incomplete,
    /// Not visited yet
    Pending,
}

/// Position within a multi-step form
#[derive(Debug, Clone)]
pub struct StepNavigator {
    current: usize,
    count: usize,
    visited: BTreeSet<usize>,
}

impl StepNavigator {
    /// Start at the first of `count` steps
    pub fn new(count: usize) -> Self {
        let mut visited = BTreeSet::new();
        visited.insert(0);
        Self {
            current: 0,
            count,
            visited,
        }
    }

    /// Navigator sized for `engine`'s form
    pub fn for_engine(engine: &FormEngine) -> Self {
        Self::new(engine.config().steps.len())
    }

    #[inline]
    pub fn current(&self) -> usize {
        self.current
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    /// The terminal step, where `next` is replaced by submit
    #[inline]
    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.count
    }

    pub fn is_visited(&self, step: usize) -> bool {
        self.visited.contains(&step)
    }

    /// Advance one step if the current step validates.
    ///
    /// On failure the current step's fields are touched so their errors show.
    pub fn next(&mut self, engine: &mut FormEngine) -> Result<usize, NavigationError> {
        if self.is_last() {
            return Err(NavigationError::AtLastStep);
        }
        if !engine.reveal_step_errors(self.current) {
            debug!(step = self.current, "Next blocked by invalid step");
            return Err(NavigationError::StepInvalid { step: self.current });
        }
        self.move_to(self.current + 1);
        Ok(self.current)
    }

    /// Go back one step; never validated
    pub fn previous(&mut self) -> Result<usize, NavigationError> {
        if self.is_first() {
            return Err(NavigationError::AtFirstStep);
        }
        self.move_to(self.current - 1);
        Ok(self.current)
    }

    /// Jump to `index`.
    ///
    /// Backward jumps always succeed. Forward jumps require every step from
    /// the current one up to (not including) `index` to validate; the first
    /// failing step is reported and its errors revealed.
    pub fn jump_to(&mut self, index: usize, engine: &mut FormEngine) -> Result<usize, NavigationError> {
        if index >= self.count {
            return Err(NavigationError::OutOfRange {
                index,
                count: self.count,
            });
        }
        if index > self.current {
            if let Some(step) = (self.current..index).find(|&s| !engine.is_step_valid(s)) {
                engine.reveal_step_errors(step);
                debug!(from = self.current, to = index, blocked_at = step, "Jump blocked");
                return Err(NavigationError::StepInvalid { step });
            }
        }
        self.move_to(index);
        Ok(self.current)
    }

    fn move_to(&mut self, index: usize) {
        debug!(from = self.current, to = index, "Step changed");
        self.current = index;
        self.visited.insert(index);
    }

    /// Completion state of `step` for display
    pub fn step_status(&self, step: usize, engine: &FormEngine) -> StepStatus {
        if step == self.current {
            StepStatus::Current
        } else if !self.visited.contains(&step) {
            StepStatus::Pending
        } else if engine.is_step_valid(step) {
            StepStatus::Complete
        } else {
            StepStatus::Incomplete
        }
    }

    /// Share of steps that are visited and valid, as a percentage
    pub fn progress_percent(&self, engine: &FormEngine) -> u8 {
        if self.count == 0 {
            return 0;
        }
        let complete = (0..self.count)
            .filter(|&s| self.visited.contains(&s) && engine.is_step_valid(s))
            .count();
        ((complete * 100) / self.count) as u8
    }
}
