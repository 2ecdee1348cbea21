//! # Visit sequencing
//!
//! [`VisitSequencer`] is an explicit cursor over the fixed, ordered list of visits owned
//! by a [`Target`](crate::target::Target). It only stores indices; the visits
//! themselves stay in the target.
//!
//! ```text
//! NotStarted ──advance──> InProgress(0) ──advance──> … ──advance──> InProgress(N-1)
//!                                                                        │ last visit complete
//!                                                                        v
//!                                                                    Exhausted
//! ```
//!
//! ## Exhaustion
//!
//! `done_visiting` turns `true` as soon as the **last** visit is handed out, while that
//! visit may still be running. It means "no other visit will come after this one", not
//! "all work is finished"; [`VisitSequencer::state`] reports
//! [`SequencerState::Exhausted`] only once the last visit is also complete.

use crate::{observations::Visit, scheduler_errors::SchedulerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    NotStarted,
    InProgress(usize),
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitSequencer {
    len: usize,
    cursor: usize,
    current: Option<usize>,
    visit_num: usize,
    done_visiting: bool,
}

impl VisitSequencer {
    /// A sequencer over `len` visits, in its reset state.
    pub fn new(len: usize) -> Self {
        VisitSequencer {
            len,
            cursor: 0,
            current: None,
            visit_num: 0,
            done_visiting: false,
        }
    }

    /// Rewind to the first visit. Idempotent.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.current = None;
        self.visit_num = 0;
        self.done_visiting = false;
    }

    /// Index of the visit handed out last, if any.
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// 0-based index of the visit handed out last (0 before the first one).
    pub fn visit_num(&self) -> usize {
        self.visit_num
    }

    /// `true` once the last visit has been handed out.
    pub fn done_visiting(&self) -> bool {
        self.done_visiting
    }

    pub fn state(&self, visits: &[Visit]) -> SequencerState {
        match self.current {
            None => SequencerState::NotStarted,
            Some(index)
                if self.cursor >= self.len && visits.get(index).is_some_and(Visit::complete) =>
            {
                SequencerState::Exhausted
            }
            Some(index) => SequencerState::InProgress(index),
        }
    }

    /// Hand out the next visit in order.
    ///
    /// Return
    /// ------
    /// * the index of the new current visit, `None` if every visit was already handed out
    pub fn advance(&mut self) -> Option<usize> {
        if self.cursor >= self.len {
            return None;
        }

        let index = self.cursor;
        self.cursor += 1;
        log::debug!("Getting next visit ({index})");
        self.visit_num = index;
        self.current = Some(index);

        if index + 1 == self.len {
            log::debug!("Setting done visiting: {} {}", index, self.len);
            self.done_visiting = true;
        }

        Some(index)
    }

    /// The visit to work on: the current one while it is incomplete, the next one otherwise.
    ///
    /// Return
    /// ------
    /// * the visit index, or [`SchedulerError::VisitsExhausted`] when the last visit is
    ///   complete. Check [`VisitSequencer::done_visiting`] beforehand to avoid it.
    pub fn next_visit(&mut self, visits: &[Visit]) -> Result<usize, SchedulerError> {
        match self.current {
            Some(index) if visits.get(index).is_some_and(|visit| !visit.complete()) => Ok(index),
            _ => self.advance().ok_or(SchedulerError::VisitsExhausted),
        }
    }
}
