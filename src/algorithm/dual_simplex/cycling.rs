//! # Cycle detection
//!
//! Degenerate iterations can return to an earlier basis without changing the objective. A variable
//! that enters the basis many times within a short window of iterations is taken as a sign of this.
use std::collections::VecDeque;

/// Tracks the most recent entering variables.
#[derive(Clone, Debug)]
pub struct CycleDetector {
    window: usize,
    threshold: usize,
    recent: VecDeque<usize>,
}

impl CycleDetector {
    /// Create a detector.
    ///
    /// # Arguments
    ///
    /// * `window`: Number of recent iterations to look at.
    /// * `threshold`: A variable entering more often than this within the window signals cycling.
    pub fn new(window: usize, threshold: usize) -> Self {
        debug_assert!(window > 0);

        Self { window, threshold, recent: VecDeque::with_capacity(window) }
    }

    /// Register an entering variable.
    ///
    /// # Return value
    ///
    /// Whether cycling is suspected. The history is cleared when it is.
    pub fn record(&mut self, variable: usize) -> bool {
        if self.recent.len() == self.window {
            self.recent.pop_front();
        }
        self.recent.push_back(variable);

        let count = self.recent.iter().filter(|&&other| other == variable).count();
        if count > self.threshold {
            self.recent.clear();
            true
        } else {
            false
        }
    }
}
