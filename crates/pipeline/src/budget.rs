//! Wall-clock budgeting for a single pipeline invocation.
//!
//! The hosting runtime kills an invocation at a hard ceiling; the
//! orchestrator must stop early enough to checkpoint and dispatch a
//! continuation. [`InvocationBudget`] is the seam the batch loop checks
//! before every slice and before every entry.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Remaining-allowance check for one invocation.
pub trait InvocationBudget: Send + Sync {
    /// `true` while enough allowance remains to start more work.
    fn has_remaining(&self) -> bool;
}

/// Real budget: the execution ceiling minus a safety buffer, measured
/// from the moment the invocation started.
pub struct WallClockBudget {
    deadline: Instant,
}

impl WallClockBudget {
    /// Start a budget now. `ceiling` is the runtime's hard limit;
    /// `safety_buffer` is reserved for checkpoint persistence and the
    /// continuation call.
    pub fn start(ceiling: Duration, safety_buffer: Duration) -> Self {
        Self {
            deadline: Instant::now() + ceiling.saturating_sub(safety_buffer),
        }
    }
}

impl InvocationBudget for WallClockBudget {
    fn has_remaining(&self) -> bool {
        Instant::now() < self.deadline
    }
}

/// Deterministic budget for tests: grants a fixed number of
/// `has_remaining` checks, then reports exhaustion.
///
/// Each call consumes one step, whether it is a slice-level or an
/// entry-level check.
pub struct StepBudget {
    steps: AtomicUsize,
}

impl StepBudget {
    pub fn new(steps: usize) -> Self {
        Self {
            steps: AtomicUsize::new(steps),
        }
    }
}

impl InvocationBudget for StepBudget {
    fn has_remaining(&self) -> bool {
        self.steps
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                current.checked_sub(1)
            })
            .is_ok()
    }
}

/// Budget that never runs out; used when no ceiling applies (tests,
/// operator-driven catch-up runs).
pub struct UnlimitedBudget;

impl InvocationBudget for UnlimitedBudget {
    fn has_remaining(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_clock_budget_expires() {
        let budget = WallClockBudget::start(Duration::from_millis(0), Duration::from_millis(0));
        assert!(!budget.has_remaining());
    }

    #[test]
    fn wall_clock_budget_has_time_initially() {
        let budget = WallClockBudget::start(Duration::from_secs(60), Duration::from_secs(5));
        assert!(budget.has_remaining());
    }

    #[test]
    fn safety_buffer_shortens_the_deadline() {
        let budget = WallClockBudget::start(Duration::from_secs(5), Duration::from_secs(5));
        assert!(!budget.has_remaining());
    }

    #[test]
    fn step_budget_counts_down() {
        let budget = StepBudget::new(2);
        assert!(budget.has_remaining());
        assert!(budget.has_remaining());
        assert!(!budget.has_remaining());
        assert!(!budget.has_remaining());
    }

    #[test]
    fn unlimited_budget_never_expires() {
        let budget = UnlimitedBudget;
        for _ in 0..1000 {
            assert!(budget.has_remaining());
        }
    }
}
