//! Bounded budget for automatic error-analysis round-trips

/// Counts how many more times a failed command may be sent back to the
/// model without new user input
///
/// The budget is refilled when the loop returns to waiting for user input
/// and only ever decreases in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    max: u32,
    remaining: u32,
}

impl RetryBudget {
    pub fn new(max: u32) -> Self {
        Self {
            max,
            remaining: max,
        }
    }

    /// Refill to the configured maximum
    pub fn reset(&mut self) {
        self.remaining = self.max;
    }

    /// Consume one retry; returns false (and changes nothing) when exhausted
    pub fn try_consume(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// 1-based number of the retry most recently consumed
    pub fn attempt(&self) -> u32 {
        self.max - self.remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_counts_down_and_stops() {
        let mut budget = RetryBudget::new(2);
        assert!(budget.try_consume());
        assert_eq!(budget.attempt(), 1);
        assert!(budget.try_consume());
        assert_eq!(budget.attempt(), 2);
        assert_eq!(budget.remaining(), 0);

        // Never goes below zero
        assert!(!budget.try_consume());
        assert!(!budget.try_consume());
        assert_eq!(budget.remaining(), 0);
    }

    #[test]
    fn test_budget_is_monotonic_until_reset() {
        let mut budget = RetryBudget::new(3);
        let mut last = budget.remaining();
        for _ in 0..10 {
            budget.try_consume();
            assert!(budget.remaining() <= last);
            last = budget.remaining();
        }
        budget.reset();
        assert_eq!(budget.remaining(), 3);
    }

    #[test]
    fn test_zero_budget_never_retries() {
        let mut budget = RetryBudget::new(0);
        assert_eq!(budget.remaining(), 0);
        assert!(!budget.try_consume());
        assert_eq!(budget.max(), 0);
    }
}
