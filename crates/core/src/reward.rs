//! Reward signals derived from a grading result
//!
//! Two independent decisions come out of one submission: whether to show the
//! "+N coins" indicator (the balance grew) and whether to celebrate (the score
//! reached [`CELEBRATION_PERCENTAGE`]). They are kept as separate fields.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Score percentage at or above which the particle effect is triggered
pub const CELEBRATION_PERCENTAGE: f64 = 80.0;

/// How long the reward delta indicator stays visible
pub const INDICATOR_DURATION: Duration = Duration::from_secs(3);

/// Particle count for the celebration after a full quiz submission
pub const CELEBRATION_PARTICLES: usize = 80;

/// Balance growth between two snapshots, clamped at zero.
pub fn compute_delta(balance_before: i64, balance_after: i64) -> u64 {
    balance_after.saturating_sub(balance_before).max(0) as u64
}

pub fn should_celebrate(percentage: f64) -> bool {
    percentage >= CELEBRATION_PERCENTAGE
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RewardOutcome {
    pub delta: u64,
    pub show_indicator: bool,
    pub celebrate: bool,
}

impl RewardOutcome {
    pub fn new(balance_before: i64, balance_after: i64, percentage: f64) -> Self {
        let delta = compute_delta(balance_before, balance_after);
        Self {
            delta,
            show_indicator: delta > 0,
            celebrate: should_celebrate(percentage),
        }
    }

    /// Text of the reward indicator, if it should be shown
    pub fn indicator_text(&self) -> Option<String> {
        self.show_indicator.then(|| format!("+{} coins", self.delta))
    }
}

/// Badge shown on the profile, derived from the reward balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    Gold,
    Silver,
    Bronze,
    New,
}

impl Milestone {
    pub fn from_balance(balance: i64) -> Self {
        match balance {
            b if b >= 100 => Milestone::Gold,
            b if b >= 50 => Milestone::Silver,
            b if b >= 10 => Milestone::Bronze,
            _ => Milestone::New,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Milestone::Gold => "Gold Learner",
            Milestone::Silver => "Silver Learner",
            Milestone::Bronze => "Bronze Learner",
            Milestone::New => "New Learner",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_delta_never_negative() {
        assert_eq!(compute_delta(40, 35), 0);
    }

    #[test]
    fn test_compute_delta_growth() {
        assert_eq!(compute_delta(40, 55), 15);
        assert_eq!(compute_delta(0, 0), 0);
    }

    #[test]
    fn test_compute_delta_extremes_do_not_overflow() {
        assert_eq!(compute_delta(i64::MAX, i64::MIN), 0);
        assert_eq!(compute_delta(i64::MIN, i64::MAX), i64::MAX as u64);
    }

    #[test]
    fn test_should_celebrate_threshold() {
        assert!(!should_celebrate(79.0));
        assert!(!should_celebrate(79.99));
        assert!(should_celebrate(80.0));
        assert!(should_celebrate(100.0));
    }

    #[test]
    fn test_reward_outcome_flags_are_independent() {
        let indicator_only = RewardOutcome::new(10, 15, 50.0);
        assert!(indicator_only.show_indicator);
        assert!(!indicator_only.celebrate);
        assert_eq!(indicator_only.indicator_text().as_deref(), Some("+5 coins"));

        let celebrate_only = RewardOutcome::new(10, 10, 90.0);
        assert!(!celebrate_only.show_indicator);
        assert!(celebrate_only.celebrate);
        assert_eq!(celebrate_only.indicator_text(), None);
    }

    #[test]
    fn test_milestone_boundaries() {
        assert_eq!(Milestone::from_balance(0), Milestone::New);
        assert_eq!(Milestone::from_balance(9), Milestone::New);
        assert_eq!(Milestone::from_balance(10), Milestone::Bronze);
        assert_eq!(Milestone::from_balance(49), Milestone::Bronze);
        assert_eq!(Milestone::from_balance(50), Milestone::Silver);
        assert_eq!(Milestone::from_balance(100), Milestone::Gold);
        assert_eq!(Milestone::Gold.label(), "Gold Learner");
    }
}
