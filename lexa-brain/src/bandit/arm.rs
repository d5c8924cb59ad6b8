//! Arm Record - reward history of one vocabulary term

use serde::{Deserialize, Serialize};

/// Selection/reward statistics for one arm
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArmRecord {
    /// Sum of observed rewards (not an average)
    pub cumulative_reward: f64,
    /// Number of reward observations
    pub selections: u64,
}

impl ArmRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one reward observation
    pub fn record(&mut self, reward: f64) {
        self.cumulative_reward += reward;
        self.selections += 1;
    }

    /// Mean reward, 0 before the first observation
    pub fn average_reward(&self) -> f64 {
        if self.selections == 0 {
            0.0
        } else {
            self.cumulative_reward / self.selections as f64
        }
    }

    /// UCB1 score; infinite for an arm never selected
    pub fn ucb(&self, exploration: f64, total_selections: u64) -> f64 {
        if self.selections == 0 {
            return f64::INFINITY;
        }
        let bonus = ((total_selections as f64 + 1.0).ln() / self.selections as f64).sqrt();
        self.average_reward() + exploration * bonus
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_is_additive() {
        let mut arm = ArmRecord::new();
        arm.record(0.5);
        arm.record(1.5);
        assert_eq!(arm.selections, 2);
        assert_eq!(arm.cumulative_reward, 2.0);
        assert_eq!(arm.average_reward(), 1.0);
    }

    #[test]
    fn test_unselected_arm_is_infinite() {
        assert!(ArmRecord::new().ucb(1.0, 10).is_infinite());
    }

    #[test]
    fn test_ucb_formula() {
        let arm = ArmRecord {
            cumulative_reward: 3.0,
            selections: 4,
        };
        let expected = 0.75 + 0.5 * (11f64.ln() / 4.0).sqrt();
        assert!((arm.ucb(0.5, 10) - expected).abs() < 1e-12);
    }
}
