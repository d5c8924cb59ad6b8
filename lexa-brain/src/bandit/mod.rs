//! Vocabulary Selection - UCB1 over vocabulary terms
//!
//! Every candidate term is an arm. Terms never rewarded are tried first;
//! after that the arm with the highest upper confidence bound wins.
//! The exploration constant decays geometrically with the total number
//! of selections so selection gradually trusts what it has learned.

pub mod arm;

pub use arm::ArmRecord;

use lexa_core::{BanditConfig, LexaError, LexaResult, STATE_VERSION};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Persisted form of the arm table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BanditSnapshot {
    pub version: u32,
    /// (term, record), sorted by term
    pub arms: Vec<(String, ArmRecord)>,
    pub total_selections: u64,
}

/// UCB1 selector with decaying exploration
#[derive(Debug, Clone)]
pub struct BanditSelector {
    config: BanditConfig,
    arms: HashMap<String, ArmRecord>,
    total_selections: u64,
}

impl BanditSelector {
    pub fn new(config: BanditConfig) -> Self {
        Self {
            config,
            arms: HashMap::new(),
            total_selections: 0,
        }
    }

    /// max(min, initial · decay^t) with t = total selections
    pub fn exploration_constant(&self) -> f64 {
        let decayed = self.config.initial_exploration
            * self.config.exploration_decay.powf(self.total_selections as f64);
        decayed.max(self.config.min_exploration)
    }

    /// Pick the next vocabulary item to surface
    ///
    /// A never-selected candidate wins immediately; otherwise the highest
    /// UCB wins. Ties go to the earliest candidate. `None` for no candidates.
    pub fn select<S: AsRef<str>>(&mut self, candidates: &[S]) -> Option<String> {
        let exploration = self.exploration_constant();

        let mut best: Option<(&str, f64)> = None;
        for candidate in candidates {
            let term = candidate.as_ref();
            let score = match self.arms.get(term) {
                Some(arm) => arm.ucb(exploration, self.total_selections),
                None => f64::INFINITY,
            };

            if score.is_infinite() {
                best = Some((term, score));
                break;
            }
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((term, score)),
            }
        }

        let (term, score) = best?;
        let term = term.to_string();
        tracing::debug!(
            "🎯 Selected '{}' (ucb: {:.3}, exploration: {:.3}, t: {})",
            term,
            score,
            exploration,
            self.total_selections
        );

        // Arms come into existence the first time they are picked
        self.arms.entry(term.clone()).or_default();
        Some(term)
    }

    /// Record a reward for a term. Rewards are not clamped, but a
    /// non-finite reward is dropped and `false` returned.
    pub fn update(&mut self, term: &str, reward: f64) -> bool {
        if !reward.is_finite() {
            tracing::warn!("⚠️ Ignoring non-finite reward {} for '{}'", reward, term);
            return false;
        }
        let arm = self.arms.entry(term.to_string()).or_default();
        arm.record(reward);
        self.total_selections += 1;
        true
    }

    pub fn arm(&self, term: &str) -> Option<&ArmRecord> {
        self.arms.get(term)
    }

    pub fn arm_count(&self) -> usize {
        self.arms.len()
    }

    pub fn total_selections(&self) -> u64 {
        self.total_selections
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    pub fn snapshot(&self) -> BanditSnapshot {
        let mut arms: Vec<(String, ArmRecord)> = self
            .arms
            .iter()
            .map(|(t, a)| (t.clone(), a.clone()))
            .collect();
        arms.sort_by(|a, b| a.0.cmp(&b.0));

        BanditSnapshot {
            version: STATE_VERSION,
            arms,
            total_selections: self.total_selections,
        }
    }

    /// Replace in-memory state with a snapshot
    pub fn restore(&mut self, snapshot: BanditSnapshot) -> LexaResult<()> {
        if snapshot.version != STATE_VERSION {
            return Err(LexaError::persistence(format!(
                "bandit snapshot version {} (expected {})",
                snapshot.version, STATE_VERSION
            )));
        }
        if snapshot
            .arms
            .iter()
            .any(|(_, arm)| !arm.cumulative_reward.is_finite())
        {
            return Err(LexaError::persistence("bandit snapshot holds non-finite rewards"));
        }
        self.arms = snapshot.arms.into_iter().collect();
        self.total_selections = snapshot.total_selections;
        Ok(())
    }

    /// Human-readable arm table, best average first
    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "📈 Vocabulary arms (t={}, c={:.3}):",
            self.total_selections,
            self.exploration_constant()
        )];

        let mut sorted: Vec<_> = self.arms.iter().collect();
        sorted.sort_by(|a, b| {
            b.1.average_reward()
                .partial_cmp(&a.1.average_reward())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        for (term, arm) in sorted {
            lines.push(format!(
                "  {:15} avg:{:.2} total:{:.2} uses:{}",
                term,
                arm.average_reward(),
                arm.cumulative_reward,
                arm.selections
            ));
        }

        lines.join("\n")
    }
}

impl Default for BanditSelector {
    fn default() -> Self {
        Self::new(BanditConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(arms: &[(&str, f64, u64)]) -> BanditSelector {
        let mut bandit = BanditSelector::default();
        for (term, reward, selections) in arms {
            bandit.arms.insert(
                term.to_string(),
                ArmRecord {
                    cumulative_reward: *reward,
                    selections: *selections,
                },
            );
            bandit.total_selections += selections;
        }
        bandit
    }

    #[test]
    fn test_higher_average_wins() {
        let mut bandit = seeded(&[("A", 1.0, 10), ("B", 9.0, 10)]);
        assert_eq!(bandit.total_selections(), 20);
        assert_eq!(bandit.select(&["A", "B"]).as_deref(), Some("B"));
    }

    #[test]
    fn test_unselected_candidate_wins() {
        let mut bandit = seeded(&[("A", 100.0, 1)]);
        assert_eq!(bandit.select(&["A", "new"]).as_deref(), Some("new"));
    }

    #[test]
    fn test_ties_go_to_first_candidate() {
        let mut bandit = BanditSelector::default();
        assert_eq!(bandit.select(&["x", "y", "z"]).as_deref(), Some("x"));

        let mut bandit = seeded(&[("x", 1.0, 2), ("y", 1.0, 2)]);
        assert_eq!(bandit.select(&["y", "x"]).as_deref(), Some("y"));
    }

    #[test]
    fn test_empty_candidates() {
        let mut bandit = BanditSelector::default();
        let none: [&str; 0] = [];
        assert_eq!(bandit.select(&none), None);
    }

    #[test]
    fn test_select_creates_arm_lazily() {
        let mut bandit = BanditSelector::default();
        bandit.select(&["a"]);
        assert_eq!(bandit.arm_count(), 1);
        assert_eq!(bandit.arm("a").map(|a| a.selections), Some(0));
        assert_eq!(bandit.total_selections(), 0);
    }

    #[test]
    fn test_update_is_additive() {
        let mut bandit = BanditSelector::default();
        bandit.update("a", 0.4);
        bandit.update("a", 0.6);
        bandit.update("b", 2.0);

        let a = bandit.arm("a").unwrap();
        assert_eq!(a.selections, 2);
        assert!((a.cumulative_reward - 1.0).abs() < 1e-12);
        assert_eq!(bandit.total_selections(), 3);
    }

    #[test]
    fn test_non_finite_reward_is_ignored() {
        let mut bandit = BanditSelector::default();
        assert!(bandit.update("a", 0.5));
        assert!(!bandit.update("a", f64::NAN));
        assert!(!bandit.update("a", f64::NEG_INFINITY));
        assert!(!bandit.update("b", f64::NAN));

        let a = bandit.arm("a").unwrap();
        assert_eq!(a.selections, 1);
        assert!((a.cumulative_reward - 0.5).abs() < 1e-12);
        assert!(bandit.arm("b").is_none());
        assert_eq!(bandit.total_selections(), 1);

        let json = serde_json::to_string(&bandit.snapshot()).unwrap();
        let snapshot: BanditSnapshot = serde_json::from_str(&json).unwrap();
        assert!(BanditSelector::default().restore(snapshot).is_ok());
    }

    #[test]
    fn test_restore_rejects_non_finite_rewards() {
        let mut snapshot = seeded(&[("A", 1.0, 2)]).snapshot();
        snapshot.arms[0].1.cumulative_reward = f64::NAN;
        let mut bandit = BanditSelector::default();
        assert!(bandit.restore(snapshot).is_err());
        assert_eq!(bandit.arm_count(), 0);
    }

    #[test]
    fn test_exploration_decays_to_floor() {
        let mut bandit = BanditSelector::default();
        assert!((bandit.exploration_constant() - 2f64.sqrt()).abs() < 1e-12);
        for _ in 0..1_000 {
            bandit.update("a", 0.0);
        }
        assert_eq!(bandit.exploration_constant(), 0.1);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let mut bandit = seeded(&[("A", 1.0, 10), ("B", 9.0, 10)]);
        let snapshot = bandit.snapshot();

        let mut restored = BanditSelector::default();
        restored.restore(snapshot).unwrap();
        assert_eq!(restored.total_selections(), 20);
        assert_eq!(
            restored.select(&["A", "B", "A"]),
            bandit.select(&["A", "B", "A"])
        );
    }

    #[test]
    fn test_restore_rejects_wrong_version() {
        let mut snapshot = BanditSelector::default().snapshot();
        snapshot.version += 1;
        assert!(BanditSelector::default().restore(snapshot).is_err());
    }
}
