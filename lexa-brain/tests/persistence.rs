//! Saved state reloads into a fresh learner with identical behavior

use lexa_brain::{ModelUsed, PersistenceStatus, StateStore, VocabularyLearner};
use lexa_core::{ContentItem, LexaConfig, PersistenceConfig, PersistenceFormat};
use tempfile::tempdir;

const WORDS: [&str; 12] = [
    "ねこ", "いぬ", "さかな", "とり", "うま", "うし", "ひつじ", "さる", "ぶた", "くま", "きつね",
    "たぬき",
];

fn config_in(dir: &std::path::Path, format: PersistenceFormat) -> LexaConfig {
    LexaConfig {
        persistence: PersistenceConfig {
            data_dir: dir.to_path_buf(),
            format,
            timeout_ms: 5_000,
        },
        ..LexaConfig::default()
    }
}

fn item(i: usize) -> ContentItem {
    let text = format!("{}{}", WORDS[i % WORDS.len()], "ー".repeat(i % 7));
    ContentItem::new(format!("{}{}", text, i))
        .with_frequency((i * 37 % 500) as u64)
        .with_relevance((i % 10) as f64 / 10.0)
}

fn trained_learner(config: LexaConfig) -> VocabularyLearner {
    let learner = VocabularyLearner::new(config);
    for i in 0..50 {
        let quality = 0.2 + 0.06 * (i % 10) as f64;
        learner.learn_from_response(&item(i), quality);
    }
    for _ in 0..4 {
        learner.update_rewards("ねこ", 0.8);
        learner.update_rewards("いぬ", 0.3);
    }
    learner.update_rewards("とり", 0.5);
    learner
}

#[tokio::test]
async fn test_round_trip_reproduces_predictions_and_selection() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path(), PersistenceFormat::Bincode);
    let store = StateStore::new(config.persistence.clone());

    let original = trained_learner(config.clone());
    assert!(original.diagnostics().regression.trained);
    assert_eq!(original.persist(&store).await, PersistenceStatus::Saved);

    let restored = VocabularyLearner::new(config);
    assert_eq!(restored.load(&store).await, PersistenceStatus::Loaded);

    let unseen = ContentItem::new("あたらしいことば").with_relevance(0.7);
    let before = original.predict_quality(&unseen);
    let after = restored.predict_quality(&unseen);
    assert_eq!(after.model_used, ModelUsed::Regression);
    assert_eq!(before.quality_score, after.quality_score);
    assert_eq!(before.confidence, after.confidence);
    assert_eq!(before.grade, after.grade);

    let candidates = ["ねこ", "いぬ", "とり"];
    assert_eq!(
        original.select_vocabulary(&candidates),
        restored.select_vocabulary(&candidates)
    );

    let d = restored.diagnostics();
    assert_eq!(d.regression.samples, 50);
    assert_eq!(d.bandit.total_selections, 9);
}

#[tokio::test]
async fn test_json_round_trip_keeps_state() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path(), PersistenceFormat::Json);
    let store = StateStore::new(config.persistence.clone());

    let original = trained_learner(config.clone());
    assert_eq!(original.persist(&store).await, PersistenceStatus::Saved);
    assert!(dir.path().join("bandit.json").exists());
    assert!(dir.path().join("regression.json").exists());

    let restored = VocabularyLearner::new(config);
    assert_eq!(restored.load(&store).await, PersistenceStatus::Loaded);

    let a = original.diagnostics();
    let b = restored.diagnostics();
    assert_eq!(a.regression.samples, b.regression.samples);
    assert_eq!(a.regression.trained, b.regression.trained);
    assert_eq!(a.bandit.arms, b.bandit.arms);
    for ((name_a, wa), (name_b, wb)) in a.regression.weights.iter().zip(&b.regression.weights) {
        assert_eq!(name_a, name_b);
        assert!((wa - wb).abs() < 1e-12);
    }
}

#[tokio::test]
async fn test_missing_state_starts_fresh() {
    let dir = tempdir().unwrap();
    let config = config_in(&dir.path().join("never-written"), PersistenceFormat::Bincode);
    let store = StateStore::new(config.persistence.clone());

    let learner = VocabularyLearner::new(config);
    assert_eq!(learner.load(&store).await, PersistenceStatus::Missing);
    assert!(!learner.diagnostics().regression.trained);
}

#[tokio::test]
async fn test_non_finite_feedback_still_round_trips_as_json() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path(), PersistenceFormat::Json);
    let store = StateStore::new(config.persistence.clone());

    let learner = trained_learner(config.clone());
    let outcome = learner.learn_from_response(&item(3), f64::NAN);
    assert!(!outcome.accepted);
    assert!(!learner.update_rewards("ねこ", f64::INFINITY));
    assert!(learner.diagnostics().regression.r_squared.is_finite());

    assert_eq!(learner.persist(&store).await, PersistenceStatus::Saved);
    let restored = VocabularyLearner::new(config);
    assert_eq!(restored.load(&store).await, PersistenceStatus::Loaded);
    assert_eq!(restored.diagnostics().regression.samples, 50);
    assert_eq!(restored.diagnostics().bandit.total_selections, 9);
}
