//! # Lexa Brain
//!
//! The learning side of Lexa:
//! - **statistics**: PMI, chi-square significance and pair quality
//! - **bandit**: UCB1 selection of the next vocabulary item
//! - **regression**: feature extraction and a ridge quality model
//! - **learner**: all of the above behind one thread-safe facade
//! - **persistence**: named snapshots on disk

pub mod bandit;
pub mod learner;
pub mod persistence;
pub mod regression;
pub mod statistics;

pub use bandit::{ArmRecord, BanditSelector, BanditSnapshot};
pub use learner::{Diagnostics, NamedFeature, QualityReport, VocabularyLearner};
pub use persistence::{PersistenceStatus, StateStore};
pub use regression::{
    FitOutcome, LearnOutcome, ModelUsed, Prediction, RegressionQualityModel, RegressionSnapshot,
    SolvePath, Suggestion, TrainingSample,
};
pub use statistics::{
    AssociationStatisticsEngine, CacheStats, PmiScore, QualityScore, Significance,
    SignificanceReason,
};
