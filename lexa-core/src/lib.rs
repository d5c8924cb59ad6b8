//! # Lexa Core
//!
//! Core types for Lexa, a statistical vocabulary learner.
//!
//! This crate provides the building blocks the learning components share:
//! - **SparseAssociationMatrix**: symmetric co-occurrence counts
//! - **TermIndex**: dense term ↔ ID mapping
//! - **LinearSolver**: the matrix-inversion seam used by the regression
//! - **LexaConfig**: one versioned configuration per component
//!
//! Nothing here learns. The engines that do live in `lexa-brain`.

pub mod config;
pub mod error;
pub mod linalg;
pub mod matrix;
pub mod term;
pub mod types;

// Re-export main types at crate root
pub use config::{
    BanditConfig, LexaConfig, PersistenceConfig, PersistenceFormat, QualityWeights,
    RegressionConfig, StatisticsConfig,
};
pub use error::{LexaError, LexaResult};
pub use linalg::{GaussJordan, LinearSolver};
pub use matrix::SparseAssociationMatrix;
pub use term::{TermId, TermIndex};
pub use types::{ContentItem, FeatureVector, Grade, StatisticalSignals, FEATURE_COUNT, FEATURE_NAMES};

/// Current version of the persisted state layout
pub const STATE_VERSION: u32 = 1;
