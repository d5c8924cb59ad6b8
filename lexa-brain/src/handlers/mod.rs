//! HTTP route handlers for Lexa Brain
//!
//! Organized by functional area:
//! - `health`: Health check endpoint
//! - `statistics`: Co-occurrence ingestion, pair statistics, diagnostics
//! - `vocabulary`: Bandit selection and rewards
//! - `quality`: Quality prediction and learning

pub mod health;
pub mod quality;
pub mod statistics;
pub mod vocabulary;

use std::sync::Arc;
use warp::Filter;

use lexa_brain::VocabularyLearner;

/// Shared application state for handlers
#[derive(Clone)]
pub struct AppState {
    pub learner: Arc<VocabularyLearner>,
}

/// Compose all routes into a single filter
pub fn routes(
    state: AppState,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let health = health::route();

    let statistics_routes = statistics::routes(state.learner.clone());

    let vocabulary_routes = vocabulary::routes(state.learner.clone());

    let quality_routes = quality::routes(state.learner);

    health
        .or(statistics_routes)
        .or(vocabulary_routes)
        .or(quality_routes)
}
