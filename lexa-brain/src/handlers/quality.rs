//! Quality prediction and learning endpoints

use lexa_core::ContentItem;
use serde::Deserialize;
use std::sync::Arc;
use warp::Filter;

use lexa_brain::VocabularyLearner;

#[derive(Debug, Deserialize)]
struct LearnRequest {
    content: ContentItem,
    quality: f64,
}

/// Combine all quality routes
pub fn routes(
    learner: Arc<VocabularyLearner>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    predict(learner.clone()).or(learn(learner))
}

/// POST /predict - Score a content item
fn predict(
    learner: Arc<VocabularyLearner>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    warp::path("predict")
        .and(warp::post())
        .and(warp::body::json())
        .map(move |content: ContentItem| {
            let report = learner.predict_quality(&content);
            warp::reply::json(&report)
        })
}

/// POST /learn - Observed quality for a content item
fn learn(
    learner: Arc<VocabularyLearner>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    warp::path("learn")
        .and(warp::post())
        .and(warp::body::json())
        .map(move |req: LearnRequest| {
            let outcome = learner.learn_from_response(&req.content, req.quality);
            warp::reply::json(&outcome)
        })
}
