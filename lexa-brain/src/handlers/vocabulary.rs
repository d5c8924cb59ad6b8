//! Vocabulary selection endpoints

use lexa_core::ContentItem;
use serde::Deserialize;
use std::sync::Arc;
use warp::Filter;

use lexa_brain::VocabularyLearner;

#[derive(Debug, Deserialize)]
struct SelectRequest {
    candidates: Vec<String>,
}

/// Either an explicit reward or content to score into one
#[derive(Debug, Deserialize)]
struct RewardRequest {
    term: String,
    #[serde(default)]
    reward: Option<f64>,
    #[serde(default)]
    content: Option<ContentItem>,
}

/// Combine all vocabulary routes
pub fn routes(
    learner: Arc<VocabularyLearner>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    select(learner.clone()).or(reward(learner))
}

/// POST /select - Next vocabulary item (UCB1)
fn select(
    learner: Arc<VocabularyLearner>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    warp::path("select")
        .and(warp::post())
        .and(warp::body::json())
        .map(move |req: SelectRequest| {
            let selected = learner.select_vocabulary(req.candidates.as_slice());
            warp::reply::json(&serde_json::json!({ "selected": selected }))
        })
}

/// POST /reward - Feed a reward to a term's arm
fn reward(
    learner: Arc<VocabularyLearner>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    warp::path("reward")
        .and(warp::post())
        .and(warp::body::json())
        .map(move |req: RewardRequest| {
            let reward = match (req.reward, &req.content) {
                (Some(r), _) => learner.update_rewards(&req.term, r).then_some(r),
                (None, Some(content)) => Some(learner.reward_from_quality(&req.term, content)),
                (None, None) => None,
            };

            match reward {
                Some(r) => warp::reply::with_status(
                    warp::reply::json(&serde_json::json!({
                        "term": req.term,
                        "reward": r,
                    })),
                    warp::http::StatusCode::OK,
                ),
                None => warp::reply::with_status(
                    warp::reply::json(&serde_json::json!({
                        "error": "a finite reward or content is required",
                    })),
                    warp::http::StatusCode::BAD_REQUEST,
                ),
            }
        })
}
