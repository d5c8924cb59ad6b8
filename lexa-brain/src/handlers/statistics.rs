//! Co-occurrence ingestion, pair statistics and diagnostics

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use warp::Filter;

use lexa_brain::VocabularyLearner;

#[derive(Debug, Deserialize)]
struct PairObservation {
    a: String,
    b: String,
    #[serde(default = "one")]
    count: u64,
}

fn one() -> u64 {
    1
}

#[derive(Debug, Deserialize)]
struct ObserveRequest {
    #[serde(default)]
    pairs: Vec<PairObservation>,
    /// Tokenized windows; every distinct pair inside counts once
    #[serde(default)]
    windows: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct FrequencyRequest {
    frequencies: HashMap<String, u64>,
    /// Replace the whole table instead of merging
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    vocabulary_size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct AssociationRequest {
    term_a: String,
    term_b: String,
    #[serde(default)]
    pos_overlap: f64,
}

/// Combine all statistics routes
pub fn routes(
    learner: Arc<VocabularyLearner>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    stats(learner.clone())
        .or(observe(learner.clone()))
        .or(frequencies(learner.clone()))
        .or(association(learner))
}

/// GET /stats - Diagnostics for every component
fn stats(
    learner: Arc<VocabularyLearner>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    warp::path("stats").and(warp::get()).map(move || {
        let d = learner.diagnostics();
        warp::reply::json(&d)
    })
}

/// POST /observe - Record co-occurrences
fn observe(
    learner: Arc<VocabularyLearner>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    warp::path("observe")
        .and(warp::post())
        .and(warp::body::json())
        .map(move |req: ObserveRequest| {
            for pair in &req.pairs {
                learner.observe_pair(&pair.a, &pair.b, pair.count);
            }
            let window_pairs: usize = req
                .windows
                .iter()
                .map(|w| learner.observe_window(w.as_slice()))
                .sum();

            warp::reply::json(&serde_json::json!({
                "pairs": req.pairs.len(),
                "window_pairs": window_pairs,
            }))
        })
}

/// POST /frequencies - Update the term-frequency table
fn frequencies(
    learner: Arc<VocabularyLearner>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    warp::path("frequencies")
        .and(warp::post())
        .and(warp::body::json())
        .map(move |req: FrequencyRequest| {
            let terms = req.frequencies.len();
            if req.replace {
                learner.load_frequencies(req.frequencies);
            } else {
                for (term, frequency) in &req.frequencies {
                    learner.set_term_frequency(term, *frequency);
                }
            }
            if let Some(size) = req.vocabulary_size {
                learner.set_vocabulary_size(size);
            }

            warp::reply::json(&serde_json::json!({
                "terms": terms,
                "vocabulary_size": learner.diagnostics().vocabulary_size,
            }))
        })
}

/// POST /association - PMI, significance and quality of a pair
fn association(
    learner: Arc<VocabularyLearner>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    warp::path("association")
        .and(warp::post())
        .and(warp::body::json())
        .map(move |req: AssociationRequest| {
            let pmi = learner.calculate_pmi(&req.term_a, &req.term_b);
            let significance = learner.calculate_significance(&req.term_a, &req.term_b);
            let quality = learner.calculate_quality(&req.term_a, &req.term_b, req.pos_overlap);

            warp::reply::json(&serde_json::json!({
                "term_a": req.term_a,
                "term_b": req.term_b,
                "pmi": pmi,
                "significance": {
                    "reason": significance.reason.as_str(),
                    "detail": significance,
                },
                "quality": quality,
            }))
        })
}
