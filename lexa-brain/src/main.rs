//! Lexa Brain - vocabulary learning service
//!
//! Hosts one `VocabularyLearner` behind HTTP routes, restores its state on
//! start, autosaves it periodically and once more on shutdown.

mod config;
mod handlers;

use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::{print_banner, Config};
use lexa_brain::{PersistenceStatus, StateStore, VocabularyLearner};
use lexa_core::LexaConfig;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("LEXA_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();

    let learning = match &config.config_file {
        Some(path) => match LexaConfig::load(&path.to_string_lossy()) {
            Ok(c) => {
                info!("⚙️ Learning config loaded from {}", path.display());
                c
            }
            Err(e) => {
                warn!("⚠️ Cannot use {} ({}), falling back to environment", path.display(), e);
                LexaConfig::from_env()
            }
        },
        None => LexaConfig::from_env(),
    };
    let learning = match learning.validate() {
        Ok(()) => learning,
        Err(e) => {
            warn!("⚠️ Invalid learning config ({}), using defaults", e);
            LexaConfig::default()
        }
    };

    println!();
    println!("  Lexa Brain v{}", VERSION);
    print_banner(&config, &learning);

    let store = Arc::new(StateStore::new(learning.persistence.clone()));
    // Record the parameters this state was learned with
    if let Err(e) = store.save_named("config", &learning).await {
        warn!("Cannot record learning config: {}", e);
    }
    let learner = Arc::new(VocabularyLearner::new(learning));

    match learner.load(&store).await {
        PersistenceStatus::Failed(e) => warn!("Starting with empty state: {}", e),
        status => info!("State: {:?}", status),
    }

    // Auto-save periodically
    let learner_save = learner.clone();
    let store_save = store.clone();
    let autosave_secs = config.autosave_secs;
    let autosave = tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(autosave_secs));
        // First tick fires immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            learner_save.persist(&store_save).await;
        }
    });

    let routes = handlers::routes(handlers::AppState {
        learner: learner.clone(),
    });

    info!("Health check on http://0.0.0.0:{}/health", config.port);
    info!("Stats on http://0.0.0.0:{}/stats", config.port);
    info!("Observe on POST http://0.0.0.0:{}/observe", config.port);
    info!("Frequencies on POST http://0.0.0.0:{}/frequencies", config.port);
    info!("Association on POST http://0.0.0.0:{}/association", config.port);
    info!("Select on POST http://0.0.0.0:{}/select", config.port);
    info!("Reward on POST http://0.0.0.0:{}/reward", config.port);
    info!("Predict on POST http://0.0.0.0:{}/predict", config.port);
    info!("Learn on POST http://0.0.0.0:{}/learn", config.port);

    let (addr, server) = warp::serve(routes).bind_with_graceful_shutdown(
        ([0, 0, 0, 0], config.port),
        async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Cannot listen for ctrl-c: {}", e);
            }
        },
    );
    info!("📚 Lexa is listening on {}", addr);
    server.await;

    info!("Shutting down, saving state...");
    // No periodic save may race the final one
    autosave.abort();
    let _ = autosave.await;
    if let PersistenceStatus::Failed(e) = learner.persist(&store).await {
        warn!("Final save failed: {}", e);
    }
    info!("{}", learner.bandit_summary());
}
