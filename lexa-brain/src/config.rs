//! Lexa Brain service configuration
//!
//! Process-level knobs for the HTTP service. Learning parameters live in
//! `lexa_core::LexaConfig`.

use std::env;
use std::path::PathBuf;

/// Service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP port
    pub port: u16,
    /// Seconds between autosaves
    pub autosave_secs: u64,
    /// Optional JSON file with a full `LexaConfig`
    pub config_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8787,
            autosave_secs: 60,
            config_file: None,
        }
    }
}

impl Config {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(port) = env::var("LEXA_PORT") {
            if let Ok(p) = port.parse() {
                config.port = p;
            }
        }

        if let Ok(secs) = env::var("LEXA_AUTOSAVE_SECS") {
            if let Ok(s) = secs.parse::<u64>() {
                config.autosave_secs = s.max(1);
            }
        }

        if let Ok(path) = env::var("LEXA_CONFIG") {
            if !path.is_empty() {
                config.config_file = Some(PathBuf::from(path));
            }
        }

        config
    }
}

/// Print startup banner with config info
pub fn print_banner(config: &Config, learning: &lexa_core::LexaConfig) {
    println!();
    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║          📚 Lexa Brain - Vocabulary Learner 📚           ║");
    println!("╠══════════════════════════════════════════════════════════╣");
    println!("║  Port: {:>11}                                       ║", config.port);
    println!("║  Autosave: {:>6}s                                       ║", config.autosave_secs);
    println!("║  Data: {:>11}                                       ║", learning.persistence.data_dir.display());
    println!("║  Format: {:>9}                                       ║", format!("{:?}", learning.persistence.format));
    println!("║  Significance: p < {:<6}                               ║", learning.statistics.significance_level);
    println!("╚══════════════════════════════════════════════════════════╝");
    println!();
}
