//! Ambient run configuration: replica count, sample-failure tolerance, RNG
//! seeding and logging, loaded hierarchically the way the teacher's
//! `Config` is (`config.toml` < `config.local.toml` < environment). Distinct
//! from `crate::configuration`, which is the typed physics value tree the
//! graph builder consumes — this is the engine's own operational knobs.

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub integration: IntegrationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationConfig {
    /// Total Monte-Carlo samples requested per `computeWeights` call.
    #[serde(default = "default_samples")]
    pub samples: usize,

    /// Number of `Engine` replicas the integrator adapter keeps (spec.md
    /// §4.7); 0 means "use all available cores".
    #[serde(default)]
    pub replicas: usize,

    /// Seed for the bundled flat Monte-Carlo integrator's RNG streams.
    #[serde(default)]
    pub seed: u64,

    /// Fraction of failed samples (module `work()` returning a non-`Ok`
    /// runtime error, not a `NextCombination`/`AbortLoop` status) tolerated
    /// before integration aborts with `TooManyFailures`.
    #[serde(default = "default_max_failures_fraction")]
    pub max_failures_fraction: f64,
}

fn default_samples() -> usize {
    10_000
}

fn default_max_failures_fraction() -> f64 {
    0.1
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        IntegrationConfig {
            samples: default_samples(),
            replicas: 0,
            seed: 0,
            max_failures_fraction: default_max_failures_fraction(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            integration: IntegrationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Merge `momemta.toml` < `momemta.local.toml` < `MOMEMTA_*` environment
    /// overrides (double-underscore nesting, e.g. `MOMEMTA_INTEGRATION__SEED`).
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(figment::providers::Serialized::defaults(EngineConfig::default()))
            .merge(Toml::file("momemta.toml"))
            .merge(Toml::file("momemta.local.toml"))
            .merge(Env::prefixed("MOMEMTA_").split("__"))
            .extract()
    }

    pub fn from_file(path: &str) -> Result<Self, figment::Error> {
        Figment::from(figment::providers::Serialized::defaults(EngineConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("MOMEMTA_").split("__"))
            .extract()
    }
}
