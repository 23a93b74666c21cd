//! The public-facing entry point (spec.md §6): construct once from a
//! registry + configuration, call `compute_weights` per event.
//!
//! Grounded on the original's `MEMpp` facade
//! (`examples/original_source/include/MEMpp.h`): one object owns the pool,
//! the constructed modules and the loaded plugin libraries, and exposes
//! `computeWeights(particles)`. This port splits the pool/modules bundle
//! into `Plan` and keeps the plugin libraries in `PluginLoader`, but the
//! facade itself plays the same role.

use crate::builder::build;
use crate::config::EngineConfig;
use crate::configuration::TopLevelConfig;
use crate::error::MomemtaError;
use crate::integrator::{FlatMcIntegrator, Integrator, Weight};
use crate::lorentz::{LorentzVector, Particle};
use crate::plugin::PluginLoader;
use crate::registry::Registry;
use std::path::Path;
use std::sync::Arc;

/// Top-level handle: a registry (builtins plus anything loaded via
/// `load_plugin`), the engine configuration, and the integrator strategy.
pub struct Momemta {
    registry: Arc<Registry>,
    plugins: PluginLoader,
    config: EngineConfig,
}

impl Momemta {
    pub fn new(config: EngineConfig) -> Self {
        let registry = Arc::new(Registry::new());
        crate::modules::register_builtins(&registry);
        Momemta {
            registry,
            plugins: PluginLoader::new(),
            config,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Load a matrix-element plugin shared library, self-registering its
    /// module types into this instance's registry (spec.md §4.8).
    pub fn load_plugin(&self, path: impl AsRef<Path>) -> Result<(), MomemtaError> {
        self.plugins.load(path, &self.registry).map_err(MomemtaError::from)
    }

    /// Build a fresh `Plan` from a configuration tree and run the bundled
    /// Monte-Carlo integrator over `particles` (and optional MET), returning
    /// one `(value, error)` pair per declared integrand, in declared order.
    pub fn compute_weights(
        &self,
        config: &TopLevelConfig,
        particles: &[Particle],
        met: Option<LorentzVector>,
    ) -> Result<Vec<Weight>, MomemtaError> {
        let plan = build(&self.registry, config)?;
        let integrator = FlatMcIntegrator {
            samples: self.config.integration.samples,
            replicas: if self.config.integration.replicas == 0 {
                num_cpus::get()
            } else {
                self.config.integration.replicas
            },
            seed: self.config.integration.seed,
            max_failures_fraction: self.config.integration.max_failures_fraction,
        };
        Ok(integrator.integrate(plan, particles, met)?)
    }
}
