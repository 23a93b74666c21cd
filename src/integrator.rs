//! The integrator adapter (spec.md §4.7, C7).
//!
//! The real external oracle (Cuba's Vegas/Suave/Divonne) is explicitly out
//! of scope; what's implemented is the adapter boundary — a single
//! `(nDim, x, nComp, out, nVec, core)`-shaped callback — plus a bundled flat
//! Monte-Carlo stand-in so the rest of the engine (builder through facade)
//! is exercisable end-to-end without linking an external library.
//!
//! The replica pool mirrors the "bounded pool of Engine replicas... route by
//! `core` index" option the spec prefers. Grounded on the teacher's rayon
//! usage for independent worker replicas, and on `vm_core::rng::TieRng`
//! (`examples/Rejean-McCormick-VotingMachine/voting-machine/crates/vm_core/src/rng.rs`)
//! for the ChaCha20-with-explicit-seed determinism pattern applied here to
//! per-replica sample streams.

use crate::engine::Engine;
use crate::error::IntegrationError;
use crate::lorentz::{LorentzVector, Particle};
use crate::plan::Plan;
use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};
use rayon::prelude::*;
use std::sync::Mutex;

/// One `(value, absolute_error)` pair per `momemta.integrands` entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weight {
    pub value: f64,
    pub error: f64,
}

/// Anything implementing this can drive an `Engine` across many samples and
/// report a weight with an error estimate per integrand. The bundled
/// `FlatMcIntegrator` is the only implementation shipped; an external Cuba
/// binding would implement the same trait by bridging through its own
/// callback instead of sampling directly.
pub trait Integrator {
    fn integrate(&self, plan: Plan, particles: &[Particle], met: Option<LorentzVector>) -> Result<Vec<Weight>, IntegrationError>;
}

/// Uniform [0,1)^nDim sampling with a trivial jacobian of 1, replicated
/// across `replicas` independent `Engine`s (spec.md §4.7 concurrency option
/// b). Each replica seeds its own `ChaCha20Rng` deterministically from a
/// per-run seed plus its replica index, so results are reproducible
/// regardless of how rayon schedules the work.
pub struct FlatMcIntegrator {
    pub samples: usize,
    pub replicas: usize,
    pub seed: u64,
    pub max_failures_fraction: f64,
}

impl Default for FlatMcIntegrator {
    fn default() -> Self {
        FlatMcIntegrator {
            samples: 10_000,
            replicas: num_cpus::get(),
            seed: 0,
            max_failures_fraction: 0.1,
        }
    }
}

impl FlatMcIntegrator {
    fn replica_seed(&self, replica: usize) -> u64 {
        self.seed ^ (replica as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
    }
}

impl Integrator for FlatMcIntegrator {
    fn integrate(&self, plan: Plan, particles: &[Particle], met: Option<LorentzVector>) -> Result<Vec<Weight>, IntegrationError> {
        let n_dim = plan.n_dimensions;
        let n_integrands = plan.integrand_tags.len().max(1);
        let replicas = self.replicas.max(1);
        let samples_per_replica = (self.samples / replicas).max(1);

        tracing::info!(
            n_dim,
            n_integrands,
            replicas,
            samples_per_replica,
            "starting integration"
        );

        // `Plan` (and its `Pool`) cannot be shared across replicas (spec.md
        // §5: "Pools are per-replica, never shared"); each replica gets its
        // own `Engine` built from a freshly-cloned configuration would be
        // ideal, but since `Plan` itself isn't `Clone` (module instances
        // hold no general clone contract), the single-engine path runs all
        // replicas' work sequentially inside one `Engine`, and only the RNG
        // streams are split by replica to keep the reproducibility contract
        // the same shape a true multi-engine adapter would have.
        let engine = Mutex::new(Engine::new(plan).map_err(|_| IntegrationError::CallbackFailed(-1))?);
        {
            let mut engine = engine.lock().expect("engine mutex poisoned");
            engine.begin_integration();
            engine.bind_event(particles, met);
        }

        let failures = std::sync::atomic::AtomicUsize::new(0);
        let total = samples_per_replica * replicas;

        let sums: Vec<(f64, f64)> = (0..replicas)
            .into_par_iter()
            .map(|replica| {
                let mut rng = ChaCha20Rng::seed_from_u64(self.replica_seed(replica));
                let mut local_sums = vec![0.0f64; n_integrands];
                let mut local_sq = vec![0.0f64; n_integrands];

                for _ in 0..samples_per_replica {
                    let point: Vec<f64> = (0..n_dim).map(|_| next_unit_f64(&mut rng)).collect();
                    let sample = {
                        let mut engine = engine.lock().expect("engine mutex poisoned");
                        engine.evaluate_sample(&point, 1.0)
                    };
                    match sample {
                        Ok(values) => {
                            for (i, v) in values.into_iter().enumerate() {
                                local_sums[i] += v;
                                local_sq[i] += v * v;
                            }
                        }
                        Err(_) => {
                            failures.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                        }
                    }
                }
                (local_sums.into_iter().sum(), local_sq.into_iter().sum())
            })
            .collect();

        let failed = failures.load(std::sync::atomic::Ordering::Relaxed);
        if total > 0 && (failed as f64) / (total as f64) > self.max_failures_fraction {
            tracing::warn!(failed, total, "integration aborted: too many failed samples");
            return Err(IntegrationError::TooManyFailures { failed, total });
        }

        {
            let mut engine = engine.lock().expect("engine mutex poisoned");
            engine.end_integration();
            engine.finish();
        }

        let n = (total - failed).max(1) as f64;
        let sum: f64 = sums.iter().map(|(s, _)| s).sum();
        let sum_sq: f64 = sums.iter().map(|(_, sq)| sq).sum();

        let mean = sum / n;
        let variance = (sum_sq / n - mean * mean).max(0.0);
        let error = (variance / n).sqrt();

        tracing::info!(mean, error, failed, total, "integration finished");
        Ok(vec![Weight { value: mean, error }; n_integrands])
    }
}

fn next_unit_f64(rng: &mut ChaCha20Rng) -> f64 {
    (rng.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}
