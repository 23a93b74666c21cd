//! The execution engine (spec.md §4.6, C6): drives one `Plan` through a
//! single sample at a time, in plan order, honouring `Looper` sub-paths.
//!
//! Grounded on the driver loop implicit in the original's `MEMpp::computeWeights`
//! (`examples/original_source/include/MEMpp.h`), which hands each Cuba sample
//! point to the integrand callback and collects a weight; this port makes the
//! per-module plan-order walk and the sub-path recursion explicit instead of
//! leaving them inside the Cuba callback.

use crate::error::RuntimeError;
use crate::lorentz::{LorentzVector, Particle};
use crate::module::Status;
use crate::plan::Plan;
use crate::value::ProducerHandle;

/// Drives one `Plan`. Each `Engine` owns its `Plan` (and therefore its
/// `Pool`) exclusively; the integrator adapter keeps one `Engine` per
/// replica so no module is ever entered concurrently (spec.md §5).
pub struct Engine {
    plan: Plan,
    ps_points: ProducerHandle<Vec<f64>>,
    ps_weight: ProducerHandle<f64>,
    input_p4: ProducerHandle<Vec<LorentzVector>>,
    input_type: ProducerHandle<Vec<i64>>,
    met_p4: ProducerHandle<LorentzVector>,
}

impl Engine {
    /// Build an engine around an already-frozen `Plan`, wiring up handles to
    /// the internal pseudo-module slots (`cuba::*`, `input::*`, `met::*`)
    /// the builder reserved but never assigns a producer to at freeze time —
    /// those are populated here, by the harness, each sample/event.
    pub fn new(plan: Plan) -> Result<Self, crate::value::PoolError> {
        use crate::input_tag::InputTag;

        let ps_points = plan.pool.put::<Vec<f64>>(&InputTag::new("cuba", "ps_points"))?;
        let ps_weight = plan.pool.put::<f64>(&InputTag::new("cuba", "ps_weight"))?;
        let input_p4 = plan.pool.put::<Vec<LorentzVector>>(&InputTag::new("input", "p4"))?;
        let input_type = plan.pool.put::<Vec<i64>>(&InputTag::new("input", "type"))?;
        let met_p4 = plan.pool.put::<LorentzVector>(&InputTag::new("met", "p4"))?;

        Ok(Engine {
            plan,
            ps_points,
            ps_weight,
            input_p4,
            input_type,
            met_p4,
        })
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn begin_integration(&mut self) {
        self.plan.main.begin_integration();
        for sub in self.plan.sub_paths.values_mut() {
            sub.begin_integration();
        }
    }

    pub fn end_integration(&mut self) {
        self.plan.main.end_integration();
        for sub in self.plan.sub_paths.values_mut() {
            sub.end_integration();
        }
    }

    pub fn finish(&mut self) {
        self.plan.main.finish();
        for sub in self.plan.sub_paths.values_mut() {
            sub.finish();
        }
    }

    /// Event binding (spec.md §4.6): populate `input::p4`/`input::type` from
    /// the given particles, in declared order, and optionally `met::p4`.
    pub fn bind_event(&mut self, particles: &[Particle], met: Option<LorentzVector>) {
        let p4s: Vec<LorentzVector> = particles.iter().map(|p| p.p4).collect();
        let types: Vec<i64> = particles.iter().map(|p| p.pdg_id).collect();
        self.input_p4.set(p4s);
        self.input_type.set(types);
        self.met_p4.set(met.unwrap_or_else(LorentzVector::zero));
    }

    /// Evaluate the integrand(s) at one unit-hypercube point, returning one
    /// value per `momemta.integrands` sink, in declared order. A `Status`
    /// other than `Ok` from a main-Path module means this sample contributes
    /// 0 to every integrand (spec.md §4.4, §4.6).
    pub fn evaluate_sample(&mut self, point: &[f64], jacobian: f64) -> Result<Vec<f64>, RuntimeError> {
        self.ps_points.set(point.to_vec());
        self.ps_weight.set(jacobian);

        let mut entries_status = Status::Ok;
        for i in 0..self.plan.main.len() {
            let sub_path_name = {
                let mut iter = self.plan.main.iter_mut().skip(i);
                let entry = iter.next().expect("index in range");
                entry.instance.sub_path_name().map(|s| s.to_string())
            };

            let status = if let Some(key) = sub_path_name {
                self.run_looper(&key)?
            } else {
                let mut iter = self.plan.main.iter_mut().skip(i);
                let entry = iter.next().expect("index in range");
                entry.instance.work().map_err(|mut e| {
                    if e.module.is_empty() {
                        e.module = entry.name.clone();
                    }
                    e
                })?
            };

            if status != Status::Ok {
                entries_status = status;
                break;
            }
        }

        if entries_status != Status::Ok {
            return Ok(vec![0.0; self.plan.integrand_tags.len()]);
        }

        self.read_integrands()
    }

    /// Drives one `Looper`'s sub-path for the whole of its current sample:
    /// `beginLoop` once (accumulators reset here, e.g. `Summer`), then
    /// `work` once per iteration, then `endLoop` once. Only the per-sample
    /// session is bracketed, not each individual iteration, so a `Summer`
    /// sitting on the sub-path sees every iteration's contribution before it
    /// is read back out through the pool.
    fn run_looper(&mut self, key: &str) -> Result<Status, RuntimeError> {
        let iterations = {
            let entry = self
                .plan
                .main
                .iter_mut()
                .find(|e| e.instance.sub_path_name() == Some(key))
                .expect("looper entry exists for its own sub-path key");
            entry.instance.iteration_count()
        };

        let Some(sub) = self.plan.sub_paths.get_mut(key) else {
            return Ok(Status::Ok);
        };

        sub.begin_loop();
        for _ in 0..iterations {
            match sub.run_work()? {
                Status::Ok | Status::NextCombination => continue,
                Status::AbortLoop => break,
            }
        }
        sub.end_loop();

        // A Looper's own status to the main Path is always Ok: AbortLoop and
        // NextCombination are meaningful only within the sub-path's own
        // iterations, not as a signal to the enclosing path.
        Ok(Status::Ok)
    }

    fn read_integrands(&self) -> Result<Vec<f64>, RuntimeError> {
        let mut values = Vec::with_capacity(self.plan.integrand_tags.len());
        for tag in &self.plan.integrand_tags {
            let handle = self.plan.pool.get::<f64>(tag).map_err(|e| RuntimeError {
                module: tag.module.clone(),
                message: e.to_string(),
            })?;
            values.push(handle.get());
        }
        Ok(values)
    }
}
