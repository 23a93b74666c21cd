//! Module instances (spec.md §3 "Module Instance", §4.4, C4).
//!
//! Every module is polymorphic over the same small capability set. Defaults
//! are no-ops, mirroring the original's `Module` base class
//! (`examples/original_source/include/Module.h`): `configure`, `work` and
//! `finish` were the only overridable points there; this port adds the
//! begin/end-of-integration and begin/end-of-loop hooks spec.md's lifecycle
//! requires (§4.4) plus `leafModule` for pruning.

use crate::error::RuntimeError;
use crate::value::Pool;
use std::sync::Arc;

/// Outcome of a single `work()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Proceed normally.
    Ok,
    /// Ask the enclosing `Looper` to move on to the next iteration,
    /// short-circuiting the remaining modules in the current one. In the
    /// main Path, any non-`Ok` status means "this sample contributes 0".
    NextCombination,
    /// End the enclosing loop early.
    AbortLoop,
}

/// Shared context handed to every module at construction time: its own name
/// (for producing outputs) and the pool it reads/writes against.
#[derive(Clone)]
pub struct ModuleContext {
    name: String,
    pool: Arc<Pool>,
}

impl ModuleContext {
    pub fn new(name: impl Into<String>, pool: Arc<Pool>) -> Self {
        ModuleContext {
            name: name.into(),
            pool,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Allocate this module's own output slot, `(self.name, output)`.
    pub fn produce<T: crate::value::PoolValue>(
        &self,
        output: &str,
    ) -> Result<crate::value::ProducerHandle<T>, crate::value::PoolError> {
        self.pool.put(&crate::input_tag::InputTag::new(self.name.clone(), output))
    }
}

/// The capability set every module instance implements.
///
/// `work` is the only method with no default: a module that does nothing in
/// `work` (a pure side-effect sink configured entirely through `configure`)
/// should still say so explicitly, as `EmptyModule` does.
pub trait Module: Send {
    /// Called once, immediately after construction, before integration
    /// starts. Most modules do everything they need in their constructor and
    /// leave this as a no-op.
    fn configure(&mut self) {}

    /// Called once before the integrator starts sampling.
    fn begin_integration(&mut self) {}

    /// Called once per loop iteration, before `work`, for modules that live
    /// on a `Looper`'s sub-path. Accumulators reset their state here.
    fn begin_loop(&mut self) {}

    /// Called once per sample (main Path) or per loop iteration (sub-path).
    fn work(&mut self) -> Result<Status, RuntimeError>;

    /// Called once per loop iteration, after `work`.
    fn end_loop(&mut self) {}

    /// Called once after the integrator has finished sampling.
    fn end_integration(&mut self) {}

    /// Called once after `end_integration`, for any final cleanup/reporting.
    fn finish(&mut self) {}

    /// The number of unit-hypercube dimensions this module consumes from the
    /// integrator. Defaults to 0 (most modules don't sample anything new;
    /// they transform what a generator module already produced).
    fn dimensions(&self) -> usize {
        0
    }

    /// Modules that exist purely for a side effect (histograms,
    /// accumulators) return `true` so the builder's pruning pass keeps them
    /// alive even with no consumers, provided they are marked `sticky` in
    /// their schema.
    fn leaf_module(&self) -> bool {
        false
    }

    /// `Looper` overrides this to name the sub-path it drives (the key it
    /// was declared under, matching `Plan::sub_paths`). The engine checks
    /// this instead of `work()` for any module that owns a sub-path: rather
    /// than have every ordinary module guess whether it might be asked to
    /// recurse into one, only the one module type that actually does this
    /// opts in.
    fn sub_path_name(&self) -> Option<&str> {
        None
    }

    /// For a `Looper`, how many iterations its sub-path should run this
    /// sample (read from whatever upstream slot drives it — e.g. the number
    /// of surviving jet/lepton permutations). Meaningless for any module
    /// where `sub_path_name` returns `None`.
    fn iteration_count(&self) -> usize {
        0
    }
}

pub type ModuleInstance = Box<dyn Module>;
