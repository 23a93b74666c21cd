//! `Looper`: drives a sub-path through a data-dependent number of
//! iterations per sample — e.g. once per surviving jet/lepton permutation —
//! calling `beginLoop`/`work`/`endLoop` on its sub-path's modules each time
//! (spec.md §4.4, §4.6). The sub-path itself is built by
//! `crate::builder::build` from this instance's `path` attribute; this
//! module only needs to report its own name (so the engine can find its
//! sub-path in `Plan::sub_paths`) and the iteration count for the current
//! sample.
//!
//! There's no single `Looper.cc` in the original to port statement-for-
//! statement — the real MoMEMta expresses this as configuration-level
//! path/loop semantics baked into `Path`/`ConfigurationReader`
//! (`examples/original_source/include/momemta/Path.h`) rather than a
//! `Module` subclass — so this concrete type exists to give the engine
//! something uniform to call through `crate::module::Module`.

use crate::configuration::AttributeTable;
use crate::error::{ConfigurationError, RuntimeError};
use crate::module::{Module, ModuleContext, Status};
use crate::registry::Registry;
use crate::schema::{AttrDef, AttrType, ArgDef, ModuleDefBuilder};
use crate::value::ValueHandle;
use std::sync::Arc;

struct Looper {
    name: String,
    iterations: ValueHandle<usize>,
}

impl Module for Looper {
    fn work(&mut self) -> Result<Status, RuntimeError> {
        // The engine never calls `work` on a Looper directly — it checks
        // `sub_path_name` first and drives the sub-path instead — but the
        // trait requires an implementation, so this is what would run if
        // something did call it outside that protocol: a no-op.
        Ok(Status::Ok)
    }

    fn sub_path_name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn iteration_count(&self) -> usize {
        self.iterations.get()
    }
}

pub fn register(registry: &Registry) {
    registry
        .register(
            ModuleDefBuilder::new("Looper")
                .attribute(AttrDef::new("path", AttrType::Path))
                .input(ArgDef::input("iterations"))
                // A Looper produces no output another module can reference,
                // so without `sticky` it would never survive pruning even
                // though its sub-path's side effects (e.g. a Summer feeding
                // the integrand) are the whole point of declaring it.
                .sticky()
                .build(),
            Arc::new(|ctx: ModuleContext, attrs: &AttributeTable| {
                let iterations_tag = attrs.get("iterations").and_then(|v| v.as_input_tag()).ok_or_else(|| {
                    ConfigurationError::MissingAttribute {
                        module: ctx.name().to_string(),
                        attribute: "iterations".to_string(),
                    }
                })?;
                let iterations = iterations_tag.resolve::<usize>(ctx.pool())?;

                Ok(Box::new(Looper {
                    name: ctx.name().to_string(),
                    iterations,
                }))
            }),
        )
        .expect("Looper registers exactly once");
}
