//! Internal pseudo-modules: `cuba`, `input`, `met`, `momemta` (spec.md §4.3).
//!
//! Grounded on the original's `InternalModules.cc`
//! (`examples/original_source/modules/InternalModules.cc`), which registers
//! the same four names with no factory, purely to describe the slots the
//! harness (there, `MEMpp`; here, `crate::engine::Engine`) populates
//! directly. `momemta` differs from the other three: it has no outputs at
//! all, only the `integrands` input list that names the integration sinks.

use crate::registry::Registry;
use crate::schema::{ArgDef, ModuleDefBuilder};

pub fn register(registry: &Registry) {
    registry
        .register_internal(
            ModuleDefBuilder::new("cuba")
                .output_many("ps_points")
                .output("ps_weight")
                .build(),
        )
        .expect("cuba pseudo-module registers exactly once");

    registry
        .register_internal(ModuleDefBuilder::new("met").output("p4").build())
        .expect("met pseudo-module registers exactly once");

    registry
        .register_internal(
            ModuleDefBuilder::new("input")
                .output_many("p4")
                .output_many("type")
                .build(),
        )
        .expect("input pseudo-module registers exactly once");

    registry
        .register_internal(
            ModuleDefBuilder::new("momemta")
                .input(ArgDef::input("integrands").many())
                .build(),
        )
        .expect("momemta pseudo-module registers exactly once");
}
