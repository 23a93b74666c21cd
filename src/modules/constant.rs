//! `Constant`: declares a fixed value, set once at the start of integration
//! (spec.md §4.4 lifecycle; grounded on
//! `examples/original_source/modules/Constant.cc`, which the original splits
//! into `IntConstant`/`DoubleConstant` template instantiations — this port
//! keeps a single `Constant` producing a `Real` attribute, since the typed
//! value tree already distinguishes `Integer` from `Real`).

use crate::configuration::AttributeTable;
use crate::error::RuntimeError;
use crate::module::{Module, ModuleContext, Status};
use crate::registry::Registry;
use crate::schema::{AttrDef, AttrType, ModuleDefBuilder};
use crate::value::ProducerHandle;
use std::sync::Arc;

struct Constant {
    value: f64,
    output: ProducerHandle<f64>,
}

impl Module for Constant {
    fn begin_integration(&mut self) {
        self.output.set(self.value);
    }

    fn work(&mut self) -> Result<Status, RuntimeError> {
        Ok(Status::Ok)
    }
}

pub fn register(registry: &Registry) {
    registry
        .register(
            ModuleDefBuilder::new("Constant")
                .attribute(AttrDef::new("value", AttrType::Real))
                .output("value")
                .build(),
            Arc::new(|ctx: ModuleContext, attrs: &AttributeTable| {
                let value = attrs.get("value").and_then(|v| v.as_real()).unwrap_or(0.0);
                let output = ctx.produce::<f64>("value").expect("Constant's own output slot");
                Ok(Box::new(Constant { value, output }))
            }),
        )
        .expect("Constant registers exactly once");
}
