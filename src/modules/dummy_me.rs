//! `DummyMatrixElement`: a stand-in matrix element that always returns 1,
//! useful for exercising the rest of the graph without linking a real
//! physics matrix element plugin (grounded on
//! `examples/original_source/MatrixElements/dummy/dummy_me.cc`, which plays
//! the same role for the original's `MatrixElementFactory`).

use crate::configuration::AttributeTable;
use crate::error::RuntimeError;
use crate::module::{Module, ModuleContext, Status};
use crate::registry::Registry;
use crate::schema::ModuleDefBuilder;
use crate::value::ProducerHandle;
use std::sync::Arc;

struct DummyMatrixElement {
    weight: ProducerHandle<f64>,
}

impl Module for DummyMatrixElement {
    fn begin_integration(&mut self) {
        self.weight.set(1.0);
    }

    fn work(&mut self) -> Result<Status, RuntimeError> {
        Ok(Status::Ok)
    }
}

pub fn register(registry: &Registry) {
    registry
        .register(
            ModuleDefBuilder::new("DummyMatrixElement").output("weight").build(),
            Arc::new(|ctx: ModuleContext, _attrs: &AttributeTable| {
                let weight = ctx.produce::<f64>("weight").expect("own weight slot");
                Ok(Box::new(DummyMatrixElement { weight }))
            }),
        )
        .expect("DummyMatrixElement registers exactly once");
}
