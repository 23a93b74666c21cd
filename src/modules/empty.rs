//! `EmptyModule`: a no-op placeholder (grounded on
//! `examples/original_source/modules/EmptyModule.cc`), useful for wiring up
//! a configuration skeleton or a test fixture before the real modules in a
//! path exist.

use crate::error::RuntimeError;
use crate::module::{Module, Status};
use crate::registry::Registry;
use crate::schema::ModuleDefBuilder;
use std::sync::Arc;

struct EmptyModule;

impl Module for EmptyModule {
    fn work(&mut self) -> Result<Status, RuntimeError> {
        Ok(Status::Ok)
    }
}

pub fn register(registry: &Registry) {
    registry
        .register(
            ModuleDefBuilder::new("EmptyModule").build(),
            Arc::new(|_ctx, _attrs| Ok(Box::new(EmptyModule))),
        )
        .expect("EmptyModule registers exactly once");
}
