//! `Summer`: accumulates a value across a `Looper`'s iterations, zeroing in
//! `beginLoop` and adding in `work` (grounded on
//! `examples/original_source/modules/Summer.cc`, a `T`-templated module
//! there; this port writes the three instantiations the original registers
//! — `IntSummer`, `DoubleSummer`, `P4Summer` — directly, since Rust
//! monomorphizes generics at compile time rather than needing a template
//! registration macro per type).

use crate::configuration::AttributeTable;
use crate::error::{ConfigurationError, RuntimeError};
use crate::lorentz::LorentzVector;
use crate::module::{Module, ModuleContext, Status};
use crate::registry::Registry;
use crate::schema::{ArgDef, ModuleDefBuilder};
use crate::value::{PoolValue, ProducerHandle, ValueHandle};
use std::ops::AddAssign;
use std::sync::Arc;

struct Summer<T> {
    input: ValueHandle<T>,
    sum: ProducerHandle<T>,
}

impl<T> Module for Summer<T>
where
    T: PoolValue + AddAssign + Default,
{
    fn begin_loop(&mut self) {
        self.sum.set(T::default());
    }

    fn work(&mut self) -> Result<Status, RuntimeError> {
        self.sum.with_mut(|acc| *acc += self.input.get());
        Ok(Status::Ok)
    }

    fn leaf_module(&self) -> bool {
        true
    }
}

fn make_factory<T>() -> crate::registry::Factory
where
    T: PoolValue + AddAssign + Default,
{
    Arc::new(|ctx: ModuleContext, attrs: &AttributeTable| {
        let input_tag = attrs.get("input").and_then(|v| v.as_input_tag()).ok_or_else(|| {
            ConfigurationError::MissingAttribute {
                module: ctx.name().to_string(),
                attribute: "input".to_string(),
            }
        })?;
        let input = input_tag.resolve::<T>(ctx.pool())?;
        let sum = ctx.produce::<T>("sum").expect("own sum slot");
        Ok(Box::new(Summer { input, sum }) as crate::module::ModuleInstance)
    })
}

pub fn register(registry: &Registry) {
    registry
        .register(
            ModuleDefBuilder::new("IntSummer")
                .input(ArgDef::input("input"))
                .output("sum")
                .sticky()
                .build(),
            make_factory::<i64>(),
        )
        .expect("IntSummer registers exactly once");

    registry
        .register(
            ModuleDefBuilder::new("DoubleSummer")
                .input(ArgDef::input("input"))
                .output("sum")
                .sticky()
                .build(),
            make_factory::<f64>(),
        )
        .expect("DoubleSummer registers exactly once");

    registry
        .register(
            ModuleDefBuilder::new("P4Summer")
                .input(ArgDef::input("input"))
                .output("sum")
                .sticky()
                .build(),
            make_factory::<LorentzVector>(),
        )
        .expect("P4Summer registers exactly once");
}
