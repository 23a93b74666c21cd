//! `UniformGenerator`: maps a Cuba unit-interval sample to a uniform point in
//! `[min, max]` (grounded on
//! `examples/original_source/modules/UniformGenerator.cc`).

use crate::configuration::AttributeTable;
use crate::error::{ConfigurationError, RuntimeError};
use crate::module::{Module, ModuleContext, Status};
use crate::registry::Registry;
use crate::schema::{AttrDef, AttrType, ArgDef, ModuleDefBuilder};
use crate::value::{ProducerHandle, ValueHandle};
use std::sync::Arc;

struct UniformGenerator {
    min: f64,
    max: f64,
    ps_point: ValueHandle<f64>,
    output: ProducerHandle<f64>,
    jacobian: ProducerHandle<f64>,
}

impl Module for UniformGenerator {
    fn work(&mut self) -> Result<Status, RuntimeError> {
        let ps_point = self.ps_point.get();
        self.output.set(self.min + (self.max - self.min) * ps_point);
        self.jacobian.set(self.max - self.min);
        Ok(Status::Ok)
    }

    fn dimensions(&self) -> usize {
        1
    }
}

pub fn register(registry: &Registry) {
    registry
        .register(
            ModuleDefBuilder::new("UniformGenerator")
                .attribute(AttrDef::new("min", AttrType::Real))
                .attribute(AttrDef::new("max", AttrType::Real))
                .input(ArgDef::input("ps_point"))
                .output("output")
                .output("jacobian")
                .build(),
            Arc::new(|ctx: ModuleContext, attrs: &AttributeTable| {
                let min = attrs.get("min").and_then(|v| v.as_real()).unwrap_or(0.0);
                let max = attrs.get("max").and_then(|v| v.as_real()).unwrap_or(1.0);
                let ps_point_tag = attrs.get("ps_point").and_then(|v| v.as_input_tag()).ok_or_else(|| {
                    ConfigurationError::MissingAttribute {
                        module: ctx.name().to_string(),
                        attribute: "ps_point".to_string(),
                    }
                })?;
                let ps_point = ps_point_tag.resolve::<f64>(ctx.pool())?;

                let output = ctx.produce::<f64>("output").expect("own output slot");
                let jacobian = ctx.produce::<f64>("jacobian").expect("own jacobian slot");

                Ok(Box::new(UniformGenerator {
                    min,
                    max,
                    ps_point,
                    output,
                    jacobian,
                }))
            }),
        )
        .expect("UniformGenerator registers exactly once");
}
