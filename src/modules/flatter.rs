//! `Flatter`: maps a unit-interval sample to a Breit-Wigner-distributed
//! squared mass `s`, importance-sampling a resonance of given `mass`/`width`
//! (grounded on `examples/original_source/modules/Flatter.cc`).

use crate::configuration::AttributeTable;
use crate::error::{ConfigurationError, RuntimeError};
use crate::module::{Module, ModuleContext, Status};
use crate::registry::Registry;
use crate::schema::{AttrDef, AttrType, ArgDef, ModuleDefBuilder};
use crate::value::{ProducerHandle, ValueHandle};
use std::f64::consts::PI;
use std::sync::Arc;

struct Flatter {
    mass: f64,
    width: f64,
    input: ValueHandle<f64>,
    s: ProducerHandle<f64>,
    jacobian: ProducerHandle<f64>,
}

impl Module for Flatter {
    fn work(&mut self) -> Result<Status, RuntimeError> {
        let ps_point = self.input.get();
        let range = PI / 2.0 + (self.mass / self.width).atan();
        let y = -(self.mass / self.width).atan() + range * ps_point;

        self.s.set(self.mass * self.width * y.tan() + self.mass * self.mass);
        self.jacobian.set(range * self.mass * self.width / (y.cos() * y.cos()));
        Ok(Status::Ok)
    }

    fn dimensions(&self) -> usize {
        1
    }
}

pub fn register(registry: &Registry) {
    registry
        .register(
            ModuleDefBuilder::new("Flatter")
                .attribute(AttrDef::new("mass", AttrType::Real))
                .attribute(AttrDef::new("width", AttrType::Real))
                .input(ArgDef::input("input"))
                .output("s")
                .output("jacobian")
                .build(),
            Arc::new(|ctx: ModuleContext, attrs: &AttributeTable| {
                let mass = attrs.get("mass").and_then(|v| v.as_real()).unwrap_or(0.0);
                let width = attrs.get("width").and_then(|v| v.as_real()).unwrap_or(1.0);
                let input_tag = attrs.get("input").and_then(|v| v.as_input_tag()).ok_or_else(|| {
                    ConfigurationError::MissingAttribute {
                        module: ctx.name().to_string(),
                        attribute: "input".to_string(),
                    }
                })?;
                let input = input_tag.resolve::<f64>(ctx.pool())?;

                let s = ctx.produce::<f64>("s").expect("own s slot");
                let jacobian = ctx.produce::<f64>("jacobian").expect("own jacobian slot");

                Ok(Box::new(Flatter {
                    mass,
                    width,
                    input,
                    s,
                    jacobian,
                }))
            }),
        )
        .expect("Flatter registers exactly once");
}
