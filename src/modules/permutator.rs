//! `Permutator`: enumerates every permutation of a set of input four-vectors
//! and picks one per sample from a Cuba unit-interval point (grounded on
//! `examples/original_source/modules/Permutator.cc`).
//!
//! `permutations_count` has no equivalent in the original — it's the number
//! of permutations enumerated at construction time, exposed as its own
//! output so a `Looper` driving a sub-path over this module's permutation
//! space can read how many iterations to run without recomputing `n!`.

use crate::configuration::AttributeTable;
use crate::error::{ConfigurationError, RuntimeError};
use crate::lorentz::LorentzVector;
use crate::module::{Module, ModuleContext, Status};
use crate::registry::Registry;
use crate::schema::{ArgDef, ModuleDefBuilder};
use crate::value::{ProducerHandle, ValueHandle};
use std::sync::Arc;

struct Permutator {
    ps_point: ValueHandle<f64>,
    inputs: Vec<ValueHandle<LorentzVector>>,
    permutations: Vec<Vec<usize>>,
    output: ProducerHandle<Vec<LorentzVector>>,
}

impl Module for Permutator {
    fn work(&mut self) -> Result<Status, RuntimeError> {
        let ps_point = self.ps_point.get();
        let chosen = ((ps_point * (self.permutations.len() - 1) as f64).round() as usize)
            .min(self.permutations.len() - 1);

        let permuted: Vec<LorentzVector> = self.permutations[chosen]
            .iter()
            .map(|&i| self.inputs[i].get())
            .collect();
        self.output.set(permuted);
        Ok(Status::Ok)
    }

    fn dimensions(&self) -> usize {
        1
    }
}

fn permutations_of(n: usize) -> Vec<Vec<usize>> {
    fn permute(current: &mut Vec<usize>, remaining: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if remaining.is_empty() {
            out.push(current.clone());
            return;
        }
        for i in 0..remaining.len() {
            let next = remaining.remove(i);
            current.push(next);
            permute(current, remaining, out);
            current.pop();
            remaining.insert(i, next);
        }
    }
    let mut out = Vec::new();
    permute(&mut Vec::new(), &mut (0..n).collect(), &mut out);
    out
}

pub fn register(registry: &Registry) {
    registry
        .register(
            ModuleDefBuilder::new("Permutator")
                .input(ArgDef::input("ps_point"))
                .input(ArgDef::input("inputs").many())
                .output_many("output")
                .output("permutations_count")
                .build(),
            Arc::new(|ctx: ModuleContext, attrs: &AttributeTable| {
                let ps_point_tag = attrs.get("ps_point").and_then(|v| v.as_input_tag()).ok_or_else(|| {
                    ConfigurationError::MissingAttribute {
                        module: ctx.name().to_string(),
                        attribute: "ps_point".to_string(),
                    }
                })?;
                let ps_point = ps_point_tag.resolve::<f64>(ctx.pool())?;

                let input_tags = attrs.get("inputs").and_then(|v| v.as_list()).ok_or_else(|| {
                    ConfigurationError::MissingAttribute {
                        module: ctx.name().to_string(),
                        attribute: "inputs".to_string(),
                    }
                })?;
                let inputs: Vec<ValueHandle<LorentzVector>> = input_tags
                    .iter()
                    .map(|v| {
                        let tag = v.as_input_tag().ok_or_else(|| ConfigurationError::MissingAttribute {
                            module: ctx.name().to_string(),
                            attribute: "inputs".to_string(),
                        })?;
                        tag.resolve::<LorentzVector>(ctx.pool())
                    })
                    .collect::<Result<_, ConfigurationError>>()?;

                let permutations = permutations_of(inputs.len());

                let output = ctx.produce::<Vec<LorentzVector>>("output").expect("own output slot");
                let count: ProducerHandle<usize> = ctx.produce("permutations_count").expect("own count slot");
                count.set(permutations.len());

                Ok(Box::new(Permutator {
                    ps_point,
                    inputs,
                    permutations,
                    output,
                }))
            }),
        )
        .expect("Permutator registers exactly once");
}
