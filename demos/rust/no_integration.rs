//! Zero-dimension configuration: a `Constant` fed straight to the
//! integrand, so `computeWeights` returns the declared value exactly, with
//! no Monte-Carlo sampling doing any real work. Useful as a smoke test for a
//! new configuration before wiring up real phase-space generators.

use momemta::config::{EngineConfig, IntegrationConfig};
use momemta::configuration::{AttributeTable, ConfigValue, ModuleInstanceDecl, TopLevelConfig};
use momemta::input_tag::InputTag;
use momemta::Momemta;
use std::collections::BTreeMap;

fn main() {
    let momemta = Momemta::new(EngineConfig {
        integration: IntegrationConfig {
            samples: 1,
            replicas: 1,
            seed: 0,
            max_failures_fraction: 1.0,
        },
        logging: Default::default(),
    });

    let mut attrs = BTreeMap::new();
    attrs.insert("value".to_string(), ConfigValue::Real(42.0));

    let config = TopLevelConfig::new()
        .add_module(ModuleInstanceDecl::new("Constant", "norm", AttributeTable::new(attrs)))
        .with_integrand(vec![InputTag::new("norm", "value")]);

    let weights = momemta.compute_weights(&config, &[], None).expect("valid configuration");
    for (i, w) in weights.iter().enumerate() {
        println!("integrand[{i}] = {} +/- {}", w.value, w.error);
    }
}
