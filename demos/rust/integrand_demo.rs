//! A one-dimensional Monte-Carlo integration: `UniformGenerator` maps the
//! Cuba unit-interval sample into `[10, 30]`, and the integrand is that
//! value times itself scaled down — enough to show a non-trivial integral
//! with an error estimate, without needing a real matrix element plugin.

use momemta::config::{EngineConfig, IntegrationConfig};
use momemta::configuration::{AttributeTable, ConfigValue, ModuleInstanceDecl, TopLevelConfig};
use momemta::input_tag::InputTag;
use momemta::Momemta;
use std::collections::BTreeMap;

fn main() {
    let momemta = Momemta::new(EngineConfig {
        integration: IntegrationConfig {
            samples: 200_000,
            replicas: 0,
            seed: 1234,
            max_failures_fraction: 0.05,
        },
        logging: Default::default(),
    });

    let mut attrs = BTreeMap::new();
    attrs.insert("min".to_string(), ConfigValue::Real(10.0));
    attrs.insert("max".to_string(), ConfigValue::Real(30.0));
    attrs.insert("ps_point".to_string(), ConfigValue::InputTag(InputTag::indexed("cuba", "ps_points", 0)));

    let config = TopLevelConfig::new()
        .add_module(ModuleInstanceDecl::new("UniformGenerator", "pt_gen", AttributeTable::new(attrs)))
        .with_integrand(vec![InputTag::new("pt_gen", "output")]);

    let weights = momemta.compute_weights(&config, &[], None).expect("valid configuration");
    println!(
        "average pt over [10, 30] GeV = {:.4} +/- {:.4}",
        weights[0].value, weights[0].error
    );
}
