//! A `Looper` driving a sub-path a data-dependent number of times per
//! sample: `Permutator` enumerates the permutations of two input particles
//! and reports their count, the `Looper` runs its sub-path once per
//! permutation, and a `DoubleSummer` on that sub-path accumulates a
//! per-iteration contribution (here, `DummyMatrixElement`'s constant weight)
//! into a single value the integrand reads back out.

use momemta::config::{EngineConfig, IntegrationConfig};
use momemta::configuration::{AttributeTable, ConfigValue, ModuleInstanceDecl, TopLevelConfig};
use momemta::input_tag::InputTag;
use momemta::lorentz::{LorentzVector, Particle};
use momemta::Momemta;
use std::collections::BTreeMap;

fn main() {
    let momemta = Momemta::new(EngineConfig {
        integration: IntegrationConfig {
            samples: 500,
            replicas: 1,
            seed: 9,
            max_failures_fraction: 1.0,
        },
        logging: Default::default(),
    });

    let mut perm_attrs = BTreeMap::new();
    perm_attrs.insert(
        "ps_point".to_string(),
        ConfigValue::InputTag(InputTag::indexed("cuba", "ps_points", 0)),
    );
    perm_attrs.insert(
        "inputs".to_string(),
        ConfigValue::List(vec![
            ConfigValue::InputTag(InputTag::indexed("input", "p4", 0)),
            ConfigValue::InputTag(InputTag::indexed("input", "p4", 1)),
        ]),
    );

    let mut loop_attrs = BTreeMap::new();
    loop_attrs.insert(
        "path".to_string(),
        ConfigValue::Path(vec!["me".to_string(), "sum".to_string()]),
    );
    loop_attrs.insert(
        "iterations".to_string(),
        ConfigValue::InputTag(InputTag::new("perm", "permutations_count")),
    );

    let mut sum_attrs = BTreeMap::new();
    sum_attrs.insert("input".to_string(), ConfigValue::InputTag(InputTag::new("me", "weight")));

    let config = TopLevelConfig::new()
        .add_module(ModuleInstanceDecl::new("Permutator", "perm", AttributeTable::new(perm_attrs)))
        .add_module(ModuleInstanceDecl::new("Looper", "loop1", AttributeTable::new(loop_attrs)))
        .add_module(ModuleInstanceDecl::new("DummyMatrixElement", "me", AttributeTable::default()))
        .add_module(ModuleInstanceDecl::new("DoubleSummer", "sum", AttributeTable::new(sum_attrs)))
        .with_integrand(vec![InputTag::new("sum", "sum")]);

    let particles = vec![
        Particle::new("lepton1", LorentzVector::new(20.0, 0.0, 10.0, 25.0)),
        Particle::new("lepton2", LorentzVector::new(-15.0, 5.0, -5.0, 17.0)),
    ];

    let weights = momemta.compute_weights(&config, &particles, None).expect("valid configuration");
    println!(
        "sum over permutations, averaged over samples = {:.4} +/- {:.4}",
        weights[0].value, weights[0].error
    );
}
