//! Builtin module types and the internal pseudo-module schemas, all
//! self-registered into a fresh `Registry` by `register_builtins`. A dynamic
//! plugin loaded through `crate::plugin::PluginLoader` adds further entries
//! to the same registry at run time.

pub mod constant;
pub mod dummy_me;
pub mod empty;
pub mod flatter;
pub mod internal;
pub mod looper;
pub mod permutator;
pub mod summer;
pub mod uniform_generator;

use crate::registry::Registry;

pub fn register_builtins(registry: &Registry) {
    internal::register(registry);
    constant::register(registry);
    empty::register(registry);
    uniform_generator::register(registry);
    flatter::register(registry);
    permutator::register(registry);
    summer::register(registry);
    looper::register(registry);
    dummy_me::register(registry);
}
