//! The module registry (spec.md §4.3, C3): a process-wide, append-only
//! name-to-{factory, schema} table.
//!
//! Grounded on the original's `ModuleFactory`/`PluginFactory`
//! (`examples/original_source/include/momemta/ModuleFactory.h`): there, a
//! module registers a `PMaker<T>` at static-init time under a type name, and
//! the factory is later asked to build a `Module*` given a `Pool` and a
//! `ParameterSet`. This port keeps the same two-part record — a `ModuleDef`
//! schema plus a construction closure — but the registry itself is an
//! explicit `DashMap` any piece of code (builtin registration, or the plugin
//! loader in `crate::plugin`) can insert into, rather than relying on static
//! initializers, the way the teacher's catalog types favor explicit
//! construction over global mutable state.

use crate::configuration::AttributeTable;
use crate::error::{ConfigurationError, PluginError};
use crate::module::{ModuleContext, ModuleInstance};
use crate::schema::ModuleDef;
use dashmap::DashMap;
use std::sync::Arc;

/// Constructs one module instance from its schema-validated attribute table.
/// Presence and type of declared attributes/inputs is already checked by the
/// graph builder; a factory still reports a `ConfigurationError` if resolving
/// one of its inputs against the pool fails (e.g. an indexed tag landing on a
/// scalar producer), rather than panicking.
pub type Factory =
    Arc<dyn Fn(ModuleContext, &AttributeTable) -> Result<ModuleInstance, ConfigurationError> + Send + Sync>;

struct Entry {
    def: ModuleDef,
    factory: Option<Factory>,
}

/// Process-wide, append-only registry of known module types.
///
/// Internal pseudo-modules (`cuba`, `input`, `met`, `momemta`) are registered
/// with a schema but no factory: their slots are populated directly by the
/// execution engine rather than by a constructed `Module` instance, so
/// `instantiate` on one of them is a logic error in the builder, not a
/// runtime possibility.
#[derive(Default)]
pub struct Registry {
    entries: DashMap<String, Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            entries: DashMap::new(),
        }
    }

    /// Register a constructible module type. Re-registering an existing name
    /// is a collision — the registry is append-only.
    pub fn register(&self, def: ModuleDef, factory: Factory) -> Result<(), PluginError> {
        if self.entries.contains_key(&def.name) {
            return Err(PluginError::RegistrationCollision(def.name));
        }
        let name = def.name.clone();
        self.entries.insert(
            name,
            Entry {
                def,
                factory: Some(factory),
            },
        );
        Ok(())
    }

    /// Register an internal pseudo-module's schema, with no factory.
    pub fn register_internal(&self, def: ModuleDef) -> Result<(), PluginError> {
        if self.entries.contains_key(&def.name) {
            return Err(PluginError::RegistrationCollision(def.name));
        }
        let mut def = def;
        def.internal = true;
        let name = def.name.clone();
        self.entries.insert(name, Entry { def, factory: None });
        Ok(())
    }

    pub fn schema(&self, module_type: &str) -> Option<ModuleDef> {
        self.entries.get(module_type).map(|e| e.def.clone())
    }

    pub fn contains(&self, module_type: &str) -> bool {
        self.entries.contains_key(module_type)
    }

    pub fn module_types(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }

    /// Construct a module instance. Fails with `UnknownModule` if no type by
    /// this name is registered, which also covers asking to instantiate an
    /// internal pseudo-module, since those carry no factory.
    pub fn instantiate(
        &self,
        module_type: &str,
        ctx: ModuleContext,
        attributes: &AttributeTable,
    ) -> Result<ModuleInstance, ConfigurationError> {
        let entry = self
            .entries
            .get(module_type)
            .ok_or_else(|| ConfigurationError::UnknownModule(module_type.to_string()))?;
        let factory = entry
            .factory
            .as_ref()
            .ok_or_else(|| ConfigurationError::UnknownModule(module_type.to_string()))?;
        factory(ctx, attributes)
    }
}
