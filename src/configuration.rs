//! The configuration surface (spec.md §6): a typed value tree the caller
//! builds (or a thin front-end parses from TOML/JSON), consumed by the graph
//! builder. The configuration *script language* itself (the original's Lua
//! front-end) is out of scope — only this parsed tree is consumed.

use crate::input_tag::InputTag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A node of the typed configuration value tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Integer(i64),
    Real(f64),
    String(String),
    /// Parsed eagerly from its `"module::parameter[/index]"` string form.
    InputTag(InputTag),
    List(Vec<ConfigValue>),
    Table(BTreeMap<String, ConfigValue>),
    /// An ordered list of module names, as given to a `Looper`'s `path` attribute.
    Path(Vec<String>),
}

impl ConfigValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ConfigValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            ConfigValue::Real(r) => Some(*r),
            ConfigValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_input_tag(&self) -> Option<&InputTag> {
        match self {
            ConfigValue::InputTag(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ConfigValue]> {
        match self {
            ConfigValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&BTreeMap<String, ConfigValue>> {
        match self {
            ConfigValue::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&[String]> {
        match self {
            ConfigValue::Path(names) => Some(names),
            _ => None,
        }
    }

    /// Extract every `InputTag` reachable from this value, recursing through
    /// lists and nested tables (used by the graph builder's reference
    /// extraction pass, including inputs nested under `nested_attributes`).
    pub fn collect_input_tags(&self, out: &mut Vec<InputTag>) {
        match self {
            ConfigValue::InputTag(tag) => out.push(tag.clone()),
            ConfigValue::List(items) => items.iter().for_each(|v| v.collect_input_tags(out)),
            ConfigValue::Table(map) => map.values().for_each(|v| v.collect_input_tags(out)),
            _ => {}
        }
    }
}

/// The attribute table of a single declared module instance, with a fallback
/// to a shared global table for attributes marked `global` in the schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeTable {
    values: BTreeMap<String, ConfigValue>,
}

impl AttributeTable {
    pub fn new(values: BTreeMap<String, ConfigValue>) -> Self {
        AttributeTable { values }
    }

    pub fn get(&self, name: &str) -> Option<&ConfigValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConfigValue)> {
        self.values.iter()
    }

    /// Descend into a `nested_attributes` path, e.g. `["branches", "leaf"]`.
    pub fn descend_value<'a>(&'a self, path: &[String]) -> Option<&'a ConfigValue> {
        let mut current = self.values.get(path.first()?)?;
        for segment in &path[1..] {
            current = current.as_table()?.get(segment)?;
        }
        Some(current)
    }
}

/// One declared module instantiation: `{type, name, attribute_table}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleInstanceDecl {
    pub module_type: String,
    pub name: String,
    pub attributes: AttributeTable,
}

impl ModuleInstanceDecl {
    pub fn new(module_type: impl Into<String>, name: impl Into<String>, attributes: AttributeTable) -> Self {
        ModuleInstanceDecl {
            module_type: module_type.into(),
            name: name.into(),
            attributes,
        }
    }
}

/// The top-level configuration: global parameters, the declared modules, and
/// the list of integrand sinks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TopLevelConfig {
    pub parameters: AttributeTable,
    pub modules: Vec<ModuleInstanceDecl>,
    pub integrand: Vec<InputTag>,
}

impl TopLevelConfig {
    pub fn new() -> Self {
        TopLevelConfig::default()
    }

    pub fn with_parameters(mut self, parameters: BTreeMap<String, ConfigValue>) -> Self {
        self.parameters = AttributeTable::new(parameters);
        self
    }

    pub fn add_module(mut self, decl: ModuleInstanceDecl) -> Self {
        self.modules.push(decl);
        self
    }

    pub fn with_integrand(mut self, tags: Vec<InputTag>) -> Self {
        self.integrand = tags;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_nested_input_tags() {
        let mut table = BTreeMap::new();
        table.insert(
            "leaf".to_string(),
            ConfigValue::InputTag(InputTag::new("m", "p")),
        );
        let value = ConfigValue::List(vec![ConfigValue::Table(table)]);

        let mut tags = Vec::new();
        value.collect_input_tags(&mut tags);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].module, "m");
    }

    #[test]
    fn descend_value_walks_nested_tables() {
        let mut inner = BTreeMap::new();
        inner.insert("leaf".to_string(), ConfigValue::Integer(7));
        let mut outer = BTreeMap::new();
        outer.insert("branches".to_string(), ConfigValue::Table(inner));

        let table = AttributeTable::new(outer);
        let path = vec!["branches".to_string(), "leaf".to_string()];
        assert_eq!(table.descend_value(&path), Some(&ConfigValue::Integer(7)));
    }
}
