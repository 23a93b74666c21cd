//! Module schemas (spec.md §3 "Module Definition", §4.3).
//!
//! A `ModuleDef` is pure data describing the shape of a module's attributes,
//! inputs and outputs; the registry (`crate::registry`) pairs it with a
//! factory closure. Built with a small fluent builder in the style of the
//! teacher's `schema::catalog` declarative builders.

use serde::{Deserialize, Serialize};

/// The declared type of an attribute, used by the graph builder to check a
/// configuration value's shape before constructing the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttrType {
    Bool,
    Integer,
    Real,
    String,
    InputTag,
    /// A sub-path: an ordered list of module names, as used by `Looper`.
    Path,
}

impl std::fmt::Display for AttrType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AttrType::Bool => "bool",
            AttrType::Integer => "integer",
            AttrType::Real => "real",
            AttrType::String => "string",
            AttrType::InputTag => "input_tag",
            AttrType::Path => "path",
        };
        write!(f, "{s}")
    }
}

/// An attribute definition. `global` attributes are read from the top-level
/// `parameters` table rather than the per-module attribute table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttrDef {
    pub name: String,
    pub ty: AttrType,
    pub default: Option<crate::configuration::ConfigValue>,
    pub global: bool,
    pub optional: bool,
}

impl AttrDef {
    pub fn new(name: impl Into<String>, ty: AttrType) -> Self {
        AttrDef {
            name: name.into(),
            ty,
            default: None,
            global: false,
            optional: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn global(mut self) -> Self {
        self.global = true;
        self
    }

    pub fn with_default(mut self, value: crate::configuration::ConfigValue) -> Self {
        self.default = Some(value);
        self.optional = true;
        self
    }
}

/// An input or output argument definition.
///
/// Only `name` is meaningful for outputs; `default`/`optional`/`many`/
/// `nested_attributes` only matter for inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArgDef {
    pub name: String,
    pub default: Option<crate::configuration::ConfigValue>,
    pub optional: bool,
    /// If true, this input is a list of references rather than a single one.
    pub many: bool,
    /// Nesting path of attribute tables this input is declared under, e.g.
    /// `branches/leaf=x::y` yields `[AttrDef{name: "branches", ..}, AttrDef{name: "leaf", ..}]`.
    pub nested_attributes: Vec<AttrDef>,
}

impl ArgDef {
    pub fn output(name: impl Into<String>) -> Self {
        ArgDef {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn input(name: impl Into<String>) -> Self {
        ArgDef {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn many(mut self) -> Self {
        self.many = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn nested(mut self, path: Vec<AttrDef>) -> Self {
        self.nested_attributes = path;
        self
    }
}

/// The full schema of a module: its attributes, inputs and outputs, plus the
/// two boolean flags the graph builder consults when pruning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleDef {
    pub name: String,
    pub attributes: Vec<AttrDef>,
    pub inputs: Vec<ArgDef>,
    pub outputs: Vec<ArgDef>,
    /// Internal pseudo-modules (`cuba`, `input`, `met`, `momemta`) have no
    /// factory; their slots are populated by the execution engine harness.
    pub internal: bool,
    /// Sticky modules are kept in the plan even if nothing consumes their
    /// outputs (side-effect leaves: histograms, accumulators).
    pub sticky: bool,
}

/// Fluent builder mirroring the declarative style used throughout the
/// teacher's schema module.
pub struct ModuleDefBuilder {
    def: ModuleDef,
}

impl ModuleDefBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        ModuleDefBuilder {
            def: ModuleDef {
                name: name.into(),
                ..Default::default()
            },
        }
    }

    pub fn input(mut self, arg: ArgDef) -> Self {
        self.def.inputs.push(arg);
        self
    }

    pub fn output(mut self, name: impl Into<String>) -> Self {
        self.def.outputs.push(ArgDef::output(name));
        self
    }

    /// An output whose producer writes a sequence (`Vec<T>`) rather than a
    /// single value. The graph builder checks indexed consumer tags against
    /// this flag at freeze time.
    pub fn output_many(mut self, name: impl Into<String>) -> Self {
        self.def.outputs.push(ArgDef::output(name).many());
        self
    }

    pub fn attribute(mut self, attr: AttrDef) -> Self {
        self.def.attributes.push(attr);
        self
    }

    pub fn internal(mut self) -> Self {
        self.def.internal = true;
        self
    }

    pub fn sticky(mut self) -> Self {
        self.def.sticky = true;
        self
    }

    pub fn build(self) -> ModuleDef {
        self.def
    }
}
