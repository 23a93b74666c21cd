//! Error taxonomy for the engine.
//!
//! Mirrors the phase split of the original design: configuration and graph
//! errors surface synchronously out of the builder with a diagnostic naming
//! the offending module/parameter; runtime errors are reported per-sample by
//! the execution engine and only escalate to a hard failure once a
//! configurable threshold of consecutive failures is crossed.

use thiserror::Error;

/// Errors raised while validating a configuration against module schemas.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("module '{0}' is not registered")]
    UnknownModule(String),

    #[error("module '{module}' is missing required attribute '{attribute}'")]
    MissingAttribute { module: String, attribute: String },

    #[error("module '{module}' has unknown attribute '{attribute}'")]
    UnknownAttribute { module: String, attribute: String },

    #[error("module '{module}' attribute '{attribute}' has wrong type: expected {expected}, got {got}")]
    TypeMismatch {
        module: String,
        attribute: String,
        expected: String,
        got: String,
    },

    #[error("malformed input tag '{0}': {1}")]
    MalformedInputTag(String, String),

    #[error("module '{0}' is declared more than once")]
    DuplicateModuleName(String),

    #[error("global attribute '{0}' missing from the parameters table")]
    MissingGlobalAttribute(String),
}

/// Errors raised while assembling the dependency graph into a `Plan`.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("no module produces output '{output}' of module '{module}'")]
    UnknownProducer { module: String, output: String },

    #[error("output '{output}' of module '{module}' is produced more than once")]
    DuplicateProducer { module: String, output: String },

    #[error("cyclic dependency detected involving module '{0}'")]
    CyclicGraph(String),

    #[error("indexed tag '{module}::{parameter}/{index}' targets a scalar producer")]
    IndexedTagForScalar {
        module: String,
        parameter: String,
        index: usize,
    },

    #[error("sub-path module '{module}' depends on '{dependency}' which is not visible from its path")]
    SubPathVisibility { module: String, dependency: String },
}

/// Errors surfaced by the integrator adapter / callback bridge.
#[derive(Error, Debug)]
pub enum IntegrationError {
    #[error("integrator callback failed with code {0}")]
    CallbackFailed(i32),

    #[error("too many failed samples ({failed}/{total}); aborting integration")]
    TooManyFailures { failed: usize, total: usize },

    #[error("requested {requested} dimensions but the plan declares {declared}")]
    DimensionMismatch { requested: usize, declared: usize },
}

/// Errors raised while loading plugin shared objects.
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("failed to load shared library '{path}': {source}")]
    LoadFailed {
        path: String,
        #[source]
        source: libloading::Error,
    },

    #[error("module '{0}' was already registered; refusing duplicate registration")]
    RegistrationCollision(String),
}

/// A non-recoverable exception raised from inside a module's `work`.
#[derive(Error, Debug)]
#[error("module '{module}' failed during work(): {message}")]
pub struct RuntimeError {
    pub module: String,
    pub message: String,
}

/// Umbrella error type returned by the public API.
#[derive(Error, Debug)]
pub enum MomemtaError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Integration(#[from] IntegrationError),

    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

pub type Result<T> = std::result::Result<T, MomemtaError>;
