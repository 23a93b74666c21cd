//! # momemta
//!
//! A modular implementation of the Matrix Element Method (MEM): Monte-Carlo
//! integration of
//!
//! ```text
//! W(p_reco) = ∫ dΦ(p) · |M(p)|² · T(p; p_reco) · f(x1,Q²) f(x2,Q²)
//! ```
//!
//! over phase space, expressed as a plugin-extensible computation graph of
//! small modules rather than one monolithic integrand function.
//!
//! ## Pipeline
//!
//! ```text
//! TopLevelConfig (typed value tree)
//!     ↓
//! [Graph Builder (C5)]       → validate schemas, resolve references,
//!                               prune, topologically order           → Plan
//!     ↓
//! [Execution Engine (C6)]    → per-sample driver, Looper sub-paths     → per-sample weight
//!     ↓
//! [Integrator Adapter (C7)]  → replicated sampling, error estimate     → (value, error) per integrand
//! ```
//!
//! ## Module organization
//!
//! | Module | Component | Purpose |
//! |---|---|---|
//! | [`value`] | C1 | Typed, named value pool decoupling producers/consumers |
//! | [`input_tag`] | C2 | Lazy `(module, parameter[, index])` references |
//! | [`registry`] | C3 | Process-wide `name → {factory, schema}` table |
//! | [`module`] | C4 | The `Module` capability set and `Status` |
//! | [`schema`] | — | Declarative module schema builder |
//! | [`configuration`] | — | The typed configuration value tree |
//! | [`builder`] | C5 | Validates, resolves, prunes, orders → `Plan` |
//! | [`path`] | — | An ordered run of module instances |
//! | [`plan`] | — | The builder's frozen output |
//! | [`engine`] | C6 | Per-sample driver, event binding, Looper sub-paths |
//! | [`integrator`] | C7 | Integrator adapter + bundled flat Monte-Carlo |
//! | [`plugin`] | C8 | Dynamic loading of matrix-element plugins |
//! | [`modules`] | — | Builtin module types and internal pseudo-modules |
//! | [`facade`] | — | `Momemta`, the top-level entry point |
//! | [`config`] | — | Ambient engine configuration (replicas, seed, logging) |
//! | [`lorentz`] | — | Four-momenta and reconstructed particles |
//! | [`error`] | — | The error taxonomy returned across every phase |

pub mod builder;
pub mod config;
pub mod configuration;
pub mod engine;
pub mod error;
pub mod facade;
pub mod input_tag;
pub mod integrator;
pub mod lorentz;
pub mod module;
pub mod modules;
pub mod path;
pub mod plan;
pub mod plugin;
pub mod registry;
pub mod schema;
pub mod value;

pub use config::EngineConfig;
pub use error::{MomemtaError, Result};
pub use facade::Momemta;
pub use lorentz::{LorentzVector, Particle};
