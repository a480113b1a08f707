//! # Souschef
//!
//! Step-ordering and template-resolution engine for voice-guided cooking
//! sessions. An immutable recipe template is materialized into a mutable
//! cooking session; while cooking, an external advisor proposes batches of
//! atomic edit operations (insert, update, skip, adjust_quantity,
//! substitute) against the session's remaining steps, and the engine
//! validates and applies each batch all-or-nothing.
//!
//! ## Modules
//!
//! - `recipe` - Immutable recipe templates with placeholder-bearing steps
//! - `session` - Runtime session state, steps, bindings, audit records
//! - `render` - Placeholder template renderer ({i:key}, {i:key:qty}, {e:key})
//! - `materialize` - Recipe-to-session instantiation with pax scaling
//! - `sequence` - Step sequencer owning the order-index invariant
//! - `ops` - Advisor operation batch wire schema and closed operation forms
//! - `apply` - Atomic batch validation and application
//! - `log` - Append-only modification log
//! - `engine` - Session engine with per-session write serialization
//! - `storage` - Storage collaborator trait and reference backends

pub mod apply;
pub mod engine;
pub mod error;
pub mod log;
pub mod materialize;
pub mod ops;
pub mod recipe;
pub mod render;
pub mod sequence;
pub mod session;
pub mod storage;

pub use engine::{EngineConfig, SessionEngine};
pub use error::{Error, Result};
