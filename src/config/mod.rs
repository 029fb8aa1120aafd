//! Layered configuration resolution.
//!
//! Vendor build descriptions are flat `key=value` files layered into a scope
//! chain: Platform (optionally below a bundled root platform), Board, and
//! finally a concrete `BoardConfiguration`. The [`ConfigScope`] trait models
//! one link of that chain: a lookup that misses locally delegates upward with
//! the *same* calling context, so `{token}` references inside an ancestor's
//! value still see the child's overrides.
//!
//! Lookups additionally honor a per-query [`RuntimeOverlay`] holding
//! loop-local substitutions such as `source_file` or `object_file`; the
//! overlay outranks stored data at every level of the chain.

pub mod parser;
pub mod scope;

pub use parser::{parse_description_file, parse_description_str};
pub use scope::{ConfigScope, RuntimeOverlay, resolve_tokens};
