//! Core types and error handling.
//!
//! This module hosts the crate-wide error taxonomy. The split follows the
//! import pipeline's failure semantics:
//!
//! - a missing configuration key is *not* an error — scope lookups return
//!   [`Option`] and only callers that assert presence convert the miss into
//!   [`BoardwalkError::ConfigurationNotFound`];
//! - a failed sketch-preprocessor run is fatal to the whole import
//!   ([`BoardwalkError::ExternalToolFailure`]);
//! - a failed per-file dependency probe is recovered locally: the resolver
//!   logs it and continues with the remaining files.

pub mod error;

pub use error::{BoardwalkError, ErrorContext, user_friendly_error};
