//! Deterministic classification.
//!
//! Ignore filtering and placement rules both run before any AI call:
//! an ignored file is never classified, and a file that matches a rule
//! never reaches the suggestion worker.

pub mod ignore;
pub mod matcher;

pub use ignore::*;
pub use matcher::*;
