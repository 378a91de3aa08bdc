//! Entropy sorter
//!
//! Watches a single folder and moves every new file into a subfolder.
//! The destination comes from the first matching placement rule or, when no
//! rule matches, from a rate-limited AI suggestion. Anything that can't be
//! resolved lands in [`FALLBACK_DESTINATION`].

pub mod ai;
pub mod config;
pub mod models;
pub mod pipeline;
pub mod rules;
pub mod services;

/// Default bucket for files with no rule match and no usable suggestion
pub const FALLBACK_DESTINATION: &str = "Unsorted";
