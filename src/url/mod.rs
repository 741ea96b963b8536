//! URL handling module for Borer
//!
//! This module provides URL normalization (the dedup key used by the work
//! queue) and the scope policy that bounds the crawl.

mod normalize;
mod scope;

// Re-export main functions
pub use normalize::{normalize, normalize_key, normalize_url};
pub use scope::{matches_scope, ScopePolicy};
