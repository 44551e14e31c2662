//! URL handling module for Shadow-Harvester
//!
//! This module provides URL normalization, domain extraction and the crawl
//! scope check that decides which discovered links are followed.

mod domain;
mod normalize;
mod scope;

pub use domain::{base_domain, extract_domain, is_within_domain};
pub use normalize::normalize_url;
pub use scope::Scope;
