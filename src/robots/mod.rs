//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching
//! robots.txt files. Permission checks go through [`ParsedRobots::is_allowed`].

mod cache;
mod parser;

pub use cache::RobotsCache;
pub use parser::ParsedRobots;
