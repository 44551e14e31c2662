//! State module for tracking run and page progress
//!
//! # Components
//!
//! - `RunState`: lifecycle of one harvest run (idle, running, completed, aborted)
//! - `PageState`: final outcome of a single fetched resource

mod page_state;
mod run_state;

// Re-export main types
pub use page_state::PageState;
pub use run_state::{AbortReason, RunState};
