//! State module for shared and per-worker crawl state
//!
//! # Components
//!
//! - `DomainState`: per-host politeness clock and cached robots.txt rules
//! - `WorkerState`: the phase of a crawl worker's loop

mod domain_state;
mod worker_state;

// Re-export main types
pub use domain_state::{remaining_delay, DomainState};
pub use worker_state::WorkerState;
