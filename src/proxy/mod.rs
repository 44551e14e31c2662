//! Proxy pool module
//!
//! Egress routes (direct, SOCKS, Tor) with per-route health tracking and
//! round-robin selection. The pool's route table is the only proxy state
//! mutated concurrently; all mutation happens behind one lock.

mod pool;
mod route;

pub use pool::{HealthThresholds, PoolExhausted, ProxyPool, RouteLease};
pub use route::{ProxyRoute, RouteHealth, RouteOutcome};
