//! Core orchestration engine
//!
//! This module contains:
//! - The task model and its single-use lifecycle
//! - Dependency validation and ordering
//! - Sequential and hierarchical execution strategies
//! - Output aggregation, rate limiting and the swarm façade

pub mod delegation;
mod output;
pub mod process;
mod rate_limit;
pub mod resolver;
mod swarm;
mod task;

pub use delegation::{DelegationPolicy, KeywordDelegation};
pub use output::*;
pub use process::{ExecutionStrategy, Process, RunContext};
pub use rate_limit::RpmController;
pub use swarm::*;
pub use task::*;
