//! Integration test suite for swarmflow.
//!
//! These tests build complete swarms from scripted executors and run them
//! end to end, checking ordering, context flow, failure handling and the
//! lifecycle event stream.
//!
//! # Test Categories
//!
//! - `sequential`: Dependency-ordered runs
//! - `hierarchical`: Manager-led delegation runs
//! - `swarm_api`: Reuse, fan-out, events and memory
//!
//! No test makes network calls.

mod fixtures;

mod hierarchical;
mod sequential;
mod swarm_api;
