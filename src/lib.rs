//! Task-dependency orchestration for cooperating agents.
//!
//! A [`core::Swarm`] owns agents and task templates. Each run executes the
//! tasks either in dependency order ([`core::Process::Sequential`]) or
//! through a delegating manager ([`core::Process::Hierarchical`]), feeds
//! earlier outputs forward as context and returns one [`core::SwarmOutput`].
//! The actual work of every agent is done by a [`agents::CapabilityExecutor`],
//! such as the LLM-backed [`llm::LlmExecutor`].

pub mod agents;
pub mod config;
pub mod constants;
pub mod core;
pub mod errors;
pub mod event;
pub mod llm;
pub mod memory;
pub mod tools;
pub mod utils;

pub use errors::{Error, Result};
