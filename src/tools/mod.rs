//! Pluggable capabilities an agent may invoke while working on a task.

mod memory_tool;
mod registry;

pub use memory_tool::*;
pub use registry::*;

use crate::agents::CapabilityError;
use crate::constants::TOOL_REQUEST_MARKER;

/// One action offered by a tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolAction {
    pub name: String,
    pub arg_count: usize,
    pub description: String,
}

impl std::fmt::Display for ToolAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} args) - {}", self.name, self.arg_count, self.description)
    }
}

#[async_trait::async_trait]
pub trait Tool: std::fmt::Debug + Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn actions(&self) -> Vec<ToolAction>;
    async fn call(&self, action: &str, params: &[String]) -> Result<String, CapabilityError>;
}

/// A parsed `TOOL_REQUEST: <tool> <action> <params...>` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRequest {
    pub tool: String,
    pub action: String,
    pub params: Vec<String>,
}

/// First well-formed tool request found in `response`, if any.
pub fn parse_tool_request(response: &str) -> Option<ToolRequest> {
    response.lines().find_map(|line| {
        let start = line.find(TOOL_REQUEST_MARKER)?;
        let mut parts = line[start + TOOL_REQUEST_MARKER.len()..].split_whitespace();
        let tool = parts.next()?.to_string();
        let action = parts.next()?.to_string();
        Some(ToolRequest {
            tool,
            action,
            params: parts.map(str::to_string).collect(),
        })
    })
}
