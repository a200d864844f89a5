use super::Tool;
use std::sync::Arc;
use tracing::debug;

/// Tools available to the agents of a swarm
#[derive(Debug, Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool, replacing any tool registered under the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        debug!("Registering tool '{}'", tool.name());
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(tool);
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tools whose names appear in `capabilities`, case-insensitively.
    pub fn allowed<'a>(&'a self, capabilities: &'a [String]) -> impl Iterator<Item = &'a Arc<dyn Tool>> {
        self.tools.iter().filter(move |tool| {
            capabilities
                .iter()
                .any(|cap| cap.eq_ignore_ascii_case(tool.name()))
        })
    }

    /// Text listing the allowed tools and their actions, empty when none are allowed.
    pub fn describe(&self, capabilities: &[String]) -> String {
        let mut description = String::new();
        for tool in self.allowed(capabilities) {
            description.push_str(&format!("- {}: {}\n", tool.name(), tool.description()));
            for action in tool.actions() {
                description.push_str(&format!("    * {}\n", action));
            }
        }
        description
    }
}
