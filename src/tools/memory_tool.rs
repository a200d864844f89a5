use super::{Tool, ToolAction};
use crate::agents::CapabilityError;
use crate::constants::MEMORY_RECALL_LIMIT;
use crate::memory::MemoryStore;
use std::sync::Arc;

/// Lets an agent store and search text in a [`MemoryStore`].
///
/// The swarm's short-term memory is usually exposed as `memories` and its
/// knowledge store as `knowledge`.
#[derive(Debug)]
pub struct MemoryTool {
    name: String,
    description: String,
    store: Arc<dyn MemoryStore>,
}

impl MemoryTool {
    pub fn new(name: impl Into<String>, store: Arc<dyn MemoryStore>) -> Self {
        let name = name.into();
        Self {
            description: format!("Insert and recall text in the '{}' store", name),
            name,
            store,
        }
    }

    fn error(&self, message: impl Into<String>) -> CapabilityError {
        CapabilityError::Tool {
            tool: self.name.clone(),
            message: message.into(),
        }
    }
}

#[async_trait::async_trait]
impl Tool for MemoryTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn actions(&self) -> Vec<ToolAction> {
        vec![
            ToolAction {
                name: "insert".to_string(),
                arg_count: 1,
                description: "Store a piece of text. Usage: insert <text>".to_string(),
            },
            ToolAction {
                name: "recall".to_string(),
                arg_count: 1,
                description: "Search stored text by keywords. Usage: recall <query>".to_string(),
            },
        ]
    }

    async fn call(&self, action: &str, params: &[String]) -> Result<String, CapabilityError> {
        match action {
            "insert" => {
                if params.is_empty() {
                    return Err(self.error("missing content for 'insert'"));
                }
                let content = params.join(" ");
                let key = format!("{}-{}", self.name, uuid::Uuid::new_v4());
                self.store
                    .save(&key, &content)
                    .await
                    .map_err(|e| self.error(e.to_string()))?;
                Ok(format!(
                    "Stored in {}. Recall it later with '{} recall <query>'.",
                    self.name, self.name
                ))
            }
            "recall" => {
                if params.is_empty() {
                    return Err(self.error("missing query for 'recall'"));
                }
                let query = params.join(" ");
                let results = self
                    .store
                    .search(&query, MEMORY_RECALL_LIMIT)
                    .await
                    .map_err(|e| self.error(e.to_string()))?;

                if results.is_empty() {
                    return Ok(format!("Nothing relevant found in {}.", self.name));
                }
                let lines: Vec<String> = results
                    .iter()
                    .enumerate()
                    .map(|(i, entry)| format!("{}: {}", i + 1, entry.value))
                    .collect();
                Ok(format!("Found in {}:\n{}", self.name, lines.join("\n")))
            }
            other => Err(self.error(format!("unknown action '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;

    fn params(text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    #[tokio::test]
    async fn test_insert_then_recall() {
        let store = Arc::new(InMemoryStore::new());
        let tool = MemoryTool::new("memories", store.clone());

        tool.call("insert", &params("tokio uses a work stealing scheduler"))
            .await
            .unwrap();
        assert_eq!(store.len().await.unwrap(), 1);

        let found = tool.call("recall", &params("scheduler")).await.unwrap();
        assert!(found.starts_with("Found in memories:"));
        assert!(found.contains("1: tokio uses a work stealing scheduler"));

        let missing = tool.call("recall", &params("gardening")).await.unwrap();
        assert_eq!(missing, "Nothing relevant found in memories.");
    }

    #[tokio::test]
    async fn test_invalid_calls() {
        let tool = MemoryTool::new("knowledge", Arc::new(InMemoryStore::new()));
        let err = tool.call("insert", &[]).await.unwrap_err();
        assert!(matches!(err, CapabilityError::Tool { ref tool, .. } if tool == "knowledge"));
        assert!(tool.call("forget", &params("x")).await.is_err());
        assert_eq!(tool.actions().len(), 2);
    }
}
