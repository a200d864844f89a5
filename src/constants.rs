/// Number of description words kept in a task output summary
pub const SUMMARY_WORD_COUNT: usize = 10;

/// Maximum characters of each prior output fed into the final synthesis step
pub const SYNTHESIS_OUTPUT_CHAR_LIMIT: usize = 3_000;

/// Shortest word considered when matching task descriptions against agent roles
pub const MIN_KEYWORD_LEN: usize = 4;

/// Task id of the manager's planning step in hierarchical runs
pub const COORDINATION_TASK_ID: &str = "coordination";

/// Task id of the manager's synthesis step in hierarchical runs
pub const FINAL_SYNTHESIS_TASK_ID: &str = "final_synthesis";

/// Marker agents use to request a tool invocation
pub const TOOL_REQUEST_MARKER: &str = "TOOL_REQUEST:";

/// Default number of tool round-trips allowed in one executor call
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 5;

/// Character budget for a conversation sent to an LLM provider
pub const DEFAULT_CONTEXT_CHAR_BUDGET: usize = 35_000;

/// Length of one rate-limit window
pub const RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Default number of results returned by memory recall
pub const MEMORY_RECALL_LIMIT: usize = 5;

/// Instructions given to the manager when it plans the delegation
pub const COORDINATION_PROMPT: &str = "You are coordinating a team. Review the tasks and the available team members below and describe, for each task, which member is best suited and why. Keep the plan short.";

/// Instructions given to the manager for the final answer
pub const FINAL_SYNTHESIS_PROMPT: &str = "Combine the work of your team into one final answer. Use strictly the material supplied below; do not add facts that are not present in it.";
