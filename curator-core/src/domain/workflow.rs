//! Workflow result types
//!
//! What a pipeline run produced: one [`StageOutput`] per stage in execution
//! order, with every tool call the stage made recorded inline.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    Strategy,
    Creation,
    Review,
}

impl StageKind {
    /// Execution order
    pub const ALL: [StageKind; 3] = [StageKind::Strategy, StageKind::Creation, StageKind::Review];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Strategy => "strategy",
            StageKind::Creation => "creation",
            StageKind::Review => "review",
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single tool call.
///
/// Tool failures are values, not errors: a failed call is recorded here and
/// the stage carries on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub success: bool,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
}

impl ToolOutcome {
    pub fn ok(result: serde_json::Value) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub tool: String,
    pub parameters: serde_json::Value,
    pub outcome: ToolOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageOutput {
    pub stage: StageKind,
    pub agent_role: String,
    pub output: String,
    #[serde(default)]
    pub tool_invocations: Vec<ToolInvocation>,
}

/// Consolidated pipeline output stored on a completed job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowResult {
    /// Output of the last stage
    pub output: String,
    pub stages: Vec<StageOutput>,
    pub task_count: usize,
    pub agent_count: usize,
    pub tool_invocation_count: usize,
}

impl WorkflowResult {
    pub fn from_stages(stages: Vec<StageOutput>) -> Self {
        let output = stages
            .last()
            .map(|stage| stage.output.clone())
            .unwrap_or_default();
        let agent_count = stages
            .iter()
            .map(|stage| stage.agent_role.as_str())
            .collect::<HashSet<_>>()
            .len();
        let tool_invocation_count = stages
            .iter()
            .map(|stage| stage.tool_invocations.len())
            .sum();

        Self {
            output,
            task_count: stages.len(),
            agent_count,
            tool_invocation_count,
            stages,
        }
    }

    /// Tool calls that failed anywhere in the run
    pub fn failed_tool_invocations(&self) -> impl Iterator<Item = &ToolInvocation> {
        self.stages
            .iter()
            .flat_map(|stage| stage.tool_invocations.iter())
            .filter(|invocation| !invocation.outcome.success)
    }
}
