//! Tool DTOs
//!
//! Shapes for listing the registered tools and running one directly.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::ToolOutcome;
use crate::dto::job::ValidationError;

/// A registered tool and the parameters it accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub input_schema: JsonValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolList {
    pub tools: Vec<ToolInfo>,
    pub count: usize,
}

impl From<Vec<ToolInfo>> for ToolList {
    fn from(tools: Vec<ToolInfo>) -> Self {
        Self {
            count: tools.len(),
            tools,
        }
    }
}

/// Request to run one tool outside of a job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteTool {
    pub tool_name: String,
    #[serde(default = "empty_object")]
    pub parameters: JsonValue,
}

fn empty_object() -> JsonValue {
    JsonValue::Object(Default::default())
}

impl ExecuteTool {
    pub fn new(tool_name: impl Into<String>, parameters: JsonValue) -> Self {
        Self {
            tool_name: tool_name.into(),
            parameters,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.tool_name.trim().is_empty() {
            return Err(ValidationError::EmptyToolName);
        }
        if !self.parameters.is_object() {
            return Err(ValidationError::ParametersNotObject);
        }
        Ok(())
    }
}

/// Result of a direct tool run. A failing tool is reported here with
/// `success: false`, not as an HTTP error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolExecution {
    pub success: bool,
    pub tool_name: String,
    pub result: Option<JsonValue>,
    pub error: Option<String>,
}

impl ToolExecution {
    pub fn new(tool_name: impl Into<String>, outcome: ToolOutcome) -> Self {
        Self {
            success: outcome.success,
            tool_name: tool_name.into(),
            result: outcome.result,
            error: outcome.error,
        }
    }
}
