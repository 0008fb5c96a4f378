use async_trait::async_trait;
use curator_core::domain::{JobId, JobInput, StageOutput, ToolInvocation, WorkflowResult};
use std::sync::Arc;
use tracing::{Instrument, debug, info, info_span, warn};

use super::{AGENTS, Agent, PipelineError, WorkflowExecutor};
use crate::generation::{ContentBlock, GenerationBackend, GenerationRequest, Message, Role};
use crate::tools::ToolRegistry;

/// Standard implementation of [`WorkflowExecutor`]
pub struct PipelineExecutor {
    backend: Arc<dyn GenerationBackend>,
    tools: Arc<ToolRegistry>,
    max_tool_rounds: usize,
}

impl PipelineExecutor {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        tools: Arc<ToolRegistry>,
        max_tool_rounds: usize,
    ) -> Self {
        Self {
            backend,
            tools,
            max_tool_rounds,
        }
    }

    /// Runs one stage's conversation until the model answers in text.
    ///
    /// Each round the model may request tools; their outcomes are sent back
    /// and the model is called again. Once `max_tool_rounds` is spent the
    /// model is told to answer without tools.
    async fn run_stage(
        &self,
        agent: &Agent,
        input: &JobInput,
        prior: &[StageOutput],
    ) -> Result<StageOutput, PipelineError> {
        let tools = self.tools.specs();
        let mut request = GenerationRequest {
            system: agent.system_prompt(!tools.is_empty()),
            messages: vec![Message::user(agent.task_prompt(input, prior))],
            allow_tool_use: !tools.is_empty(),
            tools,
        };
        let mut invocations = Vec::new();
        let mut rounds = 0;

        loop {
            request.allow_tool_use = !request.tools.is_empty() && rounds < self.max_tool_rounds;

            let response = self
                .backend
                .generate(&request)
                .await
                .map_err(|source| PipelineError::Generation {
                    stage: agent.stage,
                    source,
                })?;

            let calls = response.tool_calls();
            if calls.is_empty() || !request.allow_tool_use {
                let output = response.text().trim().to_string();
                if output.is_empty() {
                    return Err(PipelineError::EmptyOutput { stage: agent.stage });
                }

                return Ok(StageOutput {
                    stage: agent.stage,
                    agent_role: agent.role.to_string(),
                    output,
                    tool_invocations: invocations,
                });
            }

            rounds += 1;
            debug!("Round {}: model requested {} tool call(s)", rounds, calls.len());
            request.messages.push(response.into_message());

            let mut results = Vec::with_capacity(calls.len());
            for call in calls {
                let outcome = self.tools.invoke(&call.name, call.input.clone()).await;
                if !outcome.success {
                    warn!(
                        "Tool {} failed in {} stage, continuing",
                        call.name, agent.stage
                    );
                }

                results.push(ContentBlock::tool_result(&call.id, &outcome));
                invocations.push(ToolInvocation {
                    tool: call.name,
                    parameters: call.input,
                    outcome,
                });
            }

            request.messages.push(Message {
                role: Role::User,
                content: results,
            });
        }
    }
}

#[async_trait]
impl WorkflowExecutor for PipelineExecutor {
    async fn execute(&self, job_id: JobId, input: &JobInput) -> Result<WorkflowResult, PipelineError> {
        let mut stages: Vec<StageOutput> = Vec::with_capacity(AGENTS.len());

        for agent in &AGENTS {
            let span = info_span!("stage", job_id = %job_id, stage = %agent.stage);

            async {
                info!("Running {} stage ({})", agent.stage, agent.role);
                let output = self.run_stage(agent, input, &stages).await?;
                info!(
                    "{} stage finished with {} tool call(s)",
                    agent.stage,
                    output.tool_invocations.len()
                );
                stages.push(output);
                Ok::<_, PipelineError>(())
            }
            .instrument(span)
            .await?;
        }

        Ok(WorkflowResult::from_stages(stages))
    }
}
