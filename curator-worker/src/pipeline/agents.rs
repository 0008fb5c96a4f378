//! Agents and prompts
//!
//! One agent per stage. The system prompt carries who the agent is; the user
//! prompt carries the job input and everything earlier stages produced.

use curator_core::domain::{JobInput, StageKind, StageOutput};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Agent {
    pub stage: StageKind,
    pub role: &'static str,
    pub goal: &'static str,
    pub backstory: &'static str,
    pub expected_output: &'static str,
}

/// Agents in execution order
pub const AGENTS: [Agent; 3] = [
    Agent {
        stage: StageKind::Strategy,
        role: "Creative Director",
        goal: "Oversee and guide the creative process with strategic vision, \
               leveraging available tools and knowledge",
        backstory: "You are an experienced creative director who understands brand \
                    strategy, creative vision, and can guide teams to produce \
                    exceptional creative work.",
        expected_output: "A detailed creative brief and strategy document",
    },
    Agent {
        stage: StageKind::Creation,
        role: "Content Creator",
        goal: "Generate engaging and original creative content using available \
               research and tools",
        backstory: "You are a talented content creator with expertise in writing, \
                    storytelling, and creating compelling narratives across various \
                    formats and platforms.",
        expected_output: "High-quality creative content ready for review",
    },
    Agent {
        stage: StageKind::Review,
        role: "Quality Reviewer",
        goal: "Review and refine creative outputs for excellence, ensuring accuracy \
               with fact-checking",
        backstory: "You are a meticulous quality reviewer who ensures all creative work \
                    meets high standards of quality, consistency, and effectiveness.",
        expected_output: "Final reviewed and refined creative content with quality assessment",
    },
];

impl Agent {
    pub fn system_prompt(&self, tools_available: bool) -> String {
        let mut prompt = format!(
            "You are the {}.\n\nGoal: {}\n\n{}",
            self.role, self.goal, self.backstory
        );

        if tools_available {
            prompt.push_str(
                " You have access to tools for research and media generation; \
                 use them when they improve the result.",
            );
        }

        prompt.push_str(&format!("\n\nExpected output: {}.", self.expected_output));
        prompt
    }

    /// The stage task, with the job input and prior stage outputs inlined
    pub fn task_prompt(&self, input: &JobInput, prior: &[StageOutput]) -> String {
        let opening = match self.stage {
            StageKind::Strategy => "Develop a creative strategy for the following task:",
            StageKind::Creation => {
                "Based on the creative strategy, create the actual creative content for:"
            }
            StageKind::Review => "Review and refine the creative content created for:",
        };
        let mut prompt = format!("{}\n{}\n", opening, input.task_description);

        if self.stage != StageKind::Review {
            push_job_context(&mut prompt, input);
        }

        let instructions = match self.stage {
            StageKind::Strategy => {
                "Create a comprehensive creative brief including:\n\
                 1. Creative objectives\n\
                 2. Target audience analysis\n\
                 3. Key messaging and tone\n\
                 4. Creative direction and approach\n\
                 5. Success metrics"
            }
            StageKind::Creation => {
                "Ensure the content:\n\
                 1. Follows the creative brief\n\
                 2. Is engaging and original\n\
                 3. Meets all specified requirements\n\
                 4. Is appropriate for the target audience"
            }
            StageKind::Review => {
                "Evaluate:\n\
                 1. Content quality and effectiveness\n\
                 2. Alignment with creative brief\n\
                 3. Grammar, style, and consistency\n\
                 4. Overall impact and engagement potential\n\
                 5. Factual accuracy\n\n\
                 Provide the final polished version followed by improvement suggestions."
            }
        };
        prompt.push_str(&format!("\n{}\n", instructions));

        for stage in prior {
            prompt.push_str(&format!(
                "\n--- {} output ({}) ---\n{}\n",
                stage.stage, stage.agent_role, stage.output
            ));
        }

        prompt
    }
}

fn push_job_context(prompt: &mut String, input: &JobInput) {
    if let Some(context) = &input.project_context {
        prompt.push_str(&format!("\nProject Context: {}\n", context));
    }

    if let Some(requirements) = &input.requirements {
        prompt.push_str("\nRequirements:\n");
        for (key, value) in requirements {
            let value = match value {
                serde_json::Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            prompt.push_str(&format!("- {}: {}\n", key, value));
        }
    }
}
