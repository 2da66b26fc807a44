//! The crew: three persona agents and a strict sequential task chain.
//!
//! How a single task turns into tool calls and delegation belongs to the
//! `AgentRunner` behind the trait seam; the crew owns only construction,
//! ordering, and context passing. Task i+1 starts only after task i has
//! completed, with task i's output as its context.

use crate::config::Config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use berean_common::prompts;
use berean_common::{AgentDescriptor, ScriptureReference, TaskDescriptor, ToolId};
use tracing::info;

/// Opaque task execution capability: run one task for its agent, with the
/// previous task's output as context, and produce text.
#[async_trait]
pub trait AgentRunner: Send + Sync {
    async fn run(
        &self,
        agents: &[AgentDescriptor],
        task: &TaskDescriptor,
        context: Option<&str>,
    ) -> Result<String>;
}

/// An ordered task chain over a fixed set of agents.
#[derive(Debug, Clone)]
pub struct Crew {
    pub agents: Vec<AgentDescriptor>,
    pub tasks: Vec<TaskDescriptor>,
}

impl Crew {
    /// Execute the task chain sequentially and return the final artifact.
    ///
    /// The artifact is the last task's output; each task sees only the
    /// directly preceding output as context.
    pub async fn kickoff(&self, runner: &dyn AgentRunner) -> Result<String> {
        let mut previous: Option<String> = None;
        for (i, task) in self.tasks.iter().enumerate() {
            let role = self
                .agents
                .get(task.agent)
                .map(|a| a.role.as_str())
                .unwrap_or("unknown");
            info!("[T]  Task {}/{} ({})", i + 1, self.tasks.len(), role);
            let output = runner
                .run(&self.agents, task, previous.as_deref())
                .await
                .with_context(|| format!("task {} ({}) failed", i + 1, role))?;
            previous = Some(output);
        }
        previous.context("crew has no tasks")
    }
}

/// Build the research crew for one scripture reference.
///
/// Chain order follows the latest revision of the service: linguist
/// first, then historian, then the journalist writes the article on top
/// of both analyses.
pub fn research_crew(reference: &ScriptureReference, config: &Config) -> Crew {
    let reference = reference.to_string();
    let model = config.llm.model.clone();

    let journalist = AgentDescriptor {
        role: prompts::JOURNALIST_ROLE.to_string(),
        goal: prompts::journalist_goal(&reference),
        backstory: prompts::JOURNALIST_BACKSTORY.to_string(),
        tools: vec![ToolId::WebSearch, ToolId::ScriptureQa],
        allow_delegation: true,
        model: model.clone(),
    };
    let historian = AgentDescriptor {
        role: prompts::HISTORIAN_ROLE.to_string(),
        goal: prompts::historian_goal(),
        backstory: prompts::HISTORIAN_BACKSTORY.to_string(),
        tools: vec![ToolId::PlaceSearch, ToolId::WebSearch],
        allow_delegation: false,
        model: model.clone(),
    };
    let linguist = AgentDescriptor {
        role: prompts::LINGUIST_ROLE.to_string(),
        goal: prompts::linguist_goal(),
        backstory: prompts::LINGUIST_BACKSTORY.to_string(),
        tools: vec![ToolId::WebSearch],
        allow_delegation: false,
        model,
    };

    let tasks = vec![
        TaskDescriptor {
            description: prompts::linguist_task(&reference),
            agent: 2,
        },
        TaskDescriptor {
            description: prompts::historian_task(&reference),
            agent: 1,
        },
        TaskDescriptor {
            description: prompts::journalist_task(&reference),
            agent: 0,
        },
    ];

    Crew {
        agents: vec![journalist, historian, linguist],
        tasks,
    }
}
