//! LLM-backed agent runner: the directive loop behind the crew's trait seam.
//!
//! Each iteration asks the model for one JSON directive (tool requests,
//! a delegation, or a final answer), executes whatever the persona is
//! permitted, and feeds the results back as evidence. Robust to common
//! model output variations: prose-wrapped JSON, markdown fences, and raw
//! prose (treated as the final answer).

use crate::llm::GeminiClient;
use crate::orchestrator::crew::AgentRunner;
use crate::search::SearchClient;
use anyhow::Result;
use async_trait::async_trait;
use berean_common::prompts::persona_system_prompt;
use berean_common::{AgentDescriptor, TaskDescriptor, ToolId};
use serde::Deserialize;
use tracing::{info, warn};

/// One parsed model directive.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Directive {
    #[serde(default)]
    pub tool_requests: Vec<ToolRequest>,
    #[serde(default)]
    pub delegate: Option<DelegateRequest>,
    #[serde(default)]
    pub answer: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ToolRequest {
    pub tool: String,
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DelegateRequest {
    pub role: String,
    pub question: String,
}

impl Directive {
    /// Parse a model reply. Tries the raw text, then a brace-delimited
    /// substring for prose-wrapped JSON; `None` means the reply is prose
    /// and should be taken as the final answer.
    pub(crate) fn parse(text: &str) -> Option<Directive> {
        if let Ok(directive) = serde_json::from_str::<Directive>(text) {
            return Some(directive);
        }
        serde_json::from_str::<Directive>(&extract_json(text)).ok()
    }

    fn final_answer(&self) -> Option<&str> {
        self.answer.as_deref().map(str::trim).filter(|a| !a.is_empty())
    }

    fn requests_work(&self) -> bool {
        !self.tool_requests.is_empty() || self.delegate.is_some()
    }
}

/// Extract JSON from text that may have prose or fences around it.
fn extract_json(text: &str) -> String {
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            return text[start..=end].to_string();
        }
    }
    text.to_string()
}

/// Production `AgentRunner`: Gemini for reasoning, the search client for
/// tool calls, bounded iterations per task.
pub struct LlmAgentRunner {
    llm: GeminiClient,
    search: SearchClient,
    max_iterations: usize,
}

impl LlmAgentRunner {
    pub fn new(llm: GeminiClient, search: SearchClient, max_iterations: usize) -> Self {
        Self {
            llm,
            search,
            max_iterations: max_iterations.max(1),
        }
    }

    fn colleague_roles<'a>(
        agents: &'a [AgentDescriptor],
        current: &AgentDescriptor,
    ) -> Vec<&'a str> {
        agents
            .iter()
            .filter(|a| a.role != current.role)
            .map(|a| a.role.as_str())
            .collect()
    }

    fn build_user_prompt(
        task: &TaskDescriptor,
        context: Option<&str>,
        evidence: &[String],
        force_answer: bool,
    ) -> String {
        let mut prompt = format!("TASK:\n{}\n", task.description);
        if let Some(context) = context {
            prompt.push_str(&format!("\nCONTEXT (previous task output):\n{}\n", context));
        }
        for (i, entry) in evidence.iter().enumerate() {
            prompt.push_str(&format!("\nEVIDENCE [E{}]:\n{}\n", i, entry));
        }
        if force_answer {
            prompt.push_str(
                "\nYou are out of research turns. Reply with your final answer now: \
                 a single JSON object with only the \"answer\" field set.\n",
            );
        } else {
            prompt.push_str("\nReply with one JSON directive.\n");
        }
        prompt
    }

    async fn execute_tool(&self, agent: &AgentDescriptor, request: &ToolRequest) -> String {
        let tool: ToolId = match request.tool.parse() {
            Ok(tool) => tool,
            Err(e) => {
                warn!("[A]  {} requested unknown tool: {}", agent.role, e);
                return format!("Tool request refused: {}.", e);
            }
        };
        if !agent.permits(tool) {
            warn!("[A]  {} requested unpermitted tool {}", agent.role, tool);
            return format!("Tool request refused: {} is not permitted for {}.", tool, agent.role);
        }
        info!("[A]  {} -> {}({})", agent.role, tool, request.query);
        let outcome = match tool {
            ToolId::WebSearch => self.search.search_web(&request.query).await,
            ToolId::PlaceSearch => self.search.search_places(&request.query).await,
            ToolId::ScriptureQa => self.search.answer_scripture_question(&request.query).await,
        };
        format!("{} for \"{}\":\n{}", tool, request.query, outcome.into_text())
    }

    /// Resolve one delegation as a single nested model call under the
    /// delegate's persona. The delegate answers directly; no nested tools.
    async fn execute_delegation(
        &self,
        agents: &[AgentDescriptor],
        agent: &AgentDescriptor,
        request: &DelegateRequest,
    ) -> Result<String> {
        if !agent.allow_delegation {
            warn!("[A]  {} attempted delegation without permission", agent.role);
            return Ok(format!(
                "Delegation refused: {} is not allowed to delegate.",
                agent.role
            ));
        }
        let Some(delegate) = agents
            .iter()
            .find(|a| a.role != agent.role && a.role.eq_ignore_ascii_case(request.role.trim()))
        else {
            warn!("[A]  {} delegated to unknown role {}", agent.role, request.role);
            return Ok(format!("Delegation refused: no colleague named {}.", request.role));
        };
        info!("[A]  {} delegates to {}", agent.role, delegate.role);
        let system = format!(
            "You are the {}.\n\nGoal: {}\n\nBackstory: {}\n\nA colleague asks for your \
             expertise. Answer the question directly and concisely, in plain text.",
            delegate.role, delegate.goal, delegate.backstory
        );
        let answer = self.llm.generate(&system, &request.question).await?;
        Ok(format!(
            "Answer from {} to \"{}\":\n{}",
            delegate.role,
            request.question,
            answer.trim()
        ))
    }
}

#[async_trait]
impl AgentRunner for LlmAgentRunner {
    async fn run(
        &self,
        agents: &[AgentDescriptor],
        task: &TaskDescriptor,
        context: Option<&str>,
    ) -> Result<String> {
        let agent = agents
            .get(task.agent)
            .ok_or_else(|| anyhow::anyhow!("task references unknown agent {}", task.agent))?;
        let colleagues = Self::colleague_roles(agents, agent);
        let system = persona_system_prompt(agent, &colleagues);
        let mut evidence: Vec<String> = Vec::new();

        for iteration in 1..=self.max_iterations {
            let user = Self::build_user_prompt(task, context, &evidence, false);
            let reply = self.llm.generate(&system, &user).await?;

            let Some(directive) = Directive::parse(&reply) else {
                // Prose reply: the model skipped the protocol and answered.
                return Ok(reply.trim().to_string());
            };
            if let Some(answer) = directive.final_answer() {
                info!("[A]  {} answered after {} iteration(s)", agent.role, iteration);
                return Ok(answer.to_string());
            }
            if !directive.requests_work() {
                // Empty directive: no answer and no work. Burn the iteration
                // instead of returning protocol text as the artifact.
                warn!("[A]  {} returned an empty directive", agent.role);
                continue;
            }

            for request in &directive.tool_requests {
                evidence.push(self.execute_tool(agent, request).await);
            }
            if let Some(delegate) = &directive.delegate {
                evidence.push(self.execute_delegation(agents, agent, delegate).await?);
            }
        }

        // Out of iterations: force a final answer on the collected evidence.
        let user = Self::build_user_prompt(task, context, &evidence, true);
        let reply = self.llm.generate(&system, &user).await?;
        let answer = Directive::parse(&reply)
            .and_then(|d| d.final_answer().map(String::from))
            .unwrap_or_else(|| reply.trim().to_string());
        Ok(answer)
    }
}
