//! Crew orchestration: agent/task construction and the sequential chain.

pub mod crew;
pub mod engine;

pub use crew::{research_crew, AgentRunner, Crew};
pub use engine::LlmAgentRunner;
