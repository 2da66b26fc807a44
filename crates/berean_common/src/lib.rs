//! Berean Common - Shared types and prompt text for the Berean research service
//!
//! Everything the daemon and its tests agree on lives here: the scripture
//! reference, search result records, agent/task descriptors, tool
//! identifiers, wire bodies, and the persona prompt templates.

pub mod prompts;
pub mod types;

pub use types::*;
