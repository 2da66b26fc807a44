//! Berean daemon library.
//!
//! Request flow: HTTP request -> scripture reference -> research crew
//! (sequential task chain, persona agents calling search tools over HTTP)
//! -> text artifact -> JSON response and/or outbound email.

pub mod config;
pub mod llm;
pub mod mailer;
pub mod orchestrator;
pub mod routes;
pub mod search;
pub mod server;
