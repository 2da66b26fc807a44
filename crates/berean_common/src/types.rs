//! Core data model shared between the daemon and its tests.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Placeholder rendered for any missing search result field.
pub const MISSING_FIELD: &str = "N/A";

/// A scripture passage to research, either structured or free text.
///
/// Immutable once constructed; built from request parameters by the
/// delivery layer and threaded through prompts by display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptureReference {
    Passage {
        book: String,
        chapter: u32,
        verse: u32,
    },
    FreeText(String),
}

impl ScriptureReference {
    pub fn passage(book: impl Into<String>, chapter: u32, verse: u32) -> Self {
        Self::Passage {
            book: book.into(),
            chapter,
            verse,
        }
    }

    pub fn free_text(text: impl Into<String>) -> Self {
        Self::FreeText(text.into())
    }

    /// Build a reference from wire fields. Chapter and verse arrive as
    /// string or integer; non-numeric text falls back to a free-text
    /// reference so the chain still has something to research.
    pub fn from_parts(book: &str, chapter: &NumberOrText, verse: &NumberOrText) -> Self {
        match (chapter.as_u32(), verse.as_u32()) {
            (Some(c), Some(v)) => Self::passage(book, c, v),
            _ => Self::free_text(format!("{} {}:{}", book, chapter, verse)),
        }
    }
}

impl fmt::Display for ScriptureReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passage {
                book,
                chapter,
                verse,
            } => write!(f, "{} {}:{}", book, chapter, verse),
            Self::FreeText(text) => f.write_str(text),
        }
    }
}

/// JSON field that clients send as either a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(i64),
    Text(String),
}

impl NumberOrText {
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::Number(n) => u32::try_from(*n).ok(),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for NumberOrText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One record extracted from an upstream search response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: Option<String>,
    pub link: Option<String>,
    pub snippet: Option<String>,
}

/// Closed set of tool capabilities an agent may be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolId {
    WebSearch,
    PlaceSearch,
    ScriptureQa,
}

impl ToolId {
    /// Identifier the agent protocol uses to request this tool.
    pub fn name(&self) -> &'static str {
        match self {
            Self::WebSearch => "web_search",
            Self::PlaceSearch => "place_search",
            Self::ScriptureQa => "scripture_qa",
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
#[error("unknown tool identifier: {0}")]
pub struct UnknownTool(pub String);

impl FromStr for ToolId {
    type Err = UnknownTool;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "web_search" => Ok(Self::WebSearch),
            "place_search" => Ok(Self::PlaceSearch),
            "scripture_qa" => Ok(Self::ScriptureQa),
            other => Err(UnknownTool(other.to_string())),
        }
    }
}

/// Outcome of one tool adapter call.
///
/// Adapters never raise past their boundary for upstream failures: the
/// typed variant lets the orchestrator tell "no results" from "call
/// failed", while `into_text` degrades to the fail-soft string the agent
/// chain consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    Success(String),
    Failed { reason: String },
}

impl ToolOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Degrade to the text an agent sees, success or not.
    pub fn into_text(self) -> String {
        match self {
            Self::Success(text) => text,
            Self::Failed { reason } => reason,
        }
    }
}

/// A persona bound to a model backend and a set of permitted tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    pub role: String,
    pub goal: String,
    pub backstory: String,
    pub tools: Vec<ToolId>,
    pub allow_delegation: bool,
    pub model: String,
}

impl AgentDescriptor {
    pub fn permits(&self, tool: ToolId) -> bool {
        self.tools.contains(&tool)
    }
}

/// One unit of work in the sequential chain, bound to one agent by index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    pub description: String,
    /// Index into the crew's agent list.
    pub agent: usize,
}

// ============================================================================
// Wire bodies
// ============================================================================

/// Body of `POST /process_verse`. All four fields are required; they are
/// optional here so the route can answer a structured 400 instead of a
/// deserialization rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessVerseRequest {
    pub book: Option<String>,
    pub chapter: Option<NumberOrText>,
    pub verse: Option<NumberOrText>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_display_passage() {
        let r = ScriptureReference::passage("John", 3, 16);
        assert_eq!(r.to_string(), "John 3:16");
    }

    #[test]
    fn test_reference_display_free_text() {
        let r = ScriptureReference::free_text("Psalm 23");
        assert_eq!(r.to_string(), "Psalm 23");
    }

    #[test]
    fn test_reference_from_parts_numeric_text() {
        let r = ScriptureReference::from_parts(
            "John",
            &NumberOrText::Text("3".to_string()),
            &NumberOrText::Number(16),
        );
        assert_eq!(r, ScriptureReference::passage("John", 3, 16));
    }

    #[test]
    fn test_reference_from_parts_non_numeric_falls_back() {
        let r = ScriptureReference::from_parts(
            "John",
            &NumberOrText::Text("three".to_string()),
            &NumberOrText::Number(16),
        );
        assert_eq!(r, ScriptureReference::free_text("John three:16"));
    }

    #[test]
    fn test_number_or_text_accepts_both_shapes() {
        let req: ProcessVerseRequest = serde_json::from_str(
            r#"{"book":"John","chapter":"3","verse":16,"email":"x@y.com"}"#,
        )
        .unwrap();
        assert_eq!(req.chapter.unwrap().as_u32(), Some(3));
        assert_eq!(req.verse.unwrap().as_u32(), Some(16));
    }

    #[test]
    fn test_missing_fields_deserialize_as_none() {
        let req: ProcessVerseRequest = serde_json::from_str(r#"{"book":"John"}"#).unwrap();
        assert!(req.chapter.is_none());
        assert!(req.verse.is_none());
        assert!(req.email.is_none());
    }

    #[test]
    fn test_tool_id_round_trip() {
        for tool in [ToolId::WebSearch, ToolId::PlaceSearch, ToolId::ScriptureQa] {
            assert_eq!(tool.name().parse::<ToolId>().unwrap(), tool);
        }
        assert!("duckduckgo".parse::<ToolId>().is_err());
    }

    #[test]
    fn test_tool_outcome_degrades_to_text() {
        let ok = ToolOutcome::Success("results".to_string());
        assert!(ok.is_success());
        assert_eq!(ok.into_text(), "results");

        let failed = ToolOutcome::failed("Failed to search the internet.");
        assert!(!failed.is_success());
        assert_eq!(failed.into_text(), "Failed to search the internet.");
    }
}
