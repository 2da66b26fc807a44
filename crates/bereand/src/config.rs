//! Configuration for bereand.
//!
//! Non-secret knobs load from a toml file (or defaults). Secrets come
//! only from the environment and are mandatory: the process refuses to
//! start if any is missing.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::{info, warn};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/berean/config.toml";

/// Default config file path for fallback
pub const DEFAULT_CONFIG_PATH: &str = "berean.toml";

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP listener
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

/// LLM backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model used by every agent in the crew
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-call timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub request_timeout_secs: u64,
}

fn default_model() -> String {
    "gemini-pro".to_string()
}

fn default_temperature() -> f32 {
    0.5
}

fn default_llm_timeout() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            request_timeout_secs: default_llm_timeout(),
        }
    }
}

/// Search tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Serper API base URL (web and place search)
    #[serde(default = "default_serper_base_url")]
    pub serper_base_url: String,

    /// Scripture Q&A prediction endpoint
    #[serde(default = "default_qa_endpoint")]
    pub qa_endpoint: String,

    /// Top results kept from a web search
    #[serde(default = "default_top_n")]
    pub web_top_n: usize,

    /// Top results kept from a place search
    #[serde(default = "default_top_n")]
    pub place_top_n: usize,

    /// Per-call timeout in seconds
    #[serde(default = "default_search_timeout")]
    pub request_timeout_secs: u64,
}

fn default_serper_base_url() -> String {
    "https://google.serper.dev".to_string()
}

fn default_qa_endpoint() -> String {
    "https://flow.koltelecom.com/api/v1/prediction/56c19c1f-1e29-436b-b322-df00eb66a998"
        .to_string()
}

fn default_top_n() -> usize {
    4
}

fn default_search_timeout() -> u64 {
    15
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            serper_base_url: default_serper_base_url(),
            qa_endpoint: default_qa_endpoint(),
            web_top_n: default_top_n(),
            place_top_n: default_top_n(),
            request_timeout_secs: default_search_timeout(),
        }
    }
}

/// Task chain configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Wall-clock budget for one full task chain, in seconds
    #[serde(default = "default_chain_budget")]
    pub total_budget_secs: u64,

    /// Directive iterations allowed per task before a forced answer
    #[serde(default = "default_max_tool_iterations")]
    pub max_tool_iterations: usize,
}

fn default_chain_budget() -> u64 {
    300
}

fn default_max_tool_iterations() -> usize {
    4
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            total_budget_secs: default_chain_budget(),
            max_tool_iterations: default_max_tool_iterations(),
        }
    }
}

/// Full daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub chain: ChainConfig,
}

impl Config {
    /// Load config from file, or return defaults
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_PATH)
            .or_else(|_| Self::load_from_path(DEFAULT_CONFIG_PATH))
            .unwrap_or_else(|e| {
                warn!("Config not found, using defaults: {}", e);
                Config::default()
            })
    }

    /// Load config from specific path
    pub fn load_from_path(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded config from {}", path);
        Ok(config)
    }
}

/// SMTP credentials and transport settings
#[derive(Debug, Clone)]
pub struct SmtpSecrets {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub starttls: bool,
}

/// Secrets loaded from the environment. Every field except the STARTTLS
/// flag is mandatory at startup.
#[derive(Debug, Clone)]
pub struct Secrets {
    pub serper_api_key: String,
    pub gemini_api_key: String,
    pub smtp: SmtpSecrets,
}

fn required_env(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("{} is not set in the environment", name))
}

impl Secrets {
    pub fn from_env() -> Result<Self> {
        let port = required_env("SMTP_PORT")?;
        let port: u16 = port
            .trim()
            .parse()
            .with_context(|| format!("SMTP_PORT is not a valid port: {}", port))?;
        let starttls = match std::env::var("SMTP_STARTTLS") {
            Ok(v) => !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no"),
            Err(_) => true,
        };
        Ok(Self {
            serper_api_key: required_env("SERPER_API_KEY")?,
            gemini_api_key: required_env("GEMINI_API_KEY")?,
            smtp: SmtpSecrets {
                host: required_env("SMTP_HOST")?,
                port,
                username: required_env("SMTP_USERNAME")?,
                password: required_env("SMTP_PASSWORD")?,
                from: required_env("SMTP_FROM")?,
                starttls,
            },
        })
    }
}
