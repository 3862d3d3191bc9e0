//! Decision generator boundary — the external LLM call
//!
//! Everything the core knows about the language model is behind the
//! `DecisionGenerator` trait: perceived state in, raw text out. The raw
//! text is untrusted; parsing and validation live in `decision`, and a
//! failed generator call is converted by the caller into a synthetic wait
//! (the agent never loses more than the one turn).
//!
//! `GroqClient` talks to the Groq OpenAI-compatible chat completions API.
//! `ScriptedGenerator` replays canned decisions for tests and offline runs.

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{AgoraError, Result};
use crate::market::Offer;

/// What an agent perceives at the start of its turn — the full prompt context
#[derive(Debug, Clone)]
pub struct AgentView {
    pub name: String,
    pub role: String,
    pub budget: Decimal,
    /// item -> count, sorted for a stable prompt
    pub inventory: Vec<(String, i64)>,
    pub recent_memories: Vec<String>,
    pub open_offers: Vec<Offer>,
}

impl AgentView {
    /// Render the decision prompt. The formatting rules (integers only, no
    /// arithmetic expressions in params) exist because small models happily
    /// emit "250 / 0.4" as a JSON number otherwise.
    pub fn to_prompt(&self) -> String {
        let inventory = if self.inventory.is_empty() {
            "(empty)".to_string()
        } else {
            self.inventory
                .iter()
                .map(|(item, count)| format!("{item}: {count}"))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let memories = if self.recent_memories.is_empty() {
            "(none)".to_string()
        } else {
            self.recent_memories.join("; ")
        };

        let offers = if self.open_offers.is_empty() {
            "(no open offers)".to_string()
        } else {
            self.open_offers
                .iter()
                .map(|o| {
                    format!(
                        "offer_id={} seller={} item={} price=${} quantity={}",
                        o.offer_id, o.seller, o.item, o.price, o.quantity
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")
        };

        format!(
            r#"You are {name}, {role}.
Current Budget: ${budget}
Current Inventory: {inventory}

Recent Memories: {memories}
Market Offers:
{offers}

What is your move? You can 'buy [offer_id]', 'post [item] [price] [qty]', or 'wait'.

IMPORTANT:
1. The 'params' field must contain ONLY raw numbers or strings.
2. DO NOT include mathematical expressions like "250 / 0.4" in the JSON.
3. Perform all calculations before generating the JSON.
4. Quantities MUST be whole numbers (integers) - you cannot buy/sell 10.5 wood!
5. If buying, specify 'quantity' as an integer.
6. If posting, 'qty' must be an integer.

Respond ONLY in JSON format:
{{
    "reasoning": "Explain your logic here",
    "command": "buy" | "post" | "wait",
    "params": {{
        "offer_id": int (if buying),
        "item": "string" (if posting),
        "price": float (if posting),
        "qty": int (if posting, MUST BE INTEGER),
        "quantity": int (if buying, MUST BE INTEGER)
    }}
}}"#,
            name = self.name,
            role = self.role,
            budget = self.budget,
        )
    }
}

/// Source of raw decision text for an agent turn
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DecisionGenerator: Send + Sync {
    /// Produce raw text expected to parse as a decision object. Any error
    /// here costs the agent one turn; it is never retried within the turn.
    async fn generate(&self, view: &AgentView) -> Result<String>;
}

/// Groq API client configuration
#[derive(Debug, Clone)]
pub struct GroqConfig {
    /// API key for Groq
    pub api_key: String,
    /// API base URL
    pub base_url: String,
    /// Request timeout
    pub timeout_secs: u64,
    /// Model to use
    pub model: String,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.groq.com/openai/v1".to_string(),
            timeout_secs: 30,
            model: "llama-3.1-8b-instant".to_string(),
        }
    }
}

impl GroqConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("GROQ_API_KEY").unwrap_or_default(),
            base_url: std::env::var("GROQ_API_URL")
                .unwrap_or_else(|_| "https://api.groq.com/openai/v1".to_string()),
            timeout_secs: 30,
            model: std::env::var("GROQ_MODEL")
                .unwrap_or_else(|_| "llama-3.1-8b-instant".to_string()),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Chat completions request
#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    /// Ask the service to constrain output to a JSON object
    response_format: ResponseFormat,
}

#[derive(Debug, Clone, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

/// Chat completions response
#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Groq chat completions client
pub struct GroqClient {
    config: GroqConfig,
    http: Client,
}

impl GroqClient {
    /// Create a new Groq client
    pub fn new(config: GroqConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgoraError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(GroqConfig::from_env())
    }

    /// Check if client is properly configured
    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }
}

#[async_trait]
impl DecisionGenerator for GroqClient {
    async fn generate(&self, view: &AgentView) -> Result<String> {
        if !self.is_configured() {
            return Err(AgoraError::Service("Groq API key not configured".to_string()));
        }

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: view.to_prompt(),
            }],
            response_format: ResponseFormat {
                kind: "json_object".to_string(),
            },
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgoraError::Service(format!("completion request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AgoraError::Service(format!(
                "completion request returned {}: {}",
                status, body
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AgoraError::Service(format!("malformed completion response: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AgoraError::Service("completion response had no choices".to_string()))?;

        debug!(agent = %view.name, "raw decision: {}", content);
        Ok(content)
    }
}

/// Deterministic generator that replays a fixed queue of decisions.
///
/// Once the queue is exhausted every turn waits. Used by tests and by the
/// offline CLI mode.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    decisions: Mutex<VecDeque<String>>,
}

impl ScriptedGenerator {
    pub fn new(decisions: impl IntoIterator<Item = String>) -> Self {
        Self {
            decisions: Mutex::new(decisions.into_iter().collect()),
        }
    }
}

#[async_trait]
impl DecisionGenerator for ScriptedGenerator {
    async fn generate(&self, _view: &AgentView) -> Result<String> {
        let next = self.decisions.lock().await.pop_front();
        Ok(next.unwrap_or_else(|| {
            r#"{"reasoning": "script exhausted", "command": "wait", "params": {}}"#.to_string()
        }))
    }
}
