//! Base provider trait and common types for MathGenius
//!
//! This module defines the Provider trait that the hosted model backend must
//! implement, along with the request, content and response types exchanged
//! with it.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Role of a prior turn replayed to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// A message written by the student
    User,
    /// A message written by the model
    Model,
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Model => write!(f, "model"),
        }
    }
}

/// One part of a request or history turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentPart {
    /// Plain text
    Text(String),
    /// Base64-encoded file bytes with their media type
    InlineData {
        /// Media type, e.g. "image/png"
        mime_type: String,
        /// Standard base64 payload without data-URL prefix
        data: String,
    },
}

impl ContentPart {
    /// Creates a text part
    ///
    /// # Examples
    ///
    /// ```
    /// use mathgenius::providers::ContentPart;
    ///
    /// let part = ContentPart::text("Tìm x");
    /// assert_eq!(part, ContentPart::Text("Tìm x".to_string()));
    /// ```
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Creates an inline data part
    pub fn inline_data(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self::InlineData {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }
}

/// A prior turn replayed to the model
///
/// Recomputed from the conversation log before every call; never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Who produced the turn
    pub role: TurnRole,
    /// Content of the turn; empty when the message had no text
    pub parts: Vec<ContentPart>,
}

impl HistoryEntry {
    /// Creates a history entry from a single text
    ///
    /// Empty text yields an entry with no parts.
    ///
    /// # Examples
    ///
    /// ```
    /// use mathgenius::providers::{HistoryEntry, TurnRole};
    ///
    /// assert_eq!(HistoryEntry::from_text(TurnRole::User, "A").parts.len(), 1);
    /// assert!(HistoryEntry::from_text(TurnRole::Model, "").parts.is_empty());
    /// ```
    pub fn from_text(role: TurnRole, text: &str) -> Self {
        let parts = if text.is_empty() {
            Vec::new()
        } else {
            vec![ContentPart::text(text)]
        };
        Self { role, parts }
    }
}

/// Sampling parameters for one request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Sampling temperature
    pub temperature: f32,
    /// Top-k cutoff, if any
    pub top_k: Option<u32>,
    /// Nucleus sampling cutoff, if any
    pub top_p: Option<f32>,
}

impl SamplingConfig {
    /// Sampling with only a temperature set
    pub fn with_temperature(temperature: f32) -> Self {
        Self {
            temperature,
            top_k: None,
            top_p: None,
        }
    }
}

/// A single generation request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// System instruction for this call
    pub system_instruction: String,
    /// Ordered prior turns
    pub history: Vec<HistoryEntry>,
    /// Content of the new user turn
    pub parts: Vec<ContentPart>,
    /// Sampling parameters
    pub sampling: SamplingConfig,
}

/// Token usage information from a generation
///
/// Tracks the number of tokens used in prompts and completions,
/// as reported by the AI provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the prompt
    pub prompt_tokens: usize,
    /// Number of tokens in the completion
    pub completion_tokens: usize,
    /// Total tokens used (prompt + completion)
    pub total_tokens: usize,
}

impl TokenUsage {
    /// Create a new TokenUsage instance
    ///
    /// # Arguments
    ///
    /// * `prompt_tokens` - Number of prompt tokens
    /// * `completion_tokens` - Number of completion tokens
    ///
    /// # Examples
    ///
    /// ```
    /// use mathgenius::providers::TokenUsage;
    ///
    /// let usage = TokenUsage::new(100, 50);
    /// assert_eq!(usage.total_tokens, 150);
    /// ```
    pub fn new(prompt_tokens: usize, completion_tokens: usize) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Generation response with optional text and token usage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationResponse {
    /// Model text, `None` when the model returned nothing usable
    pub text: Option<String>,
    /// Optional token usage information
    pub usage: Option<TokenUsage>,
}

impl GenerationResponse {
    /// Create a response carrying text
    ///
    /// # Examples
    ///
    /// ```
    /// use mathgenius::providers::GenerationResponse;
    ///
    /// let response = GenerationResponse::new("Chào em!");
    /// assert_eq!(response.text.as_deref(), Some("Chào em!"));
    /// assert!(response.usage.is_none());
    /// ```
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            usage: None,
        }
    }

    /// Create a response with no text
    pub fn empty() -> Self {
        Self::default()
    }

    /// Attach token usage to this response
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// Provider trait for the hosted model
///
/// The trait is the seam between the model gateway and the network. Tests
/// substitute hand-written implementations.
///
/// # Examples
///
/// ```no_run
/// use mathgenius::providers::{GenerationRequest, GenerationResponse, Provider};
/// use mathgenius::error::Result;
/// use async_trait::async_trait;
///
/// struct EchoProvider;
///
/// #[async_trait]
/// impl Provider for EchoProvider {
///     async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
///         Ok(GenerationResponse::new(request.system_instruction.clone()))
///     }
///
///     fn model(&self) -> &str {
///         "echo"
///     }
/// }
/// ```
#[async_trait]
pub trait Provider: Send + Sync {
    /// Generates one reply for the given request
    ///
    /// # Errors
    ///
    /// Returns error if the API call fails or the response is invalid
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse>;

    /// Name of the model this provider talks to
    fn model(&self) -> &str;
}
