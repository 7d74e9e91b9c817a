//! Gemini provider implementation for MathGenius
//!
//! This module implements the Provider trait for Google's Gemini
//! `generateContent` REST endpoint. One request per call: no streaming,
//! no retries. The HTTP client carries the configured request timeout.

use crate::config::GeminiConfig;
use crate::error::{MathGeniusError, Result};
use crate::providers::{
    ContentPart, GenerationRequest, GenerationResponse, HistoryEntry, Provider, TokenUsage,
};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Gemini API provider
///
/// # Examples
///
/// ```no_run
/// use mathgenius::config::GeminiConfig;
/// use mathgenius::providers::{
///     ContentPart, GeminiProvider, GenerationRequest, Provider, SamplingConfig,
/// };
///
/// # async fn example() -> mathgenius::error::Result<()> {
/// let provider = GeminiProvider::new(GeminiConfig::default())?;
/// let request = GenerationRequest {
///     system_instruction: "Bạn là gia sư Toán".to_string(),
///     history: Vec::new(),
///     parts: vec![ContentPart::text("Tìm x biết x + 5 = 3")],
///     sampling: SamplingConfig::with_temperature(0.6),
/// };
/// let response = provider.generate(&request).await?;
/// # Ok(())
/// # }
/// ```
pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
}

/// Request body for `models/{model}:generateContent`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

/// A role-tagged list of parts
#[derive(Debug, Serialize, Deserialize, Default)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

/// One part of a Gemini content; text or inline data
#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<GeminiInlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

/// Response body from `generateContent`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: usize,
    #[serde(default)]
    candidates_token_count: usize,
}

impl From<&ContentPart> for GeminiPart {
    fn from(part: &ContentPart) -> Self {
        match part {
            ContentPart::Text(text) => GeminiPart {
                text: Some(text.clone()),
                inline_data: None,
            },
            ContentPart::InlineData { mime_type, data } => GeminiPart {
                text: None,
                inline_data: Some(GeminiInlineData {
                    mime_type: mime_type.clone(),
                    data: data.clone(),
                }),
            },
        }
    }
}

impl From<&HistoryEntry> for GeminiContent {
    fn from(entry: &HistoryEntry) -> Self {
        GeminiContent {
            role: Some(entry.role.to_string()),
            parts: entry.parts.iter().map(GeminiPart::from).collect(),
        }
    }
}

impl GeminiProvider {
    /// Create a new Gemini provider instance
    ///
    /// # Arguments
    ///
    /// * `config` - Gemini configuration
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("mathgenius/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                MathGeniusError::Provider(format!("Failed to create HTTP client: {}", e))
            })?;

        tracing::info!(
            "Initialized Gemini provider: api_base={}, model={}",
            config.api_base,
            config.model
        );

        Ok(Self { client, config })
    }

    /// Get the configured API base URL
    pub fn api_base(&self) -> &str {
        &self.config.api_base
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        )
    }

    fn build_request(&self, request: &GenerationRequest) -> GeminiRequest {
        let mut contents: Vec<GeminiContent> =
            request.history.iter().map(GeminiContent::from).collect();
        contents.push(GeminiContent {
            role: Some("user".to_string()),
            parts: request.parts.iter().map(GeminiPart::from).collect(),
        });

        GeminiRequest {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: Some(request.system_instruction.clone()),
                    inline_data: None,
                }],
            },
            contents,
            generation_config: GeminiGenerationConfig {
                temperature: request.sampling.temperature,
                top_k: request.sampling.top_k,
                top_p: request.sampling.top_p,
            },
        }
    }

    fn convert_response(response: GeminiResponse) -> GenerationResponse {
        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| {
                if let Some(reason) = &candidate.finish_reason {
                    tracing::debug!("Gemini finish reason: {}", reason);
                }
                candidate.content
            })
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .filter(|text| !text.is_empty());

        let mut converted = GenerationResponse {
            text,
            usage: None,
        };
        if let Some(usage) = response.usage_metadata {
            converted = converted.with_usage(TokenUsage::new(
                usage.prompt_token_count,
                usage.candidates_token_count,
            ));
        }
        converted
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| MathGeniusError::MissingCredentials("gemini".to_string()))?;

        let body = self.build_request(request);

        tracing::debug!(
            "Sending Gemini request: model={}, {} history turns, {} parts, temperature={}",
            self.config.model,
            request.history.len(),
            request.parts.len(),
            request.sampling.temperature
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| MathGeniusError::Provider(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(MathGeniusError::Provider(format!(
                "Gemini returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            MathGeniusError::Provider(format!("Failed to parse Gemini response: {}", e))
        })?;

        let converted = Self::convert_response(gemini_response);
        if let Some(usage) = converted.usage {
            tracing::debug!(
                "Gemini usage: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens,
                usage.completion_tokens
            );
        }

        Ok(converted)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}
