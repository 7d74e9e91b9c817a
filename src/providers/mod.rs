//! Provider module for MathGenius
//!
//! This module contains the hosted-model abstraction and the Gemini
//! implementation.

pub mod base;
pub mod gemini;

pub use base::{
    ContentPart, GenerationRequest, GenerationResponse, HistoryEntry, Provider, SamplingConfig,
    TokenUsage, TurnRole,
};
pub use gemini::GeminiProvider;

use crate::config::ProviderConfig;
use crate::error::{MathGeniusError, Result};

/// Create a provider instance based on configuration
///
/// # Arguments
///
/// * `config` - Provider configuration
///
/// # Returns
///
/// Returns a boxed provider instance
///
/// # Errors
///
/// Returns error if provider type is invalid or initialization fails
///
/// # Examples
///
/// ```
/// use mathgenius::config::ProviderConfig;
/// use mathgenius::providers::create_provider;
///
/// let provider = create_provider(&ProviderConfig::default()).unwrap();
/// assert_eq!(provider.model(), "gemini-3-flash-preview");
/// ```
pub fn create_provider(config: &ProviderConfig) -> Result<Box<dyn Provider>> {
    match config.provider_type.as_str() {
        "gemini" => Ok(Box::new(GeminiProvider::new(config.gemini.clone())?)),
        other => Err(MathGeniusError::Provider(format!("Unknown provider type: {}", other)).into()),
    }
}
