//! Test utilities for MathGenius
//!
//! This module provides common test utilities: temporary files, assertion
//! helpers, and a scripted provider that records every request it receives.

use crate::config::Config;
use crate::error::{MathGeniusError, Result};
use crate::providers::{GenerationRequest, GenerationResponse, Provider};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;

/// Create a temporary directory for testing
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given bytes
///
/// # Panics
///
/// Panics if file creation or writing fails
pub fn create_test_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: std::result::Result<T, MathGeniusError>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = e.to_string();
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// Create a test configuration with default values
pub fn test_config() -> Config {
    Config::default()
}

/// One scripted provider outcome
#[derive(Debug, Clone)]
pub enum MockReply {
    /// The model returns this text
    Text(String),
    /// The call succeeds with no text
    Empty,
    /// The call fails with this message
    Fail(String),
    /// The provider panics with this message
    Panic(String),
}

impl MockReply {
    /// Scripted text reply
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

/// Provider that replays scripted outcomes in order
///
/// Every request is recorded. Once the script runs out, calls fail.
pub struct MockProvider {
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockProvider {
    /// Creates a provider with the given script
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Number of calls received so far
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The most recent request, if any
    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(MockReply::Text(text)) => Ok(GenerationResponse::new(text)),
            Some(MockReply::Empty) => Ok(GenerationResponse::empty()),
            Some(MockReply::Fail(message)) => Err(MathGeniusError::Provider(message).into()),
            Some(MockReply::Panic(message)) => panic!("{}", message),
            None => Err(MathGeniusError::Provider("no scripted reply".to_string()).into()),
        }
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{ContentPart, SamplingConfig};

    fn request() -> GenerationRequest {
        GenerationRequest {
            system_instruction: "sys".to_string(),
            history: Vec::new(),
            parts: vec![ContentPart::text("hi")],
            sampling: SamplingConfig::with_temperature(0.5),
        }
    }

    #[test]
    fn test_create_test_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "test.txt", b"content");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "content");
    }

    #[test]
    #[should_panic(expected = "Expected error containing")]
    fn test_assert_error_contains_ok() {
        let result: std::result::Result<(), MathGeniusError> = Ok(());
        assert_error_contains(result, "error");
    }

    #[test]
    fn test_test_config_is_valid() {
        assert!(test_config().validate().is_ok());
    }

    #[tokio::test]
    async fn test_mock_provider_replays_script() {
        let provider = MockProvider::new(vec![MockReply::text("a"), MockReply::Empty]);
        assert_eq!(provider.generate(&request()).await.unwrap().text.as_deref(), Some("a"));
        assert!(provider.generate(&request()).await.unwrap().text.is_none());
        assert!(provider.generate(&request()).await.is_err());
        assert_eq!(provider.call_count(), 3);
    }
}
