use async_trait::async_trait;
use mathgenius::error::{MathGeniusError, Result};
use mathgenius::providers::{GenerationRequest, GenerationResponse, Provider};
use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Scripted provider outcome
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub enum Scripted {
    Text(String),
    Empty,
    Fail(String),
}

/// Provider that replays a script and records every request
#[allow(dead_code)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

#[allow(dead_code)]
impl ScriptedProvider {
    pub fn new(replies: Vec<Scripted>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        self.requests.lock().unwrap().push(request.clone());
        match self.replies.lock().unwrap().pop_front() {
            Some(Scripted::Text(text)) => Ok(GenerationResponse::new(text)),
            Some(Scripted::Empty) => Ok(GenerationResponse::empty()),
            Some(Scripted::Fail(message)) => Err(MathGeniusError::Provider(message).into()),
            None => Err(MathGeniusError::Provider("script exhausted".to_string()).into()),
        }
    }

    fn model(&self) -> &str {
        "scripted"
    }
}
