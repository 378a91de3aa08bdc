//! Scripted suggestion service for tests

use super::client::{SuggestionError, SuggestionService};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::time::Instant;

/// One recorded call to the service
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub at: Instant,
    pub model: String,
    pub prompt: String,
}

/// Replies from a script in order; answers `Ok("")` once the script runs out
#[derive(Default)]
pub struct ScriptedService {
    replies: Mutex<VecDeque<Result<String, SuggestionError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedService {
    pub fn new(replies: Vec<Result<String, SuggestionError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }

    pub fn failing() -> Self {
        Self::new(vec![Err(SuggestionError::Api {
            status: 503,
            message: "unavailable".to_string(),
        })])
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SuggestionService for ScriptedService {
    async fn suggest(&self, model: &str, prompt: &str) -> Result<String, SuggestionError> {
        self.calls.lock().unwrap().push(RecordedCall {
            at: Instant::now(),
            model: model.to_string(),
            prompt: prompt.to_string(),
        });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()))
    }
}
