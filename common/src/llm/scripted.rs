use crate::error::{ErmError, Result};
use crate::llm::generator::TextGenerator;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// offline generator that replays canned replies in order.
///
/// once the queue is empty every call gets the fixed reply, or fails when
/// none is set. prompts are recorded so callers can inspect what was sent.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    fixed_reply: Option<String>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let generator = Self::new();
        for reply in replies {
            generator.push_reply(reply);
        }
        generator
    }

    /// answer every call with the same text
    pub fn always(reply: impl Into<String>) -> Self {
        Self {
            fixed_reply: Some(reply.into()),
            ..Self::default()
        }
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.lock_replies().push_back(Ok(reply.into()));
    }

    /// queue a failure, as a dropped connection or exhausted quota would look
    pub fn push_failure(&self, message: impl Into<String>) {
        self.lock_replies().push_back(Err(message.into()));
    }

    /// (system, user) pairs in call order
    pub fn prompts(&self) -> Vec<(String, String)> {
        match self.prompts.lock() {
            Ok(prompts) => prompts.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn call_count(&self) -> usize {
        self.prompts().len()
    }

    fn lock_replies(&self) -> std::sync::MutexGuard<'_, VecDeque<std::result::Result<String, String>>> {
        self.replies.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, system: &str, user: &str) -> Result<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((system.to_string(), user.to_string()));

        let next = self.lock_replies().pop_front();
        match next {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(ErmError::Generation(message)),
            None => self
                .fixed_reply
                .clone()
                .ok_or_else(|| ErmError::Generation("scripted generator has no reply left".to_string())),
        }
    }
}
