//! Mock capabilities for pipeline tests.

use async_trait::async_trait;
use finsight_core::{AppError, AppResult};
use finsight_knowledge::{KnowledgeRecord, KnowledgeStore, PassageMeta, ScoredPassage};
use finsight_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Build a scored passage with the given content and title.
pub fn passage(content: &str, title: &str) -> ScoredPassage {
    ScoredPassage {
        content: content.to_string(),
        meta: PassageMeta {
            title: title.to_string(),
            source: "test".to_string(),
            source_type: "knowledge_item".to_string(),
            url: String::new(),
            extra: serde_json::Map::new(),
        },
        score: 1.0,
    }
}

/// Build a scored passage with a URL.
pub fn passage_with_url(content: &str, title: &str, url: &str) -> ScoredPassage {
    let mut p = passage(content, title);
    p.meta.url = url.to_string();
    p
}

enum StoreBehavior {
    Results(Vec<String>),
    Fail,
    Hang,
}

/// Knowledge store mock keyed by exact query text; unknown queries return
/// empty results, like an uninitialized store.
pub struct MockStore {
    behaviors: HashMap<String, StoreBehavior>,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            behaviors: HashMap::new(),
        }
    }

    pub fn with_result(mut self, query: &str, contents: &[&str]) -> Self {
        self.behaviors.insert(
            query.to_string(),
            StoreBehavior::Results(contents.iter().map(|s| s.to_string()).collect()),
        );
        self
    }

    pub fn with_failure(mut self, query: &str) -> Self {
        self.behaviors.insert(query.to_string(), StoreBehavior::Fail);
        self
    }

    pub fn with_hang(mut self, query: &str) -> Self {
        self.behaviors.insert(query.to_string(), StoreBehavior::Hang);
        self
    }
}

#[async_trait]
impl KnowledgeStore for MockStore {
    async fn retrieve(&self, query: &str, k: usize) -> AppResult<Vec<ScoredPassage>> {
        match self.behaviors.get(query) {
            Some(StoreBehavior::Results(contents)) => Ok(contents
                .iter()
                .take(k)
                .enumerate()
                .map(|(i, content)| {
                    let mut p = passage(content, &format!("Doc {}", i + 1));
                    p.score = 1.0 - 0.1 * i as f32;
                    p
                })
                .collect()),
            Some(StoreBehavior::Fail) => {
                Err(AppError::Knowledge("mock retrieval failure".to_string()))
            }
            Some(StoreBehavior::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }
            None => Ok(Vec::new()),
        }
    }

    async fn ingest(&self, records: &[KnowledgeRecord]) -> AppResult<usize> {
        Ok(records.iter().filter(|r| !r.content.is_empty()).count())
    }
}

enum LlmBehavior {
    Reply(String),
    Fail,
    Hang,
}

/// LLM mock that replies with fixed text, fails, or hangs. Captures the
/// requests it receives so tests can assert on prompt assembly.
pub struct MockLlm {
    behavior: LlmBehavior,
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlm {
    pub fn replying(content: impl Into<String>) -> Self {
        Self {
            behavior: LlmBehavior::Reply(content.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            behavior: LlmBehavior::Fail,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn hanging() -> Self {
        Self {
            behavior: LlmBehavior::Hang,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.requests
            .lock()
            .expect("requests mutex poisoned")
            .last()
            .map(|r| r.prompt.clone())
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests
            .lock()
            .expect("requests mutex poisoned")
            .push(request.clone());

        match &self.behavior {
            LlmBehavior::Reply(content) => Ok(LlmResponse {
                content: content.clone(),
                model: request.model.clone(),
                usage: LlmUsage::default(),
            }),
            LlmBehavior::Fail => Err(AppError::Llm("mock generation failure".to_string())),
            LlmBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(AppError::Llm("unreachable".to_string()))
            }
        }
    }
}
