//! Answer synthesis.
//!
//! Builds a context block from retrieved passages, invokes the generation
//! capability with a structured-output contract, and parses the result.
//! Parsing failure degrades to passage-derived citations; generation failure
//! falls back to an apologetic answer. Neither path returns an error.

use crate::extract::{extract_json, strip_code_fences};
use crate::types::{
    ChatTurn, Citation, SynthesisOutcome, SynthesizedAnswer, DEGRADED_CONFIDENCE,
    GENERIC_FOLLOW_UPS,
};
use finsight_knowledge::ScoredPassage;
use finsight_llm::{LlmClient, LlmRequest};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;

/// Marker used as the context block when retrieval found nothing.
const NO_INFORMATION_MARKER: &str = "No relevant information found.";

/// How many prior turns of conversation are rendered into the prompt.
const MAX_HISTORY_TURNS: usize = 6;

/// Persona and ground rules for the generation capability.
const SYSTEM_PROMPT: &str = "You are a helpful and knowledgeable financial assistant. \
Your goal is to provide accurate, helpful financial guidance based on the retrieved context. \
Always cite your sources and be transparent about the limitations of your knowledge. \
If you don't know the answer or don't have enough information, say so rather than making up \
information. Focus on practical, actionable guidance that users can apply to their financial \
situations.";

static ENUMERATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+[.)]\s*").expect("valid enumeration pattern"));

/// Synthesizes structured answers from retrieved passages.
///
/// Holds the generation client plus the sampling and timeout settings used
/// for every call. `synthesize` and `generate_follow_ups` never return
/// errors; all failure paths produce usable output.
pub struct AnswerSynthesizer {
    client: Arc<dyn LlmClient>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl AnswerSynthesizer {
    /// Create a synthesizer with default sampling settings.
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            temperature: 0.2,
            max_tokens: 1000,
            timeout: Duration::from_secs(60),
        }
    }

    /// Bound every generation call by this timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Synthesize an answer from the query, conversation, and passages.
    pub async fn synthesize(
        &self,
        query: &str,
        chat_history: &[ChatTurn],
        passages: &[ScoredPassage],
    ) -> (SynthesizedAnswer, SynthesisOutcome) {
        let context = build_context(passages);
        let prompt = build_user_prompt(query, chat_history, &context);

        let request = LlmRequest::new(prompt, &self.model)
            .with_system(SYSTEM_PROMPT)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        let raw = match tokio::time::timeout(self.timeout, self.client.complete(&request)).await {
            Ok(Ok(response)) => response.content,
            Ok(Err(e)) => {
                tracing::error!("Generation failed: {}", e);
                return (SynthesizedAnswer::apologetic(), SynthesisOutcome::Failed);
            }
            Err(_) => {
                tracing::error!("Generation timed out after {:?}", self.timeout);
                return (SynthesizedAnswer::apologetic(), SynthesisOutcome::Failed);
            }
        };

        match parse_structured(&raw) {
            Some(answer) => {
                tracing::info!(
                    "Generated structured answer with {} citations",
                    answer.citations.len()
                );
                (answer.clamped(), SynthesisOutcome::Structured)
            }
            None => {
                tracing::warn!("Could not parse structured output; degrading");
                (degraded_answer(&raw, passages), SynthesisOutcome::Degraded)
            }
        }
    }

    /// Generate up to `count` follow-up questions for a finished answer.
    ///
    /// On any failure, returns the fixed generic list truncated to `count`.
    pub async fn generate_follow_ups(
        &self,
        query: &str,
        answer: &str,
        count: usize,
    ) -> Vec<String> {
        let prompt = format!(
            "Based on the following user query and the answer provided, generate {} relevant \
             follow-up questions that the user might want to ask next.\n\n\
             USER QUERY: {}\n\n\
             ANSWER: {}\n\n\
             FOLLOW-UP QUESTIONS:",
            count, query, answer
        );

        let request = LlmRequest::new(prompt, &self.model)
            .with_system(SYSTEM_PROMPT)
            .with_temperature(self.temperature);

        let raw = match tokio::time::timeout(self.timeout, self.client.complete(&request)).await {
            Ok(Ok(response)) => response.content,
            Ok(Err(e)) => {
                tracing::warn!("Follow-up generation failed: {}", e);
                return generic_follow_ups(count);
            }
            Err(_) => {
                tracing::warn!("Follow-up generation timed out");
                return generic_follow_ups(count);
            }
        };

        let mut questions: Vec<String> = raw
            .lines()
            .map(|line| ENUMERATION_RE.replace(line.trim(), "").to_string())
            .filter(|line| !line.is_empty())
            .collect();

        questions.truncate(count);
        questions
    }
}

/// The fixed generic follow-up list, truncated to `count`.
fn generic_follow_ups(count: usize) -> Vec<String> {
    GENERIC_FOLLOW_UPS
        .iter()
        .take(count)
        .map(|s| s.to_string())
        .collect()
}

/// Render passages as an indexed context block.
fn build_context(passages: &[ScoredPassage]) -> String {
    if passages.is_empty() {
        return NO_INFORMATION_MARKER.to_string();
    }

    let parts: Vec<String> = passages
        .iter()
        .enumerate()
        .map(|(i, passage)| {
            let title = if passage.meta.title.is_empty() {
                format!("Document {}", i + 1)
            } else {
                passage.meta.title.clone()
            };
            let source = if passage.meta.source.is_empty() {
                "Unknown source".to_string()
            } else {
                passage.meta.source.clone()
            };

            let mut block = format!("[{}] {} (Source: {})", i + 1, title, source);
            if !passage.meta.url.is_empty() {
                block.push_str(&format!(" [URL: {}]", passage.meta.url));
            }
            block.push_str(&format!("\nContent: {}", passage.content));
            block
        })
        .collect();

    parts.join("\n\n")
}

/// Assemble the full user prompt: conversation, query, context, and the
/// required output shape.
fn build_user_prompt(query: &str, chat_history: &[ChatTurn], context: &str) -> String {
    let mut prompt = String::new();

    if !chat_history.is_empty() {
        prompt.push_str("RECENT CONVERSATION:\n");
        let start = chat_history.len().saturating_sub(MAX_HISTORY_TURNS);
        for turn in &chat_history[start..] {
            prompt.push_str(&format!("{}: {}\n", turn.role, turn.content));
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!(
        "USER QUERY: {}\n\n\
         RETRIEVED CONTEXT:\n{}\n\n\
         INSTRUCTIONS:\n\
         1. Answer the user's question based on the retrieved context.\n\
         2. Cite your sources clearly.\n\
         3. If the context doesn't contain enough information, acknowledge the limitations.\n\
         4. Provide practical, actionable advice when appropriate.\n\
         5. Suggest 2-3 relevant follow-up questions the user might want to ask.\n\n\
         Your entire response must be a single JSON object with this structure:\n\
         {{\n\
         \x20 \"answer\": \"the answer to the user's question\",\n\
         \x20 \"citations\": [\n\
         \x20   {{\"source_title\": \"title\", \"source_url\": \"url or null\", \
         \"relevance\": 0.9, \"quote\": \"supporting quote or null\"}}\n\
         \x20 ],\n\
         \x20 \"confidence\": 0.8,\n\
         \x20 \"follow_up_questions\": [\"question 1\", \"question 2\"]\n\
         }}\n\n\
         Remember to be helpful, accurate, and transparent about the sources of your \
         information.",
        query, context
    ));

    prompt
}

/// Parse the model's raw output into a structured answer, if possible.
///
/// Missing fields are filled by the serde defaults; mistyped fields make the
/// whole parse fail, which routes to the degraded path instead.
fn parse_structured(raw: &str) -> Option<SynthesizedAnswer> {
    let json = extract_json(raw)?;
    serde_json::from_str(json).ok()
}

/// Build the degraded answer: raw output as text, passage-derived citations.
///
/// Citation relevance is a fixed harmonic decay over input order, a
/// deliberate approximation rather than the store's similarity score.
fn degraded_answer(raw: &str, passages: &[ScoredPassage]) -> SynthesizedAnswer {
    let citations = passages
        .iter()
        .enumerate()
        .map(|(i, passage)| {
            let title = if passage.meta.title.is_empty() {
                format!("Document {}", i + 1)
            } else {
                passage.meta.title.clone()
            };

            Citation {
                source_title: title,
                source_url: if passage.meta.url.is_empty() {
                    None
                } else {
                    Some(passage.meta.url.clone())
                },
                relevance: 1.0 / (i as f32 + 1.0),
                quote: None,
            }
        })
        .collect();

    SynthesizedAnswer {
        answer: strip_code_fences(raw),
        citations,
        confidence: DEGRADED_CONFIDENCE,
        follow_up_questions: GENERIC_FOLLOW_UPS[..2].iter().map(|s| s.to_string()).collect(),
    }
}
