// src/ai.rs

//! AI study-assistant adapter.
//!
//! All generative calls funnel through [`AiClient`], which returns a
//! typed [`AiReply`] instead of propagating transport faults: callers
//! never branch on errors, they only render the text they are given.
//! With no API key configured every operation degrades to a fixed,
//! deterministic fallback so quiz-taking is unaffected.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::config::Config;
use crate::models::quiz::{OPTIONS_PER_QUESTION, QuestionDraft};

/// Fallback when no API key is configured.
pub const CHAT_UNCONFIGURED: &str =
    "The AI study assistant is offline because no API key is configured. \
     Quizzes and results work as usual.";

/// Fallback when the generative service is unreachable or misbehaves.
pub const CHAT_UNAVAILABLE: &str =
    "The AI study assistant is temporarily unavailable. Please try again later.";

/// Fallback explanation when no API key is configured.
pub const EXPLAIN_UNCONFIGURED: &str =
    "Academic tip: review this module's core principles in your course notes. \
     Detailed AI explanations are currently disabled.";

/// Fallback explanation when the service call fails.
pub const EXPLAIN_UNAVAILABLE: &str =
    "A detailed AI explanation is unavailable right now. Consult your faculty for guidance.";

/// Reply when faculty have switched the assistant off.
pub const ASSISTANT_DISABLED: &str =
    "The AI study assistant has been turned off by faculty.";

/// Outcome of a generative call. `Fallback` carries a fixed string and
/// never reflects a fault the caller has to handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiReply {
    Generated(String),
    Fallback(&'static str),
}

impl AiReply {
    pub fn text(&self) -> &str {
        match self {
            AiReply::Generated(text) => text,
            AiReply::Fallback(text) => text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, AiReply::Fallback(_))
    }
}

/// Question drafts for the editor; `fallback` marks the offline sample.
#[derive(Debug, Serialize)]
pub struct QuestionBatch {
    pub questions: Vec<QuestionDraft>,
    pub fallback: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

// --- Wire format (Gemini generateContent) ---

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

pub struct AiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: Url,
    model: String,
}

impl AiClient {
    pub fn new(api_key: Option<String>, base_url: Url, model: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .unwrap_or_default();

        Self {
            http,
            api_key,
            base_url,
            model,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.ai_api_key.clone(),
            config.ai_base_url.clone(),
            config.ai_model.clone(),
        )
    }

    /// A key shorter than a real credential counts as unconfigured.
    fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| key.len() > 10)
    }

    /// Free-form tutor chat with prior history.
    pub async fn chat(&self, message: &str, history: &[ChatMessage]) -> AiReply {
        let Some(key) = self.credential() else {
            return AiReply::Fallback(CHAT_UNCONFIGURED);
        };

        let mut contents: Vec<Content> = history
            .iter()
            .map(|m| Content {
                role: Some(match m.role {
                    ChatRole::User => "user",
                    ChatRole::Assistant => "model",
                }),
                parts: vec![Part {
                    text: m.content.clone(),
                }],
            })
            .collect();
        contents.push(Content {
            role: Some("user"),
            parts: vec![Part {
                text: message.to_string(),
            }],
        });

        let request = GenerateRequest {
            contents,
            system_instruction: Some(system_content(
                "You are a concise, encouraging university study assistant.",
            )),
            generation_config: None,
        };

        match self.generate(key, &request).await {
            Ok(text) => AiReply::Generated(text),
            Err(reason) => {
                tracing::warn!("AI chat failed: {}", reason);
                AiReply::Fallback(CHAT_UNAVAILABLE)
            }
        }
    }

    /// Short explanation of why the chosen option was wrong.
    pub async fn explain_wrong_answer(
        &self,
        question: &str,
        options: &[String],
        correct_idx: usize,
        chosen_idx: usize,
    ) -> AiReply {
        let Some(key) = self.credential() else {
            return AiReply::Fallback(EXPLAIN_UNCONFIGURED);
        };

        let correct = options.get(correct_idx).map(String::as_str).unwrap_or("");
        let chosen = options.get(chosen_idx).map(String::as_str).unwrap_or("");
        let prompt = format!(
            "Question: {question}\nCorrect answer: {correct}\nStudent chose: {chosen}"
        );

        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: prompt }],
            }],
            system_instruction: Some(system_content(
                "Briefly explain why the correct answer is right and the chosen one is not.",
            )),
            generation_config: None,
        };

        match self.generate(key, &request).await {
            Ok(text) => AiReply::Generated(text),
            Err(reason) => {
                tracing::warn!("AI explanation failed: {}", reason);
                AiReply::Fallback(EXPLAIN_UNAVAILABLE)
            }
        }
    }

    /// Question drafts about `topic` for the quiz editor. Falls back to a
    /// deterministic single-question sample naming the topic.
    pub async fn generate_questions(&self, topic: &str, count: usize) -> QuestionBatch {
        let Some(key) = self.credential() else {
            return sample_batch(topic);
        };

        let prompt = format!(
            "Generate {count} university-level multiple-choice questions about {topic}. \
             Respond with only a JSON array; each element has \"text\" (string), \
             \"options\" (array of exactly 4 strings) and \"correct_answer\" \
             (integer 0-3)."
        );

        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: prompt }],
            }],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_mime_type: "application/json",
            }),
        };

        match self.generate(key, &request).await {
            Ok(text) => match parse_question_drafts(&text) {
                Some(questions) => QuestionBatch {
                    questions,
                    fallback: false,
                },
                None => {
                    tracing::warn!("AI question generation returned unparsable JSON");
                    sample_batch(topic)
                }
            },
            Err(reason) => {
                tracing::warn!("AI question generation failed: {}", reason);
                sample_batch(topic)
            }
        }
    }

    async fn generate(&self, key: &str, request: &GenerateRequest) -> Result<String, String> {
        let url = self
            .base_url
            .join(&format!("v1beta/models/{}:generateContent", self.model))
            .map_err(|e| e.to_string())?;

        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", key)
            .json(request)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("status {}", response.status()));
        }

        let body: GenerateResponse = response.json().await.map_err(|e| e.to_string())?;

        let text = body
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err("empty response".to_string());
        }

        Ok(text)
    }
}

fn system_content(text: &str) -> Content {
    Content {
        role: None,
        parts: vec![Part {
            text: text.to_string(),
        }],
    }
}

/// The deterministic offline sample batch for the editor.
fn sample_batch(topic: &str) -> QuestionBatch {
    QuestionBatch {
        questions: vec![QuestionDraft {
            text: format!("Sample question about {topic}? (AI generator offline)"),
            options: vec![
                "Option A".to_string(),
                "Option B".to_string(),
                "Option C".to_string(),
                "Option D".to_string(),
            ],
            correct_answer: 0,
        }],
        fallback: true,
    }
}

/// Parses and sanity-checks the model's JSON, tolerating a markdown fence.
fn parse_question_drafts(text: &str) -> Option<Vec<QuestionDraft>> {
    let trimmed = text
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let drafts: Vec<QuestionDraft> = serde_json::from_str(trimmed).ok()?;

    let valid = !drafts.is_empty()
        && drafts.iter().all(|q| {
            !q.text.trim().is_empty()
                && q.options.len() == OPTIONS_PER_QUESTION
                && q.options.iter().all(|opt| !opt.trim().is_empty())
                && q.correct_answer < q.options.len()
        });

    valid.then_some(drafts)
}
