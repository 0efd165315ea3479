//! Coach: short written feedback from a generative-text backend.
//!
//! The coach is advisory. Every failure becomes a placeholder reply at this
//! boundary, and nothing here can reach scores or history.

use std::time::Duration;

use brainage::history::{History, HistoryEntry, HistorySummary, Trend};
use brainage::session::Report;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const MAX_ERROR_BODY_CHARS: usize = 2048;
/// Sessions quoted verbatim in trend and chat prompts.
const PROMPT_HISTORY_WINDOW: usize = 10;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

const SYSTEM_PROMPT: &str = "You are a friendly brain-training coach inside a casual game. \
The player's brain age is a game score for entertainment, not a medical measurement; never \
diagnose anything. Answer in plain text, at most 120 words, with one or two concrete tips.";

const FAILED_PLACEHOLDER: &str = "The coach could not be reached right now. Your results are saved; try `brainage coach` later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoachBackend {
    /// Google Gemini `generateContent`.
    #[default]
    Gemini,
    /// Offline canned tips.
    Stub,
    Off,
}

impl CoachBackend {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "gemini" => Some(CoachBackend::Gemini),
            "stub" => Some(CoachBackend::Stub),
            "off" | "0" | "false" => Some(CoachBackend::Off),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachConfig {
    #[serde(default)]
    pub backend: CoachBackend,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Base URL of the Gemini REST API, without a trailing slash.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Only ever read from the environment.
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_api_base() -> String {
    GEMINI_API_BASE_URL.to_string()
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            backend: CoachBackend::default(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            api_base: default_api_base(),
            api_key: None,
        }
    }
}

impl CoachConfig {
    /// Apply `BRAINAGE_COACH`, `BRAINAGE_COACH_MODEL`, and the API key.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // BRAINAGE_COACH=gemini|stub|off
        if let Some(v) = var("BRAINAGE_COACH") {
            match CoachBackend::parse(&v) {
                Some(backend) => self.backend = backend,
                None => warn!(value = %v, "ignoring unknown BRAINAGE_COACH"),
            }
        }
        if let Some(v) = var("BRAINAGE_COACH_MODEL") {
            let v = v.trim();
            if !v.is_empty() {
                self.model = v.to_string();
            }
        }
        self.api_key = var(API_KEY_ENV)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Model,
}

impl Role {
    fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// One prior message in a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system: String,
    pub prompt: String,
    pub turns: Vec<Turn>,
}

impl GenerationRequest {
    fn new(prompt: String) -> Self {
        Self {
            system: SYSTEM_PROMPT.to_string(),
            prompt,
            turns: Vec::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoachError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("prompt blocked: {0}")]
    Blocked(String),
    #[error("response contained no text")]
    EmptyResponse,
    #[error("no HTTP client")]
    NoClient,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoachReply {
    Text(String),
    /// The coach is switched off or has no credential.
    Unavailable(String),
    /// The backend was tried and failed; the text is a placeholder.
    Failed(String),
}

impl CoachReply {
    pub fn text(&self) -> &str {
        match self {
            CoachReply::Text(t) | CoachReply::Unavailable(t) | CoachReply::Failed(t) => t,
        }
    }
}

/// Gemini `generateContent` body: system instruction, prior turns, then the prompt.
pub fn build_request_body(req: &GenerationRequest) -> Value {
    let mut contents: Vec<Value> = req
        .turns
        .iter()
        .map(|t| json!({ "role": t.role.as_str(), "parts": [{ "text": t.text }] }))
        .collect();
    contents.push(json!({ "role": "user", "parts": [{ "text": req.prompt }] }));

    json!({
        "system_instruction": { "parts": [{ "text": req.system }] },
        "contents": contents,
        "generationConfig": {
            "temperature": 0.7,
            "maxOutputTokens": 512
        }
    })
}

/// Concatenate `candidates[0].content.parts[*].text`.
pub fn extract_text(response: &Value) -> Result<String, CoachError> {
    if let Some(reason) = response["promptFeedback"]["blockReason"].as_str() {
        return Err(CoachError::Blocked(reason.to_string()));
    }
    let text: String = response["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect())
        .unwrap_or_default();
    let text = text.trim();
    if text.is_empty() {
        return Err(CoachError::EmptyResponse);
    }
    Ok(text.to_string())
}

fn describe_entries(entries: &[HistoryEntry]) -> String {
    let start = entries.len().saturating_sub(PROMPT_HISTORY_WINDOW);
    entries[start..]
        .iter()
        .enumerate()
        .map(|(i, e)| {
            format!(
                "{}. age {} (reaction {:.0} ms, memory {} digits, math {:.0} ms)",
                start + i + 1,
                e.brain_age,
                e.scores.reaction_ms,
                e.scores.memory_digits,
                e.scores.math_ms
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn describe_summary(summary: &HistorySummary) -> String {
    match (summary.best_age, summary.mean_age) {
        (Some(best), Some(mean)) => format!(
            "{} sessions, best age {best}, mean age {mean:.1}, trend {}.",
            summary.sessions,
            summary.trend.label()
        ),
        _ => "No sessions played yet.".to_string(),
    }
}

pub fn feedback_request(report: &Report) -> GenerationRequest {
    let s = &report.scores;
    let b = &report.breakdown;
    GenerationRequest::new(format!(
        "I just finished a session. Brain age: {}.\n\
         Reaction: average {:.0} ms (+{:.1} years).\n\
         Memory: recalled {} digits (+{:.1} years).\n\
         Math: {:.0} ms per problem (+{:.1} years).\n\
         Which area should I work on, and how?",
        b.brain_age, s.reaction_ms, b.reaction_years, s.memory_digits, b.memory_years, s.math_ms,
        b.math_years
    ))
}

pub fn trend_request(history: &History) -> GenerationRequest {
    GenerationRequest::new(format!(
        "Here is my recent session history:\n{}\n{}\nSummarise how I am trending in two or three sentences.",
        describe_entries(history.entries()),
        describe_summary(&history.summary())
    ))
}

pub fn chat_request(history: &History, turns: &[Turn], question: &str) -> GenerationRequest {
    let mut req = GenerationRequest::new(question.to_string());
    req.system = format!(
        "{SYSTEM_PROMPT}\nPlayer history:\n{}\n{}",
        describe_entries(history.entries()),
        describe_summary(&history.summary())
    );
    req.turns = turns.to_vec();
    req
}

fn stub_feedback(report: &Report) -> String {
    let b = &report.breakdown;
    let weakest = [
        (b.reaction_years, "reaction", "Try a few rounds of a tap-on-cue game daily and stay relaxed; tension slows you down."),
        (b.memory_years, "memory", "Chunk digits into pairs or triples when you read them; it stretches how many you can hold."),
        (b.math_years, "math", "Practise adding small numbers in your head, like totting up prices while shopping."),
    ]
    .into_iter()
    .fold(None, |acc: Option<(f64, &str, &str)>, c| match acc {
        Some(best) if best.0 >= c.0 => Some(best),
        _ => Some(c),
    });

    match weakest {
        Some((years, area, tip)) if years > 0.0 => {
            format!("Brain age {}. Your {area} score added the most ({years:.1} years). {tip}", b.brain_age)
        }
        _ => format!(
            "Brain age {}. Every area is at or beyond baseline; keep playing to hold it there.",
            b.brain_age
        ),
    }
}

fn stub_trend(history: &History) -> String {
    let summary = history.summary();
    let tail = match summary.trend {
        Trend::Improving => "Your recent sessions are getting younger. Nice work.",
        Trend::Declining => "Recent sessions are a little older; a rested mind usually scores better.",
        Trend::Steady => "You are holding steady.",
        Trend::NotEnoughData => "Play a few more sessions to see a trend.",
    };
    format!("{} {tail}", describe_summary(&summary))
}

#[derive(Debug, Clone)]
pub struct Coach {
    cfg: CoachConfig,
    client: Option<reqwest::Client>,
}

impl Coach {
    pub fn new(cfg: CoachConfig) -> Self {
        let client = if cfg.backend == CoachBackend::Gemini {
            reqwest::Client::builder()
                .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
                .build()
                .map_err(|e| warn!(error = %e, "could not build HTTP client; coach disabled"))
                .ok()
        } else {
            None
        };
        Self { cfg, client }
    }

    /// Post-game feedback on one report.
    pub async fn feedback(&self, report: &Report) -> CoachReply {
        self.generate(feedback_request(report), || stub_feedback(report))
            .await
    }

    /// A short read on how the history is moving.
    pub async fn trend(&self, history: &History) -> CoachReply {
        self.generate(trend_request(history), || stub_trend(history))
            .await
    }

    /// One chat turn; `turns` are the earlier messages in this conversation.
    pub async fn chat(&self, history: &History, turns: &[Turn], question: &str) -> CoachReply {
        self.generate(chat_request(history, turns, question), || {
            format!(
                "(offline coach) {} Ask again with the Gemini backend for a real answer.",
                describe_summary(&history.summary())
            )
        })
        .await
    }

    async fn generate(&self, req: GenerationRequest, stub: impl FnOnce() -> String) -> CoachReply {
        match self.cfg.backend {
            CoachBackend::Off => {
                CoachReply::Unavailable("Coach is off (BRAINAGE_COACH=off).".to_string())
            }
            CoachBackend::Stub => CoachReply::Text(stub()),
            CoachBackend::Gemini => {
                let Some(key) = self.cfg.api_key.as_deref() else {
                    return CoachReply::Unavailable(format!(
                        "AI coach unavailable: set {API_KEY_ENV} to enable it."
                    ));
                };
                match self.call_gemini(key, &req).await {
                    Ok(text) => CoachReply::Text(text),
                    Err(e) => {
                        warn!(error = %e, model = %self.cfg.model, "coach request failed");
                        CoachReply::Failed(FAILED_PLACEHOLDER.to_string())
                    }
                }
            }
        }
    }

    async fn call_gemini(&self, api_key: &str, req: &GenerationRequest) -> Result<String, CoachError> {
        let Some(client) = &self.client else {
            return Err(CoachError::NoClient);
        };
        let url = format!(
            "{}/models/{}:generateContent",
            self.cfg.api_base.trim_end_matches('/'),
            self.cfg.model
        );
        debug!(model = %self.cfg.model, turns = req.turns.len(), "calling coach");

        let response = client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .header("content-type", "application/json")
            .json(&build_request_body(req))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CoachError::Status {
                status,
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let data: Value = response.json().await?;
        extract_text(&data)
    }
}
