use std::time::Duration;

use color_eyre::{eyre::OptionExt, Result};
use serde::{Deserialize, Serialize};

use crate::models::ParsedQuestion;
use crate::parser;

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_millis(500);

// ---------------------------------------------------------------------------
// TextGenerator trait (the quiz generator only needs raw text back)
// ---------------------------------------------------------------------------

#[cfg_attr(test, mockall::automock)]
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> impl std::future::Future<Output = Result<String>> + Send;
}

// ---------------------------------------------------------------------------
// OpenAI-compatible chat completions backend
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct OpenAiGenerator {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    top_p: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl OpenAiGenerator {
    pub fn new(api_url: String, api_key: Option<String>, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key: api_key.filter(|k| !k.is_empty()),
            model,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_eyre("no text generation API key configured")?;

        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.8,
            top_p: 0.9,
        };

        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .timeout(Duration::from_secs(120))
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            tracing::error!("text generation API error: {status} - {text}");
            color_eyre::eyre::bail!("text generation API returned {status}");
        }

        let reply: ChatResponse = resp.json().await?;
        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_eyre("text generation response had no content")
    }
}

// ---------------------------------------------------------------------------
// QuizGenerator
// ---------------------------------------------------------------------------

pub struct GenerationRequest<'a> {
    pub genres: &'a [String],
    pub difficulty: &'a str,
    pub count: usize,
}

pub struct QuizGenerator<G: TextGenerator = OpenAiGenerator> {
    backend: G,
    attempts: u32,
    retry_delay: Duration,
}

impl<G: TextGenerator + Clone> Clone for QuizGenerator<G> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            attempts: self.attempts,
            retry_delay: self.retry_delay,
        }
    }
}

impl<G: TextGenerator> QuizGenerator<G> {
    pub fn new(backend: G) -> Self {
        Self {
            backend,
            attempts: MAX_ATTEMPTS,
            retry_delay: RETRY_DELAY,
        }
    }

    pub fn with_retry(mut self, attempts: u32, retry_delay: Duration) -> Self {
        self.attempts = attempts.max(1);
        self.retry_delay = retry_delay;
        self
    }

    /// Produces exactly `request.count` questions. Slots the batch response
    /// could not fill are regenerated one by one, and whatever still fails
    /// stays a placeholder.
    pub async fn generate(&self, request: &GenerationRequest<'_>) -> Vec<ParsedQuestion> {
        let prompt = batch_prompt(request);
        let Some(text) = self.complete(&prompt).await else {
            tracing::warn!("text generation unavailable, using placeholder questions");
            return (1..=request.count).map(ParsedQuestion::placeholder).collect();
        };

        let mut questions = parser::parse_questions(&text, Some(&prompt), request.count);

        for (idx, slot) in questions.iter_mut().enumerate() {
            if !slot.is_placeholder() {
                continue;
            }

            let prompt = single_prompt(request);
            let Some(text) = self.complete(&prompt).await else {
                continue;
            };
            if let Some(question) = parser::parse_questions(&text, Some(&prompt), 1)
                .into_iter()
                .find(|q| !q.is_placeholder())
            {
                tracing::debug!("regenerated question {}", idx + 1);
                *slot = question;
            }
        }

        let placeholders = questions.iter().filter(|q| q.is_placeholder()).count();
        tracing::info!(
            total = questions.len(),
            placeholders,
            "quiz questions generated"
        );
        questions
    }

    async fn complete(&self, prompt: &str) -> Option<String> {
        for attempt in 1..=self.attempts {
            match self.backend.generate(prompt).await {
                Ok(text) if !text.trim().is_empty() => return Some(text),
                Ok(_) => tracing::warn!("text generation attempt {attempt} returned nothing"),
                Err(e) => tracing::warn!("text generation attempt {attempt} failed: {e}"),
            }
            if attempt < self.attempts {
                tokio::time::sleep(self.retry_delay).await;
            }
        }
        None
    }
}

fn topic(genres: &[String]) -> String {
    if genres.is_empty() {
        "General Knowledge".to_string()
    } else {
        genres.join(", ")
    }
}

pub fn batch_prompt(request: &GenerationRequest<'_>) -> String {
    format!(
        "Create {count} {difficulty} multiple-choice exam questions in {topic}. \
         Respond with a JSON array only. Each element must be an object with the keys \
         \"question\" (string), \"options\" (four strings labeled \"A) \", \"B) \", \"C) \", \"D) \") \
         and \"answer\" (the letter of the correct option).",
        count = request.count,
        difficulty = request.difficulty,
        topic = topic(request.genres),
    )
}

pub fn single_prompt(request: &GenerationRequest<'_>) -> String {
    format!(
        "Create a {difficulty} multiple-choice exam question in {topic}. \
         Include 4 answer choices labeled A), B), C), D) and mark the correct one \
         on a final line starting with \"Answer:\".",
        difficulty = request.difficulty,
        topic = topic(request.genres),
    )
}
