// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::time::Duration;
use tafsir_app::{
    AyahDisplayData, Language, SearchProvider, SearchResult, Surah, SurahId, VersePosition,
};

/// Upper bound on results kept from a single search reply.
pub const MAX_SEARCH_RESULTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    model: String,
    timeout: Duration,
    api_key: Option<String>,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("llm.base_url must not be empty");
        }
        if model.trim().is_empty() {
            bail!("llm.model must not be empty");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            model: model.to_owned(),
            timeout,
            api_key: None,
            http,
        })
    }

    /// Sends `Authorization: Bearer <key>` on every request. Blank keys are ignored.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.trim().is_empty());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .authorized(self.http.get(format!("{}/models", self.base_url)))
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let parsed: ModelsResponse = response.json().context("decode model list")?;
        Ok(parsed.data.into_iter().map(|model| model.id).collect())
    }

    pub fn ping(&self) -> Result<()> {
        let models = self.list_models()?;
        let exists = models
            .iter()
            .any(|name| name == &self.model || name.starts_with(&format!("{}:", self.model)));
        if !exists {
            bail!(
                "model {:?} not found -- pull it with `ollama pull {}` or set [llm].model",
                self.model,
                self.model
            );
        }
        Ok(())
    }

    pub fn chat_complete(&self, messages: &[Message]) -> Result<String> {
        let request = ChatRequest::new(&self.model, messages);
        tracing::debug!(model = %self.model, messages = messages.len(), "chat completion");
        let response = self
            .authorized(self.http.post(format!("{}/chat/completions", self.base_url)))
            .json(&request)
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let parsed: ChatCompletionResponse = response.json().context("decode chat response")?;
        let content = parsed
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow!("no choices in chat response"))?;
        Ok(content)
    }

    fn authorized(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

/// [`SearchProvider`] backed by a chat completion endpoint.
#[derive(Debug, Clone)]
pub struct LlmSearch {
    client: Client,
}

impl LlmSearch {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn generate(&self, system: String, user: String) -> Result<String> {
        let reply = self
            .client
            .chat_complete(&[Message::system(system), Message::user(user)])?;
        let reply = reply.trim();
        if reply.is_empty() {
            bail!("model {:?} returned an empty reply", self.client.model());
        }
        Ok(reply.to_owned())
    }
}

impl SearchProvider for LlmSearch {
    fn search(
        &self,
        query: &str,
        language: Language,
        chapters: &[Surah],
    ) -> Result<Vec<SearchResult>> {
        let raw = self.client.chat_complete(&[
            Message::system(build_search_prompt(language, chapters)),
            Message::user(query.trim()),
        ])?;
        parse_search_results(&raw)
    }

    fn generate_commentary(&self, verse: &AyahDisplayData, language: Language) -> Result<String> {
        self.generate(
            build_commentary_prompt(verse, language),
            format!("Explain verse {}.", verse.position),
        )
    }

    fn generate_chapter_overview(
        &self,
        chapter_name: &str,
        chapter_id: SurahId,
        language: Language,
    ) -> Result<String> {
        self.generate(
            build_overview_prompt(chapter_name, chapter_id, language),
            format!("Give an overview of surah {chapter_id}."),
        )
    }
}

fn language_instruction(language: Language) -> &'static str {
    match language {
        Language::English => "Write every piece of prose in English.",
        Language::Arabic => {
            "Write every piece of prose in Modern Standard Arabic (العربية). Keep JSON keys in English."
        }
    }
}

/// System prompt for semantic verse search. The chapter table lets the
/// model ground its answer in real verse counts.
pub fn build_search_prompt(language: Language, chapters: &[Surah]) -> String {
    let mut out = String::new();
    out.push_str(
        "You locate verses of the Qur'an that answer a reader's question or match a theme.\n",
    );
    out.push_str("\n## Output format\n\n");
    out.push_str("Reply with a JSON array only, no prose, no code fences. Each element:\n");
    out.push_str(
        "{\"surah\": <1-114>, \"ayah\": <verse number>, \"confidence\": <0.0-1.0>, \"reason\": <one sentence>}\n",
    );
    let _ = writeln!(
        out,
        "\nReturn at most {MAX_SEARCH_RESULTS} elements, most relevant first. Return [] when nothing fits."
    );
    out.push_str("Never cite a verse number larger than the surah's verse count.\n");
    out.push_str(language_instruction(language));
    out.push('\n');
    if !chapters.is_empty() {
        out.push_str("\n## Surahs (number, name, meaning, verses)\n\n");
        for surah in chapters {
            let _ = writeln!(
                out,
                "{} {} ({}) {}",
                surah.id, surah.transliteration, surah.translation, surah.verse_count
            );
        }
    }
    out
}

pub fn build_commentary_prompt(verse: &AyahDisplayData, language: Language) -> String {
    let mut out = String::new();
    out.push_str(
        "You are a careful scholar writing concise commentary (tafsir) on a single verse of the Qur'an.\n",
    );
    let _ = writeln!(
        out,
        "\n## Verse {} ({} / {}, {})\n",
        verse.position, verse.surah_transliteration, verse.surah_name, verse.surah_translation
    );
    out.push_str(&verse.arabic);
    out.push('\n');
    for translation in [&verse.primary, &verse.secondary] {
        let _ = writeln!(out, "\n[{}] {}", translation.edition, translation.text);
    }
    out.push_str("\n## Guidelines\n\n");
    out.push_str("- Explain the meaning and its context of revelation where it is well attested.\n");
    out.push_str("- Mention related verses by surah:ayah when they clarify the meaning.\n");
    out.push_str("- Note where classical commentators differ instead of picking a side.\n");
    out.push_str("- Keep it under 300 words. Plain text, no markdown headings.\n");
    out.push_str("- ");
    out.push_str(language_instruction(language));
    out.push('\n');
    out
}

pub fn build_overview_prompt(name: &str, id: SurahId, language: Language) -> String {
    let mut out = String::new();
    out.push_str(
        "You are a careful scholar summarizing an entire surah of the Qur'an for a general reader.\n",
    );
    let _ = writeln!(out, "\n## Surah {id}: {name}\n");
    out.push_str("## Guidelines\n\n");
    out.push_str("- Cover the period of revelation, the main themes and the structure.\n");
    out.push_str("- Point to a few key verses by surah:ayah.\n");
    out.push_str("- Keep it under 350 words. Plain text, no markdown headings.\n");
    out.push_str("- ");
    out.push_str(language_instruction(language));
    out.push('\n');
    out
}

/// Parses a search reply into results. Code fences and surrounding prose are
/// tolerated, malformed elements are dropped, confidence is clamped to
/// `0.0..=1.0` and the list is ordered most confident first.
pub fn parse_search_results(raw: &str) -> Result<Vec<SearchResult>> {
    let body = strip_code_fences(raw);
    let array = extract_json_array(body)
        .ok_or_else(|| anyhow!("model reply did not contain a JSON array of verses"))?;
    let items: Vec<serde_json::Value> =
        serde_json::from_str(array).context("decode search reply")?;

    let mut results: Vec<SearchResult> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<SearchHit>(item).ok())
        .filter_map(SearchHit::into_result)
        .collect();
    results.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    results.truncate(MAX_SEARCH_RESULTS);
    Ok(results)
}

pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (```json) up to the first newline.
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end()
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}

/// Returns the first balanced `[...]` in `text`, skipping brackets inside
/// JSON strings.
pub fn extract_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    surah: u16,
    ayah: u16,
    confidence: f32,
    #[serde(default, alias = "rationale")]
    reason: String,
}

impl SearchHit {
    fn into_result(self) -> Option<SearchResult> {
        let surah = SurahId::new(self.surah)?;
        if self.ayah == 0 || !self.confidence.is_finite() {
            return None;
        }
        Some(SearchResult {
            position: VersePosition::new(surah, self.ayah),
            confidence: self.confidence.clamp(0.0, 1.0),
            rationale: self.reason.trim().to_owned(),
        })
    }
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    anyhow!(
        "cannot reach {} -- start it with `ollama serve` or fix [llm].base_url ({})",
        base_url,
        error
    )
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<OpenAIErrorEnvelope>(body)
        && let Some(error) = parsed.error
        && !error.message.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), error.message);
    }

    if let Ok(parsed) = serde_json::from_str::<OllamaErrorEnvelope>(body)
        && let Some(error) = parsed.error
        && !error.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), error);
    }

    if body.len() < 100 && !body.contains('{') {
        return anyhow!("server error ({}): {}", status.as_u16(), body);
    }

    anyhow!("server returned {}", status.as_u16())
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    temperature: f32,
}

impl<'a> ChatRequest<'a> {
    fn new(model: &'a str, messages: &'a [Message]) -> Self {
        Self {
            model,
            messages: messages
                .iter()
                .map(|message| ChatMessage {
                    role: message.role.as_str(),
                    content: &message.content,
                })
                .collect(),
            stream: false,
            temperature: 0.2,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    data: Vec<ModelRow>,
}

#[derive(Debug, Deserialize)]
struct ModelRow {
    id: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorEnvelope {
    error: Option<OpenAIErrorBody>,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct OllamaErrorEnvelope {
    error: Option<String>,
}
