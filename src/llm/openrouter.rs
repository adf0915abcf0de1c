use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ConverterSettings;
use crate::domain::essay::Essay;
use crate::llm::Converter;

pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

const SYSTEM_PROMPT: &str = "\
You convert a raw email essay into a finished markdown blog entry. \
Rewrite the email as proper markdown (full essay), add the author and date \
just after the title inside the content, and extract metadata. \
Respond with a single JSON object and nothing else, with these fields: \
\"title\" (string), \"content\" (markdown string), \"keywords\" (array of \
strings), \"author\" (string), \"date\" (string, YYYY-MM-DD).";

/// Blocking client for an OpenAI-compatible chat completions endpoint
/// (OpenRouter by default).
pub struct OpenRouterConverter {
    http: reqwest::blocking::Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

/// The JSON shape the model is prompted to produce.
#[derive(Deserialize)]
struct EssayPayload {
    title: String,
    content: String,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    author: String,
    date: String,
}

impl OpenRouterConverter {
    /// Build from config; the API key comes from `OPENROUTER_API_KEY`.
    /// A missing key is a configuration error, reported before any work.
    pub fn from_settings(settings: &ConverterSettings) -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| anyhow!("{API_KEY_ENV} not set; required for the convert stage"))?;
        Self::new(&settings.base_url, &settings.model, api_key, settings.timeout_secs)
    }

    pub fn new(
        base_url: &str,
        model: &str,
        api_key: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.into(),
        })
    }
}

impl Converter for OpenRouterConverter {
    fn convert(&self, text: &str) -> Result<Essay> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            temperature: 1.0,
        };

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            let snippet: String = body.chars().take(300).collect();
            return Err(anyhow!("converter endpoint returned {status}: {snippet}"));
        }

        let parsed: ChatResponse = resp.json()?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow!("converter response had no choices"))?;

        parse_essay(&content)
    }
}

/// Parse the model output into an `Essay`; tolerates a fenced code block
/// around the JSON, which chat models commonly emit.
fn parse_essay(content: &str) -> Result<Essay> {
    let json = strip_fences(content);
    let payload: EssayPayload = serde_json::from_str(json)
        .map_err(|e| anyhow!("converter returned malformed essay JSON: {e}"))?;
    let date = parse_essay_date(&payload.date)?;

    Ok(Essay {
        title: payload.title,
        content: payload.content,
        keywords: payload.keywords,
        author: payload.author,
        date,
    })
}

fn strip_fences(s: &str) -> &str {
    let s = s.trim();
    let s = s
        .strip_prefix("```json")
        .or_else(|| s.strip_prefix("```"))
        .unwrap_or(s);
    s.strip_suffix("```").unwrap_or(s).trim()
}

fn parse_essay_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    // Some models answer with a full timestamp despite the prompt.
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt.date());
    }
    Err(anyhow!("unparseable essay date: {s:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json_payload() {
        let essay = parse_essay(
            r##"{"title":"T","content":"# T\n\nbody","keywords":["a"],"author":"A","date":"2024-03-05"}"##,
        )
        .unwrap();
        assert_eq!(essay.title, "T");
        assert_eq!(essay.date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(essay.keywords, vec!["a"]);
    }

    #[test]
    fn tolerates_fenced_payload() {
        let fenced = "```json\n{\"title\":\"T\",\"content\":\"c\",\"date\":\"2024-01-02\"}\n```";
        let essay = parse_essay(fenced).unwrap();
        assert_eq!(essay.title, "T");
        assert_eq!(essay.author, "");
    }

    #[test]
    fn timestamp_dates_are_accepted() {
        assert_eq!(
            parse_essay_date("2024-03-05T10:30:00Z").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
        );
        assert_eq!(
            parse_essay_date("2024-03-05T10:30:00").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
        );
    }

    #[test]
    fn malformed_payload_is_a_conversion_error() {
        assert!(parse_essay("not json at all").is_err());
        assert!(parse_essay(r#"{"title":"T","content":"c","date":"soon"}"#).is_err());
    }
}
