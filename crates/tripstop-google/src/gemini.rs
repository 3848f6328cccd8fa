//! Gemini `generateContent` client used for stop curation.

use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tripstop_core::UpstreamError;

use crate::config::GeminiConfig;
use crate::http::{build_client, read_json, send_error};

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

// Near-deterministic output keeps the JSON shape stable.
const GENERATION: GenerationConfig = GenerationConfig {
    temperature: 0.1,
    top_k: 1,
    top_p: 1.0,
    max_output_tokens: 2048,
};

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiClient {
    /// Build a client, or `None` when no API key is configured.
    pub fn from_config(config: &GeminiConfig) -> Result<Option<Self>> {
        let Some(api_key) = config.api_key.clone() else {
            return Ok(None);
        };
        Ok(Some(Self {
            client: build_client(config.timeout)?,
            url: config.url.clone(),
            api_key,
        }))
    }

    /// Send one prompt and return the text parts of the first candidate,
    /// concatenated.
    pub async fn generate(&self, prompt: &str) -> Result<String, UpstreamError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GENERATION,
        };

        let response = self
            .client
            .post(&self.url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|err| send_error("gemini", err))?;

        let payload: GenerateContentResponse = read_json("gemini", response).await?;
        let text = candidate_text(payload);
        if text.trim().is_empty() {
            return Err(UpstreamError::new(502, "gemini returned no text"));
        }

        tracing::debug!("Gemini returned {} characters", text.len());
        Ok(text)
    }
}

fn candidate_text(payload: GenerateContentResponse) -> String {
    payload
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default()
}
