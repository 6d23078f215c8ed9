use super::{ScriptWriter, script_prompt};
use crate::config::{Config, GEMINI_KEY_ENV};
use crate::error::StudioError;
use crate::request::MovieRequest;
use crate::{logi, logw};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

const GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const REQUEST_TIMEOUT_SECS: u64 = 300;

pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// A missing key is reported on the first script request, so commands
    /// that never write a script still run without one.
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .context("failed to build reqwest client")?;
        Ok(Self {
            client,
            api_key: cfg.gemini_api_key.clone(),
            model: cfg.script_model.clone(),
        })
    }
}

#[async_trait]
impl ScriptWriter for GeminiClient {
    async fn write_script(&self, request: &MovieRequest) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(StudioError::Script(format!(
                "gemini_api_key missing (set it in config.json or {})",
                GEMINI_KEY_ENV
            ))
            .into());
        }

        let body = json!({
            "contents": [
                {"parts": [{"text": script_prompt(request)}]}
            ],
        });

        logi(format!("Requesting script from {} for {:?}...", self.model, request.title));
        let resp = self
            .client
            .post(format!("{}/{}:generateContent", GEMINI_BASE, self.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Gemini request failed")?;

        let status = resp.status();
        let raw = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            logw(format!("Gemini HTTP {}", status.as_u16()));
            if !raw.is_empty() {
                let snippet = raw.chars().take(800).collect::<String>();
                logw(format!("Gemini raw body: {}", snippet));
            }
            return Err(StudioError::Script(format!("Gemini HTTP {}", status.as_u16())).into());
        }

        match extract_output_text(&raw) {
            Some(text) => {
                logi(format!("Gemini script received: {} chars", text.len()));
                Ok(text)
            }
            None => {
                let snippet = raw.chars().take(800).collect::<String>();
                logw(format!("Gemini response parse failed. Raw body: {}", snippet));
                Err(StudioError::Script("Gemini response had no text".to_string()).into())
            }
        }
    }
}

fn extract_output_text(resp_json: &str) -> Option<String> {
    let root: serde_json::Value = serde_json::from_str(resp_json).ok()?;

    if let Some(err) = root.get("error") {
        if let Some(msg) = err.get("message").and_then(|v| v.as_str()) {
            logw(format!("Gemini error message: {}", msg));
        }
        if let Some(status) = err.get("status").and_then(|v| v.as_str()) {
            logw(format!("Gemini error status: {}", status));
        }
        return None;
    }

    let candidates = root.get("candidates")?.as_array()?;
    for candidate in candidates {
        let parts = candidate
            .get("content")
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array());
        let Some(parts) = parts else {
            continue;
        };
        let text: String = parts
            .iter()
            .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
            .collect();
        if !text.trim().is_empty() {
            return Some(text);
        }
    }

    None
}
