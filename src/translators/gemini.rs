// Copyright 2025 The mt-eval Authors
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::common::error::EvalError;
use crate::languages::Language;
use crate::translators::{api_key_from_env, check_output_length, Translator};
use reqwest::blocking::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro-002";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// # Gemini translator
/// One `generateContent` request per sentence. A reply without text (e.g. blocked by safety
/// filters) yields an empty translation rather than an error.
pub struct GeminiTranslator {
    model: String,
    base_url: String,
    api_key: String,
    client: Client,
}

impl GeminiTranslator {
    pub fn new(model: &str, api_key_env: &str) -> Result<GeminiTranslator, EvalError> {
        Ok(GeminiTranslator {
            model: model.to_string(),
            base_url: GEMINI_BASE_URL.to_string(),
            api_key: api_key_from_env(api_key_env)?,
            client: Client::builder().timeout(Duration::from_secs(120)).build()?,
        })
    }

    fn generate(&self, prompt: String) -> Result<String, EvalError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = json!({"contents": [{"role": "user", "parts": [{"text": prompt}]}]});
        let response = self
            .client
            .post(&url)
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()?;
        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            return Err(EvalError::ApiError {
                status: status.as_u16(),
                message: text,
            });
        }
        let reply = candidate_text(&serde_json::from_str(&text)?);
        if reply.is_empty() {
            warn!("Empty response from {}", self.model);
        }
        Ok(reply)
    }
}

pub(crate) fn prompt(text: &str, target: Language) -> String {
    format!("Translate this sentence to {}: {}", target.name(), text)
}

/// Concatenated text parts of the first candidate, empty when there is none.
fn candidate_text(body: &Value) -> String {
    body["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part["text"].as_str())
                .collect::<String>()
        })
        .unwrap_or_default()
        .trim()
        .to_string()
}

impl Translator for GeminiTranslator {
    fn name(&self) -> &str {
        &self.model
    }

    fn supports(&self, source: Language, target: Language) -> bool {
        source != target
    }

    fn translate(
        &mut self,
        texts: &[String],
        _source: Language,
        target: Language,
    ) -> Result<Vec<String>, EvalError> {
        let translations = texts
            .iter()
            .map(|text| self.generate(prompt(text, target)))
            .collect::<Result<Vec<_>, _>>()?;
        check_output_length(&self.model, texts.len(), translations)
    }
}
