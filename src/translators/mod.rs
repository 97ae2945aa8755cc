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

//! # Translation systems under evaluation
//!
//! - Local neural models run through the rust-bert translation pipelines: Marian (opus-mt),
//!   M2M100, NLLB-200 and mBART-50.
//! - Chat models behind an OpenAI-compatible `/chat/completions` endpoint (ChatGPT, or Mistral
//!   and TowerInstruct served by vLLM, Ollama or similar).
//! - Gemini and Google Cloud Translation REST APIs.
//!
//! Systems are described by a `ModelSpec`, typically read from the configuration file:
//!
//! ```toml
//! [[models]]
//! kind = "nllb"
//! size = "600M-distilled"
//!
//! [[models]]
//! kind = "chat"
//! model = "gpt-4o-mini"
//! prompt = "batch"
//! ```

mod chat;
mod gemini;
mod google_translate;
mod pipeline;

pub use chat::{parse_batch_reply, ChatSettings, ChatTranslator, PromptStyle};
pub use gemini::{GeminiTranslator, DEFAULT_GEMINI_MODEL};
pub use google_translate::GoogleTranslator;
pub use pipeline::{M2M100Size, NllbSize, PipelineBackend, PipelineTranslator};

use crate::common::error::EvalError;
use crate::languages::Language;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// # Translation system
pub trait Translator {
    /// Model name, as written in reports
    fn name(&self) -> &str;

    /// Whether the system can translate from `source` to `target`
    fn supports(&self, source: Language, target: Language) -> bool;

    /// Translates `texts`, returning exactly one translation per input sentence.
    fn translate(
        &mut self,
        texts: &[String],
        source: Language,
        target: Language,
    ) -> Result<Vec<String>, EvalError>;
}

/// Decoding parameters of the local models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub num_beams: i64,
    pub length_penalty: f64,
    pub early_stopping: bool,
    pub max_length: Option<i64>,
    /// Number of sentences sent to the model at once
    pub batch_size: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        GenerationSettings {
            num_beams: 5,
            length_penalty: 1.2,
            early_stopping: false,
            max_length: Some(512),
            batch_size: 8,
        }
    }
}

/// Description of a translation system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ModelSpec {
    /// Pretrained English to X opus-mt model shipped by rust-bert for each target
    Marian {
        #[serde(default)]
        name: Option<String>,
    },
    /// Converted opus-mt checkpoint (`rust_model.ot`, `config.json`, `vocab.json`, `source.spm`)
    /// with the target token prepended to each sentence, e.g. `">>nor<<"`
    MarianLocal {
        name: String,
        path: PathBuf,
        targets: BTreeMap<Language, String>,
    },
    #[serde(rename = "m2m100")]
    M2M100 {
        #[serde(default)]
        size: M2M100Size,
    },
    Nllb {
        #[serde(default)]
        size: NllbSize,
    },
    #[serde(rename = "mbart50")]
    MBart50,
    /// OpenAI-compatible chat completion API
    Chat(ChatSettings),
    Gemini {
        #[serde(default = "default_gemini_model")]
        model: String,
        #[serde(default = "default_gemini_key")]
        api_key_env: String,
    },
    GoogleTranslate {
        #[serde(default = "default_google_key")]
        api_key_env: String,
    },
}

fn default_gemini_model() -> String {
    DEFAULT_GEMINI_MODEL.to_string()
}

fn default_gemini_key() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_google_key() -> String {
    "GOOGLE_TRANSLATE_API_KEY".to_string()
}

impl ModelSpec {
    /// Name of the system in reports
    pub fn name(&self) -> String {
        match self {
            ModelSpec::Marian { name } => name
                .clone()
                .unwrap_or_else(|| "Helsinki-NLP/opus-mt".to_string()),
            ModelSpec::MarianLocal { name, .. } => name.clone(),
            ModelSpec::M2M100 { size } => size.model_name().to_string(),
            ModelSpec::Nllb { size } => size.model_name().to_string(),
            ModelSpec::MBart50 => "facebook/mbart-large-50-many-to-many-mmt".to_string(),
            ModelSpec::Chat(settings) => settings
                .name
                .clone()
                .unwrap_or_else(|| settings.model.clone()),
            ModelSpec::Gemini { model, .. } => model.clone(),
            ModelSpec::GoogleTranslate { .. } => "google-translate".to_string(),
        }
    }
}

/// Creates the translator for a model description. Local models are loaded on first use, API
/// clients fail here when their key is missing.
pub fn build_translator(
    spec: &ModelSpec,
    generation: &GenerationSettings,
) -> Result<Box<dyn Translator>, EvalError> {
    Ok(match spec {
        ModelSpec::Marian { .. } => Box::new(PipelineTranslator::new(
            spec.name(),
            PipelineBackend::Marian,
            generation.clone(),
        )),
        ModelSpec::MarianLocal { path, targets, .. } => Box::new(PipelineTranslator::new(
            spec.name(),
            PipelineBackend::MarianLocal {
                path: path.clone(),
                targets: targets.clone(),
            },
            generation.clone(),
        )),
        ModelSpec::M2M100 { size } => Box::new(PipelineTranslator::new(
            spec.name(),
            PipelineBackend::M2M100(*size),
            generation.clone(),
        )),
        ModelSpec::Nllb { size } => Box::new(PipelineTranslator::new(
            spec.name(),
            PipelineBackend::Nllb(*size),
            generation.clone(),
        )),
        ModelSpec::MBart50 => Box::new(PipelineTranslator::new(
            spec.name(),
            PipelineBackend::MBart50,
            generation.clone(),
        )),
        ModelSpec::Chat(settings) => Box::new(ChatTranslator::new(settings.clone())?),
        ModelSpec::Gemini { model, api_key_env } => {
            Box::new(GeminiTranslator::new(model, api_key_env)?)
        }
        ModelSpec::GoogleTranslate { api_key_env } => {
            Box::new(GoogleTranslator::new(api_key_env)?)
        }
    })
}

/// Reads an API key from the environment.
pub(crate) fn api_key_from_env(variable: &str) -> Result<String, EvalError> {
    match std::env::var(variable) {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(EvalError::InvalidConfigurationError(format!(
            "environment variable {} is not set",
            variable
        ))),
    }
}

/// Checks that a system returned one translation per input sentence.
pub(crate) fn check_output_length(
    model: &str,
    inputs: usize,
    outputs: Vec<String>,
) -> Result<Vec<String>, EvalError> {
    if inputs != outputs.len() {
        return Err(EvalError::TranslationError(format!(
            "{} returned {} translations for {} sentences",
            model,
            outputs.len(),
            inputs
        )));
    }
    Ok(outputs)
}
