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
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// How sentences are submitted to a chat model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromptStyle {
    /// All sentences of a corpus in one bulleted request, one translation per reply line
    #[default]
    Batch,
    /// One request per sentence
    Sentence,
    /// One request per sentence with the TowerInstruct template
    Tower,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Name in reports, the model identifier when absent
    pub name: Option<String>,
    pub model: String,
    pub base_url: String,
    pub api_key_env: String,
    pub prompt: PromptStyle,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for ChatSettings {
    fn default() -> Self {
        ChatSettings {
            name: None,
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            prompt: PromptStyle::Batch,
            temperature: 0.7,
            max_tokens: 3000,
            timeout_secs: 120,
        }
    }
}

impl ChatSettings {
    fn is_local(&self) -> bool {
        self.base_url.contains("localhost") || self.base_url.contains("127.0.0.1")
    }
}

fn system_message(target: Language) -> Value {
    json!({
        "role": "system",
        "content": format!("You are a translator that translates English text to {}.", target.name()),
    })
}

fn user_message(content: String) -> Value {
    json!({"role": "user", "content": content})
}

/// Joins the lines of `text`, so that each sentence takes one line of a batch prompt.
fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl PromptStyle {
    /// Chat messages of one request covering `texts`
    pub fn messages(&self, texts: &[String], source: Language, target: Language) -> Vec<Value> {
        match self {
            PromptStyle::Batch => {
                let bullets = texts
                    .iter()
                    .map(|text| format!("- {}", single_line(text)))
                    .collect::<Vec<_>>()
                    .join("\n");
                vec![
                    system_message(target),
                    user_message(format!(
                        "Translate the following {} sentences to {}:\n{}",
                        source.name(),
                        target.name(),
                        bullets
                    )),
                ]
            }
            PromptStyle::Sentence => vec![
                system_message(target),
                user_message(format!(
                    "Translate the following {} text to {}: {}",
                    source.name(),
                    target.name(),
                    texts.join(" ")
                )),
            ],
            PromptStyle::Tower => vec![user_message(format!(
                "Translate the following text from {source} into {target}.\n{source}: {text}\n{target}:",
                source = source.name(),
                target = target.name(),
                text = texts.join(" ")
            ))],
        }
    }
}

/// Splits a batch reply into one translation per line, removing list markers and blank lines.
pub fn parse_batch_reply(reply: &str) -> Vec<String> {
    reply
        .lines()
        .map(|line| line.trim_matches(|c: char| c == '-' || c == ' ').trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// # OpenAI-compatible chat translator
/// Works with the OpenAI API and any server exposing `/chat/completions` (vLLM, Ollama, LM Studio),
/// which is how Mistral and TowerInstruct models are evaluated. Servers on localhost do not
/// need an API key.
pub struct ChatTranslator {
    settings: ChatSettings,
    name: String,
    api_key: String,
    client: Client,
}

impl ChatTranslator {
    pub fn new(settings: ChatSettings) -> Result<ChatTranslator, EvalError> {
        let api_key = match api_key_from_env(&settings.api_key_env) {
            Ok(key) => key,
            Err(_) if settings.is_local() => {
                debug!("No API key set for local server {}", settings.base_url);
                String::new()
            }
            Err(error) => return Err(error),
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        let name = settings
            .name
            .clone()
            .unwrap_or_else(|| settings.model.clone());
        Ok(ChatTranslator {
            settings,
            name,
            api_key,
            client,
        })
    }

    fn complete(&self, messages: Vec<Value>) -> Result<String, EvalError> {
        let url = format!("{}/chat/completions", self.settings.base_url.trim_end_matches('/'));
        let body = json!({
            "model": self.settings.model,
            "messages": messages,
            "temperature": self.settings.temperature,
            "max_tokens": self.settings.max_tokens,
        });
        let mut request = self.client.post(&url).json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }
        let response = request.send()?;
        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            return Err(EvalError::ApiError {
                status: status.as_u16(),
                message: text,
            });
        }
        parse_completion(&serde_json::from_str(&text)?)
    }
}

fn parse_completion(body: &Value) -> Result<String, EvalError> {
    body.get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| EvalError::TranslationError("no choices in chat completion".to_string()))
}

impl Translator for ChatTranslator {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, source: Language, target: Language) -> bool {
        source != target
    }

    fn translate(
        &mut self,
        texts: &[String],
        source: Language,
        target: Language,
    ) -> Result<Vec<String>, EvalError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let translations = match self.settings.prompt {
            PromptStyle::Batch => {
                let reply = self.complete(self.settings.prompt.messages(texts, source, target))?;
                let lines = parse_batch_reply(&reply);
                if lines.len() != texts.len() {
                    warn!(
                        "{} answered {} lines for {} sentences",
                        self.name,
                        lines.len(),
                        texts.len()
                    );
                }
                lines
            }
            style => texts
                .iter()
                .map(|text| {
                    let messages = style.messages(std::slice::from_ref(text), source, target);
                    self.complete(messages)
                })
                .collect::<Result<Vec<_>, _>>()?,
        };
        check_output_length(&self.name, texts.len(), translations)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn batch_prompt() {
        let texts = vec!["Hello.".to_string(), "Good night.".to_string()];
        let messages = PromptStyle::Batch.messages(&texts, Language::English, Language::French);
        assert_eq!(
            messages[0]["content"],
            "You are a translator that translates English text to French."
        );
        assert_eq!(
            messages[1]["content"],
            "Translate the following English sentences to French:\n- Hello.\n- Good night."
        );
    }

    #[test]
    fn batch_prompt_keeps_one_line_per_sentence() {
        let texts = vec![
            "First line\nsecond line.".to_string(),
            "Windows\r\nline ending.".to_string(),
        ];
        let messages = PromptStyle::Batch.messages(&texts, Language::English, Language::German);
        let prompt = messages[1]["content"].as_str().unwrap_or_default();
        assert_eq!(
            prompt,
            "Translate the following English sentences to German:\n- First line second line.\n- Windows line ending."
        );
        assert_eq!(parse_batch_reply(prompt).len(), 3);
    }

    #[test]
    fn tower_prompt() {
        let texts = vec!["Hello.".to_string()];
        let messages = PromptStyle::Tower.messages(&texts, Language::English, Language::German);
        assert_eq!(messages.len(), 1);
        assert_eq!(
            messages[0]["content"],
            "Translate the following text from English into German.\nEnglish: Hello.\nGerman:"
        );
    }

    #[test]
    fn batch_reply_parsing() {
        let reply = "- Bonjour.\n\n- Bonne nuit.  \n-Au revoir";
        assert_eq!(
            parse_batch_reply(reply),
            vec!["Bonjour.", "Bonne nuit.", "Au revoir"]
        );
    }

    #[test]
    fn completion_content() -> anyhow::Result<()> {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": " Hallo \n"}}]});
        assert_eq!(parse_completion(&body)?, "Hallo");
        assert!(parse_completion(&json!({"choices": []})).is_err());
        Ok(())
    }

    #[test]
    fn local_servers_need_no_key() {
        let settings = ChatSettings {
            base_url: "http://localhost:8000/v1".to_string(),
            api_key_env: "MTEVAL_TEST_UNSET_KEY".to_string(),
            ..Default::default()
        };
        assert!(ChatTranslator::new(settings).is_ok());
        let remote = ChatSettings {
            api_key_env: "MTEVAL_TEST_UNSET_KEY".to_string(),
            ..Default::default()
        };
        assert!(ChatTranslator::new(remote).is_err());
    }
}
