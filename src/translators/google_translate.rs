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
use serde::Deserialize;
use std::time::Duration;

const TRANSLATE_URL: &str = "https://translation.googleapis.com/language/translate/v2";
/// Segments per request accepted by the v2 API
const MAX_SEGMENTS: usize = 128;

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
}

/// # Google Cloud Translation (v2)
pub struct GoogleTranslator {
    api_key: String,
    client: Client,
}

impl GoogleTranslator {
    pub fn new(api_key_env: &str) -> Result<GoogleTranslator, EvalError> {
        Ok(GoogleTranslator {
            api_key: api_key_from_env(api_key_env)?,
            client: Client::builder().timeout(Duration::from_secs(60)).build()?,
        })
    }

    fn request(
        &self,
        texts: &[String],
        source: Language,
        target: Language,
    ) -> Result<Vec<String>, EvalError> {
        let mut params: Vec<(&str, &str)> = texts.iter().map(|text| ("q", text.as_str())).collect();
        params.push(("source", source.code()));
        params.push(("target", target.code()));
        params.push(("format", "text"));
        params.push(("key", self.api_key.as_str()));

        let response = self.client.post(TRANSLATE_URL).form(&params).send()?;
        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            return Err(EvalError::ApiError {
                status: status.as_u16(),
                message: text,
            });
        }
        let response: TranslateResponse = serde_json::from_str(&text)?;
        Ok(response
            .data
            .translations
            .into_iter()
            .map(|translation| translation.translated_text)
            .collect())
    }
}

impl Translator for GoogleTranslator {
    fn name(&self) -> &str {
        "google-translate"
    }

    fn supports(&self, source: Language, target: Language) -> bool {
        source != target && target != Language::Montenegrin
    }

    fn translate(
        &mut self,
        texts: &[String],
        source: Language,
        target: Language,
    ) -> Result<Vec<String>, EvalError> {
        let mut translations = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(MAX_SEGMENTS) {
            translations.extend(self.request(chunk, source, target)?);
        }
        check_output_length("google-translate", texts.len(), translations)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn response_parsing() -> anyhow::Result<()> {
        let response: TranslateResponse = serde_json::from_str(
            r#"{"data": {"translations": [{"translatedText": "Bonjour"}, {"translatedText": "Salut"}]}}"#,
        )?;
        assert_eq!(response.data.translations.len(), 2);
        assert_eq!(response.data.translations[1].translated_text, "Salut");
        Ok(())
    }

    #[test]
    fn montenegrin_is_not_offered() -> anyhow::Result<()> {
        std::env::set_var("MTEVAL_TEST_GOOGLE_KEY", "key");
        let translator = GoogleTranslator::new("MTEVAL_TEST_GOOGLE_KEY")?;
        assert!(translator.supports(Language::English, Language::Norwegian));
        assert!(!translator.supports(Language::English, Language::Montenegrin));
        Ok(())
    }
}
