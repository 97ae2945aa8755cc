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

//! # Evaluated languages
//!
//! Every dataset and model family names languages differently: WMT24++ uses locales (`bg_BG`),
//! NLLB uses FLORES-200 codes (`bul_Cyrl`), multi-target Marian checkpoints expect ISO 639-3
//! tokens (`>>bul<<`) and the rust-bert pipelines use their own `Language` enum. `Language`
//! is the single key the harness works with, and carries the lookup tables to each of these
//! naming schemes.

use crate::common::error::EvalError;
use rust_bert::pipelines::translation::Language as PipelineLanguage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Display;
use std::str::FromStr;

/// Language
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Language {
    English,
    Albanian,
    Bulgarian,
    Croatian,
    Czech,
    Danish,
    Dutch,
    Estonian,
    Finnish,
    French,
    German,
    Greek,
    Hungarian,
    Icelandic,
    Italian,
    Latvian,
    Lithuanian,
    Luxembourgish,
    Macedonian,
    Montenegrin,
    Norwegian,
    Polish,
    Portuguese,
    Romanian,
    Slovak,
    Slovenian,
    Spanish,
    Swedish,
    Turkish,
}

impl Language {
    pub const ALL: [Language; 29] = [
        Language::English,
        Language::Albanian,
        Language::Bulgarian,
        Language::Croatian,
        Language::Czech,
        Language::Danish,
        Language::Dutch,
        Language::Estonian,
        Language::Finnish,
        Language::French,
        Language::German,
        Language::Greek,
        Language::Hungarian,
        Language::Icelandic,
        Language::Italian,
        Language::Latvian,
        Language::Lithuanian,
        Language::Luxembourgish,
        Language::Macedonian,
        Language::Montenegrin,
        Language::Norwegian,
        Language::Polish,
        Language::Portuguese,
        Language::Romanian,
        Language::Slovak,
        Language::Slovenian,
        Language::Spanish,
        Language::Swedish,
        Language::Turkish,
    ];

    /// All languages that can be used as translation target from English.
    pub fn targets() -> impl Iterator<Item = Language> {
        Language::ALL
            .into_iter()
            .filter(|language| *language != Language::English)
    }

    /// Short code of the language: ISO 639-1 when it exists, `cnr` for Montenegrin.
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Albanian => "sq",
            Language::Bulgarian => "bg",
            Language::Croatian => "hr",
            Language::Czech => "cs",
            Language::Danish => "da",
            Language::Dutch => "nl",
            Language::Estonian => "et",
            Language::Finnish => "fi",
            Language::French => "fr",
            Language::German => "de",
            Language::Greek => "el",
            Language::Hungarian => "hu",
            Language::Icelandic => "is",
            Language::Italian => "it",
            Language::Latvian => "lv",
            Language::Lithuanian => "lt",
            Language::Luxembourgish => "lb",
            Language::Macedonian => "mk",
            Language::Montenegrin => "cnr",
            Language::Norwegian => "no",
            Language::Polish => "pl",
            Language::Portuguese => "pt",
            Language::Romanian => "ro",
            Language::Slovak => "sk",
            Language::Slovenian => "sl",
            Language::Spanish => "es",
            Language::Swedish => "sv",
            Language::Turkish => "tr",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Albanian => "Albanian",
            Language::Bulgarian => "Bulgarian",
            Language::Croatian => "Croatian",
            Language::Czech => "Czech",
            Language::Danish => "Danish",
            Language::Dutch => "Dutch",
            Language::Estonian => "Estonian",
            Language::Finnish => "Finnish",
            Language::French => "French",
            Language::German => "German",
            Language::Greek => "Greek",
            Language::Hungarian => "Hungarian",
            Language::Icelandic => "Icelandic",
            Language::Italian => "Italian",
            Language::Latvian => "Latvian",
            Language::Lithuanian => "Lithuanian",
            Language::Luxembourgish => "Luxembourgish",
            Language::Macedonian => "Macedonian",
            Language::Montenegrin => "Montenegrin",
            Language::Norwegian => "Norwegian",
            Language::Polish => "Polish",
            Language::Portuguese => "Portuguese",
            Language::Romanian => "Romanian",
            Language::Slovak => "Slovak",
            Language::Slovenian => "Slovenian",
            Language::Spanish => "Spanish",
            Language::Swedish => "Swedish",
            Language::Turkish => "Turkish",
        }
    }

    /// ISO 639-3 code, as used by the target tokens of multi-target OPUS-MT checkpoints.
    pub fn iso_639_3(&self) -> &'static str {
        match self {
            Language::English => "eng",
            Language::Albanian => "sqi",
            Language::Bulgarian => "bul",
            Language::Croatian => "hrv",
            Language::Czech => "ces",
            Language::Danish => "dan",
            Language::Dutch => "nld",
            Language::Estonian => "est",
            Language::Finnish => "fin",
            Language::French => "fra",
            Language::German => "deu",
            Language::Greek => "ell",
            Language::Hungarian => "hun",
            Language::Icelandic => "isl",
            Language::Italian => "ita",
            Language::Latvian => "lav",
            Language::Lithuanian => "lit",
            Language::Luxembourgish => "ltz",
            Language::Macedonian => "mkd",
            Language::Montenegrin => "cnr",
            Language::Norwegian => "nor",
            Language::Polish => "pol",
            Language::Portuguese => "por",
            Language::Romanian => "ron",
            Language::Slovak => "slk",
            Language::Slovenian => "slv",
            Language::Spanish => "spa",
            Language::Swedish => "swe",
            Language::Turkish => "tur",
        }
    }

    /// FLORES-200 code used by NLLB-200. Montenegrin is not covered by NLLB.
    pub fn nllb_code(&self) -> Option<&'static str> {
        Some(match self {
            Language::English => "eng_Latn",
            Language::Albanian => "als_Latn",
            Language::Bulgarian => "bul_Cyrl",
            Language::Croatian => "hrv_Latn",
            Language::Czech => "ces_Latn",
            Language::Danish => "dan_Latn",
            Language::Dutch => "nld_Latn",
            Language::Estonian => "est_Latn",
            Language::Finnish => "fin_Latn",
            Language::French => "fra_Latn",
            Language::German => "deu_Latn",
            Language::Greek => "ell_Grek",
            Language::Hungarian => "hun_Latn",
            Language::Icelandic => "isl_Latn",
            Language::Italian => "ita_Latn",
            Language::Latvian => "lvs_Latn",
            Language::Lithuanian => "lit_Latn",
            Language::Luxembourgish => "ltz_Latn",
            Language::Macedonian => "mkd_Cyrl",
            Language::Montenegrin => return None,
            Language::Norwegian => "nob_Latn",
            Language::Polish => "pol_Latn",
            Language::Portuguese => "por_Latn",
            Language::Romanian => "ron_Latn",
            Language::Slovak => "slk_Latn",
            Language::Slovenian => "slv_Latn",
            Language::Spanish => "spa_Latn",
            Language::Swedish => "swe_Latn",
            Language::Turkish => "tur_Latn",
        })
    }

    /// Locale used by the `google/wmt24pp` configurations (`en-<locale>`).
    pub fn wmt24pp_locale(&self) -> Option<&'static str> {
        Some(match self {
            Language::Bulgarian => "bg_BG",
            Language::Croatian => "hr_HR",
            Language::Czech => "cs_CZ",
            Language::Danish => "da_DK",
            Language::Dutch => "nl_NL",
            Language::Estonian => "et_EE",
            Language::Finnish => "fi_FI",
            Language::French => "fr_FR",
            Language::German => "de_DE",
            Language::Greek => "el_GR",
            Language::Hungarian => "hu_HU",
            Language::Icelandic => "is_IS",
            Language::Italian => "it_IT",
            Language::Latvian => "lv_LV",
            Language::Lithuanian => "lt_LT",
            Language::Norwegian => "no_NO",
            Language::Polish => "pl_PL",
            Language::Portuguese => "pt_PT",
            Language::Romanian => "ro_RO",
            Language::Slovak => "sk_SK",
            Language::Slovenian => "sl_SI",
            Language::Spanish => "es_MX",
            Language::Swedish => "sv_SE",
            Language::Turkish => "tr_TR",
            Language::English
            | Language::Albanian
            | Language::Luxembourgish
            | Language::Macedonian
            | Language::Montenegrin => return None,
        })
    }

    /// Equivalent language of the rust-bert translation pipelines, if any.
    pub fn to_pipeline_language(&self) -> Option<PipelineLanguage> {
        Some(match self {
            Language::English => PipelineLanguage::English,
            Language::Albanian => PipelineLanguage::Albanian,
            Language::Bulgarian => PipelineLanguage::Bulgarian,
            Language::Croatian => PipelineLanguage::Croatian,
            Language::Czech => PipelineLanguage::Czech,
            Language::Danish => PipelineLanguage::Danish,
            Language::Dutch => PipelineLanguage::Dutch,
            Language::Estonian => PipelineLanguage::Estonian,
            Language::Finnish => PipelineLanguage::Finnish,
            Language::French => PipelineLanguage::French,
            Language::German => PipelineLanguage::German,
            Language::Greek => PipelineLanguage::Greek,
            Language::Hungarian => PipelineLanguage::Hungarian,
            Language::Icelandic => PipelineLanguage::Icelandic,
            Language::Italian => PipelineLanguage::Italian,
            Language::Latvian => PipelineLanguage::Latvian,
            Language::Lithuanian => PipelineLanguage::Lithuanian,
            Language::Luxembourgish => PipelineLanguage::Luxembourgish,
            Language::Macedonian => PipelineLanguage::Macedonian,
            Language::Montenegrin => return None,
            Language::Norwegian => PipelineLanguage::Norwegian,
            Language::Polish => PipelineLanguage::Polish,
            Language::Portuguese => PipelineLanguage::Portuguese,
            Language::Romanian => PipelineLanguage::Romanian,
            Language::Slovak => PipelineLanguage::Slovak,
            Language::Slovenian => PipelineLanguage::Slovenian,
            Language::Spanish => PipelineLanguage::Spanish,
            Language::Swedish => PipelineLanguage::Swedish,
            Language::Turkish => PipelineLanguage::Turkish,
        })
    }

    /// Parses a language code. Accepts the codes returned by `code()` as well as the aliases
    /// found in the datasets (`nb`/`nob` for Norwegian, `me` for Montenegrin) and ISO 639-3 codes.
    pub fn from_code(code: &str) -> Result<Language, EvalError> {
        let normalized = code.trim().to_lowercase();
        match normalized.as_str() {
            "nb" | "nob" => return Ok(Language::Norwegian),
            "me" => return Ok(Language::Montenegrin),
            _ => {}
        }
        Language::ALL
            .into_iter()
            .find(|language| {
                language.code() == normalized
                    || language.iso_639_3() == normalized
                    || language.name().to_lowercase() == normalized
            })
            .ok_or_else(|| EvalError::UnsupportedLanguage(code.to_string()))
    }
}

impl Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Language {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::from_code(s)
    }
}

impl TryFrom<String> for Language {
    type Error = EvalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Language::from_code(&value)
    }
}

impl From<Language> for &'static str {
    fn from(language: Language) -> Self {
        language.code()
    }
}
