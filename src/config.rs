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

//! # Run configuration
//!
//! Layered with `figment`, from lowest to highest priority:
//! 1. built-in defaults
//! 2. TOML file (`mt-eval.toml` in the working directory, or an explicit path)
//! 3. environment variables prefixed with `MTEVAL_`, nested keys separated by `__`
//!    (`MTEVAL_SAMPLE_SIZE=3`, `MTEVAL_METRICS__CHRF=false`)

use crate::common::error::EvalError;
use crate::datasets::{DatasetKind, DatasetSettings};
use crate::evaluation::BenchmarkSettings;
use crate::languages::Language;
use crate::metrics::{Bleu, ChrF, Comet, Scorer};
use crate::translators::{GenerationSettings, ModelSpec};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "mt-eval.toml";

/// Metrics computed for every combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub bleu: bool,
    pub chrf: bool,
    /// Case-insensitive BLEU
    pub lowercase: bool,
    /// COMET through `comet-score`, disabled unless configured
    pub comet: Option<Comet>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        MetricsConfig {
            bleu: true,
            chrf: true,
            lowercase: false,
            comet: None,
        }
    }
}

impl MetricsConfig {
    pub fn scorers(&self) -> Vec<Box<dyn Scorer>> {
        let mut scorers: Vec<Box<dyn Scorer>> = Vec::new();
        if self.bleu {
            scorers.push(Box::new(Bleu::new(self.lowercase)));
        }
        if self.chrf {
            scorers.push(Box::new(ChrF::default()));
        }
        if let Some(comet) = &self.comet {
            scorers.push(Box::new(comet.clone()));
        }
        scorers
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Directory receiving the CSV/JSON results and the log file
    pub output_dir: PathBuf,
    pub source_language: Language,
    /// Target languages to evaluate, all languages of each dataset when empty
    pub languages: Vec<Language>,
    pub datasets: Vec<DatasetKind>,
    /// Overrides the sample size of every dataset
    pub sample_size: Option<usize>,
    pub seed: u64,
    /// Directory of JSON-lines dataset copies, used instead of the Hugging Face Hub
    pub offline_data: Option<PathBuf>,
    pub models: Vec<ModelSpec>,
    pub generation: GenerationSettings,
    pub metrics: MetricsConfig,
    /// Trims and lowercases references and translations before scoring
    pub normalize_references: bool,
    pub min_bleu: Option<f64>,
    pub min_comet: Option<f64>,
    /// Also appends results to `<output_dir>/results.json`
    pub results_json: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            output_dir: PathBuf::from("results"),
            source_language: Language::English,
            languages: Vec::new(),
            datasets: DatasetKind::ALL.to_vec(),
            sample_size: None,
            seed: 42,
            offline_data: None,
            models: vec![ModelSpec::Marian { name: None }],
            generation: GenerationSettings::default(),
            metrics: MetricsConfig::default(),
            normalize_references: false,
            min_bleu: None,
            min_comet: None,
            results_json: true,
        }
    }
}

impl EvalConfig {
    /// Configuration sources. Without an explicit path, `mt-eval.toml` is read if present.
    pub fn figment(path: Option<&Path>) -> Figment {
        let file = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Figment::from(Serialized::defaults(EvalConfig::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed("MTEVAL_").ignore(&["cache"]).split("__"))
    }

    pub fn load(path: Option<&Path>) -> Result<EvalConfig, EvalError> {
        if let Some(path) = path {
            if !path.is_file() {
                return Err(EvalError::InvalidConfigurationError(format!(
                    "configuration file {} not found",
                    path.display()
                )));
            }
        }
        let config: EvalConfig = Self::figment(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EvalError> {
        let invalid = |message: &str| Err(EvalError::InvalidConfigurationError(message.to_string()));
        if self.models.is_empty() {
            return invalid("no model to evaluate");
        }
        if self.datasets.is_empty() {
            return invalid("no dataset to evaluate on");
        }
        if self.sample_size == Some(0) {
            return invalid("sample_size must be positive");
        }
        if self.generation.batch_size == 0 {
            return invalid("generation.batch_size must be positive");
        }
        if self.generation.num_beams < 1 {
            return invalid("generation.num_beams must be at least 1");
        }
        if !self.metrics.bleu && !self.metrics.chrf && self.metrics.comet.is_none() {
            return invalid("all metrics are disabled");
        }
        if self.languages.contains(&self.source_language) {
            return invalid("the source language cannot be a target language");
        }
        Ok(())
    }

    pub fn dataset_settings(&self) -> DatasetSettings {
        DatasetSettings {
            sample_size: self.sample_size,
            seed: self.seed,
            local_dir: self.offline_data.clone(),
        }
    }

    pub fn benchmark_settings(&self) -> BenchmarkSettings {
        BenchmarkSettings {
            source: self.source_language,
            languages: self.languages.clone(),
            normalize_references: self.normalize_references,
            min_bleu: self.min_bleu,
            min_comet: self.min_comet,
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        self.output_dir.join("logs")
    }

    pub fn results_json_path(&self) -> Option<PathBuf> {
        self.results_json
            .then(|| self.output_dir.join("results.json"))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EvalConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.metrics.scorers().len(), 2);
        assert_eq!(config.generation.num_beams, 5);
    }

    #[test]
    fn empty_model_list_is_rejected() {
        let config = EvalConfig {
            models: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(EvalError::InvalidConfigurationError(_))
        ));
    }

    #[test]
    fn layered_sources() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_FILE,
                r#"
                languages = ["bg", "nb"]
                datasets = ["europarl", "montenegrin-subs"]
                sample_size = 10

                [metrics]
                lowercase = true

                [metrics.comet]
                batch_size = 16

                [[models]]
                kind = "nllb"
                size = "1.3B"
                "#,
            )?;
            jail.set_env("MTEVAL_SAMPLE_SIZE", "3");
            jail.set_env("MTEVAL_METRICS__CHRF", "false");

            let config = EvalConfig::load(None).map_err(|error| error.to_string())?;
            assert_eq!(
                config.languages,
                vec![Language::Bulgarian, Language::Norwegian]
            );
            assert_eq!(
                config.datasets,
                vec![DatasetKind::Europarl, DatasetKind::MontenegrinSubs]
            );
            assert_eq!(config.sample_size, Some(3));
            assert!(config.metrics.lowercase);
            assert!(!config.metrics.chrf);
            let comet = config.metrics.comet.clone().ok_or("comet not configured")?;
            assert_eq!(comet.batch_size, 16);
            assert_eq!(comet.model, "Unbabel/wmt22-comet-da");
            assert_eq!(config.models[0].name(), "facebook/nllb-200-1.3B");
            assert_eq!(config.seed, 42);
            Ok(())
        });
    }
}
