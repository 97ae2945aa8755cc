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
use crate::common::resources::{DataFile, LocalDataFile, RemoteDataFile};
use crate::datasets::rows::read_jsonl;
use crate::datasets::{Corpus, ParallelCorpus, ParallelSample};
use crate::languages::Language;
use serde_json::Value;
use std::path::PathBuf;
use tracing::{info, warn};

pub const WMT24PP_REPOSITORY: &str = "google/wmt24pp";

/// # WMT24++ (`google/wmt24pp`)
/// One JSON-lines file per language pair (`en-<locale>.jsonl`), with `source`, `target` and
/// `is_bad_source` fields. The post-edited `target` is used as reference and rows flagged as bad
/// sources are skipped.
pub struct Wmt24pp {
    local_dir: Option<PathBuf>,
    sample_size: usize,
}

impl Wmt24pp {
    pub const DEFAULT_SAMPLE_SIZE: usize = 5;

    /// Creates a WMT24++ loader reading from the Hugging Face Hub, or from `local_dir` when
    /// provided (`<local_dir>/google--wmt24pp/en-<locale>.jsonl`).
    pub fn new(local_dir: Option<PathBuf>, sample_size: Option<usize>) -> Wmt24pp {
        Wmt24pp {
            local_dir,
            sample_size: sample_size.unwrap_or(Self::DEFAULT_SAMPLE_SIZE),
        }
    }

    fn data_file(&self, locale: &str) -> Box<dyn DataFile> {
        let file_name = format!("en-{}.jsonl", locale);
        match &self.local_dir {
            Some(dir) => Box::new(LocalDataFile {
                local_path: dir
                    .join(WMT24PP_REPOSITORY.replace('/', "--"))
                    .join(file_name),
            }),
            None => Box::new(RemoteDataFile::from_hub_dataset(
                WMT24PP_REPOSITORY,
                &file_name,
            )),
        }
    }
}

fn sample_from_row(row: &Value) -> Option<ParallelSample> {
    if row
        .get("is_bad_source")
        .and_then(Value::as_bool)
        .unwrap_or(false)
    {
        return None;
    }
    let source = row.get("source")?.as_str()?.trim();
    let reference = row.get("target")?.as_str()?.trim();
    if source.is_empty() || reference.is_empty() {
        return None;
    }
    Some(ParallelSample::new(source, reference))
}

impl Corpus for Wmt24pp {
    fn name(&self) -> &str {
        "WMT"
    }

    fn languages(&self) -> Vec<Language> {
        Language::targets()
            .filter(|language| language.wmt24pp_locale().is_some())
            .collect()
    }

    fn load(&self, source: Language, target: Language) -> Result<ParallelCorpus, EvalError> {
        let mut corpus = ParallelCorpus::empty(self.name(), target);
        let locale = match (source, target.wmt24pp_locale()) {
            (Language::English, Some(locale)) => locale,
            _ => {
                warn!("Skipping {}: no WMT24++ data for {} to {}", target, source, target);
                return Ok(corpus);
            }
        };
        info!("Loading dataset: {} (en-{})", WMT24PP_REPOSITORY, locale);

        let path = self.data_file(locale).local_path()?;
        corpus.samples = read_jsonl(&path)?
            .iter()
            .filter_map(sample_from_row)
            .take(self.sample_size)
            .collect();
        Ok(corpus)
    }
}
