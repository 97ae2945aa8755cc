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

//! # Parallel corpora
//!
//! Each corpus adapter turns a Hugging Face dataset into a small sample of
//! (source, reference) pairs for one language pair. Supported corpora:
//! - WMT24++ (`google/wmt24pp`)
//! - TED Talks (`davidstap/ted_talks`) and TED IWSLT (`IWSLT/ted_talks_iwslt`)
//! - Europarl (`Helsinki-NLP/europarl`)
//! - OPUS Books and OPUS-100
//! - Montenegrin subtitles (`Helsinki-NLP/opus_montenegrinsubs`)
//!
//! Rows are read through a `RowSource`: the Hugging Face datasets-server (responses are cached
//! locally) or a directory of JSON-lines files for offline runs.
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! use mt_eval::datasets::{build_corpus, DatasetKind, DatasetSettings, DatasetsServer};
//! use mt_eval::languages::Language;
//! use std::sync::Arc;
//!
//! let settings = DatasetSettings::default();
//! let europarl = build_corpus(
//!     DatasetKind::Europarl,
//!     &settings,
//!     Arc::new(DatasetsServer::default()),
//! );
//! let corpus = europarl.load(Language::English, Language::French)?;
//! for sample in &corpus.samples {
//!     println!("{} => {}", sample.source, sample.reference);
//! }
//! # Ok(())
//! # }
//! ```

mod hub;
mod rows;
mod wmt24pp;

pub use hub::{
    ConfigNaming, HubCorpus, HubDescriptor, RowLayout, EUROPARL, MONTENEGRIN_SUBS, OPUS_100,
    OPUS_BOOKS, TED_IWSLT, TED_TALKS,
};
pub use rows::{read_jsonl, DatasetsServer, JsonlRowSource, RowSource, RowsPage, SplitInfo};
pub use wmt24pp::Wmt24pp;

use crate::common::error::EvalError;
use crate::languages::Language;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Source sentence and its human reference translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelSample {
    pub source: String,
    pub reference: String,
}

impl ParallelSample {
    pub fn new(source: impl Into<String>, reference: impl Into<String>) -> ParallelSample {
        ParallelSample {
            source: source.into(),
            reference: reference.into(),
        }
    }
}

/// Sample of a dataset for one target language
#[derive(Debug, Clone, PartialEq)]
pub struct ParallelCorpus {
    pub dataset: String,
    pub language: Language,
    pub samples: Vec<ParallelSample>,
}

impl ParallelCorpus {
    pub fn empty(dataset: &str, language: Language) -> ParallelCorpus {
        ParallelCorpus {
            dataset: dataset.to_string(),
            language,
            samples: Vec::new(),
        }
    }

    pub fn sources(&self) -> Vec<String> {
        self.samples
            .iter()
            .map(|sample| sample.source.clone())
            .collect()
    }

    pub fn references(&self) -> Vec<String> {
        self.samples
            .iter()
            .map(|sample| sample.reference.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// # Parallel corpus adapter
pub trait Corpus {
    /// Name of the corpus, as written in reports
    fn name(&self) -> &str;

    /// Target languages (from English) this corpus may provide
    fn languages(&self) -> Vec<Language>;

    /// Loads the sample for a language pair. A pair the dataset does not cover yields an empty
    /// corpus; errors are reserved for download and parsing failures.
    fn load(&self, source: Language, target: Language) -> Result<ParallelCorpus, EvalError>;
}

/// Corpora known to the harness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DatasetKind {
    Wmt24pp,
    TedTalks,
    TedIwslt,
    Europarl,
    OpusBooks,
    Opus100,
    MontenegrinSubs,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 7] = [
        DatasetKind::Wmt24pp,
        DatasetKind::TedTalks,
        DatasetKind::TedIwslt,
        DatasetKind::Europarl,
        DatasetKind::OpusBooks,
        DatasetKind::Opus100,
        DatasetKind::MontenegrinSubs,
    ];

    /// Identifier used in configuration files and on the command line
    pub fn id(&self) -> &'static str {
        match self {
            DatasetKind::Wmt24pp => "wmt24pp",
            DatasetKind::TedTalks => "ted-talks",
            DatasetKind::TedIwslt => "ted-iwslt",
            DatasetKind::Europarl => "europarl",
            DatasetKind::OpusBooks => "opus-books",
            DatasetKind::Opus100 => "opus100",
            DatasetKind::MontenegrinSubs => "montenegrin-subs",
        }
    }

    fn descriptor(&self) -> Option<HubDescriptor> {
        match self {
            DatasetKind::Wmt24pp => None,
            DatasetKind::TedTalks => Some(TED_TALKS),
            DatasetKind::TedIwslt => Some(TED_IWSLT),
            DatasetKind::Europarl => Some(EUROPARL),
            DatasetKind::OpusBooks => Some(OPUS_BOOKS),
            DatasetKind::Opus100 => Some(OPUS_100),
            DatasetKind::MontenegrinSubs => Some(MONTENEGRIN_SUBS),
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for DatasetKind {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        DatasetKind::ALL
            .into_iter()
            .find(|kind| kind.id() == normalized)
            .ok_or_else(|| {
                EvalError::InvalidConfigurationError(format!(
                    "unknown dataset '{}', expected one of: {}",
                    s,
                    DatasetKind::ALL
                        .iter()
                        .map(|kind| kind.id())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}

/// Sampling settings shared by all corpora
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSettings {
    /// Overrides the default sample size of every corpus
    pub sample_size: Option<usize>,
    /// Seed for corpora sampled at random
    pub seed: u64,
    /// Directory holding local copies of the datasets (offline mode)
    pub local_dir: Option<PathBuf>,
}

impl Default for DatasetSettings {
    fn default() -> Self {
        DatasetSettings {
            sample_size: None,
            seed: 42,
            local_dir: None,
        }
    }
}

/// Creates the corpus adapter for a dataset kind.
pub fn build_corpus(
    kind: DatasetKind,
    settings: &DatasetSettings,
    rows: Arc<dyn RowSource>,
) -> Box<dyn Corpus> {
    match kind.descriptor() {
        Some(descriptor) => Box::new(HubCorpus::new(
            descriptor,
            rows,
            settings.sample_size,
            settings.seed,
        )),
        None => Box::new(Wmt24pp::new(
            settings.local_dir.clone(),
            settings.sample_size,
        )),
    }
}

/// Row source matching the settings: the local mirror when a directory is configured, the
/// datasets-server otherwise.
pub fn default_row_source(settings: &DatasetSettings) -> Arc<dyn RowSource> {
    match &settings.local_dir {
        Some(dir) => Arc::new(JsonlRowSource::new(dir.clone())),
        None => Arc::new(DatasetsServer::default()),
    }
}
