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
use crate::datasets::rows::{RowSource, PAGE_SIZE};
use crate::datasets::{Corpus, ParallelCorpus, ParallelSample};
use crate::languages::Language;
use crate::languages::Language::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How the dataset configuration is named for a language pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigNaming {
    /// Codes sorted alphabetically and joined by a dash (`bg-en`, `en-fr`)
    SortedPair,
    /// Source code first, joined by a dash (`en-me`)
    SourceFirst,
    /// Source code first, joined by an underscore (`en_nb`)
    Underscore,
    /// Source and target codes followed by a year (`en_fr_2014`)
    UnderscoreYear(u16),
}

impl ConfigNaming {
    pub fn config_name(&self, source_code: &str, target_code: &str) -> String {
        match self {
            ConfigNaming::SortedPair => {
                let mut codes = [source_code, target_code];
                codes.sort_unstable();
                codes.join("-")
            }
            ConfigNaming::SourceFirst => format!("{}-{}", source_code, target_code),
            ConfigNaming::Underscore => format!("{}_{}", source_code, target_code),
            ConfigNaming::UnderscoreYear(year) => {
                format!("{}_{}_{}", source_code, target_code, year)
            }
        }
    }
}

/// Where the two sides of a sentence pair are found in a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLayout {
    /// `{"translation": {"en": "...", "fr": "..."}}`
    TranslationDict,
    /// `{"en": "...", "fr": "..."}`
    Columns,
}

impl RowLayout {
    fn extract(&self, row: &Value, source_code: &str, target_code: &str) -> Option<ParallelSample> {
        let fields = match self {
            RowLayout::TranslationDict => row.get("translation")?,
            RowLayout::Columns => row,
        };
        let source = fields.get(source_code)?.as_str()?.trim();
        let reference = fields.get(target_code)?.as_str()?.trim();
        if source.is_empty() || reference.is_empty() {
            return None;
        }
        Some(ParallelSample::new(source, reference))
    }
}

/// # Static description of a Hugging Face Hub parallel corpus
#[derive(Debug, Clone)]
pub struct HubDescriptor {
    /// Display name used in reports
    pub name: &'static str,
    /// Hub dataset identifier
    pub repository: &'static str,
    pub naming: ConfigNaming,
    pub layout: RowLayout,
    /// Splits to use, in order of preference
    pub splits: &'static [&'static str],
    /// Target languages available from English
    pub languages: &'static [Language],
    /// Dataset-specific codes, for languages where the dataset does not use `Language::code()`
    pub code_overrides: &'static [(Language, &'static str)],
    /// Draw a seeded random sample rather than the first rows
    pub shuffle: bool,
    pub default_sample_size: usize,
    /// Keep only pairs whose source has strictly more words than this
    pub min_source_words: Option<usize>,
}

impl HubDescriptor {
    pub fn code_for(&self, language: Language) -> &'static str {
        self.code_overrides
            .iter()
            .find(|(overridden, _)| *overridden == language)
            .map(|(_, code)| *code)
            .unwrap_or_else(|| language.code())
    }
}

pub const TED_TALKS: HubDescriptor = HubDescriptor {
    name: "TED",
    repository: "davidstap/ted_talks",
    naming: ConfigNaming::Underscore,
    layout: RowLayout::Columns,
    splits: &["test", "train"],
    languages: &[
        Albanian, Bulgarian, Croatian, Czech, Danish, Dutch, Estonian, Finnish, French, German,
        Greek, Hungarian, Icelandic, Italian, Latvian, Lithuanian, Macedonian, Norwegian, Polish,
        Portuguese, Romanian, Slovak, Slovenian, Spanish, Swedish, Turkish,
    ],
    code_overrides: &[(Norwegian, "nb")],
    shuffle: true,
    default_sample_size: 5,
    min_source_words: None,
};

pub const TED_IWSLT: HubDescriptor = HubDescriptor {
    name: "TED-IWSLT",
    repository: "IWSLT/ted_talks_iwslt",
    naming: ConfigNaming::UnderscoreYear(2014),
    layout: RowLayout::TranslationDict,
    splits: &["train"],
    languages: &[
        Bulgarian, Czech, Danish, Dutch, Estonian, Finnish, French, German, Greek, Croatian,
        Hungarian, Icelandic, Italian, Latvian, Lithuanian, Macedonian, Polish, Portuguese,
        Romanian, Slovak, Slovenian, Albanian, Spanish, Swedish, Turkish,
    ],
    code_overrides: &[],
    shuffle: false,
    default_sample_size: 5,
    min_source_words: None,
};

pub const EUROPARL: HubDescriptor = HubDescriptor {
    name: "Europarl",
    repository: "Helsinki-NLP/europarl",
    naming: ConfigNaming::SortedPair,
    layout: RowLayout::TranslationDict,
    splits: &["train"],
    languages: &[
        Bulgarian, Czech, Danish, Dutch, Estonian, Finnish, French, German, Greek, Hungarian,
        Italian, Latvian, Lithuanian, Polish, Portuguese, Romanian, Slovak, Slovenian, Spanish,
        Swedish, Turkish,
    ],
    code_overrides: &[],
    shuffle: true,
    default_sample_size: 5,
    min_source_words: None,
};

pub const OPUS_BOOKS: HubDescriptor = HubDescriptor {
    name: "OPUS-Books",
    repository: "Helsinki-NLP/opus_books",
    naming: ConfigNaming::SortedPair,
    layout: RowLayout::TranslationDict,
    splits: &["train"],
    languages: &[
        Greek, German, Spanish, Finnish, French, Hungarian, Italian, Dutch, Norwegian, Polish,
        Portuguese, Swedish,
    ],
    code_overrides: &[],
    shuffle: false,
    default_sample_size: 5,
    min_source_words: None,
};

pub const OPUS_100: HubDescriptor = HubDescriptor {
    name: "OPUS-100",
    repository: "Helsinki-NLP/opus-100",
    naming: ConfigNaming::SortedPair,
    layout: RowLayout::TranslationDict,
    splits: &["test", "validation", "train"],
    languages: &[
        Albanian, Bulgarian, Croatian, Czech, Danish, Dutch, Estonian, Finnish, French, German,
        Greek, Hungarian, Icelandic, Italian, Latvian, Lithuanian, Macedonian, Norwegian, Polish,
        Portuguese, Romanian, Slovak, Slovenian, Spanish, Swedish, Turkish,
    ],
    code_overrides: &[],
    shuffle: false,
    default_sample_size: 150,
    min_source_words: None,
};

pub const MONTENEGRIN_SUBS: HubDescriptor = HubDescriptor {
    name: "Montenegrin-Subs",
    repository: "Helsinki-NLP/opus_montenegrinsubs",
    naming: ConfigNaming::SourceFirst,
    layout: RowLayout::TranslationDict,
    splits: &["train"],
    languages: &[Montenegrin],
    code_overrides: &[(Montenegrin, "me")],
    shuffle: true,
    default_sample_size: 20,
    min_source_words: Some(10),
};

/// # Parallel corpus served by a `RowSource` and described by a `HubDescriptor`
pub struct HubCorpus {
    descriptor: HubDescriptor,
    rows: Arc<dyn RowSource>,
    sample_size: usize,
    seed: u64,
}

impl HubCorpus {
    pub fn new(
        descriptor: HubDescriptor,
        rows: Arc<dyn RowSource>,
        sample_size: Option<usize>,
        seed: u64,
    ) -> HubCorpus {
        let sample_size = sample_size.unwrap_or(descriptor.default_sample_size);
        HubCorpus {
            descriptor,
            rows,
            sample_size,
            seed,
        }
    }

    pub fn descriptor(&self) -> &HubDescriptor {
        &self.descriptor
    }

    fn accepts(&self, sample: &ParallelSample) -> bool {
        match self.descriptor.min_source_words {
            Some(min_words) => sample.source.split_whitespace().count() > min_words,
            None => true,
        }
    }

    /// Order in which row indices are visited. Filtered datasets draw extra candidates so that
    /// rejected rows can be replaced. Indices are consumed lazily: rows are only requested until
    /// the sample is complete.
    fn candidate_indices(&self, num_rows_total: usize) -> Box<dyn Iterator<Item = usize>> {
        if !self.descriptor.shuffle {
            return Box::new(0..num_rows_total);
        }
        let wanted = match self.descriptor.min_source_words {
            Some(_) => self.sample_size.saturating_mul(20),
            None => self.sample_size,
        };
        let mut rng = StdRng::seed_from_u64(self.seed);
        Box::new(
            rand::seq::index::sample(&mut rng, num_rows_total, wanted.min(num_rows_total))
                .into_iter(),
        )
    }
}

/// Rows fetched page by page, so that scattered indices share requests.
struct PageCache<'a> {
    rows: &'a dyn RowSource,
    dataset: &'a str,
    config: &'a str,
    split: &'a str,
    pages: HashMap<usize, Vec<Value>>,
}

impl<'a> PageCache<'a> {
    fn get(&mut self, index: usize) -> Result<Option<&Value>, EvalError> {
        let page_number = index / PAGE_SIZE;
        if !self.pages.contains_key(&page_number) {
            let page = self.rows.rows(
                self.dataset,
                self.config,
                self.split,
                page_number * PAGE_SIZE,
                PAGE_SIZE,
            )?;
            self.pages.insert(page_number, page.rows);
        }
        Ok(self
            .pages
            .get(&page_number)
            .and_then(|page| page.get(index % PAGE_SIZE)))
    }
}

impl Corpus for HubCorpus {
    fn name(&self) -> &str {
        self.descriptor.name
    }

    fn languages(&self) -> Vec<Language> {
        self.descriptor.languages.to_vec()
    }

    fn load(&self, source: Language, target: Language) -> Result<ParallelCorpus, EvalError> {
        let mut corpus = ParallelCorpus::empty(self.descriptor.name, target);
        if source != English || !self.descriptor.languages.contains(&target) {
            warn!(
                "{} has no {} to {} data",
                self.descriptor.name, source, target
            );
            return Ok(corpus);
        }

        let source_code = self.descriptor.code_for(source);
        let target_code = self.descriptor.code_for(target);
        let config = self.descriptor.naming.config_name(source_code, target_code);

        let available = self.rows.splits(self.descriptor.repository)?;
        let split = match self.descriptor.splits.iter().find(|split| {
            available
                .iter()
                .any(|info| info.config == config && info.split == **split)
        }) {
            Some(split) => *split,
            None => {
                warn!(
                    "Language pair '{}' not found in {} ({} configurations available)",
                    config,
                    self.descriptor.repository,
                    available.len()
                );
                return Ok(corpus);
            }
        };
        info!(
            "Loading dataset: {} ({}, split {})",
            self.descriptor.repository, config, split
        );

        let first_page = self
            .rows
            .rows(self.descriptor.repository, &config, split, 0, PAGE_SIZE)?;
        let num_rows_total = first_page.num_rows_total;
        let mut pages = PageCache {
            rows: self.rows.as_ref(),
            dataset: self.descriptor.repository,
            config: &config,
            split,
            pages: HashMap::from([(0, first_page.rows)]),
        };

        for index in self.candidate_indices(num_rows_total) {
            if corpus.len() >= self.sample_size {
                break;
            }
            let row = match pages.get(index)? {
                Some(row) => row,
                None => break,
            };
            match self
                .descriptor
                .layout
                .extract(row, source_code, target_code)
            {
                Some(sample) if self.accepts(&sample) => corpus.samples.push(sample),
                Some(_) => debug!("row {} rejected by the source length filter", index),
                None => debug!("row {} has no {}/{} pair", index, source_code, target_code),
            }
        }

        if corpus.len() < self.sample_size {
            warn!(
                "{} ({}): only {} of {} requested samples available",
                self.descriptor.name,
                config,
                corpus.len(),
                self.sample_size
            );
        }
        Ok(corpus)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::datasets::rows::{RowsPage, SplitInfo};
    use std::sync::Mutex;

    #[test]
    fn config_names() {
        assert_eq!(ConfigNaming::SortedPair.config_name("en", "bg"), "bg-en");
        assert_eq!(ConfigNaming::SortedPair.config_name("en", "fr"), "en-fr");
        assert_eq!(ConfigNaming::SourceFirst.config_name("en", "me"), "en-me");
        assert_eq!(ConfigNaming::Underscore.config_name("en", "nb"), "en_nb");
        assert_eq!(
            ConfigNaming::UnderscoreYear(2014).config_name("en", "fr"),
            "en_fr_2014"
        );
    }

    #[test]
    fn dataset_specific_codes() {
        assert_eq!(TED_TALKS.code_for(Norwegian), "nb");
        assert_eq!(TED_TALKS.code_for(French), "fr");
        assert_eq!(MONTENEGRIN_SUBS.code_for(Montenegrin), "me");
        assert_eq!(EUROPARL.code_for(Norwegian), "no");
    }

    /// Serves `num_rows_total` generated rows and counts page requests.
    struct CountingRows {
        num_rows_total: usize,
        requests: Mutex<Vec<usize>>,
    }

    impl RowSource for CountingRows {
        fn splits(&self, _dataset: &str) -> Result<Vec<SplitInfo>, EvalError> {
            Ok(vec![
                SplitInfo {
                    config: "en-fr".to_string(),
                    split: "test".to_string(),
                },
                SplitInfo {
                    config: "en-fr".to_string(),
                    split: "train".to_string(),
                },
            ])
        }

        fn rows(
            &self,
            _dataset: &str,
            _config: &str,
            _split: &str,
            offset: usize,
            length: usize,
        ) -> Result<RowsPage, EvalError> {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(offset);
            }
            let end = (offset + length).min(self.num_rows_total);
            let rows = (offset..end)
                .map(|index| {
                    serde_json::json!({"translation": {
                        "en": format!("English sentence {}", index),
                        "fr": format!("Phrase {}", index),
                    }})
                })
                .collect();
            Ok(RowsPage {
                rows,
                num_rows_total: self.num_rows_total,
            })
        }
    }

    fn counting_rows(num_rows_total: usize) -> Arc<CountingRows> {
        Arc::new(CountingRows {
            num_rows_total,
            requests: Mutex::new(Vec::new()),
        })
    }

    #[test]
    fn large_splits_are_read_lazily() -> anyhow::Result<()> {
        let rows = counting_rows(1_000_000);
        let corpus = HubCorpus::new(OPUS_100, rows.clone(), Some(150), 42);

        let loaded = corpus.load(English, French)?;

        assert_eq!(loaded.len(), 150);
        assert_eq!(loaded.samples[149].source, "English sentence 149");
        assert_eq!(*rows.requests.lock().unwrap(), vec![0, 100]);
        Ok(())
    }

    #[test]
    fn each_page_is_requested_once() -> anyhow::Result<()> {
        let rows = counting_rows(450);
        let corpus = HubCorpus::new(EUROPARL, rows.clone(), Some(300), 7);

        let loaded = corpus.load(English, French)?;
        let mut requests = rows.requests.lock().unwrap().clone();
        requests.sort_unstable();

        assert_eq!(loaded.len(), 300);
        assert_eq!(requests, vec![0, 100, 200, 300, 400]);
        Ok(())
    }

    #[test]
    fn row_layouts() {
        let nested = serde_json::json!({"translation": {"en": " Hello ", "fr": "Bonjour"}});
        let flat = serde_json::json!({"en": "Hello", "nb": ""});
        assert_eq!(
            RowLayout::TranslationDict.extract(&nested, "en", "fr"),
            Some(ParallelSample::new("Hello", "Bonjour"))
        );
        assert_eq!(RowLayout::Columns.extract(&flat, "en", "nb"), None);
        assert_eq!(RowLayout::Columns.extract(&nested, "en", "fr"), None);
    }
}
