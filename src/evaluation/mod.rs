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

//! # Benchmark runner
//!
//! Evaluates every translator on every corpus and target language, in that order. Each
//! combination produces one row of the score table:
//! - `Skipped` cells when the corpus failed to load,
//! - `NA` cells when the corpus has no data for the language,
//! - `Error` cells when translation failed (a failing metric only marks its own cell),
//! - the rounded scores otherwise, in which case the translations are written as well.
//!
//! Languages a translator does not support are logged and produce no row.

mod summary;

pub use summary::{RunSummary, SkippedCorpus};

use crate::common::error::EvalError;
use crate::datasets::{Corpus, ParallelCorpus};
use crate::languages::Language;
use crate::metrics::Scorer;
use crate::report::{Cell, ResultSink, ScoreRecord, TranslationRow};
use crate::translators::Translator;
use chrono::Utc;
use std::collections::HashMap;
use tracing::{error, info, warn};

/// Run-level settings of a benchmark
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkSettings {
    pub source: Language,
    /// Target languages to evaluate, every language of each corpus when empty
    pub languages: Vec<Language>,
    /// Trims and lowercases references and hypotheses before scoring
    pub normalize_references: bool,
    pub min_bleu: Option<f64>,
    pub min_comet: Option<f64>,
}

impl Default for BenchmarkSettings {
    fn default() -> Self {
        BenchmarkSettings {
            source: Language::English,
            languages: Vec::new(),
            normalize_references: false,
            min_bleu: None,
            min_comet: None,
        }
    }
}

impl BenchmarkSettings {
    fn selected(&self, language: Language) -> bool {
        language != self.source && (self.languages.is_empty() || self.languages.contains(&language))
    }

    fn below_threshold(&self, record: &ScoreRecord) -> bool {
        let below = |cell: Cell, threshold: Option<f64>| match (cell.as_f64(), threshold) {
            (Some(value), Some(threshold)) => value < threshold,
            _ => false,
        };
        below(record.bleu, self.min_bleu) || below(record.comet, self.min_comet)
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Trims and lowercases references.
pub fn normalize_references(corpus: &mut ParallelCorpus) {
    for sample in corpus.samples.iter_mut() {
        sample.reference = normalize(&sample.reference);
    }
}

/// Trims and lowercases translations, to be compared with normalized references.
pub fn normalize_hypotheses(hypotheses: &mut [String]) {
    for hypothesis in hypotheses.iter_mut() {
        *hypothesis = normalize(hypothesis);
    }
}

pub struct Benchmark<S: ResultSink> {
    settings: BenchmarkSettings,
    translators: Vec<Box<dyn Translator>>,
    corpora: Vec<Box<dyn Corpus>>,
    scorers: Vec<Box<dyn Scorer>>,
    sink: S,
}

impl<S: ResultSink> Benchmark<S> {
    pub fn new(
        settings: BenchmarkSettings,
        translators: Vec<Box<dyn Translator>>,
        corpora: Vec<Box<dyn Corpus>>,
        scorers: Vec<Box<dyn Scorer>>,
        sink: S,
    ) -> Benchmark<S> {
        Benchmark {
            settings,
            translators,
            corpora,
            scorers,
            sink,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Runs the benchmark. Only failures to write results abort the run.
    pub fn run(&mut self) -> Result<RunSummary, EvalError> {
        let mut summary = RunSummary::new();
        info!("Starting run {}", summary.run_id);
        // each corpus is loaded once per language and shared by all translators
        let mut loaded: HashMap<(usize, Language), Result<ParallelCorpus, String>> =
            HashMap::new();

        for translator in self.translators.iter_mut() {
            let model = translator.name().to_string();
            info!("Evaluating model: {}", model);
            for (corpus_index, corpus) in self.corpora.iter().enumerate() {
                for language in corpus.languages() {
                    if !self.settings.selected(language) {
                        continue;
                    }
                    if !translator.supports(self.settings.source, language) {
                        warn!(
                            "{} does not support {} to {}, skipping",
                            model, self.settings.source, language
                        );
                        continue;
                    }
                    info!("Running {} on {} ({})", model, corpus.name(), language);

                    let sample = loaded
                        .entry((corpus_index, language))
                        .or_insert_with(|| {
                            load_corpus(corpus.as_ref(), &self.settings, language)
                        })
                        .clone();

                    let record = match sample {
                        Err(reason) => {
                            summary.skipped.push(SkippedCorpus {
                                dataset: corpus.name().to_string(),
                                language,
                                reason,
                            });
                            ScoreRecord::filled(&model, corpus.name(), language, Cell::Skipped)
                        }
                        Ok(sample) if sample.is_empty() => {
                            warn!("No data in {} for {}", corpus.name(), language);
                            ScoreRecord::filled(&model, corpus.name(), language, Cell::NotAvailable)
                        }
                        Ok(sample) => evaluate(
                            translator.as_mut(),
                            &self.scorers,
                            &mut self.sink,
                            &model,
                            &self.settings,
                            &sample,
                        )?,
                    };

                    if self.settings.below_threshold(&record) {
                        warn!(
                            "{} on {} ({}) is below the quality threshold: BLEU {}, COMET {}",
                            model, record.dataset, language, record.bleu, record.comet
                        );
                        summary.below_threshold.push(record.clone());
                    }
                    self.sink.write_scores(&record)?;
                    summary.records.push(record);
                }
            }
        }
        summary.finished_at = Some(Utc::now());
        Ok(summary)
    }
}

fn load_corpus(
    corpus: &dyn Corpus,
    settings: &BenchmarkSettings,
    language: Language,
) -> Result<ParallelCorpus, String> {
    match corpus.load(settings.source, language) {
        Ok(mut sample) => {
            if settings.normalize_references {
                normalize_references(&mut sample);
            }
            info!("Loaded {} sentences from {}", sample.len(), corpus.name());
            Ok(sample)
        }
        Err(load_error) => {
            warn!(
                "Skipping {} for {}: {}",
                corpus.name(),
                language,
                load_error
            );
            Err(load_error.to_string())
        }
    }
}

/// Translates and scores one corpus, writing its translations to the sink.
fn evaluate<S: ResultSink>(
    translator: &mut dyn Translator,
    scorers: &[Box<dyn Scorer>],
    sink: &mut S,
    model: &str,
    settings: &BenchmarkSettings,
    corpus: &ParallelCorpus,
) -> Result<ScoreRecord, EvalError> {
    let mut record = ScoreRecord::filled(model, &corpus.dataset, corpus.language, Cell::NotAvailable);
    let sources = corpus.sources();
    let references = corpus.references();

    let mut hypotheses = match translator.translate(&sources, settings.source, corpus.language) {
        Ok(hypotheses) => hypotheses,
        Err(translation_error) => {
            error!(
                "Translation failed for {} on {} ({}): {}",
                model, corpus.dataset, corpus.language, translation_error
            );
            return Ok(ScoreRecord::filled(
                model,
                &corpus.dataset,
                corpus.language,
                Cell::Error,
            ));
        }
    };
    if settings.normalize_references {
        normalize_hypotheses(&mut hypotheses);
    }

    for scorer in scorers {
        let cell = match scorer.corpus_score(&sources, &hypotheses, &references) {
            Ok(score) => {
                info!("{} score: {:.2}", scorer.name(), score);
                Cell::value(score)
            }
            Err(metric_error) => {
                error!("{} failed: {}", scorer.name(), metric_error);
                Cell::Error
            }
        };
        match scorer.name() {
            "BLEU" => record.bleu = cell,
            "chrF" => record.chrf = cell,
            "COMET" => record.comet = cell,
            other => warn!("No column for metric {}", other),
        }
    }

    sink.write_translations(&TranslationRow::from_corpus(model, corpus, &hypotheses))?;
    Ok(record)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::datasets::ParallelSample;

    #[test]
    fn language_selection() {
        let settings = BenchmarkSettings {
            languages: vec![Language::French],
            ..Default::default()
        };
        assert!(settings.selected(Language::French));
        assert!(!settings.selected(Language::German));
        assert!(!BenchmarkSettings::default().selected(Language::English));
        assert!(BenchmarkSettings::default().selected(Language::German));
    }

    #[test]
    fn thresholds_ignore_missing_scores() {
        let settings = BenchmarkSettings {
            min_bleu: Some(25.0),
            min_comet: Some(0.5),
            ..Default::default()
        };
        let mut record = ScoreRecord::filled("m", "WMT", Language::French, Cell::NotAvailable);
        assert!(!settings.below_threshold(&record));
        record.bleu = Cell::value(30.0);
        record.comet = Cell::value(0.4);
        assert!(settings.below_threshold(&record));
        record.comet = Cell::Error;
        assert!(!settings.below_threshold(&record));
    }

    #[test]
    fn reference_normalization() {
        let mut corpus = ParallelCorpus {
            dataset: "WMT".to_string(),
            language: Language::German,
            samples: vec![ParallelSample::new("Hello", "  Guten Tag ")],
        };
        normalize_references(&mut corpus);
        assert_eq!(corpus.samples[0].reference, "guten tag");
        assert_eq!(corpus.samples[0].source, "Hello");

        let mut hypotheses = vec![" Guten TAG".to_string()];
        normalize_hypotheses(&mut hypotheses);
        assert_eq!(hypotheses, vec![corpus.samples[0].reference.clone()]);
    }
}
