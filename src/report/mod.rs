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

//! # Result files
//!
//! A run writes three files to its output directory:
//! - `scores.csv`: one row per model, dataset and language
//! - `translations.csv`: every source sentence with its translation and reference
//! - `results.json` (optional): the score rows of all runs with their run id and start time
//!
//! The CSV files are opened in append mode, so successive runs accumulate in the same tables.

mod writers;

pub use writers::{JsonResults, ScoresWriter, TranslationsWriter};

use crate::common::error::EvalError;
use crate::datasets::ParallelCorpus;
use crate::languages::Language;
use crate::metrics::round2;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::Path;
use uuid::Uuid;

/// Content of a score cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    /// Score rounded to two decimals
    Value(f64),
    /// No data for the language pair, or metric disabled
    NotAvailable,
    /// Translation or scoring failed
    Error,
    /// The dataset could not be loaded
    Skipped,
}

impl Cell {
    pub fn value(score: f64) -> Cell {
        Cell::Value(round2(score))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Value(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Cell::Value(value) => write!(f, "{}", value),
            Cell::NotAvailable => write!(f, "NA"),
            Cell::Error => write!(f, "Error"),
            Cell::Skipped => write!(f, "Skipped"),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Value(value) => serializer.serialize_f64(*value),
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

/// Row of the score table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRecord {
    #[serde(rename = "Model")]
    pub model: String,
    #[serde(rename = "Dataset")]
    pub dataset: String,
    #[serde(rename = "Language")]
    pub language: Language,
    #[serde(rename = "BLEU")]
    pub bleu: Cell,
    #[serde(rename = "chrF")]
    pub chrf: Cell,
    #[serde(rename = "COMET")]
    pub comet: Cell,
}

impl ScoreRecord {
    /// Record with the same cell for every metric
    pub fn filled(model: &str, dataset: &str, language: Language, cell: Cell) -> ScoreRecord {
        ScoreRecord {
            model: model.to_string(),
            dataset: dataset.to_string(),
            language,
            bleu: cell,
            chrf: cell,
            comet: cell,
        }
    }
}

/// Row of the translation dump
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationRow {
    #[serde(rename = "Model")]
    pub model: String,
    #[serde(rename = "Dataset")]
    pub dataset: String,
    #[serde(rename = "Language")]
    pub language: Language,
    #[serde(rename = "Source Sentence")]
    pub source: String,
    #[serde(rename = "Translation")]
    pub translation: String,
    #[serde(rename = "Reference Sentence")]
    pub reference: String,
}

impl TranslationRow {
    pub fn from_corpus(
        model: &str,
        corpus: &ParallelCorpus,
        translations: &[String],
    ) -> Vec<TranslationRow> {
        corpus
            .samples
            .iter()
            .zip(translations.iter())
            .map(|(sample, translation)| TranslationRow {
                model: model.to_string(),
                dataset: corpus.dataset.clone(),
                language: corpus.language,
                source: sample.source.clone(),
                translation: translation.clone(),
                reference: sample.reference.clone(),
            })
            .collect()
    }
}

/// Entry of the JSON results file
#[derive(Debug, Clone, Serialize)]
pub struct JsonRecord<'a> {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub model: &'a str,
    pub dataset: &'a str,
    pub language: Language,
    pub bleu: Cell,
    pub chrf: Cell,
    pub comet: Cell,
}

impl<'a> JsonRecord<'a> {
    pub fn new(run_id: Uuid, started_at: DateTime<Utc>, record: &'a ScoreRecord) -> JsonRecord<'a> {
        JsonRecord {
            run_id,
            started_at,
            model: &record.model,
            dataset: &record.dataset,
            language: record.language,
            bleu: record.bleu,
            chrf: record.chrf,
            comet: record.comet,
        }
    }
}

/// # Destination of benchmark results
pub trait ResultSink {
    fn write_scores(&mut self, record: &ScoreRecord) -> Result<(), EvalError>;

    fn write_translations(&mut self, rows: &[TranslationRow]) -> Result<(), EvalError>;
}

/// Writes results to `scores.csv` and `translations.csv` in an output directory
pub struct FileSink {
    scores: ScoresWriter,
    translations: TranslationsWriter,
}

impl FileSink {
    pub const SCORES_FILE: &'static str = "scores.csv";
    pub const TRANSLATIONS_FILE: &'static str = "translations.csv";

    pub fn new(output_dir: &Path) -> Result<FileSink, EvalError> {
        Ok(FileSink {
            scores: ScoresWriter::append(&output_dir.join(Self::SCORES_FILE))?,
            translations: TranslationsWriter::append(&output_dir.join(Self::TRANSLATIONS_FILE))?,
        })
    }
}

impl ResultSink for FileSink {
    fn write_scores(&mut self, record: &ScoreRecord) -> Result<(), EvalError> {
        self.scores.write(record)
    }

    fn write_translations(&mut self, rows: &[TranslationRow]) -> Result<(), EvalError> {
        self.translations.write_all(rows)
    }
}

/// Keeps results in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub scores: Vec<ScoreRecord>,
    pub translations: Vec<TranslationRow>,
}

impl ResultSink for MemorySink {
    fn write_scores(&mut self, record: &ScoreRecord) -> Result<(), EvalError> {
        self.scores.push(record.clone());
        Ok(())
    }

    fn write_translations(&mut self, rows: &[TranslationRow]) -> Result<(), EvalError> {
        self.translations.extend_from_slice(rows);
        Ok(())
    }
}

impl<T: ResultSink + ?Sized> ResultSink for &mut T {
    fn write_scores(&mut self, record: &ScoreRecord) -> Result<(), EvalError> {
        (**self).write_scores(record)
    }

    fn write_translations(&mut self, rows: &[TranslationRow]) -> Result<(), EvalError> {
        (**self).write_translations(rows)
    }
}
