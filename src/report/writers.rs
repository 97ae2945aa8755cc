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
use crate::report::{ScoreRecord, TranslationRow};
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Opens `path` for appending, creating parent directories. Returns whether the file was empty.
fn open_append(path: &Path) -> Result<(File, bool), EvalError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let is_new = fs::metadata(path).map(|meta| meta.len() == 0).unwrap_or(true);
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok((file, is_new))
}

/// Appends records to a CSV file, writing the header only when the file starts empty.
struct AppendingCsv {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl AppendingCsv {
    fn open(path: &Path) -> Result<AppendingCsv, EvalError> {
        let (file, is_new) = open_append(path)?;
        let writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);
        Ok(AppendingCsv {
            path: path.to_path_buf(),
            writer,
        })
    }
}

/// # Score table
/// `Model,Dataset,Language,BLEU,chrF,COMET`, flushed after every row so that an interrupted
/// run keeps its results.
pub struct ScoresWriter {
    csv: AppendingCsv,
}

impl ScoresWriter {
    pub fn append(path: &Path) -> Result<ScoresWriter, EvalError> {
        Ok(ScoresWriter {
            csv: AppendingCsv::open(path)?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.csv.path
    }

    pub fn write(&mut self, record: &ScoreRecord) -> Result<(), EvalError> {
        self.csv.writer.serialize(record)?;
        self.csv.writer.flush()?;
        Ok(())
    }
}

/// # Translation dump
/// `Model,Dataset,Language,Source Sentence,Translation,Reference Sentence`, flushed after each
/// corpus.
pub struct TranslationsWriter {
    csv: AppendingCsv,
}

impl TranslationsWriter {
    pub fn append(path: &Path) -> Result<TranslationsWriter, EvalError> {
        Ok(TranslationsWriter {
            csv: AppendingCsv::open(path)?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.csv.path
    }

    pub fn write_all(&mut self, rows: &[TranslationRow]) -> Result<(), EvalError> {
        for row in rows {
            self.csv.writer.serialize(row)?;
        }
        self.csv.writer.flush()?;
        Ok(())
    }
}

/// # JSON results file
/// A JSON array extended by every run. A missing or unreadable file counts as empty.
#[derive(Debug, Clone)]
pub struct JsonResults {
    path: PathBuf,
}

impl JsonResults {
    pub fn new(path: impl Into<PathBuf>) -> JsonResults {
        JsonResults { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries currently stored in the file
    pub fn read(&self) -> Vec<Value> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return Vec::new(),
        };
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Array(entries)) => entries,
            Ok(_) | Err(_) => {
                warn!(
                    "{} does not hold a JSON array, starting a new one",
                    self.path.display()
                );
                Vec::new()
            }
        }
    }

    pub fn append<T: Serialize>(&self, records: &[T]) -> Result<(), EvalError> {
        let mut entries = self.read();
        for record in records {
            entries.push(serde_json::to_value(record)?);
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(&entries)?)?;
        Ok(())
    }
}
