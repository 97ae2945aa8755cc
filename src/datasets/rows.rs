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
use crate::common::resources::cached_file;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Maximum number of rows served by a single datasets-server `/rows` request.
pub const PAGE_SIZE: usize = 100;

/// A (configuration, split) pair available for a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SplitInfo {
    pub config: String,
    pub split: String,
}

/// A page of rows, along with the total number of rows of the split.
#[derive(Debug, Clone, PartialEq)]
pub struct RowsPage {
    pub rows: Vec<Value>,
    pub num_rows_total: usize,
}

/// # Paged access to the rows of a Hugging Face dataset
pub trait RowSource {
    /// Lists the configurations and splits of a dataset.
    fn splits(&self, dataset: &str) -> Result<Vec<SplitInfo>, EvalError>;

    /// Returns up to `length` rows starting at `offset`. Rows are the raw JSON objects of the
    /// dataset (e.g. `{"translation": {"en": "...", "fr": "..."}}`).
    fn rows(
        &self,
        dataset: &str,
        config: &str,
        split: &str,
        offset: usize,
        length: usize,
    ) -> Result<RowsPage, EvalError>;
}

/// # Hugging Face datasets-server client
/// Responses are downloaded through the resource cache, so repeated runs do not hit the network.
#[derive(Debug, Clone)]
pub struct DatasetsServer {
    base_url: String,
}

#[derive(Deserialize)]
struct SplitsResponse {
    splits: Vec<SplitInfo>,
}

#[derive(Deserialize)]
struct RowEntry {
    row: Value,
}

#[derive(Deserialize)]
struct RowsResponse {
    rows: Vec<RowEntry>,
    num_rows_total: usize,
}

impl Default for DatasetsServer {
    fn default() -> Self {
        DatasetsServer::new("https://datasets-server.huggingface.co")
    }
}

impl DatasetsServer {
    pub fn new(base_url: &str) -> DatasetsServer {
        DatasetsServer {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str, params: &[(&str, String)]) -> Result<Url, EvalError> {
        Url::parse_with_params(&format!("{}/{}", self.base_url, path), params).map_err(|e| {
            EvalError::InvalidConfigurationError(format!("invalid datasets-server URL: {}", e))
        })
    }

    fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        url: &Url,
        dataset: &str,
    ) -> Result<T, EvalError> {
        let cache_subdir = format!("datasets-server/{}", dataset.replace('/', "--"));
        let path = cached_file(url.as_str(), &cache_subdir)?;
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl RowSource for DatasetsServer {
    fn splits(&self, dataset: &str) -> Result<Vec<SplitInfo>, EvalError> {
        let url = self.endpoint("splits", &[("dataset", dataset.to_string())])?;
        let response: SplitsResponse = self.fetch(&url, dataset)?;
        Ok(response.splits)
    }

    fn rows(
        &self,
        dataset: &str,
        config: &str,
        split: &str,
        offset: usize,
        length: usize,
    ) -> Result<RowsPage, EvalError> {
        let url = self.endpoint(
            "rows",
            &[
                ("dataset", dataset.to_string()),
                ("config", config.to_string()),
                ("split", split.to_string()),
                ("offset", offset.to_string()),
                ("length", length.min(PAGE_SIZE).to_string()),
            ],
        )?;
        let response: RowsResponse = self.fetch(&url, dataset)?;
        Ok(RowsPage {
            rows: response.rows.into_iter().map(|entry| entry.row).collect(),
            num_rows_total: response.num_rows_total,
        })
    }
}

/// # Local mirror of dataset rows
/// Rows are read from `<root>/<dataset>/<config>/<split>.jsonl`, where `/` in the dataset
/// identifier is replaced by `--` (e.g. `data/Helsinki-NLP--europarl/en-fr/train.jsonl`).
#[derive(Debug, Clone)]
pub struct JsonlRowSource {
    root: PathBuf,
}

impl JsonlRowSource {
    pub fn new(root: impl Into<PathBuf>) -> JsonlRowSource {
        JsonlRowSource { root: root.into() }
    }

    fn dataset_dir(&self, dataset: &str) -> PathBuf {
        self.root.join(dataset.replace('/', "--"))
    }
}

impl RowSource for JsonlRowSource {
    fn splits(&self, dataset: &str) -> Result<Vec<SplitInfo>, EvalError> {
        let dataset_dir = self.dataset_dir(dataset);
        if !dataset_dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut splits = Vec::new();
        for config_entry in fs::read_dir(&dataset_dir)? {
            let config_path = config_entry?.path();
            if !config_path.is_dir() {
                continue;
            }
            let config = file_stem(&config_path);
            for split_entry in fs::read_dir(&config_path)? {
                let split_path = split_entry?.path();
                if split_path.extension().and_then(|ext| ext.to_str()) == Some("jsonl") {
                    splits.push(SplitInfo {
                        config: config.clone(),
                        split: file_stem(&split_path),
                    });
                }
            }
        }
        splits.sort_by(|a, b| (&a.config, &a.split).cmp(&(&b.config, &b.split)));
        Ok(splits)
    }

    fn rows(
        &self,
        dataset: &str,
        config: &str,
        split: &str,
        offset: usize,
        length: usize,
    ) -> Result<RowsPage, EvalError> {
        let path = self
            .dataset_dir(dataset)
            .join(config)
            .join(format!("{}.jsonl", split));
        let rows = read_jsonl(&path)?;
        let num_rows_total = rows.len();
        Ok(RowsPage {
            rows: rows.into_iter().skip(offset).take(length).collect(),
            num_rows_total,
        })
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Reads a JSON-lines file, skipping blank lines.
pub fn read_jsonl(path: &Path) -> Result<Vec<Value>, EvalError> {
    let file = fs::File::open(path).map_err(|e| {
        EvalError::DatasetError(format!("could not open {}: {}", path.display(), e))
    })?;
    let mut rows = Vec::new();
    for (line_number, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row = serde_json::from_str(&line).map_err(|e| {
            EvalError::DatasetError(format!(
                "{}:{}: invalid JSON row: {}",
                path.display(),
                line_number + 1,
                e
            ))
        })?;
        rows.push(row);
    }
    Ok(rows)
}
