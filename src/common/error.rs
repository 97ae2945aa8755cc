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

use rust_bert::RustBertError;
use tch::TchError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Dataset error: {0}")]
    DatasetError(String),

    #[error("Endpoint not available error: {0}")]
    DownloadError(String),

    #[error("IO error: {0}")]
    IOError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid configuration error: {0}")]
    InvalidConfigurationError(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Translation error: {0}")]
    TranslationError(String),

    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Metric error: {0}")]
    MetricError(String),

    #[error("Pipeline error: {0}")]
    PipelineError(String),
}

impl From<RustBertError> for EvalError {
    fn from(error: RustBertError) -> Self {
        EvalError::PipelineError(error.to_string())
    }
}

impl From<TchError> for EvalError {
    fn from(error: TchError) -> Self {
        EvalError::PipelineError(error.to_string())
    }
}

impl From<std::io::Error> for EvalError {
    fn from(error: std::io::Error) -> Self {
        EvalError::IOError(error.to_string())
    }
}

impl From<reqwest::Error> for EvalError {
    fn from(error: reqwest::Error) -> Self {
        EvalError::DownloadError(error.to_string())
    }
}

impl From<cached_path::Error> for EvalError {
    fn from(error: cached_path::Error) -> Self {
        EvalError::DownloadError(error.to_string())
    }
}

impl From<serde_json::Error> for EvalError {
    fn from(error: serde_json::Error) -> Self {
        EvalError::SerializationError(error.to_string())
    }
}

impl From<csv::Error> for EvalError {
    fn from(error: csv::Error) -> Self {
        EvalError::IOError(error.to_string())
    }
}

impl From<figment::Error> for EvalError {
    fn from(error: figment::Error) -> Self {
        EvalError::InvalidConfigurationError(error.to_string())
    }
}
