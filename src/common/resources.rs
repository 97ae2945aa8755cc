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

//! # Dataset file resources
//!
//! Dataset files and datasets-server responses are accessed through resources, in the same way
//! model weights are handled by `rust_bert::resources`:
//! - `LocalDataFile`: points to a local file
//! - `RemoteDataFile`: points to a remote file via a URL, downloaded and cached on first access
//!
//! The cache root is `$MTEVAL_CACHE` when set, `<user cache dir>/.mteval` otherwise.

use crate::common::error::EvalError;
use cached_path::{Cache, Options, ProgressBar};
use dirs::cache_dir;
use lazy_static::lazy_static;
use std::path::PathBuf;

/// # Trait for dataset files that can be resolved to a local path
pub trait DataFile {
    /// Provides the local path for a data file, downloading it first if needed.
    fn local_path(&self) -> Result<PathBuf, EvalError>;
}

/// # Local data file
#[derive(Debug, PartialEq, Clone)]
pub struct LocalDataFile {
    /// Local path for the resource
    pub local_path: PathBuf,
}

impl DataFile for LocalDataFile {
    fn local_path(&self) -> Result<PathBuf, EvalError> {
        if self.local_path.is_file() {
            Ok(self.local_path.clone())
        } else {
            Err(EvalError::IOError(format!(
                "{} does not exist",
                self.local_path.display()
            )))
        }
    }
}

/// # Remote data file that will be downloaded and cached locally on demand
#[derive(Debug, PartialEq, Clone)]
pub struct RemoteDataFile {
    /// Remote path/url for the resource
    pub url: String,
    /// Local subdirectory of the cache root where this resource is saved
    pub cache_subdir: String,
}

impl RemoteDataFile {
    /// Declares a remote file, without downloading it.
    ///
    /// # Arguments
    ///
    /// * `url` - `&str` Location of the remote resource
    /// * `cache_subdir` - `&str` Local subdirectory of the cache root to save the resource to
    pub fn new(url: &str, cache_subdir: &str) -> RemoteDataFile {
        RemoteDataFile {
            url: url.to_string(),
            cache_subdir: cache_subdir.to_string(),
        }
    }

    /// Declares a file hosted in a Hugging Face Hub dataset repository.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use mt_eval::resources::RemoteDataFile;
    /// let wmt_file = RemoteDataFile::from_hub_dataset("google/wmt24pp", "en-de_DE.jsonl");
    /// assert_eq!(
    ///     wmt_file.url,
    ///     "https://huggingface.co/datasets/google/wmt24pp/resolve/main/en-de_DE.jsonl"
    /// );
    /// ```
    pub fn from_hub_dataset(repository: &str, file_name: &str) -> RemoteDataFile {
        RemoteDataFile {
            url: format!(
                "https://huggingface.co/datasets/{}/resolve/main/{}",
                repository, file_name
            ),
            cache_subdir: repository.replace('/', "--"),
        }
    }
}

impl DataFile for RemoteDataFile {
    fn local_path(&self) -> Result<PathBuf, EvalError> {
        cached_file(&self.url, &self.cache_subdir)
    }
}

/// Downloads (once) and returns the local location of `url` under `cache_subdir`.
pub fn cached_file(url: &str, cache_subdir: &str) -> Result<PathBuf, EvalError> {
    let cache = CACHE
        .as_ref()
        .map_err(|message| EvalError::DownloadError(message.clone()))?;
    Ok(cache.cached_path_with_options(url, &Options::default().subdir(cache_subdir))?)
}

lazy_static! {
    /// # Global cache directory
    /// If the environment variable `MTEVAL_CACHE` is set, dataset files are cached at that
    /// location. Otherwise defaults to `$XDG_CACHE_HOME/.mteval`, or the corresponding user
    /// cache for the current system.
    static ref CACHE: Result<Cache, String> = Cache::builder()
        .dir(get_cache_directory())
        .progress_bar(Some(ProgressBar::Light))
        .build()
        .map_err(|error| error.to_string());
}

fn get_cache_directory() -> PathBuf {
    match std::env::var("MTEVAL_CACHE") {
        Ok(value) => PathBuf::from(value),
        Err(_) => {
            let mut home = cache_dir().unwrap_or_else(std::env::temp_dir);
            home.push(".mteval");
            home
        }
    }
}
