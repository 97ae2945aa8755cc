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

//! # mt-eval
//!
//! Benchmark harness for machine translation systems. English sentences sampled from public
//! parallel corpora are translated by each system under evaluation and scored against human
//! references with BLEU, chrF and COMET.
//!
//! - Systems: Marian (opus-mt), M2M100, NLLB-200 and mBART-50 through the
//!   [rust-bert](https://github.com/guillaume-be/rust-bert) translation pipelines, chat models
//!   behind an OpenAI-compatible API (ChatGPT, Mistral, TowerInstruct), Gemini and Google Cloud
//!   Translation.
//! - Corpora: WMT24++, TED Talks, TED IWSLT, Europarl, OPUS Books, OPUS-100 and the Montenegrin
//!   subtitles corpus, read from the Hugging Face Hub and cached locally.
//! - Metrics: sacreBLEU-compatible BLEU and chrF, COMET through the `comet-score` program.
//!
//! Results are appended to CSV tables (scores and translations) and optionally to a JSON file.
//!
//! ## Usage
//!
//! The `mt-eval` binary drives a run from a configuration file (see `EvalConfig`). The library
//! exposes the same building blocks:
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! use mt_eval::datasets::{build_corpus, default_row_source, DatasetKind};
//! use mt_eval::evaluation::Benchmark;
//! use mt_eval::report::MemorySink;
//! use mt_eval::translators::{build_translator, ModelSpec, NllbSize};
//! use mt_eval::EvalConfig;
//!
//! let config = EvalConfig {
//!     datasets: vec![DatasetKind::Europarl],
//!     models: vec![ModelSpec::Nllb {
//!         size: NllbSize::Distilled600M,
//!     }],
//!     ..Default::default()
//! };
//!
//! let dataset_settings = config.dataset_settings();
//! let rows = default_row_source(&dataset_settings);
//! let corpora = config
//!     .datasets
//!     .iter()
//!     .map(|kind| build_corpus(*kind, &dataset_settings, rows.clone()))
//!     .collect();
//! let translators = config
//!     .models
//!     .iter()
//!     .map(|spec| build_translator(spec, &config.generation))
//!     .collect::<Result<Vec<_>, _>>()?;
//!
//! let mut benchmark = Benchmark::new(
//!     config.benchmark_settings(),
//!     translators,
//!     corpora,
//!     config.metrics.scorers(),
//!     MemorySink::default(),
//! );
//! let summary = benchmark.run()?;
//! for (model, bleu) in summary.leaderboard() {
//!     println!("{model}: {bleu:.2}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Loading the models
//!
//! The local models require libtorch, as described in the `tch` crate documentation. Model
//! weights are downloaded by rust-bert to `~/.cache/.rustbert` (or `RUSTBERT_CACHE`), dataset
//! files to `~/.cache/.mteval` (or `MTEVAL_CACHE`).

mod common;
pub mod config;
pub mod datasets;
pub mod evaluation;
pub mod languages;
pub mod metrics;
pub mod report;
pub mod translators;

pub use common::error::EvalError;
pub use common::resources;
pub use config::EvalConfig;
pub use languages::Language;
