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

//! # Translation quality metrics
//!
//! Corpus-level BLEU and chrF (compatible with sacreBLEU defaults) are computed in-process.
//! COMET is delegated to the `comet-score` program.
//!
//! ```
//! use mt_eval::metrics::{Bleu, Scorer};
//!
//! let bleu = Bleu::new(false);
//! let hypotheses = vec!["The cat sat on the mat.".to_string()];
//! let references = vec!["The cat sat on the mat.".to_string()];
//! let score = bleu.corpus_bleu(&hypotheses, &references)?;
//! assert!((score.score - 100.0).abs() < 1e-9);
//! # Ok::<(), mt_eval::EvalError>(())
//! ```

mod bleu;
mod chrf;
mod comet;
mod tokenizer;

pub use bleu::{Bleu, BleuScore, MAX_NGRAM_ORDER};
pub use chrf::ChrF;
pub use comet::{parse_system_score, Comet, DEFAULT_COMET_MODEL};
pub use tokenizer::Tokenizer13a;

use crate::common::error::EvalError;

/// # Corpus-level scorer
pub trait Scorer {
    /// Column name in reports
    fn name(&self) -> &'static str;

    /// Scores `hypotheses` against `references`. The three slices are aligned sentence by
    /// sentence; sources are only used by metrics that need them.
    fn corpus_score(
        &self,
        sources: &[String],
        hypotheses: &[String],
        references: &[String],
    ) -> Result<f64, EvalError>;
}

pub(crate) fn check_lengths(
    sources: &[String],
    hypotheses: &[String],
    references: &[String],
) -> Result<(), EvalError> {
    if hypotheses.is_empty() {
        return Err(EvalError::MetricError(
            "cannot score an empty corpus".to_string(),
        ));
    }
    if sources.len() != hypotheses.len() || hypotheses.len() != references.len() {
        return Err(EvalError::MetricError(format!(
            "misaligned corpus: {} sources, {} hypotheses, {} references",
            sources.len(),
            hypotheses.len(),
            references.len()
        )));
    }
    Ok(())
}

/// Rounds a score to two decimals, as written in reports.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
