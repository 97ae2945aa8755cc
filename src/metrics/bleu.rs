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
use crate::metrics::tokenizer::Tokenizer13a;
use crate::metrics::{check_lengths, Scorer};
use std::collections::HashMap;
use std::fmt;

pub const MAX_NGRAM_ORDER: usize = 4;

/// Stand-in for log(0), as in sacreBLEU
const LOG_ZERO: f64 = -9999999999.0;

/// # Corpus BLEU
/// Computes sacreBLEU-compatible corpus BLEU: 13a tokenization, clipped n-gram counts up to
/// 4-grams, `exp` smoothing of zero counts and brevity penalty over the whole corpus.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bleu {
    tokenizer: Tokenizer13a,
}

/// BLEU score with the statistics it was computed from
#[derive(Debug, Clone, PartialEq)]
pub struct BleuScore {
    pub score: f64,
    pub precisions: [f64; MAX_NGRAM_ORDER],
    pub brevity_penalty: f64,
    pub correct: [u64; MAX_NGRAM_ORDER],
    pub total: [u64; MAX_NGRAM_ORDER],
    pub sys_len: u64,
    pub ref_len: u64,
}

impl fmt::Display for BleuScore {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let ratio = if self.ref_len > 0 {
            self.sys_len as f64 / self.ref_len as f64
        } else {
            0.0
        };
        write!(
            f,
            "BLEU = {:.2} {:.1}/{:.1}/{:.1}/{:.1} (BP = {:.3} ratio = {:.3} hyp_len = {} ref_len = {})",
            self.score,
            self.precisions[0],
            self.precisions[1],
            self.precisions[2],
            self.precisions[3],
            self.brevity_penalty,
            ratio,
            self.sys_len,
            self.ref_len
        )
    }
}

fn ngram_counts(words: &[String], order: usize) -> HashMap<&[String], u64> {
    let mut counts = HashMap::new();
    if words.len() >= order {
        for ngram in words.windows(order) {
            *counts.entry(ngram).or_insert(0) += 1;
        }
    }
    counts
}

impl Bleu {
    pub fn new(lowercase: bool) -> Bleu {
        Bleu {
            tokenizer: Tokenizer13a::new(lowercase),
        }
    }

    /// Computes corpus BLEU of `hypotheses` against one reference per hypothesis.
    pub fn corpus_bleu<H, R>(&self, hypotheses: &[H], references: &[R]) -> Result<BleuScore, EvalError>
    where
        H: AsRef<str>,
        R: AsRef<str>,
    {
        if hypotheses.len() != references.len() {
            return Err(EvalError::MetricError(format!(
                "{} hypotheses for {} references",
                hypotheses.len(),
                references.len()
            )));
        }

        let mut correct = [0u64; MAX_NGRAM_ORDER];
        let mut total = [0u64; MAX_NGRAM_ORDER];
        let (mut sys_len, mut ref_len) = (0u64, 0u64);

        for (hypothesis, reference) in hypotheses.iter().zip(references.iter()) {
            let hypothesis_words = self.tokenizer.words(hypothesis.as_ref());
            let reference_words = self.tokenizer.words(reference.as_ref());
            sys_len += hypothesis_words.len() as u64;
            ref_len += reference_words.len() as u64;

            for order in 1..=MAX_NGRAM_ORDER {
                let reference_counts = ngram_counts(&reference_words, order);
                for (ngram, count) in ngram_counts(&hypothesis_words, order) {
                    let reference_count = reference_counts.get(ngram).copied().unwrap_or(0);
                    correct[order - 1] += count.min(reference_count);
                    total[order - 1] += count;
                }
            }
        }

        Ok(Self::compute(correct, total, sys_len, ref_len))
    }

    fn compute(
        correct: [u64; MAX_NGRAM_ORDER],
        total: [u64; MAX_NGRAM_ORDER],
        sys_len: u64,
        ref_len: u64,
    ) -> BleuScore {
        let brevity_penalty = if sys_len < ref_len {
            if sys_len > 0 {
                (1.0 - ref_len as f64 / sys_len as f64).exp()
            } else {
                0.0
            }
        } else {
            1.0
        };

        if correct.iter().all(|&count| count == 0) {
            return BleuScore {
                score: 0.0,
                precisions: [0.0; MAX_NGRAM_ORDER],
                brevity_penalty,
                correct,
                total,
                sys_len,
                ref_len,
            };
        }

        let mut precisions = [0.0; MAX_NGRAM_ORDER];
        let mut smooth_mteval = 1.0;
        for order in 0..MAX_NGRAM_ORDER {
            if total[order] == 0 {
                break;
            }
            precisions[order] = if correct[order] == 0 {
                smooth_mteval *= 2.0;
                100.0 / (smooth_mteval * total[order] as f64)
            } else {
                100.0 * correct[order] as f64 / total[order] as f64
            };
        }

        let log_sum: f64 = precisions
            .iter()
            .map(|&precision| {
                if precision == 0.0 {
                    LOG_ZERO
                } else {
                    precision.ln()
                }
            })
            .sum();
        let score = brevity_penalty * (log_sum / MAX_NGRAM_ORDER as f64).exp();

        BleuScore {
            score,
            precisions,
            brevity_penalty,
            correct,
            total,
            sys_len,
            ref_len,
        }
    }
}

impl Scorer for Bleu {
    fn name(&self) -> &'static str {
        "BLEU"
    }

    fn corpus_score(
        &self,
        sources: &[String],
        hypotheses: &[String],
        references: &[String],
    ) -> Result<f64, EvalError> {
        check_lengths(sources, hypotheses, references)?;
        Ok(self.corpus_bleu(hypotheses, references)?.score)
    }
}
