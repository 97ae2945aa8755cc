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
use crate::metrics::{check_lengths, Scorer};
use std::collections::HashMap;

const EPSILON: f64 = 1e-16;

/// # Character n-gram F-score
/// Corpus-level chrF as computed by sacreBLEU: character n-grams up to `char_order` with
/// whitespace removed, statistics summed over the corpus, recall weighted by `beta`.
#[derive(Debug, Clone, Copy)]
pub struct ChrF {
    pub char_order: usize,
    pub beta: f64,
}

impl Default for ChrF {
    fn default() -> Self {
        ChrF {
            char_order: 6,
            beta: 2.0,
        }
    }
}

/// Matching, hypothesis and reference n-gram counts for one order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct OrderStatistics {
    matching: u64,
    hypothesis: u64,
    reference: u64,
}

fn char_ngrams(chars: &[char], order: usize) -> HashMap<&[char], u64> {
    let mut counts = HashMap::new();
    if chars.len() >= order {
        for ngram in chars.windows(order) {
            *counts.entry(ngram).or_insert(0) += 1;
        }
    }
    counts
}

impl ChrF {
    fn statistics(&self, hypothesis: &str, reference: &str) -> Vec<OrderStatistics> {
        let hypothesis: Vec<char> = hypothesis.chars().filter(|c| !c.is_whitespace()).collect();
        let reference: Vec<char> = reference.chars().filter(|c| !c.is_whitespace()).collect();

        (1..=self.char_order)
            .map(|order| {
                let hypothesis_counts = char_ngrams(&hypothesis, order);
                let reference_counts = char_ngrams(&reference, order);
                let matching = hypothesis_counts
                    .iter()
                    .map(|(ngram, count)| {
                        (*count).min(reference_counts.get(ngram).copied().unwrap_or(0))
                    })
                    .sum();
                OrderStatistics {
                    matching,
                    hypothesis: hypothesis_counts.values().sum(),
                    reference: reference_counts.values().sum(),
                }
            })
            .collect()
    }

    fn f_score(&self, statistics: &[OrderStatistics]) -> f64 {
        let mut precision = 0.0;
        let mut recall = 0.0;
        let mut effective_order = 0;
        for order in statistics {
            let order_precision = if order.hypothesis > 0 {
                order.matching as f64 / order.hypothesis as f64
            } else {
                EPSILON
            };
            let order_recall = if order.reference > 0 {
                order.matching as f64 / order.reference as f64
            } else {
                EPSILON
            };
            precision += order_precision;
            recall += order_recall;
            if order.hypothesis > 0 && order.reference > 0 {
                effective_order += 1;
            }
        }
        if effective_order == 0 {
            return 0.0;
        }
        precision /= effective_order as f64;
        recall /= effective_order as f64;
        if precision + recall == 0.0 {
            return 0.0;
        }
        let beta_squared = self.beta * self.beta;
        100.0 * (1.0 + beta_squared) * precision * recall / (beta_squared * precision + recall)
    }

    /// Computes corpus chrF of `hypotheses` against one reference per hypothesis.
    pub fn corpus_chrf<H, R>(&self, hypotheses: &[H], references: &[R]) -> Result<f64, EvalError>
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
        let mut totals = vec![OrderStatistics::default(); self.char_order];
        for (hypothesis, reference) in hypotheses.iter().zip(references.iter()) {
            for (total, order) in totals
                .iter_mut()
                .zip(self.statistics(hypothesis.as_ref(), reference.as_ref()))
            {
                total.matching += order.matching;
                total.hypothesis += order.hypothesis;
                total.reference += order.reference;
            }
        }
        Ok(self.f_score(&totals))
    }
}

impl Scorer for ChrF {
    fn name(&self) -> &'static str {
        "chrF"
    }

    fn corpus_score(
        &self,
        sources: &[String],
        hypotheses: &[String],
        references: &[String],
    ) -> Result<f64, EvalError> {
        check_lengths(sources, hypotheses, references)?;
        self.corpus_chrf(hypotheses, references)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn whitespace_is_ignored() {
        let chrf = ChrF::default();
        let score = chrf.corpus_chrf(&["a b c"], &["abc"]).unwrap();
        assert!((score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_strings_score_zero() {
        let chrf = ChrF::default();
        assert_eq!(chrf.corpus_chrf(&["xyz"], &["abc"]).unwrap(), 0.0);
        assert_eq!(chrf.corpus_chrf(&[""], &["abc"]).unwrap(), 0.0);
    }

    #[test]
    fn short_strings_use_effective_order() {
        let chrf = ChrF::default();
        let statistics = chrf.statistics("ab", "ab");
        assert_eq!(statistics[0].matching, 2);
        assert_eq!(statistics[1].matching, 1);
        assert_eq!(statistics[2].hypothesis, 0);
        let score = chrf.f_score(&statistics);
        assert!((score - 100.0).abs() < 1e-6);
    }
}
