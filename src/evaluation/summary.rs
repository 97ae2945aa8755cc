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

use crate::languages::Language;
use crate::report::{JsonRecord, ScoreRecord};
use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Dataset that could not be loaded for a language
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedCorpus {
    pub dataset: String,
    pub language: Language,
    pub reason: String,
}

/// Outcome of a benchmark run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Every row written to the score table, in order
    pub records: Vec<ScoreRecord>,
    /// Rows scoring below the configured BLEU or COMET thresholds
    pub below_threshold: Vec<ScoreRecord>,
    pub skipped: Vec<SkippedCorpus>,
}

impl RunSummary {
    pub fn new() -> RunSummary {
        RunSummary {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            records: Vec::new(),
            below_threshold: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Models ranked by mean BLEU over their scored combinations
    pub fn leaderboard(&self) -> Vec<(String, f64)> {
        let mut totals: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
        for record in &self.records {
            if let Some(bleu) = record.bleu.as_f64() {
                let entry = totals.entry(record.model.as_str()).or_insert((0.0, 0));
                entry.0 += bleu;
                entry.1 += 1;
            }
        }
        let mut ranking: Vec<(String, f64)> = totals
            .into_iter()
            .map(|(model, (sum, count))| (model.to_string(), sum / count as f64))
            .collect();
        ranking.sort_by_key(|(_, mean)| std::cmp::Reverse(OrderedFloat(*mean)));
        ranking
    }

    /// Rows of the JSON results file for this run
    pub fn json_records(&self) -> Vec<JsonRecord<'_>> {
        self.records
            .iter()
            .map(|record| JsonRecord::new(self.run_id, self.started_at, record))
            .collect()
    }
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}
