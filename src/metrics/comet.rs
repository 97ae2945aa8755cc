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
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;
use tracing::debug;

pub const DEFAULT_COMET_MODEL: &str = "Unbabel/wmt22-comet-da";

/// # COMET
/// Neural metric scored by the `comet-score` program of the Unbabel COMET package. Sources,
/// hypotheses and references are written to temporary files, one segment per line, and the
/// system-level score is read back from the program output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Comet {
    /// Executable, looked up on `PATH` unless absolute
    pub program: String,
    pub model: String,
    pub batch_size: usize,
    pub gpus: usize,
}

impl Default for Comet {
    fn default() -> Self {
        Comet {
            program: "comet-score".to_string(),
            model: DEFAULT_COMET_MODEL.to_string(),
            batch_size: 8,
            gpus: 1,
        }
    }
}

fn lines_file(lines: &[String]) -> Result<NamedTempFile, EvalError> {
    let mut file = NamedTempFile::new()?;
    for line in lines {
        // one segment per line
        writeln!(file, "{}", line.replace(['\n', '\r'], " "))?;
    }
    file.flush()?;
    Ok(file)
}

/// Extracts the system score from `comet-score --only_system` output (`<file>\tscore: 0.8123`).
pub fn parse_system_score(output: &str) -> Result<f64, EvalError> {
    output
        .lines()
        .rev()
        .find_map(|line| {
            let (_, value) = line.rsplit_once("score:")?;
            value.trim().parse::<f64>().ok()
        })
        .ok_or_else(|| {
            EvalError::MetricError(format!(
                "no system score in comet-score output: {}",
                output.trim()
            ))
        })
}

impl Scorer for Comet {
    fn name(&self) -> &'static str {
        "COMET"
    }

    fn corpus_score(
        &self,
        sources: &[String],
        hypotheses: &[String],
        references: &[String],
    ) -> Result<f64, EvalError> {
        check_lengths(sources, hypotheses, references)?;
        let source_file = lines_file(sources)?;
        let hypothesis_file = lines_file(hypotheses)?;
        let reference_file = lines_file(references)?;

        debug!("Running {} with {}", self.program, self.model);
        let output = Command::new(&self.program)
            .arg("-s")
            .arg(source_file.path())
            .arg("-t")
            .arg(hypothesis_file.path())
            .arg("-r")
            .arg(reference_file.path())
            .args(["--model", &self.model])
            .args(["--batch_size", &self.batch_size.to_string()])
            .args(["--gpus", &self.gpus.to_string()])
            .args(["--quiet", "--only_system"])
            .output()
            .map_err(|error| {
                EvalError::MetricError(format!("could not run {}: {}", self.program, error))
            })?;

        if !output.status.success() {
            return Err(EvalError::MetricError(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        parse_system_score(&String::from_utf8_lossy(&output.stdout))
    }
}
