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

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use mt_eval::datasets::{build_corpus, default_row_source, DatasetKind};
use mt_eval::evaluation::Benchmark;
use mt_eval::metrics::{Bleu, ChrF, Comet, Scorer};
use mt_eval::report::{FileSink, JsonResults};
use mt_eval::translators::build_translator;
use mt_eval::{EvalConfig, Language};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Machine translation benchmark harness
#[derive(Parser, Debug)]
#[command(name = "mt-eval", version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only report errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate the configured models on the configured datasets
    Run(RunArgs),
    /// List the datasets and the languages they provide
    Datasets,
    /// List the supported languages and their codes
    Languages,
    /// Score translations stored in text files, one sentence per line
    Score {
        #[arg(long)]
        hypotheses: PathBuf,
        #[arg(long)]
        references: PathBuf,
        /// Source sentences, required for COMET
        #[arg(long)]
        sources: Option<PathBuf>,
        /// Also compute COMET with `comet-score`
        #[arg(long)]
        comet: bool,
        /// Case-insensitive BLEU
        #[arg(long)]
        lowercase: bool,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Configuration file (defaults to ./mt-eval.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Restrict the run to these datasets
    #[arg(short, long = "dataset")]
    datasets: Vec<DatasetKind>,
    /// Restrict the run to these target languages
    #[arg(short, long = "language")]
    languages: Vec<Language>,
    /// Sentences sampled from every dataset
    #[arg(long)]
    sample_size: Option<usize>,
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
    /// Read datasets from a directory of JSON-lines files instead of the Hugging Face Hub
    #[arg(long)]
    offline_data: Option<PathBuf>,
}

impl RunArgs {
    /// Command line options take precedence over the configuration sources.
    fn apply(self, config: &mut EvalConfig) {
        if !self.datasets.is_empty() {
            config.datasets = self.datasets;
        }
        if !self.languages.is_empty() {
            config.languages = self.languages;
        }
        if self.sample_size.is_some() {
            config.sample_size = self.sample_size;
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
        if self.offline_data.is_some() {
            config.offline_data = self.offline_data;
        }
    }
}

/// Human-readable logs on stderr, JSON logs in `log_dir` when given.
fn init_tracing(verbose: u8, quiet: bool, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = match verbose {
        0 if quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)));

    let (json_layer, guard) = match log_dir.and_then(|dir| fs::create_dir_all(dir).ok().map(|_| dir)) {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::never(dir, "mt-eval.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(EnvFilter::new("mt_eval=debug,info"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();
    guard
}

fn read_lines(path: &Path) -> anyhow::Result<Vec<String>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    Ok(content.lines().map(str::to_string).collect())
}

fn run(args: RunArgs, verbose: u8, quiet: bool) -> anyhow::Result<ExitCode> {
    let mut config = EvalConfig::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("cannot create {}", config.output_dir.display()))?;
    let _guard = init_tracing(verbose, quiet, Some(&config.log_dir()));

    let mut translators = Vec::with_capacity(config.models.len());
    for spec in &config.models {
        match build_translator(spec, &config.generation) {
            Ok(translator) => translators.push(translator),
            Err(build_error) => error!("Cannot set up {}: {}", spec.name(), build_error),
        }
    }
    if translators.is_empty() {
        bail!("none of the configured models could be set up");
    }

    let dataset_settings = config.dataset_settings();
    let rows = default_row_source(&dataset_settings);
    let corpora = config
        .datasets
        .iter()
        .map(|kind| build_corpus(*kind, &dataset_settings, Arc::clone(&rows)))
        .collect();

    let sink = FileSink::new(&config.output_dir)?;
    let mut benchmark = Benchmark::new(
        config.benchmark_settings(),
        translators,
        corpora,
        config.metrics.scorers(),
        sink,
    );
    let summary = benchmark.run()?;

    if let Some(path) = config.results_json_path() {
        JsonResults::new(&path).append(&summary.json_records())?;
        info!("Results appended to {}", path.display());
    }

    println!("Run {} ({} rows)", summary.run_id, summary.records.len());
    for (rank, (model, bleu)) in summary.leaderboard().iter().enumerate() {
        println!("{:>3}. {:<45} BLEU {:>6.2}", rank + 1, model, bleu);
    }
    for skipped in &summary.skipped {
        println!(
            "Skipped {} ({}): {}",
            skipped.dataset, skipped.language, skipped.reason
        );
    }
    if summary.below_threshold.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        for record in &summary.below_threshold {
            println!(
                "Below threshold: {} on {} ({}): BLEU {}, COMET {}",
                record.model, record.dataset, record.language, record.bleu, record.comet
            );
        }
        Ok(ExitCode::from(2))
    }
}

fn score(
    hypotheses: &Path,
    references: &Path,
    sources: Option<&Path>,
    comet: bool,
    lowercase: bool,
) -> anyhow::Result<()> {
    let hypotheses = read_lines(hypotheses)?;
    let references = read_lines(references)?;
    let sources = match sources {
        Some(path) => read_lines(path)?,
        None if comet => bail!("--sources is required for COMET"),
        None => vec![String::new(); hypotheses.len()],
    };

    println!("{}", Bleu::new(lowercase).corpus_bleu(&hypotheses, &references)?);
    let chrf = ChrF::default();
    println!(
        "chrF2 = {:.2}",
        chrf.corpus_score(&sources, &hypotheses, &references)?
    );
    if comet {
        let comet = Comet::default();
        println!(
            "COMET ({}) = {:.4}",
            comet.model,
            comet.corpus_score(&sources, &hypotheses, &references)?
        );
    }
    Ok(())
}

fn list_datasets() {
    let settings = Default::default();
    let rows = default_row_source(&settings);
    for kind in DatasetKind::ALL {
        let corpus = build_corpus(kind, &settings, Arc::clone(&rows));
        let codes = corpus
            .languages()
            .iter()
            .map(|language| language.code())
            .collect::<Vec<_>>()
            .join(" ");
        println!("{:<18} {:<10} {}", kind.id(), corpus.name(), codes);
    }
}

fn list_languages() {
    println!(
        "{:<6} {:<6} {:<15} {:<10} {}",
        "code", "iso3", "name", "nllb", "wmt24pp"
    );
    for language in Language::ALL {
        println!(
            "{:<6} {:<6} {:<15} {:<10} {}",
            language.code(),
            language.iso_639_3(),
            language.name(),
            language.nllb_code().unwrap_or("-"),
            language.wmt24pp_locale().unwrap_or("-")
        );
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => run(args, cli.verbose, cli.quiet),
        Command::Datasets => {
            list_datasets();
            Ok(ExitCode::SUCCESS)
        }
        Command::Languages => {
            list_languages();
            Ok(ExitCode::SUCCESS)
        }
        Command::Score {
            hypotheses,
            references,
            sources,
            comet,
            lowercase,
        } => {
            let _guard = init_tracing(cli.verbose, cli.quiet, None);
            score(&hypotheses, &references, sources.as_deref(), comet, lowercase)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
