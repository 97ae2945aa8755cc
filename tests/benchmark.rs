use mt_eval::datasets::{Corpus, ParallelCorpus, ParallelSample};
use mt_eval::evaluation::{Benchmark, BenchmarkSettings};
use mt_eval::metrics::{Bleu, ChrF, Scorer};
use mt_eval::report::{Cell, MemorySink};
use mt_eval::translators::Translator;
use mt_eval::{EvalError, Language};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const PAIRS: [(&str, &str); 3] = [
    (
        "The committee approved the budget yesterday.",
        "Le comité a approuvé le budget hier.",
    ),
    (
        "We will meet again next week.",
        "Nous nous reverrons la semaine prochaine.",
    ),
    ("The weather is nice today.", "Il fait beau aujourd'hui."),
];

/// Returns the reference translation of every known sentence.
struct OracleTranslator {
    name: String,
    table: HashMap<String, String>,
    languages: Vec<Language>,
}

impl OracleTranslator {
    fn new(name: &str, languages: Vec<Language>) -> OracleTranslator {
        OracleTranslator {
            name: name.to_string(),
            table: PAIRS
                .iter()
                .map(|(source, reference)| (source.to_string(), reference.to_string()))
                .collect(),
            languages,
        }
    }
}

impl Translator for OracleTranslator {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, source: Language, target: Language) -> bool {
        source == Language::English && self.languages.contains(&target)
    }

    fn translate(
        &mut self,
        texts: &[String],
        _source: Language,
        _target: Language,
    ) -> Result<Vec<String>, EvalError> {
        Ok(texts
            .iter()
            .map(|text| self.table.get(text).cloned().unwrap_or_default())
            .collect())
    }
}

/// Copies the source sentence.
struct EchoTranslator;

impl Translator for EchoTranslator {
    fn name(&self) -> &str {
        "echo"
    }

    fn supports(&self, _source: Language, _target: Language) -> bool {
        true
    }

    fn translate(
        &mut self,
        texts: &[String],
        _source: Language,
        _target: Language,
    ) -> Result<Vec<String>, EvalError> {
        Ok(texts.to_vec())
    }
}

struct FailingTranslator;

impl Translator for FailingTranslator {
    fn name(&self) -> &str {
        "failing"
    }

    fn supports(&self, _source: Language, _target: Language) -> bool {
        true
    }

    fn translate(
        &mut self,
        _texts: &[String],
        _source: Language,
        _target: Language,
    ) -> Result<Vec<String>, EvalError> {
        Err(EvalError::ApiError {
            status: 503,
            message: "service unavailable".to_string(),
        })
    }
}

enum Contents {
    Pairs,
    Empty,
    Broken,
}

struct MockCorpus {
    name: &'static str,
    languages: Vec<Language>,
    contents: Contents,
    loads: Arc<AtomicUsize>,
}

impl MockCorpus {
    fn new(name: &'static str, languages: Vec<Language>, contents: Contents) -> MockCorpus {
        MockCorpus {
            name,
            languages,
            contents,
            loads: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Corpus for MockCorpus {
    fn name(&self) -> &str {
        self.name
    }

    fn languages(&self) -> Vec<Language> {
        self.languages.clone()
    }

    fn load(&self, _source: Language, target: Language) -> Result<ParallelCorpus, EvalError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let mut corpus = ParallelCorpus::empty(self.name, target);
        match self.contents {
            Contents::Pairs => {
                corpus.samples = PAIRS
                    .iter()
                    .map(|(source, reference)| ParallelSample::new(*source, *reference))
                    .collect()
            }
            Contents::Empty => {}
            Contents::Broken => {
                return Err(EvalError::DownloadError("connection reset".to_string()));
            }
        }
        Ok(corpus)
    }
}

/// Fails on every input.
struct BrokenMetric;

impl Scorer for BrokenMetric {
    fn name(&self) -> &'static str {
        "COMET"
    }

    fn corpus_score(
        &self,
        _sources: &[String],
        _hypotheses: &[String],
        _references: &[String],
    ) -> Result<f64, EvalError> {
        Err(EvalError::MetricError("comet-score not found".to_string()))
    }
}

fn scorers() -> Vec<Box<dyn Scorer>> {
    vec![Box::new(Bleu::default()), Box::new(ChrF::default())]
}

#[test]
fn perfect_translations_score_100() -> anyhow::Result<()> {
    let mut benchmark = Benchmark::new(
        BenchmarkSettings::default(),
        vec![Box::new(OracleTranslator::new(
            "oracle",
            vec![Language::French],
        ))],
        vec![Box::new(MockCorpus::new(
            "Europarl",
            vec![Language::French],
            Contents::Pairs,
        ))],
        scorers(),
        MemorySink::default(),
    );

    let summary = benchmark.run()?;
    let sink = benchmark.into_sink();

    assert_eq!(summary.records.len(), 1);
    let record = &sink.scores[0];
    assert_eq!(record.model, "oracle");
    assert_eq!(record.dataset, "Europarl");
    assert_eq!(record.bleu, Cell::Value(100.0));
    assert_eq!(record.chrf, Cell::Value(100.0));
    assert_eq!(record.comet, Cell::NotAvailable);

    assert_eq!(sink.translations.len(), 3);
    assert_eq!(sink.translations[2].source, "The weather is nice today.");
    assert_eq!(sink.translations[2].translation, "Il fait beau aujourd'hui.");
    assert_eq!(sink.translations[2].reference, "Il fait beau aujourd'hui.");
    assert!(summary.finished_at.is_some());
    Ok(())
}

#[test]
fn every_outcome_has_its_row() -> anyhow::Result<()> {
    let mut benchmark = Benchmark::new(
        BenchmarkSettings::default(),
        vec![
            Box::new(OracleTranslator::new("oracle", vec![Language::French])),
            Box::new(FailingTranslator),
        ],
        vec![
            Box::new(MockCorpus::new(
                "Europarl",
                vec![Language::French],
                Contents::Pairs,
            )),
            Box::new(MockCorpus::new(
                "OPUS-Books",
                vec![Language::French],
                Contents::Empty,
            )),
            Box::new(MockCorpus::new(
                "TED",
                vec![Language::French],
                Contents::Broken,
            )),
        ],
        scorers(),
        MemorySink::default(),
    );

    let summary = benchmark.run()?;
    let cells = benchmark
        .sink()
        .scores
        .iter()
        .map(|record| (record.model.as_str(), record.dataset.as_str(), record.bleu))
        .collect::<Vec<_>>();

    assert_eq!(
        cells,
        vec![
            ("oracle", "Europarl", Cell::Value(100.0)),
            ("oracle", "OPUS-Books", Cell::NotAvailable),
            ("oracle", "TED", Cell::Skipped),
            ("failing", "Europarl", Cell::Error),
            ("failing", "OPUS-Books", Cell::NotAvailable),
            ("failing", "TED", Cell::Skipped),
        ]
    );
    assert_eq!(summary.skipped.len(), 2);
    assert_eq!(summary.skipped[0].dataset, "TED");
    assert!(summary.skipped[0].reason.contains("connection reset"));
    // a failed translation writes no translation rows
    assert_eq!(benchmark.sink().translations.len(), 3);
    assert_eq!(summary.leaderboard(), vec![("oracle".to_string(), 100.0)]);
    Ok(())
}

#[test]
fn unsupported_and_unselected_languages_have_no_row() -> anyhow::Result<()> {
    let settings = BenchmarkSettings {
        languages: vec![Language::French, Language::German],
        ..Default::default()
    };
    let mut benchmark = Benchmark::new(
        settings,
        vec![Box::new(OracleTranslator::new(
            "oracle",
            vec![Language::French, Language::Italian],
        ))],
        vec![Box::new(MockCorpus::new(
            "Europarl",
            vec![Language::French, Language::German, Language::Italian],
            Contents::Pairs,
        ))],
        scorers(),
        MemorySink::default(),
    );

    let summary = benchmark.run()?;

    assert_eq!(summary.records.len(), 1);
    assert_eq!(summary.records[0].language, Language::French);
    Ok(())
}

#[test]
fn corpora_are_loaded_once_per_language() -> anyhow::Result<()> {
    let corpus = MockCorpus::new(
        "Europarl",
        vec![Language::French, Language::German],
        Contents::Pairs,
    );
    let loads = Arc::clone(&corpus.loads);
    let mut benchmark = Benchmark::new(
        BenchmarkSettings::default(),
        vec![
            Box::new(OracleTranslator::new("first", vec![Language::French])),
            Box::new(OracleTranslator::new(
                "second",
                vec![Language::French, Language::German],
            )),
            Box::new(EchoTranslator),
        ],
        vec![Box::new(corpus)],
        scorers(),
        MemorySink::default(),
    );

    let summary = benchmark.run()?;

    assert_eq!(summary.records.len(), 5);
    assert_eq!(loads.load(Ordering::SeqCst), 2);
    Ok(())
}

#[test]
fn failing_metric_only_marks_its_cell() -> anyhow::Result<()> {
    let mut scorers = scorers();
    scorers.push(Box::new(BrokenMetric));
    let mut benchmark = Benchmark::new(
        BenchmarkSettings::default(),
        vec![Box::new(EchoTranslator)],
        vec![Box::new(MockCorpus::new(
            "WMT",
            vec![Language::French],
            Contents::Pairs,
        ))],
        scorers,
        MemorySink::default(),
    );

    benchmark.run()?;
    let record = &benchmark.sink().scores[0];

    assert!(matches!(record.bleu, Cell::Value(score) if score < 100.0));
    assert!(matches!(record.chrf, Cell::Value(_)));
    assert_eq!(record.comet, Cell::Error);
    assert_eq!(benchmark.sink().translations.len(), 3);
    Ok(())
}

#[test]
fn low_scores_are_reported() -> anyhow::Result<()> {
    let settings = BenchmarkSettings {
        min_bleu: Some(50.0),
        ..Default::default()
    };
    let mut benchmark = Benchmark::new(
        settings,
        vec![
            Box::new(OracleTranslator::new("oracle", vec![Language::French])),
            Box::new(EchoTranslator),
        ],
        vec![Box::new(MockCorpus::new(
            "Europarl",
            vec![Language::French],
            Contents::Pairs,
        ))],
        scorers(),
        MemorySink::default(),
    );

    let summary = benchmark.run()?;

    assert_eq!(summary.below_threshold.len(), 1);
    assert_eq!(summary.below_threshold[0].model, "echo");
    Ok(())
}

#[test]
fn references_can_be_normalized() -> anyhow::Result<()> {
    let settings = BenchmarkSettings {
        normalize_references: true,
        ..Default::default()
    };
    let mut benchmark = Benchmark::new(
        settings,
        vec![Box::new(OracleTranslator::new(
            "oracle",
            vec![Language::French],
        ))],
        vec![Box::new(MockCorpus::new(
            "Europarl",
            vec![Language::French],
            Contents::Pairs,
        ))],
        scorers(),
        MemorySink::default(),
    );

    let summary = benchmark.run()?;
    let sink = benchmark.into_sink();

    // the oracle answers with the cased reference
    assert_eq!(sink.translations[0].reference, "le comité a approuvé le budget hier.");
    assert_eq!(sink.translations[0].translation, "le comité a approuvé le budget hier.");
    assert_eq!(sink.scores[0].bleu, Cell::Value(100.0));
    assert_eq!(sink.scores[0].chrf, Cell::Value(100.0));
    assert!(summary.below_threshold.is_empty());
    Ok(())
}
