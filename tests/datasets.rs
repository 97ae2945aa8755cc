use mt_eval::datasets::{
    build_corpus, Corpus, DatasetKind, DatasetSettings, HubCorpus, JsonlRowSource, Wmt24pp,
    EUROPARL, MONTENEGRIN_SUBS, OPUS_100, TED_TALKS,
};
use mt_eval::Language;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn write_rows(root: &Path, relative: &str, rows: &[serde_json::Value]) -> anyhow::Result<()> {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap())?;
    let content = rows
        .iter()
        .map(|row| row.to_string())
        .collect::<Vec<_>>()
        .join("\n");
    fs::write(path, content)?;
    Ok(())
}

fn europarl_rows(count: usize) -> Vec<serde_json::Value> {
    (0..count)
        .map(|index| {
            json!({"translation": {
                "en": format!("English sentence {}", index),
                "fr": format!("Phrase française {}", index),
            }})
        })
        .collect()
}

fn hub_corpus(
    root: &Path,
    descriptor: mt_eval::datasets::HubDescriptor,
    sample_size: Option<usize>,
    seed: u64,
) -> HubCorpus {
    HubCorpus::new(
        descriptor,
        Arc::new(JsonlRowSource::new(root)),
        sample_size,
        seed,
    )
}

#[test]
fn first_rows_are_taken_in_order() -> anyhow::Result<()> {
    let data = TempDir::new()?;
    write_rows(
        data.path(),
        "Helsinki-NLP--opus-100/en-fr/test.jsonl",
        &europarl_rows(10),
    )?;

    let corpus = hub_corpus(data.path(), OPUS_100, Some(3), 42);
    let loaded = corpus.load(Language::English, Language::French)?;

    assert_eq!(loaded.dataset, "OPUS-100");
    assert_eq!(loaded.language, Language::French);
    assert_eq!(
        loaded.sources(),
        vec![
            "English sentence 0",
            "English sentence 1",
            "English sentence 2"
        ]
    );
    assert_eq!(loaded.references()[2], "Phrase française 2");
    Ok(())
}

#[test]
fn preferred_split_falls_back() -> anyhow::Result<()> {
    let data = TempDir::new()?;
    write_rows(
        data.path(),
        "Helsinki-NLP--opus-100/en-fr/train.jsonl",
        &europarl_rows(4),
    )?;

    let corpus = hub_corpus(data.path(), OPUS_100, Some(2), 42);
    let loaded = corpus.load(Language::English, Language::French)?;

    assert_eq!(loaded.len(), 2);
    Ok(())
}

#[test]
fn seeded_sampling_is_reproducible() -> anyhow::Result<()> {
    let data = TempDir::new()?;
    write_rows(
        data.path(),
        "Helsinki-NLP--europarl/en-fr/train.jsonl",
        &europarl_rows(250),
    )?;

    let first = hub_corpus(data.path(), EUROPARL, Some(5), 42)
        .load(Language::English, Language::French)?;
    let second = hub_corpus(data.path(), EUROPARL, Some(5), 42)
        .load(Language::English, Language::French)?;
    let other_seed = hub_corpus(data.path(), EUROPARL, Some(5), 7)
        .load(Language::English, Language::French)?;

    assert_eq!(first.len(), 5);
    assert_eq!(first, second);
    assert_ne!(first.sources(), other_seed.sources());
    Ok(())
}

#[test]
fn sample_is_capped_by_available_rows() -> anyhow::Result<()> {
    let data = TempDir::new()?;
    write_rows(
        data.path(),
        "Helsinki-NLP--europarl/en-fr/train.jsonl",
        &europarl_rows(3),
    )?;

    let loaded = hub_corpus(data.path(), EUROPARL, Some(10), 42)
        .load(Language::English, Language::French)?;

    assert_eq!(loaded.len(), 3);
    Ok(())
}

#[test]
fn sorted_pair_configuration() -> anyhow::Result<()> {
    let data = TempDir::new()?;
    write_rows(
        data.path(),
        "Helsinki-NLP--europarl/bg-en/train.jsonl",
        &[json!({"translation": {"bg": "Здравейте", "en": "Hello"}})],
    )?;

    let loaded = hub_corpus(data.path(), EUROPARL, None, 42)
        .load(Language::English, Language::Bulgarian)?;

    assert_eq!(loaded.sources(), vec!["Hello"]);
    assert_eq!(loaded.references(), vec!["Здравейте"]);
    Ok(())
}

#[test]
fn missing_pair_gives_empty_corpus() -> anyhow::Result<()> {
    let data = TempDir::new()?;
    write_rows(
        data.path(),
        "Helsinki-NLP--europarl/en-fr/train.jsonl",
        &europarl_rows(3),
    )?;

    let corpus = hub_corpus(data.path(), EUROPARL, None, 42);

    assert!(corpus.load(Language::English, Language::German)?.is_empty());
    // Icelandic is not part of Europarl
    assert!(corpus.load(Language::English, Language::Icelandic)?.is_empty());
    // only English sources are available
    assert!(corpus.load(Language::French, Language::English)?.is_empty());
    Ok(())
}

#[test]
fn short_subtitles_are_filtered() -> anyhow::Result<()> {
    let data = TempDir::new()?;
    let long = "one two three four five six seven eight nine ten eleven";
    let exactly_ten = "one two three four five six seven eight nine ten";
    write_rows(
        data.path(),
        "Helsinki-NLP--opus_montenegrinsubs/en-me/train.jsonl",
        &[
            json!({"translation": {"en": "Too short.", "me": "Prekratko."}}),
            json!({"translation": {"en": exactly_ten, "me": "deset riječi"}}),
            json!({"translation": {"en": long, "me": "jedanaest riječi"}}),
        ],
    )?;

    let loaded = hub_corpus(data.path(), MONTENEGRIN_SUBS, None, 42)
        .load(Language::English, Language::Montenegrin)?;

    assert_eq!(loaded.sources(), vec![long]);
    assert_eq!(loaded.references(), vec!["jedanaest riječi"]);
    Ok(())
}

#[test]
fn column_layout_with_dataset_codes() -> anyhow::Result<()> {
    let data = TempDir::new()?;
    write_rows(
        data.path(),
        "davidstap--ted_talks/en_nb/test.jsonl",
        &[
            json!({"en": "Thank you.", "nb": "Takk."}),
            json!({"en": "", "nb": "Tom kilde."}),
            json!({"en": "Good morning.", "nb": "God morgen."}),
        ],
    )?;

    let loaded = hub_corpus(data.path(), TED_TALKS, Some(5), 1)
        .load(Language::English, Language::Norwegian)?;

    let mut sources = loaded.sources();
    sources.sort();
    assert_eq!(sources, vec!["Good morning.", "Thank you."]);
    Ok(())
}

#[test]
fn wmt24pp_local_files() -> anyhow::Result<()> {
    let data = TempDir::new()?;
    write_rows(
        data.path(),
        "google--wmt24pp/en-fr_FR.jsonl",
        &[
            json!({"source": "Broken row", "target": "Ligne cassée", "is_bad_source": true}),
            json!({"source": "Hello", "target": "Bonjour", "is_bad_source": false}),
            json!({"source": "Goodbye", "target": "Au revoir", "is_bad_source": false}),
            json!({"source": "Thanks", "target": "Merci", "is_bad_source": false}),
        ],
    )?;

    let corpus = Wmt24pp::new(Some(data.path().to_path_buf()), Some(2));
    let loaded = corpus.load(Language::English, Language::French)?;

    assert_eq!(loaded.dataset, "WMT");
    assert_eq!(loaded.sources(), vec!["Hello", "Goodbye"]);
    assert_eq!(loaded.references(), vec!["Bonjour", "Au revoir"]);
    assert!(corpus
        .load(Language::English, Language::Montenegrin)?
        .is_empty());
    Ok(())
}

#[test]
fn missing_local_file_is_an_error() -> anyhow::Result<()> {
    let data = TempDir::new()?;
    let corpus = Wmt24pp::new(Some(data.path().to_path_buf()), None);

    assert!(corpus.load(Language::English, Language::German).is_err());
    Ok(())
}

#[test]
fn corpora_from_settings() -> anyhow::Result<()> {
    let data = TempDir::new()?;
    let settings = DatasetSettings {
        sample_size: Some(2),
        seed: 42,
        local_dir: Some(data.path().to_path_buf()),
    };
    let rows = Arc::new(JsonlRowSource::new(data.path()));
    write_rows(
        data.path(),
        "Helsinki-NLP--opus_books/en-fr/train.jsonl",
        &europarl_rows(6),
    )?;

    let names = DatasetKind::ALL
        .iter()
        .map(|kind| build_corpus(*kind, &settings, rows.clone()).name().to_string())
        .collect::<Vec<_>>();
    assert_eq!(
        names,
        vec![
            "WMT",
            "TED",
            "TED-IWSLT",
            "Europarl",
            "OPUS-Books",
            "OPUS-100",
            "Montenegrin-Subs"
        ]
    );

    let books = build_corpus(DatasetKind::OpusBooks, &settings, rows);
    assert_eq!(books.load(Language::English, Language::French)?.len(), 2);
    Ok(())
}
