#[macro_use]
extern crate criterion;

use criterion::{black_box, Criterion};
use mt_eval::translators::{build_translator, GenerationSettings, ModelSpec, Translator};
use mt_eval::Language;
use std::time::{Duration, Instant};

fn create_translator() -> Box<dyn Translator> {
    build_translator(
        &ModelSpec::Marian { name: None },
        &GenerationSettings::default(),
    )
    .unwrap()
}

fn translation_forward_pass(iters: u64, translator: &mut dyn Translator, data: &[String]) -> Duration {
    let mut duration = Duration::new(0, 0);
    for _i in 0..iters {
        let start = Instant::now();
        let _ = translator.translate(data, Language::English, Language::French);
        duration = duration.checked_add(start.elapsed()).unwrap();
    }
    duration
}

fn bench_translation(c: &mut Criterion) {
    let mut translator = create_translator();

    let input = [
        "In findings published Tuesday in Cornell University's arXiv by a team of scientists from the University of Montreal and a separate report published Wednesday in Nature Astronomy by a team from University College London (UCL), the presence of water vapour was confirmed in the atmosphere of K2-18b, a planet circling a star in the constellation Leo.",
        "The team from UCL then analyzed the Montreal team's data using their own software and confirmed their conclusion.",
        "K2-18b was first identified in 2015 by the Kepler space telescope.",
        "It is about 110 light-years from Earth and larger but less dense.",
    ]
    .map(str::to_string);
    // first call loads the model
    let _ = translator.translate(&input, Language::English, Language::French);

    c.bench_function("Marian translation (4 sentences)", |b| {
        b.iter_custom(|iters| {
            black_box(translation_forward_pass(iters, translator.as_mut(), &input))
        })
    });
}

criterion_group! {
name = benches;
config = Criterion::default().sample_size(10);
targets = bench_translation
}

criterion_main!(benches);
