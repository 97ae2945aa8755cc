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
use crate::languages::Language;
use crate::translators::{check_output_length, GenerationSettings, Translator};
use rust_bert::m2m_100::{
    M2M100ConfigResources, M2M100MergesResources, M2M100ModelResources, M2M100SourceLanguages,
    M2M100TargetLanguages, M2M100VocabResources,
};
use rust_bert::marian::{
    MarianConfigResources, MarianModelResources, MarianSourceLanguages, MarianSpmResources,
    MarianTargetLanguages, MarianVocabResources,
};
use rust_bert::mbart::{
    MBartConfigResources, MBartModelResources, MBartSourceLanguages, MBartTargetLanguages,
    MBartVocabResources,
};
use rust_bert::nllb::{
    NLLBConfigResources, NLLBLanguages, NLLBMergeResources, NLLBResources, NLLBVocabResources,
};
use rust_bert::pipelines::common::{ModelResource, ModelType};
use rust_bert::pipelines::translation::{
    Language as PipelineLanguage, TranslationConfig, TranslationModel,
};
use rust_bert::resources::{LocalResource, RemoteResource, ResourceProvider};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tch::Device;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum M2M100Size {
    #[default]
    #[serde(rename = "418M")]
    Large,
    #[serde(rename = "1.2B")]
    Xlarge,
}

impl M2M100Size {
    pub fn model_name(&self) -> &'static str {
        match self {
            M2M100Size::Large => "facebook/m2m100_418M",
            M2M100Size::Xlarge => "facebook/m2m100_1.2B",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NllbSize {
    #[default]
    #[serde(rename = "600M-distilled")]
    Distilled600M,
    #[serde(rename = "1.3B")]
    Large1_3B,
}

impl NllbSize {
    pub fn model_name(&self) -> &'static str {
        match self {
            NllbSize::Distilled600M => "facebook/nllb-200-distilled-600M",
            NllbSize::Large1_3B => "facebook/nllb-200-1.3B",
        }
    }
}

/// Model family run by a `PipelineTranslator`
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineBackend {
    /// Pretrained opus-mt model for the language pair, see `marian_resources`
    Marian,
    /// Local multi-target opus-mt checkpoint and the token selecting each target
    MarianLocal {
        path: PathBuf,
        targets: BTreeMap<Language, String>,
    },
    M2M100(M2M100Size),
    Nllb(NllbSize),
    MBart50,
}

/// # rust-bert translation pipeline
/// Holds at most one model in memory. Multilingual models are loaded once, on the first
/// translation request; pair-specific Marian models are reloaded whenever the language pair
/// changes.
pub struct PipelineTranslator {
    name: String,
    backend: PipelineBackend,
    generation: GenerationSettings,
    device: Device,
    model: Option<TranslationModel>,
    loaded_pair: Option<(Language, Language)>,
}

fn remote(resource: (&'static str, &'static str)) -> RemoteResource {
    RemoteResource::from_pretrained(resource)
}

type Resource = (&'static str, &'static str);

/// Files and languages of a pretrained opus-mt checkpoint
struct MarianResources {
    model: Resource,
    config: Resource,
    vocab: Resource,
    spm: Resource,
    source_languages: Vec<PipelineLanguage>,
    target_languages: Vec<PipelineLanguage>,
}

macro_rules! marian_resources {
    ($name:ident) => {
        MarianResources {
            model: MarianModelResources::$name,
            config: MarianConfigResources::$name,
            vocab: MarianVocabResources::$name,
            spm: MarianSpmResources::$name,
            source_languages: MarianSourceLanguages::$name.iter().cloned().collect(),
            target_languages: MarianTargetLanguages::$name.iter().cloned().collect(),
        }
    };
}

/// Pretrained English to `target` opus-mt checkpoint, if rust-bert ships one.
fn marian_resources(target: PipelineLanguage) -> Option<MarianResources> {
    match target {
        PipelineLanguage::German => Some(marian_resources!(ENGLISH2GERMAN)),
        PipelineLanguage::Russian => Some(marian_resources!(ENGLISH2RUSSIAN)),
        PipelineLanguage::Dutch => Some(marian_resources!(ENGLISH2DUTCH)),
        PipelineLanguage::ChineseMandarin => Some(marian_resources!(ENGLISH2CHINESE)),
        PipelineLanguage::Swedish => Some(marian_resources!(ENGLISH2SWEDISH)),
        PipelineLanguage::Arabic => Some(marian_resources!(ENGLISH2ARABIC)),
        PipelineLanguage::Hindi => Some(marian_resources!(ENGLISH2HINDI)),
        PipelineLanguage::Hebrew => Some(marian_resources!(ENGLISH2HEBREW)),
        language if MarianTargetLanguages::ENGLISH2ROMANCE.contains(&language) => {
            Some(marian_resources!(ENGLISH2ROMANCE))
        }
        _ => None,
    }
}

fn local(path: &Path, file_name: &str) -> Result<LocalResource, EvalError> {
    let local_path = path.join(file_name);
    if !local_path.is_file() {
        return Err(EvalError::InvalidConfigurationError(format!(
            "missing model file {}",
            local_path.display()
        )));
    }
    Ok(LocalResource { local_path })
}

impl PipelineTranslator {
    pub fn new(
        name: impl Into<String>,
        backend: PipelineBackend,
        generation: GenerationSettings,
    ) -> PipelineTranslator {
        PipelineTranslator {
            name: name.into(),
            backend,
            generation,
            device: Device::cuda_if_available(),
            model: None,
            loaded_pair: None,
        }
    }

    pub fn backend(&self) -> &PipelineBackend {
        &self.backend
    }

    #[allow(clippy::too_many_arguments)]
    fn config<R, S, T>(
        &self,
        model_type: ModelType,
        model: R,
        config: R,
        vocab: R,
        merges: Option<R>,
        source_languages: S,
        target_languages: T,
    ) -> TranslationConfig
    where
        R: ResourceProvider + Send + 'static,
        S: AsRef<[PipelineLanguage]>,
        T: AsRef<[PipelineLanguage]>,
    {
        let mut translation_config = TranslationConfig::new(
            model_type,
            ModelResource::Torch(Box::new(model)),
            config,
            vocab,
            merges,
            source_languages,
            target_languages,
            self.device,
        );
        translation_config.num_beams = self.generation.num_beams;
        translation_config.length_penalty = self.generation.length_penalty;
        translation_config.early_stopping = self.generation.early_stopping;
        translation_config.max_length = self.generation.max_length;
        translation_config
    }

    fn load(&self, source: Language, target: Language) -> Result<TranslationModel, EvalError> {
        let translation_config = match &self.backend {
            PipelineBackend::Marian => {
                let (_, pipeline_target) = self.pipeline_pair(source, target)?;
                let resources = marian_resources(pipeline_target).ok_or_else(|| {
                    EvalError::UnsupportedLanguage(format!(
                        "no pretrained opus-mt model for {} to {}",
                        source, target
                    ))
                })?;
                self.config(
                    ModelType::Marian,
                    remote(resources.model),
                    remote(resources.config),
                    remote(resources.vocab),
                    Some(remote(resources.spm)),
                    resources.source_languages,
                    resources.target_languages,
                )
            }
            PipelineBackend::MarianLocal { path, .. } => self.config(
                ModelType::Marian,
                local(path, "rust_model.ot")?,
                local(path, "config.json")?,
                local(path, "vocab.json")?,
                Some(local(path, "source.spm")?),
                Vec::<PipelineLanguage>::new(),
                Vec::<PipelineLanguage>::new(),
            ),
            PipelineBackend::M2M100(M2M100Size::Large) => self.config(
                ModelType::M2M100,
                remote(M2M100ModelResources::M2M100_418M),
                remote(M2M100ConfigResources::M2M100_418M),
                remote(M2M100VocabResources::M2M100_418M),
                Some(remote(M2M100MergesResources::M2M100_418M)),
                M2M100SourceLanguages::M2M100_418M,
                M2M100TargetLanguages::M2M100_418M,
            ),
            PipelineBackend::M2M100(M2M100Size::Xlarge) => self.config(
                ModelType::M2M100,
                remote(M2M100ModelResources::M2M100_1_2B),
                remote(M2M100ConfigResources::M2M100_1_2B),
                remote(M2M100VocabResources::M2M100_1_2B),
                Some(remote(M2M100MergesResources::M2M100_1_2B)),
                M2M100SourceLanguages::M2M100_1_2B,
                M2M100TargetLanguages::M2M100_1_2B,
            ),
            PipelineBackend::Nllb(NllbSize::Distilled600M) => self.config(
                ModelType::NLLB,
                remote(NLLBResources::NLLB_600M_DISTILLED),
                remote(NLLBConfigResources::NLLB_600M_DISTILLED),
                remote(NLLBVocabResources::NLLB_600M_DISTILLED),
                Some(remote(NLLBMergeResources::NLLB_600M_DISTILLED)),
                NLLBLanguages::NLLB,
                NLLBLanguages::NLLB,
            ),
            PipelineBackend::Nllb(NllbSize::Large1_3B) => self.config(
                ModelType::NLLB,
                remote(NLLBResources::NLLB_1_3B),
                remote(NLLBConfigResources::NLLB_1_3B),
                remote(NLLBVocabResources::NLLB_1_3B),
                Some(remote(NLLBMergeResources::NLLB_1_3B)),
                NLLBLanguages::NLLB,
                NLLBLanguages::NLLB,
            ),
            PipelineBackend::MBart50 => self.config(
                ModelType::MBart,
                remote(MBartModelResources::MBART50_MANY_TO_MANY),
                remote(MBartConfigResources::MBART50_MANY_TO_MANY),
                remote(MBartVocabResources::MBART50_MANY_TO_MANY),
                None,
                MBartSourceLanguages::MBART50_MANY_TO_MANY,
                MBartTargetLanguages::MBART50_MANY_TO_MANY,
            ),
        };
        Ok(TranslationModel::new(translation_config)?)
    }

    /// Loads the model for the pair unless the one in memory can already serve it.
    fn ensure_loaded(&mut self, source: Language, target: Language) -> Result<(), EvalError> {
        let reload = match (&self.backend, &self.model) {
            (_, None) => true,
            (PipelineBackend::Marian, Some(_)) => self.loaded_pair != Some((source, target)),
            (_, Some(_)) => false,
        };
        if reload {
            // free the previous model before loading the next one
            self.model = None;
            info!("Loading {} for {} to {}", self.name, source, target);
            self.model = Some(self.load(source, target)?);
            self.loaded_pair = Some((source, target));
        }
        Ok(())
    }

    fn prepare_inputs(&self, texts: &[String], target: Language) -> Result<Vec<String>, EvalError> {
        match &self.backend {
            PipelineBackend::MarianLocal { targets, .. } => {
                let token = targets.get(&target).ok_or_else(|| {
                    EvalError::UnsupportedLanguage(format!("{} has no token for {}", self.name, target))
                })?;
                Ok(texts
                    .iter()
                    .map(|text| format!("{} {}", token.trim(), text))
                    .collect())
            }
            _ => Ok(texts.to_vec()),
        }
    }

    /// rust-bert languages of the pair, as named by the backend's vocabulary.
    fn pipeline_pair(
        &self,
        source: Language,
        target: Language,
    ) -> Result<(PipelineLanguage, PipelineLanguage), EvalError> {
        let convert = |language: Language| {
            let pipeline_language = language
                .to_pipeline_language()
                .ok_or_else(|| EvalError::UnsupportedLanguage(language.to_string()))?;
            Ok::<_, EvalError>(match (&self.backend, pipeline_language) {
                (PipelineBackend::Nllb(_), PipelineLanguage::Norwegian) => {
                    PipelineLanguage::NorwegianBokmal
                }
                (_, pipeline_language) => pipeline_language,
            })
        };
        Ok((convert(source)?, convert(target)?))
    }
}

impl Translator for PipelineTranslator {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, source: Language, target: Language) -> bool {
        if let PipelineBackend::MarianLocal { targets, .. } = &self.backend {
            return source == Language::English && targets.contains_key(&target);
        }
        let Ok((pipeline_source, pipeline_target)) = self.pipeline_pair(source, target) else {
            return false;
        };
        match &self.backend {
            PipelineBackend::Marian => {
                source == Language::English && marian_resources(pipeline_target).is_some()
            }
            PipelineBackend::MarianLocal { .. } => false,
            PipelineBackend::M2M100(M2M100Size::Large) => {
                M2M100SourceLanguages::M2M100_418M.contains(&pipeline_source)
                    && M2M100TargetLanguages::M2M100_418M.contains(&pipeline_target)
            }
            PipelineBackend::M2M100(M2M100Size::Xlarge) => {
                M2M100SourceLanguages::M2M100_1_2B.contains(&pipeline_source)
                    && M2M100TargetLanguages::M2M100_1_2B.contains(&pipeline_target)
            }
            PipelineBackend::Nllb(_) => {
                source.nllb_code().is_some()
                    && target.nllb_code().is_some()
                    && NLLBLanguages::NLLB.contains(&pipeline_source)
                    && NLLBLanguages::NLLB.contains(&pipeline_target)
            }
            PipelineBackend::MBart50 => {
                MBartSourceLanguages::MBART50_MANY_TO_MANY.contains(&pipeline_source)
                    && MBartTargetLanguages::MBART50_MANY_TO_MANY.contains(&pipeline_target)
            }
        }
    }

    fn translate(
        &mut self,
        texts: &[String],
        source: Language,
        target: Language,
    ) -> Result<Vec<String>, EvalError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if !self.supports(source, target) {
            return Err(EvalError::UnsupportedLanguage(format!(
                "{} does not translate {} to {}",
                self.name, source, target
            )));
        }
        self.ensure_loaded(source, target)?;
        let inputs = self.prepare_inputs(texts, target)?;
        let languages = match &self.backend {
            PipelineBackend::MarianLocal { .. } => None,
            _ => Some(self.pipeline_pair(source, target)?),
        };

        let model = self
            .model
            .as_ref()
            .ok_or_else(|| EvalError::PipelineError(format!("{} is not loaded", self.name)))?;
        let mut outputs = Vec::with_capacity(inputs.len());
        for batch in inputs.chunks(self.generation.batch_size.max(1)) {
            let translations = match languages {
                Some((pipeline_source, pipeline_target)) => {
                    model.translate(batch, pipeline_source, pipeline_target)?
                }
                None => model.translate(batch, None, None)?,
            };
            outputs.extend(translations.into_iter().map(|text| text.trim().to_string()));
        }
        for (input, output) in texts.iter().zip(outputs.iter()) {
            debug!("{} => {}", input, output);
        }
        check_output_length(&self.name, texts.len(), outputs)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn local_marian() -> PipelineTranslator {
        let targets = BTreeMap::from([(Language::Montenegrin, ">>cnr<<".to_string())]);
        PipelineTranslator::new(
            "opus-mt-en-zls",
            PipelineBackend::MarianLocal {
                path: PathBuf::from("/nonexistent"),
                targets,
            },
            GenerationSettings::default(),
        )
    }

    #[test]
    fn local_marian_prepends_target_token() -> anyhow::Result<()> {
        let translator = local_marian();
        let inputs = translator.prepare_inputs(&["Good morning".to_string()], Language::Montenegrin)?;
        assert_eq!(inputs, vec![">>cnr<< Good morning".to_string()]);
        assert!(translator
            .prepare_inputs(&["Good morning".to_string()], Language::French)
            .is_err());
        Ok(())
    }

    #[test]
    fn supported_pairs() {
        assert!(local_marian().supports(Language::English, Language::Montenegrin));
        assert!(!local_marian().supports(Language::English, Language::French));

        let nllb = PipelineTranslator::new(
            "nllb",
            PipelineBackend::Nllb(NllbSize::Distilled600M),
            GenerationSettings::default(),
        );
        assert!(nllb.supports(Language::English, Language::Bulgarian));
        assert!(nllb.supports(Language::English, Language::Norwegian));
        assert!(!nllb.supports(Language::English, Language::Montenegrin));
    }

    #[test]
    fn nllb_writes_norwegian_as_bokmal() -> anyhow::Result<()> {
        let nllb = PipelineTranslator::new(
            "nllb",
            PipelineBackend::Nllb(NllbSize::Distilled600M),
            GenerationSettings::default(),
        );
        let m2m100 = PipelineTranslator::new(
            "m2m100",
            PipelineBackend::M2M100(M2M100Size::Large),
            GenerationSettings::default(),
        );

        assert_eq!(
            nllb.pipeline_pair(Language::English, Language::Norwegian)?,
            (PipelineLanguage::English, PipelineLanguage::NorwegianBokmal)
        );
        assert_eq!(
            m2m100.pipeline_pair(Language::English, Language::Norwegian)?,
            (PipelineLanguage::English, PipelineLanguage::Norwegian)
        );
        Ok(())
    }

    #[test]
    fn marian_pairs_with_a_pretrained_model() {
        let marian = PipelineTranslator::new(
            "opus-mt",
            PipelineBackend::Marian,
            GenerationSettings::default(),
        );

        assert!(marian.supports(Language::English, Language::French));
        assert!(marian.supports(Language::English, Language::German));
        assert!(marian.supports(Language::English, Language::Swedish));
        assert!(!marian.supports(Language::English, Language::Bulgarian));
        assert!(!marian.supports(Language::English, Language::Czech));
        assert!(!marian.supports(Language::French, Language::English));
        assert!(marian_resources(PipelineLanguage::Spanish)
            .is_some_and(|resources| resources.target_languages.len() > 1));
        assert!(marian_resources(PipelineLanguage::German)
            .is_some_and(|resources| resources.target_languages == vec![PipelineLanguage::German]));
    }

    #[test]
    fn missing_local_checkpoint_fails_at_load() {
        let mut translator = local_marian();
        let result = translator.translate(
            &["Good morning".to_string()],
            Language::English,
            Language::Montenegrin,
        );
        assert!(matches!(
            result,
            Err(EvalError::InvalidConfigurationError(_))
        ));
    }
}
