//! In-process embedding provider backed by fastembed.
//!
//! Downloads model files on first use into a cache directory. Uses a
//! Mutex because fastembed's embed() requires &mut self.

use std::path::PathBuf;
use std::sync::Mutex;

use fastembed::{InitOptions, TextEmbedding};

use super::{EmbeddingError, EmbeddingProvider};

pub struct LocalProvider {
    model: Mutex<TextEmbedding>,
    model_name: String,
    dimensions: usize,
}

impl LocalProvider {
    /// Load the named model, downloading it on first use. Model files are
    /// cached in the `models/` subdirectory of `cache_dir`.
    pub fn new(model_name: &str, cache_dir: PathBuf) -> Result<Self, EmbeddingError> {
        let model_enum = parse_model_name(model_name)?;

        let models_dir = cache_dir.join("models");
        std::fs::create_dir_all(&models_dir).map_err(|err| {
            EmbeddingError::Unavailable(format!("failed to create models directory: {err}"))
        })?;

        let options = InitOptions::new(model_enum)
            .with_cache_dir(models_dir)
            .with_show_download_progress(false);

        let mut model = TextEmbedding::try_new(options)
            .map_err(|err| EmbeddingError::Unavailable(err.to_string()))?;

        let dimensions = probe_dimensions(&mut model)?;
        log::info!("local embedding model '{model_name}' loaded ({dimensions} dimensions)");

        Ok(Self {
            model: Mutex::new(model),
            model_name: model_name.to_string(),
            dimensions,
        })
    }

    pub fn name(&self) -> &str {
        &self.model_name
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// A local provider serves exactly the model it loaded.
    fn check_model(&self, requested: &str) -> Result<(), EmbeddingError> {
        if requested.eq_ignore_ascii_case(&self.model_name) {
            Ok(())
        } else {
            Err(EmbeddingError::InvalidModel(format!(
                "loaded '{}' but '{requested}' was requested",
                self.model_name
            )))
        }
    }
}

impl EmbeddingProvider for LocalProvider {
    fn embed_one(&self, text: &str, model: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.check_model(model)?;

        let mut guard = self
            .model
            .lock()
            .map_err(|err| EmbeddingError::Unavailable(format!("model lock poisoned: {err}")))?;

        let embeddings = guard
            .embed(vec![text], None)
            .map_err(|err| EmbeddingError::Unavailable(err.to_string()))?;

        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::Unavailable("no embedding returned".to_string()))
    }

    fn embed_many(&self, texts: &[String], model: &str) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.check_model(model)?;
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut guard = self
            .model
            .lock()
            .map_err(|err| EmbeddingError::Unavailable(format!("model lock poisoned: {err}")))?;

        guard
            .embed(texts.to_vec(), None)
            .map_err(|err| EmbeddingError::Unavailable(err.to_string()))
    }
}

/// Parse a model name string to the fastembed enum.
fn parse_model_name(name: &str) -> Result<fastembed::EmbeddingModel, EmbeddingError> {
    match name.to_lowercase().as_str() {
        "all-minilm-l6-v2" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2),
        "bge-small-en-v1.5" => Ok(fastembed::EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" => Ok(fastembed::EmbeddingModel::BGEBaseENV15),
        "bge-large-en-v1.5" => Ok(fastembed::EmbeddingModel::BGELargeENV15),
        _ => Err(EmbeddingError::InvalidModel(format!(
            "{name}. Supported models: all-MiniLM-L6-v2, bge-small-en-v1.5, bge-base-en-v1.5, bge-large-en-v1.5"
        ))),
    }
}

/// Probe the model to determine embedding dimensions.
fn probe_dimensions(model: &mut TextEmbedding) -> Result<usize, EmbeddingError> {
    let probe = model
        .embed(vec!["probe"], None)
        .map_err(|err| EmbeddingError::Unavailable(format!("failed to probe dimensions: {err}")))?;

    probe
        .first()
        .map(|vector| vector.len())
        .ok_or_else(|| EmbeddingError::Unavailable("model returned no embedding".to_string()))
}
