use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::ml::{GaussianNaiveBayes, InferenceEngine, SpeciesClassifier};

/// Shared handler state. Holds no per-request data, so one instance can serve
/// any number of concurrent requests.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Config,
    pub engine: InferenceEngine,
}

impl AppState {
    pub fn new(cfg: Config) -> Result<Self> {
        let model = match &cfg.model.path {
            Some(path) => {
                info!(%path, "loading model artifact");
                GaussianNaiveBayes::from_path(path)?
            }
            None => {
                info!("using embedded model artifact");
                GaussianNaiveBayes::embedded()?
            }
        };
        info!(
            model_id = %model.metadata.model_id,
            version = %model.metadata.version,
            classes = model.classes.len(),
            "model loaded"
        );
        Ok(Self::with_model(cfg, Arc::new(model)))
    }

    pub fn with_model(cfg: Config, model: Arc<dyn SpeciesClassifier>) -> Self {
        Self {
            cfg,
            engine: InferenceEngine::new(model),
        }
    }
}
