//! Classifier abstraction the inference engine is written against.

use super::ModelMetadata;
use crate::domain::{PenguinMeasurements, Species};
use anyhow::Result;

/// Trait for species classifiers
pub trait SpeciesClassifier: Send + Sync {
    /// Posterior probability for every species the model knows, summing to 1
    fn predict_proba(&self, sample: &PenguinMeasurements) -> Result<Vec<(Species, f64)>>;

    /// Get model metadata
    fn metadata(&self) -> &ModelMetadata;

    /// Most probable species
    fn predict(&self, sample: &PenguinMeasurements) -> Result<Species> {
        self.predict_proba(sample)?
            .into_iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(species, _)| species)
            .ok_or_else(|| anyhow::anyhow!("Classifier returned no classes"))
    }
}
