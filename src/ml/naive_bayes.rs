//! Gaussian Naive Bayes species classifier
//!
//! Numeric measurements are modelled as independent per-species normals,
//! `island` and `sex` as Laplace-smoothed categoricals. All scoring happens in
//! log space so that implausible inputs (negative lengths, a 100 kg penguin)
//! still yield a finite posterior instead of underflowing to zero everywhere.

use super::{models::SpeciesClassifier, ModelMetadata, ModelType};
use crate::domain::{Island, PenguinMeasurements, Sex, Species, MEASUREMENT_NAMES};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use strum::IntoEnumIterator;

const EMBEDDED_MODEL: &str = include_str!("../../models/penguin_gnb.json");

/// Keeps squared z-scores finite for any finite input.
const MAX_ABS_Z: f64 = 1e150;

const LN_SQRT_2PI: f64 = 0.918_938_533_204_672_7;

/// Fitted parameters for one species
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassParameters {
    pub species: Species,
    /// Training rows labelled with this species
    pub count: u32,
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
    #[serde(default)]
    pub island_counts: BTreeMap<String, u32>,
    #[serde(default)]
    pub sex_counts: BTreeMap<String, u32>,
}

impl ClassParameters {
    fn island_log_likelihood(&self, island: Island, alpha: f64) -> f64 {
        categorical_log_likelihood::<Island>(&self.island_counts, island.as_ref(), alpha)
    }

    fn sex_log_likelihood(&self, sex: Sex, alpha: f64) -> f64 {
        categorical_log_likelihood::<Sex>(&self.sex_counts, sex.as_ref(), alpha)
    }
}

/// `ln P(value | class)` with add-alpha smoothing over the closed vocabulary `V`.
fn categorical_log_likelihood<V>(counts: &BTreeMap<String, u32>, value: &str, alpha: f64) -> f64
where
    V: IntoEnumIterator + AsRef<str>,
{
    let vocabulary: Vec<V> = V::iter().collect();
    let total: f64 = vocabulary
        .iter()
        .map(|v| f64::from(counts.get(v.as_ref()).copied().unwrap_or(0)))
        .sum();
    let observed = f64::from(counts.get(value).copied().unwrap_or(0));
    ((observed + alpha) / (total + alpha * vocabulary.len() as f64)).ln()
}

fn default_smoothing() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaussianNaiveBayes {
    pub metadata: ModelMetadata,
    pub classes: Vec<ClassParameters>,
    /// Laplace smoothing for the categorical features
    #[serde(default = "default_smoothing")]
    pub smoothing: f64,
}

impl GaussianNaiveBayes {
    /// Parameters fitted on the Palmer penguins data set, compiled in.
    pub fn embedded() -> Result<Self> {
        Self::from_json(EMBEDDED_MODEL).context("embedded model artifact is invalid")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let model: Self = serde_json::from_str(json).context("model JSON parse failed")?;
        model.validate()?;
        Ok(model)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read model artifact {}", path.display()))?;
        Self::from_json(&json)
    }

    /// Check the artifact is usable before serving with it
    pub fn validate(&self) -> Result<()> {
        if self.metadata.model_type != ModelType::GaussianNaiveBayes {
            anyhow::bail!("Unsupported model type: {:?}", self.metadata.model_type);
        }
        if self.metadata.feature_names != MEASUREMENT_NAMES {
            anyhow::bail!(
                "Feature names {:?} do not match expected {:?}",
                self.metadata.feature_names,
                MEASUREMENT_NAMES
            );
        }
        if self.classes.is_empty() {
            anyhow::bail!("Model has no classes");
        }
        if !(self.smoothing.is_finite() && self.smoothing > 0.0) {
            anyhow::bail!("Smoothing must be positive, got {}", self.smoothing);
        }

        let n_features = self.metadata.feature_names.len();
        let mut seen = HashSet::new();
        for class in &self.classes {
            if !seen.insert(class.species) {
                anyhow::bail!("Duplicate class {}", class.species);
            }
            if class.count == 0 {
                anyhow::bail!("Class {} has no training samples", class.species);
            }
            if class.means.len() != n_features || class.stds.len() != n_features {
                anyhow::bail!(
                    "Class {}: expected {} means/stds, got {}/{}",
                    class.species,
                    n_features,
                    class.means.len(),
                    class.stds.len()
                );
            }
            if class.means.iter().any(|m| !m.is_finite()) {
                anyhow::bail!("Class {} has a non-finite mean", class.species);
            }
            if class.stds.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
                anyhow::bail!("Class {} has a non-positive std", class.species);
            }
        }
        Ok(())
    }

    /// Unnormalised `ln P(class) + ln P(sample | class)` per class
    fn joint_log_likelihoods(&self, sample: &PenguinMeasurements) -> Result<Vec<(Species, f64)>> {
        let total: f64 = self.classes.iter().map(|c| f64::from(c.count)).sum();
        let features = sample.measurement_vector()?;

        self.classes
            .iter()
            .map(|class| {
                let z = features.standardize(&class.means, &class.stds)?;
                let gaussian: f64 = z
                    .features
                    .iter()
                    .zip(class.stds.iter())
                    .map(|(z, std)| {
                        let z = z.clamp(-MAX_ABS_Z, MAX_ABS_Z);
                        -0.5 * z * z - std.ln() - LN_SQRT_2PI
                    })
                    .sum();

                let log_prior = (f64::from(class.count) / total).ln();
                let score = log_prior
                    + gaussian
                    + class.island_log_likelihood(sample.island, self.smoothing)
                    + class.sex_log_likelihood(sample.sex, self.smoothing);
                Ok((class.species, score))
            })
            .collect()
    }
}

impl SpeciesClassifier for GaussianNaiveBayes {
    fn predict_proba(&self, sample: &PenguinMeasurements) -> Result<Vec<(Species, f64)>> {
        let scores = self.joint_log_likelihoods(sample)?;

        // log-sum-exp
        let max = scores
            .iter()
            .map(|(_, s)| *s)
            .fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() {
            anyhow::bail!("Non-finite log likelihood for sample {:?}", sample);
        }
        let norm: f64 = scores.iter().map(|(_, s)| (s - max).exp()).sum();

        Ok(scores
            .into_iter()
            .map(|(species, s)| (species, (s - max).exp() / norm))
            .collect())
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}
