//! Inference engine used by the HTTP layer.

use super::{models::SpeciesClassifier, ModelMetadata};
use crate::domain::{PenguinMeasurements, Species};
use anyhow::Result;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters since startup
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct InferenceStats {
    pub predictions: u64,
    pub failures: u64,
    pub by_species: BTreeMap<Species, u64>,
}

/// Runs predictions against a loaded classifier and keeps serving counters.
///
/// Cloning is cheap; clones share the model and the counters.
#[derive(Clone)]
pub struct InferenceEngine {
    model: Arc<dyn SpeciesClassifier>,
    predictions: Arc<AtomicU64>,
    failures: Arc<AtomicU64>,
    by_species: Arc<Mutex<BTreeMap<Species, u64>>>,
}

impl InferenceEngine {
    pub fn new(model: Arc<dyn SpeciesClassifier>) -> Self {
        Self {
            model,
            predictions: Arc::new(AtomicU64::new(0)),
            failures: Arc::new(AtomicU64::new(0)),
            by_species: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    pub fn predict(&self, sample: &PenguinMeasurements) -> Result<Species> {
        match self.model.predict(sample) {
            Ok(species) => {
                self.predictions.fetch_add(1, Ordering::Relaxed);
                *self.by_species.lock().entry(species).or_insert(0) += 1;
                Ok(species)
            }
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    pub fn metadata(&self) -> &ModelMetadata {
        self.model.metadata()
    }

    pub fn stats(&self) -> InferenceStats {
        InferenceStats {
            predictions: self.predictions.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            by_species: self.by_species.lock().clone(),
        }
    }
}
