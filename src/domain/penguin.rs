use anyhow::Result;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::ml::FeatureVector;

/// Numeric measurements in the order the classifier expects them.
pub const MEASUREMENT_NAMES: [&str; 4] = [
    "bill_length_mm",
    "bill_depth_mm",
    "flipper_length_mm",
    "body_mass_g",
];

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, AsRefStr,
)]
pub enum Island {
    Biscoe,
    Dream,
    Torgersen,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
pub enum Species {
    Adelie,
    Chinstrap,
    Gentoo,
}

/// Body of `POST /predict`.
///
/// Every field is required and unknown `sex`/`island` values fail
/// deserialization. Magnitudes are not range-checked: a negative bill length
/// is still a well-formed request and gets a prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenguinMeasurements {
    pub bill_length_mm: f64,
    pub bill_depth_mm: f64,
    pub flipper_length_mm: f64,
    pub body_mass_g: f64,
    pub year: i32,
    pub sex: Sex,
    pub island: Island,
}

impl PenguinMeasurements {
    pub fn measurements(&self) -> [f64; 4] {
        [
            self.bill_length_mm,
            self.bill_depth_mm,
            self.flipper_length_mm,
            self.body_mass_g,
        ]
    }

    pub fn measurement_vector(&self) -> Result<FeatureVector> {
        FeatureVector::new(
            self.measurements().to_vec(),
            MEASUREMENT_NAMES.iter().map(|n| n.to_string()).collect(),
        )
    }

    /// Payload the load generator sends and the tests start from.
    pub fn sample() -> Self {
        Self {
            bill_length_mm: 39.1,
            bill_depth_mm: 18.7,
            flipper_length_mm: 181.0,
            body_mass_g: 3750.0,
            year: 2007,
            sex: Sex::Male,
            island: Island::Biscoe,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: String,
}

impl From<Species> for PredictionResponse {
    fn from(species: Species) -> Self {
        Self {
            prediction: species.to_string(),
        }
    }
}
