//! Phishing classifier signal.
//!
//! The classifier is a black box behind [`PhishingModel`]. A logistic model
//! whose weights are read from JSON at startup is provided; without a weights
//! file the signal is disabled and always predicts legitimate.

mod features;

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use features::{ModelFeatures, FEATURE_NAMES, SUSPICIOUS_KEYWORDS};

use crate::error_handling::InitializationError;

/// Model output for one URL.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    /// Predicted phishing label
    pub is_phishing: bool,
    /// Probability of the phishing class
    pub phishing_probability: f64,
}

/// A classifier over [`ModelFeatures`].
pub trait PhishingModel: Send + Sync {
    /// Predicts the label and phishing probability for one feature set.
    fn predict(&self, features: &ModelFeatures) -> Prediction;
}

/// Always predicts legitimate with probability zero.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledModel;

impl PhishingModel for DisabledModel {
    fn predict(&self, _features: &ModelFeatures) -> Prediction {
        Prediction {
            is_phishing: false,
            phishing_probability: 0.0,
        }
    }
}

fn default_threshold() -> f64 {
    0.5
}

#[derive(Deserialize)]
struct WeightsFile {
    intercept: f64,
    weights: HashMap<String, f64>,
    #[serde(default = "default_threshold")]
    threshold: f64,
}

/// Logistic regression over the feature vector.
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticModel {
    intercept: f64,
    coefficients: [f64; 14],
    threshold: f64,
}

impl LogisticModel {
    /// Parses a weights document:
    /// `{"intercept": f, "weights": {"<feature>": f, ...}, "threshold": f}`.
    ///
    /// Features missing from `weights` get a zero coefficient.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::ModelError` for malformed JSON, unknown
    /// feature names, or a threshold outside `[0, 1]`.
    pub fn from_json(text: &str) -> Result<Self, InitializationError> {
        let file: WeightsFile = serde_json::from_str(text)
            .map_err(|e| InitializationError::ModelError(format!("invalid weights file: {e}")))?;

        let mut coefficients = [0.0; 14];
        for (name, weight) in &file.weights {
            let index = FEATURE_NAMES
                .iter()
                .position(|n| n == name)
                .ok_or_else(|| InitializationError::ModelError(format!("unknown feature '{name}'")))?;
            coefficients[index] = *weight;
        }

        if !(0.0..=1.0).contains(&file.threshold) {
            return Err(InitializationError::ModelError(format!(
                "threshold {} is outside [0, 1]",
                file.threshold
            )));
        }

        Ok(Self {
            intercept: file.intercept,
            coefficients,
            threshold: file.threshold,
        })
    }

    /// Reads and parses a weights file.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::ModelError` when the file cannot be read
    /// or parsed.
    pub fn from_path(path: &Path) -> Result<Self, InitializationError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            InitializationError::ModelError(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_json(&text)
    }
}

impl PhishingModel for LogisticModel {
    fn predict(&self, features: &ModelFeatures) -> Prediction {
        let z = features
            .values()
            .iter()
            .zip(self.coefficients.iter())
            .fold(self.intercept, |acc, (x, w)| acc + x * w);
        let probability = 1.0 / (1.0 + (-z).exp());
        Prediction {
            is_phishing: probability >= self.threshold,
            phishing_probability: probability,
        }
    }
}
