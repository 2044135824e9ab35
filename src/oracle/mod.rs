use std::path::Path;

use serde::Deserialize;

use crate::error::{BotError, Result};
use crate::models::{FeatureVector, Signal};

/// The trained classifier behind the trading decision.
///
/// Implementations must be pure (no state retained between calls) and
/// total (one of the two labels for every input). The controller never
/// inspects the model beyond this method.
pub trait SignalModel: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Signal;

    fn name(&self) -> &str;
}

/// Serialized form of a trained linear scorer
#[derive(Debug, Deserialize)]
struct ModelArtifact {
    weights: Vec<f64>,
    bias: f64,
    #[serde(default = "default_threshold")]
    threshold: f64,
}

fn default_threshold() -> f64 {
    0.5
}

/// Logistic scorer over the fixed feature array.
///
/// score = sigmoid(w . x + b); score >= threshold reads as Enter.
#[derive(Debug, Clone)]
pub struct LogisticModel {
    weights: [f64; FeatureVector::ARITY],
    bias: f64,
    threshold: f64,
}

impl LogisticModel {
    pub fn new(weights: [f64; FeatureVector::ARITY], bias: f64, threshold: f64) -> Self {
        Self {
            weights,
            bias,
            threshold,
        }
    }

    /// Load a trained artifact from disk. Fatal at startup when the file
    /// is missing or malformed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            BotError::Configuration(format!("cannot read model file {}: {e}", path.display()))
        })?;
        let artifact: ModelArtifact = serde_json::from_str(&raw).map_err(|e| {
            BotError::Configuration(format!("malformed model file {}: {e}", path.display()))
        })?;

        let weights: [f64; FeatureVector::ARITY] =
            artifact.weights.as_slice().try_into().map_err(|_| {
                BotError::Configuration(format!(
                    "model file {} has {} weights, expected {}",
                    path.display(),
                    artifact.weights.len(),
                    FeatureVector::ARITY
                ))
            })?;

        Ok(Self::new(weights, artifact.bias, artifact.threshold))
    }

    fn score(&self, features: &FeatureVector) -> f64 {
        let x = features.to_array();
        let z: f64 = self
            .weights
            .iter()
            .zip(x.iter())
            .map(|(w, v)| w * v)
            .sum::<f64>()
            + self.bias;
        1.0 / (1.0 + (-z).exp())
    }
}

impl SignalModel for LogisticModel {
    fn predict(&self, features: &FeatureVector) -> Signal {
        if self.score(features) >= self.threshold {
            Signal::Enter
        } else {
            Signal::Exit
        }
    }

    fn name(&self) -> &str {
        "LogisticModel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(close: f64) -> FeatureVector {
        FeatureVector {
            close,
            sma_short: 100.0,
            sma_long: 100.0,
            rsi: 50.0,
            macd: 0.0,
            bollinger_upper: 105.0,
            bollinger_lower: 95.0,
        }
    }

    #[test]
    fn test_predict_is_total_and_binary() {
        // Weight only the close; positive close drives the score above 0.5
        let model = LogisticModel::new([1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0], 0.0, 0.5);
        assert_eq!(model.predict(&features(10.0)), Signal::Enter);
        assert_eq!(model.predict(&features(-10.0)), Signal::Exit);
    }

    #[test]
    fn test_predict_is_pure() {
        let model = LogisticModel::new([0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0], -1.0, 0.5);
        let input = features(3.0);
        let first = model.predict(&input);
        for _ in 0..10 {
            assert_eq!(model.predict(&input), first);
        }
    }

    #[test]
    fn test_threshold_shifts_the_boundary() {
        let bullish = LogisticModel::new([0.0; 7], 0.0, 0.5); // sigmoid(0) = 0.5
        assert_eq!(bullish.predict(&features(0.0)), Signal::Enter);

        let cautious = LogisticModel::new([0.0; 7], 0.0, 0.6);
        assert_eq!(cautious.predict(&features(0.0)), Signal::Exit);
    }

    #[test]
    fn test_from_file_round_trip() {
        let dir = std::env::temp_dir().join("quantbot-model-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("model.json");
        std::fs::write(
            &path,
            r#"{"weights": [0.1, 0.2, -0.3, 0.0, 1.5, 0.0, 0.0], "bias": -0.25}"#,
        )
        .unwrap();

        let model = LogisticModel::from_file(&path).unwrap();
        assert_eq!(model.threshold, 0.5); // default
        assert_eq!(model.bias, -0.25);
    }

    #[test]
    fn test_from_file_rejects_wrong_arity() {
        let dir = std::env::temp_dir().join("quantbot-model-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad_model.json");
        std::fs::write(&path, r#"{"weights": [0.1, 0.2], "bias": 0.0}"#).unwrap();

        let err = LogisticModel::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("expected 7"));
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let err = LogisticModel::from_file(Path::new("/nonexistent/model.json")).unwrap_err();
        assert!(matches!(err, BotError::Configuration(_)));
    }
}
