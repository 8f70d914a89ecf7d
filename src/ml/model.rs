use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::features::{latest_features, OutcomeFeatures, WINDOW};
use crate::error::{GameError, Result};
use crate::types::{parse_digit_code, Category, Color, Outcome};

/// Trained logistic regression coefficients, stored as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub weights: Vec<f64>,
    pub bias: f64,
    pub feature_count: usize,
    /// Epoch milliseconds
    pub trained_at: i64,
    pub train_acc: u8,
    pub test_acc: u8,
}

/// Output of the model predictor
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPrediction {
    pub category: Category,
    /// Probability that the next result is big
    pub probability: f64,
    /// `round(probability * 100)`, whichever category wins
    pub confidence: u8,
    pub color: Color,
}

impl Model {
    /// Raw probability of "big" for a feature vector
    pub fn probability(&self, features: &OutcomeFeatures) -> f64 {
        let arr = features.to_array();
        let z = ArrayView1::from(&self.weights[..]).dot(&ArrayView1::from(&arr[..])) + self.bias;
        sigmoid(z)
    }

    /// Classify the most recent three results.
    ///
    /// `code` is the player's optional 3-digit code; it only affects the
    /// color suggestion.
    pub fn predict_latest(&self, outcomes: &[Outcome], code: Option<&str>) -> Result<ModelPrediction> {
        let features = latest_features(outcomes).ok_or(GameError::InsufficientHistory {
            available: outcomes.len(),
            required: WINDOW,
        })?;

        let probability = self.probability(&features);
        let category = if probability >= 0.5 { Category::Big } else { Category::Small };
        let confidence = (probability * 100.0).round() as u8;

        let color = match code {
            Some(digits) => Color::from_number(parse_digit_code(digits)?),
            None => match outcomes.last() {
                Some(last) => Color::from_number(last.value() as u32),
                None => Color::Green,
            },
        };

        debug!("Model prediction: p_big={:.4} -> {}", probability, category);

        Ok(ModelPrediction { category, probability, confidence, color })
    }

    /// Reject models whose shape does not match the feature builder
    pub fn validate(&self) -> Result<()> {
        if self.feature_count != OutcomeFeatures::NUM_FEATURES
            || self.weights.len() != self.feature_count
        {
            return Err(GameError::corrupt(
                "model",
                format!(
                    "expected {} weights, got {} (featureCount {})",
                    OutcomeFeatures::NUM_FEATURES,
                    self.weights.len(),
                    self.feature_count
                ),
            ));
        }
        if !self.bias.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err(GameError::corrupt("model", "non-finite coefficient"));
        }
        Ok(())
    }

    pub fn save_to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn load_from_json(json: &str) -> Result<Self> {
        let model: Model =
            serde_json::from_str(json).map_err(|e| GameError::corrupt("model", e))?;
        model.validate()?;
        Ok(model)
    }
}

pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(weights: [f64; 8], bias: f64) -> Model {
        Model {
            weights: weights.to_vec(),
            bias,
            feature_count: 8,
            trained_at: 1_700_000_000_000,
            train_acc: 60,
            test_acc: 50,
        }
    }

    fn history(values: &[u8]) -> Vec<Outcome> {
        values
            .iter()
            .map(|&v| Outcome::new("p", v).unwrap())
            .collect()
    }

    #[test]
    fn test_sigmoid() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(10.0) > 0.99);
        assert!(sigmoid(-10.0) < 0.01);
    }

    #[test]
    fn test_needs_three_results() {
        let m = model([0.0; 8], 0.0);
        let err = m.predict_latest(&history(&[1, 2]), None).unwrap_err();
        assert!(matches!(err, GameError::InsufficientHistory { available: 2, required: 3 }));
    }

    #[test]
    fn test_confidence_tracks_big_probability() {
        // Strong negative bias: predicts small, confidence stays the low big probability
        let m = model([0.0; 8], -2.0);
        let prediction = m.predict_latest(&history(&[1, 2, 3]), None).unwrap();
        assert_eq!(prediction.category, Category::Small);
        assert_eq!(prediction.confidence, 12);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let m = model([0.0; 8], 0.0);
        let prediction = m.predict_latest(&history(&[1, 2, 3]), Some("124")).unwrap();
        assert_eq!(prediction.category, Category::Big);
        assert_eq!(prediction.confidence, 50);
        assert_eq!(prediction.color, Color::Green);
    }

    #[test]
    fn test_color_from_last_value() {
        let m = model([0.0; 8], 0.0);
        let prediction = m.predict_latest(&history(&[1, 2, 6]), None).unwrap();
        assert_eq!(prediction.color, Color::Red);
        let prediction = m.predict_latest(&history(&[1, 2, 7]), None).unwrap();
        assert_eq!(prediction.color, Color::Green);
    }

    #[test]
    fn test_bad_code_rejected() {
        let m = model([0.0; 8], 0.0);
        let err = m.predict_latest(&history(&[1, 2, 3]), Some("12")).unwrap_err();
        assert!(matches!(err, GameError::Validation(_)));
    }

    #[test]
    fn test_prediction_is_deterministic() {
        let m = model([0.3, -0.2, 0.1, 0.4, -0.5, 0.6, 0.2, -0.1], 0.05);
        let outcomes = history(&[8, 1, 6, 4, 9]);
        let first = m.predict_latest(&outcomes, None).unwrap();
        for _ in 0..10 {
            assert_eq!(m.predict_latest(&outcomes, None).unwrap(), first);
        }
    }

    #[test]
    fn test_json_shape() {
        let m = model([0.5; 8], 0.25);
        let value: serde_json::Value = serde_json::from_str(&m.save_to_json().unwrap()).unwrap();
        assert_eq!(value["featureCount"], 8);
        assert_eq!(value["trainedAt"], 1_700_000_000_000i64);
        assert_eq!(value["trainAcc"], 60);
        assert_eq!(value["testAcc"], 50);
        assert_eq!(value["weights"].as_array().unwrap().len(), 8);

        let loaded = Model::load_from_json(&m.save_to_json().unwrap()).unwrap();
        assert_eq!(loaded, m);
    }

    #[test]
    fn test_reload_keeps_exact_weights() {
        // Shortest repr of these needs the exact float parser to come back bit-for-bit
        let mut m = model([-1.8620501223695103; 8], 0.1 + 0.2);
        m.weights[3] = 0.030713745437342894;
        m.weights[7] = -7.450580596923828e-9;

        let loaded = Model::load_from_json(&m.save_to_json().unwrap()).unwrap();
        for (a, b) in loaded.weights.iter().zip(&m.weights) {
            assert_eq!(a.to_bits(), b.to_bits(), "{} != {}", a, b);
        }
        assert_eq!(loaded.bias.to_bits(), m.bias.to_bits());
    }

    #[test]
    fn test_wrong_weight_count_is_corrupt() {
        let json = r#"{"weights":[0.1,0.2],"bias":0,"featureCount":8,"trainedAt":0,"trainAcc":0,"testAcc":0}"#;
        assert!(matches!(
            Model::load_from_json(json),
            Err(GameError::CorruptState { .. })
        ));
        assert!(Model::load_from_json("not json").is_err());
    }
}
