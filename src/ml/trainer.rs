use chrono::Utc;
use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::features::OutcomeFeatures;
use super::model::{sigmoid, Model};
use crate::error::{GameError, Result};

/// Below this many labelled examples training is refused
pub const MIN_TRAINING_EXAMPLES: usize = 6;

/// Share of shuffled examples used for training; the rest is held out
const TRAIN_FRACTION: f64 = 0.8;

/// Initial weights are drawn uniformly from +-this value
const INIT_WEIGHT_RANGE: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub learning_rate: f64,
    pub epochs: usize,
    pub batch_size: usize,
    /// Fixed seed for reproducible runs; entropy when unset
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.2,
            epochs: 300,
            batch_size: 16,
            seed: None,
        }
    }
}

/// Random source for a training run: seeded when the config pins a seed
pub fn training_rng(config: &TrainingConfig) -> StdRng {
    match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Training report after model fit
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub samples: usize,
    pub train_samples: usize,
    pub test_samples: usize,
    pub train_accuracy: u8,
    pub test_accuracy: u8,
    pub bigs_in_data: usize,
    pub smalls_in_data: usize,
}

/// Mini-batch gradient descent for a two-class logistic regression
pub struct ModelTrainer {
    config: TrainingConfig,
}

impl ModelTrainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    /// Fit a fresh model. All randomness (split, init, batch order) comes
    /// from `rng`.
    pub fn train<R: Rng + ?Sized>(
        &self,
        data: &[(OutcomeFeatures, bool)],
        rng: &mut R,
    ) -> Result<(Model, TrainingReport)> {
        let n = data.len();
        if n < MIN_TRAINING_EXAMPLES {
            return Err(GameError::InsufficientData {
                available: n,
                required: MIN_TRAINING_EXAMPLES,
            });
        }

        let num_features = OutcomeFeatures::NUM_FEATURES;
        let mut features = Array2::<f64>::zeros((n, num_features));
        let mut labels = Array1::<f64>::zeros(n);
        for (i, (feat, is_big)) in data.iter().enumerate() {
            let arr = feat.to_array();
            features.row_mut(i).assign(&ArrayView1::from(&arr[..]));
            labels[i] = if *is_big { 1.0 } else { 0.0 };
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);
        let split = ((TRAIN_FRACTION * n as f64).floor() as usize).max(1);
        let (train_idx, test_idx) = order.split_at(split);
        let mut train_idx = train_idx.to_vec();

        let mut weights =
            Array1::from_shape_fn(num_features, |_| rng.gen_range(-INIT_WEIGHT_RANGE..INIT_WEIGHT_RANGE));
        let mut bias = 0.0;

        let lr = self.config.learning_rate;
        let batch_size = self.config.batch_size.max(1);

        for epoch in 0..self.config.epochs {
            train_idx.shuffle(rng);
            sgd_epoch(&mut weights, &mut bias, &features, &labels, &train_idx, batch_size, lr);

            if epoch % 100 == 0 {
                debug!("epoch {}: bias={:.4}", epoch, bias);
            }
        }

        let train_accuracy = accuracy(&weights, bias, &features, &labels, &train_idx);
        let test_accuracy = accuracy(&weights, bias, &features, &labels, test_idx);

        let bigs = data.iter().filter(|(_, big)| *big).count();

        let model = Model {
            weights: weights.to_vec(),
            bias,
            feature_count: num_features,
            trained_at: Utc::now().timestamp_millis(),
            train_acc: train_accuracy,
            test_acc: test_accuracy,
        };

        info!(
            "Model trained: {} samples ({} train / {} test), train acc {}%, test acc {}%",
            n,
            train_idx.len(),
            test_idx.len(),
            train_accuracy,
            test_accuracy
        );

        let report = TrainingReport {
            samples: n,
            train_samples: train_idx.len(),
            test_samples: test_idx.len(),
            train_accuracy,
            test_accuracy,
            bigs_in_data: bigs,
            smalls_in_data: n - bigs,
        };

        Ok((model, report))
    }
}

/// One pass over `order` in consecutive batches. Gradients are averaged over
/// each batch's actual length, so a short trailing batch steps as hard as a
/// full one.
fn sgd_epoch(
    weights: &mut Array1<f64>,
    bias: &mut f64,
    features: &Array2<f64>,
    labels: &Array1<f64>,
    order: &[usize],
    batch_size: usize,
    lr: f64,
) {
    for batch in order.chunks(batch_size) {
        let mut grad = Array1::<f64>::zeros(weights.len());
        let mut grad_bias = 0.0;

        for &i in batch {
            let row = features.row(i);
            let error = sigmoid(weights.dot(&row) + *bias) - labels[i];
            grad.scaled_add(error, &row);
            grad_bias += error;
        }

        let scale = lr / batch.len() as f64;
        weights.scaled_add(-scale, &grad);
        *bias -= scale * grad_bias;
    }
}

/// Rounded percentage of `rows` classified correctly at the 0.5 threshold
fn accuracy(
    weights: &Array1<f64>,
    bias: f64,
    features: &Array2<f64>,
    labels: &Array1<f64>,
    rows: &[usize],
) -> u8 {
    if rows.is_empty() {
        return 0;
    }
    let correct = rows
        .iter()
        .filter(|&&i| {
            let predicted = sigmoid(weights.dot(&features.row(i)) + bias) >= 0.5;
            predicted == (labels[i] >= 0.5)
        })
        .count();
    (correct as f64 * 100.0 / rows.len() as f64).round() as u8
}
