pub mod features;
pub mod model;
pub mod trainer;
pub mod tracker;

pub use features::build_examples;
pub use model::{Model, ModelPrediction};
pub use trainer::{training_rng, ModelTrainer, TrainingConfig, TrainingReport};
pub use tracker::{PredictionStats, PredictionTracker, ScoringPolicy};
