use rand::Rng;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{Settings, StorageSettings};
use crate::error::{GameError, Result};
use crate::indicators::{analyze_trends, last_n, TrendLabel};
use crate::ml::{
    build_examples, Model, ModelPrediction, ModelTrainer, PredictionStats, PredictionTracker,
    TrainingReport,
};
use crate::notifications::ActivityLog;
use crate::storage::KeyValueStore;
use crate::strategies::HeuristicPredictor;
use crate::types::{Category, Outcome, PendingPrediction, MAX_RESULT};

/// Results written on first start when nothing is stored yet
const SAMPLE_DATA: [(&str, u8); 5] = [("100", 5), ("101", 3), ("102", 8), ("103", 2), ("104", 7)];

/// Result of appending an outcome
#[derive(Debug, Clone, PartialEq)]
pub struct AddedOutcome {
    pub outcome: Outcome,
    /// Whether the pending prediction was right, None if nothing was pending
    pub scored: Option<bool>,
}

/// All game state for one player, backed by a key-value store.
///
/// Outcomes, stats and the model are persisted under their own keys. The
/// pending prediction only lives as long as the session.
pub struct GameSession<S: KeyValueStore> {
    store: S,
    storage: StorageSettings,
    outcomes: Vec<Outcome>,
    pending: Option<PendingPrediction>,
    tracker: PredictionTracker,
    model: Option<Model>,
    heuristic: HeuristicPredictor,
    trainer: ModelTrainer,
    log: ActivityLog,
}

impl<S: KeyValueStore> GameSession<S> {
    pub fn open(store: S, settings: &Settings) -> Result<Self> {
        let mut session = Self {
            store,
            storage: settings.storage.clone(),
            outcomes: Vec::new(),
            pending: None,
            tracker: PredictionTracker::new(PredictionStats::default(), settings.game.scoring_policy),
            model: None,
            heuristic: HeuristicPredictor::new(),
            trainer: ModelTrainer::new(settings.training.clone()),
            log: ActivityLog::new(settings.game.log_capacity),
        };
        session.load()?;
        Ok(session)
    }

    fn load(&mut self) -> Result<()> {
        self.load_outcomes()?;
        self.load_stats()?;
        self.load_model()?;
        debug!(
            "Session loaded: {} results, {} predictions, model={}",
            self.outcomes.len(),
            self.tracker.stats().total_predictions,
            self.model.is_some()
        );
        Ok(())
    }

    fn load_outcomes(&mut self) -> Result<()> {
        match self.store.get(&self.storage.data_key)? {
            Some(raw) => match serde_json::from_str::<Vec<Outcome>>(&raw) {
                Ok(outcomes) => self.outcomes = outcomes,
                Err(e) => {
                    self.outcomes = Vec::new();
                    let err = GameError::corrupt("data", e);
                    self.log.error(format!("{}. Resetting.", err));
                }
            },
            None if self.storage.seed_sample_data => {
                self.outcomes = sample_outcomes()?;
                self.save_outcomes()?;
                self.log.info("Created sample data set.");
            }
            None => self.outcomes = Vec::new(),
        }
        Ok(())
    }

    fn load_stats(&mut self) -> Result<()> {
        let stats = match self.store.get(&self.storage.stats_key)? {
            Some(raw) => match serde_json::from_str::<PredictionStats>(&raw) {
                Ok(stats) => stats,
                Err(e) => {
                    warn!("{}", GameError::corrupt("stats", e));
                    PredictionStats::default()
                }
            },
            None => PredictionStats::default(),
        };
        self.tracker = PredictionTracker::new(stats, self.tracker.policy());
        Ok(())
    }

    fn load_model(&mut self) -> Result<()> {
        self.model = match self.store.get(&self.storage.model_key)? {
            Some(raw) => match Model::load_from_json(&raw) {
                Ok(model) => Some(model),
                Err(e) => {
                    self.log.error(format!("{}. Discarding saved model.", e));
                    None
                }
            },
            None => None,
        };
        Ok(())
    }

    fn save_outcomes(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.outcomes)?;
        self.store.put(&self.storage.data_key, &json)
    }

    fn save_stats(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.tracker.stats())?;
        self.store.put(&self.storage.stats_key, &json)
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    /// Up to the last `n` results, oldest first
    pub fn last(&self, n: usize) -> &[Outcome] {
        last_n(&self.outcomes, n)
    }

    pub fn pending(&self) -> Option<&PendingPrediction> {
        self.pending.as_ref()
    }

    pub fn stats(&self) -> PredictionStats {
        self.tracker.stats()
    }

    pub fn accuracy_percent(&self) -> u64 {
        self.tracker.stats().accuracy_percent()
    }

    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    pub fn trends(&self) -> Vec<TrendLabel> {
        analyze_trends(&self.outcomes)
    }

    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut ActivityLog {
        &mut self.log
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate and append a result, then score the pending prediction
    pub fn add_outcome(&mut self, period: &str, value: &str) -> Result<AddedOutcome> {
        let outcome = Outcome::parse(period, value)?;
        self.outcomes.push(outcome.clone());
        self.save_outcomes()?;

        let scored = self.tracker.record(&mut self.pending, outcome.category());
        if let Some(correct) = scored {
            self.save_stats()?;
            if correct {
                self.log.success("Last prediction was correct!");
            } else {
                self.log.error("Last prediction was incorrect.");
            }
        }

        self.log.success(format!(
            "Added result: Period {}, result {}, type {}",
            outcome.period(),
            outcome.value(),
            outcome.category()
        ));

        Ok(AddedOutcome { outcome, scored })
    }

    pub fn predict_heuristic(&mut self, digits: &str) -> Result<PendingPrediction> {
        let prediction = self.heuristic.predict(digits, &self.outcomes)?;
        self.log.success(format!(
            "Prediction: {} (color: {})",
            prediction.category, prediction.color
        ));
        self.pending = Some(prediction.clone());
        Ok(prediction)
    }

    pub fn predict_with_model(&mut self, code: Option<&str>) -> Result<ModelPrediction> {
        let model = self.model.as_ref().ok_or(GameError::NoModel)?;
        let prediction = model.predict_latest(&self.outcomes, code)?;

        self.pending = Some(PendingPrediction::model(
            prediction.category,
            prediction.confidence,
            prediction.color,
        ));
        self.log.success(format!(
            "Model prediction: {} ({}% big, color: {})",
            prediction.category, prediction.confidence, prediction.color
        ));
        Ok(prediction)
    }

    pub fn clear_prediction(&mut self) {
        self.pending = None;
        self.log.info("Cleared current prediction.");
    }

    /// Train a new model on the full history. On failure the previous
    /// model, if any, stays in place.
    pub fn train_model<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<TrainingReport> {
        let examples = build_examples(&self.outcomes);
        let (model, report) = self.trainer.train(&examples, rng)?;

        self.store.put(&self.storage.model_key, &model.save_to_json()?)?;
        self.model = Some(model);
        self.log.success(format!(
            "Model trained on {} examples. Train acc {}%, test acc {}%",
            report.samples, report.train_accuracy, report.test_accuracy
        ));
        Ok(report)
    }

    /// Pretty-printed JSON array of all results
    pub fn export_json(&mut self) -> Result<String> {
        let json = serde_json::to_string_pretty(&self.outcomes)?;
        self.log.info("Exported data JSON.");
        Ok(json)
    }

    /// Replace the whole history with a JSON array.
    ///
    /// `period` may be a string or number, `result` a number or numeric
    /// string. The category is recomputed from `result`; a disagreeing
    /// `type` in the source is ignored. Nothing changes if any element is
    /// invalid.
    pub fn import_json(&mut self, text: &str) -> Result<usize> {
        let parsed: Value = serde_json::from_str(text)
            .map_err(|e| GameError::validation(format!("Failed to import: {}", e)))?;
        let items = parsed
            .as_array()
            .ok_or_else(|| GameError::validation("Failed to import: Invalid format"))?;

        let mut imported = Vec::with_capacity(items.len());
        let mut mismatched = 0;
        for (index, item) in items.iter().enumerate() {
            let (outcome, stated) = coerce_outcome(item)
                .map_err(|e| GameError::validation(format!("Failed to import: item {}: {}", index, e)))?;
            if stated.is_some_and(|c| c != outcome.category()) {
                mismatched += 1;
            }
            imported.push(outcome);
        }

        if mismatched > 0 {
            warn!("{} imported results had a type that disagreed with their result", mismatched);
            self.log.info(format!(
                "Recomputed type for {} imported results.",
                mismatched
            ));
        }

        let count = imported.len();
        self.outcomes = imported;
        self.save_outcomes()?;
        self.log.info("Imported JSON data.");
        Ok(count)
    }

    /// Wipe every stored entry and start over from the defaults
    pub fn reset(&mut self) -> Result<()> {
        self.store.remove(&self.storage.data_key)?;
        self.store.remove(&self.storage.stats_key)?;
        self.store.remove(&self.storage.model_key)?;
        self.pending = None;
        self.load()?;
        self.log.info("Storage reset.");
        Ok(())
    }
}

fn sample_outcomes() -> Result<Vec<Outcome>> {
    SAMPLE_DATA
        .iter()
        .map(|&(period, value)| Outcome::new(period, value))
        .collect()
}

/// `1000.0` -> "1000"; fractional and out-of-range numbers keep their JSON form
fn period_from_number(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

/// Loosely typed import element -> outcome plus the category it claimed
fn coerce_outcome(item: &Value) -> Result<(Outcome, Option<Category>)> {
    let period = match item.get("period") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => period_from_number(n),
        _ => return Err(GameError::validation("period is required")),
    };

    let value = match item.get("result") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    let value = match value {
        Some(v) if v.fract() == 0.0 && (0.0..=MAX_RESULT as f64).contains(&v) => v as u8,
        _ => return Err(GameError::validation("result must be a digit 0-9")),
    };

    let stated = item
        .get("type")
        .and_then(|t| serde_json::from_value::<Category>(t.clone()).ok());

    Ok((Outcome::new(period, value)?, stated))
}
