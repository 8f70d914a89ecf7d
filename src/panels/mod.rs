//! Plain-text panels for the terminal front end.

use chrono::{Local, TimeZone};
use std::fmt::Write;

use crate::engine::GameSession;
use crate::indicators::TrendLabel;
use crate::ml::{Model, ModelPrediction, TrainingReport};
use crate::storage::KeyValueStore;
use crate::types::{Outcome, PendingPrediction};

const RULE_WIDTH: usize = 48;

fn header(out: &mut String, title: &str) {
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
}

pub fn home<S: KeyValueStore>(session: &GameSession<S>) -> String {
    let mut out = String::new();
    header(&mut out, "Welcome");
    let _ = writeln!(out, "Total results:      {}", session.outcomes().len());
    let _ = writeln!(out, "Accuracy:           {}%", session.accuracy_percent());
    let _ = writeln!(out, "Total predictions:  {}", session.stats().total_predictions);
    if let Some(pending) = session.pending() {
        let _ = write!(out, "Pending:            {}", prediction(pending));
    }
    match session.model() {
        Some(model) => {
            let _ = writeln!(out, "Model:              trained, test acc {}%", model.test_acc);
        }
        None => {
            let _ = writeln!(out, "Model:              not trained");
        }
    }
    out
}

pub fn stats<S: KeyValueStore>(session: &GameSession<S>) -> String {
    let stats = session.stats();
    let mut out = String::new();
    header(&mut out, "Game Statistics");
    let _ = writeln!(out, "Total results:        {}", session.outcomes().len());
    let _ = writeln!(out, "Prediction accuracy:  {}%", stats.accuracy_percent());
    let _ = writeln!(out, "Total predictions:    {}", stats.total_predictions);
    let _ = writeln!(out, "Correct predictions:  {}", stats.correct_predictions);
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
    let _ = writeln!(out, "Recent trends");
    out.push_str(&recent_trends(&session.trends(), 5));
    out
}

/// The last `n` trend labels, numbered by their position in the history
pub fn recent_trends(labels: &[TrendLabel], n: usize) -> String {
    if labels.is_empty() {
        return "  No trends yet\n".to_string();
    }
    let start = labels.len().saturating_sub(n);
    let mut out = String::new();
    for (i, label) in labels.iter().enumerate().skip(start) {
        let _ = writeln!(out, "  Period {}: {}", i + 1, label);
    }
    out
}

/// Newest first
pub fn history(outcomes: &[Outcome], limit: usize) -> String {
    let mut out = String::new();
    header(&mut out, &format!("Historical Data (last {})", limit));
    let _ = writeln!(out, "{:<12} {:>6}  {}", "Period", "Result", "Type");
    if outcomes.is_empty() {
        let _ = writeln!(out, "No data");
    }
    for outcome in outcomes.iter().rev().take(limit) {
        let _ = writeln!(
            out,
            "{:<12} {:>6}  {}",
            outcome.period(),
            outcome.value(),
            outcome.category()
        );
    }
    out
}

/// Compact newest-first list, e.g. after adding a result
pub fn last_ten(outcomes: &[Outcome]) -> String {
    if outcomes.is_empty() {
        return "No data\n".to_string();
    }
    let mut out = String::new();
    for outcome in outcomes.iter().rev().take(10) {
        let _ = writeln!(out, "{}", outcome);
    }
    out
}

pub fn prediction(prediction: &PendingPrediction) -> String {
    match prediction.confidence {
        Some(confidence) => format!(
            "Prediction ({}): {}   Big probability: {}%   Color suggestion: {}\n",
            prediction.source, prediction.category, confidence, prediction.color
        ),
        None => format!(
            "Prediction ({}): {}   Color suggestion: {}\n",
            prediction.source, prediction.category, prediction.color
        ),
    }
}

pub fn model_prediction(prediction: &ModelPrediction) -> String {
    format!(
        "Model prediction: {}   Big probability: {}% (p={:.4})   Color suggestion: {}\n",
        prediction.category, prediction.confidence, prediction.probability, prediction.color
    )
}

pub fn training(report: &TrainingReport) -> String {
    let mut out = String::new();
    header(&mut out, "Model Training");
    let _ = writeln!(
        out,
        "Examples:        {} ({} train / {} test)",
        report.samples, report.train_samples, report.test_samples
    );
    let _ = writeln!(
        out,
        "Class balance:   {} big / {} small",
        report.bigs_in_data, report.smalls_in_data
    );
    let _ = writeln!(out, "Train accuracy:  {}%", report.train_accuracy);
    let _ = writeln!(out, "Test accuracy:   {}%", report.test_accuracy);
    out
}

pub fn model(model: &Model) -> String {
    let mut out = String::new();
    header(&mut out, "Model");
    let trained_at = Local
        .timestamp_millis_opt(model.trained_at)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| model.trained_at.to_string());
    let _ = writeln!(out, "Trained at:      {}", trained_at);
    let _ = writeln!(out, "Train accuracy:  {}%", model.train_acc);
    let _ = writeln!(out, "Test accuracy:   {}%", model.test_acc);
    let _ = writeln!(out, "Bias:            {:.4}", model.bias);
    let weights: Vec<String> = model.weights.iter().map(|w| format!("{:.4}", w)).collect();
    let _ = writeln!(out, "Weights:         [{}]", weights.join(", "));
    out
}

pub fn activity<S: KeyValueStore>(session: &GameSession<S>, limit: usize) -> String {
    let mut out = String::new();
    for entry in session.log().recent(limit) {
        let _ = writeln!(out, "{:<8} {}", entry.severity.as_str(), entry);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, Color};

    fn outcomes(values: &[u8]) -> Vec<Outcome> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| Outcome::new((100 + i).to_string(), v).unwrap())
            .collect()
    }

    #[test]
    fn test_recent_trends_numbering() {
        let labels = vec![TrendLabel::Big; 7];
        let text = recent_trends(&labels, 5);
        assert_eq!(text.lines().count(), 5);
        assert!(text.starts_with("  Period 3: big"));
        assert!(text.trim_end().ends_with("Period 7: big"));
        assert_eq!(recent_trends(&[], 5), "  No trends yet\n");
    }

    #[test]
    fn test_history_newest_first() {
        let text = history(&outcomes(&[1, 8, 4]), 50);
        let rows: Vec<&str> = text.lines().skip(4).collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].starts_with("102"));
        assert!(rows[2].starts_with("100"));
    }

    #[test]
    fn test_last_ten_limits() {
        let text = last_ten(&outcomes(&[1; 15]));
        assert_eq!(text.lines().count(), 10);
        assert_eq!(text.lines().next(), Some("114: 1 (small)"));
    }

    #[test]
    fn test_prediction_lines() {
        let heuristic = PendingPrediction::heuristic(Category::Big, Color::Green);
        assert_eq!(
            prediction(&heuristic),
            "Prediction (heuristic): big   Color suggestion: green\n"
        );
        let model = PendingPrediction::model(Category::Small, 31, Color::Red);
        assert!(prediction(&model).contains("Big probability: 31%"));
    }
}
