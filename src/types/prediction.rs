use serde::{Deserialize, Serialize};
use std::fmt;

use super::Category;
use crate::error::{GameError, Result};

/// Color suggestion shown next to a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Green,
}

impl Color {
    /// Red when the number is divisible by 3, green otherwise
    pub fn from_number(number: u32) -> Self {
        if number % 3 == 0 {
            Color::Red
        } else {
            Color::Green
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Green => "green",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionSource {
    Heuristic,
    Model,
}

impl fmt::Display for PredictionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionSource::Heuristic => write!(f, "heuristic"),
            PredictionSource::Model => write!(f, "model"),
        }
    }
}

/// The live prediction waiting to be scored against the next result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPrediction {
    pub category: Category,
    /// Percentage in 0..=100, only set by the model predictor
    pub confidence: Option<u8>,
    pub color: Color,
    pub source: PredictionSource,
}

impl PendingPrediction {
    pub fn heuristic(category: Category, color: Color) -> Self {
        Self {
            category,
            confidence: None,
            color,
            source: PredictionSource::Heuristic,
        }
    }

    pub fn model(category: Category, confidence: u8, color: Color) -> Self {
        Self {
            category,
            confidence: Some(confidence.min(100)),
            color,
            source: PredictionSource::Model,
        }
    }
}

/// Parse an exactly-3-digit code such as "042"
pub fn parse_digit_code(digits: &str) -> Result<u32> {
    if digits.len() != 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(GameError::validation("Please enter exactly 3 digits"));
    }
    digits
        .parse()
        .map_err(|_| GameError::validation("Please enter exactly 3 digits"))
}
