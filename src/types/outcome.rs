use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{GameError, Result};

/// Results at or above this value are "big"
pub const BIG_THRESHOLD: u8 = 5;
pub const MAX_RESULT: u8 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Big,
    Small,
}

impl Category {
    pub fn from_value(value: u8) -> Self {
        if value >= BIG_THRESHOLD {
            Category::Big
        } else {
            Category::Small
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Category::Big => Category::Small,
            Category::Small => Category::Big,
        }
    }

    pub fn is_big(&self) -> bool {
        matches!(self, Category::Big)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Big => "big",
            Category::Small => "small",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One recorded game round.
/// The category is always derived from the value, never supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredOutcome")]
pub struct Outcome {
    period: String,
    #[serde(rename = "result")]
    value: u8,
    #[serde(rename = "type")]
    category: Category,
}

impl Outcome {
    pub fn new(period: impl Into<String>, value: u8) -> Result<Self> {
        let period = period.into();
        if period.trim().is_empty() {
            return Err(GameError::validation("Period is required"));
        }
        if value > MAX_RESULT {
            return Err(GameError::validation("Result must be single digit 0-9"));
        }
        Ok(Self {
            period,
            value,
            category: Category::from_value(value),
        })
    }

    /// Parse raw user input, e.g. from the command line
    pub fn parse(period: &str, value: &str) -> Result<Self> {
        let value = value.trim();
        if value.len() != 1 || !value.chars().all(|c| c.is_ascii_digit()) {
            return Err(GameError::validation("Result must be single digit 0-9"));
        }
        let value: u8 = value
            .parse()
            .map_err(|_| GameError::validation("Result must be single digit 0-9"))?;
        Self::new(period.trim(), value)
    }

    pub fn period(&self) -> &str {
        &self.period
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn is_big(&self) -> bool {
        self.category.is_big()
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.period, self.value, self.category)
    }
}

/// Wire shape of a saved outcome. The stored `type` is ignored on load
/// and recomputed from `result`.
#[derive(Debug, Deserialize)]
struct StoredOutcome {
    period: String,
    result: u8,
    #[serde(rename = "type")]
    #[allow(dead_code)]
    category: Option<Category>,
}

impl TryFrom<StoredOutcome> for Outcome {
    type Error = GameError;

    fn try_from(stored: StoredOutcome) -> Result<Self> {
        Outcome::new(stored.period, stored.result)
    }
}
