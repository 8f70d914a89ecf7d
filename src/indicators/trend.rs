use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Category, Outcome};

/// Per-result trend marker used by the stats panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendLabel {
    Big,
    Small,
    Change,
}

impl TrendLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendLabel::Big => "big",
            TrendLabel::Small => "small",
            TrendLabel::Change => "change",
        }
    }
}

impl From<Category> for TrendLabel {
    fn from(category: Category) -> Self {
        match category {
            Category::Big => TrendLabel::Big,
            Category::Small => TrendLabel::Small,
        }
    }
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Label every outcome, left to right.
///
/// Each category is compared with the previous *label*, not the previous
/// category. No category ever equals `Change`, so after the first flip every
/// later label is `Change` too.
pub fn analyze_trends(outcomes: &[Outcome]) -> Vec<TrendLabel> {
    let mut labels: Vec<TrendLabel> = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        let current = TrendLabel::from(outcome.category());
        let label = match labels.last() {
            None => current,
            Some(&last) if last == current => current,
            Some(_) => TrendLabel::Change,
        };
        labels.push(label);
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcomes(values: &[u8]) -> Vec<Outcome> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| Outcome::new((100 + i).to_string(), v).unwrap())
            .collect()
    }

    #[test]
    fn test_empty_history() {
        assert!(analyze_trends(&[]).is_empty());
    }

    #[test]
    fn test_change_label_persists() {
        // small, small, big, small
        let labels = analyze_trends(&outcomes(&[1, 2, 7, 3]));
        assert_eq!(
            labels,
            vec![TrendLabel::Small, TrendLabel::Small, TrendLabel::Change, TrendLabel::Change]
        );
    }

    #[test]
    fn test_change_never_recovers() {
        // Once "change" is emitted no category equals it again, even a long
        // run of the same category stays labelled "change".
        let labels = analyze_trends(&outcomes(&[8, 2, 2, 2, 2]));
        assert_eq!(labels[0], TrendLabel::Big);
        assert!(labels[1..].iter().all(|l| *l == TrendLabel::Change));
    }

    #[test]
    fn test_steady_run() {
        let labels = analyze_trends(&outcomes(&[5, 6, 9]));
        assert_eq!(labels, vec![TrendLabel::Big; 3]);
    }
}
