use serde::{Deserialize, Serialize};

use crate::types::{Outcome, MAX_RESULT};

/// Number of past results each feature vector looks at
pub const WINDOW: usize = 3;

/// Fixed-size feature vector describing three consecutive results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeFeatures {
    pub value_3: f64,
    pub value_2: f64,
    pub value_1: f64,
    pub big_3: f64,
    pub big_2: f64,
    pub big_1: f64,
    pub value_mean: f64,
    pub big_ratio: f64,
}

impl OutcomeFeatures {
    pub const NUM_FEATURES: usize = 8;

    pub fn to_array(&self) -> [f64; Self::NUM_FEATURES] {
        [
            self.value_3,
            self.value_2,
            self.value_1,
            self.big_3,
            self.big_2,
            self.big_1,
            self.value_mean,
            self.big_ratio,
        ]
    }
}

fn big_flag(outcome: &Outcome) -> f64 {
    if outcome.is_big() { 1.0 } else { 0.0 }
}

/// Features for the three results in `window`, oldest first.
/// Returns None unless the window holds exactly three results.
pub fn extract_features(window: &[Outcome]) -> Option<OutcomeFeatures> {
    let [o3, o2, o1] = window else {
        return None;
    };

    let max = MAX_RESULT as f64;
    let value_sum = (o3.value() + o2.value() + o1.value()) as f64;
    let big_sum = big_flag(o3) + big_flag(o2) + big_flag(o1);

    Some(OutcomeFeatures {
        value_3: o3.value() as f64 / max,
        value_2: o2.value() as f64 / max,
        value_1: o1.value() as f64 / max,
        big_3: big_flag(o3),
        big_2: big_flag(o2),
        big_1: big_flag(o1),
        value_mean: value_sum / (max * WINDOW as f64),
        big_ratio: big_sum / WINDOW as f64,
    })
}

/// Features for the most recent three results
pub fn latest_features(outcomes: &[Outcome]) -> Option<OutcomeFeatures> {
    if outcomes.len() < WINDOW {
        return None;
    }
    extract_features(&outcomes[outcomes.len() - WINDOW..])
}

/// One labelled example per result that has three predecessors.
/// The label is true when that result was big.
pub fn build_examples(outcomes: &[Outcome]) -> Vec<(OutcomeFeatures, bool)> {
    outcomes
        .windows(WINDOW + 1)
        .filter_map(|w| {
            let features = extract_features(&w[..WINDOW])?;
            Some((features, w[WINDOW].is_big()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(values: &[u8]) -> Vec<Outcome> {
        values
            .iter()
            .map(|&v| Outcome::new("p", v).unwrap())
            .collect()
    }

    #[test]
    fn test_feature_values() {
        let features = latest_features(&history(&[0, 9, 3, 6])).unwrap();
        let arr = features.to_array();
        assert_eq!(arr.len(), OutcomeFeatures::NUM_FEATURES);
        assert!((arr[0] - 1.0).abs() < 1e-12);
        assert!((arr[1] - 3.0 / 9.0).abs() < 1e-12);
        assert!((arr[2] - 6.0 / 9.0).abs() < 1e-12);
        assert_eq!(&arr[3..6], &[1.0, 0.0, 1.0]);
        assert!((arr[6] - 18.0 / 27.0).abs() < 1e-12);
        assert!((arr[7] - 2.0 / 3.0).abs() < 1e-12);
        assert!(arr.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_examples_need_four_results() {
        assert!(build_examples(&history(&[1, 2, 3])).is_empty());
        assert!(build_examples(&[]).is_empty());

        let examples = build_examples(&history(&[1, 2, 3, 7, 0]));
        assert_eq!(examples.len(), 2);
        assert!(examples[0].1);
        assert!(!examples[1].1);
        assert!((examples[1].0.value_1 - 7.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_latest_features_short_history() {
        assert!(latest_features(&history(&[4, 5])).is_none());
    }
}
