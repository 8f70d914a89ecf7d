use tracing::debug;

use crate::error::Result;
use crate::indicators::{category_counts, equal_adjacent_pairs, last_n};
use crate::types::{parse_digit_code, Category, Color, Outcome, PendingPrediction};

/// Rule-based big/small predictor.
///
/// With enough history it bets on a flip after a steady run, otherwise on
/// the majority of the recent window. With a short history it falls back to
/// the parity of the player's 3-digit code.
#[derive(Debug, Clone)]
pub struct HeuristicPredictor {
    count_window: usize,
    run_window: usize,
    min_equal_pairs: usize,
}

impl HeuristicPredictor {
    pub fn new() -> Self {
        Self {
            count_window: 10,
            run_window: 5,
            min_equal_pairs: 3,
        }
    }

    pub fn predict(&self, digits: &str, outcomes: &[Outcome]) -> Result<PendingPrediction> {
        let number = parse_digit_code(digits)?;

        let (big_count, small_count) = category_counts(last_n(outcomes, self.count_window));

        let category = if outcomes.len() >= self.run_window {
            let recent = last_n(outcomes, self.run_window);
            let equal_pairs = equal_adjacent_pairs(recent);
            debug!(
                "Heuristic: big={} small={} equal_pairs={}",
                big_count, small_count, equal_pairs
            );

            if equal_pairs >= self.min_equal_pairs {
                // Steady run, due for a flip
                match recent.last() {
                    Some(last) => last.category().opposite(),
                    None => Category::Small,
                }
            } else if big_count > small_count {
                Category::Big
            } else {
                Category::Small
            }
        } else if number % 2 == 0 {
            Category::Small
        } else {
            Category::Big
        };

        Ok(PendingPrediction::heuristic(category, Color::from_number(number)))
    }
}

impl Default for HeuristicPredictor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GameError;

    fn history(values: &[u8]) -> Vec<Outcome> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| Outcome::new((100 + i).to_string(), v).unwrap())
            .collect()
    }

    #[test]
    fn test_rejects_bad_digits() {
        let predictor = HeuristicPredictor::new();
        for input in ["", "12", "1234", "abc", "1 3"] {
            let err = predictor.predict(input, &[]).unwrap_err();
            assert!(matches!(err, GameError::Validation(_)), "input {:?}", input);
        }
    }

    #[test]
    fn test_flip_after_steady_run() {
        // big, big, big, small, small: pairs equal, equal, differ, equal
        let outcomes = history(&[7, 8, 9, 1, 2]);
        let prediction = HeuristicPredictor::new().predict("124", &outcomes).unwrap();
        assert_eq!(prediction.category, Category::Big);
        assert_eq!(prediction.color, Color::Green);
        assert_eq!(prediction.confidence, None);
    }

    #[test]
    fn test_majority_when_volatile() {
        // last five alternate, majority over last ten is big
        let outcomes = history(&[9, 9, 9, 9, 9, 1, 8, 2, 7, 3]);
        let prediction = HeuristicPredictor::new().predict("123", &outcomes).unwrap();
        assert_eq!(prediction.category, Category::Big);
        assert_eq!(prediction.color, Color::Red);
    }

    #[test]
    fn test_majority_ignores_results_older_than_ten() {
        // Five old smalls, then ten results with six bigs. Over all fifteen
        // small wins 9-6; over the last ten big wins 6-4. Last five alternate.
        let outcomes = history(&[1, 1, 1, 1, 1, 8, 8, 8, 2, 9, 1, 7, 2, 8, 3]);
        let prediction = HeuristicPredictor::new().predict("125", &outcomes).unwrap();
        assert_eq!(prediction.category, Category::Big);
    }

    #[test]
    fn test_tie_goes_small() {
        let outcomes = history(&[9, 1, 8, 2, 7, 3]);
        let prediction = HeuristicPredictor::new().predict("555", &outcomes).unwrap();
        assert_eq!(prediction.category, Category::Small);
    }

    #[test]
    fn test_short_history_uses_parity() {
        let predictor = HeuristicPredictor::new();
        let outcomes = history(&[5, 3, 8, 2]);
        assert_eq!(predictor.predict("123", &outcomes).unwrap().category, Category::Big);
        assert_eq!(predictor.predict("124", &outcomes).unwrap().category, Category::Small);
        assert_eq!(predictor.predict("000", &[]).unwrap().category, Category::Small);
    }
}
