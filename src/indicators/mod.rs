pub mod trend;

pub use trend::*;

use crate::types::{Category, Outcome};

/// Up to the last `n` outcomes, oldest first
pub fn last_n(outcomes: &[Outcome], n: usize) -> &[Outcome] {
    let start = outcomes.len().saturating_sub(n);
    &outcomes[start..]
}

/// (big, small) counts over a window
pub fn category_counts(window: &[Outcome]) -> (usize, usize) {
    let big = window.iter().filter(|o| o.category() == Category::Big).count();
    (big, window.len() - big)
}

/// Number of neighbouring pairs that share a category
pub fn equal_adjacent_pairs(window: &[Outcome]) -> usize {
    window
        .windows(2)
        .filter(|pair| pair[0].category() == pair[1].category())
        .count()
}
