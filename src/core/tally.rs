use crate::core::models::{option::Opt, vote::Vote};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptionResult {
    pub option_id: Uuid,
    pub text: String,
    pub votes: i64,
    pub percentage: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Results {
    pub total: i64,
    pub options: Vec<OptionResult>,
}

/// `100 * k / n` rounded to the nearest integer, halves up. Zero when `n` is zero.
pub fn percentage(k: i64, n: i64) -> i64 {
    if n <= 0 {
        return 0;
    }
    (200 * k + n) / (2 * n)
}

/// Counts `votes` per option, keeping the order of `options`.
pub fn tally(options: &[Opt], votes: &[Vote]) -> Results {
    let counts = votes.iter().map(|v| v.option_id).counts();
    let total = votes.len() as i64;
    let options = options
        .iter()
        .map(|o| {
            let n = counts.get(&o.id).copied().unwrap_or(0) as i64;
            OptionResult {
                option_id: o.id,
                text: o.text.clone(),
                votes: n,
                percentage: percentage(n, total),
            }
        })
        .collect();
    Results { total, options }
}
