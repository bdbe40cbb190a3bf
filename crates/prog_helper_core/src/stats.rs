//! crates/prog_helper_core/src/stats.rs
//!
//! Pure arithmetic for the per-user counter reconciliation: the incremental
//! rolling mean and the modal classification over recent messages.

use std::collections::HashMap;

/// Folds one new sample into a rolling arithmetic mean.
///
/// This is the exact incremental mean, not an approximation: `old_count` must
/// be the number of samples already folded into `old_avg`.
pub fn rolling_average(old_avg: f64, old_count: i64, sample: f64) -> f64 {
    if old_count <= 0 {
        return sample;
    }
    (old_avg * old_count as f64 + sample) / (old_count as f64 + 1.0)
}

/// Picks the most frequent label among the recent classifications plus the
/// current one.
///
/// Ties are broken by whichever maximal label is encountered first in the
/// count map, which is not deterministic across runs. Callers must not rely
/// on a particular tie-break.
pub fn most_frequent_label(recent: &[String], current: &str) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for label in recent {
        *counts.entry(label.as_str()).or_insert(0) += 1;
    }
    *counts.entry(current).or_insert(0) += 1;

    counts
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .map(|(label, _)| label.to_string())
        .unwrap_or_else(|| current.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolling_average_equals_arithmetic_mean() {
        let samples = [1.2, 0.8, 2.4, 0.5, 3.1];
        let mut avg = 0.0;
        for (i, sample) in samples.iter().enumerate() {
            avg = rolling_average(avg, i as i64, *sample);
        }
        let expected: f64 = samples.iter().sum::<f64>() / samples.len() as f64;
        assert!((avg - expected).abs() < 1e-9);
    }

    #[test]
    fn rolling_average_first_sample_is_the_sample() {
        assert_eq!(rolling_average(0.0, 0, 4.2), 4.2);
    }

    #[test]
    fn most_frequent_counts_the_current_label() {
        let recent = vec![
            "Algorithm Help".to_string(),
            "Code Debugging".to_string(),
            "Code Debugging".to_string(),
        ];
        assert_eq!(most_frequent_label(&recent, "Code Debugging"), "Code Debugging");
    }

    #[test]
    fn current_label_can_tip_the_balance() {
        let recent = vec![
            "Algorithm Help".to_string(),
            "Algorithm Help".to_string(),
            "Syntax Questions".to_string(),
            "Syntax Questions".to_string(),
        ];
        assert_eq!(
            most_frequent_label(&recent, "Syntax Questions"),
            "Syntax Questions"
        );
    }

    #[test]
    fn empty_history_returns_the_current_label() {
        assert_eq!(most_frequent_label(&[], "API Integration"), "API Integration");
    }
}
