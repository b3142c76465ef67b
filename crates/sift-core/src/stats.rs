//! Robust outlier statistics
//!
//! `mad_flags` marks unusually *high* values using the median and the median
//! absolute deviation (MAD). Each call is an isolated test: thresholds are
//! never shared between calls, so per-group use means one call per group.

/// Default sensitivity: threshold = median + 4 * MAD
pub const DEFAULT_MAD_K: f64 = 4.0;

/// Fewer valid observations than this and nothing is flagged
pub const MIN_OBSERVATIONS: usize = 10;

/// Calculate median of a slice (0.0 when empty)
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Median absolute deviation around `center`
pub fn median_absolute_deviation(values: &[f64], center: f64) -> f64 {
    let deviations: Vec<f64> = values.iter().map(|x| (x - center).abs()).collect();
    median(&deviations)
}

/// Population standard deviation (0.0 when empty)
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// Threshold above which a value counts as an outlier, if the sample is big enough
///
/// Missing and non-finite values are ignored. When the MAD is zero the
/// standard deviation stands in, and `1.0` when that is zero too.
pub fn mad_threshold(values: &[Option<f64>], k: f64) -> Option<f64> {
    let valid: Vec<f64> = values
        .iter()
        .flatten()
        .copied()
        .filter(|v| v.is_finite())
        .collect();

    if valid.len() < MIN_OBSERVATIONS {
        return None;
    }

    let med = median(&valid);
    let mut scale = median_absolute_deviation(&valid, med);
    if scale == 0.0 {
        let sd = std_dev(&valid);
        scale = if sd > 0.0 { sd } else { 1.0 };
    }

    Some(med + k * scale)
}

/// One flag per input position: true when the value is above the robust threshold
pub fn mad_flags(values: &[Option<f64>], k: f64) -> Vec<bool> {
    match mad_threshold(values, k) {
        Some(threshold) => values
            .iter()
            .map(|v| matches!(v, Some(x) if x.is_finite() && *x > threshold))
            .collect(),
        None => vec![false; values.len()],
    }
}
