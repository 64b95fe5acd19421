//! Small descriptive statistics over `f64` slices.
//!
//! All functions use the population definitions, i.e. the standard deviation divides by `n`.

/// Arithmetic mean, 0 for an empty slice
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    values.iter().sum::<f64>() / n
}

/// Population standard deviation, 0 for an empty slice
#[must_use]
pub fn std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n).sqrt()
}

/// The `p`-th percentile (0..=100), interpolating linearly between the two closest ranks
///
/// Returns `NaN` for an empty slice.
#[must_use]
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    #[allow(clippy::cast_precision_loss)]
    let rank = (p / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    // rank is in [0, len - 1]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (lo, hi) = (rank.floor() as usize, rank.ceil() as usize);
    let fraction = rank - rank.floor();
    sorted[lo] + (sorted[hi] - sorted[lo]) * fraction
}

/// Standardize values to zero mean and unit variance, all zeros when there is no variance
#[must_use]
pub fn z_scores(values: &[f64]) -> Vec<f64> {
    let m = mean(values);
    let s = std(values);
    if s == 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - m) / s).collect()
}

/// Positions of `max` evenly spaced samples out of `len` ordered items.
///
/// Position `i` is `trunc(i * len / max)`; if there are no more than `max` items, all
/// positions are returned.
#[must_use]
pub fn even_spaced(len: usize, max: usize) -> Vec<usize> {
    if len <= max {
        return (0..len).collect();
    }
    #[allow(clippy::cast_precision_loss)]
    let step = len as f64 / max as f64;
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    (0..max).map(|i| (i as f64 * step) as usize).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_mean_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), 5.0);
        assert_eq!(std(&values), 2.0);
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(std(&[]), 0.0);
        assert_eq!(std(&[3.0]), 0.0);
    }

    #[test_case(0.0, 1.0 ; "minimum")]
    #[test_case(100.0, 5.0 ; "maximum")]
    #[test_case(50.0, 3.0 ; "median")]
    #[test_case(25.0, 2.0 ; "first quartile")]
    #[test_case(90.0, 4.6 ; "interpolated")]
    fn test_percentile(p: f64, expected: f64) {
        let values = [5.0, 1.0, 4.0, 2.0, 3.0];
        assert!((percentile(&values, p) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_empty() {
        assert!(percentile(&[], 50.0).is_nan());
    }

    #[test]
    fn test_z_scores() {
        assert_eq!(z_scores(&[1.0, 3.0]), vec![-1.0, 1.0]);
        assert_eq!(z_scores(&[2.0, 2.0, 2.0]), vec![0.0, 0.0, 0.0]);
    }

    #[test_case(5, 8, &[0, 1, 2, 3, 4] ; "fewer than max")]
    #[test_case(8, 8, &[0, 1, 2, 3, 4, 5, 6, 7] ; "exactly max")]
    #[test_case(10, 8, &[0, 1, 2, 3, 5, 6, 7, 8] ; "slightly more")]
    #[test_case(20, 8, &[0, 2, 5, 7, 10, 12, 15, 17] ; "many more")]
    fn test_even_spaced(len: usize, max: usize, expected: &[usize]) {
        assert_eq!(even_spaced(len, max), expected);
    }
}
