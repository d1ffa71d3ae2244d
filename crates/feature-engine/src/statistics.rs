//! Windowed Statistics over Ordered Samples

/// Trailing moving average with a minimum period of one.
///
/// The value at `i` is the mean of `values[i + 1 - w..=i]`, clipped at the
/// start of the slice, so the first entries average fewer points.
pub fn trailing_rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);

    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            window_mean(&values[start..=i])
        })
        .collect()
}

/// Centered moving average with a minimum period of one.
///
/// For even windows the extra point sits on the left, matching the usual
/// dataframe convention.
pub fn centered_rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let right = (window - 1) / 2;
    let left = window - 1 - right;
    let n = values.len();

    (0..n)
        .map(|i| {
            let start = i.saturating_sub(left);
            let end = (i + right + 1).min(n);
            window_mean(&values[start..end])
        })
        .collect()
}

/// Mean taken as offsets from the first value, so a constant window returns
/// that value exactly
fn window_mean(slice: &[f64]) -> f64 {
    let first = slice[0];
    first + slice.iter().map(|v| v - first).sum::<f64>() / slice.len() as f64
}

/// First difference with the leading value defined as 0
pub fn diff(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| if i == 0 { 0.0 } else { v - values[i - 1] })
        .collect()
}
