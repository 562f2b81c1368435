//! Differencing and integration of univariate series
//!
//! `difference` removes `d` orders of integration from a series, and
//! `integrate` maps values forecast on the differenced scale back onto the
//! level of the original series.

/// Apply `d` rounds of first differencing to a series.
///
/// Each round shortens the series by one value. Differencing stops early
/// once the series has a single value left.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            break;
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Integrate values that continue a `d`-times differenced series.
///
/// `differenced` holds values that follow the end of `difference(original, d)`.
/// The result continues `original` on its own scale.
pub fn integrate(differenced: &[f64], original: &[f64], d: usize) -> Vec<f64> {
    if d == 0 || differenced.is_empty() {
        return differenced.to_vec();
    }

    let mut result = differenced.to_vec();

    // Undo one level at a time, anchoring each cumulative sum on the last
    // value of the matching intermediate difference of the original.
    for level in (0..d).rev() {
        let anchor = difference(original, level).last().copied().unwrap_or(0.0);

        let mut cumulative = anchor;
        result = result
            .iter()
            .map(|step| {
                cumulative += step;
                cumulative
            })
            .collect();
    }

    result
}
