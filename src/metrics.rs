/// Summary statistics over a set of field values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub p25: f64,
    pub p75: f64,
}

/// Compute value metrics (min, max, mean, median, 25th and 75th percentile). `None` when empty.
pub fn compute_value_stats(values: &[f64]) -> Option<ValueStats> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    Some(ValueStats {
        count: n,
        min: sorted[0],
        max: sorted[n - 1],
        mean,
        median: sorted[n / 2],
        p25: sorted[n / 4],
        p75: sorted[3 * n / 4],
    })
}
