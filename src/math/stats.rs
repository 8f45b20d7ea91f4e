//! Summary statistics over realization ensembles

/// Arithmetic mean of a sample, zero for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation, zero for fewer than two samples
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let mu = mean(values);
    let sum_sq = values.iter().map(|&v| (v - mu) * (v - mu)).sum::<f64>();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}
