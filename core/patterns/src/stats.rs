use health_insight_schemas::Measurement;

/// Arithmetic mean. Undefined when there are no samples.
pub fn mean<I>(values: I) -> Measurement
where
    I: IntoIterator<Item = f64>,
{
    let (sum, samples) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), value| (sum + value, n + 1));

    if samples == 0 {
        return Measurement::InsufficientData { samples };
    }
    Measurement::Defined {
        value: sum / samples as f64,
        samples,
    }
}

/// Pearson correlation coefficient over `(x, y)` pairs.
///
/// Undefined with fewer than two pairs or when either side has zero variance.
pub fn pearson(pairs: &[(f64, f64)]) -> Measurement {
    let samples = pairs.len();
    if samples < 2 {
        return Measurement::InsufficientData { samples };
    }

    let n = samples as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denominator = (var_x * var_y).sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return Measurement::InsufficientData { samples };
    }

    Measurement::Defined {
        value: (covariance / denominator).clamp(-1.0, 1.0),
        samples,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(
            mean([6.0, 8.0]),
            Measurement::Defined { value: 7.0, samples: 2 }
        );
        assert_eq!(mean(Vec::new()), Measurement::InsufficientData { samples: 0 });
    }

    #[test]
    fn test_pearson_perfect_inverse() {
        let pairs = [(14.0, 8.0), (16.0, 7.0), (18.0, 6.0), (20.0, 5.0)];
        let r = pearson(&pairs).value().unwrap();
        assert!((r + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_pearson_undefined_cases() {
        assert_eq!(
            pearson(&[(1.0, 2.0)]),
            Measurement::InsufficientData { samples: 1 }
        );
        // Constant x: zero variance.
        assert_eq!(
            pearson(&[(15.0, 6.0), (15.0, 8.0), (15.0, 7.0)]),
            Measurement::InsufficientData { samples: 3 }
        );
    }
}
