//! Agreement between modelled concentrations and laboratory samples.
//!
//! Only days that carry a sample take part; the modelled series is dense.

use serde::Serialize;

/// Mean of (simulated − observed). Positive = overestimation.
pub fn bias(observed: &[f64], simulated: &[f64]) -> f64 {
    let n = observed.len() as f64;
    simulated
        .iter()
        .zip(observed)
        .map(|(s, o)| s - o)
        .sum::<f64>()
        / n
}

/// Root Mean Square Error. Range: [0, inf), 0 = perfect.
pub fn rmse(observed: &[f64], simulated: &[f64]) -> f64 {
    let n = observed.len() as f64;
    let mse: f64 = observed
        .iter()
        .zip(simulated)
        .map(|(o, s)| (o - s).powi(2))
        .sum::<f64>()
        / n;
    mse.sqrt()
}

/// Mean Absolute Error. Range: [0, inf), 0 = perfect.
pub fn mae(observed: &[f64], simulated: &[f64]) -> f64 {
    let n = observed.len() as f64;
    observed
        .iter()
        .zip(simulated)
        .map(|(o, s)| (o - s).abs())
        .sum::<f64>()
        / n
}

/// Summary of a modelled tracer against its `_sample` column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleComparison {
    pub tracer: String,
    /// Number of sampled days
    pub count: usize,
    pub bias: f64,
    pub rmse: f64,
    pub mae: f64,
}

/// Compare `simulated` with the sampled days of `samples`.
///
/// Returns `None` when no day carries a sample.
pub fn compare(tracer: &str, simulated: &[f64], samples: &[Option<f64>]) -> Option<SampleComparison> {
    let (observed, modelled): (Vec<f64>, Vec<f64>) = samples
        .iter()
        .zip(simulated)
        .filter_map(|(o, s)| o.map(|o| (o, *s)))
        .unzip();
    if observed.is_empty() {
        return None;
    }
    Some(SampleComparison {
        tracer: tracer.to_string(),
        count: observed.len(),
        bias: bias(&observed, &modelled),
        rmse: rmse(&observed, &modelled),
        mae: mae(&observed, &modelled),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_perfect_match() {
        let obs = vec![1.0, 2.0, 3.0];
        assert_relative_eq!(rmse(&obs, &obs), 0.0);
        assert_relative_eq!(bias(&obs, &obs), 0.0);
        assert_relative_eq!(mae(&obs, &obs), 0.0);
    }

    #[test]
    fn test_known_values() {
        let obs = vec![1.0, 2.0, 3.0, 4.0];
        let sim = vec![2.0, 2.0, 2.0, 6.0];
        assert_relative_eq!(bias(&obs, &sim), 0.5, epsilon = 1e-12);
        assert_relative_eq!(mae(&obs, &sim), 1.0, epsilon = 1e-12);
        assert_relative_eq!(rmse(&obs, &sim), (6.0f64 / 4.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_compare_skips_unsampled_days() {
        let simulated = vec![-2.0, -1.5, -1.0, -0.5];
        let samples = vec![None, Some(-1.0), None, Some(-0.5)];
        let cmp = compare("d18O", &simulated, &samples).unwrap();
        assert_eq!(cmp.count, 2);
        assert_relative_eq!(cmp.bias, -0.25, epsilon = 1e-12);
        assert_relative_eq!(cmp.mae, 0.25, epsilon = 1e-12);
        assert_relative_eq!(cmp.rmse, (0.125f64).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_compare_without_samples() {
        assert!(compare("Cl", &[1.0, 2.0], &[None, None]).is_none());
    }
}
