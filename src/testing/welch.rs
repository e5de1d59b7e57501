//! Welch's two-sample t-test (unequal variances)

use statrs::distribution::{ContinuousCDF, StudentsT};

/// Outcome of a single Welch test.
///
/// `degenerate` marks rows where the statistic is undefined and a fallback
/// p-value was assigned instead of aborting the run.
#[derive(Debug, Clone, Copy)]
pub struct WelchOutcome {
    pub t_stat: f64,
    pub df: f64,
    pub p_value: f64,
    pub degenerate: bool,
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Unbiased sample variance (n - 1 denominator)
fn sample_variance(values: &[f64], mean: f64) -> f64 {
    let n = values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)
}

/// Two-sided Welch t-test of `group2` against `group1`.
///
/// The statistic is signed as mean(group2) - mean(group1), matching the
/// fold-change convention. Degenerate cases get a fallback instead of an
/// error:
/// - either group has fewer than 2 samples: p = 1.0
/// - zero pooled standard error, identical means: p = 1.0
/// - zero pooled standard error, different means: p = 0.0 (infinite statistic)
pub fn welch_t_test(group1: &[f64], group2: &[f64]) -> WelchOutcome {
    let (n1, n2) = (group1.len(), group2.len());
    if n1 < 2 || n2 < 2 {
        return WelchOutcome {
            t_stat: f64::NAN,
            df: f64::NAN,
            p_value: 1.0,
            degenerate: true,
        };
    }

    let (m1, m2) = (mean(group1), mean(group2));
    let v1 = sample_variance(group1, m1);
    let v2 = sample_variance(group2, m2);

    let se1 = v1 / n1 as f64;
    let se2 = v2 / n2 as f64;
    let pooled = se1 + se2;

    if pooled == 0.0 {
        let identical = m1 == m2;
        return WelchOutcome {
            t_stat: if identical { f64::NAN } else { (m2 - m1).signum() * f64::INFINITY },
            df: f64::NAN,
            p_value: if identical { 1.0 } else { 0.0 },
            degenerate: true,
        };
    }

    let t_stat = (m2 - m1) / pooled.sqrt();

    // Welch-Satterthwaite degrees of freedom
    let df = pooled.powi(2)
        / (se1.powi(2) / (n1 as f64 - 1.0) + se2.powi(2) / (n2 as f64 - 1.0));

    WelchOutcome {
        t_stat,
        df,
        p_value: pvalue_t(t_stat, df),
        degenerate: false,
    }
}

/// Two-sided p-value from a t-statistic: 2 * P(T >= |t|)
fn pvalue_t(stat: f64, df: f64) -> f64 {
    if !stat.is_finite() || df <= 0.0 || !df.is_finite() {
        return f64::NAN;
    }

    let t_dist = StudentsT::new(0.0, 1.0, df).unwrap();
    2.0 * t_dist.cdf(-stat.abs())
}
