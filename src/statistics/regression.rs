//! Ordinary least squares fit of a value against time

use super::distribution::student_t_two_sided;

/// Result of a simple linear regression `y = intercept + slope * x`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Standard error of the slope, NaN with fewer than three samples
    pub slope_std_err: f64,
    /// Coefficient of determination
    pub r_squared: f64,
    /// Two-sided p-value for the null hypothesis `slope == 0`
    pub p_value: f64,
    /// Number of samples used in the fit
    pub n: usize,
}

impl LinearFit {
    /// Fitted value at `x`
    #[must_use]
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Fit `y` against `x` by ordinary least squares.
///
/// Returns `None` when fewer than two samples are given, the slices differ in
/// length, or every `x` is identical.
#[must_use]
pub fn linear_regression(x: &[f64], y: &[f64]) -> Option<LinearFit> {
    let n = x.len();
    if n < 2 || n != y.len() {
        return None;
    }
    let nf = n as f64;
    let x_mean = x.iter().sum::<f64>() / nf;
    let y_mean = y.iter().sum::<f64>() / nf;

    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }
    if sxx <= 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;
    let r_squared = if syy > 0.0 {
        (sxy * sxy) / (sxx * syy)
    } else {
        0.0
    };

    let (slope_std_err, p_value) = if n > 2 {
        let df = nf - 2.0;
        let sse = (syy - slope * sxy).max(0.0);
        let std_err = (sse / df / sxx).sqrt();
        let p = if std_err > 0.0 {
            student_t_two_sided(slope / std_err, df)
        } else if slope == 0.0 {
            1.0
        } else {
            0.0
        };
        (std_err, p)
    } else {
        (f64::NAN, f64::NAN)
    };

    Some(LinearFit {
        slope,
        intercept,
        slope_std_err,
        r_squared,
        p_value,
        n,
    })
}

/// Fit a half-monthly series against elapsed years, skipping missing samples.
///
/// Sample `i` is placed at `i / periods_per_year` years.
#[must_use]
pub fn series_trend(values: &[f32], periods_per_year: f64) -> Option<LinearFit> {
    let (t, v): (Vec<f64>, Vec<f64>) = values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(i, &v)| (i as f64 / periods_per_year, f64::from(v)))
        .unzip();
    linear_regression(&t, &v)
}
