//! Ordinary least-squares fit of one albedo series against another.

use crate::error::SnicarError;

/// Summary of a straight-line fit `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Regression {
    /// Slope of the fitted line
    pub slope: f64,
    /// Intercept of the fitted line
    pub intercept: f64,
    /// Pearson correlation coefficient
    pub correlation: f64,
    /// Standard error of the slope
    pub slope_stderr: f64,
    /// Number of points in the fit
    pub samples: usize,
}

impl Regression {
    /// Fit `(x, y)` points.
    ///
    /// At least two points with distinct `x` are needed. If every `y` is the
    /// same the correlation is reported as zero.
    pub fn fit(points: &[(f64, f64)]) -> Result<Self, SnicarError> {
        let samples = points.len();
        if samples < 2 {
            return Err(SnicarError::InsufficientData { samples });
        }

        let n = samples as f64;
        let (sum_x, sum_y) = points
            .iter()
            .fold((0., 0.), |(sx, sy), &(x, y)| (sx + x, sy + y));
        let (mean_x, mean_y) = (sum_x / n, sum_y / n);

        // Centred sums of squares and cross products
        let (ss_x, ss_y, ss_xy) =
            points
                .iter()
                .fold((0., 0., 0.), |(ss_x, ss_y, ss_xy), &(x, y)| {
                    let (dx, dy) = (x - mean_x, y - mean_y);
                    (ss_x + dx * dx, ss_y + dy * dy, ss_xy + dx * dy)
                });

        if ss_x == 0. {
            return Err(SnicarError::InsufficientData { samples });
        }

        let slope = ss_xy / ss_x;
        let intercept = mean_y - slope * mean_x;
        let correlation = if ss_y == 0. {
            0.
        } else {
            (ss_xy / (ss_x * ss_y).sqrt()).clamp(-1., 1.)
        };
        let slope_stderr = if samples > 2 {
            ((1. - correlation * correlation) * ss_y / ss_x / (n - 2.)).sqrt()
        } else {
            0.
        };

        Ok(Self {
            slope,
            intercept,
            correlation,
            slope_stderr,
            samples,
        })
    }
}
