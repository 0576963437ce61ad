//! Momentum and trend statistics over a daily search-ratio series
//!
//! This module turns raw [`TrendPoint`]s into a [`TrendSeries`]:
//! - Overall and recent (last 7 points) average ratio
//! - Momentum: percent change of the last 7 points over the previous 7
//! - Velocity: mean day-over-day change
//! - Direction and a series-level ranking score

use crate::models::{TrendDirection, TrendPoint, TrendSeries};
use crate::utils::mean;

/// Derives trend statistics from ordered data points
#[derive(Debug, Clone, Copy, Default)]
pub struct MomentumCalculator;

impl MomentumCalculator {
    /// Size of each comparison window
    pub const WINDOW: usize = 7;

    /// Minimum points needed for a 7-vs-7 comparison
    pub const MIN_POINTS: usize = Self::WINDOW * 2;

    /// Penalty applied to the series score of a falling trend
    const FALLING_PENALTY: f64 = 0.7;

    /// Build a [`TrendSeries`] for `keyword`
    ///
    /// Points are ordered by date first; gaps are not filled in.
    #[must_use]
    pub fn calculate(keyword: impl Into<String>, mut points: Vec<TrendPoint>) -> TrendSeries {
        points.sort_by_key(|p| p.period);
        let ratios: Vec<f64> = points.iter().map(|p| p.ratio).collect();

        let average_ratio = mean(&ratios);
        let recent_ratio = Self::recent_ratio(&ratios);
        let momentum = Self::momentum(&ratios);
        let velocity = Self::velocity(&ratios);
        let total_score = Self::series_score(average_ratio, recent_ratio, momentum);

        TrendSeries::from_parts(
            keyword.into(),
            points,
            average_ratio,
            recent_ratio,
            momentum,
            velocity,
            total_score,
        )
    }

    /// Mean of the last [`Self::WINDOW`] ratios, or of all if fewer
    pub fn recent_ratio(ratios: &[f64]) -> f64 {
        let start = ratios.len().saturating_sub(Self::WINDOW);
        mean(&ratios[start..])
    }

    /// Percent change between the trailing two windows
    ///
    /// Returns 0 with fewer than [`Self::MIN_POINTS`] ratios or when the
    /// previous window averages 0.
    pub fn momentum(ratios: &[f64]) -> f64 {
        if ratios.len() < Self::MIN_POINTS {
            return 0.0;
        }

        let len = ratios.len();
        let previous = mean(&ratios[len - Self::MIN_POINTS..len - Self::WINDOW]);
        let recent = mean(&ratios[len - Self::WINDOW..]);

        if previous == 0.0 {
            return 0.0;
        }

        (recent - previous) / previous * 100.0
    }

    /// Mean of consecutive differences over the whole series
    pub fn velocity(ratios: &[f64]) -> f64 {
        if ratios.len() < 2 {
            return 0.0;
        }
        let deltas: Vec<f64> = ratios.windows(2).map(|w| w[1] - w[0]).collect();
        mean(&deltas)
    }

    /// Series-level score used for raw trend ranking (0-100)
    pub fn series_score(average_ratio: f64, recent_ratio: f64, momentum: f64) -> f64 {
        let normalized_momentum = ((momentum + 100.0) / 2.0).clamp(0.0, 100.0);
        let mut score = average_ratio * 0.4 + recent_ratio * 0.3 + normalized_momentum * 0.3;

        if TrendDirection::from_momentum(momentum) == TrendDirection::Falling {
            score *= Self::FALLING_PENALTY;
        }

        score.clamp(0.0, 100.0)
    }
}
