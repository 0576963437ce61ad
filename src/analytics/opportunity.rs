//! Opportunity scoring for analyzed keywords
//!
//! Each [`TrendSeries`] maps to four 0-100 sub-scores which combine into a
//! weighted total and a letter grade. Weights and thresholds are constants.

use std::collections::BTreeMap;

use crate::models::{self, Grade, OpportunityScore, TrendSeries};

/// Keyword fragments that signal blog-friendly phrasing
///
/// Every entry also appears in the long-tail modifier catalog.
pub const BLOG_FRIENDLY_MODIFIERS: &[&str] = &["방법", "추천", "후기", "비교", "가이드", "팁"];

/// Computes [`OpportunityScore`]s from trend series
#[derive(Debug, Clone, Copy, Default)]
pub struct OpportunityScorer;

impl OpportunityScorer {
    const BASE_SUITABILITY: f64 = 50.0;
    const LENGTH_BONUS: f64 = 20.0;
    const LONG_TAIL_BONUS: f64 = 15.0;
    const MODIFIER_BONUS: f64 = 15.0;
    const GAP_FACTOR: f64 = 0.8;

    /// Score a single series
    #[must_use]
    pub fn score(series: &TrendSeries) -> OpportunityScore {
        let score = OpportunityScore {
            keyword: series.keyword().to_string(),
            search_demand: Self::search_demand(series.average_ratio()),
            momentum_score: Self::momentum_score(series.momentum()),
            competition_gap: Self::competition_gap(series.recent_ratio()),
            suitability: Self::suitability(series.keyword()),
            average_ratio: series.average_ratio(),
            recent_ratio: series.recent_ratio(),
            momentum_value: series.momentum(),
        };

        tracing::debug!(
            keyword = %score.keyword,
            total = score.total_score(),
            grade = %score.grade(),
            "Scored keyword"
        );

        score
    }

    /// Score every series, preserving order
    pub fn score_batch(series: &[TrendSeries]) -> Vec<OpportunityScore> {
        series.iter().map(Self::score).collect()
    }

    pub fn search_demand(average_ratio: f64) -> f64 {
        average_ratio.clamp(0.0, 100.0)
    }

    /// 0% momentum maps to 50, ±100% to the ends of the scale
    pub fn momentum_score(momentum: f64) -> f64 {
        (50.0 + momentum / 2.0).clamp(0.0, 100.0)
    }

    pub fn competition_gap(recent_ratio: f64) -> f64 {
        (recent_ratio * Self::GAP_FACTOR).clamp(0.0, 100.0)
    }

    /// Heuristic fit of the phrase for a blog post title
    pub fn suitability(keyword: &str) -> f64 {
        let mut score = Self::BASE_SUITABILITY;

        let length = keyword.chars().count();
        if (5..=15).contains(&length) {
            score += Self::LENGTH_BONUS;
        }

        if keyword.chars().any(char::is_whitespace) {
            score += Self::LONG_TAIL_BONUS;
        }

        if BLOG_FRIENDLY_MODIFIERS.iter().any(|m| keyword.contains(m)) {
            score += Self::MODIFIER_BONUS;
        }

        score.min(100.0)
    }

    /// Keep entries whose grade is at least `min_grade`, preserving order
    pub fn filter_by_grade(scores: Vec<OpportunityScore>, min_grade: Grade) -> Vec<OpportunityScore> {
        let before = scores.len();
        let filtered: Vec<OpportunityScore> = scores
            .into_iter()
            .filter(|s| s.grade() >= min_grade)
            .collect();

        tracing::info!(
            before = before,
            after = filtered.len(),
            min_grade = %min_grade,
            "Filtered opportunities by grade"
        );

        filtered
    }

    /// Sort descending by total score
    pub fn sort_descending(scores: &mut [OpportunityScore]) {
        scores.sort_by(|a, b| b.total_score().total_cmp(&a.total_score()));
    }

    pub fn grade_distribution(scores: &[OpportunityScore]) -> BTreeMap<Grade, usize> {
        models::grade_distribution(scores)
    }

    /// Best `n` entries by total score
    pub fn top_opportunities(scores: &[OpportunityScore], n: usize) -> Vec<OpportunityScore> {
        let mut sorted = scores.to_vec();
        Self::sort_descending(&mut sorted);
        sorted.truncate(n);
        sorted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::MomentumCalculator;
    use crate::models::TrendPoint;
    use chrono::{Duration, NaiveDate};
    use proptest::prelude::*;

    fn series(keyword: &str, previous: f64, recent: f64) -> TrendSeries {
        let start = NaiveDate::from_ymd_opt(2024, 11, 1).unwrap();
        let points = (0..14)
            .map(|i| {
                let ratio = if i < 7 { previous } else { recent };
                TrendPoint::new(start + Duration::days(i), ratio)
            })
            .collect();
        MomentumCalculator::calculate(keyword, points)
    }

    fn fixed(keyword: &str, total_target: f64) -> OpportunityScore {
        OpportunityScore {
            keyword: keyword.to_string(),
            search_demand: total_target,
            momentum_score: total_target,
            competition_gap: total_target,
            suitability: total_target,
            average_ratio: 0.0,
            recent_ratio: 0.0,
            momentum_value: 0.0,
        }
    }

    #[test]
    fn test_sub_scores() {
        let s = OpportunityScorer::score(&series("롱패딩 추천", 40.0, 60.0));
        assert!((s.search_demand - 50.0).abs() < 1e-9);
        assert!((s.momentum_score - 75.0).abs() < 1e-9);
        assert!((s.competition_gap - 48.0).abs() < 1e-9);
        // 6 chars, has whitespace, has 추천
        assert!((s.suitability - 100.0).abs() < 1e-9);
        assert!((s.momentum_value - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_suitability_rules() {
        assert_eq!(OpportunityScorer::suitability("패딩"), 50.0);
        assert_eq!(OpportunityScorer::suitability("겨울롱패딩"), 70.0);
        assert_eq!(OpportunityScorer::suitability("a b"), 65.0);
        assert_eq!(OpportunityScorer::suitability("팁"), 65.0);
        assert_eq!(OpportunityScorer::suitability(&"가".repeat(16)), 50.0);
    }

    #[test]
    fn test_momentum_score_clamped() {
        assert_eq!(OpportunityScorer::momentum_score(0.0), 50.0);
        assert_eq!(OpportunityScorer::momentum_score(300.0), 100.0);
        assert_eq!(OpportunityScorer::momentum_score(-300.0), 0.0);
    }

    #[test]
    fn test_filter_by_grade() {
        let scores = vec![fixed("s", 90.0), fixed("d", 10.0), fixed("c", 40.0), fixed("a", 70.0)];
        let kept = OpportunityScorer::filter_by_grade(scores, Grade::C);
        let names: Vec<&str> = kept.iter().map(|s| s.keyword.as_str()).collect();
        assert_eq!(names, vec!["s", "c", "a"]);
    }

    #[test]
    fn test_top_opportunities() {
        let scores = vec![fixed("low", 20.0), fixed("high", 90.0), fixed("mid", 55.0)];
        let top = OpportunityScorer::top_opportunities(&scores, 2);
        assert_eq!(top[0].keyword, "high");
        assert_eq!(top[1].keyword, "mid");
    }

    proptest! {
        #[test]
        fn prop_total_is_weighted_sum(
            demand in 0.0f64..=100.0,
            momentum in 0.0f64..=100.0,
            gap in 0.0f64..=100.0,
            suitability in 0.0f64..=100.0,
        ) {
            let s = OpportunityScore {
                keyword: "kw".to_string(),
                search_demand: demand,
                momentum_score: momentum,
                competition_gap: gap,
                suitability,
                average_ratio: 0.0,
                recent_ratio: 0.0,
                momentum_value: 0.0,
            };
            let expected = 0.30 * demand + 0.35 * momentum + 0.20 * gap + 0.15 * suitability;
            prop_assert!((s.total_score() - expected).abs() < 1e-9);
            prop_assert!(s.total_score() >= 0.0 && s.total_score() <= 100.0 + 1e-9);
        }

        #[test]
        fn prop_grade_monotonic(a in 0.0f64..=100.0, b in 0.0f64..=100.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(Grade::from_score(lo) <= Grade::from_score(hi));
        }

        #[test]
        fn prop_sub_scores_in_range(previous in 0.0f64..=100.0, recent in 0.0f64..=100.0) {
            let s = OpportunityScorer::score(&series("키워드 방법", previous, recent));
            for v in [s.search_demand, s.momentum_score, s.competition_gap, s.suitability] {
                prop_assert!((0.0..=100.0).contains(&v));
            }
        }
    }
}
