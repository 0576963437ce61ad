// Core data structures for blogmate keyword discovery

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::utils::error::ValidationError;

// ============================================================================
// Trend data
// ============================================================================

/// Single (date, search ratio) observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub period: NaiveDate,
    pub ratio: f64,
}

impl TrendPoint {
    /// Create a point, clamping negative or non-finite ratios to 0
    pub fn new(period: NaiveDate, ratio: f64) -> Self {
        let ratio = if ratio.is_finite() { ratio.max(0.0) } else { 0.0 };
        Self { period, ratio }
    }
}

/// Direction of a keyword trend, a pure function of momentum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Rising,
    Stable,
    Falling,
}

impl TrendDirection {
    /// Momentum above this (percent) is rising, below its negation falling
    pub const THRESHOLD: f64 = 10.0;

    /// Classify a momentum percentage
    pub fn from_momentum(momentum: f64) -> Self {
        if momentum > Self::THRESHOLD {
            Self::Rising
        } else if momentum < -Self::THRESHOLD {
            Self::Falling
        } else {
            Self::Stable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rising => "rising",
            Self::Stable => "stable",
            Self::Falling => "falling",
        }
    }

    /// Get Korean name
    pub fn korean_name(&self) -> &'static str {
        match self {
            Self::Rising => "상승",
            Self::Stable => "안정",
            Self::Falling => "하락",
        }
    }
}

/// How soon a post about the keyword should go out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishUrgency {
    Now,
    ThisWeek,
    Relaxed,
    Wait,
}

impl PublishUrgency {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Now => "지금 당장 발행 권장 (급상승 트렌드)",
            Self::ThisWeek => "이번 주 안에 발행 권장 (상승세)",
            Self::Relaxed => "여유있게 발행 가능 (안정적)",
            Self::Wait => "다음 기회 대기 권장 (하락세)",
        }
    }
}

/// Derived trend statistics for one keyword
///
/// Only produced by [`crate::analytics::MomentumCalculator`], so the
/// direction always agrees with the momentum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSeries {
    keyword: String,
    points: Vec<TrendPoint>,
    average_ratio: f64,
    recent_ratio: f64,
    momentum: f64,
    velocity: f64,
    direction: TrendDirection,
    total_score: f64,
}

impl TrendSeries {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        keyword: String,
        points: Vec<TrendPoint>,
        average_ratio: f64,
        recent_ratio: f64,
        momentum: f64,
        velocity: f64,
        total_score: f64,
    ) -> Self {
        Self {
            keyword,
            points,
            average_ratio,
            recent_ratio,
            momentum,
            velocity,
            direction: TrendDirection::from_momentum(momentum),
            total_score,
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn points(&self) -> &[TrendPoint] {
        &self.points
    }

    pub fn average_ratio(&self) -> f64 {
        self.average_ratio
    }

    /// Mean of the last 7 points
    pub fn recent_ratio(&self) -> f64 {
        self.recent_ratio
    }

    /// Percent change of the last 7 points over the 7 before them
    pub fn momentum(&self) -> f64 {
        self.momentum
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn direction(&self) -> TrendDirection {
        self.direction
    }

    /// Series-level ranking score (0-100)
    pub fn total_score(&self) -> f64 {
        self.total_score
    }

    pub fn grade(&self) -> Grade {
        Grade::from_score(self.total_score)
    }

    pub fn urgency(&self) -> PublishUrgency {
        match self.direction {
            TrendDirection::Rising if self.momentum > 50.0 => PublishUrgency::Now,
            TrendDirection::Rising if self.momentum > 20.0 => PublishUrgency::ThisWeek,
            TrendDirection::Stable => PublishUrgency::Relaxed,
            _ => PublishUrgency::Wait,
        }
    }
}

// ============================================================================
// Grades and scores
// ============================================================================

/// Opportunity grade, ordered `D < C < B < A < S`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    D,
    C,
    B,
    A,
    S,
}

impl Grade {
    /// All grades from best to worst
    pub const ALL: [Grade; 5] = [Grade::S, Grade::A, Grade::B, Grade::C, Grade::D];

    /// Map a total score onto the grade ladder (S ≥ 80, A ≥ 65, B ≥ 50, C ≥ 35)
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::S
        } else if score >= 65.0 {
            Self::A
        } else if score >= 50.0 {
            Self::B
        } else if score >= 35.0 {
            Self::C
        } else {
            Self::D
        }
    }

    /// Lowest total score that earns this grade
    pub fn min_score(&self) -> f64 {
        match self {
            Self::S => 80.0,
            Self::A => 65.0,
            Self::B => 50.0,
            Self::C => 35.0,
            Self::D => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S => "S",
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }

    /// Get Korean description
    pub fn korean_desc(&self) -> &'static str {
        match self {
            Self::S => "최고 기회",
            Self::A => "높은 기회",
            Self::B => "중간 기회",
            Self::C => "낮은 기회",
            Self::D => "기회 없음",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Grade {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "S" => Ok(Self::S),
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            _ => Err(ValidationError::InvalidGrade(s.to_string())),
        }
    }
}

/// One of the four opportunity sub-scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreFactor {
    SearchDemand,
    Momentum,
    CompetitionGap,
    Suitability,
}

impl ScoreFactor {
    /// Get Korean name
    pub fn korean_name(&self) -> &'static str {
        match self {
            Self::SearchDemand => "검색 수요",
            Self::Momentum => "성장 추세",
            Self::CompetitionGap => "경쟁 공백",
            Self::Suitability => "블로그 적합도",
        }
    }
}

/// Composite blogging opportunity for one keyword
///
/// `total_score` and `grade` are always recomputed from the sub-scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityScore {
    pub keyword: String,
    pub search_demand: f64,
    pub momentum_score: f64,
    pub competition_gap: f64,
    pub suitability: f64,

    // Informational, copied from the trend series
    pub average_ratio: f64,
    pub recent_ratio: f64,
    pub momentum_value: f64,
}

impl OpportunityScore {
    pub const DEMAND_WEIGHT: f64 = 0.30;
    pub const MOMENTUM_WEIGHT: f64 = 0.35;
    pub const GAP_WEIGHT: f64 = 0.20;
    pub const SUITABILITY_WEIGHT: f64 = 0.15;

    /// Weighted sum of the four sub-scores
    #[must_use]
    pub fn total_score(&self) -> f64 {
        self.search_demand * Self::DEMAND_WEIGHT
            + self.momentum_score * Self::MOMENTUM_WEIGHT
            + self.competition_gap * Self::GAP_WEIGHT
            + self.suitability * Self::SUITABILITY_WEIGHT
    }

    #[must_use]
    pub fn grade(&self) -> Grade {
        Grade::from_score(self.total_score())
    }

    fn factors(&self) -> [(ScoreFactor, f64); 4] {
        [
            (ScoreFactor::SearchDemand, self.search_demand),
            (ScoreFactor::Momentum, self.momentum_score),
            (ScoreFactor::CompetitionGap, self.competition_gap),
            (ScoreFactor::Suitability, self.suitability),
        ]
    }

    /// Highest sub-score (first wins on ties)
    pub fn strongest_factor(&self) -> (ScoreFactor, f64) {
        self.factors()
            .into_iter()
            .fold(None, |best: Option<(ScoreFactor, f64)>, cur| match best {
                Some(b) if b.1 >= cur.1 => Some(b),
                _ => Some(cur),
            })
            .unwrap_or((ScoreFactor::SearchDemand, self.search_demand))
    }

    /// Lowest sub-score (first wins on ties)
    pub fn weakest_factor(&self) -> (ScoreFactor, f64) {
        self.factors()
            .into_iter()
            .fold(None, |worst: Option<(ScoreFactor, f64)>, cur| match worst {
                Some(w) if w.1 <= cur.1 => Some(w),
                _ => Some(cur),
            })
            .unwrap_or((ScoreFactor::SearchDemand, self.search_demand))
    }

    /// Korean explanation of the grade
    pub fn grade_reason(&self) -> String {
        match self.grade() {
            Grade::S => format!(
                "최고 등급! 검색 수요({:.1}), 성장세({:.1}), 경쟁 공백({:.1}) 모두 우수합니다.",
                self.search_demand, self.momentum_score, self.competition_gap
            ),
            Grade::A => format!(
                "높은 기회입니다. 특히 {}가 강점입니다.",
                if self.momentum_score >= 70.0 { "성장세" } else { "검색 수요" }
            ),
            Grade::B => format!(
                "중간 수준의 기회입니다. {}를 개선하면 좋습니다.",
                if self.momentum_score < 50.0 { "성장세" } else { "경쟁 공백" }
            ),
            Grade::C => format!(
                "낮은 기회입니다. 검색 수요({:.1})나 성장세({:.1})가 부족합니다.",
                self.search_demand, self.momentum_score
            ),
            Grade::D => "기회가 거의 없습니다. 다른 키워드를 고려하세요.".to_string(),
        }
    }

    pub fn to_summary(&self) -> String {
        let (factor, value) = self.strongest_factor();
        format!(
            "[{}등급] {}\n종합: {:.1}점 | 수요: {:.0} | 추세: {:.0} | 공백: {:.0} | 적합: {:.0}\n강점: {} ({:.1}점)",
            self.grade(),
            self.keyword,
            self.total_score(),
            self.search_demand,
            self.momentum_score,
            self.competition_gap,
            self.suitability,
            factor.korean_name(),
            value
        )
    }
}

/// Count per grade, every grade present (possibly zero)
pub fn grade_distribution(scores: &[OpportunityScore]) -> BTreeMap<Grade, usize> {
    let mut distribution: BTreeMap<Grade, usize> = Grade::ALL.iter().map(|g| (*g, 0)).collect();
    for score in scores {
        *distribution.entry(score.grade()).or_insert(0) += 1;
    }
    distribution
}

// ============================================================================
// Discovery result
// ============================================================================

/// Outcome of one discovery run, also the cached payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryResult {
    pub seed_keyword: String,
    pub generated_count: usize,
    pub analyzed_count: usize,
    /// Sorted by total score, best first
    pub opportunities: Vec<OpportunityScore>,
    pub cache_hit: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl DiscoveryResult {
    /// Elapsed seconds between start and completion
    pub fn processing_time(&self) -> f64 {
        (self.completed_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    /// Analyzed over generated, in percent
    pub fn success_rate(&self) -> f64 {
        if self.generated_count == 0 {
            return 0.0;
        }
        self.analyzed_count as f64 / self.generated_count as f64 * 100.0
    }

    pub fn grade_distribution(&self) -> BTreeMap<Grade, usize> {
        grade_distribution(&self.opportunities)
    }

    pub fn best_opportunity(&self) -> Option<&OpportunityScore> {
        self.opportunities
            .iter()
            .max_by(|a, b| a.total_score().total_cmp(&b.total_score()))
    }

    pub fn average_score(&self) -> f64 {
        if self.opportunities.is_empty() {
            return 0.0;
        }
        self.opportunities.iter().map(|o| o.total_score()).sum::<f64>()
            / self.opportunities.len() as f64
    }

    /// Best `n` opportunities by total score
    pub fn top_opportunities(&self, n: usize) -> Vec<&OpportunityScore> {
        let mut sorted: Vec<&OpportunityScore> = self.opportunities.iter().collect();
        sorted.sort_by(|a, b| b.total_score().total_cmp(&a.total_score()));
        sorted.truncate(n);
        sorted
    }

    pub fn to_summary(&self) -> String {
        let rule = "=".repeat(60);
        let mut lines = vec![
            rule.clone(),
            "Smart Discovery 결과".to_string(),
            rule.clone(),
            String::new(),
            format!("시드 키워드: {}", self.seed_keyword),
            format!("생성 키워드: {}개", self.generated_count),
            format!("분석 완료: {}개", self.analyzed_count),
            format!("성공률: {:.1}%", self.success_rate()),
            format!("소요 시간: {:.1}초", self.processing_time()),
            format!("캐시 사용: {}", if self.cache_hit { "Yes" } else { "No" }),
            String::new(),
            rule.clone(),
            "등급 분포".to_string(),
            rule.clone(),
        ];

        let distribution = self.grade_distribution();
        for grade in Grade::ALL {
            let count = distribution.get(&grade).copied().unwrap_or(0);
            if count > 0 {
                lines.push(format!("{grade}등급: {count}개"));
            }
        }

        if let Some(best) = self.best_opportunity() {
            lines.extend([
                String::new(),
                rule.clone(),
                "최고 기회 키워드".to_string(),
                rule.clone(),
                String::new(),
                format!("키워드: {}", best.keyword),
                format!("종합 점수: {:.1}점", best.total_score()),
                format!("등급: {}", best.grade()),
                format!(
                    "수요: {:.0} | 추세: {:.0} | 공백: {:.0} | 적합: {:.0}",
                    best.search_demand, best.momentum_score, best.competition_gap, best.suitability
                ),
            ]);
        }

        lines.push(rule);
        lines.join("\n")
    }
}
