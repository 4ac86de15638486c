use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_PARALLEL_SCORING_THRESHOLD;
use crate::error::RecommendError;

/// 综合评分的四因子权重
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoringWeights {
    pub concept_mastery: f64,
    pub difficulty_match: f64,
    pub novelty: f64,
    pub spaced_repetition: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            concept_mastery: 0.40,
            difficulty_match: 0.30,
            novelty: 0.15,
            spaced_repetition: 0.20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoringConfig {
    pub weights: ScoringWeights,
    /// 学习者对题目所有知识点都没有掌握度记录时的默认值
    pub unseen_concept_mastery: f64,
    /// 题目未标注知识点时的默认值
    pub untagged_concept_mastery: f64,
    pub target_accuracy: f64,
    pub accuracy_difficulty_gain: f64,
    /// 难度差归一化跨度（难度 1..5）
    pub difficulty_span: f64,
    /// 按曝光次数索引，超出部分取最后一项
    pub novelty_by_exposure: Vec<f64>,
    pub repetition_due_ratio: f64,
    pub repetition_near_due_ratio: f64,
    pub repetition_near_due_score: f64,
    pub repetition_interval_floor: f64,
    pub struggling_accuracy: f64,
    pub struggling_easy_max_difficulty: i32,
    pub struggling_easy_boost: f64,
    pub struggling_hard_penalty: f64,
    pub confident_accuracy: f64,
    pub confident_hard_min_difficulty: i32,
    pub confident_hard_boost: f64,
    pub confident_easy_penalty: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            unseen_concept_mastery: 0.3,
            untagged_concept_mastery: 0.5,
            target_accuracy: 0.7,
            accuracy_difficulty_gain: 2.0,
            difficulty_span: 4.0,
            novelty_by_exposure: vec![1.0, 0.8, 0.5, 0.2],
            repetition_due_ratio: 0.8,
            repetition_near_due_ratio: 0.6,
            repetition_near_due_score: 0.5,
            repetition_interval_floor: 0.1,
            struggling_accuracy: 0.6,
            struggling_easy_max_difficulty: 2,
            struggling_easy_boost: 1.2,
            struggling_hard_penalty: 0.8,
            confident_accuracy: 0.8,
            confident_hard_min_difficulty: 3,
            confident_hard_boost: 1.2,
            confident_easy_penalty: 0.9,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClassificationConfig {
    pub remediate_mastery: f64,
    pub review_mastery: f64,
    pub review_accuracy: f64,
    pub challenge_mastery: f64,
    pub challenge_difficulty_match: f64,
    pub advance_novelty: f64,
    pub high_priority_mastery: f64,
    pub high_priority_accuracy: f64,
    pub weak_mastery: f64,
    pub strong_mastery: f64,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            remediate_mastery: 0.4,
            review_mastery: 0.7,
            review_accuracy: 0.6,
            challenge_mastery: 0.8,
            challenge_difficulty_match: 0.7,
            advance_novelty: 0.8,
            high_priority_mastery: 0.3,
            high_priority_accuracy: 0.5,
            weak_mastery: 0.3,
            strong_mastery: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyzerConfig {
    pub recent_window: usize,
    pub trend_window: usize,
    pub min_velocity_history: usize,
    pub strength_threshold: f64,
    pub weakness_threshold: f64,
    pub max_listed_concepts: usize,
    pub optimal_time_secs: f64,
    pub review_base_interval_days: f64,
    pub default_accuracy: f64,
    pub default_engagement: f64,
    pub default_velocity: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            recent_window: 20,
            trend_window: 5,
            min_velocity_history: 10,
            strength_threshold: 0.75,
            weakness_threshold: 0.5,
            max_listed_concepts: 5,
            optimal_time_secs: 30.0,
            review_base_interval_days: 7.0,
            default_accuracy: 0.5,
            default_engagement: 0.5,
            default_velocity: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SelectorConfig {
    /// 每种推荐类型上限 = ceil(maxQuestions / divisor)
    pub type_quota_divisor: u32,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            type_quota_divisor: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    pub mastery_threshold: f64,
    pub spaced_repetition_interval_days: u32,
    pub minutes_per_question: u32,
    pub target_accuracy: f64,
    pub fast_adjustment_rate: f64,
    pub slow_adjustment_rate: f64,
    pub velocity_threshold: f64,
    pub max_target_concepts: usize,
    pub difficulty_headroom: i32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mastery_threshold: 0.75,
            spaced_repetition_interval_days: 7,
            minutes_per_question: 2,
            target_accuracy: 0.7,
            fast_adjustment_rate: 0.3,
            slow_adjustment_rate: 0.1,
            velocity_threshold: 0.1,
            max_target_concepts: 3,
            difficulty_headroom: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommenderConfig {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub classification: ClassificationConfig,
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    #[serde(default)]
    pub selector: SelectorConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default = "default_parallel_scoring_threshold")]
    pub parallel_scoring_threshold: usize,
}

fn default_parallel_scoring_threshold() -> usize {
    DEFAULT_PARALLEL_SCORING_THRESHOLD
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            classification: ClassificationConfig::default(),
            analyzer: AnalyzerConfig::default(),
            selector: SelectorConfig::default(),
            session: SessionConfig::default(),
            parallel_scoring_threshold: DEFAULT_PARALLEL_SCORING_THRESHOLD,
        }
    }
}

fn check_unit(name: &str, value: f64) -> Result<(), RecommendError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(RecommendError::invalid_config(format!("{name} must be in [0,1]")));
    }
    Ok(())
}

fn check_positive(name: &str, value: f64) -> Result<(), RecommendError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(RecommendError::invalid_config(format!("{name} must be > 0")));
    }
    Ok(())
}

impl RecommenderConfig {
    pub fn from_env(env_config: &crate::config::RecommenderEnvConfig) -> Self {
        Self {
            parallel_scoring_threshold: env_config.parallel_scoring_threshold,
            ..Self::default()
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, RecommendError> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| RecommendError::invalid_config(format!("config parse: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RecommendError> {
        let w = &self.scoring.weights;
        for (name, value) in [
            ("scoring.weights.conceptMastery", w.concept_mastery),
            ("scoring.weights.difficultyMatch", w.difficulty_match),
            ("scoring.weights.novelty", w.novelty),
            ("scoring.weights.spacedRepetition", w.spaced_repetition),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(RecommendError::invalid_config(format!("{name} must be >= 0")));
            }
        }

        let s = &self.scoring;
        check_unit("scoring.unseenConceptMastery", s.unseen_concept_mastery)?;
        check_unit("scoring.untaggedConceptMastery", s.untagged_concept_mastery)?;
        check_unit("scoring.targetAccuracy", s.target_accuracy)?;
        check_unit("scoring.strugglingAccuracy", s.struggling_accuracy)?;
        check_unit("scoring.confidentAccuracy", s.confident_accuracy)?;
        check_unit("scoring.repetitionNearDueScore", s.repetition_near_due_score)?;
        check_positive("scoring.difficultySpan", s.difficulty_span)?;
        check_positive("scoring.repetitionIntervalFloor", s.repetition_interval_floor)?;
        for (name, value) in [
            ("scoring.strugglingEasyBoost", s.struggling_easy_boost),
            ("scoring.strugglingHardPenalty", s.struggling_hard_penalty),
            ("scoring.confidentHardBoost", s.confident_hard_boost),
            ("scoring.confidentEasyPenalty", s.confident_easy_penalty),
        ] {
            check_positive(name, value)?;
        }
        if s.repetition_near_due_ratio > s.repetition_due_ratio {
            return Err(RecommendError::invalid_config(
                "scoring.repetitionNearDueRatio must be <= repetitionDueRatio",
            ));
        }
        if s.novelty_by_exposure.is_empty() {
            return Err(RecommendError::invalid_config(
                "scoring.noveltyByExposure must not be empty",
            ));
        }
        for value in &s.novelty_by_exposure {
            check_unit("scoring.noveltyByExposure[]", *value)?;
        }
        if s.novelty_by_exposure.windows(2).any(|pair| pair[1] > pair[0]) {
            return Err(RecommendError::invalid_config(
                "scoring.noveltyByExposure must be non-increasing",
            ));
        }

        let c = &self.classification;
        for (name, value) in [
            ("classification.remediateMastery", c.remediate_mastery),
            ("classification.reviewMastery", c.review_mastery),
            ("classification.reviewAccuracy", c.review_accuracy),
            ("classification.challengeMastery", c.challenge_mastery),
            ("classification.challengeDifficultyMatch", c.challenge_difficulty_match),
            ("classification.advanceNovelty", c.advance_novelty),
            ("classification.highPriorityMastery", c.high_priority_mastery),
            ("classification.highPriorityAccuracy", c.high_priority_accuracy),
            ("classification.weakMastery", c.weak_mastery),
            ("classification.strongMastery", c.strong_mastery),
        ] {
            check_unit(name, value)?;
        }
        if c.weak_mastery > c.strong_mastery {
            return Err(RecommendError::invalid_config(
                "classification.weakMastery must be <= strongMastery",
            ));
        }

        let a = &self.analyzer;
        if a.recent_window == 0 || a.trend_window == 0 || a.max_listed_concepts == 0 {
            return Err(RecommendError::invalid_config(
                "analyzer windows and maxListedConcepts must be >= 1",
            ));
        }
        check_unit("analyzer.strengthThreshold", a.strength_threshold)?;
        check_unit("analyzer.weaknessThreshold", a.weakness_threshold)?;
        check_positive("analyzer.optimalTimeSecs", a.optimal_time_secs)?;
        check_positive("analyzer.reviewBaseIntervalDays", a.review_base_interval_days)?;

        if self.selector.type_quota_divisor == 0 {
            return Err(RecommendError::invalid_config(
                "selector.typeQuotaDivisor must be >= 1",
            ));
        }

        check_unit("session.masteryThreshold", self.session.mastery_threshold)?;
        check_unit("session.targetAccuracy", self.session.target_accuracy)?;
        if self.session.difficulty_headroom < 0 {
            return Err(RecommendError::invalid_config(
                "session.difficultyHeadroom must be >= 0",
            ));
        }

        Ok(())
    }
}
