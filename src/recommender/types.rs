use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MAX_QUESTIONS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceRecord {
    pub question_id: String,
    pub category: String,
    pub difficulty: i32,
    pub correct: bool,
    /// 作答耗时（秒）
    pub time_spent: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub concepts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptMastery {
    pub concept: String,
    pub mastery: f64,
    pub confidence: f64,
    pub last_practiced: DateTime<Utc>,
    pub practice_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub grade: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub learning_style: Option<String>,
    /// 按时间倒序排列（最新记录在前）
    #[serde(default)]
    pub performance_history: Vec<PerformanceRecord>,
    #[serde(default)]
    pub concept_mastery: Vec<ConceptMastery>,
}

impl UserProfile {
    /// 按前导整数解析年级（"5"、"5th" → 5），无法解析时返回 None
    pub fn grade_level(&self) -> Option<i32> {
        let trimmed = self.grade.trim();
        let (sign, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (-1, rest),
            None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let end = digits
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(digits.len());
        if end == 0 {
            return None;
        }
        digits[..end].parse::<i32>().ok().map(|v| sign * v)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateQuestion {
    pub id: String,
    pub category: String,
    pub difficulty: i32,
    #[serde(default)]
    pub concepts: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationType {
    Review,
    Advance,
    Reinforce,
    Challenge,
    Remediate,
}

impl RecommendationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Review => "REVIEW",
            Self::Advance => "ADVANCE",
            Self::Reinforce => "REINFORCE",
            Self::Challenge => "CHALLENGE",
            Self::Remediate => "REMEDIATE",
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            Self::Review => "Review",
            Self::Advance => "Advance to new material",
            Self::Reinforce => "Reinforce",
            Self::Challenge => "Challenge yourself",
            Self::Remediate => "Remediate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// 排序键：HIGH 最先
    pub fn rank(&self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MasteryDescriptor {
    Weak,
    Developing,
    Strong,
}

impl MasteryDescriptor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weak => "weak",
            Self::Developing => "developing",
            Self::Strong => "strong",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecommendation {
    pub question_id: String,
    pub score: f64,
    pub reasoning: String,
    pub category: String,
    pub difficulty: i32,
    pub concepts: Vec<String>,
    pub recommendation_type: RecommendationType,
    pub priority: Priority,
}

pub fn build_reasoning(
    recommendation_type: RecommendationType,
    descriptor: MasteryDescriptor,
    concepts: &[String],
) -> String {
    let topic = if concepts.is_empty() {
        "this topic".to_string()
    } else {
        concepts.join(", ")
    };
    format!(
        "{}: {} mastery of {}",
        recommendation_type.verb(),
        descriptor.as_str(),
        topic
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Practice,
    Assessment,
    Review,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub user_id: String,
    #[serde(default)]
    pub session_type: Option<SessionType>,
    #[serde(default = "default_max_questions")]
    pub max_questions: u32,
    #[serde(default)]
    pub target_difficulty: Option<i32>,
    #[serde(default)]
    pub focus_concepts: Option<Vec<String>>,
    #[serde(default)]
    pub exclude_question_ids: Option<Vec<String>>,
}

fn default_max_questions() -> u32 {
    DEFAULT_MAX_QUESTIONS
}

impl RecommendationRequest {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            session_type: None,
            max_questions: DEFAULT_MAX_QUESTIONS,
            target_difficulty: None,
            focus_concepts: None,
            exclude_question_ids: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    pub session_id: String,
    pub user_id: String,
    pub start_time: DateTime<Utc>,
    /// 预计时长（分钟）
    pub estimated_duration: u32,
    pub target_concepts: Vec<String>,
    pub difficulty_range: [i32; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_type: Option<SessionType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveSettings {
    pub initial_difficulty: f64,
    pub difficulty_adjustment_rate: f64,
    pub mastery_threshold: f64,
    /// 间隔重复周期（天）
    pub spaced_repetition_interval: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    pub recommendations: Vec<QuestionRecommendation>,
    pub session_metadata: SessionMetadata,
    pub adaptive_settings: AdaptiveSettings,
}

/// 由作答历史与知识点掌握度推导出的当前学习状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningState {
    pub overall_accuracy: f64,
    pub concept_strengths: Vec<String>,
    pub concept_weaknesses: Vec<String>,
    /// 目前评分与会话规划均未使用，保留以维持接口兼容
    pub difficulty_trend: f64,
    pub engagement_level: f64,
    pub learning_velocity: f64,
    pub review_needs: Vec<String>,
}

impl Default for LearningState {
    fn default() -> Self {
        Self {
            overall_accuracy: 0.5,
            concept_strengths: Vec::new(),
            concept_weaknesses: Vec::new(),
            difficulty_trend: 0.0,
            engagement_level: 0.5,
            learning_velocity: 0.5,
            review_needs: Vec::new(),
        }
    }
}

/// 单题评分的四个因子及调整过程
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub concept_mastery: f64,
    pub difficulty_match: f64,
    pub novelty_score: f64,
    pub spaced_repetition_score: f64,
    pub weighted_sum: f64,
    pub accuracy_multiplier: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredQuestion {
    pub recommendation: QuestionRecommendation,
    pub breakdown: ScoreBreakdown,
}
