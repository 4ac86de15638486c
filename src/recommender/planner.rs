//! 会话规划：推导自适应参数与会话元数据

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::constants::{MAX_DIFFICULTY, MIN_DIFFICULTY, SESSION_ID_NAMESPACE};
use crate::recommender::config::SessionConfig;
use crate::recommender::types::{
    AdaptiveSettings, LearningState, RecommendationRequest, SessionMetadata, UserProfile,
};

pub fn plan_settings(
    state: &LearningState,
    grade_level: i32,
    config: &SessionConfig,
) -> AdaptiveSettings {
    let initial_difficulty = (f64::from(grade_level)
        + (state.overall_accuracy - config.target_accuracy))
        .clamp(f64::from(MIN_DIFFICULTY), f64::from(MAX_DIFFICULTY));

    let difficulty_adjustment_rate = if state.learning_velocity > config.velocity_threshold {
        config.fast_adjustment_rate
    } else {
        config.slow_adjustment_rate
    };

    AdaptiveSettings {
        initial_difficulty,
        difficulty_adjustment_rate,
        mastery_threshold: config.mastery_threshold,
        spaced_repetition_interval: config.spaced_repetition_interval_days,
    }
}

/// 同一用户、同一时刻得到相同 ID，不同时刻互不相同
pub fn session_id(user_id: &str, now: DateTime<Utc>) -> String {
    let namespace = Uuid::new_v5(&Uuid::NAMESPACE_URL, SESSION_ID_NAMESPACE.as_bytes());
    let name = format!("{user_id}:{}", now.timestamp_micros());
    Uuid::new_v5(&namespace, name.as_bytes()).to_string()
}

fn target_concepts(
    request: &RecommendationRequest,
    profile: &UserProfile,
    state: &LearningState,
    config: &SessionConfig,
) -> Vec<String> {
    if let Some(focus) = &request.focus_concepts {
        return focus.clone();
    }
    // 画像未携带弱项时退回到分析得出的弱项
    let weaknesses = if profile.weaknesses.is_empty() {
        &state.concept_weaknesses
    } else {
        &profile.weaknesses
    };
    weaknesses
        .iter()
        .take(config.max_target_concepts)
        .cloned()
        .collect()
}

pub fn plan_metadata(
    request: &RecommendationRequest,
    profile: &UserProfile,
    state: &LearningState,
    grade_level: i32,
    max_questions: u32,
    now: DateTime<Utc>,
    config: &SessionConfig,
) -> SessionMetadata {
    let upper = grade_level
        .saturating_add(config.difficulty_headroom)
        .clamp(MIN_DIFFICULTY, MAX_DIFFICULTY);

    SessionMetadata {
        session_id: session_id(&request.user_id, now),
        user_id: request.user_id.clone(),
        start_time: now,
        estimated_duration: max_questions.saturating_mul(config.minutes_per_question),
        target_concepts: target_concepts(request, profile, state, config),
        difficulty_range: [MIN_DIFFICULTY, upper],
        session_type: request.session_type,
    }
}
