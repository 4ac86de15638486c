use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::constants::{DEFAULT_GRADE_LEVEL, MAX_DIFFICULTY, MAX_QUESTIONS_LIMIT, MIN_DIFFICULTY};
use crate::error::RecommendError;
use crate::recommender::analyzer;
use crate::recommender::config::RecommenderConfig;
use crate::recommender::planner;
use crate::recommender::scorer::{QuestionScorer, ScoringContext};
use crate::recommender::selector;
use crate::recommender::types::*;

/// 推荐编排器：分析 → 评分 → 选择 → 会话规划。
///
/// 引擎本身不持有任何跨调用的可变状态，可在多线程间共享并发调用。
pub struct RecommendationEngine {
    config: RecommenderConfig,
    scorer: QuestionScorer,
}

impl RecommendationEngine {
    pub fn new(config: RecommenderConfig) -> Result<Self, RecommendError> {
        config.validate()?;
        let scorer = QuestionScorer::new(config.scoring.clone(), config.classification.clone());
        Ok(Self { config, scorer })
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    pub fn generate_recommendations(
        &self,
        request: &RecommendationRequest,
        profile: &UserProfile,
        candidates: &[CandidateQuestion],
    ) -> Result<RecommendationResponse, RecommendError> {
        self.generate_recommendations_at(request, profile, candidates, Utc::now())
    }

    /// 以给定时刻生成推荐；相同输入（含 `now`）总是得到相同结果
    pub fn generate_recommendations_at(
        &self,
        request: &RecommendationRequest,
        profile: &UserProfile,
        candidates: &[CandidateQuestion],
        now: DateTime<Utc>,
    ) -> Result<RecommendationResponse, RecommendError> {
        let max_questions = effective_max_questions(request)?;
        let target_difficulty = request.target_difficulty.map(|target| {
            let clamped = target.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY);
            if clamped != target {
                tracing::warn!(
                    user_id = %request.user_id,
                    target,
                    clamped,
                    "targetDifficulty out of range, clamping"
                );
            }
            clamped
        });
        let grade_level = profile.grade_level().unwrap_or_else(|| {
            tracing::warn!(
                user_id = %request.user_id,
                grade = %profile.grade,
                "Unparsable grade, using default"
            );
            DEFAULT_GRADE_LEVEL
        });

        let state = analyzer::analyze(profile, now, &self.config.analyzer);

        let pool = prepare_candidates(request, candidates);
        let ctx = ScoringContext::new(profile, &state, grade_level, target_difficulty, now);
        let parallel = pool.len() >= self.config.parallel_scoring_threshold;
        let scored = self
            .scorer
            .score_all(&pool, &ctx, self.config.parallel_scoring_threshold);

        let selected = selector::select(scored, max_questions as usize, &self.config.selector);
        let recommendations: Vec<QuestionRecommendation> =
            selected.into_iter().map(|s| s.recommendation).collect();

        let adaptive_settings = planner::plan_settings(&state, grade_level, &self.config.session);
        let session_metadata = planner::plan_metadata(
            request,
            profile,
            &state,
            grade_level,
            max_questions,
            now,
            &self.config.session,
        );

        tracing::debug!(
            user_id = %request.user_id,
            session_id = %session_metadata.session_id,
            candidates = candidates.len(),
            eligible = pool.len(),
            selected = recommendations.len(),
            parallel,
            accuracy = state.overall_accuracy,
            "Recommendations generated"
        );

        Ok(RecommendationResponse {
            recommendations,
            session_metadata,
            adaptive_settings,
        })
    }
}

fn effective_max_questions(request: &RecommendationRequest) -> Result<u32, RecommendError> {
    if request.max_questions == 0 {
        return Err(RecommendError::invalid_request("maxQuestions must be >= 1"));
    }
    if request.max_questions > MAX_QUESTIONS_LIMIT {
        tracing::warn!(
            user_id = %request.user_id,
            requested = request.max_questions,
            limit = MAX_QUESTIONS_LIMIT,
            "maxQuestions above limit, clamping"
        );
        return Ok(MAX_QUESTIONS_LIMIT);
    }
    Ok(request.max_questions)
}

/// 去掉被排除的题目，同一 ID 只保留首次出现
fn prepare_candidates<'a>(
    request: &RecommendationRequest,
    candidates: &'a [CandidateQuestion],
) -> Vec<&'a CandidateQuestion> {
    let excluded: HashSet<&str> = request
        .exclude_question_ids
        .iter()
        .flatten()
        .map(|id| id.as_str())
        .collect();
    let mut seen: HashSet<&str> = HashSet::with_capacity(candidates.len());

    candidates
        .iter()
        .filter(|q| !excluded.contains(q.id.as_str()))
        .filter(|q| seen.insert(q.id.as_str()))
        .collect()
}
