//! 候选题评分：掌握度、难度匹配、新颖度、间隔重复四因子加权，并给出推荐类型与优先级

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rayon::prelude::*;

use crate::constants::{MAX_DIFFICULTY, MIN_DIFFICULTY};
use crate::recommender::analyzer::{clamp_unit, days_since, first_per_concept};
use crate::recommender::config::{ClassificationConfig, ScoringConfig};
use crate::recommender::types::*;

/// 单次请求内共享的只读评分上下文
pub struct ScoringContext<'a> {
    pub state: &'a LearningState,
    pub grade_level: i32,
    pub target_difficulty: Option<i32>,
    pub now: DateTime<Utc>,
    mastery_by_concept: HashMap<&'a str, &'a ConceptMastery>,
    exposure_counts: HashMap<&'a str, usize>,
}

impl<'a> ScoringContext<'a> {
    pub fn new(
        profile: &'a UserProfile,
        state: &'a LearningState,
        grade_level: i32,
        target_difficulty: Option<i32>,
        now: DateTime<Utc>,
    ) -> Self {
        let mastery_by_concept: HashMap<&str, &ConceptMastery> =
            first_per_concept(&profile.concept_mastery)
                .into_iter()
                .map(|m| (m.concept.as_str(), m))
                .collect();

        let mut exposure_counts: HashMap<&str, usize> = HashMap::new();
        for record in &profile.performance_history {
            *exposure_counts.entry(record.question_id.as_str()).or_default() += 1;
        }

        Self {
            state,
            grade_level,
            target_difficulty,
            now,
            mastery_by_concept,
            exposure_counts,
        }
    }

    pub fn mastery_for(&self, concept: &str) -> Option<&ConceptMastery> {
        self.mastery_by_concept.get(concept).copied()
    }

    pub fn exposures(&self, question_id: &str) -> usize {
        self.exposure_counts.get(question_id).copied().unwrap_or(0)
    }
}

pub struct QuestionScorer {
    scoring: ScoringConfig,
    classification: ClassificationConfig,
}

impl QuestionScorer {
    pub fn new(scoring: ScoringConfig, classification: ClassificationConfig) -> Self {
        Self {
            scoring,
            classification,
        }
    }

    /// 候选数达到 `parallel_threshold` 时并行评分，输出顺序与输入一致
    pub fn score_all(
        &self,
        candidates: &[&CandidateQuestion],
        ctx: &ScoringContext<'_>,
        parallel_threshold: usize,
    ) -> Vec<ScoredQuestion> {
        if candidates.len() >= parallel_threshold {
            candidates.par_iter().map(|q| self.score(q, ctx)).collect()
        } else {
            candidates.iter().map(|q| self.score(q, ctx)).collect()
        }
    }

    pub fn score(&self, question: &CandidateQuestion, ctx: &ScoringContext<'_>) -> ScoredQuestion {
        let concept_mastery = self.concept_mastery(&question.concepts, ctx);
        let difficulty_match = self.difficulty_match(question.difficulty, ctx);
        let novelty_score = self.novelty_score(ctx.exposures(&question.id));
        let spaced_repetition_score = self.spaced_repetition_score(&question.concepts, ctx);

        let w = &self.scoring.weights;
        let weighted_sum = w.concept_mastery * concept_mastery
            + w.difficulty_match * difficulty_match
            + w.novelty * novelty_score
            + w.spaced_repetition * spaced_repetition_score;
        let accuracy_multiplier =
            self.accuracy_multiplier(question.difficulty, ctx.state.overall_accuracy);
        let score = clamp_unit(weighted_sum * accuracy_multiplier);

        let overall_accuracy = ctx.state.overall_accuracy;
        let recommendation_type = self.classify(
            concept_mastery,
            difficulty_match,
            novelty_score,
            overall_accuracy,
        );
        let priority = self.priority(recommendation_type, concept_mastery, overall_accuracy);
        let reasoning = build_reasoning(
            recommendation_type,
            self.mastery_descriptor(concept_mastery),
            &question.concepts,
        );

        ScoredQuestion {
            recommendation: QuestionRecommendation {
                question_id: question.id.clone(),
                score,
                reasoning,
                category: question.category.clone(),
                difficulty: question.difficulty,
                concepts: question.concepts.clone(),
                recommendation_type,
                priority,
            },
            breakdown: ScoreBreakdown {
                concept_mastery,
                difficulty_match,
                novelty_score,
                spaced_repetition_score,
                weighted_sum,
                accuracy_multiplier,
            },
        }
    }

    pub fn concept_mastery(&self, concepts: &[String], ctx: &ScoringContext<'_>) -> f64 {
        if concepts.is_empty() {
            return self.scoring.untagged_concept_mastery;
        }

        let matched: Vec<f64> = concepts
            .iter()
            .filter_map(|c| ctx.mastery_for(c))
            .map(|m| clamp_unit(m.mastery))
            .collect();
        if matched.is_empty() {
            return self.scoring.unseen_concept_mastery;
        }
        matched.iter().sum::<f64>() / matched.len() as f64
    }

    pub fn optimal_difficulty(&self, ctx: &ScoringContext<'_>) -> f64 {
        let (min, max) = (f64::from(MIN_DIFFICULTY), f64::from(MAX_DIFFICULTY));
        match ctx.target_difficulty {
            Some(target) => f64::from(target).clamp(min, max),
            None => {
                let shift = (ctx.state.overall_accuracy - self.scoring.target_accuracy)
                    * self.scoring.accuracy_difficulty_gain;
                (f64::from(ctx.grade_level) + shift).clamp(min, max)
            }
        }
    }

    pub fn difficulty_match(&self, difficulty: i32, ctx: &ScoringContext<'_>) -> f64 {
        let gap = (f64::from(difficulty) - self.optimal_difficulty(ctx)).abs();
        (1.0 - gap / self.scoring.difficulty_span).max(0.0)
    }

    pub fn novelty_score(&self, exposures: usize) -> f64 {
        let table = &self.scoring.novelty_by_exposure;
        table
            .get(exposures)
            .or_else(|| table.last())
            .copied()
            .unwrap_or(0.0)
    }

    pub fn spaced_repetition_score(&self, concepts: &[String], ctx: &ScoringContext<'_>) -> f64 {
        let per_concept: Vec<f64> = concepts
            .iter()
            .filter_map(|c| ctx.mastery_for(c))
            .map(|m| self.concept_due_score(m, ctx.now))
            .collect();
        if per_concept.is_empty() {
            return 0.0;
        }
        per_concept.iter().sum::<f64>() / per_concept.len() as f64
    }

    /// 最优间隔 = 2^练习次数 × (1 − 掌握度 + 0.1) 天
    pub fn optimal_interval_days(&self, mastery: &ConceptMastery) -> f64 {
        let exponent = mastery.practice_count.min(1023) as i32;
        let gap = 1.0 - clamp_unit(mastery.mastery) + self.scoring.repetition_interval_floor;
        2f64.powi(exponent) * gap
    }

    fn concept_due_score(&self, mastery: &ConceptMastery, now: DateTime<Utc>) -> f64 {
        let interval = self.optimal_interval_days(mastery);
        let elapsed = days_since(mastery.last_practiced, now);
        if elapsed >= self.scoring.repetition_due_ratio * interval {
            1.0
        } else if elapsed >= self.scoring.repetition_near_due_ratio * interval {
            self.scoring.repetition_near_due_score
        } else {
            0.0
        }
    }

    pub fn accuracy_multiplier(&self, difficulty: i32, overall_accuracy: f64) -> f64 {
        let s = &self.scoring;
        let mut multiplier = 1.0;
        if overall_accuracy < s.struggling_accuracy {
            multiplier *= if difficulty <= s.struggling_easy_max_difficulty {
                s.struggling_easy_boost
            } else {
                s.struggling_hard_penalty
            };
        }
        if overall_accuracy > s.confident_accuracy {
            multiplier *= if difficulty >= s.confident_hard_min_difficulty {
                s.confident_hard_boost
            } else {
                s.confident_easy_penalty
            };
        }
        multiplier
    }

    /// 按顺序匹配，首条命中的规则决定类型
    pub fn classify(
        &self,
        mastery: f64,
        difficulty_match: f64,
        novelty: f64,
        overall_accuracy: f64,
    ) -> RecommendationType {
        let c = &self.classification;
        if mastery < c.remediate_mastery {
            RecommendationType::Remediate
        } else if mastery < c.review_mastery && overall_accuracy < c.review_accuracy {
            RecommendationType::Review
        } else if mastery > c.challenge_mastery && difficulty_match > c.challenge_difficulty_match {
            RecommendationType::Challenge
        } else if novelty > c.advance_novelty {
            RecommendationType::Advance
        } else {
            RecommendationType::Reinforce
        }
    }

    // LOW 目前没有规则会产生
    pub fn priority(
        &self,
        recommendation_type: RecommendationType,
        mastery: f64,
        overall_accuracy: f64,
    ) -> Priority {
        let c = &self.classification;
        let urgent = matches!(
            recommendation_type,
            RecommendationType::Remediate | RecommendationType::Review
        ) || mastery < c.high_priority_mastery
            || overall_accuracy < c.high_priority_accuracy;
        if urgent {
            Priority::High
        } else {
            Priority::Medium
        }
    }

    pub fn mastery_descriptor(&self, mastery: f64) -> MasteryDescriptor {
        if mastery < self.classification.weak_mastery {
            MasteryDescriptor::Weak
        } else if mastery < self.classification.strong_mastery {
            MasteryDescriptor::Developing
        } else {
            MasteryDescriptor::Strong
        }
    }
}

impl Default for QuestionScorer {
    fn default() -> Self {
        Self::new(ScoringConfig::default(), ClassificationConfig::default())
    }
}
