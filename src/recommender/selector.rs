//! 推荐选择：按优先级与得分排序，限制单一推荐类型占比，最后按难度递进排列

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::recommender::config::SelectorConfig;
use crate::recommender::types::{RecommendationType, ScoredQuestion};

fn priority_then_score(a: &ScoredQuestion, b: &ScoredQuestion) -> Ordering {
    let (a, b) = (&a.recommendation, &b.recommendation);
    a.priority
        .rank()
        .cmp(&b.priority.rank())
        .then_with(|| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal))
}

fn priority_then_difficulty(a: &ScoredQuestion, b: &ScoredQuestion) -> Ordering {
    let (a, b) = (&a.recommendation, &b.recommendation);
    a.priority
        .rank()
        .cmp(&b.priority.rank())
        .then_with(|| a.difficulty.cmp(&b.difficulty))
}

/// 单一推荐类型在一次选择中的上限
pub fn type_quota(max_questions: usize, config: &SelectorConfig) -> usize {
    max_questions.div_ceil(config.type_quota_divisor.max(1) as usize)
}

fn dedup_by_question_id(scored: Vec<ScoredQuestion>) -> Vec<ScoredQuestion> {
    let mut seen: HashSet<String> = HashSet::with_capacity(scored.len());
    scored
        .into_iter()
        .filter(|s| seen.insert(s.recommendation.question_id.clone()))
        .collect()
}

/// 从已评分候选中选出至多 `max_questions` 道题。
///
/// 所有排序均为稳定排序，同键时保持候选原始顺序，因此结果完全由输入决定。
pub fn select(
    scored: Vec<ScoredQuestion>,
    max_questions: usize,
    config: &SelectorConfig,
) -> Vec<ScoredQuestion> {
    let mut ranked = dedup_by_question_id(scored);
    ranked.sort_by(priority_then_score);

    let limit = max_questions.min(ranked.len());
    if limit == 0 {
        return Vec::new();
    }
    let quota = type_quota(max_questions, config);

    let mut taken = vec![false; ranked.len()];
    let mut picked: Vec<usize> = Vec::with_capacity(limit);
    // 类型计数只在本次调用内有效
    let mut type_counts: HashMap<RecommendationType, usize> = HashMap::new();

    for (idx, candidate) in ranked.iter().enumerate() {
        if picked.len() >= limit {
            break;
        }
        let count = type_counts
            .entry(candidate.recommendation.recommendation_type)
            .or_insert(0);
        if *count < quota {
            *count += 1;
            taken[idx] = true;
            picked.push(idx);
        }
    }
    let diverse = picked.len();

    // 多样性配额填不满时按原排序回填，忽略类型上限
    if picked.len() < limit {
        for idx in 0..ranked.len() {
            if picked.len() >= limit {
                break;
            }
            if !taken[idx] {
                taken[idx] = true;
                picked.push(idx);
            }
        }
    }

    tracing::debug!(
        quota,
        diverse,
        backfilled = picked.len() - diverse,
        "Recommendation selection complete"
    );

    let mut slots: Vec<Option<ScoredQuestion>> = ranked.into_iter().map(Some).collect();
    let mut selected: Vec<ScoredQuestion> = picked
        .into_iter()
        .filter_map(|idx| slots[idx].take())
        .collect();
    selected.sort_by(priority_then_difficulty);
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommender::types::{Priority, QuestionRecommendation, ScoreBreakdown};

    fn scored(
        id: &str,
        score: f64,
        difficulty: i32,
        recommendation_type: RecommendationType,
        priority: Priority,
    ) -> ScoredQuestion {
        ScoredQuestion {
            recommendation: QuestionRecommendation {
                question_id: id.to_string(),
                score,
                reasoning: String::new(),
                category: "math".to_string(),
                difficulty,
                concepts: vec![],
                recommendation_type,
                priority,
            },
            breakdown: ScoreBreakdown {
                concept_mastery: 0.5,
                difficulty_match: 0.5,
                novelty_score: 1.0,
                spaced_repetition_score: 0.0,
                weighted_sum: score,
                accuracy_multiplier: 1.0,
            },
        }
    }

    fn ids(selected: &[ScoredQuestion]) -> Vec<&str> {
        selected
            .iter()
            .map(|s| s.recommendation.question_id.as_str())
            .collect()
    }

    #[test]
    fn quota_rounds_up() {
        let cfg = SelectorConfig::default();
        assert_eq!(type_quota(3, &cfg), 1);
        assert_eq!(type_quota(10, &cfg), 4);
        assert_eq!(type_quota(1, &cfg), 1);
    }

    #[test]
    fn empty_input_yields_empty_selection() {
        assert!(select(vec![], 10, &SelectorConfig::default()).is_empty());
    }

    #[test]
    fn one_per_type_when_three_requested() {
        use RecommendationType::*;
        let input = vec![
            scored("r1", 0.9, 3, Review, Priority::Medium),
            scored("r2", 0.9, 3, Review, Priority::Medium),
            scored("a1", 0.9, 2, Advance, Priority::Medium),
            scored("f1", 0.9, 1, Reinforce, Priority::Medium),
            scored("c1", 0.9, 4, Challenge, Priority::Medium),
            scored("m1", 0.9, 5, Remediate, Priority::Medium),
        ];
        let selected = select(input, 3, &SelectorConfig::default());
        assert_eq!(selected.len(), 3);
        let types: HashSet<_> = selected
            .iter()
            .map(|s| s.recommendation.recommendation_type)
            .collect();
        assert_eq!(types.len(), 3);
        // 最终按难度升序
        assert_eq!(ids(&selected), vec!["f1", "a1", "r1"]);
    }

    #[test]
    fn backfill_ignores_quota_when_types_are_scarce() {
        use RecommendationType::*;
        let input = vec![
            scored("a", 0.9, 1, Advance, Priority::Medium),
            scored("b", 0.8, 2, Advance, Priority::Medium),
            scored("c", 0.7, 3, Advance, Priority::Medium),
            scored("d", 0.6, 4, Advance, Priority::Medium),
        ];
        let selected = select(input, 3, &SelectorConfig::default());
        assert_eq!(ids(&selected), vec!["a", "b", "c"]);
    }

    #[test]
    fn high_priority_first_then_ascending_difficulty() {
        use RecommendationType::*;
        let input = vec![
            scored("m-hard", 0.95, 5, Advance, Priority::Medium),
            scored("h-hard", 0.40, 4, Remediate, Priority::High),
            scored("h-easy", 0.30, 1, Review, Priority::High),
            scored("m-easy", 0.90, 2, Reinforce, Priority::Medium),
        ];
        let selected = select(input, 4, &SelectorConfig::default());
        assert_eq!(ids(&selected), vec!["h-easy", "h-hard", "m-easy", "m-hard"]);
    }

    #[test]
    fn high_priority_wins_over_score_when_limited() {
        use RecommendationType::*;
        let input = vec![
            scored("medium-top", 0.99, 3, Advance, Priority::Medium),
            scored("high-low", 0.10, 3, Remediate, Priority::High),
        ];
        let selected = select(input, 1, &SelectorConfig::default());
        assert_eq!(ids(&selected), vec!["high-low"]);
    }

    #[test]
    fn duplicate_ids_are_collapsed() {
        use RecommendationType::*;
        let input = vec![
            scored("q1", 0.5, 2, Advance, Priority::Medium),
            scored("q1", 0.9, 2, Advance, Priority::Medium),
            scored("q2", 0.4, 3, Reinforce, Priority::Medium),
        ];
        let selected = select(input, 5, &SelectorConfig::default());
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].recommendation.score, 0.5);
    }

    #[test]
    fn equal_keys_keep_input_order() {
        use RecommendationType::*;
        let input = vec![
            scored("first", 0.5, 2, Advance, Priority::Medium),
            scored("second", 0.5, 2, Reinforce, Priority::Medium),
            scored("third", 0.5, 2, Challenge, Priority::Medium),
        ];
        let selected = select(input, 3, &SelectorConfig::default());
        assert_eq!(ids(&selected), vec!["first", "second", "third"]);
    }
}
