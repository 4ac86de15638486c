//! 学习状态分析：从作答历史与知识点掌握度推导当前学习状态

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::constants::MILLIS_PER_DAY;
use crate::recommender::config::AnalyzerConfig;
use crate::recommender::types::{ConceptMastery, LearningState, PerformanceRecord, UserProfile};

/// 将掌握度等概率值约束到 [0,1]，NaN 视为 0
pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// 距上次练习的天数，未来时间视为 0
pub(crate) fn days_since(then: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let elapsed_ms = (now - then).num_milliseconds();
    (elapsed_ms.max(0) as f64) / MILLIS_PER_DAY
}

fn accuracy(records: &[PerformanceRecord]) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    let correct = records.iter().filter(|r| r.correct).count();
    Some(correct as f64 / records.len() as f64)
}

fn mean_difficulty(records: &[PerformanceRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let total: i64 = records.iter().map(|r| i64::from(r.difficulty)).sum();
    total as f64 / records.len() as f64
}

fn mean_time_spent(records: &[PerformanceRecord]) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    let total: f64 = records
        .iter()
        .map(|r| {
            if r.time_spent.is_finite() {
                r.time_spent.max(0.0)
            } else {
                0.0
            }
        })
        .sum();
    Some(total / records.len() as f64)
}

fn window(records: &[PerformanceRecord], start: usize, len: usize) -> &[PerformanceRecord] {
    let start = start.min(records.len());
    let end = start.saturating_add(len).min(records.len());
    &records[start..end]
}

/// 同一知识点只保留第一条掌握度记录
pub(crate) fn first_per_concept(masteries: &[ConceptMastery]) -> Vec<&ConceptMastery> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(masteries.len());
    masteries
        .iter()
        .filter(|m| seen.insert(m.concept.as_str()))
        .collect()
}

fn ranked_concepts<F>(
    masteries: &[&ConceptMastery],
    keep: F,
    order: fn(f64, f64) -> Ordering,
    limit: usize,
) -> Vec<String>
where
    F: Fn(f64) -> bool,
{
    let mut matched: Vec<(&str, f64)> = masteries
        .iter()
        .map(|m| (m.concept.as_str(), clamp_unit(m.mastery)))
        .filter(|(_, mastery)| keep(*mastery))
        .collect();
    // 稳定排序，同分保持输入顺序
    matched.sort_by(|a, b| order(a.1, b.1));
    matched
        .into_iter()
        .take(limit)
        .map(|(concept, _)| concept.to_string())
        .collect()
}

fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

fn ascending(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

pub fn analyze(profile: &UserProfile, now: DateTime<Utc>, config: &AnalyzerConfig) -> LearningState {
    let history = profile.performance_history.as_slice();
    let masteries = first_per_concept(&profile.concept_mastery);
    let recent = window(history, 0, config.recent_window);

    let overall_accuracy = accuracy(recent).unwrap_or(config.default_accuracy);

    let concept_strengths = ranked_concepts(
        &masteries,
        |m| m > config.strength_threshold,
        descending,
        config.max_listed_concepts,
    );
    let concept_weaknesses = ranked_concepts(
        &masteries,
        |m| m < config.weakness_threshold,
        ascending,
        config.max_listed_concepts,
    );

    let difficulty_trend = if history.len() >= config.trend_window * 2 {
        let latest = window(history, 0, config.trend_window);
        let preceding = window(history, config.trend_window, config.trend_window);
        mean_difficulty(latest) - mean_difficulty(preceding)
    } else {
        0.0
    };

    let engagement_level = match mean_time_spent(recent) {
        Some(avg) => {
            let optimal = config.optimal_time_secs;
            (1.0 - (avg - optimal).abs() / optimal).max(0.0)
        }
        None => config.default_engagement,
    };

    let learning_velocity = if history.len() < config.min_velocity_history {
        config.default_velocity
    } else {
        let prior = window(history, config.recent_window, config.recent_window);
        let prior_accuracy = accuracy(prior).unwrap_or(config.default_accuracy);
        (overall_accuracy - prior_accuracy).max(0.0)
    };

    let review_needs = masteries
        .iter()
        .filter(|m| {
            let due_after = config.review_base_interval_days * (1.0 - clamp_unit(m.mastery));
            days_since(m.last_practiced, now) > due_after
        })
        .map(|m| m.concept.clone())
        .collect();

    LearningState {
        overall_accuracy,
        concept_strengths,
        concept_weaknesses,
        difficulty_trend,
        engagement_level,
        learning_velocity,
        review_needs,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn record(idx: usize, correct: bool, difficulty: i32, time_spent: f64) -> PerformanceRecord {
        PerformanceRecord {
            question_id: format!("q{idx}"),
            category: "math".to_string(),
            difficulty,
            correct,
            time_spent,
            timestamp: now() - Duration::minutes(idx as i64),
            concepts: vec!["fractions".to_string()],
        }
    }

    fn mastery(concept: &str, value: f64, days_ago: i64) -> ConceptMastery {
        ConceptMastery {
            concept: concept.to_string(),
            mastery: value,
            confidence: 0.5,
            last_practiced: now() - Duration::days(days_ago),
            practice_count: 3,
        }
    }

    fn profile(history: Vec<PerformanceRecord>, masteries: Vec<ConceptMastery>) -> UserProfile {
        UserProfile {
            id: "u1".to_string(),
            grade: "3".to_string(),
            strengths: vec![],
            weaknesses: vec![],
            learning_style: None,
            performance_history: history,
            concept_mastery: masteries,
        }
    }

    #[test]
    fn empty_profile_uses_defaults() {
        let state = analyze(&profile(vec![], vec![]), now(), &AnalyzerConfig::default());
        assert_eq!(state, LearningState::default());
    }

    #[test]
    fn accuracy_uses_recent_twenty_only() {
        // 最近 20 条全对，更早的 10 条全错
        let mut history: Vec<_> = (0..20).map(|i| record(i, true, 3, 30.0)).collect();
        history.extend((20..30).map(|i| record(i, false, 3, 30.0)));
        let state = analyze(&profile(history, vec![]), now(), &AnalyzerConfig::default());
        assert!((state.overall_accuracy - 1.0).abs() < 1e-12);
        assert!((state.learning_velocity - 1.0).abs() < 1e-12);
        assert!((state.engagement_level - 1.0).abs() < 1e-12);
    }

    #[test]
    fn strengths_and_weaknesses_are_ranked_and_capped() {
        let masteries = vec![
            mastery("a", 0.80, 0),
            mastery("b", 0.95, 0),
            mastery("c", 0.10, 0),
            mastery("d", 0.40, 0),
            mastery("e", 0.60, 0),
            mastery("f", 0.76, 0),
            mastery("g", 0.90, 0),
            mastery("h", 0.99, 0),
            mastery("i", 0.85, 0),
        ];
        let state = analyze(&profile(vec![], masteries), now(), &AnalyzerConfig::default());
        assert_eq!(state.concept_strengths, vec!["h", "b", "g", "i", "a"]);
        assert_eq!(state.concept_weaknesses, vec!["c", "d"]);
    }

    #[test]
    fn difficulty_trend_compares_last_two_blocks() {
        let mut history: Vec<_> = (0..5).map(|i| record(i, true, 4, 30.0)).collect();
        history.extend((5..10).map(|i| record(i, true, 2, 30.0)));
        let state = analyze(&profile(history, vec![]), now(), &AnalyzerConfig::default());
        assert!((state.difficulty_trend - 2.0).abs() < 1e-12);

        let short: Vec<_> = (0..9).map(|i| record(i, true, 4, 30.0)).collect();
        let state = analyze(&profile(short, vec![]), now(), &AnalyzerConfig::default());
        assert_eq!(state.difficulty_trend, 0.0);
        assert_eq!(state.learning_velocity, 0.5);
    }

    #[test]
    fn engagement_falls_off_away_from_thirty_seconds() {
        let history: Vec<_> = (0..4).map(|i| record(i, true, 3, 45.0)).collect();
        let state = analyze(&profile(history, vec![]), now(), &AnalyzerConfig::default());
        assert!((state.engagement_level - 0.5).abs() < 1e-12);

        let slow: Vec<_> = (0..4).map(|i| record(i, true, 3, 120.0)).collect();
        let state = analyze(&profile(slow, vec![]), now(), &AnalyzerConfig::default());
        assert_eq!(state.engagement_level, 0.0);
    }

    #[test]
    fn velocity_is_floored_at_zero() {
        let mut history: Vec<_> = (0..20).map(|i| record(i, false, 3, 30.0)).collect();
        history.extend((20..40).map(|i| record(i, true, 3, 30.0)));
        let state = analyze(&profile(history, vec![]), now(), &AnalyzerConfig::default());
        assert_eq!(state.learning_velocity, 0.0);
    }

    #[test]
    fn review_needs_shrink_interval_for_low_mastery() {
        let masteries = vec![
            // 7 * (1 - 0.2) = 5.6 天
            mastery("stale", 0.2, 6),
            mastery("fresh", 0.2, 5),
            // 7 * (1 - 1.0) = 0 天
            mastery("mastered", 1.0, 1),
        ];
        let state = analyze(&profile(vec![], masteries), now(), &AnalyzerConfig::default());
        assert_eq!(state.review_needs, vec!["stale", "mastered"]);
    }

    #[test]
    fn mid_length_history_compares_against_neutral_baseline() {
        // 15 条记录：上一窗口为空，以 0.5 为基线
        let history: Vec<_> = (0..15).map(|i| record(i, true, 3, 30.0)).collect();
        let state = analyze(&profile(history, vec![]), now(), &AnalyzerConfig::default());
        assert_eq!(state.overall_accuracy, 1.0);
        assert!((state.learning_velocity - 0.5).abs() < 1e-12);
    }

    #[test]
    fn negative_time_spent_counts_as_zero() {
        let history: Vec<_> = (0..4).map(|i| record(i, true, 3, -100.0)).collect();
        let state = analyze(&profile(history, vec![]), now(), &AnalyzerConfig::default());
        assert_eq!(state.engagement_level, 0.0);
    }

    #[test]
    fn out_of_range_mastery_is_clamped() {
        let masteries = vec![mastery("nan", f64::NAN, 0), mastery("over", 7.0, 0)];
        let state = analyze(&profile(vec![], masteries), now(), &AnalyzerConfig::default());
        assert_eq!(state.concept_strengths, vec!["over"]);
        assert_eq!(state.concept_weaknesses, vec!["nan"]);
    }

    #[test]
    fn duplicate_concept_keeps_first_entry() {
        let masteries = vec![
            mastery("a", f64::NAN, 0),
            mastery("b", 0.9, 0),
            mastery("a", 0.9, 30),
        ];
        let state = analyze(&profile(vec![], masteries), now(), &AnalyzerConfig::default());
        assert_eq!(state.concept_strengths, vec!["b"]);
        assert_eq!(state.concept_weaknesses, vec!["a"]);
        // 第一条 "a" 今天刚练过，掌握度按 0 计，间隔 7 天未到
        assert!(state.review_needs.is_empty());
    }

    #[test]
    fn days_since_never_negative() {
        let future = now() + Duration::days(3);
        assert_eq!(days_since(future, now()), 0.0);
        assert!((days_since(now() - Duration::hours(36), now()) - 1.5).abs() < 1e-9);
    }
}
