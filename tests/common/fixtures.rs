use chrono::{DateTime, Duration, Utc};

use adaptive_recommender::recommender::types::{
    CandidateQuestion, ConceptMastery, PerformanceRecord, UserProfile,
};

pub fn fixed_now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-09-01T08:00:00Z")
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

/// 生成按时间倒序的作答记录，前 `correct` 条答对
pub fn seed_history(count: usize, correct: usize, difficulty: i32) -> Vec<PerformanceRecord> {
    (0..count)
        .map(|idx| PerformanceRecord {
            question_id: format!("history-{idx}"),
            category: "arithmetic".to_string(),
            difficulty,
            correct: idx < correct,
            time_spent: 30.0,
            timestamp: fixed_now() - Duration::minutes(idx as i64 + 1),
            concepts: vec!["fractions".to_string()],
        })
        .collect()
}

pub fn seed_mastery(
    concept: &str,
    mastery: f64,
    practice_count: u32,
    days_ago: i64,
) -> ConceptMastery {
    ConceptMastery {
        concept: concept.to_string(),
        mastery,
        confidence: 0.7,
        last_practiced: fixed_now() - Duration::days(days_ago),
        practice_count,
    }
}

pub fn seed_profile(
    grade: &str,
    history: Vec<PerformanceRecord>,
    mastery: Vec<ConceptMastery>,
) -> UserProfile {
    UserProfile {
        id: "learner-1".to_string(),
        grade: grade.to_string(),
        strengths: vec![],
        weaknesses: vec![],
        learning_style: Some("visual".to_string()),
        performance_history: history,
        concept_mastery: mastery,
    }
}

pub fn seed_question(id: &str, difficulty: i32, concepts: &[&str]) -> CandidateQuestion {
    CandidateQuestion {
        id: id.to_string(),
        category: "arithmetic".to_string(),
        difficulty,
        concepts: concepts.iter().map(|c| c.to_string()).collect(),
    }
}
