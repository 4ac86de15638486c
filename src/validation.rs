//! 请求边界校验
//! 调用方在把请求交给推荐核心之前执行；核心本身只做防御性钳制。

use crate::constants::{MAX_DIFFICULTY, MAX_QUESTIONS_LIMIT, MIN_DIFFICULTY};
use crate::recommender::types::RecommendationRequest;

/// 用户 ID：1-128 个字符，不允许控制字符
pub fn validate_user_id(user_id: &str) -> Result<(), &'static str> {
    let char_count = user_id.trim().chars().count();
    if char_count == 0 {
        return Err("userId 不能为空");
    }
    if char_count > 128 {
        return Err("userId 长度不能超过128个字符");
    }
    if user_id.chars().any(|c| c.is_control()) {
        return Err("userId 不能包含控制字符");
    }
    Ok(())
}

pub fn validate_max_questions(max_questions: u32) -> Result<(), &'static str> {
    if !(1..=MAX_QUESTIONS_LIMIT).contains(&max_questions) {
        return Err("maxQuestions 需在1到50之间");
    }
    Ok(())
}

pub fn validate_target_difficulty(target: Option<i32>) -> Result<(), &'static str> {
    match target {
        Some(d) if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&d) => {
            Err("targetDifficulty 需在1到5之间")
        }
        _ => Ok(()),
    }
}

/// 知识点与题目 ID 列表：元素非空
pub fn validate_id_list(ids: Option<&[String]>) -> Result<(), &'static str> {
    if let Some(ids) = ids {
        if ids.iter().any(|id| id.trim().is_empty()) {
            return Err("列表中不能包含空字符串");
        }
    }
    Ok(())
}

pub fn validate_request(request: &RecommendationRequest) -> Result<(), &'static str> {
    validate_user_id(&request.user_id)?;
    validate_max_questions(request.max_questions)?;
    validate_target_difficulty(request.target_difficulty)?;
    validate_id_list(request.focus_concepts.as_deref())?;
    validate_id_list(request.exclude_question_ids.as_deref())?;
    Ok(())
}
