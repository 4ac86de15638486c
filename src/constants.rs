/// 单次请求默认推荐题目数
pub const DEFAULT_MAX_QUESTIONS: u32 = 10;

/// 单次请求允许的最大推荐题目数
pub const MAX_QUESTIONS_LIMIT: u32 = 50;

/// 题目难度下界
pub const MIN_DIFFICULTY: i32 = 1;

/// 题目难度上界
pub const MAX_DIFFICULTY: i32 = 5;

/// 无法解析年级时使用的默认年级
pub const DEFAULT_GRADE_LEVEL: i32 = 1;

/// 候选池达到该规模后启用并行评分
pub const DEFAULT_PARALLEL_SCORING_THRESHOLD: usize = 256;

/// 每天毫秒数
pub const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// 会话 ID 的 v5 命名空间前缀
pub const SESSION_ID_NAMESPACE: &str = "adaptive-recommender/session";
