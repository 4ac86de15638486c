pub mod analyzer;
pub mod config;
pub mod engine;
pub mod planner;
pub mod scorer;
pub mod selector;
pub mod types;

pub use engine::RecommendationEngine;
