//! Study paths: progress tracking, priority scoring and neural path records.
//!
//! - [`progress`] — `ProgressRecord` updates and the course `ProgressSummary`
//! - [`scoring`] — per-topic priorities, path entries and recommendations
//! - [`models`] — `NeuralPath` with its status machine, `Recommendation`

pub mod models;
pub mod progress;
pub mod scoring;

pub use models::{
    NeuralPath, PathEntry, PathError, PathStatus, PathType, Recommendation, RecommendationReason,
};
pub use progress::{
    mastery_by_topic, ProgressRecord, ProgressSummary, MASTERY_THRESHOLD, MIN_CONFIDENCE_SAMPLE,
};
pub use scoring::{
    build_path_entries, recommended_topics, score_for_exploration, score_for_optimal_path,
    score_for_reinforcement,
};
