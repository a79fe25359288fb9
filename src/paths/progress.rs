//! Per-user progress on a topic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::graph::models::{CourseId, TopicId, UserId};

/// Answers needed before confidence becomes non-zero.
pub const MIN_CONFIDENCE_SAMPLE: u32 = 5;
/// Answers at which confidence saturates at 1.0.
pub const FULL_CONFIDENCE_SAMPLE: u32 = 20;
/// Mastery percentage at which a topic counts as mastered.
pub const MASTERY_THRESHOLD: f64 = 80.0;

/// Progress of one user on one topic of a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub user_id: UserId,
    #[serde(default)]
    pub course_id: CourseId,
    pub topic_id: TopicId,
    /// correct / total × 100
    #[serde(default)]
    pub mastery: f64,
    #[serde(default)]
    pub correct: u32,
    #[serde(default)]
    pub total: u32,
    /// Accumulated study time in seconds
    #[serde(default)]
    pub study_time_secs: u64,
    /// 0.0–1.0, grows with the number of answers
    #[serde(default)]
    pub confidence: f64,
    #[serde(default = "Utc::now")]
    pub last_activity: DateTime<Utc>,
}

impl ProgressRecord {
    /// An empty record, created before the first answer is applied.
    pub fn new(user_id: UserId, course_id: CourseId, topic_id: TopicId) -> Self {
        Self {
            user_id,
            course_id,
            topic_id,
            mastery: 0.0,
            correct: 0,
            total: 0,
            study_time_secs: 0,
            confidence: 0.0,
            last_activity: Utc::now(),
        }
    }

    /// Apply one answered question.
    pub fn record_answer(&mut self, correct: bool, study_secs: u64) {
        self.total = self.total.saturating_add(1);
        if correct {
            self.correct = self.correct.saturating_add(1);
        }
        self.study_time_secs = self.study_time_secs.saturating_add(study_secs);
        self.last_activity = Utc::now();
        self.recompute();
    }

    /// Derive mastery and confidence from the answer counts.
    pub fn recompute(&mut self) {
        self.mastery = if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64 * 100.0
        };
        self.confidence = confidence_for(self.total);
    }

    pub fn is_mastered(&self) -> bool {
        self.mastery >= MASTERY_THRESHOLD
    }
}

/// Confidence for a number of answers: 0 below the minimum sample, then
/// linear up to 1.0.
pub fn confidence_for(total: u32) -> f64 {
    if total < MIN_CONFIDENCE_SAMPLE {
        return 0.0;
    }
    (total as f64 / FULL_CONFIDENCE_SAMPLE as f64).min(1.0)
}

/// Mastery per topic, for the scorer.
pub fn mastery_by_topic(records: &[ProgressRecord]) -> HashMap<TopicId, f64> {
    records.iter().map(|r| (r.topic_id, r.mastery)).collect()
}

/// Course-level totals for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub total_topics: usize,
    pub topics_studied: usize,
    pub topics_mastered: usize,
    /// Mean mastery over studied topics
    pub average_mastery: f64,
    pub total_study_secs: u64,
    /// Mastered topics over all topics, as a percentage
    pub completion_percentage: f64,
}

impl ProgressSummary {
    pub fn from_records(total_topics: usize, records: &[ProgressRecord]) -> Self {
        let topics_studied = records.len();
        let topics_mastered = records.iter().filter(|r| r.is_mastered()).count();
        let average_mastery = if topics_studied == 0 {
            0.0
        } else {
            records.iter().map(|r| r.mastery).sum::<f64>() / topics_studied as f64
        };
        let completion_percentage = if total_topics == 0 {
            0.0
        } else {
            topics_mastered as f64 / total_topics as f64 * 100.0
        };

        Self {
            total_topics,
            topics_studied,
            topics_mastered,
            average_mastery,
            total_study_secs: records.iter().map(|r| r.study_time_secs).sum(),
            completion_percentage,
        }
    }
}
