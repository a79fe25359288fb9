//! Test helper factories
//!
//! Convenience functions for creating courses, progress and engines with
//! sensible defaults.
#![allow(dead_code)]

use crate::engine::CourseEngine;
use crate::graph::models::{Connection, ConnectionType, CourseId, Topic, TopicId, UserId};
use crate::paths::progress::ProgressRecord;
use crate::store::InMemoryCourseStore;
use crate::Config;
use std::sync::Arc;

// ============================================================================
// Config and engine builders
// ============================================================================

/// Config with small iteration counts so layout tests stay fast
pub fn test_config() -> Config {
    Config {
        layout_iterations: Some(10),
        ..Config::default()
    }
}

/// Engine over an in-memory store holding one course
pub async fn test_engine(
    course_id: CourseId,
    topics: Vec<Topic>,
    connections: Vec<Connection>,
) -> (CourseEngine, Arc<InMemoryCourseStore>) {
    let store = Arc::new(InMemoryCourseStore::new());
    store.seed_course(course_id, topics, connections).await;
    (CourseEngine::new(store.clone(), test_config()), store)
}

// ============================================================================
// Entity factories
// ============================================================================

/// Topics 1..=n in block 1 with difficulty 3, linked 1 → 2 → … → n
pub fn chain_course(n: TopicId) -> (Vec<Topic>, Vec<Connection>) {
    let topics = (1..=n).map(|id| Topic::new(id, 1, 3)).collect();
    let connections = (1..n)
        .map(|id| Connection::new(id, id, id + 1, ConnectionType::Direct, 1.0))
        .collect();
    (topics, connections)
}

/// A progress record with a fixed mastery and enough answers for confidence
pub fn progress_with_mastery(
    user_id: UserId,
    course_id: CourseId,
    topic_id: TopicId,
    mastery: f64,
) -> ProgressRecord {
    let mut record = ProgressRecord::new(user_id, course_id, topic_id);
    record.total = 10;
    record.correct = (mastery / 10.0).round() as u32;
    record.mastery = mastery;
    record.confidence = crate::paths::progress::confidence_for(record.total);
    record
}
