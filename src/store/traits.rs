//! CourseStore trait definition
//!
//! Abstract interface between the core and whatever persists course data.
//! Every query over progress and paths is keyed by user and course, so one
//! user's records are never visible to another.

use crate::graph::models::{Connection, CourseId, Dimensions, Position, Topic, TopicId, UserId};
use crate::paths::models::{NeuralPath, PathType};
use crate::paths::progress::ProgressRecord;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

/// In-place edit of a stored path, applied by [`CourseStore::update_path`].
pub type PathUpdate = Box<dyn FnOnce(&mut NeuralPath) -> Result<()> + Send>;

#[async_trait]
pub trait CourseStore: Send + Sync {
    // ========================================================================
    // Topics and connections
    // ========================================================================

    /// All topics of a course, in stored order (inactive ones included)
    async fn list_topics(&self, course_id: CourseId) -> Result<Vec<Topic>>;

    /// All connections of a course, in stored order (inactive ones included)
    async fn list_connections(&self, course_id: CourseId) -> Result<Vec<Connection>>;

    /// Persist layout output. Returns the number of topics updated.
    async fn update_positions(
        &self,
        course_id: CourseId,
        dimensions: Dimensions,
        positions: &HashMap<TopicId, Position>,
    ) -> Result<usize>;

    // ========================================================================
    // Progress
    // ========================================================================

    /// Progress records of a user in a course, ordered by topic id
    async fn list_progress(&self, user_id: UserId, course_id: CourseId)
        -> Result<Vec<ProgressRecord>>;

    async fn get_progress(
        &self,
        user_id: UserId,
        course_id: CourseId,
        topic_id: TopicId,
    ) -> Result<Option<ProgressRecord>>;

    /// Insert or replace a progress record
    async fn upsert_progress(&self, record: &ProgressRecord) -> Result<()>;

    /// Apply one answered question to a user's record on a topic, creating
    /// the record on the first answer. Read and write happen as one step, so
    /// concurrent answers are never lost. Returns the updated record.
    async fn apply_answer(
        &self,
        user_id: UserId,
        course_id: CourseId,
        topic_id: TopicId,
        correct: bool,
        study_secs: u64,
    ) -> Result<ProgressRecord>;

    /// Delete every progress record of a user in a course. Returns how many
    /// were removed.
    async fn reset_progress(&self, user_id: UserId, course_id: CourseId) -> Result<usize>;

    // ========================================================================
    // Neural paths
    // ========================================================================

    /// Paths of a user in a course, oldest first, optionally of one type
    async fn list_paths(
        &self,
        user_id: UserId,
        course_id: CourseId,
        path_type: Option<PathType>,
    ) -> Result<Vec<NeuralPath>>;

    async fn get_path(&self, id: Uuid) -> Result<Option<NeuralPath>>;

    /// The active path of one (user, course, type), if any
    async fn get_active_path(
        &self,
        user_id: UserId,
        course_id: CourseId,
        path_type: PathType,
    ) -> Result<Option<NeuralPath>>;

    /// Insert or replace a path as-is
    async fn save_path(&self, path: &NeuralPath) -> Result<()>;

    /// Run `update` on the current stored copy of a path and store the
    /// result, as one atomic step. Nothing is written when `update` fails.
    /// Returns `None` when no path has this id.
    async fn update_path(&self, id: Uuid, update: PathUpdate) -> Result<Option<NeuralPath>>;

    /// Supersede every active path of the same (user, course, type) and
    /// store `path`, as one atomic step. Returns the superseded path ids.
    async fn replace_active_path(&self, path: &NeuralPath) -> Result<Vec<Uuid>>;
}
