//! In-memory implementation of CourseStore.
//!
//! Each collection sits behind its own `tokio::sync::RwLock`. Used by the
//! CLI (loaded from a snapshot file) and by tests.

use crate::graph::models::{Connection, CourseId, Dimensions, Position, Topic, TopicId, UserId};
use crate::paths::models::{NeuralPath, PathStatus, PathType};
use crate::paths::progress::ProgressRecord;
use crate::store::traits::{CourseStore, PathUpdate};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

type ProgressKey = (UserId, CourseId, TopicId);

/// In-memory course store.
///
/// ```
/// use neuroopositor::graph::Topic;
/// use neuroopositor::store::{CourseStore, InMemoryCourseStore};
///
/// # tokio_test::block_on(async {
/// let store = InMemoryCourseStore::new();
/// store.seed_course(1, vec![Topic::new(10, 1, 2)], vec![]).await;
/// assert_eq!(store.list_topics(1).await.unwrap().len(), 1);
/// # });
/// ```
pub struct InMemoryCourseStore {
    pub topics: RwLock<HashMap<CourseId, Vec<Topic>>>,
    pub connections: RwLock<HashMap<CourseId, Vec<Connection>>>,
    pub progress: RwLock<HashMap<ProgressKey, ProgressRecord>>,
    pub paths: RwLock<HashMap<Uuid, NeuralPath>>,
}

impl InMemoryCourseStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            connections: RwLock::new(HashMap::new()),
            progress: RwLock::new(HashMap::new()),
            paths: RwLock::new(HashMap::new()),
        }
    }

    /// Replace a course's topics and connections. Topics get `course_id` set.
    pub async fn seed_course(
        &self,
        course_id: CourseId,
        topics: Vec<Topic>,
        connections: Vec<Connection>,
    ) {
        let topics: Vec<Topic> = topics
            .into_iter()
            .map(|mut t| {
                t.course_id = course_id;
                t
            })
            .collect();
        debug!(
            "Seeding course {} with {} topics and {} connections",
            course_id,
            topics.len(),
            connections.len()
        );
        self.topics.write().await.insert(course_id, topics);
        self.connections.write().await.insert(course_id, connections);
    }

    /// Insert progress records, replacing any with the same key.
    pub async fn seed_progress(&self, records: Vec<ProgressRecord>) {
        let mut progress = self.progress.write().await;
        for r in records {
            progress.insert((r.user_id, r.course_id, r.topic_id), r);
        }
    }
}

impl Default for InMemoryCourseStore {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Snapshot loading
// ============================================================================

/// One course as exported by the collaborator: topics, connections and
/// progress records of any number of users.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseSnapshot {
    #[serde(default)]
    pub course_id: CourseId,
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub progress: Vec<ProgressRecord>,
}

impl CourseSnapshot {
    /// Read a snapshot from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse snapshot {}", path.display()))
    }
}

impl InMemoryCourseStore {
    /// A store holding exactly one course. Progress records are assigned to
    /// the snapshot's course.
    pub async fn from_snapshot(snapshot: CourseSnapshot) -> Self {
        let store = Self::new();
        let course_id = snapshot.course_id;
        store
            .seed_course(course_id, snapshot.topics, snapshot.connections)
            .await;
        store
            .seed_progress(
                snapshot
                    .progress
                    .into_iter()
                    .map(|mut r| {
                        r.course_id = course_id;
                        r
                    })
                    .collect(),
            )
            .await;
        store
    }
}

fn same_slot(a: &NeuralPath, b: &NeuralPath) -> bool {
    a.user_id == b.user_id && a.course_id == b.course_id && a.path_type == b.path_type
}

#[async_trait]
impl CourseStore for InMemoryCourseStore {
    async fn list_topics(&self, course_id: CourseId) -> Result<Vec<Topic>> {
        Ok(self
            .topics
            .read()
            .await
            .get(&course_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_connections(&self, course_id: CourseId) -> Result<Vec<Connection>> {
        Ok(self
            .connections
            .read()
            .await
            .get(&course_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn update_positions(
        &self,
        course_id: CourseId,
        dimensions: Dimensions,
        positions: &HashMap<TopicId, Position>,
    ) -> Result<usize> {
        let mut topics = self.topics.write().await;
        let Some(course) = topics.get_mut(&course_id) else {
            return Ok(0);
        };
        let mut updated = 0;
        for topic in course.iter_mut() {
            if let Some(p) = positions.get(&topic.id) {
                match dimensions {
                    Dimensions::Two => topic.position_2d = Some(*p),
                    Dimensions::Three => topic.position_3d = Some(*p),
                }
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn list_progress(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Vec<ProgressRecord>> {
        let mut records: Vec<ProgressRecord> = self
            .progress
            .read()
            .await
            .values()
            .filter(|r| r.user_id == user_id && r.course_id == course_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.topic_id);
        Ok(records)
    }

    async fn get_progress(
        &self,
        user_id: UserId,
        course_id: CourseId,
        topic_id: TopicId,
    ) -> Result<Option<ProgressRecord>> {
        Ok(self
            .progress
            .read()
            .await
            .get(&(user_id, course_id, topic_id))
            .cloned())
    }

    async fn upsert_progress(&self, record: &ProgressRecord) -> Result<()> {
        self.progress.write().await.insert(
            (record.user_id, record.course_id, record.topic_id),
            record.clone(),
        );
        Ok(())
    }

    async fn apply_answer(
        &self,
        user_id: UserId,
        course_id: CourseId,
        topic_id: TopicId,
        correct: bool,
        study_secs: u64,
    ) -> Result<ProgressRecord> {
        let mut progress = self.progress.write().await;
        let record = progress
            .entry((user_id, course_id, topic_id))
            .or_insert_with(|| ProgressRecord::new(user_id, course_id, topic_id));
        record.record_answer(correct, study_secs);
        Ok(record.clone())
    }

    async fn reset_progress(&self, user_id: UserId, course_id: CourseId) -> Result<usize> {
        let mut progress = self.progress.write().await;
        let before = progress.len();
        progress.retain(|(u, c, _), _| !(*u == user_id && *c == course_id));
        Ok(before - progress.len())
    }

    async fn list_paths(
        &self,
        user_id: UserId,
        course_id: CourseId,
        path_type: Option<PathType>,
    ) -> Result<Vec<NeuralPath>> {
        let mut paths: Vec<NeuralPath> = self
            .paths
            .read()
            .await
            .values()
            .filter(|p| p.user_id == user_id && p.course_id == course_id)
            .filter(|p| path_type.map_or(true, |t| p.path_type == t))
            .cloned()
            .collect();
        paths.sort_by_key(|p| p.created_at);
        Ok(paths)
    }

    async fn get_path(&self, id: Uuid) -> Result<Option<NeuralPath>> {
        Ok(self.paths.read().await.get(&id).cloned())
    }

    async fn get_active_path(
        &self,
        user_id: UserId,
        course_id: CourseId,
        path_type: PathType,
    ) -> Result<Option<NeuralPath>> {
        Ok(self
            .paths
            .read()
            .await
            .values()
            .find(|p| {
                p.user_id == user_id
                    && p.course_id == course_id
                    && p.path_type == path_type
                    && p.status == PathStatus::Active
            })
            .cloned())
    }

    async fn save_path(&self, path: &NeuralPath) -> Result<()> {
        self.paths.write().await.insert(path.id, path.clone());
        Ok(())
    }

    async fn update_path(&self, id: Uuid, update: PathUpdate) -> Result<Option<NeuralPath>> {
        let mut paths = self.paths.write().await;
        let Some(stored) = paths.get_mut(&id) else {
            return Ok(None);
        };
        let mut next = stored.clone();
        update(&mut next)?;
        *stored = next.clone();
        Ok(Some(next))
    }

    async fn replace_active_path(&self, path: &NeuralPath) -> Result<Vec<Uuid>> {
        let mut paths = self.paths.write().await;
        let mut superseded = Vec::new();
        for existing in paths.values_mut() {
            if existing.id != path.id && existing.is_active() && same_slot(existing, path) {
                existing
                    .supersede()
                    .with_context(|| format!("Failed to supersede neural path {}", existing.id))?;
                superseded.push(existing.id);
            }
        }
        paths.insert(path.id, path.clone());
        Ok(superseded)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::models::{PathEntry, PathError};
    use std::sync::Arc;

    fn record(user_id: UserId, course_id: CourseId, topic_id: TopicId) -> ProgressRecord {
        ProgressRecord::new(user_id, course_id, topic_id)
    }

    fn active(user_id: UserId, course_id: CourseId, path_type: PathType) -> NeuralPath {
        let mut path = NeuralPath::new(
            user_id,
            course_id,
            path_type,
            vec![PathEntry::new(1, 1.0, false)],
        );
        path.activate().unwrap();
        path
    }

    #[tokio::test]
    async fn test_seed_and_list_course() {
        let store = InMemoryCourseStore::new();
        store
            .seed_course(
                4,
                vec![Topic::new(2, 1, 1), Topic::new(1, 1, 1)],
                vec![Connection::new(1, 2, 1, Default::default(), 0.5)],
            )
            .await;

        let topics = store.list_topics(4).await.unwrap();
        assert_eq!(topics.iter().map(|t| t.id).collect::<Vec<_>>(), vec![2, 1]);
        assert!(topics.iter().all(|t| t.course_id == 4));
        assert_eq!(store.list_connections(4).await.unwrap().len(), 1);
        assert!(store.list_topics(5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_from_snapshot_file() {
        let json = r#"{
            "course_id": 12,
            "topics": [
                {"id": 1, "block": 1, "difficulty": 2},
                {"id": 2, "block": 1}
            ],
            "connections": [{"id": 1, "source": 1, "target": 2, "weight": 0.8}],
            "progress": [{"user_id": 5, "topic_id": 1, "mastery": 30.0, "total": 10, "correct": 3}]
        }"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("course.json");
        std::fs::write(&path, json).unwrap();

        let snapshot = CourseSnapshot::from_json_file(&path).unwrap();
        let store = InMemoryCourseStore::from_snapshot(snapshot).await;

        assert_eq!(store.list_topics(12).await.unwrap().len(), 2);
        assert_eq!(store.list_connections(12).await.unwrap().len(), 1);
        let progress = store.list_progress(5, 12).await.unwrap();
        assert_eq!(progress.len(), 1);
        assert!((progress[0].mastery - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_snapshot_file_errors() {
        let missing = Path::new("/tmp/nonexistent-snapshot-12345.json");
        let err = CourseSnapshot::from_json_file(missing).unwrap_err();
        assert!(err.to_string().contains("Failed to read snapshot"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{\"topics\": 3}").unwrap();
        let err = CourseSnapshot::from_json_file(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse snapshot"));
    }

    #[tokio::test]
    async fn test_update_positions() {
        let store = InMemoryCourseStore::new();
        store
            .seed_course(1, vec![Topic::new(1, 1, 1), Topic::new(2, 1, 1)], vec![])
            .await;

        let positions = HashMap::from([(1, Position::new_3d(1.0, 2.0, 3.0))]);
        let n = store
            .update_positions(1, Dimensions::Three, &positions)
            .await
            .unwrap();
        assert_eq!(n, 1);

        let topics = store.list_topics(1).await.unwrap();
        assert_eq!(topics[0].position_3d, Some(Position::new_3d(1.0, 2.0, 3.0)));
        assert!(topics[0].position_2d.is_none());
        assert!(topics[1].position_3d.is_none());
    }

    #[tokio::test]
    async fn test_progress_is_scoped_by_user_and_course() {
        let store = InMemoryCourseStore::new();
        store
            .seed_progress(vec![record(1, 1, 3), record(1, 1, 2), record(2, 1, 2), record(1, 9, 2)])
            .await;

        let mine = store.list_progress(1, 1).await.unwrap();
        assert_eq!(mine.iter().map(|r| r.topic_id).collect::<Vec<_>>(), vec![2, 3]);
        assert!(store.get_progress(2, 1, 3).await.unwrap().is_none());

        assert_eq!(store.reset_progress(1, 1).await.unwrap(), 2);
        assert!(store.list_progress(1, 1).await.unwrap().is_empty());
        assert_eq!(store.list_progress(2, 1).await.unwrap().len(), 1);
        assert_eq!(store.list_progress(1, 9).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_progress_replaces() {
        let store = InMemoryCourseStore::new();
        let mut r = record(1, 1, 1);
        store.upsert_progress(&r).await.unwrap();
        r.record_answer(true, 10);
        store.upsert_progress(&r).await.unwrap();

        let stored = store.get_progress(1, 1, 1).await.unwrap().unwrap();
        assert_eq!(stored.total, 1);
        assert_eq!(store.list_progress(1, 1).await.unwrap().len(), 1);
    }

    fn complete(topic_id: TopicId) -> PathUpdate {
        Box::new(move |p: &mut NeuralPath| -> Result<()> {
            p.mark_completed(topic_id)?;
            Ok(())
        })
    }

    #[tokio::test]
    async fn test_apply_answer_creates_then_accumulates() {
        let store = InMemoryCourseStore::new();
        let first = store.apply_answer(1, 2, 3, true, 20).await.unwrap();
        assert_eq!((first.correct, first.total), (1, 1));

        let second = store.apply_answer(1, 2, 3, false, 10).await.unwrap();
        assert_eq!((second.correct, second.total), (1, 2));
        assert_eq!(second.study_time_secs, 30);
        assert!((second.mastery - 50.0).abs() < f64::EPSILON);
        assert_eq!(store.get_progress(1, 2, 3).await.unwrap(), Some(second));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_answers_are_all_counted() {
        let store = Arc::new(InMemoryCourseStore::new());
        let handles: Vec<_> = (0..64)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.apply_answer(1, 1, 1, i % 2 == 0, 1).await })
            })
            .collect();
        for h in handles {
            h.await.unwrap().unwrap();
        }

        let record = store.get_progress(1, 1, 1).await.unwrap().unwrap();
        assert_eq!(record.total, 64);
        assert_eq!(record.correct, 32);
        assert_eq!(record.study_time_secs, 64);
    }

    #[tokio::test]
    async fn test_update_path_is_all_or_nothing() {
        let store = InMemoryCourseStore::new();
        let path = active(1, 1, PathType::Optimal);
        store.save_path(&path).await.unwrap();

        let updated = store
            .update_path(path.id, complete(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, PathStatus::Completed);
        assert_eq!(store.get_path(path.id).await.unwrap(), Some(updated));

        // A failing update leaves the stored copy untouched
        let err = store
            .update_path(
                path.id,
                Box::new(|p: &mut NeuralPath| -> Result<()> {
                    p.entries.clear();
                    anyhow::bail!("rejected")
                }),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "rejected");
        assert_eq!(store.get_path(path.id).await.unwrap().unwrap().entries.len(), 1);

        let missing = store
            .update_path(Uuid::new_v4(), complete(1))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_update_path_sees_supersession() {
        let store = InMemoryCourseStore::new();
        let old = active(1, 1, PathType::Optimal);
        store.save_path(&old).await.unwrap();
        store
            .replace_active_path(&active(1, 1, PathType::Optimal))
            .await
            .unwrap();

        let err = store
            .update_path(old.id, complete(1))
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<PathError>().is_some());
        assert_eq!(
            store.get_path(old.id).await.unwrap().unwrap().status,
            PathStatus::Superseded
        );
    }

    #[tokio::test]
    async fn test_replace_active_path_supersedes_same_slot_only() {
        let store = InMemoryCourseStore::new();
        let old = active(1, 1, PathType::Optimal);
        let other_type = active(1, 1, PathType::Exploration);
        let other_user = active(2, 1, PathType::Optimal);
        for p in [&old, &other_type, &other_user] {
            store.save_path(p).await.unwrap();
        }

        let new = active(1, 1, PathType::Optimal);
        let superseded = store.replace_active_path(&new).await.unwrap();
        assert_eq!(superseded, vec![old.id]);

        let old_now = store.get_path(old.id).await.unwrap().unwrap();
        assert_eq!(old_now.status, PathStatus::Superseded);
        assert!(store.get_path(other_type.id).await.unwrap().unwrap().is_active());
        assert!(store.get_path(other_user.id).await.unwrap().unwrap().is_active());

        let current = store
            .get_active_path(1, 1, PathType::Optimal)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.id, new.id);
        assert_eq!(
            store
                .list_paths(1, 1, Some(PathType::Optimal))
                .await
                .unwrap()
                .len(),
            2
        );
        assert_eq!(store.list_paths(1, 1, None).await.unwrap().len(), 3);
    }
}
