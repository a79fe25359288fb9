//! Course engine — orchestrates load → compute → persist.
//!
//! The `NeuroEngine` trait is the single entry point for consumers (the CLI
//! today). Every operation:
//!
//! 1. **Loads** the course snapshot and the user's progress from a `CourseStore`
//! 2. **Computes** with the pure `graph` and `paths` modules
//! 3. **Persists** whatever the computation produced (positions, progress, paths)

use crate::graph::clusters::{clusters_by_block, clusters_by_connectivity, Cluster, ClusterKind};
use crate::graph::layout::{layout, LayoutResult};
use crate::graph::models::{CourseId, Dimensions, Topic, TopicGraph, TopicId, UserId};
use crate::paths::models::{NeuralPath, PathType, Recommendation};
use crate::paths::progress::{mastery_by_topic, ProgressRecord, ProgressSummary};
use crate::paths::scoring::{build_path_entries, recommended_topics};
use crate::store::{CourseStore, PathUpdate};
use crate::Config;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

// ============================================================================
// Trait
// ============================================================================

/// Engine trait — single entry point for layout, clustering and study paths.
///
/// Consumers use `Arc<dyn NeuroEngine>` for dependency injection.
#[async_trait]
pub trait NeuroEngine: Send + Sync {
    /// Run the force layout for a course and persist the new positions.
    async fn compute_layout(
        &self,
        course_id: CourseId,
        dimensions: Dimensions,
    ) -> Result<LayoutResult>;

    /// Group the course's active topics.
    async fn detect_clusters(&self, course_id: CourseId, kind: ClusterKind)
        -> Result<Vec<Cluster>>;

    /// Build a new path, superseding the active one of the same type.
    async fn generate_path(
        &self,
        user_id: UserId,
        course_id: CourseId,
        path_type: PathType,
    ) -> Result<NeuralPath>;

    /// Ranked topic suggestions. `None` uses the configured limit.
    async fn recommend_topics(
        &self,
        user_id: UserId,
        course_id: CourseId,
        limit: Option<usize>,
    ) -> Result<Vec<Recommendation>>;

    /// Apply one answered question to the user's progress on a topic.
    async fn record_answer(
        &self,
        user_id: UserId,
        course_id: CourseId,
        topic_id: TopicId,
        correct: bool,
        study_secs: u64,
    ) -> Result<ProgressRecord>;

    /// Mark a topic of a stored path as completed.
    async fn complete_topic(&self, path_id: Uuid, topic_id: TopicId) -> Result<NeuralPath>;

    /// Next open topic of the active path of a type, if any.
    async fn next_topic(
        &self,
        user_id: UserId,
        course_id: CourseId,
        path_type: PathType,
    ) -> Result<Option<TopicId>>;

    /// Course-level progress totals for a user.
    async fn progress_summary(&self, user_id: UserId, course_id: CourseId)
        -> Result<ProgressSummary>;

    /// Delete a user's progress in a course. Returns the number of records removed.
    async fn reset_progress(&self, user_id: UserId, course_id: CourseId) -> Result<usize>;
}

// ============================================================================
// Concrete implementation
// ============================================================================

/// Engine backed by a `CourseStore`.
pub struct CourseEngine {
    store: Arc<dyn CourseStore>,
    config: Config,
}

impl CourseEngine {
    /// Create a new engine backed by the given store.
    pub fn new(store: Arc<dyn CourseStore>, config: Config) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Active topics of a course, in stored order.
    async fn active_topics(&self, course_id: CourseId) -> Result<Vec<Topic>> {
        let topics = self
            .store
            .list_topics(course_id)
            .await
            .with_context(|| format!("Failed to load topics of course {}", course_id))?;
        Ok(topics.into_iter().filter(|t| t.active).collect())
    }

    /// Graph over active topics and the active connections between them.
    ///
    /// Connections touching an inactive topic are dropped with it; a
    /// connection to a topic the course does not have at all is an error.
    async fn load_graph(&self, course_id: CourseId) -> Result<TopicGraph> {
        let all_topics = self
            .store
            .list_topics(course_id)
            .await
            .with_context(|| format!("Failed to load topics of course {}", course_id))?;
        let connections = self
            .store
            .list_connections(course_id)
            .await
            .with_context(|| format!("Failed to load connections of course {}", course_id))?;

        let inactive: HashSet<TopicId> = all_topics
            .iter()
            .filter(|t| !t.active)
            .map(|t| t.id)
            .collect();
        let topics: Vec<Topic> = all_topics.into_iter().filter(|t| t.active).collect();
        let connections: Vec<_> = connections
            .into_iter()
            .filter(|c| c.active)
            .filter(|c| !inactive.contains(&c.source) && !inactive.contains(&c.target))
            .collect();

        let graph = TopicGraph::build(&topics, &connections)
            .with_context(|| format!("Course {} has an invalid topic graph", course_id))?;
        debug!(
            "Loaded course {}: {} topics, {} connections",
            course_id,
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    async fn load_progress(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Vec<ProgressRecord>> {
        self.store
            .list_progress(user_id, course_id)
            .await
            .with_context(|| {
                format!(
                    "Failed to load progress of user {} in course {}",
                    user_id, course_id
                )
            })
    }
}

#[async_trait]
impl NeuroEngine for CourseEngine {
    async fn compute_layout(
        &self,
        course_id: CourseId,
        dimensions: Dimensions,
    ) -> Result<LayoutResult> {
        // 1. Load
        let graph = self.load_graph(course_id).await?;
        let initial = graph.stored_positions(dimensions);

        // 2. Compute
        let params = self.config.force_params(dimensions);
        let seeder = self.config.seeder();
        let started = Instant::now();
        let positions = layout(&graph, &initial, dimensions, &params, seeder.as_ref())
            .with_context(|| format!("{} layout failed for course {}", dimensions, course_id))?;
        let computation_ms = started.elapsed().as_millis() as u64;

        // 3. Persist
        let updated = self
            .store
            .update_positions(course_id, dimensions, &positions)
            .await
            .with_context(|| format!("Failed to store positions of course {}", course_id))?;

        info!(
            "{} layout of course {}: {} topics placed in {} ms ({} stored)",
            dimensions,
            course_id,
            positions.len(),
            computation_ms,
            updated
        );

        Ok(LayoutResult {
            dimensions,
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            iterations: if positions.is_empty() { 0 } else { params.iterations },
            positions,
            computation_ms,
        })
    }

    async fn detect_clusters(
        &self,
        course_id: CourseId,
        kind: ClusterKind,
    ) -> Result<Vec<Cluster>> {
        let clusters = match kind {
            ClusterKind::Block => clusters_by_block(&self.active_topics(course_id).await?),
            ClusterKind::Connectivity => clusters_by_connectivity(&self.load_graph(course_id).await?),
        };
        debug!(
            "Course {}: {} {} clusters",
            course_id,
            clusters.len(),
            kind
        );
        Ok(clusters)
    }

    async fn generate_path(
        &self,
        user_id: UserId,
        course_id: CourseId,
        path_type: PathType,
    ) -> Result<NeuralPath> {
        let graph = self.load_graph(course_id).await?;
        let mastery = mastery_by_topic(&self.load_progress(user_id, course_id).await?);

        let entries = build_path_entries(path_type, &graph, &mastery);
        let mut path = NeuralPath::new(user_id, course_id, path_type, entries);
        path.activate()?;

        let superseded = self
            .store
            .replace_active_path(&path)
            .await
            .with_context(|| format!("Failed to store {} path {}", path_type, path.id))?;

        info!(
            "Generated {} path {} for user {} in course {} ({} entries, {} superseded)",
            path_type,
            path.id,
            user_id,
            course_id,
            path.entries.len(),
            superseded.len()
        );
        Ok(path)
    }

    async fn recommend_topics(
        &self,
        user_id: UserId,
        course_id: CourseId,
        limit: Option<usize>,
    ) -> Result<Vec<Recommendation>> {
        let topics = self.active_topics(course_id).await?;
        let mastery = mastery_by_topic(&self.load_progress(user_id, course_id).await?);
        let limit = limit.unwrap_or(self.config.recommendation_limit);
        Ok(recommended_topics(&topics, &mastery, limit))
    }

    async fn record_answer(
        &self,
        user_id: UserId,
        course_id: CourseId,
        topic_id: TopicId,
        correct: bool,
        study_secs: u64,
    ) -> Result<ProgressRecord> {
        let topics = self.active_topics(course_id).await?;
        if !topics.iter().any(|t| t.id == topic_id) {
            bail!("Topic {} is not an active topic of course {}", topic_id, course_id);
        }

        let record = self
            .store
            .apply_answer(user_id, course_id, topic_id, correct, study_secs)
            .await
            .with_context(|| {
                format!(
                    "Failed to store progress of user {} on topic {}",
                    user_id, topic_id
                )
            })?;

        debug!(
            "User {} topic {}: {}/{} correct, mastery {:.1}%",
            user_id, topic_id, record.correct, record.total, record.mastery
        );
        Ok(record)
    }

    async fn complete_topic(&self, path_id: Uuid, topic_id: TopicId) -> Result<NeuralPath> {
        // Runs under the store's lock: a path superseded meanwhile fails with NotActive.
        let update: PathUpdate = Box::new(move |path: &mut NeuralPath| -> Result<()> {
            path.mark_completed(topic_id)?;
            Ok(())
        });
        let Some(path) = self.store.update_path(path_id, update).await? else {
            bail!("Neural path {} not found", path_id);
        };
        debug!(
            "Path {}: topic {} completed, {:.0}% done ({})",
            path_id,
            topic_id,
            path.progress(),
            path.status
        );
        Ok(path)
    }

    async fn next_topic(
        &self,
        user_id: UserId,
        course_id: CourseId,
        path_type: PathType,
    ) -> Result<Option<TopicId>> {
        Ok(self
            .store
            .get_active_path(user_id, course_id, path_type)
            .await?
            .and_then(|p| p.next_topic()))
    }

    async fn progress_summary(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<ProgressSummary> {
        let active: HashSet<TopicId> = self
            .active_topics(course_id)
            .await?
            .iter()
            .map(|t| t.id)
            .collect();
        let records: Vec<ProgressRecord> = self
            .load_progress(user_id, course_id)
            .await?
            .into_iter()
            .filter(|r| active.contains(&r.topic_id))
            .collect();
        Ok(ProgressSummary::from_records(active.len(), &records))
    }

    async fn reset_progress(&self, user_id: UserId, course_id: CourseId) -> Result<usize> {
        let removed = self.store.reset_progress(user_id, course_id).await?;
        info!(
            "Reset {} progress records of user {} in course {}",
            removed, user_id, course_id
        );
        Ok(removed)
    }
}

// ============================================================================
// Tests
// ============================================================================
