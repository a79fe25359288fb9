//! Neural path and recommendation models.
//!
//! A neural path is a generated, ordered study plan for one user in one
//! course. Its status follows a small state machine:
//!
//! ```text
//! Generating ──► Active ──► Superseded
//!                   │
//!                   └─────► Completed
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::graph::models::{CourseId, TopicId, UserId};

// ============================================================================
// Enums
// ============================================================================

/// Kind of study plan.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PathType {
    /// Balanced plan over the whole course, prerequisites first
    #[default]
    Optimal,
    /// Studied topics ranked by mastery gap
    Reinforcement,
    /// Topics never studied, easiest and most central first
    Exploration,
}

impl fmt::Display for PathType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Optimal => write!(f, "optimal"),
            Self::Reinforcement => write!(f, "reinforcement"),
            Self::Exploration => write!(f, "exploration"),
        }
    }
}

impl FromStr for PathType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "optimal" => Ok(Self::Optimal),
            "reinforcement" => Ok(Self::Reinforcement),
            "exploration" => Ok(Self::Exploration),
            _ => Err(format!("Unknown path type: {}", s)),
        }
    }
}

/// Lifecycle status of a neural path
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PathStatus {
    /// Entries are being computed
    #[default]
    Generating,
    /// The path the user is currently following
    Active,
    /// Replaced by a newer path of the same type
    Superseded,
    /// Every entry has been completed
    Completed,
}

impl PathStatus {
    /// Whether `self → to` is an allowed transition.
    pub fn can_transition_to(self, to: PathStatus) -> bool {
        matches!(
            (self, to),
            (Self::Generating, Self::Active)
                | (Self::Active, Self::Superseded)
                | (Self::Active, Self::Completed)
        )
    }

    /// Superseded and Completed paths never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Superseded | Self::Completed)
    }
}

impl fmt::Display for PathStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generating => write!(f, "generating"),
            Self::Active => write!(f, "active"),
            Self::Superseded => write!(f, "superseded"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors raised by neural path operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("cannot move neural path from {from} to {to}")]
    InvalidTransition { from: PathStatus, to: PathStatus },

    #[error("topic {0} is not part of this path")]
    TopicNotInPath(TopicId),

    #[error("neural path is {0}, only active paths can be updated")]
    NotActive(PathStatus),
}

// ============================================================================
// Neural path
// ============================================================================

/// One step of a neural path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathEntry {
    pub topic_id: TopicId,
    /// Priority or need score the entry was ranked by
    pub score: f64,
    #[serde(default)]
    pub completed: bool,
}

impl PathEntry {
    pub fn new(topic_id: TopicId, score: f64, completed: bool) -> Self {
        Self {
            topic_id,
            score,
            completed,
        }
    }
}

/// A typed, ordered study plan for one user in one course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuralPath {
    pub id: Uuid,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub path_type: PathType,
    pub status: PathStatus,
    pub entries: Vec<PathEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NeuralPath {
    /// A new path in the `Generating` state.
    pub fn new(
        user_id: UserId,
        course_id: CourseId,
        path_type: PathType,
        entries: Vec<PathEntry>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            course_id,
            path_type,
            status: PathStatus::Generating,
            entries,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `to`, or fail with `InvalidTransition`.
    pub fn transition(&mut self, to: PathStatus) -> Result<(), PathError> {
        if !self.status.can_transition_to(to) {
            return Err(PathError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Generating → Active. A non-empty path whose entries are all already
    /// completed goes straight on to Completed.
    pub fn activate(&mut self) -> Result<(), PathError> {
        self.transition(PathStatus::Active)?;
        if self.is_finished() {
            self.transition(PathStatus::Completed)?;
        }
        Ok(())
    }

    /// Active → Superseded.
    pub fn supersede(&mut self) -> Result<(), PathError> {
        self.transition(PathStatus::Superseded)
    }

    pub fn is_active(&self) -> bool {
        self.status == PathStatus::Active
    }

    pub fn completed_count(&self) -> usize {
        self.entries.iter().filter(|e| e.completed).count()
    }

    /// completed / total × 100; 0 for an empty path.
    pub fn progress(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        self.completed_count() as f64 / self.entries.len() as f64 * 100.0
    }

    /// First entry not yet completed. `None` once the path is done.
    pub fn next_topic(&self) -> Option<TopicId> {
        if self.status == PathStatus::Completed {
            return None;
        }
        self.entries
            .iter()
            .find(|e| !e.completed)
            .map(|e| e.topic_id)
    }

    /// Mark one entry completed. Completing the last open entry moves the
    /// path to Completed. Returns the resulting status.
    pub fn mark_completed(&mut self, topic_id: TopicId) -> Result<PathStatus, PathError> {
        if !self.is_active() {
            return Err(PathError::NotActive(self.status));
        }
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.topic_id == topic_id)
            .ok_or(PathError::TopicNotInPath(topic_id))?;
        entry.completed = true;
        self.updated_at = Utc::now();

        if self.is_finished() {
            self.transition(PathStatus::Completed)?;
        }
        Ok(self.status)
    }

    fn is_finished(&self) -> bool {
        !self.entries.is_empty() && self.entries.iter().all(|e| e.completed)
    }
}

// ============================================================================
// Recommendations
// ============================================================================

/// Why a topic is recommended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationReason {
    NewTopic,
    NeedsReinforcement,
    KeepImproving,
    OccasionalReview,
}

impl fmt::Display for RecommendationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NewTopic => write!(f, "new topic"),
            Self::NeedsReinforcement => write!(f, "needs reinforcement"),
            Self::KeepImproving => write!(f, "keep improving"),
            Self::OccasionalReview => write!(f, "occasional review"),
        }
    }
}

/// A ranked topic suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub topic_id: TopicId,
    pub title: String,
    pub score: f64,
    /// Current mastery, `None` when the topic was never studied
    pub mastery: Option<f64>,
    pub reason: RecommendationReason,
}

// ============================================================================
// Tests
// ============================================================================
