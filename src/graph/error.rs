//! Errors raised by the graph core.
//!
//! Only structural problems with the input data are errors. Cycles in the
//! prerequisite graph and empty graphs are handled by the algorithms and
//! never surface here.

use thiserror::Error;

use super::models::TopicId;

/// Why a topic/connection snapshot was rejected by [`TopicGraph::build`].
///
/// [`TopicGraph::build`]: super::models::TopicGraph::build
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidGraphReason {
    /// A connection references a topic that is not part of the snapshot.
    #[error("connection {connection_id} references unknown topic {topic_id}")]
    UnknownTopic {
        connection_id: i64,
        topic_id: TopicId,
    },
    /// A connection whose source and target are the same topic.
    #[error("connection {connection_id} links topic {topic_id} to itself")]
    SelfLoop {
        connection_id: i64,
        topic_id: TopicId,
    },
    /// Two topics share the same identifier.
    #[error("topic {topic_id} appears twice")]
    DuplicateTopic { topic_id: TopicId },
    /// Two active connections share the same (source, target) pair.
    #[error("connection {connection_id} duplicates active pair {from} -> {to}")]
    DuplicateConnection {
        connection_id: i64,
        from: TopicId,
        to: TopicId,
    },
}

/// Errors produced while building or laying out a topic graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Upstream data corruption: the snapshot cannot form a valid graph.
    #[error("invalid topic graph: {0}")]
    InvalidGraph(InvalidGraphReason),

    /// The graph exceeds the configured per-view node limit.
    #[error("graph has {nodes} topics, limit is {max}")]
    GraphTooLarge { nodes: usize, max: usize },
}

pub type GraphResult<T> = std::result::Result<T, GraphError>;
