//! Topic graph core.
//!
//! Pure, synchronous graph algorithms over a course's topics and
//! connections, built on petgraph.
//!
//! ## Architecture
//!
//! ```text
//! topics + connections ──► TopicGraph::build ──► petgraph::DiGraph
//!                                                     │
//!                          ┌──────────────────────────┼───────────────────┐
//!                        layout                   clusters            toposort
//!                          │                          │                   │
//!                 HashMap<TopicId, Position>     Vec<Cluster>        Vec<Topic>
//! ```
//!
//! ## Modules
//!
//! - [`models`] — Topic, Connection, Position, Dimensions and the `TopicGraph` wrapper
//! - [`error`] — `GraphError` raised for invalid snapshots and oversized graphs
//! - [`layout`] — Force-directed layout (repulsion, springs, damped integration)
//! - [`clusters`] — Clusters by block and by connected component
//! - [`toposort`] — Prerequisite ordering tolerant of cycles

pub mod clusters;
pub mod error;
pub mod layout;
pub mod models;
pub mod toposort;

// Re-export primary types for convenience
pub use clusters::{clusters_by_block, clusters_by_connectivity, Cluster, ClusterKind};
pub use error::{GraphError, GraphResult, InvalidGraphReason};
pub use layout::{
    layout, CircleSeeder, ForceParams, JitterSeeder, LayoutResult, PositionSeeder,
};
pub use models::{
    AdjacencyDirection, Connection, ConnectionType, CourseId, Dimensions, Position, Topic,
    TopicGraph, TopicId, UserId,
};
pub use toposort::{prerequisite_edges, sort_by_prerequisites, PrerequisiteEdge};
