//! Topic graph data models.
//!
//! Defines the type system shared by the layout, clustering and sorting
//! algorithms:
//!
//! ## Input types (collaborator → core)
//! - [`Topic`] — a study topic (graph node) with optional stored positions
//! - [`ConnectionType`] / [`Connection`] — a weighted, typed relation between topics
//!
//! ## Geometry
//! - [`Position`] — a 2D or 3D coordinate
//! - [`Dimensions`] — which layout space a position belongs to
//!
//! ## Graph
//! - [`TopicGraph`] — petgraph wrapper with topic id ↔ NodeIndex mapping

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::error::{GraphError, GraphResult, InvalidGraphReason};

/// Stable topic identifier.
pub type TopicId = i64;
/// Course identifier.
pub type CourseId = i64;
/// User identifier.
pub type UserId = i64;

/// Lowest difficulty level on the topic scale.
pub const MIN_DIFFICULTY: u8 = 1;
/// Highest difficulty level on the topic scale.
pub const MAX_DIFFICULTY: u8 = 5;

// ============================================================================
// Geometry
// ============================================================================

/// Layout space: the 2D map or the 3D map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Dimensions {
    Two,
    Three,
}

impl Dimensions {
    /// Number of spatial axes.
    pub fn axes(self) -> usize {
        match self {
            Self::Two => 2,
            Self::Three => 3,
        }
    }
}

impl TryFrom<u8> for Dimensions {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            other => Err(format!("dimensions must be 2 or 3, got {}", other)),
        }
    }
}

impl From<Dimensions> for u8 {
    fn from(value: Dimensions) -> Self {
        value.axes() as u8
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}D", self.axes())
    }
}

/// A node coordinate. `z` is only present for 3D positions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

impl Position {
    pub fn new_2d(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    pub fn new_3d(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }

    /// Vector form used by the simulation (missing z reads as 0).
    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z.unwrap_or(0.0)]
    }

    /// Build a position from a simulation vector, dropping z for 2D.
    pub fn from_array(v: [f64; 3], dimensions: Dimensions) -> Self {
        match dimensions {
            Dimensions::Two => Self::new_2d(v[0], v[1]),
            Dimensions::Three => Self::new_3d(v[0], v[1], v[2]),
        }
    }

    /// Euclidean distance to another position (missing z reads as 0).
    pub fn distance(&self, other: &Position) -> f64 {
        let a = self.to_array();
        let b = other.to_array();
        ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)).sqrt()
    }
}

// ============================================================================
// Input types
// ============================================================================

fn default_difficulty() -> u8 {
    3
}

fn default_color() -> String {
    "#3498db".to_string()
}

fn default_true() -> bool {
    true
}

fn default_weight() -> f64 {
    1.0
}

/// A study topic (tema): one node of the course graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: TopicId,
    #[serde(default)]
    pub course_id: CourseId,
    /// Coarse grouping (bloque), usually 1–8
    pub block: u32,
    /// Sequence number within the block
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub title: String,
    /// Difficulty on the 1–5 scale (default: 3)
    #[serde(default = "default_difficulty")]
    pub difficulty: u8,
    #[serde(default)]
    pub position_2d: Option<Position>,
    #[serde(default)]
    pub position_3d: Option<Position>,
    /// Display color (CSS hex)
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl Topic {
    /// Create an active topic without stored positions.
    pub fn new(id: TopicId, block: u32, difficulty: u8) -> Self {
        Self {
            id,
            course_id: 0,
            block,
            number: 0,
            title: format!("Tema {}", id),
            difficulty,
            position_2d: None,
            position_3d: None,
            color: default_color(),
            active: true,
        }
    }

    /// Difficulty clamped into the 1–5 scale.
    pub fn difficulty_level(&self) -> u8 {
        self.difficulty.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
    }

    /// Stored position for the given layout space, if any.
    pub fn stored_position(&self, dimensions: Dimensions) -> Option<Position> {
        match dimensions {
            Dimensions::Two => self.position_2d,
            Dimensions::Three => self.position_3d,
        }
    }
}

/// Type of relation between two topics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    #[default]
    Direct,
    Conceptual,
    Practical,
    Temporal,
    /// `source` must be studied before `target`
    Prerequisite,
}

impl std::fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::Conceptual => write!(f, "conceptual"),
            Self::Practical => write!(f, "practical"),
            Self::Temporal => write!(f, "temporal"),
            Self::Prerequisite => write!(f, "prerequisite"),
        }
    }
}

/// A directed, weighted relation between two topics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: i64,
    pub source: TopicId,
    pub target: TopicId,
    #[serde(default, rename = "type")]
    pub connection_type: ConnectionType,
    /// Relation strength, normally in [0, 1] (default: 1.0)
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl Connection {
    /// Create an active connection.
    pub fn new(
        id: i64,
        source: TopicId,
        target: TopicId,
        connection_type: ConnectionType,
        weight: f64,
    ) -> Self {
        Self {
            id,
            source,
            target,
            connection_type,
            weight,
            active: true,
        }
    }

    /// Whether this connection joins `a` and `b`, in either direction.
    pub fn joins(&self, a: TopicId, b: TopicId) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }
}

// ============================================================================
// TopicGraph — petgraph wrapper with ID mapping
// ============================================================================

/// Which edge direction an adjacency query follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjacencyDirection {
    /// source → target
    Out,
    /// target → source
    In,
    /// every edge counted in both directions
    Both,
}

/// Immutable snapshot of a course's topics and connections.
///
/// Node indices follow the input topic order and edge indices follow the
/// input connection order, so every traversal over this graph is
/// deterministic for a given snapshot.
#[derive(Debug, Clone)]
pub struct TopicGraph {
    /// The underlying directed graph
    pub graph: DiGraph<Topic, Connection>,
    /// Mapping from topic ID to petgraph NodeIndex
    pub id_to_index: HashMap<TopicId, NodeIndex>,
}

impl TopicGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            id_to_index: HashMap::new(),
        }
    }

    /// Validate a snapshot and build the graph from it.
    ///
    /// Rejects duplicate topic ids, connections to unknown topics, self-loops
    /// and duplicated active (source, target) pairs.
    pub fn build(topics: &[Topic], connections: &[Connection]) -> GraphResult<Self> {
        let mut graph = DiGraph::with_capacity(topics.len(), connections.len());
        let mut id_to_index = HashMap::with_capacity(topics.len());

        for topic in topics {
            if id_to_index.contains_key(&topic.id) {
                return Err(GraphError::InvalidGraph(
                    InvalidGraphReason::DuplicateTopic { topic_id: topic.id },
                ));
            }
            let idx = graph.add_node(topic.clone());
            id_to_index.insert(topic.id, idx);
        }

        let mut active_pairs: HashSet<(TopicId, TopicId)> = HashSet::new();
        for conn in connections {
            if conn.source == conn.target {
                return Err(GraphError::InvalidGraph(InvalidGraphReason::SelfLoop {
                    connection_id: conn.id,
                    topic_id: conn.source,
                }));
            }
            let source = *id_to_index.get(&conn.source).ok_or(GraphError::InvalidGraph(
                InvalidGraphReason::UnknownTopic {
                    connection_id: conn.id,
                    topic_id: conn.source,
                },
            ))?;
            let target = *id_to_index.get(&conn.target).ok_or(GraphError::InvalidGraph(
                InvalidGraphReason::UnknownTopic {
                    connection_id: conn.id,
                    topic_id: conn.target,
                },
            ))?;
            if conn.active && !active_pairs.insert((conn.source, conn.target)) {
                return Err(GraphError::InvalidGraph(
                    InvalidGraphReason::DuplicateConnection {
                        connection_id: conn.id,
                        from: conn.source,
                        to: conn.target,
                    },
                ));
            }
            graph.add_edge(source, target, conn.clone());
        }

        Ok(Self { graph, id_to_index })
    }

    /// Fail with `GraphTooLarge` if the graph holds more than `max_nodes` topics.
    pub fn ensure_within_limit(&self, max_nodes: usize) -> GraphResult<()> {
        let nodes = self.node_count();
        if nodes > max_nodes {
            return Err(GraphError::GraphTooLarge {
                nodes,
                max: max_nodes,
            });
        }
        Ok(())
    }

    /// Get a topic by its ID.
    pub fn get_topic(&self, id: TopicId) -> Option<&Topic> {
        let idx = self.id_to_index.get(&id)?;
        self.graph.node_weight(*idx)
    }

    /// Get the NodeIndex for a given topic ID.
    pub fn get_index(&self, id: TopicId) -> Option<NodeIndex> {
        self.id_to_index.get(&id).copied()
    }

    /// Topics in input order.
    pub fn topics(&self) -> impl Iterator<Item = &Topic> {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    /// Active connections in input order, with their endpoint indices.
    pub fn active_edges(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex, &Connection)> {
        self.graph
            .edge_references()
            .filter(|e| e.weight().active)
            .map(|e| (e.source(), e.target(), e.weight()))
    }

    /// Adjacency lists over active connections.
    ///
    /// Every topic has an entry (possibly empty). Neighbors appear in
    /// connection order; `Both` lists each neighbor once.
    pub fn adjacency(&self, direction: AdjacencyDirection) -> HashMap<TopicId, Vec<TopicId>> {
        let g = &self.graph;
        let mut adj: HashMap<TopicId, Vec<TopicId>> =
            self.topics().map(|t| (t.id, Vec::new())).collect();

        for (s, t, _) in self.active_edges() {
            let (source, target) = (g[s].id, g[t].id);
            match direction {
                AdjacencyDirection::Out => push_unique(&mut adj, source, target),
                AdjacencyDirection::In => push_unique(&mut adj, target, source),
                AdjacencyDirection::Both => {
                    push_unique(&mut adj, source, target);
                    push_unique(&mut adj, target, source);
                }
            }
        }
        adj
    }

    /// Neighbors of a topic over active connections (either direction) with
    /// the connection weight. Unknown topics yield an empty list.
    pub fn neighbors_weighted(&self, id: TopicId) -> Vec<(TopicId, f64)> {
        let Some(idx) = self.get_index(id) else {
            return vec![];
        };
        let g = &self.graph;
        self.active_edges()
            .filter_map(|(s, t, conn)| {
                if s == idx {
                    Some((g[t].id, conn.weight))
                } else if t == idx {
                    Some((g[s].id, conn.weight))
                } else {
                    None
                }
            })
            .collect()
    }

    /// Number of active connections touching a topic (incoming + outgoing).
    pub fn degree(&self, id: TopicId) -> usize {
        let Some(idx) = self.get_index(id) else {
            return 0;
        };
        self.active_edges()
            .filter(|(s, t, _)| *s == idx || *t == idx)
            .count()
    }

    /// The first active connection joining two topics, in either direction.
    pub fn connection_between(&self, a: TopicId, b: TopicId) -> Option<&Connection> {
        self.active_edges()
            .map(|(_, _, conn)| conn)
            .find(|conn| conn.joins(a, b))
    }

    /// Positions already stored on the topics for one layout space.
    pub fn stored_positions(&self, dimensions: Dimensions) -> HashMap<TopicId, Position> {
        self.topics()
            .filter_map(|t| t.stored_position(dimensions).map(|p| (t.id, p)))
            .collect()
    }

    /// Number of topics in the graph.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of connections in the graph (active or not).
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

impl Default for TopicGraph {
    fn default() -> Self {
        Self::new()
    }
}

fn push_unique(adj: &mut HashMap<TopicId, Vec<TopicId>>, from: TopicId, to: TopicId) {
    let list = adj.entry(from).or_default();
    if !list.contains(&to) {
        list.push(to);
    }
}

// ============================================================================
// Tests
// ============================================================================
