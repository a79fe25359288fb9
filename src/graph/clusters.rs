//! Topic clustering for visual grouping.
//!
//! Two groupings are offered:
//! - **By block** — one cluster per declared block number, no traversal
//! - **By connectivity** — connected components of the undirected view,
//!   found with an explicit-stack DFS; components under
//!   [`MIN_CLUSTER_SIZE`] members are dropped as noise
//!
//! Connectivity cluster ids and colors are derived from a hash of the member
//! set, so a component keeps the same identity across renders.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};

use super::models::{AdjacencyDirection, Topic, TopicGraph, TopicId};

/// Smallest connected component reported as a cluster.
pub const MIN_CLUSTER_SIZE: usize = 3;

/// Fixed display palette shared by both cluster kinds.
pub const CLUSTER_PALETTE: [&str; 8] = [
    "#e74c3c", "#3498db", "#2ecc71", "#f39c12", "#9b59b6", "#1abc9c", "#e67e22", "#34495e",
];

/// How a cluster was formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterKind {
    Block,
    Connectivity,
}

impl std::fmt::Display for ClusterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Block => write!(f, "block"),
            Self::Connectivity => write!(f, "connectivity"),
        }
    }
}

impl std::str::FromStr for ClusterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "block" => Ok(Self::Block),
            "connectivity" => Ok(Self::Connectivity),
            _ => Err(format!("Unknown cluster kind: {}", s)),
        }
    }
}

/// A group of topics rendered together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Synthetic identifier (`block_N` or `cluster_<hash>`)
    pub id: String,
    pub kind: ClusterKind,
    /// Member topic IDs, ascending
    pub members: Vec<TopicId>,
    /// Display color from [`CLUSTER_PALETTE`]
    pub color: String,
    pub label: String,
}

impl Cluster {
    pub fn size(&self) -> usize {
        self.members.len()
    }
}

/// One cluster per distinct block, ordered by block number.
pub fn clusters_by_block(topics: &[Topic]) -> Vec<Cluster> {
    let mut blocks: BTreeMap<u32, Vec<TopicId>> = BTreeMap::new();
    for topic in topics {
        blocks.entry(topic.block).or_default().push(topic.id);
    }

    blocks
        .into_iter()
        .map(|(block, mut members)| {
            members.sort_unstable();
            let slot = (block as usize).saturating_sub(1) % CLUSTER_PALETTE.len();
            Cluster {
                id: format!("block_{}", block),
                kind: ClusterKind::Block,
                members,
                color: CLUSTER_PALETTE[slot].to_string(),
                label: format!("Bloque {}", block),
            }
        })
        .collect()
}

/// Connected components (edges treated as undirected) with at least
/// [`MIN_CLUSTER_SIZE`] members, in discovery order.
pub fn clusters_by_connectivity(graph: &TopicGraph) -> Vec<Cluster> {
    let adj = graph.adjacency(AdjacencyDirection::Both);
    let mut visited: HashSet<TopicId> = HashSet::with_capacity(graph.node_count());
    let mut clusters = Vec::new();

    for topic in graph.topics() {
        if visited.contains(&topic.id) {
            continue;
        }

        let mut component = Vec::new();
        let mut stack = vec![topic.id];
        visited.insert(topic.id);

        while let Some(current) = stack.pop() {
            component.push(current);
            if let Some(neighbors) = adj.get(&current) {
                for &next in neighbors.iter().rev() {
                    if visited.insert(next) {
                        stack.push(next);
                    }
                }
            }
        }

        if component.len() >= MIN_CLUSTER_SIZE {
            component.sort_unstable();
            clusters.push(connectivity_cluster(component, clusters.len()));
        }
    }

    clusters
}

fn connectivity_cluster(members: Vec<TopicId>, ordinal: usize) -> Cluster {
    let digest = member_digest(&members);
    let slot = digest[0] as usize % CLUSTER_PALETTE.len();
    Cluster {
        id: format!("cluster_{}", hex::encode(&digest[..4])),
        kind: ClusterKind::Connectivity,
        color: CLUSTER_PALETTE[slot].to_string(),
        label: format!("Grupo {} ({} temas)", ordinal + 1, members.len()),
        members,
    }
}

/// SHA-256 over the sorted member ids.
fn member_digest(sorted_members: &[TopicId]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for (i, id) in sorted_members.iter().enumerate() {
        if i > 0 {
            hasher.update(b",");
        }
        hasher.update(id.to_string().as_bytes());
    }
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

// ============================================================================
// Tests
// ============================================================================
