//! Prerequisite ordering for study paths.
//!
//! Depth-first topological sort with three-color marking, run on an explicit
//! stack. A topic met again while it is still in progress closes a cycle;
//! the back edge is skipped and the sort carries on, so every input topic
//! appears exactly once in the output.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, trace};

use super::models::{Connection, ConnectionType, Topic, TopicId};

/// `prerequisite` must be studied before `dependent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrerequisiteEdge {
    pub prerequisite: TopicId,
    pub dependent: TopicId,
}

impl PrerequisiteEdge {
    pub fn new(prerequisite: TopicId, dependent: TopicId) -> Self {
        Self {
            prerequisite,
            dependent,
        }
    }
}

/// Active prerequisite-typed connections, as ordering constraints.
pub fn prerequisite_edges<'a>(
    connections: impl IntoIterator<Item = &'a Connection>,
) -> Vec<PrerequisiteEdge> {
    connections
        .into_iter()
        .filter(|c| c.active && c.connection_type == ConnectionType::Prerequisite)
        .map(|c| PrerequisiteEdge::new(c.source, c.target))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Order topics so prerequisites precede their dependents.
///
/// Topics are visited in input order; each one is emitted right after its
/// unresolved prerequisites, so topics without constraints keep their
/// relative order. Edges naming topics outside `topics` are ignored, and a
/// repeated topic id is emitted once, at its first occurrence.
pub fn sort_by_prerequisites(topics: &[Topic], edges: &[PrerequisiteEdge]) -> Vec<Topic> {
    let n = topics.len();
    let mut position: HashMap<TopicId, usize> = HashMap::with_capacity(n);
    for (i, topic) in topics.iter().enumerate() {
        position.entry(topic.id).or_insert(i);
    }

    // requires[i] = prerequisites of topic i, in edge order
    let mut requires: Vec<Vec<usize>> = vec![Vec::new(); n];
    for edge in edges {
        match (
            position.get(&edge.prerequisite),
            position.get(&edge.dependent),
        ) {
            (Some(&pre), Some(&dep)) if pre != dep => {
                if !requires[dep].contains(&pre) {
                    requires[dep].push(pre);
                }
            }
            _ => trace!(
                "Ignoring prerequisite edge {} -> {}",
                edge.prerequisite,
                edge.dependent
            ),
        }
    }

    let mut marks = vec![Mark::Unvisited; n];
    let mut ordered = Vec::with_capacity(n);
    let mut skipped_cycles = 0usize;

    for start in 0..n {
        if marks[start] != Mark::Unvisited || position[&topics[start].id] != start {
            continue;
        }
        marks[start] = Mark::InProgress;
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];

        while let Some(top) = stack.last_mut() {
            let node = top.0;
            if top.1 < requires[node].len() {
                let child = requires[node][top.1];
                top.1 += 1;
                match marks[child] {
                    Mark::Unvisited => {
                        marks[child] = Mark::InProgress;
                        stack.push((child, 0));
                    }
                    Mark::InProgress => skipped_cycles += 1,
                    Mark::Done => {}
                }
            } else {
                marks[node] = Mark::Done;
                ordered.push(topics[node].clone());
                stack.pop();
            }
        }
    }

    if skipped_cycles > 0 {
        debug!(
            "Prerequisite sort skipped {} back edge(s) closing a cycle",
            skipped_cycles
        );
    }

    ordered
}

// ============================================================================
// Tests
// ============================================================================
