//! Force-directed layout.
//!
//! Positions topics for the 2D and 3D maps with a simple physical model:
//! - **Repulsion** between every pair of topics, `charge / d²`
//! - **Attraction** along every active connection, a spring of rest length
//!   `link_distance` and stiffness `link_strength × weight`
//! - **Integration** with damped velocities: `v = (v + F) × damping`,
//!   `p = p + v × timestep`
//!
//! The loop is deterministic. Randomness only enters through the
//! [`PositionSeeder`] used for topics that have no stored position.

use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use super::error::GraphResult;
use super::models::{Dimensions, Position, TopicGraph, TopicId};

/// Distances are floored at this value before dividing.
pub const MIN_DISTANCE: f64 = 1.0;

/// Node count from which per-node repulsion sums run on the rayon pool.
pub const PARALLEL_THRESHOLD: usize = 256;

const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Raw `[x, y, z]` coordinate or force vector. z is 0 in 2D.
pub type Vec3 = [f64; 3];

// ============================================================================
// Parameters
// ============================================================================

/// Tuning parameters for one layout run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceParams {
    /// Repulsion constant (charge strength)
    pub charge: f64,
    /// Rest length of a connection spring
    pub link_distance: f64,
    /// Spring stiffness, multiplied by the connection weight
    pub link_strength: f64,
    /// Velocity damping per iteration (0..1)
    pub damping: f64,
    /// Integration step
    pub timestep: f64,
    /// Number of simulation steps
    pub iterations: usize,
    /// Largest graph accepted for one view
    pub max_nodes: usize,
}

impl ForceParams {
    /// Parameters for the flat map.
    pub fn preset_2d() -> Self {
        Self {
            charge: 1500.0,
            link_distance: 30.0,
            link_strength: 0.05,
            damping: 0.9,
            timestep: 1.0,
            iterations: 100,
            max_nodes: 500,
        }
    }

    /// Parameters for the 3D map: stronger repulsion and longer links.
    pub fn preset_3d() -> Self {
        Self {
            charge: 3000.0,
            link_distance: 50.0,
            link_strength: 0.05,
            damping: 0.9,
            timestep: 1.0,
            iterations: 80,
            max_nodes: 500,
        }
    }

    /// Preset matching a layout space.
    pub fn preset(dimensions: Dimensions) -> Self {
        match dimensions {
            Dimensions::Two => Self::preset_2d(),
            Dimensions::Three => Self::preset_3d(),
        }
    }
}

impl Default for ForceParams {
    fn default() -> Self {
        Self::preset_2d()
    }
}

// ============================================================================
// Initial placement
// ============================================================================

/// Supplies a starting coordinate for topics without a stored position.
pub trait PositionSeeder: Send + Sync {
    /// Position for the `index`-th of `total` topics.
    fn seed(&self, index: usize, total: usize, dimensions: Dimensions) -> Vec3;
}

/// Places topics evenly around a circle centered at the origin.
///
/// In 3D the circle becomes one turn of a helix so the z axis is populated.
#[derive(Debug, Clone)]
pub struct CircleSeeder {
    pub radius: f64,
}

impl Default for CircleSeeder {
    fn default() -> Self {
        Self { radius: 200.0 }
    }
}

impl PositionSeeder for CircleSeeder {
    fn seed(&self, index: usize, total: usize, dimensions: Dimensions) -> Vec3 {
        let total = total.max(1) as f64;
        let angle = 2.0 * std::f64::consts::PI * index as f64 / total;
        let z = match dimensions {
            Dimensions::Two => 0.0,
            Dimensions::Three => self.radius * ((index as f64 + 0.5) / total - 0.5),
        };
        [self.radius * angle.cos(), self.radius * angle.sin(), z]
    }
}

/// Uniform random placement inside a cube, reproducible from `seed`.
///
/// The cube's half-width is `|radius|`; a non-finite radius places every
/// topic at the origin.
#[derive(Debug, Clone)]
pub struct JitterSeeder {
    pub seed: u64,
    pub radius: f64,
}

impl JitterSeeder {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            radius: 200.0,
        }
    }
}

impl PositionSeeder for JitterSeeder {
    fn seed(&self, index: usize, _total: usize, dimensions: Dimensions) -> Vec3 {
        let mut rng = StdRng::seed_from_u64(
            self.seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15),
        );
        let r = if self.radius.is_finite() {
            self.radius.abs()
        } else {
            0.0
        };
        let x = rng.random_range(-r..=r);
        let y = rng.random_range(-r..=r);
        let z = match dimensions {
            Dimensions::Two => 0.0,
            Dimensions::Three => rng.random_range(-r..=r),
        };
        [x, y, z]
    }
}

// ============================================================================
// Forces
// ============================================================================

/// Repulsive force exerted on topic `i` by topic `j`: `charge / d²`
/// pointing away from `j`, with `d` floored at [`MIN_DISTANCE`].
///
/// Coincident topics are pushed apart along a fixed direction derived from
/// the index pair, so `repulsive_force(p, i, j)` is always the negation of
/// `repulsive_force(p, j, i)`.
pub fn repulsive_force(
    positions: &[Vec3],
    i: usize,
    j: usize,
    charge: f64,
    dimensions: Dimensions,
) -> Vec3 {
    let delta = sub(positions[i], positions[j]);
    let len = norm(delta);
    if len == 0.0 {
        return scale(fallback_direction(i, j, dimensions), charge);
    }
    let dist = len.max(MIN_DISTANCE);
    scale(delta, charge / (dist * dist) / dist)
}

/// Attractive force exerted on `a` by a connection to `b`.
///
/// Magnitude is `link_strength × weight × max(d − link_distance, 0)`,
/// pointing toward `b`. The force on `b` is the negation.
pub fn attractive_force(a: Vec3, b: Vec3, weight: f64, params: &ForceParams) -> Vec3 {
    let delta = sub(b, a);
    let dist = norm(delta).max(MIN_DISTANCE);
    let stretch = (dist - params.link_distance).max(0.0);
    scale(delta, params.link_strength * weight * stretch / dist)
}

/// Unit direction used when two topics sit on the same spot.
fn fallback_direction(i: usize, j: usize, dimensions: Dimensions) -> Vec3 {
    let (lo, hi, sign) = if i < j { (i, j, 1.0) } else { (j, i, -1.0) };
    let theta = (lo * 7 + hi * 13) as f64 * GOLDEN_ANGLE;
    let dir = match dimensions {
        Dimensions::Two => [theta.cos(), theta.sin(), 0.0],
        Dimensions::Three => [0.8 * theta.cos(), 0.8 * theta.sin(), 0.6],
    };
    scale(dir, sign)
}

/// Net repulsion on every node. Each node sums its pair forces in index
/// order, so the parallel and sequential paths are bit-identical.
fn repulsion_forces(
    positions: &[Vec3],
    charge: f64,
    dimensions: Dimensions,
    parallel: bool,
) -> Vec<Vec3> {
    let n = positions.len();
    let per_node = |i: usize| {
        let mut total = [0.0; 3];
        for j in 0..n {
            if i != j {
                total = add(total, repulsive_force(positions, i, j, charge, dimensions));
            }
        }
        total
    };

    if parallel {
        (0..n).into_par_iter().map(per_node).collect()
    } else {
        (0..n).map(per_node).collect()
    }
}

// ============================================================================
// Layout
// ============================================================================

/// Result of a layout run, ready to be persisted by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutResult {
    pub dimensions: Dimensions,
    /// Final coordinate per topic
    pub positions: HashMap<TopicId, Position>,
    pub node_count: usize,
    pub edge_count: usize,
    pub iterations: usize,
    /// Computation time in milliseconds
    pub computation_ms: u64,
}

/// Run the force simulation and return the final position of every topic.
///
/// Topics missing from `initial` are placed by `seeder`. An empty graph
/// returns an empty map; a graph above `params.max_nodes` fails with
/// `GraphTooLarge`.
pub fn layout(
    graph: &TopicGraph,
    initial: &HashMap<TopicId, Position>,
    dimensions: Dimensions,
    params: &ForceParams,
    seeder: &dyn PositionSeeder,
) -> GraphResult<HashMap<TopicId, Position>> {
    let n = graph.node_count();
    if n == 0 {
        return Ok(HashMap::new());
    }
    graph.ensure_within_limit(params.max_nodes)?;

    let g = &graph.graph;
    let ids: Vec<TopicId> = g.node_indices().map(|idx| g[idx].id).collect();

    let mut seeded = 0usize;
    let mut positions: Vec<Vec3> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let mut p = match initial.get(id) {
                Some(pos) => pos.to_array(),
                None => {
                    seeded += 1;
                    seeder.seed(i, n, dimensions)
                }
            };
            if dimensions == Dimensions::Two {
                p[2] = 0.0;
            }
            p
        })
        .collect();
    let mut velocities: Vec<Vec3> = vec![[0.0; 3]; n];

    let edges: Vec<(usize, usize, f64)> = graph
        .active_edges()
        .map(|(s, t, conn)| (s.index(), t.index(), conn.weight))
        .collect();

    let parallel = n >= PARALLEL_THRESHOLD;

    for _ in 0..params.iterations {
        let mut forces = repulsion_forces(&positions, params.charge, dimensions, parallel);

        for &(s, t, w) in &edges {
            let f = attractive_force(positions[s], positions[t], w, params);
            forces[s] = add(forces[s], f);
            forces[t] = sub(forces[t], f);
        }

        for i in 0..n {
            let mut v = scale(add(velocities[i], forces[i]), params.damping);
            if dimensions == Dimensions::Two {
                v[2] = 0.0;
            }
            velocities[i] = v;
            positions[i] = add(positions[i], scale(v, params.timestep));
        }
    }

    debug!(
        "{} layout: {} topics ({} seeded), {} links, {} iterations",
        dimensions,
        n,
        seeded,
        edges.len(),
        params.iterations
    );

    Ok(ids
        .into_iter()
        .zip(positions)
        .map(|(id, p)| (id, Position::from_array(p, dimensions)))
        .collect())
}

fn add(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn scale(a: Vec3, k: f64) -> Vec3 {
    [a[0] * k, a[1] * k, a[2] * k]
}

fn norm(a: Vec3) -> f64 {
    (a[0] * a[0] + a[1] * a[1] + a[2] * a[2]).sqrt()
}

// ============================================================================
// Tests
// ============================================================================
