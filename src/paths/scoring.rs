//! Topic priority scoring and path construction.
//!
//! One scoring policy per path type:
//! - **optimal** — weighted blend of mastery gap, ease and block order,
//!   then reordered so prerequisites come first
//! - **reinforcement** — mastery gap, over topics the user has studied
//! - **exploration** — ease, over topics the user has never studied;
//!   ties broken by connection count
//!
//! All functions are pure; mastery is passed in as a `topic → percent` map.

use std::collections::HashMap;

use super::models::{PathEntry, PathType, Recommendation, RecommendationReason};
use super::progress::MASTERY_THRESHOLD;
use crate::graph::models::{Topic, TopicGraph, TopicId};
use crate::graph::toposort::{prerequisite_edges, sort_by_prerequisites};

/// Weight of the mastery gap in the optimal score.
pub const MASTERY_WEIGHT: f64 = 0.5;
/// Weight of ease (inverse difficulty) in the optimal score.
pub const DIFFICULTY_WEIGHT: f64 = 0.3;
/// Weight of block order in the optimal score.
pub const BLOCK_WEIGHT: f64 = 0.2;

/// Default length of the recommendation list.
pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 5;

// ============================================================================
// Per-topic scores
// ============================================================================

/// `0.5 × (100 − m)/100 + 0.3 × (6 − d)/5 + 0.2 × (4 − b)/3`.
///
/// Lower mastery, lower difficulty and earlier blocks all raise the score.
/// Blocks past 4 contribute a negative block term.
pub fn score_for_optimal_path(topic: &Topic, mastery: f64) -> f64 {
    let m = mastery.clamp(0.0, 100.0);
    let d = topic.difficulty_level() as f64;
    let b = topic.block as f64;
    MASTERY_WEIGHT * (100.0 - m) / 100.0
        + DIFFICULTY_WEIGHT * (6.0 - d) / 5.0
        + BLOCK_WEIGHT * (4.0 - b) / 3.0
}

/// Mastery gap: `100 − m`.
pub fn score_for_reinforcement(mastery: f64) -> f64 {
    100.0 - mastery.clamp(0.0, 100.0)
}

/// Need score of an unstudied topic: `(6 − d)/5`.
pub fn score_for_exploration(topic: &Topic) -> f64 {
    (6.0 - topic.difficulty_level() as f64) / 5.0
}

/// Recommendation score and reason for a topic's mastery.
pub fn recommendation_score(mastery: Option<f64>) -> (f64, RecommendationReason) {
    match mastery {
        None => (80.0, RecommendationReason::NewTopic),
        Some(m) if m < 50.0 => (90.0 - m, RecommendationReason::NeedsReinforcement),
        Some(m) if m < MASTERY_THRESHOLD => {
            (70.0 - (m - 50.0), RecommendationReason::KeepImproving)
        }
        Some(_) => (30.0, RecommendationReason::OccasionalReview),
    }
}

// ============================================================================
// Ranked lists
// ============================================================================

/// Top `limit` topics by recommendation score, descending. Ties keep input
/// order.
pub fn recommended_topics(
    topics: &[Topic],
    mastery: &HashMap<TopicId, f64>,
    limit: usize,
) -> Vec<Recommendation> {
    let mut recommendations: Vec<Recommendation> = topics
        .iter()
        .map(|topic| {
            let current = mastery.get(&topic.id).copied();
            let (score, reason) = recommendation_score(current);
            Recommendation {
                topic_id: topic.id,
                title: topic.title.clone(),
                score,
                mastery: current,
                reason,
            }
        })
        .collect();

    recommendations.sort_by(|a, b| b.score.total_cmp(&a.score));
    recommendations.truncate(limit);
    recommendations
}

/// Ordered entries for a new path of the given type.
pub fn build_path_entries(
    path_type: PathType,
    graph: &TopicGraph,
    mastery: &HashMap<TopicId, f64>,
) -> Vec<PathEntry> {
    match path_type {
        PathType::Optimal => optimal_entries(graph, mastery),
        PathType::Reinforcement => reinforcement_entries(graph, mastery),
        PathType::Exploration => exploration_entries(graph, mastery),
    }
}

fn optimal_entries(graph: &TopicGraph, mastery: &HashMap<TopicId, f64>) -> Vec<PathEntry> {
    let mut ranked: Vec<(&Topic, f64)> = graph
        .topics()
        .map(|t| {
            let m = mastery.get(&t.id).copied().unwrap_or(0.0);
            (t, score_for_optimal_path(t, m))
        })
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let scores: HashMap<TopicId, f64> = ranked.iter().map(|(t, s)| (t.id, *s)).collect();
    let by_priority: Vec<Topic> = ranked.into_iter().map(|(t, _)| t.clone()).collect();

    let edges = prerequisite_edges(graph.active_edges().map(|(_, _, conn)| conn));
    sort_by_prerequisites(&by_priority, &edges)
        .into_iter()
        .map(|t| {
            let done = mastery
                .get(&t.id)
                .is_some_and(|&m| m >= MASTERY_THRESHOLD);
            PathEntry::new(t.id, scores.get(&t.id).copied().unwrap_or(0.0), done)
        })
        .collect()
}

fn reinforcement_entries(graph: &TopicGraph, mastery: &HashMap<TopicId, f64>) -> Vec<PathEntry> {
    let mut entries: Vec<PathEntry> = graph
        .topics()
        .filter_map(|t| {
            let m = *mastery.get(&t.id)?;
            (m < 100.0).then(|| PathEntry::new(t.id, score_for_reinforcement(m), false))
        })
        .collect();
    entries.sort_by(|a, b| b.score.total_cmp(&a.score));
    entries
}

fn exploration_entries(graph: &TopicGraph, mastery: &HashMap<TopicId, f64>) -> Vec<PathEntry> {
    let degrees = degree_map(graph);
    let mut candidates: Vec<&Topic> = graph
        .topics()
        .filter(|t| !mastery.contains_key(&t.id))
        .collect();
    candidates.sort_by(|a, b| {
        a.difficulty_level().cmp(&b.difficulty_level()).then_with(|| {
            let da = degrees.get(&a.id).copied().unwrap_or(0);
            let db = degrees.get(&b.id).copied().unwrap_or(0);
            db.cmp(&da)
        })
    });
    candidates
        .into_iter()
        .map(|t| PathEntry::new(t.id, score_for_exploration(t), false))
        .collect()
}

/// Incoming plus outgoing active connections per topic, in one pass.
fn degree_map(graph: &TopicGraph) -> HashMap<TopicId, usize> {
    let mut degrees: HashMap<TopicId, usize> = HashMap::with_capacity(graph.node_count());
    for (_, _, conn) in graph.active_edges() {
        *degrees.entry(conn.source).or_default() += 1;
        *degrees.entry(conn.target).or_default() += 1;
    }
    degrees
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::models::{Connection, ConnectionType};

    fn topic(id: TopicId, block: u32, difficulty: u8) -> Topic {
        Topic::new(id, block, difficulty)
    }

    fn order(entries: &[PathEntry]) -> Vec<TopicId> {
        entries.iter().map(|e| e.topic_id).collect()
    }

    #[test]
    fn test_weights_sum_to_one() {
        assert!((MASTERY_WEIGHT + DIFFICULTY_WEIGHT + BLOCK_WEIGHT - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_optimal_score_formula() {
        // 0.5 × 0.6 + 0.3 × 0.8 + 0.2 × 1.0
        let s = score_for_optimal_path(&topic(1, 1, 2), 40.0);
        assert!((s - 0.74).abs() < 1e-12);
    }

    #[test]
    fn test_optimal_score_monotonic_in_mastery() {
        let t = topic(1, 2, 3);
        let mut previous = f64::INFINITY;
        for m in [0.0, 10.0, 35.5, 50.0, 79.9, 80.0, 100.0] {
            let s = score_for_optimal_path(&t, m);
            assert!(s < previous, "score {} at mastery {} not below {}", s, m, previous);
            previous = s;
        }
    }

    #[test]
    fn test_optimal_score_prefers_easier_and_earlier() {
        let easy = score_for_optimal_path(&topic(1, 1, 1), 50.0);
        let hard = score_for_optimal_path(&topic(2, 1, 5), 50.0);
        let late = score_for_optimal_path(&topic(3, 4, 1), 50.0);
        assert!(easy > hard);
        assert!(easy > late);
    }

    #[test]
    fn test_recommendation_thresholds() {
        let cases = [
            (None, 80.0, RecommendationReason::NewTopic),
            (Some(0.0), 90.0, RecommendationReason::NeedsReinforcement),
            (Some(40.0), 50.0, RecommendationReason::NeedsReinforcement),
            (Some(50.0), 70.0, RecommendationReason::KeepImproving),
            (Some(79.0), 41.0, RecommendationReason::KeepImproving),
            (Some(80.0), 30.0, RecommendationReason::OccasionalReview),
            (Some(100.0), 30.0, RecommendationReason::OccasionalReview),
        ];
        for (mastery, score, reason) in cases {
            let (s, r) = recommendation_score(mastery);
            assert!((s - score).abs() < f64::EPSILON, "{:?}", mastery);
            assert_eq!(r, reason);
        }
    }

    #[test]
    fn test_recommended_topics_ranking_and_limit() {
        let topics: Vec<Topic> = (1..=5).map(|id| topic(id, 1, 3)).collect();
        let mastery = HashMap::from([(1, 95.0), (2, 10.0), (3, 60.0), (5, 45.0)]);

        let recs = recommended_topics(&topics, &mastery, 3);
        let ids: Vec<TopicId> = recs.iter().map(|r| r.topic_id).collect();
        // 2 → 80, 4 → 80 (new), 5 → 45, 3 → 60, 1 → 30
        assert_eq!(ids, vec![2, 4, 3]);
        assert_eq!(recs[1].reason, RecommendationReason::NewTopic);
        assert_eq!(recs[1].mastery, None);

        assert_eq!(
            recommended_topics(&topics, &mastery, DEFAULT_RECOMMENDATION_LIMIT).len(),
            5
        );
        assert!(recommended_topics(&topics, &mastery, 0).is_empty());
    }

    #[test]
    fn test_exploration_prefers_lower_difficulty() {
        let topics = vec![topic(1, 1, 2), topic(2, 1, 4)];
        let conns = vec![Connection::new(1, 1, 2, ConnectionType::Direct, 0.8)];
        let g = TopicGraph::build(&topics, &conns).unwrap();

        let entries = build_path_entries(PathType::Exploration, &g, &HashMap::new());
        assert_eq!(order(&entries), vec![1, 2]);
        assert!((entries[0].score - 0.8).abs() < 1e-12);
        assert!(entries.iter().all(|e| !e.completed));
    }

    #[test]
    fn test_exploration_tie_breaks_on_degree_then_input_order() {
        let topics = vec![topic(1, 1, 3), topic(2, 1, 3), topic(3, 1, 3), topic(4, 1, 3)];
        let conns = vec![
            Connection::new(1, 3, 1, ConnectionType::Direct, 1.0),
            Connection::new(2, 3, 4, ConnectionType::Direct, 1.0),
        ];
        let g = TopicGraph::build(&topics, &conns).unwrap();
        let entries = build_path_entries(PathType::Exploration, &g, &HashMap::new());
        assert_eq!(order(&entries), vec![3, 1, 4, 2]);
    }

    #[test]
    fn test_exploration_skips_studied_topics() {
        let topics = vec![topic(1, 1, 1), topic(2, 1, 1)];
        let g = TopicGraph::build(&topics, &[]).unwrap();
        let mastery = HashMap::from([(1, 0.0)]);
        let entries = build_path_entries(PathType::Exploration, &g, &mastery);
        assert_eq!(order(&entries), vec![2]);
    }

    #[test]
    fn test_reinforcement_ranks_by_gap() {
        let topics = vec![topic(1, 1, 3), topic(2, 1, 3), topic(3, 1, 3)];
        let g = TopicGraph::build(&topics, &[]).unwrap();
        let mastery = HashMap::from([(1, 30.0), (2, 90.0)]);

        let entries = build_path_entries(PathType::Reinforcement, &g, &mastery);
        // topic 3 has no progress; topic 2 stays in but ranks last
        assert_eq!(order(&entries), vec![1, 2]);
        assert!((entries[0].score - 70.0).abs() < f64::EPSILON);
        assert!((entries[1].score - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reinforcement_excludes_full_mastery() {
        let topics = vec![topic(1, 1, 3), topic(2, 1, 3)];
        let g = TopicGraph::build(&topics, &[]).unwrap();
        let mastery = HashMap::from([(1, 100.0), (2, 99.0)]);
        let entries = build_path_entries(PathType::Reinforcement, &g, &mastery);
        assert_eq!(order(&entries), vec![2]);
    }

    #[test]
    fn test_optimal_respects_prerequisites() {
        // Topic 3 scores highest but needs 2, which needs 1
        let topics = vec![topic(1, 3, 5), topic(2, 2, 4), topic(3, 1, 1)];
        let conns = vec![
            Connection::new(1, 1, 2, ConnectionType::Prerequisite, 1.0),
            Connection::new(2, 2, 3, ConnectionType::Prerequisite, 1.0),
        ];
        let g = TopicGraph::build(&topics, &conns).unwrap();
        let entries = build_path_entries(PathType::Optimal, &g, &HashMap::new());
        assert_eq!(order(&entries), vec![1, 2, 3]);
    }

    #[test]
    fn test_optimal_orders_by_score_and_marks_mastered() {
        let topics = vec![topic(1, 1, 3), topic(2, 1, 3), topic(3, 1, 3)];
        let conns = vec![Connection::new(1, 1, 2, ConnectionType::Conceptual, 1.0)];
        let g = TopicGraph::build(&topics, &conns).unwrap();
        let mastery = HashMap::from([(1, 85.0), (2, 20.0)]);

        let entries = build_path_entries(PathType::Optimal, &g, &mastery);
        assert_eq!(order(&entries), vec![3, 2, 1]);
        assert!(!entries[0].completed);
        assert!(entries[2].completed);
    }

    #[test]
    fn test_empty_graph_gives_empty_paths() {
        let g = TopicGraph::new();
        for t in [
            PathType::Optimal,
            PathType::Reinforcement,
            PathType::Exploration,
        ] {
            assert!(build_path_entries(t, &g, &HashMap::new()).is_empty());
        }
    }
}
