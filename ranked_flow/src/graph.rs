//! The vote-transfer graph and its flat edge-list rendering.
//!
//! The graph is layered by round: every edge goes from round `r` to round `r + 1`.
//! Vertices are rendered as labels of the form `"{name} ({count})"` followed by
//! `round` space characters. The trailing spaces keep labels of the same candidate
//! distinct across rounds, and they let a consumer recover the round of a label
//! from the label alone.

use log::debug;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::FlowEdge;
use crate::{CandidateId, RoundId, VoteCount};

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub(crate) struct VertexKey {
    pub(crate) round: RoundId,
    pub(crate) candidate: CandidateId,
}

impl VertexKey {
    pub(crate) fn new(candidate: CandidateId, round: RoundId) -> VertexKey {
        VertexKey { round, candidate }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
struct Vertex {
    vote_count: VoteCount,
    out_edges: HashMap<VertexKey, VoteCount>,
}

/// Vertices ordered by (round, candidate) and the edges in insertion order.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub(crate) struct FlowGraph {
    vertices: BTreeMap<VertexKey, Vertex>,
    edges: Vec<(VertexKey, VertexKey)>,
}

impl FlowGraph {
    pub(crate) fn new() -> FlowGraph {
        FlowGraph::default()
    }

    /// Sets the tally of a vertex, creating it if needed. Existing edges are kept.
    pub(crate) fn add_vertex(&mut self, candidate: CandidateId, round: RoundId, count: VoteCount) {
        let v = self
            .vertices
            .entry(VertexKey::new(candidate, round))
            .or_default();
        v.vote_count = count;
    }

    /// Adds an edge between two consecutive rounds.
    ///
    /// The target does not need to exist yet: it gets its tally when the next round is counted.
    pub(crate) fn add_edge(&mut self, source: VertexKey, target: VertexKey, weight: VoteCount) {
        assert_eq!(
            source.round + 1,
            target.round,
            "edges must link consecutive rounds: {:?} -> {:?}",
            source,
            target
        );
        debug!(
            "add_edge: {:?} -> {:?} weight: {:?}",
            source, target, weight
        );
        let v = self.vertices.entry(source).or_default();
        match v.out_edges.get_mut(&target) {
            Some(w) => {
                *w += weight;
            }
            None => {
                v.out_edges.insert(target, weight);
                self.edges.push((source, target));
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn vertex_count(&self, candidate: CandidateId, round: RoundId) -> Option<VoteCount> {
        self.vertices
            .get(&VertexKey::new(candidate, round))
            .map(|v| v.vote_count)
    }

    /// The sum of all the edges that point to the given vertex.
    pub(crate) fn inbound_weight(&self, candidate: CandidateId, round: RoundId) -> VoteCount {
        let target = VertexKey::new(candidate, round);
        self.vertices
            .values()
            .filter_map(|v| v.out_edges.get(&target))
            .cloned()
            .sum()
    }

    /// Renders all the edges, in the order they were added.
    pub(crate) fn to_flow_edges(&self, names: &HashMap<CandidateId, String>) -> Vec<FlowEdge> {
        self.edges
            .iter()
            .map(|(source, target)| {
                let weight = self
                    .vertices
                    .get(source)
                    .and_then(|v| v.out_edges.get(target))
                    .cloned()
                    .unwrap_or(VoteCount::EMPTY);
                FlowEdge {
                    source: self.label(source, names),
                    target: self.label(target, names),
                    weight: weight.0.to_string(),
                }
            })
            .collect()
    }

    fn label(&self, key: &VertexKey, names: &HashMap<CandidateId, String>) -> String {
        let count = self
            .vertices
            .get(key)
            .map(|v| v.vote_count)
            .unwrap_or(VoteCount::EMPTY);
        let name = names.get(&key.candidate).map(|s| s.as_str()).unwrap_or("");
        vertex_label(name, count.0, key.round)
    }
}

/// The display label of a candidate in a given round.
///
/// ```
/// assert_eq!(ranked_flow::graph::vertex_label("Alice", 3, 2), "Alice (3)  ");
/// ```
pub fn vertex_label(name: &str, vote_count: u64, round: u32) -> String {
    format!("{} ({}){}", name, vote_count, " ".repeat(round as usize))
}

/// The round encoded in a label, which is the number of trailing spaces.
pub fn label_round(label: &str) -> usize {
    label.len() - label.trim_end_matches(' ').len()
}

/// Recovers the name of the candidate from a label.
pub fn plain_name(label: &str) -> String {
    let trimmed = label.trim_end_matches(' ');
    match trimmed.rfind(" (") {
        Some(idx) if trimmed.ends_with(')') => trimmed[..idx].to_string(),
        _ => trimmed.to_string(),
    }
}

/// Recovers the name of the winner from the edges only.
///
/// The winner is the terminal label (a target that is never a source) of the latest round.
/// An empty list of edges carries no information and returns `None`.
pub fn winner_name(edges: &[FlowEdge]) -> Option<String> {
    let sources: HashSet<&str> = edges.iter().map(|e| e.source.as_str()).collect();
    let terminals: Vec<&str> = edges
        .iter()
        .map(|e| e.target.as_str())
        .filter(|t| !sources.contains(t))
        .collect();
    debug!("winner_name: terminal labels: {:?}", terminals);
    // First one wins on equal rounds, to stay deterministic.
    let mut best: Option<&str> = None;
    for t in terminals {
        match best {
            Some(b) if label_round(b) >= label_round(t) => {}
            _ => best = Some(t),
        }
    }
    best.map(plain_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(source: &str, target: &str, weight: u64) -> FlowEdge {
        FlowEdge {
            source: source.to_string(),
            target: target.to_string(),
            weight: weight.to_string(),
        }
    }

    #[test]
    fn labels_carry_the_round() {
        let l = vertex_label("Pillars of Eternity (II)", 12, 3);
        assert_eq!(l, "Pillars of Eternity (II) (12)   ");
        assert_eq!(label_round(&l), 3);
        assert_eq!(plain_name(&l), "Pillars of Eternity (II)");
    }

    #[test]
    fn winner_is_the_single_terminal() {
        let edges = vec![
            edge("B (1) ", "A (2)  ", 1),
            edge("A (1) ", "A (2)  ", 1),
        ];
        assert_eq!(winner_name(&edges), Some("A".to_string()));
    }

    #[test]
    fn winner_is_the_latest_terminal() {
        // C has no votes left to transfer in round 2, so its vertex has no outgoing edge.
        let edges = vec![
            edge("A (2) ", "A (2)  ", 2),
            edge("C (1) ", "C (1)  ", 1),
            edge("A (2)  ", "A (2)   ", 2),
        ];
        assert_eq!(winner_name(&edges), Some("A".to_string()));
    }

    #[test]
    fn no_edges_no_winner() {
        assert_eq!(winner_name(&[]), None);
    }

    #[test]
    fn edges_are_merged_and_summed() {
        let mut g = FlowGraph::new();
        let a = CandidateId(1);
        let b = CandidateId(2);
        g.add_vertex(a, 1, VoteCount(2));
        g.add_vertex(b, 1, VoteCount(1));
        g.add_edge(VertexKey::new(b, 1), VertexKey::new(a, 2), VoteCount(1));
        g.add_edge(VertexKey::new(a, 1), VertexKey::new(a, 2), VoteCount(1));
        g.add_edge(VertexKey::new(a, 1), VertexKey::new(a, 2), VoteCount(1));
        g.add_vertex(a, 2, VoteCount(3));
        assert_eq!(g.inbound_weight(a, 2), VoteCount(3));
        assert_eq!(g.vertex_count(a, 2), Some(VoteCount(3)));

        let names: HashMap<CandidateId, String> =
            vec![(a, "A".to_string()), (b, "B".to_string())]
                .into_iter()
                .collect();
        let edges = g.to_flow_edges(&names);
        assert_eq!(
            edges,
            vec![edge("B (1) ", "A (3)  ", 1), edge("A (2) ", "A (3)  ", 2)]
        );
    }

    #[test]
    #[should_panic]
    fn edges_skip_no_round() {
        let mut g = FlowGraph::new();
        g.add_edge(
            VertexKey::new(CandidateId(1), 1),
            VertexKey::new(CandidateId(1), 3),
            VoteCount(1),
        );
    }
}
