//! Rank bridging.
//!
//! An edge from rank `r` to rank `r + n` with `n > 1` is cut into `n`
//! segments joined by zero-width bridging nodes, one per intermediate rank.
//! Afterwards every forward segment spans exactly one rank boundary, which
//! is what trunk routing needs.

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use log::trace;

use flowmap_core::{geometry::Size, identifier::Id, semantic::Edge};

use super::DrawInput;
use crate::{config::LayoutConfig, layout::LayoutGraph};

/// Identity of an edge or segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct EdgeKey {
    pub source: Id,
    pub target: Id,
    pub flow: Id,
}

impl From<Edge> for EdgeKey {
    fn from(edge: Edge) -> Self {
        Self {
            source: edge.from_node,
            target: edge.to_node,
            flow: edge.flow,
        }
    }
}

/// A routed segment and the authored edge it was cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Segment {
    pub key: EdgeKey,
    pub origin: EdgeKey,
}

/// The routing graph after bridging.
#[derive(Debug, Clone, Default)]
pub(crate) struct Bridged {
    /// Ranks of real and bridging nodes.
    pub ranks: IndexMap<Id, usize>,
    pub synthetic: IndexSet<Id>,
    pub segments: Vec<Segment>,
    /// Authored edge to the segments that replaced it.
    pub bridges: IndexMap<EdgeKey, Vec<EdgeKey>>,
    origins: HashMap<EdgeKey, EdgeKey>,
}

impl Bridged {
    pub fn is_synthetic(&self, id: Id) -> bool {
        self.synthetic.contains(&id)
    }

    pub fn rank(&self, id: Id) -> Option<usize> {
        self.ranks.get(&id).copied()
    }

    /// True when the segment goes from one rank to the next.
    pub fn is_forward(&self, key: &EdgeKey) -> bool {
        match (self.rank(key.source), self.rank(key.target)) {
            (Some(source), Some(target)) => target == source + 1,
            _ => false,
        }
    }

    /// The authored edge a bridged segment replaces.
    pub fn origin_of(&self, key: &EdgeKey) -> Option<EdgeKey> {
        self.origins.get(key).copied()
    }

    /// Graph for the second layout pass, every node pinned to its rank.
    pub fn layout_graph(&self, input: &DrawInput<'_>, config: &LayoutConfig) -> LayoutGraph {
        let footprint = config.edge_footprint();
        let mut graph = LayoutGraph::new();
        for (id, rank) in &self.ranks {
            let size = if self.is_synthetic(*id) {
                Size::new(0.0, footprint.height())
            } else {
                input.node_size(*id).unwrap_or_default()
            };
            graph.add_ranked_node(*id, size, *rank);
        }
        for segment in &self.segments {
            graph.add_edge(segment.key.source, segment.key.target, segment.key.flow, footprint);
        }
        graph
    }
}

/// Id of the bridging node placing `origin` on `rank`.
pub(crate) fn bridge_id(origin: &EdgeKey, rank: usize) -> Id {
    Id::new(&format!(
        "{}->{}[{}]@rank-{rank}",
        origin.source, origin.target, origin.flow
    ))
}

/// Cuts every rank-skipping edge into single-boundary segments.
///
/// Boundaries are processed in ascending order, so a segment ending on a
/// bridging node at rank `r + 1` is examined again at boundary `r + 1`.
/// Segment order follows edge order, with the pieces of one edge adjacent.
pub(crate) fn bridge_ranks(edges: &IndexSet<EdgeKey>, ranks: IndexMap<Id, usize>) -> Bridged {
    let last_rank = ranks.values().copied().max().unwrap_or(0);
    let mut ranks = ranks;
    let mut synthetic = IndexSet::new();
    let mut segments: Vec<Segment> = edges
        .iter()
        .map(|&key| Segment { key, origin: key })
        .collect();

    for boundary in 0..last_rank {
        let mut next = Vec::with_capacity(segments.len());
        for segment in segments {
            let source_rank = ranks.get(&segment.key.source).copied();
            let target_rank = ranks.get(&segment.key.target).copied();
            let skips = matches!(
                (source_rank, target_rank),
                (Some(source), Some(target)) if source == boundary && target > boundary + 1
            );
            if !skips {
                next.push(segment);
                continue;
            }

            let bridge = bridge_id(&segment.origin, boundary + 1);
            trace!(bridge:% = bridge; "Inserting bridging node");
            ranks.insert(bridge, boundary + 1);
            synthetic.insert(bridge);
            next.push(Segment {
                key: EdgeKey {
                    target: bridge,
                    ..segment.key
                },
                origin: segment.origin,
            });
            next.push(Segment {
                key: EdgeKey {
                    source: bridge,
                    ..segment.key
                },
                origin: segment.origin,
            });
        }
        segments = next;
    }

    let mut bridges: IndexMap<EdgeKey, Vec<EdgeKey>> = IndexMap::new();
    let mut origins = HashMap::new();
    for segment in &segments {
        if segment.key != segment.origin {
            bridges.entry(segment.origin).or_default().push(segment.key);
            origins.insert(segment.key, segment.origin);
        }
    }

    Bridged {
        ranks,
        synthetic,
        segments,
        bridges,
        origins,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(source: &str, target: &str) -> EdgeKey {
        EdgeKey {
            source: Id::new(source),
            target: Id::new(target),
            flow: Id::new("f"),
        }
    }

    fn ranks(entries: &[(&str, usize)]) -> IndexMap<Id, usize> {
        entries.iter().map(|(id, rank)| (Id::new(id), *rank)).collect()
    }

    #[test]
    fn test_adjacent_edges_are_untouched() {
        let edges: IndexSet<EdgeKey> = [key("a", "b")].into_iter().collect();
        let bridged = bridge_ranks(&edges, ranks(&[("a", 0), ("b", 1)]));
        assert!(bridged.synthetic.is_empty());
        assert!(bridged.bridges.is_empty());
        assert_eq!(bridged.segments.len(), 1);
        assert!(bridged.is_forward(&key("a", "b")));
    }

    #[test]
    fn test_skip_of_three_ranks_gets_two_bridges() {
        let origin = key("a", "d");
        let edges: IndexSet<EdgeKey> = [origin].into_iter().collect();
        let bridged = bridge_ranks(&edges, ranks(&[("a", 0), ("d", 3)]));

        let first = bridge_id(&origin, 1);
        let second = bridge_id(&origin, 2);
        assert_eq!(bridged.synthetic.iter().copied().collect::<Vec<_>>(), vec![first, second]);
        assert_eq!(bridged.rank(first), Some(1));
        assert_eq!(bridged.rank(second), Some(2));

        let keys: Vec<EdgeKey> = bridged.segments.iter().map(|segment| segment.key).collect();
        assert_eq!(keys.len(), 3);
        for segment in &keys {
            assert!(bridged.is_forward(segment));
            assert_eq!(bridged.origin_of(segment), Some(origin));
        }
        assert_eq!(keys[0].source, Id::new("a"));
        assert_eq!(keys[2].target, Id::new("d"));
        assert_eq!(bridged.bridges[&origin], keys);
    }

    #[test]
    fn test_bridge_id_names_origin_and_rank() {
        assert_eq!(bridge_id(&key("p", "q"), 4).to_string(), "p->q[f]@rank-4");
    }

    #[test]
    fn test_back_edges_are_not_bridged() {
        let edges: IndexSet<EdgeKey> = [key("c", "a"), key("b", "b")].into_iter().collect();
        let bridged = bridge_ranks(&edges, ranks(&[("a", 0), ("b", 1), ("c", 2)]));
        assert!(bridged.synthetic.is_empty());
        assert!(!bridged.is_forward(&key("c", "a")));
        assert!(!bridged.is_forward(&key("b", "b")));
    }
}
