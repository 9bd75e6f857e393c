//! Diagram drawer.
//!
//! [`compute_diagram`] turns one diagram variant into a [`Diagram`]. It is a
//! pure function of its inputs and runs in five steps:
//!
//! ```text
//! FlowDiagram
//!     ↓ resolve      nodes measured, dangling and duplicate edges dropped
//! layout pass 1      ranks of the real nodes
//!     ↓ bridge       rank-skipping edges cut into one segment per rank
//! layout pass 2      final coordinates, bridging nodes included
//!     ↓ route        same-flow edges bundled into trunks per rank boundary
//!     ↓ emit         node, flow, polyline and label primitives
//!     ↓ index        node and flow ids mapped to their polylines
//! Diagram
//! ```

mod bridge;
mod emit;
mod index;
mod routing;

use indexmap::{IndexMap, IndexSet};
use log::{debug, info, trace, warn};

use flowmap_core::{
    geometry::Size,
    identifier::Id,
    semantic::{Flow, FlowDiagram, Node},
};

use crate::{
    config::LayoutConfig,
    error::{FlowmapError, ReferenceKind},
    layout::{self, LayoutGraph},
    primitive::{Diagram, Routing, RoutedSegment},
    render::{NodeRender, RenderRegistry},
    style::StyleRegistry,
};

use bridge::EdgeKey;

/// Computes the positioned primitives of one diagram variant.
///
/// Edges naming unknown nodes or flows are skipped with a warning, or
/// rejected when [`LayoutConfig::strict_references`] is set. Repeated
/// identical edges are drawn once. An empty variant yields an empty
/// diagram.
///
/// # Errors
///
/// Returns [`FlowmapError::DanglingReference`] under strict reference
/// checking, or [`FlowmapError::Layout`] if the layout step fails.
pub fn compute_diagram(
    variant: &FlowDiagram,
    config: &LayoutConfig,
    renders: &RenderRegistry,
    styles: &StyleRegistry,
) -> Result<Diagram, FlowmapError> {
    let input = DrawInput::resolve(variant, config, renders)?;
    if input.nodes.is_empty() {
        debug!(diagram:% = variant.id; "Diagram has no nodes");
        return Ok(Diagram::default());
    }

    info!(
        diagram:% = variant.id,
        nodes = input.nodes.len(),
        edges = input.edges.len();
        "Computing diagram"
    );

    let first_pass = layout::layout(&input.layout_graph(config), config)?;
    let real_ranks: IndexMap<Id, usize> = input
        .nodes
        .keys()
        .filter_map(|id| first_pass.rank(*id).map(|rank| (*id, rank)))
        .collect();

    let bridged = bridge::bridge_ranks(&input.edges, real_ranks);
    debug!(
        bridged_edges = bridged.bridges.len(),
        bridging_nodes = bridged.synthetic.len(),
        segments = bridged.segments.len();
        "Bridged rank-skipping edges"
    );

    let second_pass = layout::layout(&bridged.layout_graph(&input, config), config)?;
    let routed = routing::route(&input, &bridged, &second_pass, config);
    let emitted = emit::emit(&input, &routed, &second_pass, styles, config);
    let edge_index = index::build_edge_index(&input, &bridged, &routed, &emitted.polylines);

    let segments = bridged
        .segments
        .iter()
        .map(|segment| RoutedSegment {
            source: segment.key.source,
            target: segment.key.target,
            flow: segment.key.flow,
            origin_source: segment.origin.source,
            origin_target: segment.origin.target,
        })
        .collect();
    let mut routing = Routing::new(
        bridged.ranks.clone(),
        bridged.synthetic.iter().copied().collect(),
        segments,
        routed.trunks,
    );
    routing.translate(emitted.offset);

    trace!(primitives = emitted.primitives.len(); "Diagram computed");
    Ok(Diagram::new(emitted.primitives, emitted.size, edge_index, routing))
}

/// A node that passed validation, with its measured render.
struct ResolvedNode<'a> {
    node: &'a Node,
    render: NodeRender,
}

/// Validated input of one drawer run.
pub(crate) struct DrawInput<'a> {
    nodes: IndexMap<Id, ResolvedNode<'a>>,
    flows: IndexMap<Id, &'a Flow>,
    edges: IndexSet<EdgeKey>,
}

impl<'a> DrawInput<'a> {
    fn resolve(
        variant: &'a FlowDiagram,
        config: &LayoutConfig,
        renders: &RenderRegistry,
    ) -> Result<Self, FlowmapError> {
        let mut nodes = IndexMap::with_capacity(variant.nodes.len());
        for node in &variant.nodes {
            if nodes.contains_key(&node.id) {
                warn!(diagram:% = variant.id, node:% = node.id; "Duplicate node id, keeping the first");
                continue;
            }
            let render = renders.resolve(node).render(node);
            nodes.insert(node.id, ResolvedNode { node, render });
        }

        let mut flows = IndexMap::with_capacity(variant.flows.len());
        for flow in &variant.flows {
            if flows.contains_key(&flow.id) {
                warn!(diagram:% = variant.id, flow:% = flow.id; "Duplicate flow id, keeping the first");
                continue;
            }
            flows.insert(flow.id, flow);
        }

        let mut edges = IndexSet::with_capacity(variant.edges.len());
        for edge in &variant.edges {
            let dangling = if !nodes.contains_key(&edge.from_node) {
                Some((ReferenceKind::Node, edge.from_node))
            } else if !nodes.contains_key(&edge.to_node) {
                Some((ReferenceKind::Node, edge.to_node))
            } else if !flows.contains_key(&edge.flow) {
                Some((ReferenceKind::Flow, edge.flow))
            } else {
                None
            };

            if let Some((kind, id)) = dangling {
                if config.strict_references() {
                    return Err(FlowmapError::DanglingReference {
                        diagram: variant.id,
                        kind,
                        id,
                    });
                }
                warn!(diagram:% = variant.id, kind:% = kind, id:% = id; "Skipping edge with dangling reference");
                continue;
            }

            if !edges.insert(EdgeKey::from(*edge)) {
                debug!(from:% = edge.from_node, to:% = edge.to_node, flow:% = edge.flow; "Dropping repeated edge");
            }
        }

        Ok(Self {
            nodes,
            flows,
            edges,
        })
    }

    fn node_size(&self, id: Id) -> Option<Size> {
        self.nodes.get(&id).map(|node| node.render.size())
    }

    fn layout_graph(&self, config: &LayoutConfig) -> LayoutGraph {
        let mut graph = LayoutGraph::new();
        for (id, node) in &self.nodes {
            graph.add_node(*id, node.render.size());
        }
        for edge in &self.edges {
            graph.add_edge(edge.source, edge.target, edge.flow, config.edge_footprint());
        }
        graph
    }

    /// Position of `flow` in declaration order.
    fn flow_position(&self, flow: Id) -> usize {
        self.flows.get_index_of(&flow).unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use flowmap_core::semantic::Edge;

    use super::*;
    use crate::primitive::PrimitiveKind;

    fn chain() -> FlowDiagram {
        FlowDiagram::new("chain")
            .with_node(Node::new("a"))
            .with_node(Node::new("b"))
            .with_flow(Flow::new("f", "Fuel"))
            .with_edge(Edge::new("a", "b", "f"))
    }

    fn compute(variant: &FlowDiagram) -> Result<Diagram, FlowmapError> {
        compute_diagram(
            variant,
            &LayoutConfig::default(),
            &RenderRegistry::default(),
            &StyleRegistry::default(),
        )
    }

    #[test]
    fn test_empty_variant_gives_empty_diagram() {
        let diagram = compute(&FlowDiagram::new("empty")).unwrap();
        assert_eq!(diagram, Diagram::default());
        assert_eq!(diagram.size(), Size::default());
    }

    #[test]
    fn test_dangling_edge_is_skipped() {
        let variant = chain().with_edge(Edge::new("a", "ghost", "f"));
        let diagram = compute(&variant).unwrap();
        assert!(diagram.node_primitive(Id::new("ghost")).is_none());
        assert_eq!(diagram.routing().segments().len(), 1);
    }

    #[test]
    fn test_dangling_edge_fails_when_strict() {
        let variant = chain().with_edge(Edge::new("a", "b", "no-such-flow"));
        let result = compute_diagram(
            &variant,
            &LayoutConfig::default().with_strict_references(true),
            &RenderRegistry::default(),
            &StyleRegistry::default(),
        );
        assert!(matches!(
            result,
            Err(FlowmapError::DanglingReference {
                kind: ReferenceKind::Flow,
                ..
            })
        ));
    }

    #[test]
    fn test_repeated_edges_are_drawn_once() {
        let variant = chain().with_edge(Edge::new("a", "b", "f"));
        let diagram = compute(&variant).unwrap();
        let polylines = diagram
            .primitives()
            .iter()
            .filter(|primitive| primitive.kind() == PrimitiveKind::EdgePolyline)
            .count();
        // Source side, trunk and target side of the single edge.
        assert_eq!(polylines, 3);
    }

    #[test]
    fn test_edgeless_variant_places_every_node() {
        let variant = FlowDiagram::new("loose")
            .with_node(Node::new("x"))
            .with_node(Node::new("y"));
        let diagram = compute(&variant).unwrap();
        assert!(diagram.node_primitive(Id::new("x")).is_some());
        assert!(diagram.node_primitive(Id::new("y")).is_some());
        assert_eq!(diagram.edge_index().node_edges(Id::new("x")), &[] as &[usize]);
    }
}
