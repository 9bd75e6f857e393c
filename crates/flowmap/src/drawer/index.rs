//! Edge index construction.

use super::{DrawInput, bridge::Bridged, routing::Routed};
use crate::primitive::EdgeIndex;

/// Maps every node and flow of the variant to the polylines touching it.
///
/// A polyline touches the endpoints of the segments it carries. When a
/// segment was cut from a rank-skipping edge, the endpoints of that
/// authored edge are touched too, so hovering a node highlights its whole
/// route through the bridging nodes. Nodes and flows without edges map to
/// an empty list.
pub(crate) fn build_edge_index(
    input: &DrawInput<'_>,
    bridged: &Bridged,
    routed: &Routed,
    polylines: &[(usize, usize)],
) -> EdgeIndex {
    let mut index = EdgeIndex::with_keys(input.nodes.keys().copied(), input.flows.keys().copied());

    for &(primitive, record) in polylines {
        let Some(record) = routed.records.get(record) else {
            continue;
        };
        index.add_flow_edge(record.flow, primitive);

        for segment in &record.segments {
            // Bridging nodes are not index keys and are skipped here.
            index.add_node_edge(segment.key.source, primitive);
            index.add_node_edge(segment.key.target, primitive);
            if let Some(origin) = bridged.origin_of(&segment.key) {
                index.add_node_edge(origin.source, primitive);
                index.add_node_edge(origin.target, primitive);
            }
        }
    }

    index
}
