//! Trunk routing.
//!
//! Forward segments are grouped by connected component, rank boundary and
//! flow. Each group is drawn as a bundle:
//!
//! ```text
//!  source ──┐                        ┌── target
//!  source ──┼── joint ─┐             │
//!  source ──┘          └── joint ────┼── target
//!                                    └── target
//! ```
//!
//! Every edge runs from its anchor on the source's right face to a join
//! column inside the rank gap; the projected points meet at a joint (their
//! mean); an orthogonal elbow carries the trunk to the target-side joint,
//! from where edges fan out to their anchors on the targets' left faces.
//! Different flows crossing the same gap get staggered join columns.
//!
//! Back edges and self-loops are not bundled and get their own elbow.

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;

use flowmap_core::{
    geometry::{Bounds, Point},
    identifier::Id,
};

use super::{
    DrawInput,
    bridge::{Bridged, Segment},
};
use crate::{
    config::LayoutConfig,
    layout::{LayoutResult, NodePlacement},
    primitive::Trunk,
};

/// One polyline to draw.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EdgeRecord {
    pub flow: Id,
    pub points: Vec<Point>,
    /// Segments this polyline carries; a trunk carries its whole bundle.
    pub segments: Vec<Segment>,
    /// True when the last point lies on a real node, so an arrowhead is drawn.
    pub ends_at_node: bool,
    /// Where the flow label goes; only trunks have one.
    pub label_anchor: Option<Point>,
}

/// All polylines of a diagram plus the bundles they form.
#[derive(Debug, Clone, Default)]
pub(crate) struct Routed {
    pub records: Vec<EdgeRecord>,
    pub trunks: Vec<Trunk>,
}

/// Bundle key: boundary rank, component, flow declaration position.
type GroupKey = (usize, usize, usize);

pub(crate) fn route(
    input: &DrawInput<'_>,
    bridged: &Bridged,
    result: &LayoutResult,
    config: &LayoutConfig,
) -> Routed {
    let anchors = Anchors::collect(bridged, result);

    let mut groups: BTreeMap<GroupKey, Vec<Segment>> = BTreeMap::new();
    let mut back = Vec::new();
    for segment in &bridged.segments {
        let (Some(source), Some(_)) = (
            result.placement(segment.key.source),
            result.placement(segment.key.target),
        ) else {
            continue;
        };
        if bridged.is_forward(&segment.key) {
            let key = (
                source.rank(),
                source.component(),
                input.flow_position(segment.key.flow),
            );
            groups.entry(key).or_default().push(*segment);
        } else {
            back.push(*segment);
        }
    }

    let mut boundary_flows: BTreeMap<(usize, usize), Vec<usize>> = BTreeMap::new();
    for &(rank, component, flow) in groups.keys() {
        boundary_flows.entry((rank, component)).or_default().push(flow);
    }

    let mut routed = Routed::default();
    for (&(rank, component, flow_position), members) in &groups {
        let (Some(left), Some(right)) = (
            result.column(component, rank),
            result.column(component, rank + 1),
        ) else {
            continue;
        };
        let flows_here = boundary_flows
            .get(&(rank, component))
            .map(Vec::as_slice)
            .unwrap_or_default();
        let stagger_index = flows_here
            .iter()
            .position(|position| *position == flow_position)
            .unwrap_or(0);

        let gap_left = left.right();
        let gap_right = right.left();
        let gap = gap_right - gap_left;
        let step = if flows_here.len() > 1 {
            config
                .flow_stagger()
                .min(gap / (4.0 * flows_here.len() as f32))
        } else {
            0.0
        };
        let offset = stagger_index as f32 * step;
        let source_x = gap_left + gap * config.join_fraction() + offset;
        let target_x = gap_right - gap * config.join_fraction() + offset;

        route_bundle(
            &mut routed,
            bridged,
            &anchors,
            members,
            (rank, component),
            source_x,
            target_x,
        );
    }

    for segment in back {
        if let Some(record) = route_back_edge(&segment, result, config) {
            routed.records.push(record);
        }
    }

    routed
}

fn route_bundle(
    routed: &mut Routed,
    bridged: &Bridged,
    anchors: &Anchors,
    members: &[Segment],
    (rank, component): (usize, usize),
    source_x: f32,
    target_x: f32,
) {
    let Some(first) = members.first() else {
        return;
    };
    let flow = first.key.flow;
    let bundled = members.len() >= 2;

    let starts: Vec<Point> = members.iter().map(|segment| anchors.start(segment)).collect();
    let ends: Vec<Point> = members.iter().map(|segment| anchors.end(segment)).collect();
    let source_endpoints: Vec<Point> = starts.iter().map(|start| start.with_x(source_x)).collect();
    let target_endpoints: Vec<Point> = ends.iter().map(|end| end.with_x(target_x)).collect();
    let source_joint = Point::average(source_endpoints.iter().copied()).unwrap_or_default();
    let target_joint = Point::average(target_endpoints.iter().copied()).unwrap_or_default();

    for ((segment, start), projected) in members.iter().zip(&starts).zip(&source_endpoints) {
        let mut points = vec![*start, *projected];
        if bundled {
            points.push(source_joint);
        }
        routed.records.push(EdgeRecord {
            flow,
            points,
            segments: vec![*segment],
            ends_at_node: false,
            label_anchor: None,
        });
    }

    let mid_x = (source_joint.x() + target_joint.x()) / 2.0;
    let bend_in = Point::new(mid_x, source_joint.y());
    let bend_out = Point::new(mid_x, target_joint.y());
    routed.records.push(EdgeRecord {
        flow,
        points: vec![source_joint, bend_in, bend_out, target_joint],
        segments: members.to_vec(),
        ends_at_node: false,
        label_anchor: Some(bend_in.midpoint(bend_out)),
    });

    for ((segment, end), projected) in members.iter().zip(&ends).zip(&target_endpoints) {
        let mut points = Vec::with_capacity(3);
        if bundled {
            points.push(target_joint);
        }
        points.extend([*projected, *end]);
        routed.records.push(EdgeRecord {
            flow,
            points,
            segments: vec![*segment],
            ends_at_node: !bridged.is_synthetic(segment.key.target),
            label_anchor: None,
        });
    }

    routed.trunks.push(Trunk {
        flow,
        rank,
        component,
        source_endpoints,
        source_joint,
        target_endpoints,
        target_joint,
    });
}

/// Elbow for an edge that does not go to the next rank.
fn route_back_edge(
    segment: &Segment,
    result: &LayoutResult,
    config: &LayoutConfig,
) -> Option<EdgeRecord> {
    let source = result.placement(segment.key.source)?.bounds();
    let target = result.placement(segment.key.target)?.bounds();
    let clearance = config.edge_footprint().height();

    let points = if segment.key.source == segment.key.target {
        self_loop(source, clearance)
    } else {
        let start = Point::new(source.max_x(), source.center().y());
        let end = Point::new(target.min_x(), target.center().y());
        let mid_x = (start.x() + end.x()) / 2.0;
        vec![
            start,
            Point::new(mid_x, start.y()),
            Point::new(mid_x, end.y()),
            end,
        ]
    };

    // Only trunk elbows carry flow labels.
    Some(EdgeRecord {
        flow: segment.key.flow,
        points,
        segments: vec![*segment],
        ends_at_node: true,
        label_anchor: None,
    })
}

/// Loop leaving the right face, passing above the node and entering the left face.
fn self_loop(bounds: Bounds, clearance: f32) -> Vec<Point> {
    let y = bounds.center().y();
    let top = bounds.min_y() - clearance;
    let right = bounds.max_x() + clearance;
    let left = bounds.min_x() - clearance;
    vec![
        Point::new(bounds.max_x(), y),
        Point::new(right, y),
        Point::new(right, top),
        Point::new(left, top),
        Point::new(left, y),
        Point::new(bounds.min_x(), y),
    ]
}

/// Face anchors of forward segments.
///
/// The edges leaving a real node share its right face, evenly spaced top to
/// bottom; the edges entering share its left face. On each face the edges
/// are grouped by flow in order of first appearance, then by edge order.
/// Bridging nodes have no extent, so their segments attach at the center.
struct Anchors {
    starts: HashMap<Segment, Point>,
    ends: HashMap<Segment, Point>,
}

impl Anchors {
    fn collect(bridged: &Bridged, result: &LayoutResult) -> Self {
        let mut outgoing: IndexMap<Id, Vec<Segment>> = IndexMap::new();
        let mut incoming: IndexMap<Id, Vec<Segment>> = IndexMap::new();
        for segment in &bridged.segments {
            if bridged.is_forward(&segment.key) {
                outgoing.entry(segment.key.source).or_default().push(*segment);
                incoming.entry(segment.key.target).or_default().push(*segment);
            }
        }

        let face = |faces: IndexMap<Id, Vec<Segment>>, right: bool| {
            let mut anchors = HashMap::new();
            for (node, segments) in faces {
                let Some(placement) = result.placement(node) else {
                    continue;
                };
                let ordered = order_by_flow(segments);
                let count = ordered.len();
                for (slot, segment) in ordered.into_iter().enumerate() {
                    let point = if bridged.is_synthetic(node) {
                        placement.center()
                    } else {
                        face_anchor(placement, right, slot, count)
                    };
                    anchors.insert(segment, point);
                }
            }
            anchors
        };

        Self {
            starts: face(outgoing, true),
            ends: face(incoming, false),
        }
    }

    fn start(&self, segment: &Segment) -> Point {
        self.starts.get(segment).copied().unwrap_or_default()
    }

    fn end(&self, segment: &Segment) -> Point {
        self.ends.get(segment).copied().unwrap_or_default()
    }
}

fn order_by_flow(mut segments: Vec<Segment>) -> Vec<Segment> {
    let mut flows: Vec<Id> = Vec::new();
    for segment in &segments {
        if !flows.contains(&segment.key.flow) {
            flows.push(segment.key.flow);
        }
    }
    segments.sort_by_key(|segment| flows.iter().position(|flow| *flow == segment.key.flow));
    segments
}

fn face_anchor(placement: &NodePlacement, right: bool, slot: usize, count: usize) -> Point {
    let bounds = placement.bounds();
    let x = if right { bounds.max_x() } else { bounds.min_x() };
    let y = bounds.min_y() + bounds.height() * (slot + 1) as f32 / (count + 1) as f32;
    Point::new(x, y)
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;
    use flowmap_core::geometry::Size;

    use super::*;
    use crate::drawer::bridge::EdgeKey;

    fn segment(source: &str, target: &str, flow: &str) -> Segment {
        let key = EdgeKey {
            source: Id::new(source),
            target: Id::new(target),
            flow: Id::new(flow),
        };
        Segment { key, origin: key }
    }

    #[test]
    fn test_order_by_flow_groups_first_appearance() {
        let ordered = order_by_flow(vec![
            segment("a", "x", "water"),
            segment("a", "y", "steam"),
            segment("a", "z", "water"),
        ]);
        let targets: Vec<String> = ordered
            .iter()
            .map(|segment| segment.key.target.to_string())
            .collect();
        assert_eq!(targets, vec!["x", "z", "y"]);
    }

    #[test]
    fn test_self_loop_stays_outside_node() {
        let bounds = Bounds::new_from_top_left(Point::new(100.0, 100.0), Size::new(80.0, 40.0));
        let points = self_loop(bounds, 16.0);
        assert_eq!(points.len(), 6);
        assert_eq!(points[0], Point::new(180.0, 120.0));
        assert_eq!(points[5], Point::new(100.0, 120.0));
        assert_approx_eq!(f32, points[2].y(), 84.0);
        assert_approx_eq!(f32, points[3].x(), 84.0);
    }
}
