//! Output of the diagram drawer.
//!
//! A [`Diagram`] is a flat, ordered list of positioned [`Primitive`]s, the
//! canvas size and an [`EdgeIndex`] telling, for every node and flow, which
//! polyline primitives belong to it. The presentation layer draws the
//! primitives and uses the index to highlight connected edges on hover.
//!
//! [`Routing`] records the intermediate routing graph (ranks, bridged
//! segments and trunk joints). It is not needed for drawing but makes the
//! routing inspectable.

use indexmap::IndexMap;

use flowmap_core::{
    geometry::{Bounds, Point, Size},
    identifier::Id,
};

/// What a primitive represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Node,
    /// Arrowhead marker definitions of one flow.
    FlowDefinition,
    EdgePolyline,
    EdgeLabel,
}

impl PrimitiveKind {
    /// Default stacking order, lowest first.
    pub fn z_order(self) -> i32 {
        match self {
            Self::FlowDefinition => 0,
            Self::EdgePolyline => 1,
            Self::Node => 2,
            Self::EdgeLabel => 3,
        }
    }
}

/// One positioned drawable item.
///
/// The payload is SVG markup in local coordinates: its origin is the
/// top-left corner of the primitive's box.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    id: String,
    kind: PrimitiveKind,
    position: Point,
    size: Size,
    z_order: i32,
    clickable: bool,
    hoverable: bool,
    node: Option<Id>,
    flow: Option<Id>,
    payload: String,
}

impl Primitive {
    pub(crate) fn new(id: String, kind: PrimitiveKind, bounds: Bounds, payload: String) -> Self {
        Self {
            id,
            kind,
            position: bounds.center(),
            size: bounds.to_size(),
            z_order: kind.z_order(),
            clickable: false,
            hoverable: false,
            node: None,
            flow: None,
            payload,
        }
    }

    pub(crate) fn with_node(mut self, node: Id) -> Self {
        self.node = Some(node);
        self
    }

    pub(crate) fn with_flow(mut self, flow: Id) -> Self {
        self.flow = Some(flow);
        self
    }

    pub(crate) fn with_clickable(mut self, clickable: bool) -> Self {
        self.clickable = clickable;
        self
    }

    pub(crate) fn with_hoverable(mut self, hoverable: bool) -> Self {
        self.hoverable = hoverable;
        self
    }

    pub(crate) fn translate(&mut self, offset: Point) {
        self.position = self.position.add_point(offset);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    /// Center of the primitive's box.
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new_from_center(self.position, self.size)
    }

    pub fn z_order(&self) -> i32 {
        self.z_order
    }

    /// Expandable nodes are clickable.
    pub fn clickable(&self) -> bool {
        self.clickable
    }

    pub fn hoverable(&self) -> bool {
        self.hoverable
    }

    /// The node this primitive draws, for node primitives.
    pub fn node(&self) -> Option<Id> {
        self.node
    }

    /// The flow this primitive belongs to, for flow, polyline and label primitives.
    pub fn flow(&self) -> Option<Id> {
        self.flow
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }
}

/// Node and flow ids mapped to the polyline primitives touching them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeIndex {
    nodes: IndexMap<Id, Vec<usize>>,
    flows: IndexMap<Id, Vec<usize>>,
}

impl EdgeIndex {
    pub(crate) fn with_keys(
        nodes: impl IntoIterator<Item = Id>,
        flows: impl IntoIterator<Item = Id>,
    ) -> Self {
        Self {
            nodes: nodes.into_iter().map(|id| (id, Vec::new())).collect(),
            flows: flows.into_iter().map(|id| (id, Vec::new())).collect(),
        }
    }

    pub(crate) fn add_node_edge(&mut self, node: Id, primitive: usize) {
        if let Some(list) = self.nodes.get_mut(&node) {
            push_unique(list, primitive);
        }
    }

    pub(crate) fn add_flow_edge(&mut self, flow: Id, primitive: usize) {
        if let Some(list) = self.flows.get_mut(&flow) {
            push_unique(list, primitive);
        }
    }

    /// Polyline primitive indices touching `node`, ascending.
    pub fn node_edges(&self, node: Id) -> &[usize] {
        self.nodes.get(&node).map(Vec::as_slice).unwrap_or_default()
    }

    /// Polyline primitive indices drawing `flow`, ascending.
    pub fn flow_edges(&self, flow: Id) -> &[usize] {
        self.flows.get(&flow).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (Id, &[usize])> {
        self.nodes.iter().map(|(id, list)| (*id, list.as_slice()))
    }

    pub fn flows(&self) -> impl Iterator<Item = (Id, &[usize])> {
        self.flows.iter().map(|(id, list)| (*id, list.as_slice()))
    }
}

fn push_unique(list: &mut Vec<usize>, primitive: usize) {
    if !list.contains(&primitive) {
        list.push(primitive);
    }
}

/// An edge of the routed graph.
///
/// `origin_*` name the authored edge the segment was cut from; they equal
/// `source`/`target` unless the edge was bridged across ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoutedSegment {
    pub source: Id,
    pub target: Id,
    pub flow: Id,
    pub origin_source: Id,
    pub origin_target: Id,
}

/// The bundling of one flow across one rank boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Trunk {
    pub flow: Id,
    pub rank: usize,
    pub component: usize,
    /// Projected join points of the edges leaving rank `rank`.
    pub source_endpoints: Vec<Point>,
    pub source_joint: Point,
    /// Projected split points of the edges entering rank `rank + 1`.
    pub target_endpoints: Vec<Point>,
    pub target_joint: Point,
}

impl Trunk {
    fn translate(&mut self, offset: Point) {
        for point in self
            .source_endpoints
            .iter_mut()
            .chain(self.target_endpoints.iter_mut())
        {
            *point = point.add_point(offset);
        }
        self.source_joint = self.source_joint.add_point(offset);
        self.target_joint = self.target_joint.add_point(offset);
    }
}

/// Routing graph behind a [`Diagram`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Routing {
    ranks: IndexMap<Id, usize>,
    synthetic: Vec<Id>,
    segments: Vec<RoutedSegment>,
    trunks: Vec<Trunk>,
}

impl Routing {
    pub(crate) fn new(
        ranks: IndexMap<Id, usize>,
        synthetic: Vec<Id>,
        segments: Vec<RoutedSegment>,
        trunks: Vec<Trunk>,
    ) -> Self {
        Self {
            ranks,
            synthetic,
            segments,
            trunks,
        }
    }

    pub(crate) fn translate(&mut self, offset: Point) {
        for trunk in &mut self.trunks {
            trunk.translate(offset);
        }
    }

    /// Rank of every routed node, bridging nodes included.
    pub fn rank(&self, id: Id) -> Option<usize> {
        self.ranks.get(&id).copied()
    }

    pub fn ranks(&self) -> impl Iterator<Item = (Id, usize)> {
        self.ranks.iter().map(|(id, rank)| (*id, *rank))
    }

    /// Ids of the bridging nodes inserted for rank-skipping edges.
    pub fn synthetic_nodes(&self) -> &[Id] {
        &self.synthetic
    }

    pub fn segments(&self) -> &[RoutedSegment] {
        &self.segments
    }

    pub fn trunks(&self) -> &[Trunk] {
        &self.trunks
    }
}

/// A computed diagram ready for presentation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagram {
    primitives: Vec<Primitive>,
    size: Size,
    edge_index: EdgeIndex,
    routing: Routing,
}

impl Diagram {
    pub(crate) fn new(
        primitives: Vec<Primitive>,
        size: Size,
        edge_index: EdgeIndex,
        routing: Routing,
    ) -> Self {
        Self {
            primitives,
            size,
            edge_index,
            routing,
        }
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn edge_index(&self) -> &EdgeIndex {
        &self.edge_index
    }

    pub fn routing(&self) -> &Routing {
        &self.routing
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// The node primitive drawing `node`.
    pub fn node_primitive(&self, node: Id) -> Option<&Primitive> {
        self.primitives
            .iter()
            .find(|primitive| primitive.kind == PrimitiveKind::Node && primitive.node == Some(node))
    }
}
