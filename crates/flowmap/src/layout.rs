//! Layered left-to-right layout.
//!
//! [`layout`] is a pure function from a [`LayoutGraph`] to a
//! [`LayoutResult`]. It hands the edge list to `rust-sugiyama` for layer
//! assignment and in-layer ordering, then computes sized coordinates itself:
//! every rank becomes a column, columns run left to right, nodes of one rank
//! are stacked top to bottom in the order the library chose, and
//! disconnected parts of the graph are stacked below each other.
//!
//! Nodes may carry a rank hint. When every node of a connected part has
//! one, the hints are used as ranks and the library only decides the order
//! inside each rank. The diagram drawer relies on this for its second pass,
//! after bridging nodes were inserted.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
};

use indexmap::IndexMap;
use log::{debug, trace, warn};
use petgraph::{
    algo::{greedy_feedback_arc_set, toposort},
    graph::DiGraph,
    unionfind::UnionFind,
    visit::EdgeRef,
};
use rust_sugiyama::configure::Config;

use flowmap_core::{
    geometry::{Bounds, Point, Size},
    identifier::Id,
};

use crate::{
    config::{EdgeFootprint, LayoutConfig},
    error::FlowmapError,
};

/// Coordinates closer than this belong to the same library layer.
const LAYER_EPSILON: f64 = 1e-3;

/// A node to be placed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutNode {
    id: Id,
    size: Size,
    rank: Option<usize>,
}

impl LayoutNode {
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn rank_hint(&self) -> Option<usize> {
        self.rank
    }
}

/// A directed edge tagged with its flow and routing footprint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutEdge {
    source: Id,
    target: Id,
    flow: Id,
    footprint: EdgeFootprint,
}

impl LayoutEdge {
    pub fn source(&self) -> Id {
        self.source
    }

    pub fn target(&self) -> Id {
        self.target
    }

    pub fn flow(&self) -> Id {
        self.flow
    }

    pub fn footprint(&self) -> EdgeFootprint {
        self.footprint
    }
}

/// Input of one layout pass.
#[derive(Debug, Clone, Default)]
pub struct LayoutGraph {
    nodes: IndexMap<Id, LayoutNode>,
    edges: Vec<LayoutEdge>,
}

impl LayoutGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node. A second node with the same id replaces the first.
    pub fn add_node(&mut self, id: Id, size: Size) -> &mut Self {
        self.nodes.insert(id, LayoutNode { id, size, rank: None });
        self
    }

    /// Adds a node pinned to `rank`.
    pub fn add_ranked_node(&mut self, id: Id, size: Size, rank: usize) -> &mut Self {
        self.nodes.insert(
            id,
            LayoutNode {
                id,
                size,
                rank: Some(rank),
            },
        );
        self
    }

    /// Adds an edge. Parallel edges are allowed.
    pub fn add_edge(
        &mut self,
        source: Id,
        target: Id,
        flow: Id,
        footprint: EdgeFootprint,
    ) -> &mut Self {
        self.edges.push(LayoutEdge {
            source,
            target,
            flow,
            footprint,
        });
        self
    }

    pub fn nodes(&self) -> impl Iterator<Item = &LayoutNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> &[LayoutEdge] {
        &self.edges
    }

    pub fn node(&self, id: Id) -> Option<&LayoutNode> {
        self.nodes.get(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Final placement of one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodePlacement {
    center: Point,
    size: Size,
    rank: usize,
    component: usize,
}

impl NodePlacement {
    pub fn center(&self) -> Point {
        self.center
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Index of the connected part of the graph this node belongs to.
    pub fn component(&self) -> usize {
        self.component
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new_from_center(self.center, self.size)
    }
}

/// Horizontal extent of one rank column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSpan {
    left: f32,
    right: f32,
}

impl ColumnSpan {
    pub fn left(&self) -> f32 {
        self.left
    }

    pub fn right(&self) -> f32 {
        self.right
    }
}

/// Output of one layout pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutResult {
    placements: IndexMap<Id, NodePlacement>,
    columns: Vec<Vec<ColumnSpan>>,
    size: Size,
}

impl LayoutResult {
    pub fn placement(&self, id: Id) -> Option<&NodePlacement> {
        self.placements.get(&id)
    }

    /// Placements in input node order.
    pub fn placements(&self) -> impl Iterator<Item = (Id, &NodePlacement)> {
        self.placements.iter().map(|(id, placement)| (*id, placement))
    }

    pub fn rank(&self, id: Id) -> Option<usize> {
        self.placements.get(&id).map(NodePlacement::rank)
    }

    pub fn column(&self, component: usize, rank: usize) -> Option<ColumnSpan> {
        self.columns.get(component)?.get(rank).copied()
    }

    /// Number of ranks of the widest component.
    pub fn rank_count(&self) -> usize {
        self.columns.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Ids in `rank`, grouped by component and ordered top to bottom.
    pub fn rank_members(&self, rank: usize) -> Vec<Id> {
        let mut members: Vec<(Id, &NodePlacement)> = self
            .placements()
            .filter(|(_, placement)| placement.rank == rank)
            .collect();
        members.sort_by(|(_, a), (_, b)| {
            a.component
                .cmp(&b.component)
                .then(a.center.y().total_cmp(&b.center.y()))
        });
        members.into_iter().map(|(id, _)| id).collect()
    }

    /// Overall canvas size, measured from the origin.
    pub fn size(&self) -> Size {
        self.size
    }
}

/// Computes ranks and coordinates for `graph`.
///
/// # Errors
///
/// Returns [`FlowmapError::Layout`] when an edge names a node that is not
/// part of the graph.
pub fn layout(graph: &LayoutGraph, config: &LayoutConfig) -> Result<LayoutResult, FlowmapError> {
    if graph.is_empty() {
        return Ok(LayoutResult::default());
    }

    let node_count = graph.nodes.len();
    let mut edges = Vec::with_capacity(graph.edges.len());
    for edge in &graph.edges {
        let (Some(source), Some(target)) = (
            graph.nodes.get_index_of(&edge.source),
            graph.nodes.get_index_of(&edge.target),
        ) else {
            return Err(FlowmapError::Layout(format!(
                "edge {} -> {} references a node outside the layout graph",
                edge.source, edge.target
            )));
        };
        edges.push((source, target));
    }

    let components = connected_components(node_count, &edges);
    debug!(
        nodes = node_count,
        edges = edges.len(),
        components = components.len();
        "Running layered layout"
    );

    let coordinates = library_coordinates(&edges, config);

    let mut ranked = Vec::with_capacity(components.len());
    for members in &components {
        let component_edges: Vec<(usize, usize)> = edges
            .iter()
            .copied()
            .filter(|(source, _)| members.binary_search(source).is_ok())
            .collect();
        let ranks = component_ranks(graph, members, &component_edges, &coordinates);
        ranked.push(order_ranks(members, &ranks, &coordinates));
    }

    Ok(place(graph, &ranked, config))
}

/// Groups node indices into connected parts, each sorted ascending and the
/// parts ordered by their first member.
fn connected_components(node_count: usize, edges: &[(usize, usize)]) -> Vec<Vec<usize>> {
    let mut sets = UnionFind::<usize>::new(node_count);
    for &(source, target) in edges {
        sets.union(source, target);
    }

    let mut groups: IndexMap<usize, Vec<usize>> = IndexMap::new();
    for node in 0..node_count {
        groups.entry(sets.find(node)).or_default().push(node);
    }
    groups.into_values().collect()
}

/// Runs rust-sugiyama over the de-duplicated, loop-free edge list and
/// returns the raw coordinates it produced per node index.
///
/// A panic inside the library is caught and reported; the caller then
/// falls back to its own layering.
fn library_coordinates(
    edges: &[(usize, usize)],
    config: &LayoutConfig,
) -> HashMap<usize, (f64, f64)> {
    let mut unique: Vec<(u32, u32)> = Vec::with_capacity(edges.len());
    for &(source, target) in edges {
        if source == target {
            continue;
        }
        let (Ok(source), Ok(target)) = (u32::try_from(source), u32::try_from(target)) else {
            warn!("Layout graph too large for the layering library, using fallback layering");
            return HashMap::new();
        };
        if !unique.contains(&(source, target)) {
            unique.push((source, target));
        }
    }

    if unique.is_empty() {
        return HashMap::new();
    }

    let vertex_spacing = config.vertex_spacing();
    let layouts = std::panic::catch_unwind(move || {
        let config = Config {
            minimum_length: 1,
            vertex_spacing,
            ..Default::default()
        };
        rust_sugiyama::from_edges(&unique, &config)
    });

    match layouts {
        Ok(results) => {
            let mut coordinates = HashMap::new();
            for (coords, _, _) in results {
                for (id, position) in coords {
                    coordinates.insert(id, position);
                }
            }
            trace!(positioned = coordinates.len(); "Layering library finished");
            coordinates
        }
        Err(err) => {
            let message = err
                .downcast_ref::<String>()
                .cloned()
                .or_else(|| err.downcast_ref::<&str>().map(|s| s.to_string()))
                .unwrap_or_else(|| "unknown error".to_string());
            warn!(message; "Layering library panicked, using fallback layering");
            HashMap::new()
        }
    }
}

/// Decides the rank of every member of one component.
fn component_ranks(
    graph: &LayoutGraph,
    members: &[usize],
    edges: &[(usize, usize)],
    coordinates: &HashMap<usize, (f64, f64)>,
) -> BTreeMap<usize, usize> {
    let hints: Option<BTreeMap<usize, usize>> = members
        .iter()
        .map(|&index| {
            graph
                .nodes
                .get_index(index)
                .and_then(|(_, node)| node.rank)
                .map(|rank| (index, rank))
        })
        .collect();
    if let Some(hints) = hints {
        return hints;
    }

    if members.len() == 1 {
        return BTreeMap::from([(members[0], 0)]);
    }

    if members.iter().all(|index| coordinates.contains_key(index)) {
        let by_y = ranks_from_axis(members, edges, |index| coordinates[&index].1);
        let by_x = || ranks_from_axis(members, edges, |index| coordinates[&index].0);
        if let Some(ranks) = by_y.or_else(by_x) {
            return ranks;
        }
        debug!("Library coordinates do not separate connected nodes, using fallback layering");
    }

    longest_path_ranks(members, edges)
}

/// Clusters the members by one coordinate axis into layers and orients the
/// layers so that most edges point towards higher ranks.
///
/// Returns `None` if some edge joins two nodes of the same layer.
fn ranks_from_axis(
    members: &[usize],
    edges: &[(usize, usize)],
    axis: impl Fn(usize) -> f64,
) -> Option<BTreeMap<usize, usize>> {
    let mut values: Vec<f64> = members.iter().map(|&index| axis(index)).collect();
    values.sort_by(f64::total_cmp);
    values.dedup_by(|a, b| (*a - *b).abs() < LAYER_EPSILON);

    let layer_of = |value: f64| {
        values
            .iter()
            .position(|layer| (layer - value).abs() < LAYER_EPSILON)
            .unwrap_or(0)
    };
    let mut ranks: BTreeMap<usize, usize> = members
        .iter()
        .map(|&index| (index, layer_of(axis(index))))
        .collect();

    let mut forward = 0usize;
    let mut backward = 0usize;
    for &(source, target) in edges {
        if source == target {
            continue;
        }
        match ranks[&source].cmp(&ranks[&target]) {
            Ordering::Less => forward += 1,
            Ordering::Greater => backward += 1,
            Ordering::Equal => return None,
        }
    }

    if backward > forward {
        let last = values.len() - 1;
        for rank in ranks.values_mut() {
            *rank = last - *rank;
        }
    }
    Some(ranks)
}

/// Longest-path layering over the component with a greedy feedback arc
/// set removed, so cyclic input still gets ranks.
fn longest_path_ranks(members: &[usize], edges: &[(usize, usize)]) -> BTreeMap<usize, usize> {
    let mut graph = DiGraph::<usize, ()>::new();
    let nodes: BTreeMap<usize, _> = members
        .iter()
        .map(|&index| (index, graph.add_node(index)))
        .collect();
    for &(source, target) in edges {
        if source != target {
            graph.add_edge(nodes[&source], nodes[&target], ());
        }
    }

    let reversed: Vec<_> = greedy_feedback_arc_set(&graph).map(|edge| edge.id()).collect();
    graph.retain_edges(|_, edge| !reversed.contains(&edge));

    let mut ranks: BTreeMap<usize, usize> = members.iter().map(|&index| (index, 0)).collect();
    match toposort(&graph, None) {
        Ok(order) => {
            for node in order {
                let source = graph[node];
                let rank = ranks[&source];
                for edge in graph.edges(node) {
                    let target = graph[edge.target()];
                    let entry = ranks.entry(target).or_insert(0);
                    *entry = (*entry).max(rank + 1);
                }
            }
        }
        Err(_) => warn!("Fallback layering found a cycle, placing component in one rank"),
    }
    ranks
}

/// Members of one component bucketed by rank, in top-to-bottom order.
struct RankedComponent {
    columns: BTreeMap<usize, Vec<usize>>,
}

fn order_ranks(
    members: &[usize],
    ranks: &BTreeMap<usize, usize>,
    coordinates: &HashMap<usize, (f64, f64)>,
) -> RankedComponent {
    let mut columns: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for &index in members {
        columns.entry(ranks[&index]).or_default().push(index);
    }

    // The in-layer axis of the library output is x.
    for column in columns.values_mut() {
        column.sort_by(|a, b| {
            let a_pos = coordinates.get(a).map(|c| c.0);
            let b_pos = coordinates.get(b).map(|c| c.0);
            match (a_pos, b_pos) {
                (Some(a_pos), Some(b_pos)) => a_pos.total_cmp(&b_pos),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
            .then(a.cmp(b))
        });
    }

    RankedComponent { columns }
}

fn place(
    graph: &LayoutGraph,
    components: &[RankedComponent],
    config: &LayoutConfig,
) -> LayoutResult {
    let gap = graph
        .edges
        .iter()
        .map(|edge| edge.footprint.width())
        .fold(config.rank_spacing(), f32::max);

    let mut placements: Vec<Option<NodePlacement>> = vec![None; graph.nodes.len()];
    let mut all_columns = Vec::with_capacity(components.len());
    let mut top = 0.0f32;
    let mut extent = Bounds::default();

    for (component_index, component) in components.iter().enumerate() {
        let rank_count = component.columns.keys().next_back().map_or(0, |last| last + 1);
        let node_size = |index: usize| {
            graph
                .nodes
                .get_index(index)
                .map(|(_, node)| node.size)
                .unwrap_or_default()
        };

        let mut spans = Vec::with_capacity(rank_count);
        let mut left = 0.0f32;
        for rank in 0..rank_count {
            let width = component
                .columns
                .get(&rank)
                .map(|column| {
                    column
                        .iter()
                        .map(|&index| node_size(index).width())
                        .fold(0.0, f32::max)
                })
                .unwrap_or(0.0);
            spans.push(ColumnSpan {
                left,
                right: left + width,
            });
            left += width + gap;
        }

        let column_height = |column: &[usize]| {
            let nodes: f32 = column.iter().map(|&index| node_size(index).height()).sum();
            nodes + config.node_spacing() * column.len().saturating_sub(1) as f32
        };
        let component_height = component
            .columns
            .values()
            .map(|column| column_height(column))
            .fold(0.0, f32::max);

        for (&rank, column) in &component.columns {
            let span = spans[rank];
            let center_x = (span.left + span.right) / 2.0;
            let mut y = top + (component_height - column_height(column)) / 2.0;
            for &index in column {
                let size = node_size(index);
                let placement = NodePlacement {
                    center: Point::new(center_x, y + size.height() / 2.0),
                    size,
                    rank,
                    component: component_index,
                };
                extent = extent.merge(&placement.bounds());
                placements[index] = Some(placement);
                y += size.height() + config.node_spacing();
            }
        }

        all_columns.push(spans);
        top += component_height + config.component_spacing();
    }

    let placements = graph
        .nodes
        .keys()
        .zip(placements)
        .filter_map(|(id, placement)| placement.map(|placement| (*id, placement)))
        .collect();

    LayoutResult {
        placements,
        columns: all_columns,
        size: Size::new(extent.max_x().max(0.0), extent.max_y().max(0.0)),
    }
}
