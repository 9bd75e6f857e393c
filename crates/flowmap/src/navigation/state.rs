use std::sync::Arc;

use chrono::NaiveDate;

use flowmap_core::{
    identifier::Id,
    semantic::{DateRange, FlowDiagram},
};

use crate::primitive::Diagram;

/// One entry of the drill-down trail.
#[derive(Debug, Clone, PartialEq)]
pub struct PathElement {
    node: Option<Id>,
    id: Id,
    title: String,
    timeframes: Vec<DateRange>,
}

impl PathElement {
    pub(crate) fn new(node: Option<Id>, id: Id, title: String, timeframes: Vec<DateRange>) -> Self {
        Self {
            node,
            id,
            title,
            timeframes,
        }
    }

    /// The node descended into to reach this level; `None` at the root.
    pub fn node(&self) -> Option<Id> {
        self.node
    }

    /// Id of the diagram variants at this level.
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Effective windows of every variant reachable at this level.
    pub fn timeframes(&self) -> &[DateRange] {
        &self.timeframes
    }
}

/// Immutable navigation state.
///
/// Transitions never modify a state; they return a new one. Parts that a
/// transition leaves unchanged are shared with the previous state, which
/// [`NavigationState::ptr_eq`] exposes.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationState {
    pub(super) variants: Arc<[FlowDiagram]>,
    pub(super) global: DateRange,
    pub(super) path: Arc<[PathElement]>,
    pub(super) date: NaiveDate,
    pub(super) timeframe: Option<usize>,
    pub(super) diagram: Option<Arc<Diagram>>,
}

impl NavigationState {
    /// Current drill-down trail, root first.
    pub fn path(&self) -> &[PathElement] {
        &self.path
    }

    /// Node ids descended through, excluding the root.
    pub fn node_path(&self) -> Vec<Id> {
        self.path.iter().filter_map(PathElement::node).collect()
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Span of all dates declared by the top-level variants.
    pub fn global_range(&self) -> DateRange {
        self.global
    }

    /// Windows selectable at the current depth.
    pub fn selectable_ranges(&self) -> &[DateRange] {
        self.path
            .last()
            .map(PathElement::timeframes)
            .unwrap_or_default()
    }

    /// Index into [`selectable_ranges`](Self::selectable_ranges) of the
    /// window containing the current date.
    pub fn active_timeframe(&self) -> Option<usize> {
        self.timeframe
    }

    /// The computed diagram, or `None` when no variant covers the date.
    pub fn diagram(&self) -> Option<&Diagram> {
        self.diagram.as_deref()
    }

    pub fn variants(&self) -> &[FlowDiagram] {
        &self.variants
    }

    /// True when both states share the same path and diagram allocations
    /// and have the same date.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        let same_diagram = match (&self.diagram, &other.diagram) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        Arc::ptr_eq(&self.path, &other.path) && self.date == other.date && same_diagram
    }
}
