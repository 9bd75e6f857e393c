//! Time and drill-down navigation.
//!
//! A [`Navigator`] turns a set of dated diagram variants into an immutable
//! [`NavigationState`]: the drill-down path, the current date and the
//! [`Diagram`] of the variant active at that date. Every user action is a
//! [`Transition`] applied with [`Navigator::apply`], which returns the next
//! state and never touches the previous one.
//!
//! Invalid requests (descending into a node without a subdiagram, ascending
//! to an id that is not on the path) are no-ops: the returned state shares
//! every allocation with the input state.
//!
//! ```
//! use flowmap::navigation::{Navigator, Transition};
//! use flowmap_core::{identifier::Id, semantic::{FlowDiagram, Node}};
//!
//! let navigator = Navigator::default();
//! let root = FlowDiagram::new("plant").with_node(Node::new("boiler"));
//! let state = navigator.init(vec![root]).unwrap();
//! assert!(state.diagram().is_some());
//!
//! // The boiler has no subdiagram, so this is a no-op.
//! let next = navigator.apply(&state, Transition::Descend(Id::new("boiler"))).unwrap();
//! assert!(next.ptr_eq(&state));
//! ```

mod state;
mod timeframe;

use std::sync::Arc;

use chrono::NaiveDate;
use log::{debug, info};

use flowmap_core::{
    identifier::Id,
    semantic::{DateRange, FlowDiagram},
};

pub use state::{NavigationState, PathElement};

use crate::{
    config::LayoutConfig, drawer::compute_diagram, error::FlowmapError, primitive::Diagram,
    render::RenderRegistry, style::StyleRegistry,
};

use timeframe::Level;

/// A navigation request.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Drill into the subdiagram of a node of the displayed diagram.
    Descend(Id),
    /// Return to a level above the current one, named by the node that was
    /// descended into, or by the root diagram id.
    AscendTo(Id),
    ChangeDate(NaiveDate),
    /// Replace all variants and start over at the root.
    ReplaceDiagramSet(Vec<FlowDiagram>),
}

/// Applies transitions and computes the diagrams they lead to.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    config: LayoutConfig,
    renders: RenderRegistry,
    styles: StyleRegistry,
}

impl Navigator {
    pub fn new(config: LayoutConfig, renders: RenderRegistry, styles: StyleRegistry) -> Self {
        Self {
            config,
            renders,
            styles,
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn styles(&self) -> &StyleRegistry {
        &self.styles
    }

    /// Validates `variants` and builds the state at the root, dated at the
    /// earliest declared date.
    ///
    /// # Errors
    ///
    /// Returns [`FlowmapError::InvalidWindow`] or
    /// [`FlowmapError::OverlappingVariants`] for an inconsistent variant
    /// tree, or any error of [`compute_diagram`].
    pub fn init(&self, variants: Vec<FlowDiagram>) -> Result<NavigationState, FlowmapError> {
        timeframe::validate(&variants, "the top level")?;

        let variants: Arc<[FlowDiagram]> = variants.into();
        let global = timeframe::declared_span(&variants);
        let date = global.start();
        info!(variants = variants.len(), date:% = date; "Initializing navigation");

        let levels = timeframe::walk(&variants, global, &[]);
        let (path, timeframe, diagram) = self.resolve(&levels, date)?;
        Ok(NavigationState {
            variants: Arc::clone(&variants),
            global,
            path,
            date,
            timeframe,
            diagram,
        })
    }

    /// Applies one transition to `state`.
    ///
    /// # Errors
    ///
    /// Returns an error only for an invalid replacement variant set or a
    /// failing diagram computation; `state` stays valid either way.
    pub fn apply(
        &self,
        state: &NavigationState,
        transition: Transition,
    ) -> Result<NavigationState, FlowmapError> {
        debug!(transition:? = transition; "Applying navigation transition");
        match transition {
            Transition::Descend(node) => self.descend(state, node),
            Transition::AscendTo(target) => self.ascend_to(state, target),
            Transition::ChangeDate(date) => self.change_date(state, date),
            Transition::ReplaceDiagramSet(variants) => self.init(variants),
        }
    }

    /// Appends `node` to the path if the displayed diagram has it and it
    /// has a subdiagram; otherwise returns `state` unchanged.
    pub fn descend(
        &self,
        state: &NavigationState,
        node: Id,
    ) -> Result<NavigationState, FlowmapError> {
        let mut nodes = state.node_path();
        let levels = timeframe::walk(&state.variants, state.global, &nodes);
        let displayed = state
            .timeframe
            .and_then(|index| levels.last()?.variant(index));
        let expandable = displayed
            .and_then(|variant| variant.node(node))
            .is_some_and(|found| found.is_expandable());
        if !expandable {
            debug!(node:% = node; "Ignoring descend into a node without subdiagram");
            return Ok(state.clone());
        }

        nodes.push(node);
        let levels = timeframe::walk(&state.variants, state.global, &nodes);
        if levels.len() != nodes.len() + 1 {
            debug!(node:% = node; "Ignoring descend along a path that does not resolve");
            return Ok(state.clone());
        }

        info!(node:% = node, depth = nodes.len(); "Descending");
        self.rebuild(state, &levels, state.date)
    }

    /// Truncates the path so it ends at the level entered through `target`,
    /// or at the root when `target` is the root diagram id. The deepest
    /// level is not a valid target.
    pub fn ascend_to(
        &self,
        state: &NavigationState,
        target: Id,
    ) -> Result<NavigationState, FlowmapError> {
        let path = state.path();
        let above = path.len().saturating_sub(1);
        let keep = path[..above].iter().rposition(|element| match element.node() {
            Some(node) => node == target,
            None => element.id() == target,
        });
        let Some(keep) = keep else {
            debug!(target:% = target; "Ignoring ascend to an id not above the current level");
            return Ok(state.clone());
        };

        let nodes: Vec<Id> = path[1..=keep].iter().filter_map(PathElement::node).collect();
        info!(target:% = target, depth = nodes.len(); "Ascending");
        let levels = timeframe::walk(&state.variants, state.global, &nodes);
        self.rebuild(state, &levels, state.date)
    }

    /// Moves to `date`, recomputing the diagram only when the date falls
    /// into a different window of the current level.
    pub fn change_date(
        &self,
        state: &NavigationState,
        date: NaiveDate,
    ) -> Result<NavigationState, FlowmapError> {
        let timeframe = state
            .selectable_ranges()
            .iter()
            .position(|window| window.contains(date));
        if timeframe == state.timeframe {
            debug!(date:% = date; "Date stays in the active window");
            return Ok(NavigationState {
                date,
                ..state.clone()
            });
        }

        info!(date:% = date, from:? = state.timeframe, to:? = timeframe; "Switching variant");
        let levels = timeframe::walk(&state.variants, state.global, &state.node_path());
        let (path, timeframe, diagram) = self.resolve(&levels, date)?;
        Ok(NavigationState {
            path,
            date,
            timeframe,
            diagram,
            ..state.clone()
        })
    }

    fn rebuild(
        &self,
        state: &NavigationState,
        levels: &[Level<'_>],
        date: NaiveDate,
    ) -> Result<NavigationState, FlowmapError> {
        let (path, timeframe, diagram) = self.resolve(levels, date)?;
        Ok(NavigationState {
            path,
            date,
            timeframe,
            diagram,
            ..state.clone()
        })
    }

    /// Path elements, active window and diagram for `levels` at `date`.
    #[allow(clippy::type_complexity)]
    fn resolve(
        &self,
        levels: &[Level<'_>],
        date: NaiveDate,
    ) -> Result<(Arc<[PathElement]>, Option<usize>, Option<Arc<Diagram>>), FlowmapError> {
        let path: Arc<[PathElement]> = levels.iter().filter_map(Level::to_element).collect();
        let deepest = levels.last();
        let timeframe = deepest.and_then(|level| level.select(date));

        let diagram = match timeframe.and_then(|index| deepest?.variant(index)) {
            Some(variant) => Some(Arc::new(compute_diagram(
                variant,
                &self.config,
                &self.renders,
                &self.styles,
            )?)),
            None => {
                debug!(date:% = date; "No variant covers the date");
                None
            }
        };
        Ok((path, timeframe, diagram))
    }
}

/// The variant of `variants` active at `date`, first match in declaration
/// order, using the same window rules as navigation.
pub fn select_variant(variants: &[FlowDiagram], date: NaiveDate) -> Option<&FlowDiagram> {
    let global: DateRange = timeframe::declared_span(variants);
    let levels = timeframe::walk(variants, global, &[]);
    let root = levels.first()?;
    root.select(date).and_then(|index| root.variant(index))
}

#[cfg(test)]
mod tests {
    use flowmap_core::semantic::{DiagramVariants, Edge, Flow, Node};

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn nested_plant() -> Vec<FlowDiagram> {
        let turbine_hall = FlowDiagram::new("turbine-hall")
            .with_title("Turbine hall")
            .with_node(Node::new("t1"))
            .with_node(Node::new("t2"))
            .with_flow(Flow::new("steam", "Steam"))
            .with_edge(Edge::new("t1", "t2", "steam"));
        let boiler_house = FlowDiagram::new("boiler-house")
            .with_node(Node::new("hall").with_subdiagram(DiagramVariants::from(turbine_hall)))
            .with_node(Node::new("b1"));
        vec![
            FlowDiagram::new("plant")
                .with_title("Plant")
                .with_node(Node::new("house").with_subdiagram(DiagramVariants::from(boiler_house)))
                .with_node(Node::new("stack")),
        ]
    }

    #[test]
    fn test_init_starts_at_root() {
        let state = Navigator::default().init(nested_plant()).unwrap();
        assert_eq!(state.path().len(), 1);
        assert_eq!(state.path()[0].title(), "Plant");
        assert_eq!(state.path()[0].node(), None);
        assert_eq!(state.active_timeframe(), Some(0));
        assert!(state.diagram().is_some());
    }

    #[test]
    fn test_descend_twice_then_ascend_to_root() {
        let navigator = Navigator::default();
        let state = navigator.init(nested_plant()).unwrap();
        let state = navigator.apply(&state, Transition::Descend(Id::new("house"))).unwrap();
        let state = navigator.apply(&state, Transition::Descend(Id::new("hall"))).unwrap();
        assert_eq!(state.node_path(), vec![Id::new("house"), Id::new("hall")]);
        assert_eq!(state.path()[2].title(), "Turbine hall");
        assert!(state.diagram().unwrap().node_primitive(Id::new("t1")).is_some());

        let up = navigator.apply(&state, Transition::AscendTo(Id::new("plant"))).unwrap();
        assert_eq!(up.path().len(), 1);
        assert!(up.diagram().unwrap().node_primitive(Id::new("stack")).is_some());
    }

    #[test]
    fn test_ascend_to_intermediate_level() {
        let navigator = Navigator::default();
        let state = navigator.init(nested_plant()).unwrap();
        let state = navigator.descend(&state, Id::new("house")).unwrap();
        let state = navigator.descend(&state, Id::new("hall")).unwrap();

        let up = navigator.ascend_to(&state, Id::new("house")).unwrap();
        assert_eq!(up.node_path(), vec![Id::new("house")]);
        assert!(up.diagram().unwrap().node_primitive(Id::new("b1")).is_some());
    }

    #[test]
    fn test_ascend_to_deepest_level_is_noop() {
        let navigator = Navigator::default();
        let state = navigator.init(nested_plant()).unwrap();
        let state = navigator.descend(&state, Id::new("house")).unwrap();

        let same = navigator.ascend_to(&state, Id::new("house")).unwrap();
        assert!(same.ptr_eq(&state));
        let unknown = navigator.ascend_to(&state, Id::new("nowhere")).unwrap();
        assert!(unknown.ptr_eq(&state));
    }

    #[test]
    fn test_descend_requires_displayed_node() {
        let navigator = Navigator::default();
        let state = navigator.init(nested_plant()).unwrap();
        // `hall` exists one level down, not in the displayed diagram.
        let next = navigator.descend(&state, Id::new("hall")).unwrap();
        assert!(next.ptr_eq(&state));
    }

    #[test]
    fn test_replace_diagram_set_resets_path() {
        let navigator = Navigator::default();
        let state = navigator.init(nested_plant()).unwrap();
        let state = navigator.descend(&state, Id::new("house")).unwrap();

        let replacement = vec![FlowDiagram::new("other").with_node(Node::new("solo"))];
        let next = navigator
            .apply(&state, Transition::ReplaceDiagramSet(replacement))
            .unwrap();
        assert_eq!(next.path().len(), 1);
        assert_eq!(next.path()[0].id(), Id::new("other"));
    }

    #[test]
    fn test_replace_with_overlapping_variants_fails() {
        let navigator = Navigator::default();
        let state = navigator.init(nested_plant()).unwrap();
        let overlapping = vec![FlowDiagram::new("x"), FlowDiagram::new("x")];
        let result = navigator.apply(&state, Transition::ReplaceDiagramSet(overlapping));
        assert!(matches!(result, Err(FlowmapError::OverlappingVariants { .. })));
        assert!(state.diagram().is_some());
    }

    #[test]
    fn test_empty_variant_set() {
        let state = Navigator::default().init(Vec::new()).unwrap();
        assert!(state.path().is_empty());
        assert!(state.diagram().is_none());
        assert!(state.selectable_ranges().is_empty());
    }

    #[test]
    fn test_select_variant_first_match() {
        let variants = vec![
            FlowDiagram::new("v").with_window(None, Some(date(2020, 6, 30))),
            FlowDiagram::new("v").with_window(Some(date(2020, 7, 1)), None),
        ];
        let early = select_variant(&variants, date(2020, 6, 30)).unwrap();
        assert_eq!(early.end_date, Some(date(2020, 6, 30)));
        let late = select_variant(&variants, date(2020, 7, 1)).unwrap();
        assert_eq!(late.start_date, Some(date(2020, 7, 1)));
        assert!(select_variant(&variants, date(2021, 1, 1)).is_none());
    }
}
