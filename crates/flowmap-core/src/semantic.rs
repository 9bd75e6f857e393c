//! Input data model of flow diagrams.
//!
//! A [`FlowDiagram`] is one dated *variant* of a logical diagram: its nodes,
//! the flows (commodities) that connect them and the edges carrying those
//! flows. Several variants may share an id and partition time between them
//! through their optional validity window. Nodes can nest further variant
//! sets as their subdiagram.
//!
//! All types deserialize from JSON shaped like:
//!
//! ```json
//! {
//!   "id": "site",
//!   "title": "Main site",
//!   "startDate": "2020-01-01",
//!   "endDate": "2020-06-30",
//!   "nodes": [{ "id": "boiler", "category": "equipment" }],
//!   "flows": [{ "id": "steam", "label": "Steam" }],
//!   "edges": [{ "fromNode": "boiler", "toNode": "turbine", "flow": "steam" }]
//! }
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::identifier::Id;

/// One dated variant of a diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDiagram {
    pub id: Id,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub flows: Vec<Flow>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl FlowDiagram {
    pub fn new(id: &str) -> Self {
        Self {
            id: Id::new(id),
            title: String::new(),
            start_date: None,
            end_date: None,
            nodes: Vec::new(),
            flows: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    /// Sets the inclusive validity window. Either bound may be open.
    pub fn with_window(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn with_flow(mut self, flow: Flow) -> Self {
        self.flows.push(flow);
        self
    }

    pub fn with_edge(mut self, edge: Edge) -> Self {
        self.edges.push(edge);
        self
    }

    pub fn node(&self, id: Id) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn flow(&self, id: Id) -> Option<&Flow> {
        self.flows.iter().find(|flow| flow.id == id)
    }

    /// Title for display, falling back to the id.
    pub fn display_title(&self) -> String {
        if self.title.is_empty() {
            self.id.to_string()
        } else {
            self.title.clone()
        }
    }
}

/// A node (installation or piece of equipment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdiagram: Option<DiagramVariants>,
}

impl Node {
    pub fn new(id: &str) -> Self {
        Self {
            id: Id::new(id),
            title: None,
            category: None,
            subdiagram: None,
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(Id::new(category));
        self
    }

    pub fn with_subdiagram(mut self, subdiagram: DiagramVariants) -> Self {
        self.subdiagram = Some(subdiagram);
        self
    }

    /// A node with a subdiagram can be drilled into.
    pub fn is_expandable(&self) -> bool {
        self.subdiagram
            .as_ref()
            .is_some_and(|variants| !variants.as_slice().is_empty())
    }

    pub fn display_title(&self) -> String {
        self.title.clone().unwrap_or_else(|| self.id.to_string())
    }
}

/// A commodity or relationship category shared by edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    pub id: Id,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Id>,
}

impl Flow {
    pub fn new(id: &str, label: &str) -> Self {
        Self {
            id: Id::new(id),
            label: label.to_string(),
            category: None,
        }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(Id::new(category));
        self
    }
}

/// Directed edge carrying one flow between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub from_node: Id,
    pub to_node: Id,
    pub flow: Id,
}

impl Edge {
    pub fn new(from_node: &str, to_node: &str, flow: &str) -> Self {
        Self {
            from_node: Id::new(from_node),
            to_node: Id::new(to_node),
            flow: Id::new(flow),
        }
    }
}

/// Either one diagram or an ordered list of dated variants.
///
/// Used for node subdiagrams and for top-level input files alike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiagramVariants {
    Single(Box<FlowDiagram>),
    Variants(Vec<FlowDiagram>),
}

impl DiagramVariants {
    pub fn as_slice(&self) -> &[FlowDiagram] {
        match self {
            Self::Single(diagram) => std::slice::from_ref(diagram.as_ref()),
            Self::Variants(variants) => variants,
        }
    }

    pub fn into_vec(self) -> Vec<FlowDiagram> {
        match self {
            Self::Single(diagram) => vec![*diagram],
            Self::Variants(variants) => variants,
        }
    }
}

impl From<FlowDiagram> for DiagramVariants {
    fn from(diagram: FlowDiagram) -> Self {
        Self::Single(Box::new(diagram))
    }
}

impl From<Vec<FlowDiagram>> for DiagramVariants {
    fn from(variants: Vec<FlowDiagram>) -> Self {
        Self::Variants(variants)
    }
}

/// Inclusive date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Creates a window, returning `None` when `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// The window covering every representable date.
    pub fn unbounded() -> Self {
        Self {
            start: NaiveDate::MIN,
            end: NaiveDate::MAX,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn intersect(&self, other: &Self) -> Option<Self> {
        Self::new(self.start.max(other.start), self.end.min(other.end))
    }

    /// Smallest window covering both.
    pub fn span(&self, other: &Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_deserialize_diagram() {
        let json = r#"{
            "id": "site",
            "title": "Site",
            "startDate": "2020-01-01",
            "nodes": [
                {"id": "a", "title": "Boiler", "category": "equipment"},
                {"id": "b", "subdiagram": {"id": "b-inner"}}
            ],
            "flows": [{"id": "steam", "label": "Steam"}],
            "edges": [{"fromNode": "a", "toNode": "b", "flow": "steam"}]
        }"#;
        let diagram: FlowDiagram = serde_json::from_str(json).unwrap();

        assert_eq!(diagram.id, "site");
        assert_eq!(diagram.start_date, Some(date(2020, 1, 1)));
        assert_eq!(diagram.end_date, None);
        assert_eq!(diagram.nodes.len(), 2);
        assert_eq!(diagram.nodes[0].category, Some(Id::new("equipment")));
        assert!(!diagram.nodes[0].is_expandable());
        assert!(diagram.nodes[1].is_expandable());
        assert_eq!(diagram.edges[0], Edge::new("a", "b", "steam"));
    }

    #[test]
    fn test_variants_accept_object_or_array() {
        let single: DiagramVariants = serde_json::from_str(r#"{"id": "x"}"#).unwrap();
        assert_eq!(single.as_slice().len(), 1);

        let many: DiagramVariants =
            serde_json::from_str(r#"[{"id": "x"}, {"id": "x", "startDate": "2021-01-01"}]"#)
                .unwrap();
        assert_eq!(many.as_slice().len(), 2);
        assert_eq!(many.into_vec()[1].start_date, Some(date(2021, 1, 1)));
    }

    #[test]
    fn test_empty_variant_list_is_not_expandable() {
        let node = Node::new("n").with_subdiagram(DiagramVariants::Variants(Vec::new()));
        assert!(!node.is_expandable());
    }

    #[test]
    fn test_builders_and_lookup() {
        let diagram = FlowDiagram::new("plant")
            .with_node(Node::new("a").with_title("Intake"))
            .with_flow(Flow::new("water", "Water").with_category("liquid"));

        assert_eq!(diagram.display_title(), "plant");
        assert_eq!(diagram.node(Id::new("a")).unwrap().display_title(), "Intake");
        assert!(diagram.node(Id::new("zz")).is_none());
        assert_eq!(
            diagram.flow(Id::new("water")).unwrap().category,
            Some(Id::new("liquid"))
        );
    }

    #[test]
    fn test_date_range() {
        assert!(DateRange::new(date(2020, 2, 1), date(2020, 1, 1)).is_none());

        let h1 = DateRange::new(date(2020, 1, 1), date(2020, 6, 30)).unwrap();
        let h2 = DateRange::new(date(2020, 7, 1), date(2020, 12, 31)).unwrap();

        assert!(h1.contains(date(2020, 1, 1)));
        assert!(h1.contains(date(2020, 6, 30)));
        assert!(!h1.contains(date(2020, 7, 1)));
        assert!(!h1.overlaps(&h2));
        assert!(h1.intersect(&h2).is_none());

        let year = h1.span(&h2);
        assert_eq!(year.start(), date(2020, 1, 1));
        assert_eq!(year.end(), date(2020, 12, 31));
        assert_eq!(year.intersect(&h2), Some(h2));
        assert!(DateRange::unbounded().contains(date(1900, 1, 1)));
    }
}
