//! Date windows of the variant tree.
//!
//! A variant's *effective* window fills its missing bounds from the
//! enclosing window and is clipped to it. The enclosing window of a
//! top-level variant is the span of every date declared at the top level;
//! the enclosing window of a nested variant is the effective window of the
//! variant whose node it belongs to.

use chrono::NaiveDate;

use flowmap_core::{
    identifier::Id,
    semantic::{DateRange, FlowDiagram},
};

use super::PathElement;
use crate::error::FlowmapError;

/// Span of all dates declared by `variants`, unbounded where none are.
pub(crate) fn declared_span(variants: &[FlowDiagram]) -> DateRange {
    let dates: Vec<NaiveDate> = variants
        .iter()
        .flat_map(|variant| [variant.start_date, variant.end_date])
        .flatten()
        .collect();
    let start = dates.iter().min().copied().unwrap_or(NaiveDate::MIN);
    let end = dates.iter().max().copied().unwrap_or(NaiveDate::MAX);
    DateRange::new(start, end).unwrap_or_else(DateRange::unbounded)
}

/// Fills missing bounds of `variant` from `enclosing` and clips to it.
///
/// Returns `None` for an inverted window or one outside `enclosing`.
pub(crate) fn effective_window(variant: &FlowDiagram, enclosing: DateRange) -> Option<DateRange> {
    let start = variant.start_date.unwrap_or(enclosing.start());
    let end = variant.end_date.unwrap_or(enclosing.end());
    DateRange::new(start, end)?.intersect(&enclosing)
}

/// Candidate variants at one path depth with their effective windows.
#[derive(Debug, Clone)]
pub(crate) struct Level<'a> {
    pub node: Option<Id>,
    pub candidates: Vec<(&'a FlowDiagram, DateRange)>,
}

impl<'a> Level<'a> {
    /// Index of the first candidate whose window contains `date`.
    pub fn select(&self, date: NaiveDate) -> Option<usize> {
        self.candidates
            .iter()
            .position(|(_, window)| window.contains(date))
    }

    pub fn variant(&self, index: usize) -> Option<&'a FlowDiagram> {
        self.candidates.get(index).map(|(variant, _)| *variant)
    }

    pub fn to_element(&self) -> Option<PathElement> {
        let (first, _) = self.candidates.first()?;
        Some(PathElement::new(
            self.node,
            first.id,
            first.display_title(),
            self.candidates.iter().map(|(_, window)| *window).collect(),
        ))
    }
}

/// Walks the variant tree from the root along `nodes`.
///
/// Level `k + 1` collects the subdiagram variants of node `nodes[k]` from
/// every candidate of level `k` that has it. The walk stops early at the
/// first level with no candidates, so a result shorter than
/// `nodes.len() + 1` means the path does not exist.
pub(crate) fn walk<'a>(
    variants: &'a [FlowDiagram],
    global: DateRange,
    nodes: &[Id],
) -> Vec<Level<'a>> {
    let root = Level {
        node: None,
        candidates: variants
            .iter()
            .filter_map(|variant| effective_window(variant, global).map(|window| (variant, window)))
            .collect(),
    };
    if root.candidates.is_empty() {
        return Vec::new();
    }

    let mut levels = vec![root];
    for &node_id in nodes {
        let Some(parent) = levels.last() else {
            break;
        };
        let mut candidates = Vec::new();
        for &(variant, window) in &parent.candidates {
            let Some(subdiagram) = variant
                .node(node_id)
                .and_then(|node| node.subdiagram.as_ref())
            else {
                continue;
            };
            for nested in subdiagram.as_slice() {
                if let Some(nested_window) = effective_window(nested, window) {
                    candidates.push((nested, nested_window));
                }
            }
        }
        if candidates.is_empty() {
            break;
        }
        levels.push(Level {
            node: Some(node_id),
            candidates,
        });
    }
    levels
}

/// Checks every sibling scope of the variant tree.
///
/// # Errors
///
/// Returns [`FlowmapError::InvalidWindow`] for a window ending before it
/// starts, or [`FlowmapError::OverlappingVariants`] when two siblings claim
/// the same day.
pub(crate) fn validate(variants: &[FlowDiagram], scope: &str) -> Result<(), FlowmapError> {
    for variant in variants {
        if let (Some(start), Some(end)) = (variant.start_date, variant.end_date) {
            if start > end {
                return Err(FlowmapError::InvalidWindow {
                    diagram: variant.id,
                });
            }
        }
    }

    let span = declared_span(variants);
    let windows: Vec<(Id, Option<DateRange>)> = variants
        .iter()
        .map(|variant| (variant.id, effective_window(variant, span)))
        .collect();
    for (index, (first, window)) in windows.iter().enumerate() {
        let Some(window) = window else {
            continue;
        };
        for (second, other) in &windows[index + 1..] {
            if other.is_some_and(|other| window.overlaps(&other)) {
                return Err(FlowmapError::OverlappingVariants {
                    scope: scope.to_string(),
                    first: *first,
                    second: *second,
                });
            }
        }
    }

    for variant in variants {
        for node in &variant.nodes {
            if let Some(subdiagram) = &node.subdiagram {
                let scope = format!("the subdiagram of node `{}` in `{}`", node.id, variant.id);
                validate(subdiagram.as_slice(), &scope)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use flowmap_core::semantic::{DiagramVariants, Node};

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dated(id: &str, start: Option<NaiveDate>, end: Option<NaiveDate>) -> FlowDiagram {
        FlowDiagram::new(id).with_window(start, end)
    }

    #[test]
    fn test_declared_span_covers_all_bounds() {
        let variants = vec![
            dated("a", None, Some(date(2019, 12, 31))),
            dated("a", Some(date(2020, 1, 1)), None),
        ];
        let span = declared_span(&variants);
        assert_eq!(span.start(), date(2019, 12, 31));
        assert_eq!(span.end(), date(2020, 1, 1));

        assert_eq!(declared_span(&[FlowDiagram::new("x")]), DateRange::unbounded());
    }

    #[test]
    fn test_missing_bounds_are_inherited() {
        let enclosing = DateRange::new(date(2020, 1, 1), date(2020, 12, 31)).unwrap();
        let open_end = dated("a", Some(date(2020, 3, 1)), None);
        assert_eq!(
            effective_window(&open_end, enclosing),
            DateRange::new(date(2020, 3, 1), date(2020, 12, 31))
        );

        let outside = dated("b", Some(date(2021, 1, 1)), None);
        assert_eq!(effective_window(&outside, enclosing), None);
    }

    #[test]
    fn test_walk_stops_at_missing_subdiagram() {
        let inner = FlowDiagram::new("inner").with_node(Node::new("leaf"));
        let root = FlowDiagram::new("root")
            .with_node(Node::new("unit").with_subdiagram(DiagramVariants::from(inner)))
            .with_node(Node::new("plain"));
        let variants = vec![root];
        let global = declared_span(&variants);

        assert_eq!(walk(&variants, global, &[Id::new("unit")]).len(), 2);
        assert_eq!(walk(&variants, global, &[Id::new("plain")]).len(), 1);
        assert_eq!(walk(&variants, global, &[Id::new("unit"), Id::new("leaf")]).len(), 2);
    }

    #[test]
    fn test_nested_windows_are_clipped_to_parent() {
        let nested = dated("inner", Some(date(2019, 1, 1)), Some(date(2020, 3, 31)));
        let root = dated("root", Some(date(2020, 1, 1)), Some(date(2020, 12, 31))).with_node(
            Node::new("unit").with_subdiagram(DiagramVariants::from(nested)),
        );
        let variants = vec![root];
        let levels = walk(&variants, declared_span(&variants), &[Id::new("unit")]);

        let element = levels[1].to_element().unwrap();
        assert_eq!(
            element.timeframes(),
            &[DateRange::new(date(2020, 1, 1), date(2020, 3, 31)).unwrap()]
        );
    }

    #[test]
    fn test_validate_rejects_inverted_window() {
        let variants = vec![dated("a", Some(date(2020, 2, 1)), Some(date(2020, 1, 1)))];
        assert!(matches!(
            validate(&variants, "the top level"),
            Err(FlowmapError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_overlapping_siblings() {
        let variants = vec![
            dated("a", Some(date(2020, 1, 1)), Some(date(2020, 6, 30))),
            dated("a", Some(date(2020, 6, 30)), Some(date(2020, 12, 31))),
        ];
        assert!(matches!(
            validate(&variants, "the top level"),
            Err(FlowmapError::OverlappingVariants { .. })
        ));
    }

    #[test]
    fn test_validate_checks_nested_scopes() {
        let nested = DiagramVariants::from(vec![FlowDiagram::new("n"), FlowDiagram::new("n")]);
        let variants =
            vec![FlowDiagram::new("root").with_node(Node::new("unit").with_subdiagram(nested))];
        let err = validate(&variants, "the top level").unwrap_err();
        assert!(err.to_string().contains("unit"));
    }

    #[test]
    fn test_validate_accepts_adjacent_windows() {
        let variants = vec![
            dated("site", Some(date(2020, 1, 1)), Some(date(2020, 6, 30))),
            dated("site", Some(date(2020, 7, 1)), Some(date(2020, 12, 31))),
        ];
        assert!(validate(&variants, "the top level").is_ok());
    }
}
