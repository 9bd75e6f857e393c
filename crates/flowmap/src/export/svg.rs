//! Standalone SVG output.
//!
//! Primitive payloads are SVG fragments in local coordinates. The document
//! places each one inside a group translated to its box, stacked by z-order
//! (stable, so primitives of equal z-order keep their emission order).
//! Flow definitions carry arrowhead markers and go into `<defs>`.

use std::{fs, path::PathBuf};

use log::{debug, error, info};
use svg::node::element as svg_element;

use flowmap_core::{color::Color, geometry::Size};

use super::Exporter;
use crate::{
    error::FlowmapError,
    primitive::{Diagram, Primitive, PrimitiveKind},
    style::StyleRegistry,
};

const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// SVG exporter writing one document per diagram.
#[derive(Debug, Clone)]
pub struct Svg {
    file_name: PathBuf,
    background: Color,
    margin: f32,
}

impl Svg {
    pub fn new(file_name: impl Into<PathBuf>, styles: &StyleRegistry) -> Self {
        Self {
            file_name: file_name.into(),
            background: styles.background(),
            margin: 20.0,
        }
    }

    /// Sets the blank border drawn around the diagram.
    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin.max(0.0);
        self
    }

    /// Renders `diagram` into a complete SVG document.
    pub fn render_diagram(&self, diagram: &Diagram) -> String {
        let content = diagram.size();
        let size = Size::new(
            content.width() + 2.0 * self.margin,
            content.height() + 2.0 * self.margin,
        );
        debug!(width = size.width(), height = size.height(); "SVG dimensions");

        let mut out = format!(
            r#"<svg xmlns="{SVG_NAMESPACE}" viewBox="0 0 {w} {h}" width="{w}" height="{h}">"#,
            w = size.width(),
            h = size.height(),
        );

        let background = svg_element::Rectangle::new()
            .set("x", 0)
            .set("y", 0)
            .set("width", size.width())
            .set("height", size.height())
            .set("fill", self.background.to_string())
            .set("fill-opacity", self.background.alpha());
        out.push_str(&background.to_string());

        out.push_str("<defs>");
        for primitive in diagram
            .primitives()
            .iter()
            .filter(|primitive| primitive.kind() == PrimitiveKind::FlowDefinition)
        {
            out.push_str(primitive.payload());
        }
        out.push_str("</defs>");

        let mut drawn: Vec<&Primitive> = diagram
            .primitives()
            .iter()
            .filter(|primitive| primitive.kind() != PrimitiveKind::FlowDefinition)
            .collect();
        drawn.sort_by_key(|primitive| primitive.z_order());

        out.push_str(&format!(
            r#"<g transform="translate({m}, {m})">"#,
            m = self.margin
        ));
        for primitive in drawn {
            let bounds = primitive.bounds();
            out.push_str(&format!(
                r#"<g id="{}" transform="translate({}, {})">"#,
                primitive.id(),
                bounds.min_x(),
                bounds.min_y()
            ));
            out.push_str(primitive.payload());
            out.push_str("</g>");
        }
        out.push_str("</g></svg>");
        out
    }
}

impl Exporter for Svg {
    fn export_diagram(&self, diagram: &Diagram) -> Result<(), FlowmapError> {
        let document = self.render_diagram(diagram);
        info!(file_name:? = self.file_name; "Writing SVG file");
        fs::write(&self.file_name, document).map_err(|err| {
            error!(file_name:? = self.file_name, err:err; "Failed to write SVG file");
            FlowmapError::Io(err)
        })
    }
}

/// Renders `diagram` as an SVG document without writing it anywhere.
pub fn to_svg_string(diagram: &Diagram, styles: &StyleRegistry) -> String {
    Svg::new(PathBuf::new(), styles).render_diagram(diagram)
}

#[cfg(test)]
mod tests {
    use flowmap_core::semantic::{Edge, Flow, FlowDiagram, Node};

    use super::*;
    use crate::{config::LayoutConfig, drawer::compute_diagram, render::RenderRegistry};

    fn render(variant: &FlowDiagram) -> String {
        let styles = StyleRegistry::default();
        let diagram = compute_diagram(
            variant,
            &LayoutConfig::default(),
            &RenderRegistry::default(),
            &styles,
        )
        .unwrap();
        to_svg_string(&diagram, &styles)
    }

    #[test]
    fn test_empty_diagram_is_valid_document() {
        let svg = render(&FlowDiagram::new("empty"));
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("<defs></defs>"));
    }

    #[test]
    fn test_markers_in_defs_and_nodes_above_edges() {
        let variant = FlowDiagram::new("d")
            .with_node(Node::new("a"))
            .with_node(Node::new("b"))
            .with_flow(Flow::new("water", "Water"))
            .with_edge(Edge::new("a", "b", "water"));
        let svg = render(&variant);

        let defs_end = svg.find("</defs>").unwrap();
        assert!(svg.find("<marker").unwrap() < defs_end);

        let edge = svg.find(r#"id="edge:"#).unwrap();
        let node = svg.find(r#"id="node:a""#).unwrap();
        let label = svg.find(r#"id="label:"#).unwrap();
        assert!(defs_end < edge);
        assert!(edge < node);
        assert!(node < label);
    }

    #[test]
    fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.svg");
        let styles = StyleRegistry::default();
        let exporter = Svg::new(&path, &styles).with_margin(0.0);
        exporter.export_diagram(&Diagram::default()).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains(r#"viewBox="0 0 0 0""#));
    }
}
