//! Primitive emission.
//!
//! Primitives are emitted in a fixed order: nodes, then one arrowhead
//! definition per flow, then the polylines, each trunk or back edge directly
//! followed by its label. Finally everything is shifted so that no
//! primitive reaches into negative coordinates.

use std::collections::HashMap;

use svg::node::element as svg_element;

use flowmap_core::{
    apply_stroke,
    color::Color,
    draw::{Text, dasharray_value},
    geometry::{Bounds, Point, Size},
    identifier::Id,
    semantic::Flow,
};

use super::{
    DrawInput,
    routing::{EdgeRecord, Routed},
};
use crate::{
    config::LayoutConfig,
    layout::LayoutResult,
    primitive::{Primitive, PrimitiveKind},
    style::{FlowStyle, StyleRegistry},
};

pub(crate) struct Emitted {
    pub primitives: Vec<Primitive>,
    pub size: Size,
    /// Translation applied to every primitive.
    pub offset: Point,
    /// Primitive index and record index of every polyline.
    pub polylines: Vec<(usize, usize)>,
}

pub(crate) fn emit(
    input: &DrawInput<'_>,
    routed: &Routed,
    result: &LayoutResult,
    styles: &StyleRegistry,
    config: &LayoutConfig,
) -> Emitted {
    let mut primitives = Vec::new();

    for (id, resolved) in &input.nodes {
        let Some(placement) = result.placement(*id) else {
            continue;
        };
        let bounds = Bounds::new_from_center(placement.center(), resolved.render.size());
        primitives.push(
            Primitive::new(
                format!("node:{id}"),
                PrimitiveKind::Node,
                bounds,
                resolved.render.markup().to_string(),
            )
            .with_node(*id)
            .with_clickable(resolved.node.is_expandable())
            .with_hoverable(true),
        );
    }

    let mut markers = HashMap::with_capacity(input.flows.len());
    for (position, (id, flow)) in input.flows.iter().enumerate() {
        let style = styles.resolve(flow);
        let marker = marker_id(position, *id);
        let size = style.arrow_head_size();
        let mut markup = arrow_marker(&marker, style.stroke().color(), size);
        markup.push_str(&arrow_marker(
            &highlight_marker_id(&marker),
            styles.highlight(),
            size,
        ));
        primitives.push(
            Primitive::new(
                format!("flow:{id}"),
                PrimitiveKind::FlowDefinition,
                Bounds::new_from_top_left(Point::default(), Size::new(size, size)),
                markup,
            )
            .with_flow(*id),
        );
        markers.insert(*id, marker);
    }

    let mut polylines = Vec::with_capacity(routed.records.len());
    for (index, record) in routed.records.iter().enumerate() {
        let Some(flow) = input.flows.get(&record.flow) else {
            continue;
        };
        let style = styles.resolve(flow);
        let marker = markers.get(&record.flow).map(String::as_str);

        polylines.push((primitives.len(), index));
        primitives.push(polyline(index, record, style, styles.background(), marker));

        if let Some(caption) = record
            .label_anchor
            .and_then(|anchor| label(index, anchor, flow, styles, config))
        {
            primitives.push(caption);
        }
    }

    let offset = normalize(&mut primitives);
    let size = primitives
        .iter()
        .filter(|primitive| primitive.kind() != PrimitiveKind::FlowDefinition)
        .map(Primitive::bounds)
        .fold(Size::default(), |size, bounds| {
            size.max(Size::new(bounds.max_x(), bounds.max_y()))
        });

    Emitted {
        primitives,
        size,
        offset,
        polylines,
    }
}

/// Shifts all primitives so the drawn content starts at non-negative
/// coordinates and returns the applied offset.
fn normalize(primitives: &mut [Primitive]) -> Point {
    let Some(union) = primitives
        .iter()
        .filter(|primitive| primitive.kind() != PrimitiveKind::FlowDefinition)
        .map(Primitive::bounds)
        .reduce(|a, b| a.merge(&b))
    else {
        return Point::default();
    };

    let offset = Point::new((-union.min_x()).max(0.0), (-union.min_y()).max(0.0));
    if offset != Point::default() {
        for primitive in primitives.iter_mut() {
            primitive.translate(offset);
        }
    }
    offset
}

/// Marker id of a flow, unique per diagram even when sanitized flow ids collide.
pub(crate) fn marker_id(position: usize, flow: Id) -> String {
    let sanitized: String = flow.with_str(|name| {
        name.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    });
    format!("flow-{position}-{sanitized}-arrow")
}

pub(crate) fn highlight_marker_id(marker: &str) -> String {
    format!("{marker}-highlight")
}

fn arrow_marker(id: &str, color: Color, size: f32) -> String {
    svg_element::Marker::new()
        .set("id", id)
        .set("viewBox", "0 0 10 10")
        .set("refX", 9)
        .set("refY", 5)
        .set("markerUnits", "userSpaceOnUse")
        .set("markerWidth", size)
        .set("markerHeight", size)
        .set("orient", "auto")
        .add(
            svg_element::Path::new()
                .set("d", "M 0 0 L 10 5 L 0 10 z")
                .set("fill", color.to_string())
                .set("fill-opacity", color.alpha()),
        )
        .to_string()
}

fn polyline(
    index: usize,
    record: &EdgeRecord,
    style: &FlowStyle,
    background: Color,
    marker: Option<&str>,
) -> Primitive {
    // Arrowheads stick out past the last point.
    let margin = if record.ends_at_node {
        style.arrow_head_size()
    } else {
        style.stroke().width()
    };
    let bounds = Bounds::from_points(record.points.iter().copied())
        .unwrap_or_default()
        .inflate(margin);
    let origin = bounds.min_point();
    let points = record
        .points
        .iter()
        .map(|point| {
            let local = point.sub_point(origin);
            format!("{},{}", local.x(), local.y())
        })
        .collect::<Vec<_>>()
        .join(" ");

    let mut markup = String::new();
    if let Some(gaps) = style.stroke().style().inverted_dash_pattern() {
        let backdrop = svg_element::Polyline::new()
            .set("points", points.as_str())
            .set("fill", "none");
        let backdrop_stroke = style.stroke().with_color(background);
        let backdrop = apply_stroke!(backdrop, &backdrop_stroke)
            .set("stroke-dasharray", dasharray_value(&gaps));
        markup.push_str(&backdrop.to_string());
    }

    let line = svg_element::Polyline::new()
        .set("points", points)
        .set("fill", "none");
    let mut line = apply_stroke!(line, style.stroke());
    if let Some(marker) = marker.filter(|_| record.ends_at_node) {
        line = line.set("marker-end", format!("url(#{marker})"));
    }
    markup.push_str(&line.to_string());

    Primitive::new(
        format!("edge:{index}"),
        PrimitiveKind::EdgePolyline,
        bounds,
        markup,
    )
    .with_flow(record.flow)
    .with_hoverable(true)
}

/// Flow label placed right of `anchor`, raised by the edge footprint height.
fn label(
    index: usize,
    anchor: Point,
    flow: &Flow,
    styles: &StyleRegistry,
    config: &LayoutConfig,
) -> Option<Primitive> {
    if flow.label.is_empty() {
        return None;
    }

    let mut definition = styles.label_text().clone();
    if definition.background_color().is_none() {
        definition.set_background_color(Some(styles.background()));
    }
    let text = Text::new(&definition, &flow.label);
    let size = text.calculate_size();
    let footprint = config.edge_footprint();
    let center = Point::new(
        anchor.x() + footprint.label_offset() + size.width() / 2.0,
        anchor.y() - footprint.height(),
    );
    let markup = text
        .render(Point::new(size.width() / 2.0, size.height() / 2.0))
        .to_string();

    Some(
        Primitive::new(
            format!("label:{index}"),
            PrimitiveKind::EdgeLabel,
            Bounds::new_from_center(center, size),
            markup,
        )
        .with_flow(flow.id),
    )
}
