//! Node render resolution.
//!
//! A [`NodeRenderer`] measures a node and describes its shape: it returns a
//! [`NodeRender`] holding the node's size and SVG markup drawn in local
//! coordinates (origin at the top-left corner of the node's box).
//!
//! The [`RenderRegistry`] picks a renderer by node category and falls back
//! to its required default. Closures `Fn(&Node) -> NodeRender` are
//! renderers too, so hosts can register icon-producing callbacks without
//! defining a type:
//!
//! ```
//! use flowmap::render::{NodeRender, RenderRegistry, RectangleRenderer};
//! use flowmap_core::{geometry::Size, semantic::Node};
//!
//! let mut registry = RenderRegistry::new(RectangleRenderer::default());
//! registry.register("valve", |_: &Node| {
//!     NodeRender::new(Size::new(24.0, 24.0), "<circle cx=\"12\" cy=\"12\" r=\"10\"/>")
//! });
//!
//! let valve = Node::new("v1").with_category("valve");
//! assert_eq!(registry.resolve(&valve).render(&valve).size(), Size::new(24.0, 24.0));
//! ```

use std::{collections::HashMap, fmt, sync::Arc};

use svg::node::element as svg_element;

use flowmap_core::{
    apply_stroke,
    color::Color,
    draw::{StrokeDefinition, Text, TextDefinition},
    geometry::{Insets, Point, Size},
    identifier::Id,
    semantic::Node,
};

/// Size and markup produced for one node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRender {
    size: Size,
    markup: String,
}

impl NodeRender {
    pub fn new(size: Size, markup: impl Into<String>) -> Self {
        Self {
            size,
            markup: markup.into(),
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }
}

/// Measures and describes a node.
pub trait NodeRenderer: Send + Sync {
    fn render(&self, node: &Node) -> NodeRender;
}

impl<F> NodeRenderer for F
where
    F: Fn(&Node) -> NodeRender + Send + Sync,
{
    fn render(&self, node: &Node) -> NodeRender {
        self(node)
    }
}

/// Category-keyed renderer table with a required default.
#[derive(Clone)]
pub struct RenderRegistry {
    default: Arc<dyn NodeRenderer>,
    categories: HashMap<Id, Arc<dyn NodeRenderer>>,
}

impl RenderRegistry {
    pub fn new(default: impl NodeRenderer + 'static) -> Self {
        Self {
            default: Arc::new(default),
            categories: HashMap::new(),
        }
    }

    /// Registers `renderer` for `category`, replacing any earlier entry.
    pub fn register(
        &mut self,
        category: &str,
        renderer: impl NodeRenderer + 'static,
    ) -> &mut Self {
        self.categories.insert(Id::new(category), Arc::new(renderer));
        self
    }

    pub fn with_renderer(mut self, category: &str, renderer: impl NodeRenderer + 'static) -> Self {
        self.register(category, renderer);
        self
    }

    pub fn resolve(&self, node: &Node) -> &dyn NodeRenderer {
        node.category
            .and_then(|category| self.categories.get(&category))
            .unwrap_or(&self.default)
            .as_ref()
    }
}

impl Default for RenderRegistry {
    fn default() -> Self {
        Self::new(RectangleRenderer::default())
    }
}

impl fmt::Debug for RenderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderRegistry")
            .field("categories", &self.categories.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Appearance shared by the built-in shape renderers.
#[derive(Debug, Clone)]
struct ShapeStyle {
    fill: Color,
    stroke: StrokeDefinition,
    text: TextDefinition,
    padding: Insets,
    min_size: Size,
}

impl ShapeStyle {
    fn content_size(&self, title: &str) -> Size {
        Text::new(&self.text, title)
            .calculate_size()
            .add_padding(self.padding)
    }

    fn title_markup(&self, title: &str, size: Size) -> String {
        let center = Point::new(size.width() / 2.0, size.height() / 2.0);
        Text::new(&self.text, title).render(center).to_string()
    }
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            fill: Color::new("white").expect("white is a valid color"),
            stroke: StrokeDefinition::solid(Color::default(), 1.5),
            text: TextDefinition::new(),
            padding: Insets::new(8.0, 14.0, 8.0, 14.0),
            min_size: Size::new(80.0, 40.0),
        }
    }
}

macro_rules! shape_style_setters {
    ($renderer:ty) => {
        impl $renderer {
            pub fn with_fill(mut self, fill: Color) -> Self {
                self.style.fill = fill;
                self
            }

            pub fn with_stroke(mut self, stroke: StrokeDefinition) -> Self {
                self.style.stroke = stroke;
                self
            }

            pub fn with_text(mut self, text: TextDefinition) -> Self {
                self.style.text = text;
                self
            }

            pub fn with_padding(mut self, padding: Insets) -> Self {
                self.style.padding = padding;
                self
            }

            pub fn with_min_size(mut self, min_size: Size) -> Self {
                self.style.min_size = min_size;
                self
            }
        }
    };
}

/// Rectangle with the node title centered inside.
///
/// Expandable nodes get a second, inset border.
#[derive(Debug, Clone, Default)]
pub struct RectangleRenderer {
    style: ShapeStyle,
    corner_radius: f32,
}

impl RectangleRenderer {
    pub fn with_corner_radius(mut self, radius: f32) -> Self {
        self.corner_radius = radius;
        self
    }
}

shape_style_setters!(RectangleRenderer);

/// Distance between the two borders of an expandable rectangle.
const DOUBLE_BORDER_GAP: f32 = 3.0;

impl NodeRenderer for RectangleRenderer {
    fn render(&self, node: &Node) -> NodeRender {
        let title = node.display_title();
        let size = self.style.content_size(&title).max(self.style.min_size);
        let half_stroke = self.style.stroke.width() / 2.0;

        let outline = svg_element::Rectangle::new()
            .set("x", half_stroke)
            .set("y", half_stroke)
            .set("width", size.width() - self.style.stroke.width())
            .set("height", size.height() - self.style.stroke.width())
            .set("rx", self.corner_radius)
            .set("fill", self.style.fill.to_string())
            .set("fill-opacity", self.style.fill.alpha());
        let mut markup = apply_stroke!(outline, &self.style.stroke).to_string();

        if node.is_expandable() {
            let inset = half_stroke + DOUBLE_BORDER_GAP;
            let inner = svg_element::Rectangle::new()
                .set("x", inset)
                .set("y", inset)
                .set("width", (size.width() - 2.0 * inset).max(0.0))
                .set("height", (size.height() - 2.0 * inset).max(0.0))
                .set("rx", (self.corner_radius - DOUBLE_BORDER_GAP).max(0.0))
                .set("fill", "none");
            markup.push_str(&apply_stroke!(inner, &self.style.stroke).to_string());
        }

        markup.push_str(&self.style.title_markup(&title, size));
        NodeRender::new(size, markup)
    }
}

/// Ellipse enclosing the node title.
#[derive(Debug, Clone, Default)]
pub struct OvalRenderer {
    style: ShapeStyle,
}

shape_style_setters!(OvalRenderer);

impl NodeRenderer for OvalRenderer {
    fn render(&self, node: &Node) -> NodeRender {
        let title = node.display_title();
        // An ellipse through the corners of the content box.
        let size = self
            .style
            .content_size(&title)
            .scale(std::f32::consts::SQRT_2)
            .max(self.style.min_size);
        let half_stroke = self.style.stroke.width() / 2.0;

        let ellipse = svg_element::Ellipse::new()
            .set("cx", size.width() / 2.0)
            .set("cy", size.height() / 2.0)
            .set("rx", (size.width() / 2.0 - half_stroke).max(0.0))
            .set("ry", (size.height() / 2.0 - half_stroke).max(0.0))
            .set("fill", self.style.fill.to_string())
            .set("fill-opacity", self.style.fill.alpha());
        let mut markup = apply_stroke!(ellipse, &self.style.stroke).to_string();
        markup.push_str(&self.style.title_markup(&title, size));

        NodeRender::new(size, markup)
    }
}
