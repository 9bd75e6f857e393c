//! Text measurement and rendering for node titles and flow labels.
//!
//! - [`TextDefinition`]: reusable text style
//! - [`Text`]: content paired with a definition, measurable and renderable
//!
//! Measurement uses cosmic-text with a process-wide `FontSystem`, so sizes
//! follow real font metrics where fonts are installed. When shaping yields
//! no glyphs (for example on a host without fonts) an average-advance
//! estimate is used instead so layouts stay usable.
//!
//! ```
//! # use flowmap_core::draw::{Text, TextDefinition};
//! let mut style = TextDefinition::new();
//! style.set_font_size(14);
//!
//! let text = Text::new(&style, "Steam boiler");
//! assert!(text.calculate_size().width() > 0.0);
//! ```

use std::sync::{Mutex, OnceLock};

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping};
use log::{debug, info};
use svg::node::{Text as SvgText, element as svg_element};

use crate::{
    color::Color,
    geometry::{Insets, Point, Size},
};

/// Font, color and padding settings for a piece of text.
///
/// | Property | Default |
/// |----------|---------|
/// | Font family | `"Arial"` |
/// | Font size | `13` |
/// | Text color | `None` (SVG default) |
/// | Background color | `None` |
/// | Padding | zero |
#[derive(Debug, Clone, PartialEq)]
pub struct TextDefinition {
    font_family: String,
    font_size: u16,
    color: Option<Color>,
    background_color: Option<Color>,
    padding: Insets,
}

impl TextDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_font_size(&mut self, size: u16) {
        self.font_size = size;
    }

    pub fn set_font_family(&mut self, family: &str) {
        self.font_family = family.to_string();
    }

    pub fn set_color(&mut self, color: Option<Color>) {
        self.color = color;
    }

    /// Sets a background filled behind the text, inflated by the padding.
    pub fn set_background_color(&mut self, color: Option<Color>) {
        self.background_color = color;
    }

    pub fn set_padding(&mut self, padding: Insets) {
        self.padding = padding;
    }

    pub fn font_size(&self) -> u16 {
        self.font_size
    }

    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    pub fn color(&self) -> Option<Color> {
        self.color
    }

    pub fn background_color(&self) -> Option<Color> {
        self.background_color
    }

    pub fn padding(&self) -> Insets {
        self.padding
    }
}

impl Default for TextDefinition {
    fn default() -> Self {
        Self {
            font_family: "Arial".to_string(),
            font_size: 13,
            color: None,
            background_color: None,
            padding: Insets::default(),
        }
    }
}

/// Text content paired with its style.
#[derive(Debug, Clone)]
pub struct Text<'a> {
    definition: &'a TextDefinition,
    content: &'a str,
}

impl<'a> Text<'a> {
    pub fn new(definition: &'a TextDefinition, content: &'a str) -> Self {
        Self {
            definition,
            content,
        }
    }

    pub fn content(&self) -> &str {
        self.content
    }

    /// Size of the text including padding.
    pub fn calculate_size(&self) -> Size {
        self.calculate_size_without_padding()
            .add_padding(self.definition.padding())
    }

    fn calculate_size_without_padding(&self) -> Size {
        TEXT_MANAGER
            .get_or_init(TextManager::new)
            .calculate_text_size(self.content, self.definition)
    }

    /// Renders the text centered on `center`.
    ///
    /// Multi-line content becomes one `tspan` per line. When the definition
    /// carries a background color the result also contains a rounded
    /// rectangle behind the text.
    pub fn render(&self, center: Point) -> svg_element::Group {
        let mut group = svg_element::Group::new();

        if let Some(background) = self.definition.background_color() {
            let bounds = center.to_bounds(self.calculate_size());
            let rect = svg_element::Rectangle::new()
                .set("x", bounds.min_x())
                .set("y", bounds.min_y())
                .set("width", bounds.width())
                .set("height", bounds.height())
                .set("fill", background.to_string())
                .set("fill-opacity", background.alpha())
                .set("rx", 3.0);
            group = group.add(rect);
        }

        let lines: Vec<&str> = self.content.lines().collect();
        let inner = self.calculate_size_without_padding();
        let line_height = if lines.is_empty() {
            0.0
        } else {
            inner.height() / lines.len() as f32
        };
        let y_offset = -(inner.height() + line_height) / 2.0;

        let mut text = svg_element::Text::new("")
            .set("x", center.x())
            .set("y", center.y() + y_offset)
            .set("text-anchor", "middle")
            .set("dominant-baseline", "central")
            .set("font-family", self.definition.font_family())
            .set("font-size", self.definition.font_size());

        if let Some(color) = self.definition.color() {
            text = text
                .set("fill", color.to_string())
                .set("fill-opacity", color.alpha());
        }

        for line in lines {
            let tspan = svg_element::TSpan::new("")
                .set("x", center.x())
                .set("dy", line_height)
                .add(SvgText::new(line));
            text = text.add(tspan);
        }

        group.add(text)
    }
}

/// Shared font system used for all measurements.
struct TextManager {
    font_system: Mutex<FontSystem>,
}

impl TextManager {
    fn new() -> Self {
        info!("Initializing FontSystem");
        Self {
            font_system: Mutex::new(FontSystem::new()),
        }
    }

    fn calculate_text_size(&self, text: &str, text_def: &TextDefinition) -> Size {
        if text.is_empty() {
            return Size::default();
        }

        // Points to pixels at standard DPI.
        let font_size_px = text_def.font_size() as f32 * 1.33;
        let metrics = Metrics::new(font_size_px, font_size_px * 1.15);
        let line_count = text.lines().count().max(1);

        let mut font_system = self.font_system.lock().expect("failed to lock FontSystem");
        let mut buffer = Buffer::new(&mut font_system, metrics);
        let mut buffer = buffer.borrow_with(&mut font_system);

        let attrs = Attrs::new().family(Family::Name(text_def.font_family()));
        buffer.set_size(None, None);
        buffer.set_text(text, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(true);

        let mut max_width: f32 = 0.0;
        let mut run_count = 0;
        for run in buffer.layout_runs() {
            run_count += 1;
            if let Some(last) = run.glyphs.last() {
                max_width = max_width.max(last.x + last.w);
            }
        }

        if max_width <= 0.0 {
            debug!(text; "No glyphs shaped, estimating text width");
            let longest = text.lines().map(|line| line.chars().count()).max().unwrap_or(0);
            max_width = longest as f32 * font_size_px * 0.55;
        }

        let lines = run_count.max(line_count);
        Size::new(max_width, lines as f32 * metrics.line_height)
    }
}

static TEXT_MANAGER: OnceLock<TextManager> = OnceLock::new();
