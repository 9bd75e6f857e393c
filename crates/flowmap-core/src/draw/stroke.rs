//! Stroke and line-style definitions for flow polylines and node outlines.
//!
//! [`StrokeDefinition`] bundles color, width, dash style, cap and join. The
//! [`apply_stroke!`](crate::apply_stroke!) macro writes all of them onto an
//! SVG element in one go.
//!
//! Dashed flow lines are drawn twice when they cross other content: once in
//! the background color with [`StrokeStyle::inverted_dash_pattern`] filling
//! the gaps, and once in the foreground color with the regular pattern.
//!
//! ```
//! use flowmap_core::{color::Color, draw::{StrokeDefinition, StrokeStyle}};
//!
//! let mut stroke = StrokeDefinition::new(Color::new("teal").unwrap(), 2.0);
//! stroke.set_style(StrokeStyle::Custom("10,5,2,5".to_string()));
//! assert!(stroke.style().is_multi_segment());
//! ```

use std::str::FromStr;

use crate::color::Color;

/// Line pattern of a stroke.
///
/// | Variant | `stroke-dasharray` |
/// |---------|--------------------|
/// | `Solid` | none |
/// | `Dashed` | `5,5` |
/// | `Dotted` | `2,3` |
/// | `DashDot` | `10,5,2,5` |
/// | `DashDotDot` | `10,5,2,5,2,5` |
/// | `Custom(p)` | `p` |
#[derive(Debug, Default, Clone, PartialEq)]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    DashDot,
    DashDotDot,
    /// Comma or whitespace separated dash/gap lengths.
    Custom(String),
}

impl FromStr for StrokeStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "solid" => Ok(Self::Solid),
            "dashed" => Ok(Self::Dashed),
            "dotted" => Ok(Self::Dotted),
            "dash-dot" | "dashdot" => Ok(Self::DashDot),
            "dash-dot-dot" | "dashdotdot" => Ok(Self::DashDotDot),
            _ => {
                let custom = Self::Custom(s.to_string());
                if custom.dash_lengths().is_empty() {
                    Err(format!(
                        "invalid stroke style `{s}`, expected solid, dashed, dotted, \
                         dash-dot, dash-dot-dot or a dasharray such as `10,5`"
                    ))
                } else {
                    Ok(custom)
                }
            }
        }
    }
}

impl StrokeStyle {
    /// Returns the SVG dasharray value, or `None` for solid lines.
    pub fn to_svg_value(&self) -> Option<String> {
        match self {
            Self::Solid => None,
            Self::Dashed => Some("5,5".to_string()),
            Self::Dotted => Some("2,3".to_string()),
            Self::DashDot => Some("10,5,2,5".to_string()),
            Self::DashDotDot => Some("10,5,2,5,2,5".to_string()),
            Self::Custom(pattern) => Some(pattern.clone()),
        }
    }

    /// Parses the dasharray into its numeric tokens.
    ///
    /// Tokens that are not non-negative numbers are skipped. Solid strokes
    /// have no tokens.
    pub fn dash_lengths(&self) -> Vec<f32> {
        let Some(pattern) = self.to_svg_value() else {
            return Vec::new();
        };
        pattern
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .filter_map(|token| token.parse::<f32>().ok())
            .filter(|length| length.is_finite() && *length >= 0.0)
            .collect()
    }

    /// True when the pattern has more than one dash length token.
    pub fn is_multi_segment(&self) -> bool {
        self.dash_lengths().len() > 1
    }

    /// Returns the complementary dasharray that paints exactly the gaps of
    /// this pattern, or `None` when the pattern is not multi-segment.
    ///
    /// An odd-length list is repeated once (SVG does the same), then the
    /// whole list is shifted by a leading zero-length dash and closed with a
    /// trailing zero-length gap: `[d1, g1, d2, g2]` becomes
    /// `[0, d1, g1, d2, g2, 0]`.
    pub fn inverted_dash_pattern(&self) -> Option<Vec<f32>> {
        let mut lengths = self.dash_lengths();
        if lengths.len() < 2 {
            return None;
        }
        if lengths.len() % 2 == 1 {
            lengths.extend_from_within(..);
        }

        let mut inverted = Vec::with_capacity(lengths.len() + 2);
        inverted.push(0.0);
        inverted.extend(lengths);
        inverted.push(0.0);
        Some(inverted)
    }
}

/// Formats dash lengths as an SVG dasharray value.
pub fn dasharray_value(lengths: &[f32]) -> String {
    lengths
        .iter()
        .map(|length| length.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Line end rendering, mapped to `stroke-linecap`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum StrokeCap {
    #[default]
    Butt,
    Round,
    Square,
}

impl StrokeCap {
    pub fn to_svg_value(&self) -> &'static str {
        match self {
            Self::Butt => "butt",
            Self::Round => "round",
            Self::Square => "square",
        }
    }
}

impl FromStr for StrokeCap {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "butt" => Ok(Self::Butt),
            "round" => Ok(Self::Round),
            "square" => Ok(Self::Square),
            _ => Err(format!(
                "invalid stroke cap `{s}`, valid values: butt, round, square"
            )),
        }
    }
}

/// Corner rendering, mapped to `stroke-linejoin`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum StrokeJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

impl StrokeJoin {
    pub fn to_svg_value(&self) -> &'static str {
        match self {
            Self::Miter => "miter",
            Self::Round => "round",
            Self::Bevel => "bevel",
        }
    }
}

impl FromStr for StrokeJoin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "miter" => Ok(Self::Miter),
            "round" => Ok(Self::Round),
            "bevel" => Ok(Self::Bevel),
            _ => Err(format!(
                "invalid stroke join `{s}`, valid values: miter, round, bevel"
            )),
        }
    }
}

/// A complete stroke: color, width, dash style, cap and join.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeDefinition {
    color: Color,
    width: f32,
    style: StrokeStyle,
    cap: StrokeCap,
    join: StrokeJoin,
}

impl StrokeDefinition {
    /// Creates a solid stroke with butt caps and miter joins.
    pub fn new(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            ..Self::default()
        }
    }

    pub fn solid(color: Color, width: f32) -> Self {
        Self::new(color, width)
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn style(&self) -> &StrokeStyle {
        &self.style
    }

    pub fn cap(&self) -> StrokeCap {
        self.cap
    }

    pub fn join(&self) -> StrokeJoin {
        self.join
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn set_width(&mut self, width: f32) {
        self.width = width;
    }

    pub fn set_style(&mut self, style: StrokeStyle) {
        self.style = style;
    }

    pub fn set_cap(&mut self, cap: StrokeCap) {
        self.cap = cap;
    }

    pub fn set_join(&mut self, join: StrokeJoin) {
        self.join = join;
    }

    /// Returns a copy in another color, keeping every other property.
    pub fn with_color(&self, color: Color) -> Self {
        let mut stroke = self.clone();
        stroke.set_color(color);
        stroke
    }
}

impl Default for StrokeDefinition {
    fn default() -> Self {
        Self {
            color: Color::default(),
            width: 1.0,
            style: StrokeStyle::default(),
            cap: StrokeCap::default(),
            join: StrokeJoin::default(),
        }
    }
}

/// Apply all stroke attributes to an SVG element.
///
/// ```
/// use flowmap_core::{color::Color, draw::{StrokeDefinition, StrokeStyle}};
/// use svg::node::element as svg_element;
///
/// let mut stroke = StrokeDefinition::new(Color::new("gray").unwrap(), 2.0);
/// stroke.set_style(StrokeStyle::Dashed);
/// let line = svg_element::Polyline::new().set("points", "0,0 10,0");
/// let line = flowmap_core::apply_stroke!(line, &stroke);
/// ```
#[macro_export]
macro_rules! apply_stroke {
    ($element:expr, $stroke:expr) => {{
        let mut elem = $element
            .set("stroke", $stroke.color().to_string())
            .set("stroke-opacity", $stroke.color().alpha())
            .set("stroke-width", $stroke.width())
            .set("stroke-linecap", $stroke.cap().to_svg_value())
            .set("stroke-linejoin", $stroke.join().to_svg_value());

        if let Some(dasharray) = $stroke.style().to_svg_value() {
            elem = elem.set("stroke-dasharray", dasharray);
        }

        elem
    }};
}
