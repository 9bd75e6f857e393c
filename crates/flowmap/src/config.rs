//! Configuration types for flowmap layout and styling.
//!
//! All types implement [`serde::Deserialize`] with defaults for every
//! field, so a configuration file only needs to mention what it changes.
//!
//! - [`AppConfig`] - top-level root combining layout and style settings
//! - [`LayoutConfig`] - spacing, edge routing footprint and reference checks
//! - [`StyleConfig`] - colors, label text and per-category flow styles
//!
//! ```
//! # use flowmap::config::AppConfig;
//! let config: AppConfig = toml::from_str(r#"
//!     [layout]
//!     rank_spacing = 200.0
//!
//!     [style.flows.steam]
//!     color = "firebrick"
//!     dash = "dashed"
//! "#).unwrap();
//!
//! assert_eq!(config.layout().rank_spacing(), 200.0);
//! assert_eq!(config.layout().join_fraction(), 0.25);
//! assert!(config.style().flows().contains_key("steam"));
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;

use flowmap_core::{
    color::Color,
    draw::{StrokeCap, StrokeJoin, StrokeStyle},
};

use crate::error::FlowmapError;

/// Top-level configuration root.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    layout: LayoutConfig,

    #[serde(default)]
    style: StyleConfig,
}

impl AppConfig {
    pub fn new(layout: LayoutConfig, style: StyleConfig) -> Self {
        Self { layout, style }
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn style(&self) -> &StyleConfig {
        &self.style
    }
}

/// Space reserved for one edge while laying out the graph.
///
/// The width widens the gap between ranks, the height is the vertical slot
/// given to bridging nodes and the distance labels sit above their elbow.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct EdgeFootprint {
    width: f32,
    height: f32,
    label_offset: f32,
}

impl EdgeFootprint {
    pub fn new(width: f32, height: f32, label_offset: f32) -> Self {
        Self {
            width,
            height,
            label_offset,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn label_offset(&self) -> f32 {
        self.label_offset
    }
}

impl Default for EdgeFootprint {
    fn default() -> Self {
        Self::new(48.0, 16.0, 4.0)
    }
}

/// Layout and routing parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Minimum horizontal gap between two rank columns.
    rank_spacing: f32,
    /// Vertical gap between nodes of one rank.
    node_spacing: f32,
    /// Vertical gap between disconnected parts of a diagram.
    component_spacing: f32,
    edge_footprint: EdgeFootprint,
    /// Fraction of the rank gap at which same-flow edges join.
    join_fraction: f32,
    /// Horizontal offset between the join columns of different flows.
    flow_stagger: f32,
    /// Spacing hint handed to the layering library.
    vertex_spacing: f64,
    /// Fail on edges naming unknown nodes or flows instead of dropping them.
    strict_references: bool,
}

impl LayoutConfig {
    pub fn rank_spacing(&self) -> f32 {
        self.rank_spacing
    }

    pub fn node_spacing(&self) -> f32 {
        self.node_spacing
    }

    pub fn component_spacing(&self) -> f32 {
        self.component_spacing
    }

    pub fn edge_footprint(&self) -> EdgeFootprint {
        self.edge_footprint
    }

    pub fn join_fraction(&self) -> f32 {
        self.join_fraction
    }

    pub fn flow_stagger(&self) -> f32 {
        self.flow_stagger
    }

    pub fn vertex_spacing(&self) -> f64 {
        self.vertex_spacing
    }

    pub fn strict_references(&self) -> bool {
        self.strict_references
    }

    pub fn with_rank_spacing(mut self, spacing: f32) -> Self {
        self.rank_spacing = spacing;
        self
    }

    pub fn with_node_spacing(mut self, spacing: f32) -> Self {
        self.node_spacing = spacing;
        self
    }

    pub fn with_edge_footprint(mut self, footprint: EdgeFootprint) -> Self {
        self.edge_footprint = footprint;
        self
    }

    pub fn with_flow_stagger(mut self, stagger: f32) -> Self {
        self.flow_stagger = stagger;
        self
    }

    pub fn with_strict_references(mut self, strict: bool) -> Self {
        self.strict_references = strict;
        self
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            rank_spacing: 120.0,
            node_spacing: 32.0,
            component_spacing: 64.0,
            edge_footprint: EdgeFootprint::default(),
            join_fraction: 0.25,
            flow_stagger: 6.0,
            vertex_spacing: 3.0,
            strict_references: false,
        }
    }
}

/// Font settings for flow labels.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LabelTextConfig {
    font_family: String,
    font_size: u16,
}

impl LabelTextConfig {
    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    pub fn font_size(&self) -> u16 {
        self.font_size
    }
}

impl Default for LabelTextConfig {
    fn default() -> Self {
        Self {
            font_family: "Arial".to_string(),
            font_size: 11,
        }
    }
}

/// Style overrides for one flow category, as written in configuration.
///
/// Unset fields keep the default flow style.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FlowStyleConfig {
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    width: Option<f32>,
    #[serde(default)]
    dash: Option<String>,
    #[serde(default)]
    arrow_head_size: Option<f32>,
    #[serde(default)]
    cap: Option<String>,
    #[serde(default)]
    join: Option<String>,
}

impl FlowStyleConfig {
    pub fn color(&self) -> Result<Option<Color>, FlowmapError> {
        self.color
            .as_deref()
            .map(Color::new)
            .transpose()
            .map_err(|err| FlowmapError::Config(format!("Invalid flow color: {err}")))
    }

    pub fn width(&self) -> Option<f32> {
        self.width
    }

    pub fn dash(&self) -> Result<Option<StrokeStyle>, FlowmapError> {
        self.dash
            .as_deref()
            .map(str::parse::<StrokeStyle>)
            .transpose()
            .map_err(FlowmapError::Config)
    }

    pub fn arrow_head_size(&self) -> Option<f32> {
        self.arrow_head_size
    }

    /// Line ends of the flow polylines (`butt`, `round` or `square`).
    pub fn cap(&self) -> Result<Option<StrokeCap>, FlowmapError> {
        self.cap
            .as_deref()
            .map(str::parse::<StrokeCap>)
            .transpose()
            .map_err(FlowmapError::Config)
    }

    /// Corners of the flow polylines (`miter`, `round` or `bevel`).
    pub fn join(&self) -> Result<Option<StrokeJoin>, FlowmapError> {
        self.join
            .as_deref()
            .map(str::parse::<StrokeJoin>)
            .transpose()
            .map_err(FlowmapError::Config)
    }
}

/// Visual styling configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    background_color: String,
    highlight_color: String,
    label_text: LabelTextConfig,
    flows: BTreeMap<String, FlowStyleConfig>,
}

impl StyleConfig {
    /// Returns the parsed background color.
    ///
    /// # Errors
    ///
    /// Returns [`FlowmapError::Config`] if the color string is not valid CSS.
    pub fn background_color(&self) -> Result<Color, FlowmapError> {
        Color::new(&self.background_color)
            .map_err(|err| FlowmapError::Config(format!("Invalid background color: {err}")))
    }

    pub fn highlight_color(&self) -> Result<Color, FlowmapError> {
        Color::new(&self.highlight_color)
            .map_err(|err| FlowmapError::Config(format!("Invalid highlight color: {err}")))
    }

    pub fn label_text(&self) -> &LabelTextConfig {
        &self.label_text
    }

    pub fn flows(&self) -> &BTreeMap<String, FlowStyleConfig> {
        &self.flows
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            background_color: "white".to_string(),
            highlight_color: "orange".to_string(),
            label_text: LabelTextConfig::default(),
            flows: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        let layout = config.layout();
        assert_eq!(layout.join_fraction(), 0.25);
        assert!(!layout.strict_references());
        assert!(layout.rank_spacing() > 0.0);
        assert!(config.style().background_color().is_ok());
        assert!(config.style().highlight_color().is_ok());
        assert!(config.style().flows().is_empty());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [layout]
            strict_references = true

            [layout.edge_footprint]
            height = 30.0

            [style]
            background_color = "ivory"
            "#,
        )
        .unwrap();

        assert!(config.layout().strict_references());
        assert_eq!(config.layout().edge_footprint().height(), 30.0);
        assert_eq!(
            config.layout().edge_footprint().width(),
            EdgeFootprint::default().width()
        );
        assert_eq!(
            config.style().background_color().unwrap(),
            Color::new("ivory").unwrap()
        );
        assert_eq!(config.style().label_text().font_size(), 11);
    }

    #[test]
    fn test_flow_style_config() {
        let config: StyleConfig = toml::from_str(
            r#"
            [flows.electricity]
            color = "gold"
            width = 3.0
            dash = "4,2"
            arrow_head_size = 9.0
            cap = "round"
            join = "bevel"

            [flows.broken]
            color = "not-a-color"
            cap = "pointy"
            "#,
        )
        .unwrap();

        let electricity = &config.flows()["electricity"];
        assert_eq!(electricity.color().unwrap(), Some(Color::new("gold").unwrap()));
        assert_eq!(electricity.width(), Some(3.0));
        assert_eq!(
            electricity.dash().unwrap(),
            Some(StrokeStyle::Custom("4,2".to_string()))
        );
        assert_eq!(electricity.arrow_head_size(), Some(9.0));
        assert_eq!(electricity.cap().unwrap(), Some(StrokeCap::Round));
        assert_eq!(electricity.join().unwrap(), Some(StrokeJoin::Bevel));

        assert!(matches!(
            config.flows()["broken"].color(),
            Err(FlowmapError::Config(_))
        ));
        assert!(matches!(
            config.flows()["broken"].cap(),
            Err(FlowmapError::Config(_))
        ));
        assert_eq!(config.flows()["broken"].join().unwrap(), None);
    }

    #[test]
    fn test_invalid_background_color() {
        let config: StyleConfig = toml::from_str(r#"background_color = "nope""#).unwrap();
        assert!(config.background_color().is_err());
    }
}
