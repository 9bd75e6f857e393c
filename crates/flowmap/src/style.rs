//! Flow style resolution.
//!
//! A [`StyleRegistry`] maps flow categories to a [`FlowStyle`]: the stroke
//! used for the flow's polylines plus the size of its arrowheads. Flows
//! without a category, or with a category nobody registered, use the
//! registry default. Registering the same category twice keeps the last
//! entry.

use std::collections::HashMap;

use log::debug;

use flowmap_core::{
    color::Color,
    draw::{StrokeDefinition, TextDefinition},
    identifier::Id,
    semantic::Flow,
};

use crate::{config::StyleConfig, error::FlowmapError};

/// Stroke and arrowhead settings for one flow.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowStyle {
    stroke: StrokeDefinition,
    arrow_head_size: f32,
}

impl FlowStyle {
    pub fn new(stroke: StrokeDefinition, arrow_head_size: f32) -> Self {
        Self {
            stroke,
            arrow_head_size,
        }
    }

    pub fn stroke(&self) -> &StrokeDefinition {
        &self.stroke
    }

    pub fn arrow_head_size(&self) -> f32 {
        self.arrow_head_size
    }
}

impl Default for FlowStyle {
    fn default() -> Self {
        let color = Color::new("#4a5568").expect("default flow color is valid");
        Self::new(StrokeDefinition::solid(color, 2.0), 8.0)
    }
}

/// Category-keyed flow styles plus the colors shared by every flow.
#[derive(Debug, Clone)]
pub struct StyleRegistry {
    default: FlowStyle,
    categories: HashMap<Id, FlowStyle>,
    background: Color,
    highlight: Color,
    label_text: TextDefinition,
}

impl StyleRegistry {
    pub fn new(default: FlowStyle) -> Self {
        Self {
            default,
            ..Self::default()
        }
    }

    /// Builds a registry from configuration, layering every
    /// `[style.flows.<category>]` table over the default flow style.
    ///
    /// # Errors
    ///
    /// Returns [`FlowmapError::Config`] for unparsable colors, dash patterns,
    /// caps or joins.
    pub fn from_config(config: &StyleConfig) -> Result<Self, FlowmapError> {
        let mut label_text = TextDefinition::new();
        label_text.set_font_family(config.label_text().font_family());
        label_text.set_font_size(config.label_text().font_size());

        let mut registry = Self {
            background: config.background_color()?,
            highlight: config.highlight_color()?,
            label_text,
            ..Self::default()
        };

        for (category, overrides) in config.flows() {
            let mut stroke = registry.default.stroke().clone();
            if let Some(color) = overrides.color()? {
                stroke.set_color(color);
            }
            if let Some(width) = overrides.width() {
                stroke.set_width(width);
            }
            if let Some(dash) = overrides.dash()? {
                stroke.set_style(dash);
            }
            if let Some(cap) = overrides.cap()? {
                stroke.set_cap(cap);
            }
            if let Some(join) = overrides.join()? {
                stroke.set_join(join);
            }
            let arrow_head_size = overrides
                .arrow_head_size()
                .unwrap_or(registry.default.arrow_head_size());

            debug!(category = category.as_str(); "Registered flow style from configuration");
            registry.register(category, FlowStyle::new(stroke, arrow_head_size));
        }

        Ok(registry)
    }

    /// Registers `style` for `category`, replacing any earlier entry.
    pub fn register(&mut self, category: &str, style: FlowStyle) -> &mut Self {
        self.categories.insert(Id::new(category), style);
        self
    }

    pub fn with_style(mut self, category: &str, style: FlowStyle) -> Self {
        self.register(category, style);
        self
    }

    pub fn resolve(&self, flow: &Flow) -> &FlowStyle {
        flow.category
            .and_then(|category| self.categories.get(&category))
            .unwrap_or(&self.default)
    }

    pub fn default_style(&self) -> &FlowStyle {
        &self.default
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn highlight(&self) -> Color {
        self.highlight
    }

    pub fn label_text(&self) -> &TextDefinition {
        &self.label_text
    }
}

impl Default for StyleRegistry {
    fn default() -> Self {
        let mut label_text = TextDefinition::new();
        label_text.set_font_size(11);
        Self {
            default: FlowStyle::default(),
            categories: HashMap::new(),
            background: Color::new("white").expect("white is a valid color"),
            highlight: Color::new("orange").expect("orange is a valid color"),
            label_text,
        }
    }
}

#[cfg(test)]
mod tests {
    use flowmap_core::draw::{StrokeCap, StrokeJoin, StrokeStyle};

    use super::*;

    fn style(color: &str, width: f32) -> FlowStyle {
        FlowStyle::new(StrokeDefinition::solid(Color::new(color).unwrap(), width), 6.0)
    }

    #[test]
    fn test_uncategorized_flow_uses_default() {
        let registry = StyleRegistry::default().with_style("gas", style("blue", 1.0));
        let flow = Flow::new("f", "Flow");
        assert_eq!(registry.resolve(&flow), registry.default_style());
    }

    #[test]
    fn test_unknown_category_uses_default() {
        let registry = StyleRegistry::default();
        let flow = Flow::new("f", "Flow").with_category("unregistered");
        assert_eq!(registry.resolve(&flow), &FlowStyle::default());
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = StyleRegistry::new(FlowStyle::default());
        registry
            .register("water", style("blue", 1.0))
            .register("water", style("navy", 4.0));

        let flow = Flow::new("w", "Water").with_category("water");
        assert_eq!(registry.resolve(&flow).stroke().width(), 4.0);
        assert_eq!(
            registry.resolve(&flow).stroke().color(),
            Color::new("navy").unwrap()
        );
    }

    #[test]
    fn test_from_config_layers_overrides() {
        let config: StyleConfig = toml::from_str(
            r#"
            background_color = "black"

            [flows.steam]
            dash = "dash-dot"
            arrow_head_size = 12.0
            cap = "round"
            join = "round"
            "#,
        )
        .unwrap();
        let registry = StyleRegistry::from_config(&config).unwrap();

        assert_eq!(registry.background(), Color::new("black").unwrap());
        let steam = registry.resolve(&Flow::new("s", "Steam").with_category("steam"));
        assert_eq!(*steam.stroke().style(), StrokeStyle::DashDot);
        assert_eq!(steam.arrow_head_size(), 12.0);
        assert_eq!(steam.stroke().width(), FlowStyle::default().stroke().width());
        assert_eq!(steam.stroke().cap(), StrokeCap::Round);
        assert_eq!(steam.stroke().join(), StrokeJoin::Round);
    }

    #[test]
    fn test_from_config_rejects_bad_join() {
        let config: StyleConfig = toml::from_str(
            r#"
            [flows.odd]
            join = "sharp"
            "#,
        )
        .unwrap();
        assert!(matches!(
            StyleRegistry::from_config(&config),
            Err(FlowmapError::Config(_))
        ));
    }

    #[test]
    fn test_from_config_rejects_bad_dash() {
        let config: StyleConfig = toml::from_str(
            r#"
            [flows.odd]
            dash = "zigzag"
            "#,
        )
        .unwrap();
        assert!(StyleRegistry::from_config(&config).is_err());
    }
}
