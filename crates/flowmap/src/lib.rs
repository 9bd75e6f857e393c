//! Flowmap - layered process and energy-flow diagrams
//!
//! This library lays out diagrams of nodes connected by typed flows
//! (water, steam, power, ...) from left to right, bundles edges of the same
//! flow into trunks, and emits positioned drawing primitives together with
//! an index of which edges belong to which node and flow. Diagrams can come
//! in dated variants and nest subdiagrams inside nodes; the
//! [`navigation`] module walks both dimensions.

pub mod config;
pub mod export;
pub mod layout;
pub mod navigation;
pub mod primitive;
pub mod render;
pub mod style;

mod drawer;
mod error;

pub use flowmap_core::{color, draw, geometry, identifier, semantic};

pub use drawer::compute_diagram;
pub use error::{FlowmapError, ReferenceKind};

use log::debug;

use config::AppConfig;
use navigation::Navigator;
use primitive::Diagram;
use render::RenderRegistry;
use semantic::{DiagramVariants, FlowDiagram};
use style::StyleRegistry;

/// Parses a diagram set: one diagram or an array of dated variants.
///
/// # Errors
///
/// Returns [`FlowmapError::Json`] when `json` does not describe diagrams.
pub fn load_diagram_set(json: &str) -> Result<Vec<FlowDiagram>, FlowmapError> {
    let variants: DiagramVariants = serde_json::from_str(json)?;
    let variants = variants.into_vec();
    debug!(variants = variants.len(); "Diagram set loaded");
    Ok(variants)
}

/// Builder tying configuration, renderers and styles together.
///
/// # Examples
///
/// ```
/// use flowmap::{DiagramBuilder, config::AppConfig};
///
/// let builder = DiagramBuilder::new(AppConfig::default());
/// let variants = builder
///     .load(r#"{"id": "plant", "nodes": [{"id": "boiler"}]}"#)
///     .unwrap();
///
/// let svg = builder.render_svg(&variants[0]).unwrap();
/// assert!(svg.starts_with("<svg"));
/// ```
#[derive(Debug, Default)]
pub struct DiagramBuilder {
    config: AppConfig,
    renders: RenderRegistry,
}

impl DiagramBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            renders: RenderRegistry::default(),
        }
    }

    /// Replaces the node renderers.
    pub fn with_renders(mut self, renders: RenderRegistry) -> Self {
        self.renders = renders;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parses a JSON diagram set.
    ///
    /// # Errors
    ///
    /// Returns [`FlowmapError::Json`] for malformed input.
    pub fn load(&self, json: &str) -> Result<Vec<FlowDiagram>, FlowmapError> {
        load_diagram_set(json)
    }

    /// Flow styles described by the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FlowmapError::Config`] for invalid colors or dash patterns.
    pub fn styles(&self) -> Result<StyleRegistry, FlowmapError> {
        StyleRegistry::from_config(self.config.style())
    }

    /// A navigator sharing this builder's configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FlowmapError::Config`] for an invalid style configuration.
    pub fn navigator(&self) -> Result<Navigator, FlowmapError> {
        Ok(Navigator::new(
            self.config.layout().clone(),
            self.renders.clone(),
            self.styles()?,
        ))
    }

    /// Computes the diagram of a single variant.
    ///
    /// # Errors
    ///
    /// Returns configuration and layout errors, and
    /// [`FlowmapError::DanglingReference`] in strict mode.
    pub fn compute(&self, variant: &FlowDiagram) -> Result<Diagram, FlowmapError> {
        compute_diagram(variant, self.config.layout(), &self.renders, &self.styles()?)
    }

    /// Computes and renders a single variant as an SVG document.
    ///
    /// # Errors
    ///
    /// Same as [`compute`](Self::compute).
    pub fn render_svg(&self, variant: &FlowDiagram) -> Result<String, FlowmapError> {
        let diagram = self.compute(variant)?;
        Ok(export::svg::to_svg_string(&diagram, &self.styles()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_single_and_list() {
        let single = load_diagram_set(r#"{"id": "a"}"#).unwrap();
        assert_eq!(single.len(), 1);

        let list = load_diagram_set(
            r#"[{"id": "a", "endDate": "2020-06-30"}, {"id": "a", "startDate": "2020-07-01"}]"#,
        )
        .unwrap();
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_load_rejects_garbage() {
        assert!(matches!(
            load_diagram_set("not json"),
            Err(FlowmapError::Json(_))
        ));
    }
}
