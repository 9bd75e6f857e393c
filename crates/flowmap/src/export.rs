//! Export of computed diagrams.
//!
//! The [`Exporter`] trait is the last step of the pipeline:
//!
//! ```text
//! Diagram variants (JSON)
//!     ↓ navigation (select variant by date and path)
//! FlowDiagram
//!     ↓ compute_diagram
//! Diagram (primitives + edge index)
//!     ↓ export (this module)
//! Output file
//! ```
//!
//! - [`svg`]: standalone SVG documents via [`svg::Svg`]

pub mod svg;

use crate::{error::FlowmapError, primitive::Diagram};

/// Abstraction for diagram export backends.
pub trait Exporter {
    /// Writes `diagram` to the backend's output.
    ///
    /// # Errors
    ///
    /// Returns [`FlowmapError::Io`] when the output cannot be written.
    fn export_diagram(&self, diagram: &Diagram) -> Result<(), FlowmapError>;
}
