//! Error types for flowmap operations.

use std::io;

use thiserror::Error;

use flowmap_core::identifier::Id;

/// What kind of element an edge failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Node,
    Flow,
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Node => f.write_str("node"),
            Self::Flow => f.write_str("flow"),
        }
    }
}

/// The main error type for flowmap operations.
///
/// Expected data irregularities (dangling edges, invalid navigation
/// requests) do not produce errors unless strict reference checking is
/// enabled in [`LayoutConfig`](crate::config::LayoutConfig).
#[derive(Debug, Error)]
pub enum FlowmapError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid diagram data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Layout error: {0}")]
    Layout(String),

    #[error("Diagram `{diagram}` has an edge referencing unknown {kind} `{id}`")]
    DanglingReference {
        diagram: Id,
        kind: ReferenceKind,
        id: Id,
    },

    #[error("Diagram `{diagram}` has a validity window that ends before it starts")]
    InvalidWindow { diagram: Id },

    #[error("Variants `{first}` and `{second}` in {scope} have overlapping validity windows")]
    OverlappingVariants {
        scope: String,
        first: Id,
        second: Id,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}
