//! CLI errors and their diagnostics.

use std::{io, path::PathBuf};

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use flowmap::FlowmapError;

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error(transparent)]
    #[diagnostic(code(flowmap::io))]
    Io(#[from] io::Error),

    #[error("{message}")]
    #[diagnostic(
        code(flowmap::input),
        help("the input must be one diagram object or an array of diagram variants")
    )]
    InvalidInput {
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
        message: String,
    },

    #[error(transparent)]
    #[diagnostic(code(flowmap::engine))]
    Flowmap(#[from] FlowmapError),

    #[error("Missing configuration file: {}", .0.display())]
    #[diagnostic(code(flowmap::config))]
    MissingConfig(PathBuf),

    #[error("Failed to parse configuration file {}: {message}", path.display())]
    #[diagnostic(code(flowmap::config))]
    InvalidConfig { path: PathBuf, message: String },

    #[error("Invalid date `{value}`")]
    #[diagnostic(code(flowmap::args), help("dates are written as YYYY-MM-DD"))]
    InvalidDate { value: String },

    #[error("Node `{node}` has no subdiagram at depth {depth}")]
    #[diagnostic(
        code(flowmap::path),
        help("every path element must name an expandable node of the diagram above it")
    )]
    InvalidPath { node: String, depth: usize },

    #[error("No diagram variant is valid on {date}")]
    #[diagnostic(code(flowmap::date), help("pick a date inside one of: {ranges}"))]
    NoDiagram { date: String, ranges: String },
}

impl CliError {
    /// Wraps a JSON error of `input` with a pointer into the source text.
    pub(crate) fn from_json(name: &str, input: &str, err: &FlowmapError) -> Option<Self> {
        let FlowmapError::Json(json) = err else {
            return None;
        };
        let offset = line_column_offset(input, json.line(), json.column());
        Some(Self::InvalidInput {
            src: NamedSource::new(name, input.to_string()),
            span: SourceSpan::from(offset..offset),
            message: json.to_string(),
        })
    }
}

/// Byte offset of a 1-based line and column, clamped to the input.
fn line_column_offset(input: &str, line: usize, column: usize) -> usize {
    let line_start: usize = input
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(input.len())
}
