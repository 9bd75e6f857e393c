//! CLI logic for the flowmap diagram tool.
//!
//! [`run`] loads a diagram set, navigates to the requested date and path,
//! and writes the displayed diagram as SVG.

mod args;
mod config;
mod error;

pub use args::Args;
pub use error::CliError;

use std::fs;

use chrono::NaiveDate;
use log::{debug, info};

use flowmap::{
    DiagramBuilder,
    export::{Exporter, svg::Svg},
    identifier::Id,
    navigation::{NavigationState, Transition},
};

/// Runs the CLI with parsed arguments.
///
/// # Errors
///
/// Returns [`CliError`] for:
/// - unreadable input, output or configuration files
/// - malformed JSON input or an inconsistent set of variants
/// - a date that cannot be parsed or that no variant covers
/// - a path element that does not name an expandable node
pub fn run(args: &Args) -> Result<(), CliError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing diagram set"
    );

    let app_config = config::load_config(args.config.as_ref())?;
    let source = fs::read_to_string(&args.input)?;

    let builder = DiagramBuilder::new(app_config);
    let variants = builder.load(&source).map_err(|err| {
        CliError::from_json(&args.input, &source, &err).unwrap_or_else(|| err.into())
    })?;

    let navigator = builder.navigator()?;
    let mut state = navigator.init(variants)?;

    if let Some(value) = &args.date {
        let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| CliError::InvalidDate {
            value: value.clone(),
        })?;
        state = navigator.apply(&state, Transition::ChangeDate(date))?;
    }

    // Without a displayed variant there is nothing to descend into.
    if state.diagram().is_none() {
        return Err(no_diagram(&state));
    }

    for (depth, node) in args.path.iter().map(|node| node.trim()).enumerate() {
        if node.is_empty() {
            continue;
        }
        let next = navigator.apply(&state, Transition::Descend(Id::new(node)))?;
        if next.ptr_eq(&state) {
            return Err(CliError::InvalidPath {
                node: node.to_string(),
                depth,
            });
        }
        debug!(node, depth; "Descended");
        state = next;
    }

    let Some(diagram) = state.diagram() else {
        return Err(no_diagram(&state));
    };

    Svg::new(&args.output, navigator.styles()).export_diagram(diagram)?;
    info!(output_file = args.output; "SVG exported successfully");

    Ok(())
}

fn no_diagram(state: &NavigationState) -> CliError {
    let ranges = state
        .selectable_ranges()
        .iter()
        .map(|range| format!("{}..={}", range.start(), range.end()))
        .collect::<Vec<_>>()
        .join(", ");
    CliError::NoDiagram {
        date: state.date().to_string(),
        ranges,
    }
}
