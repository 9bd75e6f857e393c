//! Command-line argument definitions for the flowmap CLI.

use clap::Parser;

/// Renders a flowmap diagram set to SVG
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input diagram set (JSON)
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Path to the output SVG file
    #[arg(short, long, default_value = "out.svg")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Date to display (YYYY-MM-DD); defaults to the earliest declared date
    #[arg(long)]
    pub date: Option<String>,

    /// Comma-separated node ids to drill into, outermost first
    #[arg(long, value_delimiter = ',')]
    pub path: Vec<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
