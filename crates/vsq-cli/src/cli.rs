use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "vsq",
    about = "Snapshot and diff queries over versioned feature datasets",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adapter configuration (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the features a query selects
    Features(QueryArgs),
    /// Count the features a query selects
    Count(QueryArgs),
    /// Bounding box of the features a query selects
    Bounds(QueryArgs),
    /// Show what the adapter can do natively
    Capabilities,
}

#[derive(Args)]
pub struct QueryArgs {
    /// Dataset fixture (JSON) to load into an in-memory repository
    #[arg(long)]
    pub dataset: PathBuf,

    /// Feature type name or path
    #[arg(long = "type")]
    pub type_name: String,

    /// Base query as JSON; the flags below override its fields
    #[arg(long)]
    pub request: Option<PathBuf>,

    /// Revision to query
    #[arg(long)]
    pub root: Option<String>,

    /// Older revision; switches to a diff query
    #[arg(long)]
    pub old_root: Option<String>,

    /// Change types to report in a diff query (ADDED, MODIFIED, REMOVED)
    #[arg(long = "change-type")]
    pub change_types: Vec<String>,

    /// Filter as JSON
    #[arg(long)]
    pub filter: Option<String>,

    /// Comma-separated attributes to return; empty for none
    #[arg(long)]
    pub properties: Option<String>,

    /// Sort keys: `name` ascending, `-name` descending, `@natural`, `@reverse`
    #[arg(long)]
    pub sort: Vec<String>,

    #[arg(long)]
    pub offset: Option<u64>,

    #[arg(long)]
    pub limit: Option<u64>,

    /// Screen map cell size
    #[arg(long)]
    pub decimate: Option<f64>,
}
