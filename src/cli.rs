use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub const DEFAULT_SECTION_NAMES: [&str; 2] =
    ["Diagnostic Trouble Codes", "Diagnostic Service Codes"];

#[derive(Parser, Debug)]
#[command(
    name = "dtc-extract",
    version,
    about = "Diagnostic trouble code extraction from PDF service manuals"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Inventory(InventoryArgs),
    Outline(OutlineArgs),
    Extract(ExtractArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = ".cache/dtc")]
    pub cache_root: PathBuf,

    /// Directory holding the manuals; defaults to the cache root.
    #[arg(long)]
    pub source_dir: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct OutlineArgs {
    #[arg(long)]
    pub pdf: PathBuf,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    #[arg(long, default_value = ".cache/dtc")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub source_dir: Option<PathBuf>,

    #[arg(long)]
    pub inventory_manifest_path: Option<PathBuf>,

    #[arg(long)]
    pub run_manifest_path: Option<PathBuf>,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub refresh_inventory: bool,

    /// Only process manuals with this file name (repeatable).
    #[arg(long = "file")]
    pub files: Vec<String>,

    /// Outline H2 headings whose entries are diagnostic codes (repeatable).
    #[arg(long = "section-name")]
    pub section_names: Vec<String>,

    #[arg(long)]
    pub max_sections_per_doc: Option<usize>,

    /// Worker threads for per-manual parallelism; defaults to all cores.
    #[arg(long)]
    pub jobs: Option<usize>,

    /// Also dump the extracted records as JSON.
    #[arg(long)]
    pub json_out: Option<PathBuf>,
}

impl ExtractArgs {
    pub fn resolved_section_names(&self) -> Vec<String> {
        if self.section_names.is_empty() {
            DEFAULT_SECTION_NAMES
                .iter()
                .map(|name| name.to_string())
                .collect()
        } else {
            self.section_names.clone()
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/dtc")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}
