use serde::{Deserialize, Serialize};

use crate::pdf::PopplerVersions;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfEntry {
    pub filename: String,
    pub sha256: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub pdf_count: usize,
    pub pdfs: Vec<PdfEntry>,
}

/// One row of the flat output table.
///
/// A record carries either a solution name or a solution body, never both:
/// the two lists of a code are not positionally aligned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionRecord {
    pub pdf_file: String,
    pub section: String,
    pub observation: String,
    pub dtc: String,
    pub solution_name: Option<String>,
    pub solution: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractPaths {
    pub cache_root: String,
    pub source_directory: String,
    pub inventory_manifest_path: String,
    pub db_path: String,
    pub json_out_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractCounts {
    pub pdf_count: usize,
    pub processed_pdf_count: usize,
    pub failed_pdf_count: usize,
    pub pdfs_without_outline: usize,
    pub outline_rows: usize,
    pub dtc_sections: usize,
    pub empty_sections: usize,
    pub solution_names: usize,
    pub solutions: usize,
    pub records_written: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub db_schema_version: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub section_names: Vec<String>,
    pub tool_versions: Option<PopplerVersions>,
    pub paths: ExtractPaths,
    pub counts: ExtractCounts,
    pub source_hashes: Vec<PdfEntry>,
    pub warnings: Vec<String>,
}
