use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::extract::count_rows;
use crate::model::{ExtractRunManifest, PdfInventoryManifest};
use crate::util::read_json;

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.cache_root.join("manifests");
    let inventory_path = manifest_dir.join("pdf_inventory.json");
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| args.cache_root.join("dtc_solutions.sqlite"));

    info!(cache_root = %args.cache_root.display(), "status requested");

    if inventory_path.exists() {
        let inventory: PdfInventoryManifest = read_json(&inventory_path)?;
        info!(
            generated_at = %inventory.generated_at,
            pdf_count = inventory.pdf_count,
            "loaded inventory manifest"
        );
    } else {
        warn!(path = %inventory_path.display(), "inventory manifest missing");
    }

    match latest_run_manifest(&manifest_dir)? {
        Some(path) => {
            let manifest: ExtractRunManifest = read_json(&path)?;
            info!(
                run_id = %manifest.run_id,
                status = %manifest.status,
                updated_at = %manifest.updated_at,
                processed = manifest.counts.processed_pdf_count,
                failed = manifest.counts.failed_pdf_count,
                dtc_sections = manifest.counts.dtc_sections,
                empty_sections = manifest.counts.empty_sections,
                records = manifest.counts.records_written,
                warnings = manifest.warnings.len(),
                "loaded latest extract run manifest"
            );
        }
        None => warn!(path = %manifest_dir.display(), "no extract run manifest found"),
    }

    if db_path.exists() {
        let conn = Connection::open(&db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        let docs_count = count_rows(&conn, "SELECT COUNT(*) FROM docs").unwrap_or(0);
        let solutions_count = count_rows(&conn, "SELECT COUNT(*) FROM solutions").unwrap_or(0);
        let dtc_count = count_rows(&conn, "SELECT COUNT(DISTINCT dtc) FROM solutions").unwrap_or(0);

        info!(
            path = %db_path.display(),
            docs = docs_count,
            solutions = solutions_count,
            dtcs = dtc_count,
            "database status"
        );
    } else {
        warn!(path = %db_path.display(), "database file missing");
    }

    Ok(())
}

/// Run manifests are named `extract_run_<utc compact>.json`, so the greatest
/// name is the most recent run.
fn latest_run_manifest(manifest_dir: &Path) -> Result<Option<PathBuf>> {
    if !manifest_dir.exists() {
        return Ok(None);
    }

    let entries = fs::read_dir(manifest_dir)
        .with_context(|| format!("failed to read {}", manifest_dir.display()))?;

    let mut latest: Option<PathBuf> = None;
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to read entry in {}", manifest_dir.display()))?
            .path();
        let is_run_manifest = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("extract_run_") && name.ends_with(".json"));

        if is_run_manifest && latest.as_ref().is_none_or(|current| &path > current) {
            latest = Some(path);
        }
    }

    Ok(latest)
}
