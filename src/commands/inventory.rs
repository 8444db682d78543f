use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::cli::InventoryArgs;
use crate::model::{PdfEntry, PdfInventoryManifest};
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let source_dir = args
        .source_dir
        .clone()
        .unwrap_or_else(|| args.cache_root.clone());
    let manifest = build_manifest(&source_dir)?;

    if args.dry_run {
        info!(
            pdf_count = manifest.pdf_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| args.cache_root.join("manifests").join("pdf_inventory.json"));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(pdf_count = manifest.pdf_count, "inventory completed");

    Ok(())
}

pub fn build_manifest(source_dir: &Path) -> Result<PdfInventoryManifest> {
    let mut pdf_paths = discover_pdfs(source_dir)?;
    pdf_paths.sort();

    if pdf_paths.is_empty() {
        bail!("no PDFs found in {}", source_dir.display());
    }

    let mut pdfs = Vec::with_capacity(pdf_paths.len());
    for path in pdf_paths {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(ToOwned::to_owned)
            .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;

        let size_bytes = fs::metadata(&path)
            .with_context(|| format!("failed to stat {}", path.display()))?
            .len();
        let sha256 = sha256_file(&path)?;

        pdfs.push(PdfEntry {
            filename,
            sha256,
            size_bytes,
        });
    }

    Ok(PdfInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: source_dir.display().to_string(),
        pdf_count: pdfs.len(),
        pdfs,
    })
}

fn discover_pdfs(source_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pdfs = Vec::new();

    let entries = fs::read_dir(source_dir)
        .with_context(|| format!("failed to read {}", source_dir.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", source_dir.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);

        if is_pdf {
            pdfs.push(path);
        }
    }

    Ok(pdfs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_manifest_lists_pdfs_sorted_by_filename() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        fs::write(dir.path().join("TM411919.pdf"), b"second").expect("pdf should be written");
        fs::write(dir.path().join("TM410319.PDF"), b"first").expect("pdf should be written");
        fs::write(dir.path().join("notes.txt"), b"ignored").expect("txt should be written");
        fs::create_dir(dir.path().join("nested.pdf")).expect("dir should be created");

        let manifest = build_manifest(dir.path()).expect("manifest should build");
        let names = manifest
            .pdfs
            .iter()
            .map(|entry| entry.filename.as_str())
            .collect::<Vec<&str>>();

        assert_eq!(manifest.pdf_count, 2);
        assert_eq!(names, vec!["TM410319.PDF", "TM411919.pdf"]);
        assert_eq!(manifest.pdfs[1].size_bytes, 6);
        assert_eq!(manifest.pdfs[0].sha256.len(), 64);
    }

    #[test]
    fn build_manifest_fails_without_pdfs() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        assert!(build_manifest(dir.path()).is_err());
    }
}
