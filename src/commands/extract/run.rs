use super::*;

pub fn run(args: ExtractArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let cache_root = args.cache_root.clone();
    let source_dir = args
        .source_dir
        .clone()
        .unwrap_or_else(|| cache_root.clone());
    let manifest_dir = cache_root.join("manifests");
    ensure_directory(&manifest_dir)?;

    let inventory_manifest_path = args
        .inventory_manifest_path
        .clone()
        .unwrap_or_else(|| manifest_dir.join("pdf_inventory.json"));
    let run_manifest_path = args.run_manifest_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!(
            "extract_run_{}.json",
            utc_compact_string(started_ts)
        ))
    });
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| cache_root.join("dtc_solutions.sqlite"));
    let section_names = args.resolved_section_names();

    info!(cache_root = %cache_root.display(), run_id = %run_id, "starting extract");

    let inventory =
        load_or_refresh_inventory(&source_dir, &inventory_manifest_path, args.refresh_inventory)?;
    let tool_versions = PopplerVersions::collect()?;

    let mut warnings = Vec::new();
    let selected = select_pdfs(&inventory.pdfs, &args.files, &mut warnings);

    let segmenter = DtcSegmenter::new()?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.jobs.unwrap_or(0))
        .build()
        .context("failed to build extraction thread pool")?;

    let outcomes = pool.install(|| {
        selected
            .par_iter()
            .map(|pdf| {
                let outcome = process_manual(
                    &source_dir,
                    pdf,
                    &segmenter,
                    &section_names,
                    args.max_sections_per_doc,
                );
                (*pdf, outcome)
            })
            .collect::<Vec<_>>()
    });

    let mut counts = ExtractCounts {
        pdf_count: inventory.pdf_count,
        ..ExtractCounts::default()
    };
    let mut manuals = Vec::with_capacity(outcomes.len());
    for (pdf, outcome) in outcomes {
        match outcome {
            Ok(manual) => manuals.push(manual),
            Err(err) => {
                warn!(pdf = %pdf.filename, error = %format!("{err:#}"), "manual extraction failed");
                warnings.push(format!("{}: {:#}", pdf.filename, err));
                counts.failed_pdf_count += 1;
            }
        }
    }

    let mut connection = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;

    let extracted_at = now_utc_string();
    let mut all_records = Vec::new();
    let transaction = connection.transaction()?;
    for manual in &manuals {
        let records = manual.records();
        counts.records_written += write_manual(&transaction, manual, &records, &extracted_at)?;
        tally_manual(&mut counts, manual);
        warnings.extend(manual.warnings.iter().cloned());
        all_records.extend(records);
    }
    transaction.commit()?;

    if let Some(json_out) = &args.json_out {
        write_json_pretty(json_out, &all_records)?;
        info!(path = %json_out.display(), records = all_records.len(), "wrote solution records");
    }

    let docs_total = count_rows(&connection, "SELECT COUNT(*) FROM docs")?;
    let solutions_total = count_rows(&connection, "SELECT COUNT(*) FROM solutions")?;

    let status = if counts.failed_pdf_count == 0 {
        "completed"
    } else {
        "completed_with_errors"
    };

    let manifest = ExtractRunManifest {
        manifest_version: 1,
        run_id,
        db_schema_version: DB_SCHEMA_VERSION.to_string(),
        status: status.to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_extract_command(&args),
        section_names,
        tool_versions: Some(tool_versions),
        paths: ExtractPaths {
            cache_root: cache_root.display().to_string(),
            source_directory: source_dir.display().to_string(),
            inventory_manifest_path: inventory_manifest_path.display().to_string(),
            db_path: db_path.display().to_string(),
            json_out_path: args.json_out.as_ref().map(|path| path.display().to_string()),
        },
        counts,
        source_hashes: selected.into_iter().cloned().collect(),
        warnings,
    };

    write_json_pretty(&run_manifest_path, &manifest)?;

    info!(path = %run_manifest_path.display(), "wrote extract run manifest");
    info!(
        docs = docs_total,
        solutions = solutions_total,
        failed = manifest.counts.failed_pdf_count,
        "extract completed"
    );

    Ok(())
}

fn load_or_refresh_inventory(
    source_dir: &Path,
    inventory_manifest_path: &Path,
    refresh_inventory: bool,
) -> Result<PdfInventoryManifest> {
    if refresh_inventory || !inventory_manifest_path.exists() {
        let manifest = inventory::build_manifest(source_dir)?;
        write_json_pretty(inventory_manifest_path, &manifest)?;
        info!(
            path = %inventory_manifest_path.display(),
            pdf_count = manifest.pdf_count,
            "refreshed inventory manifest"
        );
        return Ok(manifest);
    }

    let manifest: PdfInventoryManifest = read_json(inventory_manifest_path)?;
    info!(
        path = %inventory_manifest_path.display(),
        pdf_count = manifest.pdf_count,
        "loaded existing inventory manifest"
    );
    Ok(manifest)
}

/// Inventory entries to process, in inventory order. An empty filter keeps all.
pub fn select_pdfs<'a>(
    pdfs: &'a [PdfEntry],
    files: &[String],
    warnings: &mut Vec<String>,
) -> Vec<&'a PdfEntry> {
    if files.is_empty() {
        return pdfs.iter().collect();
    }

    for file in files {
        if !pdfs.iter().any(|pdf| &pdf.filename == file) {
            warn!(file = %file, "requested file is not in the inventory");
            warnings.push(format!("{file}: not in the inventory"));
        }
    }

    pdfs.iter()
        .filter(|pdf| files.iter().any(|file| file == &pdf.filename))
        .collect()
}

pub fn tally_manual(counts: &mut ExtractCounts, manual: &ManualExtraction) {
    counts.processed_pdf_count += 1;
    if manual.outline_rows == 0 {
        counts.pdfs_without_outline += 1;
    }
    counts.outline_rows += manual.outline_rows;
    counts.dtc_sections += manual.sections.len();

    for dtc in &manual.sections {
        if dtc.extracted.is_empty() {
            counts.empty_sections += 1;
        }
        counts.solution_names += dtc.extracted.solution_names.len();
        counts.solutions += dtc.extracted.solutions.len();
    }
}

pub fn render_extract_command(args: &ExtractArgs) -> String {
    let mut command = vec![
        "dtc-extract".to_string(),
        "extract".to_string(),
        "--cache-root".to_string(),
        args.cache_root.display().to_string(),
    ];

    if let Some(path) = &args.source_dir {
        command.push("--source-dir".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.inventory_manifest_path {
        command.push("--inventory-manifest-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.run_manifest_path {
        command.push("--run-manifest-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.db_path {
        command.push("--db-path".to_string());
        command.push(path.display().to_string());
    }
    if args.refresh_inventory {
        command.push("--refresh-inventory".to_string());
    }
    for file in &args.files {
        command.push("--file".to_string());
        command.push(file.clone());
    }
    for name in &args.section_names {
        command.push("--section-name".to_string());
        command.push(name.clone());
    }
    if let Some(max_sections) = args.max_sections_per_doc {
        command.push("--max-sections-per-doc".to_string());
        command.push(max_sections.to_string());
    }
    if let Some(jobs) = args.jobs {
        command.push("--jobs".to_string());
        command.push(jobs.to_string());
    }
    if let Some(path) = &args.json_out {
        command.push("--json-out".to_string());
        command.push(path.display().to_string());
    }

    command.join(" ")
}
