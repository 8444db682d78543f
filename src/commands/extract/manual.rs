use super::*;

#[derive(Debug, Clone)]
pub struct DtcExtraction {
    pub section: DtcSection,
    pub extracted: ExtractedSolutions,
}

/// Everything extracted from one manual.
#[derive(Debug, Clone)]
pub struct ManualExtraction {
    pub pdf: PdfEntry,
    pub page_count: usize,
    pub outline_rows: usize,
    pub sections: Vec<DtcExtraction>,
    pub warnings: Vec<String>,
}

impl ManualExtraction {
    pub fn records(&self) -> Vec<SolutionRecord> {
        self.sections
            .iter()
            .flat_map(|dtc| solution_records(&self.pdf.filename, dtc))
            .collect()
    }
}

/// Name rows first, then body rows; the two lists are never zipped.
pub fn solution_records(pdf_file: &str, dtc: &DtcExtraction) -> Vec<SolutionRecord> {
    let record = |solution_name: Option<&String>, solution: Option<&String>| SolutionRecord {
        pdf_file: pdf_file.to_string(),
        section: dtc.section.section.clone(),
        observation: dtc.section.observation.clone(),
        dtc: dtc.section.boundary.target_label.clone(),
        solution_name: solution_name.cloned(),
        solution: solution.cloned(),
    };

    dtc.extracted
        .solution_names
        .iter()
        .map(|name| record(Some(name), None))
        .chain(
            dtc.extracted
                .solutions
                .iter()
                .map(|solution| record(None, Some(solution))),
        )
        .collect()
}

/// Open one manual with its own poppler handle and extract it.
pub fn process_manual(
    source_dir: &Path,
    pdf: &PdfEntry,
    segmenter: &DtcSegmenter,
    section_names: &[String],
    max_sections: Option<usize>,
) -> Result<ManualExtraction> {
    let path = source_dir.join(&pdf.filename);
    let document = PopplerDocument::open(&path)?;
    extract_manual(&document, pdf, segmenter, section_names, max_sections)
        .with_context(|| format!("failed to extract {}", path.display()))
}

pub fn extract_manual<S: PageSource + ?Sized>(
    source: &S,
    pdf: &PdfEntry,
    segmenter: &DtcSegmenter,
    section_names: &[String],
    max_sections: Option<usize>,
) -> Result<ManualExtraction> {
    let page_count = source.page_count();
    let mut manual = ManualExtraction {
        pdf: pdf.clone(),
        page_count,
        outline_rows: 0,
        sections: Vec::new(),
        warnings: Vec::new(),
    };

    let outline = source.navigation_outline()?;
    if outline.is_empty() {
        warn!(pdf = %pdf.filename, "no outline found in the PDF");
        manual
            .warnings
            .push(format!("{}: no navigation outline, nothing to extract", pdf.filename));
        return Ok(manual);
    }

    let rows = flatten_outline(&outline);
    manual.outline_rows = rows.len();

    let mut sections = dtc_sections(&rows, section_names, page_count.saturating_sub(1));
    if let Some(limit) = max_sections {
        sections.truncate(limit);
    }
    if sections.is_empty() {
        manual.warnings.push(format!(
            "{}: outline has no entries under {}",
            pdf.filename,
            section_names.join(" / ")
        ));
    }

    info!(
        pdf = %pdf.filename,
        pages = page_count,
        outline_rows = manual.outline_rows,
        sections = sections.len(),
        "extracting diagnostic codes"
    );

    for section in sections {
        let extracted = segmenter
            .extract(source, &section.boundary)
            .with_context(|| format!("failed to extract {}", section.boundary.target_label))?;
        manual.sections.push(DtcExtraction { section, extracted });
    }

    Ok(manual)
}
