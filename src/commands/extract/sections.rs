use super::*;

/// Outline level holding the diagnostic chapter names.
const SECTION_LEVEL: usize = 2;
const OBSERVATION_LEVEL: usize = 3;
/// Outline level holding one diagnostic code label per entry.
const CODE_LEVEL: usize = 4;

/// One diagnostic code located in the outline, with its outline context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DtcSection {
    pub section: String,
    pub observation: String,
    pub boundary: SectionBoundary,
}

/// Diagnostic code sections of a flattened outline.
///
/// A code ends on the page of the row that follows it in the full outline,
/// before filtering. This assumes sibling sections never interleave; an outline
/// listing subsections out of page order yields a wrong end page, which is not
/// corrected here. The last row of the outline runs to `last_page`.
pub fn dtc_sections(rows: &[TitleRow], section_names: &[String], last_page: usize) -> Vec<DtcSection> {
    let mut seen_codes = HashSet::<&str>::new();
    let mut located = Vec::<(&TitleRow, usize, usize)>::new();

    for (index, row) in rows.iter().enumerate() {
        let section = row.heading(SECTION_LEVEL);
        let code = row.heading(CODE_LEVEL);
        if code.is_empty() || !section_names.iter().any(|name| name == section) {
            continue;
        }

        let Some(start_page) = row.page_num else {
            debug!(code = %code, "diagnostic code entry has no page target");
            continue;
        };
        if !seen_codes.insert(code) {
            continue;
        }

        let end_page = match rows.get(index + 1) {
            Some(next) => next.page_num.unwrap_or(start_page),
            None => last_page,
        };
        located.push((row, start_page, end_page));
    }

    let mut sections = Vec::with_capacity(located.len());
    for (position, (row, start_page, end_page)) in located.iter().enumerate() {
        let next_label = located
            .get(position + 1)
            .map(|(next, _, _)| next.heading(CODE_LEVEL).trim().to_string());

        sections.push(DtcSection {
            section: row.heading(SECTION_LEVEL).to_string(),
            observation: row.heading(OBSERVATION_LEVEL).to_string(),
            boundary: SectionBoundary {
                start_page: *start_page,
                end_page: *end_page,
                target_label: row.heading(CODE_LEVEL).trim().to_string(),
                next_label,
            },
        });
    }

    sections
}
