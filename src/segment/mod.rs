//! DTC segmentation: carves the content of one diagnostic trouble code out of
//! a page range and splits it into solution names and solution bodies.
//!
//! Names come from the styled view (bold runs opened by a bullet glyph), bodies
//! from the block view (plain blocks after the first solution name). The two
//! passes share nothing but their inputs, and their outputs are not aligned.

mod bodies;
mod names;
#[cfg(test)]
mod tests;

use std::ops::Range;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::pdf::{MarkupScanner, PageSource};

/// Pages read past the nominal end of a section to absorb page-break overflow.
pub const PAGE_OVERFLOW: usize = 2;

const BULLET: &str = "•";

/// The unit of work for one diagnostic trouble code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionBoundary {
    pub start_page: usize,
    pub end_page: usize,
    pub target_label: String,
    pub next_label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedSolutions {
    pub solution_names: Vec<String>,
    pub solutions: Vec<String>,
}

impl ExtractedSolutions {
    pub fn is_empty(&self) -> bool {
        self.solution_names.is_empty() && self.solutions.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct DtcSegmenter {
    scanner: MarkupScanner,
    code_token_regex: Regex,
    list_marker_regex: Regex,
    verdict_regex: Regex,
    footer_stamp_regex: Regex,
}

impl DtcSegmenter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            scanner: MarkupScanner::new()?,
            code_token_regex: Regex::new(r"([A-Za-z]{2,3} ?[A-Z0-9]{6,7}[-.][A-Z0-9]{1,2})")
                .context("failed to compile DTC code token regex")?,
            list_marker_regex: Regex::new(r"^\d+\.")
                .context("failed to compile list marker regex")?,
            verdict_regex: Regex::new(r"OK:|NOT OK:")
                .context("failed to compile OK/NOT OK verdict regex")?,
            footer_stamp_regex: Regex::new(r" -\d{2}-\d{2}[A-Z]{3}\d{2}-\d+/\d+")
                .context("failed to compile footer stamp regex")?,
        })
    }

    /// Solution names and cleaned solution bodies of one code.
    ///
    /// Every data-shape mismatch (no code token, boundary not found, no
    /// solution names) degrades to empty lists. Only page access fails.
    pub fn extract<S: PageSource + ?Sized>(
        &self,
        source: &S,
        boundary: &SectionBoundary,
    ) -> Result<ExtractedSolutions> {
        let pages = widened_pages(source.page_count(), boundary);
        let next_label = boundary.next_label.as_deref();

        let solution_names =
            self.solution_names(source, pages.clone(), &boundary.target_label, next_label)?;
        let solutions = self.solution_bodies(
            source,
            pages,
            &boundary.target_label,
            next_label,
            &solution_names,
        )?;

        if solution_names.is_empty() && solutions.is_empty() {
            debug!(
                target_label = %boundary.target_label,
                start_page = boundary.start_page,
                end_page = boundary.end_page,
                "nothing extractable for code"
            );
        }

        Ok(ExtractedSolutions {
            solution_names,
            solutions,
        })
    }

    /// The structured code token of a label, e.g. `ABV 000629.12`.
    pub fn code_token<'l>(&self, label: &'l str) -> Option<&'l str> {
        self.code_token_regex
            .captures(label)
            .and_then(|captures| captures.get(1))
            .map(|value| value.as_str())
    }
}

/// `[start, end + PAGE_OVERFLOW]`, clamped to the document. An end page before
/// the start page is not corrected and may leave the range empty.
fn widened_pages(page_count: usize, boundary: &SectionBoundary) -> Range<usize> {
    let end = boundary
        .end_page
        .saturating_add(PAGE_OVERFLOW + 1)
        .min(page_count);
    boundary.start_page.min(end)..end
}
