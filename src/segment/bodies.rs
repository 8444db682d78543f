use std::ops::Range;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use super::{BULLET, DtcSegmenter};
use crate::pdf::PageSource;

impl DtcSegmenter {
    /// Pass B: cleaned text blocks from the first solution name onwards.
    pub(super) fn solution_bodies<S: PageSource + ?Sized>(
        &self,
        source: &S,
        pages: Range<usize>,
        target_label: &str,
        next_label: Option<&str>,
        solution_names: &[String],
    ) -> Result<Vec<String>> {
        let Some(first_name) = solution_names.first() else {
            return Ok(Vec::new());
        };

        let mut blocks = Vec::new();
        for page_index in pages {
            let mut page_blocks = source.text_blocks(page_index)?;
            // the last block of a page is its footer
            page_blocks.pop();
            blocks.extend(page_blocks);
        }

        let target_pattern = label_pattern(target_label)?;
        let next_pattern = next_label.map(label_pattern).transpose()?;
        let captured = capture_blocks(&blocks, &target_pattern, next_pattern.as_ref());

        let candidates = blocks_from_first_solution(&captured, first_name)?;
        let known_names = known_names_pattern(solution_names)?;

        Ok(candidates
            .iter()
            .filter_map(|block| self.clean_block(block, &known_names))
            .collect())
    }

    /// A cleaned solution body, or `None` when the block is layout noise.
    ///
    /// A block holding only a solution name cleans to an empty body and is kept.
    pub(super) fn clean_block(&self, block: &str, known_names: &Regex) -> Option<String> {
        let mut solution = block.replace('\n', " ");
        solution = self.list_marker_regex.replace(&solution, "").into_owned();
        if let Some(verdict) = self.verdict_regex.find(&solution) {
            solution.truncate(verdict.start());
        }
        solution = known_names.replace(&solution, "").into_owned();

        let solution = solution.trim();
        let solution = solution.strip_suffix(" •").unwrap_or(solution);

        let is_verdict = |text: &str| text.starts_with("OK") || text.starts_with("NOT OK:");
        let is_noise = is_verdict(block)
            || is_verdict(solution)
            || block.starts_with(BULLET)
            || solution.starts_with(BULLET)
            || solution == "Diagnostics"
            || self.footer_stamp_regex.is_match(solution);

        if is_noise {
            None
        } else {
            Some(solution.to_string())
        }
    }
}

/// A label as literal text, tolerating a line break wherever it has a space.
pub(super) fn label_pattern(label: &str) -> Result<Regex> {
    let pattern = regex::escape(label).replace(' ', "[ \n]");
    Regex::new(&pattern).with_context(|| format!("failed to compile label pattern for {label}"))
}

fn known_names_pattern(solution_names: &[String]) -> Result<Regex> {
    let alternation = solution_names
        .iter()
        .map(|name| regex::escape(name))
        .collect::<Vec<String>>()
        .join("|");
    Regex::new(&format!(r"^\d* ?(?:{alternation})"))
        .context("failed to compile solution name prefix regex")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    Seeking,
    Capturing,
}

/// Blocks after the first target match, up to (excluding) the next match.
///
/// A block matching the target again while capturing is a repeated heading on
/// a continuation page and is skipped.
pub(super) fn capture_blocks<'b>(
    blocks: &'b [String],
    target_pattern: &Regex,
    next_pattern: Option<&Regex>,
) -> Vec<&'b str> {
    let mut state = Capture::Seeking;
    let mut captured = Vec::new();

    for block in blocks {
        if target_pattern.is_match(block) {
            state = Capture::Capturing;
            continue;
        }

        match state {
            Capture::Seeking => {}
            Capture::Capturing => {
                if next_pattern.is_some_and(|pattern| pattern.is_match(block)) {
                    return captured;
                }
                captured.push(block.as_str());
            }
        }
    }

    match state {
        Capture::Seeking => debug!("target label never matched a block"),
        Capture::Capturing if next_pattern.is_some() => {
            debug!("next label never matched a block, captured to the end")
        }
        Capture::Capturing => {}
    }

    captured
}

/// Captured blocks from the one introducing the first solution name.
fn blocks_from_first_solution<'b>(captured: &[&'b str], first_name: &str) -> Result<Vec<&'b str>> {
    let anchor = Regex::new(&format!(r"\d+ ?{}", regex::escape(first_name)))
        .context("failed to compile first solution anchor regex")?;

    let start = captured
        .iter()
        .position(|block| anchor.is_match(&block.replace('\n', " ")));

    Ok(match start {
        Some(index) => captured[index..].to_vec(),
        None => {
            debug!(first_name = %first_name, "first solution name not found in blocks");
            Vec::new()
        }
    })
}
