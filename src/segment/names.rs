use std::ops::Range;

use anyhow::Result;
use tracing::debug;

use super::{BULLET, DtcSegmenter};
use crate::pdf::{PageSource, StyledSpan};

impl DtcSegmenter {
    /// Pass A: bold bulleted labels between the target and next code tokens.
    pub(super) fn solution_names<S: PageSource + ?Sized>(
        &self,
        source: &S,
        pages: Range<usize>,
        target_label: &str,
        next_label: Option<&str>,
    ) -> Result<Vec<String>> {
        let Some(target_token) = self.code_token(target_label) else {
            debug!(label = %target_label, "target label carries no code token");
            return Ok(Vec::new());
        };
        let next_token = match next_label {
            Some(label) => match self.code_token(label) {
                Some(token) => Some(token),
                None => {
                    debug!(label = %label, "next label carries no code token");
                    return Ok(Vec::new());
                }
            },
            None => None,
        };

        let mut page_markup = Vec::with_capacity(pages.len());
        for page_index in pages {
            page_markup.push(source.styled_markup(page_index)?);
        }
        let markup = page_markup.join("\n");

        let Some(region) = region_between_tokens(&markup, target_token, next_token) else {
            debug!(
                target_token = %target_token,
                next_token = %next_token.unwrap_or_default(),
                "no styled region between code tokens"
            );
            return Ok(Vec::new());
        };

        Ok(collect_solution_names(&self.scanner.styled_spans(region)))
    }
}

/// Markup after the first target token and before the first next token.
pub(super) fn region_between_tokens<'m>(
    markup: &'m str,
    target_token: &str,
    next_token: Option<&str>,
) -> Option<&'m str> {
    let start = markup.find(target_token)? + target_token.len();
    let Some(next_token) = next_token else {
        return Some(&markup[start..]);
    };

    let end = markup.find(next_token)?;
    if end > start {
        Some(&markup[start..end])
    } else {
        None
    }
}

#[derive(Debug)]
enum Streak {
    Idle,
    InStreak(String),
}

/// Names opened by a bold bullet, accumulated over the following bold spans and
/// closed by the first plain span. An unclosed streak is dropped.
///
/// Whitespace-only runs never reach this point, so they cannot close a streak.
pub(super) fn collect_solution_names(spans: &[StyledSpan]) -> Vec<String> {
    let mut names = Vec::new();
    let mut state = Streak::Idle;

    for span in spans {
        state = match state {
            _ if span.bold && span.text.trim() == BULLET => Streak::InStreak(String::new()),
            Streak::InStreak(mut buffer) if span.bold => {
                buffer.push_str(&span.text);
                buffer.push(' ');
                Streak::InStreak(buffer)
            }
            Streak::InStreak(buffer) => {
                names.push(close_streak(&buffer));
                Streak::Idle
            }
            Streak::Idle => Streak::Idle,
        };
    }

    if let Streak::InStreak(buffer) = state {
        debug!(dropped = %buffer.trim(), "solution name streak never closed");
    }

    names
}

/// The first character of a streak is its ordinal numeral.
fn close_streak(buffer: &str) -> String {
    let mut chars = buffer.chars();
    chars.next();
    chars.as_str().trim().to_string()
}
