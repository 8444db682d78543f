use anyhow::{Context, Result};
use quick_xml::escape::unescape;
use regex::Regex;

use crate::outline::OutlineEntry;

/// Element that carries one positioned text run in `pdftohtml -xml` output.
const RUN_ELEMENT: &str = "text";
const BOLD_ELEMENT: &str = "b";

/// One run of formatted text from the styled page view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledSpan {
    pub text: String,
    pub bold: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Open {
        name: &'a str,
        attrs: &'a str,
        self_closing: bool,
    },
    Close {
        name: &'a str,
    },
    Text(&'a str),
}

/// Tolerant tag scanner for poppler's XML outputs.
///
/// Fragments cut out of the middle of a page are expected: unmatched closing
/// tags are ignored and unclosed elements simply stay open until the end.
#[derive(Debug, Clone)]
pub struct MarkupScanner {
    token_regex: Regex,
    page_attr_regex: Regex,
}

impl MarkupScanner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            token_regex: Regex::new(
                r"(?s)<!--.*?-->|<[!?][^>]*>|<(/?)([A-Za-z][A-Za-z0-9:_-]*)([^>]*)>|([^<]+)",
            )
            .context("failed to compile markup token regex")?,
            page_attr_regex: Regex::new(r#"\bpage="(\d+)""#)
                .context("failed to compile outline page attribute regex")?,
        })
    }

    fn tokens<'a>(&self, markup: &'a str) -> Vec<Token<'a>> {
        let mut tokens = Vec::new();
        for captures in self.token_regex.captures_iter(markup) {
            if let Some(text) = captures.get(4) {
                tokens.push(Token::Text(text.as_str()));
                continue;
            }

            let Some(name) = captures.get(2) else {
                continue;
            };
            let closing = captures
                .get(1)
                .map(|value| !value.as_str().is_empty())
                .unwrap_or(false);
            if closing {
                tokens.push(Token::Close {
                    name: name.as_str(),
                });
                continue;
            }

            let attrs = captures.get(3).map(|value| value.as_str()).unwrap_or("");
            tokens.push(Token::Open {
                name: name.as_str(),
                attrs,
                self_closing: attrs.trim_end().ends_with('/'),
            });
        }
        tokens
    }

    /// Text runs of a styled-markup fragment, in document order.
    ///
    /// Only runs nested in a `<text>` element opened inside the fragment count;
    /// a run is bold when its immediate parent is `<b>`.
    pub fn styled_spans(&self, fragment: &str) -> Vec<StyledSpan> {
        let mut open = Vec::<&str>::new();
        let mut spans = Vec::new();

        for token in self.tokens(fragment) {
            match token {
                Token::Open {
                    name,
                    self_closing: false,
                    ..
                } => open.push(name),
                Token::Open { .. } => {}
                Token::Close { name } => {
                    if let Some(position) = open
                        .iter()
                        .rposition(|candidate| candidate.eq_ignore_ascii_case(name))
                    {
                        open.truncate(position);
                    }
                }
                Token::Text(raw) => {
                    if !open
                        .iter()
                        .any(|name| name.eq_ignore_ascii_case(RUN_ELEMENT))
                    {
                        continue;
                    }
                    let text = decode_entities(raw);
                    if text.trim().is_empty() {
                        continue;
                    }
                    let bold = open
                        .last()
                        .map(|name| name.eq_ignore_ascii_case(BOLD_ELEMENT))
                        .unwrap_or(false);
                    spans.push(StyledSpan { text, bold });
                }
            }
        }

        spans
    }

    /// Blocks of a `pdftotext -bbox-layout` document: words joined by spaces,
    /// lines joined by line breaks.
    pub fn bbox_blocks(&self, document: &str) -> Vec<String> {
        let mut blocks = Vec::new();
        let mut lines = Vec::<String>::new();
        let mut words = Vec::<String>::new();
        let mut word: Option<String> = None;

        for token in self.tokens(document) {
            match token {
                Token::Open { name: "block", .. } => lines.clear(),
                Token::Open { name: "line", .. } => words.clear(),
                Token::Open {
                    name: "word",
                    self_closing: false,
                    ..
                } => word = Some(String::new()),
                Token::Text(raw) => {
                    if let Some(current) = word.as_mut() {
                        current.push_str(&decode_entities(raw));
                    }
                }
                Token::Close { name: "word" } => {
                    if let Some(current) = word.take() {
                        let current = current.trim();
                        if !current.is_empty() {
                            words.push(current.to_string());
                        }
                    }
                }
                Token::Close { name: "line" } => {
                    if !words.is_empty() {
                        lines.push(words.join(" "));
                    }
                    words.clear();
                }
                Token::Close { name: "block" } => {
                    if !lines.is_empty() {
                        blocks.push(lines.join("\n"));
                    }
                    lines.clear();
                }
                _ => {}
            }
        }

        blocks
    }

    /// The first `<outline>` tree of a `pdftohtml -xml` document.
    ///
    /// An `<item>` directly followed by a nested `<outline>` owns that list as
    /// its children; a nested list with no preceding item becomes an untitled
    /// group. Page attributes are one-based and returned zero-based.
    pub fn outline(&self, document: &str) -> Vec<OutlineEntry> {
        let mut levels = Vec::<OutlineLevel>::new();
        let mut item: Option<(String, Option<usize>)> = None;

        for token in self.tokens(document) {
            match token {
                Token::Open {
                    name: "outline",
                    self_closing: false,
                    ..
                } => {
                    levels.push(OutlineLevel::default());
                }
                Token::Open {
                    name: "item",
                    attrs,
                    self_closing: false,
                } if !levels.is_empty() => {
                    item = Some((String::new(), self.page_attribute(attrs)));
                }
                Token::Text(raw) => {
                    if let Some((title, _)) = item.as_mut() {
                        title.push_str(raw);
                    }
                }
                Token::Close { name: "item" } => {
                    if let (Some((raw_title, page)), Some(level)) = (item.take(), levels.last_mut())
                    {
                        level.entries.push(OutlineEntry::Leaf {
                            title: normalize_label(&decode_entities(&raw_title)),
                            page,
                        });
                        level.last_was_item = true;
                    }
                }
                Token::Close { name: "outline" } => {
                    let Some(finished) = levels.pop() else {
                        continue;
                    };
                    match levels.last_mut() {
                        Some(parent) => parent.adopt(finished.entries),
                        None => return finished.entries,
                    }
                }
                _ => {}
            }
        }

        // Truncated output: fold whatever is still open into the root.
        while let Some(finished) = levels.pop() {
            match levels.last_mut() {
                Some(parent) => parent.adopt(finished.entries),
                None => return finished.entries,
            }
        }

        Vec::new()
    }

    fn page_attribute(&self, attrs: &str) -> Option<usize> {
        self.page_attr_regex
            .captures(attrs)
            .and_then(|captures| captures.get(1))
            .and_then(|value| value.as_str().parse::<usize>().ok())
            .and_then(|page| page.checked_sub(1))
    }
}

#[derive(Debug, Default)]
struct OutlineLevel {
    entries: Vec<OutlineEntry>,
    last_was_item: bool,
}

impl OutlineLevel {
    fn adopt(&mut self, children: Vec<OutlineEntry>) {
        let preceding = if self.last_was_item {
            self.entries.pop()
        } else {
            None
        };

        let group = match preceding {
            Some(OutlineEntry::Leaf { title, page }) => OutlineEntry::Group {
                title: Some(title).filter(|value| !value.is_empty()),
                page,
                children,
            },
            Some(other) => {
                self.entries.push(other);
                OutlineEntry::Group {
                    title: None,
                    page: None,
                    children,
                }
            }
            None => OutlineEntry::Group {
                title: None,
                page: None,
                children,
            },
        };

        self.entries.push(group);
        self.last_was_item = false;
    }
}

/// The `<page>` element of a `pdftohtml -xml` document, without the outline.
pub fn page_element(document: &str) -> &str {
    let Some(start) = document.find("<page") else {
        return "";
    };
    match document[start..].find("</page>") {
        Some(end) => &document[start..start + end + "</page>".len()],
        None => &document[start..],
    }
}

/// Character references of poppler's XML text, with no-break spaces folded to
/// plain spaces. A run that does not unescape cleanly is kept as-is.
pub fn decode_entities(raw: &str) -> String {
    let decoded = unescape(raw)
        .map(|text| text.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    decoded.replace('\u{00a0}', " ")
}

fn normalize_label(raw_label: &str) -> String {
    raw_label
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}
