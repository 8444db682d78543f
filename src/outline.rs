use serde::Serialize;

/// A node of a manual's navigation outline.
///
/// Leaves are plain bookmarks; groups own a nested list of entries and may be
/// untitled when the document only uses them to nest their children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutlineEntry {
    Leaf {
        title: String,
        page: Option<usize>,
    },
    Group {
        title: Option<String>,
        page: Option<usize>,
        children: Vec<OutlineEntry>,
    },
}

impl OutlineEntry {
    fn title(&self) -> &str {
        match self {
            Self::Leaf { title, .. } => title.trim(),
            Self::Group { title, .. } => title.as_deref().map(str::trim).unwrap_or(""),
        }
    }

    fn page(&self) -> Option<usize> {
        match self {
            Self::Leaf { page, .. } | Self::Group { page, .. } => *page,
        }
    }

    fn children(&self) -> &[OutlineEntry] {
        match self {
            Self::Leaf { .. } => &[],
            Self::Group { children, .. } => children,
        }
    }
}

/// One titled outline entry with its full heading chain.
///
/// `headings[0]` is H1; every row of a table has the same width, with empty
/// strings for levels below the entry's own depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleRow {
    pub headings: Vec<String>,
    pub page_num: Option<usize>,
}

impl TitleRow {
    /// Heading at a one-based level (`heading(2)` is H2); empty when absent.
    pub fn heading(&self, level: usize) -> &str {
        level
            .checked_sub(1)
            .and_then(|index| self.headings.get(index))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Depth of the row's own title, one-based.
    pub fn depth(&self) -> usize {
        self.headings
            .iter()
            .rposition(|heading| !heading.is_empty())
            .map(|index| index + 1)
            .unwrap_or(0)
    }

    pub fn title(&self) -> &str {
        self.heading(self.depth())
    }
}

pub fn max_header_level(entries: &[OutlineEntry]) -> usize {
    entries
        .iter()
        .map(|entry| 1 + max_header_level(entry.children()))
        .max()
        .unwrap_or(0)
}

/// Flatten an outline into rectangular title rows, depth-first pre-order.
///
/// Untitled entries produce no row but still occupy their level in their
/// descendants' chains.
pub fn flatten_outline(entries: &[OutlineEntry]) -> Vec<TitleRow> {
    let width = max_header_level(entries);
    let mut rows = Vec::new();
    let mut chain = Vec::<String>::with_capacity(width);
    collect_rows(entries, width, &mut chain, &mut rows);
    rows
}

fn collect_rows(
    entries: &[OutlineEntry],
    width: usize,
    chain: &mut Vec<String>,
    rows: &mut Vec<TitleRow>,
) {
    for entry in entries {
        let title = entry.title();
        if !title.is_empty() {
            let mut headings = chain.clone();
            headings.push(title.to_string());
            headings.resize(width, String::new());
            rows.push(TitleRow {
                headings,
                page_num: entry.page(),
            });
        }

        let children = entry.children();
        if !children.is_empty() {
            chain.push(title.to_string());
            collect_rows(children, width, chain, rows);
            chain.pop();
        }
    }
}
