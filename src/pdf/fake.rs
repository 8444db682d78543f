use anyhow::{Context, Result};

use super::PageSource;
use crate::outline::OutlineEntry;

/// In-memory manual for tests: one styled markup string and one block list per page.
#[derive(Debug, Clone, Default)]
pub struct FakeManual {
    pub pages: Vec<FakePage>,
    pub outline: Vec<OutlineEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub markup: String,
    pub blocks: Vec<String>,
}

impl FakePage {
    pub fn new(markup: &str, blocks: &[&str]) -> Self {
        Self {
            markup: markup.to_string(),
            blocks: blocks.iter().map(|block| block.to_string()).collect(),
        }
    }
}

impl FakeManual {
    fn page(&self, page_index: usize) -> Result<&FakePage> {
        self.pages
            .get(page_index)
            .with_context(|| format!("page index {} out of range", page_index))
    }
}

impl PageSource for FakeManual {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn styled_markup(&self, page_index: usize) -> Result<String> {
        Ok(self.page(page_index)?.markup.clone())
    }

    fn text_blocks(&self, page_index: usize) -> Result<Vec<String>> {
        Ok(self.page(page_index)?.blocks.clone())
    }

    fn navigation_outline(&self) -> Result<Vec<OutlineEntry>> {
        Ok(self.outline.clone())
    }
}
