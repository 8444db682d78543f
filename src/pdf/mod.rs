#[cfg(test)]
pub mod fake;
mod markup;
mod poppler;

use anyhow::Result;

use crate::outline::OutlineEntry;

pub use markup::{MarkupScanner, StyledSpan};
pub use poppler::{PopplerDocument, PopplerVersions};

/// Page-level access to one open manual.
///
/// Page indices are zero-based. Implementations are not expected to be shared
/// across threads; open one handle per worker instead.
pub trait PageSource {
    fn page_count(&self) -> usize;

    /// The page rendered as markup exposing text runs and their bold containers.
    fn styled_markup(&self, page_index: usize) -> Result<String>;

    /// The page's position-ordered text blocks; a block may contain line breaks.
    fn text_blocks(&self, page_index: usize) -> Result<Vec<String>>;

    /// The navigation outline, empty when the document has none.
    fn navigation_outline(&self) -> Result<Vec<OutlineEntry>>;
}
