use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::OutlineArgs;
use crate::outline::{TitleRow, flatten_outline};
use crate::pdf::{PageSource, PopplerDocument};

pub fn run(args: OutlineArgs) -> Result<()> {
    let document = PopplerDocument::open(&args.pdf)?;
    let rows = flatten_outline(&document.navigation_outline()?);

    if rows.is_empty() {
        warn!(pdf = %args.pdf.display(), "no outline found in the PDF");
    } else {
        info!(pdf = %args.pdf.display(), rows = rows.len(), "flattened outline");
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    if args.json {
        serde_json::to_writer_pretty(&mut output, &rows)
            .context("failed to serialize outline json output")?;
        writeln!(output)?;
    } else {
        write_outline_tree(&mut output, &rows)?;
    }
    output.flush()?;
    Ok(())
}

/// One line per row, four spaces and one asterisk per level below H1.
pub fn write_outline_tree<W: Write>(output: &mut W, rows: &[TitleRow]) -> Result<()> {
    for row in rows {
        let level = row.depth().max(1);
        let indent = " ".repeat(4 * (level - 1));
        let stars = "*".repeat(level);
        match row.page_num {
            Some(page) => writeln!(output, "{indent}{stars} {} (Page {page})", row.title())?,
            None => writeln!(output, "{indent}{stars} {}", row.title())?,
        }
    }
    Ok(())
}
