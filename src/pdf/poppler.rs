use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use super::PageSource;
use super::markup::{MarkupScanner, page_element};
use crate::outline::OutlineEntry;

/// A manual opened through the poppler command-line tools.
#[derive(Debug, Clone)]
pub struct PopplerDocument {
    path: PathBuf,
    page_count: usize,
    scanner: MarkupScanner,
}

impl PopplerDocument {
    pub fn open(path: &Path) -> Result<Self> {
        let info = run_tool(Command::new("pdfinfo").arg(path), "pdfinfo", path)?;
        let page_count = parse_page_count(&info)
            .with_context(|| format!("pdfinfo reported no page count for {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            page_count,
            scanner: MarkupScanner::new()?,
        })
    }

    fn check_page(&self, page_index: usize) -> Result<String> {
        if page_index >= self.page_count {
            bail!(
                "page index {} out of range for {} ({} pages)",
                page_index,
                self.path.display(),
                self.page_count
            );
        }
        Ok((page_index + 1).to_string())
    }
}

impl PageSource for PopplerDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn styled_markup(&self, page_index: usize) -> Result<String> {
        let page_number = self.check_page(page_index)?;
        let xml = run_tool(
            Command::new("pdftohtml")
                .arg("-xml")
                .arg("-i")
                .arg("-q")
                .arg("-f")
                .arg(&page_number)
                .arg("-l")
                .arg(&page_number)
                .arg("-stdout")
                .arg(&self.path),
            "pdftohtml",
            &self.path,
        )
        .with_context(|| format!("failed to render page {} as markup", page_number))?;

        Ok(page_element(&xml).to_string())
    }

    fn text_blocks(&self, page_index: usize) -> Result<Vec<String>> {
        let page_number = self.check_page(page_index)?;
        let layout = run_tool(
            Command::new("pdftotext")
                .arg("-enc")
                .arg("UTF-8")
                .arg("-bbox-layout")
                .arg("-f")
                .arg(&page_number)
                .arg("-l")
                .arg(&page_number)
                .arg(&self.path)
                .arg("-"),
            "pdftotext",
            &self.path,
        )
        .with_context(|| format!("failed to extract blocks of page {}", page_number))?;

        Ok(self.scanner.bbox_blocks(&layout))
    }

    fn navigation_outline(&self) -> Result<Vec<OutlineEntry>> {
        let xml = run_tool(
            Command::new("pdftohtml")
                .arg("-xml")
                .arg("-i")
                .arg("-q")
                .arg("-f")
                .arg("1")
                .arg("-l")
                .arg("1")
                .arg("-stdout")
                .arg(&self.path),
            "pdftohtml",
            &self.path,
        )
        .context("failed to read navigation outline")?;

        Ok(self.scanner.outline(&xml))
    }
}

fn run_tool(command: &mut Command, program: &str, pdf_path: &Path) -> Result<String> {
    let output = command
        .output()
        .with_context(|| format!("failed to execute {} for {}", program, pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "{} returned non-zero exit status for {}: {}",
            program,
            pdf_path.display(),
            stderr.trim()
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).replace('\u{0000}', ""))
}

fn parse_page_count(info: &str) -> Option<usize> {
    info.lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopplerVersions {
    pub pdfinfo: String,
    pub pdftohtml: String,
    pub pdftotext: String,
}

impl PopplerVersions {
    pub fn collect() -> Result<Self> {
        Ok(Self {
            pdfinfo: command_version("pdfinfo", &["-v"])?,
            pdftohtml: command_version("pdftohtml", &["-v"])?,
            pdftotext: command_version("pdftotext", &["-v"])?,
        })
    }
}

fn command_version(program: &str, args: &[&str]) -> Result<String> {
    // poppler tools print their version on stderr and may exit non-zero for -v
    let output = Command::new(program)
        .args(args)
        .output()
        .with_context(|| format!("failed to run {} {}", program, args.join(" ")))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let source = if stdout.trim().is_empty() {
        stderr.trim()
    } else {
        stdout.trim()
    };

    let version_line = source
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .unwrap_or("unknown");

    Ok(version_line.to_string())
}
