/*!
 * Footnote and hyperlink extraction from the published PDF.
 *
 * Footnotes are taken from the bottom zone of each page and keyed by their
 * number; a footnote that continues on the next page is appended to. Link
 * annotations with a URI become one row per page, paragraph and URL.
 */

use anyhow::Result;
use indicatif::ProgressBar;
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use super::progress_bar;
use crate::file_utils::FileManager;
use crate::locale::{CsvLayout, LocaleRecord, write_locale_csv};
use crate::pdf::{PageText, TextBlock, read_pages};

// @const: Running header text that never names a section
const RUNNING_HEADER: &str = "DigComp 3.0";

// @const: Section assumed before the first header is seen
const INITIAL_SECTION: &str = "Inleiding";

// @const: Blocks starting above this line may carry the section header
const HEADER_ZONE: f64 = 100.0;

// @const: Height of the footnote zone at the bottom of the page
const FOOTER_ZONE: f64 = 180.0;

// @const: Context of a link outside every text block
const NO_CONTEXT: &str = "Context niet gevonden";

pub const FOOTERS_FILE: &str = "footers.csv";
pub const HYPERLINKS_FILE: &str = "hyperlinks.csv";

static FOOTNOTE_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^([1-9]|1[0-2])\.\s+").unwrap());

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdfReport {
    pub footers: Vec<LocaleRecord>,
    pub hyperlinks: Vec<LocaleRecord>,
}

fn is_page_number(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

/// First line of the first header-zone block that names a section
pub fn section_header(blocks: &[TextBlock]) -> Option<String> {
    blocks
        .iter()
        .filter(|b| b.y0 < HEADER_ZONE)
        .map(|b| b.text.trim())
        .find(|t| !t.is_empty() && *t != RUNNING_HEADER && !is_page_number(t) && t.chars().count() > 5)
        .and_then(|t| t.lines().next())
        .map(|l| l.trim().to_string())
}

/// Text of the footnote zone, one block per line group
pub fn footer_zone_text(blocks: &[TextBlock], page_height: f64) -> String {
    blocks
        .iter()
        .filter(|b| b.y0 > page_height - FOOTER_ZONE)
        .filter(|b| {
            let t = b.text.trim();
            t != RUNNING_HEADER && !is_page_number(t)
        })
        .fold(String::new(), |mut acc, b| {
            acc.push('\n');
            acc.push_str(&b.text);
            acc
        })
}

/// Numbered footnotes in a zone text, whitespace collapsed
pub fn split_footnotes(zone: &str) -> Vec<(u32, String)> {
    let starts: Vec<(u32, usize, usize)> = FOOTNOTE_START
        .captures_iter(zone)
        .filter_map(|c| {
            let whole = c.get(0)?;
            let n = c[1].parse().ok()?;
            Some((n, whole.start(), whole.end()))
        })
        .collect();

    starts
        .iter()
        .enumerate()
        .filter_map(|(i, &(n, _, body_start))| {
            let body_end = starts.get(i + 1).map(|s| s.1).unwrap_or(zone.len());
            let content = zone[body_start..body_end].split_whitespace().collect::<Vec<_>>().join(" ");
            (!content.is_empty()).then_some((n, content))
        })
        .collect()
}

/// Footnote and hyperlink rows of a sequence of pages
pub fn collect(pages: &[PageText]) -> PdfReport {
    collect_with_progress(pages, &ProgressBar::hidden())
}

fn collect_with_progress(pages: &[PageText], pb: &ProgressBar) -> PdfReport {
    let mut footers: BTreeMap<u32, LocaleRecord> = BTreeMap::new();
    let mut hyperlinks = Vec::new();
    let mut seen: HashSet<(u32, String, String)> = HashSet::new();
    let mut section = INITIAL_SECTION.to_string();

    for page in pages {
        pb.inc(1);
        let blocks = page.blocks();
        if let Some(header) = section_header(&blocks) {
            section = header;
        }

        for (n, content) in split_footnotes(&footer_zone_text(&blocks, page.height)) {
            footers
                .entry(n)
                .and_modify(|rec| {
                    rec.source.push(' ');
                    rec.source.push_str(&content);
                })
                .or_insert_with(|| LocaleRecord::new(format!("footer_{}", n), content.clone(), section.clone()));
        }

        for link in &page.links {
            let context = blocks
                .iter()
                .find(|b| b.contains(link.x0, link.top))
                .map(|b| b.text.replace('\n', " ").trim().to_string())
                .unwrap_or_else(|| NO_CONTEXT.to_string());
            if seen.insert((page.number, context.clone(), link.uri.clone())) {
                hyperlinks.push(LocaleRecord::new(format!("Pagina {}", page.number), link.uri.clone(), context));
            }
        }
    }

    PdfReport {
        footers: footers.into_values().collect(),
        hyperlinks,
    }
}

/// Write `footers.csv` and `hyperlinks.csv` for a PDF into `out_dir`
pub fn extract_pdf<P: AsRef<Path>, Q: AsRef<Path>>(pdf: P, out_dir: Q) -> Result<PdfReport> {
    let out_dir = out_dir.as_ref();
    FileManager::ensure_dir(out_dir)?;

    let pages = read_pages(pdf)?;
    let pb = progress_bar(pages.len() as u64, "pages");
    let report = collect_with_progress(&pages, &pb);
    pb.finish_and_clear();

    write_locale_csv(out_dir.join(FOOTERS_FILE), &report.footers, CsvLayout::Pdf)?;
    write_locale_csv(out_dir.join(HYPERLINKS_FILE), &report.hyperlinks, CsvLayout::Pdf)?;
    info!(
        "Found {} footnotes and {} hyperlinks in {} pages",
        report.footers.len(),
        report.hyperlinks.len(),
        pages.len()
    );
    Ok(report)
}
