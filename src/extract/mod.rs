/*!
 * Extraction stages: source documents to locale CSV files.
 *
 * - `workbook`: data-supplement workbook to the normative components (step1)
 * - `jsonld_check`: read-only id comparison against the JSON-LD (step2)
 * - `anchored`: manifest-anchored DOCX text extraction (step3)
 * - `sections`: manifest-driven section extraction with chunking
 * - `hashed`: heading-tracking extraction with content-hashed keys
 * - `pdf`: footnotes and hyperlinks from the rendered PDF
 *
 * The anchor resolution shared by the DOCX stages lives here.
 */

use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::manifest::{AnchorKind, Anchor, Section};
use crate::text_utils::norm_ci;

pub mod anchored;
pub mod hashed;
pub mod jsonld_check;
pub mod pdf;
pub mod sections;
pub mod workbook;

static HEADING_STYLE_LEVEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^heading\s+(\d+)").unwrap());

/// Kind of a stream item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Paragraph,
    Table,
}

/// One entry of the linear document stream
#[derive(Debug, Clone, PartialEq)]
pub struct StreamItem {
    pub kind: ItemKind,
    pub text: String,
    pub is_heading: bool,
    /// Level from a `Heading N` style
    pub heading_level: Option<u32>,
    /// Non-empty cell texts of a table, in row order
    pub cells: Vec<String>,
}

impl StreamItem {
    /// Paragraph item; heading flag and level come from the style name
    pub fn paragraph(style: &str, text: String) -> Self {
        Self {
            kind: ItemKind::Paragraph,
            text,
            is_heading: is_heading_style(style),
            heading_level: heading_level(style),
            cells: Vec::new(),
        }
    }

    pub fn table(text: String, cells: Vec<String>) -> Self {
        Self {
            kind: ItemKind::Table,
            text,
            is_heading: false,
            heading_level: None,
            cells,
        }
    }

    fn is_paragraph_with_text(&self) -> bool {
        self.kind == ItemKind::Paragraph && !self.text.is_empty()
    }
}

/// Styles named `Heading…` mark headings
pub fn is_heading_style(style: &str) -> bool {
    style.to_lowercase().starts_with("heading")
}

/// Level of a `Heading N` style
pub fn heading_level(style: &str) -> Option<u32> {
    HEADING_STYLE_LEVEL
        .captures(style)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn anchor_matches(kind: AnchorKind, hay: &str, needles: &[String]) -> bool {
    needles.iter().any(|needle| match kind {
        AnchorKind::HeadingText => hay == needle,
        AnchorKind::HeadingContains | AnchorKind::ParagraphContains => hay.contains(needle.as_str()),
        AnchorKind::StartOfDocument | AnchorKind::Unknown => false,
    })
}

/// Index of the stream item an anchor points at.
///
/// Heading anchors try headings first and then any paragraph;
/// `paragraph_contains` looks at every paragraph.
pub fn locate_anchor(items: &[StreamItem], anchor: &Anchor) -> Option<usize> {
    if anchor.kind == AnchorKind::StartOfDocument {
        return Some(0);
    }

    let needles: Vec<String> = anchor.candidates().iter().map(|c| norm_ci(c)).collect();
    if needles.is_empty() {
        return None;
    }

    let find = |headings_only: bool| {
        items.iter().position(|it| {
            it.is_paragraph_with_text()
                && (!headings_only || it.is_heading)
                && anchor_matches(anchor.kind, &norm_ci(&it.text), &needles)
        })
    };

    match anchor.kind {
        AnchorKind::HeadingContains | AnchorKind::HeadingText => find(true).or_else(|| find(false)),
        AnchorKind::ParagraphContains => find(false),
        _ => None,
    }
}

/// Index of the first heading containing one of a `heading_contains` anchor's texts.
///
/// Only paragraphs with a `Heading…` style are candidates and other anchor
/// types never resolve.
pub fn locate_heading_anchor(items: &[StreamItem], anchor: &Anchor) -> Option<usize> {
    if anchor.kind != AnchorKind::HeadingContains {
        return None;
    }
    let needles: Vec<String> = anchor.candidates().iter().map(|c| norm_ci(c)).collect();
    if needles.is_empty() {
        return None;
    }
    items.iter().position(|it| {
        it.is_paragraph_with_text()
            && it.is_heading
            && anchor_matches(anchor.kind, &norm_ci(&it.text), &needles)
    })
}

/// Span of a section in the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionRange {
    /// Index into the manifest's sections
    pub section: usize,
    /// Anchor item
    pub start: usize,
    /// Start of the next anchored section, or the stream length
    pub end: usize,
}

/// Ranges of every section whose anchor resolves, in document order.
///
/// Every anchored section is a boundary, whatever its action.
pub fn compute_ranges(items: &[StreamItem], sections: &[Section]) -> Vec<SectionRange> {
    compute_ranges_with(items, sections, locate_anchor)
}

/// Ranges of every section whose anchor `locate` resolves, in document order
pub fn compute_ranges_with<F>(items: &[StreamItem], sections: &[Section], locate: F) -> Vec<SectionRange>
where
    F: Fn(&[StreamItem], &Anchor) -> Option<usize>,
{
    let mut starts: Vec<(usize, usize)> = sections
        .iter()
        .enumerate()
        .filter_map(|(i, s)| {
            let anchor = s.docx_anchor.as_ref()?;
            locate(items, anchor).map(|idx| (idx, i))
        })
        .collect();
    starts.sort_by_key(|(idx, _)| *idx);

    starts
        .iter()
        .enumerate()
        .map(|(j, (start, section))| SectionRange {
            section: *section,
            start: *start,
            end: starts.get(j + 1).map(|(next, _)| *next).unwrap_or(items.len()),
        })
        .collect()
}

/// Progress bar in the house style, hidden when `len` is zero
pub fn progress_bar(len: u64, unit: &str) -> ProgressBar {
    if len == 0 {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template(&format!(
            "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}}",
            unit
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style.progress_chars("█▓▒░"));
    pb
}
