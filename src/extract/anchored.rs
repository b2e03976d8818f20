/*!
 * Step 3: manifest-anchored DOCX text extraction.
 *
 * Every anchored section spans from its anchor to the next anchored section.
 * Anchors resolve against headings only (`heading_contains`). The anchor itself is left out; paragraphs and non-empty table cells in the
 * span become `texts` rows numbered with one counter across the document.
 */

use anyhow::Result;
use log::{info, warn};
use std::path::Path;

use super::{ItemKind, StreamItem, compute_ranges_with, locate_heading_anchor};
use crate::docx::{Block, DocxPackage, read_body};
use crate::locale::{Component, LocaleRecord, LocaleRepo, UpsertReport, upsert_locale_csv};
use crate::manifest::Manifest;
use crate::text_utils::clean_text;

#[derive(Debug, Clone, Default)]
pub struct AnchoredReport {
    pub upsert: UpsertReport,
    /// Ids of sections whose anchor was not found
    pub unresolved: Vec<String>,
}

/// Cleaned block stream: paragraph text, and the non-empty cell texts of each table
pub fn anchored_stream(blocks: &[Block]) -> Vec<StreamItem> {
    blocks
        .iter()
        .map(|block| match block {
            Block::Paragraph(p) => StreamItem::paragraph(&p.style, clean_text(&p.text)),
            Block::Table(t) => {
                let cells = t
                    .rows
                    .iter()
                    .flatten()
                    .map(|cell| {
                        let lines: Vec<&str> = cell
                            .paragraphs
                            .iter()
                            .map(|p| p.text.as_str())
                            .filter(|t| !t.trim().is_empty())
                            .collect();
                        clean_text(&lines.join("\n"))
                    })
                    .filter(|t| !t.is_empty())
                    .collect();
                StreamItem::table(String::new(), cells)
            }
        })
        .collect()
}

/// Rows of every anchored section, and the ids of sections whose anchor did not resolve
pub fn anchored_rows(items: &[StreamItem], manifest: &Manifest) -> (Vec<LocaleRecord>, Vec<String>) {
    let ranges = compute_ranges_with(items, &manifest.sections, locate_heading_anchor);

    let unresolved: Vec<String> = manifest
        .sections
        .iter()
        .enumerate()
        .filter(|(i, s)| s.docx_anchor.is_some() && !ranges.iter().any(|r| r.section == *i))
        .map(|(_, s)| s.id.clone())
        .collect();

    let mut rows = Vec::new();
    let mut counter = 0usize;
    for range in &ranges {
        let section = &manifest.sections[range.section];
        let prefix = section.key_prefix();

        for item in items.iter().take(range.end).skip(range.start + 1) {
            match item.kind {
                ItemKind::Paragraph => {
                    if item.text.is_empty() {
                        continue;
                    }
                    counter += 1;
                    rows.push(LocaleRecord::new(
                        format!("{}.u{:04}", prefix, counter),
                        item.text.clone(),
                        format!("{} | paragraph", section.id),
                    ));
                }
                ItemKind::Table => {
                    for cell in &item.cells {
                        counter += 1;
                        rows.push(LocaleRecord::new(
                            format!("{}.t{:04}", prefix, counter),
                            cell.clone(),
                            format!("{} | table-cell", section.id),
                        ));
                    }
                }
            }
        }
    }

    (rows, unresolved)
}

/// Run step3; the starter manifest is written when `manifest_path` does not exist
pub fn extract_anchored<P: AsRef<Path>>(
    docx: P,
    repo: &LocaleRepo,
    manifest_path: &Path,
    source_lang: &str,
    target_lang: &str,
) -> Result<AnchoredReport> {
    repo.ensure_skeleton()?;
    let manifest = Manifest::load_or_starter(manifest_path)?;

    let package = DocxPackage::open(docx)?;
    let items = anchored_stream(&read_body(&package)?);
    let (rows, unresolved) = anchored_rows(&items, &manifest);

    if !unresolved.is_empty() {
        warn!("Could not locate anchors for sections (check docx_anchor.value):");
        for id in &unresolved {
            warn!(" - {}", id);
        }
    }

    let upsert = upsert_locale_csv(
        repo.csv_path(Component::Texts, source_lang),
        repo.csv_path(Component::Texts, target_lang),
        &rows,
    )?;
    info!("Step3 complete.");

    Ok(AnchoredReport { upsert, unresolved })
}
