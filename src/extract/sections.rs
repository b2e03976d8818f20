/*!
 * Manifest-driven section extraction.
 *
 * The document is flattened into a stream of normalised paragraphs and
 * rendered tables. Importable sections emit one unit per non-empty item of
 * their range (atomic mode), or units merged into size-bounded blocks
 * (chunked mode). Atomic keys are stable across re-runs as long as the
 * section content does not move; chunked keys are not.
 */

use anyhow::Result;
use log::{info, warn};
use std::path::Path;

use super::{ItemKind, StreamItem, compute_ranges};
use crate::docx::{Block, DocxPackage, Table, read_body};
use crate::locale::{Component, LocaleRecord, LocaleRepo, UpsertReport, upsert_locale_csv};
use crate::manifest::{ExtractMode, Manifest, ManifestDefaults, Section};
use crate::text_utils::{char_len, join_hard_wrapped_lines, norm_stream};

/// Effective extraction settings: manifest defaults with command-line overrides applied
#[derive(Debug, Clone, PartialEq)]
pub struct SectionOptions {
    pub mode: ExtractMode,
    pub max_chars: usize,
    pub min_chars: usize,
    pub include_tables: bool,
    pub table_format: String,
    pub table_prefix: String,
    pub join_hard_wrapped_lines: bool,
}

impl From<&ManifestDefaults> for SectionOptions {
    fn from(d: &ManifestDefaults) -> Self {
        Self {
            mode: d.mode,
            max_chars: d.max_chars_per_chunk,
            min_chars: d.min_chars_per_chunk,
            include_tables: d.include_tables,
            table_format: d.table_format.clone(),
            table_prefix: d.table_prefix.clone(),
            join_hard_wrapped_lines: d.join_hard_wrapped_lines,
        }
    }
}

/// Command-line overrides; `None` keeps the manifest value
#[derive(Debug, Clone, Default)]
pub struct SectionOverrides {
    pub mode: Option<ExtractMode>,
    pub max_chars: Option<usize>,
    pub min_chars: Option<usize>,
    pub no_tables: bool,
}

impl SectionOptions {
    pub fn with_overrides(mut self, o: &SectionOverrides) -> Self {
        if let Some(mode) = o.mode {
            self.mode = mode;
        }
        if let Some(max) = o.max_chars.filter(|m| *m > 0) {
            self.max_chars = max;
        }
        if let Some(min) = o.min_chars.filter(|m| *m > 0) {
            self.min_chars = min;
        }
        if o.no_tables {
            self.include_tables = false;
        }
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct SectionReport {
    pub upsert: UpsertReport,
    /// Importable sections whose anchor was not found
    pub unresolved: Vec<String>,
}

/// Rows of a table as TSV, or ` | `-separated for any other format
pub fn table_to_text(table: &Table, format: &str) -> String {
    let sep = if format == "tsv" { "\t" } else { " | " };
    table
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| norm_stream(&cell.text()))
                .collect::<Vec<_>>()
                .join(sep)
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Linear stream of normalised paragraphs and, when enabled, rendered tables
pub fn build_stream(blocks: &[Block], opts: &SectionOptions) -> Vec<StreamItem> {
    blocks
        .iter()
        .filter_map(|block| match block {
            Block::Paragraph(p) => Some(StreamItem::paragraph(&p.style, norm_stream(&p.text))),
            Block::Table(t) if opts.include_tables => {
                let text = table_to_text(t, &opts.table_format);
                (!text.is_empty()).then(|| StreamItem::table(format!("{}:\n{}", opts.table_prefix, text), Vec::new()))
            }
            Block::Table(_) => None,
        })
        .collect()
}

/// One unit per non-empty item of `items`, anchor included
pub fn atomic_units(section: &Section, items: &[StreamItem], join_wrapped: bool) -> Vec<LocaleRecord> {
    let prefix = section.key_prefix();
    items
        .iter()
        .filter(|it| !it.text.is_empty())
        .enumerate()
        .map(|(i, it)| {
            let context = match it.kind {
                ItemKind::Paragraph if it.is_heading => {
                    format!("{}|heading|l{}", section.id, it.heading_level.unwrap_or(0))
                }
                ItemKind::Table => format!("{}|table", section.id),
                ItemKind::Paragraph => format!("{}|paragraph", section.id),
            };
            let source = if join_wrapped {
                join_hard_wrapped_lines(&it.text)
            } else {
                it.text.clone()
            };
            LocaleRecord::new(format!("{}.u{:04}", prefix, i + 1), source, context)
        })
        .collect()
}

/// Merge units into blocks joined by blank lines.
///
/// A block is flushed before a unit that would push it past `max_chars`,
/// but only once it holds at least `min_chars`.
pub fn chunk_units(units: &[LocaleRecord], max_chars: usize, min_chars: usize, prefix: &str, section_id: &str) -> Vec<LocaleRecord> {
    let mut blocks = Vec::new();
    let mut buf: Vec<&str> = Vec::new();
    let mut size = 0usize;

    let flush = |buf: &mut Vec<&str>, blocks: &mut Vec<LocaleRecord>| {
        if buf.is_empty() {
            return;
        }
        let text = buf.join("\n\n").trim().to_string();
        blocks.push(LocaleRecord::new(
            format!("{}.p{:03}", prefix, blocks.len() + 1),
            text,
            format!("{}|chunk", section_id),
        ));
        buf.clear();
    };

    for unit in units {
        let t = unit.source.trim();
        if t.is_empty() {
            continue;
        }
        let add = char_len(t) + if buf.is_empty() { 0 } else { 2 };
        if size + add > max_chars && size >= min_chars {
            flush(&mut buf, &mut blocks);
            buf.push(t);
            size = char_len(t);
        } else {
            buf.push(t);
            size += add;
        }
    }
    flush(&mut buf, &mut blocks);
    blocks
}

/// Units of every importable section, and the ids of those that did not resolve
pub fn section_units(items: &[StreamItem], manifest: &Manifest, opts: &SectionOptions) -> (Vec<LocaleRecord>, Vec<String>) {
    let ranges = compute_ranges(items, &manifest.sections);
    let mut units = Vec::new();
    let mut unresolved = Vec::new();

    for (i, section) in manifest.sections.iter().enumerate() {
        if !section.is_importable() {
            continue;
        }
        let Some(range) = ranges.iter().find(|r| r.section == i) else {
            unresolved.push(section.id.clone());
            continue;
        };

        let atomic = atomic_units(section, &items[range.start..range.end], opts.join_hard_wrapped_lines);
        match opts.mode {
            ExtractMode::Atomic => units.extend(atomic),
            ExtractMode::Chunked => units.extend(chunk_units(
                &atomic,
                opts.max_chars,
                opts.min_chars,
                &section.key_prefix(),
                &section.id,
            )),
        }
    }
    (units, unresolved)
}

/// Extract importable sections into the `texts` component
pub fn extract_sections<P: AsRef<Path>>(
    docx: P,
    repo: &LocaleRepo,
    manifest_path: &Path,
    overrides: &SectionOverrides,
    source_lang: &str,
    target_lang: &str,
) -> Result<SectionReport> {
    let manifest = Manifest::load(manifest_path)?;
    let opts = SectionOptions::from(&manifest.defaults).with_overrides(overrides);

    let package = DocxPackage::open(docx)?;
    let items = build_stream(&read_body(&package)?, &opts);
    let (units, unresolved) = section_units(&items, &manifest, &opts);
    info!("Extracted {} units ({:?} mode) from {} stream items", units.len(), opts.mode, items.len());

    let upsert = upsert_locale_csv(
        repo.csv_path(Component::Texts, source_lang),
        repo.csv_path(Component::Texts, target_lang),
        &units,
    )?;

    if !unresolved.is_empty() {
        warn!("Could not locate anchors for these importable sections:");
        for id in &unresolved {
            warn!(" - {}", id);
        }
        warn!("Adjust docx_anchor.value / any_of in manifest.json (heading_contains / paragraph_contains).");
    }

    Ok(SectionReport { upsert, unresolved })
}
