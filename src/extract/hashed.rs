/*!
 * Heading-tracking extraction with content-hashed keys.
 *
 * Walks the body keeping a six-level heading stack; the joined stack is the
 * current section. Paragraph text is accumulated into blocks, table cells
 * become their own chunks, and every chunk is keyed by
 * `doc.<section>.<kind>.<sha1(section\nkind\ntext)[:12]>`, so keys follow
 * the content rather than its position.
 */

use anyhow::Result;
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

use crate::app_config::ExtractionConfig;
use crate::docx::{Block, DocxPackage, read_body};
use crate::file_utils::FileManager;
use crate::locale::{
    Component, CsvLayout, LocaleRecord, LocaleRepo, merge_preserving_targets, read_locale_csv, write_locale_csv,
};
use crate::manifest::Manifest;
use crate::text_utils::{char_len, norm_ws, normalize_newlines, short_hash, slugify_section};

// @const: Depth of the heading stack
const STACK_DEPTH: usize = 6;

// @const: Section before the first heading
pub const FRONT_SECTION: &str = "front";

const HEADING_TOKENS: [&str; 4] = ["heading", "kop", "title", "titel"];

static TRAILING_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)$").unwrap());

/// Chunking controls
#[derive(Debug, Clone, PartialEq)]
pub struct HashedOptions {
    pub max_len: usize,
    pub merge_paragraphs: bool,
    /// Flush after this many merged paragraphs; 0 is unlimited
    pub max_paras_per_block: usize,
    pub split_on_linebreaks: bool,
}

impl From<&ExtractionConfig> for HashedOptions {
    fn from(c: &ExtractionConfig) -> Self {
        Self {
            max_len: c.max_len,
            merge_paragraphs: c.merge_paragraphs,
            max_paras_per_block: c.max_paras_per_block,
            split_on_linebreaks: c.split_on_linebreaks,
        }
    }
}

impl Default for HashedOptions {
    fn default() -> Self {
        Self::from(&ExtractionConfig::default())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HashedStats {
    pub headings: usize,
    pub paragraph_blocks: usize,
    pub table_cells: usize,
    pub front_blocks: usize,
}

#[derive(Debug, Clone, Default)]
pub struct HashedReport {
    pub rows: usize,
    /// Targets carried over from the existing target-language file
    pub preserved: usize,
    pub stats: HashedStats,
}

/// Heading level of a paragraph style, `None` for body text.
///
/// Styles naming a heading, `kop`, title or `titel` count as headings; the
/// level is taken from trailing digits 1–9 and defaults to 1.
pub fn heading_style_level(style: &str) -> Option<usize> {
    let lname = style.trim().to_lowercase();
    if lname.is_empty() || !HEADING_TOKENS.iter().any(|t| lname.contains(t)) {
        return None;
    }
    let level = TRAILING_DIGITS
        .captures(&lname)
        .and_then(|c| c[1].parse::<usize>().ok())
        .filter(|l| (1..=9).contains(l))
        .unwrap_or(1);
    Some(level)
}

/// Location of a chunk before repeat suffixes
pub fn hashed_key(section: &str, kind: &str, text: &str) -> String {
    let hash = short_hash(&format!("{}\n{}\n{}", section, kind, text));
    format!("doc.{}.{}.{}", section, kind, hash)
}

/// Walk state of one extraction
struct HashedExtractor<'a> {
    opts: &'a HashedOptions,
    heading_map: &'a HashMap<String, String>,
    stack: [Option<String>; STACK_DEPTH],
    current: String,
    acc: Vec<String>,
    acc_section: String,
    seen: HashMap<String, usize>,
    chunks: Vec<LocaleRecord>,
    stats: HashedStats,
}

impl<'a> HashedExtractor<'a> {
    fn new(opts: &'a HashedOptions, heading_map: &'a HashMap<String, String>) -> Self {
        Self {
            opts,
            heading_map,
            stack: Default::default(),
            current: FRONT_SECTION.to_string(),
            acc: Vec::new(),
            acc_section: FRONT_SECTION.to_string(),
            seen: HashMap::new(),
            chunks: Vec::new(),
            stats: HashedStats::default(),
        }
    }

    fn set_section(&mut self, level: usize, heading: &str) {
        let text = norm_ws(heading);
        let slug = self
            .heading_map
            .get(&text.to_lowercase())
            .cloned()
            .unwrap_or_else(|| slugify_section(&text));
        let idx = level.clamp(1, STACK_DEPTH) - 1;
        self.stack[idx] = Some(slug);
        for slot in self.stack.iter_mut().skip(idx + 1) {
            *slot = None;
        }
        self.current = self.stack.iter().flatten().cloned().collect::<Vec<_>>().join(".");
    }

    fn add_chunk(&mut self, kind: &str, section: &str, text: String) {
        let mut key = hashed_key(section, kind, &text);
        match self.seen.get_mut(&key) {
            Some(n) => {
                *n += 1;
                key = format!("{}.{}", key, n);
            }
            None => {
                self.seen.insert(key.clone(), 0);
            }
        }
        let context = format!("{}|{}", section, kind);
        self.chunks.push(LocaleRecord::new(key, text, context));
    }

    fn add_paragraph_block(&mut self, section: String, text: String) {
        if section == FRONT_SECTION {
            self.stats.front_blocks += 1;
        }
        self.stats.paragraph_blocks += 1;
        self.add_chunk("paragraph", &section, text);
    }

    fn acc_len(&self) -> usize {
        self.acc.iter().map(|s| char_len(s)).sum::<usize>() + self.acc.len().saturating_sub(1)
    }

    fn flush(&mut self) {
        if self.acc.is_empty() {
            return;
        }
        let text = self.acc.join("\n").trim().to_string();
        self.acc.clear();
        if !text.is_empty() {
            let section = self.acc_section.clone();
            self.add_paragraph_block(section, text);
        }
    }

    fn feed_paragraph(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        if !self.opts.merge_paragraphs {
            let section = self.current.clone();
            self.add_paragraph_block(section, text);
            return;
        }

        if self.acc_section != self.current {
            self.flush();
            self.acc_section = self.current.clone();
        }
        if self.opts.max_paras_per_block > 0 && self.acc.len() >= self.opts.max_paras_per_block {
            self.flush();
            self.acc_section = self.current.clone();
        }
        let prospective = self.acc_len() + usize::from(!self.acc.is_empty()) + char_len(&text);
        if !self.acc.is_empty() && prospective > self.opts.max_len {
            self.flush();
            self.acc_section = self.current.clone();
        }
        self.acc.push(text);
    }

    fn paragraph(&mut self, style: &str, raw: &str) {
        let raw = normalize_newlines(raw);
        let text = norm_ws(&raw);

        if let Some(level) = heading_style_level(style) {
            if !text.is_empty() {
                self.flush();
                self.stats.headings += 1;
                self.set_section(level, &text);
                self.acc_section = self.current.clone();
                return;
            }
        }

        if text.is_empty() {
            if self.opts.merge_paragraphs {
                self.flush();
            }
            return;
        }

        if self.opts.split_on_linebreaks && raw.contains('\n') {
            for part in raw.split('\n').map(norm_ws).filter(|p| !p.is_empty()) {
                self.feed_paragraph(part);
            }
        } else {
            self.feed_paragraph(text);
        }
    }

    fn table_cell(&mut self, text: String) {
        let section = self.current.clone();
        if char_len(&text) <= self.opts.max_len {
            self.stats.table_cells += 1;
            self.add_chunk("table_cell", &section, text);
            return;
        }

        // Too long: group whole lines up to max_len
        let mut buf: Vec<&str> = Vec::new();
        let mut groups: Vec<String> = Vec::new();
        for line in text.split('\n').map(str::trim).filter(|l| !l.is_empty()) {
            let len: usize = buf.iter().map(|l| char_len(l)).sum::<usize>() + buf.len().saturating_sub(1);
            if !buf.is_empty() && len + 1 + char_len(line) > self.opts.max_len {
                groups.push(buf.join("\n"));
                buf.clear();
            }
            buf.push(line);
        }
        if !buf.is_empty() {
            groups.push(buf.join("\n"));
        }
        for group in groups {
            self.stats.table_cells += 1;
            self.add_chunk("table_cell", &section, group);
        }
    }

    fn block(&mut self, block: &Block) {
        match block {
            Block::Paragraph(p) => self.paragraph(&p.style, &p.text),
            Block::Table(t) => {
                self.flush();
                for cell in t.rows.iter().flatten() {
                    let text = cell
                        .paragraphs
                        .iter()
                        .map(|p| norm_ws(&p.text))
                        .filter(|t| !t.is_empty())
                        .collect::<Vec<_>>()
                        .join("\n");
                    let text = text.trim();
                    if !text.is_empty() {
                        self.table_cell(text.to_string());
                    }
                }
            }
        }
    }
}

/// Chunks of a block stream, with `heading_map` mapping heading text to section ids
pub fn hashed_chunks(
    blocks: &[Block],
    heading_map: &HashMap<String, String>,
    opts: &HashedOptions,
) -> (Vec<LocaleRecord>, HashedStats) {
    let mut ex = HashedExtractor::new(opts, heading_map);
    for block in blocks {
        ex.block(block);
    }
    ex.flush();
    (ex.chunks, ex.stats)
}

/// Heading map of an optional manifest; unreadable manifests are ignored with a warning
fn load_heading_map(manifest: Option<&Path>) -> HashMap<String, String> {
    let Some(path) = manifest else {
        return HashMap::new();
    };
    if !FileManager::file_exists(path) {
        return HashMap::new();
    }
    match Manifest::load(path) {
        Ok(m) => m.heading_map(),
        Err(e) => {
            warn!("Ignoring manifest: {}", e);
            HashMap::new()
        }
    }
}

/// Extract the document into the `texts` component in the hashed layout.
///
/// The target-language file gets empty targets unless `preserve_targets` is
/// set, in which case existing non-blank targets are kept per location.
pub fn extract_hashed<P: AsRef<Path>>(
    docx: P,
    repo: &LocaleRepo,
    manifest: Option<&Path>,
    opts: &HashedOptions,
    preserve_targets: bool,
    source_lang: &str,
    target_lang: &str,
) -> Result<HashedReport> {
    let heading_map = load_heading_map(manifest);
    let package = DocxPackage::open(docx)?;
    let (chunks, stats) = hashed_chunks(&read_body(&package)?, &heading_map, opts);

    let src_path = repo.csv_path(Component::Texts, source_lang);
    let tgt_path = repo.csv_path(Component::Texts, target_lang);

    let (target_rows, preserved) = if preserve_targets {
        let existing = read_locale_csv(&tgt_path)?;
        merge_preserving_targets(&chunks, &existing)
    } else {
        (chunks.clone(), 0)
    };

    write_locale_csv(&src_path, &chunks, CsvLayout::Hashed)?;
    write_locale_csv(&tgt_path, &target_rows, CsvLayout::Hashed)?;

    info!("Wrote: {} ({} rows)", src_path.display(), chunks.len());
    if preserve_targets {
        info!("Wrote: {} ({} rows), preserved {} existing targets", tgt_path.display(), target_rows.len(), preserved);
    } else {
        info!("Wrote: {} ({} rows) (targets empty)", tgt_path.display(), target_rows.len());
    }
    info!(
        "Chunks: paragraph_blocks={}, table_cells={}, headings={}, front_blocks={}",
        stats.paragraph_blocks, stats.table_cells, stats.headings, stats.front_blocks
    );

    Ok(HashedReport {
        rows: chunks.len(),
        preserved,
        stats,
    })
}
