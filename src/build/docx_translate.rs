/*!
 * In-place translation of the original DOCX.
 *
 * Every translated row of one locale CSV is indexed by the SHA-1 of its
 * normalised source (and by a 40-hex location suffix). Top-level paragraphs
 * are matched as a whole and then line by line; table cells are matched as a
 * whole first, falling back to their paragraphs one by one. The first run of a
 * rewritten paragraph keeps its formatting, later runs are emptied.
 */

use anyhow::Result;
use log::info;
use std::collections::HashMap;
use std::path::Path;

use crate::docx::reader::{body_mut, paragraph_runs_mut, paragraph_text};
use crate::docx::{DocxPackage, Element, package::DOCUMENT_PART};
use crate::errors::{DocumentError, LocaleError};
use crate::file_utils::FileManager;
use crate::locale::{LocaleRecord, read_translated_csv};
use crate::text_utils::{is_sha1_hex, normalize_for_hash, sha1_hex};

/// Source hash to target text
#[derive(Debug, Clone, Default)]
pub struct TranslationIndex {
    pub by_hash: HashMap<String, String>,
    /// Rows in the CSV
    pub rows: usize,
    /// Rows with a non-blank target
    pub rows_with_target: usize,
}

impl TranslationIndex {
    /// Index rows; the first row for a hash wins
    pub fn from_records(records: &[LocaleRecord]) -> Self {
        let mut index = Self {
            rows: records.len(),
            ..Default::default()
        };
        for rec in records {
            if rec.target.trim().is_empty() {
                continue;
            }
            index.rows_with_target += 1;

            if let Some(last) = rec.location.trim().rsplit('.').next() {
                if is_sha1_hex(last) {
                    index.by_hash.entry(last.to_string()).or_insert_with(|| rec.target.clone());
                }
            }
            let source = normalize_for_hash(&rec.source);
            if !source.is_empty() {
                index.by_hash.entry(sha1_hex(&source)).or_insert_with(|| rec.target.clone());
            }
        }
        index
    }

    /// Load a translated locale CSV; the file must exist
    pub fn load<P: AsRef<Path>>(csv_path: P) -> Result<Self> {
        let path = csv_path.as_ref();
        if !FileManager::file_exists(path) {
            return Err(LocaleError::MissingCsv(path.to_path_buf()).into());
        }
        Ok(Self::from_records(&read_translated_csv(path)?))
    }

    fn lookup(&self, normalized: &str) -> Option<&str> {
        self.by_hash.get(&sha1_hex(normalized)).map(String::as_str)
    }

    /// Translation of `text` as a whole, else line by line.
    ///
    /// `None` when nothing matched.
    pub fn translate_text(&self, text: &str) -> Option<String> {
        let normalized = normalize_for_hash(text);
        if normalized.is_empty() {
            return None;
        }
        if let Some(target) = self.lookup(&normalized) {
            return Some(target.to_string());
        }
        if !normalized.contains('\n') {
            return None;
        }

        let mut changed = false;
        let lines: Vec<String> = normalized
            .split('\n')
            .map(|line| {
                let key = normalize_for_hash(line);
                match (!key.is_empty()).then(|| self.lookup(&key)).flatten() {
                    Some(target) => {
                        changed = true;
                        target.to_string()
                    }
                    None => line.to_string(),
                }
            })
            .collect();
        changed.then(|| lines.join("\n"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslateStats {
    pub paras_total: usize,
    pub paras_changed: usize,
    pub cells_total: usize,
    /// Cells replaced as a whole
    pub cells_changed_full: usize,
    /// Cells changed paragraph by paragraph
    pub cells_changed_para: usize,
}

/// Append text to a run as `w:t`, with `w:tab` for tabs and `w:br` for newlines
pub fn append_run_content(run: &mut Element, text: &str) {
    let mut buf = String::new();
    let flush = |buf: &mut String, run: &mut Element| {
        if !buf.is_empty() {
            run.push(
                Element::new("w:t")
                    .with_attr("xml:space", "preserve")
                    .with_text(std::mem::take(buf)),
            );
        }
    };
    for c in text.chars() {
        match c {
            '\n' => {
                flush(&mut buf, run);
                run.push(Element::new("w:br"));
            }
            '\t' => {
                flush(&mut buf, run);
                run.push(Element::new("w:tab"));
            }
            '\r' => {}
            _ => buf.push(c),
        }
    }
    flush(&mut buf, run);
}

/// Replace the text of a paragraph, keeping the first run's properties
pub fn set_paragraph_text(paragraph: &mut Element, text: &str) {
    let mut runs = paragraph_runs_mut(paragraph);
    if runs.is_empty() {
        let mut run = Element::new("w:r");
        append_run_content(&mut run, text);
        paragraph.push(run);
        return;
    }
    for run in runs.iter_mut() {
        run.retain_elements(|el| el.is("w:rPr"));
    }
    if let Some(first) = runs.first_mut() {
        append_run_content(first, text);
    }
}

/// Normalised non-empty paragraph texts of a cell, one per line
fn full_cell_text(cell: &Element) -> String {
    cell.children_named("w:p")
        .map(|p| normalize_for_hash(&paragraph_text(p)))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn replace_cell_text(cell: &mut Element, text: &str) {
    if cell.child("w:p").is_none() {
        cell.push(Element::new("w:p"));
    }
    let mut first = true;
    for p in cell.elements_mut().filter(|e| e.is("w:p")) {
        set_paragraph_text(p, if first { text } else { "" });
        first = false;
    }
}

/// Translate a paragraph; true when its text changed
fn translate_paragraph(paragraph: &mut Element, index: &TranslationIndex) -> bool {
    let old = paragraph_text(paragraph);
    match index.translate_text(&old) {
        Some(new) if new != old => {
            set_paragraph_text(paragraph, &new);
            true
        }
        _ => false,
    }
}

fn translate_cell(cell: &mut Element, index: &TranslationIndex, stats: &mut TranslateStats) {
    stats.cells_total += 1;
    let old_full = full_cell_text(cell);
    if old_full.is_empty() {
        return;
    }

    if let Some(new_full) = index.translate_text(&old_full) {
        if normalize_for_hash(&new_full) != old_full {
            replace_cell_text(cell, &new_full);
            stats.cells_changed_full += 1;
            return;
        }
    }

    let mut changed = false;
    for p in cell.elements_mut().filter(|e| e.is("w:p")) {
        changed |= translate_paragraph(p, index);
    }
    if changed {
        stats.cells_changed_para += 1;
    }
}

/// Translate the body of a parsed `word/document.xml`
pub fn translate_body(body: &mut Element, index: &TranslationIndex) -> TranslateStats {
    let mut stats = TranslateStats::default();

    for p in body.elements_mut().filter(|e| e.is("w:p")) {
        stats.paras_total += 1;
        if translate_paragraph(p, index) {
            stats.paras_changed += 1;
        }
    }

    for table in body.elements_mut().filter(|e| e.is("w:tbl")) {
        for row in table.elements_mut().filter(|e| e.is("w:tr")) {
            for cell in row.elements_mut().filter(|e| e.is("w:tc")) {
                translate_cell(cell, index, &mut stats);
            }
        }
    }
    stats
}

/// Translate `template` with the rows of `csv_path` and write `out_docx`
pub fn translate_docx<P: AsRef<Path>, Q: AsRef<Path>, R: AsRef<Path>>(
    template: P,
    csv_path: Q,
    out_docx: R,
) -> Result<TranslateStats> {
    let index = TranslationIndex::load(csv_path)?;
    info!(
        "Index: csv_rows={}, rows_with_target={}, hash_index={}",
        index.rows,
        index.rows_with_target,
        index.by_hash.len()
    );

    let mut package = DocxPackage::open(template)?;
    let mut doc = package.document()?;
    let body = body_mut(&mut doc).ok_or_else(|| DocumentError::MissingPart("w:body".to_string()))?;
    let stats = translate_body(body, &index);
    package.set_xml_part(DOCUMENT_PART, &doc)?;

    FileManager::ensure_parent(out_docx.as_ref())?;
    package.save(out_docx.as_ref())?;

    info!("Wrote: {}", out_docx.as_ref().display());
    info!("Paragraphs changed: {}/{}", stats.paras_changed, stats.paras_total);
    info!("Cells changed (full): {}/{}", stats.cells_changed_full, stats.cells_total);
    info!(
        "Cells changed (per-paragraph fallback): {}/{}",
        stats.cells_changed_para, stats.cells_total
    );
    Ok(stats)
}
