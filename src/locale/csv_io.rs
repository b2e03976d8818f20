/*!
 * Locale CSV reading and writing.
 *
 * Three column layouts are in use: the Weblate layout written by the
 * workbook and anchored extractors, the hashed layout of the DOCX text
 * extractor, and the PDF layout (BOM-prefixed, for spreadsheet users).
 */

use anyhow::{Context, Result, anyhow};
use csv::{QuoteStyle, ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use log::{debug, info};
use std::collections::HashMap;
use std::path::Path;

use super::LocaleRecord;
use crate::errors::LocaleError;
use crate::file_utils::FileManager;

// @const: UTF-8 byte order mark
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Column layout of a written locale CSV
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvLayout {
    /// `location, source, target, context`, minimal quoting
    Weblate,
    /// `location, context, source, target`, every field quoted
    Hashed,
    /// `locations, context, source, target`, every field quoted, BOM
    Pdf,
}

impl CsvLayout {
    /// Header row of the layout
    pub fn header(&self) -> [&'static str; 4] {
        match self {
            CsvLayout::Weblate => ["location", "source", "target", "context"],
            CsvLayout::Hashed => ["location", "context", "source", "target"],
            CsvLayout::Pdf => ["locations", "context", "source", "target"],
        }
    }

    fn fields<'a>(&self, rec: &'a LocaleRecord) -> [&'a str; 4] {
        match self {
            CsvLayout::Weblate => [&rec.location, &rec.source, &rec.target, &rec.context],
            CsvLayout::Hashed | CsvLayout::Pdf => {
                [&rec.location, &rec.context, &rec.source, &rec.target]
            }
        }
    }

    fn quote_style(&self) -> QuoteStyle {
        match self {
            CsvLayout::Weblate => QuoteStyle::Necessary,
            CsvLayout::Hashed | CsvLayout::Pdf => QuoteStyle::Always,
        }
    }

    fn with_bom(&self) -> bool {
        matches!(self, CsvLayout::Pdf)
    }
}

/// Outcome of an upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpsertReport {
    /// Rows written to each file
    pub rows: usize,

    /// Existing non-blank targets carried over
    pub preserved: usize,
}

/// Column positions resolved from a header row
#[derive(Debug, Clone, Copy)]
struct Columns {
    location: usize,
    source: Option<usize>,
    target: Option<usize>,
    context: Option<usize>,
}

impl Columns {
    fn resolve(path: &Path, headers: &StringRecord) -> Result<Self, LocaleError> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
        };

        let location = find(&["location", "locations"]).ok_or_else(|| LocaleError::MissingColumn {
            path: path.to_path_buf(),
            column: "location",
            found: headers.iter().collect::<Vec<_>>().join(","),
        })?;

        Ok(Self {
            location,
            source: find(&["source"]),
            target: find(&["target", "translation"]),
            context: find(&["context"]),
        })
    }

    fn require_text(&self, path: &Path, headers: &StringRecord) -> Result<(), LocaleError> {
        let found = || headers.iter().collect::<Vec<_>>().join(",");
        if self.source.is_none() {
            return Err(LocaleError::MissingColumn {
                path: path.to_path_buf(),
                column: "source",
                found: found(),
            });
        }
        if self.target.is_none() {
            return Err(LocaleError::MissingColumn {
                path: path.to_path_buf(),
                column: "target",
                found: found(),
            });
        }
        Ok(())
    }
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

fn read_records(path: &Path, require_text: bool) -> Result<Vec<LocaleRecord>> {
    if !FileManager::file_exists(path) {
        debug!("Locale CSV not found, treating as empty: {:?}", path);
        return Ok(Vec::new());
    }

    let bytes = FileManager::read_bytes(path)?;
    let data = strip_bom(&bytes);
    if data.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let mut reader = ReaderBuilder::new().flexible(true).from_reader(data);
    let headers = reader
        .headers()
        .map_err(LocaleError::from)
        .with_context(|| format!("Failed to read CSV header: {:?}", path))?
        .clone();
    if headers.is_empty() {
        return Err(LocaleError::MissingHeader(path.to_path_buf()).into());
    }

    let columns = Columns::resolve(path, &headers)?;
    if require_text {
        columns.require_text(path, &headers)?;
    }

    let field = |rec: &StringRecord, idx: Option<usize>| -> String {
        idx.and_then(|i| rec.get(i)).unwrap_or_default().to_string()
    };

    let mut rows: Vec<LocaleRecord> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for result in reader.records() {
        let rec = result
            .map_err(LocaleError::from)
            .with_context(|| format!("Failed to parse CSV record in {:?}", path))?;
        let location = rec.get(columns.location).unwrap_or_default().trim().to_string();
        if location.is_empty() {
            continue;
        }

        let row = LocaleRecord {
            source: field(&rec, columns.source),
            target: field(&rec, columns.target),
            context: field(&rec, columns.context),
            location,
        };

        match positions.get(&row.location) {
            Some(&pos) => rows[pos] = row,
            None => {
                positions.insert(row.location.clone(), rows.len());
                rows.push(row);
            }
        }
    }

    Ok(rows)
}

/// Read a locale CSV in file order; a missing file reads as empty.
///
/// Headers are matched case-insensitively and `translation` is accepted for
/// `target`. Duplicate locations keep the first position with the last row.
pub fn read_locale_csv<P: AsRef<Path>>(path: P) -> Result<Vec<LocaleRecord>> {
    read_records(path.as_ref(), false)
}

/// Like [`read_locale_csv`], but rejects files without `source` or `target`
pub fn read_translated_csv<P: AsRef<Path>>(path: P) -> Result<Vec<LocaleRecord>> {
    read_records(path.as_ref(), true)
}

/// Serialise rows in the given layout
pub fn locale_csv_bytes(rows: &[LocaleRecord], layout: CsvLayout) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    if layout.with_bom() {
        buf.extend_from_slice(UTF8_BOM);
    }

    let mut writer = WriterBuilder::new()
        .quote_style(layout.quote_style())
        .terminator(Terminator::CRLF)
        .from_writer(buf);

    writer.write_record(layout.header())?;
    for row in rows {
        writer.write_record(layout.fields(row))?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush CSV writer: {}", e.error()))
}

/// Write rows to `path`, creating the parent folder
pub fn write_locale_csv<P: AsRef<Path>>(path: P, rows: &[LocaleRecord], layout: CsvLayout) -> Result<()> {
    let bytes = locale_csv_bytes(rows, layout)?;
    FileManager::write_bytes(path.as_ref(), &bytes)
        .with_context(|| format!("Failed to write locale CSV: {:?}", path.as_ref()))
}

/// Copy each row with the existing non-blank target for its location.
///
/// Returns the merged rows and how many targets were preserved.
pub fn merge_preserving_targets(
    rows: &[LocaleRecord],
    existing: &[LocaleRecord],
) -> (Vec<LocaleRecord>, usize) {
    let by_location: HashMap<&str, &LocaleRecord> =
        existing.iter().map(|r| (r.location.as_str(), r)).collect();

    let mut preserved = 0;
    let merged = rows
        .iter()
        .map(|row| {
            let target = match by_location.get(row.location.as_str()) {
                Some(old) if !old.target.trim().is_empty() => {
                    preserved += 1;
                    old.target.clone()
                }
                _ => String::new(),
            };
            LocaleRecord {
                location: row.location.clone(),
                source: row.source.clone(),
                target,
                context: row.context.clone(),
            }
        })
        .collect();

    (merged, preserved)
}

/// Write the source-language file fresh and merge the target-language file.
///
/// The target file gets exactly `rows`, keeping every existing non-blank
/// target for the same location.
pub fn upsert_locale_csv<P1: AsRef<Path>, P2: AsRef<Path>>(
    src_path: P1,
    tgt_path: P2,
    rows: &[LocaleRecord],
) -> Result<UpsertReport> {
    let src_path = src_path.as_ref();
    let tgt_path = tgt_path.as_ref();

    write_locale_csv(src_path, rows, CsvLayout::Weblate)?;

    let existing = read_locale_csv(tgt_path)?;
    let (merged, preserved) = merge_preserving_targets(rows, &existing);
    write_locale_csv(tgt_path, &merged, CsvLayout::Weblate)?;

    info!("Wrote: {} ({} rows)", src_path.display(), rows.len());
    info!(
        "Wrote: {} ({} rows), preserved {} existing targets",
        tgt_path.display(),
        merged.len(),
        preserved
    );

    Ok(UpsertReport {
        rows: rows.len(),
        preserved,
    })
}
