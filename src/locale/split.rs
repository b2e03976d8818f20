/*!
 * Splitting a locale CSV into parts and packing the parts back.
 *
 * Records are located with the CSV parser so quoted fields spanning several
 * lines stay intact, but the bytes of every record are copied verbatim:
 * quoting and line endings survive a split/pack round trip unchanged.
 */

use anyhow::{Context, Result, anyhow};
use csv::{ByteRecord, ReaderBuilder};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::LocaleError;
use crate::file_utils::FileManager;

// @const: Manifest written next to the part files
pub const SPLIT_MANIFEST_NAME: &str = "manifest.json";

static PART_FILE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"_part(\d+)_of\d+\.csv$").unwrap());

/// Description of a split, stored as `manifest.json` in the output folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SplitManifest {
    /// Name of the split file
    #[serde(default)]
    pub source_file: String,

    /// Number of parts
    #[serde(default)]
    pub parts: usize,

    /// Part file names in order
    #[serde(default)]
    pub part_files: Vec<String>,

    /// Data rows per part, header excluded
    #[serde(default)]
    pub row_counts: Vec<usize>,
}

/// Raw bytes of a CSV: the header record and each data record
struct RawCsv {
    header: Vec<u8>,
    records: Vec<Vec<u8>>,
}

/// Cut `data` at record boundaries, keeping each record's terminator
fn raw_records(data: &[u8]) -> Result<RawCsv> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let mut starts: Vec<usize> = Vec::new();
    let mut record = ByteRecord::new();
    loop {
        let mut start = reader.position().byte() as usize;
        if !reader.read_byte_record(&mut record).map_err(LocaleError::from)? {
            break;
        }
        // the reader may stop between '\r' and '\n'; terminators stay with their record
        if starts.is_empty() {
            start = 0;
        } else {
            while start < data.len() && matches!(data[start], b'\r' | b'\n') {
                start += 1;
            }
        }
        starts.push(start);
    }

    let mut chunks: Vec<Vec<u8>> = starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(data.len());
            data[start..end].to_vec()
        })
        .collect();

    if chunks.is_empty() {
        return Err(anyhow!("No records"));
    }
    let header = chunks.remove(0);
    Ok(RawCsv { header, records: chunks })
}

/// Divide `n_rows` as evenly as possible; earlier parts take the remainder
pub fn split_ranges(n_rows: usize, parts: usize) -> Vec<(usize, usize)> {
    let base = n_rows / parts;
    let rem = n_rows % parts;
    let mut start = 0;
    (0..parts)
        .map(|i| {
            let size = base + usize::from(i < rem);
            let range = (start, start + size);
            start += size;
            range
        })
        .collect()
}

/// Split `input` into `parts` files inside `out_dir`
pub fn split_csv<P1: AsRef<Path>, P2: AsRef<Path>>(
    input: P1,
    out_dir: P2,
    parts: usize,
) -> Result<SplitManifest> {
    let input = input.as_ref();
    let out_dir = out_dir.as_ref();

    if parts == 0 {
        return Err(anyhow!("parts must be greater than zero"));
    }

    let data = FileManager::read_bytes(input)?;
    if data.is_empty() {
        return Err(LocaleError::EmptyFile(input.to_path_buf()).into());
    }
    let raw = raw_records(&data).with_context(|| format!("Failed to split {:?}", input))?;

    FileManager::ensure_dir(out_dir)?;
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "locale".to_string());

    let mut manifest = SplitManifest {
        source_file: input
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default(),
        parts,
        ..Default::default()
    };

    for (idx, (start, end)) in split_ranges(raw.records.len(), parts).into_iter().enumerate() {
        let name = format!("{}_part{:02}_of{:02}.csv", stem, idx + 1, parts);
        let mut bytes = raw.header.clone();
        for rec in &raw.records[start..end] {
            bytes.extend_from_slice(rec);
        }
        FileManager::write_bytes(out_dir.join(&name), &bytes)?;
        manifest.part_files.push(name);
        manifest.row_counts.push(end - start);
    }

    let json = serde_json::to_string_pretty(&manifest).context("Failed to serialize split manifest")?;
    FileManager::write_to_file(out_dir.join(SPLIT_MANIFEST_NAME), &json)?;

    info!(
        "Read {} (header + {} rows), wrote {} parts to {}",
        input.display(),
        raw.records.len(),
        parts,
        out_dir.display()
    );
    for (name, count) in manifest.part_files.iter().zip(&manifest.row_counts) {
        info!("  - {}: {} rows", name, count);
    }

    Ok(manifest)
}

fn load_split_manifest(dir: &Path) -> Result<Option<SplitManifest>> {
    let path = dir.join(SPLIT_MANIFEST_NAME);
    if !FileManager::file_exists(&path) {
        return Ok(None);
    }
    let text = FileManager::read_to_string(&path)?;
    let manifest = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse split manifest: {:?}", path))?;
    Ok(Some(manifest))
}

/// `*_partNN_ofNN.csv` files in `dir`, ordered by part number
pub fn discover_part_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let mut parts: Vec<(u64, PathBuf)> = FileManager::find_files(dir, "csv", 1)?
        .into_iter()
        .filter_map(|path| {
            let name = path.file_name()?.to_string_lossy().to_string();
            let caps = PART_FILE_RE.captures(&name)?;
            let number = caps.get(1)?.as_str().parse().ok()?;
            Some((number, path))
        })
        .collect();
    parts.sort();
    Ok(parts.into_iter().map(|(_, path)| path).collect())
}

/// Concatenate the part files of `in_dir` into `output`.
///
/// Part order comes from the split manifest when present. Every part must
/// carry the same header. Returns the number of data rows written.
pub fn pack_csv<P1: AsRef<Path>, P2: AsRef<Path>>(in_dir: P1, output: P2) -> Result<usize> {
    let in_dir = in_dir.as_ref();
    let output = output.as_ref();

    let part_paths = match load_split_manifest(in_dir)? {
        Some(m) if !m.part_files.is_empty() => m.part_files.iter().map(|f| in_dir.join(f)).collect(),
        _ => discover_part_files(in_dir)?,
    };
    if part_paths.is_empty() {
        return Err(anyhow!("No part files found in {}", in_dir.display()));
    }

    let mut header: Option<Vec<u8>> = None;
    let mut out: Vec<u8> = Vec::new();
    let mut total_rows = 0;

    for path in &part_paths {
        let data = FileManager::read_bytes(path)?;
        if data.is_empty() {
            return Err(LocaleError::EmptyFile(path.clone()).into());
        }
        let raw = raw_records(&data).with_context(|| format!("Failed to read part {:?}", path))?;

        match &header {
            None => {
                out.extend_from_slice(&raw.header);
                header = Some(raw.header);
            }
            Some(h) if *h != raw.header => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                return Err(LocaleError::HeaderMismatch(name).into());
            }
            Some(_) => {}
        }

        total_rows += raw.records.len();
        for rec in &raw.records {
            out.extend_from_slice(rec);
        }
    }

    FileManager::write_bytes(output, &out)?;
    info!("Packed {} parts into {}", part_paths.len(), output.display());
    info!("Total data rows (header excluded): {}", total_rows);

    Ok(total_rows)
}
