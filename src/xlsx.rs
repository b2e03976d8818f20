/*!
 * Workbook access.
 *
 * Workbooks are read into memory with calamine (cached values, no formulas)
 * and written back with rust_xlsxwriter. Cell coordinates are 1-based, the
 * way the data supplement's columns are documented.
 */

use anyhow::{Context, Result};
use calamine::{Data, Reader, open_workbook_auto};
use log::debug;
use std::collections::HashMap;
use std::path::Path;

use crate::errors::DocumentError;
use crate::file_utils::FileManager;

static EMPTY_CELL: CellValue = CellValue::Empty;

/// Value of one cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Trimmed display form; numbers go through [`norm_num`]
    pub fn to_text(&self) -> String {
        norm_num(self)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(i) => CellValue::Int(*i),
            Data::Float(f) => CellValue::Float(*f),
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::Empty | Data::Error(_) => CellValue::Empty,
            other => CellValue::Text(other.to_string()),
        }
    }
}

/// Number formatting used for ids taken from cells: `3.0` reads as `3`.
///
/// Integral floats lose their decimals, other floats are printed with ten
/// decimals and trailing zeros removed, and `N.0` strings become `N`.
pub fn norm_num(value: &CellValue) -> String {
    match value {
        CellValue::Empty => String::new(),
        CellValue::Int(i) => i.to_string(),
        CellValue::Float(f) if f.fract() == 0.0 && f.is_finite() => format!("{}", *f as i64),
        CellValue::Float(f) => {
            let s = format!("{:.10}", f);
            s.trim_end_matches('0').trim_end_matches('.').to_string()
        }
        CellValue::Bool(true) => "True".to_string(),
        CellValue::Bool(false) => "False".to_string(),
        CellValue::Text(s) => {
            let s = s.trim();
            match s.strip_suffix(".0") {
                Some(head) if !head.is_empty() && head.chars().all(|c| c.is_ascii_digit()) => head.to_string(),
                _ => s.to_string(),
            }
        }
    }
}

/// A worksheet held in memory
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sheet {
    pub name: String,
    rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rows: Vec::new(),
        }
    }

    /// Cell at 1-based `(row, col)`; outside the data reads as empty
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        if row == 0 || col == 0 {
            return &EMPTY_CELL;
        }
        self.rows
            .get(row - 1)
            .and_then(|r| r.get(col - 1))
            .unwrap_or(&EMPTY_CELL)
    }

    /// Trimmed text of a cell
    pub fn text(&self, row: usize, col: usize) -> String {
        self.cell(row, col).to_text()
    }

    /// Set the cell at 1-based `(row, col)`, growing the sheet as needed
    pub fn set(&mut self, row: usize, col: usize, value: impl Into<CellValue>) {
        if row == 0 || col == 0 {
            return;
        }
        if self.rows.len() < row {
            self.rows.resize_with(row, Vec::new);
        }
        let cells = &mut self.rows[row - 1];
        if cells.len() < col {
            cells.resize(col, CellValue::Empty);
        }
        cells[col - 1] = value.into();
    }

    /// Last row holding data
    pub fn max_row(&self) -> usize {
        self.rows.len()
    }

    /// Widest row
    pub fn max_column(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Make sure every header of `desired` exists in row 1.
    ///
    /// Missing headers are appended after the last column. Returns header
    /// text to 1-based column for the whole header row.
    pub fn ensure_headers(&mut self, desired: &[String]) -> HashMap<String, usize> {
        let mut colmap: HashMap<String, usize> = HashMap::new();
        let width = self.rows.first().map(Vec::len).unwrap_or(0);
        for col in 1..=width {
            let header = self.text(1, col);
            if !header.is_empty() {
                colmap.entry(header).or_insert(col);
            }
        }

        let mut next = self.max_column() + 1;
        for header in desired {
            if !colmap.contains_key(header) {
                self.set(1, next, header.as_str());
                colmap.insert(header.clone(), next);
                next += 1;
            }
        }
        colmap
    }
}

/// An ordered set of worksheets
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Read every worksheet of an XLSX file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut source = open_workbook_auto(path)
            .with_context(|| format!("Failed to open workbook: {:?}", path))?;

        let mut sheets = Vec::new();
        for name in source.sheet_names() {
            let range = source
                .worksheet_range(&name)
                .with_context(|| format!("Failed to read worksheet '{}' of {:?}", name, path))?;

            let mut sheet = Sheet::new(&name);
            let (row0, col0) = range.start().unwrap_or((0, 0));
            for (r, c, data) in range.used_cells() {
                let value = CellValue::from(data);
                if !value.is_empty() {
                    sheet.set(row0 as usize + r + 1, col0 as usize + c + 1, value);
                }
            }
            debug!(
                "Read sheet '{}' ({} rows, {} columns)",
                name,
                sheet.max_row(),
                sheet.max_column()
            );
            sheets.push(sheet);
        }

        Ok(Self { sheets })
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    /// Sheet by name, or a typed error naming it
    pub fn require_sheet(&self, name: &str) -> Result<&Sheet, DocumentError> {
        self.sheet(name)
            .ok_or_else(|| DocumentError::MissingSheet(name.to_string()))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_workbook(path, &self.sheets)
    }
}

/// Write sheets to a new XLSX file
pub fn write_workbook<P: AsRef<Path>>(path: P, sheets: &[Sheet]) -> Result<()> {
    let path = path.as_ref();
    let mut workbook = rust_xlsxwriter::Workbook::new();

    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(&sheet.name)
            .with_context(|| format!("Invalid worksheet name: {}", sheet.name))?;

        for (r, row) in sheet.rows().iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                let (r, c) = (r as u32, c as u16);
                match value {
                    CellValue::Empty => {}
                    CellValue::Int(i) => {
                        worksheet.write_number(r, c, *i as f64)?;
                    }
                    CellValue::Float(f) => {
                        worksheet.write_number(r, c, *f)?;
                    }
                    CellValue::Bool(b) => {
                        worksheet.write_boolean(r, c, *b)?;
                    }
                    CellValue::Text(s) => {
                        worksheet.write_string(r, c, s)?;
                    }
                }
            }
        }
    }

    FileManager::ensure_parent(path)?;
    workbook
        .save(path)
        .with_context(|| format!("Failed to write workbook: {:?}", path))?;
    Ok(())
}
