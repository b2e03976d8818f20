/*!
 * Writing new DOCX documents.
 *
 * `DocxBuilder` collects paragraphs and tables in a small model of its own and
 * renders them with docx-rs, together with the title and heading styles and
 * any embedded PNG images. Row properties docx-rs does not model (repeating
 * header rows, rows kept on one page) are set on the packed document part.
 */

use anyhow::{Context, Result};
use docx_rs::{
    AlignmentType, BorderType, BreakType, Docx, LineSpacing, PageMargin, Pic, RunFonts, ShdType, Shading, Style,
    StyleType, TableBorder, TableBorderPosition, TableBorders, TableCell, TableLayoutType, TableRow, VAlignType,
    VMergeType, WidthType,
};
use std::io::Cursor;
use std::path::Path;

use super::package::{DOCUMENT_PART, DocxPackage};
use super::reader::body_mut;
use super::xml::{Element, Node};
use crate::errors::DocumentError;
use crate::file_utils::FileManager;

// @const: EMUs per centimetre (DrawingML unit)
pub const EMU_PER_CM: f64 = 360_000.0;

// @const: Twentieths of a point per centimetre (page and table unit)
pub const TWIPS_PER_CM: f64 = 567.0;

// @const: A4 page in twips
const PAGE_WIDTH: u32 = 11_906;
const PAGE_HEIGHT: u32 = 16_838;

// @const: Word's default 2.54 cm margin
const DEFAULT_MARGIN: u32 = 1_440;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Character formatting of a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStyle {
    pub bold: bool,
    pub italic: bool,
    pub size_pt: Option<f32>,
    /// Hex RGB without `#`
    pub color: Option<String>,
    pub font: Option<String>,
}

impl RunStyle {
    /// Arial at the given size, black
    pub fn arial(size_pt: f32) -> Self {
        Self {
            size_pt: Some(size_pt),
            color: Some("000000".to_string()),
            font: Some("Arial".to_string()),
            ..Default::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn color(mut self, hex: &str) -> Self {
        self.color = Some(hex.to_string());
        self
    }

    fn apply(&self, mut run: docx_rs::Run) -> docx_rs::Run {
        if let Some(font) = &self.font {
            run = run.fonts(RunFonts::new().ascii(font).hi_ansi(font).cs(font));
        }
        if self.bold {
            run = run.bold();
        }
        if self.italic {
            run = run.italic();
        }
        if let Some(color) = &self.color {
            run = run.color(color);
        }
        if let Some(size) = self.size_pt {
            run = run.size((size * 2.0).round() as usize);
        }
        run
    }
}

/// An embedded image, ready to be placed in a run
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRef {
    data: Vec<u8>,
    width_px: u32,
    height_px: u32,
    cx: u64,
    cy: u64,
}

impl ImageRef {
    /// Size in EMU
    pub fn extent(&self) -> (u64, u64) {
        (self.cx, self.cy)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Run {
    Text { text: String, style: RunStyle },
    Image(ImageRef),
}

impl Run {
    pub fn text(text: impl Into<String>) -> Self {
        Run::Text {
            text: text.into(),
            style: RunStyle::default(),
        }
    }

    pub fn styled(text: impl Into<String>, style: RunStyle) -> Self {
        Run::Text {
            text: text.into(),
            style,
        }
    }

    fn render(&self) -> docx_rs::Run {
        match self {
            Run::Text { text, style } => text_run(text, style),
            Run::Image(image) => docx_rs::Run::new().add_image(
                Pic::new_with_dimensions(image.data.clone(), image.width_px, image.height_px)
                    .size(image.cx as u32, image.cy as u32),
            ),
        }
    }
}

/// Text run with `\t` as tabs and `\n` as line breaks
fn text_run(text: &str, style: &RunStyle) -> docx_rs::Run {
    let flush = |run: docx_rs::Run, buf: &mut String| {
        if buf.is_empty() {
            run
        } else {
            run.add_text(std::mem::take(buf))
        }
    };
    let mut run = style.apply(docx_rs::Run::new());
    let mut buf = String::new();
    for c in text.chars() {
        match c {
            '\n' => run = flush(run, &mut buf).add_break(BreakType::TextWrapping),
            '\t' => run = flush(run, &mut buf).add_tab(),
            '\r' => {}
            _ => buf.push(c),
        }
    }
    flush(run, &mut buf)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// A paragraph to be written
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Para {
    pub runs: Vec<Run>,
    /// Paragraph style id, e.g. `Heading1`
    pub style: Option<String>,
    pub align: Option<Align>,
    /// Space after in twips
    pub space_after: Option<u32>,
}

impl Para {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new().run(Run::text(text))
    }

    pub fn styled(text: impl Into<String>, style: RunStyle) -> Self {
        Self::new().run(Run::styled(text, style))
    }

    pub fn run(mut self, run: Run) -> Self {
        self.runs.push(run);
        self
    }

    pub fn with_style(mut self, style_id: &str) -> Self {
        self.style = Some(style_id.to_string());
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = Some(align);
        self
    }

    pub fn compact(mut self) -> Self {
        self.space_after = Some(0);
        self
    }

    fn render(&self) -> docx_rs::Paragraph {
        let mut p = docx_rs::Paragraph::new();
        if let Some(style) = &self.style {
            p = p.style(style);
        }
        if let Some(after) = self.space_after {
            p = p.line_spacing(LineSpacing::new().after(after));
        }
        if let Some(align) = self.align {
            p = p.align(match align {
                Align::Left => AlignmentType::Left,
                Align::Center => AlignmentType::Center,
                Align::Right => AlignmentType::Right,
            });
        }
        for run in &self.runs {
            p = p.add_run(run.render());
        }
        p
    }
}

/// Style id of a heading level; 0 is the document title
pub fn heading_style_id(level: u8) -> String {
    match level {
        0 => "Title".to_string(),
        n => format!("Heading{}", n.min(9)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VMerge {
    /// First cell of a vertical merge
    Restart,
    /// Cell covered by the merge above
    Continue,
}

/// A table cell
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub paras: Vec<Para>,
    /// Background fill, hex RGB
    pub shading: Option<String>,
    /// Number of grid columns covered
    pub span: u16,
    pub v_merge: Option<VMerge>,
    pub v_align_center: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            paras: Vec::new(),
            shading: None,
            span: 1,
            v_merge: None,
            v_align_center: false,
        }
    }
}

impl Cell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new().para(Para::text(text))
    }

    pub fn styled(text: impl Into<String>, style: RunStyle) -> Self {
        Self::new().para(Para::styled(text, style))
    }

    pub fn para(mut self, para: Para) -> Self {
        self.paras.push(para);
        self
    }

    pub fn shaded(mut self, fill: &str) -> Self {
        self.shading = Some(fill.to_string());
        self
    }

    pub fn span(mut self, columns: u16) -> Self {
        self.span = columns.max(1);
        self
    }

    pub fn merge(mut self, merge: VMerge) -> Self {
        self.v_merge = Some(merge);
        self
    }

    pub fn center_vertically(mut self) -> Self {
        self.v_align_center = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pub cells: Vec<Cell>,
    /// Repeat at the top of every page
    pub header: bool,
    /// Keep the row on one page
    pub cant_split: bool,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self {
            cells,
            ..Default::default()
        }
    }

    pub fn header(mut self) -> Self {
        self.header = true;
        self
    }

    pub fn cant_split(mut self) -> Self {
        self.cant_split = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Borders {
    /// Single lines around and between every cell
    Grid,
    /// Horizontal rules only, `size` in eighths of a point
    Horizontal { size: u32, color: String },
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableSpec {
    /// Column widths; empty spreads the text width evenly
    pub widths_cm: Vec<f64>,
    pub rows: Vec<Row>,
    pub borders: Borders,
    /// Stretch to the full text width
    pub full_width: bool,
}

impl TableSpec {
    pub fn new(widths_cm: Vec<f64>) -> Self {
        Self {
            widths_cm,
            rows: Vec::new(),
            borders: Borders::Grid,
            full_width: true,
        }
    }

    pub fn borders(mut self, borders: Borders) -> Self {
        self.borders = borders;
        self
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    fn column_count(&self) -> usize {
        if !self.widths_cm.is_empty() {
            return self.widths_cm.len();
        }
        self.rows
            .iter()
            .map(|r| r.cells.iter().map(|c| c.span as usize).sum::<usize>())
            .max()
            .unwrap_or(1)
            .max(1)
    }
}

/// Page margins in twips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Margins {
    top: u32,
    right: u32,
    bottom: u32,
    left: u32,
}

fn cm_to_twips(cm: f64) -> u32 {
    (cm * TWIPS_PER_CM).round() as u32
}

/// A paragraph or table of the body, in document order
#[derive(Debug, Clone, PartialEq)]
enum BodyBlock {
    Para(Para),
    Table(TableSpec),
}

/// Builds a new document part by part
#[derive(Debug, Clone)]
pub struct DocxBuilder {
    body: Vec<BodyBlock>,
    margins: Margins,
}

impl Default for DocxBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self {
            body: Vec::new(),
            margins: Margins {
                top: DEFAULT_MARGIN,
                right: DEFAULT_MARGIN,
                bottom: DEFAULT_MARGIN,
                left: DEFAULT_MARGIN,
            },
        }
    }

    /// Left and right margins only
    pub fn set_side_margins_cm(&mut self, left: f64, right: f64) {
        self.margins.left = cm_to_twips(left);
        self.margins.right = cm_to_twips(right);
    }

    fn text_width(&self) -> u32 {
        PAGE_WIDTH.saturating_sub(self.margins.left + self.margins.right)
    }

    /// Heading paragraph; level 0 uses the title style
    pub fn heading(&mut self, text: &str, level: u8) {
        self.para(Para::text(text).with_style(&heading_style_id(level)));
    }

    pub fn paragraph(&mut self, text: &str) {
        self.para(Para::text(text));
    }

    pub fn empty_paragraph(&mut self) {
        self.para(Para::new());
    }

    pub fn para(&mut self, para: Para) {
        self.body.push(BodyBlock::Para(para));
    }

    pub fn table(&mut self, spec: &TableSpec) {
        self.body.push(BodyBlock::Table(spec.clone()));
    }

    /// Read a PNG file scaled to `width_cm`, keeping its aspect ratio
    pub fn add_png<P: AsRef<Path>>(&self, path: P, width_cm: f64) -> Result<ImageRef> {
        let path = path.as_ref();
        let data = FileManager::read_bytes(path)?;
        let (w, h) = png_dimensions(&data).ok_or_else(|| DocumentError::UnsupportedImage(path.to_path_buf()))?;
        let cx = (width_cm * EMU_PER_CM).round() as u64;
        let cy = if w == 0 { cx } else { cx * u64::from(h) / u64::from(w) };
        Ok(ImageRef {
            data,
            width_px: w,
            height_px: h,
            cx,
            cy,
        })
    }

    fn render_table(&self, spec: &TableSpec) -> docx_rs::Table {
        let columns = spec.column_count();
        let widths: Vec<usize> = if spec.widths_cm.is_empty() {
            vec![(self.text_width() / columns as u32) as usize; columns]
        } else {
            spec.widths_cm.iter().map(|w| cm_to_twips(*w) as usize).collect()
        };

        let rows = spec.rows.iter().map(|row| table_row(row, &widths)).collect();
        let mut table = docx_rs::Table::new(rows)
            .set_grid(widths.clone())
            .set_borders(table_borders(&spec.borders));
        table = if spec.full_width {
            table.width(5000, WidthType::Pct)
        } else {
            table.width(widths.iter().sum(), WidthType::Dxa)
        };
        if !spec.widths_cm.is_empty() {
            table = table.layout(TableLayoutType::Fixed);
        }
        table
    }

    /// Render and pack the document
    pub fn into_package(self) -> Result<DocxPackage> {
        let m = self.margins;
        let mut docx = Docx::new()
            .page_size(PAGE_WIDTH, PAGE_HEIGHT)
            .page_margin(
                PageMargin::new()
                    .top(m.top as i32)
                    .right(m.right as i32)
                    .bottom(m.bottom as i32)
                    .left(m.left as i32),
            )
            .default_fonts(RunFonts::new().ascii("Calibri").hi_ansi("Calibri").cs("Calibri"))
            .default_size(22);
        for style in styles() {
            docx = docx.add_style(style);
        }
        for block in &self.body {
            docx = match block {
                BodyBlock::Para(para) => docx.add_paragraph(para.render()),
                BodyBlock::Table(spec) => docx.add_table(self.render_table(spec)),
            };
        }

        let mut buf = Cursor::new(Vec::new());
        docx.build().pack(&mut buf).context("Failed to pack document")?;
        let mut package = DocxPackage::from_bytes(buf.into_inner())?;

        let tables: Vec<&TableSpec> = self
            .body
            .iter()
            .filter_map(|b| match b {
                BodyBlock::Table(spec) => Some(spec),
                BodyBlock::Para(_) => None,
            })
            .collect();
        if tables.iter().any(|t| t.rows.iter().any(|r| r.header || r.cant_split)) {
            let mut doc = package.document()?;
            if let Some(body) = body_mut(&mut doc) {
                mark_rows(body, &tables);
            }
            package.set_xml_part(DOCUMENT_PART, &doc)?;
        }
        Ok(package)
    }

    pub fn save<P: AsRef<Path>>(self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.into_package()?
            .save(path)
            .with_context(|| format!("Failed to write document: {:?}", path))
    }
}

/// Width and height from the IHDR chunk of a PNG
pub fn png_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    if data.len() < 24 || !data.starts_with(PNG_SIGNATURE) || &data[12..16] != b"IHDR" {
        return None;
    }
    let w = u32::from_be_bytes(data[16..20].try_into().ok()?);
    let h = u32::from_be_bytes(data[20..24].try_into().ok()?);
    Some((w, h))
}

fn border(position: TableBorderPosition, size: usize, color: &str) -> TableBorder {
    TableBorder::new(position)
        .border_type(BorderType::Single)
        .size(size)
        .color(color)
}

fn table_borders(borders: &Borders) -> TableBorders {
    use TableBorderPosition::{Bottom, InsideH, InsideV, Left, Right, Top};
    match borders {
        Borders::None => TableBorders::with_empty(),
        Borders::Grid => [Top, Left, Bottom, Right, InsideH, InsideV]
            .into_iter()
            .fold(TableBorders::with_empty(), |b, side| b.set(border(side, 4, "auto"))),
        Borders::Horizontal { size, color } => [Top, Bottom, InsideH]
            .into_iter()
            .fold(TableBorders::with_empty(), |b, side| b.set(border(side, *size as usize, color))),
    }
}

fn table_row(row: &Row, widths: &[usize]) -> TableRow {
    let mut col = 0usize;
    let cells = row
        .cells
        .iter()
        .map(|cell| {
            let span = cell.span.max(1) as usize;
            let width: usize = widths.iter().skip(col).take(span).sum();
            col += span;
            table_cell(cell, width)
        })
        .collect();
    TableRow::new(cells)
}

fn table_cell(cell: &Cell, width: usize) -> TableCell {
    let mut tc = TableCell::new().width(width, WidthType::Dxa);
    if cell.span > 1 {
        tc = tc.grid_span(cell.span as usize);
    }
    match cell.v_merge {
        Some(VMerge::Restart) => tc = tc.vertical_merge(VMergeType::Restart),
        Some(VMerge::Continue) => tc = tc.vertical_merge(VMergeType::Continue),
        None => {}
    }
    if let Some(fill) = &cell.shading {
        tc = tc.shading(Shading::new().shd_type(ShdType::Clear).color("auto").fill(fill));
    }
    if cell.v_align_center {
        tc = tc.vertical_align(VAlignType::Center);
    }
    // a cell needs at least one paragraph
    if cell.paras.is_empty() {
        tc = tc.add_paragraph(docx_rs::Paragraph::new());
    }
    for para in &cell.paras {
        tc = tc.add_paragraph(para.render());
    }
    tc
}

/// Add `w:tblHeader` and `w:cantSplit` to the rows of the body's tables that ask for them
fn mark_rows(body: &mut Element, tables: &[&TableSpec]) {
    let tbls = body.elements_mut().filter(|e| e.is("w:tbl"));
    for (tbl, spec) in tbls.zip(tables) {
        let trs = tbl.elements_mut().filter(|e| e.is("w:tr"));
        for (tr, row) in trs.zip(&spec.rows) {
            if !row.header && !row.cant_split {
                continue;
            }
            if tr.child("w:trPr").is_none() {
                let at = tr
                    .children
                    .iter()
                    .position(|n| matches!(n, Node::Element(e) if e.is("w:tc")))
                    .unwrap_or(tr.children.len());
                tr.children.insert(at, Node::Element(Element::new("w:trPr")));
            }
            if let Some(trpr) = tr.child_mut("w:trPr") {
                if row.cant_split && trpr.child("w:cantSplit").is_none() {
                    trpr.push(Element::new("w:cantSplit"));
                }
                if row.header && trpr.child("w:tblHeader").is_none() {
                    trpr.push(Element::new("w:tblHeader"));
                }
            }
        }
    }
}

fn styles() -> Vec<Style> {
    let mut styles = vec![
        Style::new("Title", StyleType::Paragraph)
            .name("Title")
            .based_on("Normal")
            .next("Normal")
            .size(56),
    ];
    for level in 1..=9u8 {
        let size = match level {
            1 => 32,
            2 => 26,
            3 => 24,
            _ => 22,
        };
        styles.push(
            Style::new(heading_style_id(level), StyleType::Paragraph)
                .name(format!("heading {}", level))
                .based_on("Normal")
                .next("Normal")
                .bold()
                .color("2F5496")
                .size(size),
        );
    }
    styles
}
