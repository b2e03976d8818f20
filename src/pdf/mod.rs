/*!
 * PDF text layer.
 *
 * Pages are read with lopdf: content streams are run through a small text
 * machine that tracks the graphics and text state, producing positioned spans.
 * Spans are grouped into lines by baseline and lines into blocks by vertical
 * gap and horizontal overlap. Coordinates are top-left based, in points, with
 * `y` growing down the page.
 */

pub mod font;

use anyhow::{Context, Result};
use log::debug;
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use font::FontInfo;

// @const: Nesting limit for form XObjects and reference chains
const MAX_DEPTH: usize = 8;

// @const: Baseline difference, as a share of the font size, still counted as one line
const LINE_TOLERANCE: f64 = 0.5;

// @const: Horizontal gap, as a share of the font size, that inserts a space
const SPACE_GAP: f64 = 0.15;

// @const: Vertical gap between baselines, as a multiple of the font size, that still continues a block
const BLOCK_GAP: f64 = 1.6;

type Matrix = [f64; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

fn mul(a: &Matrix, b: &Matrix) -> Matrix {
    [
        a[0] * b[0] + a[1] * b[2],
        a[0] * b[1] + a[1] * b[3],
        a[2] * b[0] + a[3] * b[2],
        a[2] * b[1] + a[3] * b[3],
        a[4] * b[0] + a[5] * b[2] + b[4],
        a[4] * b[1] + a[5] * b[3] + b[5],
    ]
}

fn translate(tx: f64, ty: f64) -> Matrix {
    [1.0, 0.0, 0.0, 1.0, tx, ty]
}

fn apply(m: &Matrix, x: f64, y: f64) -> (f64, f64) {
    (x * m[0] + y * m[2] + m[4], x * m[1] + y * m[3] + m[5])
}

/// Follow references to the object they point at
pub(crate) fn deref<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    let mut cur = obj;
    for _ in 0..MAX_DEPTH {
        match cur {
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(next) => cur = next,
                Err(_) => return cur,
            },
            _ => return cur,
        }
    }
    cur
}

pub(crate) fn dict_get<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    dict.get(key).ok().map(|o| deref(doc, o))
}

pub(crate) fn name_of(obj: &Object) -> Option<&str> {
    match obj {
        Object::Name(name) => std::str::from_utf8(name).ok(),
        _ => None,
    }
}

pub(crate) fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

fn rect(doc: &Document, obj: Option<&Object>) -> Option<[f64; 4]> {
    let Some(Object::Array(items)) = obj else {
        return None;
    };
    let n: Vec<f64> = items.iter().filter_map(|o| number(deref(doc, o))).collect();
    match n.as_slice() {
        [x0, y0, x1, y1] => Some([x0.min(*x1), y0.min(*y1), x0.max(*x1), y0.max(*y1)]),
        _ => None,
    }
}

fn matrix(doc: &Document, operands: &[Object]) -> Option<Matrix> {
    let n: Vec<f64> = operands.iter().filter_map(|o| number(deref(doc, o))).collect();
    <[f64; 6]>::try_from(n.as_slice()).ok()
}

/// Page attribute looked up through the `Parent` chain
fn inherited<'a>(doc: &'a Document, page: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    let mut dict = page;
    for _ in 0..MAX_DEPTH {
        if let Some(obj) = dict_get(doc, dict, key) {
            return Some(obj);
        }
        match dict_get(doc, dict, b"Parent") {
            Some(Object::Dictionary(parent)) => dict = parent,
            _ => return None,
        }
    }
    None
}

/// A run of text drawn by one show operator
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub x0: f64,
    pub x1: f64,
    /// Distance of the baseline from the top of the page
    pub baseline: f64,
    pub size: f64,
    pub text: String,
}

/// A group of lines, with `\n` between them
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub text: String,
}

impl TextBlock {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.x0 <= x && x <= self.x1 && self.y0 <= y && y <= self.y1
    }
}

/// A link annotation with a URI action
#[derive(Debug, Clone, PartialEq)]
pub struct LinkAnnotation {
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
    pub uri: String,
}

/// Text and links of one page
#[derive(Debug, Clone, PartialEq)]
pub struct PageText {
    /// 1-based page number
    pub number: u32,
    pub width: f64,
    pub height: f64,
    pub spans: Vec<TextSpan>,
    pub links: Vec<LinkAnnotation>,
}

#[derive(Debug, Clone)]
struct Line {
    x0: f64,
    x1: f64,
    baseline: f64,
    size: f64,
    text: String,
}

impl Line {
    fn top(&self) -> f64 {
        self.baseline - 0.8 * self.size
    }

    fn bottom(&self) -> f64 {
        self.baseline + 0.2 * self.size
    }
}

impl PageText {
    fn lines(&self) -> Vec<Line> {
        let mut lines: Vec<Line> = Vec::new();
        for span in &self.spans {
            let blank = span.text.trim().is_empty();
            if let Some(line) = lines.last_mut() {
                let size = line.size.max(span.size).max(1.0);
                let same_baseline = (span.baseline - line.baseline).abs() <= LINE_TOLERANCE * size;
                if same_baseline && span.x0 >= line.x1 - size {
                    let gap = span.x0 - line.x1;
                    if gap > SPACE_GAP * size && !line.text.ends_with(' ') && !span.text.starts_with(' ') {
                        line.text.push(' ');
                    }
                    line.text.push_str(&span.text);
                    line.x0 = line.x0.min(span.x0);
                    line.x1 = line.x1.max(span.x1);
                    line.size = line.size.max(span.size);
                    continue;
                }
            }
            if blank {
                continue;
            }
            lines.push(Line {
                x0: span.x0,
                x1: span.x1,
                baseline: span.baseline,
                size: span.size,
                text: span.text.clone(),
            });
        }

        lines
            .into_iter()
            .map(|mut l| {
                l.text = l.text.split(' ').filter(|w| !w.is_empty()).collect::<Vec<_>>().join(" ");
                l
            })
            .filter(|l| !l.text.is_empty())
            .collect()
    }

    /// Text blocks sorted top to bottom
    pub fn blocks(&self) -> Vec<TextBlock> {
        let mut blocks: Vec<(TextBlock, f64)> = Vec::new();
        for line in self.lines() {
            if let Some((block, last_baseline)) = blocks.last_mut() {
                let step = line.baseline - *last_baseline;
                let overlaps = line.x0 < block.x1 && line.x1 > block.x0;
                if step > 0.0 && step <= BLOCK_GAP * line.size.max(1.0) && overlaps {
                    block.text.push('\n');
                    block.text.push_str(&line.text);
                    block.x0 = block.x0.min(line.x0);
                    block.x1 = block.x1.max(line.x1);
                    block.y1 = block.y1.max(line.bottom());
                    *last_baseline = line.baseline;
                    continue;
                }
            }
            blocks.push((
                TextBlock {
                    x0: line.x0,
                    y0: line.top(),
                    x1: line.x1,
                    y1: line.bottom(),
                    text: line.text.clone(),
                },
                line.baseline,
            ));
        }

        let mut blocks: Vec<TextBlock> = blocks.into_iter().map(|(b, _)| b).collect();
        blocks.sort_by(|a, b| a.y0.total_cmp(&b.y0));
        blocks
    }
}

/// Fonts and form XObjects reachable from a resource dictionary
struct Resources {
    fonts: HashMap<Vec<u8>, Rc<FontInfo>>,
    xobjects: HashMap<Vec<u8>, ObjectId>,
}

impl Resources {
    fn load(doc: &Document, dict: Option<&Dictionary>) -> Self {
        let mut fonts = HashMap::new();
        let mut xobjects = HashMap::new();
        if let Some(dict) = dict {
            if let Some(Object::Dictionary(font_dict)) = dict_get(doc, dict, b"Font") {
                for (name, obj) in font_dict.iter() {
                    if let Object::Dictionary(font) = deref(doc, obj) {
                        fonts.insert(name.clone(), Rc::new(FontInfo::from_dict(doc, font)));
                    }
                }
            }
            if let Some(Object::Dictionary(xobj_dict)) = dict_get(doc, dict, b"XObject") {
                for (name, obj) in xobj_dict.iter() {
                    if let Object::Reference(id) = obj {
                        xobjects.insert(name.clone(), *id);
                    }
                }
            }
        }
        Self { fonts, xobjects }
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    font: Option<Rc<FontInfo>>,
    size: f64,
    char_spacing: f64,
    word_spacing: f64,
    hscale: f64,
    leading: f64,
    rise: f64,
}

impl GraphicsState {
    fn new(ctm: Matrix) -> Self {
        Self {
            ctm,
            font: None,
            size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            hscale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

struct TextMachine<'a> {
    doc: &'a Document,
    left: f64,
    top: f64,
    spans: Vec<TextSpan>,
    fallback_font: Rc<FontInfo>,
}

impl<'a> TextMachine<'a> {
    fn show(&mut self, gs: &GraphicsState, tm: &mut Matrix, bytes: &[u8]) {
        let font = gs.font.clone().unwrap_or_else(|| self.fallback_font.clone());
        let start = mul(&mul(&translate(0.0, gs.rise), tm), &gs.ctm);

        let mut text = String::new();
        for glyph in font.decode(bytes) {
            text.push_str(&glyph.text);
            let mut advance = glyph.width / 1000.0 * gs.size + gs.char_spacing;
            if glyph.is_space {
                advance += gs.word_spacing;
            }
            *tm = mul(&translate(advance * gs.hscale, 0.0), tm);
        }
        if text.is_empty() {
            return;
        }

        let end = mul(&mul(&translate(0.0, gs.rise), tm), &gs.ctm);
        let (x0, y0) = apply(&start, 0.0, 0.0);
        let (x1, _) = apply(&end, 0.0, 0.0);
        let scale = (start[2] * start[2] + start[3] * start[3]).sqrt();

        self.spans.push(TextSpan {
            x0: x0.min(x1) - self.left,
            x1: x0.max(x1) - self.left,
            baseline: self.top - y0,
            size: (gs.size * scale).abs(),
            text,
        });
    }

    fn run(&mut self, data: &[u8], resources: Option<&Dictionary>, ctm: Matrix, depth: usize) {
        let content = match Content::decode(data) {
            Ok(c) => c,
            Err(e) => {
                debug!("Skipping undecodable content stream: {}", e);
                return;
            }
        };
        let res = Resources::load(self.doc, resources);
        let doc = self.doc;

        let mut gs = GraphicsState::new(ctm);
        let mut saved: Vec<GraphicsState> = Vec::new();
        let mut tm = IDENTITY;
        let mut tlm = IDENTITY;

        for op in &content.operations {
            let nums: Vec<f64> = op.operands.iter().filter_map(number).collect();
            let num = |i: usize| nums.get(i).copied().unwrap_or(0.0);

            match op.operator.as_str() {
                "q" => saved.push(gs.clone()),
                "Q" => {
                    if let Some(prev) = saved.pop() {
                        gs = prev;
                    }
                }
                "cm" => {
                    if let Some(m) = matrix(doc, &op.operands) {
                        gs.ctm = mul(&m, &gs.ctm);
                    }
                }
                "BT" => {
                    tm = IDENTITY;
                    tlm = IDENTITY;
                }
                "Tf" => {
                    gs.font = op.operands.first().and_then(name_of).and_then(|n| res.fonts.get(n.as_bytes()).cloned());
                    gs.size = op.operands.get(1).and_then(number).unwrap_or(gs.size);
                }
                "Tc" => gs.char_spacing = num(0),
                "Tw" => gs.word_spacing = num(0),
                "Tz" => gs.hscale = num(0) / 100.0,
                "TL" => gs.leading = num(0),
                "Ts" => gs.rise = num(0),
                "Td" => {
                    tlm = mul(&translate(num(0), num(1)), &tlm);
                    tm = tlm;
                }
                "TD" => {
                    gs.leading = -num(1);
                    tlm = mul(&translate(num(0), num(1)), &tlm);
                    tm = tlm;
                }
                "Tm" => {
                    if let Some(m) = matrix(doc, &op.operands) {
                        tlm = m;
                        tm = m;
                    }
                }
                "T*" => {
                    tlm = mul(&translate(0.0, -gs.leading), &tlm);
                    tm = tlm;
                }
                "Tj" => {
                    if let Some(Object::String(bytes, _)) = op.operands.first() {
                        self.show(&gs, &mut tm, bytes);
                    }
                }
                "'" | "\"" => {
                    if op.operator == "\"" {
                        gs.word_spacing = num(0);
                        gs.char_spacing = num(1);
                    }
                    tlm = mul(&translate(0.0, -gs.leading), &tlm);
                    tm = tlm;
                    if let Some(Object::String(bytes, _)) = op.operands.last() {
                        self.show(&gs, &mut tm, bytes);
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = op.operands.first() {
                        for item in items {
                            match item {
                                Object::String(bytes, _) => self.show(&gs, &mut tm, bytes),
                                other => {
                                    if let Some(adjust) = number(other) {
                                        let tx = -adjust / 1000.0 * gs.size * gs.hscale;
                                        tm = mul(&translate(tx, 0.0), &tm);
                                    }
                                }
                            }
                        }
                    }
                }
                "Do" if depth < MAX_DEPTH => {
                    let Some(id) = op.operands.first().and_then(name_of).and_then(|n| res.xobjects.get(n.as_bytes())) else {
                        continue;
                    };
                    let Ok(Object::Stream(form)) = doc.get_object(*id) else {
                        continue;
                    };
                    if dict_get(doc, &form.dict, b"Subtype").and_then(name_of) != Some("Form") {
                        continue;
                    }
                    let form_matrix = dict_get(doc, &form.dict, b"Matrix")
                        .and_then(|m| match m {
                            Object::Array(items) => matrix(doc, items),
                            _ => None,
                        })
                        .unwrap_or(IDENTITY);
                    let data = form.decompressed_content().unwrap_or_else(|_| form.content.clone());
                    let form_resources = match dict_get(doc, &form.dict, b"Resources") {
                        Some(Object::Dictionary(d)) => Some(d),
                        _ => resources,
                    };
                    self.run(&data, form_resources, mul(&form_matrix, &gs.ctm), depth + 1);
                }
                _ => {}
            }
        }
    }
}

fn page_links(doc: &Document, page: &Dictionary, left: f64, top: f64) -> Vec<LinkAnnotation> {
    let Some(Object::Array(annots)) = dict_get(doc, page, b"Annots") else {
        return Vec::new();
    };
    annots
        .iter()
        .filter_map(|obj| {
            let Object::Dictionary(annot) = deref(doc, obj) else {
                return None;
            };
            if dict_get(doc, annot, b"Subtype").and_then(name_of) != Some("Link") {
                return None;
            }
            let Some(Object::Dictionary(action)) = dict_get(doc, annot, b"A") else {
                return None;
            };
            if dict_get(doc, action, b"S").and_then(name_of) != Some("URI") {
                return None;
            }
            let uri = match dict_get(doc, action, b"URI") {
                Some(Object::String(bytes, _)) => String::from_utf8_lossy(bytes).into_owned(),
                _ => return None,
            };
            let [x0, y0, x1, y1] = rect(doc, dict_get(doc, annot, b"Rect"))?;
            Some(LinkAnnotation {
                x0: x0 - left,
                top: top - y1,
                x1: x1 - left,
                bottom: top - y0,
                uri,
            })
        })
        .collect()
}

/// Text spans and links of one page
pub fn read_page(doc: &Document, number: u32, page_id: ObjectId) -> Result<PageText> {
    let page = doc
        .get_dictionary(page_id)
        .with_context(|| format!("Page {} is not a dictionary", number))?;

    let bbox = rect(doc, inherited(doc, page, b"CropBox"))
        .or_else(|| rect(doc, inherited(doc, page, b"MediaBox")))
        .unwrap_or([0.0, 0.0, 595.0, 842.0]);
    let [left, bottom, right, top] = bbox;

    let resources = match inherited(doc, page, b"Resources") {
        Some(Object::Dictionary(d)) => Some(d),
        _ => None,
    };
    let content = doc
        .get_page_content(page_id)
        .with_context(|| format!("Failed to read content of page {}", number))?;

    let mut machine = TextMachine {
        doc,
        left,
        top,
        spans: Vec::new(),
        fallback_font: Rc::new(FontInfo::default()),
    };
    machine.run(&content, resources, IDENTITY, 0);

    Ok(PageText {
        number,
        width: right - left,
        height: top - bottom,
        spans: machine.spans,
        links: page_links(doc, page, left, top),
    })
}

/// Text of every page of a PDF file, in page order
pub fn read_pages<P: AsRef<Path>>(path: P) -> Result<Vec<PageText>> {
    let path = path.as_ref();
    let doc = Document::load(path).with_context(|| format!("Failed to open PDF: {}", path.display()))?;
    doc.get_pages()
        .into_iter()
        .map(|(number, id)| read_page(&doc, number, id))
        .collect()
}
