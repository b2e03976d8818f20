/*!
 * Reading the body of a DOCX in document order.
 *
 * Only top-level paragraphs and tables of `w:body` are returned. Paragraph
 * text follows Word's visible text: run text, tabs and manual line breaks,
 * including runs inside hyperlinks, insertions, smart tags and content
 * controls, but not deleted runs.
 */

use anyhow::Result;
use std::collections::HashMap;

use super::package::{DocxPackage, STYLES_PART};
use super::xml::{Element, XmlDocument};

// @const: Name used when a paragraph has no style and styles.xml names no default
pub const DEFAULT_PARAGRAPH_STYLE: &str = "Normal";

/// A top-level body block
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Paragraph {
    /// Style display name, e.g. `Heading 1`
    pub style: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub paragraphs: Vec<Paragraph>,
}

impl Cell {
    /// Paragraph texts joined by newlines
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Paragraph style id to display name, from `word/styles.xml`
#[derive(Debug, Clone, Default)]
pub struct StyleMap {
    names: HashMap<String, String>,
    default_paragraph: Option<String>,
}

impl StyleMap {
    pub fn from_styles(styles: &XmlDocument) -> Self {
        let mut map = StyleMap::default();
        for style in styles.root.children_named("w:style") {
            if style.attr("w:type") != Some("paragraph") {
                continue;
            }
            let Some(id) = style.attr("w:styleId") else {
                continue;
            };
            let name = style
                .child("w:name")
                .and_then(|n| n.attr("w:val"))
                .map(ui_style_name)
                .unwrap_or_else(|| id.to_string());
            if matches!(style.attr("w:default"), Some("1") | Some("true")) {
                map.default_paragraph = Some(name.clone());
            }
            map.names.insert(id.to_string(), name);
        }
        map
    }

    /// Styles of a package; an absent styles part gives an empty map
    pub fn from_package(package: &DocxPackage) -> Result<Self> {
        if package.part(STYLES_PART).is_none() {
            return Ok(Self::default());
        }
        Ok(Self::from_styles(&package.xml_part(STYLES_PART)?))
    }

    /// Display name of a paragraph's style
    pub fn paragraph_style(&self, paragraph: &Element) -> String {
        let id = paragraph
            .child("w:pPr")
            .and_then(|ppr| ppr.child("w:pStyle"))
            .and_then(|s| s.attr("w:val"));
        match id {
            Some(id) => self.names.get(id).cloned().unwrap_or_else(|| id.to_string()),
            None => self
                .default_paragraph
                .clone()
                .unwrap_or_else(|| DEFAULT_PARAGRAPH_STYLE.to_string()),
        }
    }
}

/// Word stores built-in style names in lower case; the UI capitalises them
fn ui_style_name(internal: &str) -> String {
    let lower = internal.to_lowercase();
    match lower.as_str() {
        "caption" | "footer" | "header" | "normal" | "subtitle" | "title" => {
            let mut chars = lower.chars();
            chars
                .next()
                .map(|c| c.to_uppercase().collect::<String>() + chars.as_str())
                .unwrap_or_default()
        }
        _ if lower.starts_with("heading ") && lower[8..].chars().all(|c| c.is_ascii_digit()) => {
            format!("Heading {}", &lower[8..])
        }
        _ => internal.to_string(),
    }
}

/// Visible text of a paragraph element
pub fn paragraph_text(paragraph: &Element) -> String {
    let mut out = String::new();
    collect_text(paragraph, &mut out);
    out
}

fn collect_text(el: &Element, out: &mut String) {
    for child in el.elements() {
        if child.is("w:r") {
            run_text(child, out);
        } else if is_run_container(child) {
            collect_text(child, out);
        }
    }
}

fn run_text(run: &Element, out: &mut String) {
    for child in run.elements() {
        match child.name.as_str() {
            "w:t" => out.push_str(&child.text()),
            "w:tab" => out.push('\t'),
            "w:br" => match child.attr("w:type") {
                None | Some("textWrapping") => out.push('\n'),
                _ => {}
            },
            "w:cr" => out.push('\n'),
            "w:noBreakHyphen" => out.push('-'),
            _ => {}
        }
    }
}

/// Every run of a paragraph in order, including runs nested in hyperlinks
pub fn paragraph_runs_mut(paragraph: &mut Element) -> Vec<&mut Element> {
    let mut runs = Vec::new();
    collect_runs_mut(paragraph, &mut runs);
    runs
}

fn collect_runs_mut<'a>(el: &'a mut Element, runs: &mut Vec<&'a mut Element>) {
    for child in el.elements_mut() {
        if child.is("w:r") {
            runs.push(child);
        } else if is_run_container(child) {
            collect_runs_mut(child, runs);
        }
    }
}

fn is_run_container(el: &Element) -> bool {
    matches!(
        el.name.as_str(),
        "w:hyperlink" | "w:ins" | "w:smartTag" | "w:fldSimple" | "w:sdt" | "w:sdtContent" | "w:customXml"
    )
}

/// `w:body` of a document part
pub fn body(doc: &XmlDocument) -> Option<&Element> {
    doc.root.child("w:body")
}

pub fn body_mut(doc: &mut XmlDocument) -> Option<&mut Element> {
    doc.root.child_mut("w:body")
}

fn read_paragraph(p: &Element, styles: &StyleMap) -> Paragraph {
    Paragraph {
        style: styles.paragraph_style(p),
        text: paragraph_text(p),
    }
}

/// Rows of a table, one cell per `w:tc`
fn read_table(tbl: &Element, styles: &StyleMap) -> Table {
    let rows = tbl
        .children_named("w:tr")
        .map(|tr| {
            tr.children_named("w:tc")
                .map(|tc| Cell {
                    paragraphs: tc.children_named("w:p").map(|p| read_paragraph(p, styles)).collect(),
                })
                .collect()
        })
        .collect();
    Table { rows }
}

/// Body blocks in document order
pub fn read_body(package: &DocxPackage) -> Result<Vec<Block>> {
    let styles = StyleMap::from_package(package)?;
    let doc = package.document()?;
    Ok(read_blocks(&doc, &styles))
}

/// Body blocks of an already parsed document part
pub fn read_blocks(doc: &XmlDocument, styles: &StyleMap) -> Vec<Block> {
    let Some(body) = body(doc) else {
        return Vec::new();
    };
    body.elements()
        .filter_map(|el| match el.name.as_str() {
            "w:p" => Some(Block::Paragraph(read_paragraph(el, styles))),
            "w:tbl" => Some(Block::Table(read_table(el, styles))),
            _ => None,
        })
        .collect()
}
