/*!
 * Stand-alone layout tables for the translated publication.
 *
 * `acronyms` and `glossary` are read from a locale CSV; `digcomp3`, `table2`
 * and `outcomes` from the translated JSON-LD graph, using the
 * `<field>_<lang>` properties written by the JSON-LD build.
 */

use anyhow::{Context, Result};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use super::id_last_segment;
use super::jsonld_artifact::node_type;
use crate::docx::builder::heading_style_id;
use crate::docx::{Borders, Cell, DocxBuilder, Para, Row, Run, RunStyle, TableSpec, VMerge};
use crate::file_utils::FileManager;
use crate::language_utils::is_dutch;
use crate::locale::{LocaleRecord, read_locale_csv};
use crate::text_utils::NaturalKey;

// @const: Four tints per competence area, lightest first; the last is the area colour
const AREA_TINTS: [(&str, [&str; 4]); 5] = [
    ("CompetenceArea/1", ["FFF2CC", "FFE699", "FFD966", "FFC000"]),
    ("CompetenceArea/2", ["D9E1F2", "B4C6E7", "8EA9DB", "2F5597"]),
    ("CompetenceArea/3", ["FBE5D6", "F8CBAD", "F4B084", "ED7D31"]),
    ("CompetenceArea/4", ["E2EFDA", "C6E0B4", "A9D08E", "70AD47"]),
    ("CompetenceArea/5", ["FCE4D6", "F9CB9C", "F4B084", "E26B67"]),
];

// @const: Standard DigComp blue
const STANDARD_BLUE: &str = "1F4E78";

const HEADER_BLUE: &str = "2F5597";
const RULE_GREY: &str = "D9D9D9";
const NO_TINTS: [&str; 4] = ["FFFFFF"; 4];

// @const: English four-level names, as used in proficiency references
const LEVEL_KEYS: [&str; 4] = ["Basic", "Intermediate", "Advanced", "Highly advanced"];

static ACRONYM_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)acronym\.([^.]+)\.(label|expansion|definition|source)").unwrap());
static GLOSSARY_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)glossary\.([^.]+)\.(label|expansion|definition|source)").unwrap());

/// Table selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TableKind {
    Acronyms,
    Glossary,
    Digcomp3,
    Table2,
    Outcomes,
}

impl TableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Acronyms => "acronyms",
            TableKind::Glossary => "glossary",
            TableKind::Digcomp3 => "digcomp3",
            TableKind::Table2 => "table2",
            TableKind::Outcomes => "outcomes",
        }
    }

    /// Built from a locale CSV rather than the JSON-LD graph
    pub fn is_csv_based(&self) -> bool {
        matches!(self, TableKind::Acronyms | TableKind::Glossary)
    }

    /// Default output file name, e.g. `DigComp3_table2_nl.docx`
    pub fn default_output(&self, lang: &str) -> PathBuf {
        PathBuf::from(format!("DigComp3_{}_{}.docx", self.as_str(), lang))
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs of the table generator
#[derive(Debug, Clone)]
pub struct TableOptions {
    pub lang: String,
    /// Locale folder holding `<type>/<lang>.csv`
    pub locale_dir: PathBuf,
    /// Translated JSON-LD
    pub jsonld: PathBuf,
    /// Folder with the `DC3_*.png` icons
    pub images_dir: PathBuf,
}

fn arial(size: f32) -> RunStyle {
    RunStyle::arial(size)
}

fn tints(area_id: &str) -> [&'static str; 4] {
    AREA_TINTS
        .iter()
        .find(|(id, _)| *id == area_id)
        .map(|(_, t)| *t)
        .unwrap_or(NO_TINTS)
}

/// Spelled-out AI label; `-` when absent or not implicit
pub fn format_ai_label(raw: &str, lang: &str) -> String {
    if raw.is_empty() || raw.contains("not Implicit") || raw == "-" {
        return "-".to_string();
    }
    if is_dutch(lang) {
        return raw.replace("AI-Implicit", "AI-Impliciet").replace("AI-Explicit", "AI-Expliciet");
    }
    raw.to_string()
}

fn rules(size: u32) -> Borders {
    Borders::Horizontal {
        size,
        color: RULE_GREY.to_string(),
    }
}

fn heading(doc: &mut DocxBuilder, text: &str) {
    doc.para(Para::styled(text, arial(18.0).color(STANDARD_BLUE)).with_style(&heading_style_id(1)));
}

/// Embed an icon when it exists; unreadable icons are skipped
fn icon(doc: &mut DocxBuilder, path: &Path, width_cm: f64) -> Option<Run> {
    if !FileManager::file_exists(path) {
        return None;
    }
    match doc.add_png(path, width_cm) {
        Ok(image) => Some(Run::Image(image)),
        Err(e) => {
            warn!("Skipping icon {}: {}", path.display(), e);
            None
        }
    }
}

/// One acronym or glossary term
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermEntry {
    pub label: String,
    /// Expansion or definition
    pub meaning: String,
    pub source: String,
}

/// Group `<key>.<id>.<field>` rows into entries sorted by label.
///
/// The English table reads the source column, other languages the target.
pub fn group_terms(kind: TableKind, rows: &[LocaleRecord], lang: &str) -> Vec<TermEntry> {
    let pattern: &Regex = if kind == TableKind::Acronyms { &*ACRONYM_FIELD } else { &*GLOSSARY_FIELD };
    let english = lang.eq_ignore_ascii_case("en");

    let mut order: Vec<String> = Vec::new();
    let mut grouped: HashMap<String, TermEntry> = HashMap::new();
    for rec in rows {
        let Some(caps) = pattern.captures(&rec.location) else {
            continue;
        };
        let id = caps[1].to_string();
        let value = if english { &rec.source } else { &rec.target };
        let entry = grouped.entry(id.clone()).or_insert_with(|| {
            order.push(id.clone());
            TermEntry {
                label: id.to_uppercase(),
                ..Default::default()
            }
        });
        match caps[2].to_lowercase().as_str() {
            "label" => entry.label = value.clone(),
            "expansion" | "definition" => entry.meaning = value.clone(),
            _ => entry.source = value.clone(),
        }
    }

    let mut entries: Vec<TermEntry> = order.into_iter().filter_map(|id| grouped.remove(&id)).collect();
    entries.sort_by_cached_key(|e| e.label.to_lowercase());
    entries
}

fn header_cells(labels: &[&str], fill: &str) -> Row {
    Row::new(
        labels
            .iter()
            .map(|l| Cell::styled(*l, arial(9.0).bold().color("FFFFFF")).shaded(fill))
            .collect(),
    )
}

/// Acronyms in two side-by-side column pairs, or glossary terms in three columns
pub fn terms_document(kind: TableKind, entries: &[TermEntry], lang: &str) -> DocxBuilder {
    let dutch = is_dutch(lang);
    let mut doc = DocxBuilder::new();
    let mut table = TableSpec::new(Vec::new()).borders(rules(2));

    if kind == TableKind::Acronyms {
        heading(&mut doc, if dutch { "LIJST VAN ACRONYMEN" } else { "LIST OF ACRONYMS" });
        let labels = if dutch {
            ["ACRONIEM", "BETEKENIS", "ACRONIEM", "BETEKENIS"]
        } else {
            ["ACRONYM", "DESCRIPTION", "ACRONYM", "DESCRIPTION"]
        };
        table.push(header_cells(&labels, STANDARD_BLUE));

        let half = entries.len().div_ceil(2);
        for i in 0..half {
            let mut cells = vec![
                Cell::styled(entries[i].label.clone(), arial(9.0).bold()),
                Cell::styled(entries[i].meaning.clone(), arial(9.0)),
            ];
            match entries.get(i + half) {
                Some(right) => {
                    cells.push(Cell::styled(right.label.clone(), arial(9.0).bold()));
                    cells.push(Cell::styled(right.meaning.clone(), arial(9.0)));
                }
                None => cells.extend([Cell::new(), Cell::new()]),
            }
            table.push(Row::new(cells));
        }
    } else {
        heading(
            &mut doc,
            if dutch {
                "GLOSSARIUM VAN TERMEN EN DEFINITIES"
            } else {
                "GLOSSARY OF TERMS AND DEFINITIONS"
            },
        );
        let labels = if dutch { ["TERM", "UITLEG", "BRON"] } else { ["TERM", "EXPLANATION", "SOURCE"] };
        table.push(header_cells(&labels, STANDARD_BLUE));
        for e in entries {
            table.push(Row::new(vec![
                Cell::styled(e.label.clone(), arial(9.0).bold()),
                Cell::styled(e.meaning.clone(), arial(9.0)),
                Cell::styled(e.source.clone(), arial(9.0)),
            ]));
        }
    }

    doc.table(&table);
    doc
}

/// Typed view over the `@graph` of the translated JSON-LD
pub struct Graph<'a> {
    nodes: Vec<&'a Value>,
    suffix: String,
}

fn text<'a>(node: &'a Value, key: &str) -> &'a str {
    node.get(key).and_then(Value::as_str).unwrap_or("")
}

fn id_of(node: &Value) -> &str {
    text(node, "@id")
}

impl<'a> Graph<'a> {
    /// Nodes of `doc["@graph"]`; `<field>_<lang>` is read unless `lang` is English
    pub fn new(doc: &'a Value, lang: &str) -> Self {
        let nodes = doc
            .get("@graph")
            .and_then(Value::as_array)
            .map(|g| g.iter().collect())
            .unwrap_or_default();
        let suffix = if lang.eq_ignore_ascii_case("en") {
            String::new()
        } else {
            format!("_{}", lang)
        };
        Self { nodes, suffix }
    }

    fn of_type(&self, kind: &str) -> impl Iterator<Item = &'a Value> + '_ {
        let kind = kind.to_string();
        self.nodes.iter().copied().filter(move |n| node_type(n) == Some(kind.as_str()))
    }

    /// Localised value of `field`
    fn local<'n>(&self, node: &'n Value, field: &str) -> &'n str {
        text(node, &format!("{}{}", field, self.suffix))
    }

    pub fn areas(&self) -> Vec<&'a Value> {
        let mut areas: Vec<&Value> = self.of_type("CompetenceArea").collect();
        areas.sort_by_cached_key(|a| NaturalKey::new(id_of(a)));
        areas
    }

    pub fn competences_of(&self, area_id: &str) -> Vec<&'a Value> {
        let mut comps: Vec<&Value> = self
            .of_type("Competence")
            .filter(|c| text(c, "competence_area_id") == area_id)
            .collect();
        comps.sort_by_cached_key(|c| NaturalKey::new(id_of(c)));
        comps
    }

    fn statements_of(&self, comp_id: &str, level_key: &str) -> Vec<&'a Value> {
        let prefix = format!("ProficiencyLevel/{}", level_key);
        self.of_type("CompetenceStatement")
            .filter(|s| text(s, "competence_id") == comp_id && text(s, "four_levels_proficiency_name").starts_with(&prefix))
            .collect()
    }

    fn outcomes_of(&self, comp_id: &str) -> Vec<&'a Value> {
        let mut outcomes: Vec<&Value> = self
            .of_type("LearningOutcome")
            .filter(|o| text(o, "competence_id") == comp_id)
            .collect();
        outcomes.sort_by_cached_key(|o| NaturalKey::new(id_of(o)));
        outcomes
    }

    /// Localised four-level name of the first level whose id contains `needle`
    fn level_name(&self, needle: &str) -> Option<&'a str> {
        self.of_type("ProficiencyLevel")
            .find(|l| id_of(l).contains(needle))
            .map(|l| self.local(l, "four_levels_name"))
    }
}

/// Per competence: icon, area, name and description on the left; four level rows
/// shaded in the area tints with their statements
pub fn digcomp3_document(graph: &Graph<'_>, lang: &str, images_dir: &Path) -> DocxBuilder {
    let dutch = is_dutch(lang);
    let mut doc = DocxBuilder::new();
    doc.set_side_margins_cm(1.2, 1.2);

    for area in graph.areas() {
        let area_id = id_of(area);
        let area_num = id_last_segment(area_id);
        let tint = tints(area_id);

        for comp in graph.competences_of(area_id) {
            let comp_id = id_of(comp);
            let comp_num = id_last_segment(comp_id);
            let mut table = TableSpec::new(vec![5.0, 3.8, 9.8]).borders(rules(2));

            let mut left = Cell::new().merge(VMerge::Restart);
            let icon_path = images_dir.join(format!("DC3_{}.png", comp_num.replace('.', "p")));
            left = left.para(icon(&mut doc, &icon_path, 3.8).map(|r| Para::new().run(r)).unwrap_or_default());
            left = left
                .para(Para::styled(
                    format!("{}. {}", area_num, graph.local(area, "name").to_uppercase()),
                    arial(10.0).bold().color(tint[3]),
                ))
                .para(Para::styled(
                    format!("{} {}", comp_num, graph.local(comp, "name")),
                    arial(11.0).bold(),
                ))
                .para(Para::styled(graph.local(comp, "description"), arial(8.5)));

            for (idx, level_key) in LEVEL_KEYS.into_iter().enumerate() {
                let txt_color = if area_id == "CompetenceArea/2" && idx > 1 { "FFFFFF" } else { "000000" };
                let name = graph.level_name(level_key).unwrap_or(level_key);
                let label = if dutch {
                    format!("Op {}niveau kunnen individuen", name.to_lowercase())
                } else {
                    format!("At {} level, individuals", name)
                };
                let level_cell = Cell::styled(label, arial(9.0).bold().italic().color(txt_color))
                    .shaded(tint[idx])
                    .center_vertically();

                let mut statements = Cell::new();
                for s in graph.statements_of(comp_id, level_key) {
                    let ai = format_ai_label(text(s, "ai_label"), lang);
                    statements = statements.para(
                        Para::new()
                            .run(Run::styled(format!("{}: ", id_last_segment(id_of(s))), arial(9.0).bold()))
                            .run(Run::styled(format!("{} ", graph.local(s, "description")), arial(9.0)))
                            .run(Run::styled(format!("[{}]", ai), arial(9.0).bold()))
                            .compact(),
                    );
                }

                let first = if idx == 0 {
                    std::mem::take(&mut left)
                } else {
                    Cell::new().merge(VMerge::Continue)
                };
                table.push(Row::new(vec![first, level_cell, statements]));
            }

            doc.table(&table);
            doc.empty_paragraph();
        }
    }
    doc
}

/// Areas and their competences in one overview table
pub fn table2_document(graph: &Graph<'_>, lang: &str, images_dir: &Path) -> DocxBuilder {
    let mut doc = DocxBuilder::new();
    doc.set_side_margins_cm(1.2, 1.2);

    let labels = if is_dutch(lang) {
        ["GEBIED", "TITEL", "BESCHRIJVING"]
    } else {
        ["AREA", "TITLE", "DESCRIPTOR"]
    };
    let mut table = TableSpec::new(Vec::new()).borders(rules(4));
    table.push(Row::new(
        labels
            .iter()
            .map(|l| Cell::styled(*l, arial(9.0).bold().color(HEADER_BLUE)))
            .collect(),
    ));

    for area in graph.areas() {
        let area_id = id_of(area);
        let area_num = id_last_segment(area_id);
        let comps = graph.competences_of(area_id);
        if comps.is_empty() {
            continue;
        }

        let icon_path = images_dir.join(format!("DC3_small_c{}.png", area_num));
        let mut area_cell = Cell::new()
            .merge(VMerge::Restart)
            .para(icon(&mut doc, &icon_path, 1.5).map(|r| Para::new().run(r)).unwrap_or_default())
            .para(Para::styled(
                format!("{}. {}", area_num, graph.local(area, "name").to_uppercase()),
                arial(9.0).bold().color(tints(area_id)[3]),
            ))
            .para(Para::styled(graph.local(area, "description"), arial(8.0)));

        for comp in comps {
            let first = std::mem::replace(&mut area_cell, Cell::new().merge(VMerge::Continue));
            table.push(Row::new(vec![
                first,
                Cell::styled(
                    format!("{} {}", id_last_segment(id_of(comp)), graph.local(comp, "name")),
                    arial(9.0).bold(),
                ),
                Cell::styled(graph.local(comp, "description"), arial(9.0)),
            ]));
        }
    }

    doc.table(&table);
    doc
}

fn localised_type(kind: &str, dutch: bool) -> String {
    if dutch {
        kind.replace("Knowledge", "Kennis")
            .replace("Skill", "Vaardigheid")
            .replace("Attitude", "Houding")
    } else {
        kind.to_string()
    }
}

/// Learning outcomes per competence, with repeating header rows
pub fn outcomes_document(graph: &Graph<'_>, lang: &str) -> DocxBuilder {
    let dutch = is_dutch(lang);
    let mut doc = DocxBuilder::new();
    doc.set_side_margins_cm(1.0, 1.0);

    let (area_label, comp_label) = if dutch {
        ("COMPETENTIEGEBIED", "Competentie")
    } else {
        ("COMPETENCE AREA", "Competence")
    };
    let labels = if dutch {
        ["ID", "Leerresultaat", "Niveau", "K/V/H", "AI-label"]
    } else {
        ["ID", "Outcome", "Level", "K/S/A", "AI"]
    };

    for area in graph.areas() {
        let area_id = id_of(area);
        let color = tints(area_id)[3];

        for comp in graph.competences_of(area_id) {
            let comp_id = id_of(comp);
            let mut table = TableSpec::new(vec![1.5, 10.0, 2.5, 2.5, 2.5]).borders(rules(2));

            let title = format!(
                "{} {}: {} - {} {} {}",
                area_label,
                id_last_segment(area_id),
                graph.local(area, "name"),
                comp_label,
                id_last_segment(comp_id),
                graph.local(comp, "name")
            );
            table.push(Row::new(vec![Cell::styled(title.to_uppercase(), arial(10.0).bold().color(color)).span(5)]).header());
            table.push(
                Row::new(
                    labels
                        .iter()
                        .map(|l| Cell::styled(*l, arial(8.0).bold()).shaded(color))
                        .collect(),
                )
                .header(),
            );

            for o in graph.outcomes_of(comp_id) {
                let level = graph
                    .level_name(text(o, "four_levels_proficiency_name"))
                    .unwrap_or("Level");
                table.push(
                    Row::new(vec![
                        Cell::styled(id_last_segment(id_of(o)), arial(8.0).bold()),
                        Cell::styled(graph.local(o, "description"), arial(9.0)),
                        Cell::styled(level, arial(8.0)),
                        Cell::styled(localised_type(text(o, "type"), dutch), arial(8.0)),
                        Cell::styled(format_ai_label(text(o, "ai_label"), lang), arial(8.0)),
                    ])
                    .cant_split(),
                );
            }

            doc.table(&table);
            doc.empty_paragraph();
        }
    }
    doc
}

/// Generate one table document and write it to `out_docx`
pub fn build_table<P: AsRef<Path>>(kind: TableKind, opts: &TableOptions, out_docx: P) -> Result<()> {
    let doc = if kind.is_csv_based() {
        let csv_path = opts.locale_dir.join(kind.as_str()).join(format!("{}.csv", opts.lang));
        let rows = read_locale_csv(&csv_path)?;
        let entries = group_terms(kind, &rows, &opts.lang);
        info!("{} entries read from {}", entries.len(), csv_path.display());
        terms_document(kind, &entries, &opts.lang)
    } else {
        let json: Value = serde_json::from_str(&FileManager::read_to_string(&opts.jsonld)?)
            .with_context(|| format!("Invalid JSON-LD: {}", opts.jsonld.display()))?;
        let graph = Graph::new(&json, &opts.lang);
        match kind {
            TableKind::Digcomp3 => digcomp3_document(&graph, &opts.lang, &opts.images_dir),
            TableKind::Table2 => table2_document(&graph, &opts.lang, &opts.images_dir),
            _ => outcomes_document(&graph, &opts.lang),
        }
    };

    FileManager::ensure_parent(out_docx.as_ref())?;
    doc.save(out_docx.as_ref())?;
    info!("Wrote table {}: {}", kind, out_docx.as_ref().display());
    Ok(())
}
