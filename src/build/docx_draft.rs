/*!
 * Manifest-driven working draft of the translated document.
 *
 * Sections are emitted in manifest order, each under a level-1 heading.
 * Importable sections list their `texts` rows (context in italics above the
 * value); exportable sections render tables from the structured components,
 * using the original workbook for row order and untranslated columns.
 */

use anyhow::Result;
use log::{info, warn};
use std::collections::BTreeMap;
use std::path::Path;

use crate::app_config::WorkbookConfig;
use crate::docx::{Cell, DocxBuilder, Para, Row, Run, RunStyle, TableSpec};
use crate::language_utils::is_dutch;
use crate::locale::{Component, TranslationSet};
use crate::manifest::{Manifest, Section};
use crate::text_utils::NaturalKey;
use crate::xlsx::{Sheet, Workbook};

/// Fixed texts of the draft
#[derive(Debug, Clone, Copy)]
struct DraftLabels {
    title: &'static str,
    acronyms: [&'static str; 2],
    glossary: [&'static str; 2],
    framework: [&'static str; 3],
    levels: [&'static str; 6],
    /// ID, area, competence, level, AI
    statement_cols: [&'static str; 5],
    /// ID, area, competence, level, type, AI
    outcome_cols: [&'static str; 6],
}

const DUTCH: DraftLabels = DraftLabels {
    title: "DigComp 3.0 – Nederlandse vertaling (werkversie)",
    acronyms: ["Acroniem", "Betekenis"],
    glossary: ["Term", "Definitie"],
    framework: ["Nr", "Naam", "Beschrijving"],
    levels: ["8-level", "4-level naam", "4-level beschrijving", "8-level beschrijving", "Doel (applies to)", "6-level"],
    statement_cols: ["ID", "Area", "Competence", "Level", "AI"],
    outcome_cols: ["ID", "Area", "Competence", "Level", "Type", "AI"],
};

const ENGLISH: DraftLabels = DraftLabels {
    title: "DigComp 3.0 – translation (working draft)",
    acronyms: ["Acronym", "Meaning"],
    glossary: ["Term", "Definition"],
    framework: ["No", "Name", "Description"],
    levels: ["8-level", "4-level name", "4-level description", "8-level description", "Applies to", "6-level"],
    statement_cols: ["ID", "Area", "Competence", "Level", "AI"],
    outcome_cols: ["ID", "Area", "Competence", "Level", "Type", "AI"],
};

fn header_row(labels: &[&str]) -> Row {
    Row::new(labels.iter().map(|l| Cell::text(*l)).collect()).header()
}

fn text_row(values: Vec<String>) -> Row {
    Row::new(values.into_iter().map(Cell::text).collect())
}

fn or_else(translated: String, fallback: String) -> String {
    if translated.is_empty() { fallback } else { translated }
}

/// Fields of `<prefix>.<id>.<field>` rows grouped per `<prefix>.<id>`, sorted by base key
fn group_fields(tx: &TranslationSet, component: Component, prefix: &str) -> BTreeMap<String, BTreeMap<String, String>> {
    let mut groups: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    let Some(texts) = tx.component(component.as_str()) else {
        return groups;
    };
    for rec in texts.records() {
        if !rec.location.starts_with(prefix) {
            continue;
        }
        let Some((base, field)) = rec.location.rsplit_once('.') else {
            continue;
        };
        groups
            .entry(base.to_string())
            .or_default()
            .insert(field.to_string(), rec.best_text().to_string());
    }
    groups
}

struct Draft<'a> {
    doc: DocxBuilder,
    tx: &'a TranslationSet,
    workbook: &'a Workbook,
    sheets: &'a WorkbookConfig,
    labels: DraftLabels,
    source_lang: String,
    target_lang: String,
}

impl<'a> Draft<'a> {
    fn sheet(&self, name: &str) -> Option<&'a Sheet> {
        let sheet = self.workbook.sheet(name);
        if sheet.is_none() {
            warn!("Sheet '{}' not found, table left empty", name);
        }
        sheet
    }

    fn core(&self, location: String) -> String {
        self.tx.tr(Component::CoreFramework, &location)
    }

    fn text_rows(&mut self, prefix: &str) {
        let Some(texts) = self.tx.component(Component::Texts.as_str()) else {
            return;
        };
        let wanted = format!("{}.", prefix);
        let mut rows: Vec<_> = texts.records().iter().filter(|r| r.location.starts_with(&wanted)).collect();
        rows.sort_by(|a, b| a.location.cmp(&b.location));

        for rec in rows {
            let value = rec.best_text();
            if value.is_empty() {
                continue;
            }
            let context = rec.context.trim();
            if !context.is_empty() {
                self.doc.para(Para::new().run(Run::styled(context, RunStyle::default().italic())));
            }
            self.doc.paragraph(value);
        }
    }

    fn acronyms_table(&mut self) {
        let mut table = TableSpec::new(Vec::new());
        table.push(header_row(&self.labels.acronyms));
        for (base, fields) in group_fields(self.tx, Component::Acronyms, "digcomp.acronym.") {
            let label = fields
                .get("label")
                .filter(|l| !l.is_empty())
                .cloned()
                .unwrap_or_else(|| base.rsplit('.').next().unwrap_or(&base).to_string());
            let definition = fields.get("definition").cloned().unwrap_or_default();
            table.push(text_row(vec![label, definition]));
        }
        self.doc.table(&table);
    }

    fn glossary_table(&mut self) {
        let mut table = TableSpec::new(Vec::new());
        table.push(header_row(&self.labels.glossary));
        for fields in group_fields(self.tx, Component::Glossary, "digcomp.glossary.").into_values() {
            let term = fields.get("label").cloned().unwrap_or_default();
            let definition = fields.get("definition").cloned().unwrap_or_default();
            if term.is_empty() && definition.is_empty() {
                continue;
            }
            table.push(text_row(vec![term, definition]));
        }
        self.doc.table(&table);
    }

    /// `(id, label, description)` of `digcomp.<kind>.<id>.label` rows, naturally sorted
    fn framework_entries(&self, kind: &str) -> Vec<(String, String, String)> {
        let Some(core) = self.tx.component(Component::CoreFramework.as_str()) else {
            return Vec::new();
        };
        let prefix = format!("digcomp.{}.", kind);
        let mut entries: Vec<(String, String, String)> = core
            .records()
            .iter()
            .filter_map(|r| r.location.strip_prefix(&prefix)?.strip_suffix(".label"))
            .map(|id| {
                (
                    id.to_string(),
                    self.core(format!("digcomp.{}.{}.label", kind, id)),
                    self.core(format!("digcomp.{}.{}.description", kind, id)),
                )
            })
            .collect();
        entries.sort_by_cached_key(|(id, _, _)| NaturalKey::new(id));
        entries
    }

    fn framework_tables(&mut self) {
        for (kind, heading) in [("area", "Competence areas"), ("competence", "Competences")] {
            self.doc.heading(heading, 2);
            let mut table = TableSpec::new(Vec::new());
            table.push(header_row(&self.labels.framework));
            for (id, label, description) in self.framework_entries(kind) {
                table.push(text_row(vec![id, label, description]));
            }
            self.doc.table(&table);
        }
    }

    fn levels_table(&mut self) {
        self.doc.heading("Proficiency levels", 2);
        let mut table = TableSpec::new(Vec::new());
        table.push(header_row(&self.labels.levels));
        if let Some(sheet) = self.sheet(&self.sheets.levels_sheet) {
            for r in 2..=sheet.max_row() {
                if sheet.cell(r, 4).is_empty() {
                    continue;
                }
                let eight = sheet.text(r, 4);
                let level = |field: &str| self.tx.tr(Component::Levels, &format!("digcomp.level.{}.{}", eight, field));
                table.push(text_row(vec![
                    eight.clone(),
                    or_else(level("four_level_name"), sheet.text(r, 1)),
                    or_else(level("four_level_description"), sheet.text(r, 2)),
                    or_else(level("eight_level_description"), sheet.text(r, 6)),
                    or_else(level("applies_to"), sheet.text(r, 3)),
                    sheet.text(r, 5),
                ]));
            }
        }
        self.doc.table(&table);
    }

    fn lang_header(&self, base: &str, lang: &str) -> String {
        format!("{} ({})", base, lang.to_uppercase())
    }

    fn statements_table(&mut self) {
        self.doc.heading("Competence statements", 2);
        let level_names = self.tx.level_name_map();
        let mut headers: Vec<String> = self.labels.statement_cols.iter().map(|s| s.to_string()).collect();
        headers.push(self.lang_header("Statement", &self.source_lang));
        headers.push(self.lang_header("Statement", &self.target_lang));

        let mut table = TableSpec::new(Vec::new());
        table.push(Row::new(headers.into_iter().map(Cell::text).collect()).header());
        if let Some(sheet) = self.sheet(&self.sheets.statements_sheet) {
            for r in 2..=sheet.max_row() {
                let id = sheet.text(r, 7);
                if id.is_empty() {
                    continue;
                }
                let level = sheet.text(r, 9);
                let source = sheet.text(r, 8);
                let target = or_else(self.tx.tr(Component::Statements, &format!("digcomp.statement.{}", id)), source.clone());
                table.push(text_row(vec![
                    id,
                    or_else(self.core(format!("digcomp.area.{}.label", sheet.text(r, 1))), sheet.text(r, 2)),
                    or_else(self.core(format!("digcomp.competence.{}.label", sheet.text(r, 4))), sheet.text(r, 5)),
                    level_names.get(&level.to_lowercase()).cloned().unwrap_or_default(),
                    sheet.text(r, 10),
                    source,
                    target,
                ]));
            }
        }
        self.doc.table(&table);
    }

    fn outcomes_table(&mut self) {
        self.doc.heading("Learning outcomes", 2);
        let level_names = self.tx.level_name_map();
        let mut headers: Vec<String> = self.labels.outcome_cols.iter().map(|s| s.to_string()).collect();
        headers.push(self.lang_header("Outcome", &self.source_lang));
        headers.push(self.lang_header("Outcome", &self.target_lang));

        let mut table = TableSpec::new(Vec::new());
        table.push(Row::new(headers.into_iter().map(Cell::text).collect()).header());
        if let Some(sheet) = self.sheet(&self.sheets.outcomes_sheet) {
            for r in 2..=sheet.max_row() {
                let id = sheet.text(r, 5);
                if id.is_empty() {
                    continue;
                }
                let level = sheet.text(r, 7);
                let source = sheet.text(r, 6);
                let target = or_else(self.tx.tr(Component::Outcomes, &format!("digcomp.outcome.{}", id)), source.clone());
                table.push(text_row(vec![
                    id,
                    or_else(self.core(format!("digcomp.area.{}.label", sheet.text(r, 1))), sheet.text(r, 2)),
                    or_else(self.core(format!("digcomp.competence.{}.label", sheet.text(r, 3))), sheet.text(r, 4)),
                    level_names.get(&level.to_lowercase()).cloned().unwrap_or_default(),
                    sheet.text(r, 8),
                    sheet.text(r, 9),
                    source,
                    target,
                ]));
            }
        }
        self.doc.table(&table);
    }

    fn key_value_dump(&mut self, component: &str) {
        self.doc.heading(&format!("Export: {}", component), 2);
        let Some(texts) = self.tx.component(component) else {
            return;
        };
        let mut locations: Vec<&str> = texts.records().iter().map(|r| r.location.as_str()).collect();
        locations.sort_unstable();
        for location in locations {
            let value = texts.tr(location);
            if !value.is_empty() {
                self.doc.paragraph(&format!("{}: {}", location, value));
            }
        }
    }

    fn section(&mut self, section: &Section) {
        self.doc.heading(section.display_title(), 1);

        if section.is_importable() {
            self.text_rows(&section.key_prefix());
        }
        if section.is_exportable() {
            for export in &section.export {
                match export.component.as_str() {
                    "core-framework" => self.framework_tables(),
                    "levels" => self.levels_table(),
                    "statements" => self.statements_table(),
                    "outcomes" => self.outcomes_table(),
                    "glossary" => self.glossary_table(),
                    "acronyms" => self.acronyms_table(),
                    other => self.key_value_dump(other),
                }
            }
        }
    }
}

/// Assemble the draft document in memory
pub fn draft_document(
    manifest: &Manifest,
    workbook: &Workbook,
    sheets: &WorkbookConfig,
    tx: &TranslationSet,
    source_lang: &str,
    target_lang: &str,
) -> DocxBuilder {
    let labels = if is_dutch(target_lang) { DUTCH } else { ENGLISH };
    let mut draft = Draft {
        doc: DocxBuilder::new(),
        tx,
        workbook,
        sheets,
        labels,
        source_lang: source_lang.to_string(),
        target_lang: target_lang.to_string(),
    };
    draft.doc.heading(labels.title, 0);
    for section in &manifest.sections {
        draft.section(section);
    }
    draft.doc
}

/// Write the draft built from `manifest_path` and `src_xlsx` to `out_docx`
pub fn build_docx_draft<P: AsRef<Path>>(
    manifest_path: &Path,
    src_xlsx: &Path,
    sheets: &WorkbookConfig,
    tx: &TranslationSet,
    source_lang: &str,
    target_lang: &str,
    out_docx: P,
) -> Result<()> {
    let manifest = Manifest::load(manifest_path)?;
    let workbook = Workbook::open(src_xlsx)?;

    let doc = draft_document(&manifest, &workbook, sheets, tx, source_lang, target_lang);
    doc.save(out_docx.as_ref())?;
    info!("Wrote DOCX: {}", out_docx.as_ref().display());
    Ok(())
}
