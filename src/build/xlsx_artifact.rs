// @module: Translated data supplement workbook

use anyhow::Result;
use log::{info, warn};
use std::collections::HashMap;
use std::path::Path;

use crate::app_config::WorkbookConfig;
use crate::locale::{Component, TranslationSet};
use crate::text_utils::slugify_term;
use crate::xlsx::{Sheet, Workbook};

/// Header of a target-language column, e.g. `Competence name (nl)`
pub fn target_header(base: &str, lang: &str) -> String {
    format!("{} ({})", base, lang)
}

/// Target-language columns of one sheet, created on demand
struct TargetColumns<'a> {
    lang: &'a str,
    map: HashMap<String, usize>,
}

impl<'a> TargetColumns<'a> {
    fn ensure(sheet: &mut Sheet, bases: &[&str], lang: &'a str) -> Self {
        let desired: Vec<String> = bases.iter().map(|b| target_header(b, lang)).collect();
        Self {
            lang,
            map: sheet.ensure_headers(&desired),
        }
    }

    fn set(&self, sheet: &mut Sheet, row: usize, base: &str, value: String) {
        if let Some(&col) = self.map.get(&target_header(base, self.lang)) {
            sheet.set(row, col, value);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct XlsxReport {
    /// Sheets that received target-language columns
    pub sheets: Vec<String>,
    /// Sheets named in the configuration but absent from the workbook
    pub missing_sheets: Vec<String>,
}

fn framework_sheet(sheet: &mut Sheet, tx: &TranslationSet, lang: &str) {
    let cols = TargetColumns::ensure(
        sheet,
        &["Competence area name", "Competence area descriptor", "Competence name", "Competence descriptor"],
        lang,
    );
    for r in 2..=sheet.max_row() {
        let area = sheet.text(r, 1);
        let comp = sheet.text(r, 4);
        cols.set(sheet, r, "Competence area name", tx.tr(Component::CoreFramework, &format!("digcomp.area.{}.label", area)));
        cols.set(sheet, r, "Competence area descriptor", tx.tr(Component::CoreFramework, &format!("digcomp.area.{}.description", area)));
        cols.set(sheet, r, "Competence name", tx.tr(Component::CoreFramework, &format!("digcomp.competence.{}.label", comp)));
        cols.set(sheet, r, "Competence descriptor", tx.tr(Component::CoreFramework, &format!("digcomp.competence.{}.description", comp)));
    }
}

fn levels_sheet(sheet: &mut Sheet, tx: &TranslationSet, lang: &str) {
    let cols = TargetColumns::ensure(
        sheet,
        &["Proficiency level name", "Four level description", "Purpose", "Eight level description"],
        lang,
    );
    for r in 2..=sheet.max_row() {
        if sheet.cell(r, 4).is_empty() {
            continue;
        }
        let eight = sheet.text(r, 4);
        let level = |field: &str| tx.tr(Component::Levels, &format!("digcomp.level.{}.{}", eight, field));
        cols.set(sheet, r, "Proficiency level name", level("four_level_name"));
        cols.set(sheet, r, "Four level description", level("four_level_description"));
        cols.set(sheet, r, "Purpose", level("applies_to"));
        cols.set(sheet, r, "Eight level description", level("eight_level_description"));
    }
}

fn statements_sheet(sheet: &mut Sheet, tx: &TranslationSet, level_names: &HashMap<String, String>, lang: &str) {
    let cols = TargetColumns::ensure(
        sheet,
        &[
            "Competence area name",
            "Competence area descriptor",
            "Competence name",
            "Competence descriptor",
            "Proficiency level name",
            "Competence statement",
        ],
        lang,
    );
    for r in 2..=sheet.max_row() {
        let area = sheet.text(r, 1);
        let comp = sheet.text(r, 4);
        let id = sheet.text(r, 7);
        let proficiency = sheet.text(r, 9);
        cols.set(sheet, r, "Competence area name", tx.tr(Component::CoreFramework, &format!("digcomp.area.{}.label", area)));
        cols.set(sheet, r, "Competence area descriptor", tx.tr(Component::CoreFramework, &format!("digcomp.area.{}.description", area)));
        cols.set(sheet, r, "Competence name", tx.tr(Component::CoreFramework, &format!("digcomp.competence.{}.label", comp)));
        cols.set(sheet, r, "Competence descriptor", tx.tr(Component::CoreFramework, &format!("digcomp.competence.{}.description", comp)));
        if !proficiency.is_empty() {
            let name = level_names.get(&proficiency.to_lowercase()).cloned().unwrap_or_default();
            cols.set(sheet, r, "Proficiency level name", name);
        }
        if !id.is_empty() {
            cols.set(sheet, r, "Competence statement", tx.tr(Component::Statements, &format!("digcomp.statement.{}", id)));
        }
    }
}

fn outcomes_sheet(sheet: &mut Sheet, tx: &TranslationSet, level_names: &HashMap<String, String>, lang: &str) {
    let cols = TargetColumns::ensure(
        sheet,
        &["Competence area name", "Competence name", "Proficiency level", "Learning outcome"],
        lang,
    );
    for r in 2..=sheet.max_row() {
        let area = sheet.text(r, 1);
        let comp = sheet.text(r, 3);
        let id = sheet.text(r, 5);
        let proficiency = sheet.text(r, 7);
        cols.set(sheet, r, "Competence area name", tx.tr(Component::CoreFramework, &format!("digcomp.area.{}.label", area)));
        cols.set(sheet, r, "Competence name", tx.tr(Component::CoreFramework, &format!("digcomp.competence.{}.label", comp)));
        if !proficiency.is_empty() {
            let name = level_names.get(&proficiency.to_lowercase()).cloned().unwrap_or_default();
            cols.set(sheet, r, "Proficiency level", name);
        }
        if !id.is_empty() {
            cols.set(sheet, r, "Learning outcome", tx.tr(Component::Outcomes, &format!("digcomp.outcome.{}", id)));
        }
    }
}

fn glossary_sheet(sheet: &mut Sheet, tx: &TranslationSet, lang: &str) {
    let cols = TargetColumns::ensure(sheet, &["Term", "Explanation"], lang);
    for r in 2..=sheet.max_row() {
        let term = sheet.text(r, 1);
        if term.is_empty() {
            continue;
        }
        let slug = slugify_term(&term);
        cols.set(sheet, r, "Term", tx.tr(Component::Glossary, &format!("digcomp.glossary.{}.label", slug)));
        cols.set(sheet, r, "Explanation", tx.tr(Component::Glossary, &format!("digcomp.glossary.{}.definition", slug)));
    }
}

/// Add target-language columns to every known sheet of `workbook`
pub fn translate_workbook(workbook: &mut Workbook, sheets: &WorkbookConfig, tx: &TranslationSet, lang: &str) -> XlsxReport {
    let level_names = tx.level_name_map();
    let mut report = XlsxReport::default();

    let names = [
        sheets.framework_sheet.as_str(),
        sheets.levels_sheet.as_str(),
        sheets.statements_sheet.as_str(),
        sheets.outcomes_sheet.as_str(),
        sheets.glossary_sheet.as_str(),
    ];
    for (i, name) in names.into_iter().enumerate() {
        let Some(sheet) = workbook.sheet_mut(name) else {
            warn!("Sheet '{}' not found, skipping", name);
            report.missing_sheets.push(name.to_string());
            continue;
        };
        match i {
            0 => framework_sheet(sheet, tx, lang),
            1 => levels_sheet(sheet, tx, lang),
            2 => statements_sheet(sheet, tx, &level_names, lang),
            3 => outcomes_sheet(sheet, tx, &level_names, lang),
            _ => glossary_sheet(sheet, tx, lang),
        }
        report.sheets.push(name.to_string());
    }
    report
}

/// Write the translated copy of `src_xlsx` to `out_xlsx`
pub fn build_xlsx<P: AsRef<Path>, Q: AsRef<Path>>(
    src_xlsx: P,
    out_xlsx: Q,
    sheets: &WorkbookConfig,
    tx: &TranslationSet,
    lang: &str,
) -> Result<XlsxReport> {
    let mut workbook = Workbook::open(src_xlsx)?;
    let report = translate_workbook(&mut workbook, sheets, tx, lang);
    workbook.save(out_xlsx.as_ref())?;
    info!("Wrote XLSX: {}", out_xlsx.as_ref().display());
    Ok(report)
}
