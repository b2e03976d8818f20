/*!
 * Step 1: the data-supplement workbook to locale CSVs.
 *
 * Every sheet feeds one component: competence areas and competences,
 * proficiency levels, competence statements, learning outcomes and the
 * glossary. Rows are upserted so existing translations survive a re-run.
 */

use anyhow::Result;
use log::{info, warn};
use std::collections::HashSet;
use std::path::Path;

use super::progress_bar;
use crate::app_config::WorkbookConfig;
use crate::file_utils::FileManager;
use crate::locale::{Component, CsvLayout, LocaleRecord, LocaleRepo, UpsertReport, upsert_locale_csv, write_locale_csv};
use crate::text_utils::slugify_term;
use crate::xlsx::{Sheet, Workbook};

/// What step1 wrote, per component
#[derive(Debug, Clone, Default)]
pub struct WorkbookReport {
    pub components: Vec<(Component, UpsertReport)>,
    /// Configured sheets the workbook does not have
    pub missing_sheets: Vec<String>,
}

impl WorkbookReport {
    pub fn rows_for(&self, component: Component) -> Option<usize> {
        self.components
            .iter()
            .find(|(c, _)| *c == component)
            .map(|(_, r)| r.rows)
    }
}

/// Areas and competences from the framework sheet (columns 1–6).
///
/// Each area and competence is emitted once, on the first row naming it.
pub fn framework_rows(sheet: &Sheet) -> Vec<LocaleRecord> {
    let mut rows = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut add = |location: String, source: String, context: String| {
        if seen.insert(location.clone()) {
            rows.push(LocaleRecord::new(location, source, context));
        }
    };

    for r in 2..=sheet.max_row() {
        let area_no = sheet.text(r, 1);
        let comp_no = sheet.text(r, 4);

        if !area_no.is_empty() {
            add(
                format!("digcomp.area.{}.label", area_no),
                sheet.text(r, 2),
                format!("Competence area {} – label", area_no),
            );
            add(
                format!("digcomp.area.{}.description", area_no),
                sheet.text(r, 3),
                format!("Competence area {} – description", area_no),
            );
        }
        if !comp_no.is_empty() {
            add(
                format!("digcomp.competence.{}.label", comp_no),
                sheet.text(r, 5),
                format!("Competence {} – label", comp_no),
            );
            add(
                format!("digcomp.competence.{}.description", comp_no),
                sheet.text(r, 6),
                format!("Competence {} – description", comp_no),
            );
        }
    }
    rows
}

/// Four rows per eight-level proficiency level; rows without a level number are skipped
pub fn level_rows(sheet: &Sheet) -> Vec<LocaleRecord> {
    let mut rows = Vec::new();
    for r in 2..=sheet.max_row() {
        if sheet.cell(r, 4).is_empty() {
            continue;
        }
        let eight = sheet.text(r, 4);
        let fields = [
            ("four_level_name", 1, "4-level name"),
            ("four_level_description", 2, "4-level description"),
            ("applies_to", 3, "applies to"),
            ("eight_level_description", 6, "8-level description"),
        ];
        for (field, col, label) in fields {
            rows.push(LocaleRecord::new(
                format!("digcomp.level.{}.{}", eight, field),
                sheet.text(r, col),
                format!("Proficiency level {} – {}", eight, label),
            ));
        }
    }
    rows
}

/// `<prefix>.<id>` rows from an id column and a text column, skipping blanks
fn id_text_rows(sheet: &Sheet, id_col: usize, text_col: usize, prefix: &str, context: &str) -> Vec<LocaleRecord> {
    (2..=sheet.max_row())
        .filter_map(|r| {
            let id = sheet.text(r, id_col);
            let text = sheet.text(r, text_col);
            if id.is_empty() || text.is_empty() {
                return None;
            }
            Some(LocaleRecord::new(
                format!("{}.{}", prefix, id),
                text,
                format!("{} {}", context, id),
            ))
        })
        .collect()
}

/// Competence statements: id in column 7, text in column 8
pub fn statement_rows(sheet: &Sheet) -> Vec<LocaleRecord> {
    id_text_rows(sheet, 7, 8, "digcomp.statement", "Competence statement")
}

/// Learning outcomes: id in column 5, text in column 6
pub fn outcome_rows(sheet: &Sheet) -> Vec<LocaleRecord> {
    id_text_rows(sheet, 5, 6, "digcomp.outcome", "Learning outcome")
}

/// Label and definition per glossary term, keyed by the term's slug
pub fn glossary_rows(sheet: &Sheet) -> Vec<LocaleRecord> {
    let mut rows = Vec::new();
    for r in 2..=sheet.max_row() {
        let term = sheet.text(r, 1);
        if term.is_empty() {
            continue;
        }
        let slug = slugify_term(&term);
        rows.push(LocaleRecord::new(
            format!("digcomp.glossary.{}.label", slug),
            term.clone(),
            "Glossary term",
        ));
        rows.push(LocaleRecord::new(
            format!("digcomp.glossary.{}.definition", slug),
            sheet.text(r, 2),
            format!("Glossary definition for {}", term),
        ));
    }
    rows
}

/// Run step1: create the repository skeleton and upsert every component
pub fn extract_workbook<P: AsRef<Path>>(
    xlsx: P,
    repo: &LocaleRepo,
    sheets: &WorkbookConfig,
    source_lang: &str,
    target_lang: &str,
) -> Result<WorkbookReport> {
    repo.ensure_skeleton()?;
    let workbook = Workbook::open(xlsx)?;

    type RowFn = fn(&Sheet) -> Vec<LocaleRecord>;
    let plan: [(Component, &str, RowFn); 5] = [
        (Component::CoreFramework, sheets.framework_sheet.as_str(), framework_rows),
        (Component::Levels, sheets.levels_sheet.as_str(), level_rows),
        (Component::Statements, sheets.statements_sheet.as_str(), statement_rows),
        (Component::Outcomes, sheets.outcomes_sheet.as_str(), outcome_rows),
        (Component::Glossary, sheets.glossary_sheet.as_str(), glossary_rows),
    ];

    let mut report = WorkbookReport::default();
    let pb = progress_bar(plan.len() as u64, "sheets");
    for (component, sheet_name, rows_of) in plan {
        pb.set_message(component.to_string());
        pb.inc(1);
        let sheet = match workbook.require_sheet(sheet_name) {
            Ok(sheet) => sheet,
            Err(e) => {
                pb.suspend(|| warn!("{}; skipping component {}", e, component));
                report.missing_sheets.push(sheet_name.to_string());
                continue;
            }
        };
        let rows = rows_of(sheet);
        let upsert = upsert_locale_csv(
            repo.csv_path(component, source_lang),
            repo.csv_path(component, target_lang),
            &rows,
        )?;
        report.components.push((component, upsert));
    }
    pb.finish_and_clear();

    // Components filled later still get header-only files
    for component in [Component::Acronyms, Component::Texts] {
        for lang in [source_lang, target_lang] {
            let path = repo.csv_path(component, lang);
            if !FileManager::file_exists(&path) {
                write_locale_csv(&path, &[], CsvLayout::Weblate)?;
            }
        }
    }

    info!("Step1 complete.");
    Ok(report)
}
