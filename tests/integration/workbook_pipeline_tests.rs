/*!
 * Workbook to locale CSVs, the JSON-LD consistency check and the translated data artifacts
 */

use anyhow::Result;
use serde_json::Value;
use std::fs;

use crate::common::{self, record};
use digcomp_l10n::app_config::WorkbookConfig;
use digcomp_l10n::build::{build_jsonld, build_xlsx};
use digcomp_l10n::extract::jsonld_check::check_jsonld;
use digcomp_l10n::extract::workbook::extract_workbook;
use digcomp_l10n::locale::{CsvLayout, read_locale_csv, write_locale_csv};
use digcomp_l10n::xlsx::Workbook;
use digcomp_l10n::{Component, TranslationSet};

#[test]
fn test_extract_workbook_shouldWriteEveryComponent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let xlsx = common::create_supplement_workbook(temp_dir.path())?;
    let repo = common::repo(temp_dir.path());

    let report = extract_workbook(&xlsx, &repo, &WorkbookConfig::default(), "en", "nl")?;
    assert!(report.missing_sheets.is_empty());
    assert_eq!(report.rows_for(Component::CoreFramework), Some(10));
    assert_eq!(report.rows_for(Component::Levels), Some(8));
    assert_eq!(report.rows_for(Component::Statements), Some(2));
    assert_eq!(report.rows_for(Component::Outcomes), Some(2));
    assert_eq!(report.rows_for(Component::Glossary), Some(2));

    let core = read_locale_csv(repo.csv_path(Component::CoreFramework, "en"))?;
    assert_eq!(core[0].location, "digcomp.area.1.label");
    assert_eq!(core[0].source, "Information");
    assert_eq!(core[0].context, "Competence area 1 – label");
    assert!(core.iter().any(|r| r.location == "digcomp.competence.2.1.description"));

    let glossary = read_locale_csv(repo.csv_path(Component::Glossary, "nl"))?;
    assert_eq!(glossary[0].location, "digcomp.glossary.digital_content.label");
    assert!(glossary.iter().all(|r| r.target.is_empty()));

    // components without a sheet still get header-only files
    let acronyms = fs::read_to_string(repo.csv_path(Component::Acronyms, "nl"))?;
    assert_eq!(acronyms, "location,source,target,context\r\n");
    assert!(repo.csv_path(Component::Texts, "en").exists());
    Ok(())
}

#[test]
fn test_extract_workbook_onRerun_shouldKeepTranslations() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let xlsx = common::create_supplement_workbook(temp_dir.path())?;
    let repo = common::repo(temp_dir.path());
    let sheets = WorkbookConfig::default();

    extract_workbook(&xlsx, &repo, &sheets, "en", "nl")?;
    let nl_path = repo.csv_path(Component::Statements, "nl");
    let mut rows = read_locale_csv(&nl_path)?;
    rows[0].target = "Weet hoe te zoeken".to_string();
    write_locale_csv(&nl_path, &rows, CsvLayout::Weblate)?;

    let report = extract_workbook(&xlsx, &repo, &sheets, "en", "nl")?;
    let upsert = report
        .components
        .iter()
        .find(|(c, _)| *c == Component::Statements)
        .map(|(_, u)| *u)
        .unwrap();
    assert_eq!(upsert.preserved, 1);
    assert_eq!(read_locale_csv(&nl_path)?[0].target, "Weet hoe te zoeken");
    Ok(())
}

#[test]
fn test_extract_workbook_withMissingSheet_shouldSkipComponent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let xlsx = common::create_supplement_workbook(temp_dir.path())?;
    let repo = common::repo(temp_dir.path());
    let sheets = WorkbookConfig {
        glossary_sheet: "No such sheet".to_string(),
        ..WorkbookConfig::default()
    };

    let report = extract_workbook(&xlsx, &repo, &sheets, "en", "nl")?;
    assert_eq!(report.missing_sheets, vec!["No such sheet".to_string()]);
    assert_eq!(report.rows_for(Component::Glossary), None);
    assert_eq!(report.components.len(), 4);
    Ok(())
}

#[test]
fn test_check_jsonld_shouldReportExtraStatement() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let xlsx = common::create_supplement_workbook(temp_dir.path())?;
    let jsonld = common::create_supplement_jsonld(temp_dir.path())?;
    let repo = common::repo(temp_dir.path());
    extract_workbook(&xlsx, &repo, &WorkbookConfig::default(), "en", "nl")?;

    let report = check_jsonld(&jsonld, &repo, "en")?;
    assert_eq!(report.statements.in_jsonld, 1);
    assert_eq!(report.statements.in_csv, 2);
    assert_eq!(report.statements.extra_in_csv, vec!["1.1.2".to_string()]);
    assert!(report.statements.missing_in_csv.is_empty());
    assert!(report.outcomes.is_consistent());
    Ok(())
}

#[test]
fn test_check_jsonld_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let bad = common::create_test_file(temp_dir.path(), "bad.jsonld", "{\"@graph\": [")?;
    let result = check_jsonld(&bad, &common::repo(temp_dir.path()), "en");
    assert!(result.is_err());
    Ok(())
}

/// Run step1 and translate a few entries in the target files
fn translated_repo(root: &std::path::Path) -> Result<TranslationSet> {
    let xlsx = common::create_supplement_workbook(root)?;
    let repo = common::repo(root);
    extract_workbook(&xlsx, &repo, &WorkbookConfig::default(), "en", "nl")?;

    let core_nl = repo.csv_path(Component::CoreFramework, "nl");
    let mut core = read_locale_csv(&core_nl)?;
    for rec in core.iter_mut() {
        if rec.location == "digcomp.area.1.label" {
            rec.target = "Informatie".to_string();
        }
    }
    write_locale_csv(&core_nl, &core, CsvLayout::Weblate)?;

    common::write_component(
        &repo,
        Component::Levels,
        "nl",
        &[record("digcomp.level.1.four_level_name", "Basic", "Basis")],
    )?;
    common::write_component(
        &repo,
        Component::Statements,
        "nl",
        &[record("digcomp.statement.1.1.1", "Knows how to search", "Weet hoe te zoeken")],
    )?;

    TranslationSet::load(&repo, "en", "nl")
}

#[test]
fn test_build_jsonld_shouldAddTargetFields() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let tx = translated_repo(temp_dir.path())?;
    let src = common::create_supplement_jsonld(temp_dir.path())?;
    let out = temp_dir.path().join("nl").join("out.jsonld");

    let touched = build_jsonld(&src, &out, &tx, "nl")?;
    assert_eq!(touched, 6);

    let doc: Value = serde_json::from_str(&fs::read_to_string(&out)?)?;
    let graph = doc["@graph"].as_array().unwrap();
    assert_eq!(graph[0]["name"], "Information");
    assert_eq!(graph[0]["name_nl"], "Informatie");
    assert_eq!(graph[1]["name_nl"], "Browsing");
    assert_eq!(graph[2]["description_nl"], "Weet hoe te zoeken");
    assert_eq!(graph[2]["four_levels_proficiency_name_nl"], "Basis");
    assert_eq!(graph[5]["four_levels_name_nl"], "Basis");
    assert_eq!(graph[5]["applies_to_nl"], "Citizens");

    // source key order is kept, new fields follow
    let keys: Vec<&String> = graph[0].as_object().unwrap().keys().collect();
    assert_eq!(keys[0], "@id");
    assert_eq!(keys[keys.len() - 1], "description_nl");
    Ok(())
}

#[test]
fn test_build_xlsx_shouldAppendTargetColumns() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let tx = translated_repo(temp_dir.path())?;
    let src = temp_dir.path().join("supplement.xlsx");
    let out = temp_dir.path().join("nl").join("supplement_nl.xlsx");
    let sheets = WorkbookConfig::default();

    let report = build_xlsx(&src, &out, &sheets, &tx, "nl")?;
    assert_eq!(report.sheets.len(), 5);
    assert!(report.missing_sheets.is_empty());

    let workbook = Workbook::open(&out)?;
    let framework = workbook.sheet(&sheets.framework_sheet).unwrap();
    assert_eq!(framework.text(1, 7), "Competence area name (nl)");
    assert_eq!(framework.text(2, 7), "Informatie");
    assert_eq!(framework.text(4, 7), "Communication");
    assert_eq!(framework.text(2, 2), "Information");

    let statements = workbook.sheet(&sheets.statements_sheet).unwrap();
    let col = (1..=statements.max_column())
        .find(|c| statements.text(1, *c) == "Competence statement (nl)")
        .expect("statement column");
    assert_eq!(statements.text(2, col), "Weet hoe te zoeken");
    assert_eq!(statements.text(3, col), "Knows how to filter");
    Ok(())
}
