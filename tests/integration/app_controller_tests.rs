/*!
 * Controller wiring: relative paths, defaults and the stage order
 */

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::common::{self, record};
use digcomp_l10n::Controller;
use digcomp_l10n::app_controller::BuildArgs;
use digcomp_l10n::build::BuildTarget;
use digcomp_l10n::build::tables::TableOptions;
use digcomp_l10n::build::TableKind;
use digcomp_l10n::{Component, LocaleRecord};
use digcomp_l10n::locale::read_locale_csv;

#[test]
fn test_run_step1_withRelativePath_shouldResolveAgainstRoot() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_supplement_workbook(temp_dir.path())?;
    let controller = Controller::new_for_test(temp_dir.path());

    let report = controller.run_step1(Path::new("supplement.xlsx"))?;
    assert_eq!(report.rows_for(Component::Statements), Some(2));

    let nl = read_locale_csv(controller.repo().csv_path(Component::Statements, "nl"))?;
    assert_eq!(nl.len(), 2);
    Ok(())
}

#[test]
fn test_run_step1_withMissingWorkbook_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = Controller::new_for_test(temp_dir.path());

    let err = controller.run_step1(Path::new("missing.xlsx")).unwrap_err();
    assert!(err.to_string().contains("Workbook not found"));
    assert!(!controller.repo().locale_dir().exists());
    Ok(())
}

#[test]
fn test_run_build_withoutTargets_shouldWriteAllArtifacts() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    common::create_supplement_workbook(root)?;
    common::create_supplement_jsonld(root)?;
    common::create_manifest(root)?;
    let controller = Controller::new_for_test(root);
    controller.run_step1(Path::new("supplement.xlsx"))?;

    let args = BuildArgs {
        src_xlsx: Some(PathBuf::from("supplement.xlsx")),
        src_jsonld: Some(PathBuf::from("supplement.jsonld")),
        ..BuildArgs::default()
    };
    let written = controller.run_build(&args)?;

    let out_cfg = &controller.config().output;
    assert_eq!(
        written,
        vec![
            root.join("nl").join(out_cfg.xlsx_name("nl")),
            root.join("nl").join(out_cfg.jsonld_name("nl")),
            root.join("nl").join(out_cfg.docx_name("nl")),
        ]
    );
    assert!(written.iter().all(|p| p.exists()));
    Ok(())
}

#[test]
fn test_run_build_withJsonldTarget_shouldSkipOtherSources() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    common::create_supplement_jsonld(root)?;
    let controller = Controller::new_for_test(root);
    common::write_component(
        &controller.repo(),
        Component::CoreFramework,
        "nl",
        &[record("digcomp.area.1.label", "Information", "Informatie")],
    )?;

    // no workbook and no manifest: only the JSON-LD build may run
    let args = BuildArgs {
        targets: vec![BuildTarget::Jsonld],
        out_dir: Some(PathBuf::from("out")),
        src_jsonld: Some(PathBuf::from("supplement.jsonld")),
        ..BuildArgs::default()
    };
    let written = controller.run_build(&args)?;
    assert_eq!(written.len(), 1);
    assert!(written[0].starts_with(root.join("out")));
    let doc: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&written[0])?)?;
    assert_eq!(doc["@graph"][0]["name_nl"], "Informatie");
    Ok(())
}

#[test]
fn test_run_tables_withoutOutput_shouldUseDefaultName() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    let controller = Controller::new_for_test(root);
    common::write_component(
        &controller.repo(),
        Component::Acronyms,
        "nl",
        &[
            record("digcomp.acronym.ai.label", "AI", "KI"),
            record("digcomp.acronym.ai.expansion", "Artificial intelligence", "Kunstmatige intelligentie"),
        ],
    )?;

    let opts = TableOptions {
        lang: "nl".to_string(),
        locale_dir: PathBuf::from("digcomp3-l10n/locale"),
        jsonld: PathBuf::from("translated.jsonld"),
        images_dir: PathBuf::from("images"),
    };
    let out = controller.run_tables(TableKind::Acronyms, &opts, None)?;
    assert_eq!(out, root.join("DigComp3_acronyms_nl.docx"));
    assert!(out.exists());

    // JSON-LD based tables need the translated graph
    assert!(controller.run_tables(TableKind::Table2, &opts, None).is_err());
    Ok(())
}

#[test]
fn test_run_split_andPack_shouldRoundTripRepositoryCsv() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    let controller = Controller::new_for_test(root);
    let rows: Vec<LocaleRecord> = (1..=7)
        .map(|i| record(&format!("digcomp.statement.1.1.{}", i), &format!("Statement {}", i), ""))
        .collect();
    let csv = common::write_component(&controller.repo(), Component::Statements, "nl", &rows)?;

    let manifest = controller.run_split(&csv, Path::new("parts"), 2)?;
    assert_eq!(manifest.row_counts, vec![4, 3]);

    let packed = controller.run_pack(Path::new("parts"), Path::new("packed.csv"))?;
    assert_eq!(packed, 7);
    assert_eq!(std::fs::read(root.join("packed.csv"))?, std::fs::read(&csv)?);
    Ok(())
}
