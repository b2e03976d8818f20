/*!
 * DOCX text extraction: anchored sections, manifest sections and hashed chunks
 */

use anyhow::Result;

use crate::common;
use digcomp_l10n::Component;
use digcomp_l10n::errors::ManifestError;
use digcomp_l10n::extract::anchored::extract_anchored;
use digcomp_l10n::extract::hashed::{HashedOptions, extract_hashed, hashed_key};
use digcomp_l10n::extract::sections::{SectionOverrides, extract_sections};
use digcomp_l10n::locale::{CsvLayout, read_locale_csv, write_locale_csv};
use digcomp_l10n::manifest::ExtractMode;

#[test]
fn test_extract_anchored_shouldNumberUnitsAcrossSections() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let docx = common::create_report_docx(temp_dir.path())?;
    let manifest = common::create_manifest(temp_dir.path())?;
    let repo = common::repo(temp_dir.path());

    // step3 only resolves heading_contains anchors, so the heading_text intro
    // stays inside the foreword span
    let report = extract_anchored(&docx, &repo, &manifest, "en", "nl")?;
    assert_eq!(report.unresolved, vec!["intro".to_string(), "annex9".to_string()]);
    assert_eq!(report.upsert.rows, 8);

    let rows = read_locale_csv(repo.csv_path(Component::Texts, "en"))?;
    let locations: Vec<&str> = rows.iter().map(|r| r.location.as_str()).collect();
    assert_eq!(
        locations,
        vec![
            "doc.foreword.u0001",
            "doc.foreword.u0002",
            "doc.foreword.u0003",
            "doc.foreword.u0004",
            "doc.foreword.t0005",
            "doc.foreword.t0006",
            "doc.foreword.t0007",
            "doc.annex1.u0008",
        ]
    );
    assert_eq!(rows[1].source, "It now covers artificial intelligence.");
    assert_eq!(rows[1].context, "foreword | paragraph");
    assert_eq!(rows[2].source, "Introduction");
    assert_eq!(rows[6].source, "Information");
    assert_eq!(rows[6].context, "foreword | table-cell");
    Ok(())
}

#[test]
fn test_extract_anchored_withoutManifest_shouldWriteStarter() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let docx = common::create_report_docx(temp_dir.path())?;
    let repo = common::repo(temp_dir.path());
    let manifest = repo.manifest_path();

    let report = extract_anchored(&docx, &repo, &manifest, "en", "nl")?;
    assert!(manifest.exists());
    // the starter knows the foreword; the other chapters are not in this document
    let rows = read_locale_csv(repo.csv_path(Component::Texts, "en"))?;
    assert_eq!(rows[0].location, "doc.front.foreword.u0001");
    assert!(report.unresolved.contains(&"front.colophon".to_string()));
    Ok(())
}

#[test]
fn test_extract_sections_withAtomicMode_shouldIncludeAnchors() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let docx = common::create_report_docx(temp_dir.path())?;
    let manifest = common::create_manifest(temp_dir.path())?;
    let repo = common::repo(temp_dir.path());

    let report = extract_sections(&docx, &repo, &manifest, &SectionOverrides::default(), "en", "nl")?;
    assert_eq!(report.unresolved, vec!["annex9".to_string()]);

    let rows = read_locale_csv(repo.csv_path(Component::Texts, "en"))?;
    let foreword: Vec<_> = rows.iter().filter(|r| r.location.starts_with("doc.foreword.")).collect();
    assert_eq!(foreword.len(), 3);
    assert_eq!(foreword[0].source, "Foreword");
    assert_eq!(foreword[0].context, "foreword|heading|l1");
    assert_eq!(foreword[2].source, "It now covers artificial intelligence.");

    let table = rows.iter().find(|r| r.context == "intro|table").unwrap();
    assert_eq!(table.location, "doc.ch1.u0003");
    // hard-wrap joining applies to table items as well
    assert_eq!(table.source, "TABLE: Area\tCompetence Information");
    Ok(())
}

#[test]
fn test_extract_sections_withChunkedOverride_shouldMergeUnits() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let docx = common::create_report_docx(temp_dir.path())?;
    let manifest = common::create_manifest(temp_dir.path())?;
    let repo = common::repo(temp_dir.path());
    let overrides = SectionOverrides {
        mode: Some(ExtractMode::Chunked),
        no_tables: true,
        ..SectionOverrides::default()
    };

    extract_sections(&docx, &repo, &manifest, &overrides, "en", "nl")?;
    let rows = read_locale_csv(repo.csv_path(Component::Texts, "en"))?;
    let locations: Vec<&str> = rows.iter().map(|r| r.location.as_str()).collect();
    assert_eq!(locations, vec!["doc.foreword.p001", "doc.ch1.p001", "doc.annex1.p001"]);
    assert_eq!(
        rows[0].source,
        "Foreword\n\nThe framework is updated.\n\nIt now covers artificial intelligence."
    );
    assert_eq!(rows[1].source, "Introduction\n\nDigital competence matters.");
    assert_eq!(rows[2].context, "annex1|chunk");
    Ok(())
}

#[test]
fn test_extract_sections_withoutManifest_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let docx = common::create_report_docx(temp_dir.path())?;
    let repo = common::repo(temp_dir.path());

    let err = extract_sections(
        &docx,
        &repo,
        &temp_dir.path().join("manifest.json"),
        &SectionOverrides::default(),
        "en",
        "nl",
    )
    .unwrap_err();
    assert!(matches!(err.downcast_ref::<ManifestError>(), Some(ManifestError::NotFound(_))));
    Ok(())
}

#[test]
fn test_extract_hashed_shouldKeySectionsFromManifest() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let docx = common::create_report_docx(temp_dir.path())?;
    let manifest = common::create_manifest(temp_dir.path())?;
    let repo = common::repo(temp_dir.path());

    let report = extract_hashed(&docx, &repo, Some(manifest.as_path()), &HashedOptions::default(), false, "en", "nl")?;
    assert_eq!(report.rows, 7);
    assert_eq!(report.stats.headings, 3);
    assert_eq!(report.stats.paragraph_blocks, 4);
    assert_eq!(report.stats.table_cells, 3);
    assert_eq!(report.stats.front_blocks, 1);

    let rows = read_locale_csv(repo.csv_path(Component::Texts, "en"))?;
    let merged = "The framework is updated.\nIt now covers artificial intelligence.";
    assert_eq!(rows[1].location, hashed_key("foreword", "paragraph", merged));
    assert_eq!(rows[1].context, "foreword|paragraph");
    assert_eq!(rows[3].context, "intro|table_cell");
    assert_eq!(rows[6].context, "annex_1:_glossary|paragraph");
    Ok(())
}

#[test]
fn test_extract_hashed_withPreserve_shouldKeepTargets() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let docx = common::create_report_docx(temp_dir.path())?;
    let repo = common::repo(temp_dir.path());
    let opts = HashedOptions {
        merge_paragraphs: false,
        ..HashedOptions::default()
    };

    // a missing manifest only means headings are slugged
    extract_hashed(&docx, &repo, Some(temp_dir.path().join("none.json").as_path()), &opts, false, "en", "nl")?;
    let nl_path = repo.csv_path(Component::Texts, "nl");
    let mut rows = read_locale_csv(&nl_path)?;
    assert_eq!(rows.len(), 8);
    assert_eq!(rows[1].context, "foreword|paragraph");
    rows[1].target = "Het raamwerk is bijgewerkt.".to_string();
    write_locale_csv(&nl_path, &rows, CsvLayout::Hashed)?;

    let kept = extract_hashed(&docx, &repo, None, &opts, true, "en", "nl")?;
    assert_eq!(kept.preserved, 1);
    assert_eq!(read_locale_csv(&nl_path)?[1].target, "Het raamwerk is bijgewerkt.");

    let cleared = extract_hashed(&docx, &repo, None, &opts, false, "en", "nl")?;
    assert_eq!(cleared.preserved, 0);
    assert!(read_locale_csv(&nl_path)?.iter().all(|r| r.target.is_empty()));
    Ok(())
}
