/*!
 * Tests for locale CSV files and the translation set
 */

use anyhow::Result;
use std::fs;

use crate::common::{self, record};
use digcomp_l10n::errors::LocaleError;
use digcomp_l10n::locale::csv_io::locale_csv_bytes;
use digcomp_l10n::locale::{
    CsvLayout, LocaleRecord, merge_preserving_targets, read_locale_csv, read_translated_csv, upsert_locale_csv,
    write_locale_csv,
};
use digcomp_l10n::{Component, TranslationSet};

#[test]
fn test_locale_csv_bytes_withWeblateLayout_shouldQuoteOnlyWhenNeeded() -> Result<()> {
    let rows = vec![LocaleRecord::new("digcomp.area.1.label", "Information, data", "Area 1")];
    let text = String::from_utf8(locale_csv_bytes(&rows, CsvLayout::Weblate)?)?;
    assert_eq!(
        text,
        "location,source,target,context\r\ndigcomp.area.1.label,\"Information, data\",,Area 1\r\n"
    );
    Ok(())
}

#[test]
fn test_locale_csv_bytes_withPdfLayout_shouldWriteBomAndQuoteAll() -> Result<()> {
    let rows = vec![LocaleRecord::new("p1_fn1", "Footnote", "page 1")];
    let bytes = locale_csv_bytes(&rows, CsvLayout::Pdf)?;
    assert!(bytes.starts_with(b"\xEF\xBB\xBF\"locations\""));
    let text = String::from_utf8(bytes[3..].to_vec())?;
    assert!(text.ends_with("\"p1_fn1\",\"page 1\",\"Footnote\",\"\"\r\n"));
    Ok(())
}

#[test]
fn test_read_locale_csv_withMissingFile_shouldBeEmpty() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    assert!(read_locale_csv(temp_dir.path().join("nope.csv"))?.is_empty());
    Ok(())
}

#[test]
fn test_read_locale_csv_withTranslationHeaderAndDuplicates_shouldKeepLastRow() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "nl.csv",
        "\u{feff}Location,Source,Translation\na,One,Een\nb,Two,\na,One,Eén\n,skipped,x\n",
    )?;

    let rows = read_locale_csv(&path)?;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].location, "a");
    assert_eq!(rows[0].target, "Eén");
    assert_eq!(rows[1].target, "");
    assert_eq!(rows[1].context, "");
    Ok(())
}

#[test]
fn test_read_translated_csv_withoutTargetColumn_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "nl.csv", "location,source\na,One\n")?;

    let err = read_translated_csv(&path).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LocaleError>(),
        Some(LocaleError::MissingColumn { column: "target", .. })
    ));
    Ok(())
}

#[test]
fn test_hashed_layout_roundtrip_shouldKeepMultilineText() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("texts").join("en.csv");
    let rows = vec![LocaleRecord::new("doc.front.paragraph.abc", "line one\nline \"two\"", "front|paragraph")];

    write_locale_csv(&path, &rows, CsvLayout::Hashed)?;
    assert!(fs::read_to_string(&path)?.starts_with("\"location\",\"context\",\"source\",\"target\""));
    assert_eq!(read_locale_csv(&path)?, rows);
    Ok(())
}

#[test]
fn test_merge_preserving_targets_shouldKeepOnlyNonBlankTargets() {
    let rows = vec![
        LocaleRecord::new("a", "One (new)", "ctx"),
        LocaleRecord::new("b", "Two", "ctx"),
        LocaleRecord::new("c", "Three", "ctx"),
    ];
    let existing = vec![record("a", "One", "Een"), record("b", "Two", "  "), record("gone", "x", "y")];

    let (merged, preserved) = merge_preserving_targets(&rows, &existing);
    assert_eq!(preserved, 1);
    assert_eq!(merged[0].source, "One (new)");
    assert_eq!(merged[0].target, "Een");
    assert_eq!(merged[1].target, "");
    assert_eq!(merged.len(), 3);
}

#[test]
fn test_upsert_locale_csv_onRerun_shouldPreserveTranslations() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let src = temp_dir.path().join("en.csv");
    let tgt = temp_dir.path().join("nl.csv");
    let rows = vec![LocaleRecord::new("k1", "Hello", ""), LocaleRecord::new("k2", "World", "")];

    let first = upsert_locale_csv(&src, &tgt, &rows)?;
    assert_eq!((first.rows, first.preserved), (2, 0));

    write_locale_csv(&tgt, &[record("k1", "Hello", "Hallo")], CsvLayout::Weblate)?;
    let second = upsert_locale_csv(&src, &tgt, &rows)?;
    assert_eq!((second.rows, second.preserved), (2, 1));

    let target = read_locale_csv(&tgt)?;
    assert_eq!(target[0].target, "Hallo");
    assert_eq!(target[1].location, "k2");
    Ok(())
}

#[test]
fn test_translation_set_load_shouldFallBackToSource() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let repo = common::repo(temp_dir.path());
    common::write_component(
        &repo,
        Component::Levels,
        "en",
        &[
            LocaleRecord::new("digcomp.level.1.four_level_name", "Basic", "ctx"),
            LocaleRecord::new("digcomp.level.1.applies_to", "Citizens", "ctx"),
        ],
    )?;
    common::write_component(
        &repo,
        Component::Levels,
        "nl",
        &[
            record("digcomp.level.1.four_level_name", "Basic", " Basis "),
            record("digcomp.level.1.applies_to", "Citizens", ""),
        ],
    )?;

    let tx = TranslationSet::load(&repo, "en", "nl")?;
    assert_eq!(tx.tr(Component::Levels, "digcomp.level.1.four_level_name"), "Basis");
    assert_eq!(tx.tr(Component::Levels, "digcomp.level.1.applies_to"), "Citizens");
    assert_eq!(tx.tr(Component::Levels, "digcomp.level.9.applies_to"), "");
    assert_eq!(tx.tr(Component::Glossary, "anything"), "");
    assert_eq!(tx.level_name_map().get("basic").map(String::as_str), Some("Basis"));
    assert_eq!(tx.component_names().collect::<Vec<_>>(), vec!["levels"]);
    Ok(())
}

#[test]
fn test_translation_set_load_withoutLocaleDir_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let err = TranslationSet::load(&common::repo(temp_dir.path()), "en", "nl").unwrap_err();
    assert!(matches!(err.downcast_ref::<LocaleError>(), Some(LocaleError::MissingLocaleDir(_))));
    Ok(())
}
