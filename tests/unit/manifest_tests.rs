/*!
 * Tests for the section manifest
 */

use anyhow::Result;

use crate::common;
use digcomp_l10n::errors::ManifestError;
use digcomp_l10n::extract::{StreamItem, locate_anchor, locate_heading_anchor};
use digcomp_l10n::manifest::{AnchorKind, ExtractMode, Manifest, SectionAction};

#[test]
fn test_manifest_load_withSparseJson_shouldApplyDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_manifest(temp_dir.path())?;

    let manifest = Manifest::load(&path)?;
    assert_eq!(manifest.version, 1);
    assert_eq!(manifest.defaults.mode, ExtractMode::Atomic);
    assert_eq!(manifest.defaults.max_chars_per_chunk, 1800);
    assert_eq!(manifest.defaults.min_chars_per_chunk, 200);
    assert!(manifest.defaults.include_tables);
    assert_eq!(manifest.defaults.table_prefix, "TABLE");
    assert_eq!(manifest.sections.len(), 4);

    let intro = &manifest.sections[1];
    assert_eq!(intro.action, SectionAction::ImportExport);
    assert!(intro.is_importable() && intro.is_exportable());
    assert_eq!(intro.key_prefix(), "doc.ch1");
    assert_eq!(intro.docx_anchor.as_ref().map(|a| a.kind), Some(AnchorKind::HeadingText));
    assert_eq!(manifest.sections[0].key_prefix(), "doc.foreword");
    assert_eq!(manifest.sections[0].display_title(), "foreword");
    Ok(())
}

#[test]
fn test_manifest_load_withUnknownAnchorType_shouldParseAsUnknown() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "manifest.json",
        r#"{"sections": [{"id": "x", "action": "ignore", "docx_anchor": {"type": "regex", "any_of": ["a", " "]}}]}"#,
    )?;

    let manifest = Manifest::load(&path)?;
    let section = &manifest.sections[0];
    assert_eq!(section.action, SectionAction::Ignore);
    assert!(!section.is_importable());
    let anchor = section.docx_anchor.as_ref().unwrap();
    assert_eq!(anchor.kind, AnchorKind::Unknown);
    assert_eq!(anchor.candidates(), vec!["a".to_string()]);
    Ok(())
}

#[test]
fn test_manifest_load_withoutActionOrAnchorType_shouldNeitherImportNorResolve() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "manifest.json",
        r#"{"sections": [{"id": "bare", "docx_anchor": {"value": "Foreword"}}]}"#,
    )?;

    let manifest = Manifest::load(&path)?;
    let section = &manifest.sections[0];
    assert_eq!(section.action, SectionAction::Ignore);
    assert!(!section.is_importable() && !section.is_exportable());

    let anchor = section.docx_anchor.as_ref().unwrap();
    assert_eq!(anchor.kind, AnchorKind::Unknown);
    let items = vec![StreamItem::paragraph("Heading 1", "Foreword".to_string())];
    assert_eq!(locate_anchor(&items, anchor), None);
    assert_eq!(locate_heading_anchor(&items, anchor), None);
    Ok(())
}

#[test]
fn test_manifest_load_withMissingOrInvalidFile_shouldReturnTypedErrors() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    assert!(matches!(
        Manifest::load(temp_dir.path().join("manifest.json")),
        Err(ManifestError::NotFound(_))
    ));

    let bad = common::create_test_file(temp_dir.path(), "bad.json", "[1, 2")?;
    assert!(matches!(Manifest::load(&bad), Err(ManifestError::Invalid { .. })));
    Ok(())
}

#[test]
fn test_manifest_load_withUnreadableFile_shouldKeepIoError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("manifest.json");
    std::fs::write(&path, [0xff, 0xfe, b'{', b'}'])?;

    match Manifest::load(&path) {
        Err(ManifestError::Read { path: p, source }) => {
            assert_eq!(p, path);
            assert_eq!(source.kind(), std::io::ErrorKind::InvalidData);
        }
        other => panic!("unexpected result: {:?}", other),
    }
    Ok(())
}

#[test]
fn test_heading_map_shouldNormaliseAnchorValues() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let manifest = Manifest::load(common::create_manifest(temp_dir.path())?)?;

    let map = manifest.heading_map();
    assert_eq!(map.get("foreword").map(String::as_str), Some("foreword"));
    assert_eq!(map.get("annex 1").map(String::as_str), Some("annex1"));
    assert_eq!(map.get("introduction").map(String::as_str), Some("intro"));
    Ok(())
}

#[test]
fn test_load_or_starter_withMissingFile_shouldWriteStarter() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("manifest.json");

    let manifest = Manifest::load_or_starter(&path)?;
    assert!(path.exists());
    assert_eq!(manifest, Manifest::starter());
    assert!(manifest.sections.iter().any(|s| s.id == "front.foreword"));
    Ok(())
}
