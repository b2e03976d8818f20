/*!
 * Splitting a locale CSV into parts and packing them back
 */

use anyhow::Result;
use std::fs;

use crate::common;
use digcomp_l10n::errors::LocaleError;
use digcomp_l10n::locale::split::{SPLIT_MANIFEST_NAME, SplitManifest, pack_csv, split_csv};

const CSV: &str = "location,source,target,context\r\n\
digcomp.area.1.label,Information,,\r\n\
digcomp.area.1.description,\"First line\r\nsecond line\",,\r\n\
digcomp.area.2.label,Communication,Communicatie,\r\n\
digcomp.area.2.description,\"Say \"\"hi\"\"\",,\r\n\
digcomp.area.3.label,Content,,\r\n";

#[test]
fn test_split_csv_shouldWritePartsAndManifest() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "nl.csv", CSV)?;
    let out_dir = temp_dir.path().join("parts");

    let manifest = split_csv(&input, &out_dir, 3)?;
    assert_eq!(manifest.source_file, "nl.csv");
    assert_eq!(manifest.parts, 3);
    assert_eq!(manifest.row_counts, vec![2, 2, 1]);
    assert_eq!(
        manifest.part_files,
        vec!["nl_part01_of03.csv", "nl_part02_of03.csv", "nl_part03_of03.csv"]
    );

    // every part repeats the header; the multi-line field stays in one record
    let first = fs::read_to_string(out_dir.join("nl_part01_of03.csv"))?;
    assert_eq!(
        first,
        "location,source,target,context\r\n\
digcomp.area.1.label,Information,,\r\n\
digcomp.area.1.description,\"First line\r\nsecond line\",,\r\n"
    );

    let stored: SplitManifest = serde_json::from_str(&fs::read_to_string(out_dir.join(SPLIT_MANIFEST_NAME))?)?;
    assert_eq!(stored, manifest);
    Ok(())
}

#[test]
fn test_pack_csv_afterSplit_shouldRestoreOriginalBytes() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "nl.csv", CSV)?;
    let out_dir = temp_dir.path().join("parts");
    split_csv(&input, &out_dir, 3)?;

    let packed = temp_dir.path().join("packed").join("nl.csv");
    let rows = pack_csv(&out_dir, &packed)?;
    assert_eq!(rows, 5);
    assert_eq!(fs::read(&packed)?, CSV.as_bytes());
    Ok(())
}

#[test]
fn test_pack_csv_withoutManifest_shouldOrderByPartNumber() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "nl.csv", CSV)?;
    let out_dir = temp_dir.path().join("parts");
    split_csv(&input, &out_dir, 3)?;
    fs::remove_file(out_dir.join(SPLIT_MANIFEST_NAME))?;

    let packed = temp_dir.path().join("nl.packed.csv");
    pack_csv(&out_dir, &packed)?;
    assert_eq!(fs::read_to_string(&packed)?, CSV);
    Ok(())
}

#[test]
fn test_pack_csv_withDifferentHeader_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "nl.csv", CSV)?;
    let out_dir = temp_dir.path().join("parts");
    split_csv(&input, &out_dir, 3)?;

    let second = out_dir.join("nl_part02_of03.csv");
    let altered = fs::read_to_string(&second)?.replacen("context", "note", 1);
    fs::write(&second, altered)?;

    let packed = temp_dir.path().join("packed.csv");
    let err = pack_csv(&out_dir, &packed).unwrap_err();
    match err.downcast_ref::<LocaleError>() {
        Some(LocaleError::HeaderMismatch(name)) => assert_eq!(name, "nl_part02_of03.csv"),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!packed.exists());
    Ok(())
}

#[test]
fn test_split_csv_withZeroParts_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "nl.csv", CSV)?;
    assert!(split_csv(&input, temp_dir.path().join("parts"), 0).is_err());
    assert!(!temp_dir.path().join("parts").exists());
    Ok(())
}

#[test]
fn test_pack_csv_withEmptyFolder_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    assert!(pack_csv(temp_dir.path(), temp_dir.path().join("out.csv")).is_err());
    Ok(())
}
