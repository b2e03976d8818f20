/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use std::fs;

use crate::common;
use digcomp_l10n::app_config::{Config, LogLevel};

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_language, "nl");
    assert_eq!(config.repo_dir, "digcomp3-l10n");
    assert_eq!(config.workbook.statements_sheet, "3 Competence Statements");
    assert_eq!(config.extraction.max_len, 3000);
    assert!(config.extraction.merge_paragraphs);
    assert_eq!(config.extraction.max_paras_per_block, 0);
    assert!(!config.extraction.split_on_linebreaks);
    assert_eq!(config.output.out_dir, "nl");
    assert_eq!(config.log_level, LogLevel::Info);
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    // Invalid source language
    config.source_language = "zz".to_string();
    assert!(config.validate().is_err());
    config.source_language = "en".to_string();

    // Same language on both sides, even when written differently
    config.target_language = "eng".to_string();
    assert!(config.validate().is_err());
    config.target_language = "nl".to_string();

    config.repo_dir = "  ".to_string();
    assert!(config.validate().is_err());
    config.repo_dir = "digcomp3-l10n".to_string();

    config.extraction.max_len = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_load_or_create_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let config = Config::load_or_create(&path)?;
    assert_eq!(config.target_language, "nl");
    assert!(path.exists());

    let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
    assert_eq!(written["source_language"], "en");
    assert_eq!(written["log_level"], "info");
    Ok(())
}

#[test]
fn test_load_or_create_withPartialFile_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r#"{"source_language": "en", "target_language": "de", "extraction": {"max_len": 500}, "log_level": "debug"}"#,
    )?;

    let config = Config::load_or_create(&path)?;
    assert_eq!(config.target_language, "de");
    assert_eq!(config.extraction.max_len, 500);
    assert!(config.extraction.merge_paragraphs);
    assert_eq!(config.repo_dir, "digcomp3-l10n");
    assert_eq!(config.log_level, LogLevel::Debug);
    Ok(())
}

#[test]
fn test_load_or_create_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", "{ not json")?;
    assert!(Config::load_or_create(&path).is_err());
    Ok(())
}

#[test]
fn test_output_names_shouldCarryLanguage() {
    let output = Config::default().output;
    assert_eq!(output.xlsx_name("nl"), "DigComp_3.0_Data_Supplement_nl.xlsx");
    assert_eq!(output.jsonld_name("fr"), "DigComp_3.0_Data_Supplement_fr.jsonld");
    assert_eq!(output.docx_name("nl"), "DigComp_3.0_nl_draft.docx");
}

#[test]
fn test_log_level_shouldMapToFilter() {
    assert_eq!(LogLevel::Warn.to_level_filter(), log::LevelFilter::Warn);
    assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
}
