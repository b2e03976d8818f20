use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO), the language of the original documents
    pub source_language: String,

    /// Target language code (ISO), the language being translated into
    pub target_language: String,

    /// Name of the translation repository folder below the repo root
    #[serde(default = "default_repo_dir")]
    pub repo_dir: String,

    /// Worksheet names of the data supplement workbook
    #[serde(default)]
    pub workbook: WorkbookConfig,

    /// DOCX text extraction settings
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Artifact output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Sheet names of the DigComp data supplement
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WorkbookConfig {
    // @field: Competence areas and competences
    #[serde(default = "default_framework_sheet")]
    pub framework_sheet: String,

    // @field: Proficiency levels
    #[serde(default = "default_levels_sheet")]
    pub levels_sheet: String,

    // @field: Competence statements
    #[serde(default = "default_statements_sheet")]
    pub statements_sheet: String,

    // @field: Learning outcomes
    #[serde(default = "default_outcomes_sheet")]
    pub outcomes_sheet: String,

    // @field: Glossary
    #[serde(default = "default_glossary_sheet")]
    pub glossary_sheet: String,
}

impl Default for WorkbookConfig {
    fn default() -> Self {
        Self {
            framework_sheet: default_framework_sheet(),
            levels_sheet: default_levels_sheet(),
            statements_sheet: default_statements_sheet(),
            outcomes_sheet: default_outcomes_sheet(),
            glossary_sheet: default_glossary_sheet(),
        }
    }
}

/// Settings for hashed DOCX text extraction
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExtractionConfig {
    /// Maximum characters per extracted string
    #[serde(default = "default_max_len")]
    pub max_len: usize,

    /// Merge consecutive paragraphs into one string
    #[serde(default = "default_true")]
    pub merge_paragraphs: bool,

    /// Flush merged paragraphs after this many (0 = unlimited)
    #[serde(default)]
    pub max_paras_per_block: usize,

    /// Split manual line breaks into separate pseudo-paragraphs
    #[serde(default)]
    pub split_on_linebreaks: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_len: default_max_len(),
            merge_paragraphs: true,
            max_paras_per_block: 0,
            split_on_linebreaks: false,
        }
    }
}

/// Locations and names of the generated artifacts
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OutputConfig {
    /// Output folder relative to the repo root
    #[serde(default = "default_out_dir")]
    pub out_dir: String,

    /// Original data supplement workbook
    #[serde(default = "default_src_xlsx")]
    pub src_xlsx: String,

    /// Original data supplement JSON-LD
    #[serde(default = "default_src_jsonld")]
    pub src_jsonld: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
            src_xlsx: default_src_xlsx(),
            src_jsonld: default_src_jsonld(),
        }
    }
}

impl OutputConfig {
    /// Translated workbook file name
    pub fn xlsx_name(&self, lang: &str) -> String {
        format!("DigComp_3.0_Data_Supplement_{}.xlsx", lang)
    }

    /// Translated JSON-LD file name
    pub fn jsonld_name(&self, lang: &str) -> String {
        format!("DigComp_3.0_Data_Supplement_{}.jsonld", lang)
    }

    /// Draft document file name
    pub fn docx_name(&self, lang: &str) -> String {
        format!("DigComp_3.0_{}_draft.docx", lang)
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching `log` crate filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_repo_dir() -> String {
    "digcomp3-l10n".to_string()
}

fn default_framework_sheet() -> String {
    "1 Competence Areas&Competences".to_string()
}

fn default_levels_sheet() -> String {
    "2 Proficiency Levels".to_string()
}

fn default_statements_sheet() -> String {
    "3 Competence Statements".to_string()
}

fn default_outcomes_sheet() -> String {
    "4 Learning Outcomes".to_string()
}

fn default_glossary_sheet() -> String {
    "5 Glossary".to_string()
}

fn default_max_len() -> usize {
    3000
}

fn default_true() -> bool {
    true
}

fn default_out_dir() -> String {
    "nl".to_string()
}

fn default_src_xlsx() -> String {
    "DigComp 3.0 Data Supplement 24 Nov 2025.xlsx".to_string()
}

fn default_src_jsonld() -> String {
    "DigComp 3.0 Data Supplement 24 Nov 2025.jsonld".to_string()
}

impl Config {
    /// Load the configuration from `path`, writing a default file when absent
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let _source_name = crate::language_utils::get_language_name(&self.source_language)?;
        let _target_name = crate::language_utils::get_language_name(&self.target_language)?;

        if crate::language_utils::language_codes_match(&self.source_language, &self.target_language) {
            return Err(anyhow!(
                "Source and target language must differ (both are '{}')",
                self.source_language
            ));
        }

        if self.repo_dir.trim().is_empty() {
            return Err(anyhow!("repo_dir must not be empty"));
        }

        if self.extraction.max_len == 0 {
            return Err(anyhow!("extraction.max_len must be greater than zero"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: "en".to_string(),
            target_language: "nl".to_string(),
            repo_dir: default_repo_dir(),
            workbook: WorkbookConfig::default(),
            extraction: ExtractionConfig::default(),
            output: OutputConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
