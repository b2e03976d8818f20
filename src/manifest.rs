/*!
 * Section manifest.
 *
 * `manifest.json` maps the chapters of the source document to anchors in the
 * DOCX and says, per section, whether its text is imported into the `texts`
 * component, exported from other components when building, or ignored.
 */

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::errors::ManifestError;
use crate::file_utils::FileManager;
use crate::text_utils::norm_ws;

/// Root of `manifest.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,

    /// Extraction defaults, overridable from the command line
    #[serde(default)]
    pub defaults: ManifestDefaults,

    #[serde(default)]
    pub sections: Vec<Section>,
}

/// Defaults for manifest-driven section extraction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManifestDefaults {
    #[serde(default)]
    pub mode: ExtractMode,

    #[serde(default = "default_max_chars")]
    pub max_chars_per_chunk: usize,

    #[serde(default = "default_min_chars")]
    pub min_chars_per_chunk: usize,

    #[serde(default = "default_true")]
    pub include_tables: bool,

    /// `tsv`, anything else renders ` | `-separated rows
    #[serde(default = "default_table_format")]
    pub table_format: String,

    #[serde(default = "default_table_prefix")]
    pub table_prefix: String,

    #[serde(default = "default_true")]
    pub join_hard_wrapped_lines: bool,
}

impl Default for ManifestDefaults {
    fn default() -> Self {
        Self {
            mode: ExtractMode::default(),
            max_chars_per_chunk: default_max_chars(),
            min_chars_per_chunk: default_min_chars(),
            include_tables: true,
            table_format: default_table_format(),
            table_prefix: default_table_prefix(),
            join_hard_wrapped_lines: true,
        }
    }
}

/// One unit per stream item, or merged blocks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExtractMode {
    #[default]
    Atomic,
    Chunked,
}

/// What a section contributes; a section without an action contributes nothing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SectionAction {
    Import,
    Export,
    ImportExport,
    #[default]
    Ignore,
}

/// A chapter or appendix of the document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Section {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default)]
    pub action: SectionAction,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docx_anchor: Option<Anchor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<ImportSpec>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub export: Vec<ExportSpec>,
}

/// Where a section starts in the DOCX
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Anchor {
    #[serde(rename = "type", default)]
    pub kind: AnchorKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnchorKind {
    HeadingContains,
    HeadingText,
    ParagraphContains,
    StartOfDocument,
    /// Missing or unrecognised type; never resolves
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ImportSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_prefix: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportSpec {
    pub component: String,
}

fn default_version() -> u32 {
    1
}

fn default_max_chars() -> usize {
    1800
}

fn default_min_chars() -> usize {
    200
}

fn default_true() -> bool {
    true
}

fn default_table_format() -> String {
    "tsv".to_string()
}

fn default_table_prefix() -> String {
    "TABLE".to_string()
}

impl Anchor {
    pub fn new(kind: AnchorKind, value: &str) -> Self {
        Self {
            kind,
            value: Some(value.to_string()),
            any_of: Vec::new(),
        }
    }

    /// Texts to look for: non-blank `any_of` entries, else `value`
    pub fn candidates(&self) -> Vec<String> {
        if !self.any_of.is_empty() {
            return self
                .any_of
                .iter()
                .filter(|c| !c.trim().is_empty())
                .cloned()
                .collect();
        }
        match &self.value {
            Some(v) if !v.trim().is_empty() => vec![v.clone()],
            _ => Vec::new(),
        }
    }
}

impl Section {
    /// Location prefix of imported units
    pub fn key_prefix(&self) -> String {
        self.import
            .as_ref()
            .and_then(|i| i.key_prefix.clone())
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| format!("doc.{}", self.id))
    }

    pub fn is_importable(&self) -> bool {
        matches!(self.action, SectionAction::Import | SectionAction::ImportExport)
    }

    pub fn is_exportable(&self) -> bool {
        matches!(self.action, SectionAction::Export | SectionAction::ImportExport)
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().filter(|t| !t.is_empty()).unwrap_or(&self.id)
    }
}

impl Manifest {
    /// Load and parse a manifest file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        if !FileManager::file_exists(path) {
            return Err(ManifestError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => ManifestError::NotFound(path.to_path_buf()),
            _ => ManifestError::Read {
                path: path.to_path_buf(),
                source,
            },
        })?;
        serde_json::from_str(&text).map_err(|source| ManifestError::Invalid {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the manifest as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize manifest")?;
        FileManager::write_to_file(path, &json)
    }

    /// Load `path`, writing the starter manifest there first when missing
    pub fn load_or_starter<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !FileManager::file_exists(path) {
            Self::starter().save(path)?;
            info!("Wrote starter manifest: {}", path.display());
        }
        Ok(Self::load(path)?)
    }

    /// Lower-cased, whitespace-normalised anchor value to section id
    pub fn heading_map(&self) -> HashMap<String, String> {
        self.sections
            .iter()
            .filter_map(|s| {
                let value = s.docx_anchor.as_ref()?.value.as_deref()?;
                let key = norm_ws(value).to_lowercase();
                (!key.is_empty()).then(|| (key, s.id.clone()))
            })
            .collect()
    }

    /// Manifest covering the known structure of the DigComp 3.0 report
    pub fn starter() -> Self {
        let section = |id: &str, title: &str, action: SectionAction, anchor: &str, prefix: Option<&str>, export: &[&str]| Section {
            id: id.to_string(),
            title: Some(title.to_string()),
            action,
            docx_anchor: Some(Anchor::new(AnchorKind::HeadingContains, anchor)),
            import: prefix.map(|p| ImportSpec {
                key_prefix: Some(p.to_string()),
            }),
            export: export
                .iter()
                .map(|c| ExportSpec {
                    component: c.to_string(),
                })
                .collect(),
        };

        use SectionAction::{Export, Import, ImportExport};
        let sections = vec![
            section("front.colophon", "Colophon", Import, "colophon", Some("doc.front.colophon"), &[]),
            section("front.abstract", "Abstract", Import, "abstract", Some("doc.front.abstract"), &[]),
            section("front.foreword", "Foreword", Import, "foreword", Some("doc.front.foreword"), &[]),
            section(
                "front.acknowledgements",
                "Acknowledgements",
                Import,
                "acknowledgements",
                Some("doc.front.acknowledgements"),
                &[],
            ),
            section(
                "front.executive_summary",
                "Executive summary",
                Import,
                "executive summary",
                Some("doc.front.executive_summary"),
                &[],
            ),
            section(
                "front.quick_guide",
                "Quick guide to DigComp 3.0",
                Import,
                "quick guide",
                Some("doc.front.quick_guide"),
                &[],
            ),
            section("ch1.introduction", "1. INTRODUCTION", Import, "1. introduction", Some("doc.ch1"), &[]),
            section(
                "ch2.framework_components",
                "2. DIGCOMP 3.0 FRAMEWORK COMPONENTS",
                ImportExport,
                "framework components",
                Some("doc.ch2"),
                &["levels"],
            ),
            section(
                "ch3.how_to_read",
                "3.1 How to read DigComp 3.0",
                Import,
                "how to read digcomp 3.0",
                Some("doc.ch3.how_to_read"),
                &[],
            ),
            section(
                "ch3.framework",
                "3. DIGCOMP 3.0 FRAMEWORK",
                ImportExport,
                "digcomp 3.0 framework",
                Some("doc.ch3"),
                &["core-framework", "statements"],
            ),
            section(
                "ch4.concluding_remarks",
                "4. CONCLUDING REMARKS",
                Import,
                "concluding remarks",
                Some("doc.ch4"),
                &[],
            ),
            section("list.acronyms", "LIST OF ACRONYMS", Export, "list of acronyms", None, &["acronyms"]),
            section(
                "glossary",
                "GLOSSARY OF TERMS AND DEFINITIONS",
                Export,
                "glossary of terms",
                None,
                &["glossary"],
            ),
            section(
                "annex2.learning_outcomes",
                "Annex 2: DigComp 3.0 learning outcomes",
                ImportExport,
                "annex 2",
                Some("doc.annex2"),
                &["outcomes"],
            ),
            section(
                "annex3.phases",
                "Annex 3: Phases in the development of DigComp 3.0",
                Import,
                "annex 3",
                Some("doc.annex3"),
                &[],
            ),
        ];

        Self {
            version: 1,
            notes: "Starter manifest generated by digcomp-l10n step3; adjust anchors if needed.".to_string(),
            defaults: ManifestDefaults::default(),
            sections,
        }
    }
}
