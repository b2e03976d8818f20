/*!
 * Build stages: translated deliverables from the locale repository.
 *
 * - `xlsx_artifact`: the data supplement workbook with target-language columns
 * - `jsonld_artifact`: the JSON-LD graph with `<field>_<lang>` properties
 * - `docx_draft`: a manifest-driven working draft of the document
 * - `docx_translate`: in-place translation of the original DOCX by source hash
 * - `tables`: stand-alone layout tables (acronyms, glossary, competence pages)
 *
 * Every stage falls back to the source text where a translation is missing.
 */

pub mod docx_draft;
pub mod docx_translate;
pub mod jsonld_artifact;
pub mod tables;
pub mod xlsx_artifact;

use std::fmt;

pub use self::docx_draft::build_docx_draft;
pub use self::docx_translate::{TranslateStats, TranslationIndex, translate_docx};
pub use self::jsonld_artifact::build_jsonld;
pub use self::tables::{TableKind, build_table};
pub use self::xlsx_artifact::build_xlsx;

/// Artifact produced by the `build` command
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BuildTarget {
    Xlsx,
    Jsonld,
    Docx,
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildTarget::Xlsx => "xlsx",
            BuildTarget::Jsonld => "jsonld",
            BuildTarget::Docx => "docx",
        };
        f.write_str(name)
    }
}

/// Part of a graph id after the first `/`, or the whole id
pub fn id_after_first_slash(id: &str) -> &str {
    id.split_once('/').map(|(_, rest)| rest).unwrap_or(id)
}

/// Last `/`-separated segment of a graph id
pub fn id_last_segment(id: &str) -> &str {
    id.rsplit('/').next().unwrap_or(id)
}
