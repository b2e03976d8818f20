/*!
 * Locale repository handling.
 *
 * The translation repository keeps one folder per component below
 * `<repo-root>/<repo-dir>/locale/`, each holding a source-language and a
 * target-language CSV. This module is split into:
 *
 * - `csv_io`: reading, writing and upserting locale CSV files
 * - `translations`: merged source/target lookup used by the build stages
 * - `split`: splitting a large CSV into parts and packing them back
 */

use anyhow::Result;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::file_utils::FileManager;

pub use self::csv_io::{
    CsvLayout, UpsertReport, merge_preserving_targets, read_locale_csv, read_translated_csv,
    upsert_locale_csv, write_locale_csv,
};
pub use self::translations::TranslationSet;

pub mod csv_io;
pub mod split;
pub mod translations;

/// One translatable string
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocaleRecord {
    /// Stable key identifying where the text lives
    pub location: String,

    /// Source-language text
    pub source: String,

    /// Translated text, empty while pending
    pub target: String,

    /// Translator hint, empty when absent
    pub context: String,
}

impl LocaleRecord {
    /// Create a record with an empty target
    pub fn new(location: impl Into<String>, source: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            source: source.into(),
            target: String::new(),
            context: context.into(),
        }
    }

    /// Trimmed target, else trimmed source
    pub fn best_text(&self) -> &str {
        let target = self.target.trim();
        if target.is_empty() {
            self.source.trim()
        } else {
            target
        }
    }
}

/// Component folders of the translation repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Component {
    Acronyms,
    CoreFramework,
    Glossary,
    Levels,
    Outcomes,
    Statements,
    Texts,
}

impl Component {
    // @const: Every component, in folder-name order
    pub const ALL: [Component; 7] = [
        Component::Acronyms,
        Component::CoreFramework,
        Component::Glossary,
        Component::Levels,
        Component::Outcomes,
        Component::Statements,
        Component::Texts,
    ];

    /// Folder name of the component
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Acronyms => "acronyms",
            Component::CoreFramework => "core-framework",
            Component::Glossary => "glossary",
            Component::Levels => "levels",
            Component::Outcomes => "outcomes",
            Component::Statements => "statements",
            Component::Texts => "texts",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Component {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Component::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| anyhow::anyhow!("Unknown locale component: {}", s))
    }
}

/// Paths inside the translation repository
#[derive(Debug, Clone)]
pub struct LocaleRepo {
    /// Folder holding the generated sources, `manifest.json` and the repo folder
    repo_root: PathBuf,

    /// `<repo_root>/<repo_dir>`
    repo_path: PathBuf,
}

impl LocaleRepo {
    /// Repository rooted at `repo_root/repo_dir`
    pub fn new<P: AsRef<Path>>(repo_root: P, repo_dir: &str) -> Self {
        let repo_root = repo_root.as_ref().to_path_buf();
        let repo_path = repo_root.join(repo_dir);
        Self { repo_root, repo_path }
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// `<repo_root>/<repo_dir>/locale`
    pub fn locale_dir(&self) -> PathBuf {
        self.repo_path.join("locale")
    }

    /// `<repo_root>/<repo_dir>/images`
    pub fn images_dir(&self) -> PathBuf {
        self.repo_path.join("images")
    }

    /// Folder of one component
    pub fn component_dir(&self, component: &str) -> PathBuf {
        self.locale_dir().join(component)
    }

    /// `<locale>/<component>/<lang>.csv`
    pub fn csv_path(&self, component: Component, lang: &str) -> PathBuf {
        self.component_dir(component.as_str()).join(format!("{}.csv", lang))
    }

    /// Default manifest location, next to the repository folder
    pub fn manifest_path(&self) -> PathBuf {
        self.repo_root.join("manifest.json")
    }

    /// Create the locale folder and every component folder
    pub fn ensure_skeleton(&self) -> Result<()> {
        FileManager::ensure_dir(self.locale_dir())?;
        for component in Component::ALL {
            FileManager::ensure_dir(self.component_dir(component.as_str()))?;
        }
        Ok(())
    }
}
