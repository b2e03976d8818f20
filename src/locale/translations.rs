/*!
 * Merged translations of every locale component.
 *
 * Build stages look texts up by component and location; a missing
 * translation falls back to the source text so no content is lost.
 */

use anyhow::Result;
use log::debug;
use std::collections::{BTreeMap, HashMap};

use super::csv_io::read_locale_csv;
use super::{Component, LocaleRecord, LocaleRepo};
use crate::errors::LocaleError;
use crate::file_utils::FileManager;

/// Records of one component, in file order, indexed by location
#[derive(Debug, Clone, Default)]
pub struct ComponentTexts {
    records: Vec<LocaleRecord>,
    index: HashMap<String, usize>,
}

impl ComponentTexts {
    /// Build from records; a repeated location replaces the earlier record in place
    pub fn from_records(records: impl IntoIterator<Item = LocaleRecord>) -> Self {
        let mut texts = Self::default();
        for rec in records {
            texts.insert(rec);
        }
        texts
    }

    fn insert(&mut self, rec: LocaleRecord) {
        match self.index.get(&rec.location) {
            Some(&pos) => self.records[pos] = rec,
            None => {
                self.index.insert(rec.location.clone(), self.records.len());
                self.records.push(rec);
            }
        }
    }

    pub fn get(&self, location: &str) -> Option<&LocaleRecord> {
        self.index.get(location).map(|&i| &self.records[i])
    }

    pub fn records(&self) -> &[LocaleRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Trimmed target, else trimmed source, else empty
    pub fn tr(&self, location: &str) -> String {
        self.get(location)
            .map(|rec| rec.best_text().to_string())
            .unwrap_or_default()
    }
}

/// Every component of a locale repository, source and target merged
#[derive(Debug, Clone, Default)]
pub struct TranslationSet {
    components: BTreeMap<String, ComponentTexts>,
}

impl TranslationSet {
    /// Load every component folder below the locale directory.
    ///
    /// Per location the source and context come from the source-language file
    /// (falling back to the target-language file) and the target from the
    /// target-language file.
    pub fn load(repo: &LocaleRepo, source_lang: &str, target_lang: &str) -> Result<Self> {
        let locale_dir = repo.locale_dir();
        if !FileManager::dir_exists(&locale_dir) {
            return Err(LocaleError::MissingLocaleDir(locale_dir).into());
        }

        let mut set = Self::default();
        for dir in FileManager::list_subdirs(&locale_dir)? {
            let name = dir
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let src = read_locale_csv(dir.join(format!("{}.csv", source_lang)))?;
            let tgt = read_locale_csv(dir.join(format!("{}.csv", target_lang)))?;
            let merged = merge_languages(src, tgt);
            debug!("Loaded component '{}' ({} entries)", name, merged.len());
            set.components.insert(name, merged);
        }

        Ok(set)
    }

    /// Set a component directly
    pub fn insert_component(&mut self, name: &str, texts: ComponentTexts) {
        self.components.insert(name.to_string(), texts);
    }

    /// Component by folder name
    pub fn component(&self, name: &str) -> Option<&ComponentTexts> {
        self.components.get(name)
    }

    /// Component names in folder order
    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    /// Translation of `location` in `component`, with source fallback
    pub fn tr(&self, component: Component, location: &str) -> String {
        self.tr_in(component.as_str(), location)
    }

    /// Same as [`TranslationSet::tr`] for a component given by name
    pub fn tr_in(&self, component: &str, location: &str) -> String {
        self.components
            .get(component)
            .map(|texts| texts.tr(location))
            .unwrap_or_default()
    }

    /// English four-level name (lower-case) to its translation.
    ///
    /// Built from `digcomp.level.<n>.four_level_name` rows whose source and
    /// target are both non-empty.
    pub fn level_name_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        let Some(levels) = self.component(Component::Levels.as_str()) else {
            return map;
        };

        for rec in levels.records() {
            if !rec.location.ends_with(".four_level_name") {
                continue;
            }
            let source = rec.source.trim();
            let target = rec.target.trim();
            if !source.is_empty() && !target.is_empty() {
                map.insert(source.to_lowercase(), target.to_string());
            }
        }
        map
    }
}

fn merge_languages(src: Vec<LocaleRecord>, tgt: Vec<LocaleRecord>) -> ComponentTexts {
    let tgt_texts = ComponentTexts::from_records(tgt);
    let mut merged = ComponentTexts::default();

    for rec in src.iter() {
        let other = tgt_texts.get(&rec.location);
        let pick = |own: &str, fallback: Option<&str>| {
            if own.is_empty() {
                fallback.unwrap_or_default().to_string()
            } else {
                own.to_string()
            }
        };
        merged.insert(LocaleRecord {
            location: rec.location.clone(),
            source: pick(&rec.source, other.map(|o| o.source.as_str())),
            target: other.map(|o| o.target.clone()).unwrap_or_default(),
            context: pick(&rec.context, other.map(|o| o.context.as_str())),
        });
    }

    for rec in tgt_texts.records() {
        if merged.get(&rec.location).is_none() {
            merged.insert(rec.clone());
        }
    }

    merged
}
