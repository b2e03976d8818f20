/*!
 * Translated JSON-LD graph.
 *
 * Text properties of the framework nodes get a `<field>_<lang>` sibling; the
 * original English properties stay untouched. Key order of the source file
 * is kept (serde_json `preserve_order`).
 */

use anyhow::{Context, Result};
use log::info;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;

use super::id_after_first_slash;
use crate::file_utils::FileManager;
use crate::locale::{Component, TranslationSet};

/// First string of `@type`
pub fn node_type(node: &Value) -> Option<&str> {
    match node.get("@type")? {
        Value::String(t) => Some(t),
        Value::Array(types) => types.iter().find_map(Value::as_str),
        _ => None,
    }
}

fn str_field<'a>(node: &'a Map<String, Value>, key: &str) -> &'a str {
    node.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Eight-level mapping as used in locale keys: integral numbers without decimals
fn eight_level_key(value: Option<&Value>) -> String {
    match value {
        Some(Value::Number(n)) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) if f.fract() == 0.0 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) if !other.is_null() => other.to_string(),
        _ => String::new(),
    }
}

/// Translated level name of a `ProficiencyLevel/<Name>[_n]` reference
fn proficiency_name(uri: &str, level_names: &HashMap<String, String>) -> String {
    let name = id_after_first_slash(uri);
    let name = name.split('_').next().unwrap_or(name);
    level_names.get(&name.to_lowercase()).cloned().unwrap_or_default()
}

/// Set `<field>_<lang>` to the translation, else to the existing `<field>`
fn set_translated(node: &mut Map<String, Value>, field: &str, lang: &str, translated: String) {
    let value = if translated.is_empty() {
        str_field(node, field).to_string()
    } else {
        translated
    };
    node.insert(format!("{}_{}", field, lang), Value::String(value));
}

fn set_proficiency(node: &mut Map<String, Value>, lang: &str, level_names: &HashMap<String, String>) {
    let uri = str_field(node, "four_levels_proficiency_name");
    if !uri.is_empty() {
        let name = proficiency_name(uri, level_names);
        node.insert(format!("four_levels_proficiency_name_{}", lang), Value::String(name));
    }
}

/// Add target-language fields to every framework node of `@graph`.
///
/// Returns the number of nodes touched.
pub fn translate_graph(doc: &mut Value, tx: &TranslationSet, lang: &str) -> usize {
    let level_names = tx.level_name_map();
    let Some(graph) = doc.get_mut("@graph").and_then(Value::as_array_mut) else {
        return 0;
    };

    let mut touched = 0;
    for node in graph.iter_mut() {
        let Some(kind) = node_type(node).map(str::to_string) else {
            continue;
        };
        let Some(obj) = node.as_object_mut() else {
            continue;
        };
        let id = id_after_first_slash(str_field(obj, "@id")).to_string();

        match kind.as_str() {
            "CompetenceArea" => {
                set_translated(obj, "name", lang, tx.tr(Component::CoreFramework, &format!("digcomp.area.{}.label", id)));
                set_translated(obj, "description", lang, tx.tr(Component::CoreFramework, &format!("digcomp.area.{}.description", id)));
            }
            "Competence" => {
                set_translated(obj, "name", lang, tx.tr(Component::CoreFramework, &format!("digcomp.competence.{}.label", id)));
                set_translated(obj, "description", lang, tx.tr(Component::CoreFramework, &format!("digcomp.competence.{}.description", id)));
            }
            "CompetenceStatement" => {
                set_translated(obj, "description", lang, tx.tr(Component::Statements, &format!("digcomp.statement.{}", id)));
                set_proficiency(obj, lang, &level_names);
            }
            "LearningOutcome" => {
                set_translated(obj, "description", lang, tx.tr(Component::Outcomes, &format!("digcomp.outcome.{}", id)));
                set_proficiency(obj, lang, &level_names);
            }
            "ProficiencyLevel" => {
                let eight = eight_level_key(obj.get("eight_levels_mapping"));
                let level = |field: &str| tx.tr(Component::Levels, &format!("digcomp.level.{}.{}", eight, field));
                set_translated(obj, "four_levels_name", lang, level("four_level_name"));
                set_translated(obj, "four_levels_description", lang, level("four_level_description"));
                set_translated(obj, "eight_levels_description", lang, level("eight_level_description"));
                set_translated(obj, "applies_to", lang, level("applies_to"));
            }
            _ => continue,
        }
        touched += 1;
    }
    touched
}

/// Write the translated copy of `src_jsonld` to `out_jsonld`
pub fn build_jsonld<P: AsRef<Path>, Q: AsRef<Path>>(src_jsonld: P, out_jsonld: Q, tx: &TranslationSet, lang: &str) -> Result<usize> {
    let src = src_jsonld.as_ref();
    let out = out_jsonld.as_ref();
    let mut doc: Value = serde_json::from_str(&FileManager::read_to_string(src)?)
        .with_context(|| format!("Invalid JSON-LD: {}", src.display()))?;

    let touched = translate_graph(&mut doc, tx, lang);
    let text = serde_json::to_string_pretty(&doc).context("Failed to serialise JSON-LD")?;
    FileManager::write_to_file(out, &text)?;
    info!("Wrote JSON-LD: {} ({} nodes translated)", out.display(), touched);
    Ok(touched)
}
