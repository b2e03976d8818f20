// @module: Step 2, read-only comparison of extracted ids with the JSON-LD graph

use anyhow::{Context, Result};
use log::info;
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;

use crate::file_utils::FileManager;
use crate::locale::{Component, LocaleRepo, read_locale_csv};

// @const: Examples listed per difference
const MAX_EXAMPLES: usize = 20;

/// Ids on both sides of one node type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdComparison {
    pub in_jsonld: usize,
    pub in_csv: usize,
    /// In the JSON-LD, not in the CSV
    pub missing_in_csv: Vec<String>,
    /// In the CSV, not in the JSON-LD
    pub extra_in_csv: Vec<String>,
}

impl IdComparison {
    pub fn compare(jsonld: &BTreeSet<String>, csv: &BTreeSet<String>) -> Self {
        Self {
            in_jsonld: jsonld.len(),
            in_csv: csv.len(),
            missing_in_csv: jsonld.difference(csv).cloned().collect(),
            extra_in_csv: csv.difference(jsonld).cloned().collect(),
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.missing_in_csv.is_empty() && self.extra_in_csv.is_empty()
    }

    fn log(&self, label: &str) {
        info!(
            "- {}: JSON-LD={} CSV={} missing_in_CSV={} extra_in_CSV={}",
            label,
            self.in_jsonld,
            self.in_csv,
            self.missing_in_csv.len(),
            self.extra_in_csv.len()
        );
        if !self.missing_in_csv.is_empty() {
            info!("  examples missing_in_CSV: {:?}", examples(&self.missing_in_csv));
        }
        if !self.extra_in_csv.is_empty() {
            info!("  examples extra_in_CSV: {:?}", examples(&self.extra_in_csv));
        }
    }
}

fn examples(ids: &[String]) -> &[String] {
    &ids[..ids.len().min(MAX_EXAMPLES)]
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsistencyReport {
    pub statements: IdComparison,
    pub outcomes: IdComparison,
}

/// True when `@type` is `type_name` or a list containing it
fn has_type(node: &Value, type_name: &str) -> bool {
    match node.get("@type") {
        Some(Value::String(t)) => t == type_name,
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(type_name)),
        _ => false,
    }
}

/// Ids of `@graph` nodes of a type: the part of `@id` after the first `/`
pub fn graph_ids(doc: &Value, type_name: &str) -> BTreeSet<String> {
    doc.get("@graph")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|node| has_type(node, type_name))
        .filter_map(|node| {
            let id = match node.get("@id")? {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            id.split_once('/').map(|(_, rest)| rest.to_string())
        })
        .collect()
}

/// Ids behind `<prefix>.` locations of a locale CSV
fn csv_ids<P: AsRef<Path>>(path: P, prefix: &str) -> Result<BTreeSet<String>> {
    Ok(read_locale_csv(path)?
        .into_iter()
        .filter_map(|r| r.location.strip_prefix(prefix).map(str::to_string))
        .collect())
}

/// Run step2 against the source-language statement and outcome files
pub fn check_jsonld<P: AsRef<Path>>(jsonld: P, repo: &LocaleRepo, source_lang: &str) -> Result<ConsistencyReport> {
    let jsonld = jsonld.as_ref();
    let text = FileManager::read_to_string(jsonld)?;
    let doc: Value =
        serde_json::from_str(&text).with_context(|| format!("Invalid JSON-LD: {}", jsonld.display()))?;

    let statements = IdComparison::compare(
        &graph_ids(&doc, "CompetenceStatement"),
        &csv_ids(repo.csv_path(Component::Statements, source_lang), "digcomp.statement.")?,
    );
    let outcomes = IdComparison::compare(
        &graph_ids(&doc, "LearningOutcome"),
        &csv_ids(repo.csv_path(Component::Outcomes, source_lang), "digcomp.outcome.")?,
    );

    info!("JSON-LD consistency report");
    statements.log("Competence statements");
    outcomes.log("Learning outcomes");
    info!("Step2 complete.");

    Ok(ConsistencyReport { statements, outcomes })
}
