/*!
 * Common test utilities for the digcomp-l10n test suite
 */

#![allow(dead_code)]

use anyhow::Result;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use digcomp_l10n::app_config::WorkbookConfig;
use digcomp_l10n::docx::{DocxBuilder, Row, TableSpec};
use digcomp_l10n::docx::Cell;
use digcomp_l10n::locale::{CsvLayout, LocaleRecord, write_locale_csv};
use digcomp_l10n::xlsx::{CellValue, Sheet, write_workbook};
use digcomp_l10n::{Component, LocaleRepo};

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Repository below `root` with the default folder name
pub fn repo(root: &Path) -> LocaleRepo {
    LocaleRepo::new(root, "digcomp3-l10n")
}

/// Record with a target
pub fn record(location: &str, source: &str, target: &str) -> LocaleRecord {
    LocaleRecord {
        location: location.to_string(),
        source: source.to_string(),
        target: target.to_string(),
        context: String::new(),
    }
}

/// Write one component CSV of the repository
pub fn write_component(repo: &LocaleRepo, component: Component, lang: &str, rows: &[LocaleRecord]) -> Result<PathBuf> {
    let path = repo.csv_path(component, lang);
    write_locale_csv(&path, rows, CsvLayout::Weblate)?;
    Ok(path)
}

/// A small data supplement: two areas, three competences, two levels,
/// two statements, two outcomes and one glossary term
pub fn create_supplement_workbook(dir: &Path) -> Result<PathBuf> {
    let names = WorkbookConfig::default();

    let mut framework = Sheet::new(&names.framework_sheet);
    for (c, h) in ["Area", "Area name", "Area description", "Competence", "Competence name", "Competence description"]
        .iter()
        .enumerate()
    {
        framework.set(1, c + 1, *h);
    }
    let framework_rows = [
        (1.0, "Information", "Finding information", "1.1", "Browsing", "Browsing the web"),
        (1.0, "Information", "Finding information", "1.2", "Evaluating", "Evaluating data"),
        (2.0, "Communication", "Working together", "2.1", "Interacting", "Interacting online"),
    ];
    for (i, (area, name, desc, comp, comp_name, comp_desc)) in framework_rows.iter().enumerate() {
        let r = i + 2;
        framework.set(r, 1, CellValue::Float(*area));
        framework.set(r, 2, *name);
        framework.set(r, 3, *desc);
        framework.set(r, 4, *comp);
        framework.set(r, 5, *comp_name);
        framework.set(r, 6, *comp_desc);
    }

    let mut levels = Sheet::new(&names.levels_sheet);
    levels.set(1, 1, "Four level name");
    for (r, eight) in [(2, 1), (3, 2)] {
        levels.set(r, 1, "Basic");
        levels.set(r, 2, "Basic tasks with guidance");
        levels.set(r, 3, "Citizens");
        levels.set(r, 4, CellValue::Int(eight));
        levels.set(r, 6, format!("Eight level {}", eight));
    }

    let mut statements = Sheet::new(&names.statements_sheet);
    statements.set(1, 7, "Id");
    statements.set(1, 8, "Statement");
    statements.set(2, 7, "1.1.1");
    statements.set(2, 8, "Knows how to search");
    statements.set(3, 7, "1.1.2");
    statements.set(3, 8, "Knows how to filter");

    let mut outcomes = Sheet::new(&names.outcomes_sheet);
    outcomes.set(1, 5, "Id");
    outcomes.set(1, 6, "Outcome");
    outcomes.set(2, 5, "1.1.1.1");
    outcomes.set(2, 6, "Uses a search engine");
    outcomes.set(3, 5, "1.1.1.2");
    outcomes.set(3, 6, "Refines a query");

    let mut glossary = Sheet::new(&names.glossary_sheet);
    glossary.set(1, 1, "Term");
    glossary.set(2, 1, "Digital content");
    glossary.set(2, 2, "Content in digital form");

    let path = dir.join("supplement.xlsx");
    write_workbook(&path, &[framework, levels, statements, outcomes, glossary])?;
    Ok(path)
}

/// JSON-LD graph matching the workbook fixture, with one statement missing
pub fn create_supplement_jsonld(dir: &Path) -> Result<PathBuf> {
    let doc = json!({
        "@context": {"@vocab": "https://example.org/digcomp#"},
        "@graph": [
            {"@id": "CompetenceArea/1", "@type": "CompetenceArea", "name": "Information", "description": "Finding information"},
            {"@id": "Competence/1.1", "@type": "Competence", "name": "Browsing", "description": "Browsing the web"},
            {
                "@id": "CompetenceStatement/1.1.1",
                "@type": "CompetenceStatement",
                "description": "Knows how to search",
                "four_levels_proficiency_name": "ProficiencyLevel/Basic_1"
            },
            {"@id": "LearningOutcome/1.1.1.1", "@type": "LearningOutcome", "description": "Uses a search engine"},
            {"@id": "LearningOutcome/1.1.1.2", "@type": "LearningOutcome", "description": "Refines a query"},
            {
                "@id": "ProficiencyLevel/Basic_1",
                "@type": "ProficiencyLevel",
                "eight_levels_mapping": 1,
                "four_levels_name": "Basic",
                "four_levels_description": "Basic tasks with guidance",
                "eight_levels_description": "Eight level 1",
                "applies_to": "Citizens"
            }
        ]
    });
    let path = dir.join("supplement.jsonld");
    fs::write(&path, serde_json::to_string_pretty(&doc)?)?;
    Ok(path)
}

/// Report-like document: cover text, two chapters, a table and an annex
pub fn create_report_docx(dir: &Path) -> Result<PathBuf> {
    let mut doc = DocxBuilder::new();
    doc.paragraph("DigComp 3.0 cover");
    doc.heading("Foreword", 1);
    doc.paragraph("The framework is updated.");
    doc.paragraph("It now covers  artificial intelligence.");
    doc.heading("Introduction", 1);
    doc.paragraph("Digital competence matters.");

    let mut table = TableSpec::new(Vec::new());
    table.push(Row::new(vec![Cell::text("Area"), Cell::text("Competence")]));
    table.push(Row::new(vec![Cell::text("Information"), Cell::new()]));
    doc.table(&table);

    doc.heading("Annex 1: Glossary", 1);
    doc.paragraph("Terms used in this report.");

    let path = dir.join("report.docx");
    doc.save(&path)?;
    Ok(path)
}

/// Manifest with three importable sections and one that cannot be found
pub fn create_manifest(dir: &Path) -> Result<PathBuf> {
    let manifest = json!({
        "version": 1,
        "defaults": {"mode": "atomic"},
        "sections": [
            {"id": "foreword", "action": "import", "docx_anchor": {"type": "heading_contains", "value": "Foreword"}},
            {"id": "intro", "action": "import_export", "docx_anchor": {"type": "heading_text", "value": "introduction"},
             "import": {"key_prefix": "doc.ch1"}, "export": [{"component": "texts"}]},
            {"id": "annex1", "action": "import", "docx_anchor": {"type": "heading_contains", "value": "Annex 1"}},
            {"id": "annex9", "action": "import", "docx_anchor": {"type": "heading_contains", "value": "Annex 9"}}
        ]
    });
    let path = dir.join("manifest.json");
    fs::write(&path, serde_json::to_string_pretty(&manifest)?)?;
    Ok(path)
}

/// One A4 page: a section header, a body line, a footnote drawn with `TJ`
/// and a link annotation away from any text
pub fn create_footnote_pdf(dir: &Path) -> Result<PathBuf> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let line = |size: i64, x: i64, y: i64, show: Operation| {
        vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), size.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            show,
            Operation::new("ET", vec![]),
        ]
    };
    let mut operations = Vec::new();
    operations.extend(line(12, 72, 800, Operation::new("Tj", vec![Object::string_literal("Introduction heading")])));
    operations.extend(line(10, 72, 500, Operation::new("Tj", vec![Object::string_literal("Body text of the page.")])));
    operations.extend(line(
        10,
        72,
        60,
        Operation::new(
            "TJ",
            vec![Object::Array(vec![
                Object::string_literal("1. A"),
                Object::Integer(-300),
                Object::string_literal("footnote"),
            ])],
        ),
    ));
    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    let link_id = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Link",
        "Rect" => vec![400.into(), 300.into(), 500.into(), 320.into()],
        "A" => dictionary! {
            "S" => "URI",
            "URI" => Object::string_literal("https://example.org"),
        },
    });
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Annots" => vec![link_id.into()],
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let path = dir.join("report.pdf");
    doc.save(&path)?;
    Ok(path)
}
