/*!
 * Layout tables generated from locale CSVs and the translated JSON-LD
 */

use anyhow::Result;
use serde_json::json;
use std::fs;
use std::path::Path;

use crate::common::{self, record};
use digcomp_l10n::build::tables::TableOptions;
use digcomp_l10n::build::{TableKind, build_table};
use digcomp_l10n::docx::{Block, DocxPackage, Table, read_body};
use digcomp_l10n::Component;

fn options(root: &Path, lang: &str) -> TableOptions {
    TableOptions {
        lang: lang.to_string(),
        locale_dir: common::repo(root).locale_dir(),
        jsonld: root.join("translated.jsonld"),
        images_dir: root.join("images"),
    }
}

fn tables_of(path: &Path) -> Result<Vec<Table>> {
    Ok(read_body(&DocxPackage::open(path)?)?
        .into_iter()
        .filter_map(|b| match b {
            Block::Table(t) => Some(t),
            Block::Paragraph(_) => None,
        })
        .collect())
}

fn write_translated_graph(root: &Path) -> Result<()> {
    let doc = json!({"@graph": [
        {"@id": "CompetenceArea/2", "@type": "CompetenceArea", "name": "Communication", "name_nl": "Communicatie",
         "description_nl": "Samenwerken"},
        {"@id": "CompetenceArea/1", "@type": "CompetenceArea", "name": "Information", "name_nl": "Informatie",
         "description_nl": "Informatie vinden"},
        {"@id": "CompetenceArea/3", "@type": "CompetenceArea", "name_nl": "Leeg"},
        {"@id": "Competence/1.10", "@type": "Competence", "competence_area_id": "CompetenceArea/1",
         "name_nl": "Tiende", "description_nl": "Later"},
        {"@id": "Competence/1.2", "@type": "Competence", "competence_area_id": "CompetenceArea/1",
         "name_nl": "Beoordelen", "description_nl": "Kritisch"},
        {"@id": "Competence/2.1", "@type": "Competence", "competence_area_id": "CompetenceArea/2",
         "name": "Interacting", "description": "Online", "name_nl": "Interactie", "description_nl": "Online"}
    ]});
    fs::write(root.join("translated.jsonld"), serde_json::to_string_pretty(&doc)?)?;
    Ok(())
}

#[test]
fn test_build_table_withAcronyms_shouldReadTargetColumn() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let repo = common::repo(temp_dir.path());
    common::write_component(
        &repo,
        Component::Acronyms,
        "nl",
        &[
            record("digcomp.acronym.vr.label", "VR", "VR"),
            record("digcomp.acronym.vr.expansion", "Virtual reality", "Virtuele realiteit"),
            record("digcomp.acronym.ai.label", "AI", "KI"),
            record("digcomp.acronym.ai.expansion", "Artificial intelligence", "Kunstmatige intelligentie"),
            record("digcomp.acronym.eu.label", "EU", "EU"),
        ],
    )?;
    let out = temp_dir.path().join("acronyms.docx");

    build_table(TableKind::Acronyms, &options(temp_dir.path(), "nl"), &out)?;

    let tables = tables_of(&out)?;
    assert_eq!(tables.len(), 1);
    let rows = &tables[0].rows;
    // header plus two rows of two column pairs
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0][1].text(), "BETEKENIS");
    assert_eq!(rows[1][0].text(), "EU");
    assert_eq!(rows[1][2].text(), "VR");
    assert_eq!(rows[1][3].text(), "Virtuele realiteit");
    assert_eq!(rows[2][0].text(), "KI");
    assert_eq!(rows[2][1].text(), "Kunstmatige intelligentie");
    Ok(())
}

#[test]
fn test_build_table_withEnglishGlossary_shouldReadSourceColumn() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let repo = common::repo(temp_dir.path());
    common::write_component(
        &repo,
        Component::Glossary,
        "en",
        &[
            record("digcomp.glossary.digital_content.label", "Digital content", ""),
            record("digcomp.glossary.digital_content.definition", "Content in digital form", ""),
            record("digcomp.glossary.digital_content.source", "ISO", ""),
        ],
    )?;
    let out = temp_dir.path().join("glossary.docx");

    build_table(TableKind::Glossary, &options(temp_dir.path(), "en"), &out)?;

    let tables = tables_of(&out)?;
    let rows = &tables[0].rows;
    assert_eq!(rows[0][1].text(), "EXPLANATION");
    assert_eq!(rows[1][0].text(), "Digital content");
    assert_eq!(rows[1][1].text(), "Content in digital form");
    assert_eq!(rows[1][2].text(), "ISO");
    Ok(())
}

#[test]
fn test_build_table_withTable2_shouldGroupCompetencesPerArea() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    write_translated_graph(temp_dir.path())?;
    let out = temp_dir.path().join("table2.docx");

    build_table(TableKind::Table2, &options(temp_dir.path(), "nl"), &out)?;

    let tables = tables_of(&out)?;
    let rows = &tables[0].rows;
    // header, three competences; the area without competences is left out
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0][0].text(), "GEBIED");
    assert!(rows[1][0].text().contains("1. INFORMATIE"));
    assert_eq!(rows[1][1].text(), "1.2 Beoordelen");
    assert_eq!(rows[2][1].text(), "1.10 Tiende");
    assert!(rows[3][0].text().contains("2. COMMUNICATIE"));
    assert_eq!(rows[3][2].text(), "Online");
    Ok(())
}

#[test]
fn test_build_table_withEnglishOutcomes_shouldUsePlainFields() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    write_translated_graph(temp_dir.path())?;
    let out = temp_dir.path().join("outcomes.docx");

    build_table(TableKind::Outcomes, &options(temp_dir.path(), "en"), &out)?;

    let tables = tables_of(&out)?;
    assert_eq!(tables.len(), 3);
    assert_eq!(
        tables[2].rows[0][0].text(),
        "COMPETENCE AREA 2: COMMUNICATION - COMPETENCE 2.1 INTERACTING"
    );
    assert_eq!(tables[2].rows[1][1].text(), "Outcome");
    assert_eq!(tables[2].rows.len(), 2);
    Ok(())
}

#[test]
fn test_build_table_withMissingJsonld_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let out = temp_dir.path().join("digcomp3.docx");
    assert!(build_table(TableKind::Digcomp3, &options(temp_dir.path(), "nl"), &out).is_err());
    assert!(!out.exists());
    Ok(())
}
