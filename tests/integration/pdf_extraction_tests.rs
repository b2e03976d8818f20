/*!
 * Footnote and hyperlink extraction from a generated PDF
 */

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::common;
use digcomp_l10n::extract::pdf::{FOOTERS_FILE, HYPERLINKS_FILE, extract_pdf};
use digcomp_l10n::pdf::read_pages;

/// Rows of a written PDF CSV, header included
fn read_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let text = fs::read_to_string(path)?;
    assert!(text.starts_with('\u{feff}'));
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(text.trim_start_matches('\u{feff}').as_bytes());
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

#[test]
fn test_read_pages_shouldPositionSpansAndLinks() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let pdf = common::create_footnote_pdf(temp_dir.path())?;

    let pages = read_pages(&pdf)?;
    assert_eq!(pages.len(), 1);
    let page = &pages[0];
    assert_eq!(page.number, 1);
    assert_eq!(page.height, 842.0);

    let texts: Vec<String> = page.blocks().into_iter().map(|b| b.text).collect();
    assert_eq!(texts, vec!["Introduction heading", "Body text of the page.", "1. A footnote"]);

    assert_eq!(page.links.len(), 1);
    assert_eq!(page.links[0].uri, "https://example.org");
    assert_eq!(page.links[0].top, 522.0);
    Ok(())
}

#[test]
fn test_extract_pdf_shouldWriteFootersAndHyperlinks() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let pdf = common::create_footnote_pdf(temp_dir.path())?;
    let out_dir = temp_dir.path().join("pdf");

    let report = extract_pdf(&pdf, &out_dir)?;
    assert_eq!(report.footers.len(), 1);
    assert_eq!(report.hyperlinks.len(), 1);

    let footers = read_rows(&out_dir.join(FOOTERS_FILE))?;
    assert_eq!(
        footers,
        vec![
            vec!["locations", "context", "source", "target"],
            vec!["footer_1", "Introduction heading", "A footnote", ""],
        ]
    );

    // the link lies outside every text block
    let hyperlinks = read_rows(&out_dir.join(HYPERLINKS_FILE))?;
    assert_eq!(
        hyperlinks,
        vec![
            vec!["locations", "context", "source", "target"],
            vec!["Pagina 1", "Context niet gevonden", "https://example.org", ""],
        ]
    );
    Ok(())
}
