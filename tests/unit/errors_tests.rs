/*!
 * Tests for error types
 */

use std::path::PathBuf;

use digcomp_l10n::errors::{AppError, DocumentError, LocaleError, ManifestError};

#[test]
fn test_locale_error_display_shouldNameFileAndColumn() {
    let err = LocaleError::MissingColumn {
        path: PathBuf::from("locale/texts/nl.csv"),
        column: "target",
        found: "location,source".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "CSV locale/texts/nl.csv is missing 'target' column (found: location,source)"
    );
    assert_eq!(
        LocaleError::HeaderMismatch("x_part02_of02.csv".into()).to_string(),
        "Header mismatch in x_part02_of02.csv. File cannot be merged safely."
    );
}

#[test]
fn test_app_error_from_shouldWrapSourceErrors() {
    let err: AppError = DocumentError::MissingSheet("5 Glossary".into()).into();
    assert!(matches!(err, AppError::Document(_)));
    assert_eq!(err.to_string(), "Document error: Worksheet not found: 5 Glossary");

    let err: AppError = ManifestError::NotFound(PathBuf::from("manifest.json")).into();
    assert_eq!(err.to_string(), "Manifest error: Missing manifest.json at manifest.json");

    let err: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert!(matches!(err, AppError::File(_)));

    let err: AppError = anyhow::anyhow!("boom").into();
    assert_eq!(err.to_string(), "Unknown error: boom");
}

#[test]
fn test_anyhow_downcast_shouldRecoverTypedError() {
    let err: anyhow::Error = LocaleError::MissingCsv(PathBuf::from("a.csv")).into();
    assert!(matches!(err.downcast_ref::<LocaleError>(), Some(LocaleError::MissingCsv(_))));
}

#[test]
fn test_app_error_fromAnyhow_shouldRecoverTypedErrorAndExitCode() {
    let err = anyhow::Error::from(LocaleError::MissingCsv(PathBuf::from("nl.csv"))).context("translate-docx");
    let app: AppError = err.into();
    assert!(matches!(app, AppError::Locale(LocaleError::MissingCsv(_))));
    assert_eq!(app.exit_code(), 2);

    let app: AppError = anyhow::anyhow!("Workbook not found: x.xlsx").into();
    assert_eq!(app.exit_code(), 1);
}
