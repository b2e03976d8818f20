/*!
 * Error types for the digcomp-l10n toolkit.
 *
 * This module contains custom error types for the different stages of the
 * localisation pipeline, using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when reading or writing locale CSV files
#[derive(Error, Debug)]
pub enum LocaleError {
    /// The locale folder of the translation repository does not exist
    #[error("Missing locale folder: {0}")]
    MissingLocaleDir(PathBuf),

    /// A locale CSV that a stage cannot run without does not exist
    #[error("CSV not found: {0}")]
    MissingCsv(PathBuf),

    /// A CSV file has no header row
    #[error("No header in CSV: {0}")]
    MissingHeader(PathBuf),

    /// A required column is absent from the header row
    #[error("CSV {path} is missing '{column}' column (found: {found})")]
    MissingColumn {
        /// File being read
        path: PathBuf,
        /// Name of the required column
        column: &'static str,
        /// Header row as found in the file
        found: String,
    },

    /// Part files of a split CSV do not share the same header
    #[error("Header mismatch in {0}. File cannot be merged safely.")]
    HeaderMismatch(String),

    /// A CSV or part file has no content at all
    #[error("Empty CSV file: {0}")]
    EmptyFile(PathBuf),

    /// Underlying CSV parser error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Errors that can occur while handling office documents and PDFs
#[derive(Error, Debug)]
pub enum DocumentError {
    /// A required part is missing from a DOCX package
    #[error("Package part not found: {0}")]
    MissingPart(String),

    /// The XML of a package part could not be parsed
    #[error("Malformed XML in {part}: {message}")]
    MalformedXml {
        /// Part name inside the package
        part: String,
        /// Parser message
        message: String,
    },

    /// A worksheet the stage depends on is not in the workbook
    #[error("Worksheet not found: {0}")]
    MissingSheet(String),

    /// The image format is not supported for embedding
    #[error("Unsupported image (PNG expected): {0}")]
    UnsupportedImage(PathBuf),
}

/// Errors that can occur when loading a section manifest
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Manifest file does not exist
    #[error("Missing manifest.json at {0}")]
    NotFound(PathBuf),

    /// Manifest exists but could not be read
    #[error("Failed to read manifest {path}: {source}")]
    Read {
        /// Manifest path
        path: PathBuf,
        /// I/O error
        source: std::io::Error,
    },

    /// Manifest could not be parsed
    #[error("Invalid manifest {path}: {source}")]
    Invalid {
        /// Manifest path
        path: PathBuf,
        /// JSON error
        source: serde_json::Error,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from locale CSV handling
    #[error("Locale error: {0}")]
    Locale(#[from] LocaleError),

    /// Error from document handling
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Error from the manifest
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AppError {
    /// Process exit code: 2 for bad input files, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Locale(_) | AppError::Document(_) | AppError::Manifest(_) => 2,
            AppError::File(_) | AppError::Unknown(_) => 1,
        }
    }
}

impl From<anyhow::Error> for AppError {
    // Typed errors are recovered through any added context
    fn from(error: anyhow::Error) -> Self {
        let error = match error.downcast::<LocaleError>() {
            Ok(e) => return Self::Locale(e),
            Err(error) => error,
        };
        let error = match error.downcast::<DocumentError>() {
            Ok(e) => return Self::Document(e),
            Err(error) => error,
        };
        let error = match error.downcast::<ManifestError>() {
            Ok(e) => return Self::Manifest(e),
            Err(error) => error,
        };
        match error.downcast::<std::io::Error>() {
            Ok(e) => Self::File(e.to_string()),
            Err(error) => Self::Unknown(error.to_string()),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
