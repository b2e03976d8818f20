/*!
 * # digcomp-l10n - localisation toolkit for DigComp 3.0
 *
 * Extracts translatable text from the DigComp 3.0 sources into a Weblate
 * friendly locale repository, and builds translated deliverables back from it.
 *
 * ## Features
 *
 * - Workbook, JSON-LD, DOCX and PDF extraction into `location,source,target`
 *   CSV files per component and language
 * - Manifest-driven section extraction, with anchors and chunking
 * - Content-hashed keys that survive re-ordering of the document
 * - Translated XLSX, JSON-LD and DOCX artifacts with source fallback
 * - In-place translation of the original DOCX
 * - Layout tables for acronyms, glossary, competences and learning outcomes
 *
 * ## Architecture
 *
 * - `app_config`: Configuration management
 * - `app_controller`: Runs the pipeline stages
 * - `locale`: Locale repository and CSV handling
 * - `manifest`: Section manifest
 * - `xlsx`, `docx`, `pdf`: Document formats
 * - `extract`: Source documents to locale CSVs
 * - `build`: Locale CSVs to translated artifacts
 * - `text_utils`, `file_utils`, `language_utils`: Helpers
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod build;
pub mod docx;
pub mod errors;
pub mod extract;
pub mod file_utils;
pub mod language_utils;
pub mod locale;
pub mod manifest;
pub mod pdf;
pub mod text_utils;
pub mod xlsx;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use errors::{AppError, DocumentError, LocaleError, ManifestError};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part2t};
pub use locale::{Component, LocaleRecord, LocaleRepo, TranslationSet};
pub use manifest::Manifest;
