use anyhow::{Result, anyhow};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::build::tables::TableOptions;
use crate::build::{self, BuildTarget, TableKind, TranslateStats};
use crate::extract::anchored::{AnchoredReport, extract_anchored};
use crate::extract::hashed::{HashedOptions, HashedReport, extract_hashed};
use crate::extract::jsonld_check::{ConsistencyReport, check_jsonld};
use crate::extract::pdf::{PdfReport, extract_pdf};
use crate::extract::sections::{SectionOverrides, SectionReport, extract_sections};
use crate::extract::workbook::{WorkbookReport, extract_workbook};
use crate::file_utils::FileManager;
use crate::locale::split::{SplitManifest, pack_csv, split_csv};
use crate::locale::{Component, LocaleRepo, TranslationSet};

// @module: Application controller for the localisation pipeline

/// Runs the pipeline stages against one translation repository
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Folder containing the translation repository and the source files
    repo_root: PathBuf,
}

/// Overrides for `translate-docx`
#[derive(Debug, Clone, Default)]
pub struct TranslateDocxArgs {
    pub template: PathBuf,
    pub out_docx: PathBuf,
    pub locale_dir: Option<PathBuf>,
    pub component: Option<String>,
    pub lang: Option<String>,
}

/// Overrides for `build`; `None` takes the configured value
#[derive(Debug, Clone, Default)]
pub struct BuildArgs {
    pub targets: Vec<BuildTarget>,
    pub out_dir: Option<PathBuf>,
    pub src_xlsx: Option<PathBuf>,
    pub src_jsonld: Option<PathBuf>,
    pub manifest: Option<PathBuf>,
}

impl Controller {
    /// Create a controller for tests with the default configuration
    pub fn new_for_test<P: AsRef<Path>>(repo_root: P) -> Self {
        Self::with_config(Config::default(), repo_root)
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config<P: AsRef<Path>>(config: Config, repo_root: P) -> Self {
        Self {
            config,
            repo_root: repo_root.as_ref().to_path_buf(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The locale repository below the repo root
    pub fn repo(&self) -> LocaleRepo {
        LocaleRepo::new(&self.repo_root, &self.config.repo_dir)
    }

    fn source_lang(&self) -> &str {
        &self.config.source_language
    }

    fn target_lang(&self) -> &str {
        &self.config.target_language
    }

    /// Relative paths are taken from the repo root
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.repo_root.join(path)
        }
    }

    fn require_file(path: &Path, what: &str) -> Result<()> {
        if !FileManager::file_exists(path) {
            return Err(anyhow!("{} not found: {}", what, path.display()));
        }
        Ok(())
    }

    /// Format a duration as a human-readable string
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }

    fn done(stage: &str, start: Instant) {
        info!("{} finished in {}.", stage, Self::format_duration(start.elapsed()));
    }

    /// step1: workbook to the normative locale components
    pub fn run_step1(&self, xlsx: &Path) -> Result<WorkbookReport> {
        let start = Instant::now();
        let xlsx = self.resolve(xlsx);
        Self::require_file(&xlsx, "Workbook")?;

        let report = extract_workbook(&xlsx, &self.repo(), &self.config.workbook, self.source_lang(), self.target_lang())?;
        for (component, upsert) in &report.components {
            info!("{}: {} rows ({} targets kept)", component, upsert.rows, upsert.preserved);
        }
        Self::done("step1", start);
        Ok(report)
    }

    /// step2: compare JSON-LD ids with the statement and outcome CSVs
    pub fn run_step2(&self, jsonld: &Path) -> Result<ConsistencyReport> {
        let start = Instant::now();
        let jsonld = self.resolve(jsonld);
        Self::require_file(&jsonld, "JSON-LD")?;

        let report = check_jsonld(&jsonld, &self.repo(), self.source_lang())?;
        if report.statements.is_consistent() && report.outcomes.is_consistent() {
            info!("JSON-LD ids match the locale CSVs");
        } else {
            warn!("JSON-LD ids and locale CSVs differ; see the report above");
        }
        Self::done("step2", start);
        Ok(report)
    }

    fn manifest_path(&self, manifest: Option<&Path>) -> PathBuf {
        manifest
            .map(|m| self.resolve(m))
            .unwrap_or_else(|| self.repo().manifest_path())
    }

    /// step3: anchored DOCX sections into the `texts` component
    pub fn run_step3(&self, docx: &Path, manifest: Option<&Path>) -> Result<AnchoredReport> {
        let start = Instant::now();
        let docx = self.resolve(docx);
        Self::require_file(&docx, "DOCX")?;

        let report = extract_anchored(
            &docx,
            &self.repo(),
            &self.manifest_path(manifest),
            self.source_lang(),
            self.target_lang(),
        )?;
        info!("texts: {} rows ({} targets kept)", report.upsert.rows, report.upsert.preserved);
        Self::done("step3", start);
        Ok(report)
    }

    /// Manifest-driven section extraction with optional chunking
    pub fn run_extract_sections(
        &self,
        docx: &Path,
        manifest: Option<&Path>,
        overrides: &SectionOverrides,
    ) -> Result<SectionReport> {
        let start = Instant::now();
        let docx = self.resolve(docx);
        Self::require_file(&docx, "DOCX")?;

        let report = extract_sections(
            &docx,
            &self.repo(),
            &self.manifest_path(manifest),
            overrides,
            self.source_lang(),
            self.target_lang(),
        )?;
        info!("texts: {} rows ({} targets kept)", report.upsert.rows, report.upsert.preserved);
        Self::done("extract-sections", start);
        Ok(report)
    }

    /// Hashed extraction of every paragraph and table cell
    pub fn run_extract_texts(
        &self,
        docx: &Path,
        manifest: Option<&Path>,
        opts: &HashedOptions,
        preserve_targets: bool,
    ) -> Result<HashedReport> {
        let start = Instant::now();
        let docx = self.resolve(docx);
        Self::require_file(&docx, "DOCX")?;

        let manifest = self.manifest_path(manifest);
        let report = extract_hashed(
            &docx,
            &self.repo(),
            Some(manifest.as_path()),
            opts,
            preserve_targets,
            self.source_lang(),
            self.target_lang(),
        )?;
        Self::done("extract-texts", start);
        Ok(report)
    }

    /// Footnotes and hyperlinks of the published PDF
    pub fn run_extract_pdf(&self, pdf: &Path, out_dir: &Path) -> Result<PdfReport> {
        let start = Instant::now();
        let pdf = self.resolve(pdf);
        Self::require_file(&pdf, "PDF")?;

        let report = extract_pdf(&pdf, self.resolve(out_dir))?;
        Self::done("extract-pdf", start);
        Ok(report)
    }

    /// Build the translated artifacts; every target when none is given
    pub fn run_build(&self, args: &BuildArgs) -> Result<Vec<PathBuf>> {
        let start = Instant::now();
        let out_cfg = &self.config.output;
        let lang = self.target_lang();

        let tx = TranslationSet::load(&self.repo(), self.source_lang(), lang)?;
        let out_dir = self.resolve(args.out_dir.as_deref().unwrap_or(Path::new(&out_cfg.out_dir)));
        FileManager::ensure_dir(&out_dir)?;
        let src_xlsx = self.resolve(args.src_xlsx.as_deref().unwrap_or(Path::new(&out_cfg.src_xlsx)));
        let src_jsonld = self.resolve(args.src_jsonld.as_deref().unwrap_or(Path::new(&out_cfg.src_jsonld)));

        let targets: Vec<BuildTarget> = if args.targets.is_empty() {
            vec![BuildTarget::Xlsx, BuildTarget::Jsonld, BuildTarget::Docx]
        } else {
            args.targets.clone()
        };

        let mut written = Vec::new();
        for target in targets {
            match target {
                BuildTarget::Xlsx => {
                    Self::require_file(&src_xlsx, "Workbook")?;
                    let out = out_dir.join(out_cfg.xlsx_name(lang));
                    build::build_xlsx(&src_xlsx, &out, &self.config.workbook, &tx, lang)?;
                    written.push(out);
                }
                BuildTarget::Jsonld => {
                    Self::require_file(&src_jsonld, "JSON-LD")?;
                    let out = out_dir.join(out_cfg.jsonld_name(lang));
                    build::build_jsonld(&src_jsonld, &out, &tx, lang)?;
                    written.push(out);
                }
                BuildTarget::Docx => {
                    Self::require_file(&src_xlsx, "Workbook")?;
                    let out = out_dir.join(out_cfg.docx_name(lang));
                    build::build_docx_draft(
                        &self.manifest_path(args.manifest.as_deref()),
                        &src_xlsx,
                        &self.config.workbook,
                        &tx,
                        self.source_lang(),
                        lang,
                        &out,
                    )?;
                    written.push(out);
                }
            }
        }
        Self::done("build", start);
        Ok(written)
    }

    /// Translate the original DOCX in place from one locale CSV
    pub fn run_translate_docx(&self, args: &TranslateDocxArgs) -> Result<TranslateStats> {
        let start = Instant::now();
        let template = self.resolve(&args.template);
        Self::require_file(&template, "Template DOCX")?;

        let locale_dir = args
            .locale_dir
            .as_deref()
            .map(|d| self.resolve(d))
            .unwrap_or_else(|| self.repo().locale_dir());
        let component = args.component.as_deref().unwrap_or(Component::Texts.as_str());
        let lang = args.lang.as_deref().unwrap_or(self.target_lang());
        let csv_path = locale_dir.join(component).join(format!("{}.csv", lang));

        let stats = build::translate_docx(&template, &csv_path, self.resolve(&args.out_docx))?;
        Self::done("translate-docx", start);
        Ok(stats)
    }

    /// One layout table document
    pub fn run_tables(&self, kind: TableKind, opts: &TableOptions, output: Option<&Path>) -> Result<PathBuf> {
        let start = Instant::now();
        let opts = TableOptions {
            lang: opts.lang.clone(),
            locale_dir: self.resolve(&opts.locale_dir),
            jsonld: self.resolve(&opts.jsonld),
            images_dir: self.resolve(&opts.images_dir),
        };
        if !kind.is_csv_based() {
            Self::require_file(&opts.jsonld, "JSON-LD")?;
        }
        let out = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| kind.default_output(&opts.lang));
        let out = self.resolve(&out);

        build::build_table(kind, &opts, &out)?;
        Self::done("tables", start);
        Ok(out)
    }

    /// Split a large CSV for upload; `parts` files plus a manifest
    pub fn run_split(&self, input: &Path, out_dir: &Path, parts: usize) -> Result<SplitManifest> {
        let input = self.resolve(input);
        Self::require_file(&input, "CSV")?;
        let manifest = split_csv(&input, self.resolve(out_dir), parts)?;
        Ok(manifest)
    }

    /// Merge part files back into one CSV
    pub fn run_pack(&self, in_dir: &Path, output: &Path) -> Result<usize> {
        let rows = pack_csv(self.resolve(in_dir), self.resolve(output))?;
        Ok(rows)
    }
}
