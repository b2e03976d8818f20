// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info};
use std::io::Write;
use std::path::PathBuf;

use digcomp_l10n::app_config::{self, Config};
use digcomp_l10n::app_controller::{BuildArgs, TranslateDocxArgs};
use digcomp_l10n::build::tables::TableOptions;
use digcomp_l10n::build::{BuildTarget, TableKind};
use digcomp_l10n::extract::hashed::HashedOptions;
use digcomp_l10n::extract::sections::SectionOverrides;
use digcomp_l10n::manifest::ExtractMode;
use digcomp_l10n::{AppError, Controller};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for ExtractMode to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliExtractMode {
    Atomic,
    Chunked,
}

impl From<CliExtractMode> for ExtractMode {
    fn from(mode: CliExtractMode) -> Self {
        match mode {
            CliExtractMode::Atomic => ExtractMode::Atomic,
            CliExtractMode::Chunked => ExtractMode::Chunked,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract the workbook into the normative locale CSVs
    Step1 {
        /// Data supplement workbook
        #[arg(long)]
        xlsx: PathBuf,
    },

    /// Compare JSON-LD ids with the statement and outcome CSVs
    Step2 {
        /// Data supplement JSON-LD
        #[arg(long)]
        jsonld: PathBuf,
    },

    /// Extract anchored DOCX sections into the texts component
    Step3 {
        /// Source DOCX
        #[arg(long)]
        docx: PathBuf,

        /// Section manifest (default: <repo-root>/manifest.json)
        #[arg(long)]
        manifest: Option<PathBuf>,
    },

    /// Manifest-driven section extraction with optional chunking
    ExtractSections(ExtractSectionsArgs),

    /// Extract every paragraph and table cell with content-hashed keys
    ExtractTexts(ExtractTextsArgs),

    /// Extract footnotes and hyperlinks from the published PDF
    ExtractPdf {
        /// Rendered PDF
        #[arg(long, default_value = "DigComp3.0.pdf")]
        input: PathBuf,

        /// Folder for footers.csv and hyperlinks.csv
        #[arg(long, default_value = ".")]
        output: PathBuf,
    },

    /// Build translated artifacts from the locale repository
    Build(BuildCliArgs),

    /// Translate the original DOCX in place from a locale CSV
    TranslateDocx(TranslateDocxCliArgs),

    /// Generate one layout table document
    Tables(TablesArgs),

    /// Split a CSV into parts or pack parts back together
    SplitCsv {
        #[command(subcommand)]
        action: SplitAction,
    },

    /// Generate shell completions for digcomp-l10n
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct ExtractSectionsArgs {
    /// Source DOCX
    #[arg(long)]
    docx: PathBuf,

    /// Section manifest (default: <repo-root>/manifest.json)
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Override the manifest's default mode
    #[arg(long, value_enum)]
    mode: Option<CliExtractMode>,

    /// Maximum characters per chunk
    #[arg(long)]
    max_chars: Option<usize>,

    /// Minimum characters before a chunk may be flushed
    #[arg(long)]
    min_chars: Option<usize>,

    /// Skip tables
    #[arg(long)]
    no_tables: bool,
}

#[derive(Args, Debug)]
struct ExtractTextsArgs {
    /// Source DOCX
    #[arg(long)]
    docx: PathBuf,

    /// Section manifest for skip/merge ranges
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Maximum characters per string
    #[arg(long)]
    max_len: Option<usize>,

    /// Emit every paragraph on its own
    #[arg(long = "no-merge-paragraphs")]
    no_merge: bool,

    /// If merging, flush after N paragraphs (0 = unlimited)
    #[arg(long)]
    max_paras_per_block: Option<usize>,

    /// Split manual line breaks into separate paragraphs
    #[arg(long)]
    split_on_linebreaks: bool,

    /// Keep existing targets in the target-language CSV
    #[arg(long = "preserve-nl-csv")]
    preserve: bool,
}

#[derive(Args, Debug)]
struct BuildCliArgs {
    /// Artifact to build; repeat for several, omit for all
    #[arg(long = "build", value_enum)]
    targets: Vec<BuildTarget>,

    /// Output folder
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Original data supplement workbook
    #[arg(long)]
    src_xlsx: Option<PathBuf>,

    /// Original data supplement JSON-LD
    #[arg(long)]
    src_jsonld: Option<PathBuf>,

    /// Section manifest for the DOCX draft
    #[arg(long)]
    manifest: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct TranslateDocxCliArgs {
    /// Original DOCX used as template
    #[arg(long)]
    template_docx: PathBuf,

    /// Translated DOCX to write
    #[arg(long)]
    out_docx: PathBuf,

    /// Locale folder (default: <repo-root>/<repo_dir>/locale)
    #[arg(long)]
    locale_dir: Option<PathBuf>,

    /// Component folder holding the CSV
    #[arg(long)]
    component: Option<String>,

    /// Language of the CSV (default: configured target language)
    #[arg(long)]
    lang: Option<String>,
}

#[derive(Args, Debug)]
struct TablesArgs {
    /// Table to generate
    #[arg(value_enum)]
    kind: TableKind,

    /// Label language
    #[arg(long)]
    lang: Option<String>,

    /// Locale folder with the acronym and glossary CSVs
    #[arg(long)]
    path: Option<PathBuf>,

    /// Translated JSON-LD
    #[arg(long)]
    json: Option<PathBuf>,

    /// Folder with the competence area icons
    #[arg(long)]
    images: Option<PathBuf>,

    /// Output filename (default: DigComp3_<type>_<lang>.docx)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum SplitAction {
    /// Split one CSV into numbered parts plus a manifest
    Split {
        /// CSV to split
        #[arg(long)]
        input: PathBuf,

        /// Folder for the parts
        #[arg(long)]
        out_dir: PathBuf,

        /// Number of parts
        #[arg(long, default_value_t = 2)]
        parts: usize,
    },

    /// Merge the parts of a folder back into one CSV
    Pack {
        /// Folder holding the parts
        #[arg(long)]
        in_dir: PathBuf,

        /// Merged CSV to write
        #[arg(long)]
        output: PathBuf,
    },
}

/// digcomp-l10n - localisation toolkit for DigComp 3.0
///
/// Extracts translatable text from the DigComp 3.0 sources into a locale
/// repository and builds translated deliverables back from it.
#[derive(Parser, Debug)]
#[command(name = "digcomp-l10n")]
#[command(version)]
#[command(about = "Localisation toolkit for DigComp 3.0")]
#[command(long_about = "digcomp-l10n extracts DigComp 3.0 texts into location,source,target CSV files and builds translated artifacts from them.

EXAMPLES:
    digcomp-l10n step1 --xlsx supplement.xlsx              # Workbook to locale CSVs
    digcomp-l10n step2 --jsonld supplement.jsonld          # Check ids against the CSVs
    digcomp-l10n step3 --docx DigComp3.0.docx              # Anchored document sections
    digcomp-l10n extract-texts --docx DigComp3.0.docx      # Every text with hashed keys
    digcomp-l10n extract-pdf --input DigComp3.0.pdf        # Footnotes and hyperlinks
    digcomp-l10n build --build xlsx --build jsonld         # Translated artifacts
    digcomp-l10n translate-docx --template-docx DigComp3.0.docx --out-docx nl/DigComp3.0_nl.docx
    digcomp-l10n tables outcomes --lang nl                 # Learning outcome tables
    digcomp-l10n split-csv split --input big.csv --out-dir parts --parts 4
    digcomp-l10n completions bash > digcomp-l10n.bash      # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Folder containing the translation repository and manifest.json
    #[arg(long, global = true, default_value = ".", env = "DIGCOMP_REPO_ROOT")]
    repo_root: PathBuf,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "conf.json")]
    config: PathBuf,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI colour for a log level
    fn decoration(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌ ", "1;31"),
            Level::Warn => ("🚧 ", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("🔍 ", "1;36"),
            Level::Trace => ("📋 ", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, colour) = Self::decoration(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {} {}\x1B[0m",
                colour,
                now,
                emoji,
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn main() {
    // The logger accepts everything; the effective level is set via max_level
    if CustomLogger::init(LevelFilter::Trace).is_ok() {
        log::set_max_level(LevelFilter::Info);
    }

    let cli = CommandLineOptions::parse();
    if let Err(e) = run(cli) {
        error!("{:#}", e);
        std::process::exit(AppError::from(e).exit_code());
    }
}

fn run(cli: CommandLineOptions) -> Result<()> {
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "digcomp-l10n", &mut std::io::stdout());
        return Ok(());
    }

    if let Some(level) = &cli.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(&cli.config)?;
    if let Some(level) = cli.log_level {
        config.log_level = level.into();
    }
    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());

    let controller = Controller::with_config(config, &cli.repo_root);
    dispatch(&controller, cli.command)
}

fn dispatch(controller: &Controller, command: Commands) -> Result<()> {
    match command {
        Commands::Step1 { xlsx } => {
            controller.run_step1(&xlsx)?;
        }
        Commands::Step2 { jsonld } => {
            let report = controller.run_step2(&jsonld)?;
            if !(report.statements.is_consistent() && report.outcomes.is_consistent()) {
                info!("Review the differences before continuing with step3.");
            }
        }
        Commands::Step3 { docx, manifest } => {
            controller.run_step3(&docx, manifest.as_deref())?;
        }
        Commands::ExtractSections(args) => {
            let overrides = SectionOverrides {
                mode: args.mode.map(Into::into),
                max_chars: args.max_chars,
                min_chars: args.min_chars,
                no_tables: args.no_tables,
            };
            controller.run_extract_sections(&args.docx, args.manifest.as_deref(), &overrides)?;
        }
        Commands::ExtractTexts(args) => {
            let mut opts = HashedOptions::from(&controller.config().extraction);
            if let Some(max_len) = args.max_len {
                opts.max_len = max_len;
            }
            if args.no_merge {
                opts.merge_paragraphs = false;
            }
            if let Some(n) = args.max_paras_per_block {
                opts.max_paras_per_block = n;
            }
            if args.split_on_linebreaks {
                opts.split_on_linebreaks = true;
            }
            controller.run_extract_texts(&args.docx, args.manifest.as_deref(), &opts, args.preserve)?;
        }
        Commands::ExtractPdf { input, output } => {
            controller.run_extract_pdf(&input, &output)?;
        }
        Commands::Build(args) => {
            let written = controller.run_build(&BuildArgs {
                targets: args.targets,
                out_dir: args.out_dir,
                src_xlsx: args.src_xlsx,
                src_jsonld: args.src_jsonld,
                manifest: args.manifest,
            })?;
            for path in written {
                info!("Wrote: {}", path.display());
            }
        }
        Commands::TranslateDocx(args) => {
            controller.run_translate_docx(&TranslateDocxArgs {
                template: args.template_docx,
                out_docx: args.out_docx,
                locale_dir: args.locale_dir,
                component: args.component,
                lang: args.lang,
            })?;
        }
        Commands::Tables(args) => {
            let config = controller.config();
            let lang = args.lang.unwrap_or_else(|| config.target_language.clone());
            let repo = controller.repo();
            let opts = TableOptions {
                locale_dir: args.path.unwrap_or_else(|| repo.locale_dir()),
                jsonld: args.json.unwrap_or_else(|| {
                    PathBuf::from(&config.output.out_dir).join(config.output.jsonld_name(&lang))
                }),
                images_dir: args.images.unwrap_or_else(|| repo.images_dir()),
                lang,
            };
            controller.run_tables(args.kind, &opts, args.output.as_deref())?;
        }
        Commands::SplitCsv { action } => match action {
            SplitAction::Split { input, out_dir, parts } => {
                controller.run_split(&input, &out_dir, parts)?;
            }
            SplitAction::Pack { in_dir, output } => {
                controller.run_pack(&in_dir, &output)?;
            }
        },
        Commands::Completions { .. } => {}
    }
    Ok(())
}
