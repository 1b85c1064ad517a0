//! Cocofy: turn a table of bounding-box observations into a COCO dataset.
//!
//! Each input row describes one labelled box on one image. Cocofy groups the
//! rows into the three linked COCO collections (images, categories,
//! annotations), writes `annotations.json`, and copies the referenced image
//! files next to it.
//!
//! # Modules
//!
//! - [`table`]: Input rows and the CSV / JSON / Parquet loaders
//! - [`conversion`]: The pure table-to-COCO conversion and its report
//! - [`coco`]: Output types and the `annotations.json` writer
//! - [`export`]: Writing the output tree and copying images
//! - [`config`]: Category vocabulary and info files
//! - [`error`]: Error types for cocofy operations

pub mod coco;
pub mod config;
pub mod conversion;
pub mod error;
pub mod export;
pub mod table;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};

pub use conversion::{convert, convert_rows, Conversion};
pub use error::CocofyError;
pub use export::{export, ExportOptions, ExportReport};

use table::TableFormat;

/// The cocofy CLI application.
#[derive(Parser)]
#[command(name = "cocofy")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Convert an observation table into a COCO dataset.
    Convert(ConvertArgs),
}

/// Arguments for the convert subcommand.
#[derive(clap::Args)]
struct ConvertArgs {
    /// Input table (CSV, JSON, JSON Lines or Parquet).
    input: PathBuf,

    /// Input table format.
    #[arg(long = "from", value_enum, default_value = "auto")]
    from: InputFormat,

    /// Category names, in id order (comma-separated).
    #[arg(short = 'c', long, value_delimiter = ',')]
    categories: Vec<String>,

    /// File with more category names (one per line, or a YAML list).
    #[arg(long)]
    categories_file: Option<PathBuf>,

    /// Folder holding the source images.
    #[arg(long, env = "COCOFY_IMAGE_FOLDER")]
    image_folder: Option<PathBuf>,

    /// Output folder.
    #[arg(short = 'o', long, env = "COCOFY_DESTINATION", default_value = "cocofy")]
    destination: PathBuf,

    /// Name of the annotation file inside the output folder.
    #[arg(long, default_value = "annotations.json")]
    annotations_file: String,

    /// JSON or YAML file with the dataset info object.
    #[arg(long)]
    info: Option<PathBuf>,

    /// Write annotations only; do not copy images.
    #[arg(long)]
    no_copy: bool,

    /// Convert and report, but write nothing.
    #[arg(long)]
    dry_run: bool,

    /// Treat conversion warnings as errors (nothing is written).
    #[arg(long)]
    strict: bool,

    /// Output format for the report.
    #[arg(long, value_enum, default_value = "text")]
    report: ReportFormat,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum InputFormat {
    /// Guess from the file extension
    Auto,
    Csv,
    Json,
    Jsonl,
    Parquet,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum ReportFormat {
    Text,
    Json,
}

impl InputFormat {
    fn resolve(self, path: &Path) -> Result<TableFormat, CocofyError> {
        match self {
            InputFormat::Auto => TableFormat::from_path(path).ok_or_else(|| {
                CocofyError::UnsupportedFormat(format!(
                    "cannot infer table format of '{}' (use --from csv|json|jsonl|parquet)",
                    path.display()
                ))
            }),
            InputFormat::Csv => Ok(TableFormat::Csv),
            InputFormat::Json => Ok(TableFormat::Json),
            InputFormat::Jsonl => Ok(TableFormat::JsonLines),
            InputFormat::Parquet => Ok(TableFormat::Parquet),
        }
    }
}

/// Run the cocofy CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), CocofyError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Convert(args)) => run_convert(args),
        None => {
            println!("cocofy {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Turn a table of bounding-box observations into a COCO dataset.");
            println!();
            println!("Run 'cocofy --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the convert subcommand.
fn run_convert(args: ConvertArgs) -> Result<(), CocofyError> {
    let format = args.from.resolve(&args.input)?;
    let writes_images = !args.no_copy && !args.dry_run;
    if writes_images && args.image_folder.is_none() {
        return Err(CocofyError::MissingImageFolder);
    }

    // "-c 'cat, dog'" splits into "cat" and " dog"
    let mut categories: Vec<String> = args
        .categories
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();
    if let Some(path) = &args.categories_file {
        categories.extend(config::load_categories_file(path)?);
    }
    if categories.is_empty() {
        log::warn!("no categories given; the output will have no annotations");
    }

    let info = args
        .info
        .as_deref()
        .map(config::load_info_file)
        .transpose()?;

    let records = table::load_table(&args.input, format)?;
    let conversion = convert(&records, &categories, info)?;

    if args.report == ReportFormat::Text {
        println!(
            "Converted {} ({}):",
            args.input.display(),
            format.name()
        );
        print!("{}", conversion.report);
    }

    let warning_count = conversion.report.warning_count();
    if args.strict && warning_count > 0 {
        print_json_report(&args, &conversion, None);
        return Err(CocofyError::ConversionWarnings { warning_count });
    }

    if args.dry_run {
        print_json_report(&args, &conversion, None);
        return Ok(());
    }

    let options = ExportOptions {
        destination: args.destination.clone(),
        image_folder: args.image_folder.clone(),
        copy_images: !args.no_copy,
        annotations_file: args.annotations_file.clone(),
    };
    let export_report = export(&conversion, &options)?;

    if args.report == ReportFormat::Text {
        println!();
        println!("Wrote {}:", options.destination.display());
        print!("{}", export_report);
    }
    print_json_report(&args, &conversion, Some(&export_report));

    if export_report.is_complete() {
        Ok(())
    } else {
        Err(CocofyError::CopyFailed {
            failed: export_report.failures.len(),
            attempted: export_report.attempted,
        })
    }
}

/// Prints the combined JSON report when `--report json` was requested.
fn print_json_report(args: &ConvertArgs, conversion: &Conversion, export: Option<&ExportReport>) {
    if args.report != ReportFormat::Json {
        return;
    }
    let report = serde_json::json!({
        "input": args.input.display().to_string(),
        "conversion": conversion.report,
        "export": export,
    });
    match serde_json::to_string_pretty(&report) {
        Ok(text) => println!("{}", text),
        Err(e) => log::error!("failed to render JSON report: {}", e),
    }
}
