use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sheetrows::{InputKind, TableOptions, WorkbookInput};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

mod render;

use render::ImageMode;

const LOG_ENV: &str = "SHEETROWS_LOG";

#[derive(Parser, Debug)]
#[command(name = "sheetrows", version, about = "Read spreadsheet tables and their images")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the sheet names of a workbook as a JSON array.
    Sheets(InputArgs),
    /// Print one sheet as a JSON array of records.
    Table(TableArgs),
    /// Write every embedded image into a directory.
    Images(ImagesArgs),
}

#[derive(Parser, Debug)]
struct InputArgs {
    /// Workbook path, or base64 text of the workbook bytes.
    input: String,

    /// How to read INPUT; `auto` sniffs for base64 content.
    #[arg(long, value_enum, default_value_t = KindArg::Auto)]
    kind: KindArg,
}

impl InputArgs {
    fn workbook_input(&self) -> WorkbookInput {
        WorkbookInput::with_kind(self.input.clone(), self.kind.into())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum KindArg {
    Auto,
    Path,
    Base64,
}

impl From<KindArg> for InputKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Auto => InputKind::Auto,
            KindArg::Path => InputKind::Path,
            KindArg::Base64 => InputKind::Base64,
        }
    }
}

#[derive(Parser, Debug)]
struct TableArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Sheet to read; defaults to the first sheet.
    #[arg(long)]
    sheet: Option<String>,

    /// 0-based row holding the headers.
    #[arg(long = "header-row")]
    header_row: Option<usize>,

    /// Extra 0-based rows to skip. May be repeated or comma-separated.
    #[arg(long = "skip-row", value_delimiter = ',')]
    skip_rows: Vec<usize>,

    /// Rename a header, FROM=TO. An empty TO drops the column.
    #[arg(long = "map", value_parser = parse_mapping)]
    maps: Vec<(String, String)>,

    /// JSON file with table options (sheetName, headerRow, skipRows, headerMap).
    /// Flags given on the command line take precedence.
    #[arg(long)]
    options: Option<PathBuf>,

    /// How image values are written.
    #[arg(long, value_enum, default_value_t = ImageMode::Base64)]
    images: ImageMode,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

#[derive(Parser, Debug)]
struct ImagesArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Directory to write the images into; created if missing.
    #[arg(long)]
    out: PathBuf,
}

fn parse_mapping(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((from, to)) if !from.is_empty() => Ok((from.to_string(), to.to_string())),
        _ => Err(format!("expected FROM=TO, got `{s}`")),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Sheets(args) => run_sheets(&args),
        Command::Table(args) => run_table(&args),
        Command::Images(args) => run_images(&args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .init();
}

fn run_sheets(args: &InputArgs) -> Result<()> {
    let names = sheetrows::get_sheet_names(args.workbook_input())
        .with_context(|| format!("failed to read sheet names from {}", display_input(args)))?;
    write_json(&serde_json::to_value(names)?, false)
}

fn run_table(args: &TableArgs) -> Result<()> {
    let options = table_options(args)?;
    tracing::debug!(?options, "resolved table options");
    let records = sheetrows::read_table_as_json(args.input.workbook_input(), &options)
        .with_context(|| format!("failed to read table from {}", display_input(&args.input)))?;
    let json = render::records_to_json(&records, args.images);
    write_json(&json, args.pretty)
}

fn run_images(args: &ImagesArgs) -> Result<()> {
    let images = sheetrows::extract_images(args.input.workbook_input())
        .with_context(|| format!("failed to extract images from {}", display_input(&args.input)))?;
    fs::create_dir_all(&args.out)
        .with_context(|| format!("failed to create {}", args.out.display()))?;

    let names = render::output_file_names(&images);
    let mut stdout = std::io::stdout().lock();
    for (image, name) in images.iter().zip(&names) {
        let path = args.out.join(name);
        fs::write(&path, &image.bytes)
            .with_context(|| format!("failed to write {}", path.display()))?;
        writeln!(stdout, "{}", path.display())?;
    }
    tracing::info!(count = images.len(), out = %args.out.display(), "images written");
    Ok(())
}

/// Options file first, then command-line flags on top.
fn table_options(args: &TableArgs) -> Result<TableOptions> {
    let mut options = match &args.options {
        Some(path) => load_options(path)?,
        None => TableOptions::default(),
    };
    if let Some(sheet) = &args.sheet {
        options.sheet_name = Some(sheet.clone());
    }
    if let Some(row) = args.header_row {
        options.header_row = row;
    }
    options.skip_rows.extend(args.skip_rows.iter().copied());
    for (from, to) in &args.maps {
        options.header_map.insert(from.clone(), to.clone());
    }
    Ok(options)
}

fn load_options(path: &Path) -> Result<TableOptions> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read options file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("invalid options file {}", path.display()))
}

fn write_json(value: &serde_json::Value, pretty: bool) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    if pretty {
        serde_json::to_writer_pretty(&mut stdout, value)?;
    } else {
        serde_json::to_writer(&mut stdout, value)?;
    }
    writeln!(stdout)?;
    Ok(())
}

/// Short description of the input for error messages; base64 text is not echoed.
fn display_input(args: &InputArgs) -> String {
    if sheetrows::workbook::looks_like_base64(&args.input) || args.kind == KindArg::Base64 {
        format!("base64 input ({} chars)", args.input.len())
    } else {
        args.input.clone()
    }
}
