#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{ArgAction, CommandFactory as _, Parser, Subcommand};
use serde::Serialize;
use time::Date;

use crate::config::{self, Config};
use crate::core::classify::Classification;
use crate::core::ids::IdGenerator;
use crate::core::schedule;
use crate::import::{self, ImportOptions, ImportReport};
use crate::logging;
use crate::output::html::UploadPage;
use crate::output::json;
use crate::output::table::Table;
use crate::sheet::Workbook;
use crate::sheet::inspect;

const RULE: &str =
    "================================================================================";

#[derive(Debug, Parser)]
#[command(
    name = "ppm-import",
    version,
    about = "Convert spreadsheet maintenance tasks into PPM task records"
)]
pub struct Cli {
    /// Config file (default: ~/.config/ppm-import/config.toml)
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,
    /// Log more to stderr (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Import tasks and write the JSON snapshot and upload page
    Import(ImportArgs),
    /// Show sheet structure, headers and sample rows
    Inspect(InspectArgs),
    /// Classify descriptions given on the command line
    Classify(ClassifyArgs),
    Config(ConfigArgs),
    Completion(CompletionArgs),
    Version,
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Parser)]
pub struct ImportArgs {
    /// Spreadsheet (.xlsx, .xlsm, .xlsb, .xls, .ods) or .csv file
    pub input: PathBuf,
    /// JSON output path
    #[arg(long = "json-out")]
    pub json_out: Option<String>,
    /// HTML upload page path
    #[arg(long = "html-out")]
    pub html_out: Option<String>,
    /// Skip the HTML upload page
    #[arg(long = "no-html")]
    pub no_html: bool,
    /// First due date, YYYY-MM-DD (default: today)
    #[arg(long = "start-date")]
    pub start_date: Option<String>,
    /// Print the summary without writing any files
    #[arg(short = 'n', long = "dry-run")]
    pub dry_run: bool,
    /// Show the first N records with equipment and location
    #[arg(long = "preview", default_value_t = 0)]
    pub preview: usize,
    /// Print summary tables as CSV
    #[arg(long = "csv")]
    pub csv: bool,
}

#[derive(Debug, Parser)]
pub struct InspectArgs {
    pub input: PathBuf,
    /// Data rows to show per sheet
    #[arg(long = "sample", default_value_t = 3)]
    pub sample: usize,
    /// Also write headers and rows of every sheet as JSON
    #[arg(long = "json-out", num_args = 0..=1, default_missing_value = "parsed_tasks.json")]
    pub json_out: Option<String>,
}

#[derive(Debug, Parser)]
pub struct ClassifyArgs {
    #[arg(required = true)]
    pub descriptions: Vec<String>,
    /// Ordinal position used for the due date
    #[arg(long = "index", default_value_t = 0)]
    pub index: usize,
    /// YYYY-MM-DD (default: today)
    #[arg(long = "start-date")]
    pub start_date: Option<String>,
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct CompletionArgs {
    pub shell: clap_complete::Shell,
}

#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub cmd: ConfigCmd,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCmd {
    List,
    Set(ConfigSetArgs),
    Get(ConfigGetArgs),
}

#[derive(Debug, Parser)]
pub struct ConfigSetArgs {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Parser)]
pub struct ConfigGetArgs {
    pub key: String,
}

pub fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config_path = cli.config.as_deref();
    match cli.cmd {
        Commands::Completion(args) => {
            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "ppm-import", &mut std::io::stdout());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config(args) => cmd_config(args, config_path),
        Commands::Import(args) => cmd_import(&args, config_path),
        Commands::Inspect(args) => cmd_inspect(&args),
        Commands::Classify(args) => cmd_classify(&args, config_path),
        Commands::Version => Ok(cmd_version()),
    }
}

fn load_cfg(config_path: Option<&Path>) -> anyhow::Result<Config> {
    let (cfg, paths) = config::load(config_path)?;
    tracing::debug!(path = %paths.config_file.display(), "configuration loaded");
    Ok(cfg)
}

fn cmd_config(args: ConfigArgs, config_path: Option<&Path>) -> anyhow::Result<ExitCode> {
    match args.cmd {
        ConfigCmd::List => {
            print!("{}", config::list_resolved_toml(config_path)?);
            Ok(ExitCode::SUCCESS)
        }
        ConfigCmd::Set(set) => {
            let paths = config::resolve_paths(config_path)?;
            config::set_value_string_at_path(&paths.config_file, &set.key, &set.value)?;
            println!("Set {} = {}", set.key, set.value);
            Ok(ExitCode::SUCCESS)
        }
        ConfigCmd::Get(get) => {
            let paths = config::resolve_paths(config_path)?;
            match config::get_value_string_at_path(&paths.config_file, &get.key)? {
                Some(v) => {
                    println!("{v}");
                    Ok(ExitCode::SUCCESS)
                }
                None => anyhow::bail!(
                    "configuration key '{}' not found - use 'ppm-import config list' to see available keys",
                    get.key
                ),
            }
        }
    }
}

/// `--start-date`, then `schedule.start_date`, then today.
fn resolve_start_date(flag: Option<&str>, cfg: &Config) -> anyhow::Result<Date> {
    if let Some(s) = flag {
        return Ok(schedule::parse_iso_date(s)?);
    }
    if !cfg.schedule.start_date.trim().is_empty() {
        return Ok(schedule::parse_iso_date(&cfg.schedule.start_date)?);
    }
    Ok(schedule::today())
}

fn cmd_import(args: &ImportArgs, config_path: Option<&Path>) -> anyhow::Result<ExitCode> {
    let cfg = load_cfg(config_path)?;
    let start_date = resolve_start_date(args.start_date.as_deref(), &cfg)?;

    let workbook = Workbook::open(&args.input)
        .with_context(|| format!("failed to load tasks from {}", args.input.display()))?;

    let classifier = cfg.classifier.build();
    let opts = ImportOptions::from_config(&cfg, start_date);
    let mut ids = IdGenerator::system();
    let report = import::import_workbook(&workbook, &classifier, &opts, &mut ids);

    print_summary(&report, args.csv)?;
    if args.preview > 0 {
        print_preview(&report, args.preview, args.csv)?;
    }

    if args.dry_run {
        if !args.csv {
            println!("\nDry run: no files written");
        }
        return Ok(ExitCode::SUCCESS);
    }

    let json_path = config::expand_path(args.json_out.as_deref().unwrap_or(&cfg.output.json_path));
    json::write_pretty(&json_path, &report.records)?;
    tracing::info!(path = %json_path.display(), records = report.total(), "wrote JSON snapshot");

    let html_path = if cfg.output.write_html && !args.no_html {
        let path =
            config::expand_path(args.html_out.as_deref().unwrap_or(&cfg.output.html_path));
        let source_name = workbook.file_name();
        UploadPage {
            upload: &cfg.upload,
            source_name: &source_name,
            records: &report.records,
        }
        .write(&path)?;
        tracing::info!(path = %path.display(), "wrote upload page");
        Some(path)
    } else {
        None
    };

    if !args.csv {
        print_next_steps(&json_path, html_path.as_deref());
    }
    Ok(ExitCode::SUCCESS)
}

fn summary_tables(report: &ImportReport) -> [(&'static str, Table); 3] {
    let mut sheets = Table::new(["SHEET", "IMPORTED", "SKIPPED"]);
    for s in &report.sheets {
        sheets.row([s.name.clone(), s.imported.to_string(), s.skipped.to_string()]);
    }

    let mut freq = Table::new(["FREQUENCY", "TASKS"]);
    for (f, n) in report.by_frequency() {
        freq.row([f.to_string(), n.to_string()]);
    }

    let mut types = Table::new(["TYPE", "TASKS"]);
    for (t, n) in report.by_task_type() {
        types.row([t.to_string(), n.to_string()]);
    }

    [
        ("Sheets", sheets),
        ("Tasks by Frequency", freq),
        ("Tasks by Type", types),
    ]
}

fn print_summary(report: &ImportReport, csv: bool) -> anyhow::Result<()> {
    let tables = summary_tables(report);
    if csv {
        for (i, (_, table)) in tables.iter().enumerate() {
            if i > 0 {
                println!();
            }
            table.print(true)?;
        }
        return Ok(());
    }

    println!("{RULE}");
    println!("PPM Task Import");
    println!("{RULE}");
    for (title, table) in &tables {
        println!("\n{title}:");
        if table.is_empty() {
            println!("  (none)");
            continue;
        }
        table.print(false)?;
    }
    println!("\nTotal Tasks Imported: {}", report.total());
    println!("Start Date: {}", schedule::format_iso_date(report.start_date));
    Ok(())
}

fn print_preview(report: &ImportReport, limit: usize, csv: bool) -> anyhow::Result<()> {
    let mut t = Table::new(["ID", "DUE", "FREQUENCY", "TYPE", "EQUIPMENT", "LOCATION"]);
    for (rec, class) in report
        .records
        .iter()
        .zip(&report.classifications)
        .take(limit)
    {
        t.row([
            rec.id.to_string(),
            schedule::format_iso_date(rec.due_date),
            rec.frequency.to_string(),
            rec.task_type.to_string(),
            truncate(&class.equipment, 40),
            truncate(&class.location, 40),
        ]);
    }
    if csv {
        println!();
    } else {
        println!("\nPreview:");
    }
    t.print(csv)?;
    Ok(())
}

fn print_next_steps(json_path: &Path, html_path: Option<&Path>) {
    println!("\n{RULE}");
    println!("Tasks exported to: {}", json_path.display());
    if let Some(html) = html_path {
        println!("Import interface created: {}", html.display());
    }
    println!("{RULE}");
    println!("Next steps:");
    println!("  1. Review the imported tasks in '{}'", json_path.display());
    if let Some(html) = html_path {
        println!("  2. Open '{}' in your browser", html.display());
        println!("  3. Click 'Import Tasks Now' to upload them");
    }
}

fn cmd_inspect(args: &InspectArgs) -> anyhow::Result<ExitCode> {
    let workbook = Workbook::open(&args.input)
        .with_context(|| format!("failed to inspect {}", args.input.display()))?;
    let overviews = inspect::inspect(&workbook);

    println!("Workbook: {}", workbook.file_name());
    let names: Vec<&str> = overviews.iter().map(|o| o.name.as_str()).collect();
    println!("Sheets: {}", names.join(", "));

    for o in &overviews {
        println!("\n{RULE}");
        println!("Sheet: {}", o.name);
        println!("{RULE}");
        println!("Dimensions: {} rows x {} columns", o.rows, o.columns);

        println!("\nHeaders ({} columns):", o.headers.len());
        for (i, h) in o.headers.iter().enumerate() {
            println!("  {}. {}", i + 1, h.as_deref().unwrap_or("-"));
        }

        println!("\nTotal Data Rows: {}", o.data.len());
        let sample = o.sample(args.sample);
        if !sample.is_empty() {
            println!("\nSample Data (first {} rows):", sample.len());
        }
        for (i, row) in sample.iter().enumerate() {
            println!("\n  Row {}:", i + 1);
            for (k, v) in row {
                println!("    {k}: {v}");
            }
        }
    }

    if let Some(out) = &args.json_out {
        let path = config::expand_path(out);
        json::write_pretty(&path, &inspect::to_json_map(&overviews))?;
        println!("\nData exported to: {}", path.display());
    }
    Ok(ExitCode::SUCCESS)
}

#[derive(Debug, Serialize)]
struct ClassifyOutput<'a> {
    description: &'a str,
    #[serde(flatten)]
    classification: Classification,
    due_date: String,
}

fn cmd_classify(args: &ClassifyArgs, config_path: Option<&Path>) -> anyhow::Result<ExitCode> {
    let cfg = load_cfg(config_path)?;
    let start_date = resolve_start_date(args.start_date.as_deref(), &cfg)?;
    let classifier = cfg.classifier.build();
    let slot = schedule::stagger_index(args.index, cfg.schedule.stagger_window);

    let results: Vec<ClassifyOutput<'_>> = args
        .descriptions
        .iter()
        .map(|d| {
            let classification = classifier.classify(d);
            let due = schedule::due_date(start_date, slot, classification.frequency);
            ClassifyOutput {
                description: d,
                classification,
                due_date: schedule::format_iso_date(due),
            }
        })
        .collect();

    if args.json {
        print!("{}", json::to_pretty_string(&results)?);
        return Ok(ExitCode::SUCCESS);
    }

    let mut t = Table::new(["EQUIPMENT", "LOCATION", "FREQUENCY", "TYPE", "DUE"]);
    for r in &results {
        t.row([
            truncate(&r.classification.equipment, 50),
            r.classification.location.clone(),
            r.classification.frequency.to_string(),
            r.classification.task_type.to_string(),
            r.due_date.clone(),
        ]);
    }
    t.print(false)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_version() -> ExitCode {
    println!("ppm-import version {}", env!("CARGO_PKG_VERSION"));
    if let Some(commit) = option_env!("PPM_IMPORT_GIT_COMMIT") {
        println!("  commit: {commit}");
    }
    println!("  rust: {}", rustc_version_runtime::version());
    println!(
        "  os/arch: {}/{}",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    ExitCode::SUCCESS
}

fn truncate(s: &str, max: usize) -> String {
    let mut out: String = s.chars().take(max).collect();
    if s.chars().count() > max {
        out.push_str("...");
    }
    out
}
