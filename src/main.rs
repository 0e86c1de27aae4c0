//! emvis-picker - inspect particle-picking runs from the command line.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};

use emvis::config::{AppConfig, LogLevel};
use emvis::format::{discover_sources, read_coordinates, Strictness};
use emvis::picker::{
    export_picks, ExportFormat, MicrographMatching, PickerCmpModel, PickerModel,
    RandomPickerModel, RelionPickerModel, SimplePickerModel, WarningSeverity,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "emvis-picker")]
#[command(about = "Summarize, compare and export particle-picking runs")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Args)]
struct GlobalArgs {
    /// Configuration file (defaults to the user config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level, overriding the configured one.
    #[arg(long, value_enum, global = true)]
    log_level: Option<LogLevelArg>,

    /// Box size in pixels, overriding the run's own.
    #[arg(long, global = true)]
    box_size: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a RELION picking job directory.
    Summary {
        /// Job directory holding note.txt and summary.star.
        job_dir: PathBuf,

        /// Score threshold applied to auto-picked coordinates.
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Summarize a picking run inside a RELION project.
    Project {
        /// Project root directory.
        root: PathBuf,
        /// Picking job directory, relative to the root.
        picking: PathBuf,
        /// Micrographs STAR file, relative to the root.
        micrographs: PathBuf,
    },

    /// Compare two RELION picking jobs.
    Compare {
        first: PathBuf,
        second: PathBuf,

        /// Pair micrographs by file name instead of position.
        #[arg(long)]
        basename: bool,
    },

    /// Print the picks of a single coordinate file.
    Coords {
        file: PathBuf,

        /// Skip malformed lines instead of failing.
        #[arg(long)]
        permissive: bool,
    },

    /// Pair micrographs with coordinate files and summarize them.
    Pairs {
        /// Micrograph pattern, e.g. 'Micrographs/*.mrc'.
        micrographs: String,
        /// Coordinate file pattern, e.g. 'picks/*.txt'.
        coordinates: Option<String>,

        /// Skip malformed lines instead of failing.
        #[arg(long)]
        permissive: bool,
    },

    /// Write the displayed picks of a RELION job to one file per micrograph.
    Export {
        job_dir: PathBuf,
        out: PathBuf,

        #[arg(long, value_enum, default_value_t = ExportFormatArg::Text)]
        format: ExportFormatArg,
    },

    /// Summarize a synthetic run of random picks.
    Demo {
        #[arg(long, default_value = "5")]
        micrographs: usize,

        #[arg(long, default_value = "20")]
        picks: usize,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevelArg {
    fn to_level(self) -> LogLevel {
        match self {
            LogLevelArg::Error => LogLevel::Error,
            LogLevelArg::Warn => LogLevel::Warn,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Debug => LogLevel::Debug,
            LogLevelArg::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ExportFormatArg {
    Text,
    Star,
}

impl ExportFormatArg {
    fn to_format(self) -> ExportFormat {
        match self {
            ExportFormatArg::Text => ExportFormat::Text,
            ExportFormatArg::Star => ExportFormat::Star,
        }
    }
}

fn load_config(path: Option<&Path>) -> CliResult<AppConfig> {
    match path {
        Some(path) => Ok(AppConfig::load(path)?),
        None => Ok(AppConfig::load_from_default_path().unwrap_or_default()),
    }
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.global.config.as_deref())?;
    let level = cli
        .global
        .log_level
        .map(LogLevelArg::to_level)
        .unwrap_or(config.preferences.log_level);
    emvis::logging::init(level);

    if let Some(box_size) = cli.global.box_size {
        config.preferences.box_size = Some(box_size);
    }

    match cli.command {
        Commands::Summary { job_dir, threshold } => run_summary(&config, &job_dir, threshold),
        Commands::Project {
            root,
            picking,
            micrographs,
        } => run_project(&config, &root, &picking, &micrographs),
        Commands::Compare {
            first,
            second,
            basename,
        } => run_compare(&config, &first, &second, basename),
        Commands::Coords { file, permissive } => run_coords(&file, strictness(&config, permissive)),
        Commands::Pairs {
            micrographs,
            coordinates,
            permissive,
        } => run_pairs(
            &config,
            &micrographs,
            coordinates.as_deref(),
            strictness(&config, permissive),
        ),
        Commands::Export {
            job_dir,
            out,
            format,
        } => run_export(&config, &job_dir, &out, format.to_format()),
        Commands::Demo { micrographs, picks } => run_demo(&config, micrographs, picks),
    }
}

fn strictness(config: &AppConfig, permissive: bool) -> Strictness {
    if permissive {
        Strictness::Permissive
    } else {
        config.preferences.strictness
    }
}

fn apply_preferences(config: &AppConfig, model: &mut dyn PickerModel) {
    if let Some(box_size) = config.preferences.box_size {
        model.set_box_size(box_size);
    }
}

fn open_job(config: &AppConfig, job_dir: &Path) -> CliResult<RelionPickerModel> {
    let mut model = RelionPickerModel::open(job_dir, config.relion.clone())?;
    model.set_score_threshold(config.preferences.score_threshold);
    apply_preferences(config, &mut model);
    Ok(model)
}

/// Print the visible columns of the summary table, tab separated.
fn print_table(model: &mut dyn PickerModel) -> CliResult<()> {
    let columns = model.columns();
    let visible: Vec<usize> = (0..columns.len()).filter(|&c| columns[c].visible).collect();

    let header: Vec<&str> = visible.iter().map(|&c| columns[c].name.as_str()).collect();
    println!("{}", header.join("\t"));
    for row in 0..model.rows_count() {
        let mut cells = Vec::with_capacity(visible.len());
        for &col in &visible {
            cells.push(model.value(row, col)?.to_string());
        }
        println!("{}", cells.join("\t"));
    }
    Ok(())
}

fn print_totals(model: &mut dyn PickerModel) -> CliResult<()> {
    let mut total = 0;
    for row in 0..model.rows_count() {
        if let Some(id) = model.micrograph_by_index(row).map(|m| m.id()) {
            total += model.iter_coordinates(id)?.count();
        }
    }
    println!(
        "# {} micrographs, {} displayed picks, box size {}",
        model.rows_count(),
        total,
        model.box_size()
    );
    Ok(())
}

// ── summary ────────────────────────────────────────────────────────────

fn run_summary(config: &AppConfig, job_dir: &Path, threshold: Option<f64>) -> CliResult<()> {
    let mut model = open_job(config, job_dir)?;
    if let Some(threshold) = threshold {
        model.set_score_threshold(threshold);
    }
    print_table(&mut model)?;
    print_totals(&mut model)
}

// ── project ────────────────────────────────────────────────────────────

fn run_project(
    config: &AppConfig,
    root: &Path,
    picking: &Path,
    micrographs: &Path,
) -> CliResult<()> {
    let mut model =
        RelionPickerModel::from_project(root, picking, micrographs, config.relion.clone())?;
    apply_preferences(config, &mut model);
    print_table(&mut model)?;
    print_totals(&mut model)
}

// ── compare ────────────────────────────────────────────────────────────

fn run_compare(config: &AppConfig, first: &Path, second: &Path, basename: bool) -> CliResult<()> {
    let a = open_job(config, first)?;
    let b = open_job(config, second)?;
    let matching = if basename {
        MicrographMatching::Basename
    } else {
        config.compare.matching
    };

    let labels = config.compare.run_labels();
    let mut model = PickerCmpModel::with_labels(Box::new(a), Box::new(b), matching, labels);
    apply_preferences(config, &mut model);
    print_table(&mut model)?;
    print_totals(&mut model)
}

// ── coords ─────────────────────────────────────────────────────────────

fn run_coords(file: &Path, strictness: Strictness) -> CliResult<()> {
    let parsed = read_coordinates(file, strictness)?;
    for c in &parsed.coordinates {
        let label = c.label.as_deref().unwrap_or("-");
        match c.end {
            Some((x2, y2)) => println!("{}\t{}\t{}\t{}\t{}", c.x, c.y, x2, y2, label),
            None => println!("{}\t{}\t{}", c.x, c.y, label),
        }
    }
    println!("# {} picks", parsed.coordinates.len());
    if !parsed.skipped_lines.is_empty() {
        println!("# skipped lines: {:?}", parsed.skipped_lines);
    }
    Ok(())
}

// ── pairs ──────────────────────────────────────────────────────────────

fn run_pairs(
    config: &AppConfig,
    micrographs: &str,
    coordinates: Option<&str>,
    strictness: Strictness,
) -> CliResult<()> {
    let sources = discover_sources(micrographs, coordinates)?;
    let mut model = SimplePickerModel::from_sources(sources, strictness);
    apply_preferences(config, &mut model);
    print_table(&mut model)?;
    print_totals(&mut model)
}

// ── export ─────────────────────────────────────────────────────────────

fn run_export(
    config: &AppConfig,
    job_dir: &Path,
    out: &Path,
    format: ExportFormat,
) -> CliResult<()> {
    let mut model = open_job(config, job_dir)?;
    let result = export_picks(&mut model, out, format)?;
    for warning in &result.warnings {
        match warning.severity {
            WarningSeverity::Warning => log::warn!("{}", warning.message),
            WarningSeverity::Error => log::error!("{:?}: {}", warning.micrograph, warning.message),
        }
    }
    println!(
        "Exported {} picks from {} micrographs into {} files",
        result.coordinates_exported,
        result.micrographs_exported,
        result.files_created.len()
    );
    if result.has_errors() {
        let failed = result
            .warnings
            .iter()
            .filter(|w| w.severity == WarningSeverity::Error)
            .count();
        return Err(format!("{failed} micrographs could not be exported").into());
    }
    Ok(())
}

// ── demo ───────────────────────────────────────────────────────────────

fn run_demo(config: &AppConfig, micrographs: usize, picks: usize) -> CliResult<()> {
    let mut model = RandomPickerModel::new(
        micrographs,
        picks,
        config.preferences.shape,
        (4096, 4096),
        config.preferences.demo_seed,
    );
    apply_preferences(config, &mut model);
    print_table(&mut model)?;
    print_totals(&mut model)
}
