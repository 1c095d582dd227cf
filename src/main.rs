use clap::{Parser, Subcommand};
use print_exporter::archive::ZipArchiver;
use print_exporter::config::{self, ExportConfig, TargetOverride};
use print_exporter::export::{self, ExportError, ExportRequest, Exporter};
use print_exporter::imaging::{self, EncodeSettings, Quality, RustBackend, SourceImage};
use print_exporter::presets::{self, Orientation};
use print_exporter::types::{LayoutMode, OutputFormat, Rgb};
use print_exporter::{naming, output};
use std::path::{Path, PathBuf};

/// Which posters to make, and how.
#[derive(clap::Args, Clone)]
struct SelectionArgs {
    /// Source photo (JPEG or PNG)
    image: PathBuf,

    /// Ratio id to export (repeatable; default: all). See `ratios`.
    #[arg(long = "ratio", value_name = "ID")]
    ratios: Vec<String>,

    /// Poster orientation (default: the photo's own)
    #[arg(long)]
    orientation: Option<Orientation>,

    /// Layout for every ratio: crop, fit or mat
    #[arg(long)]
    mode: Option<LayoutMode>,

    /// Mat border as a percentage of the short edge
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=20))]
    mat_percent: Option<u32>,

    /// Background for fit and mat, as #rrggbb
    #[arg(long)]
    background: Option<Rgb>,

    /// Output format (repeatable): png, jpeg
    #[arg(long = "format", value_name = "FORMAT")]
    formats: Vec<OutputFormat>,

    /// Export name used in every filename (default: the photo's filename)
    #[arg(long)]
    name: Option<String>,

    /// Config file (default: ./print-exporter.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser)]
#[command(name = "print-exporter")]
#[command(about = "Turn one photo into a ZIP of print-ready posters")]
#[command(long_about = "\
Turn one photo into a ZIP of print-ready posters

Each selected ratio is rendered at its full 300 DPI print size and stamped
with 300 DPI metadata. Sizes the photo is too small for are skipped rather
than upscaled.

Layouts:

  crop   fill the poster, trimming the edges of the photo
  fit    show the whole photo on a solid background
  mat    like fit, inside a uniform border

Examples:

  print-exporter export sunset.jpg
  print-exporter export sunset.jpg --ratio 4x5 --ratio 2x3 --mode mat --background '#ffffff'
  print-exporter plan sunset.jpg --format png --format jpeg

Run 'print-exporter gen-config' to generate a documented print-exporter.toml.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the selected posters and write {name}_posters.zip
    Export {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Directory the ZIP is written to
        #[arg(long, default_value = ".")]
        output: PathBuf,
    },
    /// Show what would be exported, without rendering
    Plan {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the available poster ratios
    Ratios,
    /// Print a stock print-exporter.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Export { selection, output: out_dir } => {
            let config = config::load_config(selection.config.as_deref(), Path::new("."))?;
            init_thread_pool(&config.processing);
            let source = load_source(&selection.image)?;
            let request = build_request(&selection, &config, &source)?;

            let settings = EncodeSettings {
                jpeg_quality: Quality::new(config.export.jpeg_quality),
                dpi: config.export.dpi,
            };
            let mut exporter = Exporter::new(
                RustBackend::new(),
                ZipArchiver::new(config.archive.compression_level),
                settings,
            );

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_export_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = exporter.run(&source, &request, Some(tx));
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;

            let outcome = result.inspect_err(print_skipped)?;
            let path = export::save_archive(&out_dir, &outcome.archive)?;
            output::print_export_outcome(&outcome, &path);
        }
        Command::Plan { selection, json } => {
            let config = config::load_config(selection.config.as_deref(), Path::new("."))?;
            let source = load_source(&selection.image)?;
            let request = build_request(&selection, &config, &source)?;
            let plan = export::plan_export(&source, &request).inspect_err(print_skipped)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                output::print_plan(&plan);
            }
        }
        Command::Ratios => {
            output::print_ratios();
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Decode the source and describe it.
fn load_source(path: &Path) -> Result<SourceImage, imaging::BackendError> {
    let source = imaging::open_source(path)?;
    output::print_source_info(path, source.size());
    Ok(source)
}

/// Resolve CLI flags and config into an export request.
///
/// Precedence per target: CLI flag, then `[targets.<id>]`, then `[defaults]`.
fn build_request(
    selection: &SelectionArgs,
    config: &ExportConfig,
    source: &SourceImage,
) -> Result<ExportRequest, Box<dyn std::error::Error>> {
    let detected = Orientation::of(source.size());
    let orientation = selection.orientation.unwrap_or(detected);
    if let Some(warning) = output::format_orientation_warning(detected, orientation) {
        println!("Warning: {warning}");
    }

    let cli_override = TargetOverride {
        mode: selection.mode,
        mat_percent: selection.mat_percent,
        background: selection.background,
    };
    let targets = presets::select_groups(&selection.ratios)?
        .into_iter()
        .map(|group| {
            let settings = cli_override.apply(config.settings_for(group.id));
            group.target(orientation, &settings)
        })
        .collect();

    let formats = if selection.formats.is_empty() {
        config.export.formats.clone()
    } else {
        selection.formats.clone()
    };
    let export_name = selection
        .name
        .clone()
        .unwrap_or_else(|| naming::export_name_from_path(&selection.image));

    Ok(ExportRequest {
        targets,
        formats,
        export_name,
    })
}

/// List the skipped sizes when nothing could be exported.
fn print_skipped(err: &ExportError) {
    if let ExportError::NothingAchievable { skipped } = err {
        for record in skipped {
            println!("Skipped: {}", output::format_skipped(record));
        }
    }
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
