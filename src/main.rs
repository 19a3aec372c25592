use clap::{Parser, Subcommand};
use pixfit::pipeline::{Constraints, Quality};
use pixfit::{batch, config, output};
use std::path::PathBuf;

/// Constraint overrides shared by commands that look at images.
#[derive(clap::Args, Clone)]
struct LimitArgs {
    /// Maximum output width in pixels
    #[arg(long)]
    max_width: Option<u32>,

    /// Maximum output height in pixels
    #[arg(long)]
    max_height: Option<u32>,

    /// Output byte budget
    #[arg(long)]
    max_bytes: Option<u64>,

    /// Starting JPEG quality in (0, 1]
    #[arg(long)]
    quality: Option<f32>,
}

impl LimitArgs {
    /// CLI flags win over config values.
    fn apply(&self, mut constraints: Constraints) -> Constraints {
        if let Some(w) = self.max_width {
            constraints.max_width = w;
        }
        if let Some(h) = self.max_height {
            constraints.max_height = h;
        }
        if let Some(b) = self.max_bytes {
            constraints.max_bytes = b;
        }
        if let Some(q) = self.quality {
            constraints.initial_quality = Quality::new(q);
        }
        constraints
    }
}

#[derive(clap::Args, Clone)]
struct FitArgs {
    /// Image files or directories to process
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output directory
    #[arg(long, default_value = "fitted")]
    out: PathBuf,

    /// Disable the skip cache — force re-encoding of all images
    #[arg(long)]
    no_cache: bool,

    /// Write a JSON report of the run to this path
    #[arg(long)]
    report: Option<PathBuf>,

    #[command(flatten)]
    limits: LimitArgs,
}

#[derive(clap::Args, Clone)]
struct InspectArgs {
    /// Image files or directories to inspect
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    #[command(flatten)]
    limits: LimitArgs,
}

#[derive(Parser)]
#[command(name = "pixfit")]
#[command(about = "Fit images into pixel bounds and byte budgets")]
#[command(long_about = "\
Fit images into pixel bounds and byte budgets

Takes arbitrary images and produces outputs bounded in both pixel
dimensions and byte size, suitable for storage as inline document
fields. Transparent formats (PNG, GIF, WebP) keep their container and
their alpha channel; heavy opaque formats are converted to JPEG and the
compressor trades quality first, geometry second, until the output fits
the budget.

  pixfit fit shoots/ --out fitted --max-bytes 512000
  pixfit fit logo.png --max-width 400 --max-height 400
  pixfit inspect shoots/
  pixfit gen-config > pixfit.toml

Outputs mirror the input directory structure. Unchanged files are
skipped on re-runs via a content-addressed cache ('--no-cache' forces a
full run). Defaults come from pixfit.toml when present; flags override.")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./pixfit.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Normalize images into the output directory
    Fit(FitArgs),
    /// Report what normalization would do, without encoding anything
    Inspect(InspectArgs),
    /// Print a stock pixfit.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();
    let config = config::ToolConfig::resolve(cli.config.as_deref())?;

    match cli.command {
        Command::Fit(args) => {
            let constraints = args.limits.apply(config.constraints());
            init_thread_pool(&config.processing);

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    output::print_fit_event(&event);
                }
            });
            let outcome = batch::run(
                &args.inputs,
                &args.out,
                &constraints,
                !args.no_cache,
                Some(tx),
            )?;
            printer.join().expect("printer thread panicked");

            output::print_summary(&outcome, &args.out);
            if let Some(report) = &args.report {
                outcome.write_report(report)?;
                println!("Report: {}", report.display());
            }
            if outcome.failed_count() > 0 {
                std::process::exit(1);
            }
        }
        Command::Inspect(args) => {
            let constraints = args.limits.apply(config.constraints());
            let files = batch::collect_inputs(&args.inputs)?;
            if files.is_empty() {
                return Err(Box::new(batch::BatchError::NoInputs));
            }

            for (i, file) in files.iter().enumerate() {
                let source = file.path.display().to_string();
                let inspected = std::fs::read(&file.path)
                    .map_err(|e| e.to_string())
                    .and_then(|bytes| {
                        pixfit::pipeline::inspect(&bytes, &constraints)
                            .map_err(|e| e.to_string())
                    });
                match inspected {
                    Ok(inspection) => output::print_inspection(i + 1, &source, &inspection),
                    Err(error) => output::print_inspection_failure(i + 1, &source, &error),
                }
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores — user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
