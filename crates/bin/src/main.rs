//! Abode CLI binary.
//!
//! Fits the per-segment housing models and writes predictions.

mod config;

use abode::{Market, MarketModel, Observations, SegmentKey};
use abode_model::FitEvent;
use abode_output::{ExportFormat, Exporter, FitSummary, PredictionRecord, SegmentFitRecord};
use clap::{Parser, Subcommand, ValueEnum};
use config::{Overrides, RunConfig};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "abode")]
#[command(about = "Abode: per-segment housing price and rent models", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the market segments
    Segments {
        /// Output format
        #[arg(long, value_enum, default_value_t = SegmentFormat::Text)]
        format: SegmentFormat,
    },

    /// Fit every segment and print a summary
    Fit {
        #[command(flatten)]
        run: RunArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = SummaryFormat::Text)]
        format: SummaryFormat,

        /// Also write per-segment fit records as CSV
        #[arg(long)]
        fits_output: Option<PathBuf>,
    },

    /// Fit every segment, then predict on raw feature rows
    Predict {
        #[command(flatten)]
        run: RunArgs,

        /// CSV of raw features with a `Date` column (default: training features)
        #[arg(long)]
        features: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = PredictionFormat::Csv)]
        format: PredictionFormat,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// Market to model
    #[arg(long, value_enum, default_value_t = MarketArg::Price)]
    market: MarketArg,

    /// Directory holding the dataset files
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// State whose counties are modelled
    #[arg(long)]
    state: Option<String>,

    /// Seed for the cross-validation shuffle
    #[arg(long)]
    seed: Option<u64>,

    /// Abort on the first segment that cannot be fitted
    #[arg(long)]
    strict: bool,

    /// Hide the progress bar
    #[arg(long)]
    quiet: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum MarketArg {
    Price,
    Rent,
}

impl From<MarketArg> for Market {
    fn from(arg: MarketArg) -> Self {
        match arg {
            MarketArg::Price => Self::Price,
            MarketArg::Rent => Self::Rent,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SegmentFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum SummaryFormat {
    Text,
    Json,
    Markdown,
}

#[derive(Clone, Copy, ValueEnum)]
enum PredictionFormat {
    Csv,
    Json,
}

impl From<PredictionFormat> for ExportFormat {
    fn from(format: PredictionFormat) -> Self {
        match format {
            PredictionFormat::Csv => Self::Csv,
            PredictionFormat::Json => Self::PrettyJson,
        }
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "abode=info".into()),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Segments { format } => list_segments(format)?,
        Commands::Fit {
            run,
            format,
            fits_output,
        } => {
            let (model, summary) = fit_market(&run)?;
            print_summary(&summary, format)?;
            if let Some(path) = fits_output {
                SegmentFitRecord::from_models(model.models())
                    .export_to_file(&path, ExportFormat::Csv)?;
                println!("Fit records written to {}", path.display());
            }
        }
        Commands::Predict {
            run,
            features,
            output,
            format,
        } => {
            let (model, summary) = fit_market(&run)?;
            eprint!("{summary}");
            let raw = match features {
                Some(path) => Observations::read_csv(&path, "Date")?,
                None => model.raw_features().clone(),
            };
            let predictions = model.predict(&raw)?;
            let records = PredictionRecord::from_predictions(&predictions);
            write_output(records, output.as_deref(), format.into())?;
        }
    }

    Ok(())
}

fn list_segments(format: SegmentFormat) -> Result<(), Box<dyn std::error::Error>> {
    let keys = SegmentKey::all();
    match format {
        SegmentFormat::Text => {
            println!("{:<10} {:<14} {:<10}", "Bedrooms", "Density Code", "Density");
            println!("{}", "-".repeat(36));
            for key in keys {
                println!(
                    "{:<10} {:<14} {:<10}",
                    key.bedrooms(),
                    key.density_code(),
                    key.density().label()
                );
            }
        }
        SegmentFormat::Json => {
            let segments: Vec<_> = keys
                .iter()
                .map(|key| {
                    json!({
                        "bedrooms": key.bedrooms(),
                        "density_code": key.density_code(),
                        "density": key.density().label(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&segments)?);
        }
    }
    Ok(())
}

fn fit_market(args: &RunArgs) -> Result<(MarketModel, FitSummary), Box<dyn std::error::Error>> {
    let config = RunConfig::load(args.config.as_deref())?.with_overrides(Overrides {
        data_dir: args.data_dir.clone(),
        state: args.state.clone(),
        seed: args.seed,
        strict: args.strict,
    });
    let market = Market::from(args.market);

    let mut model = MarketModel::load(market, &config.paths(), &config.loader, config.model)?;

    let pb = if args.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(abode_data::SEGMENT_COUNT as u64)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Fitting {market} segments..."));

    let fitted = model.fit_all_with_progress(|key, event| {
        match event {
            FitEvent::Fitted(_) => pb.set_message(format!("fitted {key}")),
            FitEvent::Failed(_) => pb.set_message(format!("failed {key}")),
        }
        pb.inc(1);
    });
    let report = match fitted {
        Ok(report) => {
            pb.finish_with_message(format!(
                "Fitted {} of {} segments",
                report.fitted.len(),
                abode_data::SEGMENT_COUNT
            ));
            report
        }
        Err(e) => {
            pb.finish_with_message("Failed!");
            return Err(e.into());
        }
    };

    let summary = FitSummary::from_fit(market.name(), market.target(), model.models(), &report);
    if !report.is_complete() {
        tracing::warn!(
            failed = report.failures.len(),
            "some segments could not be fitted; predictions need every segment"
        );
    }
    Ok((model, summary))
}

fn print_summary(summary: &FitSummary, format: SummaryFormat) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        SummaryFormat::Text => print!("{}", summary.to_ascii_table()),
        SummaryFormat::Markdown => print!("{}", summary.to_markdown()),
        SummaryFormat::Json => println!("{}", serde_json::to_string_pretty(summary)?),
    }
    Ok(())
}

fn write_output(
    records: Vec<PredictionRecord>,
    output: Option<&Path>,
    format: ExportFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(path) => {
            records.export_to_file(path, format)?;
            eprintln!("{} predictions written to {}", records.len(), path.display());
        }
        None => print!("{}", records.export_to_string(format)?),
    }
    Ok(())
}
