//! BCA Matrix CLI - compare customer BCA summaries
//!
//! ```bash
//! bca-matrix compare Acme-2025.03.csv Zenith-2025.03.csv   # Grid + discrepancies
//! bca-matrix compare *.csv --metric "MARGIN %" --mode per-unit
//! bca-matrix metrics *.csv                                 # Metric choices
//! bca-matrix inspect Acme-2025.03.csv                      # One summary
//! bca-matrix serve                                         # HTTP server (port 3000)
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use bca_matrix::{
    extract_summary_file, load_batch_from_paths, AggregationMode, Batch, FileDetails,
    ServerConfig,
};
use bca_matrix::api::NO_DISCREPANCIES;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "bca-matrix")]
#[command(about = "Compare customer BCA summaries and flag discrepancies", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Cumulative,
    PerUnit,
}

impl From<Mode> for AggregationMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Cumulative => AggregationMode::Cumulative,
            Mode::PerUnit => AggregationMode::PerUnit,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build the comparison matrix and discrepancy report
    Compare {
        /// Summary files named <customer name>-<date>.csv
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Metric to compare (default: Contribution Margin)
        #[arg(long)]
        metric: Option<String>,

        /// Cumulative or per-unit values
        #[arg(long, value_enum, default_value = "cumulative")]
        mode: Mode,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the metrics available for a batch
    Metrics {
        /// Summary files named <customer name>-<date>.csv
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Cumulative or per-unit values
        #[arg(long, value_enum, default_value = "cumulative")]
        mode: Mode,
    },

    /// Show what was read from a single summary file
    Inspect {
        /// Summary file
        file: PathBuf,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: BCA_MATRIX_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compare {
            files,
            metric,
            mode,
            json,
            output,
        } => cmd_compare(&files, metric, mode.into(), json, output.as_deref()),

        Commands::Metrics { files, mode } => cmd_metrics(&files, mode.into()),

        Commands::Inspect { file } => cmd_inspect(&file),

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn load(files: &[PathBuf]) -> Result<Batch, Box<dyn std::error::Error>> {
    let batch = load_batch_from_paths(files)?;
    for notice in &batch.notices {
        eprintln!("⚠️  Skipped {}: {}", notice.file_name, notice.message);
    }
    batch.require_customers()?;
    Ok(batch)
}

fn cmd_compare(
    files: &[PathBuf],
    metric: Option<String>,
    mode: AggregationMode,
    json: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let batch = load(files)?;

    let metric = metric
        .or_else(|| batch.default_metric(mode))
        .ok_or_else(|| format!("No metric available in {} view", mode))?;

    if !batch.metric_options(mode).contains(&metric) {
        eprintln!("⚠️  '{}' is not reported in {} view by any customer", metric, mode);
    }

    let analysis = batch.analyze(&metric, mode);

    let content = if json {
        serde_json::to_string_pretty(&analysis)?
    } else {
        let mut text = format!("📊 {} ({})\n\n", metric, mode);
        text.push_str(&analysis.display.to_text_table());
        text.push_str("\n\n🔎 Discrepancy report\n");
        if analysis.report.is_empty() {
            text.push_str(&format!("   {}\n", NO_DISCREPANCIES));
        } else {
            for d in &analysis.report {
                text.push_str(&format!("   {}: {}\n", d.product_line, d.customers.join(", ")));
            }
        }
        text
    };

    write_output(&content, output)
}

fn cmd_metrics(files: &[PathBuf], mode: AggregationMode) -> Result<(), Box<dyn std::error::Error>> {
    let batch = load(files)?;
    let default = batch.default_metric(mode);

    eprintln!("📋 Metrics in {} view:", mode);
    for metric in batch.metric_options(mode) {
        let marker = if default.as_ref() == Some(&metric) { " (default)" } else { "" };
        println!("  {}{}", metric, marker);
    }
    Ok(())
}

fn cmd_inspect(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let name = file
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    match FileDetails::from_file_name(name) {
        Ok(details) => {
            println!("👤 Customer: {}", details.customer);
            println!("📅 Date:     {}", details.date);
        }
        Err(e) => eprintln!("⚠️  {}", e),
    }

    let summary = extract_summary_file(file)?;

    println!("\n📦 Product lines ({}):", summary.product_lines().len());
    for pline in summary.product_lines() {
        println!("  {}", pline);
    }

    println!("\n📈 Metrics ({}):", summary.len());
    for metric in summary.metrics() {
        let per_unit = if summary.has_per_unit(metric) { "  [per unit]" } else { "" };
        println!("  {}{}", metric, per_unit);
    }
    Ok(())
}

async fn cmd_serve(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env().with_port(port);
    bca_matrix::server::start_server(config).await?;
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
