use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use retrofit_advisor::config::{Config, ConfigOverrides};
use retrofit_advisor::dwelling::DwellingState;
use retrofit_advisor::engine::run_audit;
use retrofit_advisor::output::csv::{npv_only_to_csv, package_to_csv};
use retrofit_advisor::output::json::render_json;
use retrofit_advisor::output::table::{
    render_catalog_table, render_npv_only_table, render_package_table,
};
use retrofit_advisor::types::AuditReport;
use tracing::info;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(
    name = "retrofit-advisor",
    about = "Retrofit measure selection for weatherization audits"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    /// Override the program's minimum acceptable SIR.
    #[arg(long)]
    min_sir: Option<f64>,
    /// Override the real discount rate.
    #[arg(long)]
    discount_rate: Option<f64>,
    /// Skip utility-bill calibration even when history is present.
    #[arg(long)]
    no_billing_adjustment: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Evaluate a dwelling and print the recommended retrofit package.
    Audit {
        /// Dwelling description (JSON).
        #[arg(short, long)]
        input: PathBuf,
        /// Also print measures that ranked NPV-only.
        #[arg(long)]
        npv_only: bool,
    },
    /// List the measure catalog.
    Measures,
    /// Write a sample dwelling description to get started.
    Template {
        #[arg(long, default_value = "dwelling.json")]
        path: PathBuf,
    },
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    config.apply_overrides(ConfigOverrides {
        min_sir: cli.min_sir,
        real_discount_rate: cli.discount_rate,
        disable_billing: cli.no_billing_adjustment,
    });

    match &cli.command {
        Commands::Audit { input, npv_only } => {
            let dwelling = load_dwelling(input)?;
            info!(dwelling = dwelling.label, "running audit");
            let report = run_audit(&dwelling, &config)?;
            print_report(&report, cli.output, *npv_only)?;
        }
        Commands::Measures => match cli.output {
            OutputFormat::Table => println!("{}", render_catalog_table()),
            OutputFormat::Json | OutputFormat::Csv => {
                let slugs: Vec<&str> = retrofit_advisor::catalog::MeasureKind::ALL
                    .iter()
                    .map(|k| k.as_slug())
                    .collect();
                println!("{}", render_json(&slugs)?);
            }
        },
        Commands::Template { path } => {
            let sample = DwellingState::sample();
            fs::write(path, serde_json::to_string_pretty(&sample)?)
                .with_context(|| format!("failed writing template: {}", path.display()))?;
            println!("Wrote sample dwelling to {}", path.display());
        }
        Commands::Config { init, show } => {
            if *init {
                Config::write_template(&config_path)?;
                println!("Wrote config template to {}", config_path.display());
            }
            if *show || !*init {
                println!("{}", render_json(&config)?);
            }
        }
    }

    Ok(())
}

fn load_dwelling(path: &Path) -> Result<DwellingState> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed reading dwelling description: {}", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("invalid dwelling description: {}", path.display()))
}

fn print_report(report: &AuditReport, output: OutputFormat, npv_only: bool) -> Result<()> {
    match output {
        OutputFormat::Table => {
            println!("{}", render_package_table(report));
            if npv_only && !report.npv_only.is_empty() {
                println!("\nNPV-only measures:");
                println!("{}", render_npv_only_table(&report.npv_only));
            }
        }
        OutputFormat::Json => println!("{}", render_json(report)?),
        OutputFormat::Csv => {
            print!("{}", package_to_csv(report)?);
            if npv_only && !report.npv_only.is_empty() {
                print!("{}", npv_only_to_csv(&report.npv_only)?);
            }
        }
    }
    Ok(())
}
