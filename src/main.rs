use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

mod aggregate;
mod config;
mod dashboard;
mod error;
mod explore;
mod loader;
mod models;
mod report;
mod sla;

use config::DashboardConfig;
use dashboard::Dashboard;
use explore::ExploreCommand;
use models::{FilterState, Product};
use sla::SyntheticSla;

#[derive(Parser)]
#[command(name = "support-dashboard")]
#[command(about = "Account health and support ticket dashboard", long_about = None)]
struct Cli {
    /// Administrative export with one row per account
    #[arg(long, env = "DASHBOARD_ADMIN_CSV", default_value = "admin.csv", global = true)]
    admin: PathBuf,
    /// Support export with one row per ticket
    #[arg(long, env = "DASHBOARD_SUPPORT_CSV", default_value = "suporte.csv", global = true)]
    support: PathBuf,
    /// JSON file overriding column names, focus agents and SLA labels
    #[arg(long, env = "DASHBOARD_CONFIG", global = true)]
    config: Option<PathBuf>,
    /// Seed for simulated SLA outcomes when the support export has none
    #[arg(long, global = true)]
    sla_seed: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the dashboard for one filter selection
    Snapshot {
        #[arg(long, value_parser = parse_product)]
        product: Option<Product>,
        #[arg(long)]
        cohort: Option<String>,
        #[arg(long, value_enum, default_value_t = Format::Markdown)]
        format: Format,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List the products and cohorts available as filters
    Filters,
    /// Change filters interactively and re-render on every change
    Explore,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Markdown,
    Json,
}

fn parse_product(value: &str) -> Result<Product, String> {
    Product::parse(value)
        .ok_or_else(|| format!("expected one of MBA, CPA, CEA, CFP, OTHER; got '{value}'"))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => DashboardConfig::load(path)?,
        None => DashboardConfig::default(),
    };
    if cli.sla_seed.is_some() {
        config.sla_seed = cli.sla_seed;
    }

    let mut sla_fallback = match config.sla_seed {
        Some(seed) => SyntheticSla::new(seed),
        None => SyntheticSla::from_entropy(),
    };
    log::debug!("synthetic SLA seed {}", sla_fallback.seed());

    let dashboard = loader::load(&cli.admin, &cli.support, &config, &mut sla_fallback)
        .context("failed to load dashboard data")?;
    log::info!(
        "dashboard ready: {} accounts, {} tickets",
        dashboard.accounts().len(),
        dashboard.tickets().len()
    );

    match cli.command {
        Commands::Snapshot {
            product,
            cohort,
            format,
            out,
        } => {
            let filters = FilterState { product, cohort };
            let snapshot = dashboard.snapshot(&filters);
            let rendered = match format {
                Format::Markdown => report::build_report(&filters, &snapshot),
                Format::Json => report::build_json(&snapshot)?,
            };
            match out {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Snapshot written to {}.", path.display());
                }
                None => print!("{rendered}"),
            }
        }
        Commands::Filters => {
            print!("{}", report::build_filter_listing(&dashboard.filter_options()));
        }
        Commands::Explore => explore_loop(&dashboard)?,
    }

    Ok(())
}

fn explore_loop(dashboard: &Dashboard) -> anyhow::Result<()> {
    let mut filters = FilterState::default();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    println!("{}", explore::HELP);
    print!("{}", report::build_report(&filters, &dashboard.snapshot(&filters)));

    loop {
        print!("> ");
        stdout.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let command = match explore::parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        match command {
            ExploreCommand::Quit => break,
            ExploreCommand::Help => println!("{}", explore::HELP),
            ExploreCommand::Show => {
                print!("{}", report::build_report(&filters, &dashboard.snapshot(&filters)));
            }
            other => {
                if explore::apply(&mut filters, &other) {
                    log::debug!("filters changed to {}", filters.describe());
                    print!("{}", report::build_report(&filters, &dashboard.snapshot(&filters)));
                } else {
                    println!("Filters unchanged ({}).", filters.describe());
                }
            }
        }
    }

    Ok(())
}
