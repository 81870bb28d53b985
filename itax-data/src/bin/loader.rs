use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use itax_core::TaxRulesRepository;
use itax_data::{RulesFile, SlabLoader};
use itax_db_sqlite::SqliteRepository;

/// Load income-tax rule tables into the SQLite database.
///
/// Rule-set files (TOML) are saved first, one full financial year each. A slab
/// CSV then replaces individual regime tables; its columns are:
/// - financial_year: e.g. 2024-25
/// - regime: old or new
/// - min_income: exclusive lower bound of the slab
/// - max_income: inclusive upper bound (empty for the top slab)
/// - rate: marginal rate as a decimal (e.g. 0.05)
#[derive(Parser, Debug)]
#[command(name = "itax-rules-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// SQLite database path or URL
    #[arg(short, long, default_value = "itax.db")]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,

    /// Run seed files from the specified directory after migrations
    #[arg(short, long)]
    seeds: Option<PathBuf>,

    /// TOML rule-set files to store (repeatable)
    #[arg(short, long)]
    rules: Vec<PathBuf>,

    /// CSV file of slab tables to load into existing rule sets
    #[arg(long)]
    slabs: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if !args.migrate && args.seeds.is_none() && args.rules.is_empty() && args.slabs.is_none() {
        bail!("nothing to do: pass --migrate, --seeds, --rules or --slabs");
    }

    let repo = SqliteRepository::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;

    if args.migrate {
        println!("Running migrations...");
        repo.run_migrations()
            .await
            .context("Failed to run migrations")?;
        println!("Migrations complete.");
    }

    if let Some(seeds_dir) = &args.seeds {
        println!("Running seeds from: {}", seeds_dir.display());
        repo.run_seeds(seeds_dir)
            .await
            .with_context(|| format!("Failed to run seeds from: {}", seeds_dir.display()))?;
        println!("Seeds complete.");
    }

    for path in &args.rules {
        let rules = RulesFile::load(path)
            .with_context(|| format!("Failed to load rule set: {}", path.display()))?;
        repo.save_rule_set(&rules)
            .await
            .with_context(|| format!("Failed to store rule set for FY {}", rules.financial_year))?;
        println!("Stored rule set for FY {} from {}", rules.financial_year, path.display());
    }

    if let Some(path) = &args.slabs {
        println!("Loading slab tables from: {}", path.display());

        let file =
            File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;

        let records = SlabLoader::parse(file)
            .with_context(|| format!("Failed to parse CSV: {}", path.display()))?;

        println!("Parsed {} records from CSV", records.len());

        let loaded = SlabLoader::load(&repo, &records)
            .await
            .context("Failed to load slab tables into database")?;

        println!("Successfully loaded {} slabs into the database.", loaded);
    }

    Ok(())
}
