//! Command-line definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use itax_core::{DeductionDetails, FinancialYear, IncomeDetails, Regime};
use rust_decimal::Decimal;

use crate::config::Overrides;
use crate::utils::{ParseAmountError, parse_amount};

/// Indian income tax calculator.
///
/// Computes liability under the old and new regimes from the rule tables
/// stored for a financial year.
#[derive(Debug, Parser)]
#[command(name = "itax", version, about)]
pub struct Cli {
    /// Config file (defaults to ./itax.toml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Rules repository backend (`memory` or `sqlite`).
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Connection string for the backend.
    /// For SQLite this is a file path (e.g. `itax.db`) or `:memory:`.
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Financial year, e.g. 2024-25.
    #[arg(long, global = true, value_parser = FinancialYear::parse)]
    pub year: Option<FinancialYear>,

    /// More log output (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// No log output on the terminal.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Append log output to this file.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        let log_level = match self.verbose {
            0 => None,
            1 => Some("debug".to_string()),
            _ => Some("trace".to_string()),
        };
        Overrides {
            backend: self.backend.clone(),
            connection_string: self.db.clone(),
            financial_year: self.year,
            log_level,
            log_file: self.log_file.clone(),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Tax liability under one regime.
    Calculate {
        /// Regime to use (defaults to the input file's, else old).
        #[arg(long, value_parser = parse_regime)]
        regime: Option<Regime>,

        #[command(flatten)]
        amounts: AmountArgs,

        #[arg(long)]
        json: bool,
    },

    /// Liability under both regimes and the cheaper one.
    Compare {
        #[command(flatten)]
        amounts: AmountArgs,

        #[arg(long)]
        json: bool,
    },

    /// Rule tables in force for the year.
    Rules {
        #[arg(long, value_enum, default_value_t = RulesFormat::Text)]
        format: RulesFormat,
    },

    /// Financial years stored in the repository.
    Years,

    /// Tax saved by using the rest of the Section 80C limit.
    #[command(name = "plan-80c")]
    Plan80c {
        #[command(flatten)]
        amounts: AmountArgs,

        #[arg(long)]
        json: bool,
    },

    /// Home-loan EMI and yearly interest schedule.
    Emi {
        /// Loan amount.
        #[arg(long, value_parser = amount_arg)]
        principal: Decimal,

        /// Annual interest rate in percent, e.g. 8.5.
        #[arg(long)]
        rate: Decimal,

        /// Tenure in years.
        #[arg(long)]
        years: u32,

        #[arg(long)]
        json: bool,
    },

    /// Growth of a lump sum plus a monthly contribution.
    Invest {
        /// Amount invested up front.
        #[arg(long, value_parser = amount_arg, default_value = "0")]
        initial: Decimal,

        /// Amount added at the end of every month.
        #[arg(long, value_parser = amount_arg, default_value = "0")]
        monthly: Decimal,

        /// Expected annual return in percent, e.g. 12.
        #[arg(long)]
        rate: Decimal,

        /// Investment horizon in years.
        #[arg(long)]
        years: u32,

        #[arg(long)]
        json: bool,
    },

    /// Monthly saving needed for an education goal.
    Goal {
        /// Cost of the goal in today's money.
        #[arg(long, value_parser = amount_arg)]
        target: Decimal,

        /// Years until the money is needed.
        #[arg(long)]
        years: u32,

        /// Expected annual inflation in percent.
        #[arg(long, default_value = "6")]
        inflation: Decimal,

        /// Expected annual return in percent.
        #[arg(long)]
        rate: Decimal,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RulesFormat {
    Text,
    Json,
    Toml,
}

/// Where the amounts come from: an extraction JSON file, flags, or both.
/// Flags override the matching value from the file.
#[derive(Debug, Clone, Default, Args)]
pub struct AmountArgs {
    /// Extraction output JSON (bare object, response envelope or fenced).
    #[arg(long)]
    pub input: Option<PathBuf>,

    #[arg(long, value_parser = amount_arg)]
    pub salary: Option<Decimal>,

    #[arg(long, value_parser = amount_arg)]
    pub business: Option<Decimal>,

    #[arg(long, value_parser = amount_arg)]
    pub capital_gains: Option<Decimal>,

    #[arg(long, value_parser = amount_arg)]
    pub house_property: Option<Decimal>,

    #[arg(long, value_parser = amount_arg)]
    pub other_income: Option<Decimal>,

    #[arg(long, value_parser = amount_arg)]
    pub section_80c: Option<Decimal>,

    #[arg(long, value_parser = amount_arg)]
    pub section_80d: Option<Decimal>,

    #[arg(long, value_parser = amount_arg)]
    pub hra: Option<Decimal>,

    #[arg(long, value_parser = amount_arg)]
    pub lta: Option<Decimal>,

    #[arg(long, value_parser = amount_arg)]
    pub nps: Option<Decimal>,

    #[arg(long, value_parser = amount_arg)]
    pub home_loan_interest: Option<Decimal>,

    #[arg(long, value_parser = amount_arg)]
    pub other_deductions: Option<Decimal>,
}

impl AmountArgs {
    /// Overwrites the fields given on the command line.
    pub fn apply(
        &self,
        income: &mut IncomeDetails,
        deductions: &mut DeductionDetails,
    ) {
        let income_fields = [
            (self.salary, &mut income.salary_income),
            (self.business, &mut income.business_income),
            (self.capital_gains, &mut income.capital_gains),
            (self.house_property, &mut income.house_property_income),
            (self.other_income, &mut income.other_income),
        ];
        let deduction_fields = [
            (self.section_80c, &mut deductions.section_80c),
            (self.section_80d, &mut deductions.section_80d),
            (self.hra, &mut deductions.hra),
            (self.lta, &mut deductions.lta),
            (self.nps, &mut deductions.nps),
            (self.home_loan_interest, &mut deductions.home_loan_interest),
            (self.other_deductions, &mut deductions.other_deductions),
        ];
        for (flag, field) in income_fields.into_iter().chain(deduction_fields) {
            if let Some(value) = flag {
                *field = value;
            }
        }
    }
}

fn amount_arg(s: &str) -> Result<Decimal, ParseAmountError> {
    parse_amount(s)
}

fn parse_regime(s: &str) -> Result<Regime, String> {
    Regime::parse(s).ok_or_else(|| format!("'{s}' is not a regime (expected old or new)"))
}
