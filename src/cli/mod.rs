pub mod cache;
pub mod categories;
pub mod criteria;
pub mod demo;
pub mod init;
pub mod records;
pub mod report;
pub mod resolve;
pub mod status;

use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::cache::{default_cache_dir, DatasetCache};
use crate::error::{MonetizerError, Result};
use crate::importer::{parse_date, DataSource};
use crate::monetizer::MonetizedRecord;
use crate::pipeline::{self, BaseTable, LoadOptions};
use crate::reports::{DateWindow, Filter};
use crate::settings::{load_settings, Settings};

pub(crate) fn parse_date_arg(raw: &str) -> Result<chrono::NaiveDate> {
    parse_date(raw).ok_or_else(|| MonetizerError::InvalidDate(raw.to_string()))
}

pub(crate) fn data_source(arg: Option<&str>, settings: &Settings) -> Result<DataSource> {
    arg.map(str::to_string)
        .or_else(|| settings.source.clone())
        .map(|p| DataSource::File(PathBuf::from(p)))
        .ok_or(MonetizerError::NoSource)
}

pub(crate) fn criteria_source(arg: Option<&str>, settings: &Settings) -> Option<DataSource> {
    arg.map(str::to_string)
        .or_else(|| settings.criteria.clone())
        .map(|p| DataSource::File(PathBuf::from(p)))
}

/// Build the cost table first, then load and monetize the dataset.
pub(crate) fn load_base(input: &InputArgs) -> Result<BaseTable> {
    let settings = load_settings();
    let source = data_source(input.source.as_deref(), &settings)?;
    let criteria = criteria_source(input.criteria.as_deref(), &settings);
    let table = pipeline::cost_table(criteria.as_ref())?;

    let cache = DatasetCache::new(default_cache_dir());
    let use_cache = settings.cache_enabled && !input.no_cache;
    let options = LoadOptions {
        sheet_hints: settings.preferred_sheets.clone(),
        cache: use_cache.then_some(&cache),
    };
    let dataset = pipeline::load(&source, &options)?;
    Ok(pipeline::monetize_dataset(dataset, &table))
}

#[derive(Parser)]
#[command(
    name = "seizure-monetizer",
    version,
    about = "Monetize and report police seizure records against a unit-cost table."
)]
pub struct Cli {
    /// Log debug detail to stderr (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// Seizure dataset (CSV or XLSX). Defaults to the configured source.
    #[arg(long)]
    pub source: Option<String>,
    /// Criteria table (category, unit, unit cost) replacing the built-in costs
    #[arg(long)]
    pub criteria: Option<String>,
    /// Parse the source even if a cached copy exists
    #[arg(long = "no-cache")]
    pub no_cache: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Start date: YYYY-MM-DD or DD/MM/YYYY
    #[arg(long = "from")]
    pub from_date: Option<String>,
    /// End date (inclusive): YYYY-MM-DD or DD/MM/YYYY
    #[arg(long = "to")]
    pub to_date: Option<String>,
    /// Keep only this raw category (repeatable)
    #[arg(long = "category")]
    pub categories: Vec<String>,
}

impl FilterArgs {
    /// Filter for these arguments. Without dates the window spans every
    /// record; without categories every category is kept.
    pub fn to_filter(&self, records: &[MonetizedRecord]) -> Result<Filter> {
        let window = match (&self.from_date, &self.to_date) {
            (Some(from), Some(to)) => DateWindow::from_dates(parse_date_arg(from)?, parse_date_arg(to)?)?,
            (Some(_), None) => {
                return Err(MonetizerError::Other(
                    "--from requires --to (both date boundaries must be specified)".to_string(),
                ));
            }
            (None, Some(_)) => {
                return Err(MonetizerError::Other(
                    "--to requires --from (both date boundaries must be specified)".to_string(),
                ));
            }
            (None, None) => match DateWindow::covering(records) {
                Some(window) => window,
                None => {
                    let today = chrono::Local::now().date_naive();
                    DateWindow::from_dates(today, today)?
                }
            },
        };
        let categories = (!self.categories.is_empty())
            .then(|| self.categories.iter().cloned().collect::<BTreeSet<_>>());
        Ok(Filter::new(window, categories))
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Monetized totals per category with a previous-period comparison.
    Report {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        filter: FilterArgs,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Export the filtered, monetized records as CSV.
    Records {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        filter: FilterArgs,
        /// Output file (default: stdout)
        #[arg(long)]
        output: Option<String>,
    },
    /// Show the active unit-cost table.
    Criteria {
        /// Criteria table replacing the built-in costs
        #[arg(long)]
        criteria: Option<String>,
    },
    /// Show how raw category labels map onto the cost table.
    Resolve {
        /// Raw labels to resolve
        #[arg(required = true)]
        labels: Vec<String>,
        /// Criteria table replacing the built-in costs
        #[arg(long)]
        criteria: Option<String>,
        /// Also value this quantity of each label
        #[arg(long)]
        quantity: Option<String>,
    },
    /// List the distinct categories in the dataset and how they resolve.
    Categories {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Run a report over the bundled sample dataset.
    Demo {
        #[command(flatten)]
        filter: FilterArgs,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Save default inputs so later commands can omit them.
    Init {
        /// Default seizure dataset
        #[arg(long)]
        source: Option<String>,
        /// Default criteria table
        #[arg(long)]
        criteria: Option<String>,
        /// Worksheet name hint for workbook sources (repeatable)
        #[arg(long = "sheet")]
        sheets: Vec<String>,
        /// Disable the dataset cache
        #[arg(long = "no-cache")]
        no_cache: bool,
    },
    /// Show settings, inputs and cache state.
    Status,
    /// Manage the dataset cache.
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Remove every cached dataset.
    Clear,
}
