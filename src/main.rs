mod cache;
mod cli;
mod cost_table;
mod error;
mod fmt;
mod importer;
mod models;
mod monetizer;
mod pipeline;
mod reports;
mod resolver;
mod settings;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{CacheCommands, Cli, Commands};

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "seizure_monetizer=debug"
    } else {
        "seizure_monetizer=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Report {
            input,
            filter,
            format,
        } => cli::report::run(&input, &filter, format),
        Commands::Records {
            input,
            filter,
            output,
        } => cli::records::run(&input, &filter, output.as_deref()),
        Commands::Criteria { criteria } => cli::criteria::run(criteria.as_deref()),
        Commands::Resolve {
            labels,
            criteria,
            quantity,
        } => cli::resolve::run(&labels, criteria.as_deref(), quantity.as_deref()),
        Commands::Categories { input } => cli::categories::run(&input),
        Commands::Demo { filter, format } => cli::demo::run(&filter, format),
        Commands::Init {
            source,
            criteria,
            sheets,
            no_cache,
        } => cli::init::run(cli::init::InitOptions {
            source,
            criteria,
            sheets,
            no_cache,
        }),
        Commands::Status => cli::status::run(),
        Commands::Cache { command } => match command {
            CacheCommands::Clear => cli::cache::clear(),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
