use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use population_amalgamator::{amalgamate, plan, storage, Config, DistanceMatrix, FrameDataset};

#[derive(Parser, Debug)]
#[clap(
    name = "population-amalgamator",
    about = "Amalgamate groups whose pairwise distance is within a threshold"
)]
struct Cli {
    /// Path to the labeled distance matrix (CSV)
    #[clap(long)]
    matrix: PathBuf,

    /// Dataset to recode (CSV or Parquet); without it only the table is produced
    #[clap(long)]
    dataset: Option<PathBuf>,

    /// Column of the dataset holding group labels
    #[clap(long, default_value = "pop")]
    group_column: String,

    /// Label given to entities that have no group
    #[clap(long)]
    default_group: Option<String>,

    /// Maximum distance at which groups are merged
    #[clap(long)]
    threshold: Option<f64>,

    /// Where to write the reassignment table
    #[clap(long)]
    table: Option<PathBuf>,

    /// Tag used in generated group names
    #[clap(long)]
    iteration: Option<String>,

    /// Where to write the recoded dataset
    #[clap(long)]
    output: Option<PathBuf>,

    /// Where to write a JSON summary of the run
    #[clap(long)]
    summary: Option<PathBuf>,

    /// JSON configuration file; command-line flags take precedence
    #[clap(long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[clap(long, short)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(iteration) = &self.iteration {
            config.iteration = iteration.clone();
        }
        if let Some(table) = &self.table {
            config.table_path = Some(table.clone());
        }

        Ok(config)
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Cli::parse();

    // Configure logging
    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    let config = args.config()?;

    log::info!("Starting amalgamation at threshold {}", config.threshold);

    // 1. Load distances
    let matrix = DistanceMatrix::load(&args.matrix)
        .with_context(|| format!("loading distance matrix {}", args.matrix.display()))?;

    let Some(dataset_path) = &args.dataset else {
        // 2. Table only
        let amalgamation = plan(&matrix, &config)?;
        log::info!("{}", amalgamation.outcome);

        if amalgamation.amalgamated() {
            storage::write_table(&amalgamation.table, &config.table_path())?;
        }
        return Ok(());
    };

    // 2. Load the dataset
    let mut dataset = FrameDataset::load(dataset_path, &args.group_column)
        .with_context(|| format!("loading dataset {}", dataset_path.display()))?;
    if let Some(label) = &args.default_group {
        dataset = dataset.with_default_group(label)?;
    }

    // 3. Amalgamate and recode
    let report = amalgamate(&dataset, &matrix, &config)?;

    // 4. Save results
    if let Some(output) = &args.output {
        report.dataset.save(output)?;
    }
    if let Some(summary) = &args.summary {
        storage::save_summary(&report.summary(), summary)?;
    }

    match &report.table_path {
        Some(path) => log::info!("Reassignment table saved to {}", path.display()),
        None => log::info!("No reassignment table written"),
    }

    Ok(())
}
