//! Football feature pipeline CLI
//!
//! Builds the per-player feature table from a directory of CSV extracts.

use clap::{Parser, Subcommand};
use football::{Config, Result};

#[derive(Parser)]
#[command(name = "football")]
#[command(about = "Per-player feature tables from football extracts", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new project with default config
    Init,
    /// List the tables found in the data directory
    Tables,
    /// Build the player feature table
    Build {
        /// Override the output CSV path
        #[arg(long)]
        output: Option<String>,
        /// Output format
        #[arg(long, default_value = "csv")]
        format: OutputFormat,
        /// Skip the age column
        #[arg(long)]
        no_age: bool,
        /// Reference date for ages (YYYY-MM-DD)
        #[arg(long)]
        reference_date: Option<String>,
        /// Fail on players whose valuations have no parseable date
        #[arg(long)]
        strict: bool,
    },
    /// Gzip every file in the data directory
    Compress {
        /// Delete the uncompressed files afterwards
        #[arg(long)]
        remove_original: bool,
    },
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use table, json, or csv.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Init => commands::init(&cli.config),
        Commands::Tables => commands::tables(&config),
        Commands::Build {
            output,
            format,
            no_age,
            reference_date,
            strict,
        } => commands::build(&config, output, format, no_age, reference_date, strict),
        Commands::Compress { remove_original } => commands::compress(&config, remove_original),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use football::data::compress::compress_all;
    use football::data::load_all;
    use football::pipeline::prepare_player_features;
    use football::{FootballError, Table};

    /// Rows shown by the table preview
    const PREVIEW_ROWS: usize = 10;

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all(&config.data.directory)?;
        if let Some(parent) = std::path::Path::new(&config.output.path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        println!("Created {}/ and output directories", config.data.directory);

        println!("\nNext steps:");
        println!(
            "  1. Copy players, appearances and player_valuations CSVs into {}/",
            config.data.directory
        );
        println!("  2. Run 'football tables' to check they load");
        println!("  3. Run 'football build' to write the feature table");

        Ok(())
    }

    pub fn tables(config: &Config) -> Result<()> {
        let tables = load_all(&config.data.directory)?;

        println!("Tables in {}", config.data.directory);
        println!("───────────────────────────────");
        if tables.is_empty() {
            println!("  (none)");
        }
        for (name, table) in &tables {
            println!(
                "  {:<24} {:>9} rows  {:>3} columns",
                name,
                table.len(),
                table.schema().len()
            );
        }

        Ok(())
    }

    pub fn build(
        config: &Config,
        output: Option<String>,
        format: OutputFormat,
        no_age: bool,
        reference_date: Option<String>,
        strict: bool,
    ) -> Result<()> {
        let mut config = config.clone();
        if let Some(date) = reference_date {
            config.pipeline.reference_date = date;
        }
        if no_age {
            config.pipeline.compute_age = false;
        }
        if strict {
            config.pipeline.strict_valuations = true;
        }

        let options = config.pipeline_options()?;
        let features = prepare_player_features(&config.data.directory, &options)?;

        match format {
            OutputFormat::Csv => {
                let path = output.unwrap_or(config.output.path);
                features.write_csv(&path)?;
                println!("Wrote {} players to {}", features.len(), path);
            }
            OutputFormat::Json => {
                let json = serde_json::Value::Array(features.to_json_rows());
                let text = serde_json::to_string_pretty(&json)
                    .map_err(|e| FootballError::Config(format!("Failed to render JSON: {}", e)))?;
                println!("{}", text);
            }
            OutputFormat::Table => print_preview(&features),
        }

        Ok(())
    }

    pub fn compress(config: &Config, remove_original: bool) -> Result<()> {
        let written = compress_all(&config.data.directory, remove_original)?;
        for path in &written {
            println!("  {}", path.display());
        }
        println!("Compressed {} files", written.len());
        Ok(())
    }

    fn print_preview(table: &Table) {
        let names = table.column_names();
        println!("{}", names.join(" | "));
        println!("{}", "─".repeat(names.iter().map(|n| n.len() + 3).sum::<usize>()));
        for row in table.rows().iter().take(PREVIEW_ROWS) {
            let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            println!("{}", cells.join(" | "));
        }
        if table.len() > PREVIEW_ROWS {
            println!("... {} more rows", table.len() - PREVIEW_ROWS);
        }
    }
}
