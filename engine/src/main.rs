//! Harmonizer CLI - normalize provider spreadsheets into one dataset
//!
//! # Main Commands
//!
//! ```bash
//! harmonizer process-file march.xlsx ACME          # One file, one provider
//! harmonizer process-directory ./inbox mapping.json # Every file matched by pattern
//! harmonizer providers list                         # Schemas in the providers dir
//! harmonizer example-schema "New Provider"          # Template schema
//! ```
//!
//! `--providers` (or `HARMONIZER_PROVIDERS_DIR`) selects the schema directory.

use clap::{Parser, Subcommand};
use harmonizer::{
    example_schema, logging, Harmonizer, HarmonizerConfig, ProviderCatalog, ProviderMapping,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "harmonizer")]
#[command(about = "Normalize provider spreadsheet and CSV exports into a canonical dataset", long_about = None)]
struct Cli {
    /// Directory of provider schemas (overrides HARMONIZER_PROVIDERS_DIR)
    #[arg(long, global = true)]
    providers: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one file with a provider schema
    ProcessFile {
        /// Input spreadsheet or CSV file
        file: PathBuf,

        /// Provider name (case-insensitive)
        provider: String,

        /// Output file for the dataset as JSON records (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output file for the processing log
        #[arg(long)]
        log_output: Option<PathBuf>,
    },

    /// Process every compatible file in a directory
    ProcessDirectory {
        /// Directory to scan recursively
        dir: PathBuf,

        /// JSON object mapping file-name patterns to provider names
        mapping: PathBuf,

        /// Output file for the master dataset as JSON records (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output file for the processing log
        #[arg(long)]
        log_output: Option<PathBuf>,
    },

    /// Inspect provider schemas
    Providers {
        #[command(subcommand)]
        action: ProviderAction,
    },

    /// Print a template provider schema
    ExampleSchema {
        /// Provider name for the template
        name: String,
    },
}

#[derive(Subcommand)]
enum ProviderAction {
    /// List all provider schemas
    List,

    /// Show one provider schema
    Show {
        /// Provider name
        name: String,
    },
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();
    logging::init();

    let cli = Cli::parse();

    let mut config = HarmonizerConfig::from_env();
    if let Some(dir) = cli.providers {
        config = config.with_providers_dir(dir);
    }

    let result = match cli.command {
        Commands::ProcessFile {
            file,
            provider,
            output,
            log_output,
        } => cmd_process_file(&config, &file, &provider, output.as_deref(), log_output.as_deref()),

        Commands::ProcessDirectory {
            dir,
            mapping,
            output,
            log_output,
        } => cmd_process_directory(&config, &dir, &mapping, output.as_deref(), log_output.as_deref()),

        Commands::Providers { action } => cmd_providers(&config, action),

        Commands::ExampleSchema { name } => cmd_example_schema(&name),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_process_file(
    config: &HarmonizerConfig,
    file: &Path,
    provider: &str,
    output: Option<&Path>,
    log_output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {} ({})", file.display(), provider);

    let mut harmonizer = Harmonizer::from_config(config);
    let record = harmonizer.process_file(file, provider)?;
    eprintln!("✅ {} rows", record.row_count);

    write_results(&harmonizer, output, log_output)
}

fn cmd_process_directory(
    config: &HarmonizerConfig,
    dir: &Path,
    mapping_path: &Path,
    output: Option<&Path>,
    log_output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mapping = ProviderMapping::from_path(mapping_path)?;
    eprintln!("📂 Processing directory: {}", dir.display());
    eprintln!("   Provider mappings: {} patterns", mapping.len());

    let mut harmonizer = Harmonizer::from_config(config);
    let summary = harmonizer.process_directory(dir, &mapping)?;

    eprintln!("\n📊 Files found: {}", summary.total_files);
    eprintln!("   ✅ Processed: {}", summary.processed);
    if summary.errors > 0 {
        eprintln!("   ❌ Errors: {}", summary.errors);
        for failure in harmonizer.failures() {
            eprintln!("     - {}", failure.error);
        }
    }
    if summary.skipped > 0 {
        eprintln!("   ⚠️  Skipped: {} (no provider mapping)", summary.skipped);
    }

    if summary.processed == 0 {
        eprintln!("\nNo data processed.");
        return Ok(());
    }

    write_results(&harmonizer, output, log_output)
}

fn cmd_providers(config: &HarmonizerConfig, action: ProviderAction) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = ProviderCatalog::with_dir(&config.providers_dir);

    match action {
        ProviderAction::List => {
            let schemas = catalog.list();
            if schemas.is_empty() {
                eprintln!("📋 No provider schemas in {}", config.providers_dir.display());
                eprintln!("   Use 'harmonizer example-schema <name>' to start one.");
                return Ok(());
            }

            eprintln!("📋 Provider schemas ({}):\n", schemas.len());
            for schema in schemas {
                println!("  📄 {}", schema.provider_name);
                println!(
                    "     Synonyms: {}, Filters: {}, Calculations: {}, Constants: {}, Extractions: {}",
                    schema.synonyms.len(),
                    schema.filter_table.len(),
                    schema.calculations.len(),
                    schema.hardcoded_fields.len(),
                    schema.header_extraction.len()
                );
            }
        }

        ProviderAction::Show { name } => {
            let schema = catalog.get(&name)?;
            println!("{}", schema.to_json()?);
        }
    }

    Ok(())
}

fn cmd_example_schema(name: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", example_schema(name).to_json()?);
    Ok(())
}

fn write_results(
    harmonizer: &Harmonizer,
    output: Option<&Path>,
    log_output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let records = serde_json::to_string_pretty(&harmonizer.master_data().to_records())?;
    write_output(&records, output)?;

    if let Some(path) = log_output {
        fs::write(path, harmonizer.log_json()?)?;
        eprintln!("💾 Log written to: {}", path.display());
    }

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
