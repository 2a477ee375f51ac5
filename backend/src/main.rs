//! WHX CLI - Convert order exports into warehouse outbound manifests
//!
//! ```bash
//! whx generate orders.xlsx             # Write Warehouse_orders.xlsx next to the input
//! whx preview orders.csv               # Print the manifest as JSON
//! whx serve --addr :8001               # Start HTTP server
//! whx --version
//! ```

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use whx::{generate_file, transform::preview_file, Settings};

#[derive(Parser)]
#[command(name = "whx")]
#[command(version, about = "Convert order exports into warehouse outbound manifests", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an order export and write the manifest
    Generate {
        /// Order export (xlsx/xls/ods workbook, or CSV, TSV, semicolon or pipe separated text)
        input: PathBuf,

        /// SKU mapping sheet (default: WHX_MAPPING or the embedded map)
        #[arg(short, long)]
        mapping: Option<PathBuf>,

        /// JSON file overriding the input header names
        #[arg(short, long)]
        columns: Option<PathBuf>,

        /// Output file; a .csv or .xlsx extension picks the format (default: Warehouse_<input> next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert an order export and print the manifest as JSON
    Preview {
        /// Order export sheet
        input: PathBuf,

        /// SKU mapping sheet
        #[arg(short, long)]
        mapping: Option<PathBuf>,

        /// JSON file overriding the input header names
        #[arg(short, long)]
        columns: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Listen address, e.g. `:8001` or `127.0.0.1:8080`
        #[arg(short, long)]
        addr: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            input,
            mapping,
            columns,
            output,
        } => cmd_generate(&input, mapping.as_deref(), columns.as_deref(), output),

        Commands::Preview {
            input,
            mapping,
            columns,
        } => cmd_preview(&input, mapping.as_deref(), columns.as_deref()),

        Commands::Serve { addr } => cmd_serve(addr.as_deref()).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_settings(
    mapping: Option<&Path>,
    columns: Option<&Path>,
) -> Result<Settings, Box<dyn std::error::Error>> {
    Ok(Settings::from_env()?
        .with_mapping(mapping)
        .with_columns(columns)?)
}

fn cmd_generate(
    input: &Path,
    mapping: Option<&Path>,
    columns: Option<&Path>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let settings = load_settings(mapping, columns)?;
    let mut options = settings.generate_options();
    options.output = output;

    let outcome = generate_file(input, &options)?;
    if !outcome.skipped.is_empty() {
        eprintln!("Skipped {} rows with empty SKU or quantity", outcome.skipped.len());
    }
    println!(
        "Created {} with {} rows",
        outcome.output_path.display(),
        outcome.count
    );
    Ok(())
}

fn cmd_preview(
    input: &Path,
    mapping: Option<&Path>,
    columns: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let settings = load_settings(mapping, columns)?;
    let preview = preview_file(input, &settings.generate_options())?;

    let json = serde_json::to_string_pretty(&preview)?;
    println!("{}", json);
    Ok(())
}

async fn cmd_serve(addr: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?.with_addr(addr)?;
    whx::server::start_server(settings).await
}
