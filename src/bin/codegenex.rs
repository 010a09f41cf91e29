//! codegenex CLI - generate and evolve migrations, Go models and repositories
//!
//! `codegenex <entity> <action> [field:type:option...]`

use clap::Parser;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use codegenex::codegen::DEFAULT_CONFIG_FILE;
use codegenex::{Config, Manager};

#[derive(Parser)]
#[command(name = "codegenex")]
#[command(version, about = "Generate and evolve SQL migrations, Go models and repositories", long_about = None)]
struct Cli {
    /// Entity name, e.g. post or BlogPost
    entity: String,

    /// One of create, add_fields, remove_fields, drop
    action: String,

    /// Field tokens: name[:type[:option...]], e.g. author_id:int:ref
    #[arg(allow_hyphen_values = true)]
    fields: Vec<String>,

    /// Path to the JSON configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Log engine decisions at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(&cli.config);
    let result = Manager::new(&config).run(&cli.entity, &cli.action, &cli.fields);

    match result {
        Ok(report) => {
            for artifact in &report.artifacts {
                println!("{}", artifact);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
