//! ProvQL compiler CLI
//!
//! # Usage
//!
//! ```bash
//! # Compile against a schema, unrestricted role, CBOR hex on stdout
//! provqlc compile --schema evidence.yaml 'SELECT * FROM evidence WHERE id = 1'
//!
//! # JSON output, role profiles from a file, request-level provenance
//! provqlc compile --schema evidence.yaml --profiles roles.yaml --role analyst \
//!     --format json --actor cli 'INSERT INTO evidence SET id = 7 RATIONALE "seed"'
//!
//! # Apply the compiled IR to an in-memory engine
//! provqlc compile --schema evidence.yaml --execute '...'
//!
//! # Token stream / effective configuration
//! provqlc tokens 'SELECT a FROM t'
//! provqlc check-config --config provql.yaml
//! ```
//!
//! Logging goes to stderr and follows `RUST_LOG`.

use clap::{Parser, Subcommand};
use provql_ir::config::{CompilerConfig, ValidatedConfig};
use provql_ir::features::catalog::load_profiles_yaml;
use provql_ir::features::lexing::Lexer;
use provql_ir::{
    CompilePipeline, CompileRequest, CompileService, ExecutionEngine, Format, InMemoryEngine,
    PermissionProfile, ProvqlError, SnapshotCatalog,
};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "provqlc")]
#[command(about = "Compile ProvQL statements into verified, provenance-carrying IR", long_about = None)]
struct Cli {
    /// YAML configuration file (v1); PROVQL__* variables apply on top
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile one statement (read from stdin when omitted)
    Compile {
        statement: Option<String>,

        /// Schema YAML file; repeat for several tables
        #[arg(short, long, required = true)]
        schema: Vec<PathBuf>,

        /// Permission profiles YAML; without it the role is unrestricted
        #[arg(short, long)]
        profiles: Option<PathBuf>,

        /// Role the statement runs as
        #[arg(short, long, default_value = "admin")]
        role: String,

        /// Output format (cbor, json, packed, sql); defaults to the configured one
        #[arg(short, long)]
        format: Option<Format>,

        /// Default ACTOR for mutations that omit it
        #[arg(long)]
        actor: Option<String>,

        /// Default RATIONALE for mutations that omit it
        #[arg(long)]
        rationale: Option<String>,

        /// Submit the IR to an in-memory engine and print the result
        #[arg(long)]
        execute: bool,
    },

    /// Print the token stream
    Tokens {
        statement: Option<String>,

        /// Include comments
        #[arg(long)]
        comments: bool,
    },

    /// Validate the configuration and show where each value came from
    CheckConfig,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(category = e.category(), "{}", e);
            eprintln!("error: {}", e);
            match e {
                ProvqlError::Config(_) | ProvqlError::Io(_) => ExitCode::from(2),
                _ => ExitCode::from(1),
            }
        }
    }
}

async fn run(cli: Cli) -> provql_ir::Result<()> {
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Compile {
            statement,
            schema,
            profiles,
            role,
            format,
            actor,
            rationale,
            execute,
        } => {
            let source = read_statement(statement)?;

            let catalog = Arc::new(SnapshotCatalog::default());
            for path in &schema {
                catalog.load_schema_yaml(path)?;
            }
            match profiles {
                Some(path) => {
                    for profile in load_profiles_yaml(&path)? {
                        catalog.replace_profile(profile);
                    }
                }
                None => {
                    catalog.replace_profile(PermissionProfile::unrestricted(role.clone()));
                }
            }

            let mut request = CompileRequest::new(source, role);
            request.defaults.actor = actor;
            request.defaults.rationale = rationale;
            request.format = format;

            let service =
                CompileService::from_catalog(Arc::new(CompilePipeline::new(config)), catalog);
            let output = service.compile(&request).await?;

            for warning in &output.warnings {
                warn!("{}", warning);
            }
            println!("{}", output.encoded.to_display_string());

            if execute {
                let engine = InMemoryEngine::new();
                let result = engine.submit(&output.ir)?;
                println!("-- affected: {}", result.affected);
                for row in &result.rows {
                    let cells: Vec<String> =
                        row.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                    println!("-- {}", cells.join(", "));
                }
            }
            Ok(())
        }

        Commands::Tokens {
            statement,
            comments,
        } => {
            let source = read_statement(statement)?;
            for token in Lexer::new(&source).with_comments(comments) {
                let token = token.map_err(provql_ir::PipelineError::from)?;
                println!("{}\t{}", token.position, token.kind.describe());
            }
            Ok(())
        }

        Commands::CheckConfig => {
            println!("{}", config.describe());
            println!("{}", config.provenance().summary());
            Ok(())
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> provql_ir::Result<ValidatedConfig> {
    let base = match path {
        Some(path) => CompilerConfig::load_yaml(path)?,
        None => CompilerConfig::default(),
    };
    Ok(base.apply_env()?.build()?)
}

fn read_statement(statement: Option<String>) -> provql_ir::Result<String> {
    match statement {
        Some(s) => Ok(s),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}
