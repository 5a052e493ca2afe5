//! Scry CLI - compile analytics descriptors and run them offline
//!
//! Usage:
//!   scry compile --descriptor <file.json|-> [--role <name>] [--caller <id>] [--template]
//!   scry entities [<name>]
//!   scry run-fixture --descriptor <file.json|-> --rows <rows.json> [--role <name>] [--caller <id>]
//!
//! Examples:
//!   scry compile --descriptor request.json --role viewer
//!   scry entities projects
//!   scry run-fixture --descriptor request.json --rows fixture.json --role manager

use clap::{Parser, Subcommand};
use scry::config::ScrySettings;
use scry::descriptor::QueryDescriptor;
use scry::exec::{CircuitBreaker, FixtureEndpoint};
use scry::render;
use scry::roles::Role;
use scry::schema::SchemaRegistry;
use scry::service::AnalyticsService;
use scry::QueryCompiler;
use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scry")]
#[command(about = "Scry - analytics query compiler with a resilient execution layer")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a descriptor and print the SQL
    Compile {
        /// Path to the descriptor JSON, or '-' for stdin
        #[arg(short, long)]
        descriptor: String,

        /// Caller role (defaults to the configured default role)
        #[arg(long)]
        role: Option<String>,

        /// Caller identity for personalized queries
        #[arg(long)]
        caller: Option<String>,

        /// Print the template and parameter list instead of rendered SQL
        #[arg(long)]
        template: bool,
    },

    /// List registry entities, or dump one entity's schema
    Entities {
        /// Entity name to dump
        name: Option<String>,
    },

    /// Compile, then execute against a fixture endpoint fed from a JSON file
    RunFixture {
        /// Path to the descriptor JSON, or '-' for stdin
        #[arg(short, long)]
        descriptor: String,

        /// Path to a JSON array of fixture rows
        #[arg(long)]
        rows: PathBuf,

        /// Caller role (defaults to the configured default role)
        #[arg(long)]
        role: Option<String>,

        /// Caller identity for personalized queries
        #[arg(long)]
        caller: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            descriptor,
            role,
            caller,
            template,
        } => cmd_compile(descriptor, role, caller, template),
        Commands::Entities { name } => cmd_entities(name),
        Commands::RunFixture {
            descriptor,
            rows,
            role,
            caller,
        } => cmd_run_fixture(descriptor, rows, role, caller).await,
    }
}

/// The binary owns the subscriber; the library only emits events.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("SCRY_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_compile(
    descriptor: String,
    role: Option<String>,
    caller: Option<String>,
    template: bool,
) -> ExitCode {
    let Some(descriptor) = read_descriptor(&descriptor) else {
        return ExitCode::FAILURE;
    };
    let settings = match ScrySettings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let role_name = role.unwrap_or(settings.access.default_role);
    let role = Role::parse(Some(&role_name));

    let compiler = QueryCompiler::builtin();
    let compiled = compiler.compile(&descriptor, role, caller.as_deref());

    if template {
        println!("{}", compiled.sql_template);
        if !compiled.parameters.is_empty() {
            println!();
            println!("-- parameters:");
            for (name, value) in compiled.parameters.iter() {
                println!("--   {} = {}", name, value);
            }
        }
        return ExitCode::SUCCESS;
    }

    match render::render(&compiled) {
        Ok(sql) => {
            println!("{}", sql);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Render error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_entities(name: Option<String>) -> ExitCode {
    let registry = SchemaRegistry::builtin();

    let Some(name) = name else {
        println!("Entities:");
        for entity in registry.entities() {
            println!(
                "  - {} (table: {}, alias: {}, {} columns)",
                entity.name,
                entity.table,
                entity.alias,
                entity.columns.len()
            );
        }
        return ExitCode::SUCCESS;
    };

    let Some(entity) = registry.get(&name) else {
        let known: Vec<&str> = registry.names().collect();
        eprintln!("Unknown entity '{}'. Known entities: {}", name, known.join(", "));
        return ExitCode::FAILURE;
    };

    println!("Entity: {}", entity.name);
    println!("Table:  {} (alias {})", entity.table, entity.alias);
    println!();
    println!("Columns:");
    for column in &entity.columns {
        println!("  - {}", column);
    }
    if !entity.relations.is_empty() {
        println!();
        println!("Relations:");
        for relation in &entity.relations {
            println!(
                "  - {} -> {} ({} = {})",
                relation.name, relation.target, relation.local_key, relation.target_key
            );
        }
    }
    if !entity.overrides.is_empty() {
        println!();
        println!("Column overrides:");
        let mut pairs: Vec<(&String, &String)> = entity.overrides.iter().collect();
        pairs.sort();
        for (logical, physical) in pairs {
            println!("  - {} -> {}", logical, physical);
        }
    }
    println!();
    println!(
        "Defaults: group_by={}, label={}, value={}",
        entity.group_by_column, entity.label_column, entity.value_column
    );
    ExitCode::SUCCESS
}

async fn cmd_run_fixture(
    descriptor: String,
    rows: PathBuf,
    role: Option<String>,
    caller: Option<String>,
) -> ExitCode {
    let Some(descriptor) = read_descriptor(&descriptor) else {
        return ExitCode::FAILURE;
    };

    let raw_rows = match fs::read_to_string(&rows) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading rows file '{}': {}", rows.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let fixture_rows: Vec<serde_json::Value> = match serde_json::from_str(&raw_rows) {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("Error parsing rows file: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let settings = match ScrySettings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let role_name = role.unwrap_or(settings.access.default_role);

    let service = AnalyticsService::new(FixtureEndpoint::returning(fixture_rows))
        .with_breaker(Arc::new(CircuitBreaker::new(settings.breaker.breaker_config())))
        .with_retry(settings.executor.retry_policy());
    let outcome = service
        .run(&descriptor, Some(&role_name), caller.as_deref())
        .await;

    match serde_json::to_string_pretty(&outcome) {
        Ok(text) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error serializing outcome: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Read a descriptor from a file path or from stdin when the path is `-`.
fn read_descriptor(path: &str) -> Option<QueryDescriptor> {
    let raw = if path == "-" {
        let mut buffer = String::new();
        if let Err(e) = std::io::stdin().read_to_string(&mut buffer) {
            eprintln!("Error reading stdin: {}", e);
            return None;
        }
        buffer
    } else {
        match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error reading descriptor '{}': {}", path, e);
                return None;
            }
        }
    };

    match QueryDescriptor::from_json(&raw) {
        Ok(descriptor) => Some(descriptor),
        Err(e) => {
            eprintln!("Descriptor error: {}", e);
            None
        }
    }
}
