//! lborm CLI - run raw SQL against a configured database

use clap::{Parser, Subcommand};
use lborm::config::{CONFIG_FILE, OrmConfig};
use lborm::{Engine, Value};
use std::path::PathBuf;
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "lborm")]
#[command(version)]
#[command(about = "Run SQL through the lborm record layer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides the config)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a statement that returns no rows
    Exec {
        /// SQL text with `?` placeholders
        sql: String,

        /// Parameters bound to the placeholders in order
        params: Vec<String>,
    },

    /// Run a query and print its rows
    Query {
        /// SQL text with `?` placeholders
        sql: String,

        /// Parameters bound to the placeholders in order
        params: Vec<String>,

        /// Print rows as JSON arrays
        #[arg(long)]
        json: bool,
    },

    /// Write a starter config file
    Init {
        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = OrmConfig::load(cli.config.as_deref())?;

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else if let Some(directive) = &settings.log_filter {
        EnvFilter::new(directive)
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Some(database) = &cli.database {
        settings.database = Some(database.to_string_lossy().to_string());
    }

    match cli.command {
        Commands::Init { force } => {
            let path = cli.config.unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
            let starter = OrmConfig {
                dialect: settings.dialect,
                log_filter: settings.log_filter,
                ..OrmConfig::starter(settings.database)
            };
            starter.save(&path, force)?;
            println!("Wrote {}", path.display());
        }

        Commands::Exec { sql, params } => {
            let engine = Engine::from_config(&settings)?;
            let params: Vec<Value> = params.iter().map(|p| parse_param(p)).collect();
            let changed = engine.new_session().with_hint("cli").exec_raw(&sql, &params)?;
            println!("{} row(s) affected", changed);
        }

        Commands::Query { sql, params, json } => {
            let engine = Engine::from_config(&settings)?;
            let params: Vec<Value> = params.iter().map(|p| parse_param(p)).collect();
            let rows = engine.new_session().with_hint("cli").query_raw(&sql, &params)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if rows.is_empty() {
                println!("(no rows)");
            } else {
                let mut builder = Builder::default();
                for row in &rows {
                    builder.push_record(row.iter().map(|v| v.to_string()));
                }
                let mut table = builder.build();
                table.with(Style::rounded());
                println!("{}", table);
            }
        }
    }

    Ok(())
}

/// Integer, float, `true`/`false` and `null` literals; anything else is text
fn parse_param(raw: &str) -> Value {
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(r) = raw.parse::<f64>() {
        return Value::Real(r);
    }
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" | "NULL" => Value::Null,
        _ => Value::Text(raw.to_string()),
    }
}
