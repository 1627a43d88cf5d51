//! Polyglot command-line tool.
//!
//! Usage:
//!   polyglot --config polyglot.toml locales
//!   polyglot localize --entity product --key 1 --key 2 --to zh,de
//!   polyglot show --entity product --locale zh --mode fallback
//!
//! Rows are printed as JSON lines on stdout; logs go to stderr.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use polyglot_cli::{CliConfig, Workspace};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "polyglot")]
#[command(about = "Inspect and localize Polyglot entities")]
struct Args {
    /// Path to the config file
    #[arg(short, long, default_value = "polyglot.toml")]
    config: PathBuf,

    /// Database file, overriding `[database] path`
    #[arg(long)]
    db: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the configured locales
    Locales,

    /// Copy entities from one locale to others
    Localize {
        /// Entity type
        #[arg(short, long)]
        entity: String,

        /// Entity key, comma-separated for composite keys (repeatable)
        #[arg(short, long = "key", required = true)]
        keys: Vec<String>,

        /// Source locale (defaults to the global locale)
        #[arg(long)]
        from: Option<String>,

        /// Target locales
        #[arg(long, value_delimiter = ',', required = true)]
        to: Vec<String>,
    },

    /// Print the rows visible in a locale
    Show {
        /// Entity type
        #[arg(short, long)]
        entity: String,

        /// Only the entity with this key
        #[arg(short, long)]
        key: Option<String>,

        /// Locale to read in (defaults to the global locale)
        #[arg(short, long)]
        locale: Option<String>,

        /// Query mode: fallback, locale, global, reverse or unscoped
        #[arg(short, long)]
        mode: Option<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = CliConfig::load(&args.config)?;
    let mut workspace = Workspace::open(config, args.db.as_deref())?;
    debug!("Registered {} entity types", workspace.l10n.registry().len());

    match args.command {
        Command::Locales => {
            for line in workspace.locale_lines() {
                println!("{line}");
            }
        }
        Command::Localize {
            entity,
            keys,
            from,
            to,
        } => {
            let written = workspace.localize(&entity, &keys, from.as_deref(), &to)?;
            info!("Localized {} row(s) of {}", written, entity);
            println!("{written}");
        }
        Command::Show {
            entity,
            key,
            locale,
            mode,
        } => {
            let rows = workspace.show(
                &entity,
                key.as_deref(),
                locale.as_deref(),
                mode.as_deref(),
            )?;
            for row in rows {
                let line = serde_json::to_string(&row.values)
                    .context("Failed to encode row as JSON")?;
                println!("{line}");
            }
        }
    }
    Ok(())
}
