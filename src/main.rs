//! watchgit CLI - track git repositories by alias and check on them

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use watchgit::{Registry, config};

#[derive(Parser)]
#[command(name = "watchgit")]
#[command(version)]
#[command(about = "Keep an eye on many git repositories through short aliases")]
#[command(long_about = r#"
watchgit remembers where your repositories live, so you can:
  • Give each repository a short alias
  • Print the path behind an alias (cd "$(watchgit path dots)")
  • Check the git status of every tracked repository at once

Example usage:
  watchgit add dots ~/dotfiles
  watchgit list
  watchgit status
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON instead of human-readable output
    #[arg(long, global = true)]
    json: bool,

    /// Path to the registry database (overrides WATCHGIT_DB and the config file)
    #[arg(short, long, global = true)]
    database: Option<String>,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Registry(RegistryCommand),

    /// Show version information
    Version,
}

/// Subcommands that work on the registry database
#[derive(Subcommand)]
enum RegistryCommand {
    /// Start tracking a repository under an alias
    Add {
        /// Short name for the repository
        alias: String,

        /// Path to the repository
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Stop tracking an alias
    #[command(alias = "remove")]
    Rm {
        alias: String,
    },

    /// List tracked repositories
    #[command(alias = "ls")]
    List,

    /// Print the path behind an alias
    Path {
        alias: String,
    },

    /// Show git status for every tracked repository, or just one
    Status {
        alias: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn is_human(self) -> bool {
        self == OutputMode::Human
    }
}

/// Print one JSON success envelope. No-op in human mode.
pub fn emit_success(
    output_mode: OutputMode,
    command: &str,
    data: serde_json::Value,
) -> anyhow::Result<()> {
    if output_mode == OutputMode::Json {
        let envelope = serde_json::json!({
            "ok": true,
            "command": command,
            "data": data,
        });
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    }
    Ok(())
}

fn emit_error(output_mode: OutputMode, err: &anyhow::Error, code: i32) {
    match output_mode {
        OutputMode::Human => watchgit::ui::error(&format!("{err:#}")),
        OutputMode::Json => {
            let envelope = serde_json::json!({
                "ok": false,
                "error": format!("{err:#}"),
                "code": code,
            });
            println!("{envelope}");
        }
    }
}

/// Registry errors carry their own exit code; everything else exits 1.
fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<watchgit::Error>()
        .map(watchgit::Error::exit_code)
        .unwrap_or(1)
}

fn main() {
    let Cli {
        verbose,
        json,
        database,
        config,
        command,
    } = Cli::parse();

    // Initialize logging
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let output_mode = if json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let result = match command {
        Commands::Version => commands::run_version(output_mode),
        Commands::Registry(command) => open_registry(database.as_deref(), config.as_deref())
            .and_then(|registry| run_with_registry(registry, command, output_mode)),
    };

    if let Err(err) = result {
        let code = exit_code(&err);
        emit_error(output_mode, &err, code);
        std::process::exit(code);
    }
}

fn open_registry(
    database: Option<&str>,
    config_path: Option<&std::path::Path>,
) -> anyhow::Result<Registry> {
    let config = config::load_config(config_path)?;
    let location = config::database_location(
        database,
        std::env::var(config::DATABASE_ENV).ok(),
        config.as_ref(),
    );
    let db_path = config::expand_location(&location)?;
    config::ensure_db_dir(&db_path)?;

    tracing::debug!("Using registry at {}", db_path.display());
    Ok(Registry::open(&db_path)?)
}

fn run_with_registry(
    registry: Registry,
    command: RegistryCommand,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    let result = match command {
        RegistryCommand::Add { alias, path } => {
            commands::run_add(&registry, &alias, &path, output_mode)
        }
        RegistryCommand::Rm { alias } => commands::run_remove(&registry, &alias, output_mode),
        RegistryCommand::List => commands::run_list(&registry, output_mode),
        RegistryCommand::Path { alias } => commands::run_path(&registry, &alias, output_mode),
        RegistryCommand::Status { alias } => {
            commands::run_status(&registry, alias.as_deref(), output_mode)
        }
    };

    // Close on every path; the command's own error wins.
    let closed = registry.close();
    result?;
    closed?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_needs_no_registry() {
        let cli = Cli::try_parse_from(["watchgit", "version"]).unwrap();
        assert!(matches!(cli.command, Commands::Version));

        let cli = Cli::try_parse_from(["watchgit", "--json", "ls"]).unwrap();
        assert!(matches!(cli.command, Commands::Registry(RegistryCommand::List)));

        let cli = Cli::try_parse_from(["watchgit", "add", "dots"]).unwrap();
        match cli.command {
            Commands::Registry(RegistryCommand::Add { alias, path }) => {
                assert_eq!(alias, "dots");
                assert_eq!(path, PathBuf::from("."));
            }
            _ => panic!("expected add"),
        }
    }
}
