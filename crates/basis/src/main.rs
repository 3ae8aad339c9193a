//! basis CLI - Main entry point

use anyhow::Result;
use basis_config::DumpFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "basis")]
#[command(version)]
#[command(about = "Load, merge and inspect hierarchical config files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the fully merged config
    Show {
        /// Config file (json, yaml, yml or toml)
        file: PathBuf,

        /// Output format (text, json, yaml, toml)
        #[arg(short = 'f', long, default_value = "text")]
        format: DumpFormat,

        /// Override a value (KEY=VALUE, KEY may be dotted)
        #[arg(short = 's', long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Leave {{ fileDirname }} style placeholders untouched
        #[arg(long)]
        no_predefined_vars: bool,
    },

    /// Print the source text of the config and all of its bases
    Text {
        /// Config file
        file: PathBuf,
    },

    /// List the leaf keys of the merged config with their types
    Keys {
        /// Config file
        file: PathBuf,
    },

    /// Print a single value
    Get {
        /// Config file
        file: PathBuf,

        /// Dotted key, e.g. model.backbone.depth
        key: String,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "basis=info,basis_config=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Show {
            file,
            format,
            set,
            no_predefined_vars,
        } => commands::show::execute(commands::show::ShowArgs {
            file,
            format,
            set,
            use_predefined_variables: !no_predefined_vars,
        }),
        Commands::Text { file } => commands::text::execute(&file),
        Commands::Keys { file } => commands::keys::execute(&file),
        Commands::Get { file, key } => commands::get::execute(&file, &key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_show_with_overrides() {
        let cli = Cli::try_parse_from([
            "basis",
            "show",
            "exp.yaml",
            "--format",
            "json",
            "--set",
            "model.depth=101",
            "-s",
            "lr=0.01",
            "--no-predefined-vars",
        ])
        .unwrap();

        match cli.command {
            Commands::Show {
                file,
                format,
                set,
                no_predefined_vars,
            } => {
                assert_eq!(file, PathBuf::from("exp.yaml"));
                assert_eq!(format, DumpFormat::Json);
                assert_eq!(set, vec!["model.depth=101", "lr=0.01"]);
                assert!(no_predefined_vars);
            }
            _ => panic!("expected show command"),
        }
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["basis", "show", "exp.yaml", "-f", "ini"]).is_err());
    }
}
