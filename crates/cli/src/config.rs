//! `shelfwise config`

use std::path::PathBuf;

use clap::Subcommand;

use crate::feeds::load_config;
use crate::CliError;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Parse and validate a config file, then print the resolved values
    #[command(after_help = "\
Examples:
  shelfwise config validate tuned.toml")]
    Validate {
        config: PathBuf,
    },

    /// Print the built-in defaults as TOML
    Defaults,
}

pub fn cmd_config(cmd: ConfigCommands) -> Result<(), CliError> {
    let (config, label) = match cmd {
        ConfigCommands::Validate { config } => {
            let resolved = load_config(Some(&config))?;
            (resolved, format!("{}: valid", config.display()))
        }
        ConfigCommands::Defaults => (load_config(None)?, String::new()),
    };

    let rendered = toml::to_string_pretty(&config)
        .map_err(|e| CliError::config(format!("cannot render config: {e}")))?;
    print!("{rendered}");
    if !label.is_empty() {
        eprintln!("{label}");
    }
    Ok(())
}
