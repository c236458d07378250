//! Handlers for the `config` subcommands.

use bookgraph_core::{Error, Result};
use std::path::Path;

use crate::cli::ConfigAction;
use crate::config::{BookgraphConfig, PROJECT_NAME};

/// Dispatches a config subcommand.
pub fn handle_config_command(config_path: Option<&Path>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Path => cmd_config_path(config_path),
        ConfigAction::Show => cmd_config_show(config_path),
        ConfigAction::Init { force } => cmd_config_init(config_path, force).map(|_| ()),
    }
}

/// Prints the resolved config file path.
pub fn cmd_config_path(config_path: Option<&Path>) -> Result<()> {
    let path = BookgraphConfig::resolve_config_path(config_path).ok_or_else(|| {
        Error::config("Could not determine config directory for this platform")
    })?;
    println!("{}", path.display());
    if !path.exists() {
        eprintln!("(file does not exist, run `{PROJECT_NAME} config init` to create it)");
    }
    Ok(())
}

/// Prints the effective configuration with secrets masked.
pub fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = BookgraphConfig::load(config_path)?;
    print!("{}", config.redacted().to_toml_string()?);
    Ok(())
}

/// Writes a default configuration file and returns its path.
pub fn cmd_config_init(config_path: Option<&Path>, force: bool) -> Result<std::path::PathBuf> {
    let path = BookgraphConfig::resolve_config_path(config_path)
        .ok_or_else(|| Error::config("Could not determine config directory"))?;

    if path.exists() && !force {
        return Err(Error::config(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let toml_str = BookgraphConfig::default().to_toml_string()?;
    std::fs::write(&path, toml_str)?;

    tracing::info!(path = %path.display(), "Wrote default config");
    println!("Config file created at {}", path.display());
    Ok(path)
}
