//! Configuration inspection commands.

use clap::Subcommand;
use routetrack::config::{config_file_path, ConfigFile};

use crate::error::CliError;

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// List every setting with its effective value
    List,

    /// Show the configuration file path
    Path,
}

pub fn run(command: ConfigCommands, config: &ConfigFile) -> Result<(), CliError> {
    match command {
        ConfigCommands::List => run_list(config),
        ConfigCommands::Path => run_path(),
    }
}

fn run_list(config: &ConfigFile) -> Result<(), CliError> {
    println!("Configuration Settings");
    println!("======================");
    print!("{}", render_list(config));
    Ok(())
}

fn run_path() -> Result<(), CliError> {
    println!("{}", config_file_path().display());
    Ok(())
}

fn render_list(config: &ConfigFile) -> String {
    let mut out = String::new();
    let mut current_section = "";

    for (section, key, value) in config.entries() {
        if section != current_section {
            out.push('\n');
            out.push_str(&format!("[{}]\n", section));
            current_section = section;
        }
        out.push_str(&format!("  {} = {}\n", key, value));
    }
    out
}
