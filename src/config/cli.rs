use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Debug, Clone, Parser)]
#[command(name = "gamine")]
#[command(about = "Find, save and remove model objects on a REST service")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "gamine.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List configured managers and their resources
    Managers,

    /// Fetch every object of a manager's collection
    FindAll {
        manager: String,
        /// Extra query parameter, repeatable (key=value)
        #[arg(long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
    },

    /// Fetch one object by identifier
    FindOne {
        manager: String,
        id: String,
        #[arg(long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
    },

    /// Fetch objects whose field equals a value
    FindBy {
        manager: String,
        key: String,
        value: String,
        #[arg(long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
    },

    /// Save an object given as a JSON data array
    Save { manager: String, data: String },

    /// Remove an object by identifier
    Remove { manager: String, id: String },

    /// Print a named resource route
    Route { manager: String, route: String },
}

pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid key=value: no `=` found in `{}`", s))?;
    if key.is_empty() {
        return Err(format!("invalid key=value: empty key in `{}`", s));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Reads a command-line value as JSON when possible (`42`, `true`), as a
/// plain string otherwise.
pub fn parse_value(s: &str) -> Value {
    serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.to_string()))
}
