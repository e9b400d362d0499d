//! `cellar config` command - Configuration management
//!
//! Provides commands to view and modify cellar configuration.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use serde_yml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::helpers::open_project;
use crate::cli::GlobalOpts;
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration values
    Show(ShowArgs),

    /// Set a configuration value
    Set(SetArgs),

    /// Unset (remove) a configuration value
    Unset(UnsetArgs),

    /// Show paths to configuration files
    Path(PathArgs),

    /// List all available configuration keys
    Keys,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value
    pub key: Option<String>,

    /// Show only project-level config
    #[arg(long = "project-only", conflicts_with = "global_only")]
    pub project_only: bool,

    /// Show only global (user) config
    #[arg(long = "global-only")]
    pub global_only: bool,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Configuration key (e.g., oz_per_tin, date_format)
    pub key: String,

    /// Value to set
    pub value: String,

    /// Set in global (user) config instead of project config
    #[arg(long, short = 'g')]
    pub global: bool,
}

#[derive(clap::Args, Debug)]
pub struct UnsetArgs {
    /// Configuration key to remove
    pub key: String,

    /// Remove from global (user) config instead of project config
    #[arg(long, short = 'g')]
    pub global: bool,
}

#[derive(clap::Args, Debug)]
pub struct PathArgs {
    /// Show only project config path
    #[arg(long = "project-only", conflicts_with = "global_only")]
    pub project_only: bool,

    /// Show only global config path
    #[arg(long = "global-only")]
    pub global_only: bool,
}

/// Valid configuration keys
const VALID_KEYS: &[(&str, &str)] = &[
    ("oz_per_tin", "Ounces in one standard tin (default 1.75)"),
    ("grams_per_tin", "Grams in one standard tin (default 50)"),
    (
        "date_format",
        "Default import date format (e.g. MM/YY, DD/MM/YYYY)",
    ),
    (
        "default_format",
        "Default output format (tsv, csv, json, md, id)",
    ),
];

/// Run a config subcommand
pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args, global),
        ConfigCommands::Set(args) => run_set(args, global),
        ConfigCommands::Unset(args) => run_unset(args, global),
        ConfigCommands::Path(args) => run_path(args, global),
        ConfigCommands::Keys => run_keys(),
    }
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global).ok();
    let config = Config::load(project.as_ref());

    if let Some(key) = &args.key {
        check_key(key)?;
        return match get_config_value(&config, key) {
            Some(v) => {
                println!("{}", v);
                Ok(())
            }
            None => Err(miette::miette!("Key '{}' is not set", key)),
        };
    }

    if args.project_only {
        show_file("Project config:", &project_config_path(global)?)
    } else if args.global_only {
        show_file("Global config:", &global_config_path()?)
    } else {
        println!("{}", style("Effective Configuration").bold().underlined());
        println!();

        let conversion = config.conversion();
        println!(
            "  {}: {}",
            style("oz_per_tin").cyan(),
            style(conversion.oz_per_tin).yellow()
        );
        println!(
            "  {}: {}",
            style("grams_per_tin").cyan(),
            style(conversion.grams_per_tin).yellow()
        );
        print_config_value("date_format", config.date_format.as_deref());
        print_config_value("default_format", config.default_format.as_deref());

        println!();
        println!("{}", style("Config Sources (in priority order):").dim());
        println!("  1. Environment variables (CELLAR_OZ_PER_TIN, CELLAR_GRAMS_PER_TIN, CELLAR_DATE_FORMAT)");
        println!("  2. Project config (.cellar/config.yaml)");
        println!("  3. Global config (~/.config/cellar/config.yaml)");
        Ok(())
    }
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    check_key(&args.key)?;
    let value = parse_value(&args.key, &args.value)?;

    let config_path = target_path(args.global, global)?;
    let mut config_map = read_mapping(&config_path)?;
    config_map.insert(Value::String(args.key.clone()), value);

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    let yaml = serde_yml::to_string(&config_map).into_diagnostic()?;
    fs::write(&config_path, yaml).into_diagnostic()?;

    let scope = if args.global { "global" } else { "project" };
    println!(
        "{} Set {} {} {} in {} config",
        style("✓").green(),
        style(&args.key).cyan(),
        style("→").dim(),
        style(&args.value).yellow(),
        scope
    );

    Ok(())
}

fn run_unset(args: UnsetArgs, global: &GlobalOpts) -> Result<()> {
    let config_path = target_path(args.global, global)?;

    if !config_path.exists() {
        return Err(miette::miette!(
            "Config file does not exist: {}",
            config_path.display()
        ));
    }

    let mut config_map = read_mapping(&config_path)?;
    if config_map.remove(Value::String(args.key.clone())).is_none() {
        return Err(miette::miette!("Key '{}' not found in config", args.key));
    }

    let yaml = serde_yml::to_string(&config_map).into_diagnostic()?;
    fs::write(&config_path, yaml).into_diagnostic()?;

    let scope = if args.global { "global" } else { "project" };
    println!(
        "{} Removed {} from {} config",
        style("✓").green(),
        style(&args.key).cyan(),
        scope
    );

    Ok(())
}

fn run_path(args: PathArgs, global: &GlobalOpts) -> Result<()> {
    if args.project_only {
        println!("{}", project_config_path(global)?.display());
        return Ok(());
    }
    if args.global_only {
        println!("{}", global_config_path()?.display());
        return Ok(());
    }

    println!("{}", style("Configuration file paths:").bold());
    println!();
    print_path("Global:", &global_config_path()?);
    println!();
    match project_config_path(global) {
        Ok(path) => print_path("Project:", &path),
        Err(_) => println!(
            "  {} {}",
            style("Project:").cyan(),
            style("(not in a cellar project)").dim()
        ),
    }

    Ok(())
}

fn run_keys() -> Result<()> {
    println!("{}", style("Available configuration keys:").bold());
    println!();

    for (key, description) in VALID_KEYS {
        println!("  {:<20} {}", style(key).cyan(), style(description).dim());
    }

    println!();
    println!(
        "{}",
        style("Use 'cellar config set <key> <value>' to set a value.").dim()
    );

    Ok(())
}

fn global_config_path() -> Result<PathBuf> {
    Config::global_config_path()
        .ok_or_else(|| miette::miette!("Could not determine global config directory"))
}

fn project_config_path(global: &GlobalOpts) -> Result<PathBuf> {
    Ok(open_project(global)?.config_path())
}

fn target_path(global_scope: bool, global: &GlobalOpts) -> Result<PathBuf> {
    if global_scope {
        global_config_path()
    } else {
        project_config_path(global)
    }
}

fn check_key(key: &str) -> Result<()> {
    if VALID_KEYS.iter().any(|(k, _)| *k == key) {
        Ok(())
    } else {
        Err(miette::miette!(
            help = "Run 'cellar config keys' to list valid keys",
            "Unknown configuration key '{}'",
            key
        ))
    }
}

/// Validate a value for its key, keeping numbers numeric in the YAML
fn parse_value(key: &str, raw: &str) -> Result<Value> {
    match key {
        "oz_per_tin" | "grams_per_tin" => {
            let v: f64 = raw
                .trim()
                .parse()
                .map_err(|_| miette::miette!("'{}' must be a number, got '{}'", key, raw))?;
            if v <= 0.0 {
                return Err(miette::miette!("'{}' must be greater than zero", key));
            }
            serde_yml::to_value(v).into_diagnostic()
        }
        "date_format" => {
            raw.parse::<crate::import::DateFormat>()
                .map_err(|e| miette::miette!("{}", e))?;
            Ok(Value::String(raw.trim().to_string()))
        }
        "default_format" => {
            use clap::ValueEnum;
            crate::cli::OutputFormat::from_str(raw.trim(), true)
                .map_err(|e| miette::miette!("Invalid output format: {}", e))?;
            Ok(Value::String(raw.trim().to_lowercase()))
        }
        _ => Ok(Value::String(raw.to_string())),
    }
}

/// Read a YAML config file as a mapping; missing or empty files give an empty mapping
fn read_mapping(path: &Path) -> Result<Mapping> {
    if !path.exists() {
        return Ok(Mapping::new());
    }
    let content = fs::read_to_string(path).into_diagnostic()?;
    match serde_yml::from_str::<Value>(&content).into_diagnostic()? {
        Value::Mapping(map) => Ok(map),
        Value::Null => Ok(Mapping::new()),
        _ => Err(miette::miette!(
            "Config file is not a mapping: {}",
            path.display()
        )),
    }
}

fn get_config_value(config: &Config, key: &str) -> Option<String> {
    match key {
        "oz_per_tin" => config.oz_per_tin.map(|v| v.to_string()),
        "grams_per_tin" => config.grams_per_tin.map(|v| v.to_string()),
        "date_format" => config.date_format.clone(),
        "default_format" => config.default_format.clone(),
        _ => None,
    }
}

fn print_config_value(key: &str, value: Option<&str>) {
    if let Some(v) = value {
        println!("  {}: {}", style(key).cyan(), style(v).yellow());
    } else {
        println!("  {}: {}", style(key).cyan(), style("(not set)").dim());
    }
}

fn print_path(label: &str, path: &Path) {
    println!("  {} {}", style(label).cyan(), path.display());
    let state = if path.exists() {
        style("(exists)").green()
    } else {
        style("(not created)").dim()
    };
    println!("  {:width$} {}", "", state, width = label.len());
}

fn show_file(title: &str, path: &Path) -> Result<()> {
    println!("{} {}", style(title).bold(), style(path.display()).dim());
    println!();

    if path.exists() {
        let content = fs::read_to_string(path).into_diagnostic()?;
        print!("{}", content);
    } else {
        println!("{}", style("(not created)").dim());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_check_key() {
        assert!(check_key("oz_per_tin").is_ok());
        assert!(check_key("author").is_err());
    }

    #[test]
    fn test_parse_value_keeps_numbers_numeric() {
        let v = parse_value("oz_per_tin", "2").unwrap();
        assert!(matches!(v, Value::Number(_)));
        assert!(parse_value("grams_per_tin", "abc").is_err());
        assert!(parse_value("grams_per_tin", "-5").is_err());
    }

    #[test]
    fn test_parse_value_validates_formats() {
        assert!(parse_value("date_format", "MM/YY").is_ok());
        assert!(parse_value("date_format", "YY/QQ").is_err());
        assert_eq!(
            parse_value("default_format", "JSON").unwrap(),
            Value::String("json".to_string())
        );
        assert!(parse_value("default_format", "xml").is_err());
    }

    #[test]
    fn test_read_mapping() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        assert!(read_mapping(&path).unwrap().is_empty());

        fs::write(&path, "").unwrap();
        assert!(read_mapping(&path).unwrap().is_empty());

        fs::write(&path, "oz_per_tin: 2.0\n").unwrap();
        assert_eq!(read_mapping(&path).unwrap().len(), 1);

        fs::write(&path, "- a\n- b\n").unwrap();
        assert!(read_mapping(&path).is_err());
    }

    #[test]
    fn test_written_value_loads_as_config() {
        let mut map = Mapping::new();
        map.insert(
            Value::String("oz_per_tin".to_string()),
            parse_value("oz_per_tin", "2").unwrap(),
        );
        let yaml = serde_yml::to_string(&map).unwrap();
        let config: Config = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(config.oz_per_tin, Some(2.0));
    }
}
