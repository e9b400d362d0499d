//! Shared helper functions for CLI commands

use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};
use miette::{IntoDiagnostic, Result};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{CellarStore, Config, Project};

/// Locate the project from `--project` or the current directory
pub fn open_project(global: &GlobalOpts) -> Result<Project> {
    Project::locate(global.project.as_deref()).map_err(|e| miette::miette!("{}", e))
}

/// Locate the project and open its database
pub fn open_store(global: &GlobalOpts) -> Result<(Project, CellarStore)> {
    let project = open_project(global)?;
    let store = CellarStore::open(&project).map_err(|e| miette::miette!("{}", e))?;
    Ok((project, store))
}

/// Output format with `auto` resolved against config
pub fn output_format(global: &GlobalOpts, config: &Config) -> OutputFormat {
    global.format.resolve(config.default_format.as_deref())
}

/// Ask before a destructive step. `--yes` skips the prompt; without a
/// terminal to ask on, the step is refused.
pub fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    if !console::user_attended() {
        eprintln!(
            "{} {} (pass --yes to proceed without a prompt)",
            style("!").yellow(),
            prompt
        );
        return Ok(false);
    }
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()
        .into_diagnostic()
}

/// Print a JSON value to stdout
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{}", json);
    Ok(())
}

/// Parse a `yes/no` style flag argument
pub fn parse_flag(s: &str) -> std::result::Result<bool, String> {
    match s.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "on" => Ok(true),
        "false" | "no" | "n" | "0" | "off" => Ok(false),
        _ => Err(format!("Invalid value '{}'. Use true or false", s)),
    }
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Rating with two decimals, or empty when unrated
pub fn format_rating(rating: Option<f64>) -> String {
    rating.map(|r| format!("{:.2}", r)).unwrap_or_default()
}
