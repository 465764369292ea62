use anyhow::{anyhow, Result};
use colored::*;
use settings::{FileSettings, SettingsProvider, REGISTERED_KEYS};
use std::collections::BTreeMap;
use std::path::Path;

/// List all stored settings
pub fn list(path: &Path, format: &str) -> Result<()> {
    let settings = FileSettings::open(path)?;
    let values = settings.all();

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&values)?),
        "yaml" => print!("{}", serde_yaml::to_string(&values)?),
        _ => print_settings_text(path, &values),
    }

    Ok(())
}

/// Print one setting. Unset registered keys print nothing.
pub fn get(path: &Path, key: &str) -> Result<()> {
    if !REGISTERED_KEYS.contains(&key) {
        return Err(anyhow!(
            "Unknown setting '{}'. Known settings: {}",
            key,
            REGISTERED_KEYS.join(", ")
        ));
    }

    let settings = FileSettings::open(path)?;
    if let Some(value) = settings.get(key) {
        println!("{}", value);
    }
    Ok(())
}

/// Store one setting and echo the sanitized value
pub fn set(path: &Path, key: &str, value: &str) -> Result<()> {
    let settings = FileSettings::open(path)?;
    let stored = settings.set(key, value)?;

    if stored != value {
        eprintln!(
            "{} value was sanitized before storing",
            "Note:".yellow().bold()
        );
    }
    println!("{} {} = {}", "Saved".green().bold(), key, stored);
    Ok(())
}

fn print_settings_text(path: &Path, values: &BTreeMap<String, String>) {
    println!("{}", "=== Auto Register Settings ===".bold());
    println!("File: {}", path.display());
    println!();

    for key in REGISTERED_KEYS {
        match values.get(key) {
            Some(value) => println!("{:<22} {}", key.cyan(), value),
            None => println!("{:<22} {}", key.cyan(), "(unset)".dimmed()),
        }
    }

    println!();
    println!("Total settings: {}", values.len());
}
