//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use bookshelf_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "seed_url": config.seed_url,
                    "seed_file": config.seed_file,
                    "page_size": config.page_size,
                    "log_file": config.log_file
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:  {}", config.data_dir.display());
            println!(
                "  seed_url:  {}",
                config.seed_url.as_deref().unwrap_or("(not set)")
            );
            println!("  seed_file: {}", display_path(config.seed_file.as_ref()));
            println!("  page_size: {}", config.page_size);
            println!("  log_file:  {}", display_path(config.log_file.as_ref()));
            println!();
            println!("Config file: {}", effective_path.display());
            println!("Records:     {}", config.storage_path().display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match key.as_str() {
        "data_dir" => {
            config.data_dir = value.clone().into();
        }
        "seed_url" => {
            config.seed_url = optional(&value);
        }
        "seed_file" => {
            config.seed_file = optional(&value).map(PathBuf::from);
        }
        "page_size" => {
            let size: usize = value
                .parse()
                .context("Invalid value for page_size. Use a positive number.")?;
            if size == 0 {
                bail!("Invalid value for page_size. Use a positive number.");
            }
            config.page_size = size;
        }
        "log_file" => {
            config.log_file = optional(&value).map(PathBuf::from);
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, seed_url, seed_file, page_size, log_file",
                key
            );
        }
    }

    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

/// Empty or "none" unsets a value
fn optional(value: &str) -> Option<String> {
    if value.is_empty() || value == "none" {
        None
    } else {
        Some(value.to_string())
    }
}

fn display_path(path: Option<&PathBuf>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "(not set)".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn quiet() -> Output {
        Output::new(OutputFormat::Quiet)
    }

    #[test]
    fn test_set_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let initial = Config {
            data_dir: temp_dir.path().join("data"),
            ..Config::default()
        };
        initial.save_to_path(&path).unwrap();

        set("page_size".to_string(), "12".to_string(), Some(&path), &quiet()).unwrap();
        set(
            "seed_file".to_string(),
            "/srv/books.json".to_string(),
            Some(&path),
            &quiet(),
        )
        .unwrap();

        let saved = Config::load_from_path(&path).unwrap();
        assert_eq!(saved.data_dir, temp_dir.path().join("data"));
        assert_eq!(saved.page_size, 12);
        assert_eq!(saved.seed_file, Some(PathBuf::from("/srv/books.json")));
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        Config {
            data_dir: temp_dir.path().join("data"),
            ..Config::default()
        }
        .save_to_path(&path)
        .unwrap();

        assert!(set("page_size".to_string(), "0".to_string(), Some(&path), &quiet()).is_err());
        assert!(set("colour".to_string(), "red".to_string(), Some(&path), &quiet()).is_err());
    }

    #[test]
    fn test_optional() {
        assert_eq!(optional("none"), None);
        assert_eq!(optional(""), None);
        assert_eq!(optional("x"), Some("x".to_string()));
    }
}
