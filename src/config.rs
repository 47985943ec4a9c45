// ⚙️ Settings - runtime configuration for the CLI and the API server
//
// Sources, later ones win:
//   1. fintrack.json in the working directory (optional)
//   2. the file given with --config (required when given)
//   3. FINTRACK_* environment variables, one per field
//      (FINTRACK_DATABASE_PATH, FINTRACK_DEMO_MODE, FINTRACK_BIND_ADDR,
//      FINTRACK_TRAILING_MONTHS; FINTRACK_DB, FINTRACK_DEMO and FINTRACK_BIND
//      are accepted as short names)

use anyhow::{bail, Context, Result};
use ::config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_SETTINGS_FILE: &str = "fintrack.json";
/// Prefix for settings environment variables
pub const SETTINGS_ENV_PREFIX: &str = "FINTRACK";
/// Longest trailing chart window accepted (ten years)
pub const MAX_TRAILING_MONTHS: usize = 120;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(alias = "db")]
    pub database_path: PathBuf,
    /// Serve canned demo data instead of the database
    #[serde(alias = "demo")]
    pub demo_mode: bool,
    #[serde(alias = "bind")]
    pub bind_addr: String,
    /// Months in the trailing chart window
    pub trailing_months: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_path: PathBuf::from("fintrack.db"),
            demo_mode: false,
            bind_addr: "0.0.0.0:3000".to_string(),
            trailing_months: crate::period::DEFAULT_WINDOW,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.trailing_months == 0 || self.trailing_months > MAX_TRAILING_MONTHS {
            bail!(
                "trailing_months must be between 1 and {}, got {}",
                MAX_TRAILING_MONTHS,
                self.trailing_months
            );
        }
        if self.bind_addr.trim().is_empty() {
            bail!("bind_addr must not be empty");
        }
        Ok(())
    }
}

/// Load settings from the default file, `path` and the process environment
pub fn resolve_settings(path: Option<&Path>) -> Result<Settings> {
    load_settings(path, None)
}

/// `env` replaces the process environment when given
fn load_settings(path: Option<&Path>, env: Option<::config::Map<String, String>>) -> Result<Settings> {
    let mut builder = Config::builder()
        .add_source(File::new(DEFAULT_SETTINGS_FILE, FileFormat::Json).required(false));

    if let Some(explicit) = path {
        builder = builder.add_source(File::from(explicit).format(FileFormat::Json).required(true));
    }

    let raw = builder
        .add_source(
            Environment::with_prefix(SETTINGS_ENV_PREFIX)
                .try_parsing(true)
                .source(env),
        )
        .build()
        .context("Reading settings")?;

    let settings: Settings = raw.try_deserialize().context("Parsing settings")?;
    settings.validate()?;
    debug!(?settings, "settings loaded");
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn json_file(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn env(vars: &[(&str, &str)]) -> Option<::config::Map<String, String>> {
        Some(vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    #[test]
    fn test_defaults() {
        let settings = load_settings(None, env(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.trailing_months, 6);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = json_file(r#"{ "demo_mode": true }"#);

        let settings = load_settings(Some(file.path()), env(&[])).unwrap();
        assert!(settings.demo_mode);
        assert_eq!(settings.database_path, PathBuf::from("fintrack.db"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let file = json_file("not json");
        assert!(load_settings(Some(file.path()), env(&[])).is_err());
    }

    #[test]
    fn test_explicit_missing_path_is_an_error() {
        assert!(load_settings(Some(Path::new("/no/such/fintrack.json")), env(&[])).is_err());
    }

    #[test]
    fn test_every_field_has_an_env_override() {
        let settings = load_settings(
            None,
            env(&[
                ("FINTRACK_DATABASE_PATH", "/tmp/other.db"),
                ("FINTRACK_DEMO_MODE", "on"),
                ("FINTRACK_BIND_ADDR", "127.0.0.1:8080"),
                ("FINTRACK_TRAILING_MONTHS", "3"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.database_path, PathBuf::from("/tmp/other.db"));
        assert!(settings.demo_mode);
        assert_eq!(settings.bind_addr, "127.0.0.1:8080");
        assert_eq!(settings.trailing_months, 3);
    }

    #[test]
    fn test_short_env_names() {
        let settings = load_settings(
            None,
            env(&[("FINTRACK_DB", "/tmp/short.db"), ("FINTRACK_DEMO", "TRUE")]),
        )
        .unwrap();
        assert_eq!(settings.database_path, PathBuf::from("/tmp/short.db"));
        assert!(settings.demo_mode);
    }

    #[test]
    fn test_env_beats_file() {
        let file = json_file(r#"{ "trailing_months": 12, "bind_addr": "0.0.0.0:9000" }"#);
        let settings = load_settings(Some(file.path()), env(&[("FINTRACK_TRAILING_MONTHS", "4")])).unwrap();
        assert_eq!(settings.trailing_months, 4);
        assert_eq!(settings.bind_addr, "0.0.0.0:9000");
    }

    #[test]
    fn test_trailing_months_is_bounded() {
        assert!(load_settings(None, env(&[("FINTRACK_TRAILING_MONTHS", "0")])).is_err());
        assert!(load_settings(None, env(&[("FINTRACK_TRAILING_MONTHS", "100000000")])).is_err());
        assert!(load_settings(None, env(&[("FINTRACK_TRAILING_MONTHS", "120")])).is_ok());
    }

    #[test]
    fn test_unparsable_bool_is_an_error() {
        assert!(load_settings(None, env(&[("FINTRACK_DEMO_MODE", "maybe")])).is_err());
    }
}
