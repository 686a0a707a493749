//! Configuration file loading for the CLI
//!
//! Settings come from a TOML file found in one of several places (explicit
//! path, working directory, platform config directory) or fall back to
//! defaults.
//!
//! ```toml
//! [render]
//! show_file_path = false
//! max_line_width = 100
//!
//! [parser]
//! max_errors = 50
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use limit_diagnostics::RenderOptions;
use limit_parse::{ParserConfig, MAX_ERRORS};
use log::{debug, info};
use serde::Deserialize;
use thiserror::Error;

pub const LOCAL_CONFIG: &str = "limit.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML configuration {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("Validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub render: RenderOptions,
    pub parser: ParserSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserSettings {
    pub max_errors: usize,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            max_errors: MAX_ERRORS,
        }
    }
}

impl AppConfig {
    pub fn parser_config(&self, build_cst: bool) -> ParserConfig {
        ParserConfig {
            build_cst,
            max_errors: self.parser.max_errors,
        }
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.parser.max_errors == 0 {
            return Err(ConfigError::Validation(
                "parser.max_errors must be at least 1".to_string(),
            ));
        }
        if self.render.max_line_width < 8 {
            return Err(ConfigError::Validation(format!(
                "render.max_line_width must be at least 8, got {}",
                self.render.max_line_width
            )));
        }
        Ok(self)
    }
}

/// Find and load configuration.
///
/// Search order: `explicit_path`, `./limit.toml`, the platform config
/// directory, then defaults. An explicit path that does not exist is an
/// error; the other locations are optional.
pub fn load_config(explicit_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    if let Some(path) = explicit_path {
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local = Path::new(LOCAL_CONFIG);
    if local.exists() {
        info!(path = local.display().to_string(); "Loading configuration from working directory");
        return load_config_file(local);
    }

    if let Some(dirs) = ProjectDirs::from("org", "limit-lang", "limit") {
        let system = dirs.config_dir().join("config.toml");
        if system.exists() {
            info!(path = system.display().to_string(); "Loading configuration from system path");
            return load_config_file(&system);
        }
        debug!(path = system.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using defaults");
    Ok(AppConfig::default())
}

pub fn load_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()));
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: AppConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("limit.toml");
        fs::write(&path, contents).expect("write config");
        (dir, path)
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let (_dir, path) = write("[parser]\nmax_errors = 5\n");
        let config = load_config_file(&path).unwrap();
        assert_eq!(config.parser.max_errors, 5);
        assert_eq!(config.render, RenderOptions::default());
    }

    #[test]
    fn render_section() {
        let (_dir, path) = write("[render]\nuse_colors = false\ncontext_before = 1\n");
        let config = load_config_file(&path).unwrap();
        assert!(!config.render.use_colors);
        assert_eq!(config.render.context_before, 1);
        assert_eq!(config.render.max_line_width, 120);
        assert_eq!(config.parser_config(true).max_errors, MAX_ERRORS);
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope.toml");
        let err = load_config(Some(&missing)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile(p) if p == missing));
    }

    #[test]
    fn malformed_toml() {
        let (_dir, path) = write("[parser\nmax_errors = 5\n");
        let err = load_config_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().starts_with("Failed to parse TOML configuration"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let (_dir, path) = write("[parser]\nmax_warnings = 1\n");
        assert!(matches!(
            load_config_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn zero_error_limit_fails_validation() {
        let (_dir, path) = write("[parser]\nmax_errors = 0\n");
        let err = load_config_file(&path).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: parser.max_errors must be at least 1"
        );
    }
}
