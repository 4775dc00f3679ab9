//! Configuration management.
//!
//! This module handles loading compiler settings from `defkit.toml` files.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::emit::{EmitConfig, IndentStyle, LineEnding};
use crate::error::ConfigError;

/// Default configuration filename.
pub const CONFIG_FILENAME: &str = "defkit.toml";

/// Main configuration structure.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DefkitConfig {
    /// Output formatting.
    pub emit: EmitSection,

    /// Validation policy.
    pub validate: ValidateSection,
}

/// `[emit]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EmitSection {
    /// Indentation: `tab`, `spaces2` or `spaces4`.
    pub indent: IndentStyle,

    /// Line endings: `lf` or `crlf`.
    pub line_ending: LineEnding,

    /// Whether to write the generated-code banner.
    pub banner: bool,

    /// Whether parameter descriptions become `// +usage=` comments.
    pub usage_comments: bool,
}

/// `[validate]` section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ValidateSection {
    /// Treat warnings as blocking errors.
    pub warnings_as_errors: bool,

    /// Warning codes to suppress.
    pub allow: Vec<String>,
}

impl Default for EmitSection {
    fn default() -> Self {
        let defaults = EmitConfig::default();
        Self {
            indent: defaults.indent,
            line_ending: defaults.line_ending,
            banner: defaults.banner,
            usage_comments: defaults.usage_comments,
        }
    }
}

impl DefkitConfig {
    /// Emitter options from the `[emit]` section.
    pub fn to_emit_config(&self) -> EmitConfig {
        EmitConfig::new()
            .with_indent(self.emit.indent)
            .with_line_ending(self.emit.line_ending)
            .with_banner(self.emit.banner)
            .with_usage_comments(self.emit.usage_comments)
    }

    fn check(&self) -> Result<(), ConfigError> {
        for code in &self.validate.allow {
            if !is_warning_code(code) {
                return Err(ConfigError::invalid_value(
                    "validate.allow",
                    format!("'{code}' is not a warning code (DEFKIT-Wnnn or IR-Wnnn)"),
                ));
            }
        }
        Ok(())
    }
}

fn is_warning_code(code: &str) -> bool {
    let digits = code
        .strip_prefix("DEFKIT-W")
        .or_else(|| code.strip_prefix("IR-W"));
    matches!(digits, Some(d) if d.len() == 3 && d.chars().all(|c| c.is_ascii_digit()))
}

/// Configuration manager for loading configs.
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration from a file path.
    ///
    /// If the path is None, attempts to load `defkit.toml` from the current
    /// directory and falls back to defaults when it does not exist. An
    /// explicit path that does not exist is an error.
    pub fn load(path: Option<&Path>) -> Result<DefkitConfig, ConfigError> {
        let config_path = match path {
            Some(path) if !path.exists() => {
                return Err(ConfigError::NotFound {
                    path: path.to_path_buf(),
                })
            }
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(CONFIG_FILENAME);
                if !default.exists() {
                    tracing::debug!("no {CONFIG_FILENAME} found, using defaults");
                    return Ok(DefkitConfig::default());
                }
                default
            }
        };

        let content = std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;
        let config = Self::parse(&content)
            .map_err(|e| match e {
                ConfigError::InvalidToml { message, .. } => {
                    ConfigError::invalid_toml(config_path.clone(), message)
                }
                other => other,
            })?;

        tracing::debug!(path = %config_path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parse configuration text.
    pub fn parse(content: &str) -> Result<DefkitConfig, ConfigError> {
        let config: DefkitConfig = toml::from_str(content)
            .map_err(|e| ConfigError::invalid_toml(PathBuf::new(), e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    /// Generate default configuration file content with comments.
    pub fn default_config_content() -> &'static str {
        r#"# defkit configuration file

[emit]
# Indentation of emitted CUE (tab, spaces2, spaces4)
indent = "tab"

# Line endings (lf, crlf)
line_ending = "lf"

# Write the "Code generated by defkit" banner with the IR content hash
banner = true

# Turn parameter descriptions into // +usage= comments
usage_comments = true

[validate]
# Fail compilation on warnings as well as errors
warnings_as_errors = false

# Warning codes to suppress (e.g. "DEFKIT-W002")
allow = []
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DefkitConfig::default();
        assert_eq!(config.emit.indent, IndentStyle::Tabs);
        assert_eq!(config.emit.line_ending, LineEnding::Lf);
        assert!(config.emit.banner);
        assert!(config.emit.usage_comments);
        assert!(!config.validate.warnings_as_errors);
        assert!(config.validate.allow.is_empty());
        assert_eq!(config.to_emit_config(), EmitConfig::default());
    }

    #[test]
    fn test_default_content_parses_to_defaults() {
        let parsed = ConfigManager::parse(ConfigManager::default_config_content()).unwrap();
        assert_eq!(parsed, DefkitConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let parsed = ConfigManager::parse("[emit]\nindent = \"spaces2\"\n").unwrap();
        assert_eq!(parsed.emit.indent, IndentStyle::Spaces2);
        assert!(parsed.emit.banner);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            ConfigManager::parse("[emit]\nindent = \"tabs4\"\n"),
            Err(ConfigError::InvalidToml { .. })
        ));
        assert!(matches!(
            ConfigManager::parse("[validate]\nallow = [\"DEFKIT-E001\"]\n"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_warning_codes() {
        assert!(is_warning_code("DEFKIT-W001"));
        assert!(is_warning_code("IR-W001"));
        assert!(!is_warning_code("DEFKIT-E001"));
        assert!(!is_warning_code("DEFKIT-W1"));
    }
}
