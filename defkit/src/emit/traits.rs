//! Emitter trait definition.
//!
//! This module defines the `Emitter` trait that output backends implement,
//! together with the formatting options shared by all of them.

use serde::{Deserialize, Serialize};

use crate::error::EmissionError;
use crate::ir::IrDocument;

/// Trait for definition emitters.
///
/// Each emitter transforms one validated IR document into target source
/// text. Emitters must be deterministic: the same document and config
/// always produce byte-identical output.
///
/// # Example
///
/// ```rust
/// use defkit::emit::{EmitConfig, EmittedDocument, Emitter};
/// use defkit::error::EmissionError;
/// use defkit::ir::IrDocument;
///
/// struct NameOnly;
///
/// impl Emitter for NameOnly {
///     fn id(&self) -> &'static str { "name-only" }
///     fn file_extension(&self) -> &'static str { "txt" }
///
///     fn emit(&self, ir: &IrDocument, _config: &EmitConfig) -> Result<EmittedDocument, EmissionError> {
///         Ok(EmittedDocument::new(ir.name(), ir.content_hash(), ir.name()))
///     }
/// }
/// ```
pub trait Emitter: Send + Sync {
    /// Returns the unique identifier for this emitter (e.g. "cue").
    fn id(&self) -> &'static str;

    /// Returns the file extension for emitted files.
    fn file_extension(&self) -> &'static str;

    /// Emit source text for one IR document.
    fn emit(&self, ir: &IrDocument, config: &EmitConfig) -> Result<EmittedDocument, EmissionError>;
}

/// Emitter configuration options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitConfig {
    /// Indentation style
    pub indent: IndentStyle,

    /// Line ending style
    pub line_ending: LineEnding,

    /// Whether to write the generated-code banner with the content hash
    pub banner: bool,

    /// Whether parameter descriptions become `// +usage=` comments
    pub usage_comments: bool,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            indent: IndentStyle::default(),
            line_ending: LineEnding::default(),
            banner: true,
            usage_comments: true,
        }
    }
}

impl EmitConfig {
    /// Create a new emit config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the indentation style.
    pub fn with_indent(mut self, indent: IndentStyle) -> Self {
        self.indent = indent;
        self
    }

    /// Set the line ending style.
    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Set whether to write the generated-code banner.
    pub fn with_banner(mut self, banner: bool) -> Self {
        self.banner = banner;
        self
    }

    /// Set whether to write `// +usage=` comments.
    pub fn with_usage_comments(mut self, usage_comments: bool) -> Self {
        self.usage_comments = usage_comments;
        self
    }
}

/// Indentation style for emitted code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndentStyle {
    /// Tabs, as `cue fmt` writes
    #[default]
    #[serde(rename = "tab")]
    Tabs,

    /// Two spaces
    Spaces2,

    /// Four spaces
    Spaces4,
}

impl IndentStyle {
    /// Get the indentation string.
    pub fn as_str(&self) -> &'static str {
        match self {
            IndentStyle::Tabs => "\t",
            IndentStyle::Spaces2 => "  ",
            IndentStyle::Spaces4 => "    ",
        }
    }

    /// Create an indentation string for the given depth.
    pub fn indent(&self, depth: usize) -> String {
        self.as_str().repeat(depth)
    }
}

/// Line ending style for emitted code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// Unix-style line endings (LF)
    #[default]
    Lf,

    /// Windows-style line endings (CRLF)
    CrLf,
}

impl LineEnding {
    /// Get the line ending string.
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// Emitted source output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedDocument {
    /// The emitted source text
    pub text: String,

    /// Definition name
    pub name: String,

    /// Content hash of the IR the text was emitted from
    pub content_hash: String,

    /// Builtin packages imported by the text
    pub imports: Vec<String>,
}

impl EmittedDocument {
    /// Create a new EmittedDocument instance.
    pub fn new(
        text: impl Into<String>,
        content_hash: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            name: name.into(),
            content_hash: content_hash.into(),
            imports: Vec::new(),
        }
    }

    /// Set the imported packages.
    pub fn with_imports(mut self, imports: Vec<String>) -> Self {
        self.imports = imports;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_config_default() {
        let config = EmitConfig::default();
        assert!(matches!(config.indent, IndentStyle::Tabs));
        assert!(matches!(config.line_ending, LineEnding::Lf));
        assert!(config.banner);
        assert!(config.usage_comments);
    }

    #[test]
    fn test_emit_config_builder() {
        let config = EmitConfig::new()
            .with_indent(IndentStyle::Spaces4)
            .with_line_ending(LineEnding::CrLf)
            .with_banner(false)
            .with_usage_comments(false);

        assert!(matches!(config.indent, IndentStyle::Spaces4));
        assert!(matches!(config.line_ending, LineEnding::CrLf));
        assert!(!config.banner);
        assert!(!config.usage_comments);
    }

    #[test]
    fn test_indent_style() {
        assert_eq!(IndentStyle::Tabs.as_str(), "\t");
        assert_eq!(IndentStyle::Spaces2.as_str(), "  ");
        assert_eq!(IndentStyle::Spaces4.indent(2), "        ");
    }

    #[test]
    fn test_indent_style_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            indent: IndentStyle,
            line_ending: LineEnding,
        }
        let parsed: Wrapper = toml::from_str("indent = \"tab\"\nline_ending = \"crlf\"").unwrap();
        assert_eq!(parsed.indent, IndentStyle::Tabs);
        assert_eq!(parsed.line_ending, LineEnding::CrLf);
        let parsed: Wrapper = toml::from_str("indent = \"spaces2\"\nline_ending = \"lf\"").unwrap();
        assert_eq!(parsed.indent, IndentStyle::Spaces2);
    }

    #[test]
    fn test_emitted_document() {
        let doc = EmittedDocument::new("x: 1\n", "sha256:00", "web");
        assert_eq!(doc.name, "web");
        assert!(doc.imports.is_empty());
        let doc = doc.with_imports(vec!["strings".to_string()]);
        assert_eq!(doc.imports, vec!["strings"]);
    }
}
