//! CUE lexical helpers and the line buffer used by the emitter.

use serde_json::Value;

use crate::emit::EmitConfig;

/// CUE keywords that must be quoted when used as labels.
const KEYWORDS: &[&str] = &[
    "package", "import", "for", "in", "if", "let", "true", "false", "null", "div", "mod", "quo",
    "rem",
];

/// Render a field label, quoting when it is not a plain identifier.
///
/// Labels starting with `_` or `#` would declare hidden fields or
/// definitions, so they are quoted too.
pub fn label(name: &str) -> String {
    let mut chars = name.chars();
    let bare = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        && !KEYWORDS.contains(&name);
    if bare {
        name.to_string()
    } else {
        quote(name)
    }
}

/// Render a selector step: `.name` or `["quoted-name"]`.
pub fn selector(name: &str) -> String {
    let rendered = label(name);
    if rendered.starts_with('"') {
        format!("[{rendered}]")
    } else {
        format!(".{rendered}")
    }
}

/// Double-quoted CUE string literal.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    out.push_str(&escape(s));
    out.push('"');
    out
}

/// Escape string contents for a double-quoted literal.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// Render a concrete JSON value as an inline CUE literal.
pub fn literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote(s),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(literal).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let fields: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", label(k), literal(v)))
                .collect();
            format!("{{{}}}", fields.join(", "))
        }
    }
}

/// Render a numeric bound, dropping a zero fraction.
pub fn number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// One output line at a depth relative to its enclosing block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub depth: usize,
    pub text: String,
    /// Written without indentation (raw passthrough text)
    pub verbatim: bool,
}

impl Line {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            depth: 0,
            text: text.into(),
            verbatim: false,
        }
    }

    pub fn verbatim(text: impl Into<String>) -> Self {
        Self {
            depth: 0,
            text: text.into(),
            verbatim: true,
        }
    }
}

/// A multi-line rendering fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lines(pub Vec<Line>);

impl Lines {
    pub fn one(text: impl Into<String>) -> Self {
        Lines(vec![Line::new(text)])
    }

    pub fn push(&mut self, text: impl Into<String>) {
        self.0.push(Line::new(text));
    }

    pub fn extend(&mut self, other: Lines) {
        self.0.extend(other.0);
    }

    /// Append `other` one level deeper.
    pub fn extend_indented(&mut self, other: Lines) {
        self.0.extend(other.0.into_iter().map(|mut line| {
            line.depth += 1;
            line
        }));
    }

    pub fn prefix(mut self, prefix: &str) -> Self {
        if let Some(first) = self.0.first_mut() {
            first.text.insert_str(0, prefix);
        } else {
            self.0.push(Line::new(prefix));
        }
        self
    }

    pub fn suffix(mut self, suffix: &str) -> Self {
        if let Some(last) = self.0.last_mut() {
            last.text.push_str(suffix);
        } else {
            self.0.push(Line::new(suffix));
        }
        self
    }

    /// Wrap in `open` / `close` with the body one level deeper.
    pub fn block(open: &str, body: Lines, close: &str) -> Self {
        let mut lines = Lines::one(open);
        lines.extend_indented(body);
        lines.push(close);
        lines
    }

    /// Join fragments inline: the last line of one fragment and the first
    /// line of the next share a line, separated by `sep`.
    pub fn join(parts: Vec<Lines>, sep: &str) -> Self {
        let mut out = Lines::default();
        for (i, part) in parts.into_iter().enumerate() {
            let mut lines = part.0.into_iter();
            match (i, lines.next()) {
                (_, None) => continue,
                (0, Some(first)) => out.0.push(first),
                (_, Some(first)) => {
                    if let Some(last) = out.0.last_mut() {
                        last.text.push_str(sep);
                        last.text.push_str(&first.text);
                    } else {
                        out.0.push(first);
                    }
                }
            }
            out.0.extend(lines);
        }
        out
    }

    /// Render with the configured indentation and line ending.
    pub fn render(&self, config: &EmitConfig) -> String {
        let newline = config.line_ending.as_str();
        let mut out = String::new();
        for line in &self.0 {
            if !line.verbatim && !line.text.is_empty() {
                out.push_str(&config.indent.indent(line.depth));
            }
            out.push_str(&line.text);
            out.push_str(newline);
        }
        out
    }
}

impl<S: Into<String>> FromIterator<S> for Lines {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Lines(iter.into_iter().map(Line::new).collect())
    }
}
