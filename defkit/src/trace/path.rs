//! Field paths into the output resource tree.
//!
//! Paths use dotted syntax with list indices and quoted keys:
//! `spec.containers[0].image`, `metadata.labels["app.oam.dev/name"]`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    Field(String),
    Index(usize),
}

impl Segment {
    pub fn as_field(&self) -> Option<&str> {
        match self {
            Segment::Field(name) => Some(name),
            Segment::Index(_) => None,
        }
    }
}

/// A parsed, non-empty path from the template root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath {
    segments: Vec<Segment>,
}

/// Top-level template fields a definition may not write to.
const RESERVED_ROOTS: &[&str] = &["parameter", "context"];

impl FieldPath {
    /// Parse a path string.
    pub fn parse(input: &str) -> Result<Self, SchemaError> {
        let invalid = |reason: &str| SchemaError::InvalidPath {
            path: input.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut chars = input.chars().peekable();
        let mut expect_field = true;

        while let Some(&c) = chars.peek() {
            match c {
                '.' => {
                    if expect_field {
                        return Err(invalid("empty field name"));
                    }
                    chars.next();
                    expect_field = true;
                }
                '[' => {
                    if expect_field && !segments.is_empty() {
                        return Err(invalid("empty field name"));
                    }
                    chars.next();
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        let mut key = String::new();
                        loop {
                            match chars.next() {
                                Some('\\') => match chars.next() {
                                    Some(escaped) => key.push(escaped),
                                    None => return Err(invalid("unterminated quoted key")),
                                },
                                Some('"') => break,
                                Some(other) => key.push(other),
                                None => return Err(invalid("unterminated quoted key")),
                            }
                        }
                        if chars.next() != Some(']') {
                            return Err(invalid("expected ']' after quoted key"));
                        }
                        segments.push(Segment::Field(key));
                    } else {
                        if expect_field {
                            return Err(invalid("path cannot start with an index"));
                        }
                        let mut digits = String::new();
                        loop {
                            match chars.next() {
                                Some(']') => break,
                                Some(d) => digits.push(d),
                                None => return Err(invalid("unterminated index")),
                            }
                        }
                        let index = digits
                            .parse::<usize>()
                            .map_err(|_| invalid("list index must be a non-negative integer"))?;
                        segments.push(Segment::Index(index));
                    }
                    expect_field = false;
                }
                ']' | '"' => return Err(invalid("unexpected character")),
                _ => {
                    if !expect_field {
                        return Err(invalid("expected '.' or '[' between segments"));
                    }
                    let mut name = String::new();
                    while let Some(&n) = chars.peek() {
                        if matches!(n, '.' | '[' | ']' | '"') {
                            break;
                        }
                        name.push(n);
                        chars.next();
                    }
                    segments.push(Segment::Field(name));
                    expect_field = false;
                }
            }
        }

        if segments.is_empty() {
            return Err(invalid("path is empty"));
        }
        if expect_field {
            return Err(invalid("trailing '.'"));
        }
        Ok(Self { segments })
    }

    /// Parse a path that a definition is allowed to write to.
    pub fn writable(input: &str) -> Result<Self, SchemaError> {
        let path = Self::parse(input)?;
        path.check_writable()?;
        Ok(path)
    }

    pub fn from_segments(segments: Vec<Segment>) -> Option<Self> {
        (!segments.is_empty()).then_some(Self { segments })
    }

    pub fn check_writable(&self) -> Result<(), SchemaError> {
        match self.root() {
            Some(root) if RESERVED_ROOTS.contains(&root) => Err(SchemaError::ReservedPath {
                path: self.to_string(),
            }),
            _ => Ok(()),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Name of the top-level template field.
    pub fn root(&self) -> Option<&str> {
        self.segments.first().and_then(Segment::as_field)
    }

    pub fn join(&self, other: &FieldPath) -> FieldPath {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        FieldPath { segments }
    }

    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// The remainder after `prefix`, if any segments remain.
    pub fn strip_prefix(&self, prefix: &FieldPath) -> Option<FieldPath> {
        self.segments
            .strip_prefix(prefix.segments.as_slice())
            .and_then(|rest| FieldPath::from_segments(rest.to_vec()))
    }

    pub fn has_index(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Index(_)))
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Field(name) if is_bare(name) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(name)?;
                }
                Segment::Field(name) => {
                    write!(f, "[\"{}\"]", name.replace('\\', "\\\\").replace('"', "\\\""))?;
                }
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

fn is_bare(name: &str) -> bool {
    !name.is_empty() && !name.contains(['.', '[', ']', '"', '\\'])
}

impl FromStr for FieldPath {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str) -> Segment {
        Segment::Field(name.to_string())
    }

    #[test]
    fn test_parse_dotted_with_index() {
        let path = FieldPath::parse("spec.containers[0].image").unwrap();
        assert_eq!(
            path.segments(),
            &[field("spec"), field("containers"), Segment::Index(0), field("image")]
        );
        assert_eq!(path.to_string(), "spec.containers[0].image");
    }

    #[test]
    fn test_parse_quoted_key() {
        let path = FieldPath::parse(r#"metadata.labels["app.oam.dev/name"]"#).unwrap();
        assert_eq!(path.segments()[2], field("app.oam.dev/name"));
        assert_eq!(path.to_string(), r#"metadata.labels["app.oam.dev/name"]"#);
    }

    #[test]
    fn test_first_segment_quoted_key_roundtrips() {
        let path = FieldPath::from_segments(vec![field("a.b"), field("c")]).unwrap();
        assert_eq!(path.to_string(), r#"["a.b"].c"#);
        assert_eq!(FieldPath::parse(&path.to_string()).unwrap(), path);
    }

    #[test]
    fn test_rejects_malformed() {
        for input in ["", ".a", "a.", "a..b", "[0]", "a[x]", "a[\"b]", "a]b", "a[0]b", "a[0", "a[1", "a["] {
            assert!(
                matches!(FieldPath::parse(input), Err(SchemaError::InvalidPath { .. })),
                "expected '{input}' to be rejected"
            );
        }
    }

    #[test]
    fn test_reserved_roots() {
        assert!(matches!(
            FieldPath::writable("parameter.image"),
            Err(SchemaError::ReservedPath { .. })
        ));
        assert!(matches!(
            FieldPath::writable("context.name"),
            Err(SchemaError::ReservedPath { .. })
        ));
        assert!(FieldPath::writable("output.spec").is_ok());
    }

    #[test]
    fn test_prefix_helpers() {
        let root = FieldPath::parse("outputs.service").unwrap();
        let full = FieldPath::parse("outputs.service.spec.ports").unwrap();
        assert!(full.starts_with(&root));
        assert_eq!(full.strip_prefix(&root).unwrap().to_string(), "spec.ports");
        assert!(root.strip_prefix(&root).is_none());
    }

    #[test]
    fn test_serde_as_string() {
        let path = FieldPath::parse("spec.replicas").unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"spec.replicas\"");
        let back: FieldPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }
}
