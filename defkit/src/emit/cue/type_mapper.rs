//! Parameter schema to CUE type mappings.
//!
//! | Kind | CUE |
//! |------|-----|
//! | `String` | `string & =~"re" & strings.MinRunes(n)` |
//! | `Int` | `int & >=min & <=max` |
//! | `Float` | `number & >=min & <=max` |
//! | `Bool` | `bool` |
//! | `Array` | `[...T] & list.MinItems(n)` |
//! | `Map` | `{[string]: T} & struct.MinFields(n)` |
//! | `Struct` | `{...}` or `close({...})` |
//! | `Enum` | `"a" \| "b"` |
//! | `OneOf` | `close({...}) \| close({...})` |
//!
//! Presence: defaulted `name: *v | T`, required `name: T`, optional
//! `name?: T`.

use std::collections::{BTreeSet, HashSet};

use super::syntax::{label, literal, number, quote, selector, Lines};
use crate::param::{Constraints, ParamKind, ParamSpec, Presence};

/// Maps parameter specs to CUE type expressions, collecting imports.
#[derive(Debug, Clone, Default)]
pub struct CueTypeMapper {
    usage_comments: bool,

    /// Builtin packages referenced so far
    imports: BTreeSet<&'static str>,

    /// Top-level parameters with neither a default nor `required`
    optional_roots: HashSet<String>,
}

impl CueTypeMapper {
    pub fn new(usage_comments: bool) -> Self {
        Self {
            usage_comments,
            ..Self::default()
        }
    }

    /// Builtin packages the rendered types need, sorted.
    pub fn imports(&self) -> Vec<&'static str> {
        self.imports.iter().copied().collect()
    }

    /// The whole `parameter: {...}` block.
    pub fn parameter_block(&mut self, params: &[ParamSpec]) -> Lines {
        self.optional_roots = params
            .iter()
            .filter(|p| p.presence() == Presence::Optional)
            .map(|p| p.name.clone())
            .collect();

        if params.is_empty() {
            return Lines::one("parameter: {}");
        }
        Lines::block("parameter: {", self.fields(params), "}")
    }

    /// Field declarations followed by their conditional requirements.
    fn fields(&mut self, fields: &[ParamSpec]) -> Lines {
        let mut lines = Lines::default();
        for field in fields {
            lines.extend(self.field(field));
        }
        for field in fields {
            for rule in &field.required_when {
                let guard = format!("parameter{}", selector(&rule.field));
                let condition = if self.optional_roots.contains(&rule.field) {
                    format!("if {guard} != _|_ if {guard} == {}", literal(&rule.equals))
                } else {
                    format!("if {guard} == {}", literal(&rule.equals))
                };
                let body = self
                    .map_kind(&field.kind, &field.constraints)
                    .prefix(&format!("{}: ", label(&field.name)));
                lines.extend(Lines::block(&format!("{condition} {{"), body, "}"));
            }
        }
        lines
    }

    fn field(&mut self, spec: &ParamSpec) -> Lines {
        let mut lines = Lines::default();
        if self.usage_comments {
            if let Some(description) = &spec.description {
                lines.push(format!("// +usage={}", description.replace(['\n', '\r'], " ")));
            }
        }
        let marker = match spec.presence() {
            Presence::Optional => "?",
            Presence::Required | Presence::Defaulted => "",
        };
        let value = self.value(spec);
        lines.extend(value.prefix(&format!("{}{marker}: ", label(&spec.name))));
        lines
    }

    /// Type expression with the default disjunction when defaulted.
    pub fn value(&mut self, spec: &ParamSpec) -> Lines {
        let ty = self.map_kind(&spec.kind, &spec.constraints);
        match &spec.default {
            Some(default) => ty.prefix(&format!("*{} | ", literal(default))),
            None => ty,
        }
    }

    /// Map a kind and its constraints to a CUE type expression.
    pub fn map_kind(&mut self, kind: &ParamKind, constraints: &Constraints) -> Lines {
        let base = match kind {
            ParamKind::String => Lines::one("string"),
            ParamKind::Int => Lines::one("int"),
            ParamKind::Float => Lines::one("number"),
            ParamKind::Bool => Lines::one("bool"),
            ParamKind::Array { items } => self
                .map_kind(items, &Constraints::default())
                .prefix("[...")
                .suffix("]"),
            ParamKind::Map { values } => self
                .map_kind(values, &Constraints::default())
                .prefix("{[string]: ")
                .suffix("}"),
            ParamKind::Struct(s) => {
                let (open, close) = if s.closed {
                    ("close({", "})")
                } else {
                    ("{", "}")
                };
                if s.fields.is_empty() {
                    Lines::one(if s.closed { "close({})" } else { "{...}" })
                } else {
                    Lines::block(open, self.fields(&s.fields), close)
                }
            }
            ParamKind::Enum { values } => {
                let alternatives: Vec<String> = values.iter().map(literal).collect();
                Lines::one(if alternatives.is_empty() {
                    "_|_".to_string()
                } else {
                    alternatives.join(" | ")
                })
            }
            ParamKind::OneOf(u) => {
                if u.variants.is_empty() {
                    Lines::one("_|_")
                } else {
                    let variants = u
                        .variants
                        .iter()
                        .map(|variant| {
                            let mut body = Lines::default();
                            if let Some(tag) = &u.discriminator {
                                body.push(format!("{}: {}", label(tag), quote(&variant.name)));
                            }
                            body.extend(self.fields(&variant.fields));
                            if body.0.is_empty() {
                                Lines::one("close({})")
                            } else {
                                Lines::block("close({", body, "})")
                            }
                        })
                        .collect();
                    Lines::join(variants, " | ")
                }
            }
        };

        let bounds = self.constraints(kind, constraints);
        if bounds.is_empty() {
            base
        } else {
            base.suffix(&format!(" & {}", bounds.join(" & ")))
        }
    }

    fn constraints(&mut self, kind: &ParamKind, c: &Constraints) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(pattern) = &c.pattern {
            out.push(format!("=~{}", quote(pattern)));
        }
        if let Some(min) = c.min {
            out.push(format!(">={}", number(min)));
        }
        if let Some(max) = c.max {
            out.push(format!("<={}", number(max)));
        }

        let (package, min_fn, max_fn) = match kind {
            ParamKind::String => ("strings", "MinRunes", "MaxRunes"),
            ParamKind::Array { .. } => ("list", "MinItems", "MaxItems"),
            ParamKind::Map { .. } => ("struct", "MinFields", "MaxFields"),
            _ => return out,
        };
        if let Some(n) = c.min_length {
            self.imports.insert(package);
            out.push(format!("{package}.{min_fn}({n})"));
        }
        if let Some(n) = c.max_length {
            self.imports.insert(package);
            out.push(format!("{package}.{max_fn}({n})"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::{OneOfSchema, StructSchema, VariantSchema};
    use serde_json::json;

    fn text(lines: &Lines) -> String {
        lines
            .0
            .iter()
            .map(|l| format!("{}{}", "\t".repeat(l.depth), l.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn spec(name: &str, kind: ParamKind) -> ParamSpec {
        ParamSpec::new(name, kind)
    }

    #[test]
    fn test_presence_forms() {
        let mut mapper = CueTypeMapper::new(false);

        let mut replicas = spec("replicas", ParamKind::Int);
        replicas.default = Some(json!(3));
        assert_eq!(text(&mapper.field(&replicas)), "replicas: *3 | int");

        let mut image = spec("image", ParamKind::String);
        image.required = true;
        assert_eq!(text(&mapper.field(&image)), "image: string");

        let cpu = spec("cpu", ParamKind::String);
        assert_eq!(text(&mapper.field(&cpu)), "cpu?: string");
    }

    #[test]
    fn test_numeric_bounds() {
        let mut mapper = CueTypeMapper::new(false);
        let mut replicas = spec("replicas", ParamKind::Int);
        replicas.default = Some(json!(3));
        replicas.constraints.min = Some(1.0);
        replicas.constraints.max = Some(100.0);
        assert_eq!(
            text(&mapper.field(&replicas)),
            "replicas: *3 | int & >=1 & <=100"
        );
    }

    #[test]
    fn test_enum_with_default() {
        let mut mapper = CueTypeMapper::new(false);
        let mut expose = spec(
            "exposeType",
            ParamKind::Enum {
                values: vec![json!("a"), json!("b"), json!("c")],
            },
        );
        assert_eq!(text(&mapper.field(&expose)), "exposeType?: \"a\" | \"b\" | \"c\"");
        expose.default = Some(json!("a"));
        assert_eq!(
            text(&mapper.field(&expose)),
            "exposeType: *\"a\" | \"a\" | \"b\" | \"c\""
        );
    }

    #[test]
    fn test_string_constraints_import_strings() {
        let mut mapper = CueTypeMapper::new(false);
        let mut name = spec("name", ParamKind::String);
        name.constraints.pattern = Some("^[a-z]+$".to_string());
        name.constraints.min_length = Some(2);
        assert_eq!(
            text(&mapper.field(&name)),
            "name?: string & =~\"^[a-z]+$\" & strings.MinRunes(2)"
        );
        assert_eq!(mapper.imports(), vec!["strings"]);
    }

    #[test]
    fn test_array_and_map() {
        let mut mapper = CueTypeMapper::new(false);
        let mut args = spec("args", ParamKind::array(ParamKind::String));
        args.constraints.min_length = Some(1);
        assert_eq!(
            text(&mapper.field(&args)),
            "args?: [...string] & list.MinItems(1)"
        );
        let labels = spec("labels", ParamKind::map(ParamKind::String));
        assert_eq!(text(&mapper.field(&labels)), "labels?: {[string]: string}");
        assert_eq!(mapper.imports(), vec!["list"]);
    }

    #[test]
    fn test_closed_struct_and_usage() {
        let mut mapper = CueTypeMapper::new(true);
        let mut cpu = spec("cpu", ParamKind::String);
        cpu.description = Some("CPU limit".to_string());
        let mut resources = spec(
            "resources",
            ParamKind::Struct(StructSchema {
                fields: vec![cpu],
                closed: true,
            }),
        );
        resources.required = true;
        assert_eq!(
            text(&mapper.field(&resources)),
            "resources: close({\n\t// +usage=CPU limit\n\tcpu?: string\n})"
        );
    }

    #[test]
    fn test_one_of_with_discriminator() {
        let mut mapper = CueTypeMapper::new(false);
        let mut url = spec("url", ParamKind::String);
        url.required = true;
        let mut image = spec("image", ParamKind::String);
        image.required = true;
        let mut source = spec(
            "source",
            ParamKind::OneOf(OneOfSchema {
                discriminator: Some("type".to_string()),
                variants: vec![
                    VariantSchema::new("git", vec![url]),
                    VariantSchema::new("oci", vec![image]),
                ],
            }),
        );
        source.required = true;
        assert_eq!(
            text(&mapper.field(&source)),
            "source: close({\n\ttype: \"git\"\n\turl: string\n}) | close({\n\ttype: \"oci\"\n\timage: string\n})"
        );
    }

    #[test]
    fn test_required_when_guards_optional_roots() {
        let mut mapper = CueTypeMapper::new(false);
        let mode = spec("mode", ParamKind::String);
        let mut token = spec("token", ParamKind::String);
        token.required_when.push(crate::param::RequiredWhen {
            field: "mode".to_string(),
            equals: json!("private"),
        });
        let block = mapper.parameter_block(&[mode, token]);
        assert_eq!(
            text(&block),
            "parameter: {\n\tmode?: string\n\ttoken?: string\n\tif parameter.mode != _|_ if parameter.mode == \"private\" {\n\t\ttoken: string\n\t}\n}"
        );
    }

    #[test]
    fn test_required_when_quotes_trigger_selector() {
        let mut mapper = CueTypeMapper::new(false);
        let mut mode = spec("access-mode", ParamKind::String);
        mode.default = Some(json!("public"));
        let mut token = spec("token", ParamKind::String);
        token.required_when.push(crate::param::RequiredWhen {
            field: "access-mode".to_string(),
            equals: json!("private"),
        });
        let block = text(&mapper.parameter_block(&[mode, token]));
        assert!(block.contains("\tif parameter[\"access-mode\"] == \"private\" {\n"));
        assert!(!block.contains("parameter.access-mode"));
    }
}
