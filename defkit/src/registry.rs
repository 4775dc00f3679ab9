//! Definition registry.
//!
//! An explicit registry object that callers build during an initialization
//! phase and pass around. There is no global registration.

use std::collections::BTreeMap;
use std::fmt;

use crate::compile::{Compiled, Compiler};
use crate::error::{CompileResult, RegistryError};
use crate::trace::Definition;

/// Where a definition came from. Custom definitions shadow core ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Origin {
    Core,
    Custom,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Origin::Core => "core",
            Origin::Custom => "custom",
        })
    }
}

#[derive(Debug, Clone)]
struct Entry {
    definition: Definition,
    origin: Origin,
}

/// Registry of definitions by qualified name (`<namespace>/<name>`).
///
/// # Resolution
///
/// 1. Exact qualified name
/// 2. Exact short name
/// 3. Qualified-name suffix
///
/// Within a stage a single match wins. Several matches resolve to the only
/// `Custom` one if there is exactly one; otherwise the lookup is ambiguous.
///
/// # Example
///
/// ```rust
/// use defkit::{Definition, DefinitionRegistry, Origin};
///
/// let mut registry = DefinitionRegistry::new();
/// registry.register("vela", Definition::component("webservice"), Origin::Core).unwrap();
/// registry.register("acme", Definition::component("webservice"), Origin::Custom).unwrap();
///
/// let resolved = registry.resolve("webservice").unwrap();
/// assert_eq!(registry.qualified_name_of(resolved), Some("acme/webservice"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DefinitionRegistry {
    /// All registered definitions by qualified name
    entries: BTreeMap<String, Entry>,
}

impl DefinitionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition under `namespace`.
    pub fn register(
        &mut self,
        namespace: &str,
        definition: Definition,
        origin: Origin,
    ) -> Result<(), RegistryError> {
        let qualified = qualify(namespace, definition.name());
        if self.entries.contains_key(&qualified) {
            return Err(RegistryError::Duplicate { name: qualified });
        }

        for (other, entry) in &self.entries {
            if entry.definition.name() == definition.name() && entry.origin != origin {
                let (winner, loser) = if origin == Origin::Custom {
                    (qualified.as_str(), other.as_str())
                } else {
                    (other.as_str(), qualified.as_str())
                };
                tracing::warn!(%winner, %loser, "custom definition shadows core definition");
            }
        }

        tracing::debug!(name = %qualified, %origin, "registered definition");
        self.entries.insert(qualified, Entry { definition, origin });
        Ok(())
    }

    /// Resolve a qualified or short name.
    pub fn resolve(&self, name: &str) -> Result<&Definition, RegistryError> {
        if let Some(entry) = self.entries.get(name) {
            return Ok(&entry.definition);
        }

        let short = self.matching(|_, entry| entry.definition.name() == name);
        let candidates = if short.is_empty() {
            self.matching(|qualified, _| qualified.ends_with(name))
        } else {
            short
        };
        match candidates.as_slice() {
            [] => {}
            [(_, entry)] => return Ok(&entry.definition),
            many => return pick_custom(name, many),
        }

        Err(RegistryError::NotFound {
            name: name.to_string(),
        })
    }

    fn matching(&self, predicate: impl Fn(&str, &Entry) -> bool) -> Vec<(&String, &Entry)> {
        self.entries
            .iter()
            .filter(|(qualified, entry)| predicate(qualified, entry))
            .collect()
    }

    /// Qualified name a resolved definition was registered under.
    pub fn qualified_name_of(&self, definition: &Definition) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, entry)| std::ptr::eq(&entry.definition, definition))
            .map(|(qualified, _)| qualified.as_str())
    }

    /// Check if a qualified name is registered.
    pub fn contains(&self, qualified: &str) -> bool {
        self.entries.contains_key(qualified)
    }

    /// Registered qualified names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Compile every registered definition in parallel, keyed by qualified name.
    pub fn compile_all(&self, compiler: &Compiler) -> BTreeMap<String, CompileResult<Compiled>> {
        let items: Vec<(String, &Definition)> = self
            .entries
            .iter()
            .map(|(qualified, entry)| (qualified.clone(), &entry.definition))
            .collect();
        compiler.compile_keyed(&items)
    }
}

fn qualify(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}/{name}")
    }
}

fn pick_custom<'a>(
    name: &str,
    candidates: &[(&String, &'a Entry)],
) -> Result<&'a Definition, RegistryError> {
    let custom: Vec<&(&String, &Entry)> = candidates
        .iter()
        .filter(|(_, entry)| entry.origin == Origin::Custom)
        .collect();
    if let [(qualified, entry)] = custom.as_slice() {
        tracing::debug!(%name, resolved = %qualified, "custom definition preferred");
        return Ok(&entry.definition);
    }
    Err(RegistryError::Ambiguous {
        name: name.to_string(),
        candidates: candidates.iter().map(|(q, _)| q.to_string()).collect(),
    })
}
