//! Runtime context accessors.
//!
//! KubeVela injects a `context` value at render time. Accessor chains such
//! as `Context::output().status().field("readyReplicas")` record the dotted
//! path `context.output.status.readyReplicas`; only recognized roots are
//! accepted by the emitter.

/// Entry points for runtime context variables.
pub struct Context;

impl Context {
    /// Component or trait instance name.
    pub fn name() -> ContextRef {
        ContextRef::root("name")
    }

    pub fn app_name() -> ContextRef {
        ContextRef::root("appName")
    }

    pub fn namespace() -> ContextRef {
        ContextRef::root("namespace")
    }

    pub fn app_revision() -> ContextRef {
        ContextRef::root("appRevision")
    }

    pub fn app_revision_num() -> ContextRef {
        ContextRef::root("appRevisionNum")
    }

    pub fn revision() -> ContextRef {
        ContextRef::root("revision")
    }

    pub fn publish_version() -> ContextRef {
        ContextRef::root("publishVersion")
    }

    pub fn component_type() -> ContextRef {
        ContextRef::root("componentType")
    }

    pub fn workflow_name() -> ContextRef {
        ContextRef::root("workflowName")
    }

    /// A label of the owning application.
    pub fn app_label(key: impl Into<String>) -> ContextRef {
        ContextRef::root("appLabels").field(key)
    }

    /// An annotation of the owning application.
    pub fn app_annotation(key: impl Into<String>) -> ContextRef {
        ContextRef::root("appAnnotations").field(key)
    }

    /// `context.clusterVersion.<field>` (major, minor, gitVersion, platform).
    pub fn cluster_version(field: impl Into<String>) -> ContextRef {
        ContextRef::root("clusterVersion").field(field)
    }

    /// The rendered primary workload.
    pub fn output() -> ContextRef {
        ContextRef::root("output")
    }

    /// A rendered auxiliary resource.
    pub fn outputs(name: impl Into<String>) -> ContextRef {
        ContextRef::root("outputs").field(name)
    }

    /// Arbitrary dotted path below `context`.
    pub fn path(path: &str) -> ContextRef {
        ContextRef {
            path: path.split('.').map(str::to_string).collect(),
        }
    }
}

/// A runtime context path under construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextRef {
    path: Vec<String>,
}

impl ContextRef {
    fn root(name: &str) -> Self {
        Self {
            path: vec![name.to_string()],
        }
    }

    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.path.push(name.into());
        self
    }

    pub fn status(self) -> Self {
        self.field("status")
    }

    pub fn spec(self) -> Self {
        self.field("spec")
    }

    pub fn metadata(self) -> Self {
        self.field("metadata")
    }

    pub fn segments(&self) -> &[String] {
        &self.path
    }

    pub(crate) fn into_path(self) -> Vec<String> {
        self.path
    }
}

const SCALAR_ROOTS: &[&str] = &[
    "name",
    "appName",
    "namespace",
    "appRevision",
    "appRevisionNum",
    "revision",
    "publishVersion",
    "componentType",
    "workflowName",
];

const CLUSTER_VERSION_FIELDS: &[&str] = &["major", "minor", "gitVersion", "platform"];

/// Whether the emitter knows how to reference this context path.
pub fn is_recognized(path: &[String]) -> bool {
    let Some((root, rest)) = path.split_first() else {
        return false;
    };
    if rest.iter().any(String::is_empty) {
        return false;
    }
    match root.as_str() {
        r if SCALAR_ROOTS.contains(&r) => rest.is_empty(),
        "appLabels" | "appAnnotations" => rest.len() == 1,
        "clusterVersion" => {
            rest.len() == 1 && CLUSTER_VERSION_FIELDS.contains(&rest[0].as_str())
        }
        "output" => true,
        "outputs" => !rest.is_empty(),
        _ => false,
    }
}
