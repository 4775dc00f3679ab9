//! Integration tests for defkit.
//!
//! These tests drive the public API end to end: tracing, IR capture,
//! validation, emission, the registry and configuration loading.

use std::fs;

use tempfile::TempDir;

use defkit::emit::{EmitConfig, IndentStyle};
use defkit::{
    build_ir, diff_ir, CompileError, Compiler, ConfigError, ConfigManager, Context, Definition,
    DefinitionBuilder, DefinitionKind, DefinitionMetadata, DefinitionRegistry, Expr, IrDocument,
    Origin, Param, RegistryError,
};

/// A definition that compiles cleanly.
fn webservice() -> Definition {
    Definition::component("webservice")
        .description("Web service")
        .workload("apps/v1", "Deployment")
        .template(|b| {
            let image = b.param(Param::string("image").required().description("Container image"));
            let replicas = b.param(Param::int("replicas").default(3).min(1).description("Replicas"));
            let mut out = b.output();
            out.api_version("apps/v1").kind("Deployment");
            out.set("spec.replicas", &replicas);
            out.set("spec.template.spec.containers[0].image", &image);
        })
}

fn plain() -> Compiler {
    Compiler::new().with_emit_config(EmitConfig::new().with_banner(false))
}

/// Write a config file into a fresh temporary directory.
fn temp_config(content: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("defkit.toml"), content).unwrap();
    dir
}

// =============================================================================
// Compile Pipeline Tests
// =============================================================================

#[test]
fn test_compile_webservice() {
    let compiled = Compiler::new().compile(&webservice()).unwrap();

    assert!(compiled.cue.starts_with("// Code generated by defkit. DO NOT EDIT.\n"));
    assert!(compiled
        .cue
        .contains(&format!("// content-hash: {}\n", compiled.content_hash())));
    assert!(compiled.cue.contains("\t\t\ttype: \"deployments.apps\"\n"));
    assert!(compiled.cue.contains("\t\treplicas: *3 | int & >=1\n"));
    assert!(compiled.diagnostics.is_empty());
}

#[test]
fn test_compile_is_deterministic() {
    let first = Compiler::new().compile(&webservice()).unwrap();
    let second = Compiler::new().compile(&webservice()).unwrap();
    assert_eq!(first.cue, second.cue);
    assert_eq!(first.content_hash(), second.content_hash());
}

#[test]
fn test_trait_patch() {
    let def = Definition::trait_("scaler")
        .description("Set the replica count")
        .applies_to(["deployments.apps"])
        .pod_disruptive(false)
        .template(|b| {
            let replicas = b.param(Param::int("replicas").default(1).min(0).description("Replicas"));
            b.patch().set("spec.replicas", &replicas);
        });

    let compiled = plain().compile(&def).unwrap();
    assert!(compiled.cue.starts_with("scaler: {\n\ttype: \"trait\"\n"));
    assert!(compiled.cue.contains("\tpatch: spec: replicas: parameter.replicas\n"));
}

#[test]
fn test_auxiliary_output_with_context() {
    let def = Definition::component("web")
        .description("Web")
        .template(|b| {
            let port = b.param(Param::int("port").default(80).description("Service port"));
            b.outputs("service")
                .api_version("v1")
                .kind("Service")
                .set("metadata.name", Context::name())
                .set("spec.ports[0].port", &port);
        });

    let compiled = plain().compile(&def).unwrap();
    assert!(compiled.cue.contains("\toutputs: service: {\n"));
    assert!(compiled.cue.contains("\t\tmetadata: name: context.name\n"));
    assert!(compiled.cue.contains("\t\tspec: ports: [{\n\t\t\tport: parameter.port\n\t\t}]\n"));
}

#[test]
fn test_exclusive_branches_write_same_path() {
    let def = Definition::component("web")
        .description("Web")
        .template(|b| {
            let mode = b.param(
                Param::enumeration("mode", ["fast", "safe"])
                    .default("safe")
                    .description("Rollout mode"),
            );
            let mut out = b.output();
            out.set_if(mode.eq("fast"), "spec.strategy.type", "Recreate");
            out.set_if(mode.eq("safe"), "spec.strategy.type", "RollingUpdate");
        });

    let compiled = plain().compile(&def).unwrap();
    assert!(compiled.cue.contains("if parameter.mode == \"fast\" {"));
    assert!(compiled.cue.contains("if parameter.mode == \"safe\" {"));
}

#[test]
fn test_raw_passthrough_warns() {
    let def = Definition::component("web")
        .description("Web")
        .template(|b| {
            b.raw("output: metadata: annotations: \"x\": \"y\"");
        });

    let compiled = plain().compile(&def).unwrap();
    assert!(compiled.cue.contains(
        "\t// defkit:raw-begin\noutput: metadata: annotations: \"x\": \"y\"\n\t// defkit:raw-end\n"
    ));
    let codes: Vec<_> = compiled.diagnostics.iter().map(|d| d.code).collect();
    assert_eq!(codes, vec!["IR-W001"]);
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_ambiguous_overwrite_fails_emission() {
    let def = Definition::component("web")
        .description("Web")
        .template(|b| {
            b.output().set("spec.replicas", 1).set("spec.replicas", 2);
        });

    let err = Compiler::new().compile(&def).unwrap_err();
    assert!(matches!(err, CompileError::Emission { .. }));
    assert_eq!(err.codes(), vec!["EMIT-E001"]);
    assert_eq!(err.definition(), "web");
}

#[test]
fn test_non_contiguous_list_write_fails_emission() {
    for path in ["spec.args[2]", "spec.args[100000000000]"] {
        let def = Definition::component("web")
            .description("Web")
            .template(move |b| {
                let image = b.param(Param::string("image").required().description("Image"));
                b.output().set(path, &image);
            });

        let err = plain().compile(&def).unwrap_err();
        assert!(matches!(err, CompileError::Emission { .. }));
        assert_eq!(err.codes(), vec!["EMIT-E007"]);
    }
}

#[test]
fn test_unterminated_index_fails_capture() {
    let def = Definition::component("web")
        .description("Web")
        .template(|b| {
            let image = b.param(Param::string("image").required().description("Image"));
            b.output().set("spec.args[0", &image);
        });

    let err = plain().compile(&def).unwrap_err();
    assert!(matches!(err, CompileError::Schema { .. }));
    assert_eq!(err.codes(), vec!["IR-E005"]);
}

#[test]
fn test_default_out_of_range_fails_capture() {
    let def = Definition::component("web").template(|b| {
        b.param(Param::int("replicas").default(150).max(100));
    });

    let err = Compiler::new().compile(&def).unwrap_err();
    assert!(matches!(err, CompileError::Schema { .. }));
    assert_eq!(err.codes(), vec!["DEFKIT-E002"]);
}

#[test]
fn test_foreign_parameter_rejected() {
    let mut other = DefinitionBuilder::new(DefinitionMetadata::new(
        "other",
        DefinitionKind::Component,
    ));
    let foreign = other.param(Param::string("image"));

    let def = Definition::component("web").template(move |b| {
        b.param(Param::string("image").required());
        b.output().set("spec.image", &foreign);
    });

    let err = Compiler::new().compile(&def).unwrap_err();
    assert_eq!(err.codes(), vec!["IR-E003"]);
}

#[test]
fn test_unbalanced_scope_rejected() {
    let def = Definition::component("web").template(|b| {
        let debug = b.param(Param::bool("debug").description("Debug mode"));
        b.begin_if(debug.is_set());
        b.output().set("spec.debug", &debug);
    });

    let err = Compiler::new().compile(&def).unwrap_err();
    assert_eq!(err.codes(), vec!["IR-E001"]);
}

#[test]
fn test_validation_errors_are_collected() {
    let def = Definition::trait_("scaler")
        .applies_to(["deployments.apps"])
        .conflicts_with(["deployments.apps", "scaler"])
        .template(|b| {
            let token = b.param(
                Param::string("token")
                    .required_when("mdoe", "private")
                    .description("Token"),
            );
            b.patch().set("spec.token", &token);
        });

    let err = Compiler::new().compile(&def).unwrap_err();
    let CompileError::Validation { diagnostics, .. } = &err else {
        panic!("expected validation failure, got {err:?}");
    };
    let codes: Vec<_> = diagnostics.iter().map(|d| d.code).collect();
    assert_eq!(codes, vec!["DEFKIT-E019", "DEFKIT-E020", "DEFKIT-E010"]);
    assert!(err.to_string().contains("1. error[DEFKIT-E019]"));
}

#[test]
fn test_unknown_context_path_is_reported() {
    let def = Definition::component("web")
        .description("Web")
        .health_policy(Expr::from(Context::path("outptu.status.ready")).eq(true));

    let err = Compiler::new().compile(&def).unwrap_err();
    assert_eq!(err.codes(), vec!["IR-E008"]);
}

// =============================================================================
// Batch & Registry Tests
// =============================================================================

#[test]
fn test_batch_isolates_failures() {
    let broken = Definition::component("broken").template(|b| {
        b.output().set("spec.x", 1).set("spec.x", 2);
    });
    let results = plain().compile_batch(&[webservice(), broken]);

    assert_eq!(
        results.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["broken", "webservice"]
    );
    assert!(results["webservice"].is_ok());
    assert!(matches!(
        results["broken"],
        Err(CompileError::Emission { .. })
    ));
}

#[test]
fn test_registry_compile_all() {
    let mut registry = DefinitionRegistry::new();
    registry.register("vela", webservice(), Origin::Core).unwrap();
    registry
        .register("acme", webservice().description("Hardened web service"), Origin::Custom)
        .unwrap();
    registry
        .register("vela", Definition::policy("noop").description("No-op"), Origin::Core)
        .unwrap();

    let resolved = registry.resolve("webservice").unwrap();
    assert_eq!(registry.qualified_name_of(resolved), Some("acme/webservice"));
    assert_eq!(
        registry.resolve("acme/webservice").unwrap().metadata().description.as_deref(),
        Some("Hardened web service")
    );

    let results = registry.compile_all(&plain());
    assert_eq!(
        results.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["acme/webservice", "vela/noop", "vela/webservice"]
    );
    assert!(results.values().all(Result::is_ok));
    assert!(results["acme/webservice"]
        .as_ref()
        .unwrap()
        .cue
        .contains("description: \"Hardened web service\""));
}

#[test]
fn test_registry_ambiguity() {
    let mut registry = DefinitionRegistry::new();
    registry.register("a", webservice(), Origin::Custom).unwrap();
    registry.register("b", webservice(), Origin::Custom).unwrap();

    assert!(matches!(
        registry.resolve("webservice"),
        Err(RegistryError::Ambiguous { .. })
    ));
}

// =============================================================================
// IR Tests
// =============================================================================

#[test]
fn test_ir_json_round_trip_checks_hash() {
    let ir = build_ir(webservice().trace()).unwrap();
    let json = serde_json::to_string(&ir).unwrap();
    let back: IrDocument = serde_json::from_str(&json).unwrap();
    assert_eq!(back, ir);

    let tampered = json.replace("\"webservice\"", "\"websvc\"");
    assert!(serde_json::from_str::<IrDocument>(&tampered).is_err());
}

#[test]
fn test_diff_reports_added_parameter() {
    let old = build_ir(webservice().trace()).unwrap();
    let new = build_ir(
        webservice()
            .template(|b| {
                let image = b.param(Param::string("image").required().description("Container image"));
                let replicas = b.param(Param::int("replicas").default(3).min(1).description("Replicas"));
                b.param(Param::string("cpu").description("CPU limit"));
                let mut out = b.output();
                out.api_version("apps/v1").kind("Deployment");
                out.set("spec.replicas", &replicas);
                out.set("spec.template.spec.containers[0].image", &image);
            })
            .trace(),
    )
    .unwrap();

    let changes = diff_ir(&old, &new);
    assert_eq!(changes.added_params, vec!["cpu".to_string()]);
    assert!(changes.added_ops.is_empty());
    assert!(diff_ir(&old, &old).is_empty());
}

// =============================================================================
// Config Tests
// =============================================================================

#[test]
fn test_config_file_drives_compiler() {
    let dir = temp_config(
        r#"
[emit]
indent = "spaces2"
banner = false

[validate]
warnings_as_errors = true
allow = ["DEFKIT-W002"]
"#,
    );
    let config = ConfigManager::load(Some(&dir.path().join("defkit.toml"))).unwrap();
    assert_eq!(config.emit.indent, IndentStyle::Spaces2);

    let def = Definition::policy("noop").template(|b| {
        b.param(Param::bool("dryRun").default(false));
        b.at("config").set("enabled", true);
    });
    let compiled = Compiler::from_config(&config).compile(&def);
    // The unused parameter still blocks: only DEFKIT-W002 is allowed.
    assert_eq!(compiled.unwrap_err().codes(), vec!["DEFKIT-W001"]);

    let def = Definition::policy("noop").template(|b| {
        let dry_run = b.param(Param::bool("dryRun").default(false));
        b.at("config").set("dryRun", &dry_run);
    });
    let compiled = Compiler::from_config(&config).compile(&def).unwrap();
    assert!(compiled.cue.starts_with("noop: {\n  type: \"policy\"\n"));
    assert!(compiled.cue.contains("\n  config: dryRun: parameter.dryRun\n"));
}

#[test]
fn test_config_errors() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("defkit.toml");
    assert!(matches!(
        ConfigManager::load(Some(&missing)),
        Err(ConfigError::NotFound { .. })
    ));

    let dir = temp_config("[emit\nindent = 1");
    let err = ConfigManager::load(Some(&dir.path().join("defkit.toml"))).unwrap_err();
    match err {
        ConfigError::InvalidToml { path, .. } => assert!(path.ends_with("defkit.toml")),
        other => panic!("expected InvalidToml, got {other:?}"),
    }
}

#[test]
fn test_default_config_content_round_trips() {
    let dir = temp_config(ConfigManager::default_config_content());
    let config = ConfigManager::load(Some(&dir.path().join("defkit.toml"))).unwrap();
    assert_eq!(config.to_emit_config(), EmitConfig::default());
}
