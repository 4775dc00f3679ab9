//! Property-based tests for defkit.
//!
//! Properties tested:
//! - Property 1: Compilation is deterministic
//! - Property 2: Required and defaulted are mutually exclusive
//! - Property 3: Defaults outside numeric bounds are rejected
//! - Property 4: Exclusive equality branches never conflict
//! - Property 5: Allowed warnings never hide errors

use proptest::prelude::*;

use defkit::emit::{EmitConfig, IndentStyle};
use defkit::{CompileError, Compiler, Definition, Param, Validator};

// =============================================================================
// Generators for property tests
// =============================================================================

/// Generate a camelCase parameter name.
fn arb_param_name() -> impl Strategy<Value = String> {
    "x[a-z]{0,6}([A-Z][a-z]{1,4}){0,2}"
}

/// Generate a list of distinct parameter names.
fn arb_param_names() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::btree_set(arb_param_name(), 1..6)
        .prop_map(|names| names.into_iter().collect())
}

fn arb_indent() -> impl Strategy<Value = IndentStyle> {
    prop_oneof![
        Just(IndentStyle::Tabs),
        Just(IndentStyle::Spaces2),
        Just(IndentStyle::Spaces4),
    ]
}

/// A component writing each named integer parameter to its own field.
fn component(names: Vec<String>, defaults: Vec<i32>) -> Definition {
    Definition::component("generated")
        .description("Generated")
        .template(move |b| {
            for (name, default) in names.iter().zip(defaults.iter().copied()) {
                let param = b.param(Param::int(name.as_str()).default(default).description(name.as_str()));
                b.output().set(&format!("spec.{name}"), &param);
            }
        })
}

// =============================================================================
// Property 1: Compilation is deterministic
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_compile_is_deterministic(
        names in arb_param_names(),
        defaults in proptest::collection::vec(-1000i32..1000, 6),
        indent in arb_indent(),
    ) {
        let def = component(names.clone(), defaults);
        let compiler = Compiler::new().with_emit_config(EmitConfig::new().with_indent(indent));

        let first = compiler.compile(&def).unwrap();
        let second = compiler.compile(&def).unwrap();
        prop_assert_eq!(&first.cue, &second.cue);
        prop_assert_eq!(first.content_hash(), second.content_hash());

        for name in &names {
            let declaration = format!("{name}: *");
            prop_assert!(first.cue.contains(&declaration));
        }
    }
}

// =============================================================================
// Property 2: Required and defaulted are mutually exclusive
// =============================================================================

proptest! {
    #[test]
    fn prop_required_with_default_rejected(
        name in arb_param_name(),
        default in any::<i32>(),
        required_first in any::<bool>(),
    ) {
        let param = if required_first {
            Param::int(name.as_str()).required().default(default)
        } else {
            Param::int(name.as_str()).default(default).required()
        };
        let def = Definition::component("web").template(move |b| {
            b.param(param.clone());
        });

        let err = Compiler::new().compile(&def).unwrap_err();
        prop_assert!(matches!(err, CompileError::Schema { .. }), "expected CompileError::Schema");
        prop_assert_eq!(err.codes(), vec!["DEFKIT-E001"]);
    }
}

// =============================================================================
// Property 3: Defaults outside numeric bounds are rejected
// =============================================================================

proptest! {
    #[test]
    fn prop_default_respects_bounds(
        lo in -100i32..100,
        span in 0i32..100,
        default in -300i32..300,
    ) {
        let hi = lo + span;
        let def = Definition::component("web")
            .description("Web")
            .template(move |b| {
                let replicas = b.param(
                    Param::int("replicas").default(default).min(lo).max(hi).description("Replicas"),
                );
                b.output().set("spec.replicas", &replicas);
            });

        let result = Compiler::new().compile(&def);
        if (lo..=hi).contains(&default) {
            let compiled = result.unwrap();
            let expected = format!("replicas: *{default} | int & >={lo} & <={hi}");
            prop_assert!(compiled.cue.contains(&expected));
        } else {
            prop_assert_eq!(result.unwrap_err().codes(), vec!["DEFKIT-E002"]);
        }
    }
}

// =============================================================================
// Property 4: Exclusive equality branches never conflict
// =============================================================================

proptest! {
    #[test]
    fn prop_distinct_equality_branches_compile(
        values in proptest::collection::btree_set("[a-z]{1,8}", 2..5),
    ) {
        let values: Vec<String> = values.into_iter().collect();
        let branches = values.clone();
        let def = Definition::component("web")
            .description("Web")
            .template(move |b| {
                let mode = b.param(
                    Param::enumeration("mode", branches.iter().map(String::as_str))
                        .required()
                        .description("Mode"),
                );
                let mut out = b.output();
                for value in &branches {
                    out.set_if(mode.eq(value.as_str()), "spec.mode", value.as_str());
                }
            });

        let compiled = Compiler::new().compile(&def).unwrap();
        for value in &values {
            let guard = format!("if parameter.mode == \"{value}\" {{");
            prop_assert!(compiled.cue.contains(&guard));
        }
    }
}

// =============================================================================
// Property 5: Allowed warnings never hide errors
// =============================================================================

proptest! {
    #[test]
    fn prop_allow_list_keeps_errors(
        allowed in proptest::collection::vec(
            prop_oneof![
                Just("DEFKIT-W001"),
                Just("DEFKIT-W002"),
                Just("DEFKIT-E010"),
                Just("IR-E002"),
            ],
            0..4,
        ),
    ) {
        let def = Definition::component("web").template(|b| {
            b.param(Param::string("token").required_when("missing", "x"));
        });
        let compiler = Compiler::new().with_validator(Validator::new().with_allow(allowed.clone()));

        let err = compiler.compile(&def).unwrap_err();
        let codes = err.codes();
        prop_assert!(codes.contains(&"DEFKIT-E010"));
        for code in ["DEFKIT-W001", "DEFKIT-W002"] {
            prop_assert_eq!(codes.contains(&code), !allowed.contains(&code));
        }
    }
}
