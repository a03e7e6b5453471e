//! Context profiles with custom layouts and schema extensions
//!
//! A profile pairs a content table with a schema. These scenarios build
//! contexts for layouts other than the standard one and check that the
//! extended schema governs both setup and later config reads.

use pretty_assertions::assert_eq;
use serde_yaml::{Mapping, Value};
use tolteca_core::{
    AppRegistry, ContentDescriptor, ContentTable, ContextProfile, Error, ObsPlannerConfig,
    PopulateOptions, Rule, RuntimeContext, Schema, get_app_config,
};
use tolteca_test_utils::TestProject;

fn yaml(s: &str) -> Mapping {
    serde_yaml::from_str(s).unwrap()
}

fn reduction_profile() -> ContextProfile {
    let contents = ContentTable::new(vec![
        ContentDescriptor::dir("bindir", "bin"),
        ContentDescriptor::dir("datadir", "data/raw"),
        ContentDescriptor::dir("outdir", "data/reduced"),
        ContentDescriptor::file("setup_file", "50_setup.yaml").with_backup(true),
    ])
    .unwrap();
    let schema = Schema::new()
        .optional("n_workers", Rule::integer())
        .optional("mode", Rule::one_of(["quick", "full"]))
        .extend(AppRegistry::with_builtins().schema_extension());
    ContextProfile::new(contents, schema)
}

fn open(project: &TestProject, options: PopulateOptions) -> RuntimeContext {
    RuntimeContext::builder()
        .profile(reduction_profile())
        .open_dir(project.root(), options)
        .unwrap()
}

#[test]
fn test_custom_layout_is_populated() {
    let project = TestProject::new();

    let ctx = open(&project, PopulateOptions::create());

    project.assert_exists("data/raw");
    project.assert_exists("data/reduced");
    project.assert_not_exists("cal");
    assert_eq!(ctx.content_path("outdir").unwrap(), ctx.root_path().unwrap().unwrap().join("data/reduced"));

    let runtime = ctx.to_runtime_mapping().unwrap();
    let keys: Vec<&str> = runtime.keys().filter_map(Value::as_str).collect();
    assert_eq!(keys, vec!["rootpath", "bindir", "datadir", "outdir", "setup_file"]);
}

#[test]
fn test_standard_profile_rejects_custom_layout_directory() {
    let project = TestProject::new();
    open(&project, PopulateOptions::create());

    let err = RuntimeContext::from_dir(project.root(), PopulateOptions::default()).unwrap_err();

    match err {
        Error::MissingContent { missing, .. } => assert_eq!(missing, vec!["caldir", "logdir"]),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_extended_schema_validates_setup_values() {
    let project = TestProject::new();
    let mut ctx = open(&project, PopulateOptions::create());

    ctx.setup(Some(&yaml("n_workers: 4\nmode: quick\n")), false).unwrap();
    assert_eq!(ctx.config().unwrap()["n_workers"], Value::from(4));

    ctx.setup(Some(&yaml("n_workers: many\n")), true).unwrap();
    match ctx.config().unwrap_err() {
        Error::Validation { path, message } => {
            assert_eq!(path, "n_workers");
            assert!(message.contains("integer"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_app_section_is_validated_by_profile_and_read_typed() {
    let project = TestProject::new();
    let mut ctx = open(&project, PopulateOptions::create());
    ctx.setup(
        Some(&yaml("apps: {obs_planner: {t_exp_max: 90 min, site_name: lmt}}\n")),
        false,
    )
    .unwrap();

    let planner: ObsPlannerConfig = get_app_config(&ctx).unwrap();

    assert_eq!(planner.t_exp_max.to_string(), "90 min");
    assert_eq!(planner.site_name, "lmt");
    assert_eq!(planner.instru_name, "toltec");
}

#[test]
fn test_in_memory_context_with_custom_profile() {
    let ctx = RuntimeContext::builder()
        .profile(reduction_profile())
        .open_configs(&[yaml("mode: full\nruntime: {outdir: /scratch/out}\n")])
        .unwrap();

    assert_eq!(ctx.content_path("outdir").unwrap(), std::path::PathBuf::from("/scratch/out"));
    assert!(matches!(ctx.content_path("datadir"), Err(Error::ContentUnavailable { .. })));
    assert!(matches!(ctx.content("caldir"), Err(Error::UnknownContent { .. })));

    let bad = RuntimeContext::builder()
        .profile(reduction_profile())
        .open_configs(&[yaml("mode: slow\n")])
        .unwrap();
    assert!(matches!(bad.config(), Err(Error::Validation { .. })));
}
