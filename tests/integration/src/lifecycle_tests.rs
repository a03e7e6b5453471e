//! Runtime context lifecycle scenarios
//!
//! These tests drive a context directory through its whole life: creation,
//! setup, local overrides, re-setup, and reopening from a fresh process
//! view, checking what lands on disk at each step.

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_yaml::{Mapping, Value};
use std::thread;
use tolteca_core::{
    ContentEntry, Error, PopulateOptions, RuntimeContext, StaticStamper, VERSION,
};
use tolteca_fs::YamlDocument;
use tolteca_test_utils::TestProject;

fn yaml(s: &str) -> Mapping {
    serde_yaml::from_str(s).unwrap()
}

fn stamper(version: &str, second: u32) -> StaticStamper {
    StaticStamper::new(
        version,
        Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, second).unwrap(),
    )
}

fn open(project: &TestProject, stamp: StaticStamper) -> RuntimeContext {
    RuntimeContext::builder()
        .stamper(stamp)
        .open_dir(project.root(), PopulateOptions::default())
        .unwrap()
}

// =============================================================================
// Full lifecycle
// =============================================================================

#[test]
fn test_context_lifecycle() {
    let project = TestProject::new();

    // 1. create the layout and write the first setup block
    let mut ctx = RuntimeContext::builder()
        .stamper(stamper("1.0.0", 0))
        .open_dir(project.root(), PopulateOptions::create())
        .unwrap();
    ctx.setup(Some(&yaml("notes: init\n")), false).unwrap();

    let on_disk = YamlDocument::load(&project.path("50_setup.yaml")).unwrap();
    assert_eq!(
        on_disk,
        yaml("notes: init\nsetup: {version: 1.0.0, created_at: '2026-10-19T08:30:00.000000Z'}\n")
    );

    // 2. a second setup is refused and leaves the file alone
    let err = ctx.setup(Some(&Mapping::new()), false).unwrap_err();
    assert!(matches!(err, Error::AlreadySetUp { .. }));
    assert_eq!(
        YamlDocument::load(&project.path("50_setup.yaml")).unwrap(),
        on_disk
    );

    // 3. local overrides are picked up by a freshly opened context
    project.write("60_local.yaml", "notes: local\napps: {obs_planner: {title_text: Mine}}\n");
    let reopened = open(&project, stamper("1.0.0", 10));
    let config = reopened.config().unwrap();
    assert_eq!(config["notes"], Value::from("local"));
    assert_eq!(config["setup"]["created_at"], Value::from("2026-10-19T08:30:00.000000Z"));

    // 4. overwriting keeps a backup and refreshes the context that wrote it
    ctx.invalidate();
    assert_eq!(ctx.config().unwrap()["notes"], Value::from("local"));
    let mut ctx = open(&project, stamper("1.1.0", 30));
    ctx.setup(Some(&yaml("x: 1\n")), true).unwrap();

    let config = ctx.config().unwrap();
    assert_eq!(config["x"], Value::from(1));
    assert_eq!(config["notes"], Value::from("local"));
    assert_eq!(config["setup"]["version"], Value::from("1.1.0"));
    assert_eq!(config["setup"]["created_at"], Value::from("2026-10-19T08:30:30.000000Z"));
    project.assert_exists("50_setup.yaml.20261019T083030000000.bak");
    project.assert_file_contains("50_setup.yaml.20261019T083030000000.bak", "notes: init");

    // 5. the backup is not a config file
    let files = ctx.config_files().unwrap().unwrap();
    assert_eq!(files.len(), 2);
}

#[test]
fn test_reopening_with_newer_software_keeps_recorded_version() {
    let project = TestProject::new();
    let mut ctx = RuntimeContext::builder()
        .stamper(stamper("1.0.0", 0))
        .open_dir(project.root(), PopulateOptions::create())
        .unwrap();
    ctx.setup(None, false).unwrap();

    let newer = open(&project, stamper("2.0.0", 0));

    assert_eq!(newer.config().unwrap()["setup"]["version"], Value::from("1.0.0"));
}

#[test]
fn test_default_stamper_records_crate_version() {
    let project = TestProject::new();
    let mut ctx = RuntimeContext::from_dir(project.root(), PopulateOptions::create()).unwrap();

    ctx.setup(None, false).unwrap();

    assert_eq!(ctx.config().unwrap()["setup"]["version"], Value::from(VERSION));
}

// =============================================================================
// In-memory contexts
// =============================================================================

#[test]
fn test_in_memory_context_mirrors_persistent_one() {
    let project = TestProject::new();
    let mut persistent = RuntimeContext::from_dir(project.root(), PopulateOptions::create()).unwrap();
    persistent.setup(Some(&yaml("notes: init\n")), false).unwrap();

    let snapshot = persistent.config().unwrap().clone();
    let in_memory = RuntimeContext::from_config(&[snapshot.clone()]).unwrap();

    assert!(!in_memory.is_persistent());
    assert_eq!(in_memory.config().unwrap(), &snapshot);
    assert_eq!(
        in_memory.root_path().unwrap(),
        persistent.root_path().unwrap()
    );
    assert_eq!(
        in_memory.content("caldir").unwrap().path(),
        Some(persistent.caldir().unwrap())
    );
    assert_eq!(
        in_memory.to_string(),
        format!("RuntimeContext(*{})", persistent.root_path().unwrap().unwrap().display())
    );
}

#[test]
fn test_in_memory_context_from_layers() {
    let ctx = RuntimeContext::from_config(&[
        yaml("a: {x: 1}\nsetup: {version: 0.1.0}\n"),
        yaml("a: {y: 2}\n"),
    ])
    .unwrap();

    let config = ctx.config().unwrap();
    assert_eq!(config["a"], Value::Mapping(yaml("{x: 1, y: 2}")));
    assert_eq!(config["setup"]["version"], Value::from("0.1.0"));
    assert_eq!(ctx.content("logdir").unwrap(), ContentEntry::Described(Value::Null));
}

// =============================================================================
// Shared access
// =============================================================================

#[test]
fn test_concurrent_readers_share_one_config() {
    let project = TestProject::new();
    project.write("60_local.yaml", "notes: shared\n");
    let ctx = RuntimeContext::from_dir(project.root(), PopulateOptions::create()).unwrap();

    let addresses: Vec<usize> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| ctx.config().unwrap() as *const Mapping as usize))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(addresses.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(ctx.config().unwrap()["notes"], Value::from("shared"));
}
