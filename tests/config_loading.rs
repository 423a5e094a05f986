// tests/config_loading.rs

mod common;
use crate::common::builders::{ConfigFileBuilder, JobConfigBuilder};

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;

use jobwave::config::{load_and_validate, validate_handlers, ConfigFile};
use jobwave::dag::Scheduler;
use jobwave::errors::JobwaveError;
use jobwave::exec::builtin::builtin_registry;
use jobwave::types::JobStatus;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

fn expect_config_error(contents: &str) -> String {
    let file = write_config(contents);
    match load_and_validate(file.path()) {
        Err(JobwaveError::ConfigError(msg)) => msg,
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn sample_graph_loads_into_a_scheduler() {
    let file = write_config(
        r#"
[scheduler]
capacity = 4
state_file = "out/state.json"

[[job]]
id = 1
handler = "create_dir"
args = { path = "test_directory" }
work_delay = 5

[[job]]
id = 2
handler = "write_file"
args = { path = "test_directory/file1.txt", content = "Test Content" }
after = [1]
pre_delay = "250ms"
max_attempts = 3
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.scheduler.capacity, 4);
    assert_eq!(cfg.scheduler.state_file.as_deref(), Some("out/state.json"));
    validate_handlers(&cfg, &builtin_registry()).unwrap();

    let scheduler = Scheduler::from_config(&cfg, builtin_registry()).unwrap();
    assert_eq!(scheduler.capacity(), 4);

    let first = scheduler.job(1).unwrap();
    assert_eq!(first.work_delay(), Some(Duration::from_secs(5)));
    assert_eq!(first.pre_delay(), None);
    assert_eq!(first.max_attempts(), 1);
    assert_eq!(first.body().unwrap().handler, "create_dir");

    let second = scheduler.job(2).unwrap();
    assert_eq!(second.dependencies(), &[1]);
    assert_eq!(second.pre_delay(), Some(Duration::from_millis(250)));
    assert_eq!(second.max_attempts(), 3);
    assert_eq!(second.status(), JobStatus::Waiting);
    assert_eq!(
        second.body().unwrap().args["content"],
        serde_json::json!("Test Content")
    );
}

#[test]
fn scheduler_section_is_optional() {
    let file = write_config(
        r#"
[[job]]
id = 7
handler = "create_file"
args = { path = "x" }
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.scheduler.capacity, 10);
    assert!(cfg.scheduler.state_file.is_none());
}

#[test]
fn empty_graph_is_rejected() {
    let msg = expect_config_error("[scheduler]\ncapacity = 3\n");
    assert!(msg.contains("at least one"));
}

#[test]
fn zero_capacity_is_rejected() {
    let msg = expect_config_error(
        r#"
[scheduler]
capacity = 0

[[job]]
id = 1
handler = "create_file"
"#,
    );
    assert!(msg.contains("capacity"));
}

#[test]
fn more_jobs_than_capacity_is_rejected() {
    let msg = expect_config_error(
        r#"
[scheduler]
capacity = 1

[[job]]
id = 1
handler = "create_file"

[[job]]
id = 2
handler = "create_file"
"#,
    );
    assert!(msg.contains("2 jobs"));
}

#[test]
fn duplicate_job_ids_are_rejected() {
    let msg = expect_config_error(
        r#"
[[job]]
id = 3
handler = "create_file"

[[job]]
id = 3
handler = "remove_file"
"#,
    );
    assert!(msg.contains("more than once"));
}

#[test]
fn unknown_dependency_returns_config_error() {
    let msg = expect_config_error(
        r#"
[[job]]
id = 1
handler = "create_file"
after = [42]
"#,
    );
    assert!(msg.contains("unknown dependency"));
    assert!(msg.contains("42"));
}

#[test]
fn self_dependency_returns_config_error() {
    let msg = expect_config_error(
        r#"
[[job]]
id = 1
handler = "create_file"
after = [1]
"#,
    );
    assert!(msg.contains("itself"));
}

#[test]
fn malformed_delay_returns_config_error() {
    let msg = expect_config_error(
        r#"
[[job]]
id = 1
handler = "create_file"
pre_delay = "3 fortnights"
"#,
    );
    assert!(msg.contains("pre_delay"));
}

#[test]
fn oversized_delay_returns_config_error() {
    let msg = expect_config_error(
        r#"
[[job]]
id = 1
handler = "create_file"
work_delay = "10000000000000000h"
"#,
    );
    assert!(msg.contains("work_delay"));
    assert!(msg.contains("too large"));
}

#[test]
fn cli_defaults_to_the_standard_config_path() {
    use clap::Parser;
    use jobwave::cli::CliArgs;
    use jobwave::config::loader::default_config_path;

    let args = CliArgs::try_parse_from(["jobwave"]).unwrap();
    assert_eq!(args.config, default_config_path());

    let args = CliArgs::try_parse_from(["jobwave", "--config", "graphs/nightly.toml"]).unwrap();
    assert_eq!(args.config, std::path::PathBuf::from("graphs/nightly.toml"));
}

#[test]
fn cyclic_graph_is_accepted() {
    let file = write_config(
        r#"
[[job]]
id = 1
handler = "create_file"
after = [2]

[[job]]
id = 2
handler = "create_file"
after = [1]
"#,
    );

    assert!(load_and_validate(file.path()).is_ok());
}

#[test]
fn unknown_keys_are_a_toml_error() {
    let file = write_config(
        r#"
[[job]]
id = 1
handler = "create_file"
retries = 3
"#,
    );

    match load_and_validate(file.path()) {
        Err(JobwaveError::TomlError(e)) => assert!(e.to_string().contains("retries")),
        Err(e) => panic!("Expected TomlError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn missing_config_file_is_an_io_error() {
    let result = load_and_validate("/definitely/not/here/Jobwave.toml");
    assert!(matches!(result, Err(JobwaveError::IoError(_))));
}

#[test]
fn unregistered_handler_is_reported_with_known_names() {
    let cfg: ConfigFile = ConfigFileBuilder::new()
        .with_job(JobConfigBuilder::new(1, "launch_rocket").build())
        .build();

    let err = validate_handlers(&cfg, &builtin_registry()).unwrap_err();

    match err {
        JobwaveError::ConfigError(msg) => {
            assert!(msg.contains("launch_rocket"));
            assert!(msg.contains("create_dir"));
            assert!(msg.contains("http_get"));
        }
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn builder_configs_go_through_the_same_validation() {
    let raw = ConfigFileBuilder::new()
        .with_capacity(2)
        .with_job(JobConfigBuilder::new(1, "create_file").build())
        .with_job(JobConfigBuilder::new(2, "create_file").after(9).build())
        .build_raw();

    assert!(matches!(
        ConfigFile::try_from(raw),
        Err(JobwaveError::ConfigError(_))
    ));

    let cfg = ConfigFileBuilder::new()
        .with_capacity(2)
        .with_state_file("s.json")
        .with_job(
            JobConfigBuilder::new(1, "write_file")
                .arg("path", "a.txt")
                .arg("content", "hi")
                .work_delay_secs(0.5)
                .max_attempts(2)
                .build(),
        )
        .with_job(JobConfigBuilder::new(2, "read_file").after(1).pre_delay("1s").build())
        .build();

    let scheduler = Scheduler::from_config(&cfg, builtin_registry()).unwrap();
    assert_eq!(scheduler.ready_jobs(), vec![1]);
    assert_eq!(
        scheduler.job(1).unwrap().work_delay(),
        Some(Duration::from_millis(500))
    );
    assert_eq!(
        scheduler.job(2).unwrap().pre_delay(),
        Some(Duration::from_secs(1))
    );
}
