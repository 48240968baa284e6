use circleci_docs::core::pipeline::{
    self, Config, Job, Parameter, Workflow, WorkflowJob, Workflows,
};
use indexmap::IndexMap;
use serde_yaml::Value;
use std::fs;
use tempfile::NamedTempFile;

const FIXTURE: &str = include_str!("../fixtures/config.yml");

fn parameter(name: &str, description: Option<&str>, default: &str) -> (String, Parameter) {
    (
        name.to_string(),
        Parameter {
            name: name.to_string(),
            description: description.map(str::to_string),
            kind: "string".to_string(),
            default: Some(Value::from(default)),
        },
    )
}

fn job(name: &str, label: &str) -> (String, Job) {
    (
        name.to_string(),
        Job {
            name: name.to_string(),
            parameters: IndexMap::from([parameter("label", None, label)]),
            ..Job::default()
        },
    )
}

fn workflow_job(name: &str, requires: &[&str]) -> WorkflowJob {
    WorkflowJob {
        name: name.to_string(),
        requires: requires.iter().map(|job| job.to_string()).collect(),
    }
}

fn expected_fixture() -> Config {
    let (windows_name, mut build_windows) = job("build-windows", "iperf3-cygwin64");
    build_windows.environment = IndexMap::from([("FOO".to_string(), "BAR".to_string())]);
    build_windows.parallelism = 2;
    let (macos_name, mut test_macos) = job("test-macos", "iperf3-macos");
    test_macos.parallelism = 3;

    Config {
        version: "2.1".to_string(),
        parameters: IndexMap::from([
            parameter(
                "src-repo-url",
                Some("The repository url"),
                "https://github.com/esnet/iperf.git",
            ),
            parameter("branch-name", Some("The branch name"), "3.8.1"),
            parameter(
                "common-build-params",
                Some("The common build params"),
                "--disable-shared --disable-static",
            ),
        ]),
        jobs: IndexMap::from([
            job("build-linux", "iperf3-linux"),
            (windows_name, build_windows),
            job("build-macos", "iperf3-macos"),
            job("test-linux", "iperf3-linux"),
            job("test-windows", "iperf3-cygwin64"),
            (macos_name, test_macos),
            (
                "release".to_string(),
                Job {
                    name: "release".to_string(),
                    ..Job::default()
                },
            ),
        ]),
        workflows: Workflows {
            version: "2".to_string(),
            workflows: IndexMap::from([(
                "build-test-release".to_string(),
                Workflow {
                    name: "build-test-release".to_string(),
                    jobs: vec![
                        workflow_job("build-linux", &[]),
                        workflow_job("build-windows", &[]),
                        workflow_job("build-macos", &[]),
                        workflow_job("test-linux", &["build-linux"]),
                        workflow_job("test-windows", &["build-windows"]),
                        // The fixture names this job `macos`, not `test-macos`.
                        workflow_job("macos", &["build-macos"]),
                        workflow_job("release", &["test-linux", "test-windows", "test-macos"]),
                    ],
                },
            )]),
        },
    }
}

#[test]
fn fixture_decodes_to_expected_tree() {
    let config = pipeline::parse_str(FIXTURE).expect("fixture parses");
    assert_eq!(config, expected_fixture());
}

#[test]
fn fixture_scenario_highlights() {
    let config = pipeline::parse(FIXTURE.as_bytes()).unwrap();
    assert_eq!(config.version, "2.1");
    assert_eq!(
        config.parameters["src-repo-url"].default,
        Some(Value::from("https://github.com/esnet/iperf.git"))
    );
    assert_eq!(config.jobs["build-linux"].name, "build-linux");
    assert_eq!(config.jobs["build-linux"].parameters["label"].name, "label");
    assert_eq!(
        config.workflows.workflows["build-test-release"].jobs[3],
        workflow_job("test-linux", &["build-linux"])
    );
}

#[test]
fn every_keyed_entity_is_named_after_its_key() {
    let config = pipeline::parse_str(FIXTURE).unwrap();
    for (key, parameter) in &config.parameters {
        assert_eq!(&parameter.name, key);
    }
    for (key, job) in &config.jobs {
        assert_eq!(&job.name, key);
        for (parameter_key, parameter) in &job.parameters {
            assert_eq!(&parameter.name, parameter_key);
        }
    }
    for (key, workflow) in &config.workflows.workflows {
        assert_eq!(&workflow.name, key);
    }
}

#[test]
fn keyed_collections_keep_declaration_order() {
    let config = pipeline::parse_str(FIXTURE).unwrap();
    let jobs: Vec<&str> = config.jobs.keys().map(String::as_str).collect();
    assert_eq!(
        jobs,
        vec![
            "build-linux",
            "build-windows",
            "build-macos",
            "test-linux",
            "test-windows",
            "test-macos",
            "release",
        ]
    );
}

#[test]
fn two_jobs_with_scenario_order() {
    let yaml = r#"
version: "2.1"
parameters:
  src-repo-url:
    type: string
    default: "https://github.com/esnet/iperf.git"
jobs:
  build-linux:
    parameters:
      label:
        type: string
        default: "iperf3-linux"
workflows:
  build-test-release:
    jobs:
      - build-linux
      - test-linux:
          requires: [build-linux]
"#;
    let config = pipeline::parse_str(yaml).unwrap();
    assert_eq!(config.jobs["build-linux"].name, "build-linux");
    assert_eq!(config.jobs["build-linux"].parameters["label"].name, "label");
    assert_eq!(
        config.workflows.workflows["build-test-release"].jobs[1],
        workflow_job("test-linux", &["build-linux"])
    );
    assert_eq!(config.workflows.version, "");
}

#[test]
fn parameter_without_default_is_accepted() {
    let yaml = r#"
parameters:
  target:
    type: string
    description: Deployment target
"#;
    let config = pipeline::parse_str(yaml).unwrap();
    let target = &config.parameters["target"];
    assert_eq!(target.name, "target");
    assert_eq!(target.default, None);
    assert!(target.is_required());
}

#[test]
fn non_string_defaults_are_kept_as_values() {
    let yaml = r#"
parameters:
  run-tests:
    type: boolean
    default: false
  retries:
    type: integer
    default: 3
"#;
    let config = pipeline::parse_str(yaml).unwrap();
    assert_eq!(config.parameters["run-tests"].default, Some(Value::Bool(false)));
    assert_eq!(
        config.parameters["retries"]
            .default
            .as_ref()
            .and_then(Value::as_u64),
        Some(3)
    );
}

#[test]
fn raw_name_keys_are_overwritten() {
    let yaml = r#"
jobs:
  build:
    name: something-else
    parameters:
      label:
        name: wrong
        type: string
"#;
    let config = pipeline::parse_str(yaml).unwrap();
    assert_eq!(config.jobs["build"].name, "build");
    assert_eq!(config.jobs["build"].parameters["label"].name, "label");
}

#[test]
fn numeric_scalars_decode_as_text() {
    let yaml = r#"
version: 2
jobs:
  build:
    environment:
      RETRIES: 3
      VERBOSE: true
workflows:
  version: 2
"#;
    let config = pipeline::parse_str(yaml).unwrap();
    assert_eq!(config.version, "2");
    assert_eq!(config.workflows.version, "2");
    assert_eq!(config.jobs["build"].environment["RETRIES"], "3");
    assert_eq!(config.jobs["build"].environment["VERBOSE"], "true");
}

#[test]
fn scalar_text_is_kept_as_written() {
    let yaml = r#"
version: 2.10
parameters:
  node:
    type: string
    description: 1.10
jobs:
  build:
    environment:
      NODE: 1.10
      HEX: 0x1F
      BIG: 1e3
workflows:
  version: 2.10
"#;
    let config = pipeline::parse_str(yaml).unwrap();
    assert_eq!(config.version, "2.10");
    assert_eq!(config.workflows.version, "2.10");
    assert_eq!(config.parameters["node"].description.as_deref(), Some("1.10"));
    let environment = &config.jobs["build"].environment;
    assert_eq!(environment["NODE"], "1.10");
    assert_eq!(environment["HEX"], "0x1F");
    assert_eq!(environment["BIG"], "1e3");
}

#[test]
fn negative_parallelism_is_kept() {
    let config = pipeline::parse_str("jobs:\n  build:\n    parallelism: -1\n").unwrap();
    assert_eq!(config.jobs["build"].parallelism, -1);
}

#[test]
fn merge_key_inside_a_job_is_resolved() {
    let yaml = r#"
defaults: &defaults
  parallelism: 4
  environment:
    FOO: bar
jobs:
  build:
    <<: *defaults
    environment:
      FOO: override
  test:
    <<: *defaults
"#;
    let config = pipeline::parse_str(yaml).unwrap();
    assert_eq!(config.jobs["build"].parallelism, 4);
    assert_eq!(config.jobs["build"].environment["FOO"], "override");
    assert_eq!(config.jobs["test"].parallelism, 4);
    assert_eq!(config.jobs["test"].environment["FOO"], "bar");
}

#[test]
fn merge_key_in_a_keyed_map_adds_named_entries() {
    let yaml = r#"
common: &common
  lint: {}
  unit:
    parallelism: 2
jobs:
  <<: *common
  build: {}
"#;
    let config = pipeline::parse_str(yaml).unwrap();
    let names: Vec<&str> = config.jobs.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["build", "lint", "unit"]);
    assert_eq!(config.jobs["unit"].name, "unit");
    assert_eq!(config.jobs["unit"].parallelism, 2);
}

#[test]
fn merge_key_accepts_several_sources() {
    let yaml = r#"
linux: &linux
  environment:
    OS: linux
slow: &slow
  parallelism: 8
  environment:
    OS: ignored
jobs:
  build:
    <<: [*linux, *slow]
  test:
    environment:
      <<: {OS: linux, ARCH: x86_64}
      ARCH: arm64
    parameters:
      <<: {label: {type: string, default: "iperf3-linux"}}
"#;
    let config = pipeline::parse_str(yaml).unwrap();
    assert_eq!(config.jobs["build"].environment["OS"], "linux");
    assert_eq!(config.jobs["build"].parallelism, 8);
    assert_eq!(config.jobs["test"].environment["OS"], "linux");
    assert_eq!(config.jobs["test"].environment["ARCH"], "arm64");
    assert_eq!(config.jobs["test"].parameters["label"].name, "label");
    assert_eq!(config.jobs["test"].parameters["label"].kind, "string");
}

#[test]
fn merge_key_in_workflows_block() {
    let yaml = r#"
shared: &shared
  version: 2
  nightly:
    jobs: [build]
workflows:
  <<: *shared
  main:
    jobs: [lint]
"#;
    let config = pipeline::parse_str(yaml).unwrap();
    let workflows = &config.workflows;
    assert_eq!(workflows.version, "2");
    assert!(!workflows.workflows.contains_key("<<"));
    assert_eq!(workflows.workflows["main"].jobs, vec![workflow_job("lint", &[])]);
    assert_eq!(workflows.workflows["nightly"].name, "nightly");
    assert_eq!(workflows.workflows["nightly"].jobs, vec![workflow_job("build", &[])]);
}

#[test]
fn duplicate_keys_are_decode_errors() {
    let duplicates = [
        "jobs:\n  a: {parallelism: 1}\n  a: {parallelism: 2}\n",
        "parameters:\n  label: {type: string}\n  label: {type: boolean}\n",
        "jobs:\n  a:\n    environment: {FOO: x, FOO: y}\n",
        "jobs:\n  a:\n    parallelism: 1\n    parallelism: 2\n",
        "workflows:\n  main: {jobs: [a]}\n  main: {jobs: [b]}\n",
        "workflows:\n  version: 2\n  version: 2.1\n",
    ];
    for yaml in duplicates {
        assert!(pipeline::parse_str(yaml).is_err(), "{yaml} should be rejected");
    }
}

#[test]
fn empty_entries_decode_as_defaults() {
    let yaml = r#"
parameters:
jobs:
  release:
workflows:
  nightly:
"#;
    let config = pipeline::parse_str(yaml).unwrap();
    assert!(config.parameters.is_empty());
    assert_eq!(config.jobs["release"].name, "release");
    assert_eq!(config.jobs["release"].parallelism, 0);
    assert_eq!(config.workflows.workflows["nightly"].name, "nightly");
    assert!(config.workflows.workflows["nightly"].jobs.is_empty());
}

#[test]
fn malformed_yaml_is_a_decode_error() {
    let result = pipeline::parse_str("jobs: {build: {parallelism: 2}\n");
    assert!(result.is_err());
}

#[test]
fn string_where_jobs_list_expected_is_a_decode_error() {
    let yaml = r#"
workflows:
  build:
    jobs: build-linux
"#;
    let err = pipeline::parse_str(yaml).unwrap_err();
    assert!(err.location().is_some());
}

#[test]
fn type_mismatch_in_job_is_a_decode_error() {
    let yaml = r#"
jobs:
  build:
    environment: [FOO, BAR]
"#;
    assert!(pipeline::parse_str(yaml).is_err());
}

#[test]
fn load_from_file_reads_and_decodes() {
    let file = NamedTempFile::new().expect("temp file");
    fs::write(file.path(), FIXTURE).unwrap();
    let config = pipeline::load_from_file(file.path()).expect("fixture loads");
    assert_eq!(config, expected_fixture());
}

#[test]
fn load_from_file_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = pipeline::load_from_file(&dir.path().join("missing.yml")).unwrap_err();
    assert_eq!(err.category, circleci_docs::core::ErrorCategory::IoError);
    assert!(err.message.contains("missing.yml"));
}

#[test]
fn load_from_file_reports_decode_failure_with_path() {
    let file = NamedTempFile::new().expect("temp file");
    fs::write(file.path(), "workflows:\n  build:\n    jobs: oops\n").unwrap();
    let err = pipeline::load_from_file(file.path()).unwrap_err();
    assert_eq!(err.category, circleci_docs::core::ErrorCategory::DecodeError);
    assert_eq!(
        err.context.get("path"),
        Some(&file.path().display().to_string())
    );
}
