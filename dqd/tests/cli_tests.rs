use anyhow::{Context, Result};
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

/// The synthea demo project, with its database seeded into a scratch directory.
struct DqdTestEnv {
    tmp: TempDir,
    project: PathBuf,
    database: PathBuf,
}

impl DqdTestEnv {
    fn new() -> Result<Self> {
        let tmp = tempfile::tempdir()?;
        let project = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .context("Workspace root not found")?
            .join("demos/synthea");

        let database = tmp.path().join("synthea.duckdb");
        let seed = std::fs::read_to_string(project.join("seed.sql"))?;
        duckdb::Connection::open(&database)?.execute_batch(&seed)?;

        Ok(Self {
            tmp,
            project,
            database,
        })
    }

    fn output_dir(&self) -> PathBuf {
        self.tmp.path().join("reports")
    }

    /// `dqd <name> --project-dir <demo>`, pointed at the scratch database.
    fn dqd(&self, name: &str) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("dqd"));
        cmd.env("DQD_DATABASE", &self.database)
            .env("RUST_LOG", "warn")
            .arg(name)
            .arg("--project-dir")
            .arg(&self.project);
        cmd
    }

    fn single_report(&self) -> Result<serde_json::Value> {
        let mut reports = std::fs::read_dir(self.output_dir())?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        assert_eq!(reports.len(), 1, "expected exactly one report");
        let path = reports.remove(0);

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .context("Report name is not UTF-8")?;
        assert!(name.starts_with("syn-") && name.ends_with(".json"), "{}", name);

        Ok(serde_json::from_str(&std::fs::read_to_string(&path)?)?)
    }
}

#[test]
fn test_run_writes_report() -> Result<()> {
    let env = DqdTestEnv::new()?;

    env.dqd("run")
        .arg("-o")
        .arg(env.output_dir())
        .assert()
        .success()
        .stdout(predicate::str::contains("Report saved to"))
        .stderr(predicate::str::contains("could not be executed"));

    let report = env.single_report()?;
    assert_eq!(report["Overview"]["countTotal"], 7);
    assert_eq!(report["Overview"]["countOverallFailed"], 3);
    assert_eq!(report["Overview"]["countErrorFailed"], 1);
    assert_eq!(report["Overview"]["percentFailed"], 43);
    assert_eq!(report["Metadata"][0]["CDM_SOURCE_ABBREVIATION"], "SYN");

    let results = report["CheckResults"]
        .as_array()
        .context("CheckResults is not an array")?;
    assert_eq!(results.len(), 7);
    assert_eq!(results[0]["CHECK_NAME"], "cdmTable");
    assert_eq!(results[0]["FAILED"], 0);
    assert_eq!(results[2]["FAILED"], 1);
    assert!(results[2]["ERROR"].is_string());
    Ok(())
}

#[test]
fn test_run_with_extra_exclusion() -> Result<()> {
    let env = DqdTestEnv::new()?;

    env.dqd("run")
        .args(["--exclude", "VISIT_OCCURRENCE", "--max-workers", "2", "-o"])
        .arg(env.output_dir())
        .assert()
        .success();

    let report = env.single_report()?;
    assert_eq!(report["Overview"]["countTotal"], 6);
    assert_eq!(report["Overview"]["countErrorFailed"], 0);
    Ok(())
}

#[test]
fn test_plan_lists_instances() -> Result<()> {
    let env = DqdTestEnv::new()?;

    env.dqd("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("plausibleGender"))
        .stdout(predicate::str::contains("4 checks, 7 instances"));
    Ok(())
}

#[test]
fn test_missing_project_file_fails() -> Result<()> {
    let env = DqdTestEnv::new()?;
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("dqd"));
    cmd.env("RUST_LOG", "warn")
        .arg("run")
        .arg("--project-dir")
        .arg(env.tmp.path());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load project configuration"));
    Ok(())
}
