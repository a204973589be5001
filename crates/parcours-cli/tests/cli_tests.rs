// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use parcours_testkit::{fixture_lines, write_lines};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

struct Sandbox {
    _temp: tempfile::TempDir,
    dir: PathBuf,
}

impl Sandbox {
    fn new() -> Result<Self> {
        let temp = tempfile::tempdir()?;
        let dir = temp.path().to_path_buf();
        let config = format!(
            "version = 1\n[logging]\npath = {:?}\nlevel = \"debug\"\n",
            dir.join("parcours.log").display().to_string()
        );
        std::fs::write(dir.join("config.toml"), config)?;
        Ok(Self { _temp: temp, dir })
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        Ok(Command::new(env!("CARGO_BIN_EXE_parcours"))
            .args(args)
            .env("PARCOURS_CONFIG_PATH", self.path("config.toml"))
            .env_remove("PARCOURS_LOG")
            .output()?)
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn arg(path: &Path) -> String {
    path.display().to_string()
}

#[test]
fn print_example_config_writes_a_v1_template() -> Result<()> {
    let sandbox = Sandbox::new()?;
    let output = sandbox.run(&["--print-example-config"])?;
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("version = 1"));
    assert!(text.contains(&arg(&sandbox.path("config.toml"))));
    Ok(())
}

#[test]
fn check_loads_a_log_file_and_reports_counts() -> Result<()> {
    let sandbox = Sandbox::new()?;
    let log = sandbox.path("app.log");
    write_lines(&log, &fixture_lines())?;

    let output = sandbox.run(&["--check", &arg(&log)])?;
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(
        stdout(&output).contains("6 records, 6 matching"),
        "{}",
        stdout(&output)
    );

    let written = std::fs::read_to_string(sandbox.path("parcours.log"))?;
    assert!(written.contains("loaded logs"), "{written}");
    Ok(())
}

#[test]
fn check_with_example_layout_filters_the_demo_log() -> Result<()> {
    let sandbox = Sandbox::new()?;
    let layout = sandbox.run(&["--print-example-layout"])?;
    assert!(layout.status.success(), "{}", stderr(&layout));
    std::fs::write(sandbox.path("layout.toml"), layout.stdout)?;

    let output = sandbox.run(&["--check", "--demo"])?;
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.starts_with("demo: 5000 records"), "{text}");
    assert!(!text.contains("5000 matching"), "{text}");
    Ok(())
}

#[test]
fn missing_log_file_argument_is_an_error() -> Result<()> {
    let sandbox = Sandbox::new()?;
    let output = sandbox.run(&["--check"])?;
    assert!(!output.status.success());
    assert!(stderr(&output).contains("no log file given"));
    Ok(())
}

#[test]
fn unknown_argument_is_an_error() -> Result<()> {
    let sandbox = Sandbox::new()?;
    let output = sandbox.run(&["--wat"])?;
    assert!(!output.status.success());
    assert!(stderr(&output).contains("unknown argument \"--wat\""));
    Ok(())
}

#[test]
fn bad_layout_is_reported_with_its_path() -> Result<()> {
    let sandbox = Sandbox::new()?;
    std::fs::write(
        sandbox.path("layout.toml"),
        "[[columns]]\nfield = \"level\"\nwidth = 0\n",
    )?;
    let log = sandbox.path("app.log");
    write_lines(&log, &fixture_lines())?;

    let output = sandbox.run(&["--check", &arg(&log)])?;
    assert!(!output.status.success());
    let message = stderr(&output);
    assert!(message.contains("layout.toml"), "{message}");
    assert!(message.contains("width 0"), "{message}");
    Ok(())
}
