// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod layout;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow};
use config::Config;
use parcours_app::{AppState, DataStore};
use parcours_db::Store;
use parcours_testkit::LogFaker;
use runtime::{LayoutRuntime, prepare_store};
use std::env;
use std::io::Cursor;
use std::path::PathBuf;

const DEMO_SEED: u64 = 20_260_219;
const DEMO_LINES: usize = 5_000;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example_config {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    if options.print_example_layout {
        print!("{}", layout::example_layout());
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `parcours --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;
    logging::init(&config)?;

    let layout_path = options
        .layout_path
        .clone()
        .unwrap_or_else(|| config.layout_path(&options.config_path));
    let layout = layout::load_layout(&layout_path)?;

    let mut store = match config.db_path() {
        Some(db_path) => Store::open(&db_path).with_context(|| {
            format!(
                "open database {} -- if this path is wrong, fix [storage].db_path",
                db_path.display()
            )
        })?,
        None => Store::open_memory()?,
    };

    let records = if options.demo {
        let lines = LogFaker::new(DEMO_SEED).lines(DEMO_LINES);
        store.load_reader("demo", Cursor::new(lines.join("\n")))?
    } else {
        let log_path = options.log_path.as_ref().ok_or_else(|| {
            anyhow!("no log file given; pass a path to an NDJSON log or use --demo")
        })?;
        store.load_ndjson(log_path)?
    };

    let view = prepare_store(&mut store, &layout)?;
    if options.check_only {
        println!(
            "{}: {records} records, {} matching, {} fields",
            store.name(),
            view.total,
            view.fields.len()
        );
        return Ok(());
    }

    let mut state = AppState::new(store.name(), layout, view)?;
    let mut runtime = LayoutRuntime::new(layout_path);
    parcours_tui::run_app(&mut state, store, &mut runtime)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    layout_path: Option<PathBuf>,
    log_path: Option<PathBuf>,
    print_config_path: bool,
    print_example_config: bool,
    print_example_layout: bool,
    demo: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        layout_path: None,
        log_path: None,
        print_config_path: false,
        print_example_config: false,
        print_example_layout: false,
        demo: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--layout" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--layout requires a file path"))?;
                options.layout_path = Some(PathBuf::from(value.as_ref()));
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example_config = true;
            }
            "--print-example-layout" => {
                options.print_example_layout = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            flag if flag.starts_with('-') && flag != "-" => {
                return Err(anyhow!(
                    "unknown argument {flag:?}; run with --help to see supported options"
                ));
            }
            path => {
                if let Some(previous) = &options.log_path {
                    return Err(anyhow!(
                        "only one log file is supported; got {} and {path}",
                        previous.display()
                    ));
                }
                options.log_path = Some(PathBuf::from(path));
            }
        }
    }

    if options.demo && options.log_path.is_some() {
        return Err(anyhow!("--demo generates its own log; drop the file argument"));
    }

    Ok(options)
}

fn print_help() {
    println!("parcours [options] <log.ndjson>");
    println!("  --config <path>          Use a specific config path");
    println!("  --layout <path>          Use a specific layout file");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --print-example-layout   Print a layout template");
    println!("  --demo                   Browse generated service logs (in-memory)");
    println!("  --check                  Load config, layout and log, then exit");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, parse_cli_args};
    use anyhow::Result;
    use std::path::PathBuf;

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/parcours-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                layout_path: None,
                log_path: None,
                print_config_path: false,
                print_example_config: false,
                print_example_layout: false,
                demo: false,
                check_only: false,
                show_help: false,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_and_layout_overrides() -> Result<()> {
        let options = parse_cli_args(
            vec![
                "--config",
                "/custom/config.toml",
                "--layout",
                "/custom/layout.toml",
            ],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        assert_eq!(
            options.layout_path,
            Some(PathBuf::from("/custom/layout.toml"))
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_values() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));

        let error = parse_cli_args(vec!["--layout"], default_options_path())
            .expect_err("missing layout value should fail");
        assert!(error.to_string().contains("--layout requires a file path"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_takes_one_log_file() -> Result<()> {
        let options = parse_cli_args(vec!["--check", "app.log"], default_options_path())?;
        assert_eq!(options.log_path, Some(PathBuf::from("app.log")));
        assert!(options.check_only);

        let error = parse_cli_args(vec!["a.log", "b.log"], default_options_path())
            .expect_err("two files should fail");
        assert!(error.to_string().contains("only one log file"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_rejects_demo_with_a_file() {
        let error = parse_cli_args(vec!["--demo", "app.log"], default_options_path())
            .expect_err("demo plus file should fail");
        assert!(error.to_string().contains("--demo"));
    }

    #[test]
    fn parse_cli_args_sets_print_flags() -> Result<()> {
        let options = parse_cli_args(
            vec![
                "--print-config-path",
                "--print-example-config",
                "--print-example-layout",
            ],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(options.print_example_config);
        assert!(options.print_example_layout);
        assert!(!options.demo);
        assert!(!options.show_help);
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_help_flag_for_long_and_short_variants() -> Result<()> {
        let long = parse_cli_args(vec!["--help"], default_options_path())?;
        assert!(long.show_help);

        let short = parse_cli_args(vec!["-h"], default_options_path())?;
        assert!(short.show_help);
        Ok(())
    }
}
