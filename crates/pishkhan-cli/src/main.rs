// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, bail};
use config::Config;
use pishkhan_app::{AppState, Location, Screen, TabKind};
use pishkhan_db::Store;
use runtime::{DbRuntime, Simulation};
use std::env;
use std::path::PathBuf;

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

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `pishkhan --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let db_path = if options.demo {
        PathBuf::from(":memory:")
    } else {
        config.db_path()?
    };
    if options.print_db_path {
        println!("{}", db_path.display());
        return Ok(());
    }

    let initial = options
        .open_route
        .as_deref()
        .map(resolve_route)
        .transpose()?;

    let store = Store::open(&db_path).with_context(|| {
        format!(
            "open database {} -- if this path is wrong, set [storage].db_path or PISHKHAN_DB_PATH",
            db_path.display()
        )
    })?;
    store.bootstrap()?;
    if options.demo {
        store.seed_demo_data()?;
    }

    let simulation = Simulation {
        latency: config.mutation_latency()?,
        selection_delay: config.selection_delay()?,
        fail_every: config.fail_every(),
    };
    if options.check_only {
        return Ok(());
    }

    logging::init_logging(config.log_level(), &config.log_path()?)?;

    let mut state = AppState {
        selected_workspace: store.selected_workspace()?,
        ..AppState::default()
    };
    if let Some((tab, location)) = initial {
        if location.param(pishkhan_app::PAGE_PARAM).is_some() {
            store.set_location(tab, &location)?;
        }
        state.screen = Screen::List(tab);
    }

    tracing::info!(
        target: "pishkhan::cli",
        db = %db_path.display(),
        demo = options.demo,
        "starting"
    );
    let mut runtime = DbRuntime::with_settings(
        &store,
        simulation,
        config.grid_layout(),
        config.breakpoints(),
    );
    pishkhan_tui::run_app(&mut state, &mut runtime)
}

/// Maps `--open` values such as `/projects?page=2` to a list tab.
fn resolve_route(raw: &str) -> Result<(TabKind, Location)> {
    let location = Location::parse(raw.trim());
    let Some(tab) = TabKind::from_route(location.path()) else {
        let known = TabKind::ALL
            .iter()
            .map(|tab| tab.route())
            .collect::<Vec<_>>()
            .join(", ");
        bail!("unknown route {raw:?}; expected one of {known}");
    };
    Ok((tab, location))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_db_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
    open_route: Option<String>,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_db_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
        open_route: None,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--open" => {
                let value = iter.next().ok_or_else(|| {
                    anyhow::anyhow!("--open requires a route such as /projects?page=2")
                })?;
                options.open_route = Some(value.as_ref().to_owned());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-path" => {
                options.print_db_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
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
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("pishkhan");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-path             Print resolved database path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --demo                   Launch with seeded demo data (in-memory)");
    println!("  --open <route>           Start on a list, e.g. /projects?page=2");
    println!("  --check                  Validate config + DB, then exit");
    println!("  --help                   Show this help");
}
