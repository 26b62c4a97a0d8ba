mod args;
mod help;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::info;

use qs::action::{Catalog, render_inline};
use qs::exec::ShellCommand;
use qs::sources::{self, OsFileSystem, Resolution, SearchPaths, Warning};

use args::{Cli, Invocation, Mode, UsageError};

fn main() -> ExitCode {
    if std::env::args_os().len() < 2 {
        println!("{}", help::USAGE);
        return ExitCode::from(2);
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            match UsageError::from_clap(&e) {
                Some(usage) => println!("{usage}"),
                None => print!("{e}"),
            }
            return ExitCode::from(2);
        }
    };

    let invocation = match Invocation::from_cli(cli) {
        Ok(invocation) => invocation,
        Err(e) => {
            println!("{e}");
            if e == UsageError::NoActionOrTemplate {
                println!("\n{}", help::USAGE);
            }
            return ExitCode::from(2);
        }
    };

    if let Err(e) = qs::logger::init(invocation.verbose) {
        eprintln!("Error: {e}");
    }

    let run_dir = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Error: could not determine the current directory: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&invocation, &run_dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.is_usage() {
                println!("{e}");
            } else {
                eprintln!("{e}");
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(invocation: &Invocation, run_dir: &Path) -> Result<(), qs::Error> {
    match &invocation.mode {
        Mode::Help => println!("{}\n\n{}", help::USAGE, help::HELP),
        Mode::Version => println!("{}", env!("CARGO_PKG_VERSION")),
        Mode::ListActions => {
            let resolution = load(invocation, run_dir)?;
            list_actions(&resolution);
        }
        Mode::Template(template) => {
            let (_, warnings) = sources::explicit_files(&invocation.config, &OsFileSystem);
            print_warnings(&warnings);
            info!("Resolved template: {template}");
            let command = render_inline(template, &invocation.args)?;
            execute(
                invocation,
                &ShellCommand {
                    command,
                    cwd: None,
                    run_dir: run_dir.to_path_buf(),
                },
            )?;
        }
        Mode::Action { name, help } => {
            let resolution = load(invocation, run_dir)?;
            let catalog = Catalog::new(&resolution.sources);
            if *help {
                println!("{}", catalog.usage(name)?);
                return Ok(());
            }

            let resolved = catalog.resolve(name, &invocation.args)?;
            execute(
                invocation,
                &ShellCommand {
                    command: resolved.command,
                    cwd: Some(resolved.cwd),
                    run_dir: run_dir.to_path_buf(),
                },
            )?;
        }
    }
    Ok(())
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Find and parse the config files, printing any warnings.
fn load(invocation: &Invocation, run_dir: &Path) -> Result<Resolution, qs::Error> {
    let search = SearchPaths::new(run_dir)
        .with_config_files(invocation.config.clone())
        .with_environment(env_path("XDG_CONFIG_HOME"), env_path("HOME"));
    match sources::resolve(&search, &OsFileSystem) {
        Ok(resolution) => {
            print_warnings(&resolution.warnings);
            Ok(resolution)
        }
        Err(e) => {
            print_warnings(&e.warnings);
            Err(e.error.into())
        }
    }
}

fn print_warnings(warnings: &[Warning]) {
    for warning in warnings {
        println!("{warning}");
    }
}

fn list_actions(resolution: &Resolution) {
    if resolution.sources.is_empty() {
        return;
    }
    println!("Available actions:");
    for definition in Catalog::new(&resolution.sources).available_actions() {
        println!(
            " - {:<35} ({})",
            definition.name,
            definition.source.path.display()
        );
    }
}

fn execute(invocation: &Invocation, command: &ShellCommand) -> Result<(), qs::Error> {
    if invocation.dry_run {
        println!("Would run: {command}");
        return Ok(());
    }

    info!("Running: {command}");
    let status = command.run()?;
    if !status.success() {
        info!("Command exited with {status}");
    }
    Ok(())
}
