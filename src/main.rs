//! Binary entry point for the carina CLI.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use carina::{
    CommandOutput, DockerConfig, Mode, OptionError, ProcessCommandRunner, Task, TaskError,
};

mod cli;

use cli::{BackupCommand, Cli, RestoreCommand};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid option argument: {0}")]
    Option(#[from] OptionError),
    #[error(transparent)]
    Task(#[from] TaskError),
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli) {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();
}

fn dispatch(cli: Cli) -> Result<(), CliError> {
    let task = match cli {
        Cli::Backup(command) => backup_task(&command)?,
        Cli::Restore(command) => restore_task(&command)?,
    };

    let output = task.execute(&ProcessCommandRunner)?;
    forward_output(&output);
    Ok(())
}

fn backup_task(args: &BackupCommand) -> Result<Task, CliError> {
    let config = load_config()?;
    let mut task = Task::new(Mode::Backup, &args.volumes_from, &config);
    if let Some(source) = &args.source {
        task.set_source(source);
    }
    if let Some(stdout) = &args.stdout {
        task.set_stdout(stdout);
    }
    if let Some(container) = &args.container {
        task.set_container(container);
    }
    task.set_zip(args.zip);
    apply_extra_options(&mut task, &args.options)?;
    Ok(task)
}

fn restore_task(args: &RestoreCommand) -> Result<Task, CliError> {
    let config = load_config()?;
    let mut task = Task::new(Mode::Restore, &args.volumes_from, &config);
    if let Some(destination) = &args.destination {
        task.set_destination(destination);
    }
    if let Some(stdin) = &args.stdin {
        task.set_stdin(stdin);
    }
    if let Some(container) = &args.container {
        task.set_container(container);
    }
    task.set_zip(args.zip);
    apply_extra_options(&mut task, &args.options)?;
    Ok(task)
}

fn load_config() -> Result<DockerConfig, CliError> {
    DockerConfig::load_without_cli_args().map_err(|err| CliError::Config(err.to_string()))
}

/// Appends `NAME` / `NAME=VALUE` entries from the generic `--option`
/// channel. Entries land after the named conveniences, so they win any
/// name collision by recency.
fn apply_extra_options(task: &mut Task, entries: &[String]) -> Result<(), CliError> {
    for entry in entries {
        match entry.split_once('=') {
            Some((name, value)) => task.add_option(name, value)?,
            None => task.add_flag(entry)?,
        };
    }
    Ok(())
}

fn forward_output(output: &CommandOutput) {
    let mut stdout = io::stdout();
    stdout.write_all(output.stdout.as_bytes()).ok();
    let mut stderr = io::stderr();
    stderr.write_all(output.stderr.as_bytes()).ok();
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
