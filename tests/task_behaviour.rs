//! Behavioural coverage for invocation synthesis, reconciliation, and
//! dispatch through a scripted runner.

use carina::test_support::ScriptedRunner;
use carina::{CommandOutput, DockerConfig, Mode, Task, TaskError};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use thiserror::Error;

#[derive(Clone, Debug)]
struct TaskContext {
    runner: ScriptedRunner,
    task: Option<Task>,
    outcome: Option<TaskOutcome>,
}

#[derive(Clone, Debug)]
enum TaskOutcome {
    Success(CommandOutput),
    Failure(TaskError),
}

#[derive(Debug, Error)]
enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

fn docker_config() -> DockerConfig {
    DockerConfig {
        docker_bin: String::from("docker"),
    }
}

#[fixture]
fn task_context() -> TaskContext {
    TaskContext {
        runner: ScriptedRunner::new(),
        task: None,
        outcome: None,
    }
}

fn with_task(
    mut context: TaskContext,
    configure: impl FnOnce(&mut Task),
) -> Result<TaskContext, StepError> {
    let Some(task) = context.task.as_mut() else {
        return Err(StepError::Assertion(String::from("task not initialised")));
    };
    configure(task);
    Ok(context)
}

fn first_invocation(context: &TaskContext) -> Result<carina::test_support::CommandInvocation, StepError> {
    context
        .runner
        .invocations()
        .into_iter()
        .next()
        .ok_or_else(|| StepError::Assertion(String::from("no invocation recorded")))
}

#[given("a backup task mounting volumes from \"{container}\"")]
fn backup_task(mut task_context: TaskContext, container: String) -> TaskContext {
    task_context.task = Some(Task::new(Mode::Backup, container, &docker_config()));
    task_context
}

#[given("a restore task mounting volumes from \"{container}\"")]
fn restore_task(mut task_context: TaskContext, container: String) -> TaskContext {
    task_context.task = Some(Task::new(Mode::Restore, container, &docker_config()));
    task_context
}

#[given("the archive source is \"{path}\"")]
fn archive_source(task_context: TaskContext, path: String) -> Result<TaskContext, StepError> {
    with_task(task_context, |task| {
        task.set_source(path);
    })
}

#[given("the archive streams to stdout file \"{file}\"")]
fn archive_stdout(task_context: TaskContext, file: String) -> Result<TaskContext, StepError> {
    with_task(task_context, |task| {
        task.set_stdout(file);
    })
}

#[given("the restore destination is \"{path}\"")]
fn restore_destination(task_context: TaskContext, path: String) -> Result<TaskContext, StepError> {
    with_task(task_context, |task| {
        task.set_destination(path);
    })
}

#[given("the restore reads stdin file \"{file}\"")]
fn restore_stdin(task_context: TaskContext, file: String) -> Result<TaskContext, StepError> {
    with_task(task_context, |task| {
        task.set_stdin(file);
    })
}

#[given("gzip compression is enabled")]
fn gzip_enabled(task_context: TaskContext) -> Result<TaskContext, StepError> {
    with_task(task_context, |task| {
        task.set_zip(true);
    })
}

#[given("the runner is scripted to succeed")]
fn runner_succeeds(task_context: TaskContext) -> TaskContext {
    task_context.runner.push_success();
    task_context
}

#[given("the runner is scripted to exit with \"{code}\"")]
fn runner_exits(task_context: TaskContext, code: i32) -> TaskContext {
    task_context.runner.push_failure(code);
    task_context
}

#[when("I execute the task")]
fn execute_task(mut task_context: TaskContext) -> Result<TaskContext, StepError> {
    let Some(task) = task_context.task.take() else {
        return Err(StepError::Assertion(String::from("task not initialised")));
    };

    let outcome = match task.execute(&task_context.runner) {
        Ok(output) => TaskOutcome::Success(output),
        Err(err) => TaskOutcome::Failure(err),
    };
    task_context.outcome = Some(outcome);
    Ok(task_context)
}

#[then("the dispatched command line is the canonical backup invocation")]
fn canonical_backup_dispatched(task_context: &TaskContext) -> Result<(), StepError> {
    let invocation = first_invocation(task_context)?;
    let expected = concat!(
        "docker run --rm --volumes-from=data-container carinamarina/backup backup ",
        "--source=\"/srv/app\" --stdout=\"out.tar\" --zip"
    );
    if invocation.command_string() == expected {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "unexpected command line: {}",
            invocation.command_string()
        )))
    }
}

#[then("the dispatched command line is the canonical restore invocation")]
fn canonical_restore_dispatched(task_context: &TaskContext) -> Result<(), StepError> {
    let invocation = first_invocation(task_context)?;
    let expected = concat!(
        "docker run --rm --volumes-from=data-container carinamarina/backup restore ",
        "--destination=\"/srv/app\" --stdin=\"in.tar\""
    );
    if invocation.command_string() == expected {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "unexpected command line: {}",
            invocation.command_string()
        )))
    }
}

#[then("the dispatched source option is \"{path}\"")]
fn dispatched_source(task_context: &TaskContext, path: String) -> Result<(), StepError> {
    let invocation = first_invocation(task_context)?;
    let sources: Vec<String> = invocation
        .args
        .iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .filter(|arg| arg.starts_with("--source="))
        .collect();

    let expected = vec![format!("--source=\"{path}\"")];
    if sources == expected {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "unexpected source options: {sources:?}"
        )))
    }
}

#[then("exactly one process was spawned")]
fn one_process_spawned(task_context: &TaskContext) -> Result<(), StepError> {
    let count = task_context.runner.invocations().len();
    if count == 1 {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected one invocation, got {count}"
        )))
    }
}

#[then("no process was spawned")]
fn no_process_spawned(task_context: &TaskContext) -> Result<(), StepError> {
    if task_context.runner.invocations().is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(String::from(
            "a process was spawned despite failed validation",
        )))
    }
}

#[then("execution fails because \"{name}\" is missing")]
fn fails_naming_missing_option(task_context: &TaskContext, name: String) -> Result<(), StepError> {
    match &task_context.outcome {
        Some(TaskOutcome::Failure(TaskError::MissingOption { name: missing, .. }))
            if *missing == name.as_str() =>
        {
            Ok(())
        }
        other => Err(StepError::Assertion(format!(
            "unexpected outcome: {other:?}"
        ))),
    }
}

#[then("execution fails with exit status \"{code}\"")]
fn fails_with_exit_status(task_context: &TaskContext, code: i32) -> Result<(), StepError> {
    match &task_context.outcome {
        Some(TaskOutcome::Failure(TaskError::CommandFailure {
            status: Some(actual),
            ..
        })) if *actual == code => Ok(()),
        other => Err(StepError::Assertion(format!(
            "unexpected outcome: {other:?}"
        ))),
    }
}

#[scenario(
    path = "tests/features/task.feature",
    name = "Render the canonical backup invocation"
)]
fn scenario_canonical_backup(task_context: TaskContext) {
    let _ = task_context;
}

#[scenario(
    path = "tests/features/task.feature",
    name = "Render the canonical restore invocation"
)]
fn scenario_canonical_restore(task_context: TaskContext) {
    let _ = task_context;
}

#[scenario(
    path = "tests/features/task.feature",
    name = "Later duplicates shadow earlier options"
)]
fn scenario_duplicates_shadow(task_context: TaskContext) {
    let _ = task_context;
}

#[scenario(
    path = "tests/features/task.feature",
    name = "Reject a backup with no source"
)]
fn scenario_reject_backup(task_context: TaskContext) {
    let _ = task_context;
}

#[scenario(
    path = "tests/features/task.feature",
    name = "Reject a restore with no stdin"
)]
fn scenario_reject_restore(task_context: TaskContext) {
    let _ = task_context;
}

#[scenario(
    path = "tests/features/task.feature",
    name = "Surface a non-zero container exit"
)]
fn scenario_nonzero_exit(task_context: TaskContext) {
    let _ = task_context;
}
