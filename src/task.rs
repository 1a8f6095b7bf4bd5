//! Invocation building, validation, and execution for backup image runs.
//!
//! A [`Task`] records configuration as an append-only log of
//! [`ImageOption`] entries, reconciles duplicates by name with
//! last-write-wins semantics, validates the set required by the chosen
//! [`Mode`], and renders a deterministic `docker run` argument vector
//! before handing it to a [`CommandRunner`]. The whole flow is
//! synchronous and single pass: configure, validate, render, dispatch.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::info;

use crate::config::DockerConfig;
use crate::exec::{CommandOutput, CommandRunner};
use crate::options::{ImageOption, OptionError};

/// Image reference baked into every generated command.
pub const BACKUP_IMAGE: &str = "carinamarina/backup";

/// Direction of the archive operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Mode {
    /// Archive a directory from the mounted volumes.
    Backup,
    /// Unpack an archive into the mounted volumes.
    Restore,
}

impl Mode {
    /// Wire word used on the rendered command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Backup => "backup",
            Self::Restore => "restore",
        }
    }

    /// Logical option names that must carry a non-empty effective value
    /// before a task in this mode may run.
    const fn required_options(self) -> [&'static str; 2] {
        match self {
            Self::Backup => ["source", "stdout"],
            Self::Restore => ["destination", "stdin"],
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = TaskError;

    fn from_str(value: &str) -> Result<Self, TaskError> {
        match value {
            "backup" => Ok(Self::Backup),
            "restore" => Ok(Self::Restore),
            other => Err(TaskError::InvalidMode {
                value: other.to_owned(),
            }),
        }
    }
}

/// Errors surfaced while validating or executing a task.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum TaskError {
    /// Raised when a mode string is neither `backup` nor `restore`.
    #[error("mode must be either \"backup\" or \"restore\", got \"{value}\"")]
    InvalidMode {
        /// The unrecognised mode string.
        value: String,
    },
    /// Raised when the volume source container reference is blank.
    #[error("volumes-from container reference must not be empty")]
    MissingVolumesFrom,
    /// Raised when a mode-required option has no non-empty effective value.
    #[error("missing required option for {mode} mode: {name}")]
    MissingOption {
        /// Mode whose requirements were violated.
        mode: Mode,
        /// Logical option name with no effective value.
        name: &'static str,
    },
    /// Raised when the container runtime binary cannot be started.
    #[error("failed to spawn {program}: {message}")]
    Spawn {
        /// Command that failed to start.
        program: String,
        /// Operating system error string.
        message: String,
    },
    /// Raised when the container runtime exits with a non-zero status.
    #[error("{program} exited with status {status_text}: {stderr}")]
    CommandFailure {
        /// Command name used for the attempted operation.
        program: String,
        /// Exit status as reported by the OS.
        status: Option<i32>,
        /// Human readable representation of the exit status.
        status_text: String,
        /// Stderr captured from the process.
        stderr: String,
    },
}

/// Builds and executes one backup or restore invocation.
///
/// Repeated configuration of the same logical option appends duplicate
/// log entries rather than replacing earlier ones; the most recently
/// appended entry per name wins when the command is rendered. Executing
/// consumes the task, so a finalized invocation cannot be reused.
#[derive(Clone, Debug)]
pub struct Task {
    mode: Mode,
    volumes_from: String,
    docker_bin: String,
    options: Vec<ImageOption>,
}

impl Task {
    /// Creates a task for `mode`, mounting volumes from the named
    /// container. The container runtime binary is resolved from `config`
    /// once, here; the configuration is never consulted again.
    #[must_use]
    pub fn new(mode: Mode, volumes_from: impl Into<String>, config: &DockerConfig) -> Self {
        Self {
            mode,
            volumes_from: volumes_from.into(),
            docker_bin: config.docker_bin.clone(),
            options: Vec::new(),
        }
    }

    /// Mode this task was created for.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Appends an option to the log. Duplicate names are allowed; the
    /// later entry shadows the earlier one at render time.
    pub fn push_option(&mut self, option: ImageOption) -> &mut Self {
        self.options.push(option);
        self
    }

    /// Appends a new valued option by name.
    ///
    /// # Errors
    ///
    /// Returns [`OptionError::EmptyName`] when `name` is blank.
    pub fn add_option(
        &mut self,
        name: &str,
        value: impl Into<String>,
    ) -> Result<&mut Self, OptionError> {
        let option = ImageOption::valued(name, value)?;
        Ok(self.push_option(option))
    }

    /// Appends a new flag-only option by name.
    ///
    /// # Errors
    ///
    /// Returns [`OptionError::EmptyName`] when `name` is blank.
    pub fn add_flag(&mut self, name: &str) -> Result<&mut Self, OptionError> {
        let option = ImageOption::flag(name)?;
        Ok(self.push_option(option))
    }

    /// Sets the Cloud Files container that receives the archive.
    pub fn set_container(&mut self, container: impl Into<String>) -> &mut Self {
        self.push_option(ImageOption::known("container", Some(container.into())))
    }

    /// Sets the directory to archive (backup only).
    pub fn set_source(&mut self, source: impl Into<String>) -> &mut Self {
        self.push_option(ImageOption::known("source", Some(source.into())))
    }

    /// Sets the destination for archive contents (restore only).
    pub fn set_destination(&mut self, destination: impl Into<String>) -> &mut Self {
        self.push_option(ImageOption::known("destination", Some(destination.into())))
    }

    /// Sets the stdin file to read the archive from (restore only).
    pub fn set_stdin(&mut self, stdin: impl Into<String>) -> &mut Self {
        self.push_option(ImageOption::known("stdin", Some(stdin.into())))
    }

    /// Sets the stdout file the archive is written to (backup only).
    pub fn set_stdout(&mut self, stdout: impl Into<String>) -> &mut Self {
        self.push_option(ImageOption::known("stdout", Some(stdout.into())))
    }

    /// Adds the gzip flag when `enabled` is true. Passing `false` neither
    /// appends a disabling option nor removes one added earlier; flags
    /// are additive only.
    pub fn set_zip(&mut self, enabled: bool) -> &mut Self {
        if enabled {
            self.push_option(ImageOption::known("zip", None));
        }
        self
    }

    /// Resolves the option log into the effective per-name set.
    ///
    /// Entries are folded in insertion order, a later entry with a
    /// previously seen name overwriting the earlier one, even when that
    /// turns a valued option into a flag or vice versa. Iterating the
    /// result yields names alphabetically, the order used for rendering.
    #[must_use]
    pub fn effective_options(&self) -> BTreeMap<&str, &ImageOption> {
        let mut resolved = BTreeMap::new();
        for option in &self.options {
            resolved.insert(option.name(), option);
        }
        resolved
    }

    /// Checks that everything required to render the command is present.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::MissingVolumesFrom`] when the volume source is
    /// blank, or [`TaskError::MissingOption`] naming the first
    /// mode-required option without a non-empty effective value.
    pub fn check_requirements(&self) -> Result<(), TaskError> {
        if self.volumes_from.trim().is_empty() {
            return Err(TaskError::MissingVolumesFrom);
        }

        let effective = self.effective_options();
        for name in self.mode.required_options() {
            let present = effective
                .get(name)
                .and_then(|option| option.value())
                .is_some_and(|value| !value.is_empty());
            if !present {
                return Err(TaskError::MissingOption {
                    mode: self.mode,
                    name,
                });
            }
        }
        Ok(())
    }

    /// Renders the full argument vector, container runtime binary first.
    ///
    /// Rendering is pure; calling it repeatedly yields the same vector.
    ///
    /// # Errors
    ///
    /// Returns any error from [`Task::check_requirements`].
    pub fn build_command(&self) -> Result<Vec<String>, TaskError> {
        self.check_requirements()?;
        let args = self.render_args();
        let mut command = Vec::with_capacity(args.len() + 1);
        command.push(self.docker_bin.clone());
        command.extend(args);
        Ok(command)
    }

    /// Validates, renders, and dispatches the command via `runner`,
    /// consuming the task.
    ///
    /// The fully rendered command line is reported at info level before
    /// dispatch; a failed validation prevents any process from being
    /// spawned. A non-zero or absent exit status is surfaced as
    /// [`TaskError::CommandFailure`] carrying the runner's stderr
    /// unchanged; no retry is attempted.
    ///
    /// # Errors
    ///
    /// Returns validation errors from [`Task::check_requirements`],
    /// [`TaskError::Spawn`] when the binary cannot be started, or
    /// [`TaskError::CommandFailure`] on an unsuccessful exit.
    pub fn execute<R: CommandRunner>(self, runner: &R) -> Result<CommandOutput, TaskError> {
        self.check_requirements()?;
        let args = self.render_args();
        info!("executing command: {} {}", self.docker_bin, args.join(" "));

        let os_args: Vec<OsString> = args.iter().map(OsString::from).collect();
        let output = runner.run(&self.docker_bin, &os_args)?;
        if output.is_success() {
            return Ok(output);
        }

        let status_text = output
            .code
            .map_or_else(|| String::from("unknown"), |code| code.to_string());
        Err(TaskError::CommandFailure {
            program: self.docker_bin,
            status: output.code,
            status_text,
            stderr: output.stderr,
        })
    }

    /// Renders the fixed prefix and the alphabetically ordered effective
    /// options, without the leading binary.
    fn render_args(&self) -> Vec<String> {
        let mut args = vec![
            String::from("run"),
            String::from("--rm"),
            format!("--volumes-from={}", self.volumes_from),
            String::from(BACKUP_IMAGE),
            self.mode.to_string(),
        ];
        args.extend(self.effective_options().values().map(|option| option.render()));
        args
    }
}
