//! Option tokens passed to the backup image.
//!
//! An [`ImageOption`] is a named, optionally valued entry that renders to a
//! single shell-safe token such as `--zip` or `--source="/srv/app"`. Options
//! are plain values; reconciling duplicates by name is the task's concern,
//! not the option's.

use thiserror::Error;

/// Errors raised while constructing an option.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum OptionError {
    /// Raised when an option name is empty after trimming.
    #[error("option name must not be empty")]
    EmptyName,
}

/// A single image option, rendered as `--name` or `--name="value"`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImageOption {
    name: String,
    value: Option<String>,
}

impl ImageOption {
    /// Creates a flag-only option such as `--zip`.
    ///
    /// # Errors
    ///
    /// Returns [`OptionError::EmptyName`] when `name` is empty after
    /// trimming.
    pub fn flag(name: impl Into<String>) -> Result<Self, OptionError> {
        let trimmed = validated_name(name)?;
        Ok(Self {
            name: trimmed,
            value: None,
        })
    }

    /// Creates a valued option such as `--source="/srv/app"`.
    ///
    /// # Errors
    ///
    /// Returns [`OptionError::EmptyName`] when `name` is empty after
    /// trimming.
    pub fn valued(name: impl Into<String>, value: impl Into<String>) -> Result<Self, OptionError> {
        let trimmed = validated_name(name)?;
        Ok(Self {
            name: trimmed,
            value: Some(value.into()),
        })
    }

    /// Constructs an option with a well-known, statically non-empty name.
    pub(crate) fn known(name: &'static str, value: Option<String>) -> Self {
        Self {
            name: name.to_owned(),
            value,
        }
    }

    /// Option name, as used for deduplication and ordering.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Option value, when one has been set.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Overwrites the value, turning a flag into a valued option.
    pub fn set_value(&mut self, value: impl Into<String>) -> &mut Self {
        self.value = Some(value.into());
        self
    }

    /// Renders the option as a single shell-safe token.
    ///
    /// A missing or empty value renders the bare flag form; otherwise the
    /// value is double-quoted with shell metacharacters escaped, so the
    /// token parses back to one word under a POSIX shell. The name is a
    /// controlled identifier and is never escaped.
    #[must_use]
    pub fn render(&self) -> String {
        match self.value.as_deref() {
            None | Some("") => format!("--{}", self.name),
            Some(value) => format!("--{}=\"{}\"", self.name, escape_double_quoted(value)),
        }
    }
}

fn validated_name(name: impl Into<String>) -> Result<String, OptionError> {
    let trimmed = name.into().trim().to_owned();
    if trimmed.is_empty() {
        return Err(OptionError::EmptyName);
    }
    Ok(trimmed)
}

/// Backslash-escapes the characters a POSIX shell interprets inside double
/// quotes: backslash, double quote, dollar, and backtick.
fn escape_double_quoted(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '"' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
