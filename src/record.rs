// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Log record and level.

use std::error::Error as StdError;
use std::fmt;
use std::str::FromStr;

use jiff::Timestamp;

/// The severity of a log record.
///
/// Levels are ordered from the least to the most severe, so `Level::Debug < Level::Critical`.
#[repr(usize)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Level {
    /// Designates lower priority information.
    Debug = 1,
    /// Designates useful information.
    Info,
    /// Designates hazardous situations.
    Warning,
    /// Designates very serious errors.
    Error,
    /// Designates errors the program may not survive.
    Critical,
}

impl Level {
    /// All levels, least severe first.
    pub const ALL: [Level; 5] = [
        Level::Debug,
        Level::Info,
        Level::Warning,
        Level::Error,
        Level::Critical,
    ];

    /// Return the string representation of the `Level`.
    ///
    /// This returns the same string as the `fmt::Display` implementation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// The value could not be parsed as a [`Level`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level '{0}'")]
pub struct ParseLevelError(pub String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Level::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseLevelError(s.to_string()))
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warning,
            log::Level::Info => Self::Info,
            log::Level::Debug => Self::Debug,
            log::Level::Trace => Self::Debug,
        }
    }
}

impl From<Level> for log::LevelFilter {
    fn from(level: Level) -> Self {
        match level {
            Level::Debug => log::LevelFilter::Trace,
            Level::Info => log::LevelFilter::Info,
            Level::Warning => log::LevelFilter::Warn,
            Level::Error | Level::Critical => log::LevelFilter::Error,
        }
    }
}

/// A single log event.
///
/// Records are immutable once created: call sites produce them and sinks only read them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRecord {
    timestamp: Timestamp,
    level: Level,
    name: String,
    message: String,
    exception: Option<String>,
}

impl LogRecord {
    /// Create a record observed now.
    pub fn new(level: Level, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::at(Timestamp::now(), level, name, message)
    }

    /// Create a record observed at `timestamp`.
    pub fn at(
        timestamp: Timestamp,
        level: Level,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            level,
            name: name.into(),
            message: message.into(),
            exception: None,
        }
    }

    /// Attach error detail, consuming the record.
    ///
    /// The detail is the error's message followed by its `source` chain, joined by `": "`.
    pub fn with_exception(mut self, err: &(dyn StdError + 'static)) -> Self {
        self.exception = Some(error_chain(err));
        self
    }

    /// Attach an already rendered error detail, consuming the record.
    pub fn with_exception_text(mut self, detail: impl Into<String>) -> Self {
        self.exception = Some(detail.into());
        self
    }

    /// The observed time.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// The severity of the record.
    pub fn level(&self) -> Level {
        self.level
    }

    /// The name of the logger that produced the record.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The message body.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The attached error detail, if any.
    pub fn exception(&self) -> Option<&str> {
        self.exception.as_deref()
    }
}

fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
