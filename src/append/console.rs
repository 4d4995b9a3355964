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

use std::fmt;
use std::io;
use std::io::IsTerminal;
use std::io::Write;
use std::sync::Mutex;

use crate::Error;
use crate::Level;
use crate::append::Append;
use crate::append::AppendKind;

/// Where a [`Console`] sink writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleTarget {
    #[default]
    Stdout,
    Stderr,
}

enum Output {
    Target(ConsoleTarget),
    Writer(Mutex<Box<dyn Write + Send>>),
}

/// A sink that prints log lines to the console.
///
/// # Examples
///
/// ```
/// use fxlog::Level;
/// use fxlog::append::Console;
/// use fxlog::append::ConsoleTarget;
///
/// let console = Console::new(ConsoleTarget::Stderr, Level::Warning);
/// ```
pub struct Console {
    output: Output,
    level: Level,
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let output = match &self.output {
            Output::Target(target) => format!("{target:?}"),
            Output::Writer(_) => "Writer".to_string(),
        };
        f.debug_struct("Console")
            .field("output", &output)
            .field("level", &self.level)
            .finish()
    }
}

impl Console {
    /// Create a console sink for a standard stream.
    pub fn new(target: ConsoleTarget, level: Level) -> Self {
        Self {
            output: Output::Target(target),
            level,
        }
    }

    /// Create a console sink over an arbitrary writer, such as a buffer in tests.
    pub fn with_writer(writer: impl Write + Send + 'static, level: Level) -> Self {
        Self {
            output: Output::Writer(Mutex::new(Box::new(writer))),
            level,
        }
    }

    /// Whether the underlying stream is attached to a terminal.
    ///
    /// Custom writers are never terminals.
    pub fn is_terminal(&self) -> bool {
        match self.output {
            Output::Target(ConsoleTarget::Stdout) => io::stdout().is_terminal(),
            Output::Target(ConsoleTarget::Stderr) => io::stderr().is_terminal(),
            Output::Writer(_) => false,
        }
    }

    fn write_line(mut writer: impl Write, line: &str) -> io::Result<()> {
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")
    }
}

impl Append for Console {
    fn accepts(&self, level: Level) -> bool {
        level >= self.level
    }

    fn write(&self, line: &str) -> Result<(), Error> {
        let result = match &self.output {
            Output::Target(ConsoleTarget::Stdout) => Self::write_line(io::stdout().lock(), line),
            Output::Target(ConsoleTarget::Stderr) => Self::write_line(io::stderr().lock(), line),
            Output::Writer(writer) => {
                let mut writer = writer.lock().unwrap_or_else(|e| e.into_inner());
                Self::write_line(&mut *writer, line)
            }
        };
        result.map_err(Error::from_io_error)
    }

    fn flush(&self) -> Result<(), Error> {
        let result = match &self.output {
            Output::Target(ConsoleTarget::Stdout) => io::stdout().flush(),
            Output::Target(ConsoleTarget::Stderr) => io::stderr().flush(),
            Output::Writer(writer) => writer.lock().unwrap_or_else(|e| e.into_inner()).flush(),
        };
        result.map_err(Error::from_io_error)
    }

    fn kind(&self) -> AppendKind {
        AppendKind::Console
    }
}
