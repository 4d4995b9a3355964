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

//! Sinks that receive formatted log lines.

use std::fmt;

use crate::Error;
use crate::Level;

mod console;
pub mod rolling_file;
pub mod webhook;

pub use self::console::Console;
pub use self::console::ConsoleTarget;
pub use self::rolling_file::RollingFile;
pub use self::webhook::Webhook;

/// A trait representing a sink that can receive formatted log lines.
///
/// A logger formats each record once per attachment and hands the resulting line, without a
/// trailing newline, to [`Append::write`].
pub trait Append: fmt::Debug + Send + Sync + 'static {
    /// Whether a record at `level` should reach this sink.
    fn accepts(&self, level: Level) -> bool;

    /// Write one formatted line.
    fn write(&self, line: &str) -> Result<(), Error>;

    /// Flush any buffered lines.
    fn flush(&self) -> Result<(), Error> {
        Ok(())
    }

    /// The kind of sink, for introspection.
    fn kind(&self) -> AppendKind;
}

/// The kinds of sinks a logger can have attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppendKind {
    Console,
    RollingFile,
    Webhook,
}
