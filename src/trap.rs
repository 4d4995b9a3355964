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

//! Traps receive the diagnostics of the logging subsystem itself.
//!
//! Sink failures, resolver warnings and capability notices all end up here instead of being
//! raised to the caller of a log operation.

use std::fmt;
use std::io;
use std::io::Write;
use std::sync::Arc;
use std::sync::Mutex;

use crate::Error;

/// A sink for diagnostics about logging itself.
pub trait Trap: fmt::Debug + Send + Sync + 'static {
    /// Handle a runtime failure.
    fn trap(&self, err: &Error);

    /// Handle a non-fatal warning or notice.
    fn warn(&self, message: &str);
}

impl<T: Trap + ?Sized> Trap for Arc<T> {
    fn trap(&self, err: &Error) {
        (**self).trap(err)
    }

    fn warn(&self, message: &str) {
        (**self).warn(message)
    }
}

/// A default trap that sends diagnostics to standard error if possible.
///
/// If standard error is not available, it does nothing.
#[derive(Debug, Default)]
#[non_exhaustive]
pub struct DefaultTrap {}

impl Trap for DefaultTrap {
    fn trap(&self, err: &Error) {
        let _ = writeln!(io::stderr(), "{err}");
    }

    fn warn(&self, message: &str) {
        let _ = writeln!(io::stderr(), "{message}");
    }
}

/// A trap that keeps every diagnostic in memory.
///
/// Useful in tests to assert that a diagnostic was emitted.
///
/// # Examples
///
/// ```
/// use fxlog::trap::CollectingTrap;
/// use fxlog::trap::Trap;
///
/// let trap = CollectingTrap::default();
/// trap.warn("colored output unavailable");
/// assert_eq!(trap.messages(), vec!["colored output unavailable".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct CollectingTrap {
    messages: Mutex<Vec<String>>,
}

impl CollectingTrap {
    /// All diagnostics seen so far, in order.
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Whether any diagnostic contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.messages().iter().any(|m| m.contains(needle))
    }

    fn push(&self, message: String) {
        self.messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message);
    }
}

impl Trap for CollectingTrap {
    fn trap(&self, err: &Error) {
        self.push(err.to_string());
    }

    fn warn(&self, message: &str) {
        self.push(message.to_string());
    }
}
