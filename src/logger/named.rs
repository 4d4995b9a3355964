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

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;

use crate::Level;
use crate::LogRecord;
use crate::append::Append;
use crate::append::AppendKind;
use crate::layout::Layout;
use crate::trap::Trap;

/// A sink together with the layout its lines are formatted with.
#[derive(Debug, Clone)]
pub(crate) struct Attachment {
    layout: Layout,
    sink: Arc<dyn Append>,
}

impl Attachment {
    pub(crate) fn new(layout: Layout, sink: Arc<dyn Append>) -> Self {
        Self { layout, sink }
    }
}

#[derive(Debug)]
struct State {
    // `None` defers to the parent
    level: Option<Level>,
    attachments: Arc<[Attachment]>,
    propagate: bool,
}

/// A named handle that formats records and hands them to its attached sinks.
///
/// Loggers are created by a [`LoggerFactory`](crate::logger::LoggerFactory) and shared as
/// `Arc<Logger>`. Every log operation swallows sink failures: they go to the factory's trap.
pub struct Logger {
    name: String,
    parent: Option<Arc<Logger>>,
    state: RwLock<State>,
    trap: Arc<dyn Trap>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        let kinds: Vec<_> = state.attachments.iter().map(|a| a.sink.kind()).collect();
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &state.level)
            .field("attachments", &kinds)
            .field("propagate", &state.propagate)
            .finish()
    }
}

impl Logger {
    /// An unconfigured logger: no sinks, no level of its own, records flow to `parent`.
    pub(crate) fn new(
        name: impl Into<String>,
        parent: Option<Arc<Logger>>,
        trap: Arc<dyn Trap>,
    ) -> Self {
        Self {
            name: name.into(),
            parent,
            state: RwLock::new(State {
                level: None,
                attachments: Arc::from(Vec::new()),
                propagate: true,
            }),
            trap,
        }
    }

    /// Replace level, sinks and propagation in one step.
    pub(crate) fn configure(&self, level: Level, attachments: Vec<Attachment>, propagate: bool) {
        let mut state = self.state_mut();
        state.level = Some(level);
        state.attachments = Arc::from(attachments);
        state.propagate = propagate;
    }

    fn state(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn state_mut(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// The logger name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The minimum level; an unconfigured logger inherits it from its parent.
    pub fn level(&self) -> Level {
        let own = self.state().level;
        match (own, &self.parent) {
            (Some(level), _) => level,
            (None, Some(parent)) => parent.level(),
            (None, None) => Level::Debug,
        }
    }

    /// Whether records are also handed to the parent's sinks.
    pub fn propagates(&self) -> bool {
        self.parent.is_some() && self.state().propagate
    }

    /// Whether any sink is attached.
    pub fn is_configured(&self) -> bool {
        !self.state().attachments.is_empty()
    }

    /// The kinds of the attached sinks, in dispatch order.
    pub fn attached_kinds(&self) -> Vec<AppendKind> {
        self.attachments().iter().map(|a| a.sink.kind()).collect()
    }

    fn attachments(&self) -> Arc<[Attachment]> {
        self.state().attachments.clone()
    }

    /// Whether a record at `level` would be emitted.
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.level()
    }

    /// Log `message` at `level`.
    pub fn log(&self, level: Level, message: impl Into<String>) {
        if self.enabled(level) {
            self.handle(&LogRecord::new(level, self.name.as_str(), message));
        }
    }

    /// Log a prebuilt record, applying this logger's level.
    pub fn log_record(&self, record: &LogRecord) {
        if self.enabled(record.level()) {
            self.handle(record);
        }
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(Level::Debug, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(Level::Info, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.log(Level::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(Level::Error, message);
    }

    pub fn critical(&self, message: impl Into<String>) {
        self.log(Level::Critical, message);
    }

    /// Log `message` at ERROR with `err` and its sources attached as exception detail.
    pub fn exception(&self, message: impl Into<String>, err: &(dyn StdError + 'static)) {
        if self.enabled(Level::Error) {
            let record = LogRecord::new(Level::Error, self.name.as_str(), message);
            self.handle(&record.with_exception(err));
        }
    }

    /// Flush every attached sink.
    pub fn flush(&self) {
        for attachment in self.attachments().iter() {
            if let Err(err) = attachment.sink.flush() {
                self.trap.trap(&err);
            }
        }
    }

    // the level gate only applies where the record originates
    fn handle(&self, record: &LogRecord) {
        let (attachments, propagate) = {
            let state = self.state();
            (state.attachments.clone(), state.propagate)
        };

        for attachment in attachments.iter() {
            if !attachment.sink.accepts(record.level()) {
                continue;
            }
            let line = attachment.layout.format(record);
            if let Err(err) = attachment.sink.write(&line) {
                let err = err.with_context("logger", &self.name);
                self.trap.trap(&err);
            }
        }

        if propagate {
            if let Some(parent) = &self.parent {
                parent.handle(record);
            }
        }
    }
}
