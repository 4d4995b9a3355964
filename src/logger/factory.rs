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

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::OnceLock;

use crate::Level;
use crate::append::Append;
use crate::append::Console;
use crate::append::ConsoleTarget;
use crate::append::RollingFile;
use crate::append::Webhook;
use crate::append::webhook::AlertUnavailable;
use crate::append::webhook::Transport;
use crate::config::Settings;
use crate::layout::ColorSupport;
use crate::layout::JsonLayout;
use crate::layout::Layout;
use crate::layout::PlainLayout;
use crate::logger::Logger;
use crate::logger::named::Attachment;
use crate::trap::DefaultTrap;
use crate::trap::Trap;

/// The name of the root logger.
pub const ROOT_LOGGER_NAME: &str = "root";

/// Options of [`LoggerFactory::get_logger_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggerOptions {
    /// Attach the webhook alert sink, if it is available. Off by default.
    pub alert: bool,
    /// Format every sink's output as JSON.
    pub structured: bool,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            alert: false,
            structured: false,
        }
    }
}

/// Options of [`LoggerFactory::basic_config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootOptions {
    /// Minimum level of the root logger; `None` keeps the configured global level.
    pub level: Option<Level>,
    /// Attach the webhook alert sink, if it is available.
    pub alert: bool,
    /// Format every sink's output as JSON.
    pub structured: bool,
}

impl Default for RootOptions {
    fn default() -> Self {
        Self {
            level: None,
            alert: true,
            structured: false,
        }
    }
}

/// A builder to configure and create a [`LoggerFactory`].
#[derive(Debug)]
pub struct LoggerFactoryBuilder {
    settings: Settings,
    trap: Arc<dyn Trap>,
    console: Option<Console>,
    transport: Option<Arc<dyn Transport>>,
}

impl LoggerFactoryBuilder {
    /// Set the trap that receives every diagnostic of the logging subsystem.
    ///
    /// Default to [`DefaultTrap`].
    #[must_use]
    pub fn trap(mut self, trap: impl Trap) -> Self {
        self.trap = Arc::new(trap);
        self
    }

    /// Replace the console sink.
    ///
    /// Default to standard error at the global level. The sink's own threshold is kept.
    #[must_use]
    pub fn console(mut self, console: Console) -> Self {
        self.console = Some(console);
        self
    }

    /// Deliver webhook alerts through `transport` instead of HTTP.
    #[must_use]
    pub fn transport(mut self, transport: impl Transport) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Build the [`LoggerFactory`].
    ///
    /// Color support of the console is checked here, once.
    pub fn build(self) -> LoggerFactory {
        let LoggerFactoryBuilder {
            settings,
            trap,
            console,
            transport,
        } = self;

        let console = console.unwrap_or_else(|| Console::new(ConsoleTarget::Stderr, settings.level));
        let support = ColorSupport::from_env(console.is_terminal());
        let console_layout = Layout::detect_color(support, trap.as_ref());

        LoggerFactory {
            settings,
            trap,
            console: Arc::new(console),
            console_layout,
            file: OnceLock::new(),
            alert: OnceLock::new(),
            transport,
            registry: Mutex::new(HashMap::new()),
            root: OnceLock::new(),
        }
    }
}

/// Composes layouts and sinks into named loggers.
///
/// Every logger of one factory shares the same console, file and alert sinks, each built at
/// most once.
///
/// # Examples
///
/// ```
/// use fxlog::config::Settings;
/// use fxlog::logger::LoggerFactory;
///
/// let dir = tempfile::tempdir().unwrap();
/// let settings = Settings {
///     log_file: dir.path().join("converter.log"),
///     ..Settings::default()
/// };
/// let factory = LoggerFactory::new(settings);
///
/// let logger = factory.get_logger("currency");
/// logger.info("Converted 100 USD to EUR");
/// assert!(std::sync::Arc::ptr_eq(&logger, &factory.get_logger("currency")));
/// ```
#[derive(Debug)]
pub struct LoggerFactory {
    settings: Settings,
    trap: Arc<dyn Trap>,
    console: Arc<dyn Append>,
    console_layout: Layout,
    file: OnceLock<Arc<dyn Append>>,
    alert: OnceLock<Result<Arc<dyn Append>, AlertUnavailable>>,
    transport: Option<Arc<dyn Transport>>,
    registry: Mutex<HashMap<String, Arc<Logger>>>,
    root: OnceLock<Arc<Logger>>,
}

impl LoggerFactory {
    /// Create a factory with the default trap, console and transport.
    pub fn new(settings: Settings) -> Self {
        Self::builder(settings).build()
    }

    /// Create a builder for a factory over `settings`.
    pub fn builder(settings: Settings) -> LoggerFactoryBuilder {
        LoggerFactoryBuilder {
            settings,
            trap: Arc::new(DefaultTrap::default()),
            console: None,
            transport: None,
        }
    }

    /// The settings every logger of this factory is built from.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get the configured logger for `name` with [`LoggerOptions::default`].
    pub fn get_logger(&self, name: &str) -> Arc<Logger> {
        self.get_logger_with(name, LoggerOptions::default())
    }

    /// Get the configured logger for `name`.
    ///
    /// A logger that already has sinks is returned unchanged, whatever `options` say, so
    /// repeated calls never duplicate sinks. Otherwise the console and file sinks are attached,
    /// plus the alert sink when requested and available, and propagation is turned off.
    ///
    /// [`ROOT_LOGGER_NAME`] always resolves to [`LoggerFactory::root`].
    pub fn get_logger_with(&self, name: &str, options: LoggerOptions) -> Arc<Logger> {
        if name == ROOT_LOGGER_NAME {
            return self.root();
        }

        let mut registry = self.registry();
        if let Some(logger) = registry.get(name) {
            if logger.is_configured() {
                return logger.clone();
            }
        }

        let logger = registry
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Logger::new(name, None, self.trap.clone())))
            .clone();
        let attachments = self.attachments(name, options.alert, options.structured);
        logger.configure(self.settings.level, attachments, false);
        logger
    }

    /// Look up the logger for `name` without configuring it.
    ///
    /// A logger created here has no sinks of its own and hands its records to the root logger.
    pub fn logger(&self, name: &str) -> Arc<Logger> {
        if name == ROOT_LOGGER_NAME {
            return self.root();
        }
        let root = self.root();
        self.registry()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Logger::new(name, Some(root), self.trap.clone())))
            .clone()
    }

    /// The root logger, configured on first use.
    pub fn root(&self) -> Arc<Logger> {
        let mut created = false;
        let root = self.root.get_or_init(|| {
            created = true;
            let root = Logger::new(ROOT_LOGGER_NAME, None, self.trap.clone());
            let attachments = self.attachments(ROOT_LOGGER_NAME, true, false);
            root.configure(self.settings.level, attachments, false);
            Arc::new(root)
        });
        if created {
            root.info(format!(
                "Logger initialized at level {} with rotation strategy {}",
                self.settings.level, self.settings.rotation_strategy
            ));
        }
        root.clone()
    }

    /// Whether the root logger would emit a record at `level`.
    ///
    /// Before the root logger exists this answers from the settings, without building it.
    pub fn enabled(&self, level: Level) -> bool {
        match self.root.get() {
            Some(root) => root.enabled(level),
            None => level >= self.settings.level,
        }
    }

    /// Replace the sinks of the root logger.
    ///
    /// The previous sink set is swapped out in one step, so repeated calls never accumulate
    /// sinks and concurrent records see either the old or the new set.
    pub fn basic_config(&self, options: RootOptions) {
        let root = self.root();
        let attachments = self.attachments(ROOT_LOGGER_NAME, options.alert, options.structured);
        let level = options.level.unwrap_or(self.settings.level);
        root.configure(level, attachments, false);
    }

    /// Flush the sinks of the root logger and of every registered logger.
    pub fn flush(&self) {
        if let Some(root) = self.root.get() {
            root.flush();
        }
        let loggers: Vec<_> = self.registry().values().cloned().collect();
        for logger in loggers {
            logger.flush();
        }
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<String, Arc<Logger>>> {
        self.registry.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn attachments(&self, name: &str, alert: bool, structured: bool) -> Vec<Attachment> {
        let (console_layout, sink_layout) = if structured {
            let json = Layout::from(JsonLayout::default());
            (json.clone(), json)
        } else {
            (
                self.console_layout.clone(),
                Layout::from(PlainLayout::default()),
            )
        };

        let mut attachments = vec![
            Attachment::new(console_layout, self.console.clone()),
            Attachment::new(sink_layout.clone(), self.file()),
        ];
        if alert {
            match self.alert() {
                Ok(webhook) => attachments.push(Attachment::new(sink_layout, webhook)),
                Err(reason) => self.trap.warn(&format!(
                    "webhook alerts disabled for logger '{name}': {reason}"
                )),
            }
        }
        attachments
    }

    fn file(&self) -> Arc<dyn Append> {
        self.file
            .get_or_init(|| {
                let file = RollingFile::builder(&self.settings.log_file)
                    .rotation(self.settings.rotation())
                    .backup_count(self.settings.backup_count)
                    .level(self.settings.level)
                    .trap(self.trap.clone())
                    .build();
                Arc::new(file)
            })
            .clone()
    }

    fn alert(&self) -> Result<Arc<dyn Append>, AlertUnavailable> {
        self.alert
            .get_or_init(|| {
                let webhook = match &self.transport {
                    Some(transport) => Webhook::from_settings_with(&self.settings, transport.clone()),
                    None => Webhook::from_settings(&self.settings),
                };
                webhook.map(|webhook| Arc::new(webhook) as Arc<dyn Append>)
            })
            .clone()
    }
}
