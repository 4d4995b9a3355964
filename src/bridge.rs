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

//! Forward records of the `log` crate facade to the process-wide root logger.

use crate::Level;
use crate::LogRecord;
use crate::global;

struct LogCrateLogger(());

impl log::Log for LogCrateLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        let Ok(factory) = global::installed() else {
            return false;
        };

        factory.enabled(Level::from(metadata.level()))
    }

    fn log(&self, record: &log::Record) {
        if let Ok(factory) = global::installed() {
            let record = LogRecord::new(
                Level::from(record.level()),
                record.target(),
                record.args().to_string(),
            );
            factory.root().log_record(&record);
        }
    }

    fn flush(&self) {
        if let Ok(factory) = global::installed() {
            factory.flush();
        }
    }
}

/// Set up the log crate global logger.
///
/// This function calls [`log::set_logger`] to set up a `LogCrateLogger` and all logs from log
/// crate will be forwarded to the root logger of the factory installed with [`crate::init`].
/// The record target becomes the logger name.
///
/// Log events that occur before a factory is installed are ignored.
///
/// This function will set the global maximum log level to `Trace`. To override this, call
/// [`log::set_max_level`] after this function.
///
/// # Errors
///
/// Return an error if the log crate global logger has already been set.
///
/// # Examples
///
/// ```no_run
/// fxlog::bridge::try_setup_log_crate().unwrap();
/// fxlog::init_from_env().unwrap();
///
/// log::info!("Converted 100 USD to EUR");
/// ```
pub fn try_setup_log_crate() -> Result<(), log::SetLoggerError> {
    static LOGGER: LogCrateLogger = LogCrateLogger(());
    log::set_logger(&LOGGER)?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}

/// Set up the log crate global logger.
///
/// See [`try_setup_log_crate`] for details.
///
/// # Panics
///
/// Panic if the log crate global logger has already been set.
pub fn setup_log_crate() {
    try_setup_log_crate().expect(
        "fxlog::bridge::setup_log_crate must be called before the log crate global logger initialized",
    )
}
