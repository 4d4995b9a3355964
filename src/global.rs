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

//! The process-wide logger factory.

use std::sync::Arc;
use std::sync::OnceLock;

use crate::ConfigError;
use crate::config;
use crate::config::Settings;
use crate::logger::Logger;
use crate::logger::LoggerFactory;

static FACTORY: OnceLock<LoggerFactory> = OnceLock::new();

/// Install a process-wide factory built from `settings`.
///
/// # Errors
///
/// Return [`ConfigError::AlreadyInitialized`] if a factory is already installed.
pub fn init(settings: Settings) -> Result<&'static LoggerFactory, ConfigError> {
    install(LoggerFactory::new(settings))
}

/// Install a process-wide factory built with a custom trap, console or transport.
///
/// # Errors
///
/// Return [`ConfigError::AlreadyInitialized`] if a factory is already installed.
pub fn install(factory: LoggerFactory) -> Result<&'static LoggerFactory, ConfigError> {
    FACTORY
        .set(factory)
        .map_err(|_| ConfigError::AlreadyInitialized)?;
    installed()
}

/// Resolve settings from the environment and install a process-wide factory.
///
/// # Errors
///
/// Return an error if `LOG_LEVEL` is invalid or a factory is already installed.
pub fn init_from_env() -> Result<&'static LoggerFactory, ConfigError> {
    init(config::resolve()?)
}

/// The installed factory.
///
/// # Errors
///
/// Return [`ConfigError::NotInitialized`] if no factory is installed yet.
pub fn installed() -> Result<&'static LoggerFactory, ConfigError> {
    FACTORY.get().ok_or(ConfigError::NotInitialized)
}

/// Get the configured logger for `name` from the process-wide factory.
///
/// The first call without an installed factory resolves one from the environment.
///
/// # Errors
///
/// Return [`ConfigError::InvalidLevel`] if that first resolution fails.
///
/// # Examples
///
/// ```no_run
/// let logger = fxlog::get_logger("currency").unwrap();
/// logger.info("Converted 100 USD to EUR");
/// ```
pub fn get_logger(name: &str) -> Result<Arc<Logger>, ConfigError> {
    if let Ok(factory) = installed() {
        return Ok(factory.get_logger(name));
    }
    let factory = LoggerFactory::new(config::resolve()?);
    // losing a concurrent race keeps the winner's factory
    let _ = FACTORY.set(factory);
    Ok(installed()?.get_logger(name))
}

/// Get the configured logger for `name`, without installing a factory.
///
/// # Errors
///
/// Return [`ConfigError::NotInitialized`] if no factory is installed yet.
pub fn try_get_logger(name: &str) -> Result<Arc<Logger>, ConfigError> {
    Ok(installed()?.get_logger(name))
}
