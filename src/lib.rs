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

//! Fxlog is the logging core of the currency converter: a console sink with optional colors, a
//! rotating log file, structured JSON output and webhook alerts for severe records.
//!
//! # Overview
//!
//! Settings are resolved once from the environment (and an optional `.env` file) by
//! [`config::resolve`]. A [`LoggerFactory`] turns those settings into named loggers, each with
//! its own set of sinks, plus a lazily configured root logger. Failures inside sinks never reach
//! the caller of a log operation; they are handed to a [`Trap`](trap::Trap).
//!
//! # Examples
//!
//! Explicit settings and a factory owned by the application:
//!
//! ```
//! use fxlog::config::Settings;
//! use fxlog::logger::LoggerFactory;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let factory = LoggerFactory::new(Settings {
//!     log_file: dir.path().join("converter.log"),
//!     ..Settings::default()
//! });
//!
//! let logger = factory.get_logger("currency");
//! logger.info("Converted 100 USD to EUR");
//! logger.error("Failed to fetch exchange rate");
//! ```
//!
//! Process-wide setup, with the `log` crate facade forwarded to the root logger:
//!
//! ```no_run
//! fxlog::init_from_env().unwrap();
//! fxlog::bridge::setup_log_crate();
//!
//! log::warn!("Slow response from rate API");
//! fxlog::get_logger("main").unwrap().info("Application started");
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod append;
pub mod bridge;
pub mod config;
pub mod layout;
pub mod logger;
pub mod trap;

mod error;
mod global;
mod record;

pub use self::error::ConfigError;
pub use self::error::Error;
pub use self::global::get_logger;
pub use self::global::init;
pub use self::global::init_from_env;
pub use self::global::install;
pub use self::global::installed;
pub use self::global::try_get_logger;
pub use self::logger::Logger;
pub use self::logger::LoggerFactory;
pub use self::record::Level;
pub use self::record::LogRecord;
pub use self::record::ParseLevelError;
