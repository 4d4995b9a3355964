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

use std::fs;
use std::sync::Arc;

use fxlog::ConfigError;
use fxlog::Level;
use fxlog::append::Console;
use fxlog::config::Settings;
use fxlog::logger::LoggerFactory;
use fxlog::trap::CollectingTrap;
use tempfile::TempDir;

// process-wide state, so everything runs in one test
#[test]
fn test_global_factory_and_log_bridge() {
    let dir = TempDir::new().expect("failed to create a temporary directory");
    let log_file = dir.path().join("converter.log");

    assert!(matches!(
        fxlog::try_get_logger("currency"),
        Err(ConfigError::NotInitialized)
    ));

    let factory = LoggerFactory::builder(Settings {
        log_file: log_file.clone(),
        ..Settings::default()
    })
    .trap(Arc::new(CollectingTrap::default()))
    .console(Console::with_writer(std::io::sink(), Level::Info))
    .build();
    fxlog::install(factory).unwrap();

    assert!(matches!(
        fxlog::init(Settings::default()),
        Err(ConfigError::AlreadyInitialized)
    ));

    let logger = fxlog::try_get_logger("currency").unwrap();
    assert!(Arc::ptr_eq(&logger, &fxlog::get_logger("currency").unwrap()));
    logger.info("Converted 100 USD to EUR");

    fxlog::bridge::try_setup_log_crate().unwrap();
    assert!(log::log_enabled!(target: "rates", log::Level::Info));
    assert!(!log::log_enabled!(target: "rates", log::Level::Debug));
    // checking a level leaves the root logger unbuilt
    assert_eq!(fs::read_to_string(&log_file).unwrap().lines().count(), 1);

    log::info!(target: "rates", "Fetched 160 rates");
    log::debug!(target: "rates", "below the global level");
    fxlog::installed().unwrap().flush();

    let text = fs::read_to_string(&log_file).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 3, "{lines:?}");
    assert!(lines[0].ends_with("| currency | Converted 100 USD to EUR"));
    assert!(lines[1].ends_with("| root | Logger initialized at level INFO with rotation strategy SIZE"));
    assert!(lines[2].ends_with("| INFO     | rates | Fetched 160 rates"));
}
