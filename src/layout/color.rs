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

use colored::Color;
use colored::ColoredString;
use colored::Colorize;
use jiff::tz::TimeZone;

use crate::Level;
use crate::LogRecord;
use crate::layout::PlainLayout;

/// A layout that formats log record as plain text wrapped in a color keyed by level.
///
/// The content is identical to [`PlainLayout`]; the whole line takes the level's color.
///
/// Build it through [`Layout::detect_color`](crate::layout::Layout::detect_color) so that
/// consoles without color support get plain text instead.
///
/// # Examples
///
/// ```
/// use colored::Color;
/// use fxlog::layout::ColorLayout;
///
/// let layout = ColorLayout::default().debug_color(Color::Blue);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ColorLayout {
    plain: PlainLayout,
    colors: LevelColor,
}

impl ColorLayout {
    /// Set the timezone for timestamps.
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.plain = self.plain.timezone(tz);
        self
    }

    /// Customize the color of the debug log level. Default to cyan.
    pub fn debug_color(mut self, color: Color) -> Self {
        self.colors.debug = color;
        self
    }

    /// Customize the color of the info log level. Default to green.
    pub fn info_color(mut self, color: Color) -> Self {
        self.colors.info = color;
        self
    }

    /// Customize the color of the warning log level. Default to yellow.
    pub fn warning_color(mut self, color: Color) -> Self {
        self.colors.warning = color;
        self
    }

    /// Customize the color of the error log level. Default to red.
    pub fn error_color(mut self, color: Color) -> Self {
        self.colors.error = color;
        self
    }

    /// Customize the color of the critical log level. Default to bold red.
    pub fn critical_color(mut self, color: Color) -> Self {
        self.colors.critical = color;
        self
    }

    pub(crate) fn format(&self, record: &LogRecord) -> String {
        let line = self.plain.format(record);
        self.colors.colorize(record.level(), line).to_string()
    }
}

/// Colors for different log levels.
#[derive(Debug, Clone)]
pub struct LevelColor {
    /// Color for debug level logs.
    pub debug: Color,
    /// Color for info level logs.
    pub info: Color,
    /// Color for warning level logs.
    pub warning: Color,
    /// Color for error level logs.
    pub error: Color,
    /// Color for critical level logs, always rendered bold.
    pub critical: Color,
}

impl Default for LevelColor {
    fn default() -> Self {
        Self {
            debug: Color::Cyan,
            info: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            critical: Color::Red,
        }
    }
}

impl LevelColor {
    /// Colorize a line for the given level.
    pub fn colorize(&self, level: Level, line: String) -> ColoredString {
        let line = ColoredString::from(line);
        match level {
            Level::Debug => line.color(self.debug),
            Level::Info => line.color(self.info),
            Level::Warning => line.color(self.warning),
            Level::Error => line.color(self.error),
            Level::Critical => line.color(self.critical).bold(),
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;

    use super::*;

    #[test]
    fn test_colored_line_keeps_plain_content() {
        colored::control::set_override(true);

        let ts: Timestamp = "2024-08-11T14:44:57.172Z".parse().unwrap();
        let layout = ColorLayout::default().timezone(TimeZone::UTC);
        for level in Level::ALL {
            let record = LogRecord::at(ts, level, "main", "Converted 100 USD");
            let line = layout.format(&record);
            let plain = PlainLayout::default().timezone(TimeZone::UTC).format(&record);
            assert!(line.starts_with("\x1b["), "{line:?}");
            assert!(line.ends_with("\x1b[0m"), "{line:?}");
            assert!(line.contains(&plain), "{line:?}");
        }
    }

    #[test]
    fn test_critical_is_bold() {
        colored::control::set_override(true);

        let colors = LevelColor::default();
        let critical = colors.colorize(Level::Critical, "x".to_string()).to_string();
        let error = colors.colorize(Level::Error, "x".to_string()).to_string();
        assert_eq!(error, "\x1b[31mx\x1b[0m");
        assert_eq!(critical, "\x1b[1;31mx\x1b[0m");
    }
}
