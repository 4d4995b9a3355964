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

use std::fmt::Write;

use jiff::tz::TimeZone;

use crate::LogRecord;
use crate::layout::format_timestamp;

/// A layout that formats log record as plain text.
///
/// Output format:
///
/// ```text
/// 2024-08-11 22:44:57,172 | ERROR    | currency | Failed to fetch exchange rate
/// 2024-08-11 22:44:57,172 | WARNING  | currency | Slow response from rate API
/// 2024-08-11 22:44:57,172 | INFO     | main | Converted 100 USD to EUR
/// 2024-08-11 22:44:57,172 | ERROR    | main | Lookup failed | connection reset
/// ```
///
/// The last segment is present only when the record carries exception detail.
///
/// # Examples
///
/// ```
/// use fxlog::layout::PlainLayout;
///
/// let layout = PlainLayout::default();
/// ```
#[derive(Debug, Clone)]
pub struct PlainLayout {
    tz: TimeZone,
}

impl Default for PlainLayout {
    fn default() -> Self {
        Self {
            tz: TimeZone::system(),
        }
    }
}

impl PlainLayout {
    /// Set the timezone for timestamps.
    ///
    /// Defaults to the system timezone if not set.
    ///
    /// # Examples
    ///
    /// ```
    /// use jiff::tz::TimeZone;
    /// use fxlog::layout::PlainLayout;
    ///
    /// let layout = PlainLayout::default().timezone(TimeZone::UTC);
    /// ```
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.tz = tz;
        self
    }

    pub(crate) fn format(&self, record: &LogRecord) -> String {
        let time = format_timestamp(record.timestamp(), &self.tz);
        let level = record.level();
        let name = record.name();
        let message = record.message();

        let mut text = String::with_capacity(time.len() + name.len() + message.len() + 16);
        // SAFETY: write to a string always succeeds
        write!(&mut text, "{time} | {level:<8} | {name} | {message}").unwrap();
        if let Some(exception) = record.exception() {
            write!(&mut text, " | {exception}").unwrap();
        }
        text
    }
}
