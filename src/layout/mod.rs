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

//! Layouts for formatting log records.

use jiff::Timestamp;
use jiff::tz::TimeZone;

#[cfg(feature = "colored")]
pub use self::color::ColorLayout;
#[cfg(feature = "colored")]
pub use self::color::LevelColor;
pub use self::json::JsonLayout;
pub use self::plain_text::PlainLayout;
use crate::LogRecord;
use crate::trap::Trap;

#[cfg(feature = "colored")]
mod color;
mod json;
mod plain_text;

/// Represents a layout for formatting log records.
///
/// Each variant turns a [`LogRecord`] into a single line of text, without the trailing newline.
#[derive(Debug, Clone)]
pub enum Layout {
    Plain(PlainLayout),
    #[cfg(feature = "colored")]
    Color(ColorLayout),
    Json(JsonLayout),
}

impl Layout {
    /// Format a record.
    pub fn format(&self, record: &LogRecord) -> String {
        match self {
            Layout::Plain(layout) => layout.format(record),
            #[cfg(feature = "colored")]
            Layout::Color(layout) => layout.format(record),
            Layout::Json(layout) => layout.format(record),
        }
    }

    /// Choose the console layout once, based on whether colors can be displayed.
    ///
    /// Return a [`Layout::Color`] when `support` allows it. Otherwise return a [`Layout::Plain`]
    /// and report the fallback through `trap`.
    pub fn detect_color(support: ColorSupport, trap: &dyn Trap) -> Layout {
        match support.unavailable_reason() {
            None => Layout::from(color_layout()),
            Some(reason) => {
                trap.warn(&format!(
                    "colored console output unavailable ({reason}), falling back to plain formatting"
                ));
                Layout::Plain(PlainLayout::default())
            }
        }
    }
}

#[cfg(feature = "colored")]
fn color_layout() -> ColorLayout {
    ColorLayout::default()
}

#[cfg(not(feature = "colored"))]
fn color_layout() -> PlainLayout {
    PlainLayout::default()
}

impl From<PlainLayout> for Layout {
    fn from(layout: PlainLayout) -> Self {
        Layout::Plain(layout)
    }
}

impl From<JsonLayout> for Layout {
    fn from(layout: JsonLayout) -> Self {
        Layout::Json(layout)
    }
}

#[cfg(feature = "colored")]
impl From<ColorLayout> for Layout {
    fn from(layout: ColorLayout) -> Self {
        Layout::Color(layout)
    }
}

/// The facts the color capability check is based on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorSupport {
    /// The console stream is attached to a terminal.
    pub terminal: bool,
    /// The `NO_COLOR` convention asks for plain output.
    pub no_color: bool,
}

impl ColorSupport {
    /// Inspect the environment for a console stream.
    pub fn from_env(terminal: bool) -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        Self { terminal, no_color }
    }

    /// Whether colored output can be produced.
    pub fn available(&self) -> bool {
        self.unavailable_reason().is_none()
    }

    fn unavailable_reason(&self) -> Option<&'static str> {
        if !cfg!(feature = "colored") {
            Some("built without the `colored` feature")
        } else if self.no_color {
            Some("NO_COLOR is set")
        } else if !self.terminal {
            Some("console is not a terminal")
        } else {
            None
        }
    }
}

/// `2024-08-11 22:44:57,172` in the given time zone.
fn format_timestamp(ts: Timestamp, tz: &TimeZone) -> String {
    let zoned = ts.to_zoned(tz.clone());
    format!(
        "{},{:03}",
        zoned.strftime("%Y-%m-%d %H:%M:%S"),
        zoned.millisecond()
    )
}
