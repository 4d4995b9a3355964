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

use std::fmt;

use jiff::RoundMode;
use jiff::Span;
use jiff::Unit;
use jiff::Zoned;
use jiff::ZonedRound;

use crate::config::TimeBoundary;

/// Defines when the active log file rolls over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    /// Roll over before a write that would make the file reach `max_bytes`.
    Size { max_bytes: u64 },
    /// Roll over once the clock passes the next time boundary.
    Time { boundary: TimeBoundary },
}

impl Rotation {
    /// A write of `incoming` bytes triggers a rollover unless the file is still empty, so a
    /// single oversized line is written in place instead of rolling forever.
    pub(crate) fn should_rollover_on_size(&self, current: u64, incoming: u64) -> bool {
        match self {
            Rotation::Size { max_bytes } => {
                current > 0 && current.saturating_add(incoming) >= *max_bytes
            }
            Rotation::Time { .. } => false,
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rotation::Size { max_bytes } => write!(f, "SIZE ({max_bytes} bytes)"),
            Rotation::Time { boundary } => write!(f, "TIME ({boundary})"),
        }
    }
}

// zero-padded templates line up with the strftime formats below
const SUFFIX_TEMPLATE: &str = "0000-00-00_00-00-00";

impl TimeBoundary {
    /// The first instant after `start` at which the file rolls over.
    pub(crate) fn next_rollover(&self, start: &Zoned) -> Result<Zoned, jiff::Error> {
        match *self {
            TimeBoundary::Second => {
                truncate(start, Unit::Second)?.checked_add(Span::new().seconds(1))
            }
            TimeBoundary::Minute => {
                truncate(start, Unit::Minute)?.checked_add(Span::new().minutes(1))
            }
            TimeBoundary::Hour => truncate(start, Unit::Hour)?.checked_add(Span::new().hours(1)),
            TimeBoundary::Day => start.checked_add(Span::new().days(1)),
            TimeBoundary::Midnight => start.start_of_day()?.checked_add(Span::new().days(1)),
            TimeBoundary::Weekday(day) => {
                let today = i64::from(start.weekday().to_monday_zero_offset());
                let mut ahead = (i64::from(day) - today).rem_euclid(7);
                if ahead == 0 {
                    ahead = 7;
                }
                start.start_of_day()?.checked_add(Span::new().days(ahead))
            }
        }
    }

    /// The strftime format of the suffix appended to backups of a period.
    pub(crate) fn suffix_format(&self) -> &'static str {
        match self {
            TimeBoundary::Second => "%Y-%m-%d_%H-%M-%S",
            TimeBoundary::Minute => "%Y-%m-%d_%H-%M",
            TimeBoundary::Hour => "%Y-%m-%d_%H",
            TimeBoundary::Day | TimeBoundary::Midnight | TimeBoundary::Weekday(_) => "%Y-%m-%d",
        }
    }

    /// Whether `suffix` looks like one this boundary produces.
    pub(crate) fn is_backup_suffix(&self, suffix: &str) -> bool {
        let len = match self {
            TimeBoundary::Second => 19,
            TimeBoundary::Minute => 16,
            TimeBoundary::Hour => 13,
            TimeBoundary::Day | TimeBoundary::Midnight | TimeBoundary::Weekday(_) => 10,
        };
        suffix.len() == len
            && suffix
                .bytes()
                .zip(SUFFIX_TEMPLATE.bytes())
                .all(|(c, t)| if t == b'0' { c.is_ascii_digit() } else { c == t })
    }
}

fn truncate(zoned: &Zoned, unit: Unit) -> Result<Zoned, jiff::Error> {
    zoned.round(ZonedRound::new().smallest(unit).mode(RoundMode::Trunc))
}
