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

use jiff::tz::TimeZone;
use serde::Serialize;

use crate::LogRecord;
use crate::layout::PlainLayout;

/// A JSON layout for formatting log records.
///
/// Output format:
///
/// ```json
/// {"timestamp":"2024-08-11T22:44:57.172051+08:00","level":"ERROR","name":"currency","message":"Failed to fetch exchange rate","exception":"connection reset"}
/// {"timestamp":"2024-08-11T22:44:57.172187+08:00","level":"INFO","name":"main","message":"Converted 100 USD to EUR"}
/// ```
///
/// If a record cannot be serialized, the plain text line is written instead, followed by a
/// `[JsonLayout serialization error: ...]` marker.
///
/// # Examples
///
/// ```
/// use fxlog::layout::JsonLayout;
///
/// let json_layout = JsonLayout::default();
/// ```
#[derive(Default, Debug, Clone)]
pub struct JsonLayout {
    tz: Option<TimeZone>,
}

impl JsonLayout {
    /// Sets the timezone for timestamps.
    ///
    /// # Examples
    ///
    /// ```
    /// use jiff::tz::TimeZone;
    /// use fxlog::layout::JsonLayout;
    ///
    /// let json_layout = JsonLayout::default().timezone(TimeZone::UTC);
    /// ```
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.tz = Some(tz);
        self
    }

    fn time_zone(&self) -> TimeZone {
        self.tz.clone().unwrap_or_else(TimeZone::system)
    }

    pub(crate) fn format(&self, record: &LogRecord) -> String {
        let tz = self.time_zone();
        let timestamp = record.timestamp();
        let record_line = RecordLine {
            timestamp: timestamp.display_with_offset(tz.to_offset(timestamp)).to_string(),
            level: record.level().as_str(),
            name: record.name(),
            message: record.message(),
            exception: record.exception(),
        };
        encode_or_fallback(&record_line, || {
            PlainLayout::default().timezone(tz.clone()).format(record)
        })
    }
}

/// One document per record; `timestamp` is RFC 3339 in the offset of the configured zone.
#[derive(Debug, Clone, Serialize)]
struct RecordLine<'a> {
    timestamp: String,
    level: &'a str,
    name: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    exception: Option<&'a str>,
}

fn encode_or_fallback<T: Serialize>(value: &T, plain: impl FnOnce() -> String) -> String {
    match serde_json::to_string(value) {
        Ok(json) => json,
        Err(err) => format!("{} [JsonLayout serialization error: {err}]", plain()),
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use serde_json::Value;

    use super::*;
    use crate::Level;

    #[test]
    fn test_round_trip_fields() {
        let ts: Timestamp = "2024-08-11T14:44:57.172051Z".parse().unwrap();
        let record = LogRecord::at(ts, Level::Warning, "currency", "Slow \"rate\" API");
        let layout = JsonLayout::default().timezone(TimeZone::fixed(jiff::tz::offset(8)));

        let line = layout.format(&record);
        assert!(!line.contains('\n'));

        let doc: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(doc["level"], "WARNING");
        assert_eq!(doc["name"], "currency");
        assert_eq!(doc["message"], "Slow \"rate\" API");
        assert!(doc.get("exception").is_none());

        let timestamp = doc["timestamp"].as_str().unwrap();
        assert_eq!(timestamp, "2024-08-11T22:44:57.172051+08:00");
        assert_eq!(timestamp.parse::<Timestamp>().unwrap(), ts);
    }

    #[test]
    fn test_exception_field() {
        let record = LogRecord::new(Level::Error, "main", "Lookup failed")
            .with_exception_text("connection reset");
        let doc: Value = serde_json::from_str(&JsonLayout::default().format(&record)).unwrap();
        assert_eq!(doc["exception"], "connection reset");
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S>(&self, _: S) -> Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            Err(serde::ser::Error::custom("exception payload is not serializable"))
        }
    }

    #[test]
    fn test_serialization_failure_falls_back_to_plain() {
        let line = encode_or_fallback(&Unserializable, || "plain line".to_string());
        assert_eq!(
            line,
            "plain line [JsonLayout serialization error: exception payload is not serializable]"
        );
    }
}
