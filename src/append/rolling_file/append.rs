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

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use jiff::tz::TimeZone;

use crate::Error;
use crate::Level;
use crate::append::Append;
use crate::append::AppendKind;
use crate::append::rolling_file::Rotation;
use crate::append::rolling_file::clock::Clock;
use crate::append::rolling_file::rolling::RollingWriter;
use crate::trap::DefaultTrap;
use crate::trap::Trap;

const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024;
const DEFAULT_BACKUP_COUNT: usize = 5;

/// A builder to configure and create a [`RollingFile`] sink.
#[derive(Debug)]
pub struct RollingFileBuilder {
    // required
    path: PathBuf,

    // has default
    rotation: Rotation,
    backup_count: usize,
    level: Level,
    tz: TimeZone,
    clock: Clock,
    trap: Arc<dyn Trap>,
}

impl RollingFileBuilder {
    /// Create a new rolling file builder for the active log file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            rotation: Rotation::Size {
                max_bytes: DEFAULT_MAX_BYTES,
            },
            backup_count: DEFAULT_BACKUP_COUNT,
            level: Level::Debug,
            tz: TimeZone::system(),
            clock: Clock::default(),
            trap: Arc::new(DefaultTrap::default()),
        }
    }

    /// Set the rotation policy.
    ///
    /// Default to rolling over at 5 MiB.
    #[must_use]
    pub fn rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set the number of backups to keep.
    ///
    /// With zero backups the active file starts over on every rollover.
    #[must_use]
    pub fn backup_count(mut self, n: usize) -> Self {
        self.backup_count = n;
        self
    }

    /// Set the minimum level a record must have to be written.
    #[must_use]
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set the time zone that time boundaries and backup suffixes are computed in.
    ///
    /// Default to the system time zone.
    #[must_use]
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.tz = tz;
        self
    }

    /// Set the trap that receives open and rotation failures.
    ///
    /// Default to [`DefaultTrap`].
    #[must_use]
    pub fn trap(mut self, trap: Arc<dyn Trap>) -> Self {
        self.trap = trap;
        self
    }

    #[cfg(test)]
    fn clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Build the [`RollingFile`] sink.
    ///
    /// This never fails. If the log directory or the file cannot be opened, the failure is
    /// reported through the trap and the returned sink discards every line.
    pub fn build(self) -> RollingFile {
        let Self {
            path,
            rotation,
            backup_count,
            level,
            tz,
            clock,
            trap,
        } = self;

        let writer = match RollingWriter::open(path.clone(), rotation, backup_count, tz, clock) {
            Ok(writer) => Some(writer),
            Err(err) => {
                trap.trap(&disabled(err, &path));
                None
            }
        };

        RollingFile {
            path,
            level,
            writer: Mutex::new(writer),
            trap,
        }
    }
}

fn disabled(err: Error, path: &Path) -> Error {
    Error::new("log file sink disabled")
        .with_context("path", path.display())
        .with_source(err)
}

/// A sink that appends log lines to a file and rolls it over by size or by time.
///
/// Rollover check and append run under one lock, so concurrent writers never interleave
/// partial lines.
#[derive(Debug)]
pub struct RollingFile {
    path: PathBuf,
    level: Level,
    // `None` once the sink is disabled
    writer: Mutex<Option<RollingWriter>>,
    trap: Arc<dyn Trap>,
}

impl RollingFile {
    /// Create a builder for the active log file at `path`.
    pub fn builder(path: impl Into<PathBuf>) -> RollingFileBuilder {
        RollingFileBuilder::new(path)
    }

    /// The path of the active log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a previous failure turned this sink into a no-op.
    pub fn is_disabled(&self) -> bool {
        self.writer().is_none()
    }

    fn writer(&self) -> MutexGuard<'_, Option<RollingWriter>> {
        self.writer.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Append for RollingFile {
    fn accepts(&self, level: Level) -> bool {
        level >= self.level
    }

    fn write(&self, line: &str) -> Result<(), Error> {
        let mut guard = self.writer();
        let Some(writer) = guard.as_mut() else {
            return Ok(());
        };

        if let Err(err) = writer.rollover_if_needed(line.len() as u64 + 1) {
            self.trap.trap(&disabled(err, &self.path));
            *guard = None;
            return Ok(());
        }

        writer.append(line).map_err(|err| {
            Error::new("failed to write log file")
                .with_context("path", self.path.display())
                .with_source(err)
        })
    }

    fn flush(&self) -> Result<(), Error> {
        match self.writer().as_mut() {
            Some(writer) => writer.flush().map_err(Error::from_io_error),
            None => Ok(()),
        }
    }

    fn kind(&self) -> AppendKind {
        AppendKind::RollingFile
    }
}

impl Drop for RollingFile {
    fn drop(&mut self) {
        let writer = self.writer.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Some(writer) = writer.as_mut() {
            if let Err(err) = writer.flush() {
                let err = Error::new("failed to flush log file on drop").with_source(err);
                self.trap.trap(&err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cmp::min;
    use std::fs;
    use std::thread;

    use jiff::Span;
    use jiff::Timestamp;
    use rand::Rng;
    use rand::distr::Alphanumeric;
    use tempfile::TempDir;

    use super::*;
    use crate::config::TimeBoundary;
    use crate::trap::CollectingTrap;

    fn file_count(dir: &TempDir) -> usize {
        fs::read_dir(dir.path()).unwrap().count()
    }

    fn lines_in(dir: &TempDir) -> Vec<String> {
        let mut lines = vec![];
        for entry in fs::read_dir(dir.path()).unwrap() {
            let text = fs::read_to_string(entry.unwrap().path()).unwrap();
            lines.extend(text.lines().map(str::to_string));
        }
        lines
    }

    fn generate_random_string() -> String {
        let mut rng = rand::rng();
        let len = rng.random_range(50..=100);
        std::iter::repeat(())
            .map(|()| rng.sample(Alphanumeric))
            .map(char::from)
            .take(len)
            .collect()
    }

    #[test]
    fn test_one_byte_threshold_rotates_once() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("converter.log");
        let file = RollingFile::builder(&path)
            .rotation(Rotation::Size { max_bytes: 1 })
            .build();

        file.write("first record").unwrap();
        file.write("second record").unwrap();
        file.flush().unwrap();

        assert_eq!(file_count(&temp_dir), 2);
        assert_eq!(fs::read_to_string(&path).unwrap(), "second record\n");
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("converter.log.1")).unwrap(),
            "first record\n"
        );
    }

    #[test]
    fn test_no_rotation_below_threshold() {
        let temp_dir = TempDir::new().unwrap();
        let file = RollingFile::builder(temp_dir.path().join("converter.log"))
            .rotation(Rotation::Size { max_bytes: 10_000 })
            .build();

        let mut written = 0;
        while written + 200 < 10_000 {
            let line = generate_random_string();
            written += line.len() + 1;
            file.write(&line).unwrap();
        }
        assert_eq!(file_count(&temp_dir), 1);
    }

    #[test]
    fn test_retention_bounded_by_backup_count() {
        for backup_count in [1, 3, 5] {
            let temp_dir = TempDir::new().unwrap();
            let path = temp_dir.path().join("converter.log");
            let file = RollingFile::builder(&path)
                .rotation(Rotation::Size { max_bytes: 500 })
                .backup_count(backup_count)
                .build();

            for rotations in 1..=(backup_count * 3) {
                let mut size = 0;
                while size < 500 {
                    let line = generate_random_string();
                    size += line.len() + 1;
                    file.write(&line).unwrap();
                }
                file.flush().unwrap();
                assert!(file_count(&temp_dir) <= backup_count + 1);
                assert_eq!(file_count(&temp_dir), min(rotations, backup_count) + 1);
            }
            assert!(path.exists());
            assert!(!temp_dir.path().join(format!("converter.log.{}", backup_count + 1)).exists());
        }
    }

    #[test]
    fn test_zero_backups_truncates() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("converter.log");
        let file = RollingFile::builder(&path)
            .rotation(Rotation::Size { max_bytes: 20 })
            .backup_count(0)
            .build();

        file.write("0123456789").unwrap();
        file.write("abcdefghij").unwrap();
        assert_eq!(file_count(&temp_dir), 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "abcdefghij\n");
    }

    #[test]
    fn test_existing_file_size_counts() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("converter.log");
        fs::write(&path, "x".repeat(90)).unwrap();

        let file = RollingFile::builder(&path)
            .rotation(Rotation::Size { max_bytes: 100 })
            .build();
        file.write("0123456789").unwrap();
        assert_eq!(file_count(&temp_dir), 2);
    }

    #[test]
    fn test_time_rotation() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("converter.log");
        let start: Timestamp = "2024-08-10T00:00:00Z".parse().unwrap();
        let file = RollingFile::builder(&path)
            .rotation(Rotation::Time {
                boundary: TimeBoundary::Hour,
            })
            .backup_count(3)
            .timezone(TimeZone::UTC)
            .clock(Clock::pinned(start))
            .build();

        let mut now = start;
        for hour in 1..=6 {
            for _ in 0..4 {
                set_now(&file, now);
                file.write(&generate_random_string()).unwrap();
                now = now.checked_add(Span::new().minutes(15)).unwrap();
            }
            assert_eq!(file_count(&temp_dir), min(hour, 4));
        }

        let backups: Vec<_> = (2..5)
            .map(|h| temp_dir.path().join(format!("converter.log.2024-08-10_0{h}")))
            .collect();
        for backup in &backups {
            assert!(backup.exists(), "{}", backup.display());
        }
        assert!(!temp_dir.path().join("converter.log.2024-08-10_01").exists());
    }

    #[test]
    fn test_time_rotation_skips_idle_periods() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("converter.log");
        let start: Timestamp = "2024-08-10T22:00:00Z".parse().unwrap();
        let file = RollingFile::builder(&path)
            .rotation(Rotation::Time {
                boundary: TimeBoundary::Midnight,
            })
            .timezone(TimeZone::UTC)
            .clock(Clock::pinned(start))
            .build();

        file.write("saturday").unwrap();
        set_now(&file, "2024-08-13T09:00:00Z".parse().unwrap());
        file.write("tuesday").unwrap();
        set_now(&file, "2024-08-13T23:00:00Z".parse().unwrap());
        file.write("tuesday night").unwrap();

        assert_eq!(file_count(&temp_dir), 2);
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("converter.log.2024-08-10")).unwrap(),
            "saturday\n"
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), "tuesday\ntuesday night\n");
    }

    fn set_now(file: &RollingFile, now: Timestamp) {
        file.writer().as_mut().unwrap().clock.set_now(now);
    }

    #[test]
    fn test_concurrent_writers_never_interleave() {
        let temp_dir = TempDir::new().unwrap();
        let file = Arc::new(
            RollingFile::builder(temp_dir.path().join("converter.log"))
                .rotation(Rotation::Size { max_bytes: 4096 })
                .backup_count(1000)
                .build(),
        );

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let file = file.clone();
                thread::spawn(move || {
                    for i in 0..200 {
                        file.write(&format!("thread-{t} record-{i:04} {}", "x".repeat(40)))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        file.flush().unwrap();

        let lines = lines_in(&temp_dir);
        assert_eq!(lines.len(), 8 * 200);
        for line in &lines {
            assert!(line.starts_with("thread-"), "{line}");
            assert!(line.ends_with(&"x".repeat(40)), "{line}");
        }
        assert!(file_count(&temp_dir) > 1);
    }

    #[test]
    fn test_unopenable_path_disables_sink() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();

        let trap = Arc::new(CollectingTrap::default());
        let file = RollingFile::builder(blocker.join("converter.log"))
            .trap(trap.clone())
            .build();

        assert!(file.is_disabled());
        assert!(file.write("dropped").is_ok());
        assert!(file.write("dropped again").is_ok());
        assert_eq!(trap.messages().len(), 1);
        assert!(trap.contains("log file sink disabled"));
    }

    #[test]
    fn test_directory_is_created() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("logs").join("nested").join("converter.log");
        let file = RollingFile::builder(&path).build();
        file.write("hello").unwrap();
        assert!(!file.is_disabled());
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
    }
}
