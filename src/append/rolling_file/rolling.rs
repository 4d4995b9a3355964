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

use std::ffi::OsString;
use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use jiff::Timestamp;
use jiff::Zoned;
use jiff::tz::TimeZone;

use crate::Error;
use crate::append::rolling_file::Rotation;
use crate::append::rolling_file::clock::Clock;
use crate::config::TimeBoundary;

/// The open log file together with everything the rollover decision depends on.
#[derive(Debug)]
pub(crate) struct RollingWriter {
    path: PathBuf,
    rotation: Rotation,
    backup_count: usize,
    tz: TimeZone,
    pub(crate) clock: Clock,
    // `None` only between closing the old file and opening the new one
    file: Option<File>,
    current_size: u64,
    period_start: Zoned,
    next_rollover: Option<Timestamp>,
}

impl RollingWriter {
    pub(crate) fn open(
        path: PathBuf,
        rotation: Rotation,
        backup_count: usize,
        tz: TimeZone,
        clock: Clock,
    ) -> Result<Self, Error> {
        if path.file_name().is_none() {
            return Err(Error::new("log file path must name a file"));
        }
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .map_err(|err| Error::new("failed to create log directory").with_source(err))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|err| Error::new("failed to open log file").with_source(err))?;
        let metadata = file
            .metadata()
            .map_err(|err| Error::new("failed to read log file metadata").with_source(err))?;

        let now = clock.now().to_zoned(tz.clone());
        // an existing file continues the period it was last written in
        let period_start = match metadata.modified().map(Timestamp::try_from) {
            Ok(Ok(mtime)) if metadata.len() > 0 => mtime.to_zoned(tz.clone()),
            _ => now,
        };

        let mut writer = RollingWriter {
            path,
            rotation,
            backup_count,
            tz,
            clock,
            file: Some(file),
            current_size: metadata.len(),
            period_start,
            next_rollover: None,
        };
        writer.next_rollover = writer.compute_next_rollover()?;
        Ok(writer)
    }

    /// Roll the file over if writing `incoming` more bytes calls for it.
    pub(crate) fn rollover_if_needed(&mut self, incoming: u64) -> Result<(), Error> {
        match self.rotation {
            Rotation::Size { .. } => {
                if self.rotation.should_rollover_on_size(self.current_size, incoming) {
                    self.rotate_numbered()?;
                }
            }
            Rotation::Time { boundary } => {
                let now = self.clock.now();
                if self.next_rollover.is_some_and(|next| now >= next) {
                    self.rotate_timed(boundary, now)?;
                }
            }
        }
        Ok(())
    }

    pub(crate) fn append(&mut self, line: &str) -> io::Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::other("log file is not open"))?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
        self.current_size += line.len() as u64 + 1;
        Ok(())
    }

    pub(crate) fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }

    fn compute_next_rollover(&self) -> Result<Option<Timestamp>, Error> {
        match self.rotation {
            Rotation::Size { .. } => Ok(None),
            Rotation::Time { boundary } => {
                let next = boundary.next_rollover(&self.period_start).map_err(|err| {
                    Error::new("failed to compute next rollover time").with_source(err)
                })?;
                Ok(Some(next.timestamp()))
            }
        }
    }

    /// `<file>.1` is the newest backup, `<file>.N` the oldest.
    fn rotate_numbered(&mut self) -> Result<(), Error> {
        self.close();

        if self.backup_count > 0 {
            for i in (1..self.backup_count).rev() {
                let src = self.sibling(&i.to_string());
                if src.exists() {
                    let dst = self.sibling(&(i + 1).to_string());
                    replace(&src, &dst)?;
                }
            }
            replace(&self.path, &self.sibling("1"))?;
        }

        // without backups the active file starts over
        self.reopen()
    }

    fn rotate_timed(&mut self, boundary: TimeBoundary, now: Timestamp) -> Result<(), Error> {
        self.close();

        let suffix = self.period_start.strftime(boundary.suffix_format()).to_string();
        replace(&self.path, &self.sibling(&suffix))?;
        self.delete_oldest_backups(boundary)?;

        self.reopen()?;
        self.period_start = now.to_zoned(self.tz.clone());
        self.next_rollover = self.compute_next_rollover()?;
        Ok(())
    }

    fn delete_oldest_backups(&self, boundary: TimeBoundary) -> Result<(), Error> {
        let mut backups = self.list_timed_backups(boundary)?;
        if backups.len() <= self.backup_count {
            return Ok(());
        }

        // zero-padded suffixes sort chronologically
        backups.sort();
        let excess = backups.len() - self.backup_count;
        for filepath in backups.iter().take(excess) {
            fs::remove_file(filepath).map_err(|err| {
                Error::new(format!("failed to remove old log: {}", filepath.display()))
                    .with_source(err)
            })?;
        }
        Ok(())
    }

    fn list_timed_backups(&self, boundary: TimeBoundary) -> Result<Vec<PathBuf>, Error> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let Some(filename) = self.path.file_name().and_then(|name| name.to_str()) else {
            return Ok(vec![]);
        };
        let prefix = format!("{filename}.");

        let read_dir = fs::read_dir(dir).map_err(|err| {
            Error::new(format!("failed to read log dir: {}", dir.display())).with_source(err)
        })?;
        let backups = read_dir
            .filter_map(|entry| {
                let entry = entry.ok()?;
                if !entry.metadata().ok()?.is_file() {
                    return None;
                }
                let name = entry.file_name();
                let suffix = name.to_str()?.strip_prefix(&prefix)?;
                boundary.is_backup_suffix(suffix).then(|| entry.path())
            })
            .collect();
        Ok(backups)
    }

    fn close(&mut self) {
        if let Some(mut file) = self.file.take() {
            let _ = file.flush();
        }
    }

    fn reopen(&mut self) -> Result<(), Error> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|err| Error::new("failed to reopen log file").with_source(err))?;
        self.file = Some(file);
        self.current_size = 0;
        Ok(())
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".");
        name.push(suffix);
        PathBuf::from(name)
    }
}

fn replace(src: &Path, dst: &Path) -> Result<(), Error> {
    if dst.exists() {
        fs::remove_file(dst).map_err(|err| {
            Error::new(format!("failed to remove old log: {}", dst.display())).with_source(err)
        })?;
    }
    fs::rename(src, dst).map_err(|err| {
        Error::new(format!("failed to rotate log: {}", src.display())).with_source(err)
    })
}
