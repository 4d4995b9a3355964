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

//! Sink for writing log lines to a file that rolls over by size or by time.
//!
//! Size rotation keeps numbered backups, `converter.log.1` being the newest. Time rotation
//! suffixes each backup with the start of the period it covers, such as
//! `converter.log.2024-08-10`.
//!
//! # Example
//!
//! ```
//! use fxlog::append::Append;
//! use fxlog::append::rolling_file::RollingFile;
//! use fxlog::append::rolling_file::Rotation;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let file = RollingFile::builder(dir.path().join("converter.log"))
//!     .rotation(Rotation::Size { max_bytes: 1024 })
//!     .backup_count(3)
//!     .build();
//!
//! file.write("Converted 100 USD to EUR").unwrap();
//! ```

pub use append::RollingFile;
pub use append::RollingFileBuilder;
pub use rotation::Rotation;

mod append;
mod clock;
mod rolling;
mod rotation;
