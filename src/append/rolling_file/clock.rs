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

use jiff::Timestamp;

/// The source of "now" for time-based rotation; tests may pin it.
#[derive(Debug, Default)]
pub(crate) struct Clock {
    #[cfg(test)]
    pinned: Option<Timestamp>,
}

impl Clock {
    pub(crate) fn now(&self) -> Timestamp {
        #[cfg(test)]
        {
            if let Some(now) = self.pinned {
                return now;
            }
        }
        Timestamp::now()
    }

    #[cfg(test)]
    pub(crate) fn pinned(now: Timestamp) -> Clock {
        Clock { pinned: Some(now) }
    }

    #[cfg(test)]
    pub(crate) fn set_now(&mut self, now: Timestamp) {
        self.pinned = Some(now);
    }
}
