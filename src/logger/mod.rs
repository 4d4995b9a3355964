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

//! Named loggers and the factory that wires them to sinks.

pub use self::factory::LoggerFactory;
pub use self::factory::LoggerFactoryBuilder;
pub use self::factory::LoggerOptions;
pub use self::factory::ROOT_LOGGER_NAME;
pub use self::factory::RootOptions;
pub use self::named::Logger;

mod factory;
mod named;
