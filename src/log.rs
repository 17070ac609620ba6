//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Zirt.
//! The Zirt project belongs to the Dunimd project team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.


//! # Zirt Logging
//!
//! A `log::Log` backend for the host runtime. Every diagnostic in the crate
//! goes through the `log` macros using the event convention
//!
//! ```text
//! area.event: human readable message - key=value, key=value
//! ```
//!
//! `ZiLogger` splits the event name off the message and hands a structured
//! `ZiLogRecord` to its handlers (stderr, size-rotating file) which render it
//! as JSON or text.

pub mod config;
pub mod core;
pub mod formatters;
pub mod handlers;

pub use self::config::{ZiLogConfig, ZiLogConfigBuilder};
pub use self::core::{ZiLogRecord, ZiLogger};
pub use self::formatters::{ZiJsonFormatter, ZiTextFormatter};
pub use self::handlers::{ZiFileHandler, ZiLogHandler, ZiStderrHandler};
