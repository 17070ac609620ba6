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


use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{Level, LevelFilter, Log, Metadata, Record};
use serde_json::{json, Map, Value};

use crate::log::config::ZiLogConfig;
use crate::log::handlers::{ZiFileHandler, ZiLogHandler, ZiStderrHandler};

/// One log line split into its structured parts.
#[derive(Clone, Debug)]
pub struct ZiLogRecord {
    pub level: Level,
    pub target: String,
    /// The `area.event` prefix, empty when the message has none.
    pub event: String,
    pub message: String,
    pub timestamp: SystemTime,
}

impl ZiLogRecord {
    pub fn new(level: Level, target: impl Into<String>, text: &str) -> Self {
        let (event, message) = split_event(text);
        ZiLogRecord {
            level,
            target: target.into(),
            event: event.to_string(),
            message: message.to_string(),
            timestamp: SystemTime::now(),
        }
    }

    pub fn timestamp_ms(&self) -> u128 {
        self.timestamp
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis()
    }

    pub fn to_json(&self) -> Value {
        let mut data = Map::new();
        data.insert("level".into(), json!(self.level.as_str()));
        data.insert("target".into(), json!(self.target));
        data.insert("event".into(), json!(self.event));
        data.insert("message".into(), json!(self.message));
        data.insert("timestamp_ms".into(), json!(self.timestamp_ms()));
        Value::Object(data)
    }
}

/// Split `area.event: message` into its event and message. Text without a
/// dotted, space-free prefix is all message.
pub fn split_event(text: &str) -> (&str, &str) {
    match text.split_once(": ") {
        Some((event, message))
            if event.contains('.') && !event.is_empty() && !event.contains(char::is_whitespace) =>
        {
            (event, message)
        }
        _ => ("", text),
    }
}

/// The process logger installed behind the `log` facade.
pub struct ZiLogger {
    level: LevelFilter,
    handlers: Vec<Box<dyn ZiLogHandler>>,
}

static LOGGER: OnceLock<ZiLogger> = OnceLock::new();

impl ZiLogger {
    pub fn new(config: &ZiLogConfig) -> Self {
        let mut handlers: Vec<Box<dyn ZiLogHandler>> = Vec::new();
        if config.console_enabled {
            handlers.push(Box::new(ZiStderrHandler::new(config.json_format)));
        }
        if config.file_enabled {
            if let Some(path) = &config.file_path {
                handlers.push(Box::new(ZiFileHandler::new(
                    path,
                    config.json_format,
                    config.max_bytes,
                    config.backup_count,
                )));
            }
        }
        ZiLogger {
            level: config.level_filter(),
            handlers,
        }
    }

    /// Install the global logger. Safe to call multiple times; the first call
    /// wins. Returns `false` when a logger was already installed, by this
    /// function or by someone else.
    pub fn init(config: &ZiLogConfig) -> bool {
        let mut created = false;
        let logger = LOGGER.get_or_init(|| {
            created = true;
            ZiLogger::new(config)
        });
        if !created {
            return false;
        }
        match log::set_logger(logger) {
            Ok(()) => {
                log::set_max_level(logger.level);
                true
            }
            Err(_) => false,
        }
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Dispatch `record` to every handler if its level passes.
    pub fn emit(&self, record: &ZiLogRecord) {
        if record.level > self.level {
            return;
        }
        for handler in &self.handlers {
            handler.handle(record);
        }
    }
}

impl Log for ZiLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let text = record.args().to_string();
        self.emit(&ZiLogRecord::new(record.level(), record.target(), &text));
    }

    fn flush(&self) {
        for handler in &self.handlers {
            handler.flush();
        }
    }
}
