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


use log::LevelFilter;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Configuration for `ZiLogger`: console and file enablement, the default
/// level, output format and size-based rotation of the log file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZiLogConfig {
    pub default_level: String,
    pub console_enabled: bool,
    /// Render records as JSON objects instead of text lines.
    pub json_format: bool,
    pub file_enabled: bool,
    /// Log file path, required when file logging is enabled.
    pub file_path: Option<String>,
    /// Rotate once the file grows past this many bytes.
    pub max_bytes: Option<u64>,
    /// Number of rotated files to keep.
    pub backup_count: Option<u32>,
}

impl Default for ZiLogConfig {
    fn default() -> Self {
        ZiLogConfig {
            default_level: "INFO".to_string(),
            console_enabled: true,
            json_format: false,
            file_enabled: false,
            file_path: None,
            max_bytes: Some(10 * 1024 * 1024),
            backup_count: Some(7),
        }
    }
}

impl ZiLogConfig {
    /// The `log` filter matching `default_level`. Unknown names fall back to
    /// `Info`.
    pub fn level_filter(&self) -> LevelFilter {
        match self.default_level.to_ascii_uppercase().as_str() {
            "OFF" => LevelFilter::Off,
            "TRACE" => LevelFilter::Trace,
            "DEBUG" => LevelFilter::Debug,
            "WARN" | "WARNING" => LevelFilter::Warn,
            "ERROR" => LevelFilter::Error,
            _ => LevelFilter::Info,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ZiLogConfigBuilder {
    pub default_level: Option<String>,
    pub console_enabled: Option<bool>,
    pub json_format: Option<bool>,
    pub file_enabled: Option<bool>,
    pub file_path: Option<String>,
    pub max_bytes: Option<u64>,
    pub backup_count: Option<u32>,
}

impl ZiLogConfigBuilder {
    pub fn build(self) -> ZiLogConfig {
        let base = ZiLogConfig::default();
        ZiLogConfig {
            default_level: self.default_level.unwrap_or(base.default_level),
            console_enabled: self.console_enabled.unwrap_or(base.console_enabled),
            json_format: self.json_format.unwrap_or(base.json_format),
            file_enabled: self.file_enabled.unwrap_or(base.file_enabled),
            file_path: self.file_path.or(base.file_path),
            max_bytes: self.max_bytes.or(base.max_bytes),
            backup_count: self.backup_count.or(base.backup_count),
        }
    }

    /// Lenient parse: an unreadable value yields the defaults.
    pub fn from_json(value: &Value) -> ZiLogConfig {
        let builder: ZiLogConfigBuilder =
            serde_json::from_value(value.clone()).unwrap_or_default();
        builder.build()
    }
}
