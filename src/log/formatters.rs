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


use crate::log::core::ZiLogRecord;

pub struct ZiJsonFormatter;

impl ZiJsonFormatter {
    pub fn format(record: &ZiLogRecord) -> String {
        record.to_json().to_string()
    }
}

pub struct ZiTextFormatter;

impl ZiTextFormatter {
    /// `<ms> <LEVEL> <target> <event>: <message>`
    pub fn format(record: &ZiLogRecord) -> String {
        if record.event.is_empty() {
            format!(
                "{} {:<5} {} {}",
                record.timestamp_ms(),
                record.level,
                record.target,
                record.message
            )
        } else {
            format!(
                "{} {:<5} {} {}: {}",
                record.timestamp_ms(),
                record.level,
                record.target,
                record.event,
                record.message
            )
        }
    }
}
