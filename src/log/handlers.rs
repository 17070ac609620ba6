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


use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::log::core::ZiLogRecord;
use crate::log::formatters::{ZiJsonFormatter, ZiTextFormatter};

pub trait ZiLogHandler: Send + Sync {
    fn handle(&self, record: &ZiLogRecord);

    fn flush(&self) {}
}

fn render(record: &ZiLogRecord, json: bool) -> String {
    if json {
        ZiJsonFormatter::format(record)
    } else {
        ZiTextFormatter::format(record)
    }
}

/// Writes to stderr so guest `System.print` output on stdout stays clean.
pub struct ZiStderrHandler {
    json: bool,
}

impl ZiStderrHandler {
    pub fn new(json: bool) -> Self {
        ZiStderrHandler { json }
    }
}

impl ZiLogHandler for ZiStderrHandler {
    fn handle(&self, record: &ZiLogRecord) {
        let line = render(record, self.json);
        let _ = writeln!(io::stderr().lock(), "{}", line);
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

/// Appends to a file, rotating `path -> path.1 -> path.2 ...` once it grows
/// past `max_bytes`.
pub struct ZiFileHandler {
    path: PathBuf,
    json: bool,
    max_bytes: Option<u64>,
    backup_count: u32,
    file: Mutex<Option<File>>,
}

impl ZiFileHandler {
    pub fn new(
        path: impl AsRef<Path>,
        json: bool,
        max_bytes: Option<u64>,
        backup_count: Option<u32>,
    ) -> Self {
        ZiFileHandler {
            path: path.as_ref().to_path_buf(),
            json,
            max_bytes,
            backup_count: backup_count.unwrap_or(7),
            file: Mutex::new(None),
        }
    }

    /// Name of the `index`-th rotated file.
    pub fn backup_path(&self, index: u32) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    fn needs_rotation(&self) -> bool {
        match (self.max_bytes, fs::metadata(&self.path)) {
            (Some(max_bytes), Ok(meta)) => meta.len() > max_bytes,
            _ => false,
        }
    }

    fn rotate(&self) {
        if self.backup_count == 0 {
            let _ = fs::remove_file(&self.path);
            return;
        }
        let _ = fs::remove_file(self.backup_path(self.backup_count));
        for index in (1..self.backup_count).rev() {
            let from = self.backup_path(index);
            if from.exists() {
                let _ = fs::rename(&from, self.backup_path(index + 1));
            }
        }
        let _ = fs::rename(&self.path, self.backup_path(1));
    }
}

impl ZiLogHandler for ZiFileHandler {
    fn handle(&self, record: &ZiLogRecord) {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        if self.needs_rotation() {
            *file = None;
            self.rotate();
        }
        if file.is_none() {
            *file = OpenOptions::new().create(true).append(true).open(&self.path).ok();
        }
        if let Some(f) = file.as_mut() {
            let _ = writeln!(f, "{}", render(record, self.json));
        }
    }

    fn flush(&self) {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(f) = file.as_mut() {
            let _ = f.flush();
        }
    }
}
