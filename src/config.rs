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


//! # Runtime Configuration
//!
//! `ZiRuntimeConfig` collects the knobs of a `ZiRuntime`: where installed
//! packages live, the guest source extension, the entry script, the
//! starvation diagnostic of the update scheduler and the logger setup.
//!
//! Configuration is plain serde data. It can be built in code with
//! `ZiRuntimeConfigBuilder`, parsed leniently from a JSON value, or read
//! strictly from a JSON file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{Result, ZiError};
use crate::log::ZiLogConfig;

pub const ZI_DEFAULT_MODULE_ROOT: &str = "./wren_modules";
pub const ZI_DEFAULT_SOURCE_EXTENSION: &str = "wren";
pub const ZI_DEFAULT_MAIN_SCRIPT: &str = "main.wren";
pub const ZI_DEFAULT_STARVATION_WARN_TICKS: u64 = 100_000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZiRuntimeConfig {
    /// Directories searched, in order, for installed packages.
    pub module_roots: Vec<PathBuf>,
    /// Guest source extension without the dot.
    pub source_extension: String,
    /// Script run when no path is given.
    pub main_script: PathBuf,
    /// Warn once about an update callback alive for this many passes.
    /// `None` disables the warning.
    pub starvation_warn_ticks: Option<u64>,
    pub log: ZiLogConfig,
}

impl Default for ZiRuntimeConfig {
    fn default() -> Self {
        ZiRuntimeConfig {
            module_roots: vec![PathBuf::from(ZI_DEFAULT_MODULE_ROOT)],
            source_extension: ZI_DEFAULT_SOURCE_EXTENSION.to_string(),
            main_script: PathBuf::from(ZI_DEFAULT_MAIN_SCRIPT),
            starvation_warn_ticks: Some(ZI_DEFAULT_STARVATION_WARN_TICKS),
            log: ZiLogConfig::default(),
        }
    }
}

impl ZiRuntimeConfig {
    /// Read a JSON configuration file. Unlike `ZiRuntimeConfigBuilder::from_json`
    /// this rejects malformed input.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| {
            ZiError::config(format!("cannot read {}: {}", path.display(), err))
        })?;
        let config: ZiRuntimeConfig = serde_json::from_str(&text)?;
        config.validate()?;
        log::debug!(
            "config.load: runtime configuration read - path={}, roots={}",
            path.display(),
            config.module_roots.len()
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.source_extension.is_empty() {
            return Err(ZiError::config("source_extension must not be empty"));
        }
        if self.source_extension.starts_with('.') {
            return Err(ZiError::config(format!(
                "source_extension must not start with a dot: {}",
                self.source_extension
            )));
        }
        if self.log.file_enabled && self.log.file_path.is_none() {
            return Err(ZiError::config("log.file_enabled requires log.file_path"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ZiRuntimeConfigBuilder {
    pub module_roots: Option<Vec<PathBuf>>,
    pub source_extension: Option<String>,
    pub main_script: Option<PathBuf>,
    pub starvation_warn_ticks: Option<Option<u64>>,
    pub log: Option<Value>,
}

impl ZiRuntimeConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn module_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.module_roots.get_or_insert_with(Vec::new).push(root.into());
        self
    }

    pub fn module_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.module_roots = Some(roots);
        self
    }

    pub fn source_extension(mut self, extension: impl Into<String>) -> Self {
        self.source_extension = Some(extension.into());
        self
    }

    pub fn main_script(mut self, path: impl Into<PathBuf>) -> Self {
        self.main_script = Some(path.into());
        self
    }

    pub fn starvation_warn_ticks(mut self, ticks: Option<u64>) -> Self {
        self.starvation_warn_ticks = Some(ticks);
        self
    }

    pub fn log(mut self, log: &ZiLogConfig) -> Self {
        self.log = serde_json::to_value(log).ok();
        self
    }

    pub fn build(self) -> ZiRuntimeConfig {
        let base = ZiRuntimeConfig::default();
        ZiRuntimeConfig {
            module_roots: self.module_roots.unwrap_or(base.module_roots),
            source_extension: self.source_extension.unwrap_or(base.source_extension),
            main_script: self.main_script.unwrap_or(base.main_script),
            starvation_warn_ticks: self
                .starvation_warn_ticks
                .unwrap_or(base.starvation_warn_ticks),
            log: self
                .log
                .map(|value| crate::log::ZiLogConfigBuilder::from_json(&value))
                .unwrap_or(base.log),
        }
    }

    /// Lenient parse: an unreadable value yields the defaults.
    pub fn from_json(value: &Value) -> ZiRuntimeConfig {
        let builder: ZiRuntimeConfigBuilder =
            serde_json::from_value(value.clone()).unwrap_or_default();
        builder.build()
    }
}
