//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Zirt.
//! The Zirt project belongs to the Dunimd Team.
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

//! # Zirt Error Module
//!
//! This module defines the error types used throughout the Zirt host runtime.
//!
//! ## Error Handling Philosophy
//!
//! Most "not found" outcomes are not errors in Zirt: a missing module source,
//! a missing native binary or an unbound foreign method are reported as
//! `None` (or an explicit outcome enum) and left to the guest VM to surface.
//! `ZiError` is reserved for failures the host itself has to report:
//!
//! - **Io**: Filesystem errors, e.g. an unreadable entry script
//! - **Config**: Invalid runtime configuration
//! - **Plugin**: A native binary exists but could not be opened
//! - **Symbol**: A native binary lacks a required entry point
//! - **Module**: A guest module failed to interpret
//! - **Serde**: Serialization/deserialization errors
//! - **Internal**: Unexpected internal failures
//!
//! ## Usage
//!
//! ```rust
//! use zirt::errors::{Result, ZiError};
//!
//! fn open(plugin: &str) -> Result<()> {
//!     Err(ZiError::plugin(plugin, "not a shared object"))
//! }
//! ```

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenience result type used throughout Zirt.
pub type Result<T> = std::result::Result<T, ZiError>;

/// Canonical error enumeration for Zirt.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum ZiError {
    /// Errors originating from filesystem IO.
    #[error("io error: {0}")]
    Io(String),

    /// Invalid or unreadable runtime configuration.
    #[error("config error: {message}")]
    Config { message: String },

    /// A native plugin binary exists but the platform loader rejected it.
    #[error("plugin '{plugin}' failed to load: {message}")]
    Plugin { plugin: String, message: String },

    /// A native plugin binary is missing a required entry point.
    #[error("plugin '{plugin}' is missing entry point '{symbol}'")]
    Symbol { plugin: String, symbol: String },

    /// A guest module failed to compile or run.
    #[error("module '{module}' failed: {message}")]
    Module { module: String, message: String },

    /// Wrapper for serde-style serialization issues.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Catch-all variant for unexpected situations.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for ZiError {
    fn from(err: io::Error) -> Self {
        ZiError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ZiError {
    fn from(err: serde_json::Error) -> Self {
        ZiError::Serde(err.to_string())
    }
}

impl ZiError {
    /// Helper to construct configuration errors.
    pub fn config<T: Into<String>>(message: T) -> Self {
        ZiError::Config {
            message: message.into(),
        }
    }

    /// Helper to construct plugin open errors.
    pub fn plugin(name: impl Into<String>, message: impl Into<String>) -> Self {
        ZiError::Plugin {
            plugin: name.into(),
            message: message.into(),
        }
    }

    /// Helper to construct missing entry point errors.
    pub fn symbol(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        ZiError::Symbol {
            plugin: name.into(),
            symbol: symbol.into(),
        }
    }

    /// Helper to construct guest module errors.
    pub fn module(name: impl Into<String>, message: impl Into<String>) -> Self {
        ZiError::Module {
            module: name.into(),
            message: message.into(),
        }
    }

    /// Helper to construct internal errors.
    pub fn internal<T: Into<String>>(message: T) -> Self {
        ZiError::Internal(message.into())
    }
}
