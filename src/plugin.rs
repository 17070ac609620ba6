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


//! # Native Plugins
//!
//! - **library**: opening shared libraries and resolving symbols
//! - **loader**: at-most-once plugin initialization and the plugin registry
//! - **abi**: the host C API table distributed to plugins

pub mod abi;
pub mod library;
pub mod loader;

pub use abi::{ZiAbiHost, ZiHostApi};
pub use library::{ZiLibrary, ZiLibraryLoader, ZiSystemLibraryLoader};
pub use loader::{
    ZiPluginEntryPoints, ZiPluginInit, ZiPluginLoadOutcome, ZiPluginLoader, ZiPluginRecord,
};
