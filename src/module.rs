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

pub mod fs;
pub mod loader;
pub mod resolver;

/// Modules implemented inside the guest VM's own standard library. They are
/// never resolved, loaded or bound by the host.
pub const ZI_RESERVED_MODULES: [&str; 2] = ["random", "meta"];

/// Extension of native plugin binaries on the current target.
#[cfg(windows)]
pub const ZI_NATIVE_EXTENSION: &str = "dll";
#[cfg(target_os = "macos")]
pub const ZI_NATIVE_EXTENSION: &str = "dylib";
#[cfg(target_family = "wasm")]
pub const ZI_NATIVE_EXTENSION: &str = "wasm";
#[cfg(not(any(windows, target_os = "macos", target_family = "wasm")))]
pub const ZI_NATIVE_EXTENSION: &str = "so";

pub fn is_reserved_module(name: &str) -> bool {
    ZI_RESERVED_MODULES.contains(&name)
}

pub use fs::{ZiOsFs, ZiSourceFs};
pub use loader::ZiModuleLoader;
pub use resolver::{ZiModuleKind, ZiModuleResolver};
