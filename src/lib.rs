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


//! # Zirt Core Library
//!
//! Zirt is the host runtime around an embedded guest scripting VM. It lets
//! guest programs import modules that are backed by native plugins: shared
//! libraries that bind foreign methods and classes into the guest and can
//! schedule per-tick callbacks for asynchronous work.
//!
//! ## Module Overview
//!
//! - **vm**: The seam to the guest interpreter (engine, VM instance, hooks)
//! - **runtime**: VM factory wiring host hooks into every VM
//! - **module**: Import resolution and module source loading
//! - **plugin**: Native plugin loading, the platform library loader and the
//!   host C API handed to plugins
//! - **binding**: Registry of foreign methods and classes
//! - **scheduler**: Per-tick update callbacks
//! - **handles**: Plugin handles and per-VM plugin data
//! - **store**: Process-scoped state shared by all VMs
//! - **config**: Runtime configuration
//! - **log**: `log` backend with console and rotating file output
//!
//! ## Architecture
//!
//! 1. **Runtime** creates a VM and interprets the entry script
//! 2. **Imports** go through the resolver, then the module loader
//! 3. **Packages** with a native binary load it through the plugin loader
//!    before their source is compiled
//! 4. **Plugins** bind foreign methods into the registry via the host API
//! 5. **Scheduler** drives update callbacks until all report completion
//!
//! ## Error Handling
//!
//! Fallible host operations return `Result<T, ZiError>`. Missing modules,
//! binaries and bindings are reported as `None` and surfaced by the guest.

pub mod binding;
pub mod config;
pub mod errors;
pub mod handles;
pub mod log;
pub mod module;
pub mod plugin;
pub mod runtime;
pub mod scheduler;
pub mod store;
pub mod vm;

pub use binding::{class_key, method_key, ZiBindingRegistry};
pub use config::{ZiRuntimeConfig, ZiRuntimeConfigBuilder};
pub use errors::{Result, ZiError};
pub use handles::{ZiPluginHandle, ZiVmUserData};
pub use crate::log::{ZiLogConfig, ZiLogger};
pub use module::{ZiModuleKind, ZiModuleLoader, ZiModuleResolver, ZiOsFs, ZiSourceFs};
pub use plugin::{
    ZiAbiHost, ZiHostApi, ZiLibrary, ZiLibraryLoader, ZiPluginLoadOutcome, ZiPluginLoader,
    ZiPluginRecord, ZiSystemLibraryLoader,
};
pub use runtime::{ZiHostHooks, ZiRuntime};
pub use scheduler::ZiUpdateScheduler;
pub use store::ZiProcessStore;
pub use vm::{
    ZiApiEntry, ZiForeignClassHooks, ZiForeignMethodFn, ZiGuestErrorKind, ZiGuestVm,
    ZiInterpretResult, ZiVmEngine, ZiVmHooks, ZiVmRaw,
};
