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

//! # Guest VM Seam
//!
//! Zirt does not implement the guest interpreter. It talks to one through
//! three traits:
//!
//! - **ZiVmEngine**: creates VM instances and exposes the engine's own C entry
//!   points (slot accessors, call/interpret) for distribution to plugins
//! - **ZiGuestVm**: a single VM instance as seen by the host
//! - **ZiVmHooks**: the configuration callbacks a VM invokes on the host
//!   (print/error sinks, module resolve/load, foreign binding)
//!
//! Native code only ever sees a VM as an opaque `*mut ZiVmRaw`, the same
//! pointer every foreign method, update callback and guest-registration
//! function receives.

use std::ffi::{c_char, c_int, c_void, CStr};
use std::sync::Arc;

use crate::handles::ZiVmUserData;

/// Opaque VM handle as seen across the C ABI.
#[repr(C)]
pub struct ZiVmRaw {
    _private: [u8; 0],
}

/// Native implementation of a guest foreign method. Results are written back
/// through the VM's slots.
pub type ZiForeignMethodFn = unsafe extern "C" fn(vm: *mut ZiVmRaw);

/// Finalizer invoked when the guest collects an instance of a foreign class.
pub type ZiFinalizerFn = unsafe extern "C" fn(data: *mut c_void);

/// Guest-visible registration entry point of a plugin, run against every VM
/// that imports the plugin.
pub type ZiGuestInitFn = unsafe extern "C" fn(vm: *mut ZiVmRaw);

/// Per-module plugin initializer: receives the plugin handle and may return a
/// guest-registration function.
pub type ZiPluginInitFn = unsafe extern "C" fn(handle: c_int) -> Option<ZiGuestInitFn>;

/// Initializer of the legacy single-binary plugin form.
pub type ZiLegacyInitFn = unsafe extern "C" fn(handle: c_int);

/// API receiver exported by a plugin. The host calls it once per entry of the
/// host API table with the entry's name and address.
pub type ZiPluginApiFn = unsafe extern "C" fn(name: *const c_char, func: *mut c_void);

/// Allocator/finalizer pair for a native class bound into the guest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ZiForeignClassHooks {
    pub allocate: Option<ZiForeignMethodFn>,
    pub finalize: Option<ZiFinalizerFn>,
}

impl ZiForeignClassHooks {
    pub fn new(allocate: Option<ZiForeignMethodFn>, finalize: Option<ZiFinalizerFn>) -> Self {
        ZiForeignClassHooks { allocate, finalize }
    }

    /// True when neither hook is set, which the guest reads as "not bound".
    pub fn is_empty(&self) -> bool {
        self.allocate.is_none() && self.finalize.is_none()
    }
}

/// Outcome of interpreting a chunk of guest source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZiInterpretResult {
    Success,
    CompileError,
    RuntimeError,
}

/// Category of a guest error report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZiGuestErrorKind {
    Compile,
    Runtime,
    StackTrace,
}

/// A named C entry point made available to plugins.
#[derive(Clone, Copy, Debug)]
pub struct ZiApiEntry {
    pub name: &'static CStr,
    pub func: *const c_void,
}

// Entries are plain code addresses.
unsafe impl Send for ZiApiEntry {}
unsafe impl Sync for ZiApiEntry {}

impl ZiApiEntry {
    pub fn new(name: &'static CStr, func: *const c_void) -> Self {
        ZiApiEntry { name, func }
    }
}

/// Callbacks a guest VM invokes on its host.
pub trait ZiVmHooks: Send + Sync {
    /// Guest `System.print` output.
    fn write(&self, vm: *mut ZiVmRaw, text: &str);

    /// Compile errors, runtime errors and stack trace lines.
    fn error(
        &self,
        vm: *mut ZiVmRaw,
        kind: ZiGuestErrorKind,
        module: Option<&str>,
        line: i32,
        message: &str,
    );

    /// Canonicalize `name` as imported from `importer`.
    fn resolve_module(&self, vm: *mut ZiVmRaw, importer: &str, name: &str) -> String;

    /// Source text for a canonical module name, or `None` when not found.
    fn load_module(&self, vm: *mut ZiVmRaw, name: &str) -> Option<String>;

    /// Native implementation of a `foreign` method, or `None` when unbound.
    fn bind_foreign_method(
        &self,
        vm: *mut ZiVmRaw,
        module: &str,
        class_name: &str,
        is_static: bool,
        signature: &str,
    ) -> Option<ZiForeignMethodFn>;

    /// Allocator/finalizer for a `foreign class`; empty hooks when unbound.
    fn bind_foreign_class(&self, vm: *mut ZiVmRaw, module: &str, class_name: &str)
        -> ZiForeignClassHooks;
}

/// One guest VM instance.
pub trait ZiGuestVm: Send {
    /// Compile and run `source` as module `module`.
    fn interpret(&mut self, module: &str, source: &str) -> ZiInterpretResult;

    /// Read a boolean from an API slot.
    fn get_slot_bool(&self, slot: usize) -> bool;

    /// Host sidecar state attached to this VM.
    fn user_data(&self) -> &ZiVmUserData;

    fn user_data_mut(&mut self) -> &mut ZiVmUserData;

    /// The pointer native code uses to address this VM.
    fn as_raw(&mut self) -> *mut ZiVmRaw;
}

/// Factory for guest VMs plus the engine's native API surface.
pub trait ZiVmEngine: Send + Sync {
    /// Create a VM wired to `hooks` carrying `user_data`.
    fn create_vm(&self, hooks: Arc<dyn ZiVmHooks>, user_data: ZiVmUserData) -> Box<dyn ZiGuestVm>;

    /// The engine's slot, list/map, handle and call entry points.
    fn api_entries(&self) -> Vec<ZiApiEntry>;

    /// Recover the host sidecar from a raw VM pointer.
    ///
    /// # Safety
    ///
    /// `vm` must be null or a pointer produced by `ZiGuestVm::as_raw` on a VM
    /// created by this engine that is still alive, and the returned reference
    /// must not outlive it.
    unsafe fn user_data_from_raw<'a>(&self, vm: *mut ZiVmRaw) -> Option<&'a mut ZiVmUserData>;
}
