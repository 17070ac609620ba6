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

//! # Host C API
//!
//! The table of named entry points handed to plugins: the guest engine's own
//! slot/call functions followed by the host functions defined here.
//!
//! C callers carry no context, so the host functions reach the runtime that
//! was installed with [`install`]. Only the first installation takes effect;
//! until then every host function logs a warning and does nothing.

use std::ffi::{c_char, c_int, c_void, CStr};
use std::ptr;
use std::sync::{Arc, OnceLock};

use crate::handles::ZiPluginHandle;
use crate::scheduler::ZiUpdateScheduler;
use crate::store::ZiProcessStore;
use crate::vm::{
    ZiApiEntry, ZiFinalizerFn, ZiForeignClassHooks, ZiForeignMethodFn, ZiPluginApiFn, ZiVmEngine,
    ZiVmRaw,
};

/// What the host functions need from a runtime.
pub trait ZiAbiHost: Send + Sync {
    fn store(&self) -> &ZiProcessStore;

    fn scheduler(&self) -> &ZiUpdateScheduler;

    fn engine(&self) -> &dyn ZiVmEngine;

    /// Create a VM kept alive by the host and return its raw handle.
    fn spawn_vm(&self, is_main: bool) -> *mut ZiVmRaw;
}

static ABI_HOST: OnceLock<Arc<dyn ZiAbiHost>> = OnceLock::new();

/// Route the host functions to `host`. Returns `false` when another host was
/// installed first.
pub fn install(host: Arc<dyn ZiAbiHost>) -> bool {
    let installed = ABI_HOST.set(host).is_ok();
    if !installed {
        log::warn!("abi.install.ignored: a runtime is already installed for the host C API");
    }
    installed
}

pub fn is_installed() -> bool {
    ABI_HOST.get().is_some()
}

fn installed(caller: &str) -> Option<&'static Arc<dyn ZiAbiHost>> {
    let host = ABI_HOST.get();
    if host.is_none() {
        log::warn!("abi.call.uninstalled: host function called before a runtime was installed - function={}", caller);
    }
    host
}

unsafe fn c_name<'a>(name: *const c_char, caller: &str) -> Option<&'a str> {
    if name.is_null() {
        log::warn!("abi.call.null_name: null binding name - function={}", caller);
        return None;
    }
    match CStr::from_ptr(name).to_str() {
        Ok(name) => Some(name),
        Err(err) => {
            log::warn!("abi.call.invalid_name: binding name is not UTF-8 - function={}, error={}", caller, err);
            None
        }
    }
}

/// Bind a foreign method under its fully-qualified `module.Class.signature`.
///
/// # Safety
///
/// `name` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn zirt_bind_method(name: *const c_char, func: Option<ZiForeignMethodFn>) {
    let Some(host) = installed("zirt_bind_method") else {
        return;
    };
    let Some(name) = c_name(name, "zirt_bind_method") else {
        return;
    };
    match func {
        Some(func) => {
            host.store().bindings().register_method(name, func);
        }
        None => log::warn!("abi.bind_method.null: ignoring null foreign method - key={}", name),
    }
}

/// Bind a foreign class under its fully-qualified `module.Class`.
///
/// # Safety
///
/// `name` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn zirt_bind_class(
    name: *const c_char,
    allocate: Option<ZiForeignMethodFn>,
    finalize: Option<ZiFinalizerFn>,
) {
    let Some(host) = installed("zirt_bind_class") else {
        return;
    };
    let Some(name) = c_name(name, "zirt_bind_class") else {
        return;
    };
    host.store()
        .bindings()
        .register_class(name, ZiForeignClassHooks::new(allocate, finalize));
}

/// Append a per-tick update callback.
///
/// # Safety
///
/// `func` must stay valid until it reports completion.
#[no_mangle]
pub unsafe extern "C" fn zirt_update_callback(func: Option<ZiForeignMethodFn>) {
    let Some(host) = installed("zirt_update_callback") else {
        return;
    };
    match func {
        Some(func) => host.scheduler().register(func),
        None => log::warn!("abi.update_callback.null: ignoring null update callback"),
    }
}

/// Park `value` for plugin `handle` on `vm`.
///
/// # Safety
///
/// `vm` must be a live VM created by the installed runtime's engine.
#[no_mangle]
pub unsafe extern "C" fn zirt_set_plugin_data(vm: *mut ZiVmRaw, handle: c_int, value: *mut c_void) {
    let Some(host) = installed("zirt_set_plugin_data") else {
        return;
    };
    let Some(handle) = ZiPluginHandle::from_c(handle) else {
        log::warn!("abi.plugin_data.invalid_handle: plugin handles start at 1 - handle={}", handle);
        return;
    };
    if let Some(user_data) = host.engine().user_data_from_raw(vm) {
        user_data.set_plugin_data(handle, value);
    }
}

/// The pointer parked for plugin `handle` on `vm`, or null.
///
/// # Safety
///
/// `vm` must be a live VM created by the installed runtime's engine.
#[no_mangle]
pub unsafe extern "C" fn zirt_get_plugin_data(vm: *mut ZiVmRaw, handle: c_int) -> *mut c_void {
    let Some(host) = installed("zirt_get_plugin_data") else {
        return ptr::null_mut();
    };
    let Some(handle) = ZiPluginHandle::from_c(handle) else {
        return ptr::null_mut();
    };
    host.engine()
        .user_data_from_raw(vm)
        .map_or(ptr::null_mut(), |user_data| user_data.plugin_data(handle))
}

/// Create a VM owned by the host, e.g. for a worker thread.
#[no_mangle]
pub extern "C" fn zirt_new_vm(is_main: bool) -> *mut ZiVmRaw {
    match installed("zirt_new_vm") {
        Some(host) => host.spawn_vm(is_main),
        None => ptr::null_mut(),
    }
}

/// Host-owned entries of the API table.
pub fn host_entries() -> Vec<ZiApiEntry> {
    vec![
        ZiApiEntry::new(c"zirt_bind_class", zirt_bind_class as *const c_void),
        ZiApiEntry::new(c"zirt_bind_method", zirt_bind_method as *const c_void),
        ZiApiEntry::new(c"zirt_update_callback", zirt_update_callback as *const c_void),
        ZiApiEntry::new(c"zirt_set_plugin_data", zirt_set_plugin_data as *const c_void),
        ZiApiEntry::new(c"zirt_get_plugin_data", zirt_get_plugin_data as *const c_void),
        ZiApiEntry::new(c"zirt_new_vm", zirt_new_vm as *const c_void),
    ]
}

/// The API table distributed to plugins.
#[derive(Clone, Debug, Default)]
pub struct ZiHostApi {
    entries: Vec<ZiApiEntry>,
}

impl ZiHostApi {
    /// A table with no entries.
    pub fn empty() -> Self {
        ZiHostApi { entries: Vec::new() }
    }

    /// Engine entries followed by the host entries.
    pub fn new(engine_entries: Vec<ZiApiEntry>) -> Self {
        let mut entries = engine_entries;
        entries.extend(host_entries());
        ZiHostApi { entries }
    }

    pub fn entries(&self) -> &[ZiApiEntry] {
        &self.entries
    }

    pub fn find(&self, name: &str) -> Option<*const c_void> {
        self.entries
            .iter()
            .find(|entry| entry.name.to_bytes() == name.as_bytes())
            .map(|entry| entry.func)
    }

    /// Call `accept` once per entry, in table order.
    pub fn distribute(&self, accept: ZiPluginApiFn) {
        for entry in &self.entries {
            // The receiver is plugin code trusted by contract; names are
            // static NUL-terminated strings.
            unsafe { accept(entry.name.as_ptr(), entry.func as *mut c_void) };
        }
        log::debug!("abi.distribute: host API sent to plugin - entries={}", self.entries.len());
    }
}
