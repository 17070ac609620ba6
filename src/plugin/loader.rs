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

//! # Plugin Loader
//!
//! Loads each native plugin at most once per process and hands it a
//! process-unique handle.
//!
//! ## Lifecycle
//!
//! Unloaded → Loading → Loaded. A failed load leaves nothing behind, so the
//! next import retries. There is no unload: records live as long as the
//! owning `ZiProcessStore`.
//!
//! ## Entry points
//!
//! A binary for plugin `id` exports either the per-module form
//!
//! - `zirt_plugin_init_<id>(handle) -> guest init fn` (required)
//! - `zirt_plugin_api_<id>(register)` (optional)
//!
//! or the legacy single-binary form
//!
//! - `zirt_plugin_init(handle)` and `zirt_plugin_api(register)` (required)
//! - `zirt_plugin_init_guest(vm)` (optional)
//!
//! `<id>` is the plugin identifier with every non-alphanumeric character
//! replaced by `_`.

use std::collections::HashMap;
use std::fmt;
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::errors::{Result, ZiError};
use crate::handles::ZiPluginHandle;
use crate::plugin::abi::ZiHostApi;
use crate::plugin::library::{ZiLibrary, ZiLibraryLoader};
use crate::vm::{ZiGuestInitFn, ZiLegacyInitFn, ZiPluginApiFn, ZiPluginInitFn, ZiVmRaw};

pub const ZI_PLUGIN_INIT_PREFIX: &str = "zirt_plugin_init_";
pub const ZI_PLUGIN_API_PREFIX: &str = "zirt_plugin_api_";
pub const ZI_LEGACY_INIT_SYMBOL: &str = "zirt_plugin_init";
pub const ZI_LEGACY_API_SYMBOL: &str = "zirt_plugin_api";
pub const ZI_LEGACY_GUEST_SYMBOL: &str = "zirt_plugin_init_guest";

/// Symbol-safe form of a plugin identifier.
pub fn symbol_suffix(identifier: &str) -> String {
    identifier
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// How a plugin gets initialized.
#[derive(Clone, Copy, Debug)]
pub enum ZiPluginInit {
    /// Per-module initializer that returns the guest-registration function.
    PerModule(ZiPluginInitFn),
    /// Single-binary initializer with a separately exported guest function.
    Legacy {
        init: ZiLegacyInitFn,
        guest: Option<ZiGuestInitFn>,
    },
}

/// Typed view of a plugin's exported entry points.
#[derive(Clone, Copy, Debug)]
pub struct ZiPluginEntryPoints {
    pub api: Option<ZiPluginApiFn>,
    pub init: ZiPluginInit,
}

impl ZiPluginEntryPoints {
    /// Resolve the entry points of `identifier` from `library`.
    pub fn resolve(library: &dyn ZiLibrary, identifier: &str) -> Result<Self> {
        let suffix = symbol_suffix(identifier);
        let init_symbol = format!("{}{}", ZI_PLUGIN_INIT_PREFIX, suffix);
        let api_symbol = format!("{}{}", ZI_PLUGIN_API_PREFIX, suffix);

        // Each address is cast to the signature the plugin ABI fixes for that
        // symbol name.
        unsafe {
            if let Some(init) = library.symbol(&init_symbol) {
                let api = library
                    .symbol(&api_symbol)
                    .map(|ptr| mem::transmute::<*const std::ffi::c_void, ZiPluginApiFn>(ptr));
                return Ok(ZiPluginEntryPoints {
                    api,
                    init: ZiPluginInit::PerModule(mem::transmute::<
                        *const std::ffi::c_void,
                        ZiPluginInitFn,
                    >(init)),
                });
            }

            let init = library
                .symbol(ZI_LEGACY_INIT_SYMBOL)
                .ok_or_else(|| ZiError::symbol(identifier, init_symbol.clone()))?;
            let api = library
                .symbol(ZI_LEGACY_API_SYMBOL)
                .ok_or_else(|| ZiError::symbol(identifier, ZI_LEGACY_API_SYMBOL))?;
            let guest = library
                .symbol(ZI_LEGACY_GUEST_SYMBOL)
                .map(|ptr| mem::transmute::<*const std::ffi::c_void, ZiGuestInitFn>(ptr));

            Ok(ZiPluginEntryPoints {
                api: Some(mem::transmute::<*const std::ffi::c_void, ZiPluginApiFn>(api)),
                init: ZiPluginInit::Legacy {
                    init: mem::transmute::<*const std::ffi::c_void, ZiLegacyInitFn>(init),
                    guest,
                },
            })
        }
    }

    /// Hand the host API table to the plugin, if it asks for one.
    pub fn distribute_api(&self, api: &ZiHostApi) {
        if let Some(accept) = self.api {
            api.distribute(accept);
        }
    }

    /// Run the native initializer and return the guest-registration function.
    pub fn initialize(&self, handle: ZiPluginHandle) -> Option<ZiGuestInitFn> {
        // Initializers are trusted plugin code by contract.
        unsafe {
            match self.init {
                ZiPluginInit::PerModule(init) => init(handle.as_c()),
                ZiPluginInit::Legacy { init, guest } => {
                    init(handle.as_c());
                    guest
                }
            }
        }
    }
}

/// A plugin that has been initialized in this process.
pub struct ZiPluginRecord {
    name: String,
    path: Option<PathBuf>,
    handle: ZiPluginHandle,
    guest_init: Option<ZiGuestInitFn>,
    _library: Option<Box<dyn ZiLibrary>>,
}

impl ZiPluginRecord {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Binary the plugin was loaded from; `None` for static plugins.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn handle(&self) -> ZiPluginHandle {
        self.handle
    }

    pub fn is_static(&self) -> bool {
        self._library.is_none()
    }

    pub fn has_guest_registration(&self) -> bool {
        self.guest_init.is_some()
    }

    /// Run the guest-visible registration against `vm`.
    pub fn register_guest(&self, vm: *mut ZiVmRaw) {
        if let Some(guest_init) = self.guest_init {
            log::debug!(
                "plugin.guest.register: running guest registration - plugin={}, handle={}",
                self.name,
                self.handle
            );
            unsafe { guest_init(vm) }
        }
    }
}

impl fmt::Debug for ZiPluginRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZiPluginRecord")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("handle", &self.handle)
            .field("guest_init", &self.guest_init.is_some())
            .finish()
    }
}

/// Result of a successful `ZiPluginLoader::load` call.
#[derive(Clone, Debug)]
pub enum ZiPluginLoadOutcome {
    /// The binary was opened and initialized by this call.
    Loaded(Arc<ZiPluginRecord>),
    /// Another import already initialized it; only guest registration ran.
    AlreadyLoaded(Arc<ZiPluginRecord>),
    /// There is no binary, so the module is script-only.
    Missing,
}

impl ZiPluginLoadOutcome {
    pub fn record(&self) -> Option<&Arc<ZiPluginRecord>> {
        match self {
            ZiPluginLoadOutcome::Loaded(record) | ZiPluginLoadOutcome::AlreadyLoaded(record) => {
                Some(record)
            }
            ZiPluginLoadOutcome::Missing => None,
        }
    }
}

/// Process-wide registry of loaded plugins.
pub struct ZiPluginLoader {
    library_loader: Arc<dyn ZiLibraryLoader>,
    records: RwLock<HashMap<String, Arc<ZiPluginRecord>>>,
    load_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    next_handle: AtomicU32,
}

impl ZiPluginLoader {
    pub fn new(library_loader: Arc<dyn ZiLibraryLoader>) -> Self {
        ZiPluginLoader {
            library_loader,
            records: RwLock::new(HashMap::new()),
            load_locks: Mutex::new(HashMap::new()),
            next_handle: AtomicU32::new(1),
        }
    }

    pub fn get(&self, identifier: &str) -> Option<Arc<ZiPluginRecord>> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identifier)
            .cloned()
    }

    pub fn is_loaded(&self, identifier: &str) -> bool {
        self.get(identifier).is_some()
    }

    /// Identifiers of every loaded plugin, sorted.
    pub fn loaded_plugins(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Ensure `identifier` is loaded from `binary_path`, then run its guest
    /// registration against `vm`.
    pub fn load(
        &self,
        vm: *mut ZiVmRaw,
        identifier: &str,
        binary_path: &Path,
        api: &ZiHostApi,
    ) -> Result<ZiPluginLoadOutcome> {
        if let Some(record) = self.get(identifier) {
            record.register_guest(vm);
            return Ok(ZiPluginLoadOutcome::AlreadyLoaded(record));
        }

        let lock = self.load_lock(identifier);
        let outcome = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.load_exclusive(identifier, binary_path, api)
        };
        self.release_load_lock(identifier, lock);

        let outcome = outcome?;
        if let Some(record) = outcome.record() {
            record.register_guest(vm);
        }
        Ok(outcome)
    }

    // Runs with the per-identifier load lock held.
    fn load_exclusive(
        &self,
        identifier: &str,
        binary_path: &Path,
        api: &ZiHostApi,
    ) -> Result<ZiPluginLoadOutcome> {
        // Someone may have finished loading while this thread waited.
        if let Some(record) = self.get(identifier) {
            return Ok(ZiPluginLoadOutcome::AlreadyLoaded(record));
        }

        if !binary_path.is_file() {
            return Ok(ZiPluginLoadOutcome::Missing);
        }

        log::info!(
            "plugin.load: loading dynamic binary module - plugin={}, path={}",
            identifier,
            binary_path.to_string_lossy()
        );

        let library = self.library_loader.open(binary_path).map_err(|err| {
            log::error!(
                "plugin.load.open_failed: could not open binary plugin - plugin={}, path={}, error={}",
                identifier,
                binary_path.to_string_lossy(),
                err
            );
            err
        })?;

        let entry_points = ZiPluginEntryPoints::resolve(library.as_ref(), identifier).map_err(|err| {
            log::error!(
                "plugin.load.symbol_missing: did not find init entry point in binary plugin - plugin={}, path={}, error={}",
                identifier,
                binary_path.to_string_lossy(),
                err
            );
            err
        })?;

        let record = self.initialize(
            identifier,
            Some(binary_path.to_path_buf()),
            Some(library),
            entry_points,
            api,
        );
        Ok(ZiPluginLoadOutcome::Loaded(record))
    }

    /// Register a plugin linked into the host binary. Returns the existing
    /// record when `name` is already loaded.
    pub fn register_static(&self, name: &str, init: ZiPluginInitFn) -> Arc<ZiPluginRecord> {
        let lock = self.load_lock(name);
        let record = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            match self.get(name) {
                Some(existing) => {
                    log::warn!(
                        "plugin.static.duplicate: plugin already loaded; keeping existing record - plugin={}, handle={}",
                        name,
                        existing.handle()
                    );
                    existing
                }
                None => {
                    log::info!("plugin.static.register: loading static binary module - plugin={}", name);
                    let entry_points = ZiPluginEntryPoints {
                        api: None,
                        init: ZiPluginInit::PerModule(init),
                    };
                    self.initialize(name, None, None, entry_points, &ZiHostApi::empty())
                }
            }
        };
        self.release_load_lock(name, lock);
        record
    }

    /// Number of identifiers with a load lock currently allocated.
    pub fn pending_load_locks(&self) -> usize {
        self.load_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn initialize(
        &self,
        identifier: &str,
        path: Option<PathBuf>,
        library: Option<Box<dyn ZiLibrary>>,
        entry_points: ZiPluginEntryPoints,
        api: &ZiHostApi,
    ) -> Arc<ZiPluginRecord> {
        entry_points.distribute_api(api);

        let handle = self.allocate_handle();
        let guest_init = entry_points.initialize(handle);

        let record = Arc::new(ZiPluginRecord {
            name: identifier.to_string(),
            path,
            handle,
            guest_init,
            _library: library,
        });
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identifier.to_string(), Arc::clone(&record));

        log::info!(
            "plugin.loaded: plugin initialized - plugin={}, handle={}, guest_registration={}",
            identifier,
            handle,
            record.has_guest_registration()
        );
        record
    }

    fn allocate_handle(&self) -> ZiPluginHandle {
        let raw = self.next_handle.fetch_add(1, Ordering::SeqCst);
        // The counter starts at 1; wrapping past u32::MAX plugins is not a
        // reachable state for a process.
        ZiPluginHandle::new(raw).unwrap_or_else(|| {
            log::error!("plugin.handle.exhausted: plugin handle counter wrapped");
            std::process::abort()
        })
    }

    fn load_lock(&self, identifier: &str) -> Arc<Mutex<()>> {
        let mut locks = self.load_locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            locks
                .entry(identifier.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    // Drops the map entry once no other thread holds or waits on `lock`.
    // Clones are only handed out under the map lock, so the count is stable
    // here.
    fn release_load_lock(&self, identifier: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.load_locks.lock().unwrap_or_else(PoisonError::into_inner);
        let in_map = locks
            .get(identifier)
            .map_or(false, |entry| Arc::ptr_eq(entry, &lock));
        if in_map && Arc::strong_count(&lock) == 2 {
            locks.remove(identifier);
        }
    }
}

impl fmt::Debug for ZiPluginLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZiPluginLoader")
            .field("plugins", &self.loaded_plugins())
            .field("next_handle", &self.next_handle.load(Ordering::SeqCst))
            .finish()
    }
}
