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


//! # VM Factory
//!
//! `ZiRuntime` owns everything a host process needs to run guest code: the
//! process store, the host API table, the update scheduler and the VMs it
//! keeps alive on behalf of plugins. Every VM it creates is wired to
//! `ZiHostHooks`, which routes guest output to stdout, guest errors to the log,
//! imports through the module resolver and loader, and foreign binding
//! through the binding registry.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let runtime = Arc::new(ZiRuntime::new(ZiRuntimeConfig::default(), engine)?);
//! runtime.install_abi();
//! runtime.run_main(None)?;
//! ```

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::ZiRuntimeConfig;
use crate::errors::{Result, ZiError};
use crate::handles::ZiVmUserData;
use crate::log::ZiLogger;
use crate::module::fs::{ZiOsFs, ZiSourceFs};
use crate::module::loader::ZiModuleLoader;
use crate::module::resolver::ZiModuleResolver;
use crate::module::is_reserved_module;
use crate::plugin::abi::{self, ZiAbiHost, ZiHostApi};
use crate::plugin::loader::ZiPluginRecord;
use crate::scheduler::ZiUpdateScheduler;
use crate::store::ZiProcessStore;
use crate::vm::{
    ZiForeignClassHooks, ZiForeignMethodFn, ZiGuestErrorKind, ZiGuestVm, ZiInterpretResult,
    ZiPluginInitFn, ZiVmEngine, ZiVmHooks, ZiVmRaw,
};

/// Host side of every VM created by a `ZiRuntime`.
pub struct ZiHostHooks {
    modules: ZiModuleLoader,
    store: Arc<ZiProcessStore>,
}

impl ZiHostHooks {
    pub fn new(modules: ZiModuleLoader, store: Arc<ZiProcessStore>) -> Self {
        ZiHostHooks { modules, store }
    }

    pub fn modules(&self) -> &ZiModuleLoader {
        &self.modules
    }
}

impl ZiVmHooks for ZiHostHooks {
    fn write(&self, _vm: *mut ZiVmRaw, text: &str) {
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }

    fn error(
        &self,
        _vm: *mut ZiVmRaw,
        kind: ZiGuestErrorKind,
        module: Option<&str>,
        line: i32,
        message: &str,
    ) {
        let module = module.unwrap_or("<unknown>");
        match kind {
            ZiGuestErrorKind::Compile => log::error!(
                "guest.error.compile: {} - module={}, line={}",
                message,
                module,
                line
            ),
            ZiGuestErrorKind::Runtime => log::error!("guest.error.runtime: {}", message),
            ZiGuestErrorKind::StackTrace => log::error!(
                "guest.error.stack: in {} - module={}, line={}",
                message,
                module,
                line
            ),
        }
    }

    fn resolve_module(&self, _vm: *mut ZiVmRaw, importer: &str, name: &str) -> String {
        if is_reserved_module(name) {
            return name.to_string();
        }
        let resolved = self.modules.resolver().resolve(importer, name);
        log::debug!(
            "module.resolve: import resolved - importer={}, name={}, resolved={}",
            importer,
            name,
            resolved
        );
        resolved
    }

    fn load_module(&self, vm: *mut ZiVmRaw, name: &str) -> Option<String> {
        self.modules.load(vm, name)
    }

    fn bind_foreign_method(
        &self,
        _vm: *mut ZiVmRaw,
        module: &str,
        class_name: &str,
        _is_static: bool,
        signature: &str,
    ) -> Option<ZiForeignMethodFn> {
        // Plugins bind installed packages under their bare name, not the path
        // the guest knows the module by.
        let module = self.modules.resolver().binding_module(module);
        self.store.bindings().lookup_method(&module, class_name, signature)
    }

    fn bind_foreign_class(
        &self,
        _vm: *mut ZiVmRaw,
        module: &str,
        class_name: &str,
    ) -> ZiForeignClassHooks {
        let module = self.modules.resolver().binding_module(module);
        self.store
            .bindings()
            .lookup_class(&module, class_name)
            .unwrap_or_default()
    }
}

/// A configured host process for guest VMs.
pub struct ZiRuntime {
    config: ZiRuntimeConfig,
    engine: Arc<dyn ZiVmEngine>,
    store: Arc<ZiProcessStore>,
    api: Arc<ZiHostApi>,
    hooks: Arc<ZiHostHooks>,
    scheduler: ZiUpdateScheduler,
    workers: Mutex<Vec<Box<dyn ZiGuestVm>>>,
}

impl ZiRuntime {
    /// Runtime over the real filesystem and the system library loader.
    pub fn new(config: ZiRuntimeConfig, engine: Arc<dyn ZiVmEngine>) -> Result<Self> {
        Self::with_parts(config, engine, Arc::new(ZiProcessStore::new()), Arc::new(ZiOsFs))
    }

    /// Runtime over an explicit store and source filesystem.
    pub fn with_parts(
        config: ZiRuntimeConfig,
        engine: Arc<dyn ZiVmEngine>,
        store: Arc<ZiProcessStore>,
        fs: Arc<dyn ZiSourceFs>,
    ) -> Result<Self> {
        config.validate()?;
        ZiLogger::init(&config.log);

        let api = Arc::new(ZiHostApi::new(engine.api_entries()));
        let resolver = ZiModuleResolver::new(
            config.module_roots.clone(),
            config.source_extension.clone(),
            fs,
        );
        let modules = ZiModuleLoader::new(resolver, Arc::clone(&store), Arc::clone(&api));
        let hooks = Arc::new(ZiHostHooks::new(modules, Arc::clone(&store)));

        log::info!(
            "runtime.new: runtime created - roots={}, extension={}, api_entries={}",
            config.module_roots.len(),
            config.source_extension,
            api.entries().len()
        );

        Ok(ZiRuntime {
            scheduler: ZiUpdateScheduler::with_starvation_warning(config.starvation_warn_ticks),
            config,
            engine,
            store,
            api,
            hooks,
            workers: Mutex::new(Vec::new()),
        })
    }

    pub fn config(&self) -> &ZiRuntimeConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<ZiProcessStore> {
        &self.store
    }

    pub fn api(&self) -> &ZiHostApi {
        &self.api
    }

    pub fn hooks(&self) -> &Arc<ZiHostHooks> {
        &self.hooks
    }

    pub fn scheduler(&self) -> &ZiUpdateScheduler {
        &self.scheduler
    }

    /// Create a VM wired to the host hooks.
    pub fn new_vm(&self, is_main: bool) -> Box<dyn ZiGuestVm> {
        let hooks: Arc<dyn ZiVmHooks> = self.hooks.clone();
        let vm = self.engine.create_vm(hooks, ZiVmUserData::new(is_main));
        log::debug!("runtime.vm.new: guest VM created - is_main={}", is_main);
        vm
    }

    /// Interpret the entry script, then drain the update scheduler until no
    /// callback remains. `None` runs the configured `main_script`.
    pub fn run_main(&self, path: Option<&Path>) -> Result<u64> {
        let path = path.unwrap_or(self.config.main_script.as_path());
        let module = path.to_string_lossy().into_owned();
        let source = fs::read_to_string(path).map_err(|err| {
            log::error!(
                "runtime.main.unreadable: could not open entry script - path={}, error={}",
                module,
                err
            );
            ZiError::Io(format!("{}: {}", module, err))
        })?;

        let mut vm = self.new_vm(true);
        log::info!("runtime.main.start: interpreting entry script - path={}", module);
        match vm.interpret(&module, &source) {
            ZiInterpretResult::Success => {}
            ZiInterpretResult::CompileError => {
                return Err(ZiError::module(module, "compile error"));
            }
            ZiInterpretResult::RuntimeError => {
                return Err(ZiError::module(module, "runtime error"));
            }
        }

        let passes = self.scheduler.run_until_empty(vm.as_mut());
        log::info!("runtime.main.done: entry script finished - path={}, passes={}", module, passes);
        Ok(passes)
    }

    /// Create a VM kept alive by the runtime and return its raw handle.
    pub fn spawn_worker_vm(&self) -> *mut ZiVmRaw {
        self.spawn_vm_raw(false)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn spawn_vm_raw(&self, is_main: bool) -> *mut ZiVmRaw {
        let mut vm = self.new_vm(is_main);
        let raw = vm.as_raw();
        self.workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(vm);
        raw
    }

    /// Register a plugin linked into the host binary.
    pub fn register_static_plugin(&self, name: &str, init: ZiPluginInitFn) -> Arc<ZiPluginRecord> {
        self.store.plugins().register_static(name, init)
    }

    /// Make this runtime the target of the host C API. The first installed
    /// runtime wins.
    pub fn install_abi(self: &Arc<Self>) -> bool {
        let host: Arc<dyn ZiAbiHost> = self.clone();
        abi::install(host)
    }
}

impl ZiAbiHost for ZiRuntime {
    fn store(&self) -> &ZiProcessStore {
        &self.store
    }

    fn scheduler(&self) -> &ZiUpdateScheduler {
        &self.scheduler
    }

    fn engine(&self) -> &dyn ZiVmEngine {
        self.engine.as_ref()
    }

    fn spawn_vm(&self, is_main: bool) -> *mut ZiVmRaw {
        self.spawn_vm_raw(is_main)
    }
}

impl fmt::Debug for ZiRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZiRuntime")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("scheduler", &self.scheduler)
            .field("workers", &self.worker_count())
            .finish()
    }
}
