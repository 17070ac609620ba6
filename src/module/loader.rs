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


//! # Module Loader
//!
//! Produces the source text for a canonical module name and, for installed
//! packages, makes sure the package's native binary is loaded first so the
//! foreign methods the source declares are already bound when the guest
//! compiles it.

use std::path::Path;
use std::sync::Arc;

use crate::module::resolver::{binary_path_for, ZiModuleKind, ZiModuleResolver};
use crate::plugin::abi::ZiHostApi;
use crate::plugin::loader::ZiPluginLoadOutcome;
use crate::store::ZiProcessStore;
use crate::vm::ZiVmRaw;

pub struct ZiModuleLoader {
    resolver: ZiModuleResolver,
    store: Arc<ZiProcessStore>,
    api: Arc<ZiHostApi>,
}

impl ZiModuleLoader {
    pub fn new(resolver: ZiModuleResolver, store: Arc<ZiProcessStore>, api: Arc<ZiHostApi>) -> Self {
        ZiModuleLoader {
            resolver,
            store,
            api,
        }
    }

    pub fn resolver(&self) -> &ZiModuleResolver {
        &self.resolver
    }

    /// Source for `identity`, or `None` so the guest reports the module as
    /// not found.
    pub fn load(&self, vm: *mut ZiVmRaw, identity: &str) -> Option<String> {
        match self.resolver.classify(identity) {
            ZiModuleKind::Reserved => None,
            ZiModuleKind::File(path) => self.read_source(&path),
            ZiModuleKind::Package { name, source } => {
                let binary = match &source {
                    Some(source) => Some(binary_path_for(source)),
                    None => self.resolver.find_installed_binary(&name),
                };
                if let Some(binary) = binary {
                    if self.resolver.fs().exists(&binary) {
                        self.load_plugin(vm, &name, &binary);
                    }
                }
                source.and_then(|path| self.read_source(&path))
            }
        }
    }

    fn load_plugin(&self, vm: *mut ZiVmRaw, name: &str, binary: &Path) {
        match self.store.plugins().load(vm, name, binary, &self.api) {
            Ok(ZiPluginLoadOutcome::Missing) => log::debug!(
                "module.plugin.missing: no native binary on disk - module={}, path={}",
                name,
                binary.display()
            ),
            Ok(outcome) => {
                if let Some(record) = outcome.record() {
                    log::debug!(
                        "module.plugin.ready: native binary available - module={}, handle={}",
                        name,
                        record.handle()
                    );
                }
            }
            // Already logged by the plugin loader; the source still loads.
            Err(err) => log::warn!(
                "module.plugin.skipped: continuing without native binary - module={}, error={}",
                name,
                err
            ),
        }
    }

    fn read_source(&self, path: &Path) -> Option<String> {
        let fs = self.resolver.fs();
        if !fs.exists(path) {
            return None;
        }
        match fs.read_to_string(path) {
            Ok(source) => Some(source),
            Err(err) => {
                log::warn!(
                    "module.read_failed: could not read module source - path={}, error={}",
                    path.display(),
                    err
                );
                None
            }
        }
    }
}
