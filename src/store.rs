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


//! Process-scoped state shared by every VM instance: the foreign-binding
//! registry and the plugin registry with its handle counter. One store is
//! meant to exist per process; it is passed around explicitly.

use std::sync::Arc;

use crate::binding::ZiBindingRegistry;
use crate::plugin::library::{ZiLibraryLoader, ZiSystemLibraryLoader};
use crate::plugin::loader::ZiPluginLoader;

#[derive(Debug)]
pub struct ZiProcessStore {
    bindings: ZiBindingRegistry,
    plugins: ZiPluginLoader,
}

impl ZiProcessStore {
    /// Store whose plugins are opened by the operating system loader.
    pub fn new() -> Self {
        Self::with_library_loader(Arc::new(ZiSystemLibraryLoader))
    }

    pub fn with_library_loader(library_loader: Arc<dyn ZiLibraryLoader>) -> Self {
        ZiProcessStore {
            bindings: ZiBindingRegistry::new(),
            plugins: ZiPluginLoader::new(library_loader),
        }
    }

    pub fn bindings(&self) -> &ZiBindingRegistry {
        &self.bindings
    }

    pub fn plugins(&self) -> &ZiPluginLoader {
        &self.plugins
    }
}

impl Default for ZiProcessStore {
    fn default() -> Self {
        Self::new()
    }
}
