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

//! # Foreign Binding Registry
//!
//! Maps fully-qualified guest names to native code:
//!
//! - methods: `module.Class.signature` → `ZiForeignMethodFn`
//! - classes: `module.Class` → `ZiForeignClassHooks`
//!
//! Registration always succeeds and the last registration wins. Lookups are
//! pure reads; an unbound key is `None`, which the guest VM reports as a
//! missing foreign method.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::module::is_reserved_module;
use crate::vm::{ZiForeignClassHooks, ZiForeignMethodFn};

/// Key of a method binding.
pub fn method_key(module: &str, class_name: &str, signature: &str) -> String {
    format!("{}.{}.{}", module, class_name, signature)
}

/// Key of a class binding.
pub fn class_key(module: &str, class_name: &str) -> String {
    format!("{}.{}", module, class_name)
}

/// Process-wide method and class bindings.
#[derive(Debug, Default)]
pub struct ZiBindingRegistry {
    methods: RwLock<HashMap<String, ZiForeignMethodFn>>,
    classes: RwLock<HashMap<String, ZiForeignClassHooks>>,
}

impl ZiBindingRegistry {
    pub fn new() -> Self {
        ZiBindingRegistry {
            methods: RwLock::new(HashMap::new()),
            classes: RwLock::new(HashMap::new()),
        }
    }

    /// Bind `key` to `func`, returning the previous binding if any.
    pub fn register_method(
        &self,
        key: impl Into<String>,
        func: ZiForeignMethodFn,
    ) -> Option<ZiForeignMethodFn> {
        let key = key.into();
        let mut methods = self.methods.write().unwrap_or_else(PoisonError::into_inner);
        let previous = methods.insert(key.clone(), func);
        if let Some(prev) = previous {
            if prev as usize != func as usize {
                log::warn!(
                    "binding.method.overwrite: foreign method rebound to a different function - key={}",
                    key
                );
            }
        }
        previous
    }

    /// Bind `key` to `hooks`, returning the previous hooks if any.
    pub fn register_class(
        &self,
        key: impl Into<String>,
        hooks: ZiForeignClassHooks,
    ) -> Option<ZiForeignClassHooks> {
        let key = key.into();
        let mut classes = self.classes.write().unwrap_or_else(PoisonError::into_inner);
        let previous = classes.insert(key.clone(), hooks);
        if matches!(previous, Some(prev) if prev != hooks) {
            log::warn!(
                "binding.class.overwrite: foreign class rebound to different hooks - key={}",
                key
            );
        }
        previous
    }

    pub fn lookup_method(
        &self,
        module: &str,
        class_name: &str,
        signature: &str,
    ) -> Option<ZiForeignMethodFn> {
        if is_reserved_module(module) {
            return None;
        }
        let key = method_key(module, class_name, signature);
        self.methods
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .copied()
    }

    pub fn lookup_class(&self, module: &str, class_name: &str) -> Option<ZiForeignClassHooks> {
        if is_reserved_module(module) {
            return None;
        }
        let key = class_key(module, class_name);
        self.classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .copied()
    }

    pub fn method_count(&self) -> usize {
        self.methods.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn class_count(&self) -> usize {
        self.classes.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}
