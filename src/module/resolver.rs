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

//! # Module Resolver
//!
//! Turns an import name plus the importing module's name into the canonical
//! module name the guest VM caches modules under.
//!
//! - `./x`, `../x`: relative to the importer's directory, with the source
//!   extension appended
//! - `x`: the first `<root>/x.<ext>` that exists among the installed roots,
//!   otherwise `x` unchanged so the load step reports it
//! - `random`, `meta`: passed through untouched
//!
//! A canonical name is a package only when the installed-root search produced
//! it. The resolver remembers those names, so a relative import that happens
//! to land inside a root stays a plain file unless the same path was already
//! handed out for a package import.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use crate::module::fs::ZiSourceFs;
use crate::module::{is_reserved_module, ZI_NATIVE_EXTENSION};

/// What a canonical module name refers to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ZiModuleKind {
    /// Handled by the guest VM itself.
    Reserved,
    /// A plain source file addressed by path.
    File(PathBuf),
    /// An installed package, possibly backed by a native binary.
    Package {
        name: String,
        source: Option<PathBuf>,
    },
}

/// True when `name` carries the relative-path marker.
pub fn is_relative_import(name: &str) -> bool {
    name.starts_with('.')
}

/// Join `name` onto the directory of `importer`, fold `.`/`..` lexically and
/// append `.{extension}`.
pub fn resolve_relative(importer: &str, name: &str, extension: &str) -> String {
    let base = Path::new(importer).parent().unwrap_or_else(|| Path::new(""));
    let joined = normalize_join(base, Path::new(name));
    format!("{}.{}", joined.to_string_lossy(), extension)
}

fn normalize_join(base: &Path, name: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in base.components().chain(name.components()) {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    parts.iter().collect()
}

/// Resolves import names against the installed module roots.
#[derive(Clone)]
pub struct ZiModuleResolver {
    roots: Vec<PathBuf>,
    extension: String,
    fs: Arc<dyn ZiSourceFs>,
    // canonical name -> package name, shared between clones
    packages: Arc<RwLock<HashMap<String, String>>>,
}

impl ZiModuleResolver {
    pub fn new(roots: Vec<PathBuf>, extension: impl Into<String>, fs: Arc<dyn ZiSourceFs>) -> Self {
        ZiModuleResolver {
            roots,
            extension: extension.into(),
            fs,
            packages: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn fs(&self) -> &Arc<dyn ZiSourceFs> {
        &self.fs
    }

    /// Canonical name for `name` imported from `importer`.
    pub fn resolve(&self, importer: &str, name: &str) -> String {
        if is_reserved_module(name) {
            return name.to_string();
        }
        if is_relative_import(name) {
            return resolve_relative(importer, name, &self.extension);
        }
        match self.find_installed(name) {
            Some(path) => {
                let identity = path.to_string_lossy().into_owned();
                self.packages
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(identity.clone(), name.to_string());
                identity
            }
            None => name.to_string(),
        }
    }

    /// Package name behind a canonical name that `resolve` produced from the
    /// installed-root search.
    pub fn package_name(&self, identity: &str) -> Option<String> {
        self.packages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identity)
            .cloned()
    }

    /// Name bindings for `module` are registered under: the bare package name
    /// for installed packages, the module name itself otherwise.
    pub fn binding_module(&self, module: &str) -> String {
        match self.package_name(module) {
            Some(name) => name,
            None => module.to_string(),
        }
    }

    /// First existing `<root>/<name>.<ext>`.
    pub fn find_installed(&self, name: &str) -> Option<PathBuf> {
        let file = format!("{}.{}", name, self.extension);
        self.roots
            .iter()
            .map(|root| root.join(&file))
            .find(|candidate| self.fs.exists(candidate))
    }

    /// First existing `<root>/<name>.<native ext>`, for packages that ship
    /// only a binary.
    pub fn find_installed_binary(&self, name: &str) -> Option<PathBuf> {
        let file = format!("{}.{}", name, ZI_NATIVE_EXTENSION);
        self.roots
            .iter()
            .map(|root| root.join(&file))
            .find(|candidate| self.fs.exists(candidate))
    }

    /// Classify a canonical module name produced by `resolve`.
    pub fn classify(&self, identity: &str) -> ZiModuleKind {
        if is_reserved_module(identity) {
            return ZiModuleKind::Reserved;
        }
        if let Some(name) = self.package_name(identity) {
            return ZiModuleKind::Package {
                name,
                source: Some(PathBuf::from(identity)),
            };
        }

        let path = Path::new(identity);
        let is_source = path
            .extension()
            .map_or(false, |ext| ext == self.extension.as_str());
        if is_relative_import(identity) || is_source || path.is_absolute() {
            return ZiModuleKind::File(path.to_path_buf());
        }

        // A bare name: no source was installed when it was resolved.
        ZiModuleKind::Package {
            name: identity.to_string(),
            source: self.find_installed(identity),
        }
    }
}

/// The native binary that sits next to `source`.
pub fn binary_path_for(source: &Path) -> PathBuf {
    source.with_extension(ZI_NATIVE_EXTENSION)
}
