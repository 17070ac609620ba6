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

//! Platform library loader: open a shared library, resolve symbols by name.
//! Closing happens when the `ZiLibrary` is dropped.

use std::ffi::c_void;
use std::fmt;
use std::path::Path;

use libloading::Library;

use crate::errors::{Result, ZiError};

/// An open shared library.
pub trait ZiLibrary: Send + Sync {
    /// Address of the exported symbol `name`, or `None` when absent.
    ///
    /// # Safety
    ///
    /// The caller must cast the address to the symbol's true type before use
    /// and must not use it after the library is dropped.
    unsafe fn symbol(&self, name: &str) -> Option<*const c_void>;
}

/// Opens shared libraries by path.
pub trait ZiLibraryLoader: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn ZiLibrary>>;
}

/// `ZiLibraryLoader` over the operating system's dynamic loader.
#[derive(Clone, Copy, Debug, Default)]
pub struct ZiSystemLibraryLoader;

impl ZiLibraryLoader for ZiSystemLibraryLoader {
    fn open(&self, path: &Path) -> Result<Box<dyn ZiLibrary>> {
        // Running a library's initializers is inherently unsafe; the plugin
        // contract makes that the plugin author's responsibility.
        let library = unsafe { Library::new(path) }.map_err(|err| {
            ZiError::plugin(path.to_string_lossy(), err.to_string())
        })?;
        log::debug!(
            "plugin.library.open: shared library opened - path={}",
            path.to_string_lossy()
        );
        Ok(Box::new(ZiSystemLibrary { library }))
    }
}

struct ZiSystemLibrary {
    library: Library,
}

impl ZiLibrary for ZiSystemLibrary {
    unsafe fn symbol(&self, name: &str) -> Option<*const c_void> {
        let symbol = self
            .library
            .get::<unsafe extern "C" fn()>(name.as_bytes())
            .ok()?;
        Some(*symbol as *const c_void)
    }
}

impl fmt::Debug for ZiSystemLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZiSystemLibrary").finish_non_exhaustive()
    }
}
