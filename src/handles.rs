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

//! Per-VM handle table.
//!
//! Every plugin receives a process-unique handle when it is initialized.
//! Plugins use that handle as a key to park one opaque pointer per VM, e.g.
//! the state of a window or audio device owned by that VM.

use std::ffi::{c_int, c_void};
use std::fmt;
use std::num::NonZeroU32;
use std::ptr::{self, NonNull};

/// Identity token handed to a plugin initializer. Always >= 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZiPluginHandle(NonZeroU32);

impl ZiPluginHandle {
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(ZiPluginHandle)
    }

    /// Convert a handle received over the C ABI; zero and negatives are absent.
    pub fn from_c(raw: c_int) -> Option<Self> {
        u32::try_from(raw).ok().and_then(Self::new)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    pub fn as_c(self) -> c_int {
        c_int::try_from(self.0.get()).unwrap_or(c_int::MAX)
    }

    fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

impl fmt::Display for ZiPluginHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Host sidecar attached to every guest VM.
pub struct ZiVmUserData {
    is_main: bool,
    plugin_data: Vec<Option<NonNull<c_void>>>,
}

// The stored pointers are owned by plugins; the table only carries them.
unsafe impl Send for ZiVmUserData {}

impl ZiVmUserData {
    pub fn new(is_main: bool) -> Self {
        ZiVmUserData {
            is_main,
            plugin_data: Vec::new(),
        }
    }

    /// Whether this VM is the designated main instance.
    pub fn is_main(&self) -> bool {
        self.is_main
    }

    /// Park `value` for `handle`; a null pointer clears the slot.
    pub fn set_plugin_data(&mut self, handle: ZiPluginHandle, value: *mut c_void) {
        let index = handle.index();
        if self.plugin_data.len() <= index {
            self.plugin_data.resize(index + 1, None);
        }
        self.plugin_data[index] = NonNull::new(value);
    }

    /// The pointer parked for `handle`, or null.
    pub fn plugin_data(&self, handle: ZiPluginHandle) -> *mut c_void {
        self.plugin_data
            .get(handle.index())
            .copied()
            .flatten()
            .map_or(ptr::null_mut(), NonNull::as_ptr)
    }

    /// Number of slots currently allocated.
    pub fn capacity(&self) -> usize {
        self.plugin_data.len()
    }
}

impl fmt::Debug for ZiVmUserData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZiVmUserData")
            .field("is_main", &self.is_main)
            .field("slots", &self.plugin_data.len())
            .finish()
    }
}
