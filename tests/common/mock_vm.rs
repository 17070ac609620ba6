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


//! Test doubles shared by the integration tests: a line-based mock guest VM
//! engine, a fake library loader and a counting source filesystem.
//!
//! The mock VM understands one statement per line:
//!
//! - `import "name"`: resolve and load a module, then run it
//! - `call module.Class.signature`: invoke a bound foreign method
//! - `class module.Class`: require a bound foreign class
//! - `print text`: write `text` and a newline through the host
//! - anything else is a compile error

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::ffi::c_void;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use zirt::errors::{Result, ZiError};
use zirt::handles::ZiVmUserData;
use zirt::module::fs::{ZiOsFs, ZiSourceFs};
use zirt::plugin::library::{ZiLibrary, ZiLibraryLoader};
use zirt::vm::{
    ZiApiEntry, ZiGuestErrorKind, ZiGuestVm, ZiInterpretResult, ZiVmEngine, ZiVmHooks, ZiVmRaw,
};

pub struct MockVm {
    hooks: Arc<dyn ZiVmHooks>,
    user_data: ZiVmUserData,
    slot0: bool,
    loaded: HashSet<String>,
    pub imports: Vec<String>,
    pub errors: Vec<String>,
}

impl MockVm {
    fn raw(&mut self) -> *mut ZiVmRaw {
        self as *mut MockVm as *mut ZiVmRaw
    }

    fn run_line(&mut self, module: &str, line: &str) -> ZiInterpretResult {
        let raw = self.raw();
        let hooks = Arc::clone(&self.hooks);

        if let Some(rest) = line.strip_prefix("import ") {
            let name = rest.trim().trim_matches('"');
            let resolved = hooks.resolve_module(raw, module, name);
            self.imports.push(resolved.clone());
            if !self.loaded.insert(resolved.clone()) {
                return ZiInterpretResult::Success;
            }
            return match hooks.load_module(raw, &resolved) {
                Some(source) => self.interpret(&resolved, &source),
                None => self.fail(
                    ZiGuestErrorKind::Runtime,
                    module,
                    format!("Could not load module '{}'.", name),
                ),
            };
        }

        if let Some(rest) = line.strip_prefix("call ") {
            let Some((target, class_name, signature)) = split_key(rest.trim()) else {
                return ZiInterpretResult::CompileError;
            };
            return match hooks.bind_foreign_method(raw, target, class_name, false, signature) {
                Some(method) => {
                    unsafe { method(raw) };
                    ZiInterpretResult::Success
                }
                None => self.fail(
                    ZiGuestErrorKind::Runtime,
                    module,
                    format!("Could not find foreign method '{}'.", rest.trim()),
                ),
            };
        }

        if let Some(rest) = line.strip_prefix("class ") {
            let Some((target, class_name)) = rest.trim().rsplit_once('.') else {
                return ZiInterpretResult::CompileError;
            };
            if hooks.bind_foreign_class(raw, target, class_name).is_empty() {
                return self.fail(
                    ZiGuestErrorKind::Runtime,
                    module,
                    format!("Could not find foreign class '{}'.", rest.trim()),
                );
            }
            return ZiInterpretResult::Success;
        }

        if let Some(text) = line.strip_prefix("print ") {
            hooks.write(raw, &format!("{}\n", text));
            return ZiInterpretResult::Success;
        }

        hooks.error(raw, ZiGuestErrorKind::Compile, Some(module), 1, "Unexpected statement.");
        self.errors.push(line.to_string());
        ZiInterpretResult::CompileError
    }

    fn fail(&mut self, kind: ZiGuestErrorKind, module: &str, message: String) -> ZiInterpretResult {
        let raw = self.raw();
        self.hooks.error(raw, kind, Some(module), 1, &message);
        self.errors.push(message);
        ZiInterpretResult::RuntimeError
    }
}

fn split_key(key: &str) -> Option<(&str, &str, &str)> {
    let (rest, signature) = key.rsplit_once('.')?;
    let (module, class_name) = rest.rsplit_once('.')?;
    Some((module, class_name, signature))
}

impl ZiGuestVm for MockVm {
    fn interpret(&mut self, module: &str, source: &str) -> ZiInterpretResult {
        self.loaded.insert(module.to_string());
        for line in source.lines().map(str::trim).filter(|line| !line.is_empty()) {
            let result = self.run_line(module, line);
            if result != ZiInterpretResult::Success {
                return result;
            }
        }
        ZiInterpretResult::Success
    }

    fn get_slot_bool(&self, slot: usize) -> bool {
        slot == 0 && self.slot0
    }

    fn user_data(&self) -> &ZiVmUserData {
        &self.user_data
    }

    fn user_data_mut(&mut self) -> &mut ZiVmUserData {
        &mut self.user_data
    }

    fn as_raw(&mut self) -> *mut ZiVmRaw {
        self.raw()
    }
}

/// Write `value` to slot 0 of the mock VM behind `vm`.
///
/// # Safety
///
/// `vm` must come from `MockVm::as_raw` on a live VM.
pub unsafe fn set_slot_bool(vm: *mut ZiVmRaw, value: bool) {
    if let Some(vm) = (vm as *mut MockVm).as_mut() {
        vm.slot0 = value;
    }
}

unsafe extern "C" fn mock_set_slot_bool(vm: *mut ZiVmRaw) {
    set_slot_bool(vm, true);
}

/// Hooks that bind nothing and load nothing.
pub struct NullHooks;

impl ZiVmHooks for NullHooks {
    fn write(&self, _vm: *mut ZiVmRaw, _text: &str) {}

    fn error(
        &self,
        _vm: *mut ZiVmRaw,
        _kind: ZiGuestErrorKind,
        _module: Option<&str>,
        _line: i32,
        _message: &str,
    ) {
    }

    fn resolve_module(&self, _vm: *mut ZiVmRaw, _importer: &str, name: &str) -> String {
        name.to_string()
    }

    fn load_module(&self, _vm: *mut ZiVmRaw, _name: &str) -> Option<String> {
        None
    }

    fn bind_foreign_method(
        &self,
        _vm: *mut ZiVmRaw,
        _module: &str,
        _class_name: &str,
        _is_static: bool,
        _signature: &str,
    ) -> Option<zirt::vm::ZiForeignMethodFn> {
        None
    }

    fn bind_foreign_class(
        &self,
        _vm: *mut ZiVmRaw,
        _module: &str,
        _class_name: &str,
    ) -> zirt::vm::ZiForeignClassHooks {
        zirt::vm::ZiForeignClassHooks::default()
    }
}

/// A standalone mock VM wired to `NullHooks`.
pub fn standalone_vm(is_main: bool) -> Box<dyn ZiGuestVm> {
    MockEngine::default().create_vm(Arc::new(NullHooks), ZiVmUserData::new(is_main))
}

#[derive(Default)]
pub struct MockEngine {
    created: AtomicUsize,
}

impl MockEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(MockEngine::default())
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl ZiVmEngine for MockEngine {
    fn create_vm(&self, hooks: Arc<dyn ZiVmHooks>, user_data: ZiVmUserData) -> Box<dyn ZiGuestVm> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Box::new(MockVm {
            hooks,
            user_data,
            slot0: false,
            loaded: HashSet::new(),
            imports: Vec::new(),
            errors: Vec::new(),
        })
    }

    fn api_entries(&self) -> Vec<ZiApiEntry> {
        vec![ZiApiEntry::new(c"mock_set_slot_bool", mock_set_slot_bool as *const c_void)]
    }

    unsafe fn user_data_from_raw<'a>(&self, vm: *mut ZiVmRaw) -> Option<&'a mut ZiVmUserData> {
        (vm as *mut MockVm).as_mut().map(|vm| &mut vm.user_data)
    }
}

/// Library loader serving symbol tables from memory. Paths must still exist
/// on disk because the plugin loader checks for the binary first.
#[derive(Default)]
pub struct FakeLibraryLoader {
    symbols: HashMap<String, usize>,
    opens: AtomicUsize,
    reject: bool,
}

impl FakeLibraryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader whose `open` always fails.
    pub fn rejecting() -> Self {
        FakeLibraryLoader {
            reject: true,
            ..Self::default()
        }
    }

    pub fn with_symbol(mut self, name: &str, func: *const c_void) -> Self {
        self.symbols.insert(name.to_string(), func as usize);
        self
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl ZiLibraryLoader for FakeLibraryLoader {
    fn open(&self, path: &Path) -> Result<Box<dyn ZiLibrary>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.reject {
            return Err(ZiError::plugin(path.to_string_lossy(), "invalid ELF header"));
        }
        Ok(Box::new(FakeLibrary {
            symbols: self.symbols.clone(),
        }))
    }
}

struct FakeLibrary {
    symbols: HashMap<String, usize>,
}

impl ZiLibrary for FakeLibrary {
    unsafe fn symbol(&self, name: &str) -> Option<*const c_void> {
        self.symbols.get(name).map(|addr| *addr as *const c_void)
    }
}

/// Real filesystem access that records every path it is asked about. Files
/// added with `add` exist only in memory and shadow the disk.
#[derive(Default)]
pub struct CountingFs {
    seen: Mutex<Vec<PathBuf>>,
    virtual_files: Mutex<HashMap<PathBuf, String>>,
}

impl CountingFs {
    pub fn new() -> Arc<Self> {
        Arc::new(CountingFs::default())
    }

    pub fn accesses(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn seen(&self) -> Vec<PathBuf> {
        self.seen.lock().unwrap().clone()
    }

    pub fn add(&self, path: impl Into<PathBuf>) {
        self.add_source(path, "");
    }

    pub fn add_source(&self, path: impl Into<PathBuf>, contents: &str) {
        self.virtual_files
            .lock()
            .unwrap()
            .insert(path.into(), contents.to_string());
    }
}

impl ZiSourceFs for CountingFs {
    fn exists(&self, path: &Path) -> bool {
        self.seen.lock().unwrap().push(path.to_path_buf());
        self.virtual_files.lock().unwrap().contains_key(path) || ZiOsFs.exists(path)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.seen.lock().unwrap().push(path.to_path_buf());
        if let Some(contents) = self.virtual_files.lock().unwrap().get(path) {
            return Ok(contents.clone());
        }
        ZiOsFs.read_to_string(path)
    }
}

/// Write `contents` to `dir/name`, creating parent directories.
pub fn write_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, contents).unwrap();
    path
}
