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


use std::sync::Arc;
use std::thread;

use zirt::binding::{method_key, ZiBindingRegistry};
use zirt::vm::{ZiForeignClassHooks, ZiVmRaw};

unsafe extern "C" fn play(_vm: *mut ZiVmRaw) {}
unsafe extern "C" fn play_v2(_vm: *mut ZiVmRaw) {}
unsafe extern "C" fn allocate(_vm: *mut ZiVmRaw) {}
unsafe extern "C" fn finalize(_data: *mut std::ffi::c_void) {}

#[test]
fn test_unbound_lookups_are_none() {
    let registry = ZiBindingRegistry::new();
    assert!(registry.lookup_method("audio", "Mixer", "play(_)").is_none());
    assert!(registry.lookup_class("audio", "Mixer").is_none());

    registry.register_method("audio.Mixer.play(_)", play);
    assert!(registry.lookup_method("audio", "Mixer", "play(_,_)").is_none());
    assert!(registry.lookup_method("audio", "mixer", "play(_)").is_none());
}

#[test]
fn test_method_roundtrip_and_overwrite() {
    let registry = ZiBindingRegistry::new();
    assert!(registry.register_method("audio.Mixer.play(_)", play).is_none());
    assert_eq!(
        registry.lookup_method("audio", "Mixer", "play(_)").map(|f| f as usize),
        Some(play as usize)
    );

    let previous = registry.register_method("audio.Mixer.play(_)", play_v2);
    assert_eq!(previous.map(|f| f as usize), Some(play as usize));
    assert_eq!(
        registry.lookup_method("audio", "Mixer", "play(_)").map(|f| f as usize),
        Some(play_v2 as usize)
    );
    assert_eq!(registry.method_count(), 1);
}

#[test]
fn test_class_hooks() {
    let registry = ZiBindingRegistry::new();
    let hooks = ZiForeignClassHooks::new(Some(allocate), Some(finalize));
    registry.register_class("audio.Sound", hooks);

    let found = registry.lookup_class("audio", "Sound").unwrap();
    assert_eq!(found, hooks);
    assert!(!found.is_empty());

    registry.register_class("audio.Sound", ZiForeignClassHooks::new(Some(allocate), None));
    assert!(registry.lookup_class("audio", "Sound").unwrap().finalize.is_none());
    assert_eq!(registry.class_count(), 1);
}

#[test]
fn test_module_paths_are_part_of_the_key() {
    let registry = ZiBindingRegistry::new();
    let module = "/game/wren_modules/physics.wren";
    registry.register_method(method_key(module, "World", "step(_)"), play);
    assert!(registry.lookup_method(module, "World", "step(_)").is_some());
    assert!(registry.lookup_method("physics", "World", "step(_)").is_none());
}

#[test]
fn test_concurrent_registration() {
    let registry = Arc::new(ZiBindingRegistry::new());
    let threads: Vec<_> = (0..8)
        .map(|t| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for i in 0..50 {
                    registry.register_method(method_key("m", "C", &format!("f{}_{}()", t, i)), play);
                }
            })
        })
        .collect();
    for handle in threads {
        handle.join().unwrap();
    }
    assert_eq!(registry.method_count(), 400);
    assert!(registry.lookup_method("m", "C", "f7_49()").is_some());
}
