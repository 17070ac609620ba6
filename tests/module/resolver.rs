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


#[path = "../common/mock_vm.rs"]
mod mock_vm;

use std::path::PathBuf;
use std::sync::Arc;

use mock_vm::{write_file, CountingFs};
use proptest::prelude::*;
use zirt::module::fs::ZiOsFs;
use zirt::module::resolver::{is_relative_import, ZiModuleKind, ZiModuleResolver};
use zirt::module::ZI_NATIVE_EXTENSION;

fn resolver_for(roots: Vec<PathBuf>) -> ZiModuleResolver {
    ZiModuleResolver::new(roots, "wren", Arc::new(ZiOsFs))
}

#[test]
fn test_relative_import() {
    let resolver = resolver_for(vec![]);
    assert_eq!(resolver.resolve("/proj/main.wren", "./util"), "/proj/util.wren");
    assert_eq!(resolver.resolve("/proj/a/b.wren", "../c"), "/proj/c.wren");
}

#[test]
fn test_installed_package() {
    let dir = tempfile::tempdir().unwrap();
    let pkgs = dir.path().join("pkgs");
    let resolver = resolver_for(vec![pkgs.clone()]);

    assert_eq!(resolver.resolve("/proj/main.wren", "mathx"), "mathx");

    let source = write_file(&pkgs, "mathx.wren", b"print mathx");
    assert_eq!(
        resolver.resolve("/proj/main.wren", "mathx"),
        source.to_string_lossy()
    );
}

#[test]
fn test_roots_searched_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first");
    let second = dir.path().join("second");
    write_file(&second, "json.wren", b"");
    let resolver = resolver_for(vec![first.clone(), second.clone()]);
    assert_eq!(
        PathBuf::from(resolver.resolve("main", "json")),
        second.join("json.wren")
    );

    write_file(&first, "json.wren", b"");
    assert_eq!(
        PathBuf::from(resolver.resolve("main", "json")),
        first.join("json.wren")
    );
}

#[test]
fn test_reserved_modules_skip_filesystem() {
    let fs = CountingFs::new();
    let resolver = ZiModuleResolver::new(vec![PathBuf::from("/pkgs")], "wren", fs.clone());
    assert_eq!(resolver.resolve("/proj/main.wren", "random"), "random");
    assert_eq!(resolver.resolve("/proj/main.wren", "meta"), "meta");
    assert_eq!(resolver.classify("meta"), ZiModuleKind::Reserved);
    assert_eq!(fs.accesses(), 0);
}

#[test]
fn test_classify() {
    let dir = tempfile::tempdir().unwrap();
    let pkgs = dir.path().join("pkgs");
    let source = write_file(&pkgs, "ui/button.wren", b"");
    let resolver = resolver_for(vec![pkgs.clone()]);

    let identity = resolver.resolve("/proj/main.wren", "ui/button");
    assert_eq!(
        resolver.classify(&identity),
        ZiModuleKind::Package {
            name: "ui/button".to_string(),
            source: Some(source.clone()),
        }
    );
    assert_eq!(resolver.binding_module(&identity), "ui/button");
    assert_eq!(
        resolver.classify("/proj/util.wren"),
        ZiModuleKind::File(PathBuf::from("/proj/util.wren"))
    );
    assert_eq!(resolver.binding_module("/proj/util.wren"), "/proj/util.wren");
    assert_eq!(
        resolver.classify("../shared.wren"),
        ZiModuleKind::File(PathBuf::from("../shared.wren"))
    );
    assert_eq!(
        resolver.classify("physics"),
        ZiModuleKind::Package {
            name: "physics".to_string(),
            source: None,
        }
    );
}

#[test]
fn test_dot_prefixed_root_yields_package() {
    let fs = CountingFs::new();
    let resolver = ZiModuleResolver::new(vec![PathBuf::from("./wren_modules")], "wren", fs.clone());
    fs.add("./wren_modules/physics.wren");

    let identity = resolver.resolve("main.wren", "physics");
    assert_eq!(identity, "./wren_modules/physics.wren");
    assert_eq!(
        resolver.classify(&identity),
        ZiModuleKind::Package {
            name: "physics".to_string(),
            source: Some(PathBuf::from("./wren_modules/physics.wren")),
        }
    );
    assert_eq!(resolver.binding_module(&identity), "physics");
}

#[test]
fn test_relative_import_into_root_stays_file() {
    let dir = tempfile::tempdir().unwrap();
    let pkgs = dir.path().join("pkgs");
    let audio = write_file(&pkgs, "audio.wren", b"");
    let helper = write_file(&pkgs, "helper.wren", b"");
    let resolver = resolver_for(vec![pkgs.clone()]);

    let identity = resolver.resolve(&audio.to_string_lossy(), "./helper");
    assert_eq!(PathBuf::from(&identity), helper);
    assert_eq!(resolver.classify(&identity), ZiModuleKind::File(helper.clone()));

    // Once the same path is handed out for a package import it is a package.
    assert_eq!(resolver.resolve("/proj/main.wren", "helper"), identity);
    assert_eq!(
        resolver.classify(&identity),
        ZiModuleKind::Package {
            name: "helper".to_string(),
            source: Some(helper),
        }
    );
}

#[test]
fn test_clones_share_package_names() {
    let dir = tempfile::tempdir().unwrap();
    let pkgs = dir.path().join("pkgs");
    write_file(&pkgs, "json.wren", b"");
    let resolver = resolver_for(vec![pkgs]);
    let clone = resolver.clone();

    let identity = resolver.resolve("main", "json");
    assert_eq!(clone.package_name(&identity).as_deref(), Some("json"));
}

#[test]
fn test_binary_only_package() {
    let dir = tempfile::tempdir().unwrap();
    let pkgs = dir.path().join("pkgs");
    let binary = write_file(&pkgs, &format!("gpu.{}", ZI_NATIVE_EXTENSION), b"\x7fELF");
    let resolver = resolver_for(vec![pkgs]);
    assert_eq!(resolver.resolve("main", "gpu"), "gpu");
    assert_eq!(resolver.find_installed_binary("gpu"), Some(binary));
}

proptest! {
    #[test]
    fn prop_resolution_is_deterministic(
        dir in "/[a-z]{1,6}(/[a-z]{1,6}){0,3}",
        name in "(\\./|\\.\\./)?[a-z]{1,8}(/[a-z]{1,8}){0,2}",
    ) {
        let resolver = resolver_for(vec![PathBuf::from("/nonexistent-zirt-root")]);
        let importer = format!("{}/main.wren", dir);
        let first = resolver.resolve(&importer, &name);
        let second = resolver.resolve(&importer, &name);
        prop_assert_eq!(&first, &second);

        if is_relative_import(&name) {
            prop_assert!(first.ends_with(".wren"));
            prop_assert!(first.starts_with('/'));
            prop_assert!(!first.contains("/./"));
            prop_assert!(!first.contains("/../"));
        } else {
            prop_assert_eq!(first, name);
        }
    }
}
