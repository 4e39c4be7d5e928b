//! End-to-end tests for the create and update workflows

mod common;

use bale_pm::commands::{create_package, update_packages, CreateOptions, UpdateOptions};
use bale_pm::{BuildSpec, InstallError, UpdateSpec};
use common::{write_tree, DirTransport};
use std::fs;
use tempfile::TempDir;

fn write_spec(dir: &std::path::Path, file: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(file);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_create_then_update() {
    let remote = TempDir::new().unwrap();
    let transport = DirTransport::new(remote.path());

    // Publish libbar 2.1 and libfoo 1.0 which depends on it.
    let bar_src = TempDir::new().unwrap();
    write_tree(bar_src.path(), &[("lib/libbar.so", "bar")]);
    let bar_spec = write_spec(
        bar_src.path(),
        "bale.yaml",
        "name: libbar\nver: \"2.1\"\ntargets:\n  - \"lib/*\"\n",
    );
    let bar = create_package(
        &BuildSpec::from_file(&bar_spec).unwrap(),
        &CreateOptions {
            working_dir: Some(bar_src.path().to_path_buf()),
            output: None,
            remote_dir: "store".to_string(),
        },
        Some(&transport),
    )
    .unwrap();
    assert_eq!(bar.remote_path.as_deref(), Some("store/libbar-2.1.tar.gz"));

    let foo_src = TempDir::new().unwrap();
    write_tree(
        foo_src.path(),
        &[("bin/foo", "foo"), ("bin/foo_test", "test")],
    );
    let foo_spec = write_spec(
        foo_src.path(),
        "bale.json",
        r#"{
            "name": "libfoo",
            "ver": "1.0",
            "targets": [{"path": "bin/*", "exclude": "*_test"}],
            "packets": [{"name": "libbar", "ver": ">=2.0"}]
        }"#,
    );
    let foo = create_package(
        &BuildSpec::from_file(&foo_spec).unwrap(),
        &CreateOptions {
            working_dir: Some(foo_src.path().to_path_buf()),
            output: None,
            remote_dir: "store".to_string(),
        },
        Some(&transport),
    )
    .unwrap();
    assert_eq!(foo.manifest.files, vec!["bin/foo"]);
    assert!(remote.path().join("store/libfoo-1.0.tar.gz").is_file());

    // Install libfoo into a fresh directory.
    let consumer = TempDir::new().unwrap();
    let update_spec = write_spec(consumer.path(), "update.toml", "[[packages]]\nname = \"libfoo\"\n");
    let local_dir = consumer.path().join("vendor");
    let results = update_packages(
        &UpdateSpec::from_file(&update_spec).unwrap(),
        &UpdateOptions {
            remote_dir: "store".to_string(),
            local_dir: local_dir.clone(),
            ..UpdateOptions::default()
        },
        &transport,
    )
    .unwrap();

    assert_eq!(common::names(&results), vec!["libfoo@1.0", "libbar@2.1"]);
    assert_eq!(fs::read_to_string(local_dir.join("bin/foo")).unwrap(), "foo");
    assert_eq!(fs::read_to_string(local_dir.join("lib/libbar.so")).unwrap(), "bar");
    assert!(!local_dir.join("bin/foo_test").exists());
    assert!(local_dir.join("manifest-libfoo-1.0.json").is_file());
    assert!(local_dir.join("manifest-libbar-2.1.json").is_file());
    assert_eq!(
        transport.commands.borrow().last().map(String::as_str),
        Some("ls -1 store")
    );
}

#[test]
fn test_create_without_transport() {
    let work = TempDir::new().unwrap();
    write_tree(work.path(), &[("a.txt", "a")]);
    let spec = BuildSpec::from_file(&write_spec(
        work.path(),
        "bale.yml",
        "name: solo\nver: \"0.1\"\ntargets: [\"*.txt\"]\n",
    ))
    .unwrap();

    let outcome = create_package(
        &spec,
        &CreateOptions {
            working_dir: Some(work.path().to_path_buf()),
            ..CreateOptions::default()
        },
        None,
    )
    .unwrap();

    assert_eq!(outcome.archive_path, work.path().join("solo-0.1.tar.gz"));
    assert!(outcome.remote_path.is_none());
    assert_eq!(outcome.manifest.files, vec!["a.txt"]);
}

#[test]
fn test_update_unknown_package() {
    let remote = TempDir::new().unwrap();
    let transport = DirTransport::new(remote.path());
    let local = TempDir::new().unwrap();

    let spec: UpdateSpec = serde_json::from_str(r#"{"packages": [{"name": "nope"}]}"#).unwrap();
    let err = update_packages(
        &spec,
        &UpdateOptions {
            local_dir: local.path().to_path_buf(),
            ..UpdateOptions::default()
        },
        &transport,
    )
    .unwrap_err();
    assert!(matches!(err, InstallError::PackageNotFound(name) if name == "nope"));
}
