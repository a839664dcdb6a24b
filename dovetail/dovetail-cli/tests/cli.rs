//! Runs the `dovetail` binary against temporary files.

use std::path::Path;
use std::process::Command;

use mesh_io::{save_stl, StlFormat};
use mesh_types::{cuboid, Point3};

fn dovetail(dir: &Path, args: &[&str]) -> std::process::Output {
    match Command::new(env!("CARGO_BIN_EXE_dovetail")).current_dir(dir).args(args).output() {
        Ok(out) => out,
        Err(e) => panic!("failed to run dovetail: {e}"),
    }
}

fn block(dir: &Path) {
    let mesh = cuboid(Point3::origin(), Point3::new(100.0, 100.0, 12.0));
    assert!(save_stl(&mesh, dir.join("block.stl"), StlFormat::Binary).is_ok());
}

#[test]
fn split_writes_an_archive() {
    let Ok(dir) = tempfile::tempdir() else {
        panic!("tempdir");
    };
    block(dir.path());
    let out = dovetail(dir.path(), &["split", "block.stl", "-o", "parts.zip", "--tabs", "2"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let written = std::fs::read(dir.path().join("parts.zip"));
    assert!(written.is_ok_and(|bytes| bytes.starts_with(b"PK")));
}

#[test]
fn preview_reads_the_config_file() {
    let Ok(dir) = tempfile::tempdir() else {
        panic!("tempdir");
    };
    block(dir.path());
    assert!(std::fs::write(dir.path().join("dovetail.toml"), "tabs_per_arm = 2\n").is_ok());
    let out = dovetail(dir.path(), &["preview", "block.stl", "--json", "paths.json"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let Ok(json) = std::fs::read_to_string(dir.path().join("paths.json")) else {
        panic!("no json written");
    };
    // Two tabs on each of two arms.
    assert_eq!(json.matches("\"start_x\"").count(), 8);
}

#[test]
fn invalid_flags_fail() {
    let Ok(dir) = tempfile::tempdir() else {
        panic!("tempdir");
    };
    block(dir.path());
    let out = dovetail(dir.path(), &["check", "block.stl", "--tolerance", "2.0"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("joint_tolerance_mm"));
}
