//! End-to-end splits of synthetic meshes.
//!
//! Run with: cargo test -p dovetail-split --test scenarios

use std::io::{Cursor, Read};

use approx::assert_relative_eq;
use dovetail_split::{
    generate_parts, generate_parts_cached, generate_parts_with_observer, pack_zip, sanitize, ConfigError, PartsCache,
    Quadrant, SplitError, SplitParams, Stage, StageLog, DEBRIS_THRESHOLD,
};
use mesh_io::{load_stl, save_stl, to_binary_stl, StlFormat};
use mesh_repair::validate_mesh;
use mesh_types::{cuboid, IndexedMesh, MeshBounds, Point3};

fn cube(size: f64) -> IndexedMesh {
    cuboid(Point3::origin(), Point3::new(size, size, size))
}

fn stl(mesh: &IndexedMesh) -> Vec<u8> {
    match to_binary_stl(mesh) {
        Ok(bytes) => bytes,
        Err(e) => panic!("encode failed: {e}"),
    }
}

fn cube_params() -> SplitParams {
    SplitParams::default()
        .with_bed_size(180.0)
        .with_tolerance(0.2)
        .with_scale(15.0)
        .with_tabs_per_arm(4)
        .with_corner_radius(1.0)
}

#[test]
fn cube_splits_into_four_watertight_quadrants() {
    let input = cube(100.0);
    let output = match generate_parts(&stl(&input), &cube_params()) {
        Ok(o) => o,
        Err(e) => panic!("split failed: {e}"),
    };

    // Four 15 mm tabs cannot fit in 35 mm of arm.
    assert_relative_eq!(output.report.effective_tab_width[0], 35.0 / 4.0 * 0.98, epsilon = 1e-12);
    assert_eq!(output.report.warnings.len(), 2);

    for part in &output.parts {
        let report = validate_mesh(&part.mesh);
        assert!(report.is_watertight && report.is_manifold, "{}", part.name);
        assert!(!report.is_inside_out, "{}", part.name);

        let size = part.mesh.bounds().size();
        // Half the cube plus at most one tab height and the tolerance.
        for extent in [size.x, size.y] {
            assert!((42.0..=57.8).contains(&extent), "{}: {extent}", part.name);
        }
        assert_relative_eq!(size.z, 100.0, epsilon = 1e-9);
        assert!((part.volume - 250_000.0).abs() < 250_000.0 * 0.05, "{}: {}", part.name, part.volume);
    }

    // Only a tolerance-wide strip along each split line goes missing.
    let total = output.total_volume();
    assert!(total < input.volume());
    assert!(total > input.volume() * 0.98, "{total}");
}

#[test]
fn busy_cross_section_stops_before_any_boolean() {
    let mut mesh = IndexedMesh::new();
    for i in 0..5 {
        for j in 0..3 {
            let (x, y) = (f64::from(i) * 30.0, f64::from(j) * 30.0);
            mesh.merge(&cuboid(Point3::new(x, y, 0.0), Point3::new(x + 10.0, y + 10.0, 40.0)));
        }
    }
    let mut log = StageLog::default();
    let err = generate_parts_with_observer(&stl(&mesh), &SplitParams::default(), &mut log);
    assert!(matches!(
        err,
        Err(SplitError::Complexity {
            stage: Stage::Validated,
            contours: 15,
            limit: 10
        })
    ));
    assert_eq!(log.boolean_count(), 0);
    assert_eq!(log.stages(), vec![Stage::Normalized, Stage::Errored]);
}

#[test]
fn loose_tolerance_on_small_tabs_stops_before_extrusion() {
    let params = SplitParams::default()
        .with_scale(10.0)
        .with_tabs_per_arm(2)
        .with_tolerance(0.5);
    let mut log = StageLog::default();
    let err = generate_parts_with_observer(&stl(&cube(52.0)), &params, &mut log);
    assert!(
        matches!(err, Err(SplitError::Tolerance { stage: Stage::Validated, .. })),
        "{err:?}"
    );
    assert_eq!(log.boolean_count(), 0);
}

#[test]
fn half_millimetre_clearance_is_too_loose_for_ten_millimetre_tabs() {
    let params = SplitParams::default().with_scale(10.0).with_tolerance(0.5);
    let mut log = StageLog::default();
    let err = generate_parts_with_observer(&stl(&cube(100.0)), &params, &mut log);
    assert!(
        matches!(err, Err(SplitError::Tolerance { stage: Stage::Validated, .. })),
        "{err:?}"
    );
    assert_eq!(log.boolean_count(), 0);
    assert_eq!(log.stages().last(), Some(&Stage::Errored));
}

#[test]
fn crowded_tabs_with_thin_necks_are_a_sizing_error() {
    // 5 mm of arm for three tabs.
    let params = SplitParams::default().with_scale(10.0).with_tabs_per_arm(3);
    let err = generate_parts(&stl(&cube(40.0)), &params);
    assert!(matches!(err, Err(SplitError::Sizing { stage: Stage::Validated, .. })), "{err:?}");
}

#[test]
fn open_mesh_that_cannot_be_repaired_is_a_mesh_error() {
    // Two cubes sharing one edge: that edge has four faces.
    let mut mesh = cube(20.0);
    mesh.merge(&cuboid(Point3::new(20.0, 20.0, 0.0), Point3::new(40.0, 40.0, 20.0)));
    let mut log = StageLog::default();
    let err = generate_parts_with_observer(&stl(&mesh), &SplitParams::default(), &mut log);
    assert!(matches!(err, Err(SplitError::Mesh { stage: Stage::Validated, .. })), "{err:?}");
    assert_eq!(log.stages().last(), Some(&Stage::Errored));
}

#[test]
fn config_errors_name_the_parameter() {
    let err = generate_parts(&stl(&cube(100.0)), &SplitParams::default().with_scale(50.0));
    assert!(matches!(
        err,
        Err(SplitError::Config(ConfigError::OutOfRange {
            name: "dovetail_scale_mm",
            ..
        }))
    ));
}

#[test]
fn split_parts_are_already_clean() {
    let output = match generate_parts(&stl(&cube(80.0)), &SplitParams::default()) {
        Ok(o) => o,
        Err(e) => panic!("split failed: {e}"),
    };
    for part in &output.parts {
        match sanitize(&part.mesh, DEBRIS_THRESHOLD) {
            Ok(again) => assert_eq!(again, part.mesh),
            Err(e) => panic!("{}: {e}", part.name),
        }
    }
}

#[test]
fn repeated_requests_hit_the_cache() {
    let bytes = stl(&cube(80.0));
    let params = SplitParams::default();
    let mut cache = PartsCache::default();
    let first = generate_parts_cached(&mut cache, &bytes, &params);
    let second = generate_parts_cached(&mut cache, &bytes, &params);
    assert!(first.is_ok());
    assert_eq!(cache.misses(), 1);
    assert_eq!(cache.hits(), 1);
    assert_eq!(
        first.map(|o| o.parts.map(|p| p.stl)).ok(),
        second.map(|o| o.parts.map(|p| p.stl)).ok()
    );
}

#[test]
fn archive_round_trips_through_disk() {
    let dir = match tempfile::tempdir() {
        Ok(d) => d,
        Err(e) => panic!("tempdir: {e}"),
    };
    let input = dir.path().join("block.stl");
    assert!(save_stl(&cuboid(Point3::origin(), Point3::new(90.0, 70.0, 15.0)), &input, StlFormat::Ascii).is_ok());
    let Ok(mesh) = load_stl(&input) else {
        panic!("reload failed");
    };

    let output = match generate_parts(&stl(&mesh), &SplitParams::default()) {
        Ok(o) => o,
        Err(e) => panic!("split failed: {e}"),
    };
    let archive_path = dir.path().join("parts.zip");
    let Ok(bytes) = pack_zip(&output) else {
        panic!("packing failed");
    };
    assert!(std::fs::write(&archive_path, &bytes).is_ok());

    let Ok(data) = std::fs::read(&archive_path) else {
        panic!("read back failed");
    };
    let Ok(mut archive) = zip::ZipArchive::new(Cursor::new(data)) else {
        panic!("not a zip");
    };
    assert_eq!(archive.len(), 4);
    for q in Quadrant::ALL {
        let Ok(mut file) = archive.by_name(&q.file_name()) else {
            panic!("{q} missing");
        };
        let mut stl_bytes = Vec::new();
        assert!(file.read_to_end(&mut stl_bytes).is_ok());
        assert_eq!(stl_bytes, output.part(q).stl);
    }
}
