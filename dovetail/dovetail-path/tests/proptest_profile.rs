//! Property tests for tab profiles and cutter outlines.
//!
//! Run with: cargo test -p dovetail-path --test proptest_profile

use dovetail_path::{
    apply_tolerance, assemble_path, distance_to_ring, generate_tab_with_resolution, is_simple_polyline,
    is_simple_ring, Axis, PathParams, Role, TabSpec,
};
use nalgebra::Point2;
use proptest::prelude::*;

fn any_tab() -> impl Strategy<Value = TabSpec> {
    (-50.0..50.0f64, 5.0..40.0f64, 0.3..1.2f64, 0.1..5.0f64, prop::bool::ANY).prop_map(
        |(start, width, aspect, radius, up)| TabSpec::new(start, width, width * aspect, radius, if up { 1 } else { -1 }),
    )
}

/// Midpoints of edges longer than `min_len`; arc chords are shorter.
fn straight_midpoints(ring: &[Point2<f64>], min_len: f64) -> Vec<Point2<f64>> {
    let n = ring.len();
    (0..n)
        .map(|i| (ring[i], ring[(i + 1) % n]))
        .filter(|(a, b)| (b - a).norm() > min_len)
        .map(|(a, b)| nalgebra::center(&a, &b))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn rounded_tabs_stay_simple(spec in any_tab()) {
        let points = generate_tab_with_resolution(&spec, 16);
        prop_assert!(points.is_ok());
        let points = points.unwrap_or_default();
        prop_assert!(is_simple_polyline(&points));

        let sign = f64::from(spec.direction);
        prop_assert!(points.iter().all(|p| p.y * sign >= 0.0));
        prop_assert!(points.iter().all(|p| p.x >= spec.start_x && p.x <= spec.end_x()));
        prop_assert_eq!(points.first().map(|p| p.x), Some(spec.start_x));
        prop_assert_eq!(points.last().map(|p| p.x), Some(spec.end_x()));
    }

    #[test]
    fn resolution_adds_vertices(spec in any_tab(), low in 4usize..12) {
        let coarse = generate_tab_with_resolution(&spec, low);
        let fine = generate_tab_with_resolution(&spec, low * 2);
        prop_assert!(coarse.is_ok() && fine.is_ok());
        let (coarse, fine) = (coarse.unwrap_or_default(), fine.unwrap_or_default());
        prop_assert!(fine.len() > coarse.len(), "{} <= {}", fine.len(), coarse.len());
    }

    #[test]
    fn mating_outlines_keep_tolerance_gap(
        length in 80.0..200.0f64,
        scale in 10.0..20.0f64,
        tabs in 1usize..4,
        radius in 0.0..2.0f64,
        tolerance in 0.05..0.5f64,
        along_y in prop::bool::ANY,
    ) {
        let axis = if along_y { Axis::Y } else { Axis::X };
        let params = PathParams::from_scale(scale, tabs, radius, 15.0, tolerance);
        let path = assemble_path(axis, length, length * 1.5, &params);
        prop_assume!(path.is_ok());
        let Ok(path) = path else { return Ok(()) };

        let male = apply_tolerance(&path, tolerance, Role::Male);
        let female = apply_tolerance(&path, tolerance, Role::Female);
        prop_assume!(male.is_ok() && female.is_ok());
        let (male, female) = (male.unwrap_or_default(), female.unwrap_or_default());

        prop_assert!(is_simple_ring(&male) && is_simple_ring(&female));
        // Corners may sit further apart, never closer.
        for p in &male {
            let gap = distance_to_ring(p, &female);
            prop_assert!(gap >= tolerance * (1.0 - 1e-3), "gap {} at {}", gap, p);
        }
        // Straight stretches face their mate exactly one tolerance away.
        for p in straight_midpoints(&male, 1.0) {
            let gap = distance_to_ring(&p, &female);
            prop_assert!((gap - tolerance).abs() <= tolerance * 1e-3, "gap {} at {}", gap, p);
        }
    }
}
