//! The split pipeline from uploaded bytes to four encoded parts.

use std::time::Instant;

use mesh_boolean::BooleanConfig;
use mesh_io::{parse_stl, to_binary_stl};
use mesh_types::{IndexedMesh, MeshBounds};
use tracing::{info, info_span, warn};

use crate::cache::PartsCache;
use crate::cutters::{CutterSet, SplitPaths};
use crate::error::{SplitError, SplitResult};
use crate::output::{QuadrantPart, SplitOutput, SplitReport};
use crate::params::SplitParams;
use crate::prepare::{check_complexity, ensure_watertight, normalize};
use crate::preview::{oversize_warnings, scaling_warnings};
use crate::quadrant::Cutter;
use crate::sanitize::{remove_debris, DEBRIS_THRESHOLD};
use crate::stage::{NoopObserver, Stage, StageObserver, StageTracker};

/// Split STL bytes into four dovetailed parts.
///
/// # Errors
///
/// Any [`SplitError`]; pipeline errors name the stage that failed.
pub fn generate_parts(bytes: &[u8], params: &SplitParams) -> SplitResult<SplitOutput> {
    generate_parts_with_observer(bytes, params, &mut NoopObserver)
}

/// [`generate_parts`], reporting progress to `observer`.
///
/// Invalid parameters are rejected before the run starts, so the observer
/// sees no events for them. Any other failure ends with a transition to
/// [`Stage::Errored`].
///
/// # Errors
///
/// See [`generate_parts`].
pub fn generate_parts_with_observer(
    bytes: &[u8],
    params: &SplitParams,
    observer: &mut dyn StageObserver,
) -> SplitResult<SplitOutput> {
    params.validate()?;
    let mut tracker = StageTracker::new(observer);
    let started = Instant::now();
    let result = parse_stl(bytes)
        .map_err(SplitError::from)
        .and_then(|mesh| run(&mesh, params, &mut tracker));
    finish(result, started, &mut tracker)
}

/// Split an already loaded mesh into four dovetailed parts.
///
/// The run starts in [`Stage::Uploaded`].
///
/// # Errors
///
/// See [`generate_parts`].
pub fn split_mesh(mesh: &IndexedMesh, params: &SplitParams, observer: &mut dyn StageObserver) -> SplitResult<SplitOutput> {
    params.validate()?;
    let mut tracker = StageTracker::new(observer);
    let started = Instant::now();
    let result = run(mesh, params, &mut tracker);
    finish(result, started, &mut tracker)
}

/// [`generate_parts`] through a cache.
///
/// # Errors
///
/// See [`generate_parts`]; failures are not cached.
pub fn generate_parts_cached(cache: &mut PartsCache, bytes: &[u8], params: &SplitParams) -> SplitResult<SplitOutput> {
    cache.get_or_try_insert_with(bytes, params, || generate_parts(bytes, params))
}

fn finish(result: SplitResult<SplitOutput>, started: Instant, tracker: &mut StageTracker<'_>) -> SplitResult<SplitOutput> {
    match result {
        Ok(mut output) => {
            output.report.finish(started.elapsed());
            if output.report.over_budget {
                warn!(elapsed = ?output.report.elapsed, "split over time budget");
            }
            info!(elapsed = ?output.report.elapsed, volume = output.total_volume(), "split complete");
            Ok(output)
        }
        Err(e) => {
            let failed = e.stage().unwrap_or(tracker.current());
            tracker.fail(failed, &e);
            Err(e)
        }
    }
}

fn run(input: &IndexedMesh, params: &SplitParams, tracker: &mut StageTracker<'_>) -> SplitResult<SplitOutput> {
    let _span = info_span!("split", faces = input.faces.len()).entered();
    let mut report = SplitReport::default();

    let (mut mesh, offset) = normalize(input);
    report.origin_offset = [offset.x, offset.y, offset.z];
    tracker.advance(Stage::Normalized);

    report.repair = ensure_watertight(&mut mesh)?;
    report.section_contours = check_complexity(&mesh)?;
    let bounds = mesh.bounds();
    report.warnings.extend(oversize_warnings(&bounds, params));
    let paths = SplitPaths::plan(&bounds, params)?;
    report.warnings.extend(scaling_warnings(&paths));
    report.effective_tab_width = [paths.x.effective_width, paths.y.effective_width];
    let cutters = CutterSet::build(&paths, params.joint_tolerance_mm, &bounds)?;
    tracker.advance(Stage::Validated);

    let mut cutter = Cutter {
        tracker: &mut *tracker,
        config: BooleanConfig::default(),
    };
    let halves = cutter.cut_x(&mesh, &cutters)?;
    cutter.tracker.advance(Stage::CutX);
    let quadrants = cutter.cut_y(&halves, &cutters)?;
    drop(halves);
    cutter.tracker.advance(Stage::CutY);

    let mut cleaned = Vec::with_capacity(4);
    for (quadrant, raw) in quadrants.into_array() {
        let (clean, removed) = remove_debris(&raw, DEBRIS_THRESHOLD, quadrant.name())?;
        report.debris_removed += removed;
        cleaned.push((quadrant, clean));
    }
    tracker.advance(Stage::Sanitized);

    let mut parts = Vec::with_capacity(4);
    for (quadrant, mesh) in cleaned {
        let stl = to_binary_stl(&mesh).map_err(|e| SplitError::Encode {
            details: format!("{quadrant}: {e}"),
        })?;
        parts.push(QuadrantPart {
            quadrant,
            name: quadrant.file_name(),
            stl,
            triangle_count: mesh.faces.len(),
            volume: mesh.volume(),
            origin_offset: report.origin_offset,
            mesh,
        });
    }
    let parts: [QuadrantPart; 4] = parts.try_into().map_err(|_| SplitError::Encode {
        details: "expected four parts".to_string(),
    })?;
    tracker.advance(Stage::Done);
    Ok(SplitOutput { parts, report })
}
