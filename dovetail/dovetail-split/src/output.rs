//! Split results and archive packaging.

use std::io::{Cursor, Write};
use std::time::Duration;

use mesh_repair::RepairSummary;
use mesh_types::IndexedMesh;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::error::SplitResult;
use crate::quadrant::Quadrant;

/// Wall-clock time after which a run counts as too slow. Advisory only.
pub const SOFT_BUDGET: Duration = Duration::from_secs(60);

/// One printable part.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadrantPart {
    /// Which quadrant this is.
    pub quadrant: Quadrant,
    /// File name, `"TL.stl"` and so on.
    pub name: String,
    /// The part in the centred frame of the run.
    pub mesh: IndexedMesh,
    /// Binary STL bytes.
    pub stl: Vec<u8>,
    /// Triangles in the part.
    pub triangle_count: usize,
    /// Enclosed volume in mm³.
    pub volume: f64,
    /// Translation that was applied to centre the input; subtract it to
    /// place the part back where the input was.
    pub origin_offset: [f64; 3],
}

/// What happened during a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitReport {
    /// Non-fatal findings, in the order they were made.
    pub warnings: Vec<String>,
    /// Repair pass summary, when the input was not closed.
    pub repair: Option<RepairSummary>,
    /// Loops in the mid-height section.
    pub section_contours: usize,
    /// Translation applied to centre the input.
    pub origin_offset: [f64; 3],
    /// Tab width used on the X and Y lines.
    pub effective_tab_width: [f64; 2],
    /// Debris components dropped, summed over all parts.
    pub debris_removed: usize,
    /// Wall-clock time of the run.
    pub elapsed: Duration,
    /// Whether `elapsed` exceeded [`SOFT_BUDGET`].
    pub over_budget: bool,
}

impl SplitReport {
    /// Record the run time and flag slow runs.
    pub fn finish(&mut self, elapsed: Duration) {
        self.elapsed = elapsed;
        self.over_budget = elapsed > SOFT_BUDGET;
        if self.over_budget {
            self.warnings.push(format!(
                "run took {:.1} s, over the {} s budget",
                elapsed.as_secs_f64(),
                SOFT_BUDGET.as_secs()
            ));
        }
    }
}

/// The four parts of a split plus its report.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitOutput {
    /// Parts in [`Quadrant::ALL`] order.
    pub parts: [QuadrantPart; 4],
    /// Run report.
    pub report: SplitReport,
}

impl SplitOutput {
    /// Part for one quadrant.
    #[must_use]
    pub fn part(&self, quadrant: Quadrant) -> &QuadrantPart {
        // Parts are stored in `Quadrant::ALL` order, which matches the
        // declaration order of the enum.
        &self.parts[quadrant as usize]
    }

    /// Combined volume of all parts.
    #[must_use]
    pub fn total_volume(&self) -> f64 {
        self.parts.iter().map(|p| p.volume).sum()
    }
}

/// Pack the four STL files into a deflated ZIP archive.
///
/// # Errors
///
/// [`SplitError::Package`](crate::SplitError::Package) if the archive
/// cannot be written.
pub fn pack_zip(output: &SplitOutput) -> SplitResult<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    let mut zip = ZipWriter::new(&mut buffer);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for part in &output.parts {
        zip.start_file(part.name.as_str(), options)?;
        zip.write_all(&part.stl).map_err(zip::result::ZipError::Io)?;
    }
    zip.finish()?;
    Ok(buffer.into_inner())
}
