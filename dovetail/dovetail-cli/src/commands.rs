//! Subcommand implementations.

use std::path::Path;

use anyhow::{Context, Result};
use dovetail_split::{
    check_complexity, generate_parts_with_observer, normalize, pack_zip, preview_path, SplitParams,
    MAX_SECTION_CONTOURS,
};
use mesh_io::load_stl;
use mesh_repair::validate_mesh;
use mesh_types::MeshBounds;
use owo_colors::OwoColorize;

use crate::progress::Progress;

/// Split `input` and write the archive to `output`.
pub fn split(input: &Path, output: &Path, params: &SplitParams) -> Result<()> {
    let bytes = std::fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;

    println!();
    println!("{} {}", "Splitting".bold(), input.display());
    let mut progress = Progress::start();
    let result = generate_parts_with_observer(&bytes, params, &mut progress)
        .with_context(|| format!("failed to split {}", input.display()))?;

    for warning in &result.report.warnings {
        println!("  {} {warning}", "⚠".yellow());
    }
    if let Some(repair) = &result.report.repair {
        println!("  {} input repaired: {repair}", "⚠".yellow());
    }
    println!();
    for part in &result.parts {
        let size = part.mesh.bounds().size();
        println!(
            "  {:<7} {:>8} triangles  {:>12.1} mm³  {:.1} x {:.1} x {:.1} mm",
            part.name.bold(),
            part.triangle_count,
            part.volume,
            size.x,
            size.y,
            size.z
        );
    }

    let archive = pack_zip(&result).context("failed to package parts")?;
    std::fs::write(output, &archive).with_context(|| format!("failed to write {}", output.display()))?;
    println!();
    println!("{} {}", "✓ Wrote".green().bold(), output.display());
    Ok(())
}

/// Print the cutting paths, optionally writing them as JSON.
pub fn preview(input: &Path, json: Option<&Path>, params: &SplitParams) -> Result<()> {
    let mesh = load_stl(input).with_context(|| format!("failed to load {}", input.display()))?;
    let (centred, _) = normalize(&mesh);
    let preview = preview_path(&centred.bounds(), params).context("failed to lay out cutting paths")?;

    println!();
    println!(
        "{} {:.1} x {:.1} mm footprint",
        "Preview".bold(),
        preview.footprint[0],
        preview.footprint[1]
    );
    for line in [&preview.x, &preview.y] {
        let scaled = if line.auto_scaled { " (narrowed)".yellow().to_string() } else { String::new() };
        println!(
            "  {} line: {} tabs, {:.2} mm wide{scaled}, {} vertices",
            line.axis.to_string().cyan(),
            line.tabs.len(),
            line.effective_width,
            line.points.len()
        );
    }
    for warning in &preview.warnings {
        println!("  {} {warning}", "⚠".yellow());
    }

    if let Some(path) = json {
        let text = preview.to_json().context("failed to encode preview")?;
        std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
        println!("{} {}", "✓ Wrote".green().bold(), path.display());
    }
    Ok(())
}

/// Report whether `input` can be split as is.
pub fn check(input: &Path, params: &SplitParams) -> Result<()> {
    let mesh = load_stl(input).with_context(|| format!("failed to load {}", input.display()))?;
    let report = validate_mesh(&mesh);
    let size = mesh.bounds().size();

    println!();
    println!("{} {}", "Checking".bold(), input.display());
    println!("  size: {:.1} x {:.1} x {:.1} mm", size.x, size.y, size.z);
    for line in report.to_string().lines() {
        println!("  {}", line.dimmed());
    }

    let mut ok = true;
    if report.is_printable() {
        println!("  {} closed and manifold", "✓".green());
    } else {
        println!("  {} not closed; a repair pass will run before splitting", "⚠".yellow());
    }

    match check_complexity(&mesh) {
        Ok(contours) => println!(
            "  {} {contours} section contour(s), limit {MAX_SECTION_CONTOURS}",
            "✓".green()
        ),
        Err(e) => {
            ok = false;
            println!("  {} {e}", "✗".red());
        }
    }

    let bed = params.bed_size_mm;
    match bed_fit(size.x, size.y, params) {
        BedFit::Whole => println!("  {} fits a {bed} mm bed without splitting", "✓".green()),
        BedFit::Quadrants => println!("  {} quadrants fit a {bed} mm bed", "✓".green()),
        BedFit::TooLarge => println!("  {} quadrants may not fit a {bed} mm bed", "⚠".yellow()),
    }

    println!();
    if ok {
        println!("{}", "✓ Ready to split".green().bold());
        Ok(())
    } else {
        anyhow::bail!("{} cannot be split", input.display())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BedFit {
    Whole,
    Quadrants,
    TooLarge,
}

/// Quadrants span half the footprint plus a tab reaching over each split line.
fn bed_fit(x: f64, y: f64, params: &SplitParams) -> BedFit {
    let bed = params.bed_size_mm;
    let quadrant = |extent: f64| extent / 2.0 + params.tab_protrusion();
    if x <= bed && y <= bed {
        BedFit::Whole
    } else if quadrant(x) <= bed && quadrant(y) <= bed {
        BedFit::Quadrants
    } else {
        BedFit::TooLarge
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadrant_fit_counts_tab_protrusion() {
        let params = SplitParams::default().with_bed_size(100.0);
        assert_eq!(bed_fit(90.0, 100.0, &params), BedFit::Whole);
        // 90 mm of body plus 7.7 mm of tab.
        assert_eq!(bed_fit(180.0, 150.0, &params), BedFit::Quadrants);
        // Twice the bed, but the tabs push each quadrant past it.
        assert_eq!(bed_fit(195.0, 195.0, &params), BedFit::TooLarge);
        assert_eq!(bed_fit(150.0, 201.0, &params), BedFit::TooLarge);
    }
}
