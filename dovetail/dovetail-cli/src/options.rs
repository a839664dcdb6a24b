//! Parameter flags and config file loading.

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use dovetail_split::SplitParams;
use tracing::debug;

/// Config file picked up from the working directory.
pub const DEFAULT_CONFIG: &str = "dovetail.toml";

/// Parameter presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// Built-in defaults
    Standard,
    /// Tight joints, small tabs
    Fine,
    /// Loose joints, big tabs, big bed
    Coarse,
}

/// Flags that override the parameter file.
#[derive(Debug, Clone, Default, Args)]
pub struct ParamArgs {
    /// Start from a preset instead of the parameter file
    #[arg(long, value_enum)]
    pub preset: Option<Preset>,

    /// Printer bed edge length in mm
    #[arg(long)]
    pub bed: Option<f64>,

    /// Joint tolerance in mm
    #[arg(short, long)]
    pub tolerance: Option<f64>,

    /// Dovetail scale in mm (tab width; tabs are half as tall)
    #[arg(short, long)]
    pub scale: Option<f64>,

    /// Tabs on each arm of each split line
    #[arg(long)]
    pub tabs: Option<usize>,

    /// Tab corner radius in mm
    #[arg(long)]
    pub radius: Option<f64>,

    /// Half-width of the tab-free centre zone in mm
    #[arg(long)]
    pub safe_zone: Option<f64>,

    /// Arc segments per rounded corner
    #[arg(long)]
    pub segments: Option<usize>,
}

impl ParamArgs {
    /// Base parameters from a preset or file, with flags applied on top.
    ///
    /// With no explicit file, `dovetail.toml` is read when it exists.
    pub fn resolve(&self, config: Option<&Path>) -> Result<SplitParams> {
        let base = match (self.preset, config) {
            (Some(preset), _) => preset_params(preset),
            (None, Some(path)) => load(path)?,
            (None, None) if Path::new(DEFAULT_CONFIG).is_file() => load(Path::new(DEFAULT_CONFIG))?,
            (None, None) => SplitParams::default(),
        };
        let params = self.apply(base);
        params.validate().context("invalid split parameters")?;
        debug!(?params, "resolved parameters");
        Ok(params)
    }

    fn apply(&self, mut params: SplitParams) -> SplitParams {
        if let Some(v) = self.bed {
            params.bed_size_mm = v;
        }
        if let Some(v) = self.tolerance {
            params.joint_tolerance_mm = v;
        }
        if let Some(v) = self.scale {
            params.dovetail_scale_mm = v;
        }
        if let Some(v) = self.tabs {
            params.tabs_per_arm = v;
        }
        if let Some(v) = self.radius {
            params.corner_radius_mm = v;
        }
        if let Some(v) = self.safe_zone {
            params.center_safe_zone_mm = v;
        }
        if let Some(v) = self.segments {
            params.segments_per_corner = v;
        }
        params
    }
}

fn preset_params(preset: Preset) -> SplitParams {
    match preset {
        Preset::Standard => SplitParams::default(),
        Preset::Fine => SplitParams::fine(),
        Preset::Coarse => SplitParams::coarse(),
    }
}

fn load(path: &Path) -> Result<SplitParams> {
    let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    SplitParams::from_toml(&text).with_context(|| format!("failed to parse {}", path.display()))
}
