//! Split parameters.

use dovetail_path::{PathParams, DEFAULT_SEGMENTS_PER_CORNER};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// User-facing settings for one split.
///
/// # Example
///
/// ```
/// use dovetail_split::SplitParams;
///
/// let params = SplitParams::default().with_tabs_per_arm(3).with_tolerance(0.3);
/// assert!(params.validate().is_ok());
/// assert_eq!(params.path_params().tab_height, 7.5);
///
/// let parsed = SplitParams::from_toml("bed_size_mm = 180.0\ntabs_per_arm = 2\n")?;
/// assert_eq!(parsed.tabs_per_arm, 2);
/// assert_eq!(parsed.joint_tolerance_mm, 0.2);
/// # Ok::<(), dovetail_split::ConfigError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitParams {
    /// Printer bed edge length.
    pub bed_size_mm: f64,
    /// Gap left between mating faces.
    pub joint_tolerance_mm: f64,
    /// Tab width; tabs are half as tall.
    ///
    /// Raising it also raises the smallest usable `center_safe_zone_mm`:
    /// from 29.6 mm at the default tolerance the default 15 mm zone is
    /// rejected as a sizing error.
    pub dovetail_scale_mm: f64,
    /// Tabs on each arm of each split line.
    pub tabs_per_arm: usize,
    /// Requested tab corner radius.
    pub corner_radius_mm: f64,
    /// Half-width of the tab-free zone around the centre.
    ///
    /// Must exceed [`SplitParams::tab_protrusion`], tab height plus
    /// tolerance, so the perpendicular split line clears the nearest tab.
    pub center_safe_zone_mm: f64,
    /// Arc resolution per rounded tab corner.
    pub segments_per_corner: usize,
}

impl Default for SplitParams {
    fn default() -> Self {
        Self {
            bed_size_mm: 120.0,
            joint_tolerance_mm: 0.2,
            dovetail_scale_mm: 15.0,
            tabs_per_arm: 1,
            corner_radius_mm: 2.0,
            center_safe_zone_mm: 15.0,
            segments_per_corner: DEFAULT_SEGMENTS_PER_CORNER,
        }
    }
}

impl SplitParams {
    /// Accepted bed sizes.
    pub const BED_RANGE: (f64, f64) = (100.0, 1000.0);
    /// Accepted tolerances.
    pub const TOLERANCE_RANGE: (f64, f64) = (0.05, 0.5);
    /// Accepted dovetail scales.
    pub const SCALE_RANGE: (f64, f64) = (10.0, 40.0);
    /// Accepted tab counts per arm.
    pub const TABS_RANGE: (usize, usize) = (1, 5);
    /// Accepted corner radii.
    pub const RADIUS_RANGE: (f64, f64) = (0.0, 5.0);
    /// Accepted safe zones.
    pub const SAFE_ZONE_RANGE: (f64, f64) = (5.0, 50.0);

    /// Tight joints and small sharp tabs for fine prints.
    #[must_use]
    pub fn fine() -> Self {
        Self {
            joint_tolerance_mm: 0.1,
            dovetail_scale_mm: 10.0,
            corner_radius_mm: 0.5,
            ..Self::default()
        }
    }

    /// Loose joints and big tabs for large, coarse prints.
    #[must_use]
    pub fn coarse() -> Self {
        Self {
            bed_size_mm: 250.0,
            joint_tolerance_mm: 0.35,
            dovetail_scale_mm: 25.0,
            tabs_per_arm: 2,
            corner_radius_mm: 3.0,
            center_safe_zone_mm: 25.0,
            ..Self::default()
        }
    }

    /// Set the bed size.
    #[must_use]
    pub const fn with_bed_size(mut self, mm: f64) -> Self {
        self.bed_size_mm = mm;
        self
    }

    /// Set the joint tolerance.
    #[must_use]
    pub const fn with_tolerance(mut self, mm: f64) -> Self {
        self.joint_tolerance_mm = mm;
        self
    }

    /// Set the dovetail scale.
    #[must_use]
    pub const fn with_scale(mut self, mm: f64) -> Self {
        self.dovetail_scale_mm = mm;
        self
    }

    /// Set the tab count per arm.
    #[must_use]
    pub const fn with_tabs_per_arm(mut self, tabs: usize) -> Self {
        self.tabs_per_arm = tabs;
        self
    }

    /// Set the corner radius.
    #[must_use]
    pub const fn with_corner_radius(mut self, mm: f64) -> Self {
        self.corner_radius_mm = mm;
        self
    }

    /// Set the centre safe zone.
    #[must_use]
    pub const fn with_safe_zone(mut self, mm: f64) -> Self {
        self.center_safe_zone_mm = mm;
        self
    }

    /// Check every parameter against its range.
    ///
    /// # Errors
    ///
    /// [`ConfigError::OutOfRange`] for the first parameter that fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check("bed_size_mm", self.bed_size_mm, Self::BED_RANGE)?;
        check("joint_tolerance_mm", self.joint_tolerance_mm, Self::TOLERANCE_RANGE)?;
        check("dovetail_scale_mm", self.dovetail_scale_mm, Self::SCALE_RANGE)?;
        #[allow(clippy::cast_precision_loss)]
        check(
            "tabs_per_arm",
            self.tabs_per_arm as f64,
            (Self::TABS_RANGE.0 as f64, Self::TABS_RANGE.1 as f64),
        )?;
        check("corner_radius_mm", self.corner_radius_mm, Self::RADIUS_RANGE)?;
        check("center_safe_zone_mm", self.center_safe_zone_mm, Self::SAFE_ZONE_RANGE)?;
        #[allow(clippy::cast_precision_loss)]
        check("segments_per_corner", self.segments_per_corner as f64, (1.0, 256.0))?;
        Ok(())
    }

    /// Tab height, half the dovetail scale.
    #[must_use]
    pub fn tab_height(&self) -> f64 {
        self.dovetail_scale_mm / 2.0
    }

    /// How far a tab reaches past its split line, clearance included.
    #[must_use]
    pub fn tab_protrusion(&self) -> f64 {
        self.tab_height() + self.joint_tolerance_mm
    }

    /// Tab layout for the path assembler.
    #[must_use]
    pub fn path_params(&self) -> PathParams {
        PathParams::from_scale(
            self.dovetail_scale_mm,
            self.tabs_per_arm,
            self.corner_radius_mm,
            self.center_safe_zone_mm,
            self.joint_tolerance_mm,
        )
        .with_segments_per_corner(self.segments_per_corner)
    }

    /// Parse from TOML; missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed input. Ranges are not checked.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse { details: e.to_string() })
    }

    /// Serialize to TOML.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::Parse { details: e.to_string() })
    }

    /// Bit patterns of every parameter, for cache keys.
    pub(crate) fn fingerprint(&self) -> [u64; 7] {
        [
            self.bed_size_mm.to_bits(),
            self.joint_tolerance_mm.to_bits(),
            self.dovetail_scale_mm.to_bits(),
            self.tabs_per_arm as u64,
            self.corner_radius_mm.to_bits(),
            self.center_safe_zone_mm.to_bits(),
            self.segments_per_corner as u64,
        ]
    }
}

fn check(name: &'static str, value: f64, (min, max): (f64, f64)) -> Result<(), ConfigError> {
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { name, value, min, max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_presets_are_valid() {
        assert!(SplitParams::default().validate().is_ok());
        assert!(SplitParams::fine().validate().is_ok());
        assert!(SplitParams::coarse().validate().is_ok());
    }

    #[test]
    fn out_of_range_values() {
        let cases = [
            ("joint_tolerance_mm", SplitParams::default().with_tolerance(0.6)),
            ("dovetail_scale_mm", SplitParams::default().with_scale(9.0)),
            ("tabs_per_arm", SplitParams::default().with_tabs_per_arm(0)),
            ("center_safe_zone_mm", SplitParams::default().with_safe_zone(60.0)),
            ("bed_size_mm", SplitParams::default().with_bed_size(f64::NAN)),
        ];
        for (expected, params) in cases {
            match params.validate() {
                Err(ConfigError::OutOfRange { name, .. }) => assert_eq!(name, expected),
                other => panic!("{expected}: {other:?}"),
            }
        }
    }

    #[test]
    fn safe_zone_must_outgrow_the_tabs() {
        let params = SplitParams::default();
        assert!(params.center_safe_zone_mm > params.tab_protrusion());
        let wide = params.clone().with_scale(30.0);
        assert!((wide.tab_protrusion() - 15.2).abs() < 1e-12);
        assert!(wide.center_safe_zone_mm < wide.tab_protrusion());
        for preset in [SplitParams::fine(), SplitParams::coarse()] {
            assert!(preset.center_safe_zone_mm > preset.tab_protrusion());
        }
    }

    #[test]
    fn toml_round_trip() {
        let params = SplitParams::coarse();
        let text = params.to_toml();
        assert!(text.is_ok());
        let back = SplitParams::from_toml(&text.unwrap_or_default());
        assert_eq!(back, Ok(params));
        assert!(matches!(SplitParams::from_toml("tabs_per_arm = \"two\""), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn fingerprint_tracks_every_field() {
        let base = SplitParams::default().fingerprint();
        assert_ne!(base, SplitParams::default().with_corner_radius(1.0).fingerprint());
        assert_ne!(base, SplitParams::default().with_bed_size(121.0).fingerprint());
    }
}
