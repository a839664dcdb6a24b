//! Configuration for prism clipping.
//!
//! # Example
//!
//! ```
//! use mesh_boolean::{BooleanConfig, BooleanOp, Side};
//!
//! let config = BooleanConfig::default().with_parallel(true);
//! assert!(config.parallel);
//! assert_eq!(BooleanOp::Difference.side(), Side::Outside);
//! ```

/// Which part of the mesh a clip keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Material inside the prism.
    Inside,
    /// Material outside the prism.
    Outside,
}

impl Side {
    /// The other side.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Inside => Self::Outside,
            Self::Outside => Self::Inside,
        }
    }
}

/// Boolean operation between a mesh and a prism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BooleanOp {
    /// Mesh ∩ prism.
    Intersection,
    /// Mesh − prism.
    Difference,
}

impl BooleanOp {
    /// Side of the prism wall this operation keeps.
    #[must_use]
    pub fn side(self) -> Side {
        match self {
            Self::Intersection => Side::Inside,
            Self::Difference => Side::Outside,
        }
    }
}

/// Tolerances and execution options for [`boolean_operation`].
///
/// [`boolean_operation`]: crate::boolean_operation
#[derive(Debug, Clone)]
pub struct BooleanConfig {
    /// Minimum XY distance between a mesh vertex and a prism wall, and
    /// between a prism corner and a mesh edge. Closer contacts are resolved
    /// by nudging the prism.
    pub contact_tolerance: f64,

    /// Size of one nudge in millimeters. Attempt `k` moves the prism by
    /// `k` nudges along a fixed irrational direction.
    pub nudge: f64,

    /// Number of nudged retries before giving up.
    pub max_nudges: usize,

    /// Triangles whose XY-projected area falls below this fraction of their
    /// true area are split in their own vertical plane instead of in XY.
    pub vertical_tolerance: f64,

    /// Split triangles on the rayon pool.
    pub parallel: bool,
}

impl Default for BooleanConfig {
    fn default() -> Self {
        Self {
            contact_tolerance: 1e-7,
            nudge: 1e-6,
            max_nudges: 4,
            vertical_tolerance: 1e-7,
            parallel: false,
        }
    }
}

impl BooleanConfig {
    /// Looser contact handling for coarse or noisy meshes.
    #[must_use]
    pub fn for_scans() -> Self {
        Self {
            contact_tolerance: 1e-5,
            nudge: 1e-4,
            max_nudges: 8,
            ..Self::default()
        }
    }

    /// Enable or disable rayon.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set the contact tolerance.
    #[must_use]
    pub fn with_contact_tolerance(mut self, tolerance: f64) -> Self {
        self.contact_tolerance = tolerance;
        self
    }

    /// Set the retry budget.
    #[must_use]
    pub fn with_max_nudges(mut self, attempts: usize) -> Self {
        self.max_nudges = attempts;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sequential() {
        let config = BooleanConfig::default();
        assert!(!config.parallel);
        assert!(config.nudge > config.contact_tolerance);
    }

    #[test]
    fn builders() {
        let config = BooleanConfig::for_scans()
            .with_parallel(true)
            .with_max_nudges(2)
            .with_contact_tolerance(1e-3);
        assert!(config.parallel);
        assert_eq!(config.max_nudges, 2);
        assert!((config.contact_tolerance - 1e-3).abs() < f64::EPSILON);
    }

    #[test]
    fn sides() {
        assert_eq!(BooleanOp::Intersection.side(), Side::Inside);
        assert_eq!(Side::Inside.opposite(), Side::Outside);
    }
}
