//! Quadrant booleans.
//!
//! The X line splits the mesh into a bottom half (inside the X male cutter)
//! and a top half (outside the X female cutter). Each half is then split
//! the same way along the Y line, whose cutters cover the left side.

use std::fmt;

use mesh_boolean::{boolean_operation, BooleanConfig, BooleanOp, Prism};
use mesh_types::IndexedMesh;
use serde::{Deserialize, Serialize};
use tracing::info_span;

use crate::cutters::CutterSet;
use crate::error::{SplitError, SplitResult};
use crate::stage::{Stage, StageTracker};

/// One of the four output parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Quadrant {
    /// Top left: `+y`, `-x`.
    TL,
    /// Top right: `+y`, `+x`.
    TR,
    /// Bottom left: `-y`, `-x`.
    BL,
    /// Bottom right: `-y`, `+x`.
    BR,
}

impl Quadrant {
    /// All quadrants in output order.
    pub const ALL: [Self; 4] = [Self::TL, Self::TR, Self::BL, Self::BR];

    /// Short name, `"TL"` and so on.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::TL => "TL",
            Self::TR => "TR",
            Self::BL => "BL",
            Self::BR => "BR",
        }
    }

    /// File name of the part inside an archive.
    #[must_use]
    pub fn file_name(self) -> String {
        format!("{}.stl", self.name())
    }

    /// Whether the quadrant lies on the `+y` side of the X line.
    #[must_use]
    pub fn is_top(self) -> bool {
        matches!(self, Self::TL | Self::TR)
    }

    /// Whether the quadrant lies on the `-x` side of the Y line.
    #[must_use]
    pub fn is_left(self) -> bool {
        matches!(self, Self::TL | Self::BL)
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The four raw quadrant meshes, before debris removal.
#[derive(Debug, Clone)]
pub struct Quadrants {
    /// Top left.
    pub tl: IndexedMesh,
    /// Top right.
    pub tr: IndexedMesh,
    /// Bottom left.
    pub bl: IndexedMesh,
    /// Bottom right.
    pub br: IndexedMesh,
}

impl Quadrants {
    /// Mesh of one quadrant.
    #[must_use]
    pub fn get(&self, quadrant: Quadrant) -> &IndexedMesh {
        match quadrant {
            Quadrant::TL => &self.tl,
            Quadrant::TR => &self.tr,
            Quadrant::BL => &self.bl,
            Quadrant::BR => &self.br,
        }
    }

    /// Take the meshes out in [`Quadrant::ALL`] order.
    #[must_use]
    pub fn into_array(self) -> [(Quadrant, IndexedMesh); 4] {
        [
            (Quadrant::TL, self.tl),
            (Quadrant::TR, self.tr),
            (Quadrant::BL, self.bl),
            (Quadrant::BR, self.br),
        ]
    }
}

/// Bottom and top halves after the X cut.
#[derive(Debug, Clone)]
pub struct Halves {
    /// Inside the X male cutter.
    pub bottom: IndexedMesh,
    /// Outside the X female cutter.
    pub top: IndexedMesh,
}

/// Runs labelled booleans and reports them to a tracker.
pub(crate) struct Cutter<'t, 'o> {
    pub(crate) tracker: &'t mut StageTracker<'o>,
    pub(crate) config: BooleanConfig,
}

impl Cutter<'_, '_> {
    fn apply(
        &mut self,
        stage: Stage,
        label: &str,
        mesh: &IndexedMesh,
        prism: &Prism,
        op: BooleanOp,
    ) -> SplitResult<IndexedMesh> {
        let _span = info_span!("boolean", label).entered();
        self.tracker.boolean(label);
        boolean_operation(mesh, prism, op, &self.config)
            .map(|r| r.mesh)
            .map_err(|source| SplitError::BooleanOp {
                stage,
                label: label.to_string(),
                source,
            })
    }

    /// Split along the X line.
    pub(crate) fn cut_x(&mut self, mesh: &IndexedMesh, cutters: &CutterSet) -> SplitResult<Halves> {
        Ok(Halves {
            bottom: self.apply(Stage::CutX, "bottom", mesh, &cutters.x_male, BooleanOp::Intersection)?,
            top: self.apply(Stage::CutX, "top", mesh, &cutters.x_female, BooleanOp::Difference)?,
        })
    }

    /// Split both halves along the Y line.
    pub(crate) fn cut_y(&mut self, halves: &Halves, cutters: &CutterSet) -> SplitResult<Quadrants> {
        let (male, female) = (&cutters.y_male, &cutters.y_female);
        Ok(Quadrants {
            bl: self.apply(Stage::CutY, "BL", &halves.bottom, male, BooleanOp::Intersection)?,
            br: self.apply(Stage::CutY, "BR", &halves.bottom, female, BooleanOp::Difference)?,
            tl: self.apply(Stage::CutY, "TL", &halves.top, male, BooleanOp::Intersection)?,
            tr: self.apply(Stage::CutY, "TR", &halves.top, female, BooleanOp::Difference)?,
        })
    }
}
