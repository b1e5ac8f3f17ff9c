// SPDX-License-Identifier: GPL-3.0-only

//! Filter stages of the beauty graph
//!
//! The graph is a fixed line: landmark detection, then face reshape, skin
//! smoothing/whitening, lipstick and blusher. Each beauty stage reads the
//! previous stage's RGBA buffer and writes one of identical dimensions.
//!
//! These are the CPU kernels. The GPU engine runs the same math from
//! `shaders/beauty.wgsl`.

pub mod blusher;
pub mod chain;
pub mod detector;
pub mod geometry;
pub mod landmarks;
pub mod lipstick;
pub mod reshape;
pub mod sampling;
pub mod skin;

use crate::errors::GraphResult;
use crate::pipelines::beauty::ParameterSnapshot;
use image::RgbaImage;

pub use blusher::BlusherStage;
pub use chain::SoftwareChain;
pub use detector::{FrameView, LandmarkDetector, SkinToneDetector, face_template};
pub use geometry::FaceGeometry;
pub use landmarks::{LandmarkSet, Point};
pub use lipstick::LipstickStage;
pub use reshape::FaceReshapeStage;
pub use skin::FaceSmoothStage;

/// Graph nodes in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    LandmarkDetector,
    FaceReshape,
    FaceSmooth,
    Lipstick,
    Blusher,
}

impl StageKind {
    /// All nodes in the fixed execution order
    pub const ALL: [StageKind; 5] = [
        StageKind::LandmarkDetector,
        StageKind::FaceReshape,
        StageKind::FaceSmooth,
        StageKind::Lipstick,
        StageKind::Blusher,
    ];

    /// Pixel stages in execution order
    pub const BEAUTY: [StageKind; 4] = [
        StageKind::FaceReshape,
        StageKind::FaceSmooth,
        StageKind::Lipstick,
        StageKind::Blusher,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StageKind::LandmarkDetector => "landmark-detector",
            StageKind::FaceReshape => "face-reshape",
            StageKind::FaceSmooth => "face-smooth",
            StageKind::Lipstick => "lipstick",
            StageKind::Blusher => "blusher",
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Parameters a stage accepts, by capability
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StageParams {
    None,
    Reshape { slim: f32, eye_zoom: f32 },
    Skin { smooth: f32, whiten: f32 },
    Blend { level: f32 },
}

impl StageParams {
    /// Parameters of `kind` taken from one frame's snapshot
    pub fn for_stage(kind: StageKind, snapshot: &ParameterSnapshot) -> Self {
        match kind {
            StageKind::LandmarkDetector => StageParams::None,
            StageKind::FaceReshape => StageParams::Reshape {
                slim: snapshot.face_slim,
                eye_zoom: snapshot.eye_zoom,
            },
            StageKind::FaceSmooth => StageParams::Skin {
                smooth: snapshot.blur_alpha,
                whiten: snapshot.whiten,
            },
            StageKind::Lipstick => StageParams::Blend {
                level: snapshot.lipstick,
            },
            StageKind::Blusher => StageParams::Blend {
                level: snapshot.blusher,
            },
        }
    }

    /// A stage whose levels all sit at the minimum passes pixels through
    pub fn is_identity(&self) -> bool {
        match *self {
            StageParams::None => true,
            StageParams::Reshape { slim, eye_zoom } => slim <= 0.0 && eye_zoom <= 0.0,
            StageParams::Skin { smooth, whiten } => smooth <= 0.0 && whiten <= 0.0,
            StageParams::Blend { level } => level <= 0.0,
        }
    }
}

/// Pixel stages that are active for one frame, in execution order
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ActiveStages {
    kinds: [StageKind; 4],
    len: usize,
}

impl ActiveStages {
    pub fn for_snapshot(snapshot: &ParameterSnapshot) -> Self {
        let mut active = Self {
            kinds: StageKind::BEAUTY,
            len: 0,
        };
        for kind in StageKind::BEAUTY {
            if !StageParams::for_stage(kind, snapshot).is_identity() {
                active.kinds[active.len] = kind;
                active.len += 1;
            }
        }
        active
    }

    pub fn as_slice(&self) -> &[StageKind] {
        &self.kinds[..self.len]
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl std::fmt::Debug for ActiveStages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

/// What a stage sees of the current frame
#[derive(Debug, Clone, Copy)]
pub struct StageInput<'a> {
    pub geometry: &'a FaceGeometry,
    pub params: StageParams,
}

/// One beauty node. `dst` has the dimensions of `src`.
pub trait FilterStage: Send {
    fn kind(&self) -> StageKind;

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn execute(
        &mut self,
        input: &StageInput<'_>,
        src: &RgbaImage,
        dst: &mut RgbaImage,
    ) -> GraphResult<()>;
}
