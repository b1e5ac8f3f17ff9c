// SPDX-License-Identifier: GPL-3.0-only

//! CPU execution of the beauty stages

use super::{
    BlusherStage, FaceGeometry, FaceReshapeStage, FaceSmoothStage, FilterStage, LipstickStage,
    StageInput, StageKind, StageParams,
};
use crate::errors::GraphResult;
use crate::pipelines::beauty::ParameterSnapshot;
use image::RgbaImage;
use tracing::trace;

/// The four beauty stages in fixed order, ping-ponging between two buffers
pub struct SoftwareChain {
    stages: Vec<Box<dyn FilterStage>>,
    scratch: RgbaImage,
}

impl SoftwareChain {
    pub fn new(lip_color: [f32; 4], blush_color: [f32; 4]) -> Self {
        let stages: Vec<Box<dyn FilterStage>> = vec![
            Box::new(FaceReshapeStage::new()),
            Box::new(FaceSmoothStage::new()),
            Box::new(LipstickStage::new(lip_color)),
            Box::new(BlusherStage::new(blush_color)),
        ];
        debug_assert!(
            stages
                .iter()
                .map(|s| s.kind())
                .eq(StageKind::BEAUTY.into_iter())
        );
        Self {
            stages,
            scratch: RgbaImage::new(0, 0),
        }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every active stage over `image` in place
    pub fn run(
        &mut self,
        image: &mut RgbaImage,
        geometry: &FaceGeometry,
        snapshot: &ParameterSnapshot,
    ) -> GraphResult<()> {
        if self.scratch.dimensions() != image.dimensions() {
            let (w, h) = image.dimensions();
            self.scratch = RgbaImage::new(w, h);
        }

        for stage in &mut self.stages {
            let params = StageParams::for_stage(stage.kind(), snapshot);
            if params.is_identity() {
                continue;
            }
            trace!(stage = stage.name(), "Running CPU stage");
            let input = StageInput { geometry, params };
            stage.execute(&input, image, &mut self.scratch)?;
            std::mem::swap(image, &mut self.scratch);
        }
        Ok(())
    }
}
