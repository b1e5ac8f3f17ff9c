// SPDX-License-Identifier: GPL-3.0-only

//! Pull variant: RGBA in, RGBA out

use super::{FilterGraph, GraphCore, GraphState, PixelLayout, RawFrameBuffer, frame_stages};
use crate::config::GraphVariant;
use crate::errors::GraphResult;
use crate::media::Rotation;
use crate::pipelines::beauty::ParameterSnapshot;
use crate::stages::{FrameView, LandmarkSet};

/// Graph over packed RGBA buffers. The caller converts planar frames.
pub struct RawDataGraph {
    core: GraphCore,
}

impl RawDataGraph {
    pub(crate) fn new(core: GraphCore) -> Self {
        Self { core }
    }
}

impl FilterGraph for RawDataGraph {
    fn variant(&self) -> GraphVariant {
        GraphVariant::RawData
    }

    fn state(&self) -> GraphState {
        self.core.state()
    }

    fn is_gpu(&self) -> bool {
        self.core.is_gpu()
    }

    fn execute(
        &mut self,
        buffer: &mut RawFrameBuffer,
        snapshot: &ParameterSnapshot,
        rotation: Rotation,
    ) -> GraphResult<&LandmarkSet> {
        self.core.begin(PixelLayout::Rgba, buffer)?;
        let result = run(&mut self.core, buffer, snapshot, rotation);
        self.core.finish();
        result.map(|()| &self.core.landmarks)
    }

    fn teardown(&mut self) {
        self.core.teardown();
    }
}

fn run(
    core: &mut GraphCore,
    buffer: &mut RawFrameBuffer,
    snapshot: &ParameterSnapshot,
    rotation: Rotation,
) -> GraphResult<()> {
    let RawFrameBuffer::Rgba(image) = buffer else {
        return Ok(());
    };
    let view = FrameView::rgba(image).with_rotation(rotation);
    let Some(geometry) = core.detect(&view)? else {
        return Ok(());
    };
    let (width, height) = image.dimensions();
    let stages = frame_stages(snapshot, width, height);
    if stages.is_empty() {
        return Ok(());
    }
    core.engine()?.run_rgba(image, &geometry, snapshot, stages.as_slice())
}
