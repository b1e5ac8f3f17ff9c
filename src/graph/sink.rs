// SPDX-License-Identifier: GPL-3.0-only

//! Push variant: I420 in, I420 out
//!
//! The frame is converted to RGBA inside the graph and written back into the
//! same planar buffer before `execute` returns.

use super::{FilterGraph, GraphCore, GraphState, PixelLayout, RawFrameBuffer, frame_stages};
use crate::config::GraphVariant;
use crate::errors::GraphResult;
use crate::media::{Rotation, VideoFrame};
use crate::pipelines::beauty::ParameterSnapshot;
use crate::stages::{FrameView, LandmarkSet};

/// Graph over planar I420 buffers
pub struct SinkGraph {
    core: GraphCore,
}

impl SinkGraph {
    pub(crate) fn new(core: GraphCore) -> Self {
        Self { core }
    }
}

impl FilterGraph for SinkGraph {
    fn variant(&self) -> GraphVariant {
        GraphVariant::Sink
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
        self.core.begin(PixelLayout::I420, buffer)?;
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
    let RawFrameBuffer::I420(frame) = buffer else {
        return Ok(());
    };
    let (width, height) = (frame.width(), frame.height());
    let view = FrameView::i420(frame.planes(), width, height).with_rotation(rotation);
    let Some(geometry) = core.detect(&view)? else {
        return Ok(());
    };
    let stages = frame_stages(snapshot, width, height);
    if stages.is_empty() {
        return Ok(());
    }
    core.engine()?.run_i420(frame, &geometry, snapshot, stages.as_slice())
}
