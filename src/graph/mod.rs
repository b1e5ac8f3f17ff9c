// SPDX-License-Identifier: GPL-3.0-only

//! Filter graph
//!
//! A graph is the fixed line of stages a frame runs through:
//!
//! ```text
//! landmark-detector -> face-reshape -> face-smooth -> lipstick -> blusher
//! ```
//!
//! Two variants share this line and differ in the buffer they accept:
//!
//! - [`RawDataGraph`] works on packed RGBA. The caller converts planar frames.
//! - [`SinkGraph`] accepts planar I420 and converts internally, on the GPU when
//!   the context has a device.
//!
//! Both run synchronously: `execute` returns once the result is in the buffer.

pub mod engine;
mod raw_data;
mod sink;

pub use engine::BeautyEngine;
pub use raw_data::RawDataGraph;
pub use sink::SinkGraph;

use crate::config::{Config, DetectorConfig, GraphVariant};
use crate::errors::{GraphError, GraphResult};
use crate::gpu::PipelineContext;
use crate::media::{I420Buffer, Rotation, VideoFrame};
use crate::pipelines::beauty::ParameterSnapshot;
use crate::stages::{
    ActiveStages, FaceGeometry, FrameView, LandmarkDetector, LandmarkSet, SkinToneDetector,
    StageKind,
};
use image::RgbaImage;
use std::fmt;
use tracing::{debug, info, trace};

/// Pixel layout a graph variant consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    /// Packed 8-bit RGBA
    Rgba,
    /// Planar YUV 4:2:0
    I420,
}

impl fmt::Display for PixelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PixelLayout::Rgba => f.write_str("RGBA"),
            PixelLayout::I420 => f.write_str("I420"),
        }
    }
}

impl PixelLayout {
    pub fn for_variant(variant: GraphVariant) -> Self {
        match variant {
            GraphVariant::RawData => PixelLayout::Rgba,
            GraphVariant::Sink => PixelLayout::I420,
        }
    }
}

/// Lifecycle of a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphState {
    /// Still a [`GraphBuilder`]; never reported by a built graph
    Unbuilt,
    Built,
    Executing,
    TornDown,
}

/// Scratch frame owned by the pipeline, in the graph's layout
#[derive(Debug, Clone)]
pub enum RawFrameBuffer {
    Rgba(RgbaImage),
    I420(I420Buffer),
}

impl RawFrameBuffer {
    /// Empty buffer of the given layout; grows on first use
    pub fn empty(layout: PixelLayout) -> Self {
        match layout {
            PixelLayout::Rgba => RawFrameBuffer::Rgba(RgbaImage::new(0, 0)),
            PixelLayout::I420 => RawFrameBuffer::I420(I420Buffer::new(0, 0)),
        }
    }

    pub fn layout(&self) -> PixelLayout {
        match self {
            RawFrameBuffer::Rgba(_) => PixelLayout::Rgba,
            RawFrameBuffer::I420(_) => PixelLayout::I420,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            RawFrameBuffer::Rgba(image) => image.dimensions(),
            RawFrameBuffer::I420(frame) => (frame.width(), frame.height()),
        }
    }
}

/// One beauty filter graph. Implemented by [`RawDataGraph`] and [`SinkGraph`].
pub trait FilterGraph: Send {
    fn variant(&self) -> GraphVariant;

    fn layout(&self) -> PixelLayout {
        PixelLayout::for_variant(self.variant())
    }

    fn state(&self) -> GraphState;

    /// Node names in execution order
    fn stage_names(&self) -> Vec<&'static str> {
        StageKind::ALL.iter().map(|kind| kind.name()).collect()
    }

    /// True when pixel stages run on the GPU
    fn is_gpu(&self) -> bool;

    /// Run every stage once over `buffer`, in place.
    ///
    /// `rotation` turns the buffer upright for landmark detection. Returns the
    /// landmarks detected on this frame in buffer coordinates; an empty set
    /// means no face was found and the buffer was left untouched.
    fn execute(
        &mut self,
        buffer: &mut RawFrameBuffer,
        snapshot: &ParameterSnapshot,
        rotation: Rotation,
    ) -> GraphResult<&LandmarkSet>;

    /// Release stages and engine resources. Idempotent.
    fn teardown(&mut self);
}

/// Builds a graph for a pipeline context
pub struct GraphBuilder {
    variant: GraphVariant,
    lip_color: [f32; 4],
    blush_color: [f32; 4],
    detector_config: DetectorConfig,
    detector: Option<Box<dyn LandmarkDetector>>,
}

impl GraphBuilder {
    pub fn new(config: &Config) -> Self {
        Self {
            variant: config.variant,
            lip_color: config.lip_color,
            blush_color: config.blush_color,
            detector_config: config.detector.clone(),
            detector: None,
        }
    }

    /// Replace the built-in skin-tone detector
    pub fn detector(mut self, detector: Box<dyn LandmarkDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Create the engine on `context` and assemble the stages
    pub fn build(self, context: &PipelineContext) -> GraphResult<Box<dyn FilterGraph>> {
        let detector = self
            .detector
            .unwrap_or_else(|| Box::new(SkinToneDetector::new(self.detector_config)));
        let engine = BeautyEngine::new(context, self.lip_color, self.blush_color)?;

        info!(
            variant = %self.variant,
            detector = detector.name(),
            gpu = engine.is_gpu(),
            "Filter graph built"
        );

        let core = GraphCore::new(detector, engine);
        Ok(match self.variant {
            GraphVariant::RawData => Box::new(RawDataGraph::new(core)),
            GraphVariant::Sink => Box::new(SinkGraph::new(core)),
        })
    }
}

/// State and nodes shared by both variants
pub(crate) struct GraphCore {
    state: GraphState,
    detector: Option<Box<dyn LandmarkDetector>>,
    engine: Option<BeautyEngine>,
    landmarks: LandmarkSet,
}

impl GraphCore {
    fn new(detector: Box<dyn LandmarkDetector>, engine: BeautyEngine) -> Self {
        Self {
            state: GraphState::Built,
            detector: Some(detector),
            engine: Some(engine),
            landmarks: LandmarkSet::new(),
        }
    }

    fn state(&self) -> GraphState {
        self.state
    }

    fn is_gpu(&self) -> bool {
        self.engine.as_ref().is_some_and(BeautyEngine::is_gpu)
    }

    /// Check the buffer and enter `Executing`
    fn begin(&mut self, expected: PixelLayout, buffer: &RawFrameBuffer) -> GraphResult<()> {
        if self.state == GraphState::TornDown {
            return Err(GraphError::TornDown);
        }
        let actual = buffer.layout();
        if actual != expected {
            return Err(GraphError::LayoutMismatch { expected, actual });
        }
        self.state = GraphState::Executing;
        Ok(())
    }

    fn finish(&mut self) {
        if self.state == GraphState::Executing {
            self.state = GraphState::Built;
        }
    }

    /// Landmark node. Returns the face geometry in buffer coordinates, or
    /// None for an empty set.
    fn detect(&mut self, view: &FrameView<'_>) -> GraphResult<Option<FaceGeometry>> {
        let detector = self.detector.as_mut().ok_or(GraphError::TornDown)?;
        if let Err(e) = detector.detect(view, &mut self.landmarks) {
            self.landmarks.clear();
            return Err(e);
        }
        if view.rotation() != Rotation::Deg0 {
            self.landmarks.map_points(|p| view.to_buffer(p));
        }
        let geometry = FaceGeometry::from_landmarks(&self.landmarks);
        if geometry.is_err() {
            self.landmarks.clear();
        }
        geometry
    }

    fn engine(&mut self) -> GraphResult<&mut BeautyEngine> {
        self.engine.as_mut().ok_or(GraphError::TornDown)
    }

    fn teardown(&mut self) {
        if self.state == GraphState::TornDown {
            return;
        }
        self.state = GraphState::TornDown;
        self.detector = None;
        self.engine = None;
        self.landmarks.clear();
        debug!("Filter graph torn down");
    }
}

/// Active pixel stages, logged at trace level
fn frame_stages(snapshot: &ParameterSnapshot, width: u32, height: u32) -> ActiveStages {
    let stages = ActiveStages::for_snapshot(snapshot);
    trace!(width, height, ?stages, "Executing filter graph");
    stages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ComputeBackend, PowerPreference};
    use crate::media::{i420_to_rgba, synthetic_face_frame};
    use crate::stages::face_template;

    struct FixedDetector(Option<[[f32; 2]; 68]>);

    impl LandmarkDetector for FixedDetector {
        fn name(&self) -> &str {
            "fixed"
        }

        fn detect(
            &mut self,
            _view: &FrameView<'_>,
            landmarks: &mut LandmarkSet,
        ) -> GraphResult<()> {
            match &self.0 {
                Some(points) => landmarks.set_points(points),
                None => {
                    landmarks.clear();
                    Ok(())
                }
            }
        }
    }

    fn software_context() -> PipelineContext {
        let mut context = PipelineContext::new(ComputeBackend::Software, PowerPreference::LowPower);
        context.initialize().unwrap();
        context
    }

    fn build(variant: GraphVariant, detector: FixedDetector) -> Box<dyn FilterGraph> {
        let config = Config {
            variant,
            ..Default::default()
        };
        GraphBuilder::new(&config)
            .detector(Box::new(detector))
            .build(&software_context())
            .unwrap()
    }

    fn snapshot() -> ParameterSnapshot {
        ParameterSnapshot {
            whiten: 1.0,
            lipstick: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn stage_names_follow_fixed_order() {
        let graph = build(GraphVariant::RawData, FixedDetector(None));
        assert_eq!(
            graph.stage_names(),
            vec!["landmark-detector", "face-reshape", "face-smooth", "lipstick", "blusher"]
        );
        assert_eq!(graph.state(), GraphState::Built);
        assert_eq!(graph.layout(), PixelLayout::Rgba);
    }

    #[test]
    fn wrong_layout_is_rejected() {
        let mut graph = build(GraphVariant::Sink, FixedDetector(None));
        let mut buffer = RawFrameBuffer::Rgba(RgbaImage::new(8, 8));
        let result = graph.execute(&mut buffer, &snapshot(), Rotation::Deg0);
        assert!(matches!(
            result,
            Err(GraphError::LayoutMismatch {
                expected: PixelLayout::I420,
                actual: PixelLayout::Rgba
            })
        ));
        assert_eq!(graph.state(), GraphState::Built);
    }

    #[test]
    fn execute_after_teardown_fails() {
        let mut graph = build(GraphVariant::RawData, FixedDetector(None));
        graph.teardown();
        graph.teardown();
        assert_eq!(graph.state(), GraphState::TornDown);
        let mut buffer = RawFrameBuffer::Rgba(RgbaImage::new(8, 8));
        assert!(matches!(
            graph.execute(&mut buffer, &snapshot(), Rotation::Deg0),
            Err(GraphError::TornDown)
        ));
    }

    #[test]
    fn empty_landmarks_pass_through() {
        let mut graph = build(GraphVariant::Sink, FixedDetector(None));
        let frame = synthetic_face_frame(64, 64);
        let mut buffer = RawFrameBuffer::I420(frame.clone());
        let landmarks = graph.execute(&mut buffer, &snapshot(), Rotation::Deg0).unwrap();
        assert!(landmarks.is_empty());
        assert!(matches!(buffer, RawFrameBuffer::I420(ref out) if *out == frame));
    }

    #[test]
    fn sink_graph_modifies_face() {
        let points = face_template([16.0, 12.0], [96.0, 104.0]);
        let mut graph = build(GraphVariant::Sink, FixedDetector(Some(points)));
        let frame = synthetic_face_frame(128, 128);
        let mut buffer = RawFrameBuffer::I420(frame.clone());
        let landmarks = graph.execute(&mut buffer, &snapshot(), Rotation::Deg0).unwrap();
        assert_eq!(landmarks.len(), 68);
        let RawFrameBuffer::I420(out) = buffer else {
            panic!("layout changed");
        };
        assert_eq!(out.strides(), frame.strides());
        assert_ne!(out, frame);
    }

    #[test]
    fn rotated_landmarks_are_reported_in_buffer_space() {
        // Buffer is 128x96 landscape; the upright picture is 96x128 portrait
        let points = face_template([12.0, 12.0], [72.0, 104.0]);
        for variant in GraphVariant::ALL {
            let mut graph = build(variant, FixedDetector(Some(points)));
            let frame = synthetic_face_frame(128, 96);
            let mut buffer = match variant {
                GraphVariant::RawData => {
                    RawFrameBuffer::Rgba(i420_to_rgba(&frame.planes(), 128, 96).unwrap())
                }
                GraphVariant::Sink => RawFrameBuffer::I420(frame),
            };
            let landmarks = graph
                .execute(&mut buffer, &snapshot(), Rotation::Deg90)
                .unwrap();

            let expected: Vec<_> = points
                .iter()
                .map(|&p| Rotation::Deg90.buffer_point(p, 128, 96))
                .collect();
            assert_eq!(landmarks.points(), expected.as_slice(), "{variant}");
            let chin = landmarks.points()[8];
            assert!(chin[0] > 100.0 && chin[1] < 96.0, "{variant}: chin {:?}", chin);
        }
    }
}
