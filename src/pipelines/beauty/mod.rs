// SPDX-License-Identifier: GPL-3.0-only

//! Beauty pipeline for one video track
//!
//! The pipeline owns a GPU context, a filter graph and scratch buffers. The
//! track calls [`BeautyPipeline::process`] once per frame on its own thread;
//! the frame is edited in place before the call returns. Any failure leaves
//! the frame exactly as it arrived.
//!
//! # Frame flow
//!
//! 1. Duplicate the caller's planes into scratch storage
//! 2. Convert to the graph's layout (RGBA for the raw-data variant)
//! 3. Execute the graph
//! 4. Convert back and copy into the caller's planes (`stride x rows` each)

pub mod params;
pub mod stats;

pub use params::{ParameterHandle, ParameterSnapshot, ParameterState};
pub use stats::PipelineStats;

use crate::config::{Config, GraphVariant};
use crate::errors::{BeautyError, BeautyResult, ConvertError, PipelineError, PipelineResult};
use crate::gpu::PipelineContext;
use crate::graph::{FilterGraph, GraphBuilder, PixelLayout, RawFrameBuffer};
use crate::media::conversions::validate_planes;
use crate::media::{I420Buffer, VideoFrame, i420_to_rgba_into, rgba_to_i420_into};
use crate::stages::LandmarkDetector;
use image::RgbaImage;
use std::time::Instant;
use tracing::{info, trace, warn};

/// Identity of the video track a pipeline is attached to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackHandle {
    id: String,
}

impl TrackHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// What happened to one frame
#[derive(Debug, Clone)]
pub enum FrameOutcome {
    /// Effects applied and written back
    Beautified,
    /// No face detected; frame untouched
    NoFace,
    /// Every level at its minimum; frame untouched
    EffectsOff,
    /// A step failed; frame untouched
    PassedThrough(BeautyError),
}

impl FrameOutcome {
    /// Whether the caller's planes were written
    pub fn is_modified(&self) -> bool {
        matches!(self, FrameOutcome::Beautified)
    }
}

/// Receiver of track frames. `None` is a null frame from the track.
pub trait VideoSink {
    fn on_frame(&mut self, frame: Option<&mut dyn VideoFrame>) -> FrameOutcome;
}

pub struct BeautyPipeline {
    track: TrackHandle,
    variant: GraphVariant,
    // Dropped before the context it runs on
    graph: Box<dyn FilterGraph>,
    context: PipelineContext,
    params: ParameterHandle,
    /// Copy of the caller's planes (raw-data variant)
    planar: I420Buffer,
    /// Buffer handed to the graph
    work: RawFrameBuffer,
    stats: PipelineStats,
}

impl BeautyPipeline {
    /// Attach a pipeline to `track`.
    ///
    /// Fails with [`PipelineError::NullTrack`] before any GPU work when the
    /// track is absent or has an empty id.
    pub fn new(track: Option<TrackHandle>, config: Config) -> PipelineResult<Self> {
        Self::build(track, config, None)
    }

    /// Like [`BeautyPipeline::new`] with an external landmark detector
    pub fn with_detector(
        track: Option<TrackHandle>,
        config: Config,
        detector: Box<dyn LandmarkDetector>,
    ) -> PipelineResult<Self> {
        Self::build(track, config, Some(detector))
    }

    fn build(
        track: Option<TrackHandle>,
        config: Config,
        detector: Option<Box<dyn LandmarkDetector>>,
    ) -> PipelineResult<Self> {
        let track = track
            .filter(|track| !track.id.is_empty())
            .ok_or(PipelineError::NullTrack)?;
        config.validate().map_err(PipelineError::Config)?;

        let mut context = PipelineContext::new(config.backend, config.power_preference);
        context.initialize()?;

        let graph = {
            let _current = context.make_current()?;
            let mut builder = GraphBuilder::new(&config);
            if let Some(detector) = detector {
                builder = builder.detector(detector);
            }
            builder.build(&context)?
        };

        info!(
            track = %track.id,
            variant = %config.variant,
            gpu = graph.is_gpu(),
            "Beauty pipeline created"
        );

        Ok(Self {
            track,
            variant: config.variant,
            work: RawFrameBuffer::empty(PixelLayout::for_variant(config.variant)),
            graph,
            context,
            params: ParameterHandle::new(config.levels),
            planar: I420Buffer::new(0, 0),
            stats: PipelineStats::default(),
        })
    }

    pub fn track(&self) -> &TrackHandle {
        &self.track
    }

    pub fn variant(&self) -> GraphVariant {
        self.variant
    }

    pub fn is_gpu_accelerated(&self) -> bool {
        self.graph.is_gpu()
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Handle for changing levels from other threads
    pub fn params(&self) -> ParameterHandle {
        self.params.clone()
    }

    pub fn set_face_slim_level(&self, level: f32) -> f32 {
        self.params.set_face_slim_level(level)
    }

    pub fn set_eye_zoom_level(&self, level: f32) -> f32 {
        self.params.set_eye_zoom_level(level)
    }

    pub fn set_blur_alpha(&self, alpha: f32) -> f32 {
        self.params.set_blur_alpha(alpha)
    }

    pub fn set_white(&self, level: f32) -> f32 {
        self.params.set_white(level)
    }

    pub fn set_lipstick_blend_level(&self, level: f32) -> f32 {
        self.params.set_lipstick_blend_level(level)
    }

    pub fn set_blusher_blend_level(&self, level: f32) -> f32 {
        self.params.set_blusher_blend_level(level)
    }

    /// Beautify one frame in place. Never fails; see [`FrameOutcome`].
    pub fn process<F: VideoFrame + ?Sized>(&mut self, frame: &mut F) -> FrameOutcome {
        let started = Instant::now();
        let outcome = match self.try_process(frame) {
            Ok(outcome) => outcome,
            Err(e) => FrameOutcome::PassedThrough(e),
        };
        self.record(&outcome, started);
        outcome
    }

    fn try_process<F: VideoFrame + ?Sized>(&mut self, frame: &mut F) -> BeautyResult<FrameOutcome> {
        let (width, height) = (frame.width(), frame.height());
        let strides = frame.planes().strides;
        let rotation = frame.rotation();
        validate_planes(&frame.planes(), width, height)?;

        let snapshot = self.params.snapshot();
        if snapshot.all_off() {
            return Ok(FrameOutcome::EffectsOff);
        }

        let _current = self.context.make_current()?;

        match &mut self.work {
            RawFrameBuffer::I420(buffer) => {
                buffer.ensure_layout(width, height, strides);
                buffer.copy_from(&frame.planes());
            }
            RawFrameBuffer::Rgba(image) => {
                self.planar.ensure_layout(width, height, strides);
                self.planar.copy_from(&frame.planes());
                if image.dimensions() != (width, height) {
                    *image = RgbaImage::new(width, height);
                }
                i420_to_rgba_into(&self.planar.planes(), width, height, image)?;
            }
        }

        let found = !self
            .graph
            .execute(&mut self.work, &snapshot, rotation)?
            .is_empty();
        if !found {
            return Ok(FrameOutcome::NoFace);
        }

        match &self.work {
            RawFrameBuffer::I420(buffer) => buffer.copy_to(&mut frame.planes_mut()),
            RawFrameBuffer::Rgba(image) => {
                rgba_to_i420_into(image, &mut self.planar.planes_mut())?;
                self.planar.copy_to(&mut frame.planes_mut());
            }
        }
        Ok(FrameOutcome::Beautified)
    }

    fn record(&mut self, outcome: &FrameOutcome, started: Instant) {
        self.stats.frames_processed += 1;
        match outcome {
            FrameOutcome::Beautified => self.stats.frames_beautified += 1,
            FrameOutcome::NoFace => self.stats.frames_without_face += 1,
            FrameOutcome::EffectsOff => {}
            FrameOutcome::PassedThrough(e) => {
                self.stats.frames_passed_through += 1;
                warn!(track = %self.track.id, error = %e, "Beauty failed, frame passed through");
            }
        }
        let elapsed = started.elapsed();
        self.stats.last_frame_time = Some(elapsed);
        trace!(track = %self.track.id, ?outcome, ?elapsed, "Frame processed");
    }

    /// Tear down the graph, then the context. Idempotent.
    pub fn shutdown(&mut self) {
        if !self.context.is_ready() {
            return;
        }
        self.graph.teardown();
        self.context.teardown();
        info!(
            track = %self.track.id,
            frames = self.stats.frames_processed,
            beautified = self.stats.frames_beautified,
            "Beauty pipeline shut down"
        );
    }
}

impl VideoSink for BeautyPipeline {
    fn on_frame(&mut self, frame: Option<&mut dyn VideoFrame>) -> FrameOutcome {
        match frame {
            Some(frame) => self.process(frame),
            None => {
                let outcome = FrameOutcome::PassedThrough(ConvertError::NullFrame.into());
                self.record(&outcome, Instant::now());
                outcome
            }
        }
    }
}

impl Drop for BeautyPipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ComputeBackend;
    use crate::gpu::current_context;
    use crate::media::synthetic_face_frame;

    fn software_config(variant: GraphVariant) -> Config {
        Config {
            variant,
            backend: ComputeBackend::Software,
            ..Default::default()
        }
    }

    #[test]
    fn null_track_fails_before_context() {
        let result = BeautyPipeline::new(None, software_config(GraphVariant::Sink));
        assert!(matches!(result, Err(PipelineError::NullTrack)));
        let result = BeautyPipeline::new(
            Some(TrackHandle::new("")),
            software_config(GraphVariant::Sink),
        );
        assert!(matches!(result, Err(PipelineError::NullTrack)));
        assert_eq!(current_context(), None);
    }

    #[test]
    fn effects_off_skips_graph() {
        let mut pipeline = BeautyPipeline::new(
            Some(TrackHandle::new("camera")),
            software_config(GraphVariant::RawData),
        )
        .unwrap();
        let mut frame = synthetic_face_frame(64, 64);
        let original = frame.clone();
        assert!(matches!(pipeline.process(&mut frame), FrameOutcome::EffectsOff));
        assert_eq!(frame, original);
        assert_eq!(pipeline.stats().frames_processed, 1);
    }

    #[test]
    fn null_frame_is_counted() {
        let mut pipeline = BeautyPipeline::new(
            Some(TrackHandle::new("camera")),
            software_config(GraphVariant::Sink),
        )
        .unwrap();
        let outcome = pipeline.on_frame(None);
        assert!(matches!(
            outcome,
            FrameOutcome::PassedThrough(BeautyError::Convert(ConvertError::NullFrame))
        ));
        assert_eq!(pipeline.stats().frames_passed_through, 1);
    }

    #[test]
    fn odd_frame_passes_through() {
        let mut pipeline = BeautyPipeline::new(
            Some(TrackHandle::new("camera")),
            software_config(GraphVariant::Sink),
        )
        .unwrap();
        pipeline.set_white(1.0);
        let mut frame = I420Buffer::filled(7, 4, 100, 128, 128);
        let original = frame.clone();
        let outcome = pipeline.process(&mut frame);
        assert!(!outcome.is_modified());
        assert!(matches!(outcome, FrameOutcome::PassedThrough(_)));
        assert_eq!(frame, original);
    }

    #[test]
    fn shutdown_is_idempotent() {
        let mut pipeline = BeautyPipeline::new(
            Some(TrackHandle::new("camera")),
            software_config(GraphVariant::Sink),
        )
        .unwrap();
        pipeline.shutdown();
        pipeline.shutdown();
        pipeline.set_white(1.0);
        let mut frame = synthetic_face_frame(64, 64);
        assert!(matches!(
            pipeline.process(&mut frame),
            FrameOutcome::PassedThrough(_)
        ));
    }
}
