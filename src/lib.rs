// SPDX-License-Identifier: GPL-3.0-only

//! frame-beauty - GPU face beautification for live video frames
//!
//! A [`BeautyPipeline`] attaches to one video track, takes each planar I420
//! frame, runs it through a filter graph (landmark detection, face reshape,
//! skin smoothing and whitening, lipstick, blusher) and writes the result back
//! into the same planes before returning.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`media`]: frame types and BT.601 color conversion
//! - [`gpu`]: headless wgpu context with a per-thread "current" binding
//! - [`graph`]: the filter graph in its raw-data and sink variants
//! - [`stages`]: landmark detection and the CPU beauty kernels
//! - [`shaders`]: the WGSL kernels and their GPU driver
//! - [`pipelines`]: the per-track pipeline and its parameter surface
//! - [`config`]: JSON configuration
//!
//! # Example
//!
//! ```no_run
//! use frame_beauty::{BeautyPipeline, Config, TrackHandle};
//! use frame_beauty::media::synthetic_face_frame;
//!
//! let mut pipeline = BeautyPipeline::new(Some(TrackHandle::new("front")), Config::default())?;
//! pipeline.set_white(0.6);
//! let mut frame = synthetic_face_frame(640, 480);
//! let outcome = pipeline.process(&mut frame);
//! # Ok::<(), frame_beauty::errors::PipelineError>(())
//! ```

pub mod config;
pub mod constants;
pub mod errors;
pub mod gpu;
pub mod graph;
pub mod media;
pub mod pipelines;
pub mod shaders;
pub mod stages;

// Re-export commonly used types
pub use config::{ComputeBackend, Config, GraphVariant};
pub use constants::Effect;
pub use errors::{BeautyError, BeautyResult};
pub use media::{I420Buffer, I420FrameMut, VideoFrame};
pub use pipelines::beauty::{
    BeautyPipeline, FrameOutcome, ParameterHandle, PipelineStats, TrackHandle, VideoSink,
};

/// Version string baked in at build time
pub const VERSION: &str = env!("GIT_VERSION");
