// SPDX-License-Identifier: GPL-3.0-only

//! Frame types and color conversion
//!
//! # Color Space Conversion
//!
//! Tracks deliver planar I420 (YUV 4:2:0). The raw-data graph works on packed
//! RGBA, so the [`conversions`] module provides the CPU converter in both
//! directions. The planar sink graph converts on the GPU with the same
//! integer coefficients (see `shaders/yuv_convert.wgsl`).
//!
//! # Modules
//!
//! - [`frame`]: the [`VideoFrame`] trait and owned/borrowed I420 frames
//! - [`conversions`]: BT.601 I420 <-> RGBA
//! - [`synthetic`]: generated test faces

pub mod conversions;
pub mod frame;
pub mod synthetic;

// Re-export commonly used types
pub use conversions::{i420_to_rgba, i420_to_rgba_into, rgba_to_i420, rgba_to_i420_into};
pub use frame::{I420Buffer, I420FrameMut, I420Planes, I420PlanesMut, Plane, Rotation, VideoFrame};
pub use synthetic::synthetic_face_frame;
