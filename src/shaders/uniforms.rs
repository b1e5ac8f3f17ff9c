// SPDX-License-Identifier: GPL-3.0-only

//! Uniform structs shared with the compute shaders
//!
//! Every field is a 16-byte vector so the Rust layout matches WGSL's uniform
//! layout rules without manual padding.

use crate::constants::{
    BLUSH_MAX_OPACITY, EYE_MAX_ZOOM, LIPSTICK_MAX_OPACITY, SLIM_MAX_SHIFT, SMOOTH_SIGMA,
    WHITEN_MAX_BETA,
};
use crate::media::Plane;
use crate::pipelines::beauty::ParameterSnapshot;
use crate::shaders::gpu_processor::words_for_bytes;
use crate::stages::FaceGeometry;
use bytemuck::{Pod, Zeroable};

/// Mirrors `BeautyUniforms` in beauty.wgsl
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct BeautyUniforms {
    /// width, height, 0, 0
    pub dims: [u32; 4],
    /// face_slim, eye_zoom, blur_alpha, whiten
    pub levels: [f32; 4],
    /// lipstick, blusher, 0, 0
    pub levels2: [f32; 4],
    /// slim max shift, eye max zoom, whiten max beta, smooth sigma
    pub tuning: [f32; 4],
    /// lipstick opacity, blush opacity, smooth radius, lip feather
    pub opacity: [f32; 4],
    /// center.xy, radii.xy
    pub face: [f32; 4],
    /// left eye.xy, right eye.xy
    pub eyes: [f32; 4],
    /// eye radius, slim radius, cheek radius, 0
    pub radii: [f32; 4],
    /// left contour.xy, right contour.xy
    pub slim: [f32; 4],
    /// nose tip.xy, 0, 0
    pub slim_target: [f32; 4],
    /// left cheek.xy, right cheek.xy
    pub cheeks: [f32; 4],
    pub lip_color: [f32; 4],
    pub blush_color: [f32; 4],
    /// 12 outer lip points, two per vector
    pub lip_outer: [[f32; 4]; 6],
    /// 8 inner lip points, two per vector
    pub lip_inner: [[f32; 4]; 4],
}

fn pairs<const N: usize, const M: usize>(points: &[[f32; 2]; N]) -> [[f32; 4]; M] {
    std::array::from_fn(|i| {
        let a = points[2 * i];
        let b = points[2 * i + 1];
        [a[0], a[1], b[0], b[1]]
    })
}

impl BeautyUniforms {
    pub fn new(
        width: u32,
        height: u32,
        g: &FaceGeometry,
        levels: &ParameterSnapshot,
        lip_color: [f32; 4],
        blush_color: [f32; 4],
    ) -> Self {
        Self {
            dims: [width, height, 0, 0],
            levels: [
                levels.face_slim,
                levels.eye_zoom,
                levels.blur_alpha,
                levels.whiten,
            ],
            levels2: [levels.lipstick, levels.blusher, 0.0, 0.0],
            tuning: [SLIM_MAX_SHIFT, EYE_MAX_ZOOM, WHITEN_MAX_BETA, SMOOTH_SIGMA],
            opacity: [
                LIPSTICK_MAX_OPACITY,
                BLUSH_MAX_OPACITY,
                g.smooth_radius,
                g.lip_feather,
            ],
            face: [g.center[0], g.center[1], g.radii[0], g.radii[1]],
            eyes: [g.left_eye[0], g.left_eye[1], g.right_eye[0], g.right_eye[1]],
            radii: [g.eye_radius, g.slim_radius, g.cheek_radius, 0.0],
            slim: [
                g.slim_left[0],
                g.slim_left[1],
                g.slim_right[0],
                g.slim_right[1],
            ],
            slim_target: [g.slim_target[0], g.slim_target[1], 0.0, 0.0],
            cheeks: [
                g.left_cheek[0],
                g.left_cheek[1],
                g.right_cheek[0],
                g.right_cheek[1],
            ],
            lip_color,
            blush_color,
            lip_outer: pairs::<12, 6>(&g.lip_outer),
            lip_inner: pairs::<8, 4>(&g.lip_inner),
        }
    }
}

/// Mirrors `PlaneUniforms` in yuv_convert.wgsl.
///
/// Planes are packed into one u32 storage buffer: Y rows first, then U, then
/// V, each row padded to a whole word.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable, PartialEq, Eq)]
pub struct PlaneUniforms {
    /// width, height, chroma width, chroma height
    pub dims: [u32; 4],
    /// Y row stride in words, chroma row stride in words, 0, 0
    pub strides: [u32; 4],
    /// Y, U, V word offsets, 0
    pub offsets: [u32; 4],
}

impl PlaneUniforms {
    pub fn new(width: u32, height: u32) -> Self {
        let chroma_width = Plane::U.row_width(width) as u32;
        let chroma_height = Plane::U.rows(height) as u32;
        let y_words = words_for_bytes(width as usize) as u32;
        let uv_words = words_for_bytes(chroma_width as usize) as u32;
        let u_offset = y_words * height;
        let v_offset = u_offset + uv_words * chroma_height;
        Self {
            dims: [width, height, chroma_width, chroma_height],
            strides: [y_words, uv_words, 0, 0],
            offsets: [0, u_offset, v_offset, 0],
        }
    }

    pub fn total_words(&self) -> usize {
        (self.offsets[2] + self.strides[1] * self.dims[3]) as usize
    }

    /// Word stride and word offset of `plane`
    pub fn plane_layout(&self, plane: Plane) -> (usize, usize) {
        match plane {
            Plane::Y => (self.strides[0] as usize, self.offsets[0] as usize),
            Plane::U => (self.strides[1] as usize, self.offsets[1] as usize),
            Plane::V => (self.strides[1] as usize, self.offsets[2] as usize),
        }
    }
}
