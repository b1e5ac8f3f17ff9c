// SPDX-License-Identifier: GPL-3.0-only

//! Face slimming and eye enlargement
//!
//! Both are inverse warps: every output pixel looks up where it comes from.
//! Slimming is a local translation warp that pulls the jaw contour towards
//! the nose tip; eye zoom is a local scaling warp around each eye center.

use super::geometry::FaceGeometry;
use super::landmarks::Point;
use super::sampling::{PixelRect, bilinear, load, pack};
use super::{FilterStage, StageInput, StageKind, StageParams};
use crate::constants::{EYE_MAX_ZOOM, SLIM_MAX_SHIFT};
use crate::errors::GraphResult;
use image::RgbaImage;

/// Local translation warp: content at `center` moves by `shift`, fading out at `radius`
pub fn translate_warp(p: Point, center: Point, shift: Point, radius: f32) -> Point {
    let d = [p[0] - center[0], p[1] - center[1]];
    let d2 = d[0] * d[0] + d[1] * d[1];
    let r2 = radius * radius;
    if d2 >= r2 {
        return p;
    }
    let k = (r2 - d2) / (r2 - d2 + shift[0] * shift[0] + shift[1] * shift[1]);
    let k2 = k * k;
    [p[0] - shift[0] * k2, p[1] - shift[1] * k2]
}

/// Local scaling warp: magnifies by `1 / (1 - amount)` at `center`, identity at `radius`
pub fn scale_warp(p: Point, center: Point, amount: f32, radius: f32) -> Point {
    let d = [p[0] - center[0], p[1] - center[1]];
    let d2 = d[0] * d[0] + d[1] * d[1];
    let r2 = radius * radius;
    if d2 >= r2 {
        return p;
    }
    let s = 1.0 - amount * (1.0 - d2 / r2);
    [center[0] + d[0] * s, center[1] + d[1] * s]
}

/// Source coordinate of output pixel `p`
pub fn reshape_source(p: Point, g: &FaceGeometry, slim: f32, eye_zoom: f32) -> Point {
    let mut q = p;
    if slim > 0.0 {
        let amount = slim * SLIM_MAX_SHIFT;
        for contour in [g.slim_left, g.slim_right] {
            let shift = [
                (g.slim_target[0] - contour[0]) * amount,
                (g.slim_target[1] - contour[1]) * amount,
            ];
            q = translate_warp(q, contour, shift, g.slim_radius);
        }
    }
    if eye_zoom > 0.0 {
        let amount = eye_zoom * EYE_MAX_ZOOM;
        for eye in [g.left_eye, g.right_eye] {
            q = scale_warp(q, eye, amount, g.eye_radius);
        }
    }
    q
}

#[derive(Debug, Default)]
pub struct FaceReshapeStage;

impl FaceReshapeStage {
    pub fn new() -> Self {
        Self
    }
}

impl FilterStage for FaceReshapeStage {
    fn kind(&self) -> StageKind {
        StageKind::FaceReshape
    }

    fn execute(
        &mut self,
        input: &StageInput<'_>,
        src: &RgbaImage,
        dst: &mut RgbaImage,
    ) -> GraphResult<()> {
        dst.copy_from_slice(src);
        let StageParams::Reshape { slim, eye_zoom } = input.params else {
            return Ok(());
        };
        let g = input.geometry;
        let (w, h) = src.dimensions();

        let regions = [
            (slim > 0.0).then(|| {
                PixelRect::around(&[g.slim_left, g.slim_right], g.slim_radius, w, h)
            }),
            (eye_zoom > 0.0)
                .then(|| PixelRect::around(&[g.left_eye, g.right_eye], g.eye_radius, w, h)),
        ];

        for rect in regions.into_iter().flatten() {
            for (x, y) in rect.pixels() {
                let p = [x as f32, y as f32];
                let q = reshape_source(p, g, slim, eye_zoom);
                if q == p {
                    continue;
                }
                let alpha = load(src, x as i32, y as i32)[3];
                let mut color = bilinear(src, q);
                color[3] = alpha;
                dst.put_pixel(x, y, pack(color));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warps_are_identity_outside_radius() {
        assert_eq!(translate_warp([10.0, 0.0], [0.0, 0.0], [1.0, 0.0], 5.0), [10.0, 0.0]);
        assert_eq!(scale_warp([10.0, 0.0], [0.0, 0.0], 0.3, 5.0), [10.0, 0.0]);
    }

    #[test]
    fn translate_warp_pulls_content_at_center() {
        // The output pixel at center + shift samples (almost) the center
        let q = translate_warp([2.0, 0.0], [0.0, 0.0], [2.0, 0.0], 20.0);
        assert!(q[0] < 0.1 && q[0] >= 0.0, "sampled {:?}", q);
    }

    #[test]
    fn scale_warp_magnifies_center() {
        let q = scale_warp([1.0, 0.0], [0.0, 0.0], 0.5, 10.0);
        assert!(q[0] < 1.0 && q[0] > 0.4);
        assert_eq!(scale_warp([0.0, 0.0], [0.0, 0.0], 0.5, 10.0), [0.0, 0.0]);
    }
}
