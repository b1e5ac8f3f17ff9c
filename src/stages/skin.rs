// SPDX-License-Identifier: GPL-3.0-only

//! Skin smoothing and whitening inside the face ellipse

use super::sampling::{Color, PixelRect, bilinear, load, luma, pack};
use super::{FilterStage, StageInput, StageKind, StageParams};
use crate::constants::{SMOOTH_SIGMA, WHITEN_MAX_BETA};
use crate::errors::GraphResult;
use image::RgbaImage;
use std::f32::consts::TAU;

/// Edge-preserving blur: 16 taps on two rings, weighted by luma similarity
fn bilateral(src: &RgbaImage, p: [f32; 2], center: &Color, radius: f32) -> [f32; 3] {
    let center_luma = luma(center);
    let mut sum = [center[0], center[1], center[2]];
    let mut total = 1.0;
    for ring in 0..2u32 {
        let ring_radius = radius / (ring + 1) as f32;
        for i in 0..8u32 {
            let angle = i as f32 * (TAU / 8.0);
            let q = [
                p[0] + angle.cos() * ring_radius,
                p[1] + angle.sin() * ring_radius,
            ];
            let s = bilinear(src, q);
            let diff = luma(&s) - center_luma;
            let weight = (-(diff * diff) / (2.0 * SMOOTH_SIGMA * SMOOTH_SIGMA)).exp();
            for c in 0..3 {
                sum[c] += s[c] * weight;
            }
            total += weight;
        }
    }
    sum.map(|v| v / total)
}

/// Log curve lifting shadows and midtones; `beta` > 1
fn whiten_curve(v: f32, beta: f32) -> f32 {
    (v * (beta - 1.0) + 1.0).ln() / beta.ln()
}

#[derive(Debug, Default)]
pub struct FaceSmoothStage;

impl FaceSmoothStage {
    pub fn new() -> Self {
        Self
    }
}

impl FilterStage for FaceSmoothStage {
    fn kind(&self) -> StageKind {
        StageKind::FaceSmooth
    }

    fn execute(
        &mut self,
        input: &StageInput<'_>,
        src: &RgbaImage,
        dst: &mut RgbaImage,
    ) -> GraphResult<()> {
        dst.copy_from_slice(src);
        let StageParams::Skin { smooth, whiten } = input.params else {
            return Ok(());
        };
        let g = input.geometry;
        let (w, h) = src.dimensions();
        let beta = 1.0 + whiten * (WHITEN_MAX_BETA - 1.0);

        let rect = PixelRect::around(&[g.center], g.radii[0].max(g.radii[1]), w, h);
        for (x, y) in rect.pixels() {
            let p = [x as f32, y as f32];
            let weight = g.face_weight(p);
            if weight <= 0.0 {
                continue;
            }
            let c = load(src, x as i32, y as i32);
            let mut rgb = [c[0], c[1], c[2]];

            if smooth > 0.0 {
                let blurred = bilateral(src, p, &c, g.smooth_radius);
                let t = smooth * weight;
                for i in 0..3 {
                    rgb[i] += (blurred[i] - rgb[i]) * t;
                }
            }
            if whiten > 0.0 {
                for v in &mut rgb {
                    *v += (whiten_curve(*v, beta) - *v) * weight;
                }
            }
            dst.put_pixel(x, y, pack([rgb[0], rgb[1], rgb[2], c[3]]));
        }
        Ok(())
    }
}
