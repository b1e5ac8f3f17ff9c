// SPDX-License-Identifier: GPL-3.0-only

//! Lip tint blended over the mouth polygon

use super::sampling::{PixelRect, load, luma, mix_rgb, pack};
use super::{FilterStage, StageInput, StageKind, StageParams};
use crate::constants::LIPSTICK_MAX_OPACITY;
use crate::errors::GraphResult;
use image::RgbaImage;

/// Tint modulated by the underlying luma so lip texture survives
pub fn lip_tint(color: [f32; 4], luma: f32) -> [f32; 3] {
    let shade = 0.35 + 0.9 * luma;
    [
        (color[0] * shade).clamp(0.0, 1.0),
        (color[1] * shade).clamp(0.0, 1.0),
        (color[2] * shade).clamp(0.0, 1.0),
    ]
}

#[derive(Debug)]
pub struct LipstickStage {
    color: [f32; 4],
}

impl LipstickStage {
    pub fn new(color: [f32; 4]) -> Self {
        Self { color }
    }
}

impl FilterStage for LipstickStage {
    fn kind(&self) -> StageKind {
        StageKind::Lipstick
    }

    fn execute(
        &mut self,
        input: &StageInput<'_>,
        src: &RgbaImage,
        dst: &mut RgbaImage,
    ) -> GraphResult<()> {
        dst.copy_from_slice(src);
        let StageParams::Blend { level } = input.params else {
            return Ok(());
        };
        let g = input.geometry;
        let (w, h) = src.dimensions();
        let opacity = level * LIPSTICK_MAX_OPACITY * self.color[3];

        let rect = PixelRect::around(&g.lip_outer, 1.0, w, h);
        for (x, y) in rect.pixels() {
            let weight = g.lip_weight([x as f32, y as f32]);
            if weight <= 0.0 {
                continue;
            }
            let c = load(src, x as i32, y as i32);
            let tint = lip_tint(self.color, luma(&c));
            dst.put_pixel(x, y, pack(mix_rgb(c, tint, opacity * weight)));
        }
        Ok(())
    }
}
