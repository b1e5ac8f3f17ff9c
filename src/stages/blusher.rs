// SPDX-License-Identifier: GPL-3.0-only

//! Radial blush over both cheeks

use super::sampling::{PixelRect, load, mix_rgb, pack};
use super::{FilterStage, StageInput, StageKind, StageParams};
use crate::constants::BLUSH_MAX_OPACITY;
use crate::errors::GraphResult;
use image::RgbaImage;

#[derive(Debug)]
pub struct BlusherStage {
    color: [f32; 4],
}

impl BlusherStage {
    pub fn new(color: [f32; 4]) -> Self {
        Self { color }
    }
}

impl FilterStage for BlusherStage {
    fn kind(&self) -> StageKind {
        StageKind::Blusher
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
        let opacity = level * BLUSH_MAX_OPACITY * self.color[3];
        let blush = [self.color[0], self.color[1], self.color[2]];

        let rect = PixelRect::around(&[g.left_cheek, g.right_cheek], g.cheek_radius, w, h);
        for (x, y) in rect.pixels() {
            let weight = g.cheek_weight([x as f32, y as f32]);
            if weight <= 0.0 {
                continue;
            }
            let c = load(src, x as i32, y as i32);
            dst.put_pixel(x, y, pack(mix_rgb(c, blush, opacity * weight)));
        }
        Ok(())
    }
}
