// SPDX-License-Identifier: GPL-3.0-only

//! Pixel access helpers shared by the CPU stages
//!
//! Colors are normalized RGBA in 0..1, matching `unpack4x8unorm` /
//! `pack4x8unorm` in the compute shaders.

use super::landmarks::Point;
use image::RgbaImage;

pub type Color = [f32; 4];

/// Clamp-to-edge fetch
#[inline]
pub fn load(image: &RgbaImage, x: i32, y: i32) -> Color {
    let (w, h) = image.dimensions();
    let x = x.clamp(0, w as i32 - 1) as u32;
    let y = y.clamp(0, h as i32 - 1) as u32;
    let [r, g, b, a] = image.get_pixel(x, y).0;
    [
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        a as f32 / 255.0,
    ]
}

/// Bilinear sample with pixel centers on integer coordinates
pub fn bilinear(image: &RgbaImage, p: Point) -> Color {
    let (bx, by) = (p[0].floor(), p[1].floor());
    let (fx, fy) = (p[0] - bx, p[1] - by);
    let (x0, y0) = (bx as i32, by as i32);
    let top = mix(load(image, x0, y0), load(image, x0 + 1, y0), fx);
    let bottom = mix(load(image, x0, y0 + 1), load(image, x0 + 1, y0 + 1), fx);
    mix(top, bottom, fy)
}

#[inline]
pub fn mix(a: Color, b: Color, t: f32) -> Color {
    std::array::from_fn(|i| a[i] + (b[i] - a[i]) * t)
}

/// Blend the color channels towards `b`, keeping the alpha of `a`
#[inline]
pub fn mix_rgb(a: Color, b: [f32; 3], t: f32) -> Color {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
        a[3],
    ]
}

#[inline]
pub fn pack(c: Color) -> image::Rgba<u8> {
    image::Rgba(c.map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8))
}

#[inline]
pub fn luma(c: &Color) -> f32 {
    0.299 * c[0] + 0.587 * c[1] + 0.114 * c[2]
}

/// Half-open pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl PixelRect {
    /// Bounding box of `points` grown by `margin`, clipped to the image
    pub fn around(points: &[Point], margin: f32, width: u32, height: u32) -> Self {
        let (mut min, mut max) = ([f32::MAX; 2], [f32::MIN; 2]);
        for p in points {
            min = [min[0].min(p[0]), min[1].min(p[1])];
            max = [max[0].max(p[0]), max[1].max(p[1])];
        }
        let clip = |v: f32, limit: u32| v.clamp(0.0, limit as f32) as u32;
        Self {
            x0: clip((min[0] - margin).floor(), width),
            y0: clip((min[1] - margin).floor(), height),
            x1: clip((max[0] + margin).ceil() + 1.0, width),
            y1: clip((max[1] + margin).ceil() + 1.0, height),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (self.y0..self.y1).flat_map(move |y| (self.x0..self.x1).map(move |x| (x, y)))
    }
}
