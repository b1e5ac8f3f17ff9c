// SPDX-License-Identifier: GPL-3.0-only

//! Landmark detection
//!
//! The graph's first node. Any [`LandmarkDetector`] can be plugged in; the
//! built-in [`SkinToneDetector`] finds the largest skin-colored region and
//! fits a 68-point template to its bounding box.

use super::landmarks::{LandmarkSet, Point};
use crate::config::DetectorConfig;
use crate::constants::LANDMARK_COUNT;
use crate::errors::GraphResult;
use crate::media::{I420Planes, Plane, Rotation};
use image::RgbaImage;
use std::collections::VecDeque;
use tracing::trace;

/// Pixel storage behind a [`FrameView`]
#[derive(Debug, Clone, Copy)]
pub enum FramePixels<'a> {
    Rgba(&'a RgbaImage),
    I420 {
        planes: I420Planes<'a>,
        width: u32,
        height: u32,
    },
}

impl FramePixels<'_> {
    fn dimensions(&self) -> (u32, u32) {
        match self {
            FramePixels::Rgba(image) => image.dimensions(),
            FramePixels::I420 { width, height, .. } => (*width, *height),
        }
    }

    fn ycbcr(&self, x: u32, y: u32) -> [f32; 3] {
        match self {
            FramePixels::Rgba(image) => {
                let [r, g, b, _] = image.get_pixel(x, y).0;
                let (r, g, b) = (r as f32, g as f32, b as f32);
                [
                    0.299 * r + 0.587 * g + 0.114 * b,
                    128.0 - 0.168_736 * r - 0.331_264 * g + 0.5 * b,
                    128.0 + 0.5 * r - 0.418_688 * g - 0.081_312 * b,
                ]
            }
            FramePixels::I420 { planes, .. } => {
                let (x, y) = (x as usize, y as usize);
                let luma = planes.y[y * planes.stride(Plane::Y) + x] as f32;
                let u = planes.u[(y / 2) * planes.stride(Plane::U) + x / 2] as f32;
                let v = planes.v[(y / 2) * planes.stride(Plane::V) + x / 2] as f32;
                [
                    (luma - 16.0) * 255.0 / 219.0,
                    128.0 + (u - 128.0) * 255.0 / 224.0,
                    128.0 + (v - 128.0) * 255.0 / 224.0,
                ]
            }
        }
    }
}

/// Pixels a detector may look at, addressed in upright coordinates.
///
/// Detectors see the frame as it is displayed; the graph maps the landmarks
/// they return back onto the buffer with [`FrameView::to_buffer`].
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pixels: FramePixels<'a>,
    rotation: Rotation,
}

impl<'a> FrameView<'a> {
    pub fn rgba(image: &'a RgbaImage) -> Self {
        Self {
            pixels: FramePixels::Rgba(image),
            rotation: Rotation::Deg0,
        }
    }

    pub fn i420(planes: I420Planes<'a>, width: u32, height: u32) -> Self {
        Self {
            pixels: FramePixels::I420 {
                planes,
                width,
                height,
            },
            rotation: Rotation::Deg0,
        }
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn pixels(&self) -> &FramePixels<'a> {
        &self.pixels
    }

    /// Size of the underlying buffer
    pub fn buffer_dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Upright size
    pub fn dimensions(&self) -> (u32, u32) {
        let (width, height) = self.pixels.dimensions();
        self.rotation.upright_dimensions(width, height)
    }

    /// Full-range (JPEG) Y, Cb, Cr of upright pixel `(x, y)`
    pub fn ycbcr(&self, x: u32, y: u32) -> [f32; 3] {
        let (width, height) = self.pixels.dimensions();
        let (bx, by) = self.rotation.buffer_pixel(x, y, width, height);
        self.pixels.ycbcr(bx, by)
    }

    /// Buffer position of an upright point
    pub fn to_buffer(&self, p: Point) -> Point {
        let (width, height) = self.pixels.dimensions();
        self.rotation.buffer_point(p, width, height)
    }
}

/// Produces the landmark set of one frame
pub trait LandmarkDetector: Send {
    fn name(&self) -> &str;

    /// Fill `landmarks` with 68 upright points, or clear it when no face is visible
    fn detect(&mut self, view: &FrameView<'_>, landmarks: &mut LandmarkSet) -> GraphResult<()>;
}

/// Normalized 68-point face template over a unit bounding box
fn template_point(index: usize) -> Point {
    use std::f32::consts::PI;

    const NOSE_BRIDGE_Y: [f32; 4] = [0.3, 0.38, 0.46, 0.54];
    const NOSE_BASE: [Point; 5] = [
        [0.40, 0.60],
        [0.45, 0.62],
        [0.50, 0.63],
        [0.55, 0.62],
        [0.60, 0.60],
    ];
    const OUTER_LIP: [Point; 12] = [
        [0.33, 0.78],
        [0.38, 0.745],
        [0.44, 0.72],
        [0.50, 0.73],
        [0.56, 0.72],
        [0.62, 0.745],
        [0.67, 0.78],
        [0.62, 0.82],
        [0.56, 0.845],
        [0.50, 0.85],
        [0.44, 0.845],
        [0.38, 0.82],
    ];
    const INNER_LIP: [Point; 8] = [
        [0.36, 0.78],
        [0.44, 0.765],
        [0.50, 0.768],
        [0.56, 0.765],
        [0.64, 0.78],
        [0.56, 0.795],
        [0.50, 0.798],
        [0.44, 0.795],
    ];

    let eye = |cx: f32, k: usize| -> Point {
        let (hw, hh, cy) = (0.09, 0.035, 0.36);
        match k {
            0 => [cx - hw, cy],
            1 => [cx - hw / 3.0, cy - hh],
            2 => [cx + hw / 3.0, cy - hh],
            3 => [cx + hw, cy],
            4 => [cx + hw / 3.0, cy + hh],
            _ => [cx - hw / 3.0, cy + hh],
        }
    };
    let brow = |x0: f32, k: usize| -> Point {
        let t = k as f32 / 4.0;
        [x0 + 0.3 * t, 0.14 - 0.05 * (PI * t).sin()]
    };

    match index {
        0..=16 => {
            let angle = PI * (1.0 - index as f32 / 16.0);
            [0.5 + 0.5 * angle.cos(), 0.25 + 0.75 * angle.sin()]
        }
        17..=21 => brow(0.12, index - 17),
        22..=26 => brow(0.58, index - 22),
        27..=30 => [0.5, NOSE_BRIDGE_Y[index - 27]],
        31..=35 => NOSE_BASE[index - 31],
        36..=41 => eye(0.3, index - 36),
        42..=47 => eye(0.7, index - 42),
        48..=59 => OUTER_LIP[index - 48],
        _ => INNER_LIP[(index - 60).min(7)],
    }
}

/// Template landmarks fitted to the box at `origin` with extent `size`
pub fn face_template(origin: Point, size: Point) -> [Point; LANDMARK_COUNT] {
    std::array::from_fn(|i| {
        let [u, v] = template_point(i);
        [origin[0] + u * size[0], origin[1] + v * size[1]]
    })
}

#[derive(Debug, Clone, Copy, Default)]
struct Component {
    cells: usize,
    min: [u32; 2],
    max: [u32; 2],
}

/// Skin-color region detector with a fitted landmark template
#[derive(Debug)]
pub struct SkinToneDetector {
    config: DetectorConfig,
    mask: Vec<bool>,
    visited: Vec<bool>,
    queue: VecDeque<usize>,
}

impl SkinToneDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            mask: Vec::new(),
            visited: Vec::new(),
            queue: VecDeque::new(),
        }
    }

    fn is_skin(&self, [y, cb, cr]: [f32; 3]) -> bool {
        let c = &self.config;
        y > c.min_luma
            && (c.cb_range[0]..=c.cb_range[1]).contains(&cb)
            && (c.cr_range[0]..=c.cr_range[1]).contains(&cr)
    }

    /// Largest 4-connected component of the skin mask
    fn largest_component(&mut self, grid_w: u32, grid_h: u32) -> Component {
        let mut best = Component::default();
        self.visited.clear();
        self.visited.resize(self.mask.len(), false);

        for start in 0..self.mask.len() {
            if !self.mask[start] || self.visited[start] {
                continue;
            }
            let mut component = Component {
                cells: 0,
                min: [u32::MAX; 2],
                max: [0; 2],
            };
            self.visited[start] = true;
            self.queue.push_back(start);

            while let Some(cell) = self.queue.pop_front() {
                let (cx, cy) = ((cell as u32) % grid_w, (cell as u32) / grid_w);
                component.cells += 1;
                component.min = [component.min[0].min(cx), component.min[1].min(cy)];
                component.max = [component.max[0].max(cx), component.max[1].max(cy)];

                let neighbors = [
                    (cx > 0).then(|| cell - 1),
                    (cx + 1 < grid_w).then(|| cell + 1),
                    (cy > 0).then(|| cell - grid_w as usize),
                    (cy + 1 < grid_h).then(|| cell + grid_w as usize),
                ];
                for next in neighbors.into_iter().flatten() {
                    if self.mask[next] && !self.visited[next] {
                        self.visited[next] = true;
                        self.queue.push_back(next);
                    }
                }
            }

            if component.cells > best.cells {
                best = component;
            }
        }
        best
    }
}

impl LandmarkDetector for SkinToneDetector {
    fn name(&self) -> &str {
        "skin-tone"
    }

    fn detect(&mut self, view: &FrameView<'_>, landmarks: &mut LandmarkSet) -> GraphResult<()> {
        let (width, height) = view.dimensions();
        landmarks.clear();
        if width == 0 || height == 0 {
            return Ok(());
        }

        let cell = (width.max(height) / self.config.grid_cells.max(1)).max(1);
        let grid_w = width.div_ceil(cell);
        let grid_h = height.div_ceil(cell);

        self.mask.clear();
        for gy in 0..grid_h {
            for gx in 0..grid_w {
                let x = (gx * cell + cell / 2).min(width - 1);
                let y = (gy * cell + cell / 2).min(height - 1);
                let skin = self.is_skin(view.ycbcr(x, y));
                self.mask.push(skin);
            }
        }

        let component = self.largest_component(grid_w, grid_h);
        let fraction = component.cells as f32 / (grid_w * grid_h) as f32;
        if component.cells < 4 || fraction < self.config.min_face_fraction {
            trace!(cells = component.cells, "No skin region large enough for a face");
            return Ok(());
        }

        let x0 = (component.min[0] * cell) as f32;
        let y0 = (component.min[1] * cell) as f32;
        let x1 = ((component.max[0] + 1) * cell).min(width) as f32;
        let y1 = ((component.max[1] + 1) * cell).min(height) as f32;
        let (box_w, box_h) = (x1 - x0, y1 - y0);

        // Faces are roughly upright ellipses; reject slivers
        let aspect = box_h / box_w;
        if !(0.6..=2.5).contains(&aspect) {
            trace!(aspect, "Skin region has no face-like aspect ratio");
            return Ok(());
        }

        trace!(
            cells = component.cells,
            x = x0,
            y = y0,
            width = box_w,
            height = box_h,
            "Face region found"
        );
        landmarks.set_points(&face_template([x0, y0], [box_w, box_h]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{VideoFrame, i420_to_rgba, synthetic_face_frame};

    #[test]
    fn template_lips_sit_below_eyes_and_nose() {
        let points = face_template([0.0, 0.0], [1.0, 1.0]);
        assert!(points[36][1] < points[30][1]);
        assert!(points[30][1] < points[51][1]);
        assert!((points[8][0] - 0.5).abs() < 1e-6);
        assert!((points[8][1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn finds_synthetic_face_in_both_layouts() {
        let frame = synthetic_face_frame(128, 128);
        let mut detector = SkinToneDetector::new(DetectorConfig::default());
        let mut landmarks = LandmarkSet::new();

        let view = FrameView::i420(frame.planes(), 128, 128);
        detector.detect(&view, &mut landmarks).unwrap();
        assert_eq!(landmarks.len(), LANDMARK_COUNT);
        let chin = landmarks.point(8).unwrap();
        assert!((chin[0] - 64.0).abs() < 6.0, "chin at {:?}", chin);

        let rgba = i420_to_rgba(&frame.planes(), 128, 128).unwrap();
        detector
            .detect(&FrameView::rgba(&rgba), &mut landmarks)
            .unwrap();
        assert_eq!(landmarks.len(), LANDMARK_COUNT);
    }

    fn stored_for(rotation: Rotation, upright: &RgbaImage) -> RgbaImage {
        match rotation {
            Rotation::Deg0 => upright.clone(),
            Rotation::Deg90 => image::imageops::rotate270(upright),
            Rotation::Deg180 => image::imageops::rotate180(upright),
            Rotation::Deg270 => image::imageops::rotate90(upright),
        }
    }

    #[test]
    fn rotated_view_reads_upright_pixels() {
        let frame = synthetic_face_frame(112, 128);
        let upright = i420_to_rgba(&frame.planes(), 112, 128).unwrap();
        let reference = FrameView::rgba(&upright);

        for rotation in Rotation::ALL {
            let stored = stored_for(rotation, &upright);
            let view = FrameView::rgba(&stored).with_rotation(rotation);
            assert_eq!(view.dimensions(), (112, 128), "{rotation}");
            for (x, y) in [(0, 0), (111, 0), (0, 127), (56, 64), (30, 90)] {
                assert_eq!(view.ycbcr(x, y), reference.ycbcr(x, y), "{rotation} ({x}, {y})");
            }
        }
    }

    #[test]
    fn sideways_face_is_found_upright() {
        let frame = synthetic_face_frame(112, 128);
        let upright = i420_to_rgba(&frame.planes(), 112, 128).unwrap();
        let mut expected = LandmarkSet::new();
        SkinToneDetector::new(DetectorConfig::default())
            .detect(&FrameView::rgba(&upright), &mut expected)
            .unwrap();
        assert_eq!(expected.len(), LANDMARK_COUNT);

        let stored = stored_for(Rotation::Deg90, &upright);
        let view = FrameView::rgba(&stored).with_rotation(Rotation::Deg90);
        let mut landmarks = LandmarkSet::new();
        SkinToneDetector::new(DetectorConfig::default())
            .detect(&view, &mut landmarks)
            .unwrap();
        assert_eq!(landmarks.points(), expected.points());

        // Chin sits right of the nose once mapped into the sideways buffer
        let chin = view.to_buffer(landmarks.points()[8]);
        let nose = view.to_buffer(landmarks.points()[30]);
        assert!(chin[0] > nose[0], "chin {:?} nose {:?}", chin, nose);
        assert!((chin[1] - nose[1]).abs() < 6.0);
    }

    #[test]
    fn gray_frame_has_no_face() {
        let image = RgbaImage::from_pixel(64, 64, image::Rgba([128, 128, 128, 255]));
        let mut detector = SkinToneDetector::new(DetectorConfig::default());
        let mut landmarks =
            LandmarkSet::from_points(&face_template([0.0, 0.0], [8.0, 8.0])).unwrap();
        detector
            .detect(&FrameView::rgba(&image), &mut landmarks)
            .unwrap();
        assert!(landmarks.is_empty());
    }
}
