// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic test frames
//!
//! A textured skin-toned ellipse on a mid-gray background, with darker eyes
//! and redder lips. Used by the `synth` command and by the tests to exercise
//! the built-in detector without camera input.

use super::frame::{I420Buffer, Plane};

const BACKGROUND: u8 = 128;
const SKIN_U: u8 = 110;
const SKIN_V: u8 = 150;
const LIP_V: u8 = 165;

/// Relative placement of the face inside the frame
const FACE_CENTER: (f32, f32) = (0.5, 0.48);
const FACE_RADII: (f32, f32) = (0.26, 0.34);

enum Region {
    Background,
    Skin,
    Eye,
    Lips,
}

fn region(x: f32, y: f32, width: f32, height: f32) -> Region {
    let cx = FACE_CENTER.0 * width;
    let cy = FACE_CENTER.1 * height;
    let rx = FACE_RADII.0 * width;
    let ry = FACE_RADII.1 * height;

    // Normalized face coordinates, 0..1 across the face bounding box
    let u = (x - (cx - rx)) / (2.0 * rx);
    let v = (y - (cy - ry)) / (2.0 * ry);
    let dx = (x - cx) / rx;
    let dy = (y - cy) / ry;
    if dx * dx + dy * dy > 1.0 {
        return Region::Background;
    }

    let in_ellipse = |ex: f32, ey: f32, ax: f32, ay: f32| {
        let a = (u - ex) / ax;
        let b = (v - ey) / ay;
        a * a + b * b <= 1.0
    };

    if in_ellipse(0.3, 0.36, 0.08, 0.035) || in_ellipse(0.7, 0.36, 0.08, 0.035) {
        Region::Eye
    } else if in_ellipse(0.5, 0.78, 0.17, 0.05) {
        Region::Lips
    } else {
        Region::Skin
    }
}

/// Build a `width x height` I420 frame containing one synthetic face
pub fn synthetic_face_frame(width: u32, height: u32) -> I420Buffer {
    let mut frame = I420Buffer::filled(width, height, BACKGROUND, BACKGROUND, BACKGROUND);
    let (w, h) = (width as f32, height as f32);

    let y_stride = frame.strides()[Plane::Y.index()];
    let luma = frame.plane_mut(Plane::Y);
    for row in 0..height as usize {
        for col in 0..width as usize {
            let texture = ((col * 7 + row * 13) % 30) as u8;
            luma[row * y_stride + col] = match region(col as f32, row as f32, w, h) {
                Region::Background => BACKGROUND,
                Region::Skin => 150 + texture,
                Region::Eye => 70,
                Region::Lips => 110 + texture / 3,
            };
        }
    }

    let [_, u_stride, v_stride] = frame.strides();
    let chroma_rows = Plane::U.rows(height);
    let chroma_cols = Plane::U.row_width(width);
    for (plane, stride) in [(Plane::U, u_stride), (Plane::V, v_stride)] {
        let data = frame.plane_mut(plane);
        for row in 0..chroma_rows {
            for col in 0..chroma_cols {
                let value = match region((2 * col) as f32 + 0.5, (2 * row) as f32 + 0.5, w, h) {
                    Region::Background => BACKGROUND,
                    Region::Skin | Region::Eye => match plane {
                        Plane::U => SKIN_U,
                        _ => SKIN_V,
                    },
                    Region::Lips => match plane {
                        Plane::U => SKIN_U,
                        _ => LIP_V,
                    },
                };
                data[row * stride + col] = value;
            }
        }
    }

    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_sits_in_the_middle() {
        let frame = synthetic_face_frame(64, 64);
        let y = frame.plane(Plane::Y);
        assert_eq!(y[0], BACKGROUND);
        assert!(y[31 * 64 + 32] >= 150);
        let u = frame.plane(Plane::U);
        assert_eq!(u[15 * 32 + 16], SKIN_U);
    }
}
