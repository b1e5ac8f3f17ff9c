// SPDX-License-Identifier: GPL-3.0-only

//! BT.601 limited-range conversion between planar I420 and packed RGBA
//!
//! Integer coefficients match the compute shaders in `shaders/yuv_convert.wgsl`
//! so both engines produce the same bytes for the same input. Chroma is
//! produced by averaging each 2x2 block.

use super::frame::{I420Buffer, I420Planes, I420PlanesMut, Plane};
use crate::errors::{ConvertError, ConvertResult};
use image::RgbaImage;

/// Reject zero and odd dimensions
pub fn validate_dimensions(width: u32, height: u32) -> ConvertResult<()> {
    if width == 0 || height == 0 {
        return Err(ConvertError::InvalidDimensions {
            width: width as i64,
            height: height as i64,
        });
    }
    if width % 2 != 0 || height % 2 != 0 {
        return Err(ConvertError::OddDimensions { width, height });
    }
    Ok(())
}

/// Check dimensions, strides and plane lengths (`stride x rows` per plane)
pub fn validate_planes(planes: &I420Planes<'_>, width: u32, height: u32) -> ConvertResult<()> {
    validate_dimensions(width, height)?;
    for plane in Plane::ALL {
        let stride = planes.stride(plane);
        let min = plane.row_width(width);
        if stride < min {
            return Err(ConvertError::StrideTooSmall { plane, stride, min });
        }
        let required = stride * plane.rows(height);
        let len = planes.plane(plane).len();
        if len < required {
            return Err(ConvertError::PlaneTooSmall {
                plane,
                len,
                required,
            });
        }
    }
    Ok(())
}

/// Convert one limited-range YUV sample to RGB
#[inline]
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let c = y as i32 - 16;
    let d = u as i32 - 128;
    let e = v as i32 - 128;

    let r = (298 * c + 409 * e + 128) >> 8;
    let g = (298 * c - 100 * d - 208 * e + 128) >> 8;
    let b = (298 * c + 516 * d + 128) >> 8;

    [clamp_u8(r), clamp_u8(g), clamp_u8(b)]
}

/// Limited-range luma for one RGB pixel
#[inline]
pub fn rgb_to_y(r: u8, g: u8, b: u8) -> u8 {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    clamp_u8(((66 * r + 129 * g + 25 * b + 128) >> 8) + 16)
}

/// Chroma contributions of one RGB pixel before the +128 offset
#[inline]
fn rgb_to_uv_raw(r: u8, g: u8, b: u8) -> (i32, i32) {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    let u = (-38 * r - 74 * g + 112 * b + 128) >> 8;
    let v = (112 * r - 94 * g - 18 * b + 128) >> 8;
    (u, v)
}

#[inline]
fn clamp_u8(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}

/// I420 planes to a newly allocated RGBA image
pub fn i420_to_rgba(planes: &I420Planes<'_>, width: u32, height: u32) -> ConvertResult<RgbaImage> {
    validate_planes(planes, width, height)?;
    let mut rgba = RgbaImage::new(width, height);
    convert_to_rgba(planes, width, height, &mut rgba);
    Ok(rgba)
}

/// I420 planes into an existing RGBA image of the same dimensions
pub fn i420_to_rgba_into(
    planes: &I420Planes<'_>,
    width: u32,
    height: u32,
    dst: &mut RgbaImage,
) -> ConvertResult<()> {
    validate_planes(planes, width, height)?;
    if dst.dimensions() != (width, height) {
        return Err(ConvertError::BufferMismatch {
            expected: (width, height),
            actual: dst.dimensions(),
        });
    }
    convert_to_rgba(planes, width, height, dst);
    Ok(())
}

fn convert_to_rgba(planes: &I420Planes<'_>, width: u32, height: u32, dst: &mut RgbaImage) {
    let width = width as usize;
    let [y_stride, u_stride, v_stride] = planes.strides;
    let out: &mut [u8] = dst;

    for (row, out_row) in out.chunks_exact_mut(width * 4).take(height as usize).enumerate() {
        let y_row = &planes.y[row * y_stride..row * y_stride + width];
        let u_row = &planes.u[(row / 2) * u_stride..];
        let v_row = &planes.v[(row / 2) * v_stride..];

        for (col, px) in out_row.chunks_exact_mut(4).enumerate() {
            let [r, g, b] = yuv_to_rgb(y_row[col], u_row[col / 2], v_row[col / 2]);
            px.copy_from_slice(&[r, g, b, 255]);
        }
    }
}

/// RGBA image to a newly allocated, tightly packed I420 buffer
pub fn rgba_to_i420(rgba: &RgbaImage) -> ConvertResult<I420Buffer> {
    let (width, height) = rgba.dimensions();
    validate_dimensions(width, height)?;
    let mut buffer = I420Buffer::new(width, height);
    {
        use super::frame::VideoFrame;
        let mut planes = buffer.planes_mut();
        convert_to_i420(rgba, &mut planes);
    }
    Ok(buffer)
}

/// RGBA image into caller planes, honoring their strides.
///
/// Bytes past each row's visible width are left untouched.
pub fn rgba_to_i420_into(rgba: &RgbaImage, dst: &mut I420PlanesMut<'_>) -> ConvertResult<()> {
    let (width, height) = rgba.dimensions();
    validate_planes(&dst.as_planes(), width, height)?;
    convert_to_i420(rgba, dst);
    Ok(())
}

fn convert_to_i420(rgba: &RgbaImage, dst: &mut I420PlanesMut<'_>) {
    let (width, height) = rgba.dimensions();
    let (width, height) = (width as usize, height as usize);
    let src: &[u8] = rgba.as_raw();
    let [y_stride, u_stride, v_stride] = dst.strides;

    for row in 0..height {
        let src_row = &src[row * width * 4..(row + 1) * width * 4];
        let y_row = &mut dst.y[row * y_stride..row * y_stride + width];
        for (y, px) in y_row.iter_mut().zip(src_row.chunks_exact(4)) {
            *y = rgb_to_y(px[0], px[1], px[2]);
        }
    }

    let chroma_width = width / 2;
    for row in 0..height / 2 {
        let top = &src[(2 * row) * width * 4..(2 * row + 1) * width * 4];
        let bottom = &src[(2 * row + 1) * width * 4..(2 * row + 2) * width * 4];
        for col in 0..chroma_width {
            let mut sum_u = 0;
            let mut sum_v = 0;
            for line in [top, bottom] {
                for px in line[col * 8..col * 8 + 8].chunks_exact(4) {
                    let (u, v) = rgb_to_uv_raw(px[0], px[1], px[2]);
                    sum_u += u;
                    sum_v += v;
                }
            }
            dst.u[row * u_stride + col] = clamp_u8(((sum_u + 2) >> 2) + 128);
            dst.v[row * v_stride + col] = clamp_u8(((sum_v + 2) >> 2) + 128);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::frame::VideoFrame;

    #[test]
    fn mid_gray_round_trips_exactly() {
        let frame = I420Buffer::filled(8, 4, 128, 128, 128);
        let rgba = i420_to_rgba(&frame.planes(), 8, 4).unwrap();
        let back = rgba_to_i420(&rgba).unwrap();
        assert_eq!(back, frame);
    }

    #[test]
    fn reference_colors() {
        assert_eq!(yuv_to_rgb(16, 128, 128), [0, 0, 0]);
        assert_eq!(yuv_to_rgb(235, 128, 128), [255, 255, 255]);
        assert_eq!(rgb_to_y(0, 0, 0), 16);
        assert_eq!(rgb_to_y(255, 255, 255), 235);
        let [r, g, b] = yuv_to_rgb(81, 90, 240);
        assert!(r > 250 && g < 5 && b < 5, "pure red, got {r} {g} {b}");
    }

    #[test]
    fn rejects_odd_and_empty_dimensions() {
        let frame = I420Buffer::new(4, 4);
        assert!(matches!(
            i420_to_rgba(&frame.planes(), 3, 4),
            Err(ConvertError::OddDimensions { .. })
        ));
        assert!(matches!(
            i420_to_rgba(&frame.planes(), 0, 4),
            Err(ConvertError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn rejects_short_planes() {
        let frame = I420Buffer::new(4, 4);
        let planes = frame.planes();
        let short = I420Planes {
            u: &planes.u[..2],
            ..planes
        };
        assert_eq!(
            i420_to_rgba(&short, 4, 4).unwrap_err(),
            ConvertError::PlaneTooSmall {
                plane: Plane::U,
                len: 2,
                required: 4
            }
        );
    }

    #[test]
    fn into_variant_keeps_row_padding() {
        let rgba = RgbaImage::from_pixel(4, 2, image::Rgba([200, 40, 40, 255]));
        let mut frame = I420Buffer::with_strides(4, 2, [8, 4, 4]);
        frame.plane_mut(Plane::Y).fill(7);
        rgba_to_i420_into(&rgba, &mut frame.planes_mut()).unwrap();
        let y = frame.plane(Plane::Y);
        assert_eq!(&y[4..8], &[7, 7, 7, 7]);
        assert_ne!(y[0], 7);
    }

    #[test]
    fn into_variant_checks_destination_size() {
        let frame = I420Buffer::new(4, 4);
        let mut small = RgbaImage::new(2, 2);
        assert!(matches!(
            i420_to_rgba_into(&frame.planes(), 4, 4, &mut small),
            Err(ConvertError::BufferMismatch { .. })
        ));
    }
}
