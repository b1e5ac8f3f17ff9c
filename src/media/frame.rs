// SPDX-License-Identifier: GPL-3.0-only

//! Planar I420 frame types
//!
//! [`VideoFrame`] is the borrowed view the track callback hands to the
//! pipeline. [`I420Buffer`] owns its planes and backs scratch storage;
//! [`I420FrameMut`] wraps planes owned by foreign code.

use crate::errors::{ConvertError, ConvertResult};
use std::fmt;

/// One of the three I420 planes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Plane {
    Y,
    U,
    V,
}

impl Plane {
    pub const ALL: [Plane; 3] = [Plane::Y, Plane::U, Plane::V];

    pub fn index(self) -> usize {
        match self {
            Plane::Y => 0,
            Plane::U => 1,
            Plane::V => 2,
        }
    }

    /// Bytes of visible data per row for a frame `width` pixels wide
    pub fn row_width(self, width: u32) -> usize {
        match self {
            Plane::Y => width as usize,
            Plane::U | Plane::V => width.div_ceil(2) as usize,
        }
    }

    /// Rows of this plane for a frame `height` pixels tall
    pub fn rows(self, height: u32) -> usize {
        match self {
            Plane::Y => height as usize,
            Plane::U | Plane::V => height.div_ceil(2) as usize,
        }
    }
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Plane::Y => f.write_str("Y"),
            Plane::U => f.write_str("U"),
            Plane::V => f.write_str("V"),
        }
    }
}

/// Clockwise rotation that turns a frame's buffer upright for display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [
        Rotation::Deg0,
        Rotation::Deg90,
        Rotation::Deg180,
        Rotation::Deg270,
    ];

    /// Rotation from the degree value a native track reports
    pub fn from_degrees(degrees: i32) -> ConvertResult<Self> {
        match degrees.rem_euclid(360) {
            0 => Ok(Rotation::Deg0),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            _ => Err(ConvertError::InvalidRotation(degrees)),
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Whether width and height trade places when upright
    pub fn is_transposed(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }

    /// Upright size of a `width x height` buffer
    pub fn upright_dimensions(self, width: u32, height: u32) -> (u32, u32) {
        if self.is_transposed() {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Buffer pixel shown at upright pixel `(x, y)` of a `width x height` buffer
    pub fn buffer_pixel(self, x: u32, y: u32, width: u32, height: u32) -> (u32, u32) {
        match self {
            Rotation::Deg0 => (x, y),
            Rotation::Deg90 => (y, height - 1 - x),
            Rotation::Deg180 => (width - 1 - x, height - 1 - y),
            Rotation::Deg270 => (width - 1 - y, x),
        }
    }

    /// Buffer position of the continuous upright point `p`
    pub fn buffer_point(self, p: [f32; 2], width: u32, height: u32) -> [f32; 2] {
        let (w, h) = (width as f32, height as f32);
        match self {
            Rotation::Deg0 => p,
            Rotation::Deg90 => [p[1], h - p[0]],
            Rotation::Deg180 => [w - p[0], h - p[1]],
            Rotation::Deg270 => [w - p[1], p[0]],
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Read-only view of three planes with their strides
#[derive(Debug, Clone, Copy)]
pub struct I420Planes<'a> {
    pub y: &'a [u8],
    pub u: &'a [u8],
    pub v: &'a [u8],
    pub strides: [usize; 3],
}

impl<'a> I420Planes<'a> {
    pub fn plane(&self, plane: Plane) -> &'a [u8] {
        match plane {
            Plane::Y => self.y,
            Plane::U => self.u,
            Plane::V => self.v,
        }
    }

    pub fn stride(&self, plane: Plane) -> usize {
        self.strides[plane.index()]
    }
}

/// Mutable view of three planes with their strides
#[derive(Debug)]
pub struct I420PlanesMut<'a> {
    pub y: &'a mut [u8],
    pub u: &'a mut [u8],
    pub v: &'a mut [u8],
    pub strides: [usize; 3],
}

impl I420PlanesMut<'_> {
    pub fn stride(&self, plane: Plane) -> usize {
        self.strides[plane.index()]
    }

    pub fn plane_mut(&mut self, plane: Plane) -> &mut [u8] {
        match plane {
            Plane::Y => &mut *self.y,
            Plane::U => &mut *self.u,
            Plane::V => &mut *self.v,
        }
    }

    pub fn as_planes(&self) -> I420Planes<'_> {
        I420Planes {
            y: &*self.y,
            u: &*self.u,
            v: &*self.v,
            strides: self.strides,
        }
    }
}

/// A planar 4:2:0 frame lent to the pipeline for one synchronous call
pub trait VideoFrame {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn planes(&self) -> I420Planes<'_>;
    fn planes_mut(&mut self) -> I420PlanesMut<'_>;

    /// Presentation timestamp in microseconds
    fn timestamp_us(&self) -> i64 {
        0
    }

    /// Rotation the track reports for this frame
    fn rotation(&self) -> Rotation {
        Rotation::Deg0
    }

    fn stride(&self, plane: Plane) -> usize {
        self.planes().stride(plane)
    }
}

/// Owned I420 frame, also used as reusable scratch storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I420Buffer {
    width: u32,
    height: u32,
    strides: [usize; 3],
    data: [Vec<u8>; 3],
    timestamp_us: i64,
    rotation: Rotation,
}

impl I420Buffer {
    /// Zeroed buffer with tightly packed rows
    pub fn new(width: u32, height: u32) -> Self {
        let strides = [
            Plane::Y.row_width(width),
            Plane::U.row_width(width),
            Plane::V.row_width(width),
        ];
        Self::with_strides(width, height, strides)
    }

    /// Zeroed buffer with explicit strides (clamped up to the row width)
    pub fn with_strides(width: u32, height: u32, strides: [usize; 3]) -> Self {
        let mut clamped = strides;
        let data = Plane::ALL.map(|plane| {
            let stride = strides[plane.index()].max(plane.row_width(width));
            clamped[plane.index()] = stride;
            vec![0u8; stride * plane.rows(height)]
        });
        Self {
            width,
            height,
            strides: clamped,
            data,
            timestamp_us: 0,
            rotation: Rotation::Deg0,
        }
    }

    /// Buffer with every pixel set to the given Y/U/V values
    pub fn filled(width: u32, height: u32, y: u8, u: u8, v: u8) -> Self {
        let mut buffer = Self::new(width, height);
        buffer.data[0].fill(y);
        buffer.data[1].fill(u);
        buffer.data[2].fill(v);
        buffer
    }

    /// Take ownership of existing plane data
    pub fn from_planes(
        width: u32,
        height: u32,
        strides: [usize; 3],
        data: [Vec<u8>; 3],
    ) -> ConvertResult<Self> {
        let buffer = Self {
            width,
            height,
            strides,
            data,
            timestamp_us: 0,
            rotation: Rotation::Deg0,
        };
        crate::media::conversions::validate_planes(&buffer.planes(), width, height)?;
        Ok(buffer)
    }

    pub fn with_timestamp(mut self, timestamp_us: i64) -> Self {
        self.timestamp_us = timestamp_us;
        self
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn strides(&self) -> [usize; 3] {
        self.strides
    }

    pub fn plane(&self, plane: Plane) -> &[u8] {
        &self.data[plane.index()]
    }

    pub fn plane_mut(&mut self, plane: Plane) -> &mut [u8] {
        &mut self.data[plane.index()]
    }

    /// Whether this buffer can hold a frame with the given shape without reallocating
    pub fn matches_layout(&self, width: u32, height: u32, strides: [usize; 3]) -> bool {
        self.width == width && self.height == height && self.strides == strides
    }

    /// Reallocate to the given shape if it differs. Returns true when it did.
    pub fn ensure_layout(&mut self, width: u32, height: u32, strides: [usize; 3]) -> bool {
        if self.matches_layout(width, height, strides) {
            return false;
        }
        *self = Self::with_strides(width, height, strides);
        true
    }

    /// Copy `stride x rows` bytes of every plane from `src`, which must share this layout
    pub fn copy_from(&mut self, src: &I420Planes<'_>) {
        for plane in Plane::ALL {
            let len = self.strides[plane.index()] * plane.rows(self.height);
            self.data[plane.index()][..len].copy_from_slice(&src.plane(plane)[..len]);
        }
    }

    /// Copy `stride x rows` bytes of every plane into `dst`, which must share this layout
    pub fn copy_to(&self, dst: &mut I420PlanesMut<'_>) {
        for plane in Plane::ALL {
            let len = self.strides[plane.index()] * plane.rows(self.height);
            dst.plane_mut(plane)[..len].copy_from_slice(&self.data[plane.index()][..len]);
        }
    }
}

impl VideoFrame for I420Buffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn planes(&self) -> I420Planes<'_> {
        let [y, u, v] = &self.data;
        I420Planes {
            y,
            u,
            v,
            strides: self.strides,
        }
    }

    fn planes_mut(&mut self) -> I420PlanesMut<'_> {
        let [y, u, v] = &mut self.data;
        I420PlanesMut {
            y,
            u,
            v,
            strides: self.strides,
        }
    }

    fn timestamp_us(&self) -> i64 {
        self.timestamp_us
    }

    fn rotation(&self) -> Rotation {
        self.rotation
    }
}

/// Frame whose planes are owned by foreign code (a native video track)
#[derive(Debug)]
pub struct I420FrameMut<'a> {
    width: u32,
    height: u32,
    planes: I420PlanesMut<'a>,
    timestamp_us: i64,
    rotation: Rotation,
}

impl<'a> I420FrameMut<'a> {
    /// Wrap borrowed planes after validating their shape
    pub fn new(width: u32, height: u32, planes: I420PlanesMut<'a>) -> ConvertResult<Self> {
        crate::media::conversions::validate_planes(&planes.as_planes(), width, height)?;
        Ok(Self {
            width,
            height,
            planes,
            timestamp_us: 0,
            rotation: Rotation::Deg0,
        })
    }

    pub fn with_timestamp(mut self, timestamp_us: i64) -> Self {
        self.timestamp_us = timestamp_us;
        self
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Build a frame from raw plane pointers as handed out by a native video track.
    ///
    /// Null pointers and non-positive dimensions or strides are rejected.
    ///
    /// # Safety
    ///
    /// Each non-null pointer must be valid for reads and writes of
    /// `stride x rows` bytes (`rows` is `height` for Y and `ceil(height / 2)`
    /// for U and V) for the lifetime `'a`, and the three regions must not
    /// overlap or be accessed through any other path during that lifetime.
    #[allow(clippy::too_many_arguments)]
    pub unsafe fn from_raw_parts(
        width: i32,
        height: i32,
        y: *mut u8,
        stride_y: i32,
        u: *mut u8,
        stride_u: i32,
        v: *mut u8,
        stride_v: i32,
    ) -> ConvertResult<Self> {
        if width <= 0 || height <= 0 {
            return Err(ConvertError::InvalidDimensions {
                width: width as i64,
                height: height as i64,
            });
        }
        let (width, height) = (width as u32, height as u32);

        let mut parts = [(Plane::Y, y, stride_y), (Plane::U, u, stride_u), (Plane::V, v, stride_v)]
            .into_iter()
            .map(|(plane, ptr, stride)| {
                if ptr.is_null() {
                    return Err(ConvertError::NullPlane(plane));
                }
                let min = plane.row_width(width);
                if stride <= 0 || (stride as usize) < min {
                    return Err(ConvertError::StrideTooSmall {
                        plane,
                        stride: stride.max(0) as usize,
                        min,
                    });
                }
                let stride = stride as usize;
                let len = stride * plane.rows(height);
                // SAFETY: the caller guarantees `len` writable bytes behind `ptr`
                // for 'a with no aliasing.
                let slice = unsafe { std::slice::from_raw_parts_mut(ptr, len) };
                Ok((slice, stride))
            });

        let (y, stride_y) = parts.next().ok_or(ConvertError::NullPlane(Plane::Y))??;
        let (u, stride_u) = parts.next().ok_or(ConvertError::NullPlane(Plane::U))??;
        let (v, stride_v) = parts.next().ok_or(ConvertError::NullPlane(Plane::V))??;

        Self::new(
            width,
            height,
            I420PlanesMut {
                y,
                u,
                v,
                strides: [stride_y, stride_u, stride_v],
            },
        )
    }
}

impl VideoFrame for I420FrameMut<'_> {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn planes(&self) -> I420Planes<'_> {
        self.planes.as_planes()
    }

    fn planes_mut(&mut self) -> I420PlanesMut<'_> {
        I420PlanesMut {
            y: &mut *self.planes.y,
            u: &mut *self.planes.u,
            v: &mut *self.planes.v,
            strides: self.planes.strides,
        }
    }

    fn timestamp_us(&self) -> i64 {
        self.timestamp_us
    }

    fn rotation(&self) -> Rotation {
        self.rotation
    }
}
