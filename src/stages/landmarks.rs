// SPDX-License-Identifier: GPL-3.0-only

//! Per-frame facial landmarks

use crate::constants::LANDMARK_COUNT;
use crate::errors::{GraphError, GraphResult};

/// Pixel-space point
pub type Point = [f32; 2];

/// 68 landmark points of one face, or none when no face was found.
///
/// The set is recomputed for every frame and shared read-only by all beauty
/// stages of that frame. Storage is reused across frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkSet {
    points: Vec<Point>,
}

impl LandmarkSet {
    pub fn new() -> Self {
        Self {
            points: Vec::with_capacity(LANDMARK_COUNT),
        }
    }

    /// Build a set from exactly [`LANDMARK_COUNT`] points, or an empty one
    pub fn from_points(points: &[Point]) -> GraphResult<Self> {
        let mut set = Self::new();
        set.set_points(points)?;
        Ok(set)
    }

    /// Replace the contents. Anything but 0 or 68 points is rejected.
    pub fn set_points(&mut self, points: &[Point]) -> GraphResult<()> {
        if !points.is_empty() && points.len() != LANDMARK_COUNT {
            return Err(GraphError::InvalidLandmarks {
                count: points.len(),
            });
        }
        self.points.clear();
        self.points.extend_from_slice(points);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Move every point through `f`
    pub fn map_points(&mut self, mut f: impl FnMut(Point) -> Point) {
        for point in &mut self.points {
            *point = f(*point);
        }
    }

    pub fn point(&self, index: usize) -> Option<Point> {
        self.points.get(index).copied()
    }

    /// Mean of the points in `range`
    pub fn centroid(&self, range: std::ops::Range<usize>) -> Option<Point> {
        let slice = self.points.get(range)?;
        if slice.is_empty() {
            return None;
        }
        let n = slice.len() as f32;
        let sum = slice
            .iter()
            .fold([0.0, 0.0], |acc, p| [acc[0] + p[0], acc[1] + p[1]]);
        Some([sum[0] / n, sum[1] / n])
    }

    /// Whether every coordinate is finite
    pub fn is_finite(&self) -> bool {
        self.points.iter().all(|p| p[0].is_finite() && p[1].is_finite())
    }
}
