// SPDX-License-Identifier: GPL-3.0-only

//! Face geometry derived from a landmark set
//!
//! Every beauty stage works from the same [`FaceGeometry`]; the GPU engine
//! uploads it as uniforms (see `shaders/uniforms.rs`).

use super::landmarks::{LandmarkSet, Point};
use crate::constants::{LANDMARK_COUNT, LIP_FEATHER_FRACTION, SMOOTH_RADIUS_FRACTION, landmarks};
use crate::errors::{GraphError, GraphResult};

#[derive(Debug, Clone, PartialEq)]
pub struct FaceGeometry {
    /// Center of the landmark bounding box
    pub center: Point,
    /// Half extents of the landmark bounding box
    pub radii: Point,
    /// Eye on the image left
    pub left_eye: Point,
    pub right_eye: Point,
    pub eye_radius: f32,
    /// Jaw contour points pulled in by face slimming
    pub slim_left: Point,
    pub slim_right: Point,
    /// Point the contour is pulled towards (nose tip)
    pub slim_target: Point,
    pub slim_radius: f32,
    pub left_cheek: Point,
    pub right_cheek: Point,
    pub cheek_radius: f32,
    pub lip_outer: [Point; 12],
    pub lip_inner: [Point; 8],
    pub lip_feather: f32,
    /// Ring radius of the smoothing kernel
    pub smooth_radius: f32,
}

impl FaceGeometry {
    /// Derive the geometry, or None for an empty set
    pub fn from_landmarks(set: &LandmarkSet) -> GraphResult<Option<Self>> {
        if set.is_empty() {
            return Ok(None);
        }
        if set.len() != LANDMARK_COUNT || !set.is_finite() {
            return Err(GraphError::InvalidLandmarks { count: set.len() });
        }
        let p = set.points();

        let (mut min, mut max) = ([f32::MAX; 2], [f32::MIN; 2]);
        for point in p {
            min = [min[0].min(point[0]), min[1].min(point[1])];
            max = [max[0].max(point[0]), max[1].max(point[1])];
        }
        let center = lerp(min, max, 0.5);
        let radii = [
            ((max[0] - min[0]) * 0.5).max(1.0),
            ((max[1] - min[1]) * 0.5).max(1.0),
        ];

        let centroid = |range| set.centroid(range).unwrap_or(center);
        let left_eye = centroid(landmarks::RIGHT_EYE);
        let right_eye = centroid(landmarks::LEFT_EYE);
        let eye_distance = distance(left_eye, right_eye).max(1.0);

        let slim_left = p[landmarks::SLIM_LEFT];
        let slim_right = p[landmarks::SLIM_RIGHT];
        let slim_target = p[landmarks::NOSE_TIP];
        let jaw_to_nose = distance(slim_left, slim_target) + distance(slim_right, slim_target);
        let slim_radius = (0.5 * jaw_to_nose * 0.7).max(1.0);

        let mouth_left = p[landmarks::MOUTH_LEFT];
        let mouth_right = p[landmarks::MOUTH_RIGHT];
        let third = |a: Point, b: Point, c: Point| {
            [(a[0] + b[0] + c[0]) / 3.0, (a[1] + b[1] + c[1]) / 3.0]
        };
        let left_cheek = third(p[landmarks::CHEEK_LEFT], left_eye, mouth_left);
        let right_cheek = third(p[landmarks::CHEEK_RIGHT], right_eye, mouth_right);

        let mut lip_outer = [[0.0; 2]; 12];
        lip_outer.copy_from_slice(&p[landmarks::OUTER_LIP]);
        let mut lip_inner = [[0.0; 2]; 8];
        lip_inner.copy_from_slice(&p[landmarks::INNER_LIP]);

        Ok(Some(Self {
            center,
            radii,
            left_eye,
            right_eye,
            eye_radius: eye_distance * 0.4,
            slim_left,
            slim_right,
            slim_target,
            slim_radius,
            left_cheek,
            right_cheek,
            cheek_radius: eye_distance * 0.45,
            lip_outer,
            lip_inner,
            lip_feather: (distance(mouth_left, mouth_right) * LIP_FEATHER_FRACTION).max(1.0),
            smooth_radius: (radii[0].min(radii[1]) * SMOOTH_RADIUS_FRACTION).max(1.0),
        }))
    }

    /// Soft face mask: 1 inside the face ellipse, fading to 0 at its rim
    pub fn face_weight(&self, p: Point) -> f32 {
        let dx = (p[0] - self.center[0]) / self.radii[0];
        let dy = (p[1] - self.center[1]) / self.radii[1];
        1.0 - smoothstep(0.85, 1.0, (dx * dx + dy * dy).sqrt())
    }

    /// Lip mask: feathered inside the outer contour, cut out inside the inner one
    pub fn lip_weight(&self, p: Point) -> f32 {
        let (inside_outer, outer_distance) = polygon_test(p, &self.lip_outer);
        if !inside_outer {
            return 0.0;
        }
        let mut weight = smoothstep(0.0, self.lip_feather, outer_distance);
        let (inside_inner, inner_distance) = polygon_test(p, &self.lip_inner);
        if inside_inner {
            weight *= 1.0 - smoothstep(0.0, self.lip_feather, inner_distance);
        }
        weight
    }

    /// Radial blush weight around the nearer cheek
    pub fn cheek_weight(&self, p: Point) -> f32 {
        let radius = self.cheek_radius.max(1.0);
        let left = 1.0 - smoothstep(0.0, 1.0, distance(p, self.left_cheek) / radius);
        let right = 1.0 - smoothstep(0.0, 1.0, distance(p, self.right_cheek) / radius);
        left.max(right)
    }
}

/// Even-odd containment and distance to the nearest edge
pub fn polygon_test(p: Point, polygon: &[Point]) -> (bool, f32) {
    let mut inside = false;
    let mut nearest = f32::MAX;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (a, b) = (polygon[i], polygon[j]);
        if (a[1] > p[1]) != (b[1] > p[1]) {
            let cross_x = (b[0] - a[0]) * (p[1] - a[1]) / (b[1] - a[1]) + a[0];
            if p[0] < cross_x {
                inside = !inside;
            }
        }
        nearest = nearest.min(segment_distance(p, a, b));
        j = i;
    }
    (inside, nearest)
}

fn segment_distance(p: Point, a: Point, b: Point) -> f32 {
    let ab = [b[0] - a[0], b[1] - a[1]];
    let len2 = ab[0] * ab[0] + ab[1] * ab[1];
    let t = if len2 > 0.0 {
        (((p[0] - a[0]) * ab[0] + (p[1] - a[1]) * ab[1]) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    distance(p, [a[0] + ab[0] * t, a[1] + ab[1] * t])
}

/// Hermite smoothstep, identical to the WGSL builtin
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[inline]
pub fn distance(a: Point, b: Point) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    (dx * dx + dy * dy).sqrt()
}

#[inline]
pub fn lerp(a: Point, b: Point, t: f32) -> Point {
    [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::detector::face_template;

    fn template_geometry() -> FaceGeometry {
        let points = face_template([100.0, 50.0], [200.0, 260.0]);
        let set = LandmarkSet::from_points(&points).unwrap();
        FaceGeometry::from_landmarks(&set).unwrap().unwrap()
    }

    #[test]
    fn empty_set_has_no_geometry() {
        assert_eq!(FaceGeometry::from_landmarks(&LandmarkSet::new()).unwrap(), None);
    }

    #[test]
    fn non_finite_points_are_rejected() {
        let mut points = face_template([0.0, 0.0], [10.0, 10.0]);
        points[7] = [f32::NAN, 1.0];
        let set = LandmarkSet::from_points(&points).unwrap();
        assert!(FaceGeometry::from_landmarks(&set).is_err());
    }

    #[test]
    fn geometry_follows_template_layout() {
        let g = template_geometry();
        assert!(g.left_eye[0] < g.right_eye[0]);
        assert!(g.left_eye[1] < g.lip_outer[3][1]);
        assert!(g.slim_left[0] < g.slim_target[0] && g.slim_target[0] < g.slim_right[0]);
        assert!(g.face_weight(g.center) > 0.99);
        assert_eq!(g.face_weight([0.0, 0.0]), 0.0);
    }

    #[test]
    fn lip_mask_is_zero_outside_and_inside_mouth_opening() {
        let g = template_geometry();
        let upper_lip = lerp(g.lip_outer[3], g.lip_inner[2], 0.5);
        assert!(g.lip_weight(upper_lip) > 0.0);
        assert_eq!(g.lip_weight(g.center), 0.0);
        assert_eq!(g.lip_weight([0.0, 0.0]), 0.0);
    }

    #[test]
    fn polygon_test_on_square() {
        let square = [[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]];
        assert_eq!(polygon_test([1.0, 2.0], &square), (true, 1.0));
        assert!(!polygon_test([5.0, 2.0], &square).0);
    }
}
