// SPDX-License-Identifier: GPL-3.0-only

//! Pipeline-wide constants

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Number of points in a complete landmark set (iBUG-300W layout)
pub const LANDMARK_COUNT: usize = 68;

/// Landmark index ranges in the 68-point layout
pub mod landmarks {
    use super::Range;

    pub const JAW: Range<usize> = 0..17;
    pub const RIGHT_BROW: Range<usize> = 17..22;
    pub const LEFT_BROW: Range<usize> = 22..27;
    pub const NOSE_BRIDGE: Range<usize> = 27..31;
    pub const NOSE_BASE: Range<usize> = 31..36;
    /// Eye on the image left (subject's right eye)
    pub const RIGHT_EYE: Range<usize> = 36..42;
    /// Eye on the image right (subject's left eye)
    pub const LEFT_EYE: Range<usize> = 42..48;
    pub const OUTER_LIP: Range<usize> = 48..60;
    pub const INNER_LIP: Range<usize> = 60..68;

    /// Tip of the nose, the anchor face slimming pulls towards
    pub const NOSE_TIP: usize = 30;
    /// Jaw contour points displaced by face slimming
    pub const SLIM_LEFT: usize = 4;
    pub const SLIM_RIGHT: usize = 12;
    /// Jaw points under the cheek bones, used to place blush
    pub const CHEEK_LEFT: usize = 3;
    pub const CHEEK_RIGHT: usize = 13;
    pub const MOUTH_LEFT: usize = 48;
    pub const MOUTH_RIGHT: usize = 54;
}

/// Compute shader workgroup edge (16x16 invocations)
pub const WORKGROUP_SIZE: u32 = 16;

/// Fraction of the contour-to-nose distance a jaw point moves at full slim level
pub const SLIM_MAX_SHIFT: f32 = 0.22;

/// Center magnification of the eye warp at full eye zoom level
pub const EYE_MAX_ZOOM: f32 = 0.3;

/// Log-curve strength reached at full whitening level
pub const WHITEN_MAX_BETA: f32 = 6.0;

/// Luma difference (0..1) at which the bilateral weight falls to exp(-1/2)
pub const SMOOTH_SIGMA: f32 = 0.12;

/// Blur ring radius as a fraction of the smaller face radius
pub const SMOOTH_RADIUS_FRACTION: f32 = 0.06;

pub const LIPSTICK_MAX_OPACITY: f32 = 0.7;
pub const BLUSH_MAX_OPACITY: f32 = 0.4;

/// Feather width of the lip mask as a fraction of the mouth width
pub const LIP_FEATHER_FRACTION: f32 = 0.08;

pub const DEFAULT_LIP_COLOR: [f32; 4] = [0.78, 0.11, 0.24, 1.0];
pub const DEFAULT_BLUSH_COLOR: [f32; 4] = [0.95, 0.45, 0.5, 1.0];

/// Closed interval a beauty level is clamped into
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelRange {
    pub min: f32,
    pub max: f32,
}

impl LevelRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Clamp `value` into the range. NaN maps to the minimum.
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            self.min
        } else {
            value.clamp(self.min, self.max)
        }
    }

    /// Whether `value` sits at (or below) the minimum, i.e. the effect is off
    pub fn is_min(&self, value: f32) -> bool {
        value <= self.min
    }
}

/// Adjustable beauty effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    FaceSlim,
    EyeZoom,
    BlurAlpha,
    Whiten,
    Lipstick,
    Blusher,
}

impl Effect {
    /// Get all effects in parameter-surface order
    pub const ALL: [Effect; 6] = [
        Effect::FaceSlim,
        Effect::EyeZoom,
        Effect::BlurAlpha,
        Effect::Whiten,
        Effect::Lipstick,
        Effect::Blusher,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Effect::FaceSlim => "Face slim",
            Effect::EyeZoom => "Eye zoom",
            Effect::BlurAlpha => "Skin smoothing",
            Effect::Whiten => "Whitening",
            Effect::Lipstick => "Lipstick",
            Effect::Blusher => "Blusher",
        }
    }

    /// Range the setter for this effect clamps into
    pub fn range(&self) -> LevelRange {
        // Every level is a normalized strength; the stages scale it
        LevelRange::new(0.0, 1.0)
    }
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_range_clamps_and_maps_nan_to_min() {
        let range = LevelRange::new(0.0, 1.0);
        assert_eq!(range.clamp(-3.0), 0.0);
        assert_eq!(range.clamp(7.5), 1.0);
        assert_eq!(range.clamp(0.25), 0.25);
        assert_eq!(range.clamp(f32::NAN), 0.0);
        assert_eq!(range.clamp(f32::INFINITY), 1.0);
    }

    #[test]
    fn landmark_ranges_cover_all_points() {
        let total = landmarks::JAW.len()
            + landmarks::RIGHT_BROW.len()
            + landmarks::LEFT_BROW.len()
            + landmarks::NOSE_BRIDGE.len()
            + landmarks::NOSE_BASE.len()
            + landmarks::RIGHT_EYE.len()
            + landmarks::LEFT_EYE.len()
            + landmarks::OUTER_LIP.len()
            + landmarks::INNER_LIP.len();
        assert_eq!(total, LANDMARK_COUNT);
        assert_eq!(landmarks::INNER_LIP.end, LANDMARK_COUNT);
    }
}
