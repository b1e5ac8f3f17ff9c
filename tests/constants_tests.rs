// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for constants module

use frame_beauty::constants::{DEFAULT_BLUSH_COLOR, DEFAULT_LIP_COLOR, Effect, landmarks};

#[test]
fn test_effect_values() {
    // Six effects, one setter each
    assert_eq!(Effect::ALL.len(), 6);
}

#[test]
fn test_effect_ranges_are_normalized() {
    for effect in Effect::ALL {
        let range = effect.range();
        assert_eq!(range.min, 0.0, "{} minimum", effect);
        assert_eq!(range.max, 1.0, "{} maximum", effect);
        assert!(range.is_min(range.clamp(f32::NAN)));
    }
}

#[test]
fn test_effect_names_are_unique() {
    let mut names: Vec<_> = Effect::ALL.iter().map(|e| e.display_name()).collect();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), Effect::ALL.len());
}

#[test]
fn test_lip_ranges_follow_eyes() {
    assert_eq!(landmarks::LEFT_EYE.end, landmarks::OUTER_LIP.start);
    assert_eq!(landmarks::OUTER_LIP.end, landmarks::INNER_LIP.start);
    assert!(landmarks::OUTER_LIP.contains(&landmarks::MOUTH_LEFT));
    assert!(landmarks::OUTER_LIP.contains(&landmarks::MOUTH_RIGHT));
    assert!(landmarks::NOSE_BRIDGE.contains(&landmarks::NOSE_TIP));
}

#[test]
fn test_default_colors_are_opaque() {
    assert_eq!(DEFAULT_LIP_COLOR[3], 1.0);
    assert_eq!(DEFAULT_BLUSH_COLOR[3], 1.0);
}
