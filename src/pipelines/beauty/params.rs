// SPDX-License-Identifier: GPL-3.0-only

//! Beauty levels shared between the control thread and the frame thread
//!
//! Each level is an `f32` stored as bits in an `AtomicU32`. Setters publish
//! with `Release`, the frame thread snapshots with `Acquire` once per frame,
//! so a frame never sees a level change halfway through.

use crate::config::BeautyLevels;
use crate::constants::Effect;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::debug;

/// Levels of one frame, captured before the graph runs
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParameterSnapshot {
    pub face_slim: f32,
    pub eye_zoom: f32,
    pub blur_alpha: f32,
    pub whiten: f32,
    pub lipstick: f32,
    pub blusher: f32,
}

impl ParameterSnapshot {
    pub fn get(&self, effect: Effect) -> f32 {
        match effect {
            Effect::FaceSlim => self.face_slim,
            Effect::EyeZoom => self.eye_zoom,
            Effect::BlurAlpha => self.blur_alpha,
            Effect::Whiten => self.whiten,
            Effect::Lipstick => self.lipstick,
            Effect::Blusher => self.blusher,
        }
    }

    /// Every effect at its minimum
    pub fn all_off(&self) -> bool {
        Effect::ALL
            .iter()
            .all(|effect| effect.range().is_min(self.get(*effect)))
    }
}

#[derive(Debug)]
pub struct ParameterState {
    face_slim: AtomicU32,
    eye_zoom: AtomicU32,
    blur_alpha: AtomicU32,
    whiten: AtomicU32,
    lipstick: AtomicU32,
    blusher: AtomicU32,
}

impl ParameterState {
    pub fn new(levels: BeautyLevels) -> Self {
        let levels = levels.clamped();
        let slot = |v: f32| AtomicU32::new(v.to_bits());
        Self {
            face_slim: slot(levels.face_slim),
            eye_zoom: slot(levels.eye_zoom),
            blur_alpha: slot(levels.blur_alpha),
            whiten: slot(levels.whiten),
            lipstick: slot(levels.lipstick),
            blusher: slot(levels.blusher),
        }
    }

    fn slot(&self, effect: Effect) -> &AtomicU32 {
        match effect {
            Effect::FaceSlim => &self.face_slim,
            Effect::EyeZoom => &self.eye_zoom,
            Effect::BlurAlpha => &self.blur_alpha,
            Effect::Whiten => &self.whiten,
            Effect::Lipstick => &self.lipstick,
            Effect::Blusher => &self.blusher,
        }
    }

    /// Clamp and store a level. Returns the value actually applied.
    pub fn set(&self, effect: Effect, value: f32) -> f32 {
        let applied = effect.range().clamp(value);
        let previous = f32::from_bits(self.slot(effect).swap(applied.to_bits(), Ordering::Release));
        if previous != applied {
            debug!(
                effect = %effect,
                requested = value,
                applied,
                "Beauty level changed"
            );
        }
        applied
    }

    pub fn get(&self, effect: Effect) -> f32 {
        f32::from_bits(self.slot(effect).load(Ordering::Acquire))
    }

    pub fn snapshot(&self) -> ParameterSnapshot {
        ParameterSnapshot {
            face_slim: self.get(Effect::FaceSlim),
            eye_zoom: self.get(Effect::EyeZoom),
            blur_alpha: self.get(Effect::BlurAlpha),
            whiten: self.get(Effect::Whiten),
            lipstick: self.get(Effect::Lipstick),
            blusher: self.get(Effect::Blusher),
        }
    }
}

/// Cloneable, thread-safe handle to a pipeline's levels
#[derive(Debug, Clone)]
pub struct ParameterHandle(Arc<ParameterState>);

impl ParameterHandle {
    pub fn new(levels: BeautyLevels) -> Self {
        Self(Arc::new(ParameterState::new(levels)))
    }

    pub fn set(&self, effect: Effect, value: f32) -> f32 {
        self.0.set(effect, value)
    }

    pub fn get(&self, effect: Effect) -> f32 {
        self.0.get(effect)
    }

    pub fn snapshot(&self) -> ParameterSnapshot {
        self.0.snapshot()
    }

    pub fn set_face_slim_level(&self, level: f32) -> f32 {
        self.set(Effect::FaceSlim, level)
    }

    pub fn set_eye_zoom_level(&self, level: f32) -> f32 {
        self.set(Effect::EyeZoom, level)
    }

    pub fn set_blur_alpha(&self, alpha: f32) -> f32 {
        self.set(Effect::BlurAlpha, alpha)
    }

    pub fn set_white(&self, level: f32) -> f32 {
        self.set(Effect::Whiten, level)
    }

    pub fn set_lipstick_blend_level(&self, level: f32) -> f32 {
        self.set(Effect::Lipstick, level)
    }

    pub fn set_blusher_blend_level(&self, level: f32) -> f32 {
        self.set(Effect::Blusher, level)
    }
}
