// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::{DEFAULT_BLUSH_COLOR, DEFAULT_LIP_COLOR, Effect};
use crate::errors::{BeautyError, BeautyResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Filter graph variant, fixed for the lifetime of a pipeline
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum GraphVariant {
    /// Pull-style graph working on RGBA; the frame adapter converts on the CPU
    RawData,
    /// Push-style graph working on planar I420 and converting internally
    Sink,
}

impl GraphVariant {
    pub const ALL: [GraphVariant; 2] = [GraphVariant::RawData, GraphVariant::Sink];

    pub fn display_name(&self) -> &'static str {
        match self {
            GraphVariant::RawData => "raw-data",
            GraphVariant::Sink => "sink",
        }
    }
}

impl Default for GraphVariant {
    /// Android devices run the RGBA raw-data graph, everything else the planar sink
    fn default() -> Self {
        if cfg!(target_os = "android") {
            GraphVariant::RawData
        } else {
            GraphVariant::Sink
        }
    }
}

impl std::fmt::Display for GraphVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Where the beauty stages run
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ComputeBackend {
    /// Use the GPU when an adapter exists, otherwise the CPU kernels
    #[default]
    Auto,
    /// Require a hardware adapter
    Gpu,
    /// CPU kernels only; the context carries no device
    Software,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerPreference {
    LowPower,
    #[default]
    HighPerformance,
}

/// Initial levels for the six effects
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct BeautyLevels {
    pub face_slim: f32,
    pub eye_zoom: f32,
    pub blur_alpha: f32,
    pub whiten: f32,
    pub lipstick: f32,
    pub blusher: f32,
}

impl BeautyLevels {
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

    pub fn set(&mut self, effect: Effect, value: f32) {
        let slot = match effect {
            Effect::FaceSlim => &mut self.face_slim,
            Effect::EyeZoom => &mut self.eye_zoom,
            Effect::BlurAlpha => &mut self.blur_alpha,
            Effect::Whiten => &mut self.whiten,
            Effect::Lipstick => &mut self.lipstick,
            Effect::Blusher => &mut self.blusher,
        };
        *slot = value;
    }

    /// Copy with every level clamped into its effect's range
    pub fn clamped(mut self) -> Self {
        for effect in Effect::ALL {
            self.set(effect, effect.range().clamp(self.get(effect)));
        }
        self
    }
}

/// Tuning for the built-in skin-tone landmark detector
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Smallest skin blob, as a fraction of the frame area, accepted as a face
    pub min_face_fraction: f32,
    /// Cells along the longer frame edge of the classification grid
    pub grid_cells: u32,
    /// Accepted full-range Cb interval
    pub cb_range: [f32; 2],
    /// Accepted full-range Cr interval
    pub cr_range: [f32; 2],
    /// Darker pixels are never skin
    pub min_luma: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_face_fraction: 0.02,
            grid_cells: 64,
            cb_range: [77.0, 127.0],
            cr_range: [133.0, 173.0],
            min_luma: 40.0,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Config {
    /// Graph variant (raw-data RGBA or planar sink)
    pub variant: GraphVariant,
    /// Compute backend selection
    pub backend: ComputeBackend,
    /// Adapter preference when a GPU is used
    pub power_preference: PowerPreference,
    /// Levels applied before the first setter call
    pub levels: BeautyLevels,
    /// Lipstick tint, RGBA in 0..1
    pub lip_color: [f32; 4],
    /// Blush tint, RGBA in 0..1
    pub blush_color: [f32; 4],
    /// Built-in detector tuning
    pub detector: DetectorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            variant: GraphVariant::default(),
            backend: ComputeBackend::default(),
            power_preference: PowerPreference::default(),
            levels: BeautyLevels::default(),
            lip_color: DEFAULT_LIP_COLOR,
            blush_color: DEFAULT_BLUSH_COLOR,
            detector: DetectorConfig::default(),
        }
    }
}

impl Config {
    /// Parse a JSON document, clamp the levels and validate the rest
    pub fn from_json(json: &str) -> BeautyResult<Self> {
        let mut config: Config = serde_json::from_str(json)?;
        config.levels = config.levels.clamped();
        config.validate().map_err(BeautyError::Config)?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> BeautyResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading configuration");
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, color) in [("lip_color", self.lip_color), ("blush_color", self.blush_color)] {
            if color.iter().any(|c| !c.is_finite() || !(0.0..=1.0).contains(c)) {
                return Err(format!("{} components must be within 0..1", name));
            }
        }

        let detector = &self.detector;
        if detector.grid_cells < 8 {
            return Err(format!(
                "detector.grid_cells must be at least 8, got {}",
                detector.grid_cells
            ));
        }
        if !(0.0..1.0).contains(&detector.min_face_fraction) {
            return Err("detector.min_face_fraction must be within [0, 1)".to_string());
        }
        for (name, range) in [("cb_range", detector.cb_range), ("cr_range", detector.cr_range)] {
            if range[0] > range[1] {
                return Err(format!("detector.{} is empty", name));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn levels_are_clamped_on_load() {
        let config =
            Config::from_json(r#"{ "levels": { "face_slim": 4.0, "whiten": -1.0 } }"#).unwrap();
        assert_eq!(config.levels.face_slim, 1.0);
        assert_eq!(config.levels.whiten, 0.0);
        assert_eq!(config.levels.lipstick, 0.0);
    }

    #[test]
    fn rejects_out_of_range_colors() {
        let err = Config::from_json(r#"{ "lip_color": [1.5, 0.0, 0.0, 1.0] }"#).unwrap_err();
        assert!(matches!(err, BeautyError::Config(_)));
    }

    #[test]
    fn variant_names_are_snake_case() {
        let config = Config::from_json(r#"{ "variant": "raw_data", "backend": "software" }"#)
            .unwrap();
        assert_eq!(config.variant, GraphVariant::RawData);
        assert_eq!(config.backend, ComputeBackend::Software);
    }
}
