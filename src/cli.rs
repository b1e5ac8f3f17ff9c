// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Probing the GPU adapter
//! - Beautifying a still image through the full pipeline
//! - Writing synthetic test faces

use clap::Args;
use frame_beauty::config::{BeautyLevels, ComputeBackend, Config, GraphVariant, PowerPreference};
use frame_beauty::constants::Effect;
use frame_beauty::gpu::PipelineContext;
use frame_beauty::media::{VideoFrame, i420_to_rgba, rgba_to_i420, synthetic_face_frame};
use frame_beauty::{BeautyPipeline, FrameOutcome, TrackHandle};
use std::path::{Path, PathBuf};

/// Effect levels given on the command line, each in [0, 1]
#[derive(Args, Debug, Default)]
pub struct LevelArgs {
    /// Face slimming
    #[arg(long)]
    pub slim: Option<f32>,

    /// Eye enlargement
    #[arg(long)]
    pub eye: Option<f32>,

    /// Skin smoothing
    #[arg(long)]
    pub smooth: Option<f32>,

    /// Skin whitening
    #[arg(long)]
    pub whiten: Option<f32>,

    /// Lipstick opacity
    #[arg(long)]
    pub lipstick: Option<f32>,

    /// Blush opacity
    #[arg(long)]
    pub blusher: Option<f32>,
}

impl LevelArgs {
    fn apply(&self, levels: &mut BeautyLevels) {
        let pairs = [
            (Effect::FaceSlim, self.slim),
            (Effect::EyeZoom, self.eye),
            (Effect::BlurAlpha, self.smooth),
            (Effect::Whiten, self.whiten),
            (Effect::Lipstick, self.lipstick),
            (Effect::Blusher, self.blusher),
        ];
        for (effect, value) in pairs {
            if let Some(value) = value {
                levels.set(effect, value);
            }
        }
    }
}

/// Print the adapter a pipeline would run on
pub fn show_info(backend: ComputeBackend) -> Result<(), Box<dyn std::error::Error>> {
    println!("frame-beauty {}", frame_beauty::VERSION);
    println!("Default graph variant: {}", GraphVariant::default());

    let mut context = PipelineContext::new(backend, PowerPreference::HighPerformance);
    context.initialize()?;

    match context.device() {
        Some(gpu) => {
            println!("Adapter: {}", gpu.info.adapter_name);
            println!("Backend: {:?}", gpu.info.backend);
            println!("Device type: {:?}", gpu.info.device_type);
        }
        None => println!("No GPU in use, running CPU kernels"),
    }

    context.teardown();
    Ok(())
}

/// Run one image through a pipeline and save the result
pub fn process_image(
    input: &Path,
    output: &Path,
    config_path: Option<PathBuf>,
    variant: Option<GraphVariant>,
    backend: Option<ComputeBackend>,
    levels: &LevelArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match config_path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(variant) = variant {
        config.variant = variant;
    }
    if let Some(backend) = backend {
        config.backend = backend;
    }
    levels.apply(&mut config.levels);

    let mut rgba = image::open(input)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width % 2 != 0 || height % 2 != 0 {
        // I420 needs even dimensions
        rgba = image::imageops::crop_imm(&rgba, 0, 0, width & !1, height & !1).to_image();
    }
    let mut frame = rgba_to_i420(&rgba)?;
    println!(
        "Input: {}x{} ({} graph)",
        frame.width(),
        frame.height(),
        config.variant
    );

    let mut pipeline = BeautyPipeline::new(Some(TrackHandle::new("cli")), config)?;
    let outcome = pipeline.process(&mut frame);
    match &outcome {
        FrameOutcome::Beautified => println!("Face found, effects applied"),
        FrameOutcome::NoFace => println!("No face found, image unchanged"),
        FrameOutcome::EffectsOff => println!("All levels are zero, image unchanged"),
        FrameOutcome::PassedThrough(e) => println!("Processing failed, image unchanged: {}", e),
    }
    if let Some(elapsed) = pipeline.stats().last_frame_time {
        println!("Frame time: {:.2?}", elapsed);
    }

    let result = i420_to_rgba(&frame.planes(), frame.width(), frame.height())?;
    result.save(output)?;
    println!("Saved: {}", output.display());
    Ok(())
}

/// Save a generated face image
pub fn write_synthetic(output: &Path, size: u32) -> Result<(), Box<dyn std::error::Error>> {
    let size = (size & !1).max(2);
    let frame = synthetic_face_frame(size, size);
    let rgba = i420_to_rgba(&frame.planes(), size, size)?;
    rgba.save(output)?;
    println!("Saved {}x{} synthetic face: {}", size, size, output.display());
    Ok(())
}
