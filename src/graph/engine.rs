// SPDX-License-Identifier: GPL-3.0-only

//! Pixel engine behind a graph: CPU kernels or the GPU chain

use crate::errors::GraphResult;
use crate::gpu::PipelineContext;
use crate::media::{I420Buffer, VideoFrame, i420_to_rgba_into, rgba_to_i420_into};
use crate::pipelines::beauty::ParameterSnapshot;
use crate::shaders::{BeautyUniforms, GpuBeautyChain};
use crate::stages::{FaceGeometry, SoftwareChain, StageKind};
use image::RgbaImage;
use tracing::debug;

pub enum BeautyEngine {
    Software {
        chain: SoftwareChain,
        /// RGBA copy of planar frames
        scratch: RgbaImage,
    },
    Gpu {
        chain: Box<GpuBeautyChain>,
        lip_color: [f32; 4],
        blush_color: [f32; 4],
    },
}

impl BeautyEngine {
    /// GPU engine when the context has a device, CPU kernels otherwise
    pub fn new(
        context: &PipelineContext,
        lip_color: [f32; 4],
        blush_color: [f32; 4],
    ) -> GraphResult<Self> {
        match context.device() {
            Some(gpu) => Ok(BeautyEngine::Gpu {
                chain: Box::new(GpuBeautyChain::new(gpu)?),
                lip_color,
                blush_color,
            }),
            None => {
                debug!("Using CPU beauty kernels");
                Ok(BeautyEngine::Software {
                    chain: SoftwareChain::new(lip_color, blush_color),
                    scratch: RgbaImage::new(0, 0),
                })
            }
        }
    }

    pub fn is_gpu(&self) -> bool {
        matches!(self, BeautyEngine::Gpu { .. })
    }

    /// Run `stages` over an RGBA image in place
    pub fn run_rgba(
        &mut self,
        image: &mut RgbaImage,
        geometry: &FaceGeometry,
        snapshot: &ParameterSnapshot,
        stages: &[StageKind],
    ) -> GraphResult<()> {
        match self {
            BeautyEngine::Software { chain, .. } => chain.run(image, geometry, snapshot),
            BeautyEngine::Gpu {
                chain,
                lip_color,
                blush_color,
            } => {
                let (width, height) = image.dimensions();
                let uniforms = BeautyUniforms::new(
                    width,
                    height,
                    geometry,
                    snapshot,
                    *lip_color,
                    *blush_color,
                );
                chain.run_rgba(image, &uniforms, stages)?;
                Ok(())
            }
        }
    }

    /// Run `stages` over a planar frame in place, converting internally
    pub fn run_i420(
        &mut self,
        frame: &mut I420Buffer,
        geometry: &FaceGeometry,
        snapshot: &ParameterSnapshot,
        stages: &[StageKind],
    ) -> GraphResult<()> {
        let (width, height) = (frame.width(), frame.height());
        match self {
            BeautyEngine::Software { chain, scratch } => {
                if scratch.dimensions() != (width, height) {
                    *scratch = RgbaImage::new(width, height);
                }
                i420_to_rgba_into(&frame.planes(), width, height, scratch)?;
                chain.run(scratch, geometry, snapshot)?;
                rgba_to_i420_into(scratch, &mut frame.planes_mut())?;
                Ok(())
            }
            BeautyEngine::Gpu {
                chain,
                lip_color,
                blush_color,
            } => {
                let uniforms = BeautyUniforms::new(
                    width,
                    height,
                    geometry,
                    snapshot,
                    *lip_color,
                    *blush_color,
                );
                chain.run_i420(frame, &uniforms, stages)?;
                Ok(())
            }
        }
    }
}
