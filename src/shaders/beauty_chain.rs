// SPDX-License-Identifier: GPL-3.0-only
//! GPU execution of the beauty stages
//!
//! Every stage is one compute pass reading one storage buffer and writing the
//! other (ping-pong). Planar frames are converted to RGBA and back on the GPU
//! so a sink-variant frame makes a single upload and a single readback.

use super::gpu_processor::{CachedDimensions, compute_dispatch_size, read_buffer_async};
use super::uniforms::{BeautyUniforms, PlaneUniforms};
use super::{BEAUTY_SHADER, CONVERT_SHADER};
use crate::constants::WORKGROUP_SIZE;
use crate::errors::{GpuError, GpuResult};
use crate::gpu::{GpuDevice, wgpu};
use crate::media::{I420Buffer, Plane, VideoFrame};
use crate::stages::StageKind;
use image::RgbaImage;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Storage buffers and bind groups sized for one frame shape
struct FrameResources {
    ping: wgpu::Buffer,
    pong: wgpu::Buffer,
    planes: wgpu::Buffer,
    rgba_staging: wgpu::Buffer,
    planes_staging: wgpu::Buffer,
    /// [ping -> pong, pong -> ping]
    stage_groups: [wgpu::BindGroup; 2],
    /// [planes + ping, planes + pong]
    convert_groups: [wgpu::BindGroup; 2],
    plane_layout: PlaneUniforms,
}

pub struct GpuBeautyChain {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    stage_layout: wgpu::BindGroupLayout,
    convert_layout: wgpu::BindGroupLayout,
    reshape: wgpu::ComputePipeline,
    skin: wgpu::ComputePipeline,
    lipstick: wgpu::ComputePipeline,
    blusher: wgpu::ComputePipeline,
    to_rgba: wgpu::ComputePipeline,
    to_luma: wgpu::ComputePipeline,
    to_chroma: wgpu::ComputePipeline,
    beauty_uniforms: wgpu::Buffer,
    plane_uniforms: wgpu::Buffer,
    cached_dims: CachedDimensions,
    resources: Option<FrameResources>,
    packed: Vec<u8>,
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl GpuBeautyChain {
    /// Compile both shaders and create the pipelines on `gpu`
    pub fn new(gpu: &GpuDevice) -> GpuResult<Self> {
        let device = Arc::clone(&gpu.device);
        let queue = Arc::clone(&gpu.queue);

        let beauty_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("beauty_shader"),
            source: wgpu::ShaderSource::Wgsl(BEAUTY_SHADER.into()),
        });
        let convert_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("yuv_convert_shader"),
            source: wgpu::ShaderSource::Wgsl(CONVERT_SHADER.into()),
        });

        let stage_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("beauty_stage_layout"),
            entries: &[
                storage_entry(0, true),
                storage_entry(1, false),
                uniform_entry(2),
            ],
        });
        let convert_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("yuv_convert_layout"),
            entries: &[
                storage_entry(0, false),
                storage_entry(1, false),
                uniform_entry(2),
            ],
        });

        let stage_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("beauty_stage_pipeline_layout"),
            bind_group_layouts: &[&stage_layout],
            push_constant_ranges: &[],
        });
        let convert_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("yuv_convert_pipeline_layout"),
                bind_group_layouts: &[&convert_layout],
                push_constant_ranges: &[],
            });

        let pipeline = |layout: &wgpu::PipelineLayout, module: &wgpu::ShaderModule, entry: &str| {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(entry),
                layout: Some(layout),
                module,
                entry_point: Some(entry),
                compilation_options: Default::default(),
                cache: None,
            })
        };

        let reshape = pipeline(&stage_pipeline_layout, &beauty_module, "reshape_main");
        let skin = pipeline(&stage_pipeline_layout, &beauty_module, "skin_main");
        let lipstick = pipeline(&stage_pipeline_layout, &beauty_module, "lipstick_main");
        let blusher = pipeline(&stage_pipeline_layout, &beauty_module, "blusher_main");
        let to_rgba = pipeline(&convert_pipeline_layout, &convert_module, "i420_to_rgba_main");
        let to_luma = pipeline(&convert_pipeline_layout, &convert_module, "rgba_to_luma_main");
        let to_chroma = pipeline(&convert_pipeline_layout, &convert_module, "rgba_to_chroma_main");

        let beauty_uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("beauty_uniform_buffer"),
            size: std::mem::size_of::<BeautyUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let plane_uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("plane_uniform_buffer"),
            size: std::mem::size_of::<PlaneUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        info!(adapter = %gpu.info.adapter_name, "GPU beauty chain created");

        Ok(Self {
            device,
            queue,
            stage_layout,
            convert_layout,
            reshape,
            skin,
            lipstick,
            blusher,
            to_rgba,
            to_luma,
            to_chroma,
            beauty_uniforms,
            plane_uniforms,
            cached_dims: CachedDimensions::default(),
            resources: None,
            packed: Vec::new(),
        })
    }

    fn stage_pipeline(&self, kind: StageKind) -> Option<&wgpu::ComputePipeline> {
        match kind {
            StageKind::LandmarkDetector => None,
            StageKind::FaceReshape => Some(&self.reshape),
            StageKind::FaceSmooth => Some(&self.skin),
            StageKind::Lipstick => Some(&self.lipstick),
            StageKind::Blusher => Some(&self.blusher),
        }
    }

    /// Ensure buffers and bind groups exist for the given dimensions
    fn ensure_resources(&mut self, width: u32, height: u32) {
        if !self.cached_dims.needs_update(width, height) && self.resources.is_some() {
            return;
        }

        debug!(width, height, "Allocating beauty chain resources");

        let plane_layout = PlaneUniforms::new(width, height);
        let rgba_size = width as u64 * height as u64 * 4;
        let planes_size = plane_layout.total_words() as u64 * 4;

        let buffer = |label: &str, size: u64, usage: wgpu::BufferUsages| {
            self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage,
                mapped_at_creation: false,
            })
        };
        let storage = wgpu::BufferUsages::STORAGE
            | wgpu::BufferUsages::COPY_DST
            | wgpu::BufferUsages::COPY_SRC;
        let staging = wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ;

        let ping = buffer("beauty_ping_buffer", rgba_size, storage);
        let pong = buffer("beauty_pong_buffer", rgba_size, storage);
        let planes = buffer("beauty_planes_buffer", planes_size, storage);
        let rgba_staging = buffer("beauty_rgba_staging", rgba_size, staging);
        let planes_staging = buffer("beauty_planes_staging", planes_size, staging);

        let stage_group = |input: &wgpu::Buffer, output: &wgpu::Buffer| {
            self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("beauty_stage_bind_group"),
                layout: &self.stage_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: input.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: output.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: self.beauty_uniforms.as_entire_binding(),
                    },
                ],
            })
        };
        let convert_group = |rgba: &wgpu::Buffer| {
            self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("yuv_convert_bind_group"),
                layout: &self.convert_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: planes.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: rgba.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: self.plane_uniforms.as_entire_binding(),
                    },
                ],
            })
        };

        let stage_groups = [stage_group(&ping, &pong), stage_group(&pong, &ping)];
        let convert_groups = [convert_group(&ping), convert_group(&pong)];

        self.queue
            .write_buffer(&self.plane_uniforms, 0, bytemuck::bytes_of(&plane_layout));

        self.resources = Some(FrameResources {
            ping,
            pong,
            planes,
            rgba_staging,
            planes_staging,
            stage_groups,
            convert_groups,
            plane_layout,
        });
        self.packed = vec![0u8; planes_size as usize];
        self.cached_dims.update(width, height);
    }

    /// Record one pass per pixel stage. Returns the index of the buffer
    /// holding the result (0 = ping, 1 = pong).
    fn encode_stages(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        resources: &FrameResources,
        stages: &[StageKind],
        width: u32,
        height: u32,
    ) -> usize {
        let mut current = 0;
        for kind in stages {
            let Some(pipeline) = self.stage_pipeline(*kind) else {
                continue;
            };
            trace!(stage = %kind, "Encoding GPU stage");
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(kind.name()),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, Some(&resources.stage_groups[current]), &[]);
            pass.dispatch_workgroups(
                compute_dispatch_size(width, WORKGROUP_SIZE),
                compute_dispatch_size(height, WORKGROUP_SIZE),
                1,
            );
            drop(pass);
            current ^= 1;
        }
        current
    }

    fn convert_pass(
        encoder: &mut wgpu::CommandEncoder,
        pipeline: &wgpu::ComputePipeline,
        group: &wgpu::BindGroup,
        groups_x: u32,
        groups_y: u32,
    ) {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("yuv_convert_pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, Some(group), &[]);
        pass.dispatch_workgroups(groups_x, groups_y, 1);
    }

    /// Run `stages` over an RGBA image in place
    pub fn run_rgba(
        &mut self,
        image: &mut RgbaImage,
        uniforms: &BeautyUniforms,
        stages: &[StageKind],
    ) -> GpuResult<()> {
        let (width, height) = image.dimensions();
        self.ensure_resources(width, height);
        let resources = self.resources.as_ref().ok_or(GpuError::NotInitialized)?;

        self.queue.write_buffer(&resources.ping, 0, image.as_raw());
        self.queue
            .write_buffer(&self.beauty_uniforms, 0, bytemuck::bytes_of(uniforms));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("beauty_rgba_encoder"),
            });
        let result = self.encode_stages(&mut encoder, resources, stages, width, height);
        let output = if result == 0 {
            &resources.ping
        } else {
            &resources.pong
        };
        let size = width as u64 * height as u64 * 4;
        encoder.copy_buffer_to_buffer(output, 0, &resources.rgba_staging, 0, size);
        self.queue.submit(std::iter::once(encoder.finish()));

        let out: &mut [u8] = image;
        let len = out.len();
        pollster::block_on(read_buffer_async(
            &self.device,
            &resources.rgba_staging,
            |data| out.copy_from_slice(&data[..len]),
        ))
    }

    /// Run `stages` over a planar frame in place, converting on the GPU
    pub fn run_i420(
        &mut self,
        frame: &mut I420Buffer,
        uniforms: &BeautyUniforms,
        stages: &[StageKind],
    ) -> GpuResult<()> {
        let (width, height) = (frame.width(), frame.height());
        self.ensure_resources(width, height);
        self.pack_planes(frame);
        let resources = self.resources.as_ref().ok_or(GpuError::NotInitialized)?;
        let layout = resources.plane_layout;

        self.queue.write_buffer(&resources.planes, 0, &self.packed);
        self.queue
            .write_buffer(&self.beauty_uniforms, 0, bytemuck::bytes_of(uniforms));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("beauty_i420_encoder"),
            });

        Self::convert_pass(
            &mut encoder,
            &self.to_rgba,
            &resources.convert_groups[0],
            compute_dispatch_size(width, WORKGROUP_SIZE),
            compute_dispatch_size(height, WORKGROUP_SIZE),
        );
        let result = self.encode_stages(&mut encoder, resources, stages, width, height);
        let back = &resources.convert_groups[result];
        Self::convert_pass(
            &mut encoder,
            &self.to_luma,
            back,
            compute_dispatch_size(layout.strides[0], WORKGROUP_SIZE),
            compute_dispatch_size(layout.dims[1], WORKGROUP_SIZE),
        );
        Self::convert_pass(
            &mut encoder,
            &self.to_chroma,
            back,
            compute_dispatch_size(layout.strides[1], WORKGROUP_SIZE),
            compute_dispatch_size(layout.dims[3], WORKGROUP_SIZE),
        );

        encoder.copy_buffer_to_buffer(
            &resources.planes,
            0,
            &resources.planes_staging,
            0,
            self.packed.len() as u64,
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        pollster::block_on(read_buffer_async(
            &self.device,
            &resources.planes_staging,
            |data| unpack_planes(data, &layout, frame),
        ))
    }

    fn pack_planes(&mut self, frame: &I420Buffer) {
        let layout = PlaneUniforms::new(frame.width(), frame.height());
        self.packed.fill(0);
        for plane in Plane::ALL {
            let (stride_words, offset_words) = layout.plane_layout(plane);
            let row_width = plane.row_width(frame.width());
            let src_stride = frame.stride(plane);
            let src = frame.plane(plane);
            for row in 0..plane.rows(frame.height()) {
                let dst = (offset_words + row * stride_words) * 4;
                self.packed[dst..dst + row_width]
                    .copy_from_slice(&src[row * src_stride..row * src_stride + row_width]);
            }
        }
    }
}

/// Copy visible bytes of every packed row back into `frame`
fn unpack_planes(data: &[u8], layout: &PlaneUniforms, frame: &mut I420Buffer) {
    let (width, height) = (frame.width(), frame.height());
    for plane in Plane::ALL {
        let (stride_words, offset_words) = layout.plane_layout(plane);
        let row_width = plane.row_width(width);
        let dst_stride = frame.stride(plane);
        let dst = frame.plane_mut(plane);
        for row in 0..plane.rows(height) {
            let src = (offset_words + row * stride_words) * 4;
            dst[row * dst_stride..row * dst_stride + row_width]
                .copy_from_slice(&data[src..src + row_width]);
        }
    }
}
