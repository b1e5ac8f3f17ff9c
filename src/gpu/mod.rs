// SPDX-License-Identifier: GPL-3.0-only

//! GPU context for the beauty pipeline.
//!
//! A [`PipelineContext`] owns one headless wgpu device for the lifetime of a
//! pipeline. It is initialized exactly once, made current on the thread that
//! runs a frame, and torn down exactly once. Nothing is ever presented to a
//! surface.

use crate::config::{ComputeBackend, PowerPreference};
use crate::errors::{GpuError, GpuResult};
use std::cell::Cell;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

pub use wgpu;

/// Information about the created GPU device
#[derive(Debug, Clone)]
pub struct GpuDeviceInfo {
    /// Name of the GPU adapter
    pub adapter_name: String,
    /// Backend being used (Vulkan, Metal, DX12, etc.)
    pub backend: wgpu::Backend,
    /// Integrated, discrete, software rasterizer, ...
    pub device_type: wgpu::DeviceType,
}

/// Device and queue shared by every compute pass of one pipeline
#[derive(Debug, Clone)]
pub struct GpuDevice {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub info: GpuDeviceInfo,
}

/// Create a headless wgpu device and queue for compute work.
///
/// # Arguments
///
/// * `label` - A label for the device (for debugging)
/// * `power` - Adapter preference
pub async fn create_compute_device(label: &str, power: PowerPreference) -> GpuResult<GpuDevice> {
    info!(label = label, "Creating GPU device for compute");

    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..Default::default()
    });

    let power_preference = match power {
        PowerPreference::LowPower => wgpu::PowerPreference::LowPower,
        PowerPreference::HighPerformance => wgpu::PowerPreference::HighPerformance,
    };

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .map_err(|e| GpuError::AdapterUnavailable(e.to_string()))?;

    let adapter_info = adapter.get_info();

    info!(
        adapter = %adapter_info.name,
        backend = ?adapter_info.backend,
        device_type = ?adapter_info.device_type,
        "GPU adapter selected for compute"
    );

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some(label),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
            memory_hints: wgpu::MemoryHints::Performance,
            ..Default::default()
        })
        .await
        .map_err(|e| GpuError::DeviceCreation(e.to_string()))?;

    Ok(GpuDevice {
        device: Arc::new(device),
        queue: Arc::new(queue),
        info: GpuDeviceInfo {
            adapter_name: adapter_info.name.clone(),
            backend: adapter_info.backend,
            device_type: adapter_info.device_type,
        },
    })
}

/// Identifier of a pipeline context, unique within the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_THREAD_TOKEN: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static CURRENT: Cell<Option<ContextId>> = const { Cell::new(None) };
    static THREAD_TOKEN: u64 = NEXT_THREAD_TOKEN.fetch_add(1, Ordering::Relaxed);
}

/// Context bound to the calling thread, if any
pub fn current_context() -> Option<ContextId> {
    CURRENT.with(|current| current.get())
}

fn thread_token() -> u64 {
    THREAD_TOKEN.with(|token| *token)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContextState {
    Uninitialized,
    Ready,
    TornDown,
}

/// Persistent compute context of one pipeline
#[derive(Debug)]
pub struct PipelineContext {
    id: ContextId,
    backend: ComputeBackend,
    power: PowerPreference,
    state: ContextState,
    device: Option<GpuDevice>,
    /// Token of the thread the context is current on, 0 when unbound
    owner: AtomicU64,
}

impl PipelineContext {
    pub fn new(backend: ComputeBackend, power: PowerPreference) -> Self {
        Self {
            id: ContextId(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed)),
            backend,
            power,
            state: ContextState::Uninitialized,
            device: None,
            owner: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Create the device. Runs once; later calls fail.
    pub fn initialize(&mut self) -> GpuResult<()> {
        match self.state {
            ContextState::Ready => return Err(GpuError::AlreadyInitialized),
            ContextState::TornDown => return Err(GpuError::TornDown),
            ContextState::Uninitialized => {}
        }

        let label = "frame-beauty";
        self.device = match self.backend {
            ComputeBackend::Software => None,
            ComputeBackend::Gpu => Some(pollster::block_on(create_compute_device(
                label, self.power,
            ))?),
            ComputeBackend::Auto => {
                match pollster::block_on(create_compute_device(label, self.power)) {
                    Ok(device) => Some(device),
                    Err(e) => {
                        warn!(error = %e, "GPU unavailable, using software kernels");
                        None
                    }
                }
            }
        };

        self.state = ContextState::Ready;
        info!(
            context = self.id.0,
            adapter = self
                .device
                .as_ref()
                .map(|d| d.info.adapter_name.as_str())
                .unwrap_or("software"),
            "Pipeline context initialized"
        );
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.state == ContextState::Ready
    }

    /// Ready but running the CPU kernels
    pub fn is_software(&self) -> bool {
        self.is_ready() && self.device.is_none()
    }

    pub fn device(&self) -> Option<&GpuDevice> {
        self.device.as_ref()
    }

    /// Bind the context to the calling thread until the guard drops.
    ///
    /// Re-binding on the owning thread is allowed; another thread gets
    /// [`GpuError::ContextBusy`] while a guard is alive.
    pub fn make_current(&self) -> GpuResult<CurrentContext<'_>> {
        match self.state {
            ContextState::Uninitialized => return Err(GpuError::NotInitialized),
            ContextState::TornDown => return Err(GpuError::TornDown),
            ContextState::Ready => {}
        }

        let token = thread_token();
        let acquired = match self
            .owner
            .compare_exchange(0, token, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => true,
            Err(owner) if owner == token => false,
            Err(_) => return Err(GpuError::ContextBusy),
        };

        let previous = CURRENT.with(|current| current.replace(Some(self.id)));
        Ok(CurrentContext {
            context: self,
            previous,
            acquired,
        })
    }

    /// Release the device. Idempotent and safe before initialize().
    pub fn teardown(&mut self) {
        if self.state == ContextState::TornDown {
            return;
        }
        let was_ready = self.state == ContextState::Ready;
        self.state = ContextState::TornDown;

        if let Some(device) = self.device.take() {
            debug!(adapter = %device.info.adapter_name, "Releasing GPU device");
        }

        // A guard cannot outlive &self, so only an owner left behind by a leaked guard remains
        if self.owner.swap(0, Ordering::AcqRel) == thread_token() {
            CURRENT.with(|current| {
                if current.get() == Some(self.id) {
                    current.set(None);
                }
            });
        }

        info!(context = self.id.0, was_ready, "Pipeline context torn down");
    }
}

impl Drop for PipelineContext {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Guard returned by [`PipelineContext::make_current`]
#[derive(Debug)]
pub struct CurrentContext<'a> {
    context: &'a PipelineContext,
    previous: Option<ContextId>,
    acquired: bool,
}

impl CurrentContext<'_> {
    pub fn id(&self) -> ContextId {
        self.context.id
    }
}

impl Drop for CurrentContext<'_> {
    fn drop(&mut self) {
        CURRENT.with(|current| current.set(self.previous));
        if self.acquired {
            self.context.owner.store(0, Ordering::Release);
        }
    }
}
