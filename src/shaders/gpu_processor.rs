// SPDX-License-Identifier: GPL-3.0-only

//! Shared GPU processor infrastructure
//!
//! - Buffer allocation with dimension caching
//! - Buffer readback (map, poll, read, unmap)
//! - Dispatch size and word-packing helpers

use crate::errors::{GpuError, GpuResult};
use crate::gpu::wgpu;

/// Cached resource dimensions - avoids reallocation when dimensions match
#[derive(Default, Clone, Copy, PartialEq, Debug)]
pub struct CachedDimensions {
    pub width: u32,
    pub height: u32,
}

impl CachedDimensions {
    /// Check if dimensions have changed and need update
    pub fn needs_update(&self, width: u32, height: u32) -> bool {
        self.width != width || self.height != height
    }

    pub fn update(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }
}

/// Map a MAP_READ buffer and hand its bytes to `read`.
///
/// Blocks in `device.poll` until the copy that fills the buffer has landed.
/// The mapped range is released and the buffer unmapped once `read` returns.
pub async fn read_buffer_async<R>(
    device: &wgpu::Device,
    buffer: &wgpu::Buffer,
    read: impl FnOnce(&[u8]) -> R,
) -> GpuResult<R> {
    let slice = buffer.slice(..);
    let (sender, receiver) = futures::channel::oneshot::channel();

    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });

    device
        .poll(wgpu::PollType::wait_indefinitely())
        .map_err(|e| GpuError::BufferMap(e.to_string()))?;

    receiver
        .await
        .map_err(|_| GpuError::BufferMap("mapping callback dropped".to_string()))?
        .map_err(|e| GpuError::BufferMap(e.to_string()))?;

    let result = {
        let mapped = slice.get_mapped_range();
        read(&mapped)
    };
    buffer.unmap();

    Ok(result)
}

/// Number of workgroups needed to cover `dimension`
#[inline]
pub fn compute_dispatch_size(dimension: u32, workgroup_size: u32) -> u32 {
    dimension.div_ceil(workgroup_size)
}

/// Number of u32 words holding `bytes` bytes
#[inline]
pub fn words_for_bytes(bytes: usize) -> usize {
    bytes.div_ceil(4)
}
