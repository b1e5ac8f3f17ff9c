// SPDX-License-Identifier: GPL-3.0-only
//! Compute shaders and their GPU drivers
//!
//! - `beauty.wgsl`: the four beauty stages, one entry point each
//! - `yuv_convert.wgsl`: I420 <-> RGBA on packed plane buffers
//!
//! [`GpuBeautyChain`] owns the pipelines and per-size buffers. The CPU
//! kernels in `crate::stages` implement the same math.

mod beauty_chain;
pub mod gpu_processor;
pub mod uniforms;

pub use beauty_chain::GpuBeautyChain;
pub use gpu_processor::{CachedDimensions, compute_dispatch_size, read_buffer_async};
pub use uniforms::{BeautyUniforms, PlaneUniforms};

/// Beauty stage entry points (WGSL)
pub const BEAUTY_SHADER: &str = include_str!("beauty.wgsl");
/// Planar conversion entry points (WGSL)
pub const CONVERT_SHADER: &str = include_str!("yuv_convert.wgsl");

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(source: &str) -> naga::Module {
        let module = naga::front::wgsl::parse_str(source).unwrap_or_else(|e| {
            panic!("WGSL parse error:\n{}", e.emit_to_string(source));
        });
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .unwrap_or_else(|e| panic!("WGSL validation error: {:?}", e));
        module
    }

    fn entry_points(module: &naga::Module) -> Vec<&str> {
        module
            .entry_points
            .iter()
            .map(|ep| ep.name.as_str())
            .collect()
    }

    #[test]
    fn beauty_shader_is_valid() {
        let module = validate(BEAUTY_SHADER);
        assert_eq!(
            entry_points(&module),
            vec!["reshape_main", "skin_main", "lipstick_main", "blusher_main"]
        );
    }

    #[test]
    fn convert_shader_is_valid() {
        let module = validate(CONVERT_SHADER);
        assert_eq!(
            entry_points(&module),
            vec!["i420_to_rgba_main", "rgba_to_luma_main", "rgba_to_chroma_main"]
        );
    }

    #[test]
    fn beauty_uniform_block_matches_rust_size() {
        let module = validate(BEAUTY_SHADER);
        let ty = module
            .types
            .iter()
            .find(|(_, ty)| ty.name.as_deref() == Some("BeautyUniforms"))
            .map(|(handle, _)| handle)
            .unwrap();
        let mut layouter = naga::proc::Layouter::default();
        layouter.update(module.to_ctx()).unwrap();
        assert_eq!(
            layouter[ty].size as usize,
            std::mem::size_of::<BeautyUniforms>()
        );
    }
}
