// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the beauty pipeline

use crate::graph::PixelLayout;
use crate::media::Plane;
use std::fmt;

/// Result type alias using BeautyError
pub type BeautyResult<T> = Result<T, BeautyError>;
pub type ConvertResult<T> = Result<T, ConvertError>;
pub type GpuResult<T> = Result<T, GpuError>;
pub type GraphResult<T> = Result<T, GraphError>;
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Umbrella error for the crate
#[derive(Debug, Clone)]
pub enum BeautyError {
    /// Pixel layout conversion errors
    Convert(ConvertError),
    /// GPU context errors
    Gpu(GpuError),
    /// Filter graph errors
    Graph(GraphError),
    /// Pipeline construction errors
    Pipeline(PipelineError),
    /// Configuration errors
    Config(String),
    /// Filesystem or image codec errors
    Io(String),
}

/// Frame validation and color conversion errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// Width or height is zero or negative
    InvalidDimensions { width: i64, height: i64 },
    /// 4:2:0 subsampling needs even dimensions
    OddDimensions { width: u32, height: u32 },
    /// The track delivered no frame
    NullFrame,
    /// Frame rotation is not a multiple of 90 degrees
    InvalidRotation(i32),
    /// A plane pointer was null
    NullPlane(Plane),
    /// A plane stride is shorter than its row
    StrideTooSmall {
        plane: Plane,
        stride: usize,
        min: usize,
    },
    /// A plane holds fewer bytes than stride x rows
    PlaneTooSmall {
        plane: Plane,
        len: usize,
        required: usize,
    },
    /// Destination buffer has different dimensions than the source
    BufferMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

/// GPU context errors
#[derive(Debug, Clone)]
pub enum GpuError {
    /// No adapter matched the request
    AdapterUnavailable(String),
    /// The adapter refused to create a device
    DeviceCreation(String),
    /// initialize() called on a ready context
    AlreadyInitialized,
    /// Context used before initialize()
    NotInitialized,
    /// Context used after teardown()
    TornDown,
    /// Context is current on another thread
    ContextBusy,
    /// Buffer readback failed
    BufferMap(String),
}

/// Filter graph errors
#[derive(Debug, Clone)]
pub enum GraphError {
    /// Execute called after teardown
    TornDown,
    /// Buffer layout does not match the graph variant
    LayoutMismatch {
        expected: PixelLayout,
        actual: PixelLayout,
    },
    /// Landmark detector failed
    Detection(String),
    /// A detector produced a set that is neither empty nor complete
    InvalidLandmarks { count: usize },
    /// Conversion inside the graph failed
    Convert(ConvertError),
    /// GPU engine failure
    Gpu(GpuError),
}

/// Pipeline construction errors
#[derive(Debug, Clone)]
pub enum PipelineError {
    /// Track handle absent or without an id
    NullTrack,
    /// GPU context could not be created
    Context(GpuError),
    /// Filter graph could not be built
    Graph(GraphError),
    /// Invalid configuration
    Config(String),
}

impl fmt::Display for BeautyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BeautyError::Convert(e) => write!(f, "Conversion error: {}", e),
            BeautyError::Gpu(e) => write!(f, "GPU error: {}", e),
            BeautyError::Graph(e) => write!(f, "Graph error: {}", e),
            BeautyError::Pipeline(e) => write!(f, "Pipeline error: {}", e),
            BeautyError::Config(msg) => write!(f, "Configuration error: {}", msg),
            BeautyError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::InvalidDimensions { width, height } => {
                write!(f, "Invalid frame dimensions {}x{}", width, height)
            }
            ConvertError::OddDimensions { width, height } => {
                write!(f, "I420 needs even dimensions, got {}x{}", width, height)
            }
            ConvertError::NullFrame => write!(f, "Frame is null"),
            ConvertError::InvalidRotation(degrees) => {
                write!(f, "Rotation of {} degrees is not a multiple of 90", degrees)
            }
            ConvertError::NullPlane(plane) => write!(f, "{} plane pointer is null", plane),
            ConvertError::StrideTooSmall { plane, stride, min } => {
                write!(f, "{} stride {} is below row width {}", plane, stride, min)
            }
            ConvertError::PlaneTooSmall {
                plane,
                len,
                required,
            } => write!(f, "{} plane holds {} bytes, needs {}", plane, len, required),
            ConvertError::BufferMismatch { expected, actual } => write!(
                f,
                "Buffer is {}x{}, expected {}x{}",
                actual.0, actual.1, expected.0, expected.1
            ),
        }
    }
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::AdapterUnavailable(msg) => write!(f, "No GPU adapter: {}", msg),
            GpuError::DeviceCreation(msg) => write!(f, "Device creation failed: {}", msg),
            GpuError::AlreadyInitialized => write!(f, "Context already initialized"),
            GpuError::NotInitialized => write!(f, "Context not initialized"),
            GpuError::TornDown => write!(f, "Context was torn down"),
            GpuError::ContextBusy => write!(f, "Context is current on another thread"),
            GpuError::BufferMap(msg) => write!(f, "Buffer readback failed: {}", msg),
        }
    }
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::TornDown => write!(f, "Graph was torn down"),
            GraphError::LayoutMismatch { expected, actual } => {
                write!(f, "Graph expects {} buffers, got {}", expected, actual)
            }
            GraphError::Detection(msg) => write!(f, "Landmark detection failed: {}", msg),
            GraphError::InvalidLandmarks { count } => {
                write!(f, "Landmark set has {} points", count)
            }
            GraphError::Convert(e) => write!(f, "{}", e),
            GraphError::Gpu(e) => write!(f, "{}", e),
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::NullTrack => write!(f, "Track handle is null"),
            PipelineError::Context(e) => write!(f, "GPU context: {}", e),
            PipelineError::Graph(e) => write!(f, "Filter graph: {}", e),
            PipelineError::Config(msg) => write!(f, "Configuration: {}", msg),
        }
    }
}

impl std::error::Error for BeautyError {}
impl std::error::Error for ConvertError {}
impl std::error::Error for GpuError {}
impl std::error::Error for GraphError {}
impl std::error::Error for PipelineError {}

impl From<ConvertError> for BeautyError {
    fn from(err: ConvertError) -> Self {
        BeautyError::Convert(err)
    }
}

impl From<GpuError> for BeautyError {
    fn from(err: GpuError) -> Self {
        BeautyError::Gpu(err)
    }
}

impl From<GraphError> for BeautyError {
    fn from(err: GraphError) -> Self {
        BeautyError::Graph(err)
    }
}

impl From<PipelineError> for BeautyError {
    fn from(err: PipelineError) -> Self {
        BeautyError::Pipeline(err)
    }
}

impl From<std::io::Error> for BeautyError {
    fn from(err: std::io::Error) -> Self {
        BeautyError::Io(err.to_string())
    }
}

impl From<image::ImageError> for BeautyError {
    fn from(err: image::ImageError) -> Self {
        BeautyError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BeautyError {
    fn from(err: serde_json::Error) -> Self {
        BeautyError::Config(err.to_string())
    }
}

impl From<ConvertError> for GraphError {
    fn from(err: ConvertError) -> Self {
        GraphError::Convert(err)
    }
}

impl From<GpuError> for GraphError {
    fn from(err: GpuError) -> Self {
        GraphError::Gpu(err)
    }
}

impl From<GpuError> for PipelineError {
    fn from(err: GpuError) -> Self {
        PipelineError::Context(err)
    }
}

impl From<GraphError> for PipelineError {
    fn from(err: GraphError) -> Self {
        PipelineError::Graph(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_error_messages_name_the_plane() {
        let err = ConvertError::PlaneTooSmall {
            plane: Plane::U,
            len: 10,
            required: 32,
        };
        assert_eq!(err.to_string(), "U plane holds 10 bytes, needs 32");
    }

    #[test]
    fn nested_errors_convert_upwards() {
        let graph: GraphError = GpuError::ContextBusy.into();
        let pipeline: PipelineError = graph.into();
        let top: BeautyError = pipeline.into();
        assert!(matches!(
            top,
            BeautyError::Pipeline(PipelineError::Graph(GraphError::Gpu(GpuError::ContextBusy)))
        ));
    }
}
