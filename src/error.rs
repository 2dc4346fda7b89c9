use thiserror::Error;

/// Fatal failures while building the simulation/render pipeline.
///
/// None of these are retried: they describe a missing capability or resource,
/// and the host is expected to report them once and stop.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("no suitable GPU adapter found: {0}")]
    AdapterUnavailable(#[from] wgpu::RequestAdapterError),

    #[error("failed to request device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    #[error("failed to create surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),

    #[error("{format:?} textures are not supported for {missing} on this adapter")]
    UnsupportedCapability {
        format: wgpu::TextureFormat,
        missing: &'static str,
    },

    #[error("adapter does not support {0}")]
    MissingDownlevelCapability(&'static str),

    #[error("GPU resource allocation failed: {0}")]
    ResourceExhausted(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
