/// Failure to acquire the next swapchain image.
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    /// The swapchain no longer matches the window; reconfigure and retry.
    #[error("surface lost or outdated")]
    Reconfigure,
    #[error("timed out acquiring surface texture")]
    Timeout,
    #[error("out of GPU memory")]
    OutOfMemory,
    #[error("surface error: {0}")]
    Other(wgpu::SurfaceError),
}

impl From<wgpu::SurfaceError> for SurfaceError {
    fn from(err: wgpu::SurfaceError) -> Self {
        match err {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => SurfaceError::Reconfigure,
            wgpu::SurfaceError::Timeout => SurfaceError::Timeout,
            wgpu::SurfaceError::OutOfMemory => SurfaceError::OutOfMemory,
            other => SurfaceError::Other(other),
        }
    }
}
