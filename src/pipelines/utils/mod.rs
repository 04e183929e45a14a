use candle_core::Device;
use tracing::debug;

/// Loads a device to be used for the model.
/// If `index` is `Some(i)` it will attempt to load the specified CUDA device.
/// When `None` it defaults to CUDA device 0 if available and otherwise falls back
/// to CPU.
pub fn load_device_with(index: Option<usize>) -> anyhow::Result<Device> {
    match index {
        Some(i) => Ok(Device::new_cuda(i)?),
        None => match Device::new_cuda(0) {
            Ok(cuda_device) => Ok(cuda_device),
            Err(e) => {
                debug!(error = %e, "CUDA unavailable, using CPU");
                Ok(Device::Cpu)
            }
        },
    }
}

/// Request for a specific device, used by pipeline builders.
#[derive(Debug, Clone, Default)]
pub enum DeviceRequest {
    /// Use CUDA if available, otherwise CPU (default behavior).
    #[default]
    Default,
    /// Force CPU even if CUDA is available.
    Cpu,
    /// Select a specific CUDA device by index.
    Cuda(usize),
}

impl DeviceRequest {
    /// Resolve the request into an actual [`Device`].
    pub fn resolve(self) -> anyhow::Result<Device> {
        match self {
            DeviceRequest::Default => load_device_with(None),
            DeviceRequest::Cpu => Ok(Device::Cpu),
            DeviceRequest::Cuda(i) => load_device_with(Some(i)),
        }
    }
}

/// Trait providing convenience methods for pipeline builders to select a device.
pub trait DeviceSelectable: Sized {
    /// Returns a mutable reference to the builder's internal [`DeviceRequest`].
    fn device_request_mut(&mut self) -> &mut DeviceRequest;

    /// Force the pipeline to run on CPU.
    fn cpu(mut self) -> Self {
        *self.device_request_mut() = DeviceRequest::Cpu;
        self
    }

    /// Select a specific CUDA device by index.
    fn cuda_device(mut self, index: usize) -> Self {
        *self.device_request_mut() = DeviceRequest::Cuda(index);
        self
    }
}
