//! audio - PCM endpoints for the codec and modem voice paths
//!
//! Uses ALSA for audio I/O. The bridging core reaches the hardware only
//! through the `PcmBackend` / `PcmStream` traits.

mod alsa_device;
mod device;
mod endpoint;
mod format;
pub mod sample_filter;

pub use alsa_device::AlsaBackend;
pub use device::{PcmBackend, PcmStream};
pub use endpoint::{EndpointId, EndpointRole, EndpointSet, Topology};
pub use format::{AudioFormat, SampleEncoding, StreamDirection};
