pub mod device;
pub mod simulated;

pub use device::{CaptureDevice, CaptureStream, MediaBlob, MediaTrack, Recorder, RecorderHandle, TrackKind};
pub use simulated::SimulatedDevices;
