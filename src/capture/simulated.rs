use anyhow::{bail, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use super::device::{CaptureDevice, CaptureStream, MediaBlob, MediaTrack, Recorder, RecorderHandle, TrackKind};

/// In-memory capture provider and recorder for demos and batch testing
///
/// Produces small opaque webm-tagged blobs instead of real media. Enforces the
/// single-open-stream contract so misuse shows up in development rather than
/// as a stuck camera indicator in production.
#[derive(Clone, Default)]
pub struct SimulatedDevices {
    inner: Arc<SimulatedInner>,
}

#[derive(Default)]
struct SimulatedInner {
    stream_open: AtomicBool,
    next_handle: AtomicU64,
    segments: Mutex<HashMap<RecorderHandle, SegmentState>>,
}

struct SegmentState {
    stream_id: Uuid,
    started_at: chrono::DateTime<chrono::Utc>,
}

impl SimulatedDevices {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CaptureDevice for SimulatedDevices {
    async fn acquire(&self) -> Result<CaptureStream> {
        if self.inner.stream_open.swap(true, Ordering::SeqCst) {
            bail!("capture stream already open");
        }

        let stream = CaptureStream {
            id: Uuid::new_v4(),
            audio_track: MediaTrack {
                kind: TrackKind::Audio,
                label: "Simulated Microphone".to_string(),
            },
            video_track: MediaTrack {
                kind: TrackKind::Video,
                label: "Simulated Camera".to_string(),
            },
        };

        info!("Simulated capture stream opened: {}", stream.id);
        Ok(stream)
    }

    async fn release(&self, stream: CaptureStream) -> Result<()> {
        self.inner.stream_open.store(false, Ordering::SeqCst);
        info!("Simulated capture stream released: {}", stream.id);
        Ok(())
    }
}

#[async_trait::async_trait]
impl Recorder for SimulatedDevices {
    async fn start(&self, stream: &CaptureStream) -> Result<RecorderHandle> {
        let mut segments = self.inner.segments.lock().await;

        // One active recorder per stream
        if segments.values().any(|s| s.stream_id == stream.id) {
            bail!("recorder already active for stream {}", stream.id);
        }

        let handle = RecorderHandle(self.inner.next_handle.fetch_add(1, Ordering::SeqCst));
        segments.insert(
            handle,
            SegmentState {
                stream_id: stream.id,
                started_at: Utc::now(),
            },
        );

        debug!("Simulated segment {} started", handle.0);
        Ok(handle)
    }

    async fn stop(&self, handle: RecorderHandle) -> Result<MediaBlob> {
        let mut segments = self.inner.segments.lock().await;

        let Some(segment) = segments.remove(&handle) else {
            bail!("unknown recorder handle {}", handle.0);
        };

        let duration_ms = Utc::now()
            .signed_duration_since(segment.started_at)
            .num_milliseconds()
            .max(0);

        // Placeholder payload: stream id plus segment duration
        let data = format!("webm:{}:{}ms", segment.stream_id, duration_ms).into_bytes();

        debug!("Simulated segment {} flushed ({} bytes)", handle.0, data.len());
        Ok(MediaBlob {
            data,
            mime_type: "audio/webm".to_string(),
        })
    }
}
