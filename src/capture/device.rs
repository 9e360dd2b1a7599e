use anyhow::Result;
use uuid::Uuid;

/// Kind of media track carried by a capture stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    /// Microphone audio
    Audio,
    /// Camera video
    Video,
}

/// A single live media track within an open capture stream
#[derive(Debug, Clone)]
pub struct MediaTrack {
    /// Track kind (audio or video)
    pub kind: TrackKind,
    /// Human-readable device label (e.g. "FaceTime HD Camera")
    pub label: String,
}

/// An open camera+microphone stream handle
///
/// Owned exclusively by the session controller for the duration of a session.
/// The controller never hands this out; all lifecycle mutation goes through
/// controller commands.
#[derive(Debug)]
pub struct CaptureStream {
    /// Unique stream identifier
    pub id: Uuid,
    /// Live microphone track
    pub audio_track: MediaTrack,
    /// Live camera track
    pub video_track: MediaTrack,
}

/// Opaque finalized media payload produced by a recorder
///
/// The core never inspects the bytes; blobs flow straight through to the
/// evaluation service.
#[derive(Debug, Clone)]
pub struct MediaBlob {
    /// Encoded media bytes
    pub data: Vec<u8>,
    /// MIME type (e.g. "audio/webm")
    pub mime_type: String,
}

impl MediaBlob {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Handle to an in-flight recording segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecorderHandle(pub u64);

/// Camera/microphone provider
///
/// Platform implementations live outside this crate (browser getUserMedia,
/// native capture stacks). `release` must fully stop every track so the
/// camera/microphone indicator goes dark.
#[async_trait::async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Open the camera and microphone, returning a stream with both tracks live
    async fn acquire(&self) -> Result<CaptureStream>;

    /// Stop all tracks and close the stream
    async fn release(&self, stream: CaptureStream) -> Result<()>;
}

/// Segment recorder bound to an open capture stream
///
/// Exactly one handle may be active per stream at a time; `stop` delivers the
/// finalized blob only after internal buffers have flushed.
#[async_trait::async_trait]
pub trait Recorder: Send + Sync {
    /// Begin recording a new segment from the stream
    async fn start(&self, stream: &CaptureStream) -> Result<RecorderHandle>;

    /// Stop the segment and flush it into a finalized blob
    async fn stop(&self, handle: RecorderHandle) -> Result<MediaBlob>;
}
