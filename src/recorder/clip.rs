//! Finished recordings.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One encoded timeslice emitted by the recorder session.
#[derive(Debug, Clone)]
pub struct MediaChunk {
    pub data: Vec<u8>,
}

/// An immutable, fully-encoded recording.
///
/// Created atomically when a recording finalizes. The backing storage lives
/// until the clip is superseded by a newer recording or explicitly
/// discarded.
#[derive(Debug, Clone)]
pub struct Clip {
    id: Uuid,
    data: Arc<Vec<u8>>,
    mime_type: String,
    duration_seconds: f64,
    recorded_at: DateTime<Utc>,
}

impl Clip {
    /// Assemble all buffered slices into one clip.
    pub(crate) fn assemble(
        chunks: Vec<MediaChunk>,
        mime_type: String,
        duration_seconds: f64,
    ) -> Self {
        let mut data = Vec::with_capacity(chunks.iter().map(|c| c.data.len()).sum());
        for chunk in chunks {
            data.extend_from_slice(&chunk.data);
        }
        Self {
            id: Uuid::new_v4(),
            data: Arc::new(data),
            mime_type,
            duration_seconds,
            recorded_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The encoded media bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    /// Serializable metadata projection for the UI layer.
    pub fn info(&self) -> ClipInfo {
        ClipInfo {
            id: self.id,
            mime_type: self.mime_type.clone(),
            duration_seconds: self.duration_seconds,
            byte_len: self.data.len(),
            recorded_at: self.recorded_at,
        }
    }
}

/// Clip metadata without the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipInfo {
    pub id: Uuid,
    pub mime_type: String,
    pub duration_seconds: f64,
    pub byte_len: usize,
    pub recorded_at: DateTime<Utc>,
}
