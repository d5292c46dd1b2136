//! Photo intake and platform media arbitration.
//!
//! The core never cares how a photo was produced (live camera, file picker):
//! it receives a [`PhotoBlob`] with an optional description. Platform capture
//! resources are arbitrated by a [`MediaGate`] that grants at most one of
//! them (camera or microphone) at a time.

use crate::error::{CaddieError, Result};
use crate::round::ImageAttachment;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Description used when the golfer sends a photo without one.
pub const DEFAULT_PHOTO_DESCRIPTION: &str = "Here's a photo of my situation.";

/// An image ready to be attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoBlob {
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub description: Option<String>,
}

impl PhotoBlob {
    /// Creates a blob from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPhoto` when the MIME type is not `image/*` or the
    /// payload is empty.
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let mime_type = mime_type.into();
        if !mime_type.starts_with("image/") {
            return Err(CaddieError::InvalidPhoto(format!(
                "unsupported MIME type '{mime_type}'"
            )));
        }
        if bytes.is_empty() {
            return Err(CaddieError::InvalidPhoto("empty image payload".into()));
        }

        Ok(Self {
            mime_type,
            bytes,
            description: None,
        })
    }

    /// Parses a `data:<mime>;base64,<payload>` URL.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| CaddieError::InvalidPhoto("not a data URL".into()))?;
        let (mime_type, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| CaddieError::InvalidPhoto("data URL is not base64 encoded".into()))?;

        let bytes = BASE64_STANDARD
            .decode(payload.trim())
            .map_err(|e| CaddieError::InvalidPhoto(format!("invalid base64 payload: {e}")))?;
        Self::new(mime_type, bytes)
    }

    /// Reads an image file, guessing its MIME type from the extension.
    pub fn from_file(path: &Path) -> Result<Self> {
        let mime_type = mime_guess::from_path(path)
            .first()
            .map(|mime| mime.essence_str().to_string())
            .ok_or_else(|| {
                CaddieError::InvalidPhoto(format!("cannot guess type of {}", path.display()))
            })?;
        let bytes = std::fs::read(path)?;
        Self::new(mime_type, bytes)
    }

    /// Sets the human-readable description sent alongside the image.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.description = (!description.trim().is_empty()).then_some(description);
        self
    }

    /// Text of the user turn that carries this photo.
    pub fn caption(&self) -> &str {
        self.description
            .as_deref()
            .unwrap_or(DEFAULT_PHOTO_DESCRIPTION)
    }

    /// Base64 form stored in messages and sent inline to the model.
    pub fn to_attachment(&self) -> ImageAttachment {
        ImageAttachment {
            mime_type: self.mime_type.clone(),
            data: BASE64_STANDARD.encode(&self.bytes),
        }
    }
}

/// A platform capture resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Camera,
    Microphone,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Camera => f.write_str("camera"),
            MediaKind::Microphone => f.write_str("microphone"),
        }
    }
}

/// Grants at most one platform media resource at a time.
#[derive(Clone, Default)]
pub struct MediaGate {
    held: Arc<Mutex<Option<MediaKind>>>,
}

impl MediaGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<MediaKind>> {
        self.held.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Acquires `kind`. The returned guard releases it on drop.
    ///
    /// # Errors
    ///
    /// Returns `MediaBusy` if any resource is already held.
    pub fn acquire(&self, kind: MediaKind) -> Result<MediaGuard> {
        let mut slot = self.slot();
        if let Some(current) = *slot {
            return Err(CaddieError::MediaBusy(current.to_string()));
        }
        *slot = Some(kind);
        Ok(MediaGuard {
            gate: self.clone(),
            kind,
        })
    }

    /// The resource currently held, if any.
    pub fn held(&self) -> Option<MediaKind> {
        *self.slot()
    }
}

/// Proof of holding a media resource.
pub struct MediaGuard {
    gate: MediaGate,
    kind: MediaKind,
}

impl MediaGuard {
    pub fn kind(&self) -> MediaKind {
        self.kind
    }
}

impl Drop for MediaGuard {
    fn drop(&mut self) {
        *self.gate.slot() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_data_url() {
        let photo = PhotoBlob::from_data_url("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(photo.mime_type, "image/png");
        assert_eq!(photo.bytes, b"hello");
        assert_eq!(photo.caption(), DEFAULT_PHOTO_DESCRIPTION);
        assert_eq!(photo.to_attachment().data, "aGVsbG8=");
    }

    #[test]
    fn test_rejects_bad_data_urls() {
        assert!(PhotoBlob::from_data_url("image/png;base64,aGVsbG8=").is_err());
        assert!(PhotoBlob::from_data_url("data:image/png,hello").is_err());
        assert!(PhotoBlob::from_data_url("data:text/plain;base64,aGVsbG8=").is_err());
        assert!(PhotoBlob::from_data_url("data:image/png;base64,!!!").is_err());
    }

    #[test]
    fn test_description() {
        let photo = PhotoBlob::new("image/jpeg", vec![1, 2, 3])
            .unwrap()
            .with_description("Ball is in the rough, 150 out");
        assert_eq!(photo.caption(), "Ball is in the rough, 150 out");

        let blank = PhotoBlob::new("image/jpeg", vec![1]).unwrap().with_description("  ");
        assert!(blank.description.is_none());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("lie.jpg");
        std::fs::File::create(&path).unwrap().write_all(&[0xff, 0xd8]).unwrap();

        let photo = PhotoBlob::from_file(&path).unwrap();
        assert_eq!(photo.mime_type, "image/jpeg");
        assert_eq!(photo.bytes, vec![0xff, 0xd8]);
    }

    #[test]
    fn test_gate_allows_one_resource() {
        let gate = MediaGate::new();
        let camera = gate.acquire(MediaKind::Camera).unwrap();
        assert_eq!(gate.held(), Some(MediaKind::Camera));

        let err = gate.acquire(MediaKind::Microphone).err().unwrap();
        assert!(matches!(err, CaddieError::MediaBusy(ref kind) if kind == "camera"));

        drop(camera);
        assert!(gate.held().is_none());
        let mic = gate.acquire(MediaKind::Microphone).unwrap();
        assert_eq!(mic.kind(), MediaKind::Microphone);
    }
}
