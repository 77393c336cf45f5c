//! Handing an encoded mixdown to the outside world.
//!
//! The engine never touches the filesystem or the network. It produces an
//! [`EncodedBlob`] and passes it to a [`BlobSink`] (download) or an
//! [`Uploader`] (upload) supplied by the host.

use crate::error::Result;

pub const WAV_MIME: &str = "audio/wav";

/// Encoded audio ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBlob {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    /// Name offered to the download collaborator when none is given.
    pub file_name: String,
}

impl EncodedBlob {
    pub fn wav(bytes: Vec<u8>, file_name: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: WAV_MIME,
            file_name: file_name.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Save through `sink`, under `file_name` or the suggested name.
    pub fn save(&self, sink: &mut dyn BlobSink, file_name: Option<&str>) -> Result<()> {
        let name = file_name.unwrap_or(&self.file_name);
        sink.save(name, &self.bytes)
    }

    /// Upload as the `audio` part of a multipart request.
    pub fn upload(&self, uploader: &mut dyn Uploader, meta: UploadMeta) -> Result<()> {
        uploader.upload(UploadPart {
            field: "audio",
            file_name: &self.file_name,
            content_type: self.mime,
            bytes: &self.bytes,
            meta,
        })
    }
}

/// "Save bytes as file", provided by the host.
pub trait BlobSink {
    fn save(&mut self, file_name: &str, bytes: &[u8]) -> Result<()>;
}

/// Descriptive fields sent next to the file part.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadMeta {
    pub title: String,
    pub take_number: Option<u32>,
    pub duration_seconds: f64,
    pub notes: Option<String>,
}

/// One file part as the uploader should post it.
#[derive(Debug)]
pub struct UploadPart<'a> {
    pub field: &'static str,
    pub file_name: &'a str,
    pub content_type: &'static str,
    pub bytes: &'a [u8],
    pub meta: UploadMeta,
}

/// Posts an upload part somewhere, provided by the host.
pub trait Uploader {
    fn upload(&mut self, part: UploadPart<'_>) -> Result<()>;
}
