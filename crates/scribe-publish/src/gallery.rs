//! The post's image gallery and its upload state machine.
//!
//! ## Learning: Explicit State Machines
//!
//! Uploads move through a small set of states:
//!
//! ```text
//! Idle ──▶ Uploading(i) ──▶ Done
//!               │
//!               ▼
//!           Failed(i) ──retry_failed──▶ Uploading(i)
//! ```
//!
//! Keeping the state as an enum (rather than a pile of booleans) makes the
//! one rule that matters easy to enforce: while `Failed`, nothing uploads
//! until the host explicitly asks for a retry.
//!
//! Uploads run strictly one at a time in gallery order, so the final URL
//! list always matches the order the user picked the files in.

use std::future::Future;

use tokio::sync::mpsc;

use scribe_core::config::UploadConfig;

use crate::file::ImageFile;
use crate::{PublishError, PublishResult};

/// Uploads one file and returns its remote URL.
pub trait ImageUploader {
    fn upload(&self, file: &ImageFile) -> impl Future<Output = PublishResult<String>> + Send;
}

/// One image in the gallery.
#[derive(Debug, Clone)]
pub struct ImageEntry {
    /// Local file name while pending, remote URL once uploaded.
    source_url: String,
    uploaded: bool,
    /// Dropped once the upload succeeds.
    file: Option<ImageFile>,
}

impl ImageEntry {
    fn pending(file: ImageFile) -> Self {
        Self {
            source_url: file.name.clone(),
            uploaded: false,
            file: Some(file),
        }
    }

    fn remote(url: String) -> Self {
        Self {
            source_url: url,
            uploaded: true,
            file: None,
        }
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn is_uploaded(&self) -> bool {
        self.uploaded
    }

    pub fn file(&self) -> Option<&ImageFile> {
        self.file.as_ref()
    }
}

/// Where the gallery is in its upload cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadState {
    #[default]
    Idle,
    Uploading(usize),
    Done,
    Failed(usize),
}

/// Notifications sent to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GalleryEvent {
    Uploaded { index: usize, url: String },
    Failed { index: usize, message: String },
    /// Every entry is uploaded.
    Completed { urls: Vec<String>, preview_index: usize },
}

/// An ordered list of images with a designated preview.
#[derive(Debug)]
pub struct ImageGallery {
    entries: Vec<ImageEntry>,
    preview_index: Option<usize>,
    state: UploadState,
    accepted_mime_prefix: String,
    max_file_size: u64,
    events: mpsc::UnboundedSender<GalleryEvent>,
}

impl ImageGallery {
    /// Creates an empty gallery reporting to `events`.
    pub fn new(config: &UploadConfig, events: mpsc::UnboundedSender<GalleryEvent>) -> Self {
        Self {
            entries: Vec::new(),
            preview_index: None,
            state: UploadState::Idle,
            accepted_mime_prefix: config.accepted_mime_prefix.clone(),
            max_file_size: config.max_file_size_bytes(),
            events,
        }
    }

    /// Seeds the gallery with already-uploaded images (editing a stored post).
    pub fn load_urls(&mut self, urls: Vec<String>, preview: Option<&str>) {
        self.entries = urls.into_iter().map(ImageEntry::remote).collect();
        self.preview_index = match preview {
            Some(p) => self.entries.iter().position(|e| e.source_url == p),
            None => None,
        }
        .or(if self.entries.is_empty() { None } else { Some(0) });
        self.state = if self.entries.is_empty() {
            UploadState::Idle
        } else {
            UploadState::Done
        };
    }

    pub fn entries(&self) -> &[ImageEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    pub fn preview_index(&self) -> Option<usize> {
        self.preview_index
    }

    pub fn has_pending(&self) -> bool {
        self.entries.iter().any(|e| !e.uploaded)
    }

    /// True once every entry has a remote URL.
    pub fn is_complete(&self) -> bool {
        !self.has_pending()
    }

    /// Source URLs in gallery order.
    pub fn urls(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.source_url.clone()).collect()
    }

    /// The preview image's URL, defaulting to the first entry.
    pub fn preview_url(&self) -> Option<&str> {
        let index = self.preview_index.unwrap_or(0);
        self.entries.get(index).map(|e| e.source_url.as_str())
    }

    /// Appends a pending entry per acceptable file.
    ///
    /// Files with the wrong MIME type or over the size limit are dropped.
    /// Returns how many were accepted.
    pub fn add_files(&mut self, files: Vec<ImageFile>) -> usize {
        let before = self.entries.len();
        for file in files {
            if !file.mime.starts_with(&self.accepted_mime_prefix) {
                tracing::debug!(name = %file.name, mime = %file.mime, "skipping non-image file");
                continue;
            }
            if file.len() as u64 > self.max_file_size {
                tracing::debug!(name = %file.name, len = file.len(), "skipping oversized file");
                continue;
            }
            self.entries.push(ImageEntry::pending(file));
        }

        let added = self.entries.len() - before;
        if added > 0 {
            if self.preview_index.is_none() {
                self.preview_index = Some(0);
            }
            if self.state == UploadState::Done {
                self.state = UploadState::Idle;
            }
        }
        added
    }

    /// Chooses the preview image.
    pub fn set_preview(&mut self, index: usize) -> PublishResult<()> {
        self.check_index(index)?;
        self.preview_index = Some(index);
        Ok(())
    }

    /// Removes an entry.
    ///
    /// Removing at or before the preview resets the preview to the first
    /// image. If the removed entry was the last one holding the batch back
    /// (the failed entry, or the only pending one), the gallery completes.
    pub fn remove(&mut self, index: usize) -> PublishResult<ImageEntry> {
        self.check_index(index)?;
        let entry = self.entries.remove(index);

        if self.preview_index.is_some_and(|p| index <= p) {
            self.preview_index = if self.entries.is_empty() { None } else { Some(0) };
        }
        self.state = match self.state {
            UploadState::Failed(failed) if index < failed => UploadState::Failed(failed - 1),
            UploadState::Failed(failed) if index == failed => UploadState::Idle,
            _ if self.entries.is_empty() => UploadState::Idle,
            other => other,
        };
        if self.state == UploadState::Idle && !self.entries.is_empty() && !self.has_pending() {
            self.complete();
        }
        Ok(entry)
    }

    fn check_index(&self, index: usize) -> PublishResult<()> {
        if index >= self.entries.len() {
            return Err(PublishError::Validation(format!(
                "image index {index} out of range (gallery has {})",
                self.entries.len()
            )));
        }
        Ok(())
    }

    /// Uploads pending entries, unless a previous batch failed.
    ///
    /// Returns true if a batch ran to completion.
    pub async fn auto_upload_pending<U: ImageUploader>(&mut self, uploader: &U) -> PublishResult<bool> {
        if let UploadState::Failed(index) = self.state {
            tracing::debug!(index, "upload failed earlier; waiting for manual retry");
            return Ok(false);
        }
        if !self.has_pending() {
            return Ok(false);
        }
        self.run_uploads(uploader).await
    }

    /// Resumes a failed batch from the failed entry.
    ///
    /// Entries that already uploaded are not sent again.
    pub async fn retry_failed<U: ImageUploader>(&mut self, uploader: &U) -> PublishResult<bool> {
        let UploadState::Failed(index) = self.state else {
            return Ok(false);
        };
        tracing::info!(index, "retrying image upload");
        self.run_uploads(uploader).await
    }

    async fn run_uploads<U: ImageUploader>(&mut self, uploader: &U) -> PublishResult<bool> {
        for index in 0..self.entries.len() {
            let entry = &self.entries[index];
            if entry.uploaded {
                continue;
            }
            let Some(file) = entry.file.as_ref() else {
                continue;
            };

            self.state = UploadState::Uploading(index);
            tracing::info!(index, name = %file.name, "uploading image");

            match uploader.upload(file).await {
                Ok(url) => {
                    let entry = &mut self.entries[index];
                    entry.source_url = url.clone();
                    entry.uploaded = true;
                    entry.file = None;
                    self.notify(GalleryEvent::Uploaded { index, url });
                }
                Err(e) => {
                    tracing::warn!(index, "image upload failed: {}", e);
                    self.state = UploadState::Failed(index);
                    self.notify(GalleryEvent::Failed {
                        index,
                        message: e.to_string(),
                    });
                    return Err(e);
                }
            }
        }

        self.complete();
        Ok(true)
    }

    fn complete(&mut self) {
        self.state = UploadState::Done;
        tracing::info!(images = self.entries.len(), "gallery complete");
        self.notify(GalleryEvent::Completed {
            urls: self.urls(),
            preview_index: self.preview_index.unwrap_or(0),
        });
    }

    fn notify(&self, event: GalleryEvent) {
        // A closed channel means the host view is gone.
        let _ = self.events.send(event);
    }
}
