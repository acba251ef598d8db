//! Image files picked for upload.

use std::path::Path;

use mime_sniffer::MimeTypeSniffer;

use crate::PublishResult;

/// A file payload waiting to be uploaded.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Reads a file from disk, guessing its MIME type from the extension
    /// or, failing that, the leading bytes.
    pub async fn read(path: impl AsRef<Path>) -> PublishResult<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();
        let mime = detect_mime(path, &bytes);
        Ok(Self::new(name, mime, bytes))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Payloads can be megabytes; keep them out of debug logs.
impl std::fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFile")
            .field("name", &self.name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// MIME type for a file: by extension, then by content sniffing.
pub fn detect_mime(path: &Path, bytes: &[u8]) -> String {
    if let Some(mime) = mime_guess::from_path(path).first() {
        return mime.essence_str().to_string();
    }
    match bytes.sniff_mime_type() {
        Some(mime) => {
            tracing::debug!(path = %path.display(), mime, "MIME type sniffed from content");
            mime.to_string()
        }
        None => "application/octet-stream".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_mime_by_extension() {
        assert_eq!(detect_mime(Path::new("a/photo.JPG"), &[]), "image/jpeg");
        assert_eq!(detect_mime(Path::new("diagram.svg"), &[]), "image/svg+xml");
        assert_eq!(detect_mime(Path::new("scan.tiff"), &[]), "image/tiff");
        assert_eq!(detect_mime(Path::new("favicon.ico"), &[]), "image/x-icon");
        assert_eq!(detect_mime(Path::new("notes.txt"), &[]), "text/plain");
    }

    #[test]
    fn test_mime_sniffed_without_extension() {
        assert_eq!(detect_mime(Path::new("upload"), &PNG_SIGNATURE), "image/png");
        assert_eq!(detect_mime(Path::new("noext"), &[]), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cover.png");
        std::fs::write(&path, PNG_SIGNATURE).unwrap();

        let file = ImageFile::read(&path).await.unwrap();
        assert_eq!(file.name, "cover.png");
        assert_eq!(file.mime, "image/png");
        assert_eq!(file.len(), 8);
    }
}
