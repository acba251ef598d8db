//! Post metadata and the submission payload.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::gallery::ImageGallery;
use crate::{PublishError, PublishResult};

/// Publication status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

impl std::str::FromStr for PostStatus {
    type Err = PublishError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(PostStatus::Draft),
            "published" | "publish" => Ok(PostStatus::Published),
            other => Err(PublishError::Validation(format!("unknown status '{other}'"))),
        }
    }
}

/// A post being written: everything except the gallery, which uploads on
/// its own schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostDraft {
    pub title: String,
    pub content_html: String,
    pub category: String,
    pub tags: BTreeSet<String>,
    pub status: PostStatus,
}

/// Request body for `POST /blogs` and `PUT /blogs/:id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPayload {
    pub title: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
    pub status: PostStatus,
    pub preview_image: Option<String>,
    pub image_gallery: Vec<String>,
}

impl PostDraft {
    pub fn new(title: impl Into<String>, content_html: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content_html: content_html.into(),
            ..Self::default()
        }
    }

    /// Adds a tag; blank tags and duplicates are ignored.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        !tag.is_empty() && self.tags.insert(tag.to_string())
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        self.tags.remove(tag.trim())
    }

    /// Checks the draft is ready to submit with `gallery`.
    pub fn validate(&self, gallery: &ImageGallery) -> PublishResult<()> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if is_blank_html(&self.content_html) {
            missing.push("content");
        }
        if self.category.trim().is_empty() {
            missing.push("category");
        }
        if !missing.is_empty() {
            return Err(PublishError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }
        if !gallery.is_complete() {
            return Err(PublishError::Validation(
                "images are still uploading".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds the request body.
    pub fn to_payload(&self, gallery: &ImageGallery) -> PublishResult<PostPayload> {
        self.validate(gallery)?;
        Ok(PostPayload {
            title: self.title.trim().to_string(),
            content: self.content_html.clone(),
            category: self.category.trim().to_string(),
            tags: self.tags.iter().cloned().collect(),
            status: self.status,
            preview_image: gallery.preview_url().map(str::to_string),
            image_gallery: gallery.urls(),
        })
    }
}

/// True if the HTML holds no visible text (e.g. `<p></p>` or `<p><br></p>`).
fn is_blank_html(html: &str) -> bool {
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag && !c.is_whitespace() => return false,
            _ => {}
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::ImageFile;
    use scribe_core::config::UploadConfig;
    use tokio::sync::mpsc;

    fn empty_gallery() -> ImageGallery {
        let (tx, _rx) = mpsc::unbounded_channel();
        ImageGallery::new(&UploadConfig::default(), tx)
    }

    fn ready_draft() -> PostDraft {
        let mut draft = PostDraft::new(" Hello ", "<p>Body</p>");
        draft.category = "rust".to_string();
        draft.add_tag("editor");
        draft.add_tag("editor");
        draft.add_tag("  ");
        draft
    }

    #[test]
    fn test_missing_fields_listed() {
        let draft = PostDraft::new("", "<p><br></p>");
        let err = draft.validate(&empty_gallery()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: missing required fields: title, content, category"
        );
    }

    #[test]
    fn test_pending_images_block_submit() {
        let mut gallery = empty_gallery();
        gallery.add_files(vec![ImageFile::new("a.png", "image/png", vec![1])]);
        assert!(matches!(
            ready_draft().validate(&gallery),
            Err(PublishError::Validation(_))
        ));
    }

    #[test]
    fn test_payload_json_shape() {
        let mut gallery = empty_gallery();
        gallery.load_urls(vec!["https://cdn.test/a.png".to_string()], None);
        let payload = ready_draft().to_payload(&gallery).unwrap();
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["title"], "Hello");
        assert_eq!(json["tags"], serde_json::json!(["editor"]));
        assert_eq!(json["status"], "draft");
        assert_eq!(json["previewImage"], "https://cdn.test/a.png");
        assert_eq!(json["imageGallery"], serde_json::json!(["https://cdn.test/a.png"]));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Published".parse::<PostStatus>().unwrap(), PostStatus::Published);
        assert!("archived".parse::<PostStatus>().is_err());
    }
}
