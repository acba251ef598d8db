//! # Scribe HTML
//!
//! Converts between a [`scribe_doc::DocumentTree`] and the HTML string stored as a
//! post's `content`.
//!
//! ## Learning: Round-Trip Stability
//!
//! The codec is built so that, for every tree the editor can produce,
//!
//! ```text
//! deserialize(serialize(tree)) ≅ tree      (same outline)
//! ```
//!
//! Two things make that hold:
//! - both directions end in normal form (merged neighbouring runs), so
//!   different run splits of the same text compare equal;
//! - the serializer never emits markup the deserializer would read back
//!   differently (line breaks are `<br>`, styles use a fixed order).

mod css;
mod deserialize;
mod serialize;

pub use css::{is_plain_value, parse_px};
pub use deserialize::{deserialize, deserialize_into};
pub use serialize::serialize;

/// Summary of an HTML import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Number of top-level blocks produced.
    pub blocks: usize,
    /// Tag names that were dropped or imported as plain text.
    pub degraded: Vec<String>,
}

impl ImportReport {
    /// Returns true if every element was understood.
    pub fn is_lossless(&self) -> bool {
        self.degraded.is_empty()
    }
}

/// Normalizes HTML by parsing and re-serializing it.
pub fn normalize_html(html: &str) -> String {
    serialize(&deserialize(html))
}
