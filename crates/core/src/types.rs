//! Domain types for representing extracted presentation content.

use serde::Serialize;

/// Text substituted for a slide that carries no text at all.
pub const EMPTY_SLIDE_PLACEHOLDER: &str = "No text on this slide";

/// A stored presentation: the uploaded filename and its slide texts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Presentation {
    /// Opaque identifier assigned by the store.
    pub id: String,

    /// Original filename as uploaded.
    pub filename: String,

    /// Slide texts in presentation order.
    pub slides: Vec<String>,
}

impl Presentation {
    /// Number of slides.
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Slide text at `index`, if in range.
    pub fn slide(&self, index: usize) -> Option<&str> {
        self.slides.get(index).map(String::as_str)
    }
}

/// The format of an uploaded document, as declared by its filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Legacy PowerPoint suffix.
    Ppt,
    /// Modern PPTX (Office Open XML).
    Pptx,
    /// Legacy Word suffix.
    Doc,
    /// Modern DOCX (Office Open XML).
    Docx,
}

impl DocumentFormat {
    /// Detect format from a file extension (without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "ppt" => Some(Self::Ppt),
            "pptx" => Some(Self::Pptx),
            "doc" => Some(Self::Doc),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }

    /// Detect format from the suffix of an uploaded filename.
    pub fn from_filename(filename: &str) -> Option<Self> {
        filename
            .rsplit_once('.')
            .and_then(|(_, ext)| Self::from_extension(ext))
    }

    /// Whether this format is a slide deck (as opposed to a word-processor document).
    pub fn is_slide_deck(&self) -> bool {
        matches!(self, Self::Ppt | Self::Pptx)
    }

    /// Whether the bytes are an OLE/CFB compound file (D0 CF 11 E0 A1 B1 1A E1),
    /// the container used by binary `.ppt` and `.doc` files.
    pub fn is_legacy_container(bytes: &[u8]) -> bool {
        bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1])
    }
}
