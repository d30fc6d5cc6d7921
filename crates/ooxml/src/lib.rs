//! Slide text extraction for Office Open XML documents.
//!
//! Slide decks (.pptx) yield one text block per slide. Word documents (.docx)
//! yield one text block per heading-delimited section.

mod package;

pub mod docx;
pub mod pptx;

pub use docx::DocxParser;
pub use pptx::PptxParser;

use pitch_core::{DocumentFormat, Error, Result};
use std::io::Cursor;

/// Extract slide texts from an uploaded document.
///
/// Binary OLE containers (genuine `.ppt` / `.doc` files) are rejected; only
/// their Office Open XML successors can be read.
pub fn extract_slides(bytes: &[u8], format: DocumentFormat) -> Result<Vec<String>> {
    if DocumentFormat::is_legacy_container(bytes) {
        return Err(Error::UnsupportedFormat(format!(
            "{:?} file uses the legacy binary Office format; save it as .pptx or .docx",
            format
        )));
    }

    let reader = Cursor::new(bytes);
    let slides = if format.is_slide_deck() {
        PptxParser::new().parse(reader)?
    } else {
        DocxParser::new().parse(reader)?
    };

    log::debug!("Extracted {} slides from {:?} document", slides.len(), format);
    Ok(slides)
}
