//! PPTX slide text extraction.
//!
//! Slides are read in `sldIdLst` order. Each slide's text is the text of its
//! top-level shapes, one shape per line, in document order.

use crate::package::{attribute, local_name, ElementPath, Package};
use pitch_core::{Error, Result, EMPTY_SLIDE_PLACEHOLDER};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Read, Seek};

const PRESENTATION_PART: &str = "ppt/presentation.xml";

const SLIDE_ID: &[&[u8]] = &[b"presentation", b"sldIdLst", b"sldId"];
const SHAPE_TREE: &[&[u8]] = &[b"sld", b"cSld", b"spTree"];
const TOP_LEVEL_SHAPE: &[&[u8]] = &[b"sld", b"cSld", b"spTree", b"sp"];

/// Parser for PPTX (Office Open XML) files.
pub struct PptxParser;

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a PPTX package into one text block per slide.
    pub fn parse<R: Read + Seek>(&self, reader: R) -> Result<Vec<String>> {
        let mut package = Package::open(reader)?;

        let slide_paths = self.get_slide_order(&mut package)?;
        log::debug!("PPTX declares {} slides", slide_paths.len());

        slide_paths
            .iter()
            .map(|path| {
                let xml = package.read_part(path)?;
                let shapes = self.extract_shape_texts(&xml).map_err(|e| {
                    Error::PptxParseError(format!("{}: {}", path, e))
                })?;
                Ok(compose_slide_text(&shapes))
            })
            .collect()
    }

    /// Slide part paths in presentation order.
    fn get_slide_order<R: Read + Seek>(&self, package: &mut Package<R>) -> Result<Vec<String>> {
        let content = package.read_part(PRESENTATION_PART)?;
        let targets = package.relationships(PRESENTATION_PART)?;

        let mut reader = Reader::from_str(&content);
        let mut path = ElementPath::default();
        let mut slides = Vec::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    path.push(e.name().as_ref());
                    if path.is(SLIDE_ID) {
                        slides.push(resolve_slide(e, &targets)?);
                    }
                }
                Ok(Event::Empty(ref e)) => {
                    path.push(e.name().as_ref());
                    if path.is(SLIDE_ID) {
                        slides.push(resolve_slide(e, &targets)?);
                    }
                    path.pop();
                }
                Ok(Event::End(_)) => path.pop(),
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error parsing {}: {}",
                        PRESENTATION_PART, e
                    )));
                }
                _ => {}
            }
        }

        Ok(slides)
    }

    /// Text of every top-level shape in a slide, paragraphs joined by newlines.
    ///
    /// Shapes nested in groups, pictures, connectors and graphic frames carry
    /// no text of their own here.
    fn extract_shape_texts(&self, xml_content: &str) -> Result<Vec<String>> {
        let mut reader = Reader::from_str(xml_content);
        let mut path = ElementPath::default();

        let mut shapes = Vec::new();
        let mut current: Option<Vec<String>> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    path.push(e.name().as_ref());
                    if path.is(TOP_LEVEL_SHAPE) {
                        current = Some(Vec::new());
                    } else if let Some(paragraphs) = current.as_mut() {
                        if path.below_is(TOP_LEVEL_SHAPE, &[b"txBody", b"p"]) {
                            paragraphs.push(String::new());
                        }
                    }
                }
                Ok(Event::Empty(ref e)) => {
                    let qname = e.name();
                    let name = local_name(qname.as_ref());
                    if let Some(paragraphs) = current.as_mut() {
                        if name == b"p" && path.below_is(TOP_LEVEL_SHAPE, &[b"txBody"]) {
                            paragraphs.push(String::new());
                        } else if name == b"br"
                            && path.below_is(TOP_LEVEL_SHAPE, &[b"txBody", b"p"])
                        {
                            if let Some(paragraph) = paragraphs.last_mut() {
                                paragraph.push('\n');
                            }
                        }
                    } else if name == b"sp" && path.is(SHAPE_TREE) {
                        shapes.push(String::new());
                    }
                }
                Ok(Event::Text(ref e)) => {
                    if let Some(paragraphs) = current.as_mut() {
                        let in_run = path.below_is(TOP_LEVEL_SHAPE, &[b"txBody", b"p", b"r", b"t"])
                            || path.below_is(TOP_LEVEL_SHAPE, &[b"txBody", b"p", b"fld", b"t"]);
                        if in_run {
                            let text = e
                                .unescape()
                                .map_err(|e| Error::XmlError(e.to_string()))?;
                            if let Some(paragraph) = paragraphs.last_mut() {
                                paragraph.push_str(&text);
                            }
                        }
                    }
                }
                Ok(Event::End(_)) => {
                    if path.is(TOP_LEVEL_SHAPE) {
                        if let Some(paragraphs) = current.take() {
                            shapes.push(paragraphs.join("\n"));
                        }
                    }
                    path.pop();
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::XmlError(e.to_string())),
                _ => {}
            }
        }

        Ok(shapes)
    }
}

/// Package path of the slide referenced by a `sldId` element.
fn resolve_slide(element: &BytesStart<'_>, targets: &HashMap<String, String>) -> Result<String> {
    let rel_id = attribute(element, b"id", true)?
        .ok_or_else(|| Error::PptxParseError("sldId without relationship id".to_string()))?;
    targets.get(&rel_id).cloned().ok_or_else(|| {
        Error::PptxParseError(format!("slide relationship '{}' not found", rel_id))
    })
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Each shape's text followed by a newline, trimmed as a whole; a slide
/// without any text gets the placeholder.
fn compose_slide_text(shapes: &[String]) -> String {
    let mut text = String::new();
    for shape in shapes {
        text.push_str(shape);
        text.push('\n');
    }

    let trimmed = text.trim();
    if trimmed.is_empty() {
        EMPTY_SLIDE_PLACEHOLDER.to_string()
    } else {
        trimmed.to_string()
    }
}
