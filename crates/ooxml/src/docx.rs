//! DOCX section extraction.
//!
//! Body paragraphs are grouped into slides at heading paragraphs. A document
//! without headings becomes a single slide.

use crate::package::{attribute, local_name, ElementPath, Package};
use pitch_core::{Error, Result, EMPTY_SLIDE_PLACEHOLDER};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Read, Seek};

const DOCUMENT_PART: &str = "word/document.xml";
const STYLES_PART: &str = "word/styles.xml";

const BODY_PARAGRAPH: &[&[u8]] = &[b"document", b"body", b"p"];
const STYLE: &[&[u8]] = &[b"styles", b"style"];

/// A body paragraph: its text and whether it is styled as a heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub text: String,
    pub is_heading: bool,
}

/// Parser for DOCX (Office Open XML) files.
pub struct DocxParser;

impl DocxParser {
    /// Create a new DOCX parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a DOCX package into heading-delimited slides.
    pub fn parse<R: Read + Seek>(&self, reader: R) -> Result<Vec<String>> {
        let paragraphs = self.paragraphs(reader)?;
        log::debug!(
            "DOCX has {} paragraphs, {} headings",
            paragraphs.len(),
            paragraphs.iter().filter(|p| p.is_heading).count()
        );
        Ok(split_sections(&paragraphs))
    }

    /// Body-level paragraphs in document order. Tables and text boxes are not
    /// descended into.
    pub fn paragraphs<R: Read + Seek>(&self, reader: R) -> Result<Vec<Paragraph>> {
        let mut package = Package::open(reader)?;

        let styles = match package.read_optional_part(STYLES_PART)? {
            Some(xml) => StyleTable::parse(&xml)?,
            None => StyleTable::default(),
        };
        let document = package.read_part(DOCUMENT_PART)?;

        let mut reader = Reader::from_str(&document);
        let mut path = ElementPath::default();
        let mut paragraphs = Vec::new();
        let mut text = String::new();
        let mut style_id: Option<String> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    path.push(e.name().as_ref());
                    if path.is(BODY_PARAGRAPH) {
                        text.clear();
                        style_id = None;
                    } else if path.below_is(BODY_PARAGRAPH, &[b"pPr", b"pStyle"]) {
                        style_id = attribute(e, b"val", true)?;
                    }
                }
                Ok(Event::Empty(ref e)) => {
                    let qname = e.name();
                    let name = local_name(qname.as_ref());
                    if name == b"p" && path.is(&BODY_PARAGRAPH[..2]) {
                        paragraphs.push(Paragraph {
                            text: String::new(),
                            is_heading: styles.is_heading(None),
                        });
                    } else if name == b"pStyle" && path.below_is(BODY_PARAGRAPH, &[b"pPr"]) {
                        style_id = attribute(e, b"val", true)?;
                    } else if in_run(&path) {
                        match name {
                            b"tab" => text.push('\t'),
                            b"br" | b"cr" => text.push('\n'),
                            _ => {}
                        }
                    }
                }
                Ok(Event::Text(ref e)) => {
                    if in_run_text(&path) {
                        let unescaped = e
                            .unescape()
                            .map_err(|e| Error::DocxParseError(e.to_string()))?;
                        text.push_str(&unescaped);
                    }
                }
                Ok(Event::End(_)) => {
                    if path.is(BODY_PARAGRAPH) {
                        paragraphs.push(Paragraph {
                            text: std::mem::take(&mut text),
                            is_heading: styles.is_heading(style_id.as_deref()),
                        });
                    }
                    path.pop();
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error parsing {}: {}",
                        DOCUMENT_PART, e
                    )));
                }
                _ => {}
            }
        }

        Ok(paragraphs)
    }
}

impl Default for DocxParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether the path is a run of a body paragraph, directly or inside a hyperlink.
fn in_run(path: &ElementPath) -> bool {
    path.below_is(BODY_PARAGRAPH, &[b"r"]) || path.below_is(BODY_PARAGRAPH, &[b"hyperlink", b"r"])
}

/// Whether the path is the text element of such a run.
fn in_run_text(path: &ElementPath) -> bool {
    path.below_is(BODY_PARAGRAPH, &[b"r", b"t"])
        || path.below_is(BODY_PARAGRAPH, &[b"hyperlink", b"r", b"t"])
}

/// Group paragraphs into slides.
///
/// Every heading opens a slide that collects the paragraphs up to the next
/// heading. Text before the first heading is kept at the top of the first
/// slide, so the slide count equals the heading count. Without headings the
/// whole document is one slide.
pub fn split_sections(paragraphs: &[Paragraph]) -> Vec<String> {
    let mut preamble = String::new();
    let mut sections: Vec<String> = Vec::new();

    for paragraph in paragraphs {
        if paragraph.is_heading {
            sections.push(String::new());
        }
        let target = sections.last_mut().unwrap_or(&mut preamble);
        target.push_str(&paragraph.text);
        target.push('\n');
    }

    if sections.is_empty() {
        return vec![finish_slide(&preamble)];
    }

    if !preamble.trim().is_empty() {
        sections[0].insert_str(0, &preamble);
    }

    sections.iter().map(|section| finish_slide(section)).collect()
}

fn finish_slide(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        EMPTY_SLIDE_PLACEHOLDER.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Paragraph style names keyed by style id.
#[derive(Debug, Default)]
struct StyleTable {
    names: HashMap<String, String>,
    default_paragraph: Option<String>,
}

impl StyleTable {
    fn parse(xml: &str) -> Result<Self> {
        let mut table = StyleTable::default();
        let mut reader = Reader::from_str(xml);
        let mut path = ElementPath::default();

        // (style id, is default) of the paragraph style being read
        let mut current: Option<(String, bool)> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    path.push(e.name().as_ref());
                    if path.is(STYLE) {
                        current = paragraph_style(e)?;
                    }
                }
                Ok(Event::Empty(ref e)) => {
                    if path.is(STYLE) && local_name(e.name().as_ref()) == b"name" {
                        if let (Some((id, is_default)), Some(name)) =
                            (current.as_ref(), attribute(e, b"val", true)?)
                        {
                            if *is_default {
                                table.default_paragraph = Some(name.clone());
                            }
                            table.names.insert(id.clone(), name);
                        }
                    }
                }
                Ok(Event::End(_)) => {
                    if path.is(STYLE) {
                        current = None;
                    }
                    path.pop();
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error parsing {}: {}",
                        STYLES_PART, e
                    )));
                }
                _ => {}
            }
        }

        Ok(table)
    }

    /// Resolve a paragraph's style id to a style name. Unknown or missing ids
    /// fall back to the default paragraph style.
    fn style_name(&self, style_id: Option<&str>) -> &str {
        style_id
            .and_then(|id| self.names.get(id))
            .or(self.default_paragraph.as_ref())
            .map(String::as_str)
            .unwrap_or("Normal")
    }

    fn is_heading(&self, style_id: Option<&str>) -> bool {
        is_heading_style(self.style_name(style_id))
    }
}

/// Built-in heading styles are stored as `heading 1` .. `heading 9` and
/// shown as `Heading 1` .. `Heading 9`.
fn is_heading_style(name: &str) -> bool {
    name.starts_with("Heading") || name.starts_with("heading ")
}

/// `(style id, is default)` when the element declares a paragraph style.
fn paragraph_style(element: &BytesStart<'_>) -> Result<Option<(String, bool)>> {
    if attribute(element, b"type", true)?.as_deref() != Some("paragraph") {
        return Ok(None);
    }
    let Some(id) = attribute(element, b"styleId", true)? else {
        return Ok(None);
    };
    let is_default = matches!(
        attribute(element, b"default", true)?.as_deref(),
        Some("1") | Some("true") | Some("on")
    );
    Ok(Some((id, is_default)))
}
