//! Shared plumbing for OOXML packages: ZIP part access, relationship
//! resolution and element-path tracking for streaming XML.

use pitch_core::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Read, Seek};
use zip::result::ZipError;
use zip::ZipArchive;

/// An opened OOXML package (a ZIP archive of XML parts).
pub(crate) struct Package<R> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> Package<R> {
    /// Open a package from a reader.
    pub(crate) fn open(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;
        Ok(Self { archive })
    }

    /// Read a required part as text.
    pub(crate) fn read_part(&mut self, path: &str) -> Result<String> {
        self.read_optional_part(path)?.ok_or_else(|| {
            Error::ZipError(format!("File not found in archive '{}'", path))
        })
    }

    /// Read a part that may legitimately be absent.
    pub(crate) fn read_optional_part(&mut self, path: &str) -> Result<Option<String>> {
        let mut file = match self.archive.by_name(path) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => {
                return Err(Error::ZipError(format!(
                    "Failed to open '{}': {}",
                    path, e
                )))
            }
        };

        let mut content = String::new();
        file.read_to_string(&mut content)?;

        Ok(Some(content))
    }

    /// Relationship targets of `part_path`, keyed by relationship id and
    /// resolved to package paths.
    pub(crate) fn relationships(&mut self, part_path: &str) -> Result<HashMap<String, String>> {
        let (dir, file) = part_path.rsplit_once('/').unwrap_or(("", part_path));
        let rels_path = if dir.is_empty() {
            format!("_rels/{}.rels", file)
        } else {
            format!("{}/_rels/{}.rels", dir, file)
        };

        let Some(content) = self.read_optional_part(&rels_path)? else {
            return Ok(HashMap::new());
        };

        let mut targets = HashMap::new();
        let mut reader = Reader::from_str(&content);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if local_name(e.name().as_ref()) == b"Relationship" =>
                {
                    let mut id = None;
                    let mut target = None;
                    let mut external = false;

                    for attr in e.attributes().flatten() {
                        let value = attr
                            .unescape_value()
                            .map_err(|e| Error::XmlError(format!("{}: {}", rels_path, e)))?
                            .into_owned();
                        match attr.key.as_ref() {
                            b"Id" => id = Some(value),
                            b"Target" => target = Some(value),
                            b"TargetMode" => external = value == "External",
                            _ => {}
                        }
                    }

                    if let (Some(id), Some(target), false) = (id, target, external) {
                        targets.insert(id, resolve_target(dir, &target));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error parsing relationships in '{}': {}",
                        rels_path, e
                    )));
                }
                _ => {}
            }
        }

        Ok(targets)
    }
}

/// Resolve a relationship target against the directory of its source part.
pub(crate) fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Extract the local name from a potentially namespaced XML element name.
pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Value of the attribute whose local name is `name`, optionally requiring a
/// namespace prefix (to tell `r:id` apart from a plain `id`).
pub(crate) fn attribute(
    element: &BytesStart<'_>,
    name: &[u8],
    prefixed: bool,
) -> Result<Option<String>> {
    for attr in element.attributes().flatten() {
        if attr.key.local_name().as_ref() != name || attr.key.prefix().is_some() != prefixed {
            continue;
        }
        let value = attr
            .unescape_value()
            .map_err(|e| Error::XmlError(e.to_string()))?;
        return Ok(Some(value.into_owned()));
    }
    Ok(None)
}

/// Stack of local element names from the document root to the current element.
#[derive(Debug, Default)]
pub(crate) struct ElementPath {
    names: Vec<Vec<u8>>,
}

impl ElementPath {
    pub(crate) fn push(&mut self, qname: &[u8]) {
        self.names.push(local_name(qname).to_vec());
    }

    pub(crate) fn pop(&mut self) {
        self.names.pop();
    }

    /// Whether the path is exactly `expected`.
    pub(crate) fn is(&self, expected: &[&[u8]]) -> bool {
        self.names.len() == expected.len()
            && self
                .names
                .iter()
                .zip(expected)
                .all(|(have, want)| have.as_slice() == *want)
    }

    /// Whether the path is `prefix` followed exactly by `rest`.
    pub(crate) fn below_is(&self, prefix: &[&[u8]], rest: &[&[u8]]) -> bool {
        self.names.len() == prefix.len() + rest.len()
            && self
                .names
                .iter()
                .zip(prefix.iter().chain(rest))
                .all(|(have, want)| have.as_slice() == *want)
    }
}
