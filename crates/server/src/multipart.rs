//! Minimal `multipart/form-data` decoding for file uploads.

use memchr::memmem;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static BOUNDARY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i);\s*boundary=(?:"([^"]+)"|([^;\s]+))"#).unwrap());

static NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i);\s*name=(?:"([^"]*)"|([^;\s]+))"#).unwrap());

static FILENAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i);\s*filename=(?:"([^"]*)"|([^;\s]+))"#).unwrap());

/// Ways a form upload can be unusable.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum MultipartError {
    #[error("expected a multipart/form-data request")]
    NotMultipart,

    #[error("multipart boundary missing from Content-Type")]
    MissingBoundary,

    #[error("malformed multipart body")]
    Malformed,

    #[error("form field '{0}' is required")]
    MissingField(String),
}

/// One part of a form body.
#[derive(Debug, PartialEq, Eq)]
pub struct Part<'a> {
    pub name: Option<String>,
    pub filename: Option<String>,
    pub data: &'a [u8],
}

/// The boundary declared by a `multipart/form-data` Content-Type.
pub fn boundary(content_type: &str) -> Result<String, MultipartError> {
    let mime = content_type.split(';').next().unwrap_or("").trim();
    if !mime.eq_ignore_ascii_case("multipart/form-data") {
        return Err(MultipartError::NotMultipart);
    }

    BOUNDARY_REGEX
        .captures(content_type)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .ok_or(MultipartError::MissingBoundary)
}

/// Split a form body into its parts.
pub fn parts<'a>(body: &'a [u8], boundary: &str) -> Result<Vec<Part<'a>>, MultipartError> {
    let delimiter = format!("--{}", boundary);
    let separator = format!("\r\n--{}", boundary);

    let mut offset = memmem::find(body, delimiter.as_bytes()).ok_or(MultipartError::Malformed)?
        + delimiter.len();
    let mut parts = Vec::new();

    loop {
        let rest = &body[offset..];
        if rest.starts_with(b"--") {
            break;
        }
        let rest = rest.strip_prefix(b"\r\n").ok_or(MultipartError::Malformed)?;
        let consumed = body.len() - rest.len();

        let (headers, content_start) = if rest.starts_with(b"\r\n") {
            ("", 2)
        } else {
            let end = memmem::find(rest, b"\r\n\r\n").ok_or(MultipartError::Malformed)?;
            let headers =
                std::str::from_utf8(&rest[..end]).map_err(|_| MultipartError::Malformed)?;
            (headers, end + 4)
        };

        let content_len = memmem::find(&rest[content_start..], separator.as_bytes())
            .ok_or(MultipartError::Malformed)?;
        let data = &rest[content_start..content_start + content_len];

        parts.push(Part::from_headers(headers, data));
        offset = consumed + content_start + content_len + separator.len();
    }

    Ok(parts)
}

/// The named field of a form upload.
pub fn file_field<'a>(
    body: &'a [u8],
    content_type: &str,
    field: &str,
) -> Result<Part<'a>, MultipartError> {
    let boundary = boundary(content_type)?;
    parts(body, &boundary)?
        .into_iter()
        .find(|part| part.name.as_deref() == Some(field))
        .ok_or_else(|| MultipartError::MissingField(field.to_string()))
}

impl<'a> Part<'a> {
    fn from_headers(headers: &str, data: &'a [u8]) -> Self {
        let disposition = headers
            .split("\r\n")
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-disposition"))
            .map(|(_, value)| value.trim())
            .unwrap_or("");

        let capture = |regex: &Regex| {
            regex
                .captures(disposition)
                .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
                .map(|m| m.as_str().to_string())
        };

        Self {
            name: capture(&NAME_REGEX),
            filename: capture(&FILENAME_REGEX),
            data,
        }
    }
}
