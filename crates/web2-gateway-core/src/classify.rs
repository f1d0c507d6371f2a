//! Content classification.
//!
//! Decides how decoded bytes should be framed, given the key they were
//! stored under. Precedence, first match wins:
//!
//! 1. the key has an extension: typed file with the table MIME type
//! 2. the payload parses as JSON: structured JSON
//! 3. the payload is a `data:image/...;base64,` URL: decoded image bytes
//! 4. anything else: opaque bytes with no content type
//!
//! Under rule 1, an image key (`logo.png`) whose payload is a data URL is
//! served as the decoded image. Other extensions keep their table type.

use std::sync::LazyLock;

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use bytes::Bytes;
use regex::Regex;

use crate::mime;

const DATA_URL_IMAGE_MARKER: &[u8] = b"data:image";
const BASE64_MARKER: &str = ";base64,";
const IMAGE_PREFIX: &str = "image/";

/// Base64 engine that accepts payloads with or without padding.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

static DATA_URL_MIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^data:([\w.+-]+/[\w.+-]+)[;,]").expect("data URL pattern is valid")
});

/// How a resolved value should be served.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Structured JSON, re-serialized on output.
    Json(serde_json::Value),
    /// Image decoded from a base64 data URL.
    InlineImage {
        /// Decoded image bytes.
        bytes: Bytes,
        /// MIME type embedded in the data URL.
        mime_type: String,
    },
    /// Bytes served with a MIME type taken from the key's extension.
    TypedFile {
        /// Raw payload.
        bytes: Bytes,
        /// MIME type from the extension table.
        mime_type: &'static str,
    },
    /// Bytes served without an explicit content type.
    Opaque(Bytes),
}

impl Classification {
    /// Content type to advertise, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        match self {
            Self::Json(_) => Some("application/json"),
            Self::InlineImage { mime_type, .. } => Some(mime_type),
            Self::TypedFile { mime_type, .. } => Some(mime_type),
            Self::Opaque(_) => None,
        }
    }
}

/// Classify `payload` stored under `key`.
#[must_use]
pub fn classify(payload: Bytes, key: &str) -> Classification {
    if let Some(mime_type) = mime::for_key(key) {
        if mime_type.starts_with(IMAGE_PREFIX) {
            if let Some(image) = decode_data_url_image(&payload) {
                return image;
            }
        }
        return Classification::TypedFile {
            bytes: payload,
            mime_type,
        };
    }

    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&payload) {
        return Classification::Json(value);
    }

    if let Some(image) = decode_data_url_image(&payload) {
        return image;
    }

    Classification::Opaque(payload)
}

/// Whether the payload starts with the `data:image` marker.
#[must_use]
pub fn is_data_url_image(payload: &[u8]) -> bool {
    payload.starts_with(DATA_URL_IMAGE_MARKER)
}

/// Decode a `data:image/<subtype>;base64,<data>` payload.
///
/// Returns `None` when the marker, the MIME type, or the base64 body is
/// missing or malformed.
fn decode_data_url_image(payload: &[u8]) -> Option<Classification> {
    if !is_data_url_image(payload) {
        return None;
    }
    let text = std::str::from_utf8(payload).ok()?;
    let mime_type = DATA_URL_MIME.captures(text)?.get(1)?.as_str().to_owned();
    let (_, encoded) = text.rsplit_once(BASE64_MARKER)?;
    let cleaned: Vec<u8> = encoded
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    let bytes = LENIENT_BASE64.decode(cleaned).ok()?;

    Some(Classification::InlineImage {
        bytes: Bytes::from(bytes),
        mime_type,
    })
}
