//! Composite manifests.
//!
//! A value too large for one store entry is split into parts stored under
//! their own keys, plus a manifest under the logical key:
//!
//! ```json
//! {"type": "multipart", "parts": ["movie.mp4.part1", "movie.mp4.part2"]}
//! ```
//!
//! Part names carry a `.part<N>` suffix that orders the concatenation. It is
//! never used to infer the content type.

use serde::Deserialize;

use crate::error::{GatewayError, GatewayResult};

const MULTIPART_TYPE: &str = "multipart";
const PART_MARKER: &str = ".part";
const CACHE_KEY_SEPARATOR: &str = ",";

#[derive(Debug, Deserialize)]
struct RawManifest {
    #[serde(rename = "type")]
    kind: String,
    parts: Vec<String>,
}

/// A parsed composite manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeManifest {
    parts: Vec<String>,
}

impl CompositeManifest {
    /// Build a manifest from part names in declared order.
    #[must_use]
    pub fn new(parts: Vec<String>) -> Self {
        Self { parts }
    }

    /// Parse a decoded payload as a manifest.
    ///
    /// Returns `None` unless the payload is a JSON object with
    /// `"type": "multipart"` and a non-empty `parts` list of strings.
    #[must_use]
    pub fn parse(payload: &[u8]) -> Option<Self> {
        let raw: RawManifest = serde_json::from_slice(payload).ok()?;
        if raw.kind != MULTIPART_TYPE || raw.parts.is_empty() {
            return None;
        }
        Some(Self { parts: raw.parts })
    }

    /// Part names in declared order.
    #[must_use]
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Cache key: part names sorted lexically and joined by a comma.
    ///
    /// Independent of declared order, so the same set of parts always maps
    /// to the same cache entry.
    #[must_use]
    pub fn cache_key(&self) -> String {
        let mut sorted: Vec<&str> = self.parts.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        sorted.join(CACHE_KEY_SEPARATOR)
    }

    /// Part names in concatenation order: ascending numeric `.part<N>` index.
    ///
    /// Fails if any part lacks a parseable index.
    pub fn ordered_parts(&self) -> GatewayResult<Vec<String>> {
        let mut indexed = self
            .parts
            .iter()
            .map(|name| {
                part_index(name)
                    .map(|idx| (idx, name.clone()))
                    .ok_or_else(|| GatewayError::InvalidPartName(name.clone()))
            })
            .collect::<GatewayResult<Vec<_>>>()?;
        indexed.sort_by_key(|(idx, _)| *idx);
        Ok(indexed.into_iter().map(|(_, name)| name).collect())
    }
}

/// Sequence index following the last `.part` marker in a part name.
#[must_use]
pub fn part_index(name: &str) -> Option<u64> {
    let (_, tail) = name.rsplit_once(PART_MARKER)?;
    let digits_len = tail.bytes().take_while(u8::is_ascii_digit).count();
    tail[..digits_len].parse().ok()
}
