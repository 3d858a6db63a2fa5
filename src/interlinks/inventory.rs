//! Sphinx object inventory parsing and conversion.
//!
//! An inventory (`objects.inv`) is a published symbol index: four plain
//! header lines followed by a zlib-compressed list of records, one per
//! documented symbol:
//!
//! ```text
//! # Sphinx inventory version 2
//! # Project: Python
//! # Version: 3.12
//! # The remainder of this file is compressed using zlib.
//! <zlib: name domain:role priority uri dispname>
//! ```

use std::collections::BTreeMap;
use std::io::Read;

use flate2::read::ZlibDecoder;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::InterlinksError;
use crate::Result;

/// Record line format. The name may contain spaces; the display name is
/// everything after the URI.
static RECORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>.+?)\s+(?P<domain>[^\s:]+):(?P<role>\S+)\s+(?P<priority>-?\d+)\s+(?P<uri>\S+)\s+(?P<dispname>.+)$")
        .expect("record regex must compile")
});

/// One documented symbol from a remote inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryItem {
    /// Fully-qualified symbol name.
    pub name: String,
    /// Documentation domain, e.g. `py`.
    pub domain: String,
    /// Object role within the domain, e.g. `function` or `class`.
    pub role: String,
    /// Search priority as published by the site.
    pub priority: i32,
    /// Location relative to the site root. A trailing `$` abbreviates
    /// the symbol name.
    pub uri: String,
    /// Display name; `-` means it equals the symbol name.
    pub dispname: String,
}

impl InventoryItem {
    /// Location with the `$` abbreviation expanded.
    #[must_use]
    pub fn expanded_uri(&self) -> String {
        self.uri.strip_suffix('$').map_or_else(
            || self.uri.clone(),
            |prefix| format!("{prefix}{}", self.name),
        )
    }
}

/// A parsed remote inventory.
#[derive(Debug, Clone)]
pub struct Inventory {
    /// Project name from the header.
    pub project: String,
    /// Project version from the header.
    pub version: String,
    /// Symbol records in published order.
    pub items: Vec<InventoryItem>,
}

impl Inventory {
    /// Parse the raw bytes of an `objects.inv` payload fetched from
    /// `url` (used only for error context).
    ///
    /// # Errors
    ///
    /// Returns `InterlinksError::Invalid` if the header is not a version
    /// 2 inventory or the compressed payload is malformed.
    pub fn parse(url: &str, bytes: &[u8]) -> Result<Self> {
        let invalid = |reason: String| InterlinksError::Invalid {
            url: url.to_string(),
            reason,
        };

        let (header, payload) = split_header(bytes)
            .ok_or_else(|| invalid("truncated header".to_string()))?;

        if !header[0].contains("Sphinx inventory version 2") {
            return Err(invalid(format!("unsupported inventory header: {}", header[0])).into());
        }
        if !header[3].contains("zlib") {
            return Err(invalid("payload is not marked as zlib-compressed".to_string()).into());
        }

        let project = header[1].trim_start_matches("# Project:").trim().to_string();
        let version = header[2].trim_start_matches("# Version:").trim().to_string();

        let mut text = String::new();
        ZlibDecoder::new(payload)
            .read_to_string(&mut text)
            .map_err(|e| invalid(format!("zlib decompression failed: {e}")))?;

        let mut items = Vec::new();
        for line in text.lines() {
            if line.is_empty() {
                continue;
            }
            let Some(caps) = RECORD_RE.captures(line) else {
                tracing::debug!(line, "Skipping malformed inventory record");
                continue;
            };
            items.push(InventoryItem {
                name: caps["name"].to_string(),
                domain: caps["domain"].to_string(),
                role: caps["role"].to_string(),
                priority: caps["priority"].parse().unwrap_or(-1),
                uri: caps["uri"].to_string(),
                dispname: caps["dispname"].to_string(),
            });
        }

        Ok(Self {
            project,
            version,
            items,
        })
    }

    /// Convert into the local cache format: a map from fully-qualified
    /// symbol name to absolute URL under `base_url`.
    ///
    /// The map is ordered, so serialization of unchanged input is
    /// byte-for-byte stable across runs.
    #[must_use]
    pub fn into_links(self, base_url: &str) -> BTreeMap<String, String> {
        let mut links = BTreeMap::new();
        for item in self.items {
            let url = format!("{base_url}{}", item.expanded_uri());
            links.insert(item.name, url);
        }
        links
    }
}

/// Split the four `#` header lines from the compressed remainder.
fn split_header(bytes: &[u8]) -> Option<([String; 4], &[u8])> {
    let mut rest = bytes;
    let mut header: [String; 4] = Default::default();

    for slot in &mut header {
        let newline = rest.iter().position(|&b| b == b'\n')?;
        *slot = String::from_utf8_lossy(&rest[..newline]).into_owned();
        rest = &rest[newline + 1..];
    }

    Some((header, rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn encode_inventory(records: &str) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"# Sphinx inventory version 2\n");
        bytes.extend_from_slice(b"# Project: sample\n");
        bytes.extend_from_slice(b"# Version: 1.0\n");
        bytes.extend_from_slice(b"# The remainder of this file is compressed using zlib.\n");

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(records.as_bytes()).unwrap();
        bytes.extend_from_slice(&encoder.finish().unwrap());
        bytes
    }

    #[test]
    fn test_parse_header_and_records() {
        let bytes = encode_inventory(
            "sample.core.run py:function 1 api/core.html#$ -\n\
             sample.Result py:class 1 api/result.html#sample.Result Result\n",
        );
        let inv = Inventory::parse("https://example.org/objects.inv", &bytes).unwrap();

        assert_eq!(inv.project, "sample");
        assert_eq!(inv.version, "1.0");
        assert_eq!(inv.items.len(), 2);
        assert_eq!(inv.items[0].name, "sample.core.run");
        assert_eq!(inv.items[0].domain, "py");
        assert_eq!(inv.items[0].role, "function");
        assert_eq!(inv.items[0].priority, 1);
        assert_eq!(inv.items[1].dispname, "Result");
    }

    #[test]
    fn test_uri_abbreviation_expansion() {
        let item = InventoryItem {
            name: "sample.core.run".to_string(),
            domain: "py".to_string(),
            role: "function".to_string(),
            priority: 1,
            uri: "api/core.html#$".to_string(),
            dispname: "-".to_string(),
        };
        assert_eq!(item.expanded_uri(), "api/core.html#sample.core.run");

        let plain = InventoryItem {
            uri: "api/core.html#run".to_string(),
            ..item
        };
        assert_eq!(plain.expanded_uri(), "api/core.html#run");
    }

    #[test]
    fn test_into_links() {
        let bytes = encode_inventory("sample.core.run py:function 1 api/core.html#$ -\n");
        let inv = Inventory::parse("https://example.org/objects.inv", &bytes).unwrap();
        let links = inv.into_links("https://example.org/");

        assert_eq!(
            links["sample.core.run"],
            "https://example.org/api/core.html#sample.core.run"
        );
    }

    #[test]
    fn test_names_with_spaces() {
        // Std domain labels can contain spaces in the name field.
        let bytes = encode_inventory("whatsnew changelog std:doc -1 whatsnew/index.html What's new\n");
        let inv = Inventory::parse("https://example.org/objects.inv", &bytes).unwrap();
        assert_eq!(inv.items[0].name, "whatsnew changelog");
        assert_eq!(inv.items[0].dispname, "What's new");
    }

    #[test]
    fn test_rejects_wrong_version() {
        let mut bytes = encode_inventory("x py:function 1 x.html -\n");
        let replaced = String::from_utf8_lossy(&bytes)
            .replace("version 2", "version 1");
        bytes = replaced.into_bytes();

        let err = Inventory::parse("https://example.org/objects.inv", &bytes).unwrap_err();
        assert!(err.to_string().contains("unsupported inventory header"));
    }

    #[test]
    fn test_rejects_truncated_payload() {
        let err = Inventory::parse("https://example.org/objects.inv", b"# Sphinx inventory version 2\n")
            .unwrap_err();
        assert!(err.to_string().contains("truncated header"));
    }

    #[test]
    fn test_rejects_corrupt_zlib() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"# Sphinx inventory version 2\n");
        bytes.extend_from_slice(b"# Project: sample\n");
        bytes.extend_from_slice(b"# Version: 1.0\n");
        bytes.extend_from_slice(b"# The remainder of this file is compressed using zlib.\n");
        bytes.extend_from_slice(b"not zlib at all");

        let err = Inventory::parse("https://example.org/objects.inv", &bytes).unwrap_err();
        assert!(err.to_string().contains("zlib decompression failed"));
    }

    #[test]
    fn test_malformed_records_are_skipped() {
        let bytes = encode_inventory("garbage-without-fields\nsample.run py:function 1 run.html -\n");
        let inv = Inventory::parse("https://example.org/objects.inv", &bytes).unwrap();
        assert_eq!(inv.items.len(), 1);
        assert_eq!(inv.items[0].name, "sample.run");
    }
}
