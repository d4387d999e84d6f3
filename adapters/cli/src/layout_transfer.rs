//! Single-line transfer strings for obstacle layouts.
//!
//! A layout is written as `grid:v1:<W>x<H>:<payload>` where the payload is
//! unpadded base64 over a JSON list of the blocked cells.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use grid_pursuit_core::{CellCoord, GridError, ObstacleLayout};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const LAYOUT_DOMAIN: &str = "grid";
const LAYOUT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded layout payload.
pub(crate) const LAYOUT_HEADER: &str = "grid:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';
/// Largest number of cells a transferred layout may declare.
const MAX_LAYOUT_CELLS: u64 = 1 << 20;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct SerializableLayout {
    blocked: Vec<CellCoord>,
}

/// Errors that can occur while encoding or decoding layout strings.
#[derive(Debug, Error)]
pub(crate) enum LayoutTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("layout string was empty")]
    EmptyPayload,
    /// A required segment was missing.
    #[error("layout string is missing the {0}")]
    MissingSegment(&'static str),
    /// The string used an unexpected prefix segment.
    #[error("layout prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The string used an unsupported version identifier.
    #[error("layout version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed.
    #[error("could not parse grid dimensions '{0}'")]
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode layout payload")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The JSON payload could not be read or written.
    #[error("could not process layout payload")]
    InvalidPayload(#[source] serde_json::Error),
    /// A blocked cell lies outside the declared dimensions.
    #[error("layout names a cell outside the grid")]
    CellOutOfRange(#[source] GridError),
}

/// Encodes `layout` into a single-line string.
pub(crate) fn encode(layout: &ObstacleLayout) -> Result<String, LayoutTransferError> {
    let payload = SerializableLayout {
        blocked: blocked_cells(layout).collect(),
    };
    let json = serde_json::to_vec(&payload).map_err(LayoutTransferError::InvalidPayload)?;
    let encoded = STANDARD_NO_PAD.encode(json);
    Ok(format!(
        "{LAYOUT_HEADER}:{}x{}:{encoded}",
        layout.width(),
        layout.height()
    ))
}

/// Decodes a layout from its string representation.
pub(crate) fn decode(value: &str) -> Result<ObstacleLayout, LayoutTransferError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LayoutTransferError::EmptyPayload);
    }

    let mut parts = trimmed.split(FIELD_DELIMITER);
    let domain = parts
        .next()
        .ok_or(LayoutTransferError::MissingSegment("prefix"))?;
    let version = parts
        .next()
        .ok_or(LayoutTransferError::MissingSegment("version"))?;
    let dimensions = parts
        .next()
        .ok_or(LayoutTransferError::MissingSegment("grid dimensions"))?;
    let payload = parts
        .next()
        .ok_or(LayoutTransferError::MissingSegment("payload"))?;

    if domain != LAYOUT_DOMAIN {
        return Err(LayoutTransferError::InvalidPrefix(domain.to_owned()));
    }
    if version != LAYOUT_VERSION {
        return Err(LayoutTransferError::UnsupportedVersion(version.to_owned()));
    }

    let (width, height) = parse_dimensions(dimensions)?;
    let bytes = STANDARD_NO_PAD
        .decode(payload.as_bytes())
        .map_err(LayoutTransferError::InvalidEncoding)?;
    let decoded: SerializableLayout =
        serde_json::from_slice(&bytes).map_err(LayoutTransferError::InvalidPayload)?;

    let mut layout = ObstacleLayout::empty(width, height);
    for cell in decoded.blocked {
        layout
            .set_obstacle(cell, true)
            .map_err(LayoutTransferError::CellOutOfRange)?;
    }
    Ok(layout)
}

fn blocked_cells(layout: &ObstacleLayout) -> impl Iterator<Item = CellCoord> + '_ {
    (0..layout.height())
        .flat_map(move |y| (0..layout.width()).map(move |x| CellCoord::new(x, y)))
        .filter(|cell| layout.has_obstacle(*cell))
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), LayoutTransferError> {
    let invalid = || LayoutTransferError::InvalidDimensions(dimensions.to_owned());
    let (width, height) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;

    let width = width.trim().parse::<u32>().map_err(|_| invalid())?;
    let height = height.trim().parse::<u32>().map_err(|_| invalid())?;

    if width == 0 || height == 0 || u64::from(width) * u64::from(height) > MAX_LAYOUT_CELLS {
        return Err(invalid());
    }

    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_layout_survives_transfer() {
        let layout = ObstacleLayout::empty(12, 8);

        let encoded = encode(&layout).expect("layout encodes");
        assert!(encoded.starts_with(&format!("{LAYOUT_HEADER}:12x8:")));

        assert_eq!(decode(&encoded).expect("layout decodes"), layout);
    }

    #[test]
    fn blocked_cells_survive_transfer() {
        let mut layout = ObstacleLayout::empty(10, 10);
        for cell in [CellCoord::new(0, 0), CellCoord::new(9, 3), CellCoord::new(4, 9)] {
            layout.set_obstacle(cell, true).expect("in range");
        }

        let decoded = decode(&encode(&layout).expect("layout encodes")).expect("layout decodes");

        assert_eq!(decoded, layout);
        assert_eq!(decoded.blocked_count(), 3);
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let layout = ObstacleLayout::empty(3, 3);
        let encoded = format!("  {}\n", encode(&layout).expect("layout encodes"));

        assert_eq!(decode(&encoded).expect("layout decodes"), layout);
    }

    #[test]
    fn rejects_foreign_prefix_and_version() {
        assert!(matches!(
            decode("map:v1:4x4:e30"),
            Err(LayoutTransferError::InvalidPrefix(prefix)) if prefix == "map"
        ));
        assert!(matches!(
            decode("grid:v2:4x4:e30"),
            Err(LayoutTransferError::UnsupportedVersion(version)) if version == "v2"
        ));
    }

    #[test]
    fn rejects_missing_segments_and_bad_dimensions() {
        assert!(matches!(decode("   "), Err(LayoutTransferError::EmptyPayload)));
        assert!(matches!(
            decode("grid:v1:4x4"),
            Err(LayoutTransferError::MissingSegment("payload"))
        ));
        assert!(matches!(
            decode("grid:v1:0x4:e30"),
            Err(LayoutTransferError::InvalidDimensions(_))
        ));
        assert!(matches!(
            decode("grid:v1:four:e30"),
            Err(LayoutTransferError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn rejects_oversized_dimensions_before_allocating() {
        assert!(matches!(
            decode("grid:v1:100000x100000:e30"),
            Err(LayoutTransferError::InvalidDimensions(dimensions)) if dimensions == "100000x100000"
        ));
        assert!(matches!(
            decode("grid:v1:1024x1025:e30"),
            Err(LayoutTransferError::InvalidDimensions(_))
        ));
        let payload = STANDARD_NO_PAD.encode(br#"{"blocked":[]}"#);
        assert_eq!(
            decode(&format!("grid:v1:1024x1024:{payload}")).expect("largest accepted layout"),
            ObstacleLayout::empty(1024, 1024)
        );
    }

    #[test]
    fn rejects_cells_outside_declared_dimensions() {
        let json = br#"{"blocked":[{"x":5,"y":0}]}"#;
        let encoded = format!("grid:v1:2x2:{}", STANDARD_NO_PAD.encode(json));

        assert!(matches!(
            decode(&encoded),
            Err(LayoutTransferError::CellOutOfRange(GridError::OutOfRange { x: 5, y: 0 }))
        ));
    }
}
