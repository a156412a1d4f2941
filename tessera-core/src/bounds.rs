//! Geographic extent advertised by a tile package.

use std::{num::ParseFloatError, str::FromStr};

use geo::{Coord, Rect};
use thiserror::Error;

use crate::ErrorKind;

/// Bounding box in WGS84 degrees, ordered as stored in MBTiles metadata.
///
/// # Examples
///
/// ```
/// use tessera_core::Bounds;
///
/// # fn main() -> Result<(), tessera_core::BoundsParseError> {
/// let bounds: Bounds = "-122.5,37.0,-122.0,37.8".parse()?;
/// assert_eq!(bounds.left, -122.5);
/// assert_eq!(bounds.top, 37.8);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    /// Western longitude.
    pub left: f64,
    /// Southern latitude.
    pub bottom: f64,
    /// Eastern longitude.
    pub right: f64,
    /// Northern latitude.
    pub top: f64,
}

/// Errors raised while parsing a bounds value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoundsParseError {
    /// The value did not split into exactly four fields.
    #[error("expected 4 comma-separated bounds fields, found {found}")]
    FieldCount {
        /// Number of fields present.
        found: usize,
    },
    /// A field was not a floating-point number.
    #[error("bounds field {index} ({field:?}) is not a number: {source}")]
    InvalidField {
        /// Zero-based field position.
        index: usize,
        /// Offending text after trimming.
        field: String,
        /// Parser failure.
        #[source]
        source: ParseFloatError,
    },
    /// A field parsed to NaN or an infinity.
    #[error("bounds field {index} ({field:?}) is not finite")]
    NonFinite {
        /// Zero-based field position.
        index: usize,
        /// Offending text after trimming.
        field: String,
    },
}

impl BoundsParseError {
    /// Failure category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::BoundsParse
    }
}

impl Bounds {
    /// Construct bounds from explicit edges.
    #[must_use]
    pub const fn new(left: f64, bottom: f64, right: f64, top: f64) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
        }
    }

    /// Axis-aligned rectangle with `x = longitude` and `y = latitude`.
    ///
    /// `Rect::new` normalises the corners, so inverted bounds still produce
    /// a valid rectangle.
    #[must_use]
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            Coord {
                x: self.left,
                y: self.bottom,
            },
            Coord {
                x: self.right,
                y: self.top,
            },
        )
    }
}

impl From<Bounds> for Rect<f64> {
    fn from(bounds: Bounds) -> Self {
        bounds.to_rect()
    }
}

impl FromStr for Bounds {
    type Err = BoundsParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = value.split(',').map(str::trim).collect();
        let [left, bottom, right, top] = fields.as_slice() else {
            return Err(BoundsParseError::FieldCount {
                found: fields.len(),
            });
        };

        Ok(Self {
            left: parse_field(0, left)?,
            bottom: parse_field(1, bottom)?,
            right: parse_field(2, right)?,
            top: parse_field(3, top)?,
        })
    }
}

fn parse_field(index: usize, field: &str) -> Result<f64, BoundsParseError> {
    let value: f64 = field
        .parse()
        .map_err(|source| BoundsParseError::InvalidField {
            index,
            field: field.to_owned(),
            source,
        })?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(BoundsParseError::NonFinite {
            index,
            field: field.to_owned(),
        })
    }
}
