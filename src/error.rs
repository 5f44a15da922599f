/*!
error module defines the error type used in bgp-aspath.
*/
use crate::models::SegmentType;
use num_enum::TryFromPrimitiveError;
use std::fmt::{Display, Formatter};
use std::{error::Error, fmt};

/// Errors reported to callers of the AS path engine.
///
/// Internal consistency violations (for example asking the encoder to emit
/// a non-normalized path) are programmer errors and panic instead.
#[derive(Debug)]
pub enum AsPathError {
    /// The wire form of an AS_PATH attribute is malformed. Per RFC 4271
    /// the surrounding session treats this as an UPDATE error.
    MalformedAttribute(String),
    /// A textual AS path could not be parsed.
    MalformedText(String),
    /// A bulk prepend would push a segment past the on-wire length limit.
    /// The segment is left unchanged; callers are expected to split.
    PrependOverflow { length: usize, count: usize },
}

impl Error for AsPathError {}

impl Display for AsPathError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AsPathError::MalformedAttribute(s) => write!(f, "malformed AS_PATH attribute: {s}"),
            AsPathError::MalformedText(s) => write!(f, "malformed AS path string: {s}"),
            AsPathError::PrependOverflow { length, count } => write!(
                f,
                "prepending {count} ASNs to a segment of length {length} exceeds the segment limit"
            ),
        }
    }
}

impl From<TryFromPrimitiveError<SegmentType>> for AsPathError {
    fn from(value: TryFromPrimitiveError<SegmentType>) -> Self {
        AsPathError::MalformedAttribute(format!("unknown segment type: {}", value.number))
    }
}
